//! HTTP Client with Connection Pooling
//!
//! One pooled async client per pipeline, shared by the wallet API gateway
//! and the JSON-RPC client.

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

use crate::error::{NeoError, NeoResult};

const USER_AGENT: &str = concat!("neo-dispatch/", env!("CARGO_PKG_VERSION"));

/// Pooled HTTP client
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    pub fn new(timeout: Duration) -> NeoResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10).min(timeout))
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(5)
            .tcp_keepalive(Duration::from_secs(60))
            .tcp_nodelay(true)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| NeoError::transport(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client })
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    /// GET and decode a JSON body
    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> NeoResult<T> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| request_failed("GET", url, e))?;

        decode(url, response).await
    }

    /// POST a JSON body and decode the JSON reply
    pub async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        url: &str,
        body: &B,
    ) -> NeoResult<T> {
        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| request_failed("POST", url, e))?;

        decode(url, response).await
    }
}

async fn decode<T: DeserializeOwned>(url: &str, response: reqwest::Response) -> NeoResult<T> {
    let status = response.status();
    if !status.is_success() {
        return Err(NeoError::transport(format!("HTTP {} from {}", status.as_u16(), extract_domain(url))));
    }
    let body = response.bytes().await.map_err(NeoError::from)?;
    serde_json::from_slice(&body).map_err(|e| {
        NeoError::parse_error(format!("Malformed response from {}", extract_domain(url)))
            .with_details(e.to_string())
    })
}

fn request_failed(method: &str, url: &str, e: reqwest::Error) -> NeoError {
    NeoError::from(e).with_details(format!("{} {}", method, extract_domain(url)))
}

/// Host part of a URL, for error messages
fn extract_domain(url: &str) -> &str {
    let rest = url
        .trim_start_matches("https://")
        .trim_start_matches("http://");
    rest.split('/').next().unwrap_or(rest)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_domain() {
        assert_eq!(extract_domain("http://api.wallet.cityofzion.io/v2/block/height"), "api.wallet.cityofzion.io");
        assert_eq!(extract_domain("http://localhost:10332"), "localhost:10332");
    }

    #[test]
    fn test_client_creation() {
        let http = HttpClient::new(Duration::from_secs(5)).unwrap();
        assert!(http.client().get("http://localhost:10332").build().is_ok());
    }

    #[tokio::test]
    async fn test_unreachable_host_is_transport_error() {
        let http = HttpClient::new(Duration::from_millis(500)).unwrap();
        let err = http
            .get_json::<serde_json::Value>("http://127.0.0.1:1/unreachable")
            .await
            .unwrap_err();
        assert_eq!(err.code, crate::error::ErrorCode::TransportError);
    }
}
