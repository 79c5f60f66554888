//! JSON-RPC Client
//!
//! Minimal JSON-RPC 2.0 client for NEO nodes: raw transaction submission
//! and block height probing.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{NeoError, NeoResult};
use crate::utils::http::HttpClient;

/// Request id used for `sendrawtransaction`
pub const SEND_RAW_TRANSACTION_ID: u64 = 4;
/// Request id used for general queries
pub const DEFAULT_REQUEST_ID: u64 = 1;

#[derive(Debug, Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    method: &'a str,
    params: Value,
    id: u64,
}

/// Error object returned by a node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcErrorObject {
    pub code: i64,
    pub message: String,
}

/// JSON-RPC 2.0 response envelope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcResponse {
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<RpcErrorObject>,
    #[serde(default)]
    pub id: Option<Value>,
}

impl RpcResponse {
    /// Result value, or `Rejected` carrying the node's error
    pub fn into_result(self) -> NeoResult<Value> {
        if let Some(error) = self.error {
            return Err(NeoError::rejected(error.message).with_details(format!("code {}", error.code)));
        }
        self.result
            .ok_or_else(|| NeoError::parse_error("RPC response has neither result nor error"))
    }
}

/// Reports the ledger height a node has reached
#[async_trait]
pub trait HeightProbe: Send + Sync {
    async fn block_count(&self, endpoint: &str) -> NeoResult<u64>;
}

/// JSON-RPC client over the shared HTTP pool
#[derive(Debug, Clone)]
pub struct RpcClient {
    http: HttpClient,
}

impl RpcClient {
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }

    pub async fn call(&self, endpoint: &str, method: &str, params: Value, id: u64) -> NeoResult<RpcResponse> {
        let request = RpcRequest {
            jsonrpc: "2.0",
            method,
            params,
            id,
        };
        crate::log_debug!("rpc", "JSON-RPC call", method = method, endpoint = endpoint);
        self.http.post_json(endpoint, &request).await
    }

    pub async fn send_raw_transaction(&self, endpoint: &str, raw_hex: &str) -> NeoResult<RpcResponse> {
        self.call(
            endpoint,
            "sendrawtransaction",
            Value::Array(vec![Value::String(raw_hex.to_string())]),
            SEND_RAW_TRANSACTION_ID,
        )
        .await
    }

    pub async fn get_block_count(&self, endpoint: &str) -> NeoResult<u64> {
        let value = self
            .call(endpoint, "getblockcount", Value::Array(vec![]), DEFAULT_REQUEST_ID)
            .await?
            .into_result()?;
        value
            .as_u64()
            .ok_or_else(|| NeoError::parse_error(format!("Unexpected block count: {}", value)))
    }
}

#[async_trait]
impl HeightProbe for RpcClient {
    async fn block_count(&self, endpoint: &str) -> NeoResult<u64> {
        self.get_block_count(endpoint).await
    }
}
