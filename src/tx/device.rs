//! Device Channel
//!
//! Request/response bridge between the signing orchestrator and whatever
//! drives the hardware device. The driver side pulls [`SignatureRequest`]s
//! and answers each one exactly once.

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};

use super::signer::DeviceSigner;
use crate::error::{NeoError, NeoResult};

/// Driver's answer to one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceResponse {
    /// Raw `r || s` or DER signature bytes
    Signed(Vec<u8>),
    Rejected(String),
    Unavailable(String),
}

/// Pending request handed to the driver
#[derive(Debug)]
pub struct SignatureRequest {
    payload: Vec<u8>,
    reply: oneshot::Sender<DeviceResponse>,
}

impl SignatureRequest {
    /// Unsigned transaction bytes to sign
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Answer the request; false if the requester stopped waiting
    pub fn respond(self, response: DeviceResponse) -> bool {
        self.reply.send(response).is_ok()
    }
}

/// Driver side of the channel
#[derive(Debug)]
pub struct DeviceRequests {
    requests: mpsc::Receiver<SignatureRequest>,
}

impl DeviceRequests {
    /// Next request, or `None` once every [`DeviceChannel`] is dropped
    pub async fn next(&mut self) -> Option<SignatureRequest> {
        self.requests.recv().await
    }
}

/// Orchestrator side of the channel
#[derive(Debug, Clone)]
pub struct DeviceChannel {
    requests: mpsc::Sender<SignatureRequest>,
}

impl DeviceChannel {
    pub fn new(buffer: usize) -> (Self, DeviceRequests) {
        let (tx, rx) = mpsc::channel(buffer.max(1));
        (Self { requests: tx }, DeviceRequests { requests: rx })
    }
}

#[async_trait]
impl DeviceSigner for DeviceChannel {
    async fn request_signature(&self, unsigned: &[u8]) -> NeoResult<Vec<u8>> {
        let (reply, answer) = oneshot::channel();
        let request = SignatureRequest {
            payload: unsigned.to_vec(),
            reply,
        };

        self.requests
            .send(request)
            .await
            .map_err(|_| NeoError::device_unavailable("Device driver is not running"))?;

        match answer.await {
            Ok(DeviceResponse::Signed(bytes)) => Ok(bytes),
            Ok(DeviceResponse::Rejected(reason)) => {
                Err(NeoError::user_rejected("Signature declined on device").with_details(reason))
            }
            Ok(DeviceResponse::Unavailable(reason)) => {
                Err(NeoError::device_unavailable("Device unavailable").with_details(reason))
            }
            Err(_) => Err(NeoError::device_unavailable("Device dropped the request")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    #[tokio::test]
    async fn test_signed_response_roundtrip() {
        let (channel, mut driver) = DeviceChannel::new(1);
        let handle = tokio::spawn(async move {
            let request = driver.next().await.unwrap();
            assert_eq!(request.payload(), &[0x80, 0x00]);
            request.respond(DeviceResponse::Signed(vec![7; 64]))
        });

        let sig = channel.request_signature(&[0x80, 0x00]).await.unwrap();
        assert_eq!(sig, vec![7; 64]);
        assert!(handle.await.unwrap());
    }

    #[tokio::test]
    async fn test_rejected_response() {
        let (channel, mut driver) = DeviceChannel::new(1);
        tokio::spawn(async move {
            let request = driver.next().await.unwrap();
            request.respond(DeviceResponse::Rejected("button".to_string()));
        });

        let err = channel.request_signature(&[1]).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::UserRejected);
    }

    #[tokio::test]
    async fn test_dropped_driver_is_unavailable() {
        let (channel, driver) = DeviceChannel::new(1);
        drop(driver);
        let err = channel.request_signature(&[1]).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::DeviceUnavailable);
    }

    #[tokio::test]
    async fn test_dropped_request_is_unavailable() {
        let (channel, mut driver) = DeviceChannel::new(1);
        tokio::spawn(async move {
            let request = driver.next().await.unwrap();
            drop(request);
        });
        let err = channel.request_signature(&[1]).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::DeviceUnavailable);
    }
}
