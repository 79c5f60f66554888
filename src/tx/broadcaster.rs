//! Transaction Broadcaster
//!
//! Submits signed transactions to a NEO node. Submission happens once per
//! call; there is no retry.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

use super::witness::SignedTransaction;
use crate::api::rpc::RpcClient;
use crate::error::{NeoError, NeoResult};
use crate::types::{BroadcastResult, Network};

/// Node's verdict on a submitted payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmitOutcome {
    pub accepted: bool,
    pub detail: Value,
}

#[async_trait]
pub trait Transport: Send + Sync {
    async fn submit_transaction(&self, endpoint: &str, raw_hex: &str) -> NeoResult<SubmitOutcome>;
}

/// `sendrawtransaction` over JSON-RPC
#[derive(Debug, Clone)]
pub struct JsonRpcTransport {
    rpc: RpcClient,
}

impl JsonRpcTransport {
    pub fn new(rpc: RpcClient) -> Self {
        Self { rpc }
    }
}

#[async_trait]
impl Transport for JsonRpcTransport {
    async fn submit_transaction(&self, endpoint: &str, raw_hex: &str) -> NeoResult<SubmitOutcome> {
        let response = self.rpc.send_raw_transaction(endpoint, raw_hex).await?;
        let detail = serde_json::to_value(&response)?;

        // NEO v2 nodes answer `true` on acceptance
        let accepted = response.error.is_none() && response.result == Some(Value::Bool(true));
        Ok(SubmitOutcome { accepted, detail })
    }
}

/// Hands signed payloads to the transport
pub struct BroadcastDispatcher {
    transport: Arc<dyn Transport>,
}

impl BroadcastDispatcher {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    pub async fn dispatch(
        &self,
        network: Network,
        endpoint: &str,
        signed: &SignedTransaction,
    ) -> NeoResult<BroadcastResult> {
        if signed.is_placeholder() {
            return Err(NeoError::invalid_transaction(
                "Placeholder payload is for signing tests and cannot be broadcast",
            ));
        }

        let outcome = self
            .transport
            .submit_transaction(endpoint, &signed.to_hex())
            .await?;

        if !outcome.accepted {
            return Err(NeoError::rejected(format!("Node declined transaction {}", signed.txid()))
                .with_details(outcome.detail.to_string()));
        }

        Ok(BroadcastResult {
            network,
            txid: signed.txid().to_string(),
            accepted: true,
            endpoint: endpoint.to_string(),
            detail: outcome.detail,
        })
    }
}
