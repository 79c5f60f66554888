//! Wallet API Providers
//!
//! Balance, claim and history lookups against the light wallet REST API.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

use crate::error::{NeoError, NeoResult};
use crate::types::*;
use crate::utils::http::HttpClient;
use crate::utils::network_config::NetworkConfig;

/// Source of balances and claimable GAS
#[async_trait]
pub trait BalanceGateway: Send + Sync {
    async fn get_balance(&self, network: Network, address: &str) -> NeoResult<AccountBalance>;

    async fn get_claim_amounts(&self, network: Network, address: &str) -> NeoResult<ClaimAmounts>;

    async fn get_claims(&self, network: Network, address: &str) -> NeoResult<ClaimSet>;
}

/// One entry of an address's transaction history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub txid: String,
    #[serde(default)]
    pub block_index: u64,
    #[serde(rename = "NEO", default)]
    pub neo: Fixed8,
    #[serde(rename = "GAS", default)]
    pub gas: Fixed8,
    #[serde(default)]
    pub neo_sent: bool,
    #[serde(default)]
    pub gas_sent: bool,
}

// Wire shapes of the REST API

#[derive(Deserialize)]
struct BalanceResponse {
    #[serde(rename = "NEO")]
    neo: AssetBalanceResponse,
    #[serde(rename = "GAS")]
    gas: AssetBalanceResponse,
}

#[derive(Deserialize)]
struct AssetBalanceResponse {
    balance: Fixed8,
    #[serde(default)]
    unspent: Vec<UnspentResponse>,
}

#[derive(Deserialize)]
struct UnspentResponse {
    index: u16,
    txid: Hash256,
    value: Fixed8,
}

#[derive(Deserialize)]
struct ClaimsResponse {
    #[serde(default)]
    claims: Vec<ClaimResponse>,
    #[serde(with = "crate::serde_bytes::fixed8_raw")]
    total_claim: Fixed8,
    #[serde(with = "crate::serde_bytes::fixed8_raw", default)]
    total_unspent_claim: Fixed8,
}

#[derive(Deserialize)]
struct ClaimResponse {
    #[serde(with = "crate::serde_bytes::fixed8_raw")]
    claim: Fixed8,
    index: u16,
    txid: Hash256,
}

#[derive(Deserialize)]
struct HistoryResponse {
    #[serde(default)]
    history: Vec<HistoryEntry>,
}

#[derive(Deserialize)]
struct BestNodeResponse {
    node: String,
}

#[derive(Deserialize)]
struct HeightResponse {
    block_height: Value,
}

/// HTTP client for the light wallet API
#[derive(Debug, Clone)]
pub struct WalletApiClient {
    http: HttpClient,
    config: Arc<NetworkConfig>,
}

impl WalletApiClient {
    pub fn new(http: HttpClient, config: Arc<NetworkConfig>) -> Self {
        Self { http, config }
    }

    fn url(&self, network: Network, path: &str) -> String {
        let base = self.config.endpoints(network).api_base.trim_end_matches('/');
        format!("{}{}", base, path)
    }

    pub async fn get_transaction_history(
        &self,
        network: Network,
        address: &str,
    ) -> NeoResult<Vec<HistoryEntry>> {
        let url = self.url(network, &format!("/v2/address/history/{}", address));
        let response: HistoryResponse = self.http.get_json(&url).await?;
        Ok(response.history)
    }

    /// Current height of the light wallet database
    pub async fn get_wallet_db_height(&self, network: Network) -> NeoResult<u64> {
        let url = self.url(network, "/v2/block/height");
        let response: HeightResponse = self.http.get_json(&url).await?;
        parse_height(&response.block_height)
    }

    /// The API's pick of best performing node
    pub async fn get_best_node(&self, network: Network) -> NeoResult<String> {
        let url = self.url(network, "/v2/network/best_node");
        let response: BestNodeResponse = self.http.get_json(&url).await?;
        let node = response.node.trim();
        if node.is_empty() {
            return Err(NeoError::parse_error("Wallet API returned an empty best node"));
        }
        Ok(node.to_string())
    }
}

#[async_trait]
impl BalanceGateway for WalletApiClient {
    async fn get_balance(&self, network: Network, address: &str) -> NeoResult<AccountBalance> {
        let url = self.url(network, &format!("/v2/address/balance/{}", address));
        let response: BalanceResponse = self.http.get_json(&url).await?;
        Ok(AccountBalance {
            address: address.to_string(),
            neo: asset_balance(response.neo, self.config.asset_id(AssetKind::Neo)),
            gas: asset_balance(response.gas, self.config.asset_id(AssetKind::Gas)),
        })
    }

    async fn get_claim_amounts(&self, network: Network, address: &str) -> NeoResult<ClaimAmounts> {
        let response = self.fetch_claims(network, address).await?;
        Ok(claim_amounts(&response))
    }

    async fn get_claims(&self, network: Network, address: &str) -> NeoResult<ClaimSet> {
        let response = self.fetch_claims(network, address).await?;
        Ok(claim_set(response))
    }
}

impl WalletApiClient {
    async fn fetch_claims(&self, network: Network, address: &str) -> NeoResult<ClaimsResponse> {
        let url = self.url(network, &format!("/v2/address/claims/{}", address));
        self.http.get_json(&url).await
    }
}

fn asset_balance(response: AssetBalanceResponse, asset_id: Hash256) -> AssetBalance {
    AssetBalance {
        balance: response.balance,
        unspent: response
            .unspent
            .into_iter()
            .map(|u| UnspentOutput {
                asset_id,
                txid: u.txid,
                index: u.index,
                value: u.value,
            })
            .collect(),
    }
}

fn claim_amounts(response: &ClaimsResponse) -> ClaimAmounts {
    ClaimAmounts {
        available: response.total_claim,
        unavailable: response.total_unspent_claim,
    }
}

fn claim_set(response: ClaimsResponse) -> ClaimSet {
    ClaimSet {
        claims: response
            .claims
            .into_iter()
            .map(|c| ClaimableOutput {
                txid: c.txid,
                index: c.index,
                value: c.claim,
            })
            .collect(),
        total: response.total_claim,
    }
}

/// Heights arrive as numbers or numeric strings
fn parse_height(value: &Value) -> NeoResult<u64> {
    value
        .as_u64()
        .or_else(|| value.as_str().and_then(|s| s.trim().parse().ok()))
        .ok_or_else(|| NeoError::parse_error(format!("Unexpected block height: {}", value)))
}
