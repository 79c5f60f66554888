//! RPC Endpoint Resolution
//!
//! Picks the node a signed transaction is broadcast to.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::task::JoinSet;

use super::providers::WalletApiClient;
use super::rpc::HeightProbe;
use crate::error::{NeoError, NeoResult};
use crate::types::Network;
use crate::utils::network_config::NetworkConfig;

#[async_trait]
pub trait EndpointResolver: Send + Sync {
    async fn resolve(&self, network: Network) -> NeoResult<String>;
}

/// Asks the wallet API for its best node
#[derive(Debug, Clone)]
pub struct BestNodeResolver {
    api: WalletApiClient,
}

impl BestNodeResolver {
    pub fn new(api: WalletApiClient) -> Self {
        Self { api }
    }
}

#[async_trait]
impl EndpointResolver for BestNodeResolver {
    async fn resolve(&self, network: Network) -> NeoResult<String> {
        self.api.get_best_node(network).await
    }
}

/// Probes every configured candidate and picks the highest ledger
///
/// Candidates are queried concurrently; unreachable ones are skipped and
/// ties go to the earlier candidate.
pub struct HighestHeightResolver {
    probe: Arc<dyn HeightProbe>,
    config: Arc<NetworkConfig>,
}

impl HighestHeightResolver {
    pub fn new(probe: Arc<dyn HeightProbe>, config: Arc<NetworkConfig>) -> Self {
        Self { probe, config }
    }
}

#[async_trait]
impl EndpointResolver for HighestHeightResolver {
    async fn resolve(&self, network: Network) -> NeoResult<String> {
        let candidates = &self.config.endpoints(network).rpc_candidates;
        if candidates.is_empty() {
            return Err(NeoError::config_error(format!(
                "No RPC candidates configured for {}",
                network
            )));
        }

        let mut probes = JoinSet::new();
        for (position, endpoint) in candidates.iter().enumerate() {
            let probe = Arc::clone(&self.probe);
            let endpoint = endpoint.clone();
            probes.spawn(async move {
                let height = probe.block_count(&endpoint).await;
                (position, endpoint, height)
            });
        }

        let mut best: Option<(u64, usize, String)> = None;
        let mut failures = Vec::new();

        while let Some(joined) = probes.join_next().await {
            let (position, endpoint, height) = match joined {
                Ok(result) => result,
                Err(e) => {
                    failures.push(format!("probe task failed: {}", e));
                    continue;
                }
            };
            match height {
                Ok(height) => {
                    let better = match &best {
                        None => true,
                        Some((h, p, _)) => height > *h || (height == *h && position < *p),
                    };
                    if better {
                        best = Some((height, position, endpoint));
                    }
                }
                Err(e) => {
                    crate::log_warn!("resolver", "RPC candidate unreachable", endpoint = endpoint, error = e);
                    failures.push(format!("{}: {}", endpoint, e));
                }
            }
        }

        best.map(|(_, _, endpoint)| endpoint).ok_or_else(|| {
            NeoError::transport(format!("No reachable RPC node for {}", network))
                .with_details(failures.join("; "))
        })
    }
}

/// Highest-height probing when candidates are configured, else the API's best node
pub struct ConfiguredResolver {
    config: Arc<NetworkConfig>,
    best_node: BestNodeResolver,
    highest_height: HighestHeightResolver,
}

impl ConfiguredResolver {
    pub fn new(config: Arc<NetworkConfig>, api: WalletApiClient, probe: Arc<dyn HeightProbe>) -> Self {
        Self {
            best_node: BestNodeResolver::new(api),
            highest_height: HighestHeightResolver::new(probe, Arc::clone(&config)),
            config,
        }
    }
}

#[async_trait]
impl EndpointResolver for ConfiguredResolver {
    async fn resolve(&self, network: Network) -> NeoResult<String> {
        if self.config.endpoints(network).rpc_candidates.is_empty() {
            self.best_node.resolve(network).await
        } else {
            self.highest_height.resolve(network).await
        }
    }
}

/// Always returns the same endpoint
#[derive(Debug, Clone)]
pub struct FixedEndpointResolver {
    endpoint: String,
}

impl FixedEndpointResolver {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl EndpointResolver for FixedEndpointResolver {
    async fn resolve(&self, _network: Network) -> NeoResult<String> {
        Ok(self.endpoint.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::time::Duration;

    struct MapProbe {
        heights: HashMap<String, NeoResult<u64>>,
    }

    #[async_trait]
    impl HeightProbe for MapProbe {
        async fn block_count(&self, endpoint: &str) -> NeoResult<u64> {
            // Later candidates answer first
            if endpoint.ends_with("1") {
                tokio::time::sleep(Duration::from_millis(20)).await;
            }
            self.heights
                .get(endpoint)
                .cloned()
                .unwrap_or_else(|| Err(NeoError::transport("unknown")))
        }
    }

    fn resolver(entries: &[(&str, NeoResult<u64>)]) -> HighestHeightResolver {
        let mut config = NetworkConfig::default();
        config.testnet.rpc_candidates = entries.iter().map(|(e, _)| e.to_string()).collect();
        let heights = entries
            .iter()
            .map(|(e, h)| (e.to_string(), h.clone()))
            .collect();
        HighestHeightResolver::new(Arc::new(MapProbe { heights }), Arc::new(config))
    }

    #[tokio::test]
    async fn test_picks_highest_height() {
        let resolver = resolver(&[
            ("http://node1", Ok(100)),
            ("http://node2", Ok(250)),
            ("http://node3", Ok(249)),
        ]);
        assert_eq!(resolver.resolve(Network::TestNet).await.unwrap(), "http://node2");
    }

    #[tokio::test]
    async fn test_skips_unreachable_and_breaks_ties_by_order() {
        let resolver = resolver(&[
            ("http://node1", Ok(300)),
            ("http://node2", Err(NeoError::transport("Connection failed"))),
            ("http://node3", Ok(300)),
        ]);
        assert_eq!(resolver.resolve(Network::TestNet).await.unwrap(), "http://node1");
    }

    #[tokio::test]
    async fn test_none_reachable() {
        let resolver = resolver(&[
            ("http://node1", Err(NeoError::transport("Connection failed"))),
            ("http://node2", Err(NeoError::transport("Request timed out"))),
        ]);
        let err = resolver.resolve(Network::TestNet).await.unwrap_err();
        assert_eq!(err.code, crate::error::ErrorCode::TransportError);
        assert!(err.details.unwrap().contains("http://node2"));
    }

    #[tokio::test]
    async fn test_no_candidates_is_config_error() {
        let resolver = resolver(&[]);
        let err = resolver.resolve(Network::MainNet).await.unwrap_err();
        assert_eq!(err.code, crate::error::ErrorCode::ConfigError);
    }

    #[tokio::test]
    async fn test_configured_resolver_prefers_candidates() {
        let mut config = NetworkConfig::default();
        config.testnet.rpc_candidates = vec!["http://node2".to_string()];
        let config = Arc::new(config);
        let mut heights = HashMap::new();
        heights.insert("http://node2".to_string(), Ok(10));
        let api = WalletApiClient::new(
            crate::utils::http::HttpClient::new(Duration::from_secs(1)).unwrap(),
            Arc::clone(&config),
        );
        let resolver = ConfiguredResolver::new(config, api, Arc::new(MapProbe { heights }));
        assert_eq!(resolver.resolve(Network::TestNet).await.unwrap(), "http://node2");
    }

    #[tokio::test]
    async fn test_fixed_endpoint() {
        let resolver = FixedEndpointResolver::new("http://localhost:20332");
        assert_eq!(resolver.resolve(Network::TestNet).await.unwrap(), "http://localhost:20332");
    }
}
