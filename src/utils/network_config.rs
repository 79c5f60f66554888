//! Network Configuration
//!
//! Endpoints, asset ids and timeouts per network, with validation:
//! - URL format validation
//! - Plain-HTTP warnings for remote hosts
//! - Distinct asset ids and non-zero timeouts

use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

use crate::error::{NeoError, NeoResult};
use crate::types::{AssetKind, Hash256, Network};

pub const MAINNET_API: &str = "http://api.wallet.cityofzion.io";
pub const TESTNET_API: &str = "http://testnet-api.wallet.cityofzion.io";

pub const NEO_ASSET_ID: &str = "c56f33fc6ecfcd0c225c4ab356fee59390af8560be0e930faebe74a6daff7c9b";
pub const GAS_ASSET_ID: &str = "602c79718b16e442de58778e148d0b1084e3b2dffd5de6b7b16cee7969282de7";

const NEO_ASSET_BYTES: [u8; 32] = [
    0xc5, 0x6f, 0x33, 0xfc, 0x6e, 0xcf, 0xcd, 0x0c,
    0x22, 0x5c, 0x4a, 0xb3, 0x56, 0xfe, 0xe5, 0x93,
    0x90, 0xaf, 0x85, 0x60, 0xbe, 0x0e, 0x93, 0x0f,
    0xae, 0xbe, 0x74, 0xa6, 0xda, 0xff, 0x7c, 0x9b,
];
const GAS_ASSET_BYTES: [u8; 32] = [
    0x60, 0x2c, 0x79, 0x71, 0x8b, 0x16, 0xe4, 0x42,
    0xde, 0x58, 0x77, 0x8e, 0x14, 0x8d, 0x0b, 0x10,
    0x84, 0xe3, 0xb2, 0xdf, 0xfd, 0x5d, 0xe6, 0xb7,
    0xb1, 0x6c, 0xee, 0x79, 0x69, 0x28, 0x2d, 0xe7,
];

pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;
/// Human confirmation on a hardware device is slow
pub const DEFAULT_DEVICE_TIMEOUT_SECS: u64 = 300;

/// Wallet API base and candidate RPC nodes for one network
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkEndpoints {
    pub api_base: String,
    #[serde(default)]
    pub rpc_candidates: Vec<String>,
}

/// Asset id table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetTable {
    pub neo: Hash256,
    pub gas: Hash256,
}

impl Default for AssetTable {
    fn default() -> Self {
        Self {
            neo: Hash256::from_bytes(NEO_ASSET_BYTES),
            gas: Hash256::from_bytes(GAS_ASSET_BYTES),
        }
    }
}

/// Full pipeline configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    pub mainnet: NetworkEndpoints,
    pub testnet: NetworkEndpoints,
    pub assets: AssetTable,
    pub http_timeout_secs: u64,
    pub device_timeout_ms: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            mainnet: NetworkEndpoints {
                api_base: MAINNET_API.to_string(),
                rpc_candidates: Vec::new(),
            },
            testnet: NetworkEndpoints {
                api_base: TESTNET_API.to_string(),
                rpc_candidates: Vec::new(),
            },
            assets: AssetTable::default(),
            http_timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
            device_timeout_ms: DEFAULT_DEVICE_TIMEOUT_SECS * 1000,
        }
    }
}

/// Validation result for an endpoint URL
#[derive(Debug, Clone)]
pub struct EndpointValidation {
    pub is_valid: bool,
    pub url: Option<String>,
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
}

impl NetworkConfig {
    /// Parse overrides from JSON and validate them
    pub fn from_json(json: &str) -> NeoResult<Self> {
        let config: NetworkConfig = serde_json::from_str(json)
            .map_err(|e| NeoError::config_error(format!("Invalid configuration: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn endpoints(&self, network: Network) -> &NetworkEndpoints {
        match network {
            Network::MainNet => &self.mainnet,
            Network::TestNet => &self.testnet,
        }
    }

    pub fn asset_id(&self, kind: AssetKind) -> Hash256 {
        match kind {
            AssetKind::Neo => self.assets.neo,
            AssetKind::Gas => self.assets.gas,
        }
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    pub fn device_timeout(&self) -> Duration {
        Duration::from_millis(self.device_timeout_ms)
    }

    pub fn with_device_timeout(mut self, timeout: Duration) -> Self {
        self.device_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Check every endpoint and setting; returns collected warnings
    pub fn validate(&self) -> NeoResult<Vec<String>> {
        let mut warnings = Vec::new();
        let mut errors = Vec::new();

        for network in Network::all() {
            let endpoints = self.endpoints(network);
            let urls = std::iter::once(&endpoints.api_base).chain(endpoints.rpc_candidates.iter());
            for url in urls {
                let result = validate_endpoint(url);
                warnings.extend(result.warnings.into_iter().map(|w| format!("{}: {}", network, w)));
                errors.extend(result.errors.into_iter().map(|e| format!("{}: {}", network, e)));
            }
        }

        if self.assets.neo == self.assets.gas {
            errors.push("NEO and GAS asset ids must differ".to_string());
        }
        if self.http_timeout_secs == 0 {
            errors.push("HTTP timeout must be non-zero".to_string());
        }
        if self.device_timeout_ms == 0 {
            errors.push("Device timeout must be non-zero".to_string());
        }

        if errors.is_empty() {
            Ok(warnings)
        } else {
            Err(NeoError::config_error("Configuration is invalid").with_details(errors.join("; ")))
        }
    }
}

/// Validate an API or RPC endpoint URL
pub fn validate_endpoint(url: &str) -> EndpointValidation {
    let mut warnings = Vec::new();
    let mut errors = Vec::new();

    let parsed = match Url::parse(url) {
        Ok(u) => u,
        Err(e) => {
            errors.push(format!("Invalid URL format: {}", e));
            return EndpointValidation {
                is_valid: false,
                url: None,
                warnings,
                errors,
            };
        }
    };

    match parsed.scheme() {
        "https" => {}
        "http" => {
            let local = parsed
                .host_str()
                .map(|h| h == "localhost" || h == "127.0.0.1" || h.starts_with("192.168."))
                .unwrap_or(false);
            if !local {
                warnings.push("Plain HTTP endpoint; traffic is not encrypted".to_string());
            }
        }
        other => errors.push(format!("Unsupported URL scheme: {}", other)),
    }

    if parsed.host_str().map(str::is_empty).unwrap_or(true) {
        errors.push("URL has no host".to_string());
    }

    if !parsed.username().is_empty() || parsed.password().is_some() {
        warnings.push("Credentials in URL - consider using headers for authentication".to_string());
    }

    let is_valid = errors.is_empty();
    EndpointValidation {
        is_valid,
        url: if is_valid { Some(parsed.to_string()) } else { None },
        warnings,
        errors,
    }
}
