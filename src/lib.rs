//! NEO Dispatch
//!
//! Builds, signs and broadcasts NEO v2 UTXO transactions.
//!
//! # Architecture
//!
//! - **wallet**: Account encoding, credentials, unspent output selection
//! - **tx**: Serialization, signing sessions, witnesses, broadcast
//! - **api**: Light wallet API and JSON-RPC clients, endpoint resolution
//! - **utils**: HTTP, structured logging, network configuration
//!
//! # Security
//!
//! Private keys are held in `zeroize` buffers and never logged.
//!
//! # Example
//!
//! ```rust,ignore
//! use neo_dispatch::{AssetKind, Credential, Fixed8, Network, NetworkConfig, PrivateKey, TransactionPipeline};
//!
//! let pipeline = TransactionPipeline::live(NetworkConfig::default())?;
//! let credential = Credential::Local(PrivateKey::from_wif(wif)?);
//! let result = pipeline
//!     .send_asset(Network::TestNet, "AR6NuGFzZfzqbXR3YasfXNmR3VHVNKi2yo", &credential, AssetKind::Gas, "1.5".parse()?)
//!     .await?;
//! println!("txid: {}", result.txid);
//! ```

pub mod api;
pub mod crypto;
pub mod error;
pub mod serde_bytes;
pub mod tx;
pub mod types;
pub mod utils;
pub mod wallet;

pub use error::{ErrorCode, NeoError, NeoResult};
pub use tx::{
    DeviceChannel, DeviceSigner, PipelineEvent, PipelineObserver, SigningState, TransactionPipeline,
};
pub use types::{AssetKind, BroadcastResult, Fixed8, Hash256, Network, ScriptHash};
pub use utils::network_config::NetworkConfig;
pub use wallet::{Account, Credential, DevicePublicKey, PrivateKey};
