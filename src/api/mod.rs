//! API Module
//!
//! Collaborators the pipeline talks to: the wallet REST API, JSON-RPC nodes
//! and endpoint resolution.

pub mod providers;
pub mod resolver;
pub mod rpc;

pub use providers::{BalanceGateway, HistoryEntry, WalletApiClient};
pub use resolver::{
    BestNodeResolver, ConfiguredResolver, EndpointResolver, FixedEndpointResolver, HighestHeightResolver,
};
pub use rpc::{HeightProbe, RpcClient, RpcErrorObject, RpcResponse};
