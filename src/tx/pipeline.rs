//! Transaction Pipeline
//!
//! `send_asset` and `claim_all_available` drive one run through
//! selection, serialization, signing, witness attachment and broadcast.
//! Every run gets its own signing session; runs share nothing mutable.

use std::sync::Arc;

use super::broadcaster::{BroadcastDispatcher, JsonRpcTransport, Transport};
use super::builder::{build_claim, build_transfer, TransferOutputs, UnsignedTransaction};
use super::observer::{LoggingObserver, Operation, PipelineEvent, PipelineObserver, Stage};
use super::signer::{DeviceSigner, SigningOrchestrator, SigningState};
use super::witness::{attach_witness, SignedTransaction};
use crate::api::providers::{BalanceGateway, WalletApiClient};
use crate::api::resolver::{ConfiguredResolver, EndpointResolver};
use crate::api::rpc::RpcClient;
use crate::error::NeoResult;
use crate::types::{AssetKind, BroadcastResult, Fixed8, Network};
use crate::utils::http::HttpClient;
use crate::utils::network_config::NetworkConfig;
use crate::wallet::{decode_address, select_unspent_with, Account, Credential, UtxoSelectionStrategy};

/// Signed placeholder plus the states its session went through
#[derive(Debug, Clone)]
pub struct PlaceholderSignature {
    pub signed: SignedTransaction,
    pub states: Vec<SigningState>,
}

pub struct TransactionPipeline {
    config: Arc<NetworkConfig>,
    gateway: Arc<dyn BalanceGateway>,
    resolver: Arc<dyn EndpointResolver>,
    dispatcher: BroadcastDispatcher,
    device: Option<Arc<dyn DeviceSigner>>,
    observer: Arc<dyn PipelineObserver>,
    strategy: UtxoSelectionStrategy,
}

impl TransactionPipeline {
    pub fn new(
        config: Arc<NetworkConfig>,
        gateway: Arc<dyn BalanceGateway>,
        resolver: Arc<dyn EndpointResolver>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self {
            config,
            gateway,
            resolver,
            dispatcher: BroadcastDispatcher::new(transport),
            device: None,
            observer: Arc::new(LoggingObserver),
            strategy: UtxoSelectionStrategy::default(),
        }
    }

    /// Wire the pipeline to the wallet API and JSON-RPC nodes in `config`
    pub fn live(config: NetworkConfig) -> NeoResult<Self> {
        for warning in config.validate()? {
            crate::log_warn!("pipeline", "Network config warning", detail = warning);
        }

        let config = Arc::new(config);
        let http = HttpClient::new(config.http_timeout())?;
        let api = WalletApiClient::new(http.clone(), Arc::clone(&config));
        let rpc = RpcClient::new(http);

        let resolver = ConfiguredResolver::new(Arc::clone(&config), api.clone(), Arc::new(rpc.clone()));

        Ok(Self::new(
            config,
            Arc::new(api),
            Arc::new(resolver),
            Arc::new(JsonRpcTransport::new(rpc)),
        ))
    }

    pub fn with_device(mut self, device: Arc<dyn DeviceSigner>) -> Self {
        self.device = Some(device);
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn PipelineObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn with_strategy(mut self, strategy: UtxoSelectionStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn config(&self) -> &NetworkConfig {
        &self.config
    }

    /// Transfer `amount` of `asset` from the credential's account to `to_address`
    pub async fn send_asset(
        &self,
        network: Network,
        to_address: &str,
        credential: &Credential,
        asset: AssetKind,
        amount: Fixed8,
    ) -> NeoResult<BroadcastResult> {
        self.emit(PipelineEvent::Started {
            operation: Operation::SendAsset,
            network,
            device: credential.is_device(),
        });

        let recipient = self.stage(Stage::Account, decode_address(to_address))?;
        let account = self.stage(Stage::Account, credential.account())?;

        let balance = self.stage(
            Stage::Lookup,
            self.gateway.get_balance(network, &account.address).await,
        )?;
        let coins = balance.into_coin_set(asset, self.config.asset_id(asset));
        self.emit(PipelineEvent::CoinsLoaded {
            asset,
            outputs: coins.list.len(),
        });

        let selection = self.stage(
            Stage::Selection,
            select_unspent_with(&coins, amount, self.strategy),
        )?;
        self.emit(PipelineEvent::Selected {
            inputs: selection.input_count(),
            change: selection.change,
        });

        let outputs = TransferOutputs {
            asset_id: coins.asset_id,
            recipient,
            sender: account.script_hash,
            amount,
        };
        let unsigned = self.stage(Stage::Serialization, build_transfer(&selection, &outputs))?;

        self.sign_and_broadcast(network, credential, &account, unsigned).await
    }

    /// Claim every GAS amount the credential's account can currently claim
    pub async fn claim_all_available(
        &self,
        network: Network,
        credential: &Credential,
    ) -> NeoResult<BroadcastResult> {
        self.emit(PipelineEvent::Started {
            operation: Operation::ClaimAll,
            network,
            device: credential.is_device(),
        });

        let account = self.stage(Stage::Account, credential.account())?;

        let claims = self.stage(
            Stage::Lookup,
            self.gateway.get_claims(network, &account.address).await,
        )?;
        self.emit(PipelineEvent::ClaimsLoaded {
            claims: claims.claims.len(),
            total: claims.total,
        });

        let unsigned = self.stage(
            Stage::Serialization,
            build_claim(
                &claims,
                &self.config.asset_id(AssetKind::Gas),
                &account.script_hash,
            ),
        )?;

        self.sign_and_broadcast(network, credential, &account, unsigned).await
    }

    /// Sign the fixed placeholder payload with no lookup or broadcast
    ///
    /// Exercises a credential (typically a device) end to end.
    pub async fn sign_placeholder(&self, credential: &Credential) -> NeoResult<PlaceholderSignature> {
        let account = self.stage(Stage::Account, credential.account())?;
        let unsigned = UnsignedTransaction::placeholder();
        let mut session = self.session();
        let signature = self.stage(Stage::Signing, session.sign(credential, &unsigned).await)?;
        let signed = self.stage(
            Stage::Witness,
            attach_witness(unsigned, &signature, &account.public_key),
        )?;
        Ok(PlaceholderSignature {
            signed,
            states: session.history().to_vec(),
        })
    }

    async fn sign_and_broadcast(
        &self,
        network: Network,
        credential: &Credential,
        account: &Account,
        unsigned: UnsignedTransaction,
    ) -> NeoResult<BroadcastResult> {
        self.emit(PipelineEvent::Serialized {
            kind: unsigned.kind(),
            bytes: unsigned.len(),
        });

        let mut session = self.session();
        let signature = self.stage(Stage::Signing, session.sign(credential, &unsigned).await)?;

        let signed = self.stage(
            Stage::Witness,
            attach_witness(unsigned, &signature, &account.public_key),
        )?;
        self.emit(PipelineEvent::WitnessAttached {
            txid: signed.txid().to_string(),
        });

        let endpoint = self.stage(Stage::Resolution, self.resolver.resolve(network).await)?;
        self.emit(PipelineEvent::EndpointResolved {
            endpoint: endpoint.clone(),
        });

        let result = self.stage(
            Stage::Broadcast,
            self.dispatcher.dispatch(network, &endpoint, &signed).await,
        )?;
        self.emit(PipelineEvent::Broadcast {
            txid: result.txid.clone(),
            accepted: result.accepted,
        });
        Ok(result)
    }

    fn session(&self) -> SigningOrchestrator {
        SigningOrchestrator::new(self.device.clone(), self.config.device_timeout())
            .with_observer(Arc::clone(&self.observer))
    }

    fn stage<T>(&self, stage: Stage, result: NeoResult<T>) -> NeoResult<T> {
        if let Err(e) = &result {
            self.emit(PipelineEvent::failed(stage, e));
        }
        result
    }

    fn emit(&self, event: PipelineEvent) {
        self.observer.on_event(&event);
    }
}
