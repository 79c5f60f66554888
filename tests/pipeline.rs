use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use neo_dispatch::api::{BalanceGateway, FixedEndpointResolver};
use neo_dispatch::crypto::Secp256r1Curve;
use neo_dispatch::tx::observer::Stage;
use neo_dispatch::tx::{
    DeviceChannel, DeviceResponse, PipelineEvent, RecordingObserver, SubmitOutcome, TransactionPipeline,
    Transport,
};
use neo_dispatch::types::{
    AccountBalance, AssetBalance, ClaimAmounts, ClaimSet, ClaimableOutput, UnspentOutput,
};
use neo_dispatch::{
    AssetKind, Credential, DevicePublicKey, ErrorCode, Fixed8, Hash256, Network, NetworkConfig, NeoResult,
    PrivateKey, SigningState,
};
use serde_json::Value;

const KEY_HEX: &str = "7d128a6d096f0c14c3a25a2b0c41cf79661bfcb4a8cc95aaaea28bde4d732344";
const KEY_ADDRESS: &str = "ALq7AWrhAueN6mJNqk6FHJjnsEoPRytLdW";
const KEY_SCRIPT_HASH: &str = "3775292229eccdf904f16fff8e83e7cffdc0f0ce";
const RECIPIENT: &str = "AR6NuGFzZfzqbXR3YasfXNmR3VHVNKi2yo";
const ENDPOINT: &str = "http://localhost:20332";

// =============================================================================
// Fakes
// =============================================================================

struct FakeGateway {
    gas: Vec<i64>,
    claims: Vec<i64>,
}

fn gas_id() -> Hash256 {
    NetworkConfig::default().asset_id(AssetKind::Gas)
}

#[async_trait]
impl BalanceGateway for FakeGateway {
    async fn get_balance(&self, _network: Network, address: &str) -> NeoResult<AccountBalance> {
        let unspent: Vec<UnspentOutput> = self
            .gas
            .iter()
            .enumerate()
            .map(|(i, units)| UnspentOutput {
                asset_id: gas_id(),
                txid: Hash256::from_bytes([0xA0 + i as u8; 32]),
                index: i as u16,
                value: Fixed8::from_units(*units).unwrap(),
            })
            .collect();
        Ok(AccountBalance {
            address: address.to_string(),
            neo: AssetBalance {
                balance: Fixed8::ZERO,
                unspent: vec![],
            },
            gas: AssetBalance {
                balance: Fixed8::from_units(self.gas.iter().sum()).unwrap(),
                unspent,
            },
        })
    }

    async fn get_claim_amounts(&self, _network: Network, _address: &str) -> NeoResult<ClaimAmounts> {
        Ok(ClaimAmounts {
            available: Fixed8::from_units(self.claims.iter().sum()).unwrap(),
            unavailable: Fixed8::ZERO,
        })
    }

    async fn get_claims(&self, _network: Network, _address: &str) -> NeoResult<ClaimSet> {
        Ok(ClaimSet {
            claims: self
                .claims
                .iter()
                .enumerate()
                .map(|(i, units)| ClaimableOutput {
                    txid: Hash256::from_bytes([0xC0 + i as u8; 32]),
                    index: i as u16,
                    value: Fixed8::from_units(*units).unwrap(),
                })
                .collect(),
            total: Fixed8::from_units(self.claims.iter().sum()).unwrap(),
        })
    }
}

#[derive(Default)]
struct RecordingTransport {
    decline: bool,
    submitted: Mutex<Vec<(String, String)>>,
}

impl RecordingTransport {
    fn submitted(&self) -> Vec<(String, String)> {
        self.submitted.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn submit_transaction(&self, endpoint: &str, raw_hex: &str) -> NeoResult<SubmitOutcome> {
        self.submitted
            .lock()
            .unwrap()
            .push((endpoint.to_string(), raw_hex.to_string()));
        Ok(SubmitOutcome {
            accepted: !self.decline,
            detail: serde_json::json!({ "jsonrpc": "2.0", "id": 4, "result": !self.decline }),
        })
    }
}

struct Harness {
    pipeline: TransactionPipeline,
    transport: Arc<RecordingTransport>,
    observer: Arc<RecordingObserver>,
}

fn harness(gateway: FakeGateway, transport: RecordingTransport) -> Harness {
    let config = NetworkConfig::default().with_device_timeout(Duration::from_millis(250));
    let transport = Arc::new(transport);
    let observer = Arc::new(RecordingObserver::new());
    let pipeline = TransactionPipeline::new(
        Arc::new(config),
        Arc::new(gateway),
        Arc::new(FixedEndpointResolver::new(ENDPOINT)),
        transport.clone(),
    )
    .with_observer(observer.clone());
    Harness {
        pipeline,
        transport,
        observer,
    }
}

fn local_credential() -> Credential {
    Credential::Local(PrivateKey::from_hex(KEY_HEX).unwrap())
}

fn device_credential() -> Credential {
    let key = PrivateKey::from_hex(KEY_HEX).unwrap();
    Credential::Device(DevicePublicKey::from_bytes(&key.public_key().unwrap()).unwrap())
}

/// Drives a device that waits `delay` and then answers with `respond`
fn spawn_device<F>(delay: Duration, respond: F) -> DeviceChannel
where
    F: Fn(&[u8]) -> DeviceResponse + Send + 'static,
{
    let (channel, mut requests) = DeviceChannel::new(1);
    tokio::spawn(async move {
        while let Some(request) = requests.next().await {
            tokio::time::sleep(delay).await;
            let response = respond(request.payload());
            request.respond(response);
        }
    });
    channel
}

fn signing_device(payload: &[u8]) -> DeviceResponse {
    let key = hex::decode(KEY_HEX).unwrap();
    DeviceResponse::Signed(Secp256r1Curve::sign(&key, payload).unwrap().to_vec())
}

fn failed_stages(observer: &RecordingObserver) -> Vec<(Stage, ErrorCode)> {
    observer
        .events()
        .into_iter()
        .filter_map(|e| match e {
            PipelineEvent::Failed { stage, code, .. } => Some((stage, code)),
            _ => None,
        })
        .collect()
}

fn serialized_count(observer: &RecordingObserver) -> usize {
    observer
        .events()
        .iter()
        .filter(|e| matches!(e, PipelineEvent::Serialized { .. }))
        .count()
}

// =============================================================================
// send_asset
// =============================================================================

#[tokio::test]
async fn send_gas_with_change() {
    let h = harness(FakeGateway { gas: vec![5], claims: vec![] }, RecordingTransport::default());

    let result = h
        .pipeline
        .send_asset(Network::TestNet, RECIPIENT, &local_credential(), AssetKind::Gas, Fixed8::from_units(3).unwrap())
        .await
        .unwrap();

    assert!(result.accepted);
    assert_eq!(result.endpoint, ENDPOINT);

    let submitted = h.transport.submitted();
    assert_eq!(submitted.len(), 1);
    let raw = hex::decode(&submitted[0].1).unwrap();

    assert_eq!(&raw[..4], &[0x80, 0x00, 0x00, 0x01]);
    assert_eq!(&raw[4..36], &[0xA0; 32]);
    assert_eq!(&raw[36..38], &[0x00, 0x00]);
    assert_eq!(raw[38], 0x02);

    // Recipient output
    assert_eq!(&raw[39..71], &gas_id().to_wire());
    assert_eq!(&raw[71..79], &300_000_000i64.to_le_bytes());
    let recipient_hash = neo_dispatch::wallet::decode_address(RECIPIENT).unwrap();
    assert_eq!(&raw[79..99], recipient_hash.as_bytes());

    // Change output back to the sender
    assert_eq!(&raw[99..131], &gas_id().to_wire());
    assert_eq!(&raw[131..139], &200_000_000i64.to_le_bytes());
    assert_eq!(hex::encode(&raw[139..159]), KEY_SCRIPT_HASH);

    // Witness
    assert_eq!(raw.len(), 159 + 103);
    assert_eq!(&raw[159..162], &[0x01, 0x41, 0x40]);

    let public_key = PrivateKey::from_hex(KEY_HEX).unwrap().public_key().unwrap();
    assert!(Secp256r1Curve::verify(&public_key, &raw[..159], &raw[162..226]).unwrap());

    assert!(h
        .observer
        .events()
        .contains(&PipelineEvent::Selected { inputs: 1, change: Fixed8::from_units(2).unwrap() }));
}

#[tokio::test]
async fn exact_amount_has_no_change_output() {
    let h = harness(FakeGateway { gas: vec![2, 1], claims: vec![] }, RecordingTransport::default());

    h.pipeline
        .send_asset(Network::TestNet, RECIPIENT, &local_credential(), AssetKind::Gas, Fixed8::from_units(3).unwrap())
        .await
        .unwrap();

    let raw = hex::decode(&h.transport.submitted()[0].1).unwrap();
    assert_eq!(raw[3], 0x02);
    // Two inputs of 34 bytes, then a single output
    assert_eq!(raw[4 + 68], 0x01);
    assert_eq!(raw.len(), 4 + 68 + 1 + 60 + 103);
}

#[tokio::test]
async fn insufficient_funds_stops_before_serialization() {
    let h = harness(FakeGateway { gas: vec![1], claims: vec![] }, RecordingTransport::default());

    let err = h
        .pipeline
        .send_asset(Network::TestNet, RECIPIENT, &local_credential(), AssetKind::Gas, Fixed8::from_units(5).unwrap())
        .await
        .unwrap_err();

    assert_eq!(err.code, ErrorCode::InsufficientFunds);
    assert_eq!(serialized_count(&h.observer), 0);
    assert!(h.transport.submitted().is_empty());
    assert_eq!(failed_stages(&h.observer), vec![(Stage::Selection, ErrorCode::InsufficientFunds)]);
}

#[tokio::test]
async fn invalid_recipient_is_rejected_up_front() {
    let h = harness(FakeGateway { gas: vec![5], claims: vec![] }, RecordingTransport::default());

    let err = h
        .pipeline
        .send_asset(Network::TestNet, "Anot-an-address", &local_credential(), AssetKind::Gas, Fixed8::ONE)
        .await
        .unwrap_err();

    assert_eq!(err.code, ErrorCode::InvalidAddress);
    assert!(h.transport.submitted().is_empty());
}

#[tokio::test]
async fn local_signing_skips_awaiting_state() {
    let h = harness(FakeGateway { gas: vec![5], claims: vec![] }, RecordingTransport::default());

    h.pipeline
        .send_asset(Network::TestNet, RECIPIENT, &local_credential(), AssetKind::Gas, Fixed8::ONE)
        .await
        .unwrap();

    assert_eq!(h.observer.signing_states(), vec![SigningState::Signed]);
}

#[tokio::test]
async fn device_signing_waits_for_signature() {
    let h = harness(FakeGateway { gas: vec![5], claims: vec![] }, RecordingTransport::default());
    let device = spawn_device(Duration::from_millis(50), signing_device);
    let pipeline = h.pipeline.with_device(Arc::new(device));

    let result = pipeline
        .send_asset(Network::TestNet, RECIPIENT, &device_credential(), AssetKind::Gas, Fixed8::ONE)
        .await
        .unwrap();

    assert!(result.accepted);
    assert_eq!(
        h.observer.signing_states(),
        vec![SigningState::AwaitingSignature, SigningState::Signed]
    );

    let raw = hex::decode(&h.transport.submitted()[0].1).unwrap();
    let body = raw.len() - 103;
    let public_key = PrivateKey::from_hex(KEY_HEX).unwrap().public_key().unwrap();
    assert!(Secp256r1Curve::verify(&public_key, &raw[..body], &raw[body + 3..body + 67]).unwrap());
}

#[tokio::test]
async fn device_rejection_never_broadcasts() {
    let h = harness(FakeGateway { gas: vec![5], claims: vec![] }, RecordingTransport::default());
    let device = spawn_device(Duration::from_millis(10), |_| DeviceResponse::Rejected("declined".into()));
    let pipeline = h.pipeline.with_device(Arc::new(device));

    let err = pipeline
        .send_asset(Network::TestNet, RECIPIENT, &device_credential(), AssetKind::Gas, Fixed8::ONE)
        .await
        .unwrap_err();

    assert_eq!(err.code, ErrorCode::UserRejected);
    assert_eq!(
        h.observer.signing_states(),
        vec![SigningState::AwaitingSignature, SigningState::Failed(ErrorCode::UserRejected)]
    );
    assert_eq!(failed_stages(&h.observer), vec![(Stage::Signing, ErrorCode::UserRejected)]);
    assert!(h.transport.submitted().is_empty());
}

#[tokio::test]
async fn device_timeout_fails_signing() {
    let h = harness(FakeGateway { gas: vec![5], claims: vec![] }, RecordingTransport::default());
    let device = spawn_device(Duration::from_secs(2), signing_device);
    let pipeline = h.pipeline.with_device(Arc::new(device));

    let err = pipeline
        .send_asset(Network::TestNet, RECIPIENT, &device_credential(), AssetKind::Gas, Fixed8::ONE)
        .await
        .unwrap_err();

    assert_eq!(err.code, ErrorCode::Timeout);
    assert_eq!(
        h.observer.signing_states(),
        vec![SigningState::AwaitingSignature, SigningState::Failed(ErrorCode::Timeout)]
    );
    assert!(h.transport.submitted().is_empty());
}

#[tokio::test]
async fn malformed_device_signature_is_refused() {
    let h = harness(FakeGateway { gas: vec![5], claims: vec![] }, RecordingTransport::default());
    let device = spawn_device(Duration::ZERO, |_| DeviceResponse::Signed(vec![0x30, 0x01, 0x02]));
    let pipeline = h.pipeline.with_device(Arc::new(device));

    let err = pipeline
        .send_asset(Network::TestNet, RECIPIENT, &device_credential(), AssetKind::Gas, Fixed8::ONE)
        .await
        .unwrap_err();

    assert_eq!(err.code, ErrorCode::MalformedSignature);
    assert_eq!(failed_stages(&h.observer), vec![(Stage::Witness, ErrorCode::MalformedSignature)]);
    assert!(h.transport.submitted().is_empty());
}

#[tokio::test]
async fn device_signing_with_wrong_key_never_broadcasts() {
    let h = harness(FakeGateway { gas: vec![5], claims: vec![] }, RecordingTransport::default());
    let device = spawn_device(Duration::ZERO, |payload| {
        DeviceResponse::Signed(Secp256r1Curve::sign(&[0x2a; 32], payload).unwrap().to_vec())
    });
    let pipeline = h.pipeline.with_device(Arc::new(device));

    let err = pipeline
        .send_asset(Network::TestNet, RECIPIENT, &device_credential(), AssetKind::Gas, Fixed8::ONE)
        .await
        .unwrap_err();

    assert_eq!(err.code, ErrorCode::MalformedSignature);
    assert_eq!(failed_stages(&h.observer), vec![(Stage::Signing, ErrorCode::MalformedSignature)]);
    assert!(h.transport.submitted().is_empty());
}

#[tokio::test]
async fn declined_broadcast_is_reported() {
    let h = harness(
        FakeGateway { gas: vec![5], claims: vec![] },
        RecordingTransport {
            decline: true,
            ..Default::default()
        },
    );

    let err = h
        .pipeline
        .send_asset(Network::TestNet, RECIPIENT, &local_credential(), AssetKind::Gas, Fixed8::ONE)
        .await
        .unwrap_err();

    assert_eq!(err.code, ErrorCode::Rejected);
    assert_eq!(h.transport.submitted().len(), 1);
    assert_eq!(failed_stages(&h.observer), vec![(Stage::Broadcast, ErrorCode::Rejected)]);
}

// =============================================================================
// claim_all_available
// =============================================================================

#[tokio::test]
async fn claim_all_credits_total() {
    let h = harness(FakeGateway { gas: vec![], claims: vec![1, 2] }, RecordingTransport::default());

    let result = h
        .pipeline
        .claim_all_available(Network::MainNet, &local_credential())
        .await
        .unwrap();
    assert_eq!(result.network, Network::MainNet);

    let raw = hex::decode(&h.transport.submitted()[0].1).unwrap();
    assert_eq!(&raw[..3], &[0x02, 0x00, 0x02]);
    assert_eq!(&raw[3..35], &[0xC0; 32]);
    assert_eq!(&raw[37..69], &[0xC1; 32]);
    assert_eq!(&raw[69..71], &[0x01, 0x00]);
    assert_eq!(&raw[71..74], &[0x00, 0x00, 0x01]);
    assert_eq!(&raw[74..106], &gas_id().to_wire());
    assert_eq!(&raw[106..114], &300_000_000i64.to_le_bytes());
    assert_eq!(hex::encode(&raw[114..134]), KEY_SCRIPT_HASH);
    assert_eq!(raw.len(), 134 + 103);

    assert!(h.observer.events().contains(&PipelineEvent::ClaimsLoaded {
        claims: 2,
        total: Fixed8::from_units(3).unwrap(),
    }));
}

#[tokio::test]
async fn nothing_to_claim() {
    let h = harness(FakeGateway { gas: vec![], claims: vec![] }, RecordingTransport::default());

    let err = h
        .pipeline
        .claim_all_available(Network::TestNet, &local_credential())
        .await
        .unwrap_err();

    assert_eq!(err.code, ErrorCode::InvalidInput);
    assert_eq!(failed_stages(&h.observer), vec![(Stage::Serialization, ErrorCode::InvalidInput)]);
    assert!(h.transport.submitted().is_empty());
}

// =============================================================================
// Placeholder
// =============================================================================

#[tokio::test]
async fn placeholder_signing_on_device() {
    let h = harness(FakeGateway { gas: vec![], claims: vec![] }, RecordingTransport::default());
    let device = spawn_device(Duration::from_millis(10), signing_device);
    let pipeline = h.pipeline.with_device(Arc::new(device));

    let result = pipeline.sign_placeholder(&device_credential()).await.unwrap();

    assert!(result.signed.is_placeholder());
    assert_eq!(result.signed.unsigned_bytes(), &[0u8; 13][..]);
    assert_eq!(
        result.states,
        vec![SigningState::Idle, SigningState::AwaitingSignature, SigningState::Signed]
    );
    assert!(h.transport.submitted().is_empty());
}

#[test]
fn account_derivation_matches_known_address() {
    let account = local_credential().account().unwrap();
    assert_eq!(account.address, KEY_ADDRESS);
    assert_eq!(account.script_hash.to_hex(), KEY_SCRIPT_HASH);

    let detail: Value = serde_json::to_value(&account).unwrap();
    assert_eq!(detail["address"], KEY_ADDRESS);
}
