//! Transaction Signer
//!
//! Two backends produce the P-256 signature over unsigned transaction bytes:
//! a local private key (synchronous) and an external device (awaited with
//! a timeout). [`SigningOrchestrator`] routes a credential to its backend
//! and tracks the signing state.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use super::builder::UnsignedTransaction;
use super::observer::{NoopObserver, PipelineEvent, PipelineObserver};
use crate::crypto::{Secp256r1Curve, SIGNATURE_LEN};
use crate::error::{ErrorCode, NeoError, NeoResult};
use crate::wallet::{Credential, DevicePublicKey, PrivateKey};

// =============================================================================
// Signature
// =============================================================================

/// Signature bytes as produced by a backend
///
/// Device output is normalized to `r || s` when it is raw or DER; anything
/// else is kept as-is and refused when the witness is attached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature(#[serde(with = "crate::serde_bytes::hex_vec")] Vec<u8>);

impl Signature {
    pub fn from_raw(raw: [u8; 64]) -> Self {
        Self(raw.to_vec())
    }

    pub fn from_device(bytes: Vec<u8>) -> Self {
        if bytes.len() == SIGNATURE_LEN {
            return Self(bytes);
        }
        match Secp256r1Curve::signature_from_der(&bytes) {
            Ok(raw) => Self(raw.to_vec()),
            Err(_) => Self(bytes),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn is_well_formed(&self) -> bool {
        self.0.len() == SIGNATURE_LEN
    }

    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }
}

// =============================================================================
// Backends
// =============================================================================

/// Signs with a locally held key
pub struct LocalSigner;

impl LocalSigner {
    pub fn sign(key: &PrivateKey, unsigned: &UnsignedTransaction) -> NeoResult<Signature> {
        let raw = Secp256r1Curve::sign(key.as_bytes(), unsigned.as_bytes())?;
        Ok(Signature::from_raw(raw))
    }
}

/// External signing device
///
/// Implementations return `UserRejected` when the holder declines and
/// `DeviceUnavailable` when the device cannot be reached.
#[async_trait]
pub trait DeviceSigner: Send + Sync {
    async fn request_signature(&self, unsigned: &[u8]) -> NeoResult<Vec<u8>>;
}

// =============================================================================
// Orchestrator
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SigningState {
    Idle,
    AwaitingSignature,
    Signed,
    Failed(ErrorCode),
}

impl fmt::Display for SigningState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SigningState::Idle => f.write_str("Idle"),
            SigningState::AwaitingSignature => f.write_str("AwaitingSignature"),
            SigningState::Signed => f.write_str("Signed"),
            SigningState::Failed(code) => write!(f, "Failed({:?})", code),
        }
    }
}

/// One signing session: `Idle -> [AwaitingSignature ->] Signed | Failed`
///
/// Created per pipeline run and used once.
pub struct SigningOrchestrator {
    state: SigningState,
    history: Vec<SigningState>,
    device: Option<Arc<dyn DeviceSigner>>,
    device_timeout: Duration,
    observer: Arc<dyn PipelineObserver>,
}

impl SigningOrchestrator {
    pub fn new(device: Option<Arc<dyn DeviceSigner>>, device_timeout: Duration) -> Self {
        Self {
            state: SigningState::Idle,
            history: vec![SigningState::Idle],
            device,
            device_timeout,
            observer: Arc::new(NoopObserver),
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn PipelineObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn state(&self) -> SigningState {
        self.state
    }

    /// Every state entered, starting with `Idle`
    pub fn history(&self) -> &[SigningState] {
        &self.history
    }

    pub async fn sign(
        &mut self,
        credential: &Credential,
        unsigned: &UnsignedTransaction,
    ) -> NeoResult<Signature> {
        if self.state != SigningState::Idle {
            return Err(NeoError::internal(format!(
                "Signing session already used (state {})",
                self.state
            )));
        }

        let result = match credential {
            Credential::Local(key) => LocalSigner::sign(key, unsigned),
            Credential::Device(public_key) => self.sign_on_device(public_key, unsigned).await,
        };

        match &result {
            Ok(_) => self.transition(SigningState::Signed),
            Err(e) => self.transition(SigningState::Failed(e.code)),
        }
        result
    }

    async fn sign_on_device(
        &mut self,
        public_key: &DevicePublicKey,
        unsigned: &UnsignedTransaction,
    ) -> NeoResult<Signature> {
        let device = match &self.device {
            Some(device) => Arc::clone(device),
            None => return Err(NeoError::device_unavailable("No signing device configured")),
        };

        self.transition(SigningState::AwaitingSignature);

        let response = tokio::time::timeout(self.device_timeout, device.request_signature(unsigned.as_bytes()))
            .await
            .map_err(|_| {
                NeoError::timeout(format!(
                    "Device did not answer within {}s",
                    self.device_timeout.as_secs_f64()
                ))
            })?;

        match response {
            Ok(bytes) => {
                let signature = Signature::from_device(bytes);
                // Non-64-byte output is refused at witness attachment
                if signature.is_well_formed() {
                    verify_device_signature(public_key, unsigned, &signature)?;
                }
                Ok(signature)
            }
            Err(e) if e.is_device_failure() => Err(e),
            Err(e) => Err(NeoError::device_unavailable("Signing device failed").with_details(e.to_string())),
        }
    }

    fn transition(&mut self, to: SigningState) {
        let from = self.state;
        self.state = to;
        self.history.push(to);
        self.observer.on_event(&PipelineEvent::SigningTransition { from, to });
    }
}

/// The device must have signed with the key the credential names
fn verify_device_signature(
    public_key: &DevicePublicKey,
    unsigned: &UnsignedTransaction,
    signature: &Signature,
) -> NeoResult<()> {
    if Secp256r1Curve::verify(public_key.as_bytes(), unsigned.as_bytes(), signature.as_bytes())? {
        Ok(())
    } else {
        Err(NeoError::malformed_signature(
            "Device signature does not verify against the account public key",
        ))
    }
}
