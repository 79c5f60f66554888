//! Transaction Module
//!
//! Handles transaction building, signing, witness attachment and broadcasting.

pub mod broadcaster;
pub mod builder;
pub mod device;
pub mod observer;
pub mod pipeline;
pub mod signer;
pub mod witness;

pub use broadcaster::{BroadcastDispatcher, JsonRpcTransport, SubmitOutcome, Transport};
pub use builder::{build_claim, build_transfer, TransactionKind, TransferOutputs, UnsignedTransaction};
pub use device::{DeviceChannel, DeviceRequests, DeviceResponse, SignatureRequest};
pub use observer::{
    LoggingObserver, NoopObserver, Operation, PipelineEvent, PipelineObserver, RecordingObserver, Stage,
};
pub use pipeline::{PlaceholderSignature, TransactionPipeline};
pub use signer::{DeviceSigner, LocalSigner, Signature, SigningOrchestrator, SigningState};
pub use witness::{attach_witness, SignedTransaction, Witness};
