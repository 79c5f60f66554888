//! Pipeline Observation
//!
//! Stages report progress as [`PipelineEvent`]s to an injected observer
//! instead of logging directly.

use std::sync::Mutex;

use super::builder::TransactionKind;
use super::signer::SigningState;
use crate::error::{ErrorCode, NeoError};
use crate::types::{AssetKind, Fixed8, Network};
use crate::utils::logging::{LogEntry, LogLevel};

const MODULE: &str = "pipeline";

/// Entry point a run started from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    SendAsset,
    ClaimAll,
}

/// Stage that produced a failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Account,
    Lookup,
    Selection,
    Serialization,
    Signing,
    Witness,
    Resolution,
    Broadcast,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PipelineEvent {
    Started {
        operation: Operation,
        network: Network,
        device: bool,
    },
    CoinsLoaded {
        asset: AssetKind,
        outputs: usize,
    },
    ClaimsLoaded {
        claims: usize,
        total: Fixed8,
    },
    Selected {
        inputs: usize,
        change: Fixed8,
    },
    Serialized {
        kind: TransactionKind,
        bytes: usize,
    },
    SigningTransition {
        from: SigningState,
        to: SigningState,
    },
    WitnessAttached {
        txid: String,
    },
    EndpointResolved {
        endpoint: String,
    },
    Broadcast {
        txid: String,
        accepted: bool,
    },
    Failed {
        stage: Stage,
        code: ErrorCode,
        message: String,
    },
}

impl PipelineEvent {
    pub fn failed(stage: Stage, error: &NeoError) -> Self {
        PipelineEvent::Failed {
            stage,
            code: error.code,
            message: error.message.clone(),
        }
    }

    /// Structured, redacted log entry for this event
    pub fn to_log_entry(&self) -> LogEntry {
        match self {
            PipelineEvent::Started {
                operation,
                network,
                device,
            } => LogEntry::new(LogLevel::Info, MODULE, "Pipeline started")
                .field("operation", format!("{:?}", operation))
                .field("network", network)
                .field("device", device),
            PipelineEvent::CoinsLoaded { asset, outputs } => {
                LogEntry::new(LogLevel::Debug, MODULE, "Unspent outputs loaded")
                    .field("asset", asset)
                    .field("outputs", outputs)
            }
            PipelineEvent::ClaimsLoaded { claims, total } => {
                LogEntry::new(LogLevel::Debug, MODULE, "Claims loaded")
                    .field("claims", claims)
                    .field("total", total)
            }
            PipelineEvent::Selected { inputs, change } => {
                LogEntry::new(LogLevel::Debug, MODULE, "Inputs selected")
                    .field("inputs", inputs)
                    .field("change", change)
            }
            PipelineEvent::Serialized { kind, bytes } => {
                LogEntry::new(LogLevel::Debug, MODULE, "Transaction serialized")
                    .field("kind", format!("{:?}", kind))
                    .field("bytes", bytes)
            }
            PipelineEvent::SigningTransition { from, to } => {
                LogEntry::new(LogLevel::Debug, MODULE, "Signing state changed")
                    .field("from", from)
                    .field("state", to)
            }
            PipelineEvent::WitnessAttached { txid } => {
                LogEntry::new(LogLevel::Debug, MODULE, "Witness attached").field("txid", txid)
            }
            PipelineEvent::EndpointResolved { endpoint } => {
                LogEntry::new(LogLevel::Debug, MODULE, "Endpoint resolved").field("endpoint", endpoint)
            }
            PipelineEvent::Broadcast { txid, accepted } => {
                let level = if *accepted { LogLevel::Info } else { LogLevel::Warn };
                LogEntry::new(level, MODULE, "Broadcast finished")
                    .field("txid", txid)
                    .field("accepted", accepted)
            }
            PipelineEvent::Failed {
                stage,
                code,
                message,
            } => LogEntry::new(LogLevel::Error, MODULE, "Pipeline failed")
                .field("stage", format!("{:?}", stage))
                .field("code", format!("{:?}", code))
                .field("message", message),
        }
    }
}

pub trait PipelineObserver: Send + Sync {
    fn on_event(&self, event: &PipelineEvent);
}

/// Writes every event as a redacted log line
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingObserver;

impl PipelineObserver for LoggingObserver {
    fn on_event(&self, event: &PipelineEvent) {
        event.to_log_entry().log();
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl PipelineObserver for NoopObserver {
    fn on_event(&self, _event: &PipelineEvent) {}
}

/// Keeps every event in memory
#[derive(Debug, Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<PipelineEvent>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<PipelineEvent> {
        match self.events.lock() {
            Ok(events) => events.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Signing states entered, in order
    pub fn signing_states(&self) -> Vec<SigningState> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                PipelineEvent::SigningTransition { to, .. } => Some(to),
                _ => None,
            })
            .collect()
    }
}

impl PipelineObserver for RecordingObserver {
    fn on_event(&self, event: &PipelineEvent) {
        match self.events.lock() {
            Ok(mut events) => events.push(event.clone()),
            Err(poisoned) => poisoned.into_inner().push(event.clone()),
        }
    }
}
