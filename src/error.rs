//! Unified error types for the dispatch pipeline
//!
//! Every stage reports failures through [`NeoError`] so callers get one
//! typed result regardless of which collaborator failed.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Main error type for all pipeline operations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NeoError {
    pub code: ErrorCode,
    pub message: String,
    pub details: Option<String>,
}

impl NeoError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    // Convenience constructors
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidInput, msg)
    }

    pub fn invalid_address(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidAddress, msg)
    }

    pub fn invalid_key(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidKey, msg)
    }

    pub fn invalid_transaction(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidTransaction, msg)
    }

    pub fn insufficient_funds(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::InsufficientFunds, msg)
    }

    pub fn malformed_signature(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::MalformedSignature, msg)
    }

    pub fn device_unavailable(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::DeviceUnavailable, msg)
    }

    pub fn user_rejected(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::UserRejected, msg)
    }

    pub fn timeout(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::Timeout, msg)
    }

    pub fn transport(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::TransportError, msg)
    }

    pub fn rejected(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::Rejected, msg)
    }

    pub fn parse_error(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::ParseError, msg)
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::ConfigError, msg)
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::Internal, msg)
    }

    /// True for failures coming from the signing device
    pub fn is_device_failure(&self) -> bool {
        matches!(
            self.code,
            ErrorCode::DeviceUnavailable | ErrorCode::UserRejected | ErrorCode::Timeout
        )
    }
}

impl fmt::Display for NeoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)?;
        if let Some(ref details) = self.details {
            write!(f, " ({})", details)?;
        }
        Ok(())
    }
}

impl std::error::Error for NeoError {}

/// Error codes for categorization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    // Input errors
    InvalidInput,
    InvalidAddress,
    InvalidKey,
    InvalidTransaction,

    // Selection
    InsufficientFunds,

    // Signing / witness
    MalformedSignature,

    // Device backend
    DeviceUnavailable,
    UserRejected,
    Timeout,

    // Network
    TransportError,
    Rejected,

    // Parse errors
    ParseError,
    JsonError,
    HexError,

    // Internal
    ConfigError,
    Internal,
}

/// Result type alias for pipeline operations
pub type NeoResult<T> = Result<T, NeoError>;

// Conversions from common error types

impl From<serde_json::Error> for NeoError {
    fn from(e: serde_json::Error) -> Self {
        NeoError::new(ErrorCode::JsonError, e.to_string())
    }
}

impl From<hex::FromHexError> for NeoError {
    fn from(e: hex::FromHexError) -> Self {
        NeoError::new(ErrorCode::HexError, e.to_string())
    }
}

impl From<url::ParseError> for NeoError {
    fn from(e: url::ParseError) -> Self {
        NeoError::new(ErrorCode::ConfigError, format!("Invalid URL: {}", e))
    }
}

impl From<reqwest::Error> for NeoError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            NeoError::transport("Request timed out")
        } else if e.is_connect() {
            NeoError::transport("Connection failed")
        } else if e.is_decode() {
            NeoError::parse_error(format!("Malformed response body: {}", e))
        } else {
            NeoError::transport(e.to_string())
        }
    }
}
