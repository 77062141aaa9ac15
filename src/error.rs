//! Unified error types for the identity engine
//!
//! Every fallible operation returns an [`IdentityError`] carrying an
//! [`ErrorCode`] so callers can branch on the category without parsing text.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::api::ChainSourceError;

/// Main error type for all identity operations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityError {
    pub code: ErrorCode,
    pub message: String,
    pub details: Option<String>,
}

impl IdentityError {
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
    pub fn invalid_seed(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidSeed, msg)
    }

    pub fn unsupported_path(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::UnsupportedDerivationPath, msg)
    }

    pub fn unknown_script(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::UnknownScript, msg)
    }

    pub fn restoration_failed(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::RestorationFailed, msg)
    }

    pub fn chain_code_length(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::ChainCodeLengthMismatch, msg)
    }

    pub fn invalid_threshold(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidThreshold, msg)
    }

    pub fn payment_failed(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::PaymentConstructionFailed, msg)
    }

    pub fn invalid_mnemonic(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidMnemonic, msg)
    }

    pub fn unsupported_language(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::UnsupportedLanguage, msg)
    }

    pub fn chain_data_unavailable(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::ChainDataUnavailable, msg)
    }

    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidInput, msg)
    }

    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidConfig, msg)
    }

    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::UnsupportedOperation, msg)
    }

    pub fn crypto_error(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::CryptoError, msg)
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::Internal, msg)
    }
}

impl fmt::Display for IdentityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)?;
        if let Some(ref details) = self.details {
            write!(f, " ({})", details)?;
        }
        Ok(())
    }
}

impl std::error::Error for IdentityError {}

/// Error codes for categorization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    // Construction errors
    InvalidSeed,
    InvalidMnemonic,
    UnsupportedLanguage,
    InvalidConfig,

    // Derivation errors
    UnsupportedDerivationPath,
    UnknownScript,

    // Restoration errors
    RestorationFailed,
    ChainDataUnavailable,

    // Multisig errors
    ChainCodeLengthMismatch,
    InvalidThreshold,
    PaymentConstructionFailed,

    // Input errors
    InvalidInput,
    UnsupportedOperation,

    // Crypto errors
    CryptoError,

    // Parse errors
    HexError,
    JsonError,

    // Internal
    Internal,
}

/// Result type alias for identity operations
pub type IdentityResult<T> = Result<T, IdentityError>;

// Conversions from common error types

impl From<serde_json::Error> for IdentityError {
    fn from(e: serde_json::Error) -> Self {
        IdentityError::new(ErrorCode::JsonError, e.to_string())
    }
}

impl From<hex::FromHexError> for IdentityError {
    fn from(e: hex::FromHexError) -> Self {
        IdentityError::new(ErrorCode::HexError, e.to_string())
    }
}

impl From<bitcoin::bip32::Error> for IdentityError {
    fn from(e: bitcoin::bip32::Error) -> Self {
        IdentityError::new(ErrorCode::CryptoError, format!("BIP32 error: {}", e))
    }
}

impl From<bitcoin::secp256k1::Error> for IdentityError {
    fn from(e: bitcoin::secp256k1::Error) -> Self {
        IdentityError::new(ErrorCode::CryptoError, format!("Secp256k1 error: {}", e))
    }
}

impl From<bip39::Error> for IdentityError {
    fn from(e: bip39::Error) -> Self {
        IdentityError::new(ErrorCode::InvalidMnemonic, format!("BIP39 error: {}", e))
    }
}

impl From<ChainSourceError> for IdentityError {
    fn from(e: ChainSourceError) -> Self {
        IdentityError::chain_data_unavailable(e.to_string())
    }
}
