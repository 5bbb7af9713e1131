//! Error types for FileChain

use std::fmt;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub enum LedgerError {
    /// A local file (document or key) could not be read.
    FileAccess { path: PathBuf, reason: String },
    /// Transport failure or a non-success HTTP status from the ledger server.
    Network { url: String, reason: String },
    /// The ledger server answered, but the body lacks an expected field.
    MalformedResponse { url: String, field: String },
    /// Key material could not be parsed as PEM.
    KeyParse { path: PathBuf, reason: String },
    CryptoError(String),
    InvalidSignature,
    BlockNotFound(u64),
    ValidationError(String),
    ConfigError(String),
    StorageError(String),
    SerializationError(String),
    IoError(String),
}

impl fmt::Display for LedgerError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            LedgerError::FileAccess { path, reason } => {
                write!(f, "Cannot access file {}: {}", path.display(), reason)
            }
            LedgerError::Network { url, reason } => {
                write!(f, "Network error for {}: {}", url, reason)
            }
            LedgerError::MalformedResponse { url, field } => write!(
                f,
                "Malformed response from {}: missing or invalid field `{}`",
                url, field
            ),
            LedgerError::KeyParse { path, reason } => {
                write!(f, "Cannot parse key {}: {}", path.display(), reason)
            }
            LedgerError::CryptoError(msg) => write!(f, "Cryptographic error: {}", msg),
            LedgerError::InvalidSignature => write!(f, "Invalid signature"),
            LedgerError::BlockNotFound(index) => write!(f, "Block {} not found", index),
            LedgerError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            LedgerError::ConfigError(msg) => write!(f, "Configuration error: {}", msg),
            LedgerError::StorageError(msg) => write!(f, "Storage error: {}", msg),
            LedgerError::SerializationError(msg) => write!(f, "Serialization error: {}", msg),
            LedgerError::IoError(msg) => write!(f, "IO error: {}", msg),
        }
    }
}

impl std::error::Error for LedgerError {}

impl From<std::io::Error> for LedgerError {
    fn from(err: std::io::Error) -> Self {
        LedgerError::IoError(err.to_string())
    }
}

impl From<serde_json::Error> for LedgerError {
    fn from(err: serde_json::Error) -> Self {
        LedgerError::SerializationError(err.to_string())
    }
}

impl From<toml::de::Error> for LedgerError {
    fn from(err: toml::de::Error) -> Self {
        LedgerError::ConfigError(err.to_string())
    }
}

impl From<rusqlite::Error> for LedgerError {
    fn from(err: rusqlite::Error) -> Self {
        LedgerError::StorageError(err.to_string())
    }
}

/// Convenience alias used across the crate
pub type Result<T> = std::result::Result<T, LedgerError>;
