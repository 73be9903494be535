//! Error types for ers-crypto

use thiserror::Error;

/// Errors that can occur in cryptographic operations
#[derive(Error, Debug)]
pub enum Error {
    /// Unsupported algorithm
    #[error("Unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// Model error (e.g. a digest of unexpected length)
    #[error("Types error: {0}")]
    Types(#[from] ers_types::Error),
}

/// Result type for cryptographic operations
pub type Result<T> = std::result::Result<T, Error>;
