//! Error types for ers-tsa

use thiserror::Error;

/// Errors that can occur while verifying a timestamp token
#[derive(Error, Debug)]
pub enum Error {
    /// ASN.1 encoding/decoding error
    #[error("ASN.1 error: {0}")]
    Asn1(String),

    /// Failed to parse the timestamp token
    #[error("Failed to parse timestamp token: {0}")]
    Parse(String),

    /// No TSTInfo in timestamp token
    #[error("No TSTInfo in timestamp token")]
    NoTstInfo,

    /// Digest algorithm not supported for timestamps
    #[error("Unsupported digest algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// Failed to verify timestamp signature
    #[error("Failed to verify timestamp signature: {0}")]
    SignatureVerification(String),

    /// A digest inside the token does not match the content it covers
    #[error("Timestamp hash mismatch: expected {expected}, got {actual}")]
    HashMismatch { expected: String, actual: String },

    /// TSA certificate validation failed
    #[error("TSA certificate validation failed: {0}")]
    CertificateValidation(String),

    /// Timestamp is outside the TSA's validity period
    #[error("Timestamp is outside validity period")]
    OutsideValidityPeriod,

    /// The verifier could not be reached or gave up
    #[error("Token verification unavailable: {0}")]
    Unavailable(String),

    /// Digest computation error
    #[error("Crypto error: {0}")]
    Crypto(#[from] ers_crypto::Error),

    /// Model error
    #[error("Types error: {0}")]
    Types(#[from] ers_types::Error),
}

impl From<der::Error> for Error {
    fn from(err: der::Error) -> Self {
        Error::Asn1(err.to_string())
    }
}

/// Result type for TSA operations
pub type Result<T> = std::result::Result<T, Error>;
