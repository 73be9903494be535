//! Error types for ers-verify

use ers_types::StructuralError;
use thiserror::Error;

/// Errors that stop the validation of one evidence record
///
/// Cryptographic mismatches are not errors; they are reported in the
/// [`EvidenceRecordReport`](crate::EvidenceRecordReport).
#[derive(Error, Debug)]
pub enum Error {
    /// The record is too malformed to attempt validation
    #[error("Malformed evidence record: {0}")]
    Structural(#[from] StructuralError),

    /// Hash tree error
    #[error("Hash tree error: {0}")]
    Merkle(#[from] ers_merkle::Error),

    /// Crypto error
    #[error("Crypto error: {0}")]
    Crypto(#[from] ers_crypto::Error),

    /// Types error
    #[error("Types error: {0}")]
    Types(#[from] ers_types::Error),
}

impl Error {
    /// Whether validation could not even be attempted
    pub fn is_structural(&self) -> bool {
        matches!(self, Error::Structural(_))
    }
}

/// Result type for evidence record validation
pub type Result<T> = std::result::Result<T, Error>;
