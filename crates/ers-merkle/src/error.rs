//! Error types for ers-merkle

use ers_types::DigestAlgorithm;
use thiserror::Error;

/// Errors that can occur in hash tree operations
#[derive(Error, Debug)]
pub enum Error {
    /// The tree has no group
    #[error("Empty hash tree")]
    EmptyTree,

    /// A group has no member
    #[error("Empty digest group at index {0}")]
    EmptyGroup(usize),

    /// Nothing to chain over
    #[error("Empty timestamp chain")]
    EmptyChain,

    /// A digest was produced by another algorithm than the tree's
    #[error("Algorithm mismatch: expected {expected}, got {found}")]
    AlgorithmMismatch {
        expected: DigestAlgorithm,
        found: DigestAlgorithm,
    },

    /// The leaf is not part of the tree
    #[error("Leaf not found: {0}")]
    LeafNotFound(String),

    /// Hash mismatch
    #[error("Hash mismatch: expected {expected}, got {actual}")]
    HashMismatch { expected: String, actual: String },

    /// Digest computation failed
    #[error("Crypto error: {0}")]
    Crypto(#[from] ers_crypto::Error),
}

/// Result type for hash tree operations
pub type Result<T> = std::result::Result<T, Error>;
