//! Error types for ers-types

use crate::hash::DigestAlgorithm;
use thiserror::Error;

/// Errors that can occur while building or decoding the evidence record model
#[derive(Error, Debug)]
pub enum Error {
    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Base64 decoding error
    #[error("Base64 decoding error: {0}")]
    Base64(#[from] base64::DecodeError),

    /// Hex decoding error
    #[error("Hex decoding error: {0}")]
    Hex(#[from] hex::FromHexError),

    /// Digest payload does not match the algorithm's output size
    #[error("Invalid digest length for {algorithm}: expected {expected} bytes, got {actual}")]
    InvalidDigestLength {
        algorithm: DigestAlgorithm,
        expected: usize,
        actual: usize,
    },

    /// Unknown digest algorithm name or OID
    #[error("Unknown digest algorithm: {0}")]
    UnknownAlgorithm(String),

    /// A digest was produced by another algorithm than its container expects
    #[error("Digest algorithm mismatch: expected {expected}, got {found}")]
    AlgorithmMismatch {
        expected: DigestAlgorithm,
        found: DigestAlgorithm,
    },
}

/// Structural violations that make an evidence record impossible to verify
///
/// Chain and timestamp positions are reported by their `order` values.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StructuralError {
    /// The record holds no archive timestamp chain
    #[error("evidence record contains no archive timestamp chain")]
    EmptyRecord,

    /// A chain holds no archive timestamp
    #[error("archive timestamp chain {chain} contains no archive timestamp")]
    EmptyChain { chain: u32 },

    /// Chain orders are not strictly increasing
    #[error("archive timestamp chain order {current} does not follow {previous}")]
    ChainOrder { previous: u32, current: u32 },

    /// Timestamp orders are not strictly increasing within a chain
    #[error("archive timestamp order {current} does not follow {previous} in chain {chain}")]
    TimestampOrder {
        chain: u32,
        previous: u32,
        current: u32,
    },

    /// A hash tree has no digest group
    #[error("hash tree of archive timestamp {timestamp} in chain {chain} is empty")]
    EmptyHashTree { chain: u32, timestamp: u32 },

    /// A digest group has no member
    #[error("group {group} of archive timestamp {timestamp} in chain {chain} is empty")]
    EmptyGroup {
        chain: u32,
        timestamp: u32,
        group: usize,
    },

    /// A hash tree uses a different algorithm than its chain
    #[error(
        "archive timestamp {timestamp} in chain {chain} uses {found}, chain declares {expected}"
    )]
    AlgorithmMismatch {
        chain: u32,
        timestamp: u32,
        expected: DigestAlgorithm,
        found: DigestAlgorithm,
    },

    /// A renewal timestamp carries no digest linking it to its predecessor
    #[error("archive timestamp {timestamp} in chain {chain} carries no predecessor digest")]
    MissingLinkDigest { chain: u32, timestamp: u32 },
}

/// Result type for ers-types operations
pub type Result<T> = std::result::Result<T, Error>;
