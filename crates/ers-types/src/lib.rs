//! Core types and data structures for evidence record verification
//!
//! This crate provides the in-memory model of an RFC 4998 evidence record:
//! algorithm-tagged digest values, hash trees, archive timestamps and the
//! chains that renew them, plus the data object references they protect.
//!
//! The model is produced by an external decoder (or from its JSON form via
//! [`EvidenceRecord::from_json`]) and is consumed read-only by the validator.

pub mod error;
pub mod hash;
pub mod record;
pub mod tree;

pub(crate) use hash::base64_bytes;

pub use error::{Error, Result, StructuralError};
pub use hash::{DigestAlgorithm, DigestValue};
pub use record::{
    ArchiveTimeStamp, ArchiveTimeStampChain, DataObjectReference, EvidenceRecord,
    TimestampPosition, TimestampToken,
};
pub use tree::HashTree;
