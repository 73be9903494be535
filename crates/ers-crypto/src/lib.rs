//! Cryptographic primitives for evidence record verification
//!
//! This crate computes algorithm-tagged digests using aws-lc-rs as the
//! backend, and defines the [`Digester`] capability the validator is
//! parameterized over.

pub mod error;
pub mod hash;

pub use error::{Error, Result};
pub use hash::{digest, sha256, sha384, sha512, AwsLcDigester, Digester, Hasher};
