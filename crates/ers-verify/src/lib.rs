//! Evidence record validation
//!
//! Validates an RFC 4998 evidence record against the data objects it
//! protects. The validator:
//!
//! 1. matches each supplied data object against the leaves of the first
//!    archive timestamp
//! 2. walks every chain and checks that each archive timestamp links to the
//!    one before it
//! 3. hands each timestamp token to an injected [`tsa::TokenVerifier`]
//! 4. folds everything into an [`EvidenceRecordReport`]
//!
//! A record too malformed to walk is rejected with
//! [`Error::Structural`]; every other problem is reported in the report.
//!
//! # Example
//!
//! ```no_run
//! use ers_verify::{EvidenceRecordValidator, OrphanPolicy, ValidationPolicy};
//! use ers_verify::tsa::{Rfc3161TokenVerifier, VerifyOpts};
//! use ers_verify::types::{DataObjectReference, EvidenceRecord};
//!
//! # fn example(json: &str, document: Vec<u8>) -> Result<(), Box<dyn std::error::Error>> {
//! let record = EvidenceRecord::from_json(json)?
//!     .with_data_object(DataObjectReference::new("contract.pdf").with_content(document));
//!
//! let validator = EvidenceRecordValidator::new(Rfc3161TokenVerifier::new(VerifyOpts::new()));
//! let report = validator.validate(&record, &ValidationPolicy::new(OrphanPolicy::Tolerate))?;
//! for failure in &report.failures {
//!     println!("{}", failure);
//! }
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod policy;
pub mod reference;
pub mod report;
pub mod validator;

mod validate_impl;

// Re-export core crates
pub use ers_crypto as crypto;
pub use ers_merkle as merkle;
pub use ers_tsa as tsa;
pub use ers_types as types;

pub use error::{Error, Result};
pub use policy::{OrphanPolicy, ValidationPolicy};
pub use reference::{ReferenceKind, ReferenceValidation};
pub use report::{
    ChainLink, EvidenceRecordReport, FailureCategory, FailureReason, TimestampOutcome,
};
pub use validator::EvidenceRecordValidator;
