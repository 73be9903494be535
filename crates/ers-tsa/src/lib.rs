//! RFC 3161 timestamp token verification for evidence records
//!
//! The evidence record validator never interprets timestamp tokens itself.
//! It hands each token, together with the digest the token is expected to
//! protect, to a [`TokenVerifier`]. This crate defines that seam and ships
//! two implementations:
//!
//! - [`Rfc3161TokenVerifier`] parses CMS `SignedData` tokens, checks the
//!   message imprint, the CMS signature and the TSA certificate chain
//! - [`CachingTokenVerifier`] memoizes the outcomes of any other verifier

pub mod asn1;
pub mod cache;
pub mod error;
pub mod rfc3161;
pub mod verifier;

pub use asn1::{Accuracy, AlgorithmIdentifier, Asn1MessageImprint, TstInfo};
pub use cache::CachingTokenVerifier;
pub use error::{Error, Result};
pub use rfc3161::{Rfc3161TokenVerifier, VerifyOpts};
pub use verifier::{TokenVerification, TokenVerifier};
