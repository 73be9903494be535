//! The token verification seam

use crate::error::Result;
use chrono::{DateTime, Utc};
use ers_types::{DigestValue, TimestampToken};

/// Outcome of verifying one timestamp token
///
/// The five flags are reported independently so that a caller can tell a
/// token that could not be read from one whose signature or trust failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenVerification {
    /// The token could be decoded and examined
    pub processed: bool,
    /// The token carries a message imprint
    pub message_imprint_found: bool,
    /// The imprint equals the expected digest, algorithm included
    pub message_imprint_intact: bool,
    /// The signature over the token content verifies
    pub signature_valid: bool,
    /// The signer chains to a trusted root at the reference time
    pub certificate_chain_trusted: bool,
    /// Time the token claims it was issued
    pub generation_time: Option<DateTime<Utc>>,
    /// First reason a check failed, if any
    pub failure: Option<String>,
}

impl TokenVerification {
    /// An outcome for a token that could not be examined
    pub fn unprocessed(reason: impl Into<String>) -> Self {
        Self {
            processed: false,
            message_imprint_found: false,
            message_imprint_intact: false,
            signature_valid: false,
            certificate_chain_trusted: false,
            generation_time: None,
            failure: Some(reason.into()),
        }
    }

    /// An outcome where every check passed
    pub fn verified(generation_time: Option<DateTime<Utc>>) -> Self {
        Self {
            processed: true,
            message_imprint_found: true,
            message_imprint_intact: true,
            signature_valid: true,
            certificate_chain_trusted: true,
            generation_time,
            failure: None,
        }
    }

    /// Whether the token fully vouches for the expected digest
    pub fn succeeded(&self) -> bool {
        self.processed
            && self.message_imprint_found
            && self.message_imprint_intact
            && self.signature_valid
            && self.certificate_chain_trusted
    }

    /// Record a failure reason, keeping the first one
    pub(crate) fn fail(&mut self, reason: impl Into<String>) {
        if self.failure.is_none() {
            self.failure = Some(reason.into());
        }
    }
}

/// Verifies that a timestamp token protects an expected digest
///
/// Implementations may block (network, HSM). They must not panic on
/// malformed tokens; an unreadable token is reported as not processed.
pub trait TokenVerifier: Send + Sync {
    /// Verify `token` against `expected` at `reference_time`
    ///
    /// `reference_time` is the instant at which the signature and the
    /// certificate chain are judged.
    fn verify_token(
        &self,
        token: &TimestampToken,
        expected: &DigestValue,
        reference_time: DateTime<Utc>,
    ) -> Result<TokenVerification>;
}

impl<V: TokenVerifier + ?Sized> TokenVerifier for &V {
    fn verify_token(
        &self,
        token: &TimestampToken,
        expected: &DigestValue,
        reference_time: DateTime<Utc>,
    ) -> Result<TokenVerification> {
        (**self).verify_token(token, expected, reference_time)
    }
}

impl<V: TokenVerifier + ?Sized> TokenVerifier for std::sync::Arc<V> {
    fn verify_token(
        &self,
        token: &TimestampToken,
        expected: &DigestValue,
        reference_time: DateTime<Utc>,
    ) -> Result<TokenVerification> {
        (**self).verify_token(token, expected, reference_time)
    }
}
