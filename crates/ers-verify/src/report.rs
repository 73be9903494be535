//! Validation report

use crate::reference::{ReferenceKind, ReferenceValidation};
use chrono::{DateTime, Utc};
use ers_tsa::TokenVerification;
use ers_types::{DigestValue, TimestampPosition};
use thiserror::Error;

/// Broad class of a failure reason
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureCategory {
    /// A digest, link or signature did not verify
    Cryptographic,
    /// Required data objects were not supplied
    Orphan,
    /// The token verifier could not examine a token
    Collaborator,
}

/// Why an evidence record failed validation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    /// A supplied data object has no leaf in the first archive timestamp
    #[error("data object {identifier} is not covered by the evidence record")]
    DataObjectNotFound { identifier: String },

    /// A supplied data object's leaf holds a different digest
    #[error("data object {identifier} has been altered")]
    DataObjectAltered { identifier: String },

    /// An archive timestamp does not link to its predecessor
    #[error("archive timestamp {timestamp} in chain {chain} does not link to its predecessor")]
    BrokenLink { chain: u32, timestamp: u32 },

    /// A token could not be examined
    #[error("token of archive timestamp {timestamp} in chain {chain} was not processed: {reason}")]
    TokenNotProcessed {
        chain: u32,
        timestamp: u32,
        reason: String,
    },

    /// A token was examined and did not vouch for the tree root
    #[error("token of archive timestamp {timestamp} in chain {chain} was rejected: {reason}")]
    TokenRejected {
        chain: u32,
        timestamp: u32,
        reason: String,
    },

    /// Data objects were not supplied while the policy requires them all
    #[error("{count} protected data object(s) were not supplied")]
    OrphanReferences { count: usize },
}

impl FailureReason {
    /// The class of this failure
    pub fn category(&self) -> FailureCategory {
        match self {
            FailureReason::DataObjectNotFound { .. }
            | FailureReason::DataObjectAltered { .. }
            | FailureReason::BrokenLink { .. }
            | FailureReason::TokenRejected { .. } => FailureCategory::Cryptographic,
            FailureReason::OrphanReferences { .. } => FailureCategory::Orphan,
            FailureReason::TokenNotProcessed { .. } => FailureCategory::Collaborator,
        }
    }
}

/// How an archive timestamp links to what came before it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainLink {
    /// Classified link type
    pub kind: ReferenceKind,
    /// The link digest matched
    pub intact: bool,
}

/// Everything checked for one archive timestamp
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimestampOutcome {
    /// Index of the timestamp in the record
    pub position: TimestampPosition,
    /// `order` of the enclosing chain
    pub chain_order: u32,
    /// `order` of the timestamp
    pub order: u32,
    /// Reduced root of the timestamp's hash tree
    pub root: DigestValue,
    /// Link to the predecessor; `None` for the first timestamp of the record
    pub link: Option<ChainLink>,
    /// Time the token was judged at
    pub reference_time: DateTime<Utc>,
    /// Token verification outcome, as reported by the verifier
    pub token: TokenVerification,
}

impl TimestampOutcome {
    /// Whether the link to the predecessor holds (vacuously for the first)
    pub fn link_intact(&self) -> bool {
        self.link.map_or(true, |link| link.intact)
    }

    /// Whether the link holds and the token vouches for the root
    pub fn is_valid(&self) -> bool {
        self.link_intact() && self.token.succeeded()
    }
}

/// Result of validating one evidence record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvidenceRecordReport {
    /// The record is cryptographically intact under the policy
    pub valid: bool,
    /// Data object, orphan and link validations, in walk order
    pub references: Vec<ReferenceValidation>,
    /// One outcome per archive timestamp, in walk order
    pub timestamps: Vec<TimestampOutcome>,
    /// Why the record is not valid; empty when it is
    pub failures: Vec<FailureReason>,
}

impl EvidenceRecordReport {
    /// Orphan references, whatever the policy
    pub fn orphans(&self) -> impl Iterator<Item = &ReferenceValidation> {
        self.references
            .iter()
            .filter(|r| r.kind == ReferenceKind::OrphanReference)
    }

    /// Number of orphan references
    pub fn orphan_count(&self) -> usize {
        self.orphans().count()
    }

    /// Validations of a given kind
    pub fn references_of(
        &self,
        kind: ReferenceKind,
    ) -> impl Iterator<Item = &ReferenceValidation> {
        self.references.iter().filter(move |r| r.kind == kind)
    }

    /// Failures of a given category
    pub fn failures_in(&self, category: FailureCategory) -> impl Iterator<Item = &FailureReason> {
        self.failures
            .iter()
            .filter(move |f| f.category() == category)
    }

    /// The outcome for a given archive timestamp
    pub fn timestamp(&self, position: TimestampPosition) -> Option<&TimestampOutcome> {
        self.timestamps.iter().find(|t| t.position == position)
    }
}
