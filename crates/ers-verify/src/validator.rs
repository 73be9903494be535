//! Evidence record validator

use crate::error::Result;
use crate::policy::ValidationPolicy;
use crate::reference::{ReferenceKind, ReferenceValidation};
use crate::report::{ChainLink, EvidenceRecordReport, FailureReason, TimestampOutcome};
use crate::validate_impl::{links, matching::DataObjectIndex, tokens};
use ers_crypto::{AwsLcDigester, Digester};
use ers_tsa::TokenVerifier;
use ers_types::{EvidenceRecord, TimestampPosition};

/// Validates evidence records against the data objects they protect
///
/// Both collaborators are injected: `V` judges timestamp tokens and `D`
/// computes digests. The validator holds no other state, so one instance
/// can validate many records, from several threads if `V` and `D` allow.
pub struct EvidenceRecordValidator<V, D = AwsLcDigester> {
    token_verifier: V,
    digester: D,
}

impl<V: TokenVerifier> EvidenceRecordValidator<V> {
    /// Create a validator using the aws-lc-rs digester
    pub fn new(token_verifier: V) -> Self {
        Self {
            token_verifier,
            digester: AwsLcDigester,
        }
    }
}

impl<V: TokenVerifier, D: Digester> EvidenceRecordValidator<V, D> {
    /// Create a validator with a custom digester
    pub fn with_digester(token_verifier: V, digester: D) -> Self {
        Self {
            token_verifier,
            digester,
        }
    }

    /// The token verifier
    pub fn token_verifier(&self) -> &V {
        &self.token_verifier
    }

    /// Validate one evidence record
    ///
    /// Returns `Err` only when the record is malformed (see
    /// [`StructuralError`](ers_types::StructuralError)). Every cryptographic
    /// mismatch, orphan and token failure is reported in the
    /// [`EvidenceRecordReport`] instead.
    ///
    /// The walk:
    ///
    /// 1. Check the record's structure.
    /// 2. Match each supplied data object against the first archive
    ///    timestamp of the first chain.
    /// 3. Walk the chains and their timestamps in order; classify and check
    ///    the link of every timestamp but the first, and note which data
    ///    objects later timestamps still cover.
    /// 4. Reduce each hash tree to its root and have the token verifier
    ///    judge the token against it.
    /// 5. Aggregate.
    pub fn validate(
        &self,
        record: &EvidenceRecord,
        policy: &ValidationPolicy,
    ) -> Result<EvidenceRecordReport> {
        // (1): Structure
        record.check_structure()?;
        tracing::debug!(
            "Validating evidence record with {} chain(s) and {} data object(s)",
            record.chains.len(),
            record.data_objects.len()
        );

        let mut index = DataObjectIndex::build(
            &self.digester,
            &record.data_objects,
            record.chains.iter().map(|chain| chain.digest_algorithm),
        )?;

        let mut references: Vec<ReferenceValidation> = Vec::new();
        let mut stamps = Vec::new();
        let mut chain_links: Vec<Option<ChainLink>> = Vec::new();

        for (position, ats) in record.timestamps() {
            if position == TimestampPosition::FIRST {
                // (2): Data objects against the first archive timestamp
                references.extend(index.match_first(ats, position));
                chain_links.push(None);
            } else {
                // (3): Link to what came before
                let link = links::classify_link(&self.digester, record, position, &index)?;
                chain_links.push(Some(ChainLink {
                    kind: link.kind,
                    intact: link.intact,
                }));
                references.push(link);
                references.extend(index.covered_by(ats, position));
            }

            // (4): Root the token must protect
            let root = ers_merkle::reduce_tree(&self.digester, &ats.hash_tree)?;
            tracing::debug!(
                "Archive timestamp {} of chain {} has root {}",
                ats.order,
                record.chains[position.chain].order,
                root
            );
            stamps.push((position, ats, root));
        }

        let verified = tokens::verify_tokens(
            &self.token_verifier,
            &stamps,
            policy.validation_time,
        );

        let timestamps: Vec<TimestampOutcome> = stamps
            .into_iter()
            .zip(chain_links)
            .zip(verified)
            .map(
                |(((position, ats, root), link), (reference_time, token))| TimestampOutcome {
                    position,
                    chain_order: record.chains[position.chain].order,
                    order: ats.order,
                    root,
                    link,
                    reference_time,
                    token,
                },
            )
            .collect();

        // (5): Aggregate
        let failures = collect_failures(&references, &timestamps, policy);
        let valid = failures.is_empty();
        if valid {
            tracing::info!(
                "Evidence record is valid ({} timestamp(s))",
                timestamps.len()
            );
        } else {
            tracing::info!(
                "Evidence record is not valid: {} failure(s)",
                failures.len()
            );
        }

        Ok(EvidenceRecordReport {
            valid,
            references,
            timestamps,
            failures,
        })
    }

    /// Validate several evidence records independently
    ///
    /// One result per record, in input order. A malformed record yields an
    /// `Err` in its own slot and does not affect the others.
    pub fn validate_batch(
        &self,
        records: &[EvidenceRecord],
        policy: &ValidationPolicy,
    ) -> Vec<Result<EvidenceRecordReport>> {
        records
            .iter()
            .map(|record| self.validate(record, policy))
            .collect()
    }
}

fn collect_failures(
    references: &[ReferenceValidation],
    timestamps: &[TimestampOutcome],
    policy: &ValidationPolicy,
) -> Vec<FailureReason> {
    let mut failures = Vec::new();
    let mut orphans = 0;

    for reference in references {
        match reference.kind {
            ReferenceKind::ArchiveObject if !reference.is_valid() => {
                let identifier = reference.identifier.clone().unwrap_or_default();
                failures.push(if reference.found {
                    FailureReason::DataObjectAltered { identifier }
                } else {
                    FailureReason::DataObjectNotFound { identifier }
                });
            }
            ReferenceKind::OrphanReference => orphans += 1,
            // Links are reported per timestamp below
            _ => {}
        }
    }

    for outcome in timestamps {
        if !outcome.link_intact() {
            failures.push(FailureReason::BrokenLink {
                chain: outcome.chain_order,
                timestamp: outcome.order,
            });
        }

        let token = &outcome.token;
        if !token.processed {
            failures.push(FailureReason::TokenNotProcessed {
                chain: outcome.chain_order,
                timestamp: outcome.order,
                reason: token
                    .failure
                    .clone()
                    .unwrap_or_else(|| "token was not processed".to_string()),
            });
        } else if !token.succeeded() {
            failures.push(FailureReason::TokenRejected {
                chain: outcome.chain_order,
                timestamp: outcome.order,
                reason: token
                    .failure
                    .clone()
                    .unwrap_or_else(|| "token does not vouch for the tree root".to_string()),
            });
        }
    }

    if orphans > 0 && policy.requires_all_data_objects() {
        failures.push(FailureReason::OrphanReferences { count: orphans });
    }

    failures
}
