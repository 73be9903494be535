//! Matching data objects against hash tree leaves

use std::collections::{HashMap, HashSet};

use crate::error::Result;
use crate::reference::{ReferenceKind, ReferenceValidation};
use ers_crypto::Digester;
use ers_types::{
    ArchiveTimeStamp, DataObjectReference, DigestAlgorithm, DigestValue, TimestampPosition,
};

/// Digests of the supplied data objects under every algorithm in use
pub(crate) struct DataObjectIndex<'a> {
    references: &'a [DataObjectReference],
    /// Recomputed digest per reference, `None` when no bytes were supplied
    computed: HashMap<DigestAlgorithm, Vec<Option<DigestValue>>>,
    /// Leaves of the first archive timestamp, all of which protect data
    /// objects whether supplied or not
    first_leaves: HashSet<DigestValue>,
}

impl<'a> DataObjectIndex<'a> {
    /// Digest every supplied object once per algorithm
    pub(crate) fn build<D: Digester + ?Sized>(
        digester: &D,
        references: &'a [DataObjectReference],
        algorithms: impl IntoIterator<Item = DigestAlgorithm>,
    ) -> Result<Self> {
        let mut computed = HashMap::new();
        for algorithm in algorithms {
            if computed.contains_key(&algorithm) {
                continue;
            }
            let digests = references
                .iter()
                .map(|reference| {
                    reference
                        .content
                        .as_deref()
                        .map(|content| digester.digest(algorithm, content))
                        .transpose()
                })
                .collect::<std::result::Result<Vec<_>, _>>()?;
            computed.insert(algorithm, digests);
        }

        Ok(Self {
            references,
            computed,
            first_leaves: HashSet::new(),
        })
    }

    /// The recomputed digest of reference `index`
    fn computed(&self, algorithm: DigestAlgorithm, index: usize) -> Option<&DigestValue> {
        self.computed
            .get(&algorithm)
            .and_then(|digests| digests.get(index))
            .and_then(Option::as_ref)
    }

    /// Whether `digest` is the digest of a known data object
    ///
    /// Known means recomputed from supplied bytes, declared with the
    /// digest's algorithm, or a leaf of the first archive timestamp (once
    /// [`match_first`](Self::match_first) has run). The last covers objects
    /// that were neither supplied nor listed.
    pub(crate) fn is_data_digest(&self, digest: &DigestValue) -> bool {
        if self.first_leaves.contains(digest) {
            return true;
        }
        let algorithm = digest.algorithm();
        let recomputed = self
            .computed
            .get(&algorithm)
            .is_some_and(|digests| digests.iter().flatten().any(|d| d == digest));
        recomputed
            || self
                .references
                .iter()
                .any(|reference| reference.declared_digest(algorithm) == Some(digest))
    }

    /// Match every reference against the first archive timestamp
    ///
    /// A reference claims a leaf through its recomputed digest, then
    /// through its declared digest. Supplied references left without a leaf
    /// take the leaves nobody claimed, one each in order, as found but
    /// altered. Leaves still unclaimed after that are reported as orphan
    /// references without an identifier.
    pub(crate) fn match_first(
        &mut self,
        ats: &ArchiveTimeStamp,
        position: TimestampPosition,
    ) -> Vec<ReferenceValidation> {
        let tree = &ats.hash_tree;
        let algorithm = tree.algorithm();
        let mut claimed: HashSet<DigestValue> = HashSet::new();
        let mut unmatched: Vec<usize> = Vec::new();
        let mut validations = Vec::with_capacity(self.references.len());

        for (index, reference) in self.references.iter().enumerate() {
            let declared = reference
                .declared_digest(algorithm)
                .filter(|digest| tree.contains(digest));

            let validation = match self.computed(algorithm, index) {
                Some(computed) if tree.contains(computed) => {
                    claimed.insert(computed.clone());
                    data_object(reference, computed.clone(), true, true, position)
                }
                Some(computed) => match declared {
                    Some(declared) => {
                        claimed.insert(declared.clone());
                        tracing::debug!(
                            "Data object {} no longer matches its leaf {}",
                            reference.identifier,
                            declared.to_hex()
                        );
                        data_object(reference, computed.clone(), true, false, position)
                    }
                    None => {
                        unmatched.push(validations.len());
                        data_object(reference, computed.clone(), false, false, position)
                    }
                },
                None => {
                    if let Some(declared) = declared {
                        claimed.insert(declared.clone());
                    }
                    ReferenceValidation {
                        kind: ReferenceKind::OrphanReference,
                        found: false,
                        intact: false,
                        digest: reference
                            .declared_digest(algorithm)
                            .or(reference.digest.as_ref())
                            .cloned(),
                        identifier: Some(reference.identifier.clone()),
                        position,
                    }
                }
            };
            validations.push(validation);
        }

        let mut unclaimed: Vec<DigestValue> = Vec::new();
        for leaf in tree.leaves() {
            if !claimed.contains(leaf) && !unclaimed.contains(leaf) {
                unclaimed.push(leaf.clone());
            }
        }

        let paired = unmatched.len().min(unclaimed.len());
        for (slot, index) in unclaimed.drain(..paired).zip(unmatched) {
            let validation = &mut validations[index];
            tracing::debug!(
                "Data object {} takes unclaimed leaf {} and no longer matches it",
                validation.identifier.as_deref().unwrap_or_default(),
                slot.to_hex()
            );
            validation.found = true;
        }
        let missing = validations
            .iter()
            .filter(|v| v.kind == ReferenceKind::ArchiveObject && !v.found);
        for validation in missing {
            tracing::debug!(
                "Data object {} has no leaf in the first archive timestamp",
                validation.identifier.as_deref().unwrap_or_default()
            );
        }

        validations.extend(unclaimed.into_iter().map(|leaf| ReferenceValidation {
            kind: ReferenceKind::OrphanReference,
            found: false,
            intact: false,
            digest: Some(leaf),
            identifier: None,
            position,
        }));

        self.first_leaves = tree.leaves().cloned().collect();
        validations
    }

    /// Supplied objects that a later archive timestamp also covers
    pub(crate) fn covered_by(
        &self,
        ats: &ArchiveTimeStamp,
        position: TimestampPosition,
    ) -> Vec<ReferenceValidation> {
        let algorithm = ats.hash_tree.algorithm();
        self.references
            .iter()
            .enumerate()
            .filter_map(|(index, reference)| {
                self.computed(algorithm, index)
                    .filter(|computed| ats.hash_tree.contains(computed))
                    .map(|computed| data_object(reference, computed.clone(), true, true, position))
            })
            .collect()
    }
}

fn data_object(
    reference: &DataObjectReference,
    digest: DigestValue,
    found: bool,
    intact: bool,
    position: TimestampPosition,
) -> ReferenceValidation {
    ReferenceValidation {
        kind: ReferenceKind::ArchiveObject,
        found,
        intact,
        digest: Some(digest),
        identifier: Some(reference.identifier.clone()),
        position,
    }
}
