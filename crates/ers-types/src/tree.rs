//! Hash tree data
//!
//! A [`HashTree`] is the leaf level of a Merkle-style tree: an ordered list
//! of digest groups. The reduction to a root lives in `ers-merkle`; this type
//! only holds the data and guarantees that every digest uses the tree's
//! algorithm.

use crate::error::{Error, Result};
use crate::hash::{DigestAlgorithm, DigestValue};
use serde::{Deserialize, Serialize};

/// Leaf-level digest groups of one archive timestamp
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "HashTreeRepr", into = "HashTreeRepr")]
pub struct HashTree {
    algorithm: DigestAlgorithm,
    groups: Vec<Vec<DigestValue>>,
}

impl HashTree {
    /// Build a tree from digest groups
    ///
    /// Fails if any digest was produced by another algorithm. Empty groups
    /// are accepted here and reported by the record's structure check.
    pub fn new(algorithm: DigestAlgorithm, groups: Vec<Vec<DigestValue>>) -> Result<Self> {
        if let Some(stray) = groups
            .iter()
            .flatten()
            .find(|digest| digest.algorithm() != algorithm)
        {
            return Err(Error::AlgorithmMismatch {
                expected: algorithm,
                found: stray.algorithm(),
            });
        }
        Ok(Self { algorithm, groups })
    }

    /// A tree holding a single group
    pub fn single_group(algorithm: DigestAlgorithm, group: Vec<DigestValue>) -> Result<Self> {
        Self::new(algorithm, vec![group])
    }

    /// The algorithm every digest in this tree uses
    pub fn algorithm(&self) -> DigestAlgorithm {
        self.algorithm
    }

    /// The digest groups, in order
    pub fn groups(&self) -> &[Vec<DigestValue>] {
        &self.groups
    }

    /// Iterate over every leaf digest, group by group
    pub fn leaves(&self) -> impl Iterator<Item = &DigestValue> {
        self.groups.iter().flatten()
    }

    /// Whether `digest` appears anywhere among the leaves
    pub fn contains(&self, digest: &DigestValue) -> bool {
        self.leaves().any(|leaf| leaf == digest)
    }

    /// Total number of leaf digests
    pub fn leaf_count(&self) -> usize {
        self.groups.iter().map(Vec::len).sum()
    }
}

#[derive(Serialize, Deserialize)]
struct HashTreeRepr {
    algorithm: DigestAlgorithm,
    groups: Vec<Vec<Base64Digest>>,
}

#[derive(Serialize, Deserialize)]
#[serde(transparent)]
struct Base64Digest(#[serde(with = "crate::base64_bytes")] Vec<u8>);

impl TryFrom<HashTreeRepr> for HashTree {
    type Error = Error;

    fn try_from(repr: HashTreeRepr) -> Result<Self> {
        let groups = repr
            .groups
            .into_iter()
            .map(|group| {
                group
                    .into_iter()
                    .map(|Base64Digest(bytes)| DigestValue::new(repr.algorithm, bytes))
                    .collect::<Result<Vec<_>>>()
            })
            .collect::<Result<Vec<_>>>()?;
        HashTree::new(repr.algorithm, groups)
    }
}

impl From<HashTree> for HashTreeRepr {
    fn from(tree: HashTree) -> Self {
        Self {
            algorithm: tree.algorithm,
            groups: tree
                .groups
                .into_iter()
                .map(|group| {
                    group
                        .into_iter()
                        .map(|digest| Base64Digest(digest.as_bytes().to_vec()))
                        .collect()
                })
                .collect(),
        }
    }
}
