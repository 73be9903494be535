//! Evidence record, archive timestamp chains and protected data objects
//!
//! Ownership is flat: an [`EvidenceRecord`] owns a vector of chains and each
//! chain owns a vector of timestamps. Nothing points back up; predecessors
//! are found by index through [`TimestampPosition`].

use crate::error::{Error, Result, StructuralError};
use crate::hash::{DigestAlgorithm, DigestValue};
use crate::tree::HashTree;
use serde::{Deserialize, Serialize};

/// Opaque handle to an external timestamp token
///
/// Holds the token's encoded bytes (for RFC 3161, the DER `ContentInfo`).
/// The model never interprets them; link checks digest them and the token
/// verifier parses them.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TimestampToken(#[serde(with = "crate::base64_bytes")] Vec<u8>);

impl TimestampToken {
    /// Wrap encoded token bytes
    pub fn new(encoded: impl Into<Vec<u8>>) -> Self {
        Self(encoded.into())
    }

    /// The encoded token
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl std::fmt::Debug for TimestampToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "TimestampToken({} bytes)", self.0.len())
    }
}

impl AsRef<[u8]> for TimestampToken {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// One proof unit: a hash tree bound by a timestamp token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchiveTimeStamp {
    /// Position within the chain
    pub order: u32,
    /// Leaf digest groups protected by the token
    pub hash_tree: HashTree,
    /// The timestamp token over the tree's root
    pub timestamp_token: TimestampToken,
}

impl ArchiveTimeStamp {
    /// Create an archive timestamp
    pub fn new(order: u32, hash_tree: HashTree, timestamp_token: TimestampToken) -> Self {
        Self {
            order,
            hash_tree,
            timestamp_token,
        }
    }
}

/// Successive archive timestamps renewed under one digest algorithm
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchiveTimeStampChain {
    /// Position within the evidence record
    pub order: u32,
    /// Algorithm shared by every hash tree of the chain
    pub digest_algorithm: DigestAlgorithm,
    /// Timestamps in renewal order
    pub timestamps: Vec<ArchiveTimeStamp>,
}

impl ArchiveTimeStampChain {
    /// Create a chain from already ordered timestamps
    pub fn new(
        order: u32,
        digest_algorithm: DigestAlgorithm,
        timestamps: Vec<ArchiveTimeStamp>,
    ) -> Self {
        Self {
            order,
            digest_algorithm,
            timestamps,
        }
    }
}

/// A data object protected by the evidence record
///
/// `content` is absent when the object was not supplied to validation; the
/// declared `digest` may still be known from the protected-object list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataObjectReference {
    /// Name of the object (file name, URI, ...)
    pub identifier: String,
    /// Digest declared for the object, if known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub digest: Option<DigestValue>,
    /// The object's bytes, if supplied
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "crate::base64_bytes::option"
    )]
    pub content: Option<Vec<u8>>,
}

impl DataObjectReference {
    /// A reference known only by name
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            digest: None,
            content: None,
        }
    }

    /// Attach the declared digest
    pub fn with_digest(mut self, digest: DigestValue) -> Self {
        self.digest = Some(digest);
        self
    }

    /// Attach the object's bytes
    pub fn with_content(mut self, content: impl Into<Vec<u8>>) -> Self {
        self.content = Some(content.into());
        self
    }

    /// Whether the bytes were not supplied
    pub fn is_orphan(&self) -> bool {
        self.content.is_none()
    }

    /// The declared digest, if it was computed with `algorithm`
    pub fn declared_digest(&self, algorithm: DigestAlgorithm) -> Option<&DigestValue> {
        self.digest
            .as_ref()
            .filter(|digest| digest.algorithm() == algorithm)
    }
}

/// Index of an archive timestamp inside an evidence record
///
/// These are vector indices, not `order` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimestampPosition {
    /// Index of the chain
    pub chain: usize,
    /// Index of the timestamp within its chain
    pub timestamp: usize,
}

impl TimestampPosition {
    /// The first timestamp of the first chain
    pub const FIRST: TimestampPosition = TimestampPosition {
        chain: 0,
        timestamp: 0,
    };

    /// Whether this is the first timestamp of its chain
    pub fn starts_chain(&self) -> bool {
        self.timestamp == 0
    }
}

/// An evidence record: archive timestamp chains over protected data objects
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvidenceRecord {
    /// Chains in renewal order
    pub chains: Vec<ArchiveTimeStampChain>,
    /// The protected data objects
    #[serde(default)]
    pub data_objects: Vec<DataObjectReference>,
}

impl EvidenceRecord {
    /// Create a record with no data objects attached yet
    pub fn new(chains: Vec<ArchiveTimeStampChain>) -> Self {
        Self {
            chains,
            data_objects: Vec::new(),
        }
    }

    /// Attach a protected data object
    pub fn with_data_object(mut self, reference: DataObjectReference) -> Self {
        self.data_objects.push(reference);
        self
    }

    /// Parse from the JSON form
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(Error::Json)
    }

    /// Serialize to the JSON form
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(Error::Json)
    }

    /// The first archive timestamp of the first chain
    pub fn first_timestamp(&self) -> Option<&ArchiveTimeStamp> {
        self.chains.first().and_then(|chain| chain.timestamps.first())
    }

    /// Look up a timestamp by position
    pub fn timestamp(&self, position: TimestampPosition) -> Option<&ArchiveTimeStamp> {
        self.chains
            .get(position.chain)
            .and_then(|chain| chain.timestamps.get(position.timestamp))
    }

    /// Every timestamp in walk order (chain by chain, then within chain)
    pub fn timestamps(&self) -> impl Iterator<Item = (TimestampPosition, &ArchiveTimeStamp)> {
        self.chains.iter().enumerate().flat_map(|(c, chain)| {
            chain.timestamps.iter().enumerate().map(move |(t, ts)| {
                (
                    TimestampPosition {
                        chain: c,
                        timestamp: t,
                    },
                    ts,
                )
            })
        })
    }

    /// The position walked immediately before `position`, if any
    pub fn predecessor(&self, position: TimestampPosition) -> Option<TimestampPosition> {
        if position.timestamp > 0 {
            return Some(TimestampPosition {
                chain: position.chain,
                timestamp: position.timestamp - 1,
            });
        }
        let chain = position.chain.checked_sub(1)?;
        let last = self.chains.get(chain)?.timestamps.len().checked_sub(1)?;
        Some(TimestampPosition {
            chain,
            timestamp: last,
        })
    }

    /// The position walked immediately after `position`, if any
    pub fn successor(&self, position: TimestampPosition) -> Option<TimestampPosition> {
        let chain = self.chains.get(position.chain)?;
        if position.timestamp + 1 < chain.timestamps.len() {
            return Some(TimestampPosition {
                chain: position.chain,
                timestamp: position.timestamp + 1,
            });
        }
        self.chains
            .get(position.chain + 1)
            .filter(|next| !next.timestamps.is_empty())
            .map(|_| TimestampPosition {
                chain: position.chain + 1,
                timestamp: 0,
            })
    }

    /// Check the record's shape before any cryptographic work
    ///
    /// Reports the first violation found: no chains, an empty chain,
    /// non-increasing chain or timestamp orders, an empty tree or group, or a
    /// tree whose algorithm differs from its chain's.
    pub fn check_structure(&self) -> std::result::Result<(), StructuralError> {
        if self.chains.is_empty() {
            return Err(StructuralError::EmptyRecord);
        }

        let mut previous_chain: Option<u32> = None;
        for chain in &self.chains {
            if let Some(previous) = previous_chain {
                if chain.order <= previous {
                    return Err(StructuralError::ChainOrder {
                        previous,
                        current: chain.order,
                    });
                }
            }
            previous_chain = Some(chain.order);

            if chain.timestamps.is_empty() {
                return Err(StructuralError::EmptyChain { chain: chain.order });
            }

            let mut previous_ts: Option<u32> = None;
            for ts in &chain.timestamps {
                if let Some(previous) = previous_ts {
                    if ts.order <= previous {
                        return Err(StructuralError::TimestampOrder {
                            chain: chain.order,
                            previous,
                            current: ts.order,
                        });
                    }
                }
                previous_ts = Some(ts.order);
                check_tree(chain, ts)?;
            }
        }

        Ok(())
    }
}

fn check_tree(
    chain: &ArchiveTimeStampChain,
    ts: &ArchiveTimeStamp,
) -> std::result::Result<(), StructuralError> {
    let tree = &ts.hash_tree;
    if tree.algorithm() != chain.digest_algorithm {
        return Err(StructuralError::AlgorithmMismatch {
            chain: chain.order,
            timestamp: ts.order,
            expected: chain.digest_algorithm,
            found: tree.algorithm(),
        });
    }
    if tree.groups().is_empty() {
        return Err(StructuralError::EmptyHashTree {
            chain: chain.order,
            timestamp: ts.order,
        });
    }
    if let Some(group) = tree.groups().iter().position(Vec::is_empty) {
        return Err(StructuralError::EmptyGroup {
            chain: chain.order,
            timestamp: ts.order,
            group,
        });
    }
    Ok(())
}
