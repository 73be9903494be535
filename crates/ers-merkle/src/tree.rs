//! Hash tree reduction
//!
//! A level of the tree is a list of groups. Each group is reduced by
//! hashing the concatenation of its members in the order given; members are
//! never sorted, so the result binds position as well as content. The
//! reduced digests of a level form the single group of the next level, and
//! reduction repeats until one digest, the root, remains.
//!
//! A group with a single member has nothing to bind and passes its digest
//! through unchanged.

use crate::error::{Error, Result};
use ers_crypto::Digester;
use ers_types::{DigestAlgorithm, DigestValue, HashTree};

/// Where a leaf sits in a hash tree
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LeafPosition {
    /// Index of the group
    pub group: usize,
    /// Index within the group
    pub index: usize,
}

/// Reduce one group to a single digest
///
/// `group_index` only labels the error when the group is empty.
fn reduce_group_at<D: Digester + ?Sized>(
    digester: &D,
    algorithm: DigestAlgorithm,
    group: &[DigestValue],
    group_index: usize,
) -> Result<DigestValue> {
    if let Some(stray) = group.iter().find(|d| d.algorithm() != algorithm) {
        return Err(Error::AlgorithmMismatch {
            expected: algorithm,
            found: stray.algorithm(),
        });
    }

    match group {
        [] => Err(Error::EmptyGroup(group_index)),
        [single] => Ok(single.clone()),
        members => {
            let parts: Vec<&[u8]> = members.iter().map(DigestValue::as_bytes).collect();
            Ok(digester.digest_parts(algorithm, &parts)?)
        }
    }
}

/// Reduce a group of digests to one digest
///
/// Returns: H(m0 || m1 || ... || mn), or m0 when the group has one member
pub fn reduce_group<D: Digester + ?Sized>(
    digester: &D,
    algorithm: DigestAlgorithm,
    group: &[DigestValue],
) -> Result<DigestValue> {
    reduce_group_at(digester, algorithm, group, 0)
}

/// Reduce a hash tree to its root digest
pub fn reduce_tree<D: Digester + ?Sized>(digester: &D, tree: &HashTree) -> Result<DigestValue> {
    let algorithm = tree.algorithm();
    if tree.groups().is_empty() {
        return Err(Error::EmptyTree);
    }

    let mut level = tree
        .groups()
        .iter()
        .enumerate()
        .map(|(i, group)| reduce_group_at(digester, algorithm, group, i))
        .collect::<Result<Vec<_>>>()?;

    while level.len() > 1 {
        level = vec![reduce_group(digester, algorithm, &level)?];
    }

    let root = level.pop().ok_or(Error::EmptyTree)?;
    tracing::trace!(
        "Reduced {} group(s) to root {}",
        tree.groups().len(),
        root.to_hex()
    );
    Ok(root)
}

/// Find the first occurrence of `digest` among the tree's leaves
pub fn locate_leaf(tree: &HashTree, digest: &DigestValue) -> Option<LeafPosition> {
    tree.groups().iter().enumerate().find_map(|(group, members)| {
        members
            .iter()
            .position(|leaf| leaf == digest)
            .map(|index| LeafPosition { group, index })
    })
}

/// Check that `leaf` is covered by a (possibly reduced) tree whose root is
/// `expected_root`
///
/// A reduced tree only carries the digests needed to prove one leaf; the
/// reduction is the same as for a full tree.
pub fn verify_inclusion<D: Digester + ?Sized>(
    digester: &D,
    tree: &HashTree,
    leaf: &DigestValue,
    expected_root: &DigestValue,
) -> Result<LeafPosition> {
    let position = locate_leaf(tree, leaf).ok_or_else(|| Error::LeafNotFound(leaf.to_hex()))?;

    let root = reduce_tree(digester, tree)?;
    if &root != expected_root {
        return Err(Error::HashMismatch {
            expected: expected_root.to_hex(),
            actual: root.to_hex(),
        });
    }

    Ok(position)
}

/// Root of a run of archive timestamps
///
/// Each token's encoded bytes are digested with `algorithm`, in order, and
/// the resulting single group is reduced with the same algorithm. A run of
/// one token therefore has the digest of that token as its root.
pub fn chain_root<D, T>(
    digester: &D,
    algorithm: DigestAlgorithm,
    tokens: &[T],
) -> Result<DigestValue>
where
    D: Digester + ?Sized,
    T: AsRef<[u8]>,
{
    if tokens.is_empty() {
        return Err(Error::EmptyChain);
    }

    let group = tokens
        .iter()
        .map(|token| digester.digest(algorithm, token.as_ref()))
        .collect::<std::result::Result<Vec<_>, _>>()?;

    reduce_group(digester, algorithm, &group)
}
