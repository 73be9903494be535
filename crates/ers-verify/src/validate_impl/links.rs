//! Chain link classification
//!
//! Every archive timestamp after the first must commit to what came before
//! it through the leaves of its hash tree that are not data objects:
//!
//! - one such leaf: it is the digest of the immediately preceding
//!   timestamp token
//! - several: one of them is the root of the whole preceding run of
//!   timestamps (the previous chain, or the earlier timestamps of this one)
//!
//! Link digests are computed with the current chain's algorithm.

use super::matching::DataObjectIndex;
use crate::error::Result;
use crate::reference::{ReferenceKind, ReferenceValidation};
use ers_crypto::Digester;
use ers_types::{DigestValue, EvidenceRecord, StructuralError, TimestampPosition};

/// Classify and check the link of the timestamp at `position`
///
/// `position` must not be the first timestamp of the record.
pub(crate) fn classify_link<D: Digester + ?Sized>(
    digester: &D,
    record: &EvidenceRecord,
    position: TimestampPosition,
    index: &DataObjectIndex<'_>,
) -> Result<ReferenceValidation> {
    let chain = &record.chains[position.chain];
    let ats = &chain.timestamps[position.timestamp];
    let algorithm = chain.digest_algorithm;
    let missing = || StructuralError::MissingLinkDigest {
        chain: chain.order,
        timestamp: ats.order,
    };

    let link_leaves: Vec<&DigestValue> = ats
        .hash_tree
        .leaves()
        .filter(|leaf| !index.is_data_digest(leaf))
        .collect();

    let (kind, expected) = match link_leaves.len() {
        0 => return Err(missing().into()),
        1 => {
            let previous = record
                .predecessor(position)
                .and_then(|previous| record.timestamp(previous))
                .ok_or_else(missing)?;
            let expected = digester.digest(algorithm, previous.timestamp_token.as_bytes())?;
            (ReferenceKind::ArchiveTimeStamp, expected)
        }
        _ => {
            let expected = preceding_chain_root(digester, record, position)?;
            (ReferenceKind::ArchiveTimeStampSequence, expected)
        }
    };

    let intact = link_leaves.iter().any(|leaf| **leaf == expected);
    tracing::debug!(
        "Archive timestamp {} of chain {}: {} link with {} candidate leaf(s), intact={}",
        ats.order,
        chain.order,
        kind,
        link_leaves.len(),
        intact
    );

    Ok(ReferenceValidation {
        kind,
        found: true,
        intact,
        digest: Some(expected),
        identifier: None,
        position,
    })
}

/// Root of the run of timestamps preceding `position`
///
/// For the first timestamp of a chain this is the whole previous chain;
/// otherwise the timestamps before it in its own chain.
fn preceding_chain_root<D: Digester + ?Sized>(
    digester: &D,
    record: &EvidenceRecord,
    position: TimestampPosition,
) -> Result<DigestValue> {
    let chain = &record.chains[position.chain];
    let run = if position.starts_chain() {
        let previous = position
            .chain
            .checked_sub(1)
            .and_then(|c| record.chains.get(c))
            .ok_or(StructuralError::MissingLinkDigest {
                chain: chain.order,
                timestamp: chain.timestamps[position.timestamp].order,
            })?;
        &previous.timestamps[..]
    } else {
        &chain.timestamps[..position.timestamp]
    };

    let tokens: Vec<&[u8]> = run.iter().map(|ats| ats.timestamp_token.as_bytes()).collect();
    Ok(ers_merkle::chain_root(
        digester,
        chain.digest_algorithm,
        &tokens,
    )?)
}
