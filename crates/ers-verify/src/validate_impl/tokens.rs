//! Timestamp token verification over a whole record

use chrono::{DateTime, Utc};
use ers_tsa::{TokenVerification, TokenVerifier};
use ers_types::{ArchiveTimeStamp, DigestValue, TimestampPosition};

/// Verify every token, newest first
///
/// The newest token is judged at `validation_time`. Each older token is
/// judged at the generation time its successor reports, which is when it
/// was last renewed; without one, `validation_time` is used.
///
/// `stamps` is in walk order and the result is in the same order.
pub(crate) fn verify_tokens<V: TokenVerifier + ?Sized>(
    verifier: &V,
    stamps: &[(TimestampPosition, &ArchiveTimeStamp, DigestValue)],
    validation_time: DateTime<Utc>,
) -> Vec<(DateTime<Utc>, TokenVerification)> {
    let mut outcomes = Vec::with_capacity(stamps.len());
    let mut successor_time: Option<DateTime<Utc>> = None;

    for (position, ats, root) in stamps.iter().rev() {
        let reference_time = successor_time.unwrap_or(validation_time);
        let outcome = match verifier.verify_token(&ats.timestamp_token, root, reference_time) {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::warn!(
                    "Token verification failed for chain {} timestamp {}: {}",
                    position.chain,
                    position.timestamp,
                    e
                );
                TokenVerification::unprocessed(e.to_string())
            }
        };
        successor_time = outcome.generation_time;
        outcomes.push((reference_time, outcome));
    }

    outcomes.reverse();
    outcomes
}
