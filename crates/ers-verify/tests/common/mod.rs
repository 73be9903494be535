//! Shared helpers for validation tests

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use ers_verify::crypto::AwsLcDigester;
use ers_verify::tsa::{self, TokenVerification, TokenVerifier};
use ers_verify::types::{
    ArchiveTimeStamp, ArchiveTimeStampChain, DigestAlgorithm, DigestValue, HashTree,
    TimestampToken,
};

pub fn at(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(secs, 0).unwrap()
}

pub fn h(algorithm: DigestAlgorithm, data: &[u8]) -> DigestValue {
    ers_verify::crypto::digest(algorithm, data).unwrap()
}

pub fn sha256(data: &[u8]) -> DigestValue {
    h(DigestAlgorithm::Sha256, data)
}

pub fn sha512(data: &[u8]) -> DigestValue {
    h(DigestAlgorithm::Sha512, data)
}

struct Issued {
    imprint: DigestValue,
    generation_time: DateTime<Utc>,
}

/// An in-memory timestamp authority
///
/// Tokens are the bytes `tst-N`; the authority remembers which imprint and
/// generation time each one was issued for.
#[derive(Default)]
pub struct StubTsa {
    issued: Mutex<HashMap<Vec<u8>, Issued>>,
    untrusted: Mutex<HashSet<Vec<u8>>>,
    offline: Mutex<bool>,
    calls: Mutex<Vec<(Vec<u8>, DateTime<Utc>)>>,
}

impl StubTsa {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a token over `imprint`
    pub fn issue(&self, imprint: DigestValue, generation_time: DateTime<Utc>) -> TimestampToken {
        let mut issued = self.issued.lock().unwrap();
        let bytes = format!("tst-{}", issued.len()).into_bytes();
        issued.insert(
            bytes.clone(),
            Issued {
                imprint,
                generation_time,
            },
        );
        TimestampToken::new(bytes)
    }

    /// Make the signer of `token` untrusted
    pub fn distrust(&self, token: &TimestampToken) {
        self.untrusted
            .lock()
            .unwrap()
            .insert(token.as_bytes().to_vec());
    }

    /// Fail every verification with an error
    pub fn go_offline(&self) {
        *self.offline.lock().unwrap() = true;
    }

    /// Token bytes and reference times seen, in call order
    pub fn calls(&self) -> Vec<(Vec<u8>, DateTime<Utc>)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn reference_time_of(&self, token: &TimestampToken) -> Option<DateTime<Utc>> {
        self.calls()
            .into_iter()
            .find(|(bytes, _)| bytes == token.as_bytes())
            .map(|(_, time)| time)
    }

    /// Build an archive timestamp over `groups` and stamp its root
    pub fn stamp(
        &self,
        order: u32,
        algorithm: DigestAlgorithm,
        groups: Vec<Vec<DigestValue>>,
        generation_time: DateTime<Utc>,
    ) -> ArchiveTimeStamp {
        let tree = HashTree::new(algorithm, groups).unwrap();
        let root = ers_verify::merkle::reduce_tree(&AwsLcDigester, &tree).unwrap();
        ArchiveTimeStamp::new(order, tree, self.issue(root, generation_time))
    }
}

impl TokenVerifier for StubTsa {
    fn verify_token(
        &self,
        token: &TimestampToken,
        expected: &DigestValue,
        reference_time: DateTime<Utc>,
    ) -> tsa::Result<TokenVerification> {
        self.calls
            .lock()
            .unwrap()
            .push((token.as_bytes().to_vec(), reference_time));

        if *self.offline.lock().unwrap() {
            return Err(tsa::Error::Unavailable("timestamp authority offline".into()));
        }

        let issued = self.issued.lock().unwrap();
        let Some(issued) = issued.get(token.as_bytes()) else {
            return Ok(TokenVerification::unprocessed("unknown token"));
        };

        let mut outcome = TokenVerification::verified(Some(issued.generation_time));
        if issued.imprint != *expected {
            outcome.message_imprint_intact = false;
            outcome.failure = Some("message imprint mismatch".into());
        }
        if self.untrusted.lock().unwrap().contains(token.as_bytes()) {
            outcome.certificate_chain_trusted = false;
            outcome.failure.get_or_insert_with(|| "untrusted signer".into());
        }
        Ok(outcome)
    }
}

/// Accepts every token, judging nothing
pub struct AcceptAll;

impl TokenVerifier for AcceptAll {
    fn verify_token(
        &self,
        _token: &TimestampToken,
        _expected: &DigestValue,
        _reference_time: DateTime<Utc>,
    ) -> tsa::Result<TokenVerification> {
        Ok(TokenVerification::verified(None))
    }
}

pub fn chain(
    order: u32,
    algorithm: DigestAlgorithm,
    timestamps: Vec<ArchiveTimeStamp>,
) -> ArchiveTimeStampChain {
    ArchiveTimeStampChain::new(order, algorithm, timestamps)
}
