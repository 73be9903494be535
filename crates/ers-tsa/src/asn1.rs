//! ASN.1 types for RFC 3161 timestamp tokens
//!
//! Only the structures needed to read a token are defined here: the
//! `TSTInfo` carried inside the CMS `SignedData`, and its message imprint.

use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use const_oid::ObjectIdentifier;
use der::{
    asn1::{GeneralizedTime, Int, OctetString},
    Decode, Sequence,
};
use ers_types::{DigestAlgorithm, DigestValue};
use x509_cert::{ext::pkix::name::GeneralName, ext::Extensions};

/// OID for id-ct-TSTInfo: 1.2.840.113549.1.9.16.1.4
pub const OID_TST_INFO: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.2.840.113549.1.9.16.1.4");

/// Algorithm identifier with optional parameters
#[derive(Clone, Debug, Eq, PartialEq, Sequence)]
pub struct AlgorithmIdentifier {
    /// Algorithm OID
    pub algorithm: ObjectIdentifier,
    /// Optional parameters (usually NULL or absent for hash algorithms)
    #[asn1(optional = "true")]
    pub parameters: Option<der::Any>,
}

impl AlgorithmIdentifier {
    /// Identifier for a digest algorithm, without parameters
    pub fn for_digest(algorithm: DigestAlgorithm) -> Result<Self> {
        let oid = ObjectIdentifier::new(algorithm.oid())
            .map_err(|e| Error::Asn1(format!("invalid OID for {}: {}", algorithm, e)))?;
        Ok(Self {
            algorithm: oid,
            parameters: None,
        })
    }

    /// The digest algorithm this identifier names, if supported
    pub fn to_digest_algorithm(&self) -> Option<DigestAlgorithm> {
        DigestAlgorithm::from_oid(&self.algorithm.to_string()).ok()
    }
}

/// Message imprint: the digest a timestamp token protects
///
/// RFC 3161 Section 2.4.1
#[derive(Clone, Debug, Eq, PartialEq, Sequence)]
pub struct Asn1MessageImprint {
    /// Hash algorithm used
    pub hash_algorithm: AlgorithmIdentifier,
    /// Hashed message
    pub hashed_message: OctetString,
}

impl Asn1MessageImprint {
    /// Create a message imprint
    pub fn new(algorithm: AlgorithmIdentifier, digest: Vec<u8>) -> Result<Self> {
        Ok(Self {
            hash_algorithm: algorithm,
            hashed_message: OctetString::new(digest)?,
        })
    }

    /// Create the imprint of a digest value
    pub fn from_digest(digest: &DigestValue) -> Result<Self> {
        Self::new(
            AlgorithmIdentifier::for_digest(digest.algorithm())?,
            digest.as_bytes().to_vec(),
        )
    }

    /// Read the imprint back as a digest value
    pub fn to_digest(&self) -> Result<DigestValue> {
        let algorithm = self.hash_algorithm.to_digest_algorithm().ok_or_else(|| {
            Error::UnsupportedAlgorithm(self.hash_algorithm.algorithm.to_string())
        })?;
        Ok(DigestValue::new(
            algorithm,
            self.hashed_message.as_bytes(),
        )?)
    }

    /// Whether the imprint equals `expected`, algorithm included
    pub fn matches(&self, expected: &DigestValue) -> bool {
        self.hash_algorithm.to_digest_algorithm() == Some(expected.algorithm())
            && self.hashed_message.as_bytes() == expected.as_bytes()
    }
}

/// Accuracy of the timestamp
/// RFC 3161 Section 2.4.2
#[derive(Clone, Debug, Eq, PartialEq, Sequence)]
pub struct Accuracy {
    /// Seconds
    #[asn1(optional = "true")]
    pub seconds: Option<u64>,
    /// Milliseconds (1-999)
    #[asn1(context_specific = "0", optional = "true")]
    pub millis: Option<u16>,
    /// Microseconds (1-999)
    #[asn1(context_specific = "1", optional = "true")]
    pub micros: Option<u16>,
}

/// TSTInfo - the signed content of a timestamp token
/// RFC 3161 Section 2.4.2
#[derive(Clone, Debug, Eq, PartialEq, Sequence)]
pub struct TstInfo {
    /// Version (must be 1)
    pub version: u8,
    /// Policy OID
    pub policy: ObjectIdentifier,
    /// Message imprint
    pub message_imprint: Asn1MessageImprint,
    /// Serial number
    pub serial_number: Int,
    /// Generation time
    pub gen_time: GeneralizedTime,
    /// Accuracy
    #[asn1(optional = "true")]
    pub accuracy: Option<Accuracy>,
    /// Ordering
    #[asn1(default = "default_false")]
    pub ordering: bool,
    /// Nonce
    #[asn1(optional = "true")]
    pub nonce: Option<Int>,
    /// TSA name
    #[asn1(context_specific = "0", optional = "true", tag_mode = "EXPLICIT")]
    pub tsa: Option<GeneralName>,
    /// Extensions
    #[asn1(context_specific = "1", optional = "true", tag_mode = "IMPLICIT")]
    pub extensions: Option<Extensions>,
}

fn default_false() -> bool {
    false
}

impl TstInfo {
    /// Decode from DER bytes
    pub fn from_der_bytes(bytes: &[u8]) -> Result<Self> {
        Ok(Self::from_der(bytes)?)
    }

    /// The generation time as a UTC instant
    pub fn generation_time(&self) -> Result<DateTime<Utc>> {
        let since_epoch = self.gen_time.to_unix_duration();
        let secs = i64::try_from(since_epoch.as_secs())
            .map_err(|_| Error::Parse("generation time out of range".to_string()))?;
        DateTime::from_timestamp(secs, since_epoch.subsec_nanos())
            .ok_or_else(|| Error::Parse("invalid generation time in TSTInfo".to_string()))
    }
}
