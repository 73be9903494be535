//! Digest algorithm and digest value types

use crate::error::{Error, Result};
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Digest algorithms an evidence record may be built with
///
/// SHA-1 is only accepted so that legacy records can still be checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DigestAlgorithm {
    /// SHA-1 (legacy)
    #[serde(rename = "SHA1")]
    Sha1,
    /// SHA2-224
    #[serde(rename = "SHA224")]
    Sha224,
    /// SHA2-256
    #[serde(rename = "SHA256")]
    Sha256,
    /// SHA2-384
    #[serde(rename = "SHA384")]
    Sha384,
    /// SHA2-512
    #[serde(rename = "SHA512")]
    Sha512,
    /// SHA3-256
    #[serde(rename = "SHA3_256")]
    Sha3_256,
    /// SHA3-384
    #[serde(rename = "SHA3_384")]
    Sha3_384,
    /// SHA3-512
    #[serde(rename = "SHA3_512")]
    Sha3_512,
}

impl DigestAlgorithm {
    /// All supported algorithms
    pub const ALL: [DigestAlgorithm; 8] = [
        DigestAlgorithm::Sha1,
        DigestAlgorithm::Sha224,
        DigestAlgorithm::Sha256,
        DigestAlgorithm::Sha384,
        DigestAlgorithm::Sha512,
        DigestAlgorithm::Sha3_256,
        DigestAlgorithm::Sha3_384,
        DigestAlgorithm::Sha3_512,
    ];

    /// Get the digest size in bytes for this algorithm
    pub fn digest_size(&self) -> usize {
        match self {
            DigestAlgorithm::Sha1 => 20,
            DigestAlgorithm::Sha224 => 28,
            DigestAlgorithm::Sha256 | DigestAlgorithm::Sha3_256 => 32,
            DigestAlgorithm::Sha384 | DigestAlgorithm::Sha3_384 => 48,
            DigestAlgorithm::Sha512 | DigestAlgorithm::Sha3_512 => 64,
        }
    }

    /// Get the OID for this algorithm
    pub fn oid(&self) -> &'static str {
        match self {
            DigestAlgorithm::Sha1 => "1.3.14.3.2.26",
            DigestAlgorithm::Sha224 => "2.16.840.1.101.3.4.2.4",
            DigestAlgorithm::Sha256 => "2.16.840.1.101.3.4.2.1",
            DigestAlgorithm::Sha384 => "2.16.840.1.101.3.4.2.2",
            DigestAlgorithm::Sha512 => "2.16.840.1.101.3.4.2.3",
            DigestAlgorithm::Sha3_256 => "2.16.840.1.101.3.4.2.8",
            DigestAlgorithm::Sha3_384 => "2.16.840.1.101.3.4.2.9",
            DigestAlgorithm::Sha3_512 => "2.16.840.1.101.3.4.2.10",
        }
    }

    /// Look an algorithm up by its dotted OID
    pub fn from_oid(oid: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|alg| alg.oid() == oid)
            .ok_or_else(|| Error::UnknownAlgorithm(oid.to_string()))
    }

    /// Stable upper-case name, as used in the JSON form
    pub fn name(&self) -> &'static str {
        match self {
            DigestAlgorithm::Sha1 => "SHA1",
            DigestAlgorithm::Sha224 => "SHA224",
            DigestAlgorithm::Sha256 => "SHA256",
            DigestAlgorithm::Sha384 => "SHA384",
            DigestAlgorithm::Sha512 => "SHA512",
            DigestAlgorithm::Sha3_256 => "SHA3_256",
            DigestAlgorithm::Sha3_384 => "SHA3_384",
            DigestAlgorithm::Sha3_512 => "SHA3_512",
        }
    }
}

impl std::fmt::Display for DigestAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DigestAlgorithm {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.to_ascii_uppercase().replace(['-', '_'], "");
        Self::ALL
            .into_iter()
            .find(|alg| alg.name().replace('_', "") == normalized)
            .ok_or_else(|| Error::UnknownAlgorithm(s.to_string()))
    }
}

/// An algorithm-tagged digest
///
/// The payload length always matches the algorithm's output size. Two values
/// are equal only if both the algorithm and the bytes are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "DigestValueRepr", into = "DigestValueRepr")]
pub struct DigestValue {
    algorithm: DigestAlgorithm,
    bytes: Vec<u8>,
}

impl DigestValue {
    /// Create a digest value, checking the payload length
    pub fn new(algorithm: DigestAlgorithm, bytes: impl Into<Vec<u8>>) -> Result<Self> {
        let bytes = bytes.into();
        if bytes.len() != algorithm.digest_size() {
            return Err(Error::InvalidDigestLength {
                algorithm,
                expected: algorithm.digest_size(),
                actual: bytes.len(),
            });
        }
        Ok(Self { algorithm, bytes })
    }

    /// Parse from a hex-encoded payload
    pub fn from_hex(algorithm: DigestAlgorithm, s: &str) -> Result<Self> {
        Self::new(algorithm, hex::decode(s)?)
    }

    /// Parse from a base64-encoded payload
    pub fn from_base64(algorithm: DigestAlgorithm, s: &str) -> Result<Self> {
        let bytes = base64::engine::general_purpose::STANDARD.decode(s)?;
        Self::new(algorithm, bytes)
    }

    /// The algorithm that produced this digest
    pub fn algorithm(&self) -> DigestAlgorithm {
        self.algorithm
    }

    /// Get the digest bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Encode the payload as lowercase hex
    pub fn to_hex(&self) -> String {
        hex::encode(&self.bytes)
    }

    /// Encode the payload as base64
    pub fn to_base64(&self) -> String {
        base64::engine::general_purpose::STANDARD.encode(&self.bytes)
    }
}

impl AsRef<[u8]> for DigestValue {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

impl std::fmt::Display for DigestValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.algorithm, self.to_hex())
    }
}

#[derive(Serialize, Deserialize)]
struct DigestValueRepr {
    algorithm: DigestAlgorithm,
    #[serde(with = "base64_bytes")]
    value: Vec<u8>,
}

impl TryFrom<DigestValueRepr> for DigestValue {
    type Error = Error;

    fn try_from(repr: DigestValueRepr) -> Result<Self> {
        DigestValue::new(repr.algorithm, repr.value)
    }
}

impl From<DigestValue> for DigestValueRepr {
    fn from(value: DigestValue) -> Self {
        Self {
            algorithm: value.algorithm,
            value: value.bytes,
        }
    }
}

/// Serde helper for base64 encoding/decoding of byte arrays
pub mod base64_bytes {
    use base64::{engine::general_purpose::STANDARD, Engine};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        STANDARD.decode(s).map_err(serde::de::Error::custom)
    }

    /// Same as the parent module, for optional fields
    pub mod option {
        use base64::{engine::general_purpose::STANDARD, Engine};
        use serde::{Deserialize, Deserializer, Serializer};

        pub fn serialize<S>(bytes: &Option<Vec<u8>>, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            match bytes {
                Some(bytes) => serializer.serialize_some(&STANDARD.encode(bytes)),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Vec<u8>>, D::Error>
        where
            D: Deserializer<'de>,
        {
            Option::<String>::deserialize(deserializer)?
                .map(|s| STANDARD.decode(s).map_err(serde::de::Error::custom))
                .transpose()
        }
    }
}
