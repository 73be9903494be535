//! Hashing utilities using aws-lc-rs

use crate::error::Result;
use aws_lc_rs::digest::{
    self, Algorithm, Context, SHA1_FOR_LEGACY_USE_ONLY, SHA224, SHA256, SHA384, SHA3_256,
    SHA3_384, SHA3_512, SHA512,
};
use ers_types::{DigestAlgorithm, DigestValue};

fn backend(algorithm: DigestAlgorithm) -> &'static Algorithm {
    match algorithm {
        DigestAlgorithm::Sha1 => &SHA1_FOR_LEGACY_USE_ONLY,
        DigestAlgorithm::Sha224 => &SHA224,
        DigestAlgorithm::Sha256 => &SHA256,
        DigestAlgorithm::Sha384 => &SHA384,
        DigestAlgorithm::Sha512 => &SHA512,
        DigestAlgorithm::Sha3_256 => &SHA3_256,
        DigestAlgorithm::Sha3_384 => &SHA3_384,
        DigestAlgorithm::Sha3_512 => &SHA3_512,
    }
}

/// Hash data with the given algorithm
pub fn digest(algorithm: DigestAlgorithm, data: &[u8]) -> Result<DigestValue> {
    let out = digest::digest(backend(algorithm), data);
    Ok(DigestValue::new(algorithm, out.as_ref())?)
}

/// Hash data using SHA-256
pub fn sha256(data: &[u8]) -> [u8; 32] {
    let digest = digest::digest(&SHA256, data);
    let mut result = [0u8; 32];
    result.copy_from_slice(digest.as_ref());
    result
}

/// Hash data using SHA-384
pub fn sha384(data: &[u8]) -> [u8; 48] {
    let digest = digest::digest(&SHA384, data);
    let mut result = [0u8; 48];
    result.copy_from_slice(digest.as_ref());
    result
}

/// Hash data using SHA-512
pub fn sha512(data: &[u8]) -> [u8; 64] {
    let digest = digest::digest(&SHA512, data);
    let mut result = [0u8; 64];
    result.copy_from_slice(digest.as_ref());
    result
}

/// Incremental hasher for any supported algorithm
pub struct Hasher {
    algorithm: DigestAlgorithm,
    context: Context,
}

impl Hasher {
    /// Create a new hasher
    pub fn new(algorithm: DigestAlgorithm) -> Self {
        Self {
            algorithm,
            context: Context::new(backend(algorithm)),
        }
    }

    /// Update the hasher with data
    pub fn update(&mut self, data: &[u8]) {
        self.context.update(data);
    }

    /// Finalize and get the digest
    pub fn finalize(self) -> Result<DigestValue> {
        let out = self.context.finish();
        Ok(DigestValue::new(self.algorithm, out.as_ref())?)
    }
}

/// Capability to compute digests
///
/// The validator takes this as a parameter instead of calling a global, so
/// tests and alternative backends can be injected.
pub trait Digester: Send + Sync {
    /// Digest `data` with `algorithm`
    fn digest(&self, algorithm: DigestAlgorithm, data: &[u8]) -> Result<DigestValue>;

    /// Digest the concatenation of `parts`, in the order given
    fn digest_parts(&self, algorithm: DigestAlgorithm, parts: &[&[u8]]) -> Result<DigestValue> {
        self.digest(algorithm, &parts.concat())
    }
}

/// The default [`Digester`], backed by aws-lc-rs
#[derive(Debug, Clone, Copy, Default)]
pub struct AwsLcDigester;

impl Digester for AwsLcDigester {
    fn digest(&self, algorithm: DigestAlgorithm, data: &[u8]) -> Result<DigestValue> {
        digest(algorithm, data)
    }

    fn digest_parts(&self, algorithm: DigestAlgorithm, parts: &[&[u8]]) -> Result<DigestValue> {
        let mut hasher = Hasher::new(algorithm);
        for part in parts {
            hasher.update(part);
        }
        hasher.finalize()
    }
}
