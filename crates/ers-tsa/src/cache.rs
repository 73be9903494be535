//! Memoizing token verifier with TTL support

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use ers_types::{DigestValue, TimestampToken};

use crate::error::Result;
use crate::verifier::{TokenVerification, TokenVerifier};

/// Default time an outcome stays cached
pub const DEFAULT_TTL: Duration = Duration::from_secs(3600);

/// Outcomes are keyed by what the verification depends on
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    token: [u8; 32],
    expected: DigestValue,
    reference_time: DateTime<Utc>,
}

/// A cached outcome with expiration time
#[derive(Debug, Clone)]
struct CacheEntry {
    outcome: TokenVerification,
    expires_at: Instant,
}

impl CacheEntry {
    fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}

/// [`TokenVerifier`] decorator that memoizes another verifier's outcomes
///
/// Evidence records renewed many times re-verify the same tokens, and a
/// batch of records often shares them. Only successful calls are cached;
/// an `Err` from the inner verifier is returned as is and retried next time.
///
/// Thread-safe: one cache can be shared by validators on several threads.
///
/// # Example
///
/// ```
/// use ers_tsa::{CachingTokenVerifier, Rfc3161TokenVerifier, VerifyOpts};
/// use std::time::Duration;
///
/// let verifier = CachingTokenVerifier::new(Rfc3161TokenVerifier::new(VerifyOpts::new()))
///     .with_ttl(Duration::from_secs(600));
/// assert!(verifier.is_empty());
/// ```
#[derive(Debug)]
pub struct CachingTokenVerifier<V> {
    inner: V,
    ttl: Duration,
    entries: RwLock<HashMap<CacheKey, CacheEntry>>,
}

impl<V: TokenVerifier> CachingTokenVerifier<V> {
    /// Wrap `inner` with the default TTL
    pub fn new(inner: V) -> Self {
        Self {
            inner,
            ttl: DEFAULT_TTL,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Set how long outcomes stay cached
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// The wrapped verifier
    pub fn inner(&self) -> &V {
        &self.inner
    }

    /// Remove expired entries from the cache
    ///
    /// Lookups skip expired entries anyway; this only reclaims memory.
    pub fn cleanup_expired(&self) {
        if let Ok(mut entries) = self.entries.write() {
            entries.retain(|_, entry| !entry.is_expired());
        }
    }

    /// Drop every cached outcome
    pub fn clear(&self) {
        if let Ok(mut entries) = self.entries.write() {
            entries.clear();
        }
    }

    /// Number of entries in the cache (including expired ones)
    pub fn len(&self) -> usize {
        self.entries.read().map(|entries| entries.len()).unwrap_or(0)
    }

    /// Check if the cache is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lookup(&self, key: &CacheKey) -> Option<TokenVerification> {
        let entries = self.entries.read().ok()?;
        entries
            .get(key)
            .filter(|entry| !entry.is_expired())
            .map(|entry| entry.outcome.clone())
    }

    fn store(&self, key: CacheKey, outcome: TokenVerification) {
        // A poisoned lock only costs the memoization
        if let Ok(mut entries) = self.entries.write() {
            entries.insert(
                key,
                CacheEntry {
                    outcome,
                    expires_at: Instant::now() + self.ttl,
                },
            );
        }
    }
}

impl<V: TokenVerifier> TokenVerifier for CachingTokenVerifier<V> {
    fn verify_token(
        &self,
        token: &TimestampToken,
        expected: &DigestValue,
        reference_time: DateTime<Utc>,
    ) -> Result<TokenVerification> {
        let key = CacheKey {
            token: ers_crypto::sha256(token.as_bytes()),
            expected: expected.clone(),
            reference_time,
        };

        if let Some(outcome) = self.lookup(&key) {
            tracing::trace!("Token verification cache hit for {}", expected);
            return Ok(outcome);
        }

        let outcome = self.inner.verify_token(token, expected, reference_time)?;
        self.store(key, outcome.clone());
        Ok(outcome)
    }
}
