//! Read-through identity cache.
//!
//! The authenticator stores the serialized [`crate::Identity`] under the
//! raw token string so repeat requests skip signature verification and
//! the user lookup entirely.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;

use crate::error::AuthError;

/// Cache operations for serialized identities.
///
/// Keys are raw token strings, values are the JSON identity projection.
/// Infrastructure failures surface as [`AuthError::ServiceUnavailable`].
#[async_trait]
pub trait IdentityCache: Send + Sync {
    /// Returns the cached value for `key`, if present and unexpired.
    async fn get(&self, key: &str) -> Result<Option<String>, AuthError>;

    /// Stores `value` under `key` for `ttl`.
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), AuthError>;

    /// Removes a single entry.
    async fn invalidate(&self, key: &str) -> Result<(), AuthError>;

    /// Removes every entry belonging to `subject`, so that suspending a
    /// user takes effect before their tokens expire.
    async fn invalidate_subject(&self, subject: &str) -> Result<(), AuthError>;

    /// Current counters.
    fn stats(&self) -> CacheStats;

    /// Drops expired entries, returning how many were removed.
    async fn cleanup_expired(&self) -> usize {
        0
    }
}

/// Point-in-time cache counters.
#[derive(Debug, Clone, Copy, Default)]
pub struct CacheStats {
    /// Live entries.
    pub size: usize,
    /// Lookup hits.
    pub hits: u64,
    /// Lookup misses.
    pub misses: u64,
    /// Entries removed by expiry or invalidation.
    pub evictions: u64,
}

impl CacheStats {
    /// Hits as a fraction of lookups, 0.0 when no lookups happened.
    #[must_use]
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

struct Entry {
    value: String,
    subject: Option<String>,
    expires_at: Instant,
}

impl Entry {
    fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}

/// In-process identity cache backed by concurrent maps.
///
/// Alongside the token-keyed entries it maintains a subject index so
/// [`IdentityCache::invalidate_subject`] does not scan the whole map.
#[derive(Default)]
pub struct LocalIdentityCache {
    entries: DashMap<String, Entry>,
    by_subject: DashMap<String, HashSet<String>>,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

impl LocalIdentityCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn remove_entry(&self, key: &str) -> bool {
        if let Some((_, entry)) = self.entries.remove(key) {
            if let Some(subject) = entry.subject {
                if let Some(mut keys) = self.by_subject.get_mut(&subject) {
                    keys.remove(key);
                    if keys.is_empty() {
                        drop(keys);
                        self.by_subject.remove(&subject);
                    }
                }
            }
            true
        } else {
            false
        }
    }

    fn subject_of(value: &str) -> Option<String> {
        serde_json::from_str::<serde_json::Value>(value)
            .ok()
            .and_then(|v| v.get("id").and_then(|id| id.as_str().map(String::from)))
    }
}

#[async_trait]
impl IdentityCache for LocalIdentityCache {
    async fn get(&self, key: &str) -> Result<Option<String>, AuthError> {
        // Clone out of the guard before any removal; dashmap deadlocks if
        // a shard is mutated while a reference into it is held.
        let looked_up = self
            .entries
            .get(key)
            .map(|entry| (entry.value.clone(), entry.is_expired()));
        let value = match looked_up {
            Some((value, false)) => Some(value),
            Some((_, true)) => {
                self.remove_entry(key);
                self.evictions.fetch_add(1, Ordering::Relaxed);
                None
            }
            None => None,
        };
        if value.is_some() {
            self.hits.fetch_add(1, Ordering::Relaxed);
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
        }
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), AuthError> {
        let subject = Self::subject_of(value);
        if let Some(subject) = &subject {
            self.by_subject
                .entry(subject.clone())
                .or_default()
                .insert(key.to_string());
        }
        self.entries.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                subject,
                expires_at: Instant::now() + ttl,
            },
        );
        Ok(())
    }

    async fn invalidate(&self, key: &str) -> Result<(), AuthError> {
        if self.remove_entry(key) {
            self.evictions.fetch_add(1, Ordering::Relaxed);
        }
        Ok(())
    }

    async fn invalidate_subject(&self, subject: &str) -> Result<(), AuthError> {
        let keys: Vec<String> = self
            .by_subject
            .remove(subject)
            .map(|(_, keys)| keys.into_iter().collect())
            .unwrap_or_default();
        for key in keys {
            if self.entries.remove(&key).is_some() {
                self.evictions.fetch_add(1, Ordering::Relaxed);
            }
        }
        Ok(())
    }

    fn stats(&self) -> CacheStats {
        CacheStats {
            size: self.entries.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
        }
    }

    async fn cleanup_expired(&self) -> usize {
        let expired: Vec<String> = self
            .entries
            .iter()
            .filter(|entry| entry.is_expired())
            .map(|entry| entry.key().clone())
            .collect();
        let mut removed = 0;
        for key in expired {
            if self.remove_entry(&key) {
                removed += 1;
            }
        }
        self.evictions.fetch_add(removed as u64, Ordering::Relaxed);
        removed
    }
}

/// Cache that stores nothing; every lookup is a miss.
#[derive(Default)]
pub struct NoopIdentityCache;

#[async_trait]
impl IdentityCache for NoopIdentityCache {
    async fn get(&self, _key: &str) -> Result<Option<String>, AuthError> {
        Ok(None)
    }

    async fn set(&self, _key: &str, _value: &str, _ttl: Duration) -> Result<(), AuthError> {
        Ok(())
    }

    async fn invalidate(&self, _key: &str) -> Result<(), AuthError> {
        Ok(())
    }

    async fn invalidate_subject(&self, _subject: &str) -> Result<(), AuthError> {
        Ok(())
    }

    fn stats(&self) -> CacheStats {
        CacheStats::default()
    }
}
