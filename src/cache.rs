//! In-memory cache of resolved drug identities.
//!
//! Identity resolution hits an external directory service, and the same
//! drug tends to recur within a dispensing session. Successful lookups are
//! held for a fixed TTL; failures are never cached, so a transient outage
//! does not pin misses.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::config::EngineConfig;
use crate::models::DrugIdentity;

// ═══════════════════════════════════════════════════════════
// CachedIdentity — one resolved entry
// ═══════════════════════════════════════════════════════════

struct CachedIdentity {
    identity: DrugIdentity,
    stored_at: Instant,
}

// ═══════════════════════════════════════════════════════════
// IdentityCache
// ═══════════════════════════════════════════════════════════

/// TTL cache keyed by normalized query string.
///
/// Expiry is lazy: entries are checked (and dropped) on read, never by a
/// background task. Interior locking keeps the cache usable behind a shared
/// reference from concurrent calculations; a poisoned lock degrades to a
/// cache miss rather than an error.
pub struct IdentityCache {
    entries: Mutex<HashMap<String, CachedIdentity>>,
    ttl: Duration,
}

impl IdentityCache {
    /// Create an empty cache whose entries expire after `ttl`.
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    /// Look up a cached identity. Expired entries are removed on the spot
    /// and reported as a miss.
    pub fn get(&self, key: &str) -> Option<DrugIdentity> {
        let mut entries = self.entries.lock().ok()?;
        match entries.get(key) {
            Some(cached) if cached.stored_at.elapsed() <= self.ttl => {
                Some(cached.identity.clone())
            }
            Some(_) => {
                entries.remove(key);
                tracing::debug!(query = %key, "Cached identity expired");
                None
            }
            None => None,
        }
    }

    /// Store a resolved identity, replacing any previous entry for the key.
    pub fn set(&self, key: &str, identity: DrugIdentity) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(
                key.to_string(),
                CachedIdentity {
                    identity,
                    stored_at: Instant::now(),
                },
            );
        }
    }

    /// Drop every entry.
    pub fn clear(&self) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.clear();
        }
    }

    /// Number of entries currently held, expired or not.
    pub fn len(&self) -> usize {
        self.entries.lock().map(|entries| entries.len()).unwrap_or(0)
    }

    /// Whether the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for IdentityCache {
    fn default() -> Self {
        Self::new(EngineConfig::DEFAULT_IDENTITY_CACHE_TTL)
    }
}

// ═══════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════
