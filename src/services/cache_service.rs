//! Namespaced in-process result cache with TTL expiry and LRU eviction.
//!
//! All cache state is ephemeral: a restart clears every namespace (no
//! warm-start). Each get/set is atomic with respect to its own key; two
//! concurrent identical misses may both compute and both write
//! (last-writer-wins). Writes happen only after a value is fully computed,
//! so a cancelled request never leaves partial state behind.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::domain::models::CacheConfig;

/// Namespaces served by the cache engine.
pub const NAMESPACES: &[&str] = &[
    "spec-parse",
    "test-cases",
    "mock-data",
    "explanation",
    "security-analysis",
    "attack-chain",
];

/// Hex characters of the SHA-256 digest kept as a cache key.
const KEY_HEX_LEN: usize = 16;

/// A single cached value with its bookkeeping.
///
/// Owned exclusively by the cache engine; mutated only by `get` (which bumps
/// `last_accessed` and `hit_count`) and by `set`/eviction.
#[derive(Debug, Clone)]
pub(crate) struct CacheEntry {
    pub value: Value,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub last_accessed: DateTime<Utc>,
    pub hit_count: u64,
}

impl CacheEntry {
    fn new(value: Value, now: DateTime<Utc>, ttl: Duration) -> Self {
        let ttl = ChronoDuration::from_std(ttl).unwrap_or_else(|_| ChronoDuration::days(365));
        Self {
            value,
            created_at: now,
            expires_at: now + ttl,
            last_accessed: now,
            hit_count: 0,
        }
    }

    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Per-namespace counters exposed by `stats`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CacheStats {
    pub size: usize,
    pub hits: u64,
    pub misses: u64,
    pub hit_rate_percent: f64,
}

/// Bookkeeping snapshot of a single entry, for diagnostics. Reading it
/// does not count as a hit or miss.
#[derive(Debug, Clone, Serialize)]
pub struct EntryMetadata {
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub last_accessed: DateTime<Utc>,
    pub hit_count: u64,
}

#[derive(Debug, Default)]
struct NamespaceStore {
    entries: HashMap<String, CacheEntry>,
    hits: u64,
    misses: u64,
}

impl NamespaceStore {
    fn stats(&self) -> CacheStats {
        let total = self.hits + self.misses;
        let hit_rate_percent = if total == 0 {
            0.0
        } else {
            (self.hits as f64 / total as f64) * 100.0
        };
        CacheStats {
            size: self.entries.len(),
            hits: self.hits,
            misses: self.misses,
            hit_rate_percent,
        }
    }

    /// Remove every expired entry. Runs opportunistically before size checks.
    fn sweep_expired(&mut self, now: DateTime<Utc>) {
        self.entries.retain(|_, entry| !entry.is_expired(now));
    }

    /// Evict entries in ascending `last_accessed` order until at or under
    /// the limit. True LRU, not insertion order.
    fn evict_to(&mut self, max_entries: usize) {
        while self.entries.len() > max_entries {
            let oldest = self
                .entries
                .iter()
                .min_by_key(|(_, entry)| entry.last_accessed)
                .map(|(key, _)| key.clone());
            match oldest {
                Some(key) => {
                    debug!(key = %key, "evicting least-recently-used cache entry");
                    self.entries.remove(&key);
                }
                None => break,
            }
        }
    }
}

struct Inner {
    namespaces: HashMap<String, NamespaceStore>,
}

/// The generic cache engine.
///
/// Explicitly constructed by the process entry point and shared by
/// reference; there is no ambient global instance.
#[derive(Clone)]
pub struct CacheService {
    inner: Arc<RwLock<Inner>>,
    max_entries: usize,
    default_ttl: Duration,
}

impl CacheService {
    pub fn new(config: &CacheConfig) -> Self {
        let namespaces = NAMESPACES
            .iter()
            .map(|name| ((*name).to_string(), NamespaceStore::default()))
            .collect();
        Self {
            inner: Arc::new(RwLock::new(Inner { namespaces })),
            max_entries: config.max_entries,
            default_ttl: Duration::from_secs(config.default_ttl_secs),
        }
    }

    /// Look up a key. An entry past its expiry is a miss and is removed
    /// (lazy expiry). A hit bumps `last_accessed` and `hit_count`.
    pub async fn get(&self, namespace: &str, key: &str) -> Option<Value> {
        let now = Utc::now();
        let mut inner = self.inner.write().await;
        let store = inner.namespaces.get_mut(namespace)?;

        match store.entries.get_mut(key) {
            Some(entry) if entry.is_expired(now) => {
                store.entries.remove(key);
                store.misses += 1;
                None
            }
            Some(entry) => {
                entry.last_accessed = now;
                entry.hit_count += 1;
                let value = entry.value.clone();
                store.hits += 1;
                Some(value)
            }
            None => {
                store.misses += 1;
                None
            }
        }
    }

    /// Store a value under a key, replacing any previous entry. A `ttl` of
    /// `None` uses the configured default.
    pub async fn set(&self, namespace: &str, key: &str, value: Value, ttl: Option<Duration>) {
        let now = Utc::now();
        let ttl = ttl.unwrap_or(self.default_ttl);
        let mut inner = self.inner.write().await;
        let Some(store) = inner.namespaces.get_mut(namespace) else {
            warn!(namespace, "set on unknown cache namespace ignored");
            return;
        };
        store.sweep_expired(now);
        store
            .entries
            .insert(key.to_string(), CacheEntry::new(value, now, ttl));
        store.evict_to(self.max_entries);
    }

    /// Remove every entry in the namespace whose key starts with `prefix`
    /// and return the number removed.
    ///
    /// Invalidating `spec-parse` entries cascades: any `test-cases` or
    /// `mock-data` entry whose key embeds the same document hash is removed
    /// too, since those values were derived from the invalidated parse.
    pub async fn invalidate(&self, namespace: &str, prefix: &str) -> usize {
        let mut inner = self.inner.write().await;
        let Some(store) = inner.namespaces.get_mut(namespace) else {
            return 0;
        };

        let removed: Vec<String> = store
            .entries
            .keys()
            .filter(|key| key.starts_with(prefix))
            .cloned()
            .collect();
        for key in &removed {
            store.entries.remove(key);
        }
        let mut count = removed.len();

        if namespace == "spec-parse" {
            let doc_hashes: Vec<String> = removed
                .iter()
                .map(|key| key.split(':').next().unwrap_or(key).to_string())
                .collect();
            for derived in ["test-cases", "mock-data"] {
                if let Some(derived_store) = inner.namespaces.get_mut(derived) {
                    for hash in &doc_hashes {
                        let stale: Vec<String> = derived_store
                            .entries
                            .keys()
                            .filter(|key| key.contains(hash.as_str()))
                            .cloned()
                            .collect();
                        for key in stale {
                            derived_store.entries.remove(&key);
                            count += 1;
                        }
                    }
                }
            }
        }

        debug!(namespace, prefix, count, "cache invalidation");
        count
    }

    /// Bookkeeping for a single entry, if present.
    pub async fn entry_metadata(&self, namespace: &str, key: &str) -> Option<EntryMetadata> {
        let inner = self.inner.read().await;
        let entry = inner.namespaces.get(namespace)?.entries.get(key)?;
        Some(EntryMetadata {
            created_at: entry.created_at,
            expires_at: entry.expires_at,
            last_accessed: entry.last_accessed,
            hit_count: entry.hit_count,
        })
    }

    /// Counters for one namespace.
    pub async fn stats(&self, namespace: &str) -> Option<CacheStats> {
        let inner = self.inner.read().await;
        inner.namespaces.get(namespace).map(NamespaceStore::stats)
    }

    /// Counters for every namespace.
    pub async fn stats_all(&self) -> HashMap<String, CacheStats> {
        let inner = self.inner.read().await;
        inner
            .namespaces
            .iter()
            .map(|(name, store)| (name.clone(), store.stats()))
            .collect()
    }
}

/// Derive a stable cache key from the logical input that produced a value.
///
/// Identical logical inputs map to the same key regardless of structural
/// ordering: the input is serialized with object keys sorted, then hashed
/// with SHA-256 and truncated.
pub fn derive_key(input: &Value) -> String {
    let digest = Sha256::digest(canonical_json(input).as_bytes());
    let mut key = hex::encode(digest);
    key.truncate(KEY_HEX_LEN);
    key
}

/// Serialize a value with all object keys in sorted order.
pub fn canonical_json(value: &Value) -> String {
    match value {
        Value::Object(map) => {
            let mut pairs: Vec<(&String, &Value)> = map.iter().collect();
            pairs.sort_by_key(|(key, _)| key.as_str());
            let body = pairs
                .iter()
                .map(|(key, val)| {
                    format!("{}:{}", Value::String((*key).clone()), canonical_json(val))
                })
                .collect::<Vec<_>>()
                .join(",");
            format!("{{{body}}}")
        }
        Value::Array(items) => {
            let body = items
                .iter()
                .map(canonical_json)
                .collect::<Vec<_>>()
                .join(",");
            format!("[{body}]")
        }
        scalar => scalar.to_string(),
    }
}
