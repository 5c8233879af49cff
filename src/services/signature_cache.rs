//! Signature-keyed cache for attack-chain analysis results.
//!
//! Adds a second, coarser key space on top of the generic cache engine's
//! `attack-chain` namespace: full results are keyed by the document hash,
//! partial results by a signature derived from the security-relevant
//! projection of the finding collection. Two documents that differ only in
//! ways that do not alter the projection share a signature, so prior
//! multi-step reasoning can be reused as a partial hit.

use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::domain::models::{CacheConfig, Finding};
use crate::services::cache_service::{canonical_json, CacheService};

/// Hex characters of the SHA-256 digest kept as a signature.
const SIGNATURE_HEX_LEN: usize = 16;

const NAMESPACE: &str = "attack-chain";

/// Combined counters across the full and partial key spaces.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignatureCacheStats {
    pub full_hits: u64,
    pub partial_hits: u64,
    pub misses: u64,
    pub hit_rate_percent: f64,
}

#[derive(Debug, Default)]
struct Counters {
    full_hits: u64,
    partial_hits: u64,
    misses: u64,
}

/// Attack-chain result cache with full and partial key spaces, each
/// independently TTL-governed.
#[derive(Clone)]
pub struct SignatureCache {
    cache: Arc<CacheService>,
    counters: Arc<RwLock<Counters>>,
    full_ttl: Duration,
    partial_ttl: Duration,
}

impl SignatureCache {
    pub fn new(cache: Arc<CacheService>, config: &CacheConfig) -> Self {
        Self {
            cache,
            counters: Arc::new(RwLock::new(Counters::default())),
            full_ttl: Duration::from_secs(config.signature_full_ttl_secs),
            partial_ttl: Duration::from_secs(config.signature_partial_ttl_secs),
        }
    }

    /// Exact-document lookup by spec hash.
    pub async fn get_full(&self, spec_hash: &str) -> Option<Value> {
        let result = self.cache.get(NAMESPACE, &format!("full:{spec_hash}")).await;
        let mut counters = self.counters.write().await;
        match result {
            Some(value) => {
                counters.full_hits += 1;
                Some(value)
            }
            None => {
                counters.misses += 1;
                None
            }
        }
    }

    /// Structural-equivalence lookup by finding signature.
    pub async fn get_partial(&self, signature: &str) -> Option<Value> {
        let result = self
            .cache
            .get(NAMESPACE, &format!("partial:{signature}"))
            .await;
        let mut counters = self.counters.write().await;
        match result {
            Some(value) => {
                counters.partial_hits += 1;
                Some(value)
            }
            None => {
                counters.misses += 1;
                None
            }
        }
    }

    pub async fn store_full(&self, spec_hash: &str, value: Value) {
        self.cache
            .set(
                NAMESPACE,
                &format!("full:{spec_hash}"),
                value,
                Some(self.full_ttl),
            )
            .await;
    }

    pub async fn store_partial(&self, signature: &str, value: Value) {
        self.cache
            .set(
                NAMESPACE,
                &format!("partial:{signature}"),
                value,
                Some(self.partial_ttl),
            )
            .await;
    }

    pub async fn stats(&self) -> SignatureCacheStats {
        let counters = self.counters.read().await;
        let hits = counters.full_hits + counters.partial_hits;
        let total = hits + counters.misses;
        let hit_rate_percent = if total == 0 {
            0.0
        } else {
            (hits as f64 / total as f64) * 100.0
        };
        SignatureCacheStats {
            full_hits: counters.full_hits,
            partial_hits: counters.partial_hits,
            misses: counters.misses,
            hit_rate_percent,
        }
    }
}

/// Compute the stable signature of a finding collection.
///
/// Findings are projected to their security-relevant fields, sorted by
/// (category, severity) so collection order never changes the signature,
/// then canonically serialized and hashed.
pub fn finding_signature(findings: &[Finding]) -> String {
    let mut projections: Vec<_> = findings.iter().map(Finding::projection).collect();
    projections.sort_by(|a, b| {
        (a.category.as_str(), a.severity.as_str()).cmp(&(b.category.as_str(), b.severity.as_str()))
    });
    let serialized = serde_json::to_value(&projections)
        .map(|value| canonical_json(&value))
        .unwrap_or_default();
    let digest = Sha256::digest(serialized.as_bytes());
    let mut signature = hex::encode(digest);
    signature.truncate(SIGNATURE_HEX_LEN);
    signature
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn finding(id: &str, category: &str, severity: &str, endpoint: &str) -> Finding {
        Finding {
            finding_id: id.to_string(),
            category: category.to_string(),
            severity: severity.to_string(),
            endpoint: endpoint.to_string(),
            schema: None,
            is_public: true,
            auth_required: false,
            description: String::new(),
        }
    }

    fn signature_cache() -> SignatureCache {
        let config = CacheConfig::default();
        SignatureCache::new(Arc::new(CacheService::new(&config)), &config)
    }

    #[test]
    fn test_signature_ignores_finding_ids() {
        let a = vec![finding("f-1", "auth", "high", "/pets")];
        let b = vec![finding("f-2", "auth", "high", "/pets")];
        assert_eq!(finding_signature(&a), finding_signature(&b));
    }

    #[test]
    fn test_signature_ignores_collection_order() {
        let a = vec![
            finding("1", "auth", "high", "/pets"),
            finding("2", "bola", "low", "/users"),
        ];
        let b = vec![
            finding("2", "bola", "low", "/users"),
            finding("1", "auth", "high", "/pets"),
        ];
        assert_eq!(finding_signature(&a), finding_signature(&b));
    }

    #[test]
    fn test_signature_changes_with_projection() {
        let a = vec![finding("1", "auth", "high", "/pets")];
        let mut changed = a.clone();
        changed[0].auth_required = true;
        assert_ne!(finding_signature(&a), finding_signature(&changed));
    }

    #[tokio::test]
    async fn test_full_and_partial_spaces_are_independent() {
        let cache = signature_cache();
        cache.store_full("spec1", json!("full-result")).await;
        assert_eq!(cache.get_full("spec1").await, Some(json!("full-result")));
        assert_eq!(cache.get_partial("spec1").await, None);
    }

    #[tokio::test]
    async fn test_partial_hit_after_structural_noise() {
        let cache = signature_cache();
        let first = vec![finding("f-1", "auth", "high", "/pets")];
        let second = vec![finding("f-9", "auth", "high", "/pets")];

        cache
            .store_partial(&finding_signature(&first), json!("chain"))
            .await;
        assert_eq!(
            cache.get_partial(&finding_signature(&second)).await,
            Some(json!("chain"))
        );

        let stats = cache.stats().await;
        assert_eq!(stats.partial_hits, 1);
        assert_eq!(stats.misses, 0);
    }

    #[tokio::test]
    async fn test_combined_stats() {
        let cache = signature_cache();
        cache.store_full("h1", json!(1)).await;
        cache.get_full("h1").await;
        cache.get_full("h2").await;
        cache.get_partial("sig").await;

        let stats = cache.stats().await;
        assert_eq!(stats.full_hits, 1);
        assert_eq!(stats.partial_hits, 0);
        assert_eq!(stats.misses, 2);
        assert!((stats.hit_rate_percent - 33.333).abs() < 0.01);
    }
}
