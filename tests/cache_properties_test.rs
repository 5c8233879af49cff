//! Cache engine behavior at the integration level: TTL, LRU bounds,
//! cascading invalidation, and signature reuse.

use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

use specmend::services::{finding_signature, SignatureCache};
use specmend::{CacheConfig, CacheService, Finding};

fn cache(max_entries: usize) -> CacheService {
    CacheService::new(&CacheConfig {
        max_entries,
        ..CacheConfig::default()
    })
}

#[tokio::test]
async fn ttl_expiry_removes_the_entry() {
    let cache = cache(16);
    cache
        .set(
            "spec-parse",
            "k",
            json!("v"),
            Some(Duration::from_millis(80)),
        )
        .await;

    assert_eq!(cache.get("spec-parse", "k").await, Some(json!("v")));

    tokio::time::sleep(Duration::from_millis(160)).await;
    assert_eq!(cache.get("spec-parse", "k").await, None);

    let stats = cache.stats("spec-parse").await.unwrap();
    assert_eq!(stats.size, 0);
}

#[tokio::test]
async fn lru_bound_retains_most_recently_used() {
    let max = 4;
    let n = 3;
    let cache = cache(max);

    for i in 0..(max + n) {
        cache
            .set("mock-data", &format!("key{i}"), json!(i), None)
            .await;
    }

    let stats = cache.stats("mock-data").await.unwrap();
    assert_eq!(stats.size, max);

    // exactly the n least-recently-accessed keys are gone
    for i in 0..n {
        assert_eq!(cache.get("mock-data", &format!("key{i}")).await, None);
    }
    for i in n..(max + n) {
        assert!(cache.get("mock-data", &format!("key{i}")).await.is_some());
    }
}

#[tokio::test]
async fn access_refreshes_lru_position() {
    let cache = cache(2);
    cache.set("test-cases", "old", json!(1), None).await;
    cache.set("test-cases", "newer", json!(2), None).await;

    // touching "old" makes "newer" the eviction candidate
    cache.get("test-cases", "old").await;
    cache.set("test-cases", "newest", json!(3), None).await;

    assert!(cache.get("test-cases", "old").await.is_some());
    assert_eq!(cache.get("test-cases", "newer").await, None);
}

#[tokio::test]
async fn spec_parse_invalidation_cascades_to_derived_namespaces() {
    let cache = cache(16);
    let doc_hash = "a1b2c3d4";

    cache.set("spec-parse", doc_hash, json!("parsed"), None).await;
    cache
        .set("test-cases", &format!("{doc_hash}:get-pets"), json!("t"), None)
        .await;
    cache
        .set("mock-data", &format!("{doc_hash}:pet"), json!("m"), None)
        .await;
    cache
        .set("explanation", &format!("{doc_hash}:why"), json!("e"), None)
        .await;

    let removed = cache.invalidate("spec-parse", doc_hash).await;

    // the parse entry plus both derived entries; explanation is untouched
    assert_eq!(removed, 3);
    assert_eq!(
        cache.get("test-cases", &format!("{doc_hash}:get-pets")).await,
        None
    );
    assert_eq!(cache.get("mock-data", &format!("{doc_hash}:pet")).await, None);
    assert!(cache
        .get("explanation", &format!("{doc_hash}:why"))
        .await
        .is_some());
}

fn finding(id: &str, category: &str, severity: &str) -> Finding {
    Finding {
        finding_id: id.to_string(),
        category: category.to_string(),
        severity: severity.to_string(),
        endpoint: "/pets".to_string(),
        schema: Some("Pet".to_string()),
        is_public: true,
        auth_required: false,
        description: format!("finding {id}"),
    }
}

#[tokio::test]
async fn signature_partial_hit_across_equivalent_collections() {
    let config = CacheConfig::default();
    let signatures = SignatureCache::new(Arc::new(CacheService::new(&config)), &config);

    // same projection, different finding ids and descriptions
    let scan_one = vec![finding("f-1", "auth", "high"), finding("f-2", "bola", "low")];
    let scan_two = vec![finding("f-7", "bola", "low"), finding("f-9", "auth", "high")];

    let sig_one = finding_signature(&scan_one);
    let sig_two = finding_signature(&scan_two);
    assert_eq!(sig_one, sig_two);

    signatures
        .store_partial(&sig_one, json!({"chains": ["auth->bola"]}))
        .await;

    assert_eq!(
        signatures.get_partial(&sig_two).await,
        Some(json!({"chains": ["auth->bola"]}))
    );

    let stats = signatures.stats().await;
    assert_eq!(stats.partial_hits, 1);
    assert_eq!(stats.misses, 0);
    assert!((stats.hit_rate_percent - 100.0).abs() < f64::EPSILON);
}

proptest::proptest! {
    /// Property: the namespace never holds more than `max_entries` entries,
    /// no matter how many distinct keys are inserted.
    #[test]
    fn prop_size_never_exceeds_capacity(max in 1usize..8, inserts in 1usize..32) {
        tokio_test::block_on(async {
            let cache = cache(max);
            for i in 0..inserts {
                cache
                    .set("security-analysis", &format!("k{i}"), serde_json::json!(i), None)
                    .await;
            }
            let stats = cache.stats("security-analysis").await.unwrap();
            assert!(stats.size <= max);
            assert_eq!(stats.size, inserts.min(max));
        });
    }
}

#[tokio::test]
async fn signature_differs_when_projection_differs() {
    let with_auth = vec![finding("f-1", "auth", "high")];
    let mut without_auth = with_auth.clone();
    without_auth[0].auth_required = true;

    assert_ne!(
        finding_signature(&with_auth),
        finding_signature(&without_auth)
    );
}
