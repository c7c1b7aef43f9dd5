// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Summit cache tests: TTL, stale fallback, persistence and single-flight.

use chrono::{Duration, TimeZone, Utc};
use sotapics::db::{files, JsonStore};
use sotapics::error::AppError;
use sotapics::services::{SotaClient, SummitCache};
use std::path::Path;
use std::time::Duration as StdDuration;
use wiremock::matchers::{any, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

mod common;
use common::{gi_region_body, mount_gi_region};

const TTL: StdDuration = StdDuration::from_secs(3600);

async fn open_cache(dir: &Path, server: &MockServer) -> SummitCache {
    let client = SotaClient::new(format!("{}/api", server.uri()), StdDuration::from_millis(300))
        .expect("client");
    SummitCache::open(client, JsonStore::new(dir.join(files::SOTA_CACHE)), TTL).await
}

fn t0() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
}

#[tokio::test]
async fn test_describe_known_summit() {
    let dir = tempfile::tempdir().unwrap();
    let server = MockServer::start().await;
    mount_gi_region(&server, 1).await;
    let cache = open_cache(dir.path(), &server).await;

    let summit = cache.describe_at("ea3/gi-002", t0()).await.unwrap();
    assert_eq!(summit.code, "EA3/GI-002");
    assert_eq!(summit.name, "Pic de Pales");
    assert_eq!(summit.alt_m, Some(1134));
    assert_eq!(summit.describe(), "EA3/GI-002 Pic de Pales (1134 m)");

    // Codes from the directory are normalized too; unknown altitude survives.
    let summit = cache.describe_at("EA3/GI-010", t0()).await.unwrap();
    assert_eq!(summit.code, "EA3/GI-010");
    assert_eq!(summit.alt_m, None);

    let err = cache.describe_at("EA3/GI-999", t0()).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn test_malformed_reference_never_hits_network() {
    let dir = tempfile::tempdir().unwrap();
    let server = MockServer::start().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    let cache = open_cache(dir.path(), &server).await;

    for bad in ["", "EA3", "EA3/GI", "EA3/GI-00X", "EA3 GI 002"] {
        let err = cache.describe_at(bad, t0()).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidReference(_)), "{:?}", bad);
    }
}

#[tokio::test]
async fn test_fresh_entry_is_not_refetched_within_ttl() {
    let dir = tempfile::tempdir().unwrap();
    let server = MockServer::start().await;
    mount_gi_region(&server, 1).await;
    let cache = open_cache(dir.path(), &server).await;

    cache.describe_at("EA3/GI-002", t0()).await.unwrap();
    cache
        .describe_at("EA3/GI-003", t0() + Duration::minutes(59) + Duration::seconds(59))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_stale_entry_triggers_exactly_one_fetch() {
    let dir = tempfile::tempdir().unwrap();
    let server = MockServer::start().await;
    mount_gi_region(&server, 2).await;
    let cache = open_cache(dir.path(), &server).await;

    cache.describe_at("EA3/GI-002", t0()).await.unwrap();

    let later = t0() + Duration::hours(1) + Duration::seconds(1);
    cache.describe_at("EA3/GI-002", later).await.unwrap();
    assert_eq!(cache.cached_region("EA3/GI").unwrap().fetched_at(), later);

    // Refreshed entry is fresh again.
    cache
        .describe_at("EA3/GI-003", later + Duration::minutes(1))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_failed_refresh_serves_stale_entry_unchanged() {
    let dir = tempfile::tempdir().unwrap();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/regions/EA3/GI"))
        .respond_with(ResponseTemplate::new(200).set_body_json(gi_region_body()))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/regions/EA3/GI"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;
    let cache = open_cache(dir.path(), &server).await;

    let before = cache.describe_at("EA3/GI-002", t0()).await.unwrap();
    let entry_before = cache.cached_region("EA3/GI").unwrap();

    let later = t0() + Duration::hours(2);
    let after = cache.describe_at("EA3/GI-002", later).await.unwrap();
    assert_eq!(before, after);

    let entry_after = cache.cached_region("EA3/GI").unwrap();
    assert_eq!(*entry_before, *entry_after);
    assert_eq!(entry_after.fetched_at(), t0());
}

#[tokio::test]
async fn test_fetch_failure_without_cache_is_unavailable() {
    let dir = tempfile::tempdir().unwrap();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    let cache = open_cache(dir.path(), &server).await;

    let err = cache.describe_at("EA3/GI-002", t0()).await.unwrap_err();
    assert!(matches!(err, AppError::SummitsUnavailable(_)));
    assert!(cache.cached_region("EA3/GI").is_none());
}

#[tokio::test]
async fn test_payload_without_summits_is_a_fetch_failure() {
    let dir = tempfile::tempdir().unwrap();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({ "region": { "regionCode": "GI" } })),
        )
        .mount(&server)
        .await;
    let cache = open_cache(dir.path(), &server).await;

    let err = cache.describe_at("EA3/GI-002", t0()).await.unwrap_err();
    assert!(matches!(err, AppError::SummitsUnavailable(_)));
}

#[tokio::test]
async fn test_timeout_is_a_fetch_failure() {
    let dir = tempfile::tempdir().unwrap();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(gi_region_body())
                .set_delay(StdDuration::from_secs(2)),
        )
        .mount(&server)
        .await;
    let cache = open_cache(dir.path(), &server).await;

    let err = cache.describe_at("EA3/GI-002", t0()).await.unwrap_err();
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_cache_persists_across_restart() {
    let dir = tempfile::tempdir().unwrap();
    let server = MockServer::start().await;
    mount_gi_region(&server, 1).await;

    {
        let cache = open_cache(dir.path(), &server).await;
        cache.describe_at("EA3/GI-002", t0()).await.unwrap();
    }

    let raw = std::fs::read_to_string(dir.path().join(files::SOTA_CACHE)).unwrap();
    let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(json["EA3/GI"]["summits"]["EA3/GI-002"]["name"], "Pic de Pales");
    assert_eq!(json["EA3/GI"]["summits"]["EA3/GI-002"]["altM"], 1134);
    assert!(json["EA3/GI"]["timestamp"].is_number());

    // Served from disk, no second fetch.
    let cache = open_cache(dir.path(), &server).await;
    let summit = cache
        .describe_at("EA3/GI-003", t0() + Duration::minutes(30))
        .await
        .unwrap();
    assert_eq!(summit.name, "Puigsacalm");
}

#[tokio::test]
async fn test_corrupt_cache_file_starts_empty() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join(files::SOTA_CACHE), b"\x00\x01garbage").unwrap();
    let server = MockServer::start().await;
    mount_gi_region(&server, 1).await;

    let cache = open_cache(dir.path(), &server).await;
    assert!(cache.cached_region("EA3/GI").is_none());
    cache.describe_at("EA3/GI-002", t0()).await.unwrap();
}

#[tokio::test]
async fn test_concurrent_misses_share_one_fetch() {
    let dir = tempfile::tempdir().unwrap();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/regions/EA3/GI"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(gi_region_body())
                .set_delay(StdDuration::from_millis(100)),
        )
        .expect(1)
        .mount(&server)
        .await;
    let cache = open_cache(dir.path(), &server).await;

    let mut handles = vec![];
    for _ in 0..8 {
        let cache = cache.clone();
        handles.push(tokio::spawn(async move {
            cache.describe_at("EA3/GI-002", t0()).await
        }));
    }
    for handle in handles {
        let summit = handle.await.expect("Task join failed").expect("describe failed");
        assert_eq!(summit.name, "Pic de Pales");
    }
}
