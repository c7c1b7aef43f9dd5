// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! SOTA summit directory client and region cache.
//!
//! Handles:
//! - Fetching every summit of an association/region in one request
//! - Caching regions for a TTL, persisted across restarts
//! - Serving stale data when a refresh fails
//! - One refresh in flight per region

use crate::error::AppError;
use crate::models::SummitInfo;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration as StdDuration;

/// SOTA API client.
#[derive(Clone)]
pub struct SotaClient {
    http: reqwest::Client,
    base_url: String,
}

impl SotaClient {
    /// Create a client for `base_url` (e.g. "https://api2.sota.org.uk/api").
    ///
    /// Every request is bounded by `timeout`; a timeout counts as a fetch
    /// failure like any other.
    pub fn new(base_url: impl Into<String>, timeout: StdDuration) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("sotapics/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AppError::Internal(anyhow::anyhow!("HTTP client setup failed: {}", e)))?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Fetch all summits of a region, keyed by upper-case summit code.
    pub async fn get_region(
        &self,
        association: &str,
        region: &str,
    ) -> Result<BTreeMap<String, SummitInfo>, AppError> {
        let url = format!(
            "{}/regions/{}/{}",
            self.base_url,
            urlencoding::encode(association),
            urlencoding::encode(region)
        );

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| AppError::SummitsUnavailable(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(AppError::SummitsUnavailable(format!(
                "HTTP {} for region {}/{}",
                status, association, region
            )));
        }

        let body: RegionResponse = response
            .json()
            .await
            .map_err(|e| AppError::SummitsUnavailable(format!("JSON parse error: {}", e)))?;

        Ok(body
            .summits
            .into_iter()
            .map(|s| {
                (
                    s.summit_code.trim().to_uppercase(),
                    SummitInfo {
                        name: s.name,
                        alt_m: s.alt_m,
                    },
                )
            })
            .collect())
    }
}

/// Region response from the SOTA API. Only the summit list is used.
#[derive(Debug, Deserialize)]
struct RegionResponse {
    summits: Vec<RegionSummit>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RegionSummit {
    summit_code: String,
    #[serde(default, alias = "summitName")]
    name: String,
    #[serde(default)]
    alt_m: Option<i32>,
}

// ─────────────────────────────────────────────────────────────────────────────
// SummitCache - TTL cache of region lookups with stale fallback
// ─────────────────────────────────────────────────────────────────────────────

use crate::db::JsonStore;
use crate::models::{RegionCacheEntry, Summit, SummitRef};
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Persisted form of the cache: "ASSOC/REGION" -> entry.
pub type RegionCacheFile = BTreeMap<String, RegionCacheEntry>;

/// In-memory region cache.
pub type RegionCache = Arc<DashMap<String, Arc<RegionCacheEntry>>>;

/// Per-region locks so only one refresh per region is in flight.
pub type RefreshLocks = Arc<DashMap<String, Arc<Mutex<()>>>>;

/// Describes summit references using cached region data.
#[derive(Clone)]
pub struct SummitCache {
    client: SotaClient,
    store: JsonStore<RegionCacheFile>,
    ttl: Duration,
    regions: RegionCache,
    refresh_locks: RefreshLocks,
    /// Serializes snapshot + save of the cache file.
    save_lock: Arc<Mutex<()>>,
}

impl SummitCache {
    /// Open the cache, loading persisted regions.
    pub async fn open(client: SotaClient, store: JsonStore<RegionCacheFile>, ttl: StdDuration) -> Self {
        let persisted = store.load_or_default().await;
        tracing::info!(
            path = %store.path().display(),
            regions = persisted.len(),
            "Summit cache loaded"
        );

        let regions: RegionCache = Arc::new(
            persisted
                .into_iter()
                .map(|(key, entry)| (key, Arc::new(entry)))
                .collect(),
        );

        Self {
            client,
            store,
            ttl: Duration::from_std(ttl).unwrap_or_else(|_| Duration::hours(1)),
            regions,
            refresh_locks: Arc::new(DashMap::new()),
            save_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Describe a summit reference such as "EA3/GI-002".
    pub async fn describe(&self, reference: &str) -> Result<Summit, AppError> {
        self.describe_at(reference, Utc::now()).await
    }

    /// Describe a summit reference as of `now`.
    ///
    /// Errors:
    /// - `InvalidReference` for malformed input (no cache or network access)
    /// - `NotFound` when the region data does not list the summit
    /// - `SummitsUnavailable` when the region could not be fetched and
    ///   nothing is cached for it. This is kept apart from `NotFound` so
    ///   callers can retry an outage instead of rejecting the reference.
    pub async fn describe_at(&self, reference: &str, now: DateTime<Utc>) -> Result<Summit, AppError> {
        let summit_ref = SummitRef::parse(reference)?;
        let entry = self.region_at(&summit_ref, now).await?;
        let code = summit_ref.code();

        entry
            .lookup(&code)
            .ok_or_else(|| AppError::NotFound(format!("summit {}", code)))
    }

    /// Cached entry for a region key ("EA3/GI"), fresh or stale.
    pub fn cached_region(&self, region_key: &str) -> Option<Arc<RegionCacheEntry>> {
        self.regions.get(region_key).map(|e| e.value().clone())
    }

    /// Resolve the region entry for `summit_ref`, refreshing if stale.
    ///
    /// 1. Fresh cache hit (fast path - no I/O)
    /// 2. Acquire the per-region refresh lock
    /// 3. Re-check the cache (another task may have refreshed)
    /// 4. Fetch the region and replace the entry wholesale
    /// 5. On fetch failure fall back to the stale entry, if any
    async fn region_at(
        &self,
        summit_ref: &SummitRef,
        now: DateTime<Utc>,
    ) -> Result<Arc<RegionCacheEntry>, AppError> {
        let key = summit_ref.region_key();

        if let Some(entry) = self.fresh_entry(&key, now) {
            return Ok(entry);
        }

        let lock = self
            .refresh_locks
            .entry(key.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let _guard = lock.lock().await;

        if let Some(entry) = self.fresh_entry(&key, now) {
            return Ok(entry);
        }

        match self
            .client
            .get_region(&summit_ref.association, &summit_ref.region)
            .await
        {
            Ok(summits) => {
                let entry = Arc::new(RegionCacheEntry::new(now, summits));
                self.regions.insert(key.clone(), entry.clone());
                tracing::info!(region = %key, summits = entry.summits.len(), "Region refreshed");
                self.persist().await;
                Ok(entry)
            }
            Err(e) => match self.cached_region(&key) {
                Some(stale) => {
                    tracing::warn!(
                        region = %key,
                        error = %e,
                        fetched_at = %stale.fetched_at(),
                        "Region refresh failed, serving stale data"
                    );
                    Ok(stale)
                }
                None => {
                    tracing::warn!(region = %key, error = %e, "Region fetch failed, nothing cached");
                    Err(e)
                }
            },
        }
    }

    fn fresh_entry(&self, key: &str, now: DateTime<Utc>) -> Option<Arc<RegionCacheEntry>> {
        self.cached_region(key)
            .filter(|entry| !entry.is_stale(now, self.ttl))
    }

    /// Save a snapshot of every cached region. Failures only cost the
    /// cross-restart copy, so they are logged rather than returned.
    async fn persist(&self) {
        let _guard = self.save_lock.lock().await;
        let snapshot: RegionCacheFile = self
            .regions
            .iter()
            .map(|e| (e.key().clone(), e.value().as_ref().clone()))
            .collect();

        if let Err(e) = self.store.save(&snapshot).await {
            tracing::warn!(error = %e, "Failed to persist summit cache");
        }
    }
}
