// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! SOTA summit references and cached region metadata.

use crate::error::AppError;
use crate::time_utils::{from_unix_seconds, to_unix_seconds};
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

static REFERENCE_RE: Lazy<Regex> = Lazy::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r"^([A-Z0-9]+)/([A-Z0-9]+)-([0-9]+)$").expect("reference pattern must compile")
});

/// A parsed summit reference: `ASSOCIATION/REGION-NUMBER`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SummitRef {
    pub association: String,
    pub region: String,
    /// Summit number, leading zeros kept ("002")
    pub number: String,
}

impl SummitRef {
    /// Parse and upper-case a raw reference such as `ea3/gi-002`.
    pub fn parse(raw: &str) -> Result<Self, AppError> {
        let normalized = raw.trim().to_uppercase();
        let caps = REFERENCE_RE
            .captures(&normalized)
            .ok_or_else(|| AppError::InvalidReference(raw.trim().to_string()))?;

        Ok(Self {
            association: caps[1].to_string(),
            region: caps[2].to_string(),
            number: caps[3].to_string(),
        })
    }

    /// Full normalized code, e.g. "EA3/GI-002".
    pub fn code(&self) -> String {
        self.to_string()
    }

    /// Cache key covering every summit of the region, e.g. "EA3/GI".
    pub fn region_key(&self) -> String {
        format!("{}/{}", self.association, self.region)
    }

    /// Reference with slashes replaced, for use in folder names.
    pub fn slug(&self) -> String {
        format!("{}-{}-{}", self.association, self.region, self.number)
    }
}

impl fmt::Display for SummitRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}-{}", self.association, self.region, self.number)
    }
}

/// Summit metadata as stored in the region cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummitInfo {
    pub name: String,
    /// Altitude in meters, if the directory knows it
    #[serde(rename = "altM")]
    pub alt_m: Option<i32>,
}

/// A resolved summit: its normalized code plus metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct Summit {
    pub code: String,
    pub name: String,
    pub alt_m: Option<i32>,
}

impl Summit {
    pub fn new(code: impl Into<String>, info: &SummitInfo) -> Self {
        Self {
            code: code.into(),
            name: info.name.clone(),
            alt_m: info.alt_m,
        }
    }

    /// Human description, e.g. "EA3/GI-002 Pic de Pales (1134 m)".
    pub fn describe(&self) -> String {
        match self.alt_m {
            Some(alt) => format!("{} {} ({} m)", self.code, self.name, alt),
            None => format!("{} {}", self.code, self.name),
        }
    }
}

/// All summits of one region, fetched together.
///
/// Entries are replaced wholesale on refresh, never merged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionCacheEntry {
    /// Fetch time in Unix seconds
    pub timestamp: f64,
    /// Summits keyed by upper-case code
    pub summits: BTreeMap<String, SummitInfo>,
}

impl RegionCacheEntry {
    pub fn new(fetched_at: DateTime<Utc>, summits: BTreeMap<String, SummitInfo>) -> Self {
        Self {
            timestamp: to_unix_seconds(fetched_at),
            summits,
        }
    }

    pub fn fetched_at(&self) -> DateTime<Utc> {
        from_unix_seconds(self.timestamp)
    }

    /// Stale once strictly more than `ttl` has passed since the fetch.
    pub fn is_stale(&self, now: DateTime<Utc>, ttl: chrono::Duration) -> bool {
        now - self.fetched_at() > ttl
    }

    pub fn lookup(&self, code: &str) -> Option<Summit> {
        let code = code.to_uppercase();
        self.summits.get(&code).map(|info| Summit::new(code, info))
    }
}
