// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for date/time conversion.

use chrono::{DateTime, Utc};

/// Calendar day (UTC) used to name activation folders, e.g. "2025-06-01".
pub fn activation_date(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%d").to_string()
}

/// Unix time in fractional seconds.
pub fn to_unix_seconds(at: DateTime<Utc>) -> f64 {
    at.timestamp_millis() as f64 / 1000.0
}

/// Inverse of [`to_unix_seconds`] at millisecond precision.
///
/// Out-of-range values clamp to the Unix epoch, which reads as very stale.
pub fn from_unix_seconds(secs: f64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis((secs * 1000.0).round() as i64).unwrap_or_default()
}
