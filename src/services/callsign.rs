// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Registry of callsigns by user identity.

use crate::db::JsonStore;
use crate::error::{AppError, Result};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::Mutex;

type CallsignMap = BTreeMap<String, String>;

/// Maps a user identity to the callsign they registered.
///
/// Callsigns never expire and cannot be removed, only overwritten.
#[derive(Clone)]
pub struct CallsignRegistry {
    store: JsonStore<CallsignMap>,
    /// In-memory copy; every mutation saves under this lock.
    callsigns: Arc<Mutex<CallsignMap>>,
}

impl CallsignRegistry {
    /// Open the registry, loading any prior state.
    pub async fn open(store: JsonStore<CallsignMap>) -> Self {
        let callsigns = store.load_or_default().await;
        tracing::info!(
            path = %store.path().display(),
            count = callsigns.len(),
            "Callsign registry loaded"
        );
        Self {
            store,
            callsigns: Arc::new(Mutex::new(callsigns)),
        }
    }

    /// Register (or replace) the callsign for `user_id`, stored upper-case.
    pub async fn register(&self, user_id: &str, callsign: &str) -> Result<String> {
        let callsign = callsign.trim().to_uppercase();
        if callsign.is_empty()
            || !callsign
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '/')
        {
            return Err(AppError::InvalidCallsign(callsign));
        }

        // Memory only changes once the new map is on disk.
        let mut callsigns = self.callsigns.lock().await;
        let mut updated = callsigns.clone();
        updated.insert(user_id.to_string(), callsign.clone());
        self.store.save(&updated).await?;
        *callsigns = updated;

        tracing::info!(user_id, callsign = %callsign, "Callsign registered");
        Ok(callsign)
    }

    pub async fn lookup(&self, user_id: &str) -> Option<String> {
        self.callsigns.lock().await.get(user_id).cloned()
    }
}
