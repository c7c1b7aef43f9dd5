// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Whole-file JSON persistence for small mappings.
//!
//! Callers keep the mapping in memory and hand the full snapshot to
//! [`JsonStore::save`]; there are no per-key updates. Serializing concurrent
//! writers is the caller's job (each registry saves under its own lock).

use serde::{de::DeserializeOwned, Serialize};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

/// A JSON file holding one value of type `T`.
#[derive(Debug, Clone)]
pub struct JsonStore<T> {
    path: PathBuf,
    _value: PhantomData<fn() -> T>,
}

impl<T> JsonStore<T>
where
    T: Serialize + DeserializeOwned + Default,
{
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            _value: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the stored value.
    ///
    /// A missing file is not an error and yields `T::default()`.
    pub async fn load(&self) -> Result<T, StoreError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(T::default()),
            Err(e) => return Err(StoreError::Io(e.to_string())),
        };

        serde_json::from_slice(&bytes).map_err(|e| StoreError::Corrupt(e.to_string()))
    }

    /// Load the stored value, treating unreadable or corrupt state as empty.
    ///
    /// Prior state is lost when this happens, so it is logged loudly.
    pub async fn load_or_default(&self) -> T {
        match self.load().await {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Discarding unreadable state file"
                );
                T::default()
            }
        }
    }

    /// Overwrite the stored value with `value`.
    ///
    /// Writes a sibling temp file and renames it into place so a crash
    /// mid-write never leaves a truncated file behind.
    pub async fn save(&self, value: &T) -> Result<(), StoreError> {
        let json =
            serde_json::to_vec_pretty(value).map_err(|e| StoreError::Io(e.to_string()))?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| StoreError::Io(e.to_string()))?;
            }
        }

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        tokio::fs::write(&tmp, &json)
            .await
            .map_err(|e| StoreError::Io(e.to_string()))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| StoreError::Io(e.to_string()))?;

        tracing::debug!(path = %self.path.display(), bytes = json.len(), "State saved");
        Ok(())
    }
}

/// Errors from state file access.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("State file I/O failed: {0}")]
    Io(String),

    #[error("State file is corrupt: {0}")]
    Corrupt(String),
}

impl From<StoreError> for crate::error::AppError {
    fn from(err: StoreError) -> Self {
        crate::error::AppError::Storage(err.to_string())
    }
}
