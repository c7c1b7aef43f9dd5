// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! On-disk activation folders.
//!
//! One folder per (callsign, reference, UTC day):
//!
//! ```text
//! <data_dir>/<CALLSIGN>/<ASSOC-REGION-NUMBER>_<YYYY-MM-DD>/
//!     photo_1.jpg, photo_2.jpg, ...   gap-free, 1-based
//!     captions.txt                    "photo_N.jpg: caption" per line
//!     qsl_photo.txt                   name of the eQSL background photo
//!     qsos.csv                        contact log (supplied by the operator)
//! ```
//!
//! All folder mutations go through [`ActivationDirectory`], which holds one
//! lock per folder so concurrent uploads never share a photo slot.

use crate::error::{AppError, Result};
use crate::models::SummitRef;
use crate::time_utils::activation_date;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

pub const PHOTO_PREFIX: &str = "photo_";
pub const PHOTO_EXTENSION: &str = "jpg";
pub const CAPTIONS_FILE: &str = "captions.txt";
pub const QSL_MARKER_FILE: &str = "qsl_photo.txt";
pub const CONTACT_LOG_FILE: &str = "qsos.csv";

/// Caption that selects a photo as the eQSL background.
const QSL_CAPTION: &str = "qsl";

/// Photo count per folder; `None` until read from disk.
type FolderLock = Arc<Mutex<Option<u32>>>;

/// A photo written into an activation folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredPhoto {
    /// 1-based slot number
    pub slot: u32,
    /// File name inside the folder (e.g. "photo_3.jpg")
    pub file_name: String,
    pub path: PathBuf,
}

/// Manages the layout and contents of activation folders.
#[derive(Clone)]
pub struct ActivationDirectory {
    data_dir: PathBuf,
    folders: Arc<DashMap<PathBuf, FolderLock>>,
}

impl ActivationDirectory {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            folders: Arc::new(DashMap::new()),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Folder for `callsign` at `reference` on the UTC day of `at`.
    ///
    /// Pure path derivation; the folder is created on first write.
    pub fn resolve_path(
        &self,
        callsign: &str,
        reference: &str,
        at: DateTime<Utc>,
    ) -> Result<PathBuf> {
        let summit_ref = SummitRef::parse(reference)?;
        let callsign = callsign.trim().to_uppercase();
        if callsign.is_empty() || callsign.contains("..") {
            return Err(AppError::InvalidCallsign(callsign));
        }

        Ok(self
            .data_dir
            .join(callsign.replace(['/', '\\'], "-"))
            .join(format!("{}_{}", summit_ref.slug(), activation_date(at))))
    }

    /// Slot number the next photo in `folder` will get.
    pub async fn next_photo_slot(&self, folder: &Path) -> Result<u32> {
        let lock = self.folder_lock(folder);
        let mut count = lock.lock().await;
        Ok(seeded_count(&mut count, folder).await? + 1)
    }

    /// Write `bytes` as the next photo in `folder`.
    ///
    /// The slot only advances once the file is written, so a failed write
    /// leaves no gap.
    pub async fn store_photo(&self, folder: &Path, bytes: &[u8]) -> Result<StoredPhoto> {
        let lock = self.folder_lock(folder);
        let mut count = lock.lock().await;

        tokio::fs::create_dir_all(folder).await?;
        let slot = seeded_count(&mut count, folder).await? + 1;
        let file_name = photo_file_name(slot);
        let path = folder.join(&file_name);

        tokio::fs::write(&path, bytes).await?;
        *count = Some(slot);

        tracing::info!(path = %path.display(), slot, bytes = bytes.len(), "Photo stored");
        Ok(StoredPhoto {
            slot,
            file_name,
            path,
        })
    }

    /// Append one caption line for `photo_name`. Earlier lines are never
    /// rewritten; line breaks inside the caption are flattened.
    pub async fn append_caption(&self, folder: &Path, photo_name: &str, caption: &str) -> Result<()> {
        let lock = self.folder_lock(folder);
        let _guard = lock.lock().await;

        tokio::fs::create_dir_all(folder).await?;
        let caption = caption.replace(['\r', '\n'], " ");
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(folder.join(CAPTIONS_FILE))
            .await?;
        file.write_all(format!("{}: {}\n", photo_name, caption).as_bytes())
            .await?;
        file.flush().await?;

        Ok(())
    }

    /// Caption log entries in write order.
    pub async fn captions(&self, folder: &Path) -> Result<Vec<(String, String)>> {
        let text = match tokio::fs::read_to_string(folder.join(CAPTIONS_FILE)).await {
            Ok(t) => t,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        Ok(text
            .lines()
            .filter_map(|line| line.split_once(": "))
            .map(|(name, caption)| (name.to_string(), caption.to_string()))
            .collect())
    }

    /// Make `photo_name` the eQSL background, replacing any earlier choice.
    pub async fn mark_qsl_photo(&self, folder: &Path, photo_name: &str) -> Result<()> {
        let lock = self.folder_lock(folder);
        let _guard = lock.lock().await;

        tokio::fs::create_dir_all(folder).await?;
        tokio::fs::write(folder.join(QSL_MARKER_FILE), photo_name).await?;

        tracing::info!(folder = %folder.display(), photo = photo_name, "QSL photo marked");
        Ok(())
    }

    /// The marked eQSL background, if any.
    pub async fn qsl_photo(&self, folder: &Path) -> Result<Option<String>> {
        match tokio::fs::read_to_string(folder.join(QSL_MARKER_FILE)).await {
            Ok(name) => {
                let name = name.trim();
                Ok((!name.is_empty()).then(|| name.to_string()))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Store (or replace) the contact log for `folder`.
    pub async fn store_contact_log(&self, folder: &Path, bytes: &[u8]) -> Result<PathBuf> {
        let lock = self.folder_lock(folder);
        let _guard = lock.lock().await;

        tokio::fs::create_dir_all(folder).await?;
        let path = folder.join(CONTACT_LOG_FILE);
        tokio::fs::write(&path, bytes).await?;

        tracing::info!(path = %path.display(), bytes = bytes.len(), "Contact log stored");
        Ok(path)
    }

    fn folder_lock(&self, folder: &Path) -> FolderLock {
        self.folders
            .entry(folder.to_path_buf())
            .or_insert_with(|| Arc::new(Mutex::new(None)))
            .clone()
    }
}

/// Whether a photo caption selects the eQSL background.
pub fn is_qsl_caption(caption: &str) -> bool {
    caption.trim().eq_ignore_ascii_case(QSL_CAPTION)
}

pub fn photo_file_name(slot: u32) -> String {
    format!("{}{}.{}", PHOTO_PREFIX, slot, PHOTO_EXTENSION)
}

/// Return the folder's photo count, reading it from disk on first use.
async fn seeded_count(count: &mut Option<u32>, folder: &Path) -> Result<u32> {
    if let Some(n) = *count {
        return Ok(n);
    }
    let n = count_photos(folder).await?;
    *count = Some(n);
    Ok(n)
}

/// Count `photo_<n>.jpg` files already in `folder`.
async fn count_photos(folder: &Path) -> Result<u32> {
    let mut entries = match tokio::fs::read_dir(folder).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(e.into()),
    };

    let mut count = 0;
    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name();
        let is_photo = name
            .to_str()
            .and_then(|n| n.strip_prefix(PHOTO_PREFIX))
            .and_then(|n| n.strip_suffix(PHOTO_EXTENSION))
            .and_then(|n| n.strip_suffix('.'))
            .is_some_and(|n| !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit()));
        if is_photo {
            count += 1;
        }
    }

    Ok(count)
}
