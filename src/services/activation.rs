// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Activation workflow service.
//!
//! Entry points for a command adapter (chat bot, CLI):
//! 1. Register a callsign
//! 2. Set the active reference (opens a session)
//! 3. Upload photos (optionally captioned, "qsl" marks the eQSL background)
//! 4. Upload the contact log
//! 5. Generate eQSLs
//! 6. Cancel the session

use crate::error::{AppError, Result};
use crate::models::Session;
use crate::services::folders::{is_qsl_caption, ActivationDirectory};
use crate::services::session::OpenedSession;
use crate::services::{CallsignRegistry, QslCompositor, SessionRegistry};
use chrono::{DateTime, Utc};
use std::path::PathBuf;

/// Outcome of a photo upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotoUpload {
    pub slot: u32,
    pub file_name: String,
    pub folder: PathBuf,
    /// Whether this photo is now the eQSL background
    pub qsl_marked: bool,
}

/// Runs user commands against the registries and activation folders.
#[derive(Clone)]
pub struct ActivationService {
    callsigns: CallsignRegistry,
    sessions: SessionRegistry,
    folders: ActivationDirectory,
    compositor: QslCompositor,
    /// eQSL output directory, relative to the activation folder
    eqsl_output_dir: String,
}

impl ActivationService {
    pub fn new(
        callsigns: CallsignRegistry,
        sessions: SessionRegistry,
        folders: ActivationDirectory,
        compositor: QslCompositor,
        eqsl_output_dir: String,
    ) -> Self {
        Self {
            callsigns,
            sessions,
            folders,
            compositor,
            eqsl_output_dir,
        }
    }

    pub async fn register_callsign(&self, user_id: &str, callsign: &str) -> Result<String> {
        self.callsigns.register(user_id, callsign).await
    }

    pub async fn set_reference(&self, user_id: &str, reference: &str) -> Result<OpenedSession> {
        self.sessions.open_session(user_id, reference).await
    }

    pub async fn cancel(&self, user_id: &str) -> Result<bool> {
        self.sessions.close(user_id).await
    }

    /// Activation folder for the user's session, as of `at`.
    pub async fn folder_at(&self, user_id: &str, at: DateTime<Utc>) -> Result<(Session, PathBuf)> {
        let session = self
            .sessions
            .lookup(user_id)
            .await
            .ok_or(AppError::SessionRequired)?;
        let folder = self
            .folders
            .resolve_path(&session.callsign, &session.reference, at)?;
        Ok((session, folder))
    }

    /// Store a photo in today's activation folder.
    pub async fn upload_photo(
        &self,
        user_id: &str,
        bytes: &[u8],
        caption: Option<&str>,
    ) -> Result<PhotoUpload> {
        self.upload_photo_at(user_id, bytes, caption, Utc::now()).await
    }

    /// Store a photo in the activation folder for the UTC day of `at`.
    pub async fn upload_photo_at(
        &self,
        user_id: &str,
        bytes: &[u8],
        caption: Option<&str>,
        at: DateTime<Utc>,
    ) -> Result<PhotoUpload> {
        let (session, folder) = self.folder_at(user_id, at).await?;
        let photo = self.folders.store_photo(&folder, bytes).await?;

        let caption = caption.map(str::trim).filter(|c| !c.is_empty());
        let mut qsl_marked = false;
        if let Some(caption) = caption {
            self.folders
                .append_caption(&folder, &photo.file_name, caption)
                .await?;
            if is_qsl_caption(caption) {
                self.folders.mark_qsl_photo(&folder, &photo.file_name).await?;
                qsl_marked = true;
            }
        }

        tracing::info!(
            user_id,
            callsign = %session.callsign,
            reference = %session.reference,
            slot = photo.slot,
            qsl_marked,
            "Photo uploaded"
        );

        Ok(PhotoUpload {
            slot: photo.slot,
            file_name: photo.file_name,
            folder,
            qsl_marked,
        })
    }

    /// Store the contact log (CSV) in today's activation folder.
    pub async fn upload_contact_log(&self, user_id: &str, bytes: &[u8]) -> Result<PathBuf> {
        self.upload_contact_log_at(user_id, bytes, Utc::now()).await
    }

    pub async fn upload_contact_log_at(
        &self,
        user_id: &str,
        bytes: &[u8],
        at: DateTime<Utc>,
    ) -> Result<PathBuf> {
        let (_, folder) = self.folder_at(user_id, at).await?;
        self.folders.store_contact_log(&folder, bytes).await
    }

    /// Generate eQSLs for today's activation folder.
    pub async fn generate_confirmations(&self, user_id: &str) -> Result<Vec<PathBuf>> {
        self.generate_confirmations_at(user_id, Utc::now()).await
    }

    /// Generate eQSLs for the activation folder of the UTC day of `at`.
    pub async fn generate_confirmations_at(
        &self,
        user_id: &str,
        at: DateTime<Utc>,
    ) -> Result<Vec<PathBuf>> {
        let (session, folder) = self.folder_at(user_id, at).await?;
        let output_dir = folder.join(&self.eqsl_output_dir);
        let compositor = self.compositor.clone();

        tracing::info!(
            user_id,
            callsign = %session.callsign,
            folder = %folder.display(),
            "Generating eQSLs"
        );

        // Decoding and rendering are CPU-bound; keep them off the runtime.
        tokio::task::spawn_blocking(move || {
            compositor.generate(&folder, &session.callsign, &output_dir)
        })
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("eQSL task failed: {}", e)))?
    }
}
