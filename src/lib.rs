// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! SOTApics: photos and eQSLs for SOTA activations
//!
//! This crate provides the core behind the SOTApics bot: callsign and
//! session registries, a cached view of the SOTA summit directory, on-disk
//! activation folders and eQSL rendering.

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod services;
pub mod time_utils;

use config::Config;
use db::{files, JsonStore};
use error::Result;
use services::{
    ActivationDirectory, ActivationService, CallsignRegistry, QslCompositor, SessionRegistry,
    SotaClient, SummitCache,
};

/// Shared application state. Every member is a cheap-to-clone handle.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub callsigns: CallsignRegistry,
    pub sessions: SessionRegistry,
    pub summits: SummitCache,
    pub folders: ActivationDirectory,
    pub activations: ActivationService,
}

impl AppState {
    /// Load persisted state and wire up all services.
    pub async fn open(config: Config) -> Result<Self> {
        let client = SotaClient::new(config.sota_api_url.clone(), config.sota_timeout)?;
        let summits = SummitCache::open(
            client,
            JsonStore::new(config.state_dir.join(files::SOTA_CACHE)),
            config.sota_cache_ttl,
        )
        .await;

        let callsigns =
            CallsignRegistry::open(JsonStore::new(config.state_dir.join(files::CALLSIGNS))).await;
        let sessions = SessionRegistry::open(
            JsonStore::new(config.state_dir.join(files::SESSIONS)),
            callsigns.clone(),
            summits.clone(),
            config.ref_policy,
        )
        .await;

        let folders = ActivationDirectory::new(config.data_dir.clone());
        let compositor = QslCompositor::new(config.eqsl_font_path.as_deref());
        let activations = ActivationService::new(
            callsigns.clone(),
            sessions.clone(),
            folders.clone(),
            compositor,
            config.eqsl_output_dir.clone(),
        );

        Ok(Self {
            config,
            callsigns,
            sessions,
            summits,
            folders,
            activations,
        })
    }
}
