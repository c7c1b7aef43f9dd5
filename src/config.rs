// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Whether a session may be opened for a reference the summit directory
/// could not resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RefPolicy {
    /// The reference must resolve to a known summit.
    #[default]
    Validated,
    /// Any syntactically valid reference is accepted.
    Permissive,
}

impl std::str::FromStr for RefPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "validated" => Ok(RefPolicy::Validated),
            "permissive" => Ok(RefPolicy::Permissive),
            _ => Err(ConfigError::Invalid("SOTAPICS_REF_POLICY", s.to_string())),
        }
    }
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Root directory for activation folders
    pub data_dir: PathBuf,
    /// Directory holding the persisted registries and summit cache
    pub state_dir: PathBuf,
    /// Base URL of the SOTA API (no trailing slash)
    pub sota_api_url: String,
    /// How long a fetched region stays fresh
    pub sota_cache_ttl: Duration,
    /// Timeout for a single region fetch
    pub sota_timeout: Duration,
    pub ref_policy: RefPolicy,
    /// Extra font file for eQSL text (system fonts are always loaded)
    pub eqsl_font_path: Option<PathBuf>,
    /// Output directory for eQSLs, relative to the activation folder
    pub eqsl_output_dir: String,
}

impl Default for Config {
    /// Default config for testing only.
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            state_dir: PathBuf::from("."),
            sota_api_url: "http://127.0.0.1:9/api".to_string(),
            sota_cache_ttl: Duration::from_secs(3600),
            sota_timeout: Duration::from_secs(2),
            ref_policy: RefPolicy::Validated,
            eqsl_font_path: None,
            eqsl_output_dir: "eqsl".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables (and `.env` if present).
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        Ok(Self {
            data_dir: env::var("SOTAPICS_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("data")),
            state_dir: env::var("SOTAPICS_STATE_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(".")),
            sota_api_url: env::var("SOTA_API_URL")
                .map(|v| v.trim().trim_end_matches('/').to_string())
                .unwrap_or_else(|_| "https://api2.sota.org.uk/api".to_string()),
            sota_cache_ttl: Duration::from_secs(secs_var("SOTA_CACHE_TTL_SECS", 3600)?),
            sota_timeout: Duration::from_secs(secs_var("SOTA_TIMEOUT_SECS", 10)?),
            ref_policy: match env::var("SOTAPICS_REF_POLICY") {
                Ok(v) => v.parse()?,
                Err(_) => RefPolicy::Validated,
            },
            eqsl_font_path: env::var("EQSL_FONT_PATH").ok().map(PathBuf::from),
            eqsl_output_dir: env::var("EQSL_OUTPUT_DIR").unwrap_or_else(|_| "eqsl".to_string()),
        })
    }
}

fn secs_var(name: &'static str, default: u64) -> Result<u64, ConfigError> {
    match env::var(name) {
        Ok(v) => v
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid(name, v)),
        Err(_) => Ok(default),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}: {1:?}")]
    Invalid(&'static str, String),
}
