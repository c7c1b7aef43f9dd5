//! Persistence layer (JSON state files).

pub mod json_store;

pub use json_store::{JsonStore, StoreError};

/// State file names, relative to the configured state directory.
pub mod files {
    pub const CALLSIGNS: &str = "callsigns.json";
    pub const SESSIONS: &str = "sessions.json";
    /// Region metadata cache (keyed by "ASSOC/REGION")
    pub const SOTA_CACHE: &str = "sota_cache.json";
}
