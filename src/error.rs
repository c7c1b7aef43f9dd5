// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types shared by every core operation.

/// Application error type returned by the registries, the summit cache,
/// activation folders and the eQSL compositor.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Invalid reference {0:?} (expected e.g. EA3/GI-002)")]
    InvalidReference(String),

    #[error("Invalid callsign {0:?}")]
    InvalidCallsign(String),

    #[error("Callsign required: register a callsign first")]
    CallsignRequired,

    #[error("No active session: set a reference first")]
    SessionRequired,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Summit directory unavailable: {0}")]
    SummitsUnavailable(String),

    #[error("Missing input: {0}")]
    MissingInput(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Image error: {0}")]
    Image(String),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// True for errors the user can fix by changing input or doing the
    /// missing step first.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            AppError::InvalidReference(_)
                | AppError::InvalidCallsign(_)
                | AppError::CallsignRequired
                | AppError::SessionRequired
                | AppError::NotFound(_)
                | AppError::MissingInput(_)
        )
    }

    /// True when repeating the same request later may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AppError::SummitsUnavailable(_))
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Storage(err.to_string())
    }
}

impl From<image::ImageError> for AppError {
    fn from(err: image::ImageError) -> Self {
        AppError::Image(err.to_string())
    }
}

/// Result type alias for core operations
pub type Result<T> = std::result::Result<T, AppError>;
