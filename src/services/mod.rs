// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod activation;
pub mod callsign;
pub mod eqsl;
pub mod folders;
pub mod session;
pub mod sota;

pub use activation::{ActivationService, PhotoUpload};
pub use callsign::CallsignRegistry;
pub use eqsl::QslCompositor;
pub use folders::{ActivationDirectory, StoredPhoto};
pub use session::{OpenedSession, SessionRegistry};
pub use sota::{SotaClient, SummitCache};
