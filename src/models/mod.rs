// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod contact;
pub mod session;
pub mod summit;

pub use contact::ContactRow;
pub use session::Session;
pub use summit::{RegionCacheEntry, Summit, SummitInfo, SummitRef};
