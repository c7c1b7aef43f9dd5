//! Active session model.

use serde::{Deserialize, Serialize};

/// A user's active activation: the declared reference and the callsign
/// copied from the registry when the session was opened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Normalized SOTA reference (e.g., "EA3/GI-002")
    #[serde(rename = "ref")]
    pub reference: String,
    /// Callsign at the time the session was opened
    pub callsign: String,
}
