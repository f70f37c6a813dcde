//! Request DTOs for the engine HTTP API.

use serde::{Deserialize, Serialize};

/// Interaction mode as carried on the wire.
///
/// Parallel to the domain `Mode` enum; conversions live in the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ModeData {
    #[default]
    Story,
    Dm,
    God,
}

/// One player turn submitted to the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnRequest {
    /// The player's free-text action or utterance.
    pub input: String,
    /// Interaction mode for this turn.
    #[serde(default)]
    pub mode: ModeData,
    /// Whether the caller may receive `debug_info`. Stripping happens
    /// server-side regardless of what the client does with the payload.
    #[serde(default)]
    pub debug: bool,
}

/// Minimal campaign bootstrap request.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CreateCampaignRequest {
    #[serde(default)]
    pub name: Option<String>,
}
