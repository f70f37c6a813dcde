//! Response DTOs for the engine HTTP API.
//!
//! `NarrativeResponse` is the JSON schema the LLM is asked to produce and
//! the shape the frontend receives, minus `debug_info` for non-debug
//! callers. Stripping is always done server-side; an omitted key cannot
//! leak through network inspection.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Internal-only reasoning and state-change data from the LLM.
///
/// Never appears in narrative text and never reaches a non-debug caller.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DebugInfo {
    #[serde(default)]
    pub dm_notes: Vec<String>,
    #[serde(default)]
    pub entities_mentioned: Vec<String>,
    #[serde(default)]
    pub state_rationale: String,
    /// Sparse game-state changes to merge after the turn.
    #[serde(default)]
    pub state_updates: Map<String, Value>,
}

impl DebugInfo {
    pub fn is_empty(&self) -> bool {
        self.dm_notes.is_empty()
            && self.entities_mentioned.is_empty()
            && self.state_rationale.is_empty()
            && self.state_updates.is_empty()
    }
}

/// The per-turn structured output of the narrative pipeline.
///
/// Every field defaults so a partially recovered response still
/// deserializes; unknown fields from the model are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NarrativeResponse {
    #[serde(default)]
    pub session_header: String,
    #[serde(default)]
    pub resources: String,
    #[serde(default)]
    pub location_confirmed: String,
    #[serde(default)]
    pub dice_rolls: Vec<String>,
    #[serde(default)]
    pub narrative: String,
    #[serde(default)]
    pub planning_block: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub god_mode_response: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debug_info: Option<DebugInfo>,
}

impl NarrativeResponse {
    /// Clone of this response with `debug_info` removed.
    ///
    /// The serialized form of the result never contains the
    /// `debug_info` key at all.
    pub fn stripped(&self) -> Self {
        Self {
            debug_info: None,
            ..self.clone()
        }
    }
}

/// Advisory issue found while validating a narrative response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationIssueDto {
    pub code: String,
    pub message: String,
}

/// HTTP payload for one completed turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnResponse {
    pub campaign_id: Uuid,
    pub turn_id: Uuid,
    #[serde(flatten)]
    pub narrative: NarrativeResponse,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub validation_issues: Vec<ValidationIssueDto>,
}

/// Result of the minimal campaign bootstrap endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CampaignCreated {
    pub campaign_id: Uuid,
}
