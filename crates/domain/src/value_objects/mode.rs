//! Interaction modes.
//!
//! The mode is carried explicitly alongside each turn instead of being
//! inferred from free-text scanning of the previous response. Validation
//! rules (planning blocks, god-mode responses) key off this variant.

use std::fmt;

use serde::{Deserialize, Serialize};

/// How the player is currently interacting with the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// Normal in-story play. A planning block is required after each turn.
    #[default]
    Story,
    /// DM-style narration without player-facing planning blocks.
    Dm,
    /// Out-of-character administrative interaction; story rules suspended.
    God,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Story => "story",
            Self::Dm => "dm",
            Self::God => "god",
        }
    }

    /// Whether a planning block must be present in responses for this mode.
    pub fn requires_planning_block(&self) -> bool {
        matches!(self, Self::Story)
    }

    /// Whether a planning block is forbidden in responses for this mode.
    pub fn forbids_planning_block(&self) -> bool {
        matches!(self, Self::God)
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
