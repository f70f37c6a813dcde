//! Trackable game entities and the per-turn scene manifest.

use serde::{Deserialize, Serialize};

use crate::value_objects::EntityId;

/// Whether an entity is currently perceivable by the player.
///
/// Anything other than `Visible` exempts the entity from narrative
/// mention requirements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Presence {
    #[default]
    Visible,
    Hidden,
    Invisible,
    Unconscious,
}

impl Presence {
    /// Visible entities must be mentioned when listed in the scene manifest.
    pub fn requires_mention(&self) -> bool {
        matches!(self, Self::Visible)
    }
}

/// A uniquely identified game object: PC, NPC, location, or item.
///
/// The stable `id` replaces brittle substring matching on names; the
/// `display_name` and `aliases` are what the narrative text is checked
/// against when verifying mentions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    pub display_name: String,
    #[serde(default)]
    pub aliases: Vec<String>,
    #[serde(default)]
    pub presence: Presence,
}

impl Entity {
    pub fn new(id: EntityId, display_name: impl Into<String>) -> Self {
        Self {
            id,
            display_name: display_name.into(),
            aliases: Vec::new(),
            presence: Presence::default(),
        }
    }

    pub fn with_aliases(mut self, aliases: Vec<String>) -> Self {
        self.aliases = aliases;
        self
    }

    pub fn with_presence(mut self, presence: Presence) -> Self {
        self.presence = presence;
        self
    }

    /// Case-insensitive substring check of the display name or any alias
    /// against a piece of narrative text.
    pub fn is_mentioned_in(&self, text: &str) -> bool {
        let haystack = text.to_lowercase();
        let mut names = std::iter::once(self.display_name.as_str()).chain(self.aliases.iter().map(String::as_str));
        names.any(|name| !name.is_empty() && haystack.contains(&name.to_lowercase()))
    }
}

/// Per-turn list of entity IDs expected to appear in the narrative.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SceneManifest {
    pub required: Vec<EntityId>,
}

impl SceneManifest {
    pub fn new(required: Vec<EntityId>) -> Self {
        Self { required }
    }

    pub fn is_empty(&self) -> bool {
        self.required.is_empty()
    }
}
