//! Configurable LLM prompt templates used by the engine.

/// All prompt template keys as constants.
pub mod keys {
    /// Base system prompt establishing the game master persona.
    pub const TURN_SYSTEM_PROMPT: &str = "turn.system_prompt";
    /// The response format instructions shown to the LLM every turn.
    pub const TURN_RESPONSE_FORMAT: &str = "turn.response_format";
    /// Rules for maintaining world state through state_updates.
    pub const TURN_STATE_RULES: &str = "turn.state_rules";
    /// Extra instructions applied in DM narration mode.
    pub const MODE_DM_INSTRUCTIONS: &str = "mode.dm_instructions";
    /// Extra instructions applied in god mode.
    pub const MODE_GOD_INSTRUCTIONS: &str = "mode.god_instructions";
}

/// Hard-coded default template values.
pub mod defaults {
    pub const TURN_SYSTEM_PROMPT: &str = r#"You are the game master of a tabletop-style roleplaying campaign.
You narrate the world, voice every non-player character, and adjudicate
the consequences of the player's actions. Stay in the established tone
and never speak as the player character."#;

    pub const TURN_RESPONSE_FORMAT: &str = r#"Respond with a single JSON object and nothing else. No prose before
or after it, no markdown code fences, no "Scene #N:" prefix.

The object uses exactly these fields:
{
  "narrative": "The story text shown to the player (required)",
  "planning_block": "A numbered list of 3-5 options for what the player could do next",
  "session_header": "Short scene title, e.g. 'The Sunken Archive'",
  "dice_rolls": ["d20+3: 17 (Perception)"],
  "resources": "Current HP, spell slots, and consumables if they changed",
  "god_mode_response": "Only in god mode: the direct out-of-character answer",
  "debug_info": {
    "dm_notes": "Private reasoning about where the scene is heading",
    "entities_mentioned": ["npc_cassian_001"],
    "state_rationale": "Why the state changed this turn",
    "state_updates": {}
  }
}

Omit optional fields you have nothing for. Never leave "narrative" empty."#;

    pub const TURN_STATE_RULES: &str = r#"Track persistent world state through debug_info.state_updates. Send
only the fields that changed this turn; unchanged state must not be
repeated. Nest objects to update one key inside a larger structure.
To remove a key entirely, set its value to the string "__DELETE__".

Example: the player sells a rope and takes 3 damage:
"state_updates": {
  "player": {"hp": 14},
  "inventory": {"rope": "__DELETE__"}
}"#;

    pub const MODE_DM_INSTRUCTIONS: &str = r#"The player is speaking as a co-narrator, not as their character. Treat
their input as scene direction to incorporate, narrate the result, and
skip the planning block unless the scene calls for a decision."#;

    pub const MODE_GOD_INSTRUCTIONS: &str = r#"The player is asking an out-of-character question or issuing a direct
command about the game itself. Answer plainly in "god_mode_response",
apply any requested changes through state_updates, and do not include
a planning block or advance the story."#;
}

/// Convert a template key to its environment variable name.
pub fn key_to_env_var(key: &str) -> String {
    format!("WORLDARCH_PROMPT_{}", key.to_uppercase().replace('.', "_"))
}

/// Get the default value for a template key.
pub fn get_default(key: &str) -> Option<&'static str> {
    match key {
        keys::TURN_SYSTEM_PROMPT => Some(defaults::TURN_SYSTEM_PROMPT),
        keys::TURN_RESPONSE_FORMAT => Some(defaults::TURN_RESPONSE_FORMAT),
        keys::TURN_STATE_RULES => Some(defaults::TURN_STATE_RULES),
        keys::MODE_DM_INSTRUCTIONS => Some(defaults::MODE_DM_INSTRUCTIONS),
        keys::MODE_GOD_INSTRUCTIONS => Some(defaults::MODE_GOD_INSTRUCTIONS),
        _ => None,
    }
}

/// Resolve a template: environment override first, then the default.
pub fn resolve(key: &str) -> String {
    if let Ok(value) = std::env::var(key_to_env_var(key)) {
        if !value.trim().is_empty() {
            return value;
        }
    }
    get_default(key).unwrap_or_default().to_string()
}

/// Get all known template keys.
pub fn all_keys() -> Vec<&'static str> {
    vec![
        keys::TURN_SYSTEM_PROMPT,
        keys::TURN_RESPONSE_FORMAT,
        keys::TURN_STATE_RULES,
        keys::MODE_DM_INSTRUCTIONS,
        keys::MODE_GOD_INSTRUCTIONS,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_to_env_var() {
        assert_eq!(
            key_to_env_var(keys::TURN_SYSTEM_PROMPT),
            "WORLDARCH_PROMPT_TURN_SYSTEM_PROMPT"
        );
    }

    #[test]
    fn test_every_key_has_a_default() {
        for key in all_keys() {
            assert!(get_default(key).is_some(), "no default for {key}");
        }
    }

    #[test]
    fn test_unknown_key_has_no_default() {
        assert!(get_default("turn.does_not_exist").is_none());
    }
}
