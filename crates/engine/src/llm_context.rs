//! LLM context types and prompt assembly for turn generation.
//!
//! These DTOs carry everything one turn needs into the prompt builder.
//! They are owned by the engine (not the domain) so the domain stays
//! free of prompt formatting concerns.

use serde_json::{Map, Value};

use worldarch_domain::{Entity, Mode, Presence, SceneManifest};

use crate::infrastructure::ports::{ChatMessage, LlmRequest};
use crate::prompt_templates::{self, keys};

/// One prior exchange shown to the LLM as conversation history.
#[derive(Debug, Clone)]
pub struct HistoryTurn {
    pub player_input: String,
    pub narrative: String,
}

/// Everything needed to build the prompt for one turn.
#[derive(Debug, Clone)]
pub struct TurnPromptRequest {
    pub mode: Mode,
    pub player_input: String,
    /// Persistent campaign state, sent in full so the LLM sees the
    /// current world rather than a diff.
    pub state_fields: Map<String, Value>,
    pub entities: Vec<Entity>,
    pub manifest: SceneManifest,
    /// Oldest first.
    pub history: Vec<HistoryTurn>,
}

/// Build the system prompt for a turn.
pub fn build_system_prompt(request: &TurnPromptRequest) -> String {
    let mut prompt = String::new();

    prompt.push_str(&prompt_templates::resolve(keys::TURN_SYSTEM_PROMPT));
    prompt.push_str("\n\n");

    match request.mode {
        Mode::Story => {}
        Mode::Dm => {
            prompt.push_str(&prompt_templates::resolve(keys::MODE_DM_INSTRUCTIONS));
            prompt.push_str("\n\n");
        }
        Mode::God => {
            prompt.push_str(&prompt_templates::resolve(keys::MODE_GOD_INSTRUCTIONS));
            prompt.push_str("\n\n");
        }
    }

    if !request.state_fields.is_empty() {
        prompt.push_str("=== CURRENT WORLD STATE ===\n");
        let state = Value::Object(request.state_fields.clone());
        prompt.push_str(&serde_json::to_string_pretty(&state).unwrap_or_default());
        prompt.push_str("\n\n");
    }

    let visible: Vec<&Entity> = request
        .entities
        .iter()
        .filter(|e| e.presence.requires_mention())
        .collect();
    if !visible.is_empty() {
        prompt.push_str("=== ENTITIES IN PLAY ===\n");
        for entity in &visible {
            prompt.push_str(&format!("- {} ({})", entity.display_name, entity.id));
            if !entity.aliases.is_empty() {
                prompt.push_str(&format!(", also called {}", entity.aliases.join(", ")));
            }
            prompt.push('\n');
        }
        prompt.push('\n');
    }

    let offstage: Vec<&Entity> = request
        .entities
        .iter()
        .filter(|e| !e.presence.requires_mention())
        .collect();
    if !offstage.is_empty() {
        prompt.push_str("=== OFFSTAGE (do not reveal unless the story uncovers them) ===\n");
        for entity in &offstage {
            prompt.push_str(&format!(
                "- {} ({}): {}\n",
                entity.display_name,
                entity.id,
                presence_label(entity.presence)
            ));
        }
        prompt.push('\n');
    }

    if !request.manifest.required.is_empty() {
        let ids: Vec<String> = request
            .manifest
            .required
            .iter()
            .map(|id| id.to_string())
            .collect();
        prompt.push_str(&format!(
            "REQUIRED THIS SCENE: every visible entity in [{}] must appear in the narrative.\n\n",
            ids.join(", ")
        ));
    }

    prompt.push_str(&prompt_templates::resolve(keys::TURN_STATE_RULES));
    prompt.push_str("\n\n");
    prompt.push_str(&prompt_templates::resolve(keys::TURN_RESPONSE_FORMAT));

    prompt
}

fn presence_label(presence: Presence) -> &'static str {
    match presence {
        Presence::Visible => "visible",
        Presence::Hidden => "hidden from the player",
        Presence::Invisible => "invisible",
        Presence::Unconscious => "unconscious",
    }
}

/// Build the message list, history first, current input last.
pub fn build_messages(request: &TurnPromptRequest) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(request.history.len() * 2 + 1);

    for turn in &request.history {
        messages.push(ChatMessage::user(turn.player_input.clone()));
        messages.push(ChatMessage::assistant(turn.narrative.clone()));
    }

    messages.push(ChatMessage::user(request.player_input.clone()));

    messages
}

/// Assemble the full outbound request for one turn.
pub fn build_turn_prompt(request: &TurnPromptRequest) -> LlmRequest {
    LlmRequest::new(build_messages(request)).with_system_prompt(build_system_prompt(request))
}

#[cfg(test)]
mod tests {
    use super::*;
    use worldarch_domain::{EntityId, EntityKind};

    use crate::infrastructure::ports::MessageRole;

    fn base_request() -> TurnPromptRequest {
        TurnPromptRequest {
            mode: Mode::Story,
            player_input: "I open the door.".to_string(),
            state_fields: Map::new(),
            entities: Vec::new(),
            manifest: SceneManifest::default(),
            history: Vec::new(),
        }
    }

    #[test]
    fn test_system_prompt_carries_response_format() {
        let prompt = build_system_prompt(&base_request());
        assert!(prompt.contains("\"narrative\""));
        assert!(prompt.contains("__DELETE__"));
    }

    #[test]
    fn test_hidden_entities_listed_offstage() {
        let mut request = base_request();
        let vex = Entity::new(
            EntityId::new(EntityKind::Npc, "vex", 1).expect("valid id"),
            "Vex",
        )
        .with_presence(Presence::Hidden);
        request.entities.push(vex);

        let prompt = build_system_prompt(&request);
        assert!(prompt.contains("OFFSTAGE"));
        assert!(prompt.contains("hidden from the player"));
        assert!(!prompt.contains("ENTITIES IN PLAY"));
    }

    #[test]
    fn test_god_mode_swaps_instructions() {
        let mut request = base_request();
        request.mode = Mode::God;

        let prompt = build_system_prompt(&request);
        assert!(prompt.contains("god_mode_response"));
    }

    #[test]
    fn test_messages_interleave_history() {
        let mut request = base_request();
        request.history.push(HistoryTurn {
            player_input: "I look around.".to_string(),
            narrative: "The hall is empty.".to_string(),
        });

        let messages = build_messages(&request);
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0].role, MessageRole::User);
        assert_eq!(messages[1].role, MessageRole::Assistant);
        assert_eq!(messages[2].content, "I open the door.");
    }
}
