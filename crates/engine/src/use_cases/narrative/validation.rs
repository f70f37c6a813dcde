//! Mode-dependent response validation.
//!
//! Planning blocks are required in story mode, forbidden in god mode,
//! and optional for DM narration. Issues are advisory: they get logged
//! and reported to debug callers, but never fail the turn.

use worldarch_domain::Mode;
use worldarch_protocol::NarrativeResponse;

/// One advisory rule violation found in a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    pub code: &'static str,
    pub message: String,
}

impl ValidationIssue {
    fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// Validate mode-keyed structural rules on a parsed response.
pub fn validate_mode_rules(mode: Mode, response: &NarrativeResponse) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();

    if mode.requires_planning_block() && response.planning_block.trim().is_empty() {
        issues.push(ValidationIssue::new(
            "missing_planning_block",
            format!("{mode} mode requires a planning block after each turn"),
        ));
    }

    if mode.forbids_planning_block() && !response.planning_block.trim().is_empty() {
        issues.push(ValidationIssue::new(
            "unexpected_planning_block",
            format!("{mode} mode must not include a planning block"),
        ));
    }

    if mode == Mode::God
        && response
            .god_mode_response
            .as_deref()
            .unwrap_or_default()
            .trim()
            .is_empty()
    {
        issues.push(ValidationIssue::new(
            "missing_god_mode_response",
            "god mode turns should answer through god_mode_response",
        ));
    }

    issues
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_story_mode_requires_planning_block() {
        let response = NarrativeResponse {
            narrative: "You walk on.".to_string(),
            ..Default::default()
        };

        let issues = validate_mode_rules(Mode::Story, &response);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].code, "missing_planning_block");
    }

    #[test]
    fn test_story_mode_with_planning_block_is_clean() {
        let response = NarrativeResponse {
            narrative: "You walk on.".to_string(),
            planning_block: "1. Rest\n2. Continue".to_string(),
            ..Default::default()
        };

        assert!(validate_mode_rules(Mode::Story, &response).is_empty());
    }

    #[test]
    fn test_god_mode_forbids_planning_block() {
        let response = NarrativeResponse {
            planning_block: "1. Rest".to_string(),
            god_mode_response: Some("Done.".to_string()),
            ..Default::default()
        };

        let issues = validate_mode_rules(Mode::God, &response);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].code, "unexpected_planning_block");
    }

    #[test]
    fn test_god_mode_expects_god_mode_response() {
        let issues = validate_mode_rules(Mode::God, &NarrativeResponse::default());
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].code, "missing_god_mode_response");
    }

    #[test]
    fn test_dm_mode_has_no_planning_rules() {
        assert!(validate_mode_rules(Mode::Dm, &NarrativeResponse::default()).is_empty());
    }
}
