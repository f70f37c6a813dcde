//! Run turn use case.

use std::sync::Arc;

use worldarch_domain::{CampaignId, Mode, TurnId};
use worldarch_protocol::{
    DebugInfo, ModeData, NarrativeResponse, TurnRequest, TurnResponse, ValidationIssueDto,
};

use crate::entities::Campaign;
use crate::infrastructure::ports::{ClockPort, LlmPort, RepoError, TurnRecord};
use crate::llm_context::{self, HistoryTurn, TurnPromptRequest};
use crate::use_cases::narrative::{
    parse_narrative_response, validate_mode_rules, verify_mentions, ParseOutcome, ParseStage,
    PLACEHOLDER_NARRATIVE,
};

/// How many prior turns are replayed as conversation history.
const HISTORY_LIMIT: u32 = 20;

#[derive(Debug, thiserror::Error)]
pub enum TurnError {
    #[error("Player input must not be empty")]
    EmptyInput,
    #[error(transparent)]
    Repo(#[from] RepoError),
}

/// Run turn use case.
///
/// Orchestrates: state load, prompt assembly, generation, parsing,
/// validation, state merge, persistence.
pub struct RunTurn {
    campaign: Arc<Campaign>,
    llm: Arc<dyn LlmPort>,
    clock: Arc<dyn ClockPort>,
}

impl RunTurn {
    pub fn new(campaign: Arc<Campaign>, llm: Arc<dyn LlmPort>, clock: Arc<dyn ClockPort>) -> Self {
        Self {
            campaign,
            llm,
            clock,
        }
    }

    /// Run one turn for a campaign.
    ///
    /// LLM failures do not fail the turn: the player gets a placeholder
    /// narrative and no state changes, and the failure is logged. Repo
    /// failures do fail the turn.
    pub async fn execute(
        &self,
        campaign_id: CampaignId,
        request: TurnRequest,
    ) -> Result<TurnResponse, TurnError> {
        if request.input.trim().is_empty() {
            return Err(TurnError::EmptyInput);
        }
        let mode = mode_from_data(request.mode);
        let now = self.clock.now();

        // 1. Load everything the prompt needs.
        let mut state = self.campaign.state_or_new(campaign_id, now).await?;
        let entities = self.campaign.entities(campaign_id).await?;
        let manifest = self.campaign.manifest(campaign_id).await?;
        let history = self.campaign.history(campaign_id, HISTORY_LIMIT).await?;

        // 2. Assemble the prompt and generate.
        let prompt = llm_context::build_turn_prompt(&TurnPromptRequest {
            mode,
            player_input: request.input.clone(),
            state_fields: state.fields.clone(),
            entities: entities.clone(),
            manifest: manifest.clone(),
            history: history
                .into_iter()
                .map(|t| HistoryTurn {
                    player_input: t.player_input,
                    narrative: t.narrative,
                })
                .collect(),
        });

        // 3. Parse, or degrade to a placeholder if generation failed.
        let outcome = match self.llm.generate(prompt).await {
            Ok(generated) => parse_narrative_response(&generated.content),
            Err(err) => {
                tracing::error!(error = %err, %campaign_id, "LLM generation failed, using placeholder turn");
                placeholder_outcome()
            }
        };

        // 4. Advisory validation. Issues are reported, never fatal.
        let mut issues: Vec<ValidationIssueDto> = validate_mode_rules(mode, &outcome.response)
            .into_iter()
            .map(|issue| ValidationIssueDto {
                code: issue.code.to_string(),
                message: issue.message,
            })
            .collect();

        let mentions = verify_mentions(&outcome.response.narrative, &manifest, &entities);
        for id in &mentions.missing {
            issues.push(ValidationIssueDto {
                code: "entity_not_mentioned".to_string(),
                message: format!("required entity {id} does not appear in the narrative"),
            });
        }
        for id in &mentions.unknown {
            issues.push(ValidationIssueDto {
                code: "unknown_entity".to_string(),
                message: format!("scene manifest requires unregistered entity {id}"),
            });
        }
        if !issues.is_empty() {
            tracing::warn!(
                %campaign_id,
                count = issues.len(),
                codes = ?issues.iter().map(|i| i.code.as_str()).collect::<Vec<_>>(),
                "Turn produced validation issues"
            );
        }

        // 5. Merge state changes and persist.
        let report = state.apply_updates(outcome.state_updates(), now);
        for skipped in &report.skipped {
            tracing::warn!(%campaign_id, path = %skipped.path, reason = %skipped.reason, "Skipped state update");
        }
        if !report.is_noop() {
            tracing::debug!(
                %campaign_id,
                applied = report.applied.len(),
                removed = report.removed.len(),
                "Applied state updates"
            );
        }
        self.campaign.save_state(&state).await?;

        let turn_id = TurnId::new();
        self.campaign
            .record_turn(&TurnRecord {
                turn_id,
                campaign_id,
                player_input: request.input,
                narrative: outcome.response.narrative.clone(),
                created_at: now,
            })
            .await?;

        // 6. Strip server-side unless the caller asked for debug data.
        let narrative = if request.debug {
            outcome.response
        } else {
            outcome.response.stripped()
        };

        Ok(TurnResponse {
            campaign_id: campaign_id.to_uuid(),
            turn_id: turn_id.to_uuid(),
            narrative,
            validation_issues: issues,
        })
    }
}

fn mode_from_data(data: ModeData) -> Mode {
    match data {
        ModeData::Story => Mode::Story,
        ModeData::Dm => Mode::Dm,
        ModeData::God => Mode::God,
    }
}

fn placeholder_outcome() -> ParseOutcome {
    ParseOutcome {
        response: NarrativeResponse {
            narrative: PLACEHOLDER_NARRATIVE.to_string(),
            debug_info: Some(DebugInfo::default()),
            ..Default::default()
        },
        stage: ParseStage::PlainText,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use serde_json::json;
    use worldarch_domain::{Entity, EntityId, EntityKind, GameState, SceneManifest};

    use crate::infrastructure::clock::FixedClock;
    use crate::infrastructure::ports::{
        FinishReason, LlmError, LlmResponse, MockCampaignRepo, MockLlmPort,
    };

    fn fixed_clock() -> Arc<FixedClock> {
        Arc::new(FixedClock(
            Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap(),
        ))
    }

    fn llm_returning(content: &str) -> MockLlmPort {
        let content = content.to_string();
        let mut llm = MockLlmPort::new();
        llm.expect_generate().returning(move |_| {
            Ok(LlmResponse {
                content: content.clone(),
                finish_reason: FinishReason::Stop,
                usage: None,
            })
        });
        llm
    }

    fn empty_repo(campaign_id: CampaignId) -> MockCampaignRepo {
        let mut repo = MockCampaignRepo::new();
        repo.expect_get_state().returning(move |_| {
            Ok(Some(GameState::new(
                campaign_id,
                Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap(),
            )))
        });
        repo.expect_list_entities().returning(|_| Ok(Vec::new()));
        repo.expect_get_manifest()
            .returning(|_| Ok(SceneManifest::default()));
        repo.expect_recent_turns().returning(|_, _| Ok(Vec::new()));
        repo.expect_save_state().returning(|_| Ok(()));
        repo.expect_append_turn().returning(|_| Ok(()));
        repo
    }

    fn run_turn(repo: MockCampaignRepo, llm: MockLlmPort) -> RunTurn {
        RunTurn::new(
            Arc::new(Campaign::new(Arc::new(repo))),
            Arc::new(llm),
            fixed_clock(),
        )
    }

    fn story_request(input: &str) -> TurnRequest {
        TurnRequest {
            input: input.to_string(),
            mode: ModeData::Story,
            debug: false,
        }
    }

    #[tokio::test]
    async fn test_empty_input_rejected() {
        let campaign_id = CampaignId::new();
        let use_case = run_turn(empty_repo(campaign_id), MockLlmPort::new());

        let result = use_case.execute(campaign_id, story_request("   ")).await;
        assert!(matches!(result, Err(TurnError::EmptyInput)));
    }

    #[tokio::test]
    async fn test_turn_strips_debug_info_by_default() {
        let campaign_id = CampaignId::new();
        let llm = llm_returning(
            r#"{"narrative": "You enter.", "planning_block": "1. Look",
                "debug_info": {"dm_notes": ["secret"], "state_updates": {}}}"#,
        );
        let use_case = run_turn(empty_repo(campaign_id), llm);

        let response = use_case
            .execute(campaign_id, story_request("go in"))
            .await
            .expect("turn succeeds");

        assert_eq!(response.narrative.narrative, "You enter.");
        assert!(response.narrative.debug_info.is_none());
        assert!(response.validation_issues.is_empty());
    }

    #[tokio::test]
    async fn test_debug_caller_keeps_debug_info() {
        let campaign_id = CampaignId::new();
        let llm = llm_returning(
            r#"{"narrative": "You enter.", "planning_block": "1. Look",
                "debug_info": {"dm_notes": ["secret"]}}"#,
        );
        let use_case = run_turn(empty_repo(campaign_id), llm);

        let response = use_case
            .execute(
                campaign_id,
                TurnRequest {
                    input: "go in".to_string(),
                    mode: ModeData::Story,
                    debug: true,
                },
            )
            .await
            .expect("turn succeeds");

        let debug = response.narrative.debug_info.expect("kept for debug caller");
        assert_eq!(debug.dm_notes, vec!["secret".to_string()]);
    }

    #[tokio::test]
    async fn test_state_updates_merged_and_saved() {
        let campaign_id = CampaignId::new();
        let mut repo = MockCampaignRepo::new();
        repo.expect_get_state().returning(move |_| {
            let mut state = GameState::new(
                campaign_id,
                Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap(),
            );
            state
                .fields
                .insert("player".to_string(), json!({"hp": 20, "gold": 5}));
            Ok(Some(state))
        });
        repo.expect_list_entities().returning(|_| Ok(Vec::new()));
        repo.expect_get_manifest()
            .returning(|_| Ok(SceneManifest::default()));
        repo.expect_recent_turns().returning(|_, _| Ok(Vec::new()));
        repo.expect_save_state()
            .withf(|state| {
                state.fields["player"] == json!({"hp": 14, "gold": 5})
                    && !state.fields.contains_key("weather")
            })
            .times(1)
            .returning(|_| Ok(()));
        repo.expect_append_turn().returning(|_| Ok(()));

        let llm = llm_returning(
            r#"{"narrative": "The trap springs.", "planning_block": "1. Retreat",
                "debug_info": {"state_updates": {"player": {"hp": 14}, "weather": "__DELETE__"}}}"#,
        );
        let use_case = run_turn(repo, llm);

        use_case
            .execute(campaign_id, story_request("step forward"))
            .await
            .expect("turn succeeds");
    }

    #[tokio::test]
    async fn test_llm_failure_degrades_to_placeholder() {
        let campaign_id = CampaignId::new();
        let mut llm = MockLlmPort::new();
        llm.expect_generate()
            .returning(|_| Err(LlmError::RequestFailed("connection refused".to_string())));
        let use_case = run_turn(empty_repo(campaign_id), llm);

        let response = use_case
            .execute(campaign_id, story_request("go in"))
            .await
            .expect("turn still succeeds");

        assert_eq!(response.narrative.narrative, PLACEHOLDER_NARRATIVE);
    }

    #[tokio::test]
    async fn test_missing_mention_reported() {
        let campaign_id = CampaignId::new();
        let hale = Entity::new(
            EntityId::new(EntityKind::Npc, "hale", 1).expect("valid id"),
            "Hale",
        );
        let hale_id = hale.id.clone();
        let manifest = SceneManifest::new(vec![hale.id.clone()]);

        let mut repo = MockCampaignRepo::new();
        repo.expect_get_state().returning(move |_| {
            Ok(Some(GameState::new(
                campaign_id,
                Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap(),
            )))
        });
        repo.expect_list_entities()
            .returning(move |_| Ok(vec![hale.clone()]));
        repo.expect_get_manifest()
            .returning(move |_| Ok(manifest.clone()));
        repo.expect_recent_turns().returning(|_, _| Ok(Vec::new()));
        repo.expect_save_state().returning(|_| Ok(()));
        repo.expect_append_turn().returning(|_| Ok(()));

        let llm = llm_returning(r#"{"narrative": "Nobody is here.", "planning_block": "1. Wait"}"#);
        let use_case = run_turn(repo, llm);

        let response = use_case
            .execute(campaign_id, story_request("look"))
            .await
            .expect("turn succeeds");

        assert!(response
            .validation_issues
            .iter()
            .any(|i| i.code == "entity_not_mentioned" && i.message.contains(&hale_id.to_string())));
    }

    #[tokio::test]
    async fn test_god_mode_rules_applied() {
        let campaign_id = CampaignId::new();
        let llm = llm_returning(r#"{"narrative": "Done.", "planning_block": "1. Continue"}"#);
        let use_case = run_turn(empty_repo(campaign_id), llm);

        let response = use_case
            .execute(
                campaign_id,
                TurnRequest {
                    input: "set the time to midnight".to_string(),
                    mode: ModeData::God,
                    debug: false,
                },
            )
            .await
            .expect("turn succeeds");

        let codes: Vec<&str> = response
            .validation_issues
            .iter()
            .map(|i| i.code.as_str())
            .collect();
        assert!(codes.contains(&"unexpected_planning_block"));
        assert!(codes.contains(&"missing_god_mode_response"));
    }
}
