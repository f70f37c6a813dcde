//! Campaign operations.
//!
//! Thin orchestration over the `CampaignRepo` port. Use cases talk to
//! this type rather than the repo directly so bootstrap rules (like
//! creating state on first access) live in one place.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use worldarch_domain::{CampaignId, Entity, GameState, SceneManifest};

use crate::infrastructure::ports::{CampaignRepo, RepoError, TurnRecord};

pub struct Campaign {
    repo: Arc<dyn CampaignRepo>,
}

impl Campaign {
    pub fn new(repo: Arc<dyn CampaignRepo>) -> Self {
        Self { repo }
    }

    pub async fn state(&self, id: CampaignId) -> Result<Option<GameState>, RepoError> {
        self.repo.get_state(id).await
    }

    /// Load campaign state, creating an empty document on first access.
    pub async fn state_or_new(
        &self,
        id: CampaignId,
        now: DateTime<Utc>,
    ) -> Result<GameState, RepoError> {
        match self.repo.get_state(id).await? {
            Some(state) => Ok(state),
            None => {
                let state = GameState::new(id, now);
                self.repo.save_state(&state).await?;
                Ok(state)
            }
        }
    }

    pub async fn save_state(&self, state: &GameState) -> Result<(), RepoError> {
        self.repo.save_state(state).await
    }

    pub async fn entities(&self, id: CampaignId) -> Result<Vec<Entity>, RepoError> {
        self.repo.list_entities(id).await
    }

    pub async fn save_entities(
        &self,
        id: CampaignId,
        entities: &[Entity],
    ) -> Result<(), RepoError> {
        self.repo.save_entities(id, entities).await
    }

    pub async fn manifest(&self, id: CampaignId) -> Result<SceneManifest, RepoError> {
        self.repo.get_manifest(id).await
    }

    pub async fn save_manifest(
        &self,
        id: CampaignId,
        manifest: &SceneManifest,
    ) -> Result<(), RepoError> {
        self.repo.save_manifest(id, manifest).await
    }

    pub async fn record_turn(&self, record: &TurnRecord) -> Result<(), RepoError> {
        self.repo.append_turn(record).await
    }

    /// Recent turn history, oldest first.
    pub async fn history(&self, id: CampaignId, limit: u32) -> Result<Vec<TurnRecord>, RepoError> {
        self.repo.recent_turns(id, limit).await
    }
}
