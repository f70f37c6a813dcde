//! In-memory campaign storage.
//!
//! Used for tests and ephemeral runs where no database file is wanted.

use async_trait::async_trait;
use dashmap::DashMap;

use worldarch_domain::{CampaignId, Entity, GameState, SceneManifest};

use crate::infrastructure::ports::{CampaignRepo, RepoError, TurnRecord};

/// DashMap-backed implementation of [`CampaignRepo`].
#[derive(Default)]
pub struct InMemoryCampaignRepo {
    states: DashMap<CampaignId, GameState>,
    entities: DashMap<CampaignId, Vec<Entity>>,
    manifests: DashMap<CampaignId, SceneManifest>,
    turns: DashMap<CampaignId, Vec<TurnRecord>>,
}

impl InMemoryCampaignRepo {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CampaignRepo for InMemoryCampaignRepo {
    async fn get_state(&self, id: CampaignId) -> Result<Option<GameState>, RepoError> {
        Ok(self.states.get(&id).map(|s| s.clone()))
    }

    async fn save_state(&self, state: &GameState) -> Result<(), RepoError> {
        self.states.insert(state.campaign_id, state.clone());
        Ok(())
    }

    async fn list_entities(&self, id: CampaignId) -> Result<Vec<Entity>, RepoError> {
        Ok(self.entities.get(&id).map(|e| e.clone()).unwrap_or_default())
    }

    async fn save_entities(&self, id: CampaignId, entities: &[Entity]) -> Result<(), RepoError> {
        self.entities.insert(id, entities.to_vec());
        Ok(())
    }

    async fn get_manifest(&self, id: CampaignId) -> Result<SceneManifest, RepoError> {
        Ok(self.manifests.get(&id).map(|m| m.clone()).unwrap_or_default())
    }

    async fn save_manifest(
        &self,
        id: CampaignId,
        manifest: &SceneManifest,
    ) -> Result<(), RepoError> {
        self.manifests.insert(id, manifest.clone());
        Ok(())
    }

    async fn append_turn(&self, record: &TurnRecord) -> Result<(), RepoError> {
        self.turns
            .entry(record.campaign_id)
            .or_default()
            .push(record.clone());
        Ok(())
    }

    async fn recent_turns(
        &self,
        id: CampaignId,
        limit: u32,
    ) -> Result<Vec<TurnRecord>, RepoError> {
        let turns = self.turns.get(&id).map(|t| t.clone()).unwrap_or_default();
        let skip = turns.len().saturating_sub(limit as usize);
        Ok(turns.into_iter().skip(skip).collect())
    }
}
