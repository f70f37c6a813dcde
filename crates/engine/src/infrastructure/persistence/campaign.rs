//! SQLite-backed campaign storage.
//!
//! Game state is stored as one JSON document per campaign; entities,
//! the scene manifest, and turn history get their own tables.

use async_trait::async_trait;
use sqlx::{Row, SqlitePool};
use std::sync::Arc;

use worldarch_domain::{CampaignId, Entity, GameState, SceneManifest, TurnId};

use crate::infrastructure::ports::{CampaignRepo, ClockPort, RepoError, TurnRecord};

/// SQLite implementation for campaign storage.
pub struct SqliteCampaignRepo {
    pool: SqlitePool,
    clock: Arc<dyn ClockPort>,
}

impl SqliteCampaignRepo {
    pub async fn new(db_path: &str, clock: Arc<dyn ClockPort>) -> Result<Self, RepoError> {
        let pool = SqlitePool::connect(&format!("sqlite:{}?mode=rwc", db_path))
            .await
            .map_err(|e| RepoError::database("campaign", e))?;
        Self::with_pool(pool, clock).await
    }

    pub async fn with_pool(pool: SqlitePool, clock: Arc<dyn ClockPort>) -> Result<Self, RepoError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS campaign_state (
                campaign_id TEXT PRIMARY KEY,
                state_json TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&pool)
        .await
        .map_err(|e| RepoError::database("campaign", e))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS campaign_entities (
                campaign_id TEXT NOT NULL,
                entity_id TEXT NOT NULL,
                entity_json TEXT NOT NULL,
                PRIMARY KEY (campaign_id, entity_id)
            )
            "#,
        )
        .execute(&pool)
        .await
        .map_err(|e| RepoError::database("campaign", e))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS scene_manifest (
                campaign_id TEXT PRIMARY KEY,
                manifest_json TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&pool)
        .await
        .map_err(|e| RepoError::database("campaign", e))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS turn_history (
                turn_id TEXT PRIMARY KEY,
                campaign_id TEXT NOT NULL,
                player_input TEXT NOT NULL,
                narrative TEXT NOT NULL,
                created_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&pool)
        .await
        .map_err(|e| RepoError::database("campaign", e))?;

        Ok(Self { pool, clock })
    }
}

#[async_trait]
impl CampaignRepo for SqliteCampaignRepo {
    async fn get_state(&self, id: CampaignId) -> Result<Option<GameState>, RepoError> {
        let row = sqlx::query("SELECT state_json FROM campaign_state WHERE campaign_id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| RepoError::database("campaign_state", e))?;

        match row {
            Some(row) => {
                let json: String = row.get("state_json");
                let state = serde_json::from_str(&json)
                    .map_err(|e| RepoError::Serialization(e.to_string()))?;
                Ok(Some(state))
            }
            None => Ok(None),
        }
    }

    async fn save_state(&self, state: &GameState) -> Result<(), RepoError> {
        let json =
            serde_json::to_string(state).map_err(|e| RepoError::Serialization(e.to_string()))?;

        sqlx::query(
            r#"
            INSERT INTO campaign_state (campaign_id, state_json, updated_at)
            VALUES (?, ?, ?)
            ON CONFLICT(campaign_id) DO UPDATE SET
                state_json = excluded.state_json,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(state.campaign_id.to_string())
        .bind(json)
        .bind(state.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| RepoError::database("campaign_state", e))?;

        Ok(())
    }

    async fn list_entities(&self, id: CampaignId) -> Result<Vec<Entity>, RepoError> {
        let rows = sqlx::query(
            "SELECT entity_json FROM campaign_entities WHERE campaign_id = ? ORDER BY entity_id",
        )
        .bind(id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepoError::database("campaign_entities", e))?;

        rows.into_iter()
            .map(|row| {
                let json: String = row.get("entity_json");
                serde_json::from_str(&json).map_err(|e| RepoError::Serialization(e.to_string()))
            })
            .collect()
    }

    async fn save_entities(&self, id: CampaignId, entities: &[Entity]) -> Result<(), RepoError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| RepoError::database("campaign_entities", e))?;

        sqlx::query("DELETE FROM campaign_entities WHERE campaign_id = ?")
            .bind(id.to_string())
            .execute(&mut *tx)
            .await
            .map_err(|e| RepoError::database("campaign_entities", e))?;

        for entity in entities {
            let json = serde_json::to_string(entity)
                .map_err(|e| RepoError::Serialization(e.to_string()))?;
            sqlx::query(
                "INSERT INTO campaign_entities (campaign_id, entity_id, entity_json) VALUES (?, ?, ?)",
            )
            .bind(id.to_string())
            .bind(entity.id.to_string())
            .bind(json)
            .execute(&mut *tx)
            .await
            .map_err(|e| RepoError::database("campaign_entities", e))?;
        }

        tx.commit()
            .await
            .map_err(|e| RepoError::database("campaign_entities", e))?;
        Ok(())
    }

    async fn get_manifest(&self, id: CampaignId) -> Result<SceneManifest, RepoError> {
        let row = sqlx::query("SELECT manifest_json FROM scene_manifest WHERE campaign_id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| RepoError::database("scene_manifest", e))?;

        match row {
            Some(row) => {
                let json: String = row.get("manifest_json");
                serde_json::from_str(&json).map_err(|e| RepoError::Serialization(e.to_string()))
            }
            None => Ok(SceneManifest::default()),
        }
    }

    async fn save_manifest(
        &self,
        id: CampaignId,
        manifest: &SceneManifest,
    ) -> Result<(), RepoError> {
        let json =
            serde_json::to_string(manifest).map_err(|e| RepoError::Serialization(e.to_string()))?;
        let now = self.clock.now().to_rfc3339();

        sqlx::query(
            r#"
            INSERT INTO scene_manifest (campaign_id, manifest_json, updated_at)
            VALUES (?, ?, ?)
            ON CONFLICT(campaign_id) DO UPDATE SET
                manifest_json = excluded.manifest_json,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(id.to_string())
        .bind(json)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| RepoError::database("scene_manifest", e))?;

        Ok(())
    }

    async fn append_turn(&self, record: &TurnRecord) -> Result<(), RepoError> {
        sqlx::query(
            r#"
            INSERT INTO turn_history (turn_id, campaign_id, player_input, narrative, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(record.turn_id.to_string())
        .bind(record.campaign_id.to_string())
        .bind(&record.player_input)
        .bind(&record.narrative)
        .bind(record.created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| RepoError::database("turn_history", e))?;

        Ok(())
    }

    async fn recent_turns(
        &self,
        id: CampaignId,
        limit: u32,
    ) -> Result<Vec<TurnRecord>, RepoError> {
        let rows = sqlx::query(
            r#"
            SELECT turn_id, player_input, narrative, created_at
            FROM turn_history
            WHERE campaign_id = ?
            ORDER BY created_at DESC
            LIMIT ?
            "#,
        )
        .bind(id.to_string())
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepoError::database("turn_history", e))?;

        let mut records: Vec<TurnRecord> = rows
            .into_iter()
            .map(|row| {
                let turn_id: String = row.get("turn_id");
                let created_at: String = row.get("created_at");
                Ok(TurnRecord {
                    turn_id: TurnId::from_uuid(
                        turn_id
                            .parse()
                            .map_err(|e| RepoError::Serialization(format!("turn_id: {e}")))?,
                    ),
                    campaign_id: id,
                    player_input: row.get("player_input"),
                    narrative: row.get("narrative"),
                    created_at: created_at
                        .parse()
                        .map_err(|e| RepoError::Serialization(format!("created_at: {e}")))?,
                })
            })
            .collect::<Result<_, RepoError>>()?;

        // Oldest first for prompt assembly.
        records.reverse();
        Ok(records)
    }
}
