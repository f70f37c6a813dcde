//! HTTP routes.

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use uuid::Uuid;

use worldarch_domain::{CampaignId, Entity, GameState};
use worldarch_protocol::{CampaignCreated, CreateCampaignRequest, TurnRequest, TurnResponse};

use crate::app::App;
use crate::use_cases::TurnError;

/// Create all HTTP routes.
pub fn routes() -> Router<Arc<App>> {
    Router::new()
        .route("/", get(health))
        .route("/api/health", get(health))
        .route("/api/campaigns", post(create_campaign))
        .route("/api/campaigns/{id}/state", get(get_state))
        .route("/api/campaigns/{id}/turn", post(run_turn))
        .route(
            "/api/campaigns/{id}/entities",
            get(list_entities).put(put_entities),
        )
}

async fn health() -> &'static str {
    "OK"
}

async fn create_campaign(
    State(app): State<Arc<App>>,
    Json(_request): Json<CreateCampaignRequest>,
) -> Result<Json<CampaignCreated>, ApiError> {
    let campaign_id = CampaignId::new();
    app.campaign
        .state_or_new(campaign_id, chrono::Utc::now())
        .await?;
    Ok(Json(CampaignCreated {
        campaign_id: campaign_id.to_uuid(),
    }))
}

async fn get_state(
    State(app): State<Arc<App>>,
    Path(id): Path<Uuid>,
) -> Result<Json<GameState>, ApiError> {
    let state = app
        .campaign
        .state(CampaignId::from_uuid(id))
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(state))
}

async fn run_turn(
    State(app): State<Arc<App>>,
    Path(id): Path<Uuid>,
    Json(request): Json<TurnRequest>,
) -> Result<Json<TurnResponse>, ApiError> {
    let response = app
        .use_cases
        .run_turn
        .execute(CampaignId::from_uuid(id), request)
        .await?;
    Ok(Json(response))
}

async fn list_entities(
    State(app): State<Arc<App>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<Entity>>, ApiError> {
    let entities = app.campaign.entities(CampaignId::from_uuid(id)).await?;
    Ok(Json(entities))
}

async fn put_entities(
    State(app): State<Arc<App>>,
    Path(id): Path<Uuid>,
    Json(entities): Json<Vec<Entity>>,
) -> Result<Json<Vec<Entity>>, ApiError> {
    let campaign_id = CampaignId::from_uuid(id);
    app.campaign.save_entities(campaign_id, &entities).await?;
    Ok(Json(entities))
}

#[derive(Debug)]
pub enum ApiError {
    NotFound,
    BadRequest(String),
    Internal(String),
}

impl axum::response::IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        match self {
            ApiError::NotFound => (axum::http::StatusCode::NOT_FOUND, "Not found").into_response(),
            ApiError::BadRequest(msg) => {
                (axum::http::StatusCode::BAD_REQUEST, msg).into_response()
            }
            ApiError::Internal(_) => (
                axum::http::StatusCode::INTERNAL_SERVER_ERROR,
                "Internal error",
            )
                .into_response(),
        }
    }
}

impl From<crate::infrastructure::ports::RepoError> for ApiError {
    fn from(e: crate::infrastructure::ports::RepoError) -> Self {
        match e {
            crate::infrastructure::ports::RepoError::NotFound => ApiError::NotFound,
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<TurnError> for ApiError {
    fn from(e: TurnError) -> Self {
        match e {
            TurnError::EmptyInput => ApiError::BadRequest(e.to_string()),
            TurnError::Repo(repo) => repo.into(),
        }
    }
}
