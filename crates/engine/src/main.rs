//! WorldArchitect Engine - Main entry point.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::{HeaderValue, Method};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use worldarch_engine::app::App;
use worldarch_engine::infrastructure::{
    clock::SystemClock,
    gemini::GeminiClient,
    persistence::{InMemoryCampaignRepo, SqliteCampaignRepo},
    ports::{CampaignRepo, ClockPort, LlmPort},
    resilient_llm::{ResilientLlmClient, RetryConfig},
};
use worldarch_engine::{api, prompt_templates};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment from repo root (the engine may run from `crates/engine`).
    load_dotenv_from_repo_root();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "worldarch_engine=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting WorldArchitect Engine");

    // Load configuration
    let server_host = std::env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".into());
    let server_port: u16 = std::env::var("SERVER_PORT")
        .or_else(|_| std::env::var("PORT"))
        .unwrap_or_else(|_| "3000".into())
        .parse()
        .unwrap_or(3000);

    for key in prompt_templates::all_keys() {
        let env_var = prompt_templates::key_to_env_var(key);
        if std::env::var(&env_var).is_ok() {
            tracing::info!(key, env_var, "Prompt template overridden from environment");
        }
    }

    // Campaign persistence: SQLite by default, in-memory for ephemeral runs.
    let clock: Arc<dyn ClockPort> = Arc::new(SystemClock::new());
    let repo: Arc<dyn CampaignRepo> = match std::env::var("CAMPAIGN_DB").as_deref() {
        Ok(":memory:") => {
            tracing::warn!("CAMPAIGN_DB=:memory:, campaign data will not survive restart");
            Arc::new(InMemoryCampaignRepo::new())
        }
        Ok(path) => Arc::new(SqliteCampaignRepo::new(path, clock.clone()).await?),
        Err(_) => Arc::new(SqliteCampaignRepo::new("campaigns.db", clock.clone()).await?),
    };

    // LLM client with retry
    let gemini = Arc::new(GeminiClient::from_env());
    let retry_config = RetryConfig::default();
    tracing::info!(
        "LLM client configured with retry: max_retries={}, base_delay_ms={}",
        retry_config.max_retries,
        retry_config.base_delay_ms
    );
    let llm: Arc<dyn LlmPort> = Arc::new(ResilientLlmClient::new(gemini, retry_config));

    // Create application
    let app = Arc::new(App::new(repo, llm));

    let mut router = api::http::routes()
        .with_state(app)
        .layer(TraceLayer::new_for_http());

    if let Some(cors) = build_cors_layer_from_env() {
        router = router.layer(cors);
    }

    // Start server
    let addr: SocketAddr = format!("{server_host}:{server_port}").parse()?;
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;

    Ok(())
}

fn load_dotenv_from_repo_root() {
    let repo_root = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..");

    // Prefer local overrides.
    for filename in [".env.local", ".env"] {
        let path = repo_root.join(filename);
        if path.exists() {
            let _ = dotenvy::from_path(path);
        }
    }
}

fn build_cors_layer_from_env() -> Option<CorsLayer> {
    let allowed_origins = std::env::var("CORS_ALLOWED_ORIGINS")
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());

    let allowed_origins = allowed_origins?;

    let mut cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::OPTIONS,
        ])
        .allow_headers([axum::http::header::CONTENT_TYPE]);

    if allowed_origins == "*" {
        cors = cors.allow_origin(Any);
    } else {
        let origins: Vec<HeaderValue> = allowed_origins
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .filter_map(|s| HeaderValue::from_str(s).ok())
            .collect();

        if origins.is_empty() {
            return None;
        }

        cors = cors.allow_origin(origins);
    }

    Some(cors)
}
