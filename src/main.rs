use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;
use tracing::info;

use chat_workspace::agent::{LiveResponder, MockResponder, Responder};
use chat_workspace::config::{AppConfig, ResponderKind};
use chat_workspace::db::{InMemoryKeyValueStore, KeyValueStore, PgKeyValueStore};
use chat_workspace::errors::AppError;
use chat_workspace::routes::{router, AppState};
use chat_workspace::service::preference_service::PreferenceService;
use chat_workspace::store::ConversationStore;
use chat_workspace::summary::SummaryEngine;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present (development convenience)
    dotenvy::dotenv().ok();

    // Initialise tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "chat_workspace=debug,tower_http=debug".into()),
        )
        .init();

    let config = AppConfig::from_env()?;

    // ── Preferences ───────────────────────────────────────────────────────────
    let kv_store: Arc<dyn KeyValueStore> = match &config.database_url {
        Some(database_url) => {
            let pool = PgPoolOptions::new()
                .max_connections(5)
                .connect(database_url)
                .await
                .map_err(AppError::DatabaseConnectionFailed)?;
            sqlx::migrate!("./migrations")
                .run(&pool)
                .await
                .map_err(AppError::MigrationFailed)?;
            info!("Database connection established and migrations applied");
            Arc::new(PgKeyValueStore::new(pool))
        }
        None => {
            info!("DATABASE_URL not set, preferences are kept in memory");
            Arc::new(InMemoryKeyValueStore::new())
        }
    };

    // ── Responder ─────────────────────────────────────────────────────────────
    let responder: Arc<dyn Responder> = match &config.responder {
        ResponderKind::Mock { latency } => {
            info!("Using mock responder ({latency:?} latency)");
            Arc::new(MockResponder::with_latency(*latency))
        }
        ResponderKind::Live(settings) => {
            info!("Using Ollama responder with model {}", settings.model);
            Arc::new(LiveResponder::new(settings)?)
        }
    };

    let state = AppState {
        store: ConversationStore::new(responder, SummaryEngine::default()),
        preferences: PreferenceService::new(kv_store),
    };

    // ── Listen ────────────────────────────────────────────────────────────────
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on http://{addr}/");

    axum::serve(listener, router(state)).await?;
    Ok(())
}
