// This is the entry point of the campus board server.
//
// **Architecture Overview:**
// - `core/` = Business logic (storage- and transport-agnostic)
// - `infra/` = Implementations of core traits (SQLite, OpenAI, in-memory sessions)
// - `web/` = HTTP adapter (axum routes, cookies, pages)
//
// This file's job is to:
// 1. Load configuration
// 2. Initialize services (dependency injection)
// 3. Start background maintenance
// 4. Serve HTTP until shutdown

// These attrs point each module declaration at a more descriptive root file
// so we don't end up with half a dozen mod.rs files that all look the same.
#[path = "core/core_layer.rs"]
mod core;
#[path = "infra/infra_layer.rs"]
mod infra;
#[path = "web/web_layer.rs"]
mod web;

mod config;

use crate::config::AppConfig;
use crate::core::accounts::AccountService;
use crate::core::board::BoardService;
use crate::core::moderation::ModerationService;
use crate::infra::accounts::{InMemorySessionStore, SqliteUserStore};
use crate::infra::board::SqliteBoardStore;
use crate::infra::database::connect_pool;
use crate::infra::moderation::{OpenAiModerationClient, UnconfiguredClassifier};
use crate::web::{build_router, AppState, Classifier, Moderation};
use anyhow::Context;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "campus_board=info,tower_http=info";
const SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(10 * 60);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env first so RUST_LOG from it applies to the subscriber
    dotenv::dotenv().ok();

    // Initialize logging so we can see what's happening
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .init();

    let config = AppConfig::from_env();

    // ========================================================================
    // DEPENDENCY INJECTION
    // ========================================================================
    // Create our services with their dependencies.
    // This is the "composition root" where we wire everything together.

    let pool = connect_pool(&config.database_url, 5)
        .await
        .with_context(|| format!("Failed to open database at {}", config.database_url))?;

    let user_store = SqliteUserStore::new(pool.clone());
    user_store
        .migrate()
        .await
        .context("Failed to migrate users table")?;

    let board_store = SqliteBoardStore::new(pool);
    board_store
        .migrate()
        .await
        .context("Failed to migrate board tables")?;

    // Remote classifier only when a key is configured; otherwise keyword-only moderation
    let classifier: Classifier = match &config.openai_api_key {
        Some(key) => {
            tracing::info!(model = %config.openai_model, "Using OpenAI moderation");
            Box::new(
                OpenAiModerationClient::new(
                    key.clone(),
                    config.openai_base_url.clone(),
                    config.openai_model.clone(),
                    config.moderation.classifier_timeout,
                )
                .context("Failed to build moderation HTTP client")?,
            )
        }
        None => {
            tracing::warn!("OPENAI_API_KEY not set; moderation uses the keyword list only");
            Box::new(UnconfiguredClassifier)
        }
    };

    let moderation: Arc<Moderation> = Arc::new(ModerationService::new(classifier, &config.moderation));
    let board = Arc::new(BoardService::new(board_store, Arc::clone(&moderation)));
    let accounts = Arc::new(AccountService::new(
        user_store,
        InMemorySessionStore::new(),
        config.session_ttl,
    ));

    // Background sweep: drop expired sessions and report cache size
    {
        let accounts = Arc::clone(&accounts);
        let moderation = Arc::clone(&moderation);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(SESSION_SWEEP_INTERVAL);
            loop {
                interval.tick().await;
                match accounts.purge_expired_sessions().await {
                    Ok(removed) => tracing::debug!(
                        removed,
                        cached_verdicts = moderation.cache_len(),
                        "Session sweep completed"
                    ),
                    Err(e) => tracing::warn!("Session sweep failed: {}", e),
                }
            }
        });
    }

    let app = build_router(AppState {
        accounts,
        board,
        cookie_secure: config.cookie_secure,
    });

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr))?;
    tracing::info!("Campus board listening on {}", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
