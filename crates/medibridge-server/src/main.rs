//! MediBridge API server binary.
//!
//! # Environment Variables
//! - `MEDIBRIDGE_ADDR`: listen address (default: "0.0.0.0:3000")
//! - `MEDIBRIDGE_DB_PATH`: SQLite file (default: "medibridge.db")
//! - `MEDIBRIDGE_SEED_PATH`: JSON directory imported when no doctors exist
//! - `LLM_API_KEY` / `OPENAI_API_KEY`: provider key (required)
//! - `LLM_BASE_URL`, `LLM_MODEL`, `LLM_TIMEOUT_SECS`: provider settings

use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use medibridge_core::{DirectorySeed, MediBridgeCore};
use medibridge_llm::OpenAiClient;
use medibridge_server::{router, AppState, Orchestrator, ServerConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env is optional
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("medibridge_server=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::from_env()?;

    let core = MediBridgeCore::open(&config.db_path)
        .with_context(|| format!("opening database {}", config.db_path.display()))?;

    if let Some(seed_path) = &config.seed_path {
        let seed = DirectorySeed::from_path(seed_path)
            .with_context(|| format!("reading seed {}", seed_path.display()))?;
        match core.seed_if_empty(&seed)? {
            Some(summary) => tracing::info!(?summary, "Directory seeded"),
            None => tracing::info!("Directory already populated; seed skipped"),
        }
    }

    let model = OpenAiClient::new(config.llm.clone())?;
    tracing::info!(
        model = %config.llm.model,
        base_url = %config.llm.base_url,
        search = core.search_strategy(),
        "Language model configured"
    );

    let orchestrator = Orchestrator::new(core, Arc::new(model), config.stage_timeout());
    let app = router(AppState::new(orchestrator));

    let listener = tokio::net::TcpListener::bind(config.addr)
        .await
        .with_context(|| format!("binding {}", config.addr))?;
    tracing::info!("-- Starting MediBridge API on {}", config.addr);

    axum::serve(listener, app).await?;
    Ok(())
}
