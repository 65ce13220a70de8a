// src/main.rs
// Support RAG service entry point

use std::sync::Arc;

use anyhow::Result;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use support_rag::config::AppConfig;
use support_rag::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::from_env();

    let level: Level = config.logging.level.parse().unwrap_or(Level::INFO);
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting support-rag server");

    let state = Arc::new(AppState::new(config).await?);

    support_rag::warmup::warmup_all(&state).await;

    let app = support_rag::api::router(state.clone());
    let bind_address = state.config.server.bind_address();
    info!("Listening on {}", bind_address);

    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
