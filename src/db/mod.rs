// src/db/mod.rs

//! Postgres document store and companion tables.

pub mod documents;
pub mod schema;
pub mod sessions;

use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;

use crate::config::server::DatabaseConfig;

pub use documents::{DocumentRepository, DocumentRow};
pub use sessions::PersistenceRepository;

/// Connect the shared pool and bootstrap the schema.
pub async fn connect(config: &DatabaseConfig) -> Result<PgPool> {
    info!("Connecting to Postgres");
    let pool = PgPoolOptions::new()
        .min_connections(config.min_connections)
        .max_connections(config.max_connections)
        .connect(&config.url)
        .await
        .context("Failed to connect to Postgres")?;

    schema::init_schema(&pool).await?;
    Ok(pool)
}
