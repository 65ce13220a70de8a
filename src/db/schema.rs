// src/db/schema.rs
// Schema bootstrap for the document store and companion tables

use anyhow::Result;
use sqlx::PgPool;
use tracing::{info, warn};

const STATEMENTS: &[&str] = &[
    "CREATE EXTENSION IF NOT EXISTS vector",
    r#"
    CREATE TABLE IF NOT EXISTS documents (
        id SERIAL PRIMARY KEY,
        content TEXT NOT NULL,
        embedding vector(384),
        metadata JSONB NOT NULL DEFAULT '{}'::jsonb,
        search_vector TSVECTOR
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_documents_search_vector ON documents USING GIN (search_vector)",
    "CREATE INDEX IF NOT EXISTS idx_documents_embedding ON documents USING hnsw (embedding vector_cosine_ops)",
    r#"
    CREATE TABLE IF NOT EXISTS sessions (
        session_id TEXT PRIMARY KEY,
        user_id TEXT NOT NULL,
        start_time TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        last_activity TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS messages (
        id SERIAL PRIMARY KEY,
        session_id TEXT NOT NULL,
        role TEXT NOT NULL,
        content TEXT NOT NULL,
        metadata JSONB NOT NULL DEFAULT '{}'::jsonb,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_messages_session ON messages (session_id, created_at)",
    r#"
    CREATE TABLE IF NOT EXISTS user_profiles (
        user_id TEXT PRIMARY KEY,
        name TEXT,
        long_term_memory JSONB NOT NULL DEFAULT '{}'::jsonb,
        last_seen TIMESTAMPTZ
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS sessions_archive (
        session_id TEXT PRIMARY KEY,
        user_id TEXT NOT NULL,
        start_time TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        end_time TIMESTAMPTZ,
        outcome TEXT,
        summary TEXT,
        metrics JSONB NOT NULL DEFAULT '{}'::jsonb,
        duration_seconds DOUBLE PRECISION
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS escalations (
        id SERIAL PRIMARY KEY,
        session_id TEXT NOT NULL,
        user_id TEXT NOT NULL,
        reason TEXT NOT NULL,
        question TEXT,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
];

/// Create tables and indexes if they do not exist yet.
///
/// Extension and vector-index creation need elevated privileges in some
/// deployments; their failure is logged, not fatal. Table creation failures
/// abort startup.
pub async fn init_schema(pool: &PgPool) -> Result<()> {
    for statement in STATEMENTS {
        if let Err(e) = sqlx::query(statement).execute(pool).await {
            if statement.contains("EXTENSION") || statement.contains("USING hnsw") {
                warn!("Optional schema statement failed: {}", e);
                continue;
            }
            return Err(e.into());
        }
    }
    info!("Database schema ready");
    Ok(())
}
