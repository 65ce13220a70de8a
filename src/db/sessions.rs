// src/db/sessions.rs
// Long-term persistence: session archive, user profiles, escalations

use anyhow::Result;
use serde_json::Value;
use sqlx::PgPool;

#[derive(Clone)]
pub struct PersistenceRepository {
    pool: PgPool,
}

impl PersistenceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Upsert the durable session row mirroring the Redis session.
    pub async fn touch_session(&self, session_id: &str, user_id: &str) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO sessions (session_id, user_id)
            VALUES ($1, $2)
            ON CONFLICT (session_id) DO UPDATE SET last_activity = NOW()
            "#,
        )
        .bind(session_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn upsert_user_profile(
        &self,
        user_id: &str,
        name: Option<&str>,
        memory_update: &Value,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO user_profiles (user_id, name, long_term_memory, last_seen)
            VALUES ($1, $2, $3, NOW())
            ON CONFLICT (user_id) DO UPDATE SET
                name = COALESCE(EXCLUDED.name, user_profiles.name),
                long_term_memory = user_profiles.long_term_memory || EXCLUDED.long_term_memory,
                last_seen = NOW()
            "#,
        )
        .bind(user_id)
        .bind(name)
        .bind(memory_update)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn archive_session(
        &self,
        session_id: &str,
        user_id: &str,
        outcome: &str,
        summary: &str,
        metrics: &Value,
        duration_seconds: Option<f64>,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO sessions_archive
                (session_id, user_id, outcome, summary, metrics, duration_seconds, end_time)
            VALUES ($1, $2, $3, $4, $5, $6, NOW())
            ON CONFLICT (session_id) DO UPDATE SET
                outcome = EXCLUDED.outcome,
                summary = EXCLUDED.summary,
                metrics = EXCLUDED.metrics,
                duration_seconds = EXCLUDED.duration_seconds,
                end_time = NOW()
            "#,
        )
        .bind(session_id)
        .bind(user_id)
        .bind(outcome)
        .bind(summary)
        .bind(metrics)
        .bind(duration_seconds)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn record_escalation(
        &self,
        session_id: &str,
        user_id: &str,
        reason: &str,
        question: Option<&str>,
    ) -> Result<()> {
        sqlx::query(
            "INSERT INTO escalations (session_id, user_id, reason, question) VALUES ($1, $2, $3, $4)",
        )
        .bind(session_id)
        .bind(user_id)
        .bind(reason)
        .bind(question)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn save_message(
        &self,
        session_id: &str,
        role: &str,
        content: &str,
        metadata: &Value,
    ) -> Result<()> {
        sqlx::query(
            "INSERT INTO messages (session_id, role, content, metadata) VALUES ($1, $2, $3, $4)",
        )
        .bind(session_id)
        .bind(role)
        .bind(content)
        .bind(metadata)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
