// src/session/mod.rs

//! Per-user session state in Redis.
//!
//! `session:<session_id>` holds the serialized `UserSession`; the pointer
//! `user:active_session:<user_id>` maps a user to their active session.
//! Both keys slide on every save (24h TTL by default). Updates are
//! read-modify-write with last-write-wins; hot-session locking is left to
//! deployments that observe contention.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::clients::RedisConnector;
use crate::config::dialog::DialogConfig;
use crate::dialog::state_machine::DialogState;
use crate::pipeline::Message;

/// Persisted state of one clarification sub-dialogue.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClarificationContext {
    pub active: bool,
    #[serde(default)]
    pub questions: Vec<String>,
    #[serde(default)]
    pub current_index: usize,
    #[serde(default)]
    pub answers: serde_json::Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_doc_id: Option<String>,
    #[serde(default)]
    pub requires_handoff: bool,
    #[serde(default)]
    pub target_language: String,
}

/// An active user session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserSession {
    pub user_id: String,
    pub session_id: String,
    pub start_time: f64,
    pub last_activity_time: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_problem: Option<String>,
    #[serde(default)]
    pub dialog_state: DialogState,
    #[serde(default)]
    pub attempt_count: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_answer_confidence: Option<f32>,
    #[serde(default)]
    pub extracted_entities: serde_json::Map<String, Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clarification_context: Option<ClarificationContext>,
    #[serde(default)]
    pub clarified_doc_ids: Vec<String>,

    #[serde(default)]
    pub message_count: u64,
    #[serde(default)]
    pub recent_messages: Vec<Message>,
}

impl UserSession {
    fn new(user_id: &str, session_id: &str) -> Self {
        let now = chrono::Utc::now().timestamp() as f64;
        Self {
            user_id: user_id.to_string(),
            session_id: session_id.to_string(),
            start_time: now,
            last_activity_time: now,
            current_problem: None,
            dialog_state: DialogState::Initial,
            attempt_count: 0,
            last_answer_confidence: None,
            extracted_entities: serde_json::Map::new(),
            clarification_context: None,
            clarified_doc_ids: Vec::new(),
            message_count: 0,
            recent_messages: Vec::new(),
        }
    }
}

/// Redis-backed session store.
pub struct SessionStore {
    redis: RedisConnector,
    ttl_seconds: u64,
    recent_messages_cap: usize,
}

impl SessionStore {
    pub fn new(redis: RedisConnector, config: &DialogConfig) -> Self {
        Self {
            redis,
            ttl_seconds: config.session_ttl_seconds(),
            recent_messages_cap: config.recent_messages_cap,
        }
    }

    fn session_key(session_id: &str) -> String {
        format!("session:{}", session_id)
    }

    fn pointer_key(user_id: &str) -> String {
        format!("user:active_session:{}", user_id)
    }

    /// Load a session by id, or resolve the user's active session through
    /// the pointer key when no id is given.
    pub async fn get(&self, user_id: &str, session_id: Option<&str>) -> Option<UserSession> {
        let session_id = match session_id {
            Some(id) => id.to_string(),
            None => self
                .redis
                .get(&Self::pointer_key(user_id))
                .await
                .ok()
                .flatten()?,
        };

        let raw = self
            .redis
            .get(&Self::session_key(&session_id))
            .await
            .ok()
            .flatten()?;

        match serde_json::from_str(&raw) {
            Ok(session) => Some(session),
            Err(e) => {
                warn!("Corrupt session '{}': {}", session_id, e);
                None
            }
        }
    }

    /// Load the session or lazily create it on first request.
    pub async fn get_or_create(&self, user_id: &str, session_id: &str) -> UserSession {
        if let Some(session) = self.get(user_id, Some(session_id)).await {
            return session;
        }

        let session = UserSession::new(user_id, session_id);
        if let Err(e) = self.save(&session).await {
            warn!("Failed to create session: {}", e);
        }
        session
    }

    /// Persist the session and refresh both TTLs. The active-session
    /// pointer is written in the same call path so it tracks the data key.
    pub async fn save(&self, session: &UserSession) -> Result<()> {
        let mut session = session.clone();
        session.last_activity_time = chrono::Utc::now().timestamp() as f64;

        let raw = serde_json::to_string(&session)?;
        self.redis
            .setex(&Self::session_key(&session.session_id), self.ttl_seconds, &raw)
            .await?;
        self.redis
            .setex(
                &Self::pointer_key(&session.user_id),
                self.ttl_seconds,
                &session.session_id,
            )
            .await?;
        Ok(())
    }

    /// Read-local-mutate-save partial update. Retried a few times because
    /// the save races with concurrent writers; last write wins.
    pub async fn update<F>(&self, user_id: &str, session_id: &str, mutate: F)
    where
        F: Fn(&mut UserSession),
    {
        let Some(mut session) = self.get(user_id, Some(session_id)).await else {
            debug!("Session '{}' expired or missing, skipping update", session_id);
            return;
        };

        mutate(&mut session);

        for attempt in 1..=3 {
            match self.save(&session).await {
                Ok(()) => return,
                Err(e) if attempt < 3 => {
                    warn!("Session save attempt {} failed: {}", attempt, e);
                    tokio::time::sleep(std::time::Duration::from_millis(100)).await;
                }
                Err(e) => {
                    warn!("Failed to save session after 3 attempts: {}", e);
                }
            }
        }
    }

    /// Append a message to `recent_messages`, keeping the newest entries
    /// under the cap.
    pub async fn add_message(&self, user_id: &str, session_id: &str, message: Message) {
        let cap = self.recent_messages_cap;
        self.update(user_id, session_id, move |session| {
            session.recent_messages.push(message.clone());
            if session.recent_messages.len() > cap {
                let excess = session.recent_messages.len() - cap;
                session.recent_messages.drain(..excess);
            }
            session.message_count += 1;
        })
        .await;
    }

    pub async fn clear(&self, user_id: &str) -> Result<()> {
        if let Ok(Some(session_id)) = self.redis.get(&Self::pointer_key(user_id)).await {
            self.redis.delete(&Self::session_key(&session_id)).await?;
        }
        self.redis.delete(&Self::pointer_key(user_id)).await?;
        Ok(())
    }
}
