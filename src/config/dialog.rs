// src/config/dialog.rs
// Dialog state machine, session, and topic-loop configuration

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DialogConfig {
    /// Attempts on one problem before the escalation override fires
    pub max_attempts: u32,
    pub escalate_on_max_attempts: bool,
    pub session_ttl_hours: u64,
    /// recent_messages entries kept per session
    pub recent_messages_cap: usize,
}

impl DialogConfig {
    pub fn from_env() -> Self {
        Self {
            max_attempts: super::helpers::env_parsed_or("DIALOG_MAX_ATTEMPTS", 3),
            escalate_on_max_attempts: super::helpers::env_bool("DIALOG_ESCALATE_ON_MAX_ATTEMPTS", true),
            session_ttl_hours: super::helpers::env_parsed_or("SESSION_TTL_HOURS", 24),
            recent_messages_cap: super::helpers::env_parsed_or("SESSION_RECENT_MESSAGES_CAP", 50),
        }
    }

    pub fn session_ttl_seconds(&self) -> u64 {
        self.session_ttl_hours * 3600
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoopDetectorConfig {
    /// Cosine similarity threshold on English embeddings
    pub similarity_threshold: f32,
    /// Recent user messages compared against the current question
    pub window_size: usize,
    /// Repetitions needed before a loop is signalled
    pub min_messages_for_loop: usize,
}

impl LoopDetectorConfig {
    pub fn from_env() -> Self {
        Self {
            similarity_threshold: super::helpers::env_parsed_or("LOOP_SIMILARITY_THRESHOLD", 0.85),
            window_size: super::helpers::env_parsed_or("LOOP_WINDOW_SIZE", 4),
            min_messages_for_loop: super::helpers::env_parsed_or("LOOP_MIN_MESSAGES", 3),
        }
    }
}
