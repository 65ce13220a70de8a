// src/dialog/analysis.rs
// Signal extraction over the latest user message

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::pipeline::Message;

/// Boolean signals the state machine transitions on.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DialogAnalysis {
    pub is_question: bool,
    pub is_gratitude: bool,
    pub escalation_requested: bool,
    pub frustration_detected: bool,
    pub repeated_question: bool,
}

static QUESTION_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"\?\s*$",
        r"(?i)^(what|how|why|when|where|who|which|can|do|does|did|is|are|will|would|could|please|pls)\b",
        r"(?i)^(как|почему|когда|где|кто|какой|можно|ли|пожалуйста|плиз)\b",
        r"(?i)\b(tell me|explain|describe|show|help)\b",
        r"(?i)\b(расскажи|объясни|покажи|помоги)\b",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("static regex"))
    .collect()
});

static GRATITUDE_PATTERNS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(thank you|thanks|thx|спасибо|благодарю|помогло|it worked|решило|все работает|всё работает)\b")
        .expect("static regex")
});

static ESCALATION_PATTERNS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(human|operator|agent|real person|живой человек|оператор|менеджер|человека|позовите|соедините)\b",
    )
    .expect("static regex")
});

static FRUSTRATION_PATTERNS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(useless|terrible|awful|not working|doesn't work|ничего не работает|не помогает|бесполезно|ужасно|надоело|сколько можно)\b",
    )
    .expect("static regex")
});

pub fn is_question(text: &str) -> bool {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return false;
    }
    QUESTION_PATTERNS.iter().any(|p| p.is_match(trimmed))
}

pub fn is_gratitude(text: &str) -> bool {
    GRATITUDE_PATTERNS.is_match(text)
}

pub fn escalation_requested(text: &str) -> bool {
    ESCALATION_PATTERNS.is_match(text)
}

pub fn frustration_detected(text: &str) -> bool {
    if FRUSTRATION_PATTERNS.is_match(text) {
        return true;
    }
    // Shouting with repeated exclamation marks counts as frustration
    let exclamations = text.matches('!').count();
    let letters: Vec<char> = text.chars().filter(|c| c.is_alphabetic()).collect();
    let upper = letters.iter().filter(|c| c.is_uppercase()).count();
    exclamations >= 3 || (letters.len() >= 8 && upper * 2 > letters.len())
}

/// The user literally re-sent a recent question (normalized comparison).
/// Semantic repetition is the topic-loop detector's job.
pub fn repeated_question(question: &str, history: &[Message]) -> bool {
    let normalized = crate::cache::normalize(question);
    if normalized.is_empty() {
        return false;
    }

    let mut recent: Vec<&Message> = history
        .iter()
        .rev()
        .filter(|m| m.is_user())
        .take(6)
        .collect();

    // Callers may or may not include the current turn as the last history
    // entry; drop it when they do so it cannot match itself.
    if recent.first().map(|m| m.content == question).unwrap_or(false) {
        recent.remove(0);
    }

    recent
        .iter()
        .take(5)
        .any(|m| crate::cache::normalize(&m.content) == normalized)
}

/// Compute every signal for the current question.
pub fn analyze(question: &str, history: &[Message]) -> DialogAnalysis {
    DialogAnalysis {
        is_question: is_question(question),
        is_gratitude: is_gratitude(question),
        escalation_requested: escalation_requested(question),
        frustration_detected: frustration_detected(question),
        repeated_question: repeated_question(question, history),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_question_detection() {
        assert!(is_question("How do I reset my password?"));
        assert!(is_question("как сбросить пароль"));
        assert!(is_question("tell me about shipping"));
        assert!(!is_question("ok"));
        assert!(!is_question(""));
    }

    #[test]
    fn test_gratitude_detection() {
        assert!(is_gratitude("Thanks, it worked!"));
        assert!(is_gratitude("Спасибо, помогло"));
        assert!(!is_gratitude("this is broken"));
    }

    #[test]
    fn test_escalation_detection() {
        assert!(escalation_requested("I want to talk to a human"));
        assert!(escalation_requested("позовите оператора"));
        assert!(!escalation_requested("how do I pay?"));
    }

    #[test]
    fn test_frustration_detection() {
        assert!(frustration_detected("this is useless!!!"));
        assert!(frustration_detected("ничего не работает"));
        assert!(frustration_detected("WHY IS THIS BROKEN"));
        assert!(!frustration_detected("how do I change my address?"));
    }

    #[test]
    fn test_repeated_question_matches_normalized_history() {
        let history = vec![
            Message::new("user", "How to reset password?"),
            Message::new("assistant", "Click forgot password"),
            Message::new("user", "reset password, please"),
        ];
        // Current question equals an earlier turn after normalization
        assert!(repeated_question("reset password, please", &history));
    }

    #[test]
    fn test_fresh_question_not_repeated() {
        let history = vec![
            Message::new("user", "How to reset password?"),
            Message::new("assistant", "Click forgot password"),
            Message::new("user", "where is my order"),
        ];
        assert!(!repeated_question("where is my order", &history));
    }
}
