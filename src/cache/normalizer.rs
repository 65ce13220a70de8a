// src/cache/normalizer.rs
// Bilingual query normalization for exact-match cache keys

use std::collections::HashSet;

use once_cell::sync::Lazy;

// Frozen stop-word lists. "How to reset password?" and
// "reset password, please" must normalize to the same key.
static ENGLISH_STOP_WORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "how", "what", "where", "when", "who", "why", "do", "does", "did", "can", "could",
        "should", "would", "is", "are", "am", "be", "been", "please", "thanks", "thank", "help",
        "me", "my", "i", "a", "an", "the", "and", "or", "but", "in", "on", "at", "to", "for",
        "of", "with", "by", "about", "from",
    ]
    .into_iter()
    .collect()
});

static RUSSIAN_STOP_WORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        // Question words
        "как", "что", "где", "когда", "кто", "почему", "какой", "какая", "какие",
        // Modal verbs
        "могу", "можешь", "может", "можем", "можете", "могут", "должен", "должна", "должны",
        "нужно", "надо",
        // Auxiliary verbs
        "есть", "был", "была", "было", "были", "буду", "будет", "будем", "будете", "будут",
        // Prepositions
        "в", "на", "по", "к", "с", "от", "о", "об", "у", "за", "под", "над", "между", "через",
        "для", "из", "до", "без", "со", "ко", "во",
        // Pronouns
        "я", "ты", "он", "она", "оно", "мы", "вы", "они", "меня", "тебя", "его", "её", "нас",
        "вас", "их", "мой", "твой", "наш", "ваш",
        // Conjunctions
        "и", "или", "но", "же", "если", "то",
        // Particles
        "ли", "ни", "не",
        // Polite words
        "пожалуйста", "спасибо", "привет", "пока", "здравствуйте",
        // Demonstratives
        "это", "эта", "эти", "тот", "та", "те",
    ]
    .into_iter()
    .collect()
});

/// Normalize a query to a canonical cache key.
///
/// Steps: lowercase, strip non-word/non-whitespace characters, tokenize,
/// drop English and Russian stop words, sort tokens, rejoin with single
/// spaces. The token sort makes "password reset" and "reset password"
/// collide. Idempotent: `normalize(normalize(q)) == normalize(q)`.
pub fn normalize(query: &str) -> String {
    let lowered = query.to_lowercase();

    let stripped: String = lowered
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '_' || c.is_whitespace() {
                c
            } else {
                ' '
            }
        })
        .collect();

    let mut tokens: Vec<&str> = stripped
        .split_whitespace()
        .filter(|token| {
            !ENGLISH_STOP_WORDS.contains(token) && !RUSSIAN_STOP_WORDS.contains(token)
        })
        .collect();

    tokens.sort_unstable();
    tokens.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_question_variants_share_a_key() {
        assert_eq!(
            normalize("How to reset password?"),
            normalize("Reset password, please")
        );
        assert_eq!(normalize("How to reset password?"), "password reset");
    }

    #[test]
    fn test_case_insensitive() {
        assert_eq!(normalize("reset PASSWORD"), normalize("Reset password"));
    }

    #[test]
    fn test_token_order_insensitive() {
        assert_eq!(normalize("password reset"), normalize("reset password"));
    }

    #[test]
    fn test_russian_stop_words_removed() {
        assert_eq!(normalize("Как сбросить пароль?"), "пароль сбросить");
    }

    #[test]
    fn test_idempotent() {
        let once = normalize("How do I change my shipping address?");
        assert_eq!(normalize(&once), once);
    }

    #[test]
    fn test_empty_and_stopword_only_queries() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("how can i please"), "");
    }
}
