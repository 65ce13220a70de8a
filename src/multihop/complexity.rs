// src/multihop/complexity.rs
// Question complexity scoring

use serde::Serialize;

use crate::clients::translator::detect_language;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ComplexityLevel {
    Simple,
    Medium,
    Complex,
}

#[derive(Debug, Clone, Serialize)]
pub struct ComplexityOutput {
    pub level: ComplexityLevel,
    pub score: f32,
    pub language: &'static str,
    pub detected_markers: Vec<String>,
    pub num_hops: u32,
    pub confidence: f32,
}

struct Markers {
    question_words: &'static [&'static str],
    logical_connectors: &'static [&'static str],
    conjunctions: &'static [&'static str],
}

const EN_MARKERS: Markers = Markers {
    question_words: &[
        "how", "why", "what", "when", "which", "where", "explain", "describe",
    ],
    logical_connectors: &[
        "if", "then", "else", "because", "unless", "provided", "assuming", "after", "before",
    ],
    conjunctions: &["and", "or", "also", "with", "besides"],
};

const RU_MARKERS: Markers = Markers {
    question_words: &[
        "как", "почему", "зачем", "что", "когда", "какой", "где", "объясни", "опиши",
    ],
    logical_connectors: &[
        "если", "то", "иначе", "потому", "так как", "хотя", "при условии", "после", "до",
    ],
    conjunctions: &["и", "или", "также", "с", "кроме"],
};

/// Score a question's complexity and map it to a hop count.
///
/// Weights: question word 1.0, logical connector 1.5, conjunction 0.5,
/// comma 0.5, plus length buckets (+1 over 15 words, +2 over 25). Scores
/// below 1.5 are simple (1 hop), below 3.5 medium (2 hops), else complex
/// (3 hops).
pub fn detect(text: &str) -> ComplexityOutput {
    let lang = detect_language(text);
    let markers = if lang == "ru" { &RU_MARKERS } else { &EN_MARKERS };

    let lowered = text.to_lowercase();
    let words: Vec<&str> = lowered
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();

    let mut score = 0.0f32;
    let mut detected = Vec::new();

    for word in markers.question_words {
        if words.contains(word) {
            score += 1.0;
            detected.push(word.to_string());
        }
    }

    // Multi-word connectors need a substring match on word boundaries
    for connector in markers.logical_connectors {
        let found = if connector.contains(' ') {
            lowered.contains(connector)
        } else {
            words.contains(connector)
        };
        if found {
            score += 1.5;
            detected.push(connector.to_string());
        }
    }

    for conjunction in markers.conjunctions {
        if words.contains(conjunction) {
            score += 0.5;
            detected.push(conjunction.to_string());
        }
    }

    score += text.matches(',').count() as f32 * 0.5;

    if words.len() > 25 {
        score += 2.0;
    } else if words.len() > 15 {
        score += 1.0;
    }

    let (level, num_hops) = if score < 1.5 {
        (ComplexityLevel::Simple, 1)
    } else if score < 3.5 {
        (ComplexityLevel::Medium, 2)
    } else {
        (ComplexityLevel::Complex, 3)
    };

    let confidence = (0.5 + detected.len() as f32 * 0.1).min(1.0);

    ComplexityOutput {
        level,
        score,
        language: lang,
        detected_markers: detected,
        num_hops,
        confidence,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_question_is_simple() {
        let out = detect("reset password");
        assert_eq!(out.level, ComplexityLevel::Simple);
        assert_eq!(out.num_hops, 1);
    }

    #[test]
    fn test_conditional_question_scores_higher() {
        let out = detect("How do I get a refund if the order was shipped, and can I keep the discount?");
        assert!(out.score >= 3.5, "score was {}", out.score);
        assert_eq!(out.level, ComplexityLevel::Complex);
        assert_eq!(out.num_hops, 3);
    }

    #[test]
    fn test_russian_markers_detected() {
        let out = detect("Почему не приходит письмо, если я сменил адрес?");
        assert_eq!(out.language, "ru");
        assert!(out.detected_markers.iter().any(|m| m == "почему"));
        assert!(out.score >= 1.5);
    }

    #[test]
    fn test_medium_maps_to_two_hops() {
        let out = detect("Why was my card declined and how do I fix it");
        assert_eq!(out.level, ComplexityLevel::Medium, "score {}", out.score);
        assert_eq!(out.num_hops, 2);
    }
}
