// src/multihop/merger.rs
// Context merging with a token budget

use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct MergedContextSource {
    pub question: String,
    pub hop_level: u32,
    pub score: f32,
    pub category: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct MergedContext {
    pub combined_text: String,
    pub sources: Vec<MergedContextSource>,
    pub estimated_tokens: usize,
    pub truncated: bool,
}

/// A document entering the merge: its answer text plus metadata.
#[derive(Debug, Clone)]
pub struct MergeDoc {
    pub question: String,
    pub answer: String,
    pub category: String,
}

/// Merge the primary answer with related documents into one context string.
///
/// Tokens are estimated as character count / 4. Overflow truncates the
/// combined text and flips the `truncated` flag.
pub fn merge_contexts(
    primary: &MergeDoc,
    related: &[MergeDoc],
    max_tokens: usize,
) -> MergedContext {
    let mut combined = Vec::new();
    let mut sources = Vec::new();

    combined.push(format!("### Основной ответ\n{}", primary.answer));
    sources.push(MergedContextSource {
        question: primary.question.clone(),
        hop_level: 0,
        score: 1.0,
        category: primary.category.clone(),
    });

    for doc in related {
        if doc.answer == primary.answer {
            continue;
        }
        combined.push(format!(
            "\n\n### Дополнительная информация ({})\n{}",
            doc.category, doc.answer
        ));
        sources.push(MergedContextSource {
            question: doc.question.clone(),
            hop_level: 1,
            score: 0.8,
            category: doc.category.clone(),
        });
    }

    let mut full_text = combined.join("\n");
    let estimated_tokens = full_text.chars().count() / 4;

    let truncated = estimated_tokens > max_tokens;
    if truncated {
        let char_budget = max_tokens * 4;
        full_text = full_text.chars().take(char_budget).collect();
    }

    MergedContext {
        combined_text: full_text,
        sources,
        estimated_tokens,
        truncated,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(question: &str, answer: &str, category: &str) -> MergeDoc {
        MergeDoc {
            question: question.to_string(),
            answer: answer.to_string(),
            category: category.to_string(),
        }
    }

    #[test]
    fn test_merge_includes_primary_and_related() {
        let primary = doc("q1", "primary answer", "Billing");
        let related = vec![doc("q2", "related answer", "Billing")];

        let merged = merge_contexts(&primary, &related, 5000);
        assert!(merged.combined_text.contains("primary answer"));
        assert!(merged.combined_text.contains("related answer"));
        assert_eq!(merged.sources.len(), 2);
        assert!(!merged.truncated);
    }

    #[test]
    fn test_merge_skips_duplicate_answers() {
        let primary = doc("q1", "same answer", "Billing");
        let related = vec![doc("q2", "same answer", "Shipping")];

        let merged = merge_contexts(&primary, &related, 5000);
        assert_eq!(merged.sources.len(), 1);
    }

    #[test]
    fn test_merge_truncates_over_budget() {
        let primary = doc("q1", &"x".repeat(100), "Billing");
        let related: Vec<MergeDoc> = (0..50)
            .map(|i| doc(&format!("q{}", i), &"y".repeat(500), "Billing"))
            .collect();

        let merged = merge_contexts(&primary, &related, 100);
        assert!(merged.truncated);
        assert!(merged.combined_text.chars().count() <= 400);
    }
}
