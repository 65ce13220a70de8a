// src/retrieval/fusion.rs
// Reciprocal Rank Fusion over ranked result lists

use std::collections::HashMap;

use super::types::SearchResult;

pub const RRF_K: f32 = 60.0;

/// Combine ranked lists into one by summing `1/(k + rank)` per item across
/// every list it appears in. Deduplication is by content; the first list
/// containing an item supplies its metadata. Output is sorted by fused
/// score, capped at `top_n`.
pub fn reciprocal_rank_fusion(lists: &[Vec<SearchResult>], top_n: usize) -> Vec<SearchResult> {
    let mut scores: HashMap<&str, f32> = HashMap::new();
    let mut first_seen: HashMap<&str, &SearchResult> = HashMap::new();

    for list in lists {
        for (rank, result) in list.iter().enumerate() {
            let rank = rank as f32 + 1.0;
            *scores.entry(result.content.as_str()).or_insert(0.0) += 1.0 / (RRF_K + rank);
            first_seen.entry(result.content.as_str()).or_insert(result);
        }
    }

    let mut fused: Vec<SearchResult> = scores
        .into_iter()
        .map(|(content, score)| {
            let original = first_seen[content];
            SearchResult {
                content: original.content.clone(),
                score,
                metadata: original.metadata.clone(),
            }
        })
        .collect();

    fused.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    fused.truncate(top_n);
    fused
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn result(content: &str, score: f32) -> SearchResult {
        SearchResult::new(content, score, json!({}))
    }

    #[test]
    fn test_rrf_formula_two_lists() {
        // Dense: [A, B, C]; lexical: [B, D, A]
        let dense = vec![result("A", 0.9), result("B", 0.8), result("C", 0.7)];
        let lexical = vec![result("B", 3.0), result("D", 2.0), result("A", 1.0)];

        let fused = reciprocal_rank_fusion(&[dense, lexical], 10);

        let score_of = |content: &str| {
            fused
                .iter()
                .find(|r| r.content == content)
                .map(|r| r.score)
                .unwrap()
        };

        assert!((score_of("A") - (1.0 / 61.0 + 1.0 / 63.0)).abs() < 1e-6);
        assert!((score_of("B") - (1.0 / 62.0 + 1.0 / 61.0)).abs() < 1e-6);
        assert!((score_of("C") - 1.0 / 63.0).abs() < 1e-6);
        assert!((score_of("D") - 1.0 / 62.0).abs() < 1e-6);

        let order: Vec<&str> = fused.iter().map(|r| r.content.as_str()).collect();
        assert_eq!(order, vec!["B", "A", "D", "C"]);
    }

    #[test]
    fn test_rrf_scores_monotone_non_increasing() {
        let dense = vec![result("A", 0.9), result("B", 0.8)];
        let lexical = vec![result("C", 2.0), result("A", 1.0)];

        let fused = reciprocal_rank_fusion(&[dense, lexical], 10);
        for window in fused.windows(2) {
            assert!(window[0].score >= window[1].score);
        }
    }

    #[test]
    fn test_rrf_deduplicates_by_content() {
        let a = vec![result("same", 0.9)];
        let b = vec![result("same", 0.1)];

        let fused = reciprocal_rank_fusion(&[a, b], 10);
        assert_eq!(fused.len(), 1);
        assert!((fused[0].score - 2.0 / 61.0).abs() < 1e-6);
    }

    #[test]
    fn test_rrf_respects_top_n() {
        let list: Vec<SearchResult> = (0..20).map(|i| result(&format!("doc{}", i), 1.0)).collect();
        let fused = reciprocal_rank_fusion(&[list], 5);
        assert_eq!(fused.len(), 5);
    }

    #[test]
    fn test_rrf_empty_input() {
        assert!(reciprocal_rank_fusion(&[], 5).is_empty());
        assert!(reciprocal_rank_fusion(&[vec![]], 5).is_empty());
    }
}
