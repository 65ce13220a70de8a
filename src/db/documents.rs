// src/db/documents.rs
// Document repository: by-id fetch, full-text search, relation-graph load

use anyhow::Result;
use serde_json::Value;
use sqlx::{PgPool, Row};
use tracing::{debug, warn};

use crate::retrieval::types::SearchResult;

/// One stored Q/A document.
#[derive(Debug, Clone)]
pub struct DocumentRow {
    pub id: i64,
    pub content: String,
    pub metadata: Value,
}

#[derive(Clone)]
pub struct DocumentRepository {
    pool: PgPool,
}

impl DocumentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Fetch documents by id. Row order is arbitrary; callers that need
    /// rank order re-sort against their id list.
    pub async fn fetch_by_ids(&self, ids: &[i64]) -> Result<Vec<DocumentRow>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query(
            r#"
            SELECT id, content, metadata
            FROM documents
            WHERE id = ANY($1)
            "#,
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| DocumentRow {
                id: row.get::<i32, _>("id") as i64,
                content: row.get("content"),
                metadata: row.get("metadata"),
            })
            .collect())
    }

    /// Load all documents, for building the multi-hop relation graph.
    pub async fn load_all(&self) -> Result<Vec<DocumentRow>> {
        let rows = sqlx::query("SELECT id, content, metadata FROM documents")
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .into_iter()
            .map(|row| DocumentRow {
                id: row.get::<i32, _>("id") as i64,
                content: row.get("content"),
                metadata: row.get("metadata"),
            })
            .collect())
    }

    /// Full-text search over the stemmed index.
    ///
    /// Tokens are OR-joined into a tsquery. Queries containing Latin
    /// characters force the "english" configuration; otherwise the corpus
    /// language decides. When the indexed query errors out (malformed
    /// tsquery, missing index) a substring ILIKE scan takes over.
    pub async fn lexical_search(
        &self,
        query: &str,
        top_k: i64,
        document_language: &str,
        category_filter: Option<&str>,
    ) -> Result<Vec<SearchResult>> {
        let has_latin = query.chars().any(|c| c.is_ascii_alphabetic());
        let tsquery_config = if has_latin {
            "english"
        } else if document_language == "ru" {
            "russian"
        } else {
            "english"
        };

        let tsquery = clean_query_for_tsquery(query);
        if tsquery.is_empty() {
            return Ok(Vec::new());
        }

        debug!(
            "Lexical search: config={}, filter={:?}",
            tsquery_config, category_filter
        );

        let indexed = self
            .lexical_indexed(&tsquery, tsquery_config, top_k, category_filter)
            .await;

        match indexed {
            Ok(results) => Ok(results),
            Err(e) => {
                warn!("Index scan failed, falling back to ILIKE: {}", e);
                self.lexical_fallback(query, top_k, category_filter).await
            }
        }
    }

    async fn lexical_indexed(
        &self,
        tsquery: &str,
        config: &str,
        top_k: i64,
        category_filter: Option<&str>,
    ) -> Result<Vec<SearchResult>> {
        let rows = if let Some(category) = category_filter {
            sqlx::query(
                r#"
                SELECT content, ts_rank_cd(search_vector, query) AS score, metadata
                FROM documents, (SELECT to_tsquery($1::regconfig, $2) AS query) AS q
                WHERE search_vector @@ query
                  AND metadata->>'category' = $3
                ORDER BY score DESC
                LIMIT $4
                "#,
            )
            .bind(config)
            .bind(tsquery)
            .bind(category)
            .bind(top_k)
            .fetch_all(&self.pool)
            .await?
        } else {
            sqlx::query(
                r#"
                SELECT content, ts_rank_cd(search_vector, query) AS score, metadata
                FROM documents, (SELECT to_tsquery($1::regconfig, $2) AS query) AS q
                WHERE search_vector @@ query
                ORDER BY score DESC
                LIMIT $3
                "#,
            )
            .bind(config)
            .bind(tsquery)
            .bind(top_k)
            .fetch_all(&self.pool)
            .await?
        };

        Ok(rows
            .into_iter()
            .map(|row| SearchResult {
                content: row.get("content"),
                score: row.get::<f32, _>("score"),
                metadata: row.get("metadata"),
            })
            .collect())
    }

    async fn lexical_fallback(
        &self,
        query: &str,
        top_k: i64,
        category_filter: Option<&str>,
    ) -> Result<Vec<SearchResult>> {
        let pattern = format!("%{}%", query);

        let rows = if let Some(category) = category_filter {
            sqlx::query(
                r#"
                SELECT content, metadata FROM documents
                WHERE content ILIKE $1 AND metadata->>'category' = $2
                LIMIT $3
                "#,
            )
            .bind(&pattern)
            .bind(category)
            .bind(top_k)
            .fetch_all(&self.pool)
            .await?
        } else {
            sqlx::query("SELECT content, metadata FROM documents WHERE content ILIKE $1 LIMIT $2")
                .bind(&pattern)
                .bind(top_k)
                .fetch_all(&self.pool)
                .await?
        };

        Ok(rows
            .into_iter()
            .map(|row| SearchResult {
                content: row.get("content"),
                score: 0.0,
                metadata: row.get("metadata"),
            })
            .collect())
    }
}

/// Strip tsquery-hostile characters and OR-join the remaining words.
fn clean_query_for_tsquery(text: &str) -> String {
    let cleaned: String = text
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c.is_whitespace() || c == '_' {
                c
            } else {
                ' '
            }
        })
        .collect();

    cleaned
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" | ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_query_strips_punctuation_and_or_joins() {
        assert_eq!(
            clean_query_for_tsquery("reset password, please!"),
            "reset | password | please"
        );
    }

    #[test]
    fn test_clean_query_empty_input() {
        assert_eq!(clean_query_for_tsquery("?!...,"), "");
    }

    #[test]
    fn test_clean_query_cyrillic() {
        assert_eq!(
            clean_query_for_tsquery("сбросить пароль?"),
            "сбросить | пароль"
        );
    }
}
