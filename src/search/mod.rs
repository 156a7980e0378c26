
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::SearchConfig;
use crate::database::models::SearchHit;
use crate::database::queries::CollectionQueries;
use crate::database::Database;
use crate::{Result, StoreError};

/// A free-text query plus options, scoped to one collection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    /// Clamped to `[1, max_limit]`; the configured default when unset.
    pub limit: Option<i64>,
    /// Exact-match constraints on metadata values, ANDed together.
    #[serde(default)]
    pub metadata_filter: BTreeMap<String, String>,
    pub doc_type: Option<String>,
}

/// Translates queries into ranked, bounded result sets. Relevance comes from
/// the backend's bm25 primitive, negated so higher means more relevant; ties
/// break by most-recent update, then document id, so identical inputs always
/// return identical orderings.
#[derive(Debug, Clone)]
pub struct SearchEngine {
    db: Database,
    config: SearchConfig,
}

impl SearchEngine {
    #[inline]
    pub fn new(db: Database, config: SearchConfig) -> Self {
        Self { db, config }
    }

    pub async fn search(
        &self,
        collection_name: &str,
        request: &SearchRequest,
    ) -> Result<Vec<SearchHit>> {
        let match_expr = build_match_expr(&request.query)?;

        let collection = CollectionQueries::get_by_name(self.db.pool(), collection_name)
            .await?
            .ok_or_else(|| StoreError::CollectionNotFound(collection_name.to_string()))?;

        let limit = request
            .limit
            .unwrap_or(self.config.default_limit as i64)
            .clamp(1, self.config.max_limit as i64);

        let mut predicates = vec![
            "documents_fts MATCH ?".to_string(),
            "d.collection_id = ?".to_string(),
        ];
        if request.doc_type.is_some() {
            predicates.push("d.doc_type = ?".to_string());
        }
        for _ in &request.metadata_filter {
            predicates.push("json_extract(d.metadata, ?) = ?".to_string());
        }

        let query_str = format!(
            "SELECT d.document_id, \
                    d.content, \
                    snippet(documents_fts, 0, '', '', '…', {snippet_tokens}) AS excerpt, \
                    -bm25(documents_fts) AS score, \
                    d.title, \
                    d.doc_type, \
                    d.metadata, \
                    d.created_at, \
                    d.updated_at \
             FROM documents_fts \
             JOIN documents d ON d.id = documents_fts.rowid \
             WHERE {predicates} \
             ORDER BY score DESC, d.updated_at DESC, d.document_id ASC \
             LIMIT ?",
            snippet_tokens = self.config.snippet_tokens,
            predicates = predicates.join(" AND "),
        );

        let mut query = sqlx::query_as::<_, SearchHit>(&query_str)
            .bind(&match_expr)
            .bind(collection.id);
        if let Some(doc_type) = &request.doc_type {
            query = query.bind(doc_type);
        }
        for (key, value) in &request.metadata_filter {
            query = query.bind(format!("$.{key}")).bind(value);
        }
        query = query.bind(limit);

        let hits = query.fetch_all(self.db.pool()).await?;

        debug!(
            "Search '{}' in collection '{}' returned {} results",
            match_expr,
            collection_name,
            hits.len()
        );
        Ok(hits)
    }
}

/// Normalize a free-text query into an FTS5 match expression: lowercase,
/// alphanumeric terms only, each quoted so no query text is ever interpreted
/// as FTS5 syntax. Zero surviving terms is `InvalidQuery`, not "no results".
pub fn build_match_expr(query: &str) -> Result<String> {
    if query.trim().is_empty() {
        return Err(StoreError::InvalidQuery("query is empty".to_string()));
    }

    let terms: Vec<String> = query
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|term| !term.is_empty())
        .map(|term| format!("\"{term}\""))
        .collect();

    if terms.is_empty() {
        return Err(StoreError::InvalidQuery(
            "query contains no searchable terms".to_string(),
        ));
    }

    Ok(terms.join(" "))
}
