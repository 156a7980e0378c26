
use std::fmt::Write as _;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use crate::config::IngestConfig;
use crate::database::models::{Document, NewDocument};
use crate::database::queries::{CollectionQueries, DocumentQueries, DocumentRow};
use crate::database::Database;
use crate::{Result, StoreError};

/// Outcome for one submitted document, reported in submission order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum DocumentOutcome {
    /// Upserted durably.
    Ingested { document_id: String },
    /// Rejected before any write.
    Invalid { reason: String },
    /// Part of a sub-batch whose transaction did not commit.
    Failed { document_id: String, reason: String },
}

impl DocumentOutcome {
    #[inline]
    pub fn is_ingested(&self) -> bool {
        matches!(self, Self::Ingested { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestReport {
    pub outcomes: Vec<DocumentOutcome>,
    pub ingested: usize,
    pub failed: usize,
    pub invalid: usize,
}

/// Turns caller-supplied document batches into durable, searchable rows with
/// deterministic partial-failure reporting. Sub-batches of `batch_commit_size`
/// are the atomicity boundary: each commits or rolls back as a unit, and a
/// failed sub-batch never aborts its successors.
#[derive(Debug, Clone)]
pub struct DocumentIngestor {
    db: Database,
    config: IngestConfig,
}

impl DocumentIngestor {
    #[inline]
    pub fn new(db: Database, config: IngestConfig) -> Self {
        Self { db, config }
    }

    pub async fn ingest_batch(
        &self,
        collection_name: &str,
        documents: Vec<NewDocument>,
    ) -> Result<IngestReport> {
        if documents.len() > self.config.max_batch_documents {
            return Err(StoreError::BatchTooLarge {
                size: documents.len(),
                max: self.config.max_batch_documents,
            });
        }

        let collection = CollectionQueries::get_by_name(self.db.pool(), collection_name)
            .await?
            .ok_or_else(|| StoreError::CollectionNotFound(collection_name.to_string()))?;

        let total = documents.len();
        let mut outcomes: Vec<Option<DocumentOutcome>> = vec![None; total];
        let mut pending: Vec<(usize, DocumentRow)> = Vec::with_capacity(total);

        for (index, document) in documents.into_iter().enumerate() {
            match self.prepare(document) {
                Ok(row) => pending.push((index, row)),
                Err(reason) => {
                    debug!("Document {} rejected: {}", index, reason);
                    outcomes[index] = Some(DocumentOutcome::Invalid { reason });
                }
            }
        }

        for sub_batch in pending.chunks(self.config.batch_commit_size) {
            match self.commit_sub_batch(collection.id, sub_batch).await {
                Ok(()) => {
                    for (index, row) in sub_batch {
                        outcomes[*index] = Some(DocumentOutcome::Ingested {
                            document_id: row.document_id.clone(),
                        });
                    }
                }
                // Pool exhaustion is a call-level infrastructure failure, not
                // a property of these documents.
                Err(StoreError::PoolExhausted) => return Err(StoreError::PoolExhausted),
                Err(err) => {
                    let reason = err.to_string();
                    warn!(
                        "Sub-batch of {} documents failed for collection '{}': {}",
                        sub_batch.len(),
                        collection_name,
                        reason
                    );
                    for (index, row) in sub_batch {
                        outcomes[*index] = Some(DocumentOutcome::Failed {
                            document_id: row.document_id.clone(),
                            reason: reason.clone(),
                        });
                    }
                }
            }
        }

        let outcomes: Vec<DocumentOutcome> = outcomes
            .into_iter()
            .map(|outcome| {
                outcome.unwrap_or_else(|| DocumentOutcome::Invalid {
                    reason: "document was not processed".to_string(),
                })
            })
            .collect();

        let ingested = outcomes.iter().filter(|o| o.is_ingested()).count();
        let invalid = outcomes
            .iter()
            .filter(|o| matches!(o, DocumentOutcome::Invalid { .. }))
            .count();
        let failed = total - ingested - invalid;

        info!(
            "Ingested {}/{} documents into collection '{}' ({} invalid, {} failed)",
            ingested, total, collection_name, invalid, failed
        );

        Ok(IngestReport {
            outcomes,
            ingested,
            failed,
            invalid,
        })
    }

    /// Validate one document and resolve it into a writable row. Returns the
    /// rejection reason on failure; nothing has been written either way.
    fn prepare(&self, document: NewDocument) -> std::result::Result<DocumentRow, String> {
        let content = document.content.trim();
        if content.is_empty() {
            return Err("content is empty".to_string());
        }
        if content.len() > self.config.max_document_bytes {
            return Err(format!(
                "content is {} bytes (max {})",
                content.len(),
                self.config.max_document_bytes
            ));
        }

        let document_id = match document.document_id {
            Some(id) => {
                let id = id.trim();
                if id.is_empty() {
                    return Err("document id must be non-empty when provided".to_string());
                }
                id.to_string()
            }
            None => derive_document_id(
                content,
                document.title.as_deref(),
                document.source.as_deref(),
                document.doc_type.as_deref(),
            ),
        };

        let metadata = serde_json::to_string(&document.metadata)
            .map_err(|e| format!("metadata is not serializable: {e}"))?;

        Ok(DocumentRow {
            document_id,
            content: content.to_string(),
            title: document.title,
            source: document.source,
            doc_type: document.doc_type,
            metadata,
        })
    }

    /// Commit one sub-batch as a single transaction of upserts. Duplicate ids
    /// within the sub-batch resolve last-write-wins in submission order.
    async fn commit_sub_batch(
        &self,
        collection_id: i64,
        sub_batch: &[(usize, DocumentRow)],
    ) -> Result<()> {
        let mut transaction = self.db.pool().begin().await.map_err(StoreError::from)?;

        let now = Utc::now().naive_utc();
        for (_, row) in sub_batch {
            if let Err(err) = DocumentQueries::upsert(&mut *transaction, collection_id, row, now).await
            {
                // Roll back before returning so the write lock is released
                // before the next sub-batch starts on another connection.
                transaction.rollback().await.map_err(StoreError::from)?;
                return Err(StoreError::from(err));
            }
        }

        transaction.commit().await.map_err(StoreError::from)?;

        debug!("Committed sub-batch of {} documents", sub_batch.len());
        Ok(())
    }

    /// Fetch a page of documents from a collection.
    pub async fn get_documents(
        &self,
        collection_name: &str,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<Document>> {
        let collection = CollectionQueries::get_by_name(self.db.pool(), collection_name)
            .await?
            .ok_or_else(|| StoreError::CollectionNotFound(collection_name.to_string()))?;

        DocumentQueries::list(self.db.pool(), collection.id, offset.max(0), limit.max(1))
            .await
            .map_err(StoreError::from)
    }

    /// Delete documents by id, returning how many existed.
    pub async fn delete_documents(
        &self,
        collection_name: &str,
        document_ids: &[String],
    ) -> Result<u64> {
        let collection = CollectionQueries::get_by_name(self.db.pool(), collection_name)
            .await?
            .ok_or_else(|| StoreError::CollectionNotFound(collection_name.to_string()))?;

        DocumentQueries::delete_many(self.db.pool(), collection.id, document_ids)
            .await
            .map_err(StoreError::from)
    }
}

/// Stable id for a document without a caller-supplied one: the first 16 hex
/// characters of a sha256 over the content and its identifying fields, so
/// re-submitting the same document resolves to the same row.
#[inline]
pub fn derive_document_id(
    content: &str,
    title: Option<&str>,
    source: Option<&str>,
    doc_type: Option<&str>,
) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    for (key, value) in [("title", title), ("source", source), ("type", doc_type)] {
        if let Some(value) = value {
            hasher.update(format!("_{key}:{value}").as_bytes());
        }
    }

    let digest = hasher.finalize();
    let mut id = String::with_capacity(16);
    for byte in &digest[..8] {
        let _ = write!(id, "{byte:02x}");
    }
    id
}
