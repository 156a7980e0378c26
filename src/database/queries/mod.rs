
use chrono::{NaiveDateTime, Utc};
use sqlx::sqlite::SqliteConnection;
use sqlx::SqlitePool;
use tracing::debug;

use super::models::{Collection, CollectionUpdate, Document};

const COLLECTION_COLUMNS: &str = "id, name, description, embedding_dimension, \
     distance_function, created_at, updated_at";

const DOCUMENT_COLUMNS: &str = "id, collection_id, document_id, content, title, \
     source, doc_type, metadata, created_at, updated_at";

/// Fully-resolved document row ready to be written, produced by the ingestor
/// after validation and id derivation.
#[derive(Debug, Clone)]
pub struct DocumentRow {
    pub document_id: String,
    pub content: String,
    pub title: Option<String>,
    pub source: Option<String>,
    pub doc_type: Option<String>,
    pub metadata: String,
}

pub struct CollectionQueries;

impl CollectionQueries {
    #[inline]
    pub async fn create(
        pool: &SqlitePool,
        name: &str,
        description: Option<&str>,
        embedding_dimension: i64,
        distance_function: &str,
    ) -> sqlx::Result<Collection> {
        let now = Utc::now().naive_utc();
        let id = sqlx::query(
            "INSERT INTO collections \
             (name, description, embedding_dimension, distance_function, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(name)
        .bind(description)
        .bind(embedding_dimension)
        .bind(distance_function)
        .bind(now)
        .bind(now)
        .execute(pool)
        .await?
        .last_insert_rowid();

        Self::get_by_id(pool, id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)
    }

    #[inline]
    pub async fn get_by_id(pool: &SqlitePool, id: i64) -> sqlx::Result<Option<Collection>> {
        sqlx::query_as::<_, Collection>(&format!(
            "SELECT {COLLECTION_COLUMNS} FROM collections WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    #[inline]
    pub async fn get_by_name(pool: &SqlitePool, name: &str) -> sqlx::Result<Option<Collection>> {
        sqlx::query_as::<_, Collection>(&format!(
            "SELECT {COLLECTION_COLUMNS} FROM collections WHERE name = ?"
        ))
        .bind(name)
        .fetch_optional(pool)
        .await
    }

    /// Page of collections in creation order. The id tie-break keeps paging
    /// stable when rows share a creation timestamp.
    #[inline]
    pub async fn list(pool: &SqlitePool, offset: i64, limit: i64) -> sqlx::Result<Vec<Collection>> {
        sqlx::query_as::<_, Collection>(&format!(
            "SELECT {COLLECTION_COLUMNS} FROM collections \
             ORDER BY created_at ASC, id ASC LIMIT ? OFFSET ?"
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
    }

    #[inline]
    pub async fn count(pool: &SqlitePool) -> sqlx::Result<i64> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM collections")
            .fetch_one(pool)
            .await
    }

    #[inline]
    pub async fn update(
        pool: &SqlitePool,
        name: &str,
        update: &CollectionUpdate,
    ) -> sqlx::Result<Option<Collection>> {
        let Some(description) = update.description.as_deref() else {
            return Self::get_by_name(pool, name).await;
        };

        let now = Utc::now().naive_utc();
        sqlx::query("UPDATE collections SET description = ?, updated_at = ? WHERE name = ?")
            .bind(description)
            .bind(now)
            .bind(name)
            .execute(pool)
            .await?;

        Self::get_by_name(pool, name).await
    }

    /// Delete a collection and all documents it owns in one transaction, so
    /// the cascade is all-or-nothing. Returns false when the name is unknown.
    #[inline]
    pub async fn delete(pool: &SqlitePool, name: &str) -> sqlx::Result<bool> {
        let id: Option<i64> = sqlx::query_scalar("SELECT id FROM collections WHERE name = ?")
            .bind(name)
            .fetch_optional(pool)
            .await?;

        let Some(id) = id else {
            return Ok(false);
        };

        let mut transaction = pool.begin().await?;

        let documents_deleted = sqlx::query("DELETE FROM documents WHERE collection_id = ?")
            .bind(id)
            .execute(&mut *transaction)
            .await?
            .rows_affected();

        sqlx::query("DELETE FROM collections WHERE id = ?")
            .bind(id)
            .execute(&mut *transaction)
            .await?;

        transaction.commit().await?;

        debug!(
            "Deleted collection '{}' and {} owned documents",
            name, documents_deleted
        );
        Ok(true)
    }
}

pub struct DocumentQueries;

impl DocumentQueries {
    /// Insert-or-update on the (collection, document id) key. Runs on an open
    /// connection so the caller controls transaction scope.
    #[inline]
    pub async fn upsert(
        conn: &mut SqliteConnection,
        collection_id: i64,
        row: &DocumentRow,
        now: NaiveDateTime,
    ) -> sqlx::Result<()> {
        sqlx::query(
            "INSERT INTO documents \
             (collection_id, document_id, content, title, source, doc_type, metadata, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?) \
             ON CONFLICT(collection_id, document_id) DO UPDATE SET \
                 content = excluded.content, \
                 title = excluded.title, \
                 source = excluded.source, \
                 doc_type = excluded.doc_type, \
                 metadata = excluded.metadata, \
                 updated_at = excluded.updated_at",
        )
        .bind(collection_id)
        .bind(&row.document_id)
        .bind(&row.content)
        .bind(&row.title)
        .bind(&row.source)
        .bind(&row.doc_type)
        .bind(&row.metadata)
        .bind(now)
        .bind(now)
        .execute(conn)
        .await?;

        Ok(())
    }

    #[inline]
    pub async fn get(
        pool: &SqlitePool,
        collection_id: i64,
        document_id: &str,
    ) -> sqlx::Result<Option<Document>> {
        sqlx::query_as::<_, Document>(&format!(
            "SELECT {DOCUMENT_COLUMNS} FROM documents \
             WHERE collection_id = ? AND document_id = ?"
        ))
        .bind(collection_id)
        .bind(document_id)
        .fetch_optional(pool)
        .await
    }

    #[inline]
    pub async fn list(
        pool: &SqlitePool,
        collection_id: i64,
        offset: i64,
        limit: i64,
    ) -> sqlx::Result<Vec<Document>> {
        sqlx::query_as::<_, Document>(&format!(
            "SELECT {DOCUMENT_COLUMNS} FROM documents \
             WHERE collection_id = ? ORDER BY document_id ASC LIMIT ? OFFSET ?"
        ))
        .bind(collection_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
    }

    #[inline]
    pub async fn delete_many(
        pool: &SqlitePool,
        collection_id: i64,
        document_ids: &[String],
    ) -> sqlx::Result<u64> {
        if document_ids.is_empty() {
            return Ok(0);
        }

        let placeholders = vec!["?"; document_ids.len()].join(", ");
        let query_str = format!(
            "DELETE FROM documents WHERE collection_id = ? AND document_id IN ({placeholders})"
        );

        let mut query = sqlx::query(&query_str).bind(collection_id);
        for document_id in document_ids {
            query = query.bind(document_id);
        }

        let deleted = query.execute(pool).await?.rows_affected();

        debug!(
            "Deleted {} documents from collection {}",
            deleted, collection_id
        );
        Ok(deleted)
    }

    #[inline]
    pub async fn count_for_collection(pool: &SqlitePool, collection_id: i64) -> sqlx::Result<i64> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM documents WHERE collection_id = ?")
            .bind(collection_id)
            .fetch_one(pool)
            .await
    }
}
