#[cfg(test)]
mod tests;

use tracing::info;

use crate::config::CollectionsConfig;
use crate::database::models::{
    Collection, CollectionPage, CollectionStats, CollectionUpdate, NewCollection,
};
use crate::database::queries::{CollectionQueries, DocumentQueries};
use crate::database::Database;
use crate::{is_unique_violation, Result, StoreError};

/// CRUD over named collections, the root of document ownership.
#[derive(Debug, Clone)]
pub struct CollectionRegistry {
    db: Database,
    config: CollectionsConfig,
}

impl CollectionRegistry {
    #[inline]
    pub fn new(db: Database, config: CollectionsConfig) -> Self {
        Self { db, config }
    }

    /// Register a collection. Names match case-sensitively and are immutable
    /// after creation; unset dimensionality and distance function fall back
    /// to configured defaults.
    pub async fn create(&self, new_collection: NewCollection) -> Result<Collection> {
        let name = new_collection.name.trim();
        if name.is_empty() {
            return Err(StoreError::InvalidCollectionName(
                "name must be non-empty".to_string(),
            ));
        }

        if CollectionQueries::get_by_name(self.db.pool(), name)
            .await?
            .is_some()
        {
            return Err(StoreError::DuplicateCollection(name.to_string()));
        }

        let dimension = new_collection
            .embedding_dimension
            .unwrap_or(self.config.default_embedding_dimension);
        let distance = new_collection
            .distance_function
            .unwrap_or(self.config.default_distance_function);

        let created = CollectionQueries::create(
            self.db.pool(),
            name,
            new_collection.description.as_deref(),
            i64::from(dimension),
            &distance.to_string(),
        )
        .await
        .map_err(|err| {
            // Two concurrent creates can both pass the existence check; the
            // UNIQUE constraint decides the loser.
            if is_unique_violation(&err) {
                StoreError::DuplicateCollection(name.to_string())
            } else {
                StoreError::from(err)
            }
        })?;

        info!("Collection '{}' created", created.name);
        Ok(created)
    }

    pub async fn get(&self, name: &str) -> Result<Collection> {
        CollectionQueries::get_by_name(self.db.pool(), name)
            .await?
            .ok_or_else(|| StoreError::CollectionNotFound(name.to_string()))
    }

    /// Page of collections ordered by creation time ascending, with the total
    /// count. The limit is clamped to the configured maximum.
    pub async fn list(&self, offset: i64, limit: i64) -> Result<CollectionPage> {
        let offset = offset.max(0);
        let limit = limit.clamp(1, self.config.max_list_limit as i64);

        let collections = CollectionQueries::list(self.db.pool(), offset, limit).await?;
        let total = CollectionQueries::count(self.db.pool()).await?;

        Ok(CollectionPage { collections, total })
    }

    /// Partial update of mutable fields only.
    pub async fn update(&self, name: &str, update: CollectionUpdate) -> Result<Collection> {
        CollectionQueries::update(self.db.pool(), name, &update)
            .await?
            .ok_or_else(|| StoreError::CollectionNotFound(name.to_string()))
    }

    /// Delete a collection and cascade to every document it owns.
    pub async fn delete(&self, name: &str) -> Result<()> {
        let deleted = CollectionQueries::delete(self.db.pool(), name).await?;
        if !deleted {
            return Err(StoreError::CollectionNotFound(name.to_string()));
        }

        info!("Collection '{}' deleted", name);
        Ok(())
    }

    pub async fn stats(&self, name: &str) -> Result<CollectionStats> {
        let collection = self.get(name).await?;
        let document_count =
            DocumentQueries::count_for_collection(self.db.pool(), collection.id).await?;

        Ok(CollectionStats {
            collection,
            document_count,
        })
    }
}
