use anyhow::{Context, Result};
use std::path::Path;
use tracing::info;

use crate::collections::CollectionRegistry;
use crate::config::{get_config_dir, Config};
use crate::database::models::{CollectionUpdate, DistanceFunction, NewCollection, NewDocument};
use crate::database::Database;
use crate::ingest::{DocumentIngestor, DocumentOutcome};
use crate::search::{SearchEngine, SearchRequest};

async fn open_database(config: &Config) -> Result<Database> {
    Database::initialize_from_config_dir(config.get_base_dir(), &config.pool)
        .await
        .context("Failed to initialize database")
}

fn load_config() -> Result<Config> {
    Config::load(get_config_dir())
}

/// Create a new collection
pub async fn create_collection(
    name: String,
    description: Option<String>,
    dimension: Option<u32>,
    distance: Option<DistanceFunction>,
) -> Result<()> {
    let config = load_config()?;
    let database = open_database(&config).await?;
    let registry = CollectionRegistry::new(database.clone(), config.collections.clone());

    let collection = registry
        .create(NewCollection {
            name,
            description,
            embedding_dimension: dimension,
            distance_function: distance,
        })
        .await?;

    println!("Created collection: {} (ID: {})", collection.name, collection.id);
    println!("  Dimension: {}", collection.embedding_dimension);
    println!("  Distance: {}", collection.distance_function);

    database.close().await;
    Ok(())
}

/// List collections in creation order
pub async fn list_collections(offset: i64, limit: i64) -> Result<()> {
    let config = load_config()?;
    let database = open_database(&config).await?;
    let registry = CollectionRegistry::new(database.clone(), config.collections.clone());

    let page = registry.list(offset, limit).await?;

    if page.collections.is_empty() {
        println!("No collections yet.");
        println!("Use 'docstore create <name>' to create one.");
        database.close().await;
        return Ok(());
    }

    println!("Collections ({} total):", page.total);
    println!();
    for collection in &page.collections {
        println!("📁 {} (ID: {})", collection.name, collection.id);
        if let Some(description) = &collection.description {
            println!("   {}", description);
        }
        println!(
            "   Dimension: {} | Distance: {} | Created: {}",
            collection.embedding_dimension, collection.distance_function, collection.created_at
        );
    }

    database.close().await;
    Ok(())
}

/// Show a collection with its document count
pub async fn describe_collection(name: String) -> Result<()> {
    let config = load_config()?;
    let database = open_database(&config).await?;
    let registry = CollectionRegistry::new(database.clone(), config.collections.clone());

    let stats = registry.stats(&name).await?;

    println!("Collection: {}", stats.collection.name);
    if let Some(description) = &stats.collection.description {
        println!("  Description: {}", description);
    }
    println!("  Documents: {}", stats.document_count);
    println!("  Dimension: {}", stats.collection.embedding_dimension);
    println!("  Distance: {}", stats.collection.distance_function);
    println!("  Created: {}", stats.collection.created_at);
    println!("  Updated: {}", stats.collection.updated_at);

    database.close().await;
    Ok(())
}

/// Update a collection's description
pub async fn update_collection(name: String, description: String) -> Result<()> {
    let config = load_config()?;
    let database = open_database(&config).await?;
    let registry = CollectionRegistry::new(database.clone(), config.collections.clone());

    let collection = registry
        .update(
            &name,
            CollectionUpdate {
                description: Some(description),
            },
        )
        .await?;

    println!("Updated collection: {}", collection.name);

    database.close().await;
    Ok(())
}

/// Delete a collection and all of its documents
pub async fn delete_collection(name: String) -> Result<()> {
    let config = load_config()?;
    let database = open_database(&config).await?;
    let registry = CollectionRegistry::new(database.clone(), config.collections.clone());

    registry.delete(&name).await?;
    println!("Deleted collection: {}", name);

    database.close().await;
    Ok(())
}

/// Ingest a batch of documents from a JSON file (an array of documents, each
/// with `content` and optional `document_id`/`title`/`doc_type`/`metadata`).
pub async fn ingest_batch(collection: String, file: &Path) -> Result<()> {
    let config = load_config()?;
    let database = open_database(&config).await?;
    let ingestor = DocumentIngestor::new(database.clone(), config.ingest.clone());

    let content = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read batch file: {}", file.display()))?;
    let documents: Vec<NewDocument> = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse batch file: {}", file.display()))?;

    info!("Ingesting {} documents into '{}'", documents.len(), collection);
    let report = ingestor.ingest_batch(&collection, documents).await?;

    println!(
        "Ingested {} documents ({} invalid, {} failed)",
        report.ingested, report.invalid, report.failed
    );
    for (index, outcome) in report.outcomes.iter().enumerate() {
        match outcome {
            DocumentOutcome::Ingested { document_id } => {
                println!("  [{}] ok      {}", index, document_id);
            }
            DocumentOutcome::Invalid { reason } => {
                println!("  [{}] invalid {}", index, reason);
            }
            DocumentOutcome::Failed {
                document_id,
                reason,
            } => {
                println!("  [{}] failed  {} ({})", index, document_id, reason);
            }
        }
    }

    database.close().await;
    Ok(())
}

/// Run a ranked full-text search against a collection
pub async fn search(
    collection: String,
    query: String,
    limit: Option<i64>,
    doc_type: Option<String>,
) -> Result<()> {
    let config = load_config()?;
    let database = open_database(&config).await?;
    let engine = SearchEngine::new(database.clone(), config.search.clone());

    let request = SearchRequest {
        query,
        limit,
        doc_type,
        ..SearchRequest::default()
    };
    let hits = engine.search(&collection, &request).await?;

    if hits.is_empty() {
        println!("No results.");
        database.close().await;
        return Ok(());
    }

    for (rank, hit) in hits.iter().enumerate() {
        println!("{}. {} (score {:.4})", rank + 1, hit.document_id, hit.score);
        println!("   {}", hit.excerpt);
    }

    database.close().await;
    Ok(())
}

/// Report backend reachability
pub async fn show_status() -> Result<()> {
    let config = load_config()?;
    let database = open_database(&config).await?;

    if database.health_check().await {
        println!("Backend: ok ({})", config.database_path().display());
    } else {
        println!("Backend: unreachable");
    }

    database.close().await;
    Ok(())
}
