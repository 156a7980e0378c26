#![expect(
    clippy::tests_outside_test_module,
    reason = "integration tests are only compiled in test mode"
)]

// End-to-end tests for the collection/ingest/search pipeline through the
// public component APIs.

use tempfile::TempDir;

use docstore::StoreError;
use docstore::collections::CollectionRegistry;
use docstore::config::Config;
use docstore::database::Database;
use docstore::database::models::{NewCollection, NewDocument};
use docstore::ingest::{DocumentIngestor, DocumentOutcome};
use docstore::search::{SearchEngine, SearchRequest};

struct TestStore {
    _temp_dir: TempDir,
    registry: CollectionRegistry,
    ingestor: DocumentIngestor,
    engine: SearchEngine,
}

async fn create_test_store() -> anyhow::Result<TestStore> {
    let temp_dir = TempDir::new()?;
    let config = Config::load(temp_dir.path())?;

    let database = Database::new(config.database_path(), &config.pool).await?;

    Ok(TestStore {
        registry: CollectionRegistry::new(database.clone(), config.collections.clone()),
        ingestor: DocumentIngestor::new(database.clone(), config.ingest.clone()),
        engine: SearchEngine::new(database, config.search.clone()),
        _temp_dir: temp_dir,
    })
}

fn named(name: &str) -> NewCollection {
    NewCollection {
        name: name.to_string(),
        description: None,
        embedding_dimension: None,
        distance_function: None,
    }
}

fn doc(id: &str, content: &str) -> NewDocument {
    NewDocument {
        document_id: Some(id.to_string()),
        content: content.to_string(),
        ..NewDocument::default()
    }
}

fn request(query: &str, limit: i64) -> SearchRequest {
    SearchRequest {
        query: query.to_string(),
        limit: Some(limit),
        ..SearchRequest::default()
    }
}

#[tokio::test]
async fn create_ingest_search_pipeline() {
    let store = create_test_store().await.expect("can create test store");

    store
        .registry
        .create(named("docs"))
        .await
        .expect("can create collection");

    let report = store
        .ingestor
        .ingest_batch(
            "docs",
            vec![
                doc("a", "vector search basics"),
                doc("b", "unrelated topic"),
            ],
        )
        .await
        .expect("can ingest batch");
    assert_eq!(report.ingested, 2);

    let hits = store
        .engine
        .search("docs", &request("vector search", 5))
        .await
        .expect("can search");

    assert_eq!(hits[0].document_id, "a");
    assert!(hits.iter().all(|hit| hit.document_id != "b"));
}

#[tokio::test]
async fn partial_batch_reports_every_document() {
    let store = create_test_store().await.expect("can create test store");

    store
        .registry
        .create(named("docs"))
        .await
        .expect("can create collection");

    let report = store
        .ingestor
        .ingest_batch(
            "docs",
            vec![doc("one", "alpha"), doc("two", ""), doc("three", "gamma")],
        )
        .await
        .expect("can ingest batch");

    assert_eq!(report.outcomes.len(), 3);
    assert!(matches!(
        report.outcomes[0],
        DocumentOutcome::Ingested { ref document_id } if document_id == "one"
    ));
    assert!(matches!(report.outcomes[1], DocumentOutcome::Invalid { .. }));
    assert!(matches!(
        report.outcomes[2],
        DocumentOutcome::Ingested { ref document_id } if document_id == "three"
    ));
}

#[tokio::test]
async fn deleting_collection_makes_documents_unsearchable() {
    let store = create_test_store().await.expect("can create test store");

    store
        .registry
        .create(named("ephemeral"))
        .await
        .expect("can create collection");
    store
        .ingestor
        .ingest_batch("ephemeral", vec![doc("a", "searchable snowfall content")])
        .await
        .expect("can ingest batch");

    let hits = store
        .engine
        .search("ephemeral", &request("snowfall", 5))
        .await
        .expect("can search");
    assert_eq!(hits.len(), 1);

    store
        .registry
        .delete("ephemeral")
        .await
        .expect("can delete collection");

    let err = store
        .engine
        .search("ephemeral", &request("snowfall", 5))
        .await
        .expect_err("search should fail after delete");
    assert!(matches!(err, StoreError::CollectionNotFound(_)));

    let err = store
        .ingestor
        .get_documents("ephemeral", 0, 10)
        .await
        .expect_err("lookup should fail after delete");
    assert!(matches!(err, StoreError::CollectionNotFound(_)));
}

#[tokio::test]
async fn upsert_then_search_reflects_latest_content() {
    let store = create_test_store().await.expect("can create test store");

    store
        .registry
        .create(named("docs"))
        .await
        .expect("can create collection");

    store
        .ingestor
        .ingest_batch("docs", vec![doc("a", "topic glaciers")])
        .await
        .expect("can ingest");
    store
        .ingestor
        .ingest_batch("docs", vec![doc("a", "topic volcanoes")])
        .await
        .expect("can re-ingest");

    let stale = store
        .engine
        .search("docs", &request("glaciers", 5))
        .await
        .expect("can search");
    assert!(stale.is_empty());

    let fresh = store
        .engine
        .search("docs", &request("volcanoes", 5))
        .await
        .expect("can search");
    assert_eq!(fresh.len(), 1);
}

#[tokio::test]
async fn duplicate_collection_creation_is_rejected() {
    let store = create_test_store().await.expect("can create test store");

    store
        .registry
        .create(named("x"))
        .await
        .expect("can create collection");

    let err = store
        .registry
        .create(named("x"))
        .await
        .expect_err("second create should fail");
    assert!(matches!(err, StoreError::DuplicateCollection(_)));

    let page = store.registry.list(0, 10).await.expect("can list");
    assert_eq!(page.total, 1);
}
