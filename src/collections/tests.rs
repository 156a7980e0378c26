use super::*;
use crate::config::PoolConfig;
use crate::database::models::DistanceFunction;
use tempfile::TempDir;

async fn create_test_registry() -> (TempDir, CollectionRegistry) {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let db_path = temp_dir.path().join("test.db");

    let db = Database::new(&db_path, &PoolConfig::default())
        .await
        .expect("Failed to open database");

    let registry = CollectionRegistry::new(db, CollectionsConfig::default());
    (temp_dir, registry)
}

fn named(name: &str) -> NewCollection {
    NewCollection {
        name: name.to_string(),
        description: None,
        embedding_dimension: None,
        distance_function: None,
    }
}

#[tokio::test]
async fn create_applies_configured_defaults() {
    let (_temp_dir, registry) = create_test_registry().await;

    let collection = registry
        .create(named("docs"))
        .await
        .expect("Failed to create collection");

    assert_eq!(collection.name, "docs");
    assert_eq!(collection.embedding_dimension, 384);
    assert_eq!(collection.distance_function, DistanceFunction::Cosine);
}

#[tokio::test]
async fn create_honors_explicit_settings() {
    let (_temp_dir, registry) = create_test_registry().await;

    let collection = registry
        .create(NewCollection {
            name: "embeddings".to_string(),
            description: Some("dense vectors".to_string()),
            embedding_dimension: Some(768),
            distance_function: Some(DistanceFunction::Dot),
        })
        .await
        .expect("Failed to create collection");

    assert_eq!(collection.embedding_dimension, 768);
    assert_eq!(collection.distance_function, DistanceFunction::Dot);
    assert_eq!(collection.description.as_deref(), Some("dense vectors"));
}

#[tokio::test]
async fn duplicate_create_fails_and_leaves_original_unchanged() {
    let (_temp_dir, registry) = create_test_registry().await;

    let first = registry
        .create(NewCollection {
            name: "x".to_string(),
            description: Some("original".to_string()),
            embedding_dimension: None,
            distance_function: None,
        })
        .await
        .expect("Failed to create collection");

    let err = registry
        .create(NewCollection {
            name: "x".to_string(),
            description: Some("imposter".to_string()),
            embedding_dimension: Some(1024),
            distance_function: None,
        })
        .await
        .expect_err("Second create should fail");
    assert!(matches!(err, StoreError::DuplicateCollection(name) if name == "x"));

    let unchanged = registry.get("x").await.expect("Failed to get collection");
    assert_eq!(unchanged.id, first.id);
    assert_eq!(unchanged.description.as_deref(), Some("original"));
    assert_eq!(unchanged.embedding_dimension, 384);
}

#[tokio::test]
async fn get_unknown_collection_fails() {
    let (_temp_dir, registry) = create_test_registry().await;

    let err = registry
        .get("missing")
        .await
        .expect_err("Get should fail for unknown name");
    assert!(matches!(err, StoreError::CollectionNotFound(name) if name == "missing"));
}

#[tokio::test]
async fn list_clamps_limit_and_reports_total() {
    let (_temp_dir, registry) = create_test_registry().await;

    for name in ["a", "b", "c", "d"] {
        registry
            .create(named(name))
            .await
            .expect("Failed to create collection");
    }

    let page = registry.list(0, 10_000).await.expect("Failed to list");
    assert_eq!(page.total, 4);
    assert_eq!(page.collections.len(), 4);

    let page = registry.list(2, 2).await.expect("Failed to list");
    let names: Vec<&str> = page.collections.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, ["c", "d"]);
    assert_eq!(page.total, 4);

    // Zero limit clamps up to one result.
    let page = registry.list(0, 0).await.expect("Failed to list");
    assert_eq!(page.collections.len(), 1);
}

#[tokio::test]
async fn update_unknown_collection_fails() {
    let (_temp_dir, registry) = create_test_registry().await;

    let err = registry
        .update(
            "missing",
            CollectionUpdate {
                description: Some("text".to_string()),
            },
        )
        .await
        .expect_err("Update should fail for unknown name");
    assert!(matches!(err, StoreError::CollectionNotFound(_)));
}

#[tokio::test]
async fn delete_unknown_collection_fails() {
    let (_temp_dir, registry) = create_test_registry().await;

    let err = registry
        .delete("missing")
        .await
        .expect_err("Delete should fail for unknown name");
    assert!(matches!(err, StoreError::CollectionNotFound(_)));
}

#[tokio::test]
async fn rejects_blank_name() {
    let (_temp_dir, registry) = create_test_registry().await;

    let err = registry
        .create(named("   "))
        .await
        .expect_err("Blank name should be rejected");
    assert!(matches!(err, StoreError::InvalidCollectionName(_)));
}

#[tokio::test]
async fn stats_reports_zero_documents_for_empty_collection() {
    let (_temp_dir, registry) = create_test_registry().await;

    registry
        .create(named("docs"))
        .await
        .expect("Failed to create collection");

    let stats = registry.stats("docs").await.expect("Failed to get stats");
    assert_eq!(stats.collection.name, "docs");
    assert_eq!(stats.document_count, 0);
}
