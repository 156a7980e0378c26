
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sqlx::types::Json;
use sqlx::{FromRow, Type};

/// Free-form document metadata, opaque to the store.
pub type Metadata = Map<String, Value>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Collection {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub embedding_dimension: i64,
    pub distance_function: DistanceFunction,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[sqlx(type_name = "TEXT", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum DistanceFunction {
    Cosine,
    Euclidean,
    Dot,
}

impl std::fmt::Display for DistanceFunction {
    #[inline]
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match *self {
            DistanceFunction::Cosine => write!(f, "cosine"),
            DistanceFunction::Euclidean => write!(f, "euclidean"),
            DistanceFunction::Dot => write!(f, "dot"),
        }
    }
}

impl std::str::FromStr for DistanceFunction {
    type Err = String;

    #[inline]
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cosine" => Ok(DistanceFunction::Cosine),
            "euclidean" => Ok(DistanceFunction::Euclidean),
            "dot" => Ok(DistanceFunction::Dot),
            other => Err(format!(
                "unknown distance function '{other}' (expected cosine, euclidean, or dot)"
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCollection {
    pub name: String,
    pub description: Option<String>,
    pub embedding_dimension: Option<u32>,
    pub distance_function: Option<DistanceFunction>,
}

/// Partial update of a collection's mutable fields. Name is immutable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct CollectionUpdate {
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionPage {
    pub collections: Vec<Collection>,
    pub total: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionStats {
    pub collection: Collection,
    pub document_count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Document {
    pub id: i64,
    pub collection_id: i64,
    pub document_id: String,
    pub content: String,
    pub title: Option<String>,
    pub source: Option<String>,
    pub doc_type: Option<String>,
    pub metadata: Json<Metadata>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Caller-facing document submitted for ingestion.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewDocument {
    pub document_id: Option<String>,
    pub content: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub doc_type: Option<String>,
    #[serde(default)]
    pub metadata: Metadata,
}

/// One ranked search result. Derived per query, never persisted.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SearchHit {
    pub document_id: String,
    pub content: String,
    pub excerpt: String,
    pub score: f64,
    pub title: Option<String>,
    pub doc_type: Option<String>,
    pub metadata: Json<Metadata>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}
