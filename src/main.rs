use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use docstore::commands::{
    create_collection, delete_collection, describe_collection, ingest_batch, list_collections,
    search, show_status, update_collection,
};
use docstore::database::models::DistanceFunction;

#[derive(Parser)]
#[command(name = "docstore")]
#[command(about = "Full-text document indexing and retrieval for RAG pipelines")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new collection
    Create {
        /// Collection name (unique, immutable)
        name: String,
        /// Optional description
        #[arg(long)]
        description: Option<String>,
        /// Embedding dimensionality for the collection
        #[arg(long)]
        dimension: Option<u32>,
        /// Distance function: cosine, euclidean, or dot
        #[arg(long)]
        distance: Option<DistanceFunction>,
    },
    /// List collections in creation order
    List {
        #[arg(long, default_value_t = 0)]
        offset: i64,
        #[arg(long, default_value_t = 20)]
        limit: i64,
    },
    /// Show a collection and its document count
    Describe {
        /// Collection name
        name: String,
    },
    /// Update a collection's description
    Update {
        /// Collection name
        name: String,
        /// New description
        #[arg(long)]
        description: String,
    },
    /// Delete a collection and all of its documents
    Delete {
        /// Collection name
        name: String,
    },
    /// Ingest a batch of documents from a JSON file
    Ingest {
        /// Target collection name
        collection: String,
        /// Path to a JSON array of documents
        file: PathBuf,
    },
    /// Search a collection with a ranked full-text query
    Search {
        /// Collection name
        collection: String,
        /// Free-text query
        query: String,
        /// Maximum number of results
        #[arg(long)]
        limit: Option<i64>,
        /// Restrict results to one document type
        #[arg(long)]
        doc_type: Option<String>,
    },
    /// Show backend status
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Create {
            name,
            description,
            dimension,
            distance,
        } => {
            create_collection(name, description, dimension, distance).await?;
        }
        Commands::List { offset, limit } => {
            list_collections(offset, limit).await?;
        }
        Commands::Describe { name } => {
            describe_collection(name).await?;
        }
        Commands::Update { name, description } => {
            update_collection(name, description).await?;
        }
        Commands::Delete { name } => {
            delete_collection(name).await?;
        }
        Commands::Ingest { collection, file } => {
            ingest_batch(collection, &file).await?;
        }
        Commands::Search {
            collection,
            query,
            limit,
            doc_type,
        } => {
            search(collection, query, limit, doc_type).await?;
        }
        Commands::Status => {
            show_status().await?;
        }
    }

    Ok(())
}
