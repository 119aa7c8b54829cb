//! Key-Value Storage Abstraction
//!
//! Information Hiding:
//! - Storage backend implementation details hidden behind trait
//! - Conversation log and response cache share one interface, so either can
//!   live in memory, in JSON files or in an SQLite table
//! - Values are opaque strings; callers own their serialization format

use crate::error::Result;
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;

pub mod filesystem;
pub mod memory;
pub mod sqlite;

pub use filesystem::FileSystemStore;
pub use memory::InMemoryStore;
pub use sqlite::SqliteStore;

/// Trait defining durable key-value storage
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`
    /// Returns `None` if the key doesn't exist
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Insert or replace the value stored under `key`
    async fn put(&self, key: &str, value: &str) -> Result<()>;

    /// Remove `key`; removing a missing key is not an error
    async fn delete(&self, key: &str) -> Result<()>;

    /// List all stored keys
    async fn keys(&self) -> Result<Vec<String>>;
}

/// Backend selection for the persisted state
#[derive(Debug, Clone)]
pub enum StorageType {
    /// In-memory storage (lost on process termination)
    Memory,
    /// JSON file per key under the given directory
    FileSystem(PathBuf),
    /// Conversations in an SQLite database, cache as JSON files, under the given directory
    Sqlite(PathBuf),
}

/// The two stores the assistant persists into
pub struct Stores {
    pub conversations: Arc<dyn KeyValueStore>,
    pub cache: Arc<dyn KeyValueStore>,
}

impl StorageType {
    /// Open the conversation and cache stores for this backend
    pub async fn open(&self) -> Result<Stores> {
        let stores = match self {
            StorageType::Memory => Stores {
                conversations: Arc::new(InMemoryStore::new()),
                cache: Arc::new(InMemoryStore::new()),
            },
            StorageType::FileSystem(dir) => Stores {
                conversations: Arc::new(FileSystemStore::new(dir.join("conversations")).await?),
                cache: Arc::new(FileSystemStore::new(dir.join("cache")).await?),
            },
            StorageType::Sqlite(dir) => {
                tokio::fs::create_dir_all(dir).await?;
                Stores {
                    conversations: Arc::new(SqliteStore::open(
                        dir.join("conversations.db"),
                        "conversations",
                    )?),
                    cache: Arc::new(FileSystemStore::new(dir.join("cache")).await?),
                }
            }
        };

        tracing::info!("[Storage] Opened {:?} backend", self);
        Ok(stores)
    }
}
