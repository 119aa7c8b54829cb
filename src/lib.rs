//! askdoc - document-aware chat assistant
//!
//! Keeps a durable conversation log, answers repeated questions from a
//! content-addressed response cache, tracks token usage and cost, and offers
//! a debounced search over the loaded document. The remote question-answering
//! service is reached through the `ChatBackend` trait.

pub mod assistant;
pub mod cache;
pub mod cli;
pub mod config;
pub mod conversation;
pub mod core;
pub mod error;
pub mod search;
pub mod storage;
pub mod utils;

pub use crate::assistant::{Assistant, SendOutcome};
pub use crate::cache::{CacheEntry, ResponseCache, UsageAccumulator, UsageTotals};
pub use crate::config::Settings;
pub use crate::conversation::{ChatLine, ConversationStore};
pub use crate::core::{CacheKey, ChatBackend, ChatReply, ChatRequest, HttpChatClient, TokenUsage};
pub use crate::error::ChatError;
pub use crate::search::{SearchIndexer, SearchState};
pub use crate::storage::{FileSystemStore, InMemoryStore, KeyValueStore, SqliteStore, StorageType};
