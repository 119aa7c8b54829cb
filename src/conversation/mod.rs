//! Conversation Store - durable, ordered chat log
//!
//! Information Hiding:
//! - Whole-sequence persistence hidden behind append/clear
//! - Writes before the initial load are held back, then merged after the
//!   persisted history so an empty state can never overwrite it
//! - Storage errors degrade to an empty history

mod line;

pub use line::ChatLine;

use crate::error::Result;
use crate::storage::KeyValueStore;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Record id of the single active conversation
pub const CONVERSATION_ID: &str = "current";

#[derive(Default)]
struct State {
    lines: Vec<ChatLine>,
    loaded: bool,
}

/// Clones share the same log, so `append` may run while `load` is pending
#[derive(Clone)]
pub struct ConversationStore {
    storage: Arc<dyn KeyValueStore>,
    state: Arc<Mutex<State>>,
}

impl ConversationStore {
    pub fn new(storage: Arc<dyn KeyValueStore>) -> Self {
        Self {
            storage,
            state: Arc::new(Mutex::new(State::default())),
        }
    }

    /// Load the persisted history. Runs once; later calls return the current log.
    pub async fn load(&self) -> Vec<ChatLine> {
        {
            let state = self.state.lock().await;
            if state.loaded {
                return state.lines.clone();
            }
        }

        let persisted = match self.read().await {
            Ok(lines) => lines,
            Err(e) => {
                tracing::warn!("[ConversationStore] Starting with empty history: {}", e);
                Vec::new()
            }
        };

        let mut state = self.state.lock().await;
        if state.loaded {
            return state.lines.clone();
        }

        let pending = std::mem::take(&mut state.lines);
        let has_pending = !pending.is_empty();
        state.lines = persisted;
        state.lines.extend(pending);
        state.loaded = true;

        if has_pending {
            self.persist(&state.lines).await;
        }

        tracing::info!("[ConversationStore] Loaded {} lines", state.lines.len());
        state.lines.clone()
    }

    /// Append lines and persist the whole log (deferred until loaded)
    pub async fn append(&self, lines: impl IntoIterator<Item = ChatLine>) {
        let mut state = self.state.lock().await;
        state.lines.extend(lines);

        if !state.loaded {
            tracing::debug!(
                "[ConversationStore] History not loaded yet, holding {} lines",
                state.lines.len()
            );
            return;
        }

        // Lock stays held across the write so successive appends land in call order
        self.persist(&state.lines).await;
    }

    /// Empty the log in memory and in storage
    pub async fn clear(&self) {
        let mut state = self.state.lock().await;
        state.lines.clear();
        state.loaded = true;

        if let Err(e) = self.storage.delete(CONVERSATION_ID).await {
            tracing::warn!("[ConversationStore] Failed to delete history: {}", e);
        }
        tracing::info!("[ConversationStore] Cleared history");
    }

    pub async fn lines(&self) -> Vec<ChatLine> {
        self.state.lock().await.lines.clone()
    }

    pub async fn is_loaded(&self) -> bool {
        self.state.lock().await.loaded
    }

    async fn read(&self) -> Result<Vec<ChatLine>> {
        match self.storage.get(CONVERSATION_ID).await? {
            Some(json) => Ok(serde_json::from_str(&json)?),
            None => Ok(Vec::new()),
        }
    }

    async fn persist(&self, lines: &[ChatLine]) {
        let result = match serde_json::to_string(lines) {
            Ok(json) => self.storage.put(CONVERSATION_ID, &json).await,
            Err(e) => Err(e.into()),
        };

        match result {
            Ok(()) => tracing::debug!("[ConversationStore] Persisted {} lines", lines.len()),
            Err(e) => tracing::warn!("[ConversationStore] Failed to persist history: {}", e),
        }
    }
}
