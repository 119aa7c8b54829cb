//! Assistant - the send path tying cache, conversation log and search together
//!
//! Information Hiding:
//! - Cache key derivation and short-circuiting hidden behind `send`
//! - Storage backends chosen from settings, invisible to callers
//! - Remote failures turned into `Error:` lines instead of errors

use crate::cache::{ResponseCache, UsageTotals};
use crate::config::{Settings, UsageConfig};
use crate::conversation::{ChatLine, ConversationStore};
use crate::core::{CacheKey, ChatBackend, ChatRequest, HttpChatClient, TokenUsage};
use crate::search::{SearchIndexer, SearchState};
use anyhow::Result;
use std::sync::Arc;

/// Result of one submitted question
#[derive(Debug, Clone, PartialEq)]
pub enum SendOutcome {
    Answered {
        reply: String,
        /// Served from the response cache without a remote call
        cached: bool,
        /// Tokens billed for this exchange; `None` for cached or unreported usage
        tokens: Option<TokenUsage>,
    },
    Failed {
        message: String,
    },
}

struct Document {
    name: String,
    text: String,
}

pub struct Assistant {
    conversation: ConversationStore,
    cache: ResponseCache,
    search: SearchIndexer,
    backend: Arc<dyn ChatBackend>,
    document: Option<Document>,
}

impl Assistant {
    pub fn new(
        conversation: ConversationStore,
        cache: ResponseCache,
        search: SearchIndexer,
        backend: Arc<dyn ChatBackend>,
    ) -> Self {
        Self {
            conversation,
            cache,
            search,
            backend,
            document: None,
        }
    }

    /// Build an assistant from settings and start loading the stored history
    pub async fn open(settings: &Settings) -> Result<Self> {
        let stores = settings.storage_type().open().await?;
        let backend: Arc<dyn ChatBackend> = Arc::new(HttpChatClient::new(&settings.remote)?);

        let conversation = ConversationStore::new(stores.conversations);
        let cache = ResponseCache::open(stores.cache, settings.cache.enabled, settings.usage).await;
        let search = SearchIndexer::new(settings.search.clone());

        // History loads in the background; appends made meanwhile are merged after it
        let loader = conversation.clone();
        tokio::spawn(async move {
            loader.load().await;
        });

        Ok(Self::new(conversation, cache, search, backend))
    }

    /// Answer `question`, from the cache when possible, and log the exchange
    pub async fn send(&mut self, question: &str) -> SendOutcome {
        let context = self
            .document
            .as_ref()
            .map(|d| d.text.as_str())
            .unwrap_or("");
        let key = CacheKey::encode(question, context);

        if let Some(entry) = self.cache.lookup(&key).await {
            tracing::info!("[Assistant] Answered from cache");
            self.conversation
                .append([ChatLine::question(question), ChatLine::answer(&entry.reply)])
                .await;
            return SendOutcome::Answered {
                reply: entry.reply,
                cached: true,
                tokens: None,
            };
        }

        let result = match ChatRequest::new(question, Some(context)) {
            Ok(request) => self.backend.ask(&request).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(reply) => {
                self.cache
                    .store(&key, &reply.reply, reply.tokens.unwrap_or_default())
                    .await;
                if let Some(tokens) = reply.tokens {
                    self.cache.record_usage(tokens).await;
                }

                self.conversation
                    .append([ChatLine::question(question), ChatLine::answer(&reply.reply)])
                    .await;

                SendOutcome::Answered {
                    reply: reply.reply,
                    cached: false,
                    tokens: reply.tokens,
                }
            }
            Err(e) => {
                tracing::error!("[Assistant] Chat request failed: {}", e);
                let message = e.to_string();
                self.conversation
                    .append([ChatLine::question(question), ChatLine::error(&message)])
                    .await;
                SendOutcome::Failed { message }
            }
        }
    }

    /// Use `text` as request context and as the search document
    pub async fn load_document(&mut self, name: &str, text: String) {
        self.search.load_document(&text);
        let lines = self.search.line_count();

        self.document = Some(Document {
            name: name.to_string(),
            text,
        });

        self.conversation
            .append([ChatLine::system(format!(
                "Loaded document '{}' ({} lines)",
                name, lines
            ))])
            .await;
    }

    pub fn document_name(&self) -> Option<&str> {
        self.document.as_ref().map(|d| d.name.as_str())
    }

    /// Full conversation log, waiting for the initial load if needed
    pub async fn history(&self) -> Vec<ChatLine> {
        self.conversation.load().await
    }

    /// Wait for the initial history load, which writes any lines held back meanwhile
    pub async fn flush(&self) {
        self.conversation.load().await;
    }

    pub async fn clear_history(&self) {
        self.conversation.clear().await;
    }

    /// Drop every cached reply and reset usage totals
    pub async fn clear_cache(&mut self) {
        self.cache.clear().await;
    }

    pub fn set_cache_enabled(&mut self, enabled: bool) {
        self.cache.set_enabled(enabled);
    }

    pub fn cache_enabled(&self) -> bool {
        self.cache.is_enabled()
    }

    pub async fn cached_entries(&self) -> usize {
        self.cache.len().await
    }

    pub fn usage(&self) -> UsageTotals {
        self.cache.usage()
    }

    pub fn usage_rates(&self) -> UsageConfig {
        self.cache.rates()
    }

    /// Debounced search over the loaded document
    pub fn search(&mut self, query: &str) {
        self.search.search(query);
    }

    pub fn has_document(&self) -> bool {
        self.search.has_document()
    }

    pub async fn search_results(&self) -> SearchState {
        self.search.settled().await
    }
}
