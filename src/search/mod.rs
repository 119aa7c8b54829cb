//! Search Indexer - debounced substring search over the loaded document
//!
//! Information Hiding:
//! - Timer management hidden behind `search`
//! - Consumers observe progress through a watch channel of `SearchState`
//! - Superseded queries are cancelled and can never publish results

pub mod debounce;

use crate::config::SearchConfig;
use debounce::Debouncer;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::watch;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchState {
    /// Most recent query typed
    pub query: String,
    /// True from the keystroke until its results are published
    pub loading: bool,
    pub results: Vec<String>,
}

pub struct SearchIndexer {
    config: SearchConfig,
    document: Option<Arc<Vec<String>>>,
    debouncer: Debouncer,
    latest: Arc<AtomicU64>,
    state: Arc<watch::Sender<SearchState>>,
}

impl SearchIndexer {
    pub fn new(config: SearchConfig) -> Self {
        let (state, _) = watch::channel(SearchState::default());
        Self {
            debouncer: Debouncer::new(config.debounce()),
            config,
            document: None,
            latest: Arc::new(AtomicU64::new(0)),
            state: Arc::new(state),
        }
    }

    /// Replace the searchable document. Pending searches are dropped.
    pub fn load_document(&mut self, text: &str) {
        self.debouncer.cancel();

        let lines: Vec<String> = text.lines().map(str::to_string).collect();
        tracing::info!("[SearchIndexer] Indexed document with {} lines", lines.len());
        self.document = if lines.is_empty() {
            None
        } else {
            Some(Arc::new(lines))
        };
        self.state.send_replace(SearchState::default());
    }

    pub fn has_document(&self) -> bool {
        self.document.is_some()
    }

    pub fn line_count(&self) -> usize {
        self.document.as_ref().map_or(0, |lines| lines.len())
    }

    /// Debounced search for `query`. Does nothing when no document is loaded.
    pub fn search(&mut self, query: &str) {
        let Some(lines) = self.document.clone() else {
            tracing::debug!("[SearchIndexer] No document loaded, ignoring query");
            return;
        };

        let query = query.to_string();
        self.state.send_modify(|s| {
            s.query = query.clone();
            s.loading = true;
        });

        let state = self.state.clone();
        let latest = self.latest.clone();
        let min_latency = self.config.min_latency();
        let limit = self.config.max_results;

        self.debouncer.call(move |generation| {
            latest.store(generation, Ordering::SeqCst);
            async move {
                // Keeps the busy indicator visible for a minimum time
                tokio::time::sleep(min_latency).await;

                let results = find_matches(&lines, &query, limit);
                if latest.load(Ordering::SeqCst) != generation {
                    return;
                }

                tracing::debug!(
                    "[SearchIndexer] '{}' matched {} lines",
                    query,
                    results.len()
                );
                state.send_modify(|s| {
                    s.results = results;
                    s.loading = false;
                });
            }
        });
    }

    pub fn state(&self) -> SearchState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SearchState> {
        self.state.subscribe()
    }

    /// Wait until no search is in flight and return the published state
    pub async fn settled(&self) -> SearchState {
        let mut rx = self.state.subscribe();
        let settled = rx.wait_for(|s| !s.loading).await;
        match settled {
            Ok(state) => state.clone(),
            Err(_) => self.state(),
        }
    }
}

/// First `limit` lines containing `query`, ignoring case, in document order
pub fn find_matches(lines: &[String], query: &str, limit: usize) -> Vec<String> {
    if query.is_empty() {
        return Vec::new();
    }

    let needle = query.to_lowercase();
    lines
        .iter()
        .filter(|line| line.to_lowercase().contains(&needle))
        .take(limit)
        .cloned()
        .collect()
}
