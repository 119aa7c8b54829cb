pub mod client;
pub mod key;

pub use client::{ChatBackend, ChatReply, ChatRequest, HttpChatClient, TokenUsage};
pub use key::CacheKey;
