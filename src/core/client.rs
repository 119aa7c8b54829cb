use crate::config::RemoteConfig;
use crate::error::{ChatError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

/// Token counts reported for one completion
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenUsage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
}

impl TokenUsage {
    pub fn new(prompt_tokens: u64, completion_tokens: u64) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens.saturating_add(completion_tokens),
        }
    }
}

/// Validated body for `POST /api/chat`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatRequest {
    question: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    context: Option<String>,
}

impl ChatRequest {
    /// Rejects blank questions; an empty context is sent as absent
    pub fn new(question: impl Into<String>, context: Option<&str>) -> Result<Self> {
        let question = question.into();
        if question.trim().is_empty() {
            return Err(ChatError::InvalidRequest(
                "question must not be empty".to_string(),
            ));
        }

        Ok(Self {
            question,
            context: context.filter(|c| !c.is_empty()).map(str::to_string),
        })
    }

    pub fn question(&self) -> &str {
        &self.question
    }

    pub fn context(&self) -> Option<&str> {
        self.context.as_deref()
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ChatReply {
    pub reply: String,
    #[serde(default)]
    pub tokens: Option<TokenUsage>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

/// The remote question-answering service
#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn ask(&self, request: &ChatRequest) -> Result<ChatReply>;
}

pub struct HttpChatClient {
    client: Client,
    endpoint: String,
}

impl HttpChatClient {
    pub fn new(config: &RemoteConfig) -> Result<Self> {
        let client = Client::builder().timeout(config.timeout()).build()?;
        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl ChatBackend for HttpChatClient {
    async fn ask(&self, request: &ChatRequest) -> Result<ChatReply> {
        let url = format!("{}/api/chat", self.endpoint);
        tracing::debug!("[HttpChatClient] POST {}", url);

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("[HttpChatClient] HTTP request failed: {}", e);
                ChatError::RemoteCallFailed(format!("HTTP request failed: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorBody>(&text)
                .map(|body| body.error)
                .unwrap_or_else(|_| {
                    if text.is_empty() {
                        "Unknown error".to_string()
                    } else {
                        text
                    }
                });
            tracing::error!(
                "[HttpChatClient] Service returned error status {}: {}",
                status,
                message
            );
            return Err(ChatError::RemoteCallFailed(format!(
                "service error {}: {}",
                status.as_u16(),
                message
            )));
        }

        response.json::<ChatReply>().await.map_err(|e| {
            tracing::error!("[HttpChatClient] Failed to decode response body: {}", e);
            ChatError::RemoteCallFailed(format!("response decode error: {}", e))
        })
    }
}
