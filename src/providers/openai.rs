use std::time::Duration;

use async_trait::async_trait;
use log::{debug, error};
use reqwest::{Client, header};
use serde::{Deserialize, Serialize};

use crate::errors::ProviderError;
use crate::providers::Provider;

/// Default base URL of the public API
pub const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1";

/// OpenAI client for chat completions
#[derive(Debug)]
pub struct OpenAI {
    /// HTTP client for API requests, pooled across batches and files
    client: Client,
    /// API key for authentication
    api_key: String,
    /// API base URL
    endpoint: String,
}

/// Chat completion request
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ChatRequest {
    /// The model to use
    pub model: String,

    /// The messages for the conversation
    pub messages: Vec<ChatMessage>,

    /// Maximum number of tokens to generate
    pub max_tokens: u32,

    /// Temperature for generation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

/// One chat message
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatMessage {
    /// Role of the message sender (system, user, assistant)
    pub role: String,

    /// Content of the message
    pub content: String,
}

/// Token usage information
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
pub struct TokenUsage {
    #[serde(default)]
    pub prompt_tokens: u64,
    #[serde(default)]
    pub completion_tokens: u64,
    #[serde(default)]
    pub total_tokens: u64,
}

impl std::ops::AddAssign for TokenUsage {
    fn add_assign(&mut self, other: Self) {
        self.prompt_tokens += other.prompt_tokens;
        self.completion_tokens += other.completion_tokens;
        self.total_tokens += other.total_tokens;
    }
}

/// Chat completion response envelope.
///
/// Every level is optional so that a reply with a missing field still
/// deserializes and can be reported as malformed content.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct ChatResponse {
    #[serde(default)]
    pub choices: Option<Vec<ChatChoice>>,
    #[serde(default)]
    pub usage: Option<TokenUsage>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct ChatChoice {
    #[serde(default)]
    pub message: Option<ChatReplyMessage>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct ChatReplyMessage {
    #[serde(default)]
    pub content: Option<String>,
}

impl ChatRequest {
    /// Create a new chat request
    pub fn new(model: impl Into<String>, max_tokens: u32) -> Self {
        Self {
            model: model.into(),
            messages: Vec::new(),
            max_tokens,
            temperature: None,
        }
    }

    /// Add a message to the request
    pub fn add_message(mut self, role: impl Into<String>, content: impl Into<String>) -> Self {
        self.messages.push(ChatMessage {
            role: role.into(),
            content: content.into(),
        });
        self
    }

    /// Set the system prompt
    pub fn system(self, content: impl Into<String>) -> Self {
        self.add_message("system", content)
    }

    /// Add a user message
    pub fn user(self, content: impl Into<String>) -> Self {
        self.add_message("user", content)
    }

    /// Set the temperature
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Content of the first message with the given role
    pub fn content_for(&self, role: &str) -> Option<&str> {
        self.messages
            .iter()
            .find(|m| m.role == role)
            .map(|m| m.content.as_str())
    }
}

impl ChatResponse {
    /// Build a response carrying a single choice with `content`
    pub fn from_content(content: impl Into<String>) -> Self {
        Self {
            choices: Some(vec![ChatChoice {
                message: Some(ChatReplyMessage {
                    content: Some(content.into()),
                }),
            }]),
            usage: None,
        }
    }

    /// Attach token usage
    pub fn with_usage(mut self, usage: TokenUsage) -> Self {
        self.usage = Some(usage);
        self
    }

    /// Text of the first choice, if every level of the envelope is present
    pub fn first_content(&self) -> Option<&str> {
        self.choices
            .as_ref()?
            .first()?
            .message
            .as_ref()?
            .content
            .as_deref()
    }
}

impl OpenAI {
    /// Create a new OpenAI client
    pub fn new(api_key: impl Into<String>, endpoint: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client: Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_default(),
            api_key: api_key.into(),
            endpoint: endpoint.into(),
        }
    }

    /// Full URL of the chat completions resource
    pub fn completions_url(&self) -> String {
        let base = if self.endpoint.trim().is_empty() {
            DEFAULT_ENDPOINT
        } else {
            self.endpoint.trim()
        };
        format!("{}/chat/completions", base.trim_end_matches('/'))
    }
}

#[async_trait]
impl Provider for OpenAI {
    async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse, ProviderError> {
        let api_url = self.completions_url();
        debug!("POST {} (model {})", api_url, request.model);

        let response = self
            .client
            .post(&api_url)
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::AUTHORIZATION, format!("Bearer {}", self.api_key))
            .json(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() || e.is_timeout() {
                    ProviderError::ConnectionError(e.to_string())
                } else {
                    ProviderError::RequestFailed(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to get error response text".to_string());
            error!("OpenAI API error ({}): {}", status, error_text);
            return Err(ProviderError::ApiError {
                status_code: status.as_u16(),
                message: error_text,
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| ProviderError::ConnectionError(format!("Failed to read response body: {}", e)))?;

        serde_json::from_str::<ChatResponse>(&body).map_err(|e| ProviderError::ParseError(e.to_string()))
    }
}
