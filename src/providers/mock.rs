/*!
 * Mock provider implementations for testing.
 *
 * The mock reads the batch payload out of the user message and answers the
 * way a chat backend would, so the whole pipeline can run offline:
 * - `MockProvider::working()` - Always succeeds, uppercasing every value
 * - `MockProvider::failing()` - Always fails with a server error
 * - `MockProvider::fail_first(n)` - Fails the first `n` requests, then succeeds
 * - `MockProvider::malformed()` - Succeeds with content that is not a batch
 */

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{Map, Value};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::errors::ProviderError;
use crate::providers::{ChatRequest, ChatResponse, Provider, TokenUsage};

/// Behavior mode for the mock provider
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockBehavior {
    /// Always succeeds with a proper translation
    Working,
    /// Fails the first `failures` requests with a 503, then works
    FailFirst { failures: usize },
    /// Always fails with a 500
    Failing,
    /// Succeeds with content that does not decode as a batch
    Malformed,
    /// Succeeds with an envelope that has no choices
    EmptyEnvelope,
    /// Works but leaves out the last pair of every batch
    DropLast,
    /// Works after a delay (for cancellation testing)
    Slow { delay_ms: u64 },
}

/// Mock provider for testing translation behavior
#[derive(Debug)]
pub struct MockProvider {
    /// Behavior mode
    behavior: MockBehavior,
    /// Request counter, shared between clones
    request_count: Arc<AtomicUsize>,
    /// Requests received, shared between clones
    requests: Arc<Mutex<Vec<ChatRequest>>>,
    /// Applied to every value of a successful reply
    transform: fn(&str) -> String,
}

fn uppercase(text: &str) -> String {
    text.to_uppercase()
}

impl MockProvider {
    /// Create a new mock provider with the specified behavior
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            request_count: Arc::new(AtomicUsize::new(0)),
            requests: Arc::new(Mutex::new(Vec::new())),
            transform: uppercase,
        }
    }

    /// Create a working mock provider that always succeeds
    pub fn working() -> Self {
        Self::new(MockBehavior::Working)
    }

    /// Create a failing mock provider that always errors
    pub fn failing() -> Self {
        Self::new(MockBehavior::Failing)
    }

    /// Create a mock that fails the first `failures` requests
    pub fn fail_first(failures: usize) -> Self {
        Self::new(MockBehavior::FailFirst { failures })
    }

    /// Create a mock that answers with undecodable content
    pub fn malformed() -> Self {
        Self::new(MockBehavior::Malformed)
    }

    /// Create a mock that drops the last translated pair of each batch
    pub fn drop_last() -> Self {
        Self::new(MockBehavior::DropLast)
    }

    /// Create a mock that waits before answering
    pub fn slow(delay_ms: u64) -> Self {
        Self::new(MockBehavior::Slow { delay_ms })
    }

    /// Replace the default uppercasing with a custom value transform
    pub fn with_transform(mut self, transform: fn(&str) -> String) -> Self {
        self.transform = transform;
        self
    }

    /// Number of requests received so far
    pub fn request_count(&self) -> usize {
        self.request_count.load(Ordering::SeqCst)
    }

    /// Copies of the requests received so far
    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().clone()
    }

    /// Answer a request the way a well-behaved backend would
    fn translate(&self, request: &ChatRequest, drop_last: bool) -> Result<ChatResponse, ProviderError> {
        let payload = request
            .content_for("user")
            .ok_or_else(|| ProviderError::RequestFailed("request has no user message".to_string()))?;
        let pairs: Vec<Map<String, Value>> = serde_json::from_str(payload)
            .map_err(|e| ProviderError::RequestFailed(format!("payload is not a batch: {}", e)))?;

        let mut translated: Vec<Value> = pairs
            .into_iter()
            .map(|pair| {
                let object = pair
                    .into_iter()
                    .map(|(key, value)| {
                        let text = value.as_str().map(self.transform).unwrap_or_default();
                        (key, Value::String(text))
                    })
                    .collect();
                Value::Object(object)
            })
            .collect();
        if drop_last {
            translated.pop();
        }

        let usage = TokenUsage {
            prompt_tokens: payload.len() as u64 / 4,
            completion_tokens: payload.len() as u64 / 4,
            total_tokens: payload.len() as u64 / 2,
        };
        Ok(ChatResponse::from_content(Value::Array(translated).to_string()).with_usage(usage))
    }
}

impl Clone for MockProvider {
    fn clone(&self) -> Self {
        Self {
            behavior: self.behavior,
            request_count: Arc::clone(&self.request_count),
            requests: Arc::clone(&self.requests),
            transform: self.transform,
        }
    }
}

#[async_trait]
impl Provider for MockProvider {
    async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse, ProviderError> {
        let count = self.request_count.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().push(request.clone());

        match self.behavior {
            MockBehavior::Working => self.translate(request, false),

            MockBehavior::FailFirst { failures } => {
                if count < failures {
                    Err(ProviderError::ApiError {
                        message: format!("Simulated transient failure (request #{})", count + 1),
                        status_code: 503,
                    })
                } else {
                    self.translate(request, false)
                }
            }

            MockBehavior::Failing => Err(ProviderError::ApiError {
                message: "Simulated provider failure".to_string(),
                status_code: 500,
            }),

            MockBehavior::Malformed => Ok(ChatResponse::from_content("Sorry, I can't help with that.")),

            MockBehavior::EmptyEnvelope => Ok(ChatResponse::default()),

            MockBehavior::DropLast => self.translate(request, true),

            MockBehavior::Slow { delay_ms } => {
                tokio::time::sleep(tokio::time::Duration::from_millis(delay_ms)).await;
                self.translate(request, false)
            }
        }
    }
}
