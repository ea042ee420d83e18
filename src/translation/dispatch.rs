/*!
 * Sequential dispatch of batches to a completion backend.
 *
 * One request per batch, in order, each with its own retry budget. Transient
 * provider failures back off exponentially; a reply that arrives but cannot be
 * decoded fails the file immediately. Both the request and the backoff wait
 * race against a cancellation token.
 */

use log::{debug, warn};
use serde_json::Value;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::errors::{ProviderError, TranslationError};
use crate::providers::{ChatRequest, ChatResponse, Provider, TokenUsage};
use crate::translation::batch::Batch;
use crate::translation::prompts::system_prompt;

/// Default number of attempts per batch
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Default delay before the second attempt
pub const DEFAULT_BACKOFF_BASE: Duration = Duration::from_secs(1);

/// Default cap on tokens generated per reply
pub const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 2731;

/// How often and how patiently a batch is retried
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff_base: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff_base: DEFAULT_BACKOFF_BASE,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, backoff_base: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff_base,
        }
    }

    /// Delay to wait after failed attempt `attempt` (1-based): base × 2^(attempt-1)
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(20);
        self.backoff_base.saturating_mul(1u32 << exponent)
    }
}

/// One key/text pair as returned by the backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslatedPair {
    pub key: String,
    pub text: String,
}

/// Decoded reply for one batch, in the order the backend returned it
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TranslatedBatch {
    pairs: Vec<TranslatedPair>,
}

impl TranslatedBatch {
    pub fn new(pairs: Vec<TranslatedPair>) -> Self {
        Self { pairs }
    }

    /// Decode reply content into ordered pairs.
    ///
    /// Accepts a JSON array of objects (every pair of every object, in order)
    /// or a single object. A surrounding Markdown code fence is ignored.
    pub fn decode(content: &str) -> Result<Self, String> {
        let body = strip_code_fence(content);
        let value: Value =
            serde_json::from_str(body).map_err(|e| format!("reply is not JSON: {}", e))?;

        let mut pairs = Vec::new();
        match value {
            Value::Array(items) => {
                for (position, item) in items.into_iter().enumerate() {
                    match item {
                        Value::Object(map) => collect_pairs(map, &mut pairs)?,
                        _ => return Err(format!("item {} of reply is not an object", position)),
                    }
                }
            }
            Value::Object(map) => collect_pairs(map, &mut pairs)?,
            _ => return Err("reply is neither an array nor an object".to_string()),
        }
        Ok(Self { pairs })
    }

    pub fn pairs(&self) -> &[TranslatedPair] {
        &self.pairs
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

fn collect_pairs(
    map: serde_json::Map<String, Value>,
    pairs: &mut Vec<TranslatedPair>,
) -> Result<(), String> {
    for (key, value) in map {
        let text = match value {
            Value::String(text) => text,
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            _ => return Err(format!("value for key '{}' is not text", key)),
        };
        pairs.push(TranslatedPair { key, text });
    }
    Ok(())
}

fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string (```json) along with the opening line
    let rest = match rest.find('\n') {
        Some(newline) => &rest[newline + 1..],
        None => rest,
    };
    rest.trim_end().strip_suffix("```").unwrap_or(rest).trim()
}

/// Sends batches to a provider one at a time
#[derive(Debug)]
pub struct Dispatcher<P: Provider> {
    provider: P,
    model: String,
    max_output_tokens: u32,
    retry: RetryPolicy,
    cancel: CancellationToken,
}

impl<P: Provider> Dispatcher<P> {
    pub fn new(provider: P, model: impl Into<String>, max_output_tokens: u32) -> Self {
        Self {
            provider,
            model: model.into(),
            max_output_tokens,
            retry: RetryPolicy::default(),
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Translate every batch in order.
    ///
    /// The first batch that cannot be translated fails the whole call; nothing
    /// from earlier batches is returned in that case.
    pub async fn translate_batches(
        &self,
        batches: &[Batch],
        language: &str,
    ) -> Result<Vec<TranslatedBatch>, TranslationError> {
        let system = system_prompt(language);
        let mut translated = Vec::with_capacity(batches.len());
        let mut usage = TokenUsage::default();

        for (index, batch) in batches.iter().enumerate() {
            debug!(
                "Dispatching batch {}/{} ({} entries, ~{} chars)",
                index + 1,
                batches.len(),
                batch.len(),
                batch.footprint()
            );

            let request = ChatRequest::new(self.model.clone(), self.max_output_tokens)
                .system(system.clone())
                .user(batch.to_payload());
            let response = self.send_with_retry(&request, index + 1).await?;
            if let Some(batch_usage) = response.usage {
                usage += batch_usage;
            }

            let decoded = decode_response(&response)?;
            if decoded.len() != batch.len() {
                warn!(
                    "Batch {} returned {} entries for {} sent",
                    index + 1,
                    decoded.len(),
                    batch.len()
                );
            }
            translated.push(decoded);
        }

        debug!(
            "Token usage: {} prompt + {} completion = {} total",
            usage.prompt_tokens, usage.completion_tokens, usage.total_tokens
        );
        Ok(translated)
    }

    async fn send_with_retry(
        &self,
        request: &ChatRequest,
        batch_number: usize,
    ) -> Result<ChatResponse, TranslationError> {
        let mut attempt = 1;
        loop {
            let result = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return Err(TranslationError::Cancelled),
                result = self.provider.complete(request) => result,
            };

            let error = match result {
                Ok(response) => return Ok(response),
                Err(error) => error,
            };
            if !error.is_retryable() {
                return Err(TranslationError::MalformedReply(error.to_string()));
            }
            if attempt >= self.retry.max_attempts {
                return Err(exhausted(attempt, error));
            }

            let delay = self.retry.delay_for(attempt);
            warn!(
                "Batch {} attempt {}/{} failed: {}. Retrying in {:?}",
                batch_number, attempt, self.retry.max_attempts, error, delay
            );
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return Err(TranslationError::Cancelled),
                _ = tokio::time::sleep(delay) => {}
            }
            attempt += 1;
        }
    }
}

fn exhausted(attempts: u32, last_error: ProviderError) -> TranslationError {
    TranslationError::BackendExhausted {
        attempts,
        last_error,
    }
}

fn decode_response(response: &ChatResponse) -> Result<TranslatedBatch, TranslationError> {
    let content = response.first_content().ok_or_else(|| {
        TranslationError::MalformedReply("reply envelope has no message content".to_string())
    })?;
    TranslatedBatch::decode(content).map_err(TranslationError::MalformedReply)
}
