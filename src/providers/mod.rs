/*!
 * Completion backends.
 *
 * - `openai`: OpenAI-compatible chat-completion API client
 * - `mock`: scripted backend used by tests
 */

use async_trait::async_trait;
use std::fmt::Debug;

use crate::errors::ProviderError;

pub mod mock;
pub mod openai;

pub use openai::{ChatMessage, ChatRequest, ChatResponse, OpenAI, TokenUsage};

/// Common trait for completion backends
///
/// A provider performs exactly one exchange per call. Retrying, backoff and
/// cancellation are the dispatcher's job.
#[async_trait]
pub trait Provider: Send + Sync + Debug {
    /// Send one chat request and return the decoded envelope
    ///
    /// # Arguments
    /// * `request` - The request to complete
    ///
    /// # Returns
    /// * `Result<ChatResponse, ProviderError>` - The response envelope or a transport error
    async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse, ProviderError>;
}
