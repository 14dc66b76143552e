use crate::{
    error::LlmError,
    types::{ChatCompletionChunk, ChatCompletionRequest, ChatCompletionResponse},
};
use async_trait::async_trait;
use futures_util::Stream;
use std::pin::Pin;

/// Stream of decoded chat-completion chunks
pub type ChunkStream = Pin<Box<dyn Stream<Item = Result<ChatCompletionChunk, LlmError>> + Send>>;

/// Core trait for LLM clients
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Complete a request (non-streaming)
    async fn complete(
        &self,
        request: ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse, LlmError>;

    /// Stream completion (optional, returns error if not supported)
    async fn stream_complete(&self, _request: ChatCompletionRequest) -> Result<ChunkStream, LlmError> {
        Err(LlmError::not_supported("Streaming not supported"))
    }

    /// Get provider name (e.g., "openrouter")
    fn provider_name(&self) -> &str;

    /// Get model name (e.g., "google/gemini-2.0-flash-exp:free")
    fn model_name(&self) -> &str;

    /// Check if streaming is supported
    fn supports_streaming(&self) -> bool {
        false
    }
}
