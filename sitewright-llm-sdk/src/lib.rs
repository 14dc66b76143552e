//! # Sitewright LLM SDK
//!
//! A small client for OpenAI-compatible chat-completions APIs, used against
//! OpenRouter. Supports tool calling and SSE streaming.
//!
//! ## Example
//!
//! ```rust,no_run
//! use sitewright_llm_sdk::client::LlmClient;
//! use sitewright_llm_sdk::openrouter::OpenRouterClient;
//! use sitewright_llm_sdk::types::{ChatCompletionRequest, ChatMessage};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = OpenRouterClient::new("your-openrouter-key")?;
//!     let request = ChatCompletionRequest::new("", vec![ChatMessage::user("Hello!")]);
//!     let response = client.complete(request).await?;
//!
//!     if let Some(message) = response.first_message() {
//!         println!("Response: {}", message.content.as_deref().unwrap_or_default());
//!     }
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod error;
pub mod models;
pub mod openrouter;
pub mod providers;
pub mod tools;
pub mod types;

pub use client::{ChunkStream, LlmClient};
pub use error::LlmError;
pub use tools::{Tool, ToolCall, ToolChoice, ToolResult};
pub use types::{ChatCompletionChunk, ChatCompletionRequest, ChatCompletionResponse, ChatMessage, Role};
