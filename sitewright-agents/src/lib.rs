//! Conversation orchestration for the website-building assistant.
//!
//! A [`ConversationAgent`] sends the conversation to an [`LlmClient`], runs
//! any requested pipeline tools on a [`ToolServer`], and loops until the model
//! answers in plain text. Histories live in a [`SessionStore`].
//!
//! [`LlmClient`]: sitewright_llm_sdk::client::LlmClient
//! [`ToolServer`]: sitewright_tools::ToolServer

pub mod accumulator;
pub mod error;
pub mod orchestrator;
pub mod prompt;
pub mod session;
pub mod tools;

pub use accumulator::ToolCallAccumulator;
pub use error::AgentError;
pub use orchestrator::{ConversationAgent, SamplingSettings, TurnEvent, DEFAULT_MAX_TOOL_ROUNDS};
pub use prompt::{new_history, SYSTEM_PROMPT};
pub use session::{InMemorySessionStore, SessionError, SessionStore};
pub use tools::{tool_definitions, SiteTool, ToolFailure};
