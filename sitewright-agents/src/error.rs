use sitewright_llm_sdk::error::LlmError;

use crate::session::SessionError;

#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    /// The user message was missing or blank
    #[error("Message is required")]
    EmptyMessage,

    #[error(transparent)]
    Llm(#[from] LlmError),

    /// The provider answered without any message
    #[error("Model returned an empty response")]
    EmptyResponse,

    #[error("Tool loop did not finish within {limit} rounds")]
    ToolLoopLimit { limit: usize },

    #[error(transparent)]
    Session(#[from] SessionError),
}
