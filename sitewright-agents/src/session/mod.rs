use async_trait::async_trait;
use sitewright_llm_sdk::types::ChatMessage;

mod memory;

pub use memory::InMemorySessionStore;

use crate::prompt::new_history;

/// Conversation histories keyed by session id
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn get(&self, session_id: &str) -> Result<Option<Vec<ChatMessage>>, SessionError>;

    /// Replace the stored history, creating the session if needed
    async fn set(&self, session_id: &str, history: Vec<ChatMessage>) -> Result<(), SessionError>;

    /// Returns whether a session was removed
    async fn delete(&self, session_id: &str) -> Result<bool, SessionError>;

    async fn len(&self) -> Result<usize, SessionError>;

    async fn is_empty(&self) -> Result<bool, SessionError> {
        Ok(self.len().await? == 0)
    }

    /// The stored history, or a new one seeded with the system prompt.
    /// A new history is not stored until `set` is called.
    async fn get_or_create(&self, session_id: &str) -> Result<Vec<ChatMessage>, SessionError> {
        Ok(self.get(session_id).await?.unwrap_or_else(new_history))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Session store operation failed: {0}")]
    OperationFailed(String),
}
