use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use sitewright_agents::{ConversationAgent, SessionStore};
use sitewright_tools::ToolServer;
use tokio::sync::OwnedMutexGuard;

use crate::error::ApiError;

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    /// `None` when no API key is configured
    pub agent: Option<Arc<ConversationAgent>>,
    pub tools: Arc<dyn ToolServer>,
    pub sessions: Arc<dyn SessionStore>,
    pub locks: SessionLocks,
}

impl AppState {
    pub fn new(
        agent: Option<Arc<ConversationAgent>>,
        tools: Arc<dyn ToolServer>,
        sessions: Arc<dyn SessionStore>,
    ) -> Self {
        Self {
            agent,
            tools,
            sessions,
            locks: SessionLocks::default(),
        }
    }

    pub fn agent(&self) -> Result<Arc<ConversationAgent>, ApiError> {
        self.agent.clone().ok_or(ApiError::LlmNotConfigured)
    }

    pub fn llm_configured(&self) -> bool {
        self.agent.is_some()
    }
}

/// One async lock per session id, held for a whole turn so two requests on
/// the same session run one after the other.
#[derive(Clone, Default)]
pub struct SessionLocks {
    locks: Arc<Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>>,
}

impl SessionLocks {
    pub async fn acquire(&self, session_id: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
            // Entries only referenced by the map are idle
            locks.retain(|id, lock| id == session_id || Arc::strong_count(lock) > 1);
            locks
                .entry(session_id.to_string())
                .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }

    pub fn tracked(&self) -> usize {
        self.locks.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}
