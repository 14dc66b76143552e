use crate::session::{SessionError, SessionStore};
use sitewright_llm_sdk::types::ChatMessage;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

struct Entry {
    history: Vec<ChatMessage>,
    touched: u64,
}

#[derive(Default)]
struct Inner {
    sessions: HashMap<String, Entry>,
    clock: u64,
}

/// Process-local session map.
///
/// Unbounded unless `with_max_sessions` is used, in which case storing a new
/// session at capacity evicts the least recently updated one.
#[derive(Clone, Default)]
pub struct InMemorySessionStore {
    inner: Arc<Mutex<Inner>>,
    max_sessions: Option<usize>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_sessions(mut self, max_sessions: usize) -> Self {
        self.max_sessions = Some(max_sessions.max(1));
        self
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>, SessionError> {
        self.inner
            .lock()
            .map_err(|e| SessionError::OperationFailed(e.to_string()))
    }
}

#[async_trait::async_trait]
impl SessionStore for InMemorySessionStore {
    async fn get(&self, session_id: &str) -> Result<Option<Vec<ChatMessage>>, SessionError> {
        Ok(self
            .lock()?
            .sessions
            .get(session_id)
            .map(|entry| entry.history.clone()))
    }

    async fn set(&self, session_id: &str, history: Vec<ChatMessage>) -> Result<(), SessionError> {
        let mut inner = self.lock()?;
        inner.clock += 1;
        let touched = inner.clock;

        if let Some(max) = self.max_sessions {
            if !inner.sessions.contains_key(session_id) && inner.sessions.len() >= max {
                let oldest = inner
                    .sessions
                    .iter()
                    .min_by_key(|(_, entry)| entry.touched)
                    .map(|(id, _)| id.clone());
                if let Some(oldest) = oldest {
                    inner.sessions.remove(&oldest);
                    debug!(session_id = %oldest, "Evicted least recently updated session");
                }
            }
        }

        inner
            .sessions
            .insert(session_id.to_string(), Entry { history, touched });
        Ok(())
    }

    async fn delete(&self, session_id: &str) -> Result<bool, SessionError> {
        Ok(self.lock()?.sessions.remove(session_id).is_some())
    }

    async fn len(&self) -> Result<usize, SessionError> {
        Ok(self.lock()?.sessions.len())
    }
}
