use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

use crate::application::{ConversationHandle, ConversationStore};
use crate::domain::{Conversation, SessionId};

struct SessionEntry {
    handle: ConversationHandle,
    last_active: Instant,
}

/// Process-lifetime session map. Conversations are lost on restart.
pub struct InMemoryConversationStore {
    sessions: Arc<Mutex<HashMap<SessionId, SessionEntry>>>,
}

impl InMemoryConversationStore {
    pub fn new() -> Self {
        Self {
            sessions: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

impl Default for InMemoryConversationStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ConversationStore for InMemoryConversationStore {
    async fn checkout(&self, session: &SessionId) -> ConversationHandle {
        let mut sessions = self.sessions.lock().await;
        let entry = sessions.entry(session.clone()).or_insert_with(|| {
            debug!("Starting conversation for session {}", session);
            SessionEntry {
                handle: Arc::new(Mutex::new(Conversation::new())),
                last_active: Instant::now(),
            }
        });
        entry.last_active = Instant::now();
        Arc::clone(&entry.handle)
    }

    async fn get(&self, session: &SessionId) -> Option<ConversationHandle> {
        let sessions = self.sessions.lock().await;
        sessions.get(session).map(|entry| Arc::clone(&entry.handle))
    }

    async fn evict_idle(&self, max_idle: Duration) -> usize {
        let mut sessions = self.sessions.lock().await;
        let before = sessions.len();
        let now = Instant::now();
        sessions.retain(|id, entry| {
            // A held lock means an exchange is still streaming into this handle.
            let in_flight = entry.handle.try_lock().is_err();
            let keep = in_flight || now.duration_since(entry.last_active) < max_idle;
            if !keep {
                debug!("Evicting idle session {}", id);
            }
            keep
        });
        before - sessions.len()
    }

    async fn session_count(&self) -> usize {
        self.sessions.lock().await.len()
    }
}
