use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{Conversation, SessionId};

/// Shared, lockable handle to one session's conversation.
pub type ConversationHandle = Arc<Mutex<Conversation>>;

/// Maps UI sessions to their conversation handles.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Handle for `session`, created empty on first use. Marks the session active.
    async fn checkout(&self, session: &SessionId) -> ConversationHandle;

    async fn get(&self, session: &SessionId) -> Option<ConversationHandle>;

    /// Drop sessions untouched for at least `max_idle`. Sessions with an
    /// exchange in flight are kept. Returns the number removed.
    async fn evict_idle(&self, max_idle: Duration) -> usize;

    async fn session_count(&self) -> usize;
}
