use async_trait::async_trait;
use futures_util::stream::BoxStream;

use crate::domain::{DomainError, Turn};

/// Incremental reply text, in arrival order. An `Err` item ends the reply.
pub type ChunkStream = BoxStream<'static, Result<String, DomainError>>;

/// A remote conversational model that streams its replies.
///
/// Implementors own transport, serialization and vendor-specific details.
/// The conversation history itself lives in a [`super::ConversationStore`];
/// clients are stateless between calls.
#[async_trait]
pub trait ChatClient: Send + Sync {
    /// Send `message` as the next user turn after `history` and return the
    /// model's reply as a stream of text chunks.
    ///
    /// Fails before streaming when the request cannot be sent or is rejected;
    /// failures during streaming surface as an `Err` item.
    async fn send_message(&self, history: &[Turn], message: &str)
        -> Result<ChunkStream, DomainError>;

    fn model(&self) -> &str;
}
