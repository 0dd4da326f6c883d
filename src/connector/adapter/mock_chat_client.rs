use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::stream::{self, StreamExt};
use tracing::debug;

use crate::application::{ChatClient, ChunkStream};
use crate::domain::{DomainError, Turn};

#[derive(Debug, Clone)]
enum MockReply {
    /// Echo the message back, one word per chunk.
    Echo,
    Script {
        chunks: Vec<String>,
        failure: Option<String>,
    },
    RejectSend(String),
}

/// Offline [`ChatClient`] that replays a fixed script.
///
/// Used by `--mock` runs and by tests. Every call records the history it was
/// sent, so tests can check what the relay forwarded.
pub struct MockChatClient {
    reply: MockReply,
    chunk_delay: Option<Duration>,
    received: Mutex<Vec<(Vec<Turn>, String)>>,
}

impl MockChatClient {
    pub fn new() -> Self {
        Self::with_reply(MockReply::Echo)
    }

    pub fn with_chunks<I, S>(chunks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_reply(MockReply::Script {
            chunks: chunks.into_iter().map(Into::into).collect(),
            failure: None,
        })
    }

    /// Streams `chunks`, then fails mid-stream with `reason`.
    pub fn failing_after<I, S>(chunks: I, reason: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_reply(MockReply::Script {
            chunks: chunks.into_iter().map(Into::into).collect(),
            failure: Some(reason.into()),
        })
    }

    /// Fails before any chunk is streamed.
    pub fn rejecting(reason: impl Into<String>) -> Self {
        Self::with_reply(MockReply::RejectSend(reason.into()))
    }

    pub fn with_chunk_delay(mut self, delay: Duration) -> Self {
        self.chunk_delay = Some(delay);
        self
    }

    fn with_reply(reply: MockReply) -> Self {
        Self {
            reply,
            chunk_delay: None,
            received: Mutex::new(Vec::new()),
        }
    }

    /// `(history, message)` of every call, oldest first.
    pub fn received(&self) -> Vec<(Vec<Turn>, String)> {
        self.received
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.received.lock().map(|calls| calls.len()).unwrap_or(0)
    }

    fn echo_chunks(message: &str) -> Vec<String> {
        let mut chunks = vec!["You said:".to_string()];
        chunks.extend(message.split_whitespace().map(|word| format!(" {word}")));
        chunks
    }
}

impl Default for MockChatClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChatClient for MockChatClient {
    async fn send_message(
        &self,
        history: &[Turn],
        message: &str,
    ) -> Result<ChunkStream, DomainError> {
        if let Ok(mut calls) = self.received.lock() {
            calls.push((history.to_vec(), message.to_string()));
        }

        let items: Vec<Result<String, DomainError>> = match &self.reply {
            MockReply::Echo => Self::echo_chunks(message).into_iter().map(Ok).collect(),
            MockReply::Script { chunks, failure } => {
                let mut items: Vec<_> = chunks.iter().cloned().map(Ok).collect();
                if let Some(reason) = failure {
                    items.push(Err(DomainError::transport(reason.clone())));
                }
                items
            }
            MockReply::RejectSend(reason) => {
                return Err(DomainError::transport(reason.clone()));
            }
        };

        debug!("MockChatClient streaming {} item(s)", items.len());

        let delay = self.chunk_delay;
        let stream = stream::iter(items).then(move |item| async move {
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            item
        });

        Ok(stream.boxed())
    }

    fn model(&self) -> &str {
        "mock"
    }
}
