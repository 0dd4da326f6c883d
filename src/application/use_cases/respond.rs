use std::sync::Arc;

use futures_util::future;
use futures_util::stream::{self, BoxStream, Stream, StreamExt};
use tokio::sync::OwnedMutexGuard;
use tracing::{debug, info, warn};

use crate::application::{ChatClient, ChunkStream, ConversationStore};
use crate::domain::{Conversation, SessionId, StreamEvent};

/// Shown for every chat attempt while the remote model is unavailable.
pub const MODEL_UNAVAILABLE_MESSAGE: &str =
    "🔴 Error: The AI model could not be loaded. Please check the API key.";

const ERROR_PREFIX: &str = "❌ An error occurred: ";

/// Text shown in place of the reply when an exchange fails.
pub fn format_error(reason: &str) -> String {
    format!("{ERROR_PREFIX}{reason}")
}

/// Relays one user message to the remote model and streams the reply back.
///
/// The server-side [`Conversation`] of the session is the single source of
/// truth for history. The UI's own view of prior turns is accepted but only
/// compared against it, so a desync (e.g. after a restart) shows up in the
/// debug log.
///
/// The session's conversation stays locked for the whole exchange, so two
/// requests in the same session cannot interleave their turns.
pub struct RespondUseCase {
    client: Option<Arc<dyn ChatClient>>,
    store: Arc<dyn ConversationStore>,
}

impl RespondUseCase {
    /// `client` is `None` when the remote model failed to initialise.
    pub fn new(client: Option<Arc<dyn ChatClient>>, store: Arc<dyn ConversationStore>) -> Self {
        Self { client, store }
    }

    pub fn is_model_available(&self) -> bool {
        self.client.is_some()
    }

    /// Cumulative snapshots of the reply: each element is the whole reply
    /// received so far. A failure ends the sequence with one formatted error.
    pub fn execute(
        &self,
        session: &SessionId,
        message: &str,
        history: &[(String, String)],
    ) -> BoxStream<'static, String> {
        if self.client.is_none() {
            warn!("Chat attempt in session {} while the model is unavailable", session);
            return stream::once(future::ready(MODEL_UNAVAILABLE_MESSAGE.to_string())).boxed();
        }

        snapshots(self.events(session, message, history)).boxed()
    }

    /// The reply as explicit events: zero or more `Chunk`s, then exactly one
    /// of `Done` or `Failed`.
    pub fn events(
        &self,
        session: &SessionId,
        message: &str,
        history: &[(String, String)],
    ) -> BoxStream<'static, StreamEvent> {
        let Some(client) = self.client.clone() else {
            return stream::once(future::ready(StreamEvent::Failed(
                MODEL_UNAVAILABLE_MESSAGE.to_string(),
            )))
            .boxed();
        };

        let state = Relay::Idle {
            client,
            store: Arc::clone(&self.store),
            session: session.clone(),
            message: message.to_string(),
            ui_exchanges: history.len(),
        };

        stream::unfold(state, advance).boxed()
    }
}

/// Folds relay events into cumulative reply snapshots.
///
/// Empty chunks produce no snapshot, so a reply without text yields nothing.
pub fn snapshots<S>(events: S) -> impl Stream<Item = String>
where
    S: Stream<Item = StreamEvent>,
{
    events
        .scan((String::new(), false), |state, event| {
            let (reply, failed) = state;
            if *failed {
                return future::ready(None);
            }
            let next = match event {
                StreamEvent::Chunk(text) if text.is_empty() => Some(None),
                StreamEvent::Chunk(text) => {
                    reply.push_str(&text);
                    Some(Some(reply.clone()))
                }
                StreamEvent::Done => None,
                StreamEvent::Failed(reason) => {
                    *failed = true;
                    Some(Some(format_error(&reason)))
                }
            };
            future::ready(next)
        })
        .filter_map(future::ready)
}

enum Relay {
    Idle {
        client: Arc<dyn ChatClient>,
        store: Arc<dyn ConversationStore>,
        session: SessionId,
        message: String,
        ui_exchanges: usize,
    },
    Streaming {
        chunks: ChunkStream,
        conversation: OwnedMutexGuard<Conversation>,
        session: SessionId,
        message: String,
        reply: String,
    },
    Finished,
}

async fn advance(mut state: Relay) -> Option<(StreamEvent, Relay)> {
    loop {
        state = match state {
            Relay::Idle {
                client,
                store,
                session,
                message,
                ui_exchanges,
            } => {
                let conversation = store.checkout(&session).await.lock_owned().await;

                if ui_exchanges != conversation.exchange_count() {
                    debug!(
                        "Session {}: UI reports {} exchanges, server holds {}; using server history",
                        session,
                        ui_exchanges,
                        conversation.exchange_count()
                    );
                }

                debug!(
                    "Sending message to {} (session {}, {} prior turns)",
                    client.model(),
                    session,
                    conversation.len()
                );

                let sent = client.send_message(conversation.turns(), &message).await;
                match sent {
                    Ok(chunks) => Relay::Streaming {
                        chunks,
                        conversation,
                        session,
                        message,
                        reply: String::new(),
                    },
                    Err(e) => {
                        warn!("Session {}: request failed: {}", session, e);
                        return Some((StreamEvent::Failed(e.to_string()), Relay::Finished));
                    }
                }
            }

            Relay::Streaming {
                mut chunks,
                mut conversation,
                session,
                message,
                mut reply,
            } => match chunks.next().await {
                Some(Ok(text)) if text.is_empty() => Relay::Streaming {
                    chunks,
                    conversation,
                    session,
                    message,
                    reply,
                },
                Some(Ok(text)) => {
                    reply.push_str(&text);
                    let next = Relay::Streaming {
                        chunks,
                        conversation,
                        session,
                        message,
                        reply,
                    };
                    return Some((StreamEvent::Chunk(text), next));
                }
                Some(Err(e)) => {
                    warn!("Session {}: stream failed after {} bytes: {}", session, reply.len(), e);
                    return Some((StreamEvent::Failed(e.to_string()), Relay::Finished));
                }
                None => {
                    info!("Session {}: reply complete ({} bytes)", session, reply.len());
                    conversation.record_exchange(message, reply);
                    return Some((StreamEvent::Done, Relay::Finished));
                }
            },

            Relay::Finished => return None,
        };
    }
}
