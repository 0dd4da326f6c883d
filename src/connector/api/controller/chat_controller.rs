use std::sync::Arc;

use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::Json;
use futures_util::future;
use futures_util::stream::{self, BoxStream, Stream, StreamExt};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::SessionId;

use super::super::Container;

/// Body of `POST /api/chat`.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    /// The widget's view of prior `(user, assistant)` pairs.
    #[serde(default)]
    pub history: Vec<(String, String)>,
    /// Minted by the server when absent; echoed back in the `session` event.
    #[serde(default)]
    pub session_id: Option<String>,
}

#[derive(Debug, Serialize)]
struct Snapshot {
    text: String,
}

pub struct ChatController<'a> {
    container: &'a Container,
}

impl<'a> ChatController<'a> {
    pub fn new(container: &'a Container) -> Self {
        Self { container }
    }

    pub fn chat(&self, request: ChatRequest) -> (SessionId, BoxStream<'static, String>) {
        let session = request
            .session_id
            .as_deref()
            .and_then(SessionId::parse)
            .unwrap_or_else(SessionId::generate);

        debug!(
            "Chat request for session {} ({} chars)",
            session,
            request.message.chars().count()
        );

        let replies = self
            .container
            .respond_use_case()
            .execute(&session, &request.message, &request.history);

        (session, replies)
    }
}

/// Streams the reply as server-sent events: `session`, one `message` per
/// snapshot (`{"text": ...}`), then `done`.
pub async fn chat_handler(
    State(container): State<Arc<Container>>,
    Json(request): Json<ChatRequest>,
) -> Sse<impl Stream<Item = Result<Event, axum::Error>>> {
    let (session, replies) = ChatController::new(&container).chat(request);

    let head = stream::once(future::ready(Ok::<_, axum::Error>(Event::default()
        .event("session")
        .data(session.as_str()))));
    let body = replies.map(|text| Event::default().event("message").json_data(Snapshot { text }));
    let tail = stream::once(future::ready(Ok::<_, axum::Error>(
        Event::default().event("done").data(""),
    )));

    Sse::new(head.chain(body).chain(tail)).keep_alive(KeepAlive::default())
}
