use std::sync::Arc;

use axum::extract::State;
use axum::response::Html;
use axum::Json;
use serde::Serialize;

use crate::domain::ChatPresentation;

use super::super::Container;

const INDEX_HTML: &str = include_str!("../assets/index.html");

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub model_available: bool,
    pub model: String,
    pub sessions: usize,
}

pub async fn index_handler() -> Html<&'static str> {
    Html(INDEX_HTML)
}

pub async fn presentation_handler(
    State(container): State<Arc<Container>>,
) -> Json<ChatPresentation> {
    Json(container.presentation().clone())
}

pub async fn health_handler(State(container): State<Arc<Container>>) -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "ok",
        model_available: container.is_model_available(),
        model: container.model().to_string(),
        sessions: container.conversation_store().session_count().await,
    })
}
