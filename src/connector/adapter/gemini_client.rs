use std::time::Duration;

use async_trait::async_trait;
use eventsource_stream::Eventsource;
use futures_util::StreamExt;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::application::{ChatClient, ChunkStream};
use crate::domain::{DomainError, ModelConfig, SafetySetting, Turn};

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const API_KEY_ENV: &str = "GOOGLE_API_KEY";
pub const BASE_URL_ENV: &str = "GEMINI_BASE_URL";
const MODELS_PATH: &str = "/v1beta/models";
const API_KEY_HEADER: &str = "x-goog-api-key";
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Finish reasons that mean the reply was withheld rather than completed.
const BLOCKING_FINISH_REASONS: &[&str] = &["SAFETY", "RECITATION", "BLOCKLIST", "PROHIBITED_CONTENT"];

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    system_instruction: ContentOut<'a>,
    contents: Vec<ContentOut<'a>>,
    safety_settings: &'a [SafetySetting],
}

#[derive(Serialize)]
struct ContentOut<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'a str>,
    parts: Vec<PartOut<'a>>,
}

impl<'a> ContentOut<'a> {
    fn new(role: Option<&'a str>, text: &'a str) -> Self {
        Self {
            role,
            parts: vec![PartOut { text }],
        }
    }
}

#[derive(Serialize)]
struct PartOut<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<PartIn>,
}

#[derive(Deserialize)]
struct PartIn {
    text: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Deserialize)]
struct ApiErrorDetail {
    message: String,
}

/// Streaming client for the Gemini `generateContent` API.
///
/// Each call posts the full conversation to `:streamGenerateContent?alt=sse`
/// and turns the server-sent events into text chunks. The system instruction
/// and safety settings from [`ModelConfig`] go out verbatim with every request.
///
/// ```text
/// GOOGLE_API_KEY=...                                          (required)
/// GEMINI_BASE_URL=https://generativelanguage.googleapis.com   (optional)
/// ```
pub struct GeminiClient {
    client: reqwest::Client,
    api_key: String,
    config: ModelConfig,
    /// `{base}/v1beta/models/{model}`
    model_url: String,
}

impl GeminiClient {
    /// Fails with [`DomainError::Configuration`] when the key or model name is
    /// empty, the base URL does not parse, or the HTTP client cannot be built.
    pub fn new(
        api_key: impl Into<String>,
        config: ModelConfig,
        base_url: impl Into<String>,
    ) -> Result<Self, DomainError> {
        let api_key: String = api_key.into();
        if api_key.trim().is_empty() {
            return Err(DomainError::configuration(format!(
                "{API_KEY_ENV} secret not found"
            )));
        }
        if config.model().trim().is_empty() {
            return Err(DomainError::configuration("model name is empty"));
        }

        let base: String = base_url.into();
        let trimmed = base.trim_end_matches('/');
        reqwest::Url::parse(trimmed).map_err(|e| {
            DomainError::configuration(format!("invalid base URL '{trimmed}': {e}"))
        })?;

        let client = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|e| DomainError::configuration(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key,
            model_url: format!("{trimmed}{MODELS_PATH}/{}", config.model()),
            config,
        })
    }

    /// Reads `GOOGLE_API_KEY` and `GEMINI_BASE_URL` from the environment.
    pub fn from_env(config: ModelConfig) -> Result<Self, DomainError> {
        let key = std::env::var(API_KEY_ENV).unwrap_or_default();
        let base = std::env::var(BASE_URL_ENV).unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        Self::new(key, config, base)
    }

    fn stream_url(&self) -> String {
        format!("{}:streamGenerateContent?alt=sse", self.model_url)
    }

    /// Asks the API whether the configured model exists and the key is accepted.
    pub async fn verify_model(&self) -> Result<(), DomainError> {
        let response = self
            .client
            .get(&self.model_url)
            .header(API_KEY_HEADER, &self.api_key)
            .send()
            .await
            .map_err(|e| DomainError::configuration(format!("model check failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(DomainError::configuration(format!(
                "model '{}' rejected: {}",
                self.config.model(),
                api_error_message(status, &body)
            )));
        }

        debug!("GeminiClient: model {} verified", self.config.model());
        Ok(())
    }

    fn build_request<'a>(&'a self, history: &'a [Turn], message: &'a str) -> GenerateContentRequest<'a> {
        let mut contents: Vec<ContentOut<'a>> = history
            .iter()
            .map(|turn| ContentOut::new(Some(turn.role().as_str()), turn.text()))
            .collect();
        contents.push(ContentOut::new(Some("user"), message));

        GenerateContentRequest {
            system_instruction: ContentOut::new(None, self.config.system_instruction()),
            contents,
            safety_settings: self.config.safety_settings(),
        }
    }
}

#[async_trait]
impl ChatClient for GeminiClient {
    async fn send_message(
        &self,
        history: &[Turn],
        message: &str,
    ) -> Result<ChunkStream, DomainError> {
        let request = self.build_request(history, message);

        let response = self
            .client
            .post(self.stream_url())
            .header(API_KEY_HEADER, &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| DomainError::transport(format!("request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!("GeminiClient: API returned {status}: {body}");
            return Err(DomainError::transport(api_error_message(status, &body)));
        }

        let chunks = response
            .bytes_stream()
            .eventsource()
            .filter_map(|event| async move {
                match event {
                    Ok(event) => {
                        trace!("Gemini SSE: {}", event.data);
                        parse_chunk(&event.data).transpose()
                    }
                    Err(e) => Some(Err(DomainError::transport(format!("stream error: {e}")))),
                }
            });

        Ok(chunks.boxed())
    }

    fn model(&self) -> &str {
        self.config.model()
    }
}

/// Text carried by one SSE payload, `None` when it carries none.
fn parse_chunk(data: &str) -> Result<Option<String>, DomainError> {
    let response: GenerateContentResponse = serde_json::from_str(data)
        .map_err(|e| DomainError::transport(format!("malformed chunk: {e}")))?;

    if let Some(reason) = response
        .prompt_feedback
        .and_then(|feedback| feedback.block_reason)
    {
        return Err(DomainError::transport(format!("prompt blocked: {reason}")));
    }

    let Some(candidate) = response.candidates.into_iter().next() else {
        return Ok(None);
    };

    let text: String = candidate
        .content
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|part| part.text)
                .collect()
        })
        .unwrap_or_default();

    if text.is_empty() {
        if let Some(reason) = candidate
            .finish_reason
            .filter(|r| BLOCKING_FINISH_REASONS.contains(&r.as_str()))
        {
            return Err(DomainError::transport(format!("response blocked: {reason}")));
        }
        return Ok(None);
    }

    Ok(Some(text))
}

fn api_error_message(status: StatusCode, body: &str) -> String {
    match serde_json::from_str::<ApiErrorBody>(body) {
        Ok(parsed) => format!("{} {}", status.as_u16(), parsed.error.message),
        Err(_) => format!("API returned {status}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{HarmBlockThreshold, HarmCategory};

    fn client() -> GeminiClient {
        GeminiClient::new("key", ModelConfig::default(), "http://localhost:9/").unwrap()
    }

    #[test]
    fn new_rejects_empty_key() {
        let err = GeminiClient::new("  ", ModelConfig::default(), DEFAULT_BASE_URL)
            .err()
            .unwrap();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("GOOGLE_API_KEY"));
    }

    #[test]
    fn new_rejects_empty_model_and_bad_url() {
        assert!(GeminiClient::new("k", ModelConfig::new(""), DEFAULT_BASE_URL).is_err());
        assert!(GeminiClient::new("k", ModelConfig::default(), "not a url").is_err());
    }

    #[test]
    fn stream_url_targets_configured_model() {
        assert_eq!(
            client().stream_url(),
            "http://localhost:9/v1beta/models/gemini-1.5-flash:streamGenerateContent?alt=sse"
        );
    }

    #[test]
    fn request_carries_history_instruction_and_safety() {
        let client = GeminiClient::new(
            "key",
            ModelConfig::default()
                .with_system_instruction("Be brief.")
                .with_threshold(HarmCategory::Harassment, HarmBlockThreshold::BlockOnlyHigh),
            DEFAULT_BASE_URL,
        )
        .unwrap();
        let history = vec![Turn::user("hi"), Turn::model("hello")];
        let json = serde_json::to_value(client.build_request(&history, "bye")).unwrap();

        assert_eq!(json["systemInstruction"]["parts"][0]["text"], "Be brief.");
        assert!(json["systemInstruction"].get("role").is_none());
        let contents = json["contents"].as_array().unwrap();
        assert_eq!(contents.len(), 3);
        assert_eq!(contents[1]["role"], "model");
        assert_eq!(contents[2]["role"], "user");
        assert_eq!(contents[2]["parts"][0]["text"], "bye");
        assert_eq!(json["safetySettings"].as_array().unwrap().len(), 4);
        assert_eq!(json["safetySettings"][1]["category"], "HARM_CATEGORY_HARASSMENT");
        assert_eq!(json["safetySettings"][1]["threshold"], "BLOCK_ONLY_HIGH");
    }

    #[test]
    fn parse_chunk_joins_parts() {
        let data = r#"{"candidates":[{"content":{"role":"model","parts":[{"text":"Hi"},{"text":" there"}]}}]}"#;
        assert_eq!(parse_chunk(data).unwrap().as_deref(), Some("Hi there"));
    }

    #[test]
    fn parse_chunk_without_text_is_none() {
        let data = r#"{"candidates":[{"finishReason":"STOP"}],"usageMetadata":{"totalTokenCount":3}}"#;
        assert_eq!(parse_chunk(data).unwrap(), None);
        assert_eq!(parse_chunk("{}").unwrap(), None);
    }

    #[test]
    fn parse_chunk_reports_blocks() {
        let prompt = r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#;
        assert_eq!(
            parse_chunk(prompt).unwrap_err().to_string(),
            "prompt blocked: SAFETY"
        );

        let reply = r#"{"candidates":[{"finishReason":"RECITATION"}]}"#;
        assert_eq!(
            parse_chunk(reply).unwrap_err().to_string(),
            "response blocked: RECITATION"
        );
    }

    #[test]
    fn parse_chunk_rejects_malformed_json() {
        assert!(parse_chunk("not json").unwrap_err().is_transport());
    }

    #[test]
    fn api_error_message_prefers_body_message() {
        let body = r#"{"error":{"code":429,"message":"Resource has been exhausted","status":"RESOURCE_EXHAUSTED"}}"#;
        assert_eq!(
            api_error_message(StatusCode::TOO_MANY_REQUESTS, body),
            "429 Resource has been exhausted"
        );
        assert_eq!(
            api_error_message(StatusCode::BAD_GATEWAY, "<html>"),
            "API returned 502 Bad Gateway"
        );
    }
}
