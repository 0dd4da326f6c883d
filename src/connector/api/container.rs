use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info};

use crate::application::{ChatClient, ConversationStore, EvictIdleSessionsUseCase, RespondUseCase};
use crate::connector::adapter::{
    GeminiClient, InMemoryConversationStore, MockChatClient, API_KEY_ENV, BASE_URL_ENV,
    DEFAULT_BASE_URL,
};
use crate::domain::{ChatPresentation, DomainError, ModelConfig};

pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(30 * 60);

pub struct ContainerConfig {
    pub model_config: ModelConfig,
    /// API key; read from `GOOGLE_API_KEY` when `None`.
    pub api_key: Option<String>,
    /// API endpoint; read from `GEMINI_BASE_URL` when `None`.
    pub base_url: Option<String>,
    /// Use the offline echo client instead of the remote API.
    pub mock: bool,
    /// Probe the model at startup so a rejected model name puts the process
    /// in degraded mode instead of failing on the first message.
    pub verify_model: bool,
    pub session_ttl: Duration,
}

impl ContainerConfig {
    pub fn new(model_config: ModelConfig) -> Self {
        Self {
            model_config,
            api_key: None,
            base_url: None,
            mock: false,
            verify_model: false,
            session_ttl: DEFAULT_SESSION_TTL,
        }
    }
}

pub struct Container {
    chat_client: Option<Arc<dyn ChatClient>>,
    conversation_store: Arc<dyn ConversationStore>,
    presentation: ChatPresentation,
    config: ContainerConfig,
}

impl Container {
    /// Never fails: when the remote client cannot be set up the error is
    /// logged and the container runs with the model unavailable.
    pub async fn new(config: ContainerConfig) -> Self {
        let chat_client = match init_chat_client(&config).await {
            Ok(client) => {
                info!("✅ Model {} loaded and chat ready", client.model());
                Some(client)
            }
            Err(e) => {
                error!("🔴 Error loading model: {}", e);
                None
            }
        };

        Self::with_client(chat_client, config)
    }

    /// Wires an already constructed client (or none, for degraded mode).
    pub fn with_client(chat_client: Option<Arc<dyn ChatClient>>, config: ContainerConfig) -> Self {
        Self {
            chat_client,
            conversation_store: Arc::new(InMemoryConversationStore::new()),
            presentation: ChatPresentation::default(),
            config,
        }
    }

    pub fn respond_use_case(&self) -> RespondUseCase {
        RespondUseCase::new(self.chat_client.clone(), self.conversation_store.clone())
    }

    pub fn evict_sessions_use_case(&self) -> EvictIdleSessionsUseCase {
        EvictIdleSessionsUseCase::new(self.conversation_store.clone(), self.config.session_ttl)
    }

    pub fn conversation_store(&self) -> Arc<dyn ConversationStore> {
        self.conversation_store.clone()
    }

    pub fn is_model_available(&self) -> bool {
        self.chat_client.is_some()
    }

    /// The model answering chat requests; the configured one while degraded.
    pub fn model(&self) -> &str {
        match &self.chat_client {
            Some(client) => client.model(),
            None => self.config.model_config.model(),
        }
    }

    pub fn presentation(&self) -> &ChatPresentation {
        &self.presentation
    }

    pub fn session_ttl(&self) -> Duration {
        self.config.session_ttl
    }
}

async fn init_chat_client(config: &ContainerConfig) -> Result<Arc<dyn ChatClient>, DomainError> {
    if config.mock {
        debug!("Using mock chat client");
        return Ok(Arc::new(MockChatClient::new()));
    }

    let api_key = match &config.api_key {
        Some(key) => key.clone(),
        None => std::env::var(API_KEY_ENV).unwrap_or_default(),
    };
    let base_url = match &config.base_url {
        Some(url) => url.clone(),
        None => std::env::var(BASE_URL_ENV).unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
    };

    debug!("Initializing Gemini client for {} at {}", config.model_config.model(), base_url);
    let client = GeminiClient::new(api_key, config.model_config.clone(), base_url)?;

    if config.verify_model {
        client.verify_model().await?;
    }

    Ok(Arc::new(client))
}
