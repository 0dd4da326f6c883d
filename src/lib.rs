pub mod application;
pub mod cli;
pub mod connector;
pub mod domain;

pub use application::{
    format_error, snapshots, ChatClient, ChunkStream, ConversationHandle, ConversationStore,
    EvictIdleSessionsUseCase, RespondUseCase, MODEL_UNAVAILABLE_MESSAGE,
};

pub use cli::Commands;

pub use connector::{
    create_router, serve, AskController, ChatController, Container, ContainerConfig, GeminiClient,
    InMemoryConversationStore, MockChatClient,
};

pub use domain::{
    ChatPresentation, Conversation, DomainError, HarmBlockThreshold, HarmCategory, ModelConfig,
    Role, SafetySetting, SessionId, StreamEvent, Turn,
};
