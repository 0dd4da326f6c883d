pub mod ask_controller;
pub mod chat_controller;
pub mod page_controller;

pub use ask_controller::AskController;
pub use chat_controller::{chat_handler, ChatController, ChatRequest};
pub use page_controller::{health_handler, index_handler, presentation_handler, HealthStatus};
