mod gemini_client;
mod in_memory_conversation_store;
mod mock_chat_client;

pub use gemini_client::*;
pub use in_memory_conversation_store::*;
pub use mock_chat_client::*;
