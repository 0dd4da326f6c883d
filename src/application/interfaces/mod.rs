mod chat_client;
mod conversation_store;

pub use chat_client::*;
pub use conversation_store::*;
