//! # Connector Layer
//!
//! External integrations implementing the application ports:
//! - Remote model (Gemini over SSE, plus a scripted mock)
//! - Session storage (in-memory, process lifetime)
//! - HTTP API serving the chat widget

pub mod adapter;
pub mod api;

pub use adapter::*;
pub use api::*;
