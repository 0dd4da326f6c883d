//! # Domain Layer
//!
//! Conversation model, safety configuration and the error taxonomy.
//! This layer is independent of the HTTP server and the remote API client.

mod error;
pub mod models;

pub use error::*;
pub use models::*;
