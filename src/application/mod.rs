//! # Application Layer
//!
//! Ports to the remote model and the session store, plus the use cases that
//! relay streamed replies between them and the UI.

pub mod interfaces;
pub mod use_cases;

pub use interfaces::*;
pub use use_cases::*;
