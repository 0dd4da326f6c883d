pub mod container;
pub mod controller;
pub mod router;

pub use container::{Container, ContainerConfig, DEFAULT_SESSION_TTL};
pub use controller::{AskController, ChatController, ChatRequest};
pub use router::{create_router, serve};
