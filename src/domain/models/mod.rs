mod conversation;
mod model_config;
mod presentation;
mod safety;
mod stream_event;
mod turn;

pub use conversation::*;
pub use model_config::*;
pub use presentation::*;
pub use safety::*;
pub use stream_event::*;
pub use turn::*;
