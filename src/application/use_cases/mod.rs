mod evict_sessions;
mod respond;

pub use evict_sessions::*;
pub use respond::*;
