pub mod connection;
pub mod endpoints;

pub use connection::{ApiConnectionError, ChatClient, DEFAULT_BACKOFF, DEFAULT_MAX_ATTEMPTS, DEFAULT_TIMEOUT};
pub use endpoints::{ChatMessage, Provider, OPENROUTER_MODELS};
