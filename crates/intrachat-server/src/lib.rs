//! Minimal JSON API stub the chat client talks to.

pub mod routes;
pub mod server;

pub use routes::{create_router, AppState, TOPICS_TEXT, WELCOME_MESSAGE};
pub use server::{StubServer, StubServerConfig};
