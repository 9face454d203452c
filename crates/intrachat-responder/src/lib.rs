//! Client side of the remote responder.
//!
//! Two contracts are supported: the topic lookup (`GET /api/topics`, replying
//! `{"data": ...}`) and the chat endpoint (`POST /chat`, carrying exchange
//! history). Whatever comes back is classified into a [`RemoteReply`].

pub mod client;
pub mod config;
pub mod error;
pub mod reply;

pub use client::{HttpResponder, Responder};
pub use config::{ResponderConfig, ResponderContract, DEFAULT_BASE_URL};
pub use error::ResponderError;
pub use reply::RemoteReply;
pub use reqwest::Method;
