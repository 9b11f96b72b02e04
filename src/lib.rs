//! Streaming chat client for the spa concierge widget.
//!
//! [`client::StreamingChatClient`] posts a patient message to the backend chat
//! endpoint and turns its `data:` token stream into an ordered message list
//! plus live streaming text. [`routes`] hosts a local backend that speaks the
//! same wire format.

pub mod api;
pub mod client;
pub mod config;
pub mod errors;
pub mod models;
pub mod routes;
pub mod session;
pub mod shell;
pub mod stream;
pub mod transport;
