//! Chat with interchangeable LLM backends through one session-aware API.
//!
//! - [`chat`]: command parsing, the per-session state machine and the
//!   provider adapter registry.
//! - [`api`]: HTTP surface over the chat service.
//! - [`ws`]: live session feed over WebSocket.

pub mod api;
pub mod chat;
pub mod config;
pub mod ws;
