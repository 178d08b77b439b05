//! WebSocket module — live session feed.
//!
//! - [`messages`]: Typed event/command envelopes.
//! - [`manager`]: Per-session connection tracking and broadcast.
//! - [`handler`]: Axum WebSocket upgrade handler.

pub mod handler;
pub mod manager;
pub mod messages;

pub use handler::ws_handler;
pub use manager::WsManager;
pub use messages::WsEvent;
