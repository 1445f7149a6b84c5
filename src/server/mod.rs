//! WebSocket server
//!
//! Transport around the relay core: an axum router with a `/ws` endpoint
//! for producers and viewers and a `/health` endpoint.

pub mod config;
pub mod listener;
mod socket;

pub use config::{ServerConfig, DEFAULT_PORT};
pub use listener::{MotionServer, ServerHandle};
