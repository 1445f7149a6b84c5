//! Connection lifecycle
//!
//! This module provides:
//! - Per-connection state (producer and viewer roles)
//! - The lifecycle manager that applies client events to the registry and router
//! - The relay task that serializes all mutations

pub mod handle;
pub mod manager;
pub mod state;

pub use handle::{spawn_relay, RelayCommand, RelayHandle};
pub use manager::{ConnectionLifecycleManager, RelayStats};
pub use state::{SessionPhase, SessionState};
