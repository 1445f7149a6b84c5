//! Wire protocol
//!
//! This module provides:
//! - The closed sets of client and server events
//! - JSON framing for the WebSocket transport

pub mod event;
pub mod frame;

pub use event::{ClientEvent, DeviceRef, ServerEvent, Subscribe};
pub use frame::{decode, Frame};
