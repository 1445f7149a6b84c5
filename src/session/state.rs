//! Connection state machine
//!
//! Tracks the roles a connection holds between connect and disconnect. A
//! connection may produce for one device and view one device at the same
//! time; both roles are optional.

use std::time::Instant;

use crate::router::ConnectionId;
use crate::telemetry::DeviceId;

/// Connection lifecycle phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// Connection is live
    Connected,
    /// Connection closed, state released
    Disconnected,
}

/// Per-connection state
#[derive(Debug)]
pub struct SessionState {
    /// Connection ID
    pub id: ConnectionId,

    /// Current phase
    pub phase: SessionPhase,

    /// Connection start time
    pub connected_at: Instant,

    /// Device this connection registered as producer
    pub producing: Option<DeviceId>,

    /// Device this connection is viewing
    pub viewing: Option<DeviceId>,

    /// Events handled for this connection
    pub events_handled: u64,
}

impl SessionState {
    /// Create a new session state
    pub fn new(id: ConnectionId) -> Self {
        Self {
            id,
            phase: SessionPhase::Connected,
            connected_at: Instant::now(),
            producing: None,
            viewing: None,
            events_handled: 0,
        }
    }

    /// Bind this connection as producer of a device
    ///
    /// Returns the previously produced device if it differs.
    pub fn bind_producer(&mut self, device_id: DeviceId) -> Option<DeviceId> {
        match self.producing.replace(device_id) {
            Some(previous) if Some(&previous) != self.producing.as_ref() => Some(previous),
            _ => None,
        }
    }

    /// Drop the producer binding
    pub fn release_producer(&mut self) -> Option<DeviceId> {
        self.producing.take()
    }

    /// Switch the viewed device
    pub fn view(&mut self, device_id: Option<DeviceId>) {
        self.viewing = device_id;
    }

    /// Check if the connection is producing
    pub fn is_producing(&self) -> bool {
        self.producing.is_some()
    }

    /// Check if the connection is viewing
    pub fn is_viewing(&self) -> bool {
        self.viewing.is_some()
    }

    /// Check if the connection is live
    pub fn is_connected(&self) -> bool {
        self.phase == SessionPhase::Connected
    }

    /// Record that an event was handled
    pub fn record_event(&mut self) {
        self.events_handled += 1;
    }

    /// Get session duration
    pub fn duration(&self) -> std::time::Duration {
        self.connected_at.elapsed()
    }

    /// Close the session, releasing both roles
    ///
    /// Returns the device this connection was producing for, if any.
    pub fn close(&mut self) -> Option<DeviceId> {
        self.phase = SessionPhase::Disconnected;
        self.viewing = None;
        self.producing.take()
    }
}
