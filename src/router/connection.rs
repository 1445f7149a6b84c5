//! Connection handles
//!
//! The router never talks to a socket directly. It holds `Connection`
//! handles whose `send` enqueues a frame without waiting; the transport drains
//! the queue on its own task.

use tokio::sync::mpsc;

use crate::protocol::Frame;

/// Unique identifier for a connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

impl ConnectionId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn get(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Outbound side of a live connection
pub trait Connection: Send + Sync {
    /// Identifier of this connection
    fn id(&self) -> ConnectionId;

    /// Queue a frame for delivery
    ///
    /// Must not block. Returns false if the frame was dropped because the
    /// connection is gone or its queue is full.
    fn send(&self, frame: Frame) -> bool;
}

/// Connection backed by a bounded mpsc queue
#[derive(Debug, Clone)]
pub struct ChannelConnection {
    id: ConnectionId,
    tx: mpsc::Sender<Frame>,
}

impl ChannelConnection {
    /// Create a connection and the receiver its transport drains
    pub fn new(id: ConnectionId, queue_capacity: usize) -> (Self, mpsc::Receiver<Frame>) {
        let (tx, rx) = mpsc::channel(queue_capacity.max(1));
        (Self { id, tx }, rx)
    }
}

impl Connection for ChannelConnection {
    fn id(&self) -> ConnectionId {
        self.id
    }

    fn send(&self, frame: Frame) -> bool {
        match self.tx.try_send(frame) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(frame)) => {
                tracing::warn!(
                    connection_id = %self.id,
                    frame_len = frame.len(),
                    "Send queue full, dropping frame"
                );
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => false,
        }
    }
}
