//! Relay task
//!
//! All registry and router mutations happen on one task that owns the
//! [`ConnectionLifecycleManager`]. Socket tasks talk to it through a cloneable
//! [`RelayHandle`]; commands are applied one at a time in arrival order, so
//! the FIFO and group-membership invariants hold without locks.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::error::{Error, Result};
use crate::protocol::ClientEvent;
use crate::router::{Connection, ConnectionId};

use super::manager::{ConnectionLifecycleManager, RelayStats};

/// Command processed by the relay task
pub enum RelayCommand {
    /// A connection was accepted
    Connect(Arc<dyn Connection>),
    /// A connection sent an event
    Event(ConnectionId, ClientEvent),
    /// A connection closed
    Disconnect(ConnectionId),
    /// Request current counters
    Stats(oneshot::Sender<RelayStats>),
}

/// Cloneable sender side of the relay task
#[derive(Clone)]
pub struct RelayHandle {
    tx: mpsc::Sender<RelayCommand>,
}

impl RelayHandle {
    /// Register a new connection
    pub async fn connect(&self, connection: Arc<dyn Connection>) -> Result<()> {
        self.send(RelayCommand::Connect(connection)).await
    }

    /// Forward a client event
    pub async fn event(&self, id: ConnectionId, event: ClientEvent) -> Result<()> {
        self.send(RelayCommand::Event(id, event)).await
    }

    /// Report a closed connection
    pub async fn disconnect(&self, id: ConnectionId) -> Result<()> {
        self.send(RelayCommand::Disconnect(id)).await
    }

    /// Fetch current counters
    pub async fn stats(&self) -> Result<RelayStats> {
        let (tx, rx) = oneshot::channel();
        self.send(RelayCommand::Stats(tx)).await?;
        rx.await.map_err(|_| Error::RelayClosed)
    }

    async fn send(&self, command: RelayCommand) -> Result<()> {
        self.tx.send(command).await.map_err(|_| Error::RelayClosed)
    }
}

/// Spawn the relay task
///
/// The task runs until every [`RelayHandle`] is dropped.
pub fn spawn_relay(
    mut manager: ConnectionLifecycleManager,
    queue_capacity: usize,
) -> (RelayHandle, JoinHandle<()>) {
    let (tx, mut rx) = mpsc::channel(queue_capacity.max(1));

    let task = tokio::spawn(async move {
        while let Some(command) = rx.recv().await {
            match command {
                RelayCommand::Connect(connection) => manager.connect(connection),
                RelayCommand::Event(id, event) => manager.handle(id, event),
                RelayCommand::Disconnect(id) => {
                    manager.disconnect(id);
                }
                RelayCommand::Stats(reply) => {
                    let _ = reply.send(manager.stats());
                }
            }
        }
        tracing::debug!("Relay task stopped");
    });

    (RelayHandle { tx }, task)
}
