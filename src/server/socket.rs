//! Per-socket pumps
//!
//! Each WebSocket gets a reader that decodes frames into client events and a
//! writer that drains the connection's outbound queue. When either side ends,
//! the other is stopped and the relay is told exactly once.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::ws::{Message, Utf8Bytes, WebSocket};
use futures::{SinkExt, StreamExt};

use crate::protocol::{self, Frame};
use crate::router::{ChannelConnection, ConnectionId};
use crate::session::RelayHandle;

/// Drive one WebSocket until it closes
pub(super) async fn handle_socket(
    socket: WebSocket,
    id: ConnectionId,
    peer_addr: SocketAddr,
    relay: RelayHandle,
    send_queue_capacity: usize,
) {
    let (connection, mut outbound) = ChannelConnection::new(id, send_queue_capacity);
    if relay.connect(Arc::new(connection)).await.is_err() {
        tracing::warn!(connection_id = %id, "Relay unavailable, closing socket");
        return;
    }

    tracing::debug!(connection_id = %id, peer = %peer_addr, "WebSocket opened");

    let (mut ws_tx, mut ws_rx) = socket.split();

    let mut writer = tokio::spawn(async move {
        while let Some(frame) = outbound.recv().await {
            let Some(message) = text_message(frame) else {
                continue;
            };
            if ws_tx.send(message).await.is_err() {
                break;
            }
        }
        let _ = ws_tx.close().await;
    });

    let reader_relay = relay.clone();
    let mut reader = tokio::spawn(async move {
        while let Some(Ok(msg)) = ws_rx.next().await {
            let decoded = match msg {
                Message::Text(text) => protocol::decode(text.as_str()),
                Message::Binary(data) => match std::str::from_utf8(&data) {
                    Ok(text) => protocol::decode(text),
                    Err(_) => {
                        tracing::debug!(connection_id = %id, len = data.len(), "Non-UTF-8 binary frame");
                        continue;
                    }
                },
                Message::Close(_) => break,
                Message::Ping(_) | Message::Pong(_) => continue,
            };

            match decoded {
                Ok(event) => {
                    tracing::trace!(connection_id = %id, event = event.name(), "Event received");
                    if reader_relay.event(id, event).await.is_err() {
                        break;
                    }
                }
                Err(e) => {
                    tracing::debug!(connection_id = %id, error = %e, "Dropping malformed frame");
                }
            }
        }
    });

    tokio::select! {
        _ = &mut reader => writer.abort(),
        _ = &mut writer => reader.abort(),
    }

    let _ = relay.disconnect(id).await;
    tracing::debug!(connection_id = %id, peer = %peer_addr, "WebSocket closed");
}

/// Wrap a frame as a text message, reusing its buffer
fn text_message(frame: Frame) -> Option<Message> {
    Utf8Bytes::try_from(frame.into_bytes()).ok().map(Message::Text)
}
