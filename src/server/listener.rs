//! Motion relay server
//!
//! Serves the WebSocket endpoint and a health check, and spawns the relay
//! task that owns all device and subscription state.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use axum::extract::ws::WebSocketUpgrade;
use axum::extract::{ConnectInfo, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::error::Result;
use crate::router::ConnectionId;
use crate::server::config::ServerConfig;
use crate::server::socket;
use crate::session::{spawn_relay, ConnectionLifecycleManager, RelayHandle};

/// Shared state passed to axum handlers
#[derive(Clone)]
struct AppState {
    relay: RelayHandle,
    next_connection_id: Arc<AtomicU64>,
    send_queue_capacity: usize,
}

/// Motion relay server
pub struct MotionServer {
    config: ServerConfig,
}

impl MotionServer {
    /// Create a new server with the given configuration
    pub fn new(config: ServerConfig) -> Self {
        Self { config }
    }

    /// Get the server configuration
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Get the bind address
    pub fn bind_addr(&self) -> SocketAddr {
        self.config.bind_addr
    }

    /// Run the server
    ///
    /// This method blocks until the server fails.
    pub async fn run(self) -> Result<()> {
        self.run_until(std::future::pending()).await
    }

    /// Run the server with graceful shutdown
    pub async fn run_until<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let listener = TcpListener::bind(self.config.bind_addr).await?;
        self.serve(listener, shutdown).await
    }

    /// Bind and serve in the background
    ///
    /// Binding happens before this returns, so port 0 can be used and the
    /// chosen address read from the handle.
    pub async fn spawn(self) -> Result<ServerHandle> {
        let listener = TcpListener::bind(self.config.bind_addr).await?;
        let local_addr = listener.local_addr()?;
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        let task = tokio::spawn(async move {
            self.serve(listener, async move {
                let _ = shutdown_rx.await;
            })
            .await
        });

        Ok(ServerHandle {
            local_addr,
            shutdown: shutdown_tx,
            task,
        })
    }

    async fn serve<F>(self, listener: TcpListener, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let local_addr = listener.local_addr()?;
        let manager = ConnectionLifecycleManager::new(self.config.registry.clone());
        let (relay, relay_task) = spawn_relay(manager, self.config.command_queue_capacity);

        let state = AppState {
            relay,
            next_connection_id: Arc::new(AtomicU64::new(1)),
            send_queue_capacity: self.config.send_queue_capacity,
        };

        tracing::info!(
            addr = %local_addr,
            capacity = self.config.registry.buffer_capacity,
            disconnect_policy = ?self.config.registry.disconnect_policy,
            "Motion relay listening"
        );

        let result = axum::serve(
            listener,
            build_router(state).into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown)
        .await;

        tracing::info!("Motion relay stopped");
        relay_task.abort();
        result.map_err(Into::into)
    }
}

/// Handle to a server started with [`MotionServer::spawn`]
pub struct ServerHandle {
    local_addr: SocketAddr,
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<Result<()>>,
}

impl ServerHandle {
    /// Address the server is bound to
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Stop accepting connections and wait for the server to finish
    pub async fn shutdown(self) -> Result<()> {
        let _ = self.shutdown.send(());
        match self.task.await {
            Ok(result) => result,
            Err(e) => Err(std::io::Error::other(e).into()),
        }
    }
}

fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/ws", get(ws_handler))
        .route("/health", get(health_handler))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

async fn ws_handler(
    ws: WebSocketUpgrade,
    ConnectInfo(peer_addr): ConnectInfo<SocketAddr>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    let id = ConnectionId::new(state.next_connection_id.fetch_add(1, Ordering::Relaxed));

    ws.on_upgrade(move |ws| {
        socket::handle_socket(ws, id, peer_addr, state.relay, state.send_queue_capacity)
    })
}

async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    match state.relay.stats().await {
        Ok(stats) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "status": "ok",
                "devices": stats.devices,
                "connections": stats.connections,
                "producers": stats.producers,
                "viewers": stats.viewers,
            })),
        ),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(serde_json::json!({ "status": "unavailable", "error": e.to_string() })),
        ),
    }
}
