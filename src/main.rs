//! Motion relay server binary
//!
//! Run with: motion-relay
//!
//! Environment:
//!   PORT                      listen port (default 4001)
//!   MOTION_BUFFER_CAPACITY    samples kept per device (default 200)
//!   MOTION_DISCONNECT_POLICY  teardown | retain (default teardown)
//!   MOTION_TIMESTAMPS         absolute | relative (default absolute)
//!   RUST_LOG                  tracing filter

use motion_relay::{MotionServer, ServerConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("motion_relay=info".parse()?),
        )
        .init();

    let config = ServerConfig::from_env()?;
    tracing::info!(addr = %config.bind_addr, "Starting motion relay");

    MotionServer::new(config)
        .run_until(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutdown signal received");
        })
        .await?;

    Ok(())
}
