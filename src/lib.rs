//! WebSocket relay for streaming motion-sensor telemetry
//!
//! Producing devices register themselves and stream timestamped 3-axis
//! acceleration samples. The relay keeps a bounded history per device and
//! pushes it to the viewers currently subscribed to that device.
//!
//! # Layout
//!
//! - [`telemetry`]: samples and the bounded per-device buffer
//! - [`registry`]: device id to buffer map
//! - [`router`]: viewer groups and scoped fan-out
//! - [`protocol`]: client/server events and JSON framing
//! - [`session`]: per-connection lifecycle and the relay task
//! - [`server`]: axum WebSocket transport
//!
//! # Example
//!
//! ```no_run
//! use motion_relay::{MotionServer, ServerConfig};
//!
//! # async fn example() -> motion_relay::error::Result<()> {
//! let config = ServerConfig::from_env()?;
//! MotionServer::new(config).run().await?;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod protocol;
pub mod registry;
pub mod router;
pub mod server;
pub mod session;
pub mod telemetry;

pub use error::{Error, Result};
pub use registry::{DeviceRegistry, DisconnectPolicy, RegistryConfig};
pub use router::{Connection, ConnectionId, SubscriptionRouter};
pub use server::{MotionServer, ServerConfig, ServerHandle};
pub use session::{ConnectionLifecycleManager, RelayHandle};
pub use telemetry::{Acceleration, DeviceId, Sample, SampleBuffer, TimestampMode};
