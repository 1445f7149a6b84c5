//! Server configuration

use std::net::{Ipv4Addr, SocketAddr};

use crate::error::{Error, Result};
use crate::registry::{DisconnectPolicy, RegistryConfig};
use crate::telemetry::TimestampMode;

/// Port used when `PORT` is not set
pub const DEFAULT_PORT: u16 = 4001;

/// Environment variable names
pub mod env {
    pub const PORT: &str = "PORT";
    pub const BUFFER_CAPACITY: &str = "MOTION_BUFFER_CAPACITY";
    pub const DISCONNECT_POLICY: &str = "MOTION_DISCONNECT_POLICY";
    pub const TIMESTAMPS: &str = "MOTION_TIMESTAMPS";
}

/// Server configuration options
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind to
    pub bind_addr: SocketAddr,

    /// Outbound frames queued per connection before new ones are dropped
    pub send_queue_capacity: usize,

    /// Commands queued for the relay task before socket readers wait
    pub command_queue_capacity: usize,

    /// Device registry settings
    pub registry: RegistryConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from((Ipv4Addr::UNSPECIFIED, DEFAULT_PORT)),
            send_queue_capacity: 256,
            command_queue_capacity: 1024,
            registry: RegistryConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Create a new config with custom bind address
    pub fn with_addr(addr: SocketAddr) -> Self {
        Self {
            bind_addr: addr,
            ..Default::default()
        }
    }

    /// Load from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key lookup, falling back to defaults for
    /// missing keys
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(port) = lookup(env::PORT) {
            config = config.port(parse_number(env::PORT, &port)?);
        }

        let mut registry = config.registry.clone();
        if let Some(capacity) = lookup(env::BUFFER_CAPACITY) {
            let capacity: usize = parse_number(env::BUFFER_CAPACITY, &capacity)?;
            if capacity == 0 {
                return Err(Error::Config {
                    key: env::BUFFER_CAPACITY,
                    message: "must be at least 1".into(),
                });
            }
            registry = registry.buffer_capacity(capacity);
        }
        if let Some(policy) = lookup(env::DISCONNECT_POLICY) {
            registry = registry.disconnect_policy(parse_policy(&policy)?);
        }
        if let Some(mode) = lookup(env::TIMESTAMPS) {
            registry = registry.timestamp_mode(parse_timestamps(&mode)?);
        }

        Ok(config.registry(registry))
    }

    /// Set the bind address
    pub fn bind(mut self, addr: SocketAddr) -> Self {
        self.bind_addr = addr;
        self
    }

    /// Set the port, keeping the bind IP
    pub fn port(mut self, port: u16) -> Self {
        self.bind_addr.set_port(port);
        self
    }

    /// Set the per-connection send queue capacity
    pub fn send_queue_capacity(mut self, capacity: usize) -> Self {
        self.send_queue_capacity = capacity.max(1);
        self
    }

    /// Set the registry configuration
    pub fn registry(mut self, registry: RegistryConfig) -> Self {
        self.registry = registry;
        self
    }
}

fn parse_number<T: std::str::FromStr>(key: &'static str, value: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e: T::Err| Error::Config {
        key,
        message: format!("{value:?}: {e}"),
    })
}

fn parse_policy(value: &str) -> Result<DisconnectPolicy> {
    match value.trim().to_ascii_lowercase().as_str() {
        "teardown" => Ok(DisconnectPolicy::Teardown),
        "retain" => Ok(DisconnectPolicy::Retain),
        other => Err(Error::Config {
            key: env::DISCONNECT_POLICY,
            message: format!("expected \"teardown\" or \"retain\", got {other:?}"),
        }),
    }
}

fn parse_timestamps(value: &str) -> Result<TimestampMode> {
    match value.trim().to_ascii_lowercase().as_str() {
        "absolute" => Ok(TimestampMode::Absolute),
        "relative" => Ok(TimestampMode::RelativeToEpoch),
        other => Err(Error::Config {
            key: env::TIMESTAMPS,
            message: format!("expected \"absolute\" or \"relative\", got {other:?}"),
        }),
    }
}
