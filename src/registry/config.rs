//! Registry configuration

use crate::telemetry::{TimestampMode, DEFAULT_CAPACITY};

/// What happens to a device when its producing connection goes away
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DisconnectPolicy {
    /// Remove the device and its history, then announce the new device list
    #[default]
    Teardown,
    /// Keep the device and its history until it is explicitly cleared
    Retain,
}

/// Configuration for the device registry
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Samples kept per device
    pub buffer_capacity: usize,

    /// Timestamp storage mode for new buffers
    pub timestamp_mode: TimestampMode,

    /// Device teardown behavior on producer disconnect
    pub disconnect_policy: DisconnectPolicy,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            buffer_capacity: DEFAULT_CAPACITY,
            timestamp_mode: TimestampMode::Absolute,
            disconnect_policy: DisconnectPolicy::Teardown,
        }
    }
}

impl RegistryConfig {
    /// Set the per-device buffer capacity (minimum 1)
    pub fn buffer_capacity(mut self, capacity: usize) -> Self {
        self.buffer_capacity = capacity.max(1);
        self
    }

    /// Set the timestamp mode
    pub fn timestamp_mode(mut self, mode: TimestampMode) -> Self {
        self.timestamp_mode = mode;
        self
    }

    /// Set the disconnect policy
    pub fn disconnect_policy(mut self, policy: DisconnectPolicy) -> Self {
        self.disconnect_policy = policy;
        self
    }
}
