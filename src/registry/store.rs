//! Device registry implementation
//!
//! Owns every device's sample buffer. Lookups that name an unknown device are
//! no-ops that return `None`/`false`; nothing here is an error.

use std::collections::BTreeMap;

use crate::router::ConnectionId;
use crate::telemetry::{DeviceId, Sample, Snapshot};

use super::config::RegistryConfig;
use super::entry::{DeviceEntry, DeviceStats};

/// Outcome of a registration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    /// A new device was created
    Created,
    /// The device already existed; its history was emptied and the producer rebound
    Reset,
}

/// Registry of all known devices
///
/// Not internally synchronized: the relay task owns it and applies events one
/// at a time.
#[derive(Debug)]
pub struct DeviceRegistry {
    /// Map of device id to entry, ordered so listings are stable
    devices: BTreeMap<DeviceId, DeviceEntry>,

    /// Configuration
    config: RegistryConfig,
}

impl DeviceRegistry {
    /// Create a new registry with default configuration
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    /// Create a new registry with custom configuration
    pub fn with_config(config: RegistryConfig) -> Self {
        Self {
            devices: BTreeMap::new(),
            config,
        }
    }

    /// Get the registry configuration
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Register a device produced by `producer`
    ///
    /// If the device doesn't exist, it is created with an empty buffer.
    /// If it exists, its buffer is emptied and `producer` takes it over.
    pub fn register(&mut self, device_id: DeviceId, producer: ConnectionId) -> Registration {
        if let Some(entry) = self.devices.get_mut(&device_id) {
            let previous = entry.producer.replace(producer);
            entry.clear();

            tracing::info!(
                device = %device_id,
                connection_id = %producer,
                previous_producer = ?previous,
                "Device re-registered, history reset"
            );
            Registration::Reset
        } else {
            tracing::info!(
                device = %device_id,
                connection_id = %producer,
                capacity = self.config.buffer_capacity,
                "Device registered"
            );
            self.devices
                .insert(device_id, DeviceEntry::new(&self.config, Some(producer)));
            Registration::Created
        }
    }

    /// Remove a device and its history
    ///
    /// Returns false if the device was unknown.
    pub fn unregister(&mut self, device_id: &str) -> bool {
        let removed = self.devices.remove(device_id).is_some();
        if removed {
            tracing::info!(device = %device_id, "Device removed");
        }
        removed
    }

    /// Drop the producer binding if `producer` still holds it
    ///
    /// The device and its history stay in place.
    pub fn release_producer(&mut self, device_id: &str, producer: ConnectionId) -> bool {
        match self.devices.get_mut(device_id) {
            Some(entry) if entry.producer == Some(producer) => {
                entry.producer = None;
                tracing::debug!(device = %device_id, connection_id = %producer, "Producer released");
                true
            }
            _ => false,
        }
    }

    /// Iterate over the known device ids
    ///
    /// Each call reflects the registry as it is now.
    pub fn list_ids(&self) -> impl Iterator<Item = &DeviceId> + '_ {
        self.devices.keys()
    }

    /// Append a sample to a known device
    ///
    /// Returns the updated history for broadcast, or `None` if the device is
    /// unknown (in which case nothing changes).
    pub fn append_sample(&mut self, device_id: &str, sample: Sample) -> Option<Snapshot> {
        let entry = self.devices.get_mut(device_id)?;
        let snapshot = entry.push(sample);

        tracing::trace!(device = %device_id, buffered = snapshot.len(), "Sample appended");
        Some(snapshot)
    }

    /// Empty a known device's history
    ///
    /// Returns the empty snapshot for broadcast, or `None` if the device is unknown.
    pub fn clear_samples(&mut self, device_id: &str) -> Option<Snapshot> {
        let entry = self.devices.get_mut(device_id)?;
        tracing::debug!(device = %device_id, "Samples cleared");
        Some(entry.clear())
    }

    /// Remove every device
    ///
    /// Returns the number of devices removed.
    pub fn clear_all(&mut self) -> usize {
        let count = self.devices.len();
        self.devices.clear();
        tracing::info!(removed = count, "All devices cleared");
        count
    }

    /// Connection producing for a device, if any
    pub fn producer_of(&self, device_id: &str) -> Option<ConnectionId> {
        self.devices.get(device_id).and_then(|e| e.producer)
    }

    /// Number of devices with a bound producer
    pub fn producer_count(&self) -> usize {
        self.devices.values().filter(|e| e.has_producer()).count()
    }

    /// Check if a device is known
    pub fn contains(&self, device_id: &str) -> bool {
        self.devices.contains_key(device_id)
    }

    /// Current history of a device
    pub fn snapshot(&self, device_id: &str) -> Option<Snapshot> {
        self.devices.get(device_id).map(DeviceEntry::snapshot)
    }

    /// Get device statistics
    pub fn device_stats(&self, device_id: &str) -> Option<DeviceStats> {
        self.devices.get(device_id).map(DeviceEntry::stats)
    }

    /// Number of known devices
    pub fn len(&self) -> usize {
        self.devices.len()
    }

    /// Check if no devices are known
    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }
}

impl Default for DeviceRegistry {
    fn default() -> Self {
        Self::new()
    }
}
