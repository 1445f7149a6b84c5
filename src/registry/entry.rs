//! Device entry and stats types
//!
//! This module defines the per-device state stored in the registry.

use std::time::Instant;

use crate::router::ConnectionId;
use crate::telemetry::{Sample, SampleBuffer, Snapshot};

use super::config::RegistryConfig;

/// Entry for a single device in the registry
#[derive(Debug)]
pub struct DeviceEntry {
    /// Recent sample history
    buffer: SampleBuffer,

    /// Connection currently producing for this device
    pub producer: Option<ConnectionId>,

    /// Samples accepted since the device was registered
    pub samples_received: u64,

    /// When the device was registered
    pub created_at: Instant,
}

impl DeviceEntry {
    pub(super) fn new(config: &RegistryConfig, producer: Option<ConnectionId>) -> Self {
        Self {
            buffer: SampleBuffer::with_capacity(config.buffer_capacity)
                .timestamp_mode(config.timestamp_mode),
            producer,
            samples_received: 0,
            created_at: Instant::now(),
        }
    }

    /// Append a sample and return the updated history
    pub(super) fn push(&mut self, sample: Sample) -> Snapshot {
        self.buffer.push(sample);
        self.samples_received += 1;
        self.buffer.snapshot()
    }

    /// Empty the history and return the (empty) snapshot
    pub(super) fn clear(&mut self) -> Snapshot {
        self.buffer.clear();
        self.buffer.snapshot()
    }

    /// Current sample history
    pub fn snapshot(&self) -> Snapshot {
        self.buffer.snapshot()
    }

    /// Check if the device has a bound producer
    pub fn has_producer(&self) -> bool {
        self.producer.is_some()
    }

    pub(super) fn stats(&self) -> DeviceStats {
        DeviceStats {
            buffered: self.buffer.len(),
            capacity: self.buffer.capacity(),
            samples_received: self.samples_received,
            has_producer: self.has_producer(),
            timestamp_range: self.buffer.timestamp_range(),
        }
    }
}

/// Statistics for a device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceStats {
    /// Samples currently buffered
    pub buffered: usize,
    /// Buffer capacity
    pub capacity: usize,
    /// Samples accepted since registration
    pub samples_received: u64,
    /// Whether a producer is bound
    pub has_producer: bool,
    /// Oldest and newest buffered timestamp
    pub timestamp_range: Option<(i64, i64)>,
}
