//! Bounded sample history for a single device
//!
//! Viewers that subscribe to a device receive the whole recent window on
//! every update, so the buffer keeps at most `capacity` samples and drops
//! the oldest one first when a new sample arrives on a full buffer.

use std::collections::VecDeque;
use std::ops::Deref;
use std::sync::Arc;

use serde::{Serialize, Serializer};

use super::sample::Sample;

/// Default number of samples kept per device
pub const DEFAULT_CAPACITY: usize = 200;

/// How sample timestamps are stored
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TimestampMode {
    /// Keep timestamps as reported by the producer
    #[default]
    Absolute,
    /// Rebase timestamps on the first sample since the buffer was created
    /// or last cleared
    RelativeToEpoch,
}

/// Immutable copy of a buffer's contents, oldest first
///
/// Cheap to clone; every reader shares the same allocation.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot(Arc<[Sample]>);

impl Snapshot {
    /// An empty snapshot
    pub fn empty() -> Self {
        Self(Arc::from(Vec::new()))
    }

    /// Timestamps of the contained samples, in order
    pub fn timestamps(&self) -> Vec<i64> {
        self.0.iter().map(|s| s.timestamp).collect()
    }
}

impl Serialize for Snapshot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.0.iter())
    }
}

impl Deref for Snapshot {
    type Target = [Sample];

    fn deref(&self) -> &[Sample] {
        &self.0
    }
}

/// Bounded FIFO of samples
#[derive(Debug)]
pub struct SampleBuffer {
    /// Maximum number of samples
    capacity: usize,
    /// Timestamp storage mode
    mode: TimestampMode,
    /// Raw timestamp of the first sample of the current epoch
    epoch_origin: Option<i64>,
    /// Buffered samples, oldest at the front
    samples: VecDeque<Sample>,
}

impl SampleBuffer {
    /// Create a buffer with the default capacity
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Create a buffer holding at most `capacity` samples (minimum 1)
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            mode: TimestampMode::Absolute,
            epoch_origin: None,
            samples: VecDeque::with_capacity(capacity),
        }
    }

    /// Set the timestamp mode
    pub fn timestamp_mode(mut self, mode: TimestampMode) -> Self {
        self.mode = mode;
        self
    }

    /// Append a sample, evicting the oldest one if the buffer is full
    pub fn push(&mut self, mut sample: Sample) {
        if self.mode == TimestampMode::RelativeToEpoch {
            let origin = *self.epoch_origin.get_or_insert(sample.timestamp);
            // Out-of-range offsets saturate at the i64 bounds
            sample.timestamp = sample.timestamp.saturating_sub(origin);
        }

        if self.samples.len() >= self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
    }

    /// Remove all samples and start a new timestamp epoch
    pub fn clear(&mut self) {
        self.samples.clear();
        self.epoch_origin = None;
    }

    /// Copy the current contents, oldest first
    pub fn snapshot(&self) -> Snapshot {
        Snapshot(self.samples.iter().cloned().collect())
    }

    /// Number of buffered samples
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Check if the buffer is empty
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Maximum number of samples
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Get the timestamp range of buffered samples
    pub fn timestamp_range(&self) -> Option<(i64, i64)> {
        let first = self.samples.front()?;
        let last = self.samples.back()?;
        Some((first.timestamp, last.timestamp))
    }
}

impl Default for SampleBuffer {
    fn default() -> Self {
        Self::new()
    }
}
