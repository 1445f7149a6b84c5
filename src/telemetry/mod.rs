//! Motion telemetry data
//!
//! This module provides:
//! - The wire-level sample record and device identifier
//! - The bounded per-device sample buffer

pub mod buffer;
pub mod sample;

pub use buffer::{SampleBuffer, Snapshot, TimestampMode, DEFAULT_CAPACITY};
pub use sample::{Acceleration, DeviceId, Sample};
