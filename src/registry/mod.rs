//! Device registry
//!
//! The registry owns one bounded sample buffer per known device and records
//! which connection produces for it.
//!
//! # Architecture
//!
//! ```text
//!                         DeviceRegistry
//!                  ┌──────────────────────────┐
//!                  │ devices: BTreeMap<Id,    │
//!                  │   DeviceEntry {          │
//!                  │     buffer,              │
//!                  │     producer,            │
//!                  │   }                      │
//!                  │ >                        │
//!                  └────────────┬─────────────┘
//!                               │
//!     [Producer]                │                  [Viewers]
//!     new-sample ──► append_sample() ──► Snapshot ──► router.broadcast_to_group()
//! ```
//!
//! # Snapshots
//!
//! `Snapshot` wraps an `Arc<[Sample]>`, so the frame built from it is encoded
//! once and shared by every subscriber of the device.

pub mod config;
pub mod entry;
pub mod store;

pub use config::{DisconnectPolicy, RegistryConfig};
pub use entry::{DeviceEntry, DeviceStats};
pub use store::{DeviceRegistry, Registration};
