//! Client and server events
//!
//! Every message on the socket is a JSON envelope:
//!
//! ```json
//! { "event": "subscribe-device", "data": { "deviceId": "d2", "previousDeviceId": "d1" } }
//! ```
//!
//! Client events form a closed set. Decoding looks the event name up once and
//! parses the payload into the variant's own type, so the session layer can
//! dispatch with a single exhaustive `match`.
//!
//! The snake_case names used by the first generation of socket clients
//! (`new_device`, `get_devices`, `display_device`, `new_motion_data`,
//! `clear_motion_data`) are accepted as aliases.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::telemetry::{DeviceId, Sample, Snapshot};

/// Payload naming a single device
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceRef {
    pub device_id: DeviceId,
}

/// Payload of a subscription change
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscribe {
    /// Device to start viewing
    pub device_id: DeviceId,

    /// Device the viewer was watching before, if the client tracks it
    #[serde(default, alias = "oldDeviceId", skip_serializing_if = "Option::is_none")]
    pub previous_device_id: Option<DeviceId>,
}

/// Event sent by a producer or viewer
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ClientEvent {
    /// Announce a device this connection produces for
    RegisterDevice(DeviceRef),
    /// Ask for the current device list
    ListDevices,
    /// Remove every device
    ClearAllDevices,
    /// Switch the viewed device
    SubscribeDevice(Subscribe),
    /// Submit one sample
    NewSample(Sample),
    /// Empty a device's history
    ClearSamples(DeviceRef),
}

impl ClientEvent {
    /// Wire name of the event
    pub fn name(&self) -> &'static str {
        match self {
            ClientEvent::RegisterDevice(_) => "register-device",
            ClientEvent::ListDevices => "list-devices",
            ClientEvent::ClearAllDevices => "clear-all-devices",
            ClientEvent::SubscribeDevice(_) => "subscribe-device",
            ClientEvent::NewSample(_) => "new-sample",
            ClientEvent::ClearSamples(_) => "clear-samples",
        }
    }

    /// Build an event from its name and raw payload
    pub fn from_parts(name: &str, data: Value) -> Result<Self> {
        let event = match name {
            "register-device" | "new_device" => ClientEvent::RegisterDevice(payload(data)?),
            "list-devices" | "get_devices" => ClientEvent::ListDevices,
            "clear-all-devices" | "clear_all_devices" => ClientEvent::ClearAllDevices,
            "subscribe-device" | "display_device" => ClientEvent::SubscribeDevice(payload(data)?),
            "new-sample" | "new_motion_data" => ClientEvent::NewSample(payload(data)?),
            "clear-samples" | "clear_motion_data" => ClientEvent::ClearSamples(payload(data)?),
            other => return Err(Error::UnknownEvent(other.to_string())),
        };
        Ok(event)
    }
}

fn payload<T: DeserializeOwned>(data: Value) -> Result<T> {
    serde_json::from_value(data).map_err(Error::Decode)
}

/// Raw envelope before the event name is resolved
#[derive(Debug, Deserialize)]
pub(super) struct Envelope {
    pub event: String,
    #[serde(default)]
    pub data: Value,
}

/// Event sent by the server
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ServerEvent {
    /// Known device ids
    DeviceList(Vec<DeviceId>),
    /// Buffered history of one device, oldest first
    SampleBatch(Snapshot),
}

impl ServerEvent {
    /// Wire name of the event
    pub fn name(&self) -> &'static str {
        match self {
            ServerEvent::DeviceList(_) => "device-list",
            ServerEvent::SampleBatch(_) => "sample-batch",
        }
    }
}
