//! Sample and device identifier types
//!
//! A sample is one accelerometer reading as it travels over the wire:
//!
//! ```json
//! {
//!   "deviceId": "TJVSV",
//!   "timeStamp": 1023,
//!   "acceleration": { "x": 0.0, "y": 0.0, "z": -9.81 }
//! }
//! ```
//!
//! The timestamp is in milliseconds.

use std::borrow::Borrow;

use serde::{Deserialize, Deserializer, Serialize};

/// Identifier of a motion device
///
/// Deserialization accepts any string, including the empty one, so that the
/// session layer can reject empty identifiers silently instead of failing the
/// whole frame.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceId(String);

impl DeviceId {
    /// Create a device identifier without validation
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Create a device identifier, rejecting the empty string
    pub fn parse(id: impl Into<String>) -> Option<Self> {
        let id = id.into();
        if id.is_empty() {
            None
        } else {
            Some(Self(id))
        }
    }

    /// Get the identifier as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Check if the identifier is empty
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Display for DeviceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for DeviceId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for DeviceId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// 3-axis acceleration in m/s²
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Acceleration {
    /// X axis
    pub x: f64,
    /// Y axis
    pub y: f64,
    /// Z axis
    pub z: f64,
}

impl Acceleration {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

/// One timestamped acceleration reading attributed to a device
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sample {
    /// Device that produced the reading
    pub device_id: DeviceId,

    /// Timestamp in milliseconds
    #[serde(rename = "timeStamp", deserialize_with = "millis")]
    pub timestamp: i64,

    /// Acceleration vector
    pub acceleration: Acceleration,
}

impl Sample {
    /// Create a new sample
    pub fn new(device_id: impl Into<DeviceId>, timestamp: i64, acceleration: Acceleration) -> Self {
        Self {
            device_id: device_id.into(),
            timestamp,
            acceleration,
        }
    }
}

/// Browsers report `performance.now()`-style fractional milliseconds; keep
/// the integer part.
fn millis<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Millis {
        Int(i64),
        Float(f64),
    }

    Ok(match Millis::deserialize(deserializer)? {
        Millis::Int(ms) => ms,
        Millis::Float(ms) => ms.trunc() as i64,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_id_parse_rejects_empty() {
        assert!(DeviceId::parse("").is_none());
        assert_eq!(DeviceId::parse("d1").unwrap().as_str(), "d1");
    }

    #[test]
    fn test_sample_wire_names() {
        let sample = Sample::new("TJVSV", 1023, Acceleration::new(0.0, 0.0, -9.81));
        let json = serde_json::to_value(&sample).unwrap();

        assert_eq!(json["deviceId"], "TJVSV");
        assert_eq!(json["timeStamp"], 1023);
        assert_eq!(json["acceleration"]["z"], -9.81);
    }

    #[test]
    fn test_sample_accepts_fractional_timestamp() {
        let sample: Sample = serde_json::from_str(
            r#"{"deviceId":"d1","timeStamp":1500.75,"acceleration":{"x":1,"y":2,"z":3}}"#,
        )
        .unwrap();

        assert_eq!(sample.timestamp, 1500);
        assert_eq!(sample.acceleration, Acceleration::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn test_out_of_range_timestamp_saturates() {
        let sample: Sample = serde_json::from_str(
            r#"{"deviceId":"d1","timeStamp":-1e300,"acceleration":{"x":0,"y":0,"z":0}}"#,
        )
        .unwrap();

        assert_eq!(sample.timestamp, i64::MIN);
    }
}
