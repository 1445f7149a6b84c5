//! Encoded frames
//!
//! A `Frame` is one serialized server event. `bytes::Bytes` is reference
//! counted, so a frame encoded once for a group broadcast is shared by every
//! recipient's send queue instead of being copied per viewer.

use bytes::Bytes;

use crate::error::{Error, Result};

use super::event::{ClientEvent, Envelope, ServerEvent};

/// Serialized JSON text ready for the socket
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame(Bytes);

impl Frame {
    /// Encode a server event
    pub fn encode(event: &ServerEvent) -> Result<Self> {
        serde_json::to_vec(event)
            .map(|json| Self(Bytes::from(json)))
            .map_err(Error::Encode)
    }

    /// Wrap static text
    pub fn from_static(text: &'static str) -> Self {
        Self(Bytes::from_static(text.as_bytes()))
    }

    /// Frame contents as text
    pub fn as_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.0).ok()
    }

    /// Length in bytes
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if the frame is empty
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Underlying buffer
    pub fn into_bytes(self) -> Bytes {
        self.0
    }
}

/// Decode a client frame
pub fn decode(text: &str) -> Result<ClientEvent> {
    let envelope: Envelope = serde_json::from_str(text).map_err(Error::Decode)?;
    ClientEvent::from_parts(&envelope.event, envelope.data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::{Acceleration, DeviceId, Sample, SampleBuffer};

    #[test]
    fn test_encode_sample_batch() {
        let mut buffer = SampleBuffer::with_capacity(2);
        buffer.push(Sample::new("d1", 5, Acceleration::new(1.0, 0.0, 0.0)));

        let frame = Frame::encode(&ServerEvent::SampleBatch(buffer.snapshot())).unwrap();
        let json: serde_json::Value = serde_json::from_str(frame.as_str().unwrap()).unwrap();

        assert_eq!(json["event"], "sample-batch");
        assert_eq!(json["data"][0]["deviceId"], "d1");
        assert_eq!(json["data"][0]["timeStamp"], 5);
    }

    #[test]
    fn test_clones_share_buffer() {
        let frame = Frame::encode(&ServerEvent::DeviceList(vec![DeviceId::new("d1")])).unwrap();
        let copy = frame.clone();

        assert_eq!(frame.into_bytes().as_ptr(), copy.into_bytes().as_ptr());
    }

    #[test]
    fn test_decode_without_data() {
        assert_eq!(
            decode(r#"{"event":"list-devices"}"#).unwrap(),
            ClientEvent::ListDevices
        );
    }

    #[test]
    fn test_decode_invalid_json() {
        assert!(matches!(decode("not json"), Err(Error::Decode(_))));
        assert!(matches!(decode(r#"{"data":{}}"#), Err(Error::Decode(_))));
    }
}
