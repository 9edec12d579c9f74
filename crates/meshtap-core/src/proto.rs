//! Inner mesh payload
//!
//! Once a frame's payload is in the clear it usually holds one protobuf
//! `Data` message: an application port number plus opaque port payload.
//! The message definition mirrors the firmware's `mesh.proto`.
//!
//! Decoding is best effort. Wrong-key "plaintext" is keystream noise and
//! generally fails to parse, but short noise can parse by accident and an
//! empty payload parses as the default message, so a successful decode is a
//! diagnostic hint rather than proof of a valid frame.

use prost::Message;

/// Application port carried in [`MeshData::portnum`].
///
/// Values follow the firmware's `portnums.proto`. Ports this decoder does
/// not know map to [`PortNum::UnknownApp`] via [`MeshData::port`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum PortNum {
    UnknownApp = 0,
    TextMessageApp = 1,
    RemoteHardwareApp = 2,
    PositionApp = 3,
    NodeinfoApp = 4,
    RoutingApp = 5,
    AdminApp = 6,
    TextMessageCompressedApp = 7,
    WaypointApp = 8,
    AudioApp = 9,
    DetectionSensorApp = 10,
    AlertApp = 11,
    ReplyApp = 32,
    IpTunnelApp = 33,
    PaxcounterApp = 34,
    SerialApp = 64,
    StoreForwardApp = 65,
    RangeTestApp = 66,
    TelemetryApp = 67,
    ZpsApp = 68,
    SimulatorApp = 69,
    TracerouteApp = 70,
    NeighborinfoApp = 71,
    AtakPlugin = 72,
    MapReportApp = 73,
    PowerstressApp = 74,
    PrivateApp = 256,
    AtakForwarder = 257,
    Max = 511,
}

/// The decrypted application-layer message inside a frame payload.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct MeshData {
    /// Application port, see [`PortNum`]
    #[prost(enumeration = "PortNum", tag = "1")]
    pub portnum: i32,
    /// Port-specific payload bytes
    #[prost(bytes = "vec", tag = "2")]
    pub payload: Vec<u8>,
    /// Sender wants an application-level response
    #[prost(bool, tag = "3")]
    pub want_response: bool,
    /// Application-layer destination node
    #[prost(fixed32, tag = "4")]
    pub dest: u32,
    /// Application-layer source node
    #[prost(fixed32, tag = "5")]
    pub source: u32,
    /// Request this message answers, 0 if none
    #[prost(fixed32, tag = "6")]
    pub request_id: u32,
    /// Message this one replies to, 0 if none
    #[prost(fixed32, tag = "7")]
    pub reply_id: u32,
    /// Emoji tapback indicator
    #[prost(fixed32, tag = "8")]
    pub emoji: u32,
    /// Capability bits, absent on older firmware
    #[prost(uint32, optional, tag = "9")]
    pub bitfield: Option<u32>,
}

impl MeshData {
    /// Best-effort decode of plaintext payload bytes.
    ///
    /// `None` means the bytes are not a well-formed message (the usual
    /// outcome for wrong-key noise). Empty input decodes to the default
    /// message, as the protobuf format dictates.
    pub fn try_decode(bytes: &[u8]) -> Option<Self> {
        Self::decode(bytes).ok()
    }

    /// The port as an enum, unknown values mapped to `UnknownApp`.
    pub fn port(&self) -> PortNum {
        PortNum::try_from(self.portnum).unwrap_or(PortNum::UnknownApp)
    }

    /// Payload as UTF-8 text, for text-message ports only.
    pub fn text(&self) -> Option<&str> {
        match self.port() {
            PortNum::TextMessageApp => std::str::from_utf8(&self.payload).ok(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_wire_bytes_decode() {
        // portnum=1 (varint tag 1), payload="hi" (bytes tag 2)
        let msg = MeshData::try_decode(&[0x08, 0x01, 0x12, 0x02, 0x68, 0x69]).unwrap();
        assert_eq!(msg.port(), PortNum::TextMessageApp);
        assert_eq!(msg.payload, b"hi");
        assert_eq!(msg.text(), Some("hi"));

        // dest is fixed32 tag 4
        let msg = MeshData::try_decode(&[0x25, 0xFF, 0xFF, 0xFF, 0xFF]).unwrap();
        assert_eq!(msg.dest, 0xFFFF_FFFF);
    }

    #[test]
    fn test_roundtrip_all_fields() {
        let msg = MeshData {
            portnum: PortNum::TracerouteApp as i32,
            payload: vec![1, 2, 3],
            want_response: true,
            dest: 0xCAFED00D,
            source: 0x01020304,
            request_id: 42,
            reply_id: 7,
            emoji: 1,
            bitfield: Some(1),
        };
        let bytes = msg.encode_to_vec();
        assert_eq!(MeshData::try_decode(&bytes), Some(msg));
    }

    #[test]
    fn test_empty_payload_is_default_message() {
        let msg = MeshData::try_decode(b"").unwrap();
        assert_eq!(msg, MeshData::default());
        assert_eq!(msg.port(), PortNum::UnknownApp);
        assert_eq!(msg.text(), None);
    }

    #[test]
    fn test_malformed_bytes_decode_to_none() {
        // Field number 0 is not a legal protobuf key
        assert_eq!(MeshData::try_decode(&[0x00]), None);

        // Length-delimited field cut short
        let mut bytes = MeshData {
            portnum: PortNum::TextMessageApp as i32,
            payload: b"hello".to_vec(),
            ..Default::default()
        }
        .encode_to_vec();
        bytes.pop();
        assert_eq!(MeshData::try_decode(&bytes), None);
    }

    #[test]
    fn test_unknown_port_maps_to_unknown_app() {
        let msg = MeshData {
            portnum: 4242,
            ..Default::default()
        };
        assert_eq!(msg.port(), PortNum::UnknownApp);
    }

    #[test]
    fn test_text_only_for_text_port() {
        let msg = MeshData {
            portnum: PortNum::TelemetryApp as i32,
            payload: b"hi".to_vec(),
            ..Default::default()
        };
        assert_eq!(msg.text(), None);

        let msg = MeshData {
            portnum: PortNum::TextMessageApp as i32,
            payload: vec![0xFF, 0xFE],
            ..Default::default()
        };
        // Text port with non-UTF-8 payload
        assert_eq!(msg.text(), None);
    }
}
