//! Meshtastic layer-1 header
//!
//! Implements the fixed 16-byte radio header prefixed to every mesh frame.
//! All multi-byte fields are little-endian.
//!
//! ## Header Format (16 bytes)
//!
//! ```text
//! Offset  Size  Field
//! ------  ----  -----
//! 0x00    4B    dest (destination node ID, 0xFFFFFFFF = broadcast)
//! 0x04    4B    sender (source node ID)
//! 0x08    4B    packet_id (32-bit per-sender ID, doubles as nonce material)
//! 0x0C    1B    flags (hop_limit:3 | want_ack:1 | via_mqtt:1 | hop_start:3)
//! 0x0D    1B    channel_hash (selects the decryption key, see crypto module)
//! 0x0E    1B    next_hop (routing hint)
//! 0x0F    1B    relay (last relay node, routing hint)
//! ```
//!
//! ## Flags Byte Layout
//!
//! ```text
//! Bits 0-2:  hop_limit (remaining hops, 0-7)
//! Bit 3:     want_ack (1 = request ACK)
//! Bit 4:     via_mqtt (1 = received via MQTT gateway)
//! Bits 5-7:  hop_start (initial hop count, 0-7)
//! ```
//!
//! This layout is a cross-process compatibility contract: it must match
//! byte-for-byte what transmitting radios put on the air.

/// Layer-1 header size in bytes
pub const HEADER_SIZE: usize = 16;

/// Layer-1 header flags byte
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HeaderFlags(u8);

impl HeaderFlags {
    /// Create new flags with all bits clear
    pub fn new() -> Self {
        Self(0)
    }

    /// Create from raw byte
    pub fn from_byte(byte: u8) -> Self {
        Self(byte)
    }

    /// Get raw byte value
    pub fn as_byte(&self) -> u8 {
        self.0
    }

    /// Get hop limit (bits 0-2, 0-7)
    pub fn hop_limit(&self) -> u8 {
        self.0 & 0x07
    }

    /// Set hop limit (0-7)
    pub fn set_hop_limit(&mut self, limit: u8) {
        self.0 = (self.0 & 0xF8) | (limit & 0x07);
    }

    /// Get want_ack flag (bit 3)
    pub fn want_ack(&self) -> bool {
        (self.0 & 0x08) != 0
    }

    /// Set want_ack flag
    pub fn set_want_ack(&mut self, want: bool) {
        if want {
            self.0 |= 0x08;
        } else {
            self.0 &= !0x08;
        }
    }

    /// Get via_mqtt flag (bit 4)
    pub fn via_mqtt(&self) -> bool {
        (self.0 & 0x10) != 0
    }

    /// Set via_mqtt flag
    pub fn set_via_mqtt(&mut self, via: bool) {
        if via {
            self.0 |= 0x10;
        } else {
            self.0 &= !0x10;
        }
    }

    /// Get hop start (bits 5-7, 0-7)
    pub fn hop_start(&self) -> u8 {
        (self.0 >> 5) & 0x07
    }

    /// Set hop start (0-7)
    pub fn set_hop_start(&mut self, start: u8) {
        self.0 = (self.0 & 0x1F) | ((start & 0x07) << 5);
    }
}

/// Meshtastic layer-1 header (16 bytes, little-endian)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layer1Header {
    /// Destination node ID (broadcast = 0xFFFFFFFF)
    pub dest: u32,

    /// Source node ID
    pub sender: u32,

    /// 32-bit packet ID (unique per sender, nonce material for the cipher)
    pub packet_id: u32,

    /// Flags byte (hop_limit, want_ack, via_mqtt, hop_start)
    pub flags: HeaderFlags,

    /// Channel hash (XOR-fold fingerprint of channel name and key)
    pub channel_hash: u8,

    /// Next hop for routed packets (0 = broadcast/direct)
    pub next_hop: u8,

    /// Last relay node (0 = not set)
    pub relay: u8,
}

impl Layer1Header {
    /// Header size in bytes
    pub const SIZE: usize = HEADER_SIZE;

    /// Broadcast destination
    pub const BROADCAST: u32 = 0xFFFFFFFF;

    /// Check if this frame is addressed to everyone
    pub fn is_broadcast(&self) -> bool {
        self.dest == Self::BROADCAST
    }

    /// Serialize to bytes (little-endian)
    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut buf = [0u8; HEADER_SIZE];

        buf[0..4].copy_from_slice(&self.dest.to_le_bytes());
        buf[4..8].copy_from_slice(&self.sender.to_le_bytes());
        buf[8..12].copy_from_slice(&self.packet_id.to_le_bytes());
        buf[12] = self.flags.as_byte();
        buf[13] = self.channel_hash;
        buf[14] = self.next_hop;
        buf[15] = self.relay;

        buf
    }

    /// Parse from bytes (little-endian)
    ///
    /// Returns `None` for anything shorter than 16 bytes: a short input is
    /// not a frame, and no partial header is ever produced.
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < HEADER_SIZE {
            return None;
        }

        let dest = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        let sender = u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);
        let packet_id = u32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]);
        let flags = HeaderFlags::from_byte(bytes[12]);
        let channel_hash = bytes[13];
        let next_hop = bytes[14];
        let relay = bytes[15];

        Some(Self {
            dest,
            sender,
            packet_id,
            flags,
            channel_hash,
            next_hop,
            relay,
        })
    }

    /// Split a raw frame into its header and payload tail.
    ///
    /// The payload is everything from offset 16 onward, borrowed from the
    /// input; it may be empty. `None` if the input is shorter than a header.
    pub fn parse_frame(raw: &[u8]) -> Option<(Self, &[u8])> {
        let header = Self::from_bytes(raw)?;
        Some((header, &raw[HEADER_SIZE..]))
    }
}

impl Default for Layer1Header {
    fn default() -> Self {
        Self {
            dest: Self::BROADCAST,
            sender: 0,
            packet_id: 0,
            flags: HeaderFlags::new(),
            channel_hash: 0,
            next_hop: 0,
            relay: 0,
        }
    }
}
