//! Frame decode pipeline
//!
//! Ties the header codec, key store, cipher and inner-message codec into a
//! single per-frame call. Every frame ends in one of three outcomes:
//!
//! - rejected: shorter than a header, nothing to decode
//! - framed but not decrypted: header parsed, payload passed through
//!   untouched (no key for the channel hash, or decryption turned off)
//! - decrypted: payload replaced by the AES-CTR transform under the
//!   matching channel key
//!
//! Whenever decryption is enabled the final payload is additionally offered
//! to the inner-message codec. That decode is diagnostic: ciphertext or a
//! wrong key usually fails to parse, and a parse success is a hint rather
//! than proof, so its absence never fails the frame.
//!
//! The pipeline is stateless per call and holds only a read-only
//! [`KeyStore`]; it is safe to share across threads once constructed.

use thiserror::Error;
use tracing::warn;

use crate::crypto;
use crate::keystore::KeyStore;
use crate::proto::MeshData;
use crate::wire::{Layer1Header, HEADER_SIZE};

/// Why a byte blob was rejected before decoding.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// Input shorter than the 16-byte header; not a frame
    #[error("frame too short: {len} bytes, need at least 16")]
    TooShort {
        /// Length of the rejected input
        len: usize,
    },
}

/// What happened to the payload on its way into a [`DecodedFrame`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PayloadCrypto {
    /// Payload decrypted with the named channel's key
    Decrypted {
        /// Channel whose key matched the header hash
        channel: String,
    },
    /// No registered key matches the channel hash; payload untouched
    NoMatchingKey,
    /// A key matched but the cipher rejected it; payload untouched
    KeyRejected,
    /// Decryption turned off; payload untouched
    Disabled,
}

impl PayloadCrypto {
    /// Short label for one-line output.
    pub fn label(&self) -> String {
        match self {
            PayloadCrypto::Decrypted { channel } => format!("decrypted[{channel}]"),
            PayloadCrypto::NoMatchingKey => "no-key".to_string(),
            PayloadCrypto::KeyRejected => "key-rejected".to_string(),
            PayloadCrypto::Disabled => "decrypt-off".to_string(),
        }
    }
}

/// One fully processed frame.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedFrame {
    /// Parsed layer-1 header
    pub header: Layer1Header,
    /// The literal first 16 input bytes, kept bit-identical for forwarding
    pub header_bytes: [u8; HEADER_SIZE],
    /// Final payload: decrypted if a key matched, otherwise the input tail
    pub payload: Vec<u8>,
    /// How `payload` relates to the bytes on the air
    pub crypto: PayloadCrypto,
    /// Inner message, when the payload parsed as one
    pub message: Option<MeshData>,
}

impl DecodedFrame {
    /// Re-assembled frame for forwarding: original header bytes followed by
    /// the final payload.
    pub fn frame_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(HEADER_SIZE + self.payload.len());
        out.extend_from_slice(&self.header_bytes);
        out.extend_from_slice(&self.payload);
        out
    }

    /// One-line description of the frame.
    pub fn summary(&self) -> String {
        let h = &self.header;
        let mut out = format!(
            "0x{:08X} -> 0x{:08X}  id 0x{:08X}  ch 0x{:02X}  {:>3}B  {}",
            h.sender,
            h.dest,
            h.packet_id,
            h.channel_hash,
            self.payload.len(),
            self.crypto.label(),
        );
        if let Some(msg) = &self.message {
            out.push_str(&format!("  port {:?}", msg.port()));
            if let Some(text) = msg.text() {
                out.push_str(&format!("  {text:?}"));
            }
        }
        out
    }

    /// Multi-line report: header fields, crypto outcome, then the inner
    /// message fields or a hex dump of the payload.
    pub fn format_report(&self) -> String {
        let h = &self.header;
        let mut out = String::new();

        out.push_str("Header:\n");
        out.push_str(&format!("Dest        : 0x{:08X}\n", h.dest));
        out.push_str(&format!("Sender      : 0x{:08X}\n", h.sender));
        out.push_str(&format!("Packet-ID   : 0x{:08X}\n", h.packet_id));
        out.push_str(&format!(
            "Flags       : 0x{:02X} [HopLimit={} HopStart={} WantAck={} ViaMQTT={}]\n",
            h.flags.as_byte(),
            h.flags.hop_limit(),
            h.flags.hop_start(),
            h.flags.want_ack(),
            h.flags.via_mqtt()
        ));
        out.push_str(&format!("ChannelHash : 0x{:02X}\n", h.channel_hash));
        out.push_str(&format!("Next-hop    : {}\n", h.next_hop));
        out.push_str(&format!("Relay       : {}\n", h.relay));
        out.push_str(&format!("Crypto      : {}\n", self.crypto.label()));

        if let Some(msg) = &self.message {
            out.push_str("Payload (proto deserialized):\n");
            out.push_str(&format!("portnum     : {:?} ({})\n", msg.port(), msg.portnum));
            if let Some(text) = msg.text() {
                out.push_str(&format!("text        : {text:?}\n"));
            } else if !msg.payload.is_empty() {
                out.push_str(&format!("payload     : {} bytes\n", msg.payload.len()));
                out.push_str(&hexdump(&msg.payload));
                out.push('\n');
            }
            if msg.want_response {
                out.push_str("want-resp   : true\n");
            }
            if msg.dest != 0 {
                out.push_str(&format!("app dest    : 0x{:08X}\n", msg.dest));
            }
            if msg.source != 0 {
                out.push_str(&format!("app source  : 0x{:08X}\n", msg.source));
            }
            if msg.request_id != 0 {
                out.push_str(&format!("request-id  : 0x{:08X}\n", msg.request_id));
            }
            if msg.reply_id != 0 {
                out.push_str(&format!("reply-id    : 0x{:08X}\n", msg.reply_id));
            }
            if msg.emoji != 0 {
                out.push_str(&format!("emoji       : {}\n", msg.emoji));
            }
            if let Some(bits) = msg.bitfield {
                out.push_str(&format!("bitfield    : 0x{bits:02X}\n"));
            }
        } else if self.payload.is_empty() {
            out.push_str("Payload     : empty\n");
        } else {
            out.push_str("Payload (hex, no inner message):\n");
            out.push_str(&hexdump(&self.payload));
            out.push('\n');
        }

        out.trim_end().to_string()
    }
}

/// The per-frame decoder: a frozen key store plus a decrypt switch.
#[derive(Debug, Clone)]
pub struct FrameDecoder {
    keys: KeyStore,
    decrypt: bool,
}

impl FrameDecoder {
    /// Decoder over the given keys, decryption enabled.
    pub fn new(keys: KeyStore) -> Self {
        Self {
            keys,
            decrypt: true,
        }
    }

    /// Toggle decryption. When off, payloads pass through untouched and no
    /// inner decode is attempted.
    pub fn with_decrypt(mut self, decrypt: bool) -> Self {
        self.decrypt = decrypt;
        self
    }

    /// The key store this decoder resolves channel hashes against.
    pub fn keys(&self) -> &KeyStore {
        &self.keys
    }

    /// Decode one raw frame.
    ///
    /// Fails only on inputs shorter than a header. Everything else yields a
    /// [`DecodedFrame`]; missing keys, undecryptable payloads and inner
    /// decode failures are states of the result, not errors.
    pub fn decode(&self, raw: &[u8]) -> Result<DecodedFrame, DecodeError> {
        let (header, tail) =
            Layer1Header::parse_frame(raw).ok_or(DecodeError::TooShort { len: raw.len() })?;

        let mut header_bytes = [0u8; HEADER_SIZE];
        header_bytes.copy_from_slice(&raw[..HEADER_SIZE]);

        let (payload, state) = if !self.decrypt {
            (tail.to_vec(), PayloadCrypto::Disabled)
        } else {
            match self.keys.lookup(header.channel_hash) {
                None => (tail.to_vec(), PayloadCrypto::NoMatchingKey),
                Some(entry) => {
                    match crypto::transform(&entry.key, header.sender, header.packet_id, tail) {
                        Ok(plain) => (
                            plain,
                            PayloadCrypto::Decrypted {
                                channel: entry.name.clone(),
                            },
                        ),
                        Err(e) => {
                            // Store-validated keys should never get here
                            warn!("Decryption failed for channel '{}': {}", entry.name, e);
                            (tail.to_vec(), PayloadCrypto::KeyRejected)
                        }
                    }
                }
            }
        };

        let message = match state {
            PayloadCrypto::Disabled => None,
            _ => MeshData::try_decode(&payload),
        };

        Ok(DecodedFrame {
            header,
            header_bytes,
            payload,
            crypto: state,
            message,
        })
    }
}

/// Classic 16-column hex dump with an ASCII gutter, one line per row, no
/// trailing newline.
pub fn hexdump(data: &[u8]) -> String {
    const WIDTH: usize = 16;
    let mut lines = Vec::new();
    for (i, chunk) in data.chunks(WIDTH).enumerate() {
        let hexpart = chunk
            .iter()
            .map(|b| format!("{b:02X}"))
            .collect::<Vec<_>>()
            .join(" ");
        let ascii: String = chunk
            .iter()
            .map(|&b| if (0x20..=0x7E).contains(&b) { b as char } else { '.' })
            .collect();
        lines.push(format!("{:04X}  {hexpart:<48}  {ascii}", i * WIDTH));
    }
    lines.join("\n")
}
