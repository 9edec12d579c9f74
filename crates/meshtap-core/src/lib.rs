//! # Meshtap Core
//!
//! This crate decodes Meshtastic link-layer frames that an SDR receive
//! chain has already demodulated into raw bytes. It owns the protocol and
//! crypto semantics: header parsing, channel-hash key resolution, AES-CTR
//! payload decryption and best-effort decoding of the inner application
//! message. Transport, demodulation and presentation stay outside.
//!
//! ## Pipeline
//!
//! ```text
//! raw bytes ──► Layer1Header ──► KeyStore lookup ──► AES-CTR ──► MeshData
//!   (frame)      (16-byte         (channel hash       (payload    (inner
//!                 header)          -> key)             in clear)   message)
//! ```
//!
//! Every stage short of the header parse is best effort: a frame with no
//! matching key, an undecryptable payload or an unparseable inner message
//! still produces a [`DecodedFrame`] that forwards byte-identically.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use meshtap_core::{FrameDecoder, KeyStore};
//!
//! let mut keys = KeyStore::new();
//! keys.insert_psk("LongFast", "1PG7OiApB1nwvP+rz05pAQ==")?;
//!
//! let decoder = FrameDecoder::new(keys);
//! let frame = decoder.decode(&raw_bytes)?;
//! println!("{}", frame.summary());
//! ```

pub mod crypto;
pub mod decode;
pub mod keystore;
pub mod proto;
pub mod wire;

// Re-exports
pub use crypto::{channel_hash, counter_block, parse_psk, transform, xor_hash, KeyError};
pub use decode::{hexdump, DecodeError, DecodedFrame, FrameDecoder, PayloadCrypto};
pub use keystore::{ChannelKey, KeyStore};
pub use proto::{MeshData, PortNum};
pub use wire::{HeaderFlags, Layer1Header, HEADER_SIZE};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::decode::{DecodedFrame, FrameDecoder, PayloadCrypto};
    pub use crate::keystore::KeyStore;
    pub use crate::wire::Layer1Header;
}
