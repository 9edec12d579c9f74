//! Meshtastic wire format
//!
//! The on-air packet format used by Meshtastic radios: a 16-byte
//! little-endian header followed by a variable-length payload, which is
//! AES-CTR encrypted whenever the sending node has a channel key.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use meshtap_core::wire::{Layer1Header, HEADER_SIZE};
//!
//! // Parse a received frame into header + payload tail
//! let (header, payload) = Layer1Header::parse_frame(&received).unwrap();
//! if header.is_broadcast() {
//!     // ...
//! }
//!
//! // Re-serialize a header
//! let bytes = header.to_bytes();
//! ```

pub mod header;

pub use header::{HeaderFlags, Layer1Header, HEADER_SIZE};
