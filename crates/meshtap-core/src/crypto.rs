//! Channel crypto
//!
//! The Meshtastic transport cipher and the key fingerprint that selects it.
//!
//! Payloads are AES-CTR encrypted with a per-channel pre-shared key (16
//! bytes for AES-128, 32 for AES-256). The initial counter block is derived
//! from header fields, so a receiver needs nothing beyond the frame itself
//! and the right PSK. Counter mode is an involution: [`transform`] both
//! encrypts and decrypts.
//!
//! The channel hash carried in the header is a one-byte XOR-fold of the
//! channel name and key, as computed by the firmware (`Channels.cpp`). 256
//! possible values means distinct channels can collide; that ambiguity is
//! part of the wire format.

use aes::cipher::{KeyIvInit, StreamCipher};
use aes::{Aes128, Aes256};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use thiserror::Error;

type Aes128Ctr = ctr::Ctr128BE<Aes128>;
type Aes256Ctr = ctr::Ctr128BE<Aes256>;

/// Errors for key material handling
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KeyError {
    /// Key is not a valid AES-128/AES-256 key
    #[error("PSK must be 16 or 32 bytes, got {actual}")]
    InvalidKeyLength {
        /// Actual key length in bytes
        actual: usize,
    },

    /// PSK text is neither valid hex nor valid base64
    #[error("PSK must be hex or base64: {reason}")]
    InvalidPskText {
        /// What the underlying decoder rejected
        reason: String,
    },
}

/// Byte-wise XOR fold, the firmware's one-byte fingerprint primitive
pub fn xor_hash(data: &[u8]) -> u8 {
    data.iter().fold(0, |h, b| h ^ b)
}

/// Compute the one-byte channel hash for a (name, key) pair.
///
/// `xor_hash(name) ^ xor_hash(key)`, matching what transmitting radios put
/// in the header's `channel_hash` field.
pub fn channel_hash(name: &str, key: &[u8]) -> u8 {
    xor_hash(name.as_bytes()) ^ xor_hash(key)
}

/// Parse PSK text as configured by the user.
///
/// A string of 2-64 hex digits is decoded as hex; anything else is tried as
/// standard base64. Hex wins when the text is valid under both readings.
/// Surrounding whitespace is ignored. The returned bytes are not
/// length-checked here; that happens when the key enters a
/// [`KeyStore`](crate::KeyStore).
pub fn parse_psk(text: &str) -> Result<Vec<u8>, KeyError> {
    let text = text.trim();

    let looks_hex =
        (2..=64).contains(&text.len()) && text.bytes().all(|b| b.is_ascii_hexdigit());
    if looks_hex {
        return hex::decode(text).map_err(|e| KeyError::InvalidPskText {
            reason: e.to_string(),
        });
    }

    BASE64.decode(text).map_err(|e| KeyError::InvalidPskText {
        reason: e.to_string(),
    })
}

/// Build the 16-byte initial AES-CTR counter for a frame.
///
/// Layout: packet_id little-endian zero-padded to 8 bytes, then sender
/// little-endian (4 bytes), then 4 zero bytes. Only 12 bytes of the block
/// vary, and senders that reuse a packet_id reuse the keystream; that is a
/// property of the wire protocol, not something a receiver can repair.
pub fn counter_block(sender: u32, packet_id: u32) -> [u8; 16] {
    let mut block = [0u8; 16];
    block[0..4].copy_from_slice(&packet_id.to_le_bytes());
    block[8..12].copy_from_slice(&sender.to_le_bytes());
    block
}

/// AES-CTR transform of `data` under `key` and the frame's counter.
///
/// One function for both directions: applying it twice with the same
/// arguments returns the original bytes. Fails only on a key that is not
/// 16 or 32 bytes.
pub fn transform(
    key: &[u8],
    sender: u32,
    packet_id: u32,
    data: &[u8],
) -> Result<Vec<u8>, KeyError> {
    let block = counter_block(sender, packet_id);
    let mut buf = data.to_vec();

    match key.len() {
        16 => {
            let mut cipher = Aes128Ctr::new_from_slices(key, &block)
                .map_err(|_| KeyError::InvalidKeyLength { actual: key.len() })?;
            cipher.apply_keystream(&mut buf);
        }
        32 => {
            let mut cipher = Aes256Ctr::new_from_slices(key, &block)
                .map_err(|_| KeyError::InvalidKeyLength { actual: key.len() })?;
            cipher.apply_keystream(&mut buf);
        }
        actual => return Err(KeyError::InvalidKeyLength { actual }),
    }

    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_xor_hash() {
        assert_eq!(xor_hash(b""), 0);
        assert_eq!(xor_hash(b"ab"), 0x61 ^ 0x62);
        assert_eq!(xor_hash(b"\xAA\xAA"), 0);
        assert_eq!(xor_hash(b"equalbeat"), 0x7E);
    }

    #[test]
    fn test_channel_hash_deterministic() {
        let key = [0u8; 16];
        assert_eq!(channel_hash("equalbeat", &key), 0x7E);
        assert_eq!(
            channel_hash("equalbeat", &key),
            channel_hash("equalbeat", &key)
        );

        // Key bytes fold into the hash too
        let mut key2 = [0u8; 16];
        key2[0] = 0xFF;
        assert_eq!(channel_hash("equalbeat", &key2), 0x7E ^ 0xFF);
    }

    #[test]
    fn test_parse_psk_hex() {
        assert_eq!(parse_psk("CAFE").unwrap(), vec![0xCA, 0xFE]);
        assert_eq!(parse_psk("cafe").unwrap(), vec![0xCA, 0xFE]);
        assert_eq!(parse_psk("  CAFE\n").unwrap(), vec![0xCA, 0xFE]);

        // 64 hex digits is the longest hex reading (a 32-byte key)
        let long = "00".repeat(32);
        assert_eq!(parse_psk(&long).unwrap().len(), 32);
    }

    #[test]
    fn test_parse_psk_base64() {
        // The well-known default channel key
        assert_eq!(
            parse_psk("1PG7OiApB1nwvP+rz05pAQ==").unwrap(),
            hex::decode("d4f1bb3a20290759f0bcffabcf4e6901").unwrap()
        );
        assert_eq!(parse_psk("AQ==").unwrap(), vec![0x01]);
    }

    #[test]
    fn test_parse_psk_hex_wins_over_base64() {
        // "CAFE" is also valid base64 (08 05 14); the hex reading is used
        assert_eq!(parse_psk("CAFE").unwrap(), vec![0xCA, 0xFE]);
    }

    #[test]
    fn test_parse_psk_rejects_garbage() {
        // Odd-length hex matches the hex pattern but cannot decode
        assert!(matches!(
            parse_psk("ABC"),
            Err(KeyError::InvalidPskText { .. })
        ));
        assert!(parse_psk("not a key !!!").is_err());
        assert!(parse_psk("").is_err());
    }

    #[test]
    fn test_counter_block_layout() {
        let block = counter_block(0xCAFED00D, 1);
        assert_eq!(
            block,
            [
                0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, // packet_id
                0x0D, 0xD0, 0xFE, 0xCA, // sender
                0x00, 0x00, 0x00, 0x00, // tail
            ]
        );
    }

    #[test]
    fn test_transform_is_involution() {
        let key16 = [0x42u8; 16];
        let key32 = [0x42u8; 32];
        let plain = b"attack at dawn";

        for key in [&key16[..], &key32[..]] {
            let ct = transform(key, 0xCAFED00D, 7, plain).unwrap();
            assert_ne!(ct, plain.to_vec());
            let pt = transform(key, 0xCAFED00D, 7, &ct).unwrap();
            assert_eq!(pt, plain.to_vec());
        }
    }

    #[test]
    fn test_transform_counter_inputs_matter() {
        let key = [7u8; 16];
        let plain = [0u8; 8];
        let a = transform(&key, 1, 1, &plain).unwrap();
        let b = transform(&key, 1, 2, &plain).unwrap();
        let c = transform(&key, 2, 1, &plain).unwrap();
        assert_ne!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_transform_streams_across_blocks() {
        // CTR keystream is positional: a longer message shares its prefix
        let key = [9u8; 32];
        let long = [0xA5u8; 40];
        let ct_long = transform(&key, 3, 4, &long).unwrap();
        let ct_short = transform(&key, 3, 4, &long[..20]).unwrap();
        assert_eq!(&ct_long[..20], &ct_short[..]);
    }

    #[test]
    fn test_transform_rejects_bad_key_length() {
        for len in [0usize, 1, 15, 17, 31, 33] {
            let key = vec![0u8; len];
            assert_eq!(
                transform(&key, 0, 0, b"x"),
                Err(KeyError::InvalidKeyLength { actual: len })
            );
        }
    }

    #[test]
    fn test_transform_empty_payload() {
        let key = [1u8; 16];
        assert_eq!(transform(&key, 5, 6, b"").unwrap(), Vec::<u8>::new());
    }

    proptest! {
        #[test]
        fn prop_transform_symmetry(
            data in proptest::collection::vec(any::<u8>(), 0..128),
            sender in any::<u32>(),
            packet_id in any::<u32>(),
            key_seed in any::<u8>(),
            wide in any::<bool>(),
        ) {
            let key = vec![key_seed; if wide { 32 } else { 16 }];
            let ct = transform(&key, sender, packet_id, &data).unwrap();
            let pt = transform(&key, sender, packet_id, &ct).unwrap();
            prop_assert_eq!(pt, data);
        }
    }
}
