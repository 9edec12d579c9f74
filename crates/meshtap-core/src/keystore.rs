//! Channel key registry
//!
//! Frames do not name their channel; they carry a one-byte hash of the
//! channel name and key. The [`KeyStore`] indexes registered keys by that
//! byte so the decoder can go straight from header to key material.
//!
//! The hash space is 256 values, so distinct channels can collide. When they
//! do, the key registered last owns the slot. Receivers cannot do better:
//! the frame itself carries nothing that would disambiguate.

use std::collections::HashMap;

use tracing::debug;

use crate::crypto::{self, KeyError};

/// A channel key as registered by the operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelKey {
    /// Channel name, e.g. "LongFast"
    pub name: String,
    /// Raw AES key bytes (16 or 32)
    pub key: Vec<u8>,
}

/// Channel keys indexed by the hash byte frames carry.
#[derive(Debug, Clone, Default)]
pub struct KeyStore {
    channels: HashMap<u8, ChannelKey>,
}

impl KeyStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register raw key bytes under a channel name.
    ///
    /// Returns the hash byte the channel occupies. Rejects keys that are not
    /// 16 or 32 bytes. A channel whose hash collides with an earlier entry
    /// replaces it.
    pub fn insert(&mut self, name: &str, key: Vec<u8>) -> Result<u8, KeyError> {
        if key.len() != 16 && key.len() != 32 {
            return Err(KeyError::InvalidKeyLength { actual: key.len() });
        }
        let hash = crypto::channel_hash(name, &key);
        if let Some(prev) = self.channels.get(&hash) {
            if prev.name != name {
                debug!(
                    "Channel '{}' collides with '{}' on hash 0x{:02X}, replacing",
                    name, prev.name, hash
                );
            }
        }
        debug!("Channel '{}' -> hash 0x{:02X}", name, hash);
        self.channels.insert(
            hash,
            ChannelKey {
                name: name.to_string(),
                key,
            },
        );
        Ok(hash)
    }

    /// Parse PSK text (hex or base64) and register it under `name`.
    pub fn insert_psk(&mut self, name: &str, psk: &str) -> Result<u8, KeyError> {
        let key = crypto::parse_psk(psk)?;
        self.insert(name, key)
    }

    /// Key registered for a frame's channel hash, if any.
    pub fn lookup(&self, hash: u8) -> Option<&ChannelKey> {
        self.channels.get(&hash)
    }

    /// Number of occupied hash slots.
    pub fn len(&self) -> usize {
        self.channels.len()
    }

    /// True when no keys are registered.
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Registered entries sorted by hash byte.
    pub fn entries(&self) -> Vec<(u8, &ChannelKey)> {
        let mut out: Vec<_> = self.channels.iter().map(|(h, k)| (*h, k)).collect();
        out.sort_by_key(|(h, _)| *h);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_lookup() {
        let mut keys = KeyStore::new();
        let hash = keys.insert("equalbeat", vec![0u8; 16]).unwrap();
        assert_eq!(hash, 0x7E);

        let entry = keys.lookup(0x7E).unwrap();
        assert_eq!(entry.name, "equalbeat");
        assert_eq!(entry.key, vec![0u8; 16]);
        assert!(keys.lookup(0x7F).is_none());
    }

    #[test]
    fn test_insert_rejects_bad_lengths() {
        let mut keys = KeyStore::new();
        for len in [0usize, 1, 15, 17, 31, 33] {
            assert_eq!(
                keys.insert("x", vec![0u8; len]),
                Err(KeyError::InvalidKeyLength { actual: len })
            );
        }
        assert!(keys.is_empty());
    }

    #[test]
    fn test_insert_psk_parses_text() {
        let mut keys = KeyStore::new();
        let hash = keys
            .insert_psk("LongFast", "1PG7OiApB1nwvP+rz05pAQ==")
            .unwrap();
        assert_eq!(keys.lookup(hash).unwrap().key.len(), 16);

        // Parsed but too short to be a key
        assert_eq!(
            keys.insert_psk("short", "AQ=="),
            Err(KeyError::InvalidKeyLength { actual: 1 })
        );
    }

    #[test]
    fn test_collision_last_write_wins() {
        // "ab" and "ba" XOR-fold to the same byte; with all-zero keys the
        // channel hashes collide exactly.
        let mut keys = KeyStore::new();
        let h1 = keys.insert("ab", vec![0u8; 16]).unwrap();
        let h2 = keys.insert("ba", vec![0u8; 16]).unwrap();
        assert_eq!(h1, h2);
        assert_eq!(keys.len(), 1);
        assert_eq!(keys.lookup(h1).unwrap().name, "ba");
    }

    #[test]
    fn test_reregister_same_name_updates_key() {
        let mut keys = KeyStore::new();
        // Zero key keeps the hash equal to the name fold either way
        let h1 = keys.insert("ops", vec![0u8; 16]).unwrap();
        let h2 = keys.insert("ops", vec![0u8; 32]).unwrap();
        assert_eq!(h1, h2);
        assert_eq!(keys.lookup(h2).unwrap().key.len(), 32);
    }

    #[test]
    fn test_entries_sorted_by_hash() {
        let mut keys = KeyStore::new();
        keys.insert("equalbeat", vec![0u8; 16]).unwrap(); // 0x7E
        keys.insert("ab", vec![0u8; 16]).unwrap(); // 0x03
        let entries = keys.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].0, 0x03);
        assert_eq!(entries[1].0, 0x7E);
    }
}
