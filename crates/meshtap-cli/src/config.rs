// Channel key configuration for the meshtap CLI
//
// Keys come from a JSON file and/or repeated --channel NAME=PSK flags:
//
//   {
//     "channels": {
//       "LongFast": "1PG7OiApB1nwvP+rz05pAQ==",
//       "equalbeat": "06lGUq+WhpsOt/weuKcesGzFVZ6HQx3rwWyS8liJhzY="
//     }
//   }
//
// PSK text is hex (2-64 digits) or base64; the core decides which.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use meshtap_core::KeyStore;
use serde::Deserialize;

/// Channel key file contents.
#[derive(Debug, Default, Deserialize)]
pub struct KeyConfig {
    /// Channel name -> PSK text (hex or base64)
    #[serde(default)]
    pub channels: BTreeMap<String, String>,
}

impl KeyConfig {
    /// Load and parse a key config file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read key config {:?}", path))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse key config {:?}", path))
    }
}

/// Build the key store from an optional config file plus inline NAME=PSK
/// pairs. File entries register first (in name order), inline pairs after,
/// so an inline key wins any hash collision.
pub fn build_keystore(config: Option<&Path>, inline: &[String]) -> Result<KeyStore> {
    let mut store = KeyStore::new();

    if let Some(path) = config {
        let config = KeyConfig::load(path)?;
        for (name, psk) in &config.channels {
            store
                .insert_psk(name, psk)
                .with_context(|| format!("Bad PSK for channel '{}'", name))?;
        }
    }

    for pair in inline {
        let (name, psk) = pair
            .split_once('=')
            .with_context(|| format!("Expected NAME=PSK, got '{}'", pair))?;
        store
            .insert_psk(name, psk)
            .with_context(|| format!("Bad PSK for channel '{}'", name))?;
    }

    Ok(store)
}
