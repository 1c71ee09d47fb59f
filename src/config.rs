/// `config.rs`: per-extension settings
///
/// Every field has a default, so an empty JSON object (or no config file at
/// all) yields the stock glirc behaviour.
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::marshal::array::DEFAULT_MAX_ENTRIES;
use crate::scripting::sandbox::TrustLevel;

/// Environment variable naming a JSON config file.
pub const CONFIG_ENV: &str = "GLIRC_LUA_CONFIG";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtensionConfig {
    /// Script loaded from the extension's directory when the host passes no
    /// arguments.
    pub default_script: String,
    /// Standard libraries opened in the interpreter.
    pub trust: TrustLevel,
    /// Upper bound on entries read from one host string list.
    pub max_array_entries: usize,
}

impl Default for ExtensionConfig {
    fn default() -> Self {
        Self {
            default_script: "glirc.lua".to_string(),
            trust: TrustLevel::Full,
            max_array_entries: DEFAULT_MAX_ENTRIES,
        }
    }
}

impl ExtensionConfig {
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    pub fn from_file(path: &Path) -> Result<Self, String> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| format!("Cannot read {}: {e}", path.display()))?;
        Self::from_json(&text).map_err(|e| format!("Invalid config {}: {e}", path.display()))
    }

    /// Load from the file named by `GLIRC_LUA_CONFIG`, falling back to
    /// defaults when it is unset or unusable.
    pub fn from_env() -> Self {
        let Some(path) = std::env::var_os(CONFIG_ENV) else {
            return Self::default();
        };
        match Self::from_file(Path::new(&path)) {
            Ok(config) => config,
            Err(e) => {
                log::warn!("[config] {e}; using defaults");
                Self::default()
            }
        }
    }
}
