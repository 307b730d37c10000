//! Configuration file support for katago-mcp.
//!
//! # Configuration File Format
//!
//! ```toml
//! [katago]
//! path = "/usr/local/bin/katago"
//! model = "/usr/share/katago/models/kata1-b18c384nbt-s9131461376-d4087399203.bin.gz"
//! config = "/etc/katago/analysis.cfg"
//! analysis_threads = 2
//! timeout_seconds = 120
//!
//! [games]
//! watch_path = "~/go/games"
//! max_listed = 20
//! default_rules = "chinese"
//! default_komi = 7.5
//!
//! [analysis]
//! visits = 100
//! max_variations = 5
//! pv_len = 10
//! include_ownership = true
//! deep_evaluate = true
//!
//! [logging]
//! level = "info"
//! ```

use std::path::{Path, PathBuf};

use super::Config;

/// File name looked for in the working directory
const LOCAL_CONFIG_NAME: &str = "katago-mcp.toml";

impl Config {
    /// Render as pretty TOML
    pub fn to_toml(&self) -> Result<String, ConfigFileError> {
        toml::to_string_pretty(self).map_err(|e| ConfigFileError::Serialize(e.to_string()))
    }

    /// Save configuration to a TOML file, creating parent directories
    pub fn save(&self, path: &Path) -> Result<(), ConfigFileError> {
        let content = self.to_toml()?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| ConfigFileError::Io(e.to_string()))?;
        }
        std::fs::write(path, content).map_err(|e| ConfigFileError::Io(e.to_string()))
    }
}

/// `<config dir>/katago-mcp/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("katago-mcp").join("config.toml"))
}

/// First existing config file: `./katago-mcp.toml`, then the user config dir
pub fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from(LOCAL_CONFIG_NAME);
    if local.is_file() {
        return Some(local);
    }
    default_config_path().filter(|p| p.is_file())
}

/// Configuration file errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigFileError {
    #[error("IO error: {0}")]
    Io(String),

    #[error("Serialize error: {0}")]
    Serialize(String),
}
