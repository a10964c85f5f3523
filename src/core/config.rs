//! # Configuration
//!
//! Centralizes all settings with a clear override hierarchy:
//! defaults → config file → env vars → CLI flags.
//!
//! Config lives at `~/.council/config.toml`. If missing on first run, a
//! commented-out default is generated so users can discover all options.

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::transport::DEFAULT_BASE_URL;

// ============================================================================
// Config Structs (all fields Option<T> for sparse TOML)
// ============================================================================

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct CouncilConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub ui: UiConfig,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct ServerConfig {
    pub base_url: Option<String>,
    pub conversation_id: Option<String>,
    pub request_timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct UiConfig {
    pub follow_debounce_ms: Option<u64>,
}

// ============================================================================
// Defaults
// ============================================================================

pub const DEFAULT_FOLLOW_DEBOUNCE_MS: u64 = 120;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 300;

// ============================================================================
// Resolved Config (concrete values, no Options)
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedConfig {
    pub base_url: String,
    /// Continue an existing conversation instead of creating one on first send.
    pub conversation_id: Option<String>,
    pub request_timeout_secs: u64,
    pub follow_debounce_ms: u64,
}

/// Values supplied on the command line. `None` means "not given".
#[derive(Debug, Default, Clone)]
pub struct CliOverrides {
    pub base_url: Option<String>,
    pub conversation_id: Option<String>,
}

/// Values read from the environment. Split out so resolution stays testable
/// without touching process-wide state.
#[derive(Debug, Default, Clone)]
pub struct EnvOverrides {
    pub base_url: Option<String>,
    pub conversation_id: Option<String>,
}

impl EnvOverrides {
    pub fn from_env() -> Self {
        Self {
            base_url: std::env::var("COUNCIL_BASE_URL").ok(),
            conversation_id: std::env::var("COUNCIL_CONVERSATION_ID").ok(),
        }
    }
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "config I/O error: {e}"),
            ConfigError::Parse(e) => write!(f, "config parse error: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}

// ============================================================================
// Loading
// ============================================================================

/// Returns the path to `~/.council/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".council").join("config.toml"))
}

/// Load config from `~/.council/config.toml`.
///
/// If the file doesn't exist, generates a commented-out default and
/// returns `CouncilConfig::default()`. If it exists but is malformed,
/// returns `ConfigError::Parse`.
pub fn load_config() -> Result<CouncilConfig, ConfigError> {
    let path = match config_path() {
        Some(p) => p,
        None => {
            warn!("Could not determine home directory, using default config");
            return Ok(CouncilConfig::default());
        }
    };

    if !path.exists() {
        info!("No config file found, generating default at {}", path.display());
        generate_default_config(&path);
        return Ok(CouncilConfig::default());
    }

    load_config_from(&path)
}

pub fn load_config_from(path: &Path) -> Result<CouncilConfig, ConfigError> {
    let contents = fs::read_to_string(path).map_err(ConfigError::Io)?;
    let config: CouncilConfig = toml::from_str(&contents).map_err(ConfigError::Parse)?;
    info!("Loaded config from {}", path.display());
    debug!("Config: {:?}", config);
    Ok(config)
}

fn generate_default_config(path: &Path) {
    let default_content = r#"# Council Configuration
# All settings are optional. Defaults are used for anything not specified.
# Override hierarchy: defaults → this file → env vars → CLI flags.

# [server]
# base_url = "http://localhost:8001"   # Or set COUNCIL_BASE_URL
# conversation_id = "..."              # Or set COUNCIL_CONVERSATION_ID
# request_timeout_secs = 300

# [ui]
# follow_debounce_ms = 120             # Delay before scrolling to the newest turn
"#;

    if let Some(parent) = path.parent()
        && let Err(e) = fs::create_dir_all(parent)
    {
        warn!("Failed to create config directory: {}", e);
        return;
    }
    if let Err(e) = fs::write(path, default_content) {
        warn!("Failed to write default config: {}", e);
    }
}

// ============================================================================
// Resolution
// ============================================================================

/// Resolve the final config by collapsing: defaults → config file → env vars → CLI.
pub fn resolve(config: &CouncilConfig, env: &EnvOverrides, cli: &CliOverrides) -> ResolvedConfig {
    // Base URL: CLI → env → config → default
    let base_url = cli
        .base_url
        .clone()
        .or_else(|| env.base_url.clone())
        .or_else(|| config.server.base_url.clone())
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

    // Conversation: CLI → env → config → none (create on first send)
    let conversation_id = cli
        .conversation_id
        .clone()
        .or_else(|| env.conversation_id.clone())
        .or_else(|| config.server.conversation_id.clone())
        .filter(|id| !id.trim().is_empty());

    ResolvedConfig {
        base_url,
        conversation_id,
        request_timeout_secs: config
            .server
            .request_timeout_secs
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
        follow_debounce_ms: config
            .ui
            .follow_debounce_ms
            .unwrap_or(DEFAULT_FOLLOW_DEBOUNCE_MS),
    }
}
