//! Application configuration loaded from `~/.config/updown/config.toml`.

use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, Result};
use ::config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

/// Directory under the user config root holding `config.toml`.
pub const CONFIG_DIR: &str = "updown";

const DEFAULT_CONFIG: &str = r#"# UpDown marketplace configuration.
# Every key can also be set through UPDOWN_<KEY> environment variables.

# JSON file with listings replacing the built-in sample catalog.
# catalog_path = "/path/to/catalog.json"

# Where updown.log is written.
log_dir = "logs"

# Input poll interval in milliseconds.
tick_rate_ms = 250

# Command used to open listing photos, e.g. "firefox".
# browser_command = "xdg-open"
"#;

/// User-tunable settings. Negotiation rules are fixed and not part of this.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Optional catalog file; the sample catalog is used when absent.
    #[serde(default)]
    pub catalog_path: Option<PathBuf>,
    /// Directory for the log file.
    pub log_dir: PathBuf,
    /// Input poll interval in milliseconds.
    pub tick_rate_ms: u64,
    /// Program used to open external links instead of the platform default.
    #[serde(default)]
    pub browser_command: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            catalog_path: None,
            log_dir: PathBuf::from("logs"),
            tick_rate_ms: 250,
            browser_command: None,
        }
    }
}

impl AppConfig {
    /// Load from the default location layered with `UPDOWN_*` environment variables.
    pub fn load() -> Result<Self> {
        Self::load_from(config_path())
    }

    /// Load from an explicit file; a missing file falls back to defaults.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        Self::load_layered(path.as_ref(), environment())
    }

    fn load_layered(path: &Path, environment: Environment) -> Result<Self> {
        let defaults = Self::default();
        let settings = Config::builder()
            .set_default("log_dir", defaults.log_dir.to_string_lossy().to_string())?
            .set_default("tick_rate_ms", defaults.tick_rate_ms)?
            .add_source(File::from(path).required(false))
            .add_source(environment)
            .build()
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let config: Self = settings
            .try_deserialize()
            .with_context(|| format!("invalid config {}", path.display()))?;
        Ok(config)
    }

    /// Input poll interval as a duration.
    pub fn tick_rate(&self) -> Duration {
        Duration::from_millis(self.tick_rate_ms.max(10))
    }
}

/// `UPDOWN_<KEY>` variables; `__` separates nested keys.
fn environment() -> Environment {
    Environment::with_prefix("UPDOWN")
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}

/// Location of the user config file.
pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CONFIG_DIR)
        .join("config.toml")
}

/// Write a commented default config when none exists yet.
///
/// Returns the path when a file was written. Runs before logging is set up,
/// so reporting is left to the caller.
pub fn ensure_default_config() -> Result<Option<PathBuf>> {
    ensure_config_at(config_path())
}

fn ensure_config_at(path: PathBuf) -> Result<Option<PathBuf>> {
    if path.exists() {
        return Ok(None);
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create config directory {}", parent.display()))?;
    }
    fs::write(&path, DEFAULT_CONFIG)
        .with_context(|| format!("failed to write default config {}", path.display()))?;
    Ok(Some(path))
}
