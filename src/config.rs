//! Configuration management for Checklist
//!
//! This module handles loading, parsing, and validation of configuration files.

use crate::constants::{DEFAULT_CELEBRATION_SECONDS, DEFAULT_TIMESTAMP_FORMAT, MAX_CELEBRATION_SECONDS};
use crate::lifecycle::{LifecyclePolicy, UncompletePolicy};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub lifecycle: LifecycleConfig,
    pub store: StoreConfig,
    pub display: DisplayConfig,
    pub logging: LoggingConfig,
    pub admin: AdminConfig,
}

/// Lifecycle policy configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LifecycleConfig {
    /// What un-completing an archived item does
    /// Options: "restore" (back to active), "keep_archived"
    pub uncomplete: UncompletePolicy,
    /// Allow toggling completion of archived items without restoring them first
    pub allow_toggle_archived: bool,
}

/// Document store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Store backend
    /// Options: "memory", "file"
    pub backend: String,
    /// Directory for the file backend (empty = platform data directory)
    pub data_dir: String,
}

/// Display configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// strftime format for archive and deadline timestamps
    pub timestamp_format: String,
    /// How long the celebration lasts after a completion, in seconds
    pub celebration_seconds: u64,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Write logs to a file under the platform data directory
    pub enabled: bool,
    /// Minimum level: "error", "warn", "info", "debug" or "trace"
    pub level: String,
}

/// Admin redirect configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AdminConfig {
    /// URL of the externally hosted admin interface (empty = none configured)
    pub portal_url: String,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            uncomplete: UncompletePolicy::Restore,
            allow_toggle_archived: true,
        }
    }
}

impl LifecycleConfig {
    pub fn policy(&self) -> LifecyclePolicy {
        LifecyclePolicy {
            uncomplete: self.uncomplete,
            allow_toggle_archived: self.allow_toggle_archived,
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: "file".to_string(),
            data_dir: String::new(),
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            timestamp_format: DEFAULT_TIMESTAMP_FORMAT.to_string(),
            celebration_seconds: DEFAULT_CELEBRATION_SECONDS,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            level: "info".to_string(),
        }
    }
}

impl LoggingConfig {
    pub fn level_filter(&self) -> Result<log::LevelFilter> {
        self.level
            .parse::<log::LevelFilter>()
            .map_err(|_| anyhow::anyhow!("Invalid logging level '{}'", self.level))
    }
}

impl Config {
    /// Load configuration from file or return defaults
    pub fn load() -> Result<Self> {
        let config_path = Self::find_config_file()?;

        if let Some(path) = config_path {
            Self::load_from_file(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;

        config.validate()?;
        Ok(config)
    }

    /// Find configuration file in order of precedence
    fn find_config_file() -> Result<Option<PathBuf>> {
        // 1. Check current directory
        let current_dir_config = PathBuf::from("checklist.toml");
        if current_dir_config.exists() {
            return Ok(Some(current_dir_config));
        }

        // 2. Check XDG config directory
        if let Some(config_dir) = dirs::config_dir() {
            let xdg_config = config_dir.join("checklist").join("config.toml");
            if xdg_config.exists() {
                return Ok(Some(xdg_config));
            }
        }

        Ok(None)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        match self.store.backend.as_str() {
            "memory" | "file" => {}
            other => anyhow::bail!("store.backend must be \"memory\" or \"file\", got \"{}\"", other),
        }

        if self.display.celebration_seconds == 0 || self.display.celebration_seconds > MAX_CELEBRATION_SECONDS {
            anyhow::bail!(
                "celebration_seconds must be between 1 and {}, got {}",
                MAX_CELEBRATION_SECONDS,
                self.display.celebration_seconds
            );
        }

        // chrono reports bad specifiers as an Item::Error
        let has_bad_specifier = chrono::format::StrftimeItems::new(&self.display.timestamp_format)
            .any(|item| matches!(item, chrono::format::Item::Error));
        if self.display.timestamp_format.is_empty() || has_bad_specifier {
            anyhow::bail!("Invalid timestamp_format '{}'", self.display.timestamp_format);
        }

        self.logging.level_filter()?;

        let portal = &self.admin.portal_url;
        if !portal.is_empty() && !(portal.starts_with("https://") || portal.starts_with("http://")) {
            anyhow::bail!("admin.portal_url must be an http(s) URL, got '{}'", portal);
        }

        Ok(())
    }

    /// Generate default configuration file
    pub fn generate_default_config<P: AsRef<Path>>(path: P) -> Result<()> {
        let config = Self::default();
        let toml_content = toml::to_string_pretty(&config).context("Failed to serialize default config")?;

        // Add header comment
        let header = format!(
            "# Checklist Configuration File\n# Generated on {}\n\n",
            chrono::Local::now().format("%Y-%m-%d")
        );

        let full_content = header + &toml_content;

        // Ensure the parent directory exists
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {}", parent.display()))?;
        }

        std::fs::write(&path, full_content)
            .with_context(|| format!("Failed to write config file: {}", path.as_ref().display()))?;

        log::info!("✅ Generated default configuration file: {}", path.as_ref().display());
        Ok(())
    }

    /// Get the XDG config directory path
    pub fn get_xdg_config_dir() -> Result<PathBuf> {
        dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))
            .map(|dir| dir.join("checklist"))
    }

    /// Get the default config file path
    pub fn get_default_config_path() -> Result<PathBuf> {
        Ok(Self::get_xdg_config_dir()?.join("config.toml"))
    }
}
