//! Configuration management for pagemark
//!
//! Supports environment variables, config files, and runtime overrides.
//! The layout heuristics (row height, viewport buffer) are tunable here but
//! keep their historical defaults.
//!
//! Config file location: ~/.config/pagemark/config.toml

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::PathBuf;

use crate::core::error::{PageError, Result};

/// Main configuration for pagemark
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Discovery, classification and descriptor settings
    #[serde(default)]
    pub analyzer: AnalyzerConfig,
    /// Selector synthesis settings
    #[serde(default)]
    pub selector: SelectorConfig,
    /// Overlay rendering settings
    #[serde(default)]
    pub overlay: OverlayConfig,
    /// Readable text extraction settings
    #[serde(default)]
    pub text: TextConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Page analyzer configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzerConfig {
    /// Height of one visual row used to bucket elements while sorting
    /// Default: 50
    pub row_height: u32,
    /// Margin around the viewport inside which elements still count
    /// Default: 50
    pub viewport_buffer: f64,
    /// Minimum rendered width and height in pixels
    /// Default: 5
    pub min_size: f64,
    /// Minimum effective opacity
    /// Default: 0.1
    pub min_opacity: f64,
    /// Final label length
    pub max_label_len: usize,
    /// title/alt/placeholder/value must be shorter than this to become a label
    pub attribute_label_cap: usize,
    /// Text content must be shorter than this to become a label
    pub text_label_cap: usize,
    /// Reported state values are cut to this length
    pub max_value_len: usize,
}

/// Selector synthesis configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectorConfig {
    /// Ancestor levels walked by the structural fallback
    pub max_depth: usize,
    /// Classes kept per path segment
    pub max_classes: usize,
    /// aria-label values at or above this length are not used
    pub aria_label_cap: usize,
}

/// Overlay annotation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverlayConfig {
    /// Frame colors, cycled by ordinal
    pub palette: Vec<String>,
    /// Distance from the viewport edge below which the badge flips
    pub edge_margin: f64,
    /// Badge height in pixels
    pub badge_height: f64,
    /// Stacking order of overlay nodes
    pub z_index: i64,
}

/// Readable text configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextConfig {
    /// Default output length when the caller gives none
    /// Default: 5000
    pub default_max_length: usize,
    /// Recursion limit of the text walk
    pub max_depth: usize,
    /// Shorter text fragments are dropped
    pub min_fragment_len: usize,
    /// Appended when the output is cut
    pub truncation_marker: String,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Filter directive used when RUST_LOG is unset
    pub filter: String,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            row_height: env_parse("PAGEMARK_ROW_HEIGHT").unwrap_or(50),
            viewport_buffer: env_parse("PAGEMARK_VIEWPORT_BUFFER").unwrap_or(50.0),
            min_size: 5.0,
            min_opacity: 0.1,
            max_label_len: 80,
            attribute_label_cap: 100,
            text_label_cap: 200,
            max_value_len: 100,
        }
    }
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            max_depth: 5,
            max_classes: 2,
            aria_label_cap: 50,
        }
    }
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            palette: [
                "#e6194b", "#3cb44b", "#4363d8", "#f58231", "#911eb4", "#42d4f4", "#f032e6",
                "#9a6324",
            ]
            .iter()
            .map(|c| c.to_string())
            .collect(),
            edge_margin: 20.0,
            badge_height: 16.0,
            z_index: 2147483647,
        }
    }
}

impl Default for TextConfig {
    fn default() -> Self {
        Self {
            default_max_length: env_parse("PAGEMARK_TEXT_MAX").unwrap_or(5000),
            max_depth: 20,
            min_fragment_len: 2,
            truncation_marker: "...".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: env::var("PAGEMARK_LOG").unwrap_or_else(|_| "info".to_string()),
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("pagemark")
    }

    /// Get the config file path
    pub fn config_file() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Load configuration from file, environment, and defaults
    /// Priority: CLI args > config file > env vars > defaults
    pub fn load() -> Self {
        // Try to load .env file if it exists
        let _ = dotenvy::dotenv();

        if let Ok(config) = Self::load_from_file() {
            return config;
        }

        // Fall back to defaults (which respect env vars)
        Self::default()
    }

    /// Load configuration from the default file only
    pub fn load_from_file() -> Result<Self> {
        Self::load_from_path(Self::config_file())
    }

    /// Load configuration from an explicit path
    pub fn load_from_path(config_path: impl Into<PathBuf>) -> Result<Self> {
        let config_path = config_path.into();

        if !config_path.exists() {
            return Err(PageError::config("Config file not found"));
        }

        let content = fs::read_to_string(&config_path)
            .map_err(|e| PageError::config(format!("Failed to read config: {}", e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| PageError::config(format!("Failed to parse config: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to the default file
    pub fn save(&self) -> Result<()> {
        self.save_to_path(Self::config_file())
    }

    /// Save configuration to an explicit path
    pub fn save_to_path(&self, config_path: impl Into<PathBuf>) -> Result<()> {
        let config_path = config_path.into();

        if let Some(config_dir) = config_path.parent() {
            if !config_dir.as_os_str().is_empty() && !config_dir.exists() {
                fs::create_dir_all(config_dir).map_err(|e| {
                    PageError::config(format!("Failed to create config dir: {}", e))
                })?;
            }
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| PageError::config(format!("Failed to serialize config: {}", e)))?;

        fs::write(&config_path, content)
            .map_err(|e| PageError::config(format!("Failed to write config: {}", e)))?;

        Ok(())
    }

    /// Reject values the heuristics cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.analyzer.row_height == 0 {
            return Err(PageError::config("analyzer.row_height must be positive"));
        }
        if self.overlay.palette.is_empty() {
            return Err(PageError::config("overlay.palette must not be empty"));
        }
        if self.selector.max_depth == 0 {
            return Err(PageError::config("selector.max_depth must be positive"));
        }
        Ok(())
    }

    /// Generate a default config file content for display
    pub fn default_config_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config)
            .unwrap_or_else(|_| String::from("# Error generating config"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.selector.max_depth, 5);
        assert_eq!(config.selector.max_classes, 2);
        assert_eq!(config.text.max_depth, 20);
        assert_eq!(config.analyzer.min_opacity, 0.1);
        assert_eq!(config.overlay.palette.len(), 8);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_serialization() {
        let toml_str = Config::default_config_toml();
        assert!(toml_str.contains("row_height"));
        assert!(toml_str.contains("viewport_buffer"));
        assert!(toml_str.contains("palette"));
    }

    #[test]
    fn test_config_dir() {
        let dir = Config::config_dir();
        assert!(dir.to_string_lossy().contains("pagemark"));
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.analyzer.row_height = 40;
        config.text.truncation_marker = "…".to_string();
        config.save_to_path(&path).unwrap();

        let loaded = Config::load_from_path(&path).unwrap();
        assert_eq!(loaded.analyzer.row_height, 40);
        assert_eq!(loaded.text.truncation_marker, "…");
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[selector]\nmax_depth = 3\nmax_classes = 1\naria_label_cap = 10\n").unwrap();

        let loaded = Config::load_from_path(&path).unwrap();
        assert_eq!(loaded.selector.max_depth, 3);
        assert_eq!(loaded.text.max_depth, 20);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[overlay]\npalette = []\nedge_margin = 20.0\nbadge_height = 16.0\nz_index = 1\n").unwrap();

        assert!(matches!(
            Config::load_from_path(&path),
            Err(PageError::Config(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Config::load_from_path(dir.path().join("absent.toml")).is_err());
    }
}
