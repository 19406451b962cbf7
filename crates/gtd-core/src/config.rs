//! Configuration for gtd
//!
//! Stored in .gtd/config.toml

use serde::{Deserialize, Serialize};
use std::path::Path;

/// gtd configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Seed a sample project and items when the API starts on an empty store
    pub seed_on_empty: bool,

    /// API server settings
    pub server: ServerConfig,

    /// Weekly review settings
    pub review: ReviewConfig,

    /// Display settings
    pub display: DisplayConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            seed_on_empty: true,
            server: ServerConfig::default(),
            review: ReviewConfig::default(),
            display: DisplayConfig::default(),
        }
    }
}

/// API server configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind
    pub host: String,

    /// Port to listen on
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3848,
        }
    }
}

/// Review configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReviewConfig {
    /// How far ahead the review looks for calendar items
    pub upcoming_days: u32,
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self { upcoming_days: 7 }
    }
}

/// Display configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Use colors in output
    pub colors: bool,

    /// Date format for display
    pub date_format: String,

    /// Maximum title length before truncation
    pub max_title_length: usize,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            colors: true,
            date_format: "%Y-%m-%d %H:%M".to_string(),
            max_title_length: 80,
        }
    }
}

impl Config {
    /// Load config from a TOML file, falling back to defaults if it is missing
    pub fn load(path: &Path) -> crate::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| crate::Error::Config(e.to_string()))
    }

    /// Save config to a TOML file
    pub fn save(&self, path: &Path) -> crate::Result<()> {
        let content =
            toml::to_string_pretty(self).map_err(|e| crate::Error::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Set a value by dotted key, e.g. "server.port"
    pub fn set(&mut self, key: &str, value: &str) -> crate::Result<()> {
        fn parse<T: std::str::FromStr>(key: &str, value: &str) -> crate::Result<T> {
            value
                .parse()
                .map_err(|_| crate::Error::Config(format!("Invalid value for {key}: {value}")))
        }

        match key {
            "seed_on_empty" => self.seed_on_empty = parse(key, value)?,
            "server.host" => self.server.host = value.to_string(),
            "server.port" => self.server.port = parse(key, value)?,
            "review.upcoming_days" => self.review.upcoming_days = parse(key, value)?,
            "display.colors" => self.display.colors = parse(key, value)?,
            "display.date_format" => self.display.date_format = value.to_string(),
            "display.max_title_length" => self.display.max_title_length = parse(key, value)?,
            _ => return Err(crate::Error::Config(format!("Unknown config key: {key}"))),
        }
        Ok(())
    }

    /// Generate a default config file with comments
    pub fn default_with_comments() -> String {
        r#"# gtd configuration

# Seed a sample project and items when the API starts on an empty store
seed_on_empty = true

[server]
# Address and port for gtd-api (overridden by GTD_API_HOST / GTD_API_PORT)
host = "127.0.0.1"
port = 3848

[review]
# How many days ahead the weekly review lists calendar items
upcoming_days = 7

[display]
# Use colors in output
colors = true

# Date format for display (strftime format)
date_format = "%Y-%m-%d %H:%M"

# Maximum title length before truncation
max_title_length = 80
"#
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commented_default_matches_default() {
        let parsed: Config = toml::from_str(&Config::default_with_comments()).unwrap();
        assert_eq!(parsed, Config::default());
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let parsed: Config = toml::from_str("[server]\nport = 9000\n").unwrap();
        assert_eq!(parsed.server.port, 9000);
        assert_eq!(parsed.server.host, "127.0.0.1");
        assert_eq!(parsed.review.upcoming_days, 7);
    }

    #[test]
    fn test_set_by_key() {
        let mut config = Config::default();
        config.set("server.port", "4000").unwrap();
        config.set("seed_on_empty", "false").unwrap();
        assert_eq!(config.server.port, 4000);
        assert!(!config.seed_on_empty);

        assert!(config.set("server.port", "lots").is_err());
        assert!(config.set("nope", "1").is_err());
    }

    #[test]
    fn test_missing_file_is_default() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = Config::load(&dir.path().join("config.toml")).unwrap();
        assert_eq!(config, Config::default());
    }
}
