//! Configuration management for link conversion
//!
//! Supports loading configuration from:
//! - Default values
//! - Config file (links.toml)
//! - Environment variables (LINKS__*)
//!
//! ## Example config file (links.toml):
//! ```toml
//! [index]
//! duplicate_policy = "replace"
//!
//! [alias]
//! mode = "structural"
//! ```

use config_crate::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

/// Main configuration for a conversion run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConverterConfig {
    /// Link index settings
    #[serde(default)]
    pub index: IndexConfig,

    /// Alias rewrite settings
    #[serde(default)]
    pub alias: AliasConfig,
}

/// Link index configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndexConfig {
    /// What to do when the same endpoint or alias is linked twice to one pin slot
    #[serde(default)]
    pub duplicate_policy: DuplicateLinkPolicy,
}

/// Alias rewrite configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AliasConfig {
    #[serde(default)]
    pub mode: AliasRewriteMode,
}

/// Handling of repeated entries under one pin slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DuplicateLinkPolicy {
    /// Every occurrence is appended
    #[default]
    Accumulate,
    /// A repeated endpoint (or alias) replaces the earlier entry in place
    Replace,
}

/// How dictionary aliases inside custom config are substituted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AliasRewriteMode {
    /// Regex substitution on the block-style YAML text, guarded by a re-parse
    #[default]
    Text,
    /// Replace matching string scalars while walking the value tree
    Structural,
}

impl ConverterConfig {
    /// Load configuration from default locations
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Load configuration from a specific file
    pub fn load_from(config_path: Option<&str>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        let config_locations = [
            "links.toml",
            ".links.toml",
            "config/links.toml",
        ];

        for location in config_locations {
            builder = builder.add_source(File::with_name(location).required(false));
        }

        // XDG config directory
        if let Some(config_dir) = directories::ProjectDirs::from("com", "exactpro", "th2-links") {
            let xdg_config = config_dir.config_dir().join("links.toml");
            if xdg_config.exists() {
                builder = builder.add_source(File::from(xdg_config).required(false));
            }
        }

        if let Some(path) = config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        // LINKS__INDEX__DUPLICATE_POLICY=replace
        builder = builder.add_source(
            Environment::with_prefix("LINKS")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true)
        );

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// Save configuration to a file
    pub fn save(&self, path: &str) -> std::io::Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, content)
    }
}
