//! Error types for link conversion

use thiserror::Error;

/// Result type for link conversion operations
pub type Result<T> = std::result::Result<T, LinkError>;

/// Link conversion errors
///
/// These are the failures of individual operations. A conversion run never
/// aborts on them; they end up as entries in the [`crate::ErrorSink`].
#[derive(Error, Debug)]
pub enum LinkError {
    #[error("Unsupported link schema version: {0}")]
    UnsupportedVersion(String),

    #[error("Spec does not match schema {version}: {source}")]
    SchemaMismatch {
        version: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Rewritten custom config is not valid YAML: {0}")]
    AliasSubstitution(#[source] serde_yaml::Error),

    #[error("Rewritten custom config does not read back {0} intact")]
    AliasSubstitutionMangled(String),

    #[error("Custom config is not a mapping, cannot inject dictionaries")]
    CustomConfigNotMapping,

    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    #[error("Config error: {0}")]
    Config(#[from] config_crate::ConfigError),
}
