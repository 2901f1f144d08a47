//! Document Loading
//!
//! Reads th2 resources from YAML files in a directory tree. A file may hold
//! several documents separated by `---`; empty documents are skipped.

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::resource::Th2Resource;

/// Configuration for document loading
#[derive(Debug, Clone)]
pub struct LoadConfig {
    /// File extensions to read
    pub extensions: Vec<String>,
    /// Skip paths (relative to the root) starting with these prefixes
    pub skip_prefixes: Vec<String>,
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            extensions: vec!["yaml".to_string(), "yml".to_string()],
            skip_prefixes: vec![".git/".to_string()],
        }
    }
}

/// Parse every resource in one YAML text
pub fn parse_documents(content: &str) -> anyhow::Result<Vec<Th2Resource>> {
    let mut resources = Vec::new();

    for document in serde_yaml::Deserializer::from_str(content) {
        let value = serde_yaml::Value::deserialize(document)?;
        if value.is_null() {
            continue;
        }
        resources.push(serde_yaml::from_value(value)?);
    }

    Ok(resources)
}

/// Load all resources under a directory, in path order
pub fn load_from_directory(root: &Path, config: &LoadConfig) -> anyhow::Result<Vec<Th2Resource>> {
    let mut paths: Vec<PathBuf> = Vec::new();

    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }

        let matches_extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| config.extensions.iter().any(|e| e == ext))
            .unwrap_or(false);
        if !matches_extension {
            continue;
        }

        let relative = path.strip_prefix(root)?.to_string_lossy().replace('\\', "/");
        if config.skip_prefixes.iter().any(|p| relative.starts_with(p)) {
            continue;
        }

        paths.push(path.to_path_buf());
    }

    let mut resources = Vec::new();
    for path in paths {
        let content = fs::read_to_string(&path)?;
        let parsed = parse_documents(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse YAML in {}: {}", path.display(), e))?;
        tracing::debug!(path = %path.display(), documents = parsed.len(), "loaded resources");
        resources.extend(parsed);
    }

    Ok(resources)
}
