//! Package identifier to display name resolution.
//!
//! The table is data, not code: a bundled default (`data/identity.toml`)
//! can be extended or overridden by an external TOML file and by inline
//! entries in `config.toml`, so new apps need no rebuild.

use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

use crate::error::ConfigError;
use crate::storage::IdentityConfig;

const BUILTIN_TABLE: &str = include_str!("../data/identity.toml");

#[derive(Debug, Deserialize)]
struct TableFile {
    #[serde(default)]
    apps: HashMap<String, String>,
}

/// Maps raw platform package identifiers to canonical application names.
#[derive(Debug, Clone, Default)]
pub struct AppIdentityResolver {
    table: HashMap<String, String>,
}

impl AppIdentityResolver {
    pub fn new(table: HashMap<String, String>) -> Self {
        Self { table }
    }

    /// The bundled social and messaging table.
    pub fn builtin() -> Self {
        Self::from_toml_str(BUILTIN_TABLE).unwrap_or_default()
    }

    /// Parse a table file body (`[apps]` section).
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let file: TableFile =
            toml::from_str(content).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        Ok(Self::new(file.apps))
    }

    /// Load a table file from disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::LoadFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Self::from_toml_str(&content).map_err(|e| ConfigError::LoadFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Builtin table, then the configured file, then inline entries.
    pub fn from_config(config: &IdentityConfig) -> Result<Self, ConfigError> {
        let mut resolver = Self::builtin();
        if let Some(path) = config.table_path.as_deref() {
            resolver = resolver.with_overrides(Self::load(path)?.table);
        }
        Ok(resolver.with_overrides(config.apps.clone()))
    }

    /// Later entries win key by key.
    pub fn with_overrides(mut self, entries: impl IntoIterator<Item = (String, String)>) -> Self {
        self.table.extend(entries);
        self
    }

    /// Resolve a package identifier; unmapped identifiers come back unchanged.
    pub fn resolve<'a>(&'a self, package_id: &'a str) -> &'a str {
        self.table
            .get(package_id)
            .map(String::as_str)
            .unwrap_or(package_id)
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}
