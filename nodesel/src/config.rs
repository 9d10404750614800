//! Configuration for nodesel.
//!
//! Config file resolution order:
//! 1. Explicit path passed to Config::load()
//! 2. NODESEL_CONFIG environment variable
//! 3. Default: <config dir>/nodesel/config.toml, if it exists
//! 4. Built-in defaults

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::catalog::node_vocabulary;
use crate::query::Vocabulary;
use crate::{Error, Result};

/// Environment variable naming the config file.
pub const CONFIG_ENV: &str = "NODESEL_CONFIG";

/// nodesel configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Start from the compute-node catalog.
    #[serde(default = "default_catalog")]
    pub catalog: bool,

    /// Extra field names: `true` for a field, a string for an alias.
    #[serde(default)]
    pub fields: BTreeMap<String, FieldEntry>,

    /// Named operations, compiled in order.
    #[serde(default)]
    pub operations: Vec<OperationDef>,
}

/// Value of an entry in the `[fields]` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldEntry {
    /// `true` registers a field; `false` is ignored.
    Known(bool),
    /// Another name for the target.
    Alias(String),
}

/// A `[[operations]]` entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationDef {
    pub name: String,
    pub query: String,
}

fn default_catalog() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            catalog: default_catalog(),
            fields: BTreeMap::new(),
            operations: Vec::new(),
        }
    }
}

impl Config {
    /// Load config using the standard resolution order.
    ///
    /// An explicitly named file must exist; a missing default file means
    /// built-in defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        match resolve_config_path(explicit) {
            Some((path, true)) => {
                if !path.exists() {
                    return Err(Error::ConfigNotFound(path));
                }
                Self::load_from(&path)
            }
            Some((path, false)) if path.exists() => Self::load_from(&path),
            _ => {
                tracing::debug!("no config file, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Load config from a specific file.
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)
            .map_err(|e| Error::Config(format!("Failed to parse {}: {}", path.display(), e)))?;
        tracing::debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// Save config to `path`.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Build the query vocabulary: catalog, then fields, then operations.
    pub fn vocabulary(&self) -> Result<Vocabulary> {
        let mut v = if self.catalog {
            node_vocabulary()?
        } else {
            Vocabulary::new()
        };
        for (name, entry) in &self.fields {
            match entry {
                FieldEntry::Known(true) => {
                    v.add_field(name.as_str());
                }
                FieldEntry::Known(false) => {}
                FieldEntry::Alias(target) => {
                    v.add_alias(name.as_str(), target.as_str());
                }
            }
        }
        for op in &self.operations {
            v.define_operation(op.name.as_str(), &op.query)
                .map_err(|e| Error::Config(format!("Operation '{}': {}", op.name, e)))?;
        }
        Ok(v)
    }
}

/// Resolve the config file path; the flag is true when it was asked for.
fn resolve_config_path(explicit: Option<&Path>) -> Option<(PathBuf, bool)> {
    // 1. Explicit path
    if let Some(path) = explicit {
        return Some((path.to_path_buf(), true));
    }

    // 2. Environment variable
    if let Ok(path) = std::env::var(CONFIG_ENV) {
        if !path.is_empty() {
            return Some((PathBuf::from(path), true));
        }
    }

    // 3. XDG config directory (via directories crate)
    ProjectDirs::from("", "", "nodesel").map(|dirs| (dirs.config_dir().join("config.toml"), false))
}
