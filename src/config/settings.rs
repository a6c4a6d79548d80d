//! Worker configuration file
//!
//! The YAML file the worker is built from:
//!
//! ```yaml
//! connection:
//!   host: localhost
//!   dbname: metrics
//! tables:
//!   - public.readings
//! field_length_mapping:
//!   timestamp: 26
//! ```
//!
//! `tables_details` is filled in by schema discovery and written back out
//! with [`WorkerConfig::save`].

use crate::config::ConnectionParams;
use crate::db::schema::TableDetails;
use crate::error::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Display width of a column whose type has no `field_length_mapping` entry
pub const DEFAULT_FIELD_WIDTH: usize = 10;

/// Worker configuration tree
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkerConfig {
    #[serde(default)]
    pub connection: ConnectionParams,

    /// Known `schema.table` identifiers
    #[serde(default)]
    pub tables: Vec<String>,

    /// Type name to display width
    #[serde(default)]
    pub field_length_mapping: BTreeMap<String, usize>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub tables_details: BTreeMap<String, TableDetails>,
}

impl WorkerConfig {
    /// Load a configuration file
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::NotFound(path.display().to_string()));
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> ConfigResult<Self> {
        // An empty document deserializes to null rather than an empty map
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }

    pub fn to_yaml(&self) -> ConfigResult<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Write the configuration, including discovered table details
    pub fn save(&self, path: impl AsRef<Path>) -> ConfigResult<()> {
        std::fs::write(path, self.to_yaml()?)?;
        Ok(())
    }

    /// Display width configured for a type name
    pub fn field_width(&self, type_name: &str) -> usize {
        self.field_length_mapping
            .get(type_name)
            .copied()
            .unwrap_or(DEFAULT_FIELD_WIDTH)
    }

    pub fn table_details(&self, table: &str) -> Option<&TableDetails> {
        self.tables_details.get(table)
    }

    /// Add a table to the known tables list unless already present
    pub fn remember_table(&mut self, table: &str) {
        if !self.tables.iter().any(|t| t == table) {
            self.tables.push(table.to_string());
        }
    }
}
