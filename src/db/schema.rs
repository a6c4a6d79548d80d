//! Table schema details
//!
//! Structures recorded in the `tables_details` section of the worker
//! configuration after schema discovery.

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Recorded as the primary key of a table that has none
pub const PRIMARY_KEY_NONE: &str = "_none_";

/// Schema assumed for identifiers without a `schema.` prefix
pub const DEFAULT_SCHEMA: &str = "public";

/// Discovered details of one table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableDetails {
    /// Schema name
    pub schema: String,
    /// Bare table name
    pub table: String,
    /// Column name to resolved type name, in table order
    #[serde(default)]
    pub columns: Columns,
    /// Primary key column, or [`PRIMARY_KEY_NONE`]
    #[serde(default = "default_primary_key")]
    pub primary_key: String,
}

fn default_primary_key() -> String {
    PRIMARY_KEY_NONE.to_string()
}

/// Ordered column name to type name mapping.
///
/// Serialized as a YAML map; insertion order is preserved because positional
/// inserts rely on it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Columns(Vec<(String, String)>);

impl Columns {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a column, replacing the type of an existing one in place
    pub fn insert(&mut self, name: impl Into<String>, type_name: impl Into<String>) {
        let name = name.into();
        let type_name = type_name.into();
        match self.0.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = type_name,
            None => self.0.push((name, type_name)),
        }
    }

    /// Type name of a column
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, t)| t.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate `(name, type_name)` pairs in table order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(n, t)| (n.as_str(), t.as_str()))
    }
}

impl<N: Into<String>, T: Into<String>> FromIterator<(N, T)> for Columns {
    fn from_iter<I: IntoIterator<Item = (N, T)>>(iter: I) -> Self {
        let mut columns = Columns::new();
        for (name, type_name) in iter {
            columns.insert(name, type_name);
        }
        columns
    }
}

impl Serialize for Columns {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, type_name) in &self.0 {
            map.serialize_entry(name, type_name)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Columns {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ColumnsVisitor;

        impl<'de> Visitor<'de> for ColumnsVisitor {
            type Value = Columns;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of column name to type name")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Columns, A::Error> {
                let mut columns = Columns::new();
                while let Some((name, type_name)) = access.next_entry::<String, String>()? {
                    columns.insert(name, type_name);
                }
                Ok(columns)
            }
        }

        deserializer.deserialize_map(ColumnsVisitor)
    }
}

impl TableDetails {
    /// Whether the table has a recorded primary key
    pub fn has_primary_key(&self) -> bool {
        self.primary_key != PRIMARY_KEY_NONE
    }

    /// Columns an INSERT supplies values for, in table order.
    ///
    /// The primary key is assumed to be generated by the database and is
    /// skipped, unless its type is a timestamp, in which case the caller
    /// provides it.
    pub fn insertable_columns(&self) -> Vec<&str> {
        self.columns
            .iter()
            .filter(|(name, type_name)| {
                !self.has_primary_key()
                    || *name != self.primary_key
                    || type_name.contains("timestamp")
            })
            .map(|(name, _)| name)
            .collect()
    }
}

/// Split a `schema.table` identifier into its schema and bare table name.
///
/// Identifiers without a dot belong to [`DEFAULT_SCHEMA`].
pub fn split_table_name(name: &str) -> (String, String) {
    match name.split_once('.') {
        Some((schema, table)) => (schema.to_string(), table.to_string()),
        None => (DEFAULT_SCHEMA.to_string(), name.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn events() -> TableDetails {
        TableDetails {
            schema: "public".to_string(),
            table: "t".to_string(),
            columns: [
                ("id", "int4"),
                ("name", "text"),
                ("created_at", "timestamp"),
            ]
            .into_iter()
            .collect(),
            primary_key: "id".to_string(),
        }
    }

    #[test]
    fn test_split_table_name() {
        assert_eq!(
            split_table_name("sales.orders"),
            ("sales".to_string(), "orders".to_string())
        );
        assert_eq!(
            split_table_name("orders"),
            ("public".to_string(), "orders".to_string())
        );
    }

    #[test]
    fn test_insertable_columns_skip_primary_key() {
        assert_eq!(events().insertable_columns(), vec!["name", "created_at"]);
    }

    #[test]
    fn test_insertable_columns_keep_timestamp_primary_key() {
        let mut details = events();
        details.primary_key = "created_at".to_string();
        assert_eq!(
            details.insertable_columns(),
            vec!["id", "name", "created_at"]
        );
    }

    #[test]
    fn test_insertable_columns_without_primary_key_keep_every_column() {
        let details = TableDetails {
            schema: "public".to_string(),
            table: "odd".to_string(),
            columns: [("_none_", "text"), ("body", "text")].into_iter().collect(),
            primary_key: PRIMARY_KEY_NONE.to_string(),
        };
        assert_eq!(details.insertable_columns(), vec!["_none_", "body"]);
    }

    #[test]
    fn test_columns_keep_yaml_order() {
        let yaml = "zeta: int4\nalpha: text\nmid: bool\n";
        let columns: Columns = serde_yaml::from_str(yaml).unwrap();
        let names: Vec<&str> = columns.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["zeta", "alpha", "mid"]);
        assert_eq!(serde_yaml::to_string(&columns).unwrap(), yaml);
    }

    #[test]
    fn test_missing_primary_key_defaults_to_sentinel() {
        let details: TableDetails =
            serde_yaml::from_str("schema: public\ntable: logs\ncolumns:\n  line: text\n").unwrap();
        assert!(!details.has_primary_key());
        assert_eq!(details.primary_key, PRIMARY_KEY_NONE);
    }
}
