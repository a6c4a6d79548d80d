//! Error types for pgworker
//!
//! This module defines the error hierarchy used throughout the crate.
//! We use `thiserror` for library-style errors with clear error chains.

use std::io;

/// Main error type for pgworker
#[derive(Debug, thiserror::Error)]
pub enum PgWorkerError {
    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] DbError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Database operation errors
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// Failed to establish connection
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Query execution failed
    #[error("Query execution failed: {0}")]
    QueryFailed(String),

    /// Schema introspection failed
    #[error("Schema loading failed for {table}: {reason}")]
    SchemaLoadFailed { table: String, reason: String },

    /// Type OID could not be resolved through the catalog
    #[error("No type with oid {0}")]
    TypeLookupFailed(u32),

    /// Column is not part of the discovered table schema
    #[error("Unknown column '{column}' in table {table}")]
    UnknownColumn { table: String, column: String },

    /// Positional insert with the wrong number of values
    #[error("Table {table} expects {expected} values, got {actual}")]
    ColumnCountMismatch {
        table: String,
        expected: usize,
        actual: usize,
    },
}

/// Configuration loading/parsing errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Config file not found
    #[error("Configuration file not found: {0}")]
    NotFound(String),

    /// Failed to parse or serialize YAML
    #[error("Failed to parse configuration: {0}")]
    ParseError(#[from] serde_yaml::Error),

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    /// Reading or writing the configuration file failed
    #[error("Configuration IO error: {0}")]
    Io(#[from] io::Error),
}

impl From<tokio_postgres::Error> for DbError {
    fn from(e: tokio_postgres::Error) -> Self {
        DbError::QueryFailed(e.to_string())
    }
}

/// Specialized Result type for pgworker operations
pub type Result<T> = std::result::Result<T, PgWorkerError>;

/// Specialized Result type for database operations
pub type DbResult<T> = std::result::Result<T, DbError>;

/// Specialized Result type for config operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
