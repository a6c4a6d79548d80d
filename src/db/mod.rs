//! Database abstraction layer
//!
//! The worker talks to the database through the [`Database`] trait so that
//! statement building and schema bookkeeping can be tested without a server.

pub mod postgres;
pub mod schema;
pub mod types;

// Re-export main types
pub use postgres::PgConnection;
pub use schema::{Columns, PRIMARY_KEY_NONE, TableDetails, split_table_name};
pub use types::{CellValue, ColumnDef, DataType, QueryResults, Row};

use crate::error::DbResult;

/// Operations the worker needs from a database connection
#[allow(async_fn_in_trait)]
pub trait Database {
    /// Run one statement in its own transaction and commit it
    ///
    /// # Errors
    /// Returns `DbError::QueryFailed` if preparing, executing or committing fails
    async fn execute(&mut self, sql: &str) -> DbResult<QueryResults>;

    /// Column names and type OIDs of a table, without fetching rows
    ///
    /// # Errors
    /// Returns `DbError::SchemaLoadFailed` if the table cannot be described
    async fn describe_columns(&mut self, table: &str) -> DbResult<Vec<(String, u32)>>;

    /// First primary key column of `schema.table`, if any
    async fn primary_key(&mut self, schema: &str, table: &str) -> DbResult<Option<String>>;

    /// Catalog name of a type OID
    ///
    /// # Errors
    /// Returns `DbError::TypeLookupFailed` if no such type exists
    async fn lookup_type_name(&mut self, oid: u32) -> DbResult<String>;
}
