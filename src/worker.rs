//! The database worker
//!
//! Owns one connection and the configuration tree. Every table a statement
//! touches has its schema discovered first, and discovered details are kept
//! in the configuration until the worker is dropped.

use crate::config::WorkerConfig;
use crate::db::schema::{Columns, PRIMARY_KEY_NONE, TableDetails, split_table_name};
use crate::db::{Database, PgConnection, QueryResults};
use crate::error::{ConfigResult, DbError, DbResult, Result};
use crate::print::render_table;
use crate::sql::{self, DEFAULT_LIMIT, SqlValue};
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};
use std::io::Write;
use std::path::Path;

/// Convenience wrapper around a single database connection
pub struct DatabaseWorker<D = PgConnection> {
    db: D,
    config: WorkerConfig,
    /// Resolved type OIDs
    type_names: HashMap<u32, String>,
}

impl DatabaseWorker<PgConnection> {
    /// Load `config_path`, connect, discover every configured table and, if
    /// `output` is given, write the augmented configuration there.
    pub async fn connect(config_path: impl AsRef<Path>, output: Option<&Path>) -> Result<Self> {
        let config = WorkerConfig::load(config_path)?;
        let db = PgConnection::connect(&config.connection).await?;
        let worker = Self::with_database(db, config).await?;
        if let Some(path) = output {
            worker.write_config(path)?;
        }
        Ok(worker)
    }
}

impl<D: Database> DatabaseWorker<D> {
    /// Build a worker over an open connection and discover the configured tables
    pub async fn with_database(db: D, config: WorkerConfig) -> DbResult<Self> {
        let mut worker = Self {
            db,
            config,
            type_names: HashMap::new(),
        };
        worker.explore_tables().await?;
        Ok(worker)
    }

    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    pub fn database(&self) -> &D {
        &self.db
    }

    pub fn table_details(&self, table: &str) -> Option<&TableDetails> {
        self.config.table_details(table)
    }

    /// Discover every table in the `tables` list
    pub async fn explore_tables(&mut self) -> DbResult<()> {
        for table in self.config.tables.clone() {
            self.discover_table(&table).await?;
        }
        Ok(())
    }

    /// Discover a table unless its details are already known.
    ///
    /// A new table is appended to the `tables` list so it is written out with
    /// the configuration.
    pub async fn explore_if_unknown(&mut self, table: &str) -> DbResult<()> {
        if self.config.tables_details.contains_key(table) {
            return Ok(());
        }
        tracing::debug!(table, "table not yet known");
        self.config.remember_table(table);
        self.discover_table(table).await
    }

    /// Refresh the details of one table, replacing what was recorded
    pub async fn rediscover(&mut self, table: &str) -> DbResult<()> {
        self.config.remember_table(table);
        self.discover_table(table).await
    }

    async fn discover_table(&mut self, table: &str) -> DbResult<()> {
        let (schema, bare) = split_table_name(table);

        let mut columns = Columns::new();
        for (name, oid) in self.db.describe_columns(table).await? {
            let type_name = self.type_name_from_oid(oid).await?;
            columns.insert(name, type_name);
        }

        let primary_key = self
            .db
            .primary_key(&schema, &bare)
            .await?
            .unwrap_or_else(|| PRIMARY_KEY_NONE.to_string());

        tracing::info!(table, columns = columns.len(), %primary_key, "discovered table");
        self.config.tables_details.insert(
            table.to_string(),
            TableDetails {
                schema,
                table: bare,
                columns,
                primary_key,
            },
        );
        Ok(())
    }

    /// Resolve a type OID to its catalog name, remembering the answer
    pub async fn type_name_from_oid(&mut self, oid: u32) -> DbResult<String> {
        if let Some(name) = self.type_names.get(&oid) {
            return Ok(name.clone());
        }
        let name = self.db.lookup_type_name(oid).await?;
        self.type_names.insert(oid, name.clone());
        Ok(name)
    }

    /// `SELECT <fields|*> FROM <table> [WHERE <condition>] LIMIT <limit>`
    ///
    /// `condition` is raw SQL and is not escaped; never build it from
    /// untrusted input.
    pub async fn select<S: AsRef<str>>(
        &mut self,
        table: &str,
        fields: &[S],
        condition: Option<&str>,
        limit: usize,
    ) -> DbResult<QueryResults> {
        self.explore_if_unknown(table).await?;
        let statement = sql::select_statement(table, fields, condition, limit);
        self.execute(&statement).await
    }

    /// All columns of `table`, at most [`DEFAULT_LIMIT`] rows
    pub async fn select_all_columns(
        &mut self,
        table: &str,
        condition: Option<&str>,
    ) -> DbResult<QueryResults> {
        let all: [&str; 0] = [];
        self.select(table, &all, condition, DEFAULT_LIMIT).await
    }

    /// Insert one row from values given in discovered column order.
    ///
    /// The primary key is left out unless it is timestamp-typed; see
    /// [`TableDetails::insertable_columns`]. Returns the affected row count.
    pub async fn insert(&mut self, table: &str, values: &[SqlValue]) -> DbResult<u64> {
        self.explore_if_unknown(table).await?;
        let statement = sql::insert_statement(table, self.known_details(table)?, values)?;
        Ok(self.execute(&statement).await?.row_count as u64)
    }

    /// Insert one row whose first insertable column is `timestamp`
    pub async fn insert_timed(
        &mut self,
        table: &str,
        timestamp: DateTime<Utc>,
        values: &[SqlValue],
    ) -> DbResult<u64> {
        let mut row = Vec::with_capacity(values.len() + 1);
        row.push(SqlValue::Timestamp(timestamp));
        row.extend_from_slice(values);
        self.insert(table, &row).await
    }

    /// Insert one row from merged column maps; later maps win
    ///
    /// # Errors
    /// Returns `DbError::UnknownColumn` for a key that is not a column of `table`
    pub async fn insert_from_maps(
        &mut self,
        table: &str,
        maps: &[&BTreeMap<String, SqlValue>],
    ) -> DbResult<u64> {
        self.explore_if_unknown(table).await?;
        let row = sql::merge_maps(maps.iter().copied());

        let details = self.known_details(table)?;
        if let Some(column) = row.keys().find(|k| !details.columns.contains(k)) {
            return Err(DbError::UnknownColumn {
                table: table.to_string(),
                column: column.clone(),
            });
        }

        let statement = sql::insert_from_map_statement(table, &row);
        Ok(self.execute(&statement).await?.row_count as u64)
    }

    /// `TRUNCATE <table> CASCADE`: removes every row, including rows of
    /// tables referencing this one.
    pub async fn clear(&mut self, table: &str) -> DbResult<()> {
        self.explore_if_unknown(table).await?;
        tracing::warn!(table, "truncating table");
        self.execute(&sql::truncate_statement(table)).await?;
        Ok(())
    }

    /// Run one statement in its own transaction
    pub async fn execute(&mut self, statement: &str) -> DbResult<QueryResults> {
        self.db
            .execute(statement)
            .await
            .inspect(|results| {
                tracing::debug!(
                    statement,
                    rows = results.row_count,
                    elapsed = ?results.execution_time,
                    "statement finished"
                );
            })
            .inspect_err(|e| {
                tracing::warn!(statement, error = %e, "statement failed");
            })
    }

    /// Render results with the configured column widths
    pub fn render(&self, results: &QueryResults) -> String {
        render_table(results, &self.config)
    }

    /// Print results to standard output
    pub fn print(&self, results: &QueryResults) {
        let mut stdout = std::io::stdout().lock();
        // A closed stdout (e.g. `| head`) is not worth failing over
        let _ = stdout.write_all(self.render(results).as_bytes());
    }

    /// Print the first [`DEFAULT_LIMIT`] rows of a table
    pub async fn print_table(&mut self, table: &str) -> DbResult<()> {
        let results = self.select_all_columns(table, None).await?;
        self.print(&results);
        Ok(())
    }

    /// Write the configuration, including discovered table details
    pub fn write_config(&self, path: impl AsRef<Path>) -> ConfigResult<()> {
        let path = path.as_ref();
        self.config.save(path)?;
        tracing::info!(path = %path.display(), "configuration written");
        Ok(())
    }

    fn known_details(&self, table: &str) -> DbResult<&TableDetails> {
        self.config
            .table_details(table)
            .ok_or_else(|| DbError::SchemaLoadFailed {
                table: table.to_string(),
                reason: "table details missing after discovery".to_string(),
            })
    }
}
