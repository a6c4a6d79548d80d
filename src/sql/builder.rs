//! Statement builders
//!
//! Table names, column names and WHERE conditions are trusted SQL text and
//! are written into statements as given. Values go through
//! [`SqlValue::to_sql_literal`].

use crate::db::schema::TableDetails;
use crate::error::{DbError, DbResult};
use crate::sql::SqlValue;
use std::collections::BTreeMap;

/// Row limit of [`select_statement`] when the caller has no preference
pub const DEFAULT_LIMIT: usize = 100;

/// `SELECT <fields|*> FROM <table>[ WHERE <condition>] LIMIT <limit>`
///
/// An empty field list selects every column. An empty condition is the
/// same as none.
pub fn select_statement<S: AsRef<str>>(
    table: &str,
    fields: &[S],
    condition: Option<&str>,
    limit: usize,
) -> String {
    let columns = if fields.is_empty() {
        "*".to_string()
    } else {
        join(fields.iter().map(|f| f.as_ref()))
    };
    let mut sql = format!("SELECT {} FROM {}", columns, table);
    if let Some(cond) = condition.filter(|c| !c.trim().is_empty()) {
        sql.push_str(" WHERE ");
        sql.push_str(cond);
    }
    sql.push_str(&format!(" LIMIT {}", limit));
    sql
}

/// `INSERT INTO <table>(<insertable columns>) VALUES(`
///
/// See [`TableDetails::insertable_columns`] for which columns are listed.
pub fn insert_statement_first_part(table: &str, details: &TableDetails) -> String {
    format!(
        "INSERT INTO {}({}) VALUES(",
        table,
        join(details.insertable_columns())
    )
}

/// Full positional INSERT; values follow the discovered column order.
///
/// A table with nothing to insert (only a generated primary key) gets
/// `INSERT INTO <table> DEFAULT VALUES`.
///
/// # Errors
/// Returns `DbError::ColumnCountMismatch` when `values` does not cover the
/// insertable columns exactly.
pub fn insert_statement(
    table: &str,
    details: &TableDetails,
    values: &[SqlValue],
) -> DbResult<String> {
    let expected = details.insertable_columns().len();
    if values.len() != expected {
        return Err(DbError::ColumnCountMismatch {
            table: table.to_string(),
            expected,
            actual: values.len(),
        });
    }
    if expected == 0 {
        return Ok(default_values_statement(table));
    }
    let mut sql = insert_statement_first_part(table, details);
    sql.push_str(&join_literals(values));
    sql.push(')');
    Ok(sql)
}

/// `INSERT INTO <table>(<keys>) VALUES(<values>)`, in key order.
///
/// An empty row becomes `INSERT INTO <table> DEFAULT VALUES`.
pub fn insert_from_map_statement(table: &str, row: &BTreeMap<String, SqlValue>) -> String {
    if row.is_empty() {
        return default_values_statement(table);
    }
    let columns = join(row.keys().map(String::as_str));
    let values: Vec<SqlValue> = row.values().cloned().collect();
    format!(
        "INSERT INTO {}({}) VALUES({})",
        table,
        columns,
        join_literals(&values)
    )
}

fn default_values_statement(table: &str) -> String {
    format!("INSERT INTO {} DEFAULT VALUES", table)
}

/// `TRUNCATE <table> CASCADE`
pub fn truncate_statement(table: &str) -> String {
    format!("TRUNCATE {} CASCADE", table)
}

/// Merge column maps into one row; later maps win on duplicate keys
pub fn merge_maps<'a, I>(maps: I) -> BTreeMap<String, SqlValue>
where
    I: IntoIterator<Item = &'a BTreeMap<String, SqlValue>>,
{
    let mut merged = BTreeMap::new();
    for map in maps {
        for (key, value) in map {
            merged.insert(key.clone(), value.clone());
        }
    }
    merged
}

fn join<'a>(items: impl IntoIterator<Item = &'a str>) -> String {
    items.into_iter().collect::<Vec<_>>().join(", ")
}

fn join_literals(values: &[SqlValue]) -> String {
    values
        .iter()
        .map(SqlValue::to_sql_literal)
        .collect::<Vec<_>>()
        .join(", ")
}
