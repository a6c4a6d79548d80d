//! Database type definitions
//!
//! Result sets as returned by the worker: column metadata plus typed cell
//! values.

use std::time::Duration;

/// Query execution results
#[derive(Debug, Clone)]
pub struct QueryResults {
    /// Column definitions
    pub columns: Vec<ColumnDef>,
    /// Result rows
    pub rows: Vec<Row>,
    /// Query execution time
    pub execution_time: Duration,
    /// Rows returned, or rows affected for statements without a result set
    pub row_count: usize,
}

/// Column definition in query results
#[derive(Debug, Clone)]
pub struct ColumnDef {
    /// Column name
    pub name: String,
    /// Type name as stored in the catalog (`int4`, `timestamp`, ...)
    pub type_name: String,
    /// Decoded data type
    pub data_type: DataType,
}

/// Data types the worker decodes natively; everything else is read as text
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataType {
    SmallInt,
    Integer,
    BigInt,
    Real,
    Double,
    Numeric,
    Text,
    Boolean,
    Date,
    Time,
    Timestamp,
    TimestampTz,
    Json,
    Jsonb,
    Bytea,
    Uuid,
    Array(Box<DataType>),
    Unknown(String),
}

/// A single row of query results
#[derive(Debug, Clone)]
pub struct Row {
    /// Cell values in column order
    pub values: Vec<CellValue>,
}

/// A cell value (single column value in a row)
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Null,
    Integer(i64),
    Float(f64),
    Text(String),
    Boolean(bool),
    Json(serde_json::Value),
    Binary(Vec<u8>),
    /// Date/time value, already formatted
    DateTime(String),
    Uuid(String),
    Array(Vec<CellValue>),
}

impl QueryResults {
    pub fn new(
        columns: Vec<ColumnDef>,
        rows: Vec<Row>,
        execution_time: Duration,
        row_count: usize,
    ) -> Self {
        Self {
            columns,
            rows,
            execution_time,
            row_count,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Value at `(row, column name)`
    pub fn get(&self, row: usize, column: &str) -> Option<&CellValue> {
        let idx = self.columns.iter().position(|c| c.name == column)?;
        self.rows.get(row)?.values.get(idx)
    }
}

impl CellValue {
    /// Full display text of this value
    pub fn display_text(&self) -> String {
        match self {
            CellValue::Null => "NULL".to_string(),
            CellValue::Integer(i) => i.to_string(),
            CellValue::Float(f) => f.to_string(),
            CellValue::Text(s) => s.clone(),
            CellValue::Boolean(b) => b.to_string(),
            CellValue::Json(v) => v.to_string(),
            CellValue::Binary(b) => format!("<binary {} bytes>", b.len()),
            CellValue::DateTime(s) => s.clone(),
            CellValue::Uuid(s) => s.clone(),
            CellValue::Array(arr) => {
                let items: Vec<String> = arr.iter().map(|v| v.display_text()).collect();
                format!("{{{}}}", items.join(","))
            }
        }
    }
}
