//! PostgreSQL database connection
//!
//! Concrete implementation using tokio-postgres.

use crate::config::{ConnectionParams, SslMode};
use crate::db::Database;
use crate::db::types::{CellValue, ColumnDef, DataType, QueryResults, Row};
use crate::error::{DbError, DbResult};
use rust_decimal::Decimal;
use tokio_postgres::Client;
use tokio_postgres::types::Type;

const PRIMARY_KEY_QUERY: &str = "\
SELECT kcu.column_name::text \
FROM information_schema.table_constraints tc \
JOIN information_schema.key_column_usage kcu \
  ON kcu.constraint_schema = tc.constraint_schema \
 AND kcu.constraint_name = tc.constraint_name \
 AND kcu.table_name = tc.table_name \
WHERE tc.constraint_type = 'PRIMARY KEY' \
  AND tc.table_schema::text = $1 \
  AND tc.table_name::text = $2 \
ORDER BY kcu.ordinal_position \
LIMIT 1";

/// One open PostgreSQL connection
pub struct PgConnection {
    /// The tokio-postgres client
    client: Client,
}

impl PgConnection {
    /// Connect using the `connection` section of the worker configuration.
    ///
    /// The background connection task is spawned on the current runtime and
    /// logs if the connection is lost.
    pub async fn connect(params: &ConnectionParams) -> DbResult<Self> {
        let conn_string = params
            .connection_string()
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;
        let target = params.describe();

        let client = match params.ssl_mode() {
            SslMode::Disable => {
                let (client, connection) =
                    tokio_postgres::connect(&conn_string, tokio_postgres::NoTls)
                        .await
                        .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;
                let target = target.clone();
                tokio::spawn(async move {
                    if let Err(e) = connection.await {
                        tracing::error!(%target, error = %e, "connection lost");
                    }
                });
                client
            }
            SslMode::Prefer | SslMode::Require => {
                let tls = tokio_postgres_rustls::MakeRustlsConnect::new(make_tls_config());
                let (client, connection) = tokio_postgres::connect(&conn_string, tls)
                    .await
                    .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;
                let target = target.clone();
                tokio::spawn(async move {
                    if let Err(e) = connection.await {
                        tracing::error!(%target, error = %e, "connection lost");
                    }
                });
                client
            }
        };

        tracing::info!(%target, "connected");
        Ok(Self { client })
    }
}

impl Database for PgConnection {
    async fn execute(&mut self, sql: &str) -> DbResult<QueryResults> {
        let start = std::time::Instant::now();
        tracing::debug!(sql, "executing");

        let tx = self.client.transaction().await?;
        let stmt = tx.prepare(sql).await?;

        let columns: Vec<ColumnDef> = stmt
            .columns()
            .iter()
            .map(|col| ColumnDef {
                name: col.name().to_string(),
                type_name: col.type_().name().to_string(),
                data_type: pg_type_to_datatype(col.type_()),
            })
            .collect();

        // Statements without a result set report the affected row count
        if columns.is_empty() {
            let affected = tx.execute(&stmt, &[]).await?;
            tx.commit().await?;
            return Ok(QueryResults::new(
                columns,
                Vec::new(),
                start.elapsed(),
                affected as usize,
            ));
        }

        let pg_rows = tx.query(&stmt, &[]).await?;
        tx.commit().await?;

        let rows: Vec<Row> = pg_rows
            .iter()
            .map(|pg_row| Row {
                values: columns
                    .iter()
                    .enumerate()
                    .map(|(i, col)| extract_cell_value(pg_row, i, &col.data_type))
                    .collect(),
            })
            .collect();
        let row_count = rows.len();

        Ok(QueryResults::new(columns, rows, start.elapsed(), row_count))
    }

    async fn describe_columns(&mut self, table: &str) -> DbResult<Vec<(String, u32)>> {
        // Preparing is enough to learn the result shape; nothing is fetched
        let stmt = self
            .client
            .prepare(&format!("SELECT * FROM {} LIMIT 0", table))
            .await
            .map_err(|e| schema_error(table, e))?;
        Ok(stmt
            .columns()
            .iter()
            .map(|col| (col.name().to_string(), col.type_().oid()))
            .collect())
    }

    async fn primary_key(&mut self, schema: &str, table: &str) -> DbResult<Option<String>> {
        let row = self
            .client
            .query_opt(PRIMARY_KEY_QUERY, &[&schema, &table])
            .await
            .map_err(|e| schema_error(&format!("{}.{}", schema, table), e))?;
        Ok(row.map(|r| r.get(0)))
    }

    async fn lookup_type_name(&mut self, oid: u32) -> DbResult<String> {
        if let Some(ty) = Type::from_oid(oid) {
            return Ok(ty.name().to_string());
        }
        let row = self
            .client
            .query_opt("SELECT typname::text FROM pg_type WHERE oid = $1", &[&oid])
            .await?;
        row.map(|r| r.get(0)).ok_or(DbError::TypeLookupFailed(oid))
    }
}

fn schema_error(table: &str, e: tokio_postgres::Error) -> DbError {
    DbError::SchemaLoadFailed {
        table: table.to_string(),
        reason: e.to_string(),
    }
}

/// Map tokio_postgres Type to our DataType enum
fn pg_type_to_datatype(pg_type: &Type) -> DataType {
    match *pg_type {
        Type::INT2 => DataType::SmallInt,
        Type::INT4 => DataType::Integer,
        Type::INT8 => DataType::BigInt,
        Type::FLOAT4 => DataType::Real,
        Type::FLOAT8 => DataType::Double,
        Type::NUMERIC => DataType::Numeric,
        Type::TEXT | Type::NAME | Type::VARCHAR | Type::CHAR | Type::BPCHAR => DataType::Text,
        Type::BOOL => DataType::Boolean,
        Type::DATE => DataType::Date,
        Type::TIME => DataType::Time,
        Type::TIMESTAMP => DataType::Timestamp,
        Type::TIMESTAMPTZ => DataType::TimestampTz,
        Type::JSON => DataType::Json,
        Type::JSONB => DataType::Jsonb,
        Type::BYTEA => DataType::Bytea,
        Type::UUID => DataType::Uuid,
        Type::INT4_ARRAY => DataType::Array(Box::new(DataType::Integer)),
        Type::INT8_ARRAY => DataType::Array(Box::new(DataType::BigInt)),
        Type::TEXT_ARRAY | Type::VARCHAR_ARRAY => DataType::Array(Box::new(DataType::Text)),
        _ => DataType::Unknown(pg_type.name().to_string()),
    }
}

/// Build a rustls ClientConfig that trusts OS certificates (with Mozilla roots as fallback)
fn make_tls_config() -> rustls::ClientConfig {
    let mut root_store = rustls::RootCertStore::empty();

    let native_certs = rustls_native_certs::load_native_certs();
    let mut loaded = 0;
    for cert in native_certs.certs {
        if root_store.add(cert).is_ok() {
            loaded += 1;
        }
    }
    if loaded == 0 {
        root_store.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
    }

    rustls::ClientConfig::builder()
        .with_root_certificates(root_store)
        .with_no_client_auth()
}

/// Decode one cell, falling back to text when the typed read fails
fn extract_cell_value(row: &tokio_postgres::Row, idx: usize, data_type: &DataType) -> CellValue {
    fn typed<'a, T, F>(row: &'a tokio_postgres::Row, idx: usize, f: F) -> CellValue
    where
        T: tokio_postgres::types::FromSql<'a>,
        F: FnOnce(T) -> CellValue,
    {
        match row.try_get::<_, Option<T>>(idx) {
            Ok(Some(v)) => f(v),
            Ok(None) => CellValue::Null,
            Err(_) => try_as_string(row, idx),
        }
    }

    match data_type {
        DataType::SmallInt => typed(row, idx, |v: i16| CellValue::Integer(v as i64)),
        DataType::Integer => typed(row, idx, |v: i32| CellValue::Integer(v as i64)),
        DataType::BigInt => typed(row, idx, CellValue::Integer),
        DataType::Real => typed(row, idx, |v: f32| CellValue::Float(v as f64)),
        DataType::Double => typed(row, idx, CellValue::Float),
        DataType::Numeric => typed(row, idx, |v: Decimal| CellValue::Text(v.to_string())),
        DataType::Boolean => typed(row, idx, CellValue::Boolean),
        DataType::Json | DataType::Jsonb => typed(row, idx, CellValue::Json),
        DataType::Bytea => typed(row, idx, CellValue::Binary),
        DataType::Uuid => typed(row, idx, |v: uuid::Uuid| CellValue::Uuid(v.to_string())),
        DataType::Timestamp => typed(row, idx, |v: chrono::NaiveDateTime| {
            CellValue::DateTime(v.to_string())
        }),
        DataType::TimestampTz => typed(row, idx, |v: chrono::DateTime<chrono::Utc>| {
            CellValue::DateTime(v.to_string())
        }),
        DataType::Date => typed(row, idx, |v: chrono::NaiveDate| {
            CellValue::DateTime(v.to_string())
        }),
        DataType::Time => typed(row, idx, |v: chrono::NaiveTime| {
            CellValue::DateTime(v.to_string())
        }),
        DataType::Array(inner) => match inner.as_ref() {
            DataType::Integer => typed(row, idx, |v: Vec<i32>| {
                CellValue::Array(v.into_iter().map(|n| CellValue::Integer(n as i64)).collect())
            }),
            DataType::BigInt => typed(row, idx, |v: Vec<i64>| {
                CellValue::Array(v.into_iter().map(CellValue::Integer).collect())
            }),
            DataType::Text => typed(row, idx, |v: Vec<String>| {
                CellValue::Array(v.into_iter().map(CellValue::Text).collect())
            }),
            _ => try_as_string(row, idx),
        },
        // Text types and fallback for unknown types
        _ => try_as_string(row, idx),
    }
}

/// Read a value as a string (fallback for type mismatches).
///
/// When even that fails, the postgres type name is shown instead.
fn try_as_string(row: &tokio_postgres::Row, idx: usize) -> CellValue {
    match row.try_get::<_, Option<String>>(idx) {
        Ok(Some(v)) => CellValue::Text(v),
        Ok(None) => CellValue::Null,
        Err(_) => {
            let type_name = row
                .columns()
                .get(idx)
                .map_or("unknown", |c| c.type_().name());
            CellValue::Text(format!("<unable to display: {}>", type_name))
        }
    }
}
