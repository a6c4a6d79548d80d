//! Integration tests for DatabaseWorker against a live PostgreSQL
//!
//! Every test works on its own table so the tests can run in parallel.

use pgworker::config::{ConnectionParams, WorkerConfig};
use pgworker::db::{CellValue, Database, PRIMARY_KEY_NONE, PgConnection};
use pgworker::sql::SqlValue;
use pgworker::{DatabaseWorker, DbError};
use std::collections::BTreeMap;

/// Connection parameters of the test database
fn test_params() -> ConnectionParams {
    let env = |key: &str, default: &str| std::env::var(key).unwrap_or_else(|_| default.to_string());
    let mut params = ConnectionParams::new();
    params.insert("host", env("TEST_DB_HOST", "localhost"));
    params.insert("port", env("TEST_DB_PORT", "5433"));
    params.insert("dbname", env("TEST_DB_NAME", "test_db"));
    params.insert("user", env("TEST_DB_USER", "test_user"));
    params.insert("password", env("TEST_DB_PASSWORD", "test_password"));
    params.insert("sslmode", "disable");
    params
}

fn test_config(tables: &[&str]) -> WorkerConfig {
    WorkerConfig {
        connection: test_params(),
        tables: tables.iter().map(|t| t.to_string()).collect(),
        ..WorkerConfig::default()
    }
}

/// Connect and run setup statements, or `None` when no database is reachable
async fn prepared_connection(setup: &[&str]) -> Option<PgConnection> {
    let mut conn = match PgConnection::connect(&test_params()).await {
        Ok(conn) => conn,
        Err(e) => {
            eprintln!("Skipping test: Database not available - {}", e);
            return None;
        }
    };
    for statement in setup {
        conn.execute(statement)
            .await
            .unwrap_or_else(|e| panic!("setup failed for {}: {}", statement, e));
    }
    Some(conn)
}

#[tokio::test]
async fn test_connection_failure_is_reported() {
    let mut params = ConnectionParams::new();
    params.insert("host", "127.0.0.1");
    params.insert("port", 1);
    params.insert("sslmode", "disable");

    let result = PgConnection::connect(&params).await.map(|_| ());
    assert!(matches!(result, Err(DbError::ConnectionFailed(_))));
    tokio_test::assert_err!(result);
}

#[tokio::test]
async fn test_construction_discovers_declared_table() {
    let Some(conn) = prepared_connection(&[
        "DROP TABLE IF EXISTS pgw_discover CASCADE",
        "CREATE TABLE pgw_discover (id serial PRIMARY KEY, name text, created_at timestamp)",
    ])
    .await
    else {
        return;
    };

    let worker = DatabaseWorker::with_database(conn, test_config(&["public.pgw_discover"]))
        .await
        .expect("discovery should succeed");

    let details = worker.table_details("public.pgw_discover").unwrap();
    assert_eq!(details.schema, "public");
    assert_eq!(details.table, "pgw_discover");
    assert_eq!(details.primary_key, "id");
    let columns: Vec<(&str, &str)> = details.columns.iter().collect();
    assert_eq!(
        columns,
        vec![("id", "int4"), ("name", "text"), ("created_at", "timestamp")]
    );
}

#[tokio::test]
async fn test_table_without_primary_key() {
    let Some(conn) = prepared_connection(&[
        "DROP TABLE IF EXISTS pgw_nopk CASCADE",
        "CREATE TABLE pgw_nopk (line text)",
    ])
    .await
    else {
        return;
    };

    let worker = DatabaseWorker::with_database(conn, test_config(&["public.pgw_nopk"]))
        .await
        .unwrap();
    assert_eq!(
        worker.table_details("public.pgw_nopk").unwrap().primary_key,
        PRIMARY_KEY_NONE
    );
}

#[tokio::test]
async fn test_insert_then_select() {
    let Some(conn) = prepared_connection(&[
        "DROP TABLE IF EXISTS pgw_people CASCADE",
        "CREATE TABLE pgw_people (id serial PRIMARY KEY, name text, score int4)",
    ])
    .await
    else {
        return;
    };
    let mut worker = DatabaseWorker::with_database(conn, test_config(&["public.pgw_people"]))
        .await
        .unwrap();

    let inserted = worker
        .insert("public.pgw_people", &["O'Hara".into(), 7.into()])
        .await
        .unwrap();
    assert_eq!(inserted, 1);
    worker
        .insert("public.pgw_people", &["Bob".into(), 3.into()])
        .await
        .unwrap();

    let results = worker
        .select("public.pgw_people", &["name", "score"], Some("score > 5"), 10)
        .await
        .unwrap();
    assert_eq!(results.row_count, 1);
    assert_eq!(
        results.get(0, "name"),
        Some(&CellValue::Text("O'Hara".to_string()))
    );
    assert_eq!(results.get(0, "score"), Some(&CellValue::Integer(7)));

    let table = worker.render(&results);
    assert!(table.starts_with("name       |score      |\n"));
}

#[tokio::test]
async fn test_timestamp_primary_key_is_supplied() {
    let Some(conn) = prepared_connection(&[
        "DROP TABLE IF EXISTS pgw_readings CASCADE",
        "CREATE TABLE pgw_readings (taken_at timestamptz PRIMARY KEY, value float8)",
    ])
    .await
    else {
        return;
    };
    let mut worker = DatabaseWorker::with_database(conn, test_config(&["public.pgw_readings"]))
        .await
        .unwrap();

    worker
        .insert_timed("public.pgw_readings", chrono::Utc::now(), &[21.5.into()])
        .await
        .unwrap();

    let results = worker
        .select_all_columns("public.pgw_readings", None)
        .await
        .unwrap();
    assert_eq!(results.row_count, 1);
    assert_eq!(results.get(0, "value"), Some(&CellValue::Float(21.5)));
}

#[tokio::test]
async fn test_undeclared_table_is_discovered_lazily() {
    let Some(conn) = prepared_connection(&[
        "DROP TABLE IF EXISTS pgw_lazy CASCADE",
        "CREATE TABLE pgw_lazy (id serial PRIMARY KEY, label text, qty int4)",
    ])
    .await
    else {
        return;
    };
    let mut worker = DatabaseWorker::with_database(conn, test_config(&[]))
        .await
        .unwrap();
    assert!(worker.table_details("public.pgw_lazy").is_none());

    let mut base = BTreeMap::new();
    base.insert("label".to_string(), SqlValue::from("widget"));
    let mut extra = BTreeMap::new();
    extra.insert("qty".to_string(), SqlValue::from(4));
    worker
        .insert_from_maps("public.pgw_lazy", &[&base, &extra])
        .await
        .unwrap();

    assert!(worker.table_details("public.pgw_lazy").is_some());
    assert_eq!(worker.config().tables, vec!["public.pgw_lazy"]);

    worker.clear("public.pgw_lazy").await.unwrap();
    let results = worker
        .select_all_columns("public.pgw_lazy", None)
        .await
        .unwrap();
    assert!(results.is_empty());
    // empty results still carry their columns
    assert_eq!(results.columns.len(), 3);
}

#[tokio::test]
async fn test_missing_table_is_an_error() {
    let Some(conn) = prepared_connection(&[]).await else {
        return;
    };
    let mut worker = DatabaseWorker::with_database(conn, test_config(&[]))
        .await
        .unwrap();

    let result = worker
        .select_all_columns("public.pgw_does_not_exist", None)
        .await;
    assert!(matches!(result, Err(DbError::SchemaLoadFailed { .. })));
}

#[tokio::test]
async fn test_connect_from_file_writes_output() {
    let Some(_) = prepared_connection(&[
        "DROP TABLE IF EXISTS pgw_output CASCADE",
        "CREATE TABLE pgw_output (id bigserial PRIMARY KEY, body text)",
    ])
    .await
    else {
        return;
    };

    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("in.yaml");
    let output = dir.path().join("out.yaml");
    test_config(&["public.pgw_output"]).save(&input).unwrap();

    let worker = DatabaseWorker::connect(&input, Some(output.as_path()))
        .await
        .unwrap();
    assert!(worker.table_details("public.pgw_output").is_some());

    let written = WorkerConfig::load(&output).unwrap();
    let details = written.table_details("public.pgw_output").unwrap();
    assert_eq!(details.columns.get("id"), Some("int8"));
    assert_eq!(details.primary_key, "id");
}
