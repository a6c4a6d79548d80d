//! pgworker - convenience worker over a single PostgreSQL connection
//!
//! A [`DatabaseWorker`] is built from a YAML file naming the connection
//! parameters, the tables of interest and display widths per column type.
//! On construction it connects, discovers the columns, type names and
//! primary key of every configured table, and can write that knowledge back
//! out as YAML.
//!
//! # Architecture
//!
//! - [`config`]: The YAML configuration tree and connection parameters
//! - [`db`]: The connection, schema details and result types
//! - [`sql`]: SQL literal rendering and statement builders
//! - [`print`]: Fixed-width text tables
//! - [`worker`]: The [`DatabaseWorker`] tying it together
//! - [`error`]: Error types and result aliases
//!
//! # Example
//!
//! ```no_run
//! use pgworker::DatabaseWorker;
//! use pgworker::sql::SqlValue;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut worker = DatabaseWorker::connect("pgworker.yaml", None).await?;
//!
//! worker
//!     .insert("public.sensors", &[SqlValue::from("boiler"), SqlValue::from(71.5)])
//!     .await?;
//!
//! let results = worker
//!     .select("public.sensors", &["name", "reading"], Some("reading > 50"), 10)
//!     .await?;
//! worker.print(&results);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod db;
pub mod error;
pub mod print;
pub mod sql;
pub mod worker;

pub use error::{ConfigError, DbError, PgWorkerError, Result};
pub use worker::DatabaseWorker;
