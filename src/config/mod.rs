//! Configuration management
//!
//! Handles the YAML worker configuration and the connection parameters it
//! carries.

pub mod connections;
pub mod settings;

pub use connections::{ConnectionParams, SslMode};
pub use settings::{DEFAULT_FIELD_WIDTH, WorkerConfig};
