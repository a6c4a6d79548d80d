//! SQL utilities
//!
//! Literal rendering and statement builders used by the worker.

pub mod builder;
pub mod value;

pub use builder::{
    DEFAULT_LIMIT, insert_from_map_statement, insert_statement, insert_statement_first_part,
    merge_maps, select_statement, truncate_statement,
};
pub use value::SqlValue;
