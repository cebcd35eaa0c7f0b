//! sf-db - Database abstraction layer for Schemaflow
//!
//! This crate provides the `Database` trait and its DuckDB implementation.

pub mod duckdb;
pub mod error;
pub mod traits;

pub use duckdb::DuckDbBackend;
pub use error::{DbError, DbResult};
pub use traits::{Database, Row};
