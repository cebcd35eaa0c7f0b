//! sf-sql - SQL parsing and rendering for Schemaflow
//!
//! This crate turns migration operations into dialect SQL and parses raw
//! SQL bodies for lint checks.

pub mod dialect;
pub mod error;
pub mod parser;
pub mod render;

pub use dialect::{dialect_for, DuckDbDialect, PostgresDialect, SqlDialect};
pub use error::{SqlError, SqlResult};
pub use parser::SqlParser;
pub use render::{quote_literal, quote_string, RenderPlan, Rendered, SqlRenderer};
