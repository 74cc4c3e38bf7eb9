//! Datafile MCP Server Library
//!
//! This library provides MCP (Model Context Protocol) tools for AI assistants
//! to run read-only SQL over local data files (SQLite, CSV, Parquet, JSON/NDJSON)
//! and turn the results into chart-ready series and tables.

pub mod config;
pub mod error;
pub mod mcp;
pub mod models;
pub mod source;
pub mod tools;
pub mod transport;

pub use config::Config;
pub use error::{DataError, DataResult};
pub use mcp::DataService;
pub use source::{QueryExecutor, SchemaInspector};
