//! MCP tool implementations.
//!
//! This module contains the tool handlers and the logic they share:
//! - `schema`: get_schema
//! - `query`: run_query
//! - `chart`: transform and query_chart
//! - `guard`: read-only validation of submitted SQL
//! - `transform`: rows to tables and chart series
//! - `format`: ASCII and Markdown renderings

pub mod chart;
pub mod format;
pub mod guard;
pub mod query;
pub mod schema;
pub mod transform;

pub use chart::{ChartOutput, ChartToolHandler, QueryChartInput, TransformInput};
pub use query::{QueryToolHandler, RunQueryInput, RunQueryOutput};
pub use schema::{GetSchemaInput, GetSchemaOutput, SchemaToolHandler};
