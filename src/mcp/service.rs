//! MCP service implementation using rmcp.
//!
//! This module defines the DataService struct with all data file tools
//! exposed via the MCP protocol using the rmcp framework's macros.

use crate::source::QueryExecutor;
use crate::tools::chart::{ChartOutput, ChartToolHandler, QueryChartInput, TransformInput};
use crate::tools::query::{QueryToolHandler, RunQueryInput, RunQueryOutput};
use crate::tools::schema::{GetSchemaInput, GetSchemaOutput, SchemaToolHandler};
use rmcp::Json;
use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::tool::ToolRouter,
    handler::server::wrapper::Parameters,
    model::{Implementation, ProtocolVersion, ServerCapabilities, ServerInfo},
    tool, tool_handler, tool_router,
};

#[derive(Clone)]
pub struct DataService {
    /// Guarded executor shared by run_query and query_chart
    executor: QueryExecutor,
    /// Tool router for MCP tool dispatch (auto-generated)
    tool_router: ToolRouter<Self>,
}

impl DataService {
    /// Create a new DataService instance.
    pub fn new(executor: QueryExecutor) -> Self {
        Self {
            executor,
            tool_router: Self::tool_router(),
        }
    }
}

#[tool_router]
impl DataService {
    #[tool(
        description = "Get the schema of a data file.\nSQLite files list every table alphabetically with column types, NOT NULL, defaults and primary keys.\nCSV, Parquet, JSON and NDJSON files expose one table named after the file without its extension."
    )]
    async fn get_schema(
        &self,
        Parameters(input): Parameters<GetSchemaInput>,
    ) -> Result<Json<GetSchemaOutput>, McpError> {
        SchemaToolHandler::new()
            .get_schema(input)
            .await
            .map(Json)
            .map_err(McpError::from)
    }

    #[tool(
        description = "Run a read-only SQL query against a data file.\nOnly a single SELECT or WITH statement is accepted. Results over 10000 rows fail; add LIMIT or aggregate.\nQueries are aborted after 5 seconds.\nFlat files are queried by file name without extension: `SELECT * FROM sales` for sales.csv.\nOutput format: json (default), table, or markdown."
    )]
    async fn run_query(
        &self,
        Parameters(input): Parameters<RunQueryInput>,
    ) -> Result<Json<RunQueryOutput>, McpError> {
        QueryToolHandler::new(self.executor)
            .run_query(input)
            .await
            .map(Json)
            .map_err(McpError::from)
    }

    #[tool(
        description = "Transform query rows into chart-ready data.\nmode \"table\": headers plus positional rows.\nmode \"series\": mapping.xColumn and mapping.yColumns are required; each y column becomes a series of [x, y] points sorted by x.\nWith mapping.seriesColumn (or groupByColumn) rows are split into one series per distinct value using the first y column.\nString values are read as numbers, then as dates (epoch milliseconds)."
    )]
    async fn transform(
        &self,
        Parameters(input): Parameters<TransformInput>,
    ) -> Result<Json<ChartOutput>, McpError> {
        ChartToolHandler::new(self.executor)
            .transform(input)
            .map(Json)
            .map_err(McpError::from)
    }

    #[tool(
        description = "Run a read-only query and transform the result in one call.\nSame rules as run_query followed by transform."
    )]
    async fn query_chart(
        &self,
        Parameters(input): Parameters<QueryChartInput>,
    ) -> Result<Json<ChartOutput>, McpError> {
        ChartToolHandler::new(self.executor)
            .query_chart(input)
            .await
            .map(Json)
            .map_err(McpError::from)
    }
}

#[tool_handler]
impl ServerHandler for DataService {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2025_03_26,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "datafile-mcp-server".to_owned(),
                title: Some("Data File MCP Server".to_owned()),
                version: env!("CARGO_PKG_VERSION").to_owned(),
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "Read-only SQL over local data files, with chart-ready output.\n\
                \n\
                ## Workflow\n\
                1. Call `get_schema` with a file path to see its tables and columns\n\
                2. Call `run_query` with a SELECT or WITH statement\n\
                3. Call `transform` on the rows, or use `query_chart` to do 2 and 3 at once\n\
                \n\
                ## Supported Files\n\
                - SQLite: .db, .sqlite, .sqlite3 (opened read-only)\n\
                - CSV: .csv\n\
                - Parquet: .parquet\n\
                - JSON: .json, newline-delimited .jsonl / .ndjson\n\
                Flat files are queried as a table named after the file: `data/sales.csv` is `sales`.\n\
                \n\
                ## Limits\n\
                - Results over 10000 rows fail rather than truncate; aggregate or add LIMIT\n\
                - Queries are aborted after 5 seconds\n\
                - Relative paths resolve against the server's working directory"
                    .to_string(),
            ),
        }
    }
}
