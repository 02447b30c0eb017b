use super::schemas::{TablePreviewRequest, TableSchemaRequest, TablesListRequest};
use super::tables::TableOperations;
use crate::config::ServerConfig;
use crate::error::{ToolError, ToolResult};
use rmcp::handler::server::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{CallToolResult, Content, Implementation, ServerCapabilities, ServerInfo};
use rmcp::{tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler};
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;

/// Read-only JMP/CSV table MCP service
#[derive(Clone)]
pub struct JmpReadonlyService {
    /// Tool router
    tool_router: ToolRouter<Self>,
    /// Table operations over the process-wide configuration
    ops: Arc<TableOperations>,
}

impl JmpReadonlyService {
    pub fn new(config: ServerConfig) -> Self {
        Self {
            tool_router: Self::tool_router(),
            ops: Arc::new(TableOperations::new(Arc::new(config))),
        }
    }

    pub(in crate::tools::dispatch) fn operations_handle(&self) -> Arc<TableOperations> {
        Arc::clone(&self.ops)
    }

    /// Run one operation on its own task so a panic becomes an `INTERNAL` envelope instead of
    /// tearing down the connection.
    pub(in crate::tools::dispatch) async fn isolated<T, F>(
        &self,
        tool: &'static str,
        operation: F,
    ) -> CallToolResult
    where
        T: Serialize + Send + 'static,
        F: Future<Output = ToolResult<T>> + Send + 'static,
    {
        match tokio::spawn(operation).await {
            Ok(result) => {
                if let Err(err) = &result {
                    log::debug!("{tool} failed: {err}");
                }
                router::error::tool_result(result)
            }
            Err(join_err) => {
                log::error!("{tool} aborted: {join_err}");
                router::error::tool_error(
                    ToolError::internal("Unexpected server error")
                        .with_detail("hint", join_err.to_string()),
                )
            }
        }
    }
}

#[tool_handler]
impl ServerHandler for JmpReadonlyService {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some("Read-only inspection of .csv and .jmp tables under the configured DATA_ROOTS. Use 'tables_list' to find tables in a directory, then pass a returned tableId to 'table_schema' for column types and missing rates, or to 'table_preview' for a head or seeded random sample of rows.".into()),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation::from_build_env(),
            ..Default::default()
        }
    }
}

mod router;

#[tool_router]
impl JmpReadonlyService {
    /// List table files in a directory
    #[tool(
        description = "List .csv/.jmp table files directly inside a directory under DATA_ROOTS. Returns tableId, name, format, path and sizeBytes per table, sorted by file name."
    )]
    pub async fn tables_list(
        &self,
        Parameters(request): Parameters<TablesListRequest>,
    ) -> Result<CallToolResult, McpError> {
        router::tables_list::tables_list(self, request).await
    }

    /// Describe a table's columns
    #[tool(
        description = "Return row/column counts and per-column type, missing rate and distinct count for a table. Distinct counts are null for very large tables (see limits.nUniqueMayBeNull)."
    )]
    pub async fn table_schema(
        &self,
        Parameters(request): Parameters<TableSchemaRequest>,
    ) -> Result<CallToolResult, McpError> {
        router::table_schema::table_schema(self, request).await
    }

    /// Preview table rows
    #[tool(
        description = "Return up to `rows` records from a table, either the first rows ('head') or a reproducible random sample ('random' with `seed`)."
    )]
    pub async fn table_preview(
        &self,
        Parameters(request): Parameters<TablePreviewRequest>,
    ) -> Result<CallToolResult, McpError> {
        router::table_preview::table_preview(self, request).await
    }
}
