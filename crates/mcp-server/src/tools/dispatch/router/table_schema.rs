use super::super::{CallToolResult, JmpReadonlyService, McpError, TableSchemaRequest};
use super::error::tool_error;

pub(in crate::tools::dispatch) async fn table_schema(
    service: &JmpReadonlyService,
    request: TableSchemaRequest,
) -> Result<CallToolResult, McpError> {
    let options = match request.validate() {
        Ok(options) => options,
        Err(err) => return Ok(tool_error(err)),
    };
    log::debug!(
        "table_schema tableId={} maxColumns={}",
        options.table_id,
        options.max_columns
    );

    let ops = service.operations_handle();
    Ok(service
        .isolated("table_schema", async move {
            ops.schema(&options.table_id, options.max_columns).await
        })
        .await)
}
