use super::super::{CallToolResult, JmpReadonlyService, McpError, TablesListRequest};
use super::error::tool_error;

/// List table files directly inside a sandboxed directory.
pub(in crate::tools::dispatch) async fn tables_list(
    service: &JmpReadonlyService,
    request: TablesListRequest,
) -> Result<CallToolResult, McpError> {
    let options = match request.validate() {
        Ok(options) => options,
        Err(err) => return Ok(tool_error(err)),
    };
    log::debug!("tables_list path={} formats={:?}", options.path, options.formats);

    let ops = service.operations_handle();
    Ok(service
        .isolated("tables_list", async move {
            ops.list(&options.path, &options.formats).await
        })
        .await)
}
