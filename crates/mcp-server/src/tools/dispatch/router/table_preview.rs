use super::super::{CallToolResult, JmpReadonlyService, McpError, TablePreviewRequest};
use super::error::tool_error;

pub(in crate::tools::dispatch) async fn table_preview(
    service: &JmpReadonlyService,
    request: TablePreviewRequest,
) -> Result<CallToolResult, McpError> {
    let options = match request.validate() {
        Ok(options) => options,
        Err(err) => return Ok(tool_error(err)),
    };
    log::debug!(
        "table_preview tableId={} rows={} method={} seed={}",
        options.table_id,
        options.preview.rows,
        options.preview.method.as_str(),
        options.preview.seed
    );

    let ops = service.operations_handle();
    Ok(service
        .isolated("table_preview", async move {
            ops.preview(&options.table_id, options.preview).await
        })
        .await)
}
