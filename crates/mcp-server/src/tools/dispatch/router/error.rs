use super::super::{CallToolResult, Content};
use crate::error::{ToolError, ToolResult};
use jmp_protocol::ErrorResponse;
use serde::Serialize;
use serde_json::Value;

/// Success payload as a single JSON text block, mirrored into `structured_content`.
pub(in crate::tools::dispatch) fn tool_success<T: Serialize>(payload: &T) -> CallToolResult {
    let value = match serde_json::to_value(payload) {
        Ok(value) => value,
        Err(err) => {
            return tool_error(
                ToolError::internal("Unexpected server error")
                    .with_detail("hint", format!("failed to serialize result: {err}")),
            );
        }
    };
    let mut result = CallToolResult::success(vec![Content::text(value.to_string())]);
    result.structured_content = Some(value);
    result
}

/// `{"error": {code, message, details}}` with `isError` set.
pub(in crate::tools::dispatch) fn tool_error(error: ToolError) -> CallToolResult {
    let response = ErrorResponse::from(error.into_envelope());
    let value = serde_json::to_value(&response).unwrap_or(Value::Null);
    let mut result = CallToolResult::error(vec![Content::text(value.to_string())]);
    result.structured_content = Some(value);
    result
}

pub(in crate::tools::dispatch) fn tool_result<T: Serialize>(result: ToolResult<T>) -> CallToolResult {
    match result {
        Ok(payload) => tool_success(&payload),
        Err(err) => tool_error(err),
    }
}
