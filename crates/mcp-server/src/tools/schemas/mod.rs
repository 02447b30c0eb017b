//! Tool request types and their validation into option structs.
//!
//! Requests deserialize leniently (every field optional, unknown keys captured) so that all
//! validation failures surface as a single `INVALID_ARGUMENT` envelope naming the offending field.

pub mod table_preview;
pub mod table_schema;
pub mod tables_list;

pub use table_preview::{TablePreviewOptions, TablePreviewRequest};
pub use table_schema::{TableSchemaOptions, TableSchemaRequest};
pub use tables_list::{TablesListOptions, TablesListRequest};

use crate::error::{ToolError, ToolResult};
use serde_json::{Map, Value};

pub const VALIDATION_FAILED: &str = "Input validation failed";

pub(crate) fn invalid_field(field: &str, message: impl Into<String>) -> ToolError {
    ToolError::invalid_argument(VALIDATION_FAILED)
        .with_detail("path", field)
        .with_detail("message", message.into())
}

pub(crate) fn reject_unknown(unknown: &Map<String, Value>) -> ToolResult<()> {
    match unknown.keys().next() {
        Some(key) => Err(invalid_field(
            key,
            format!("Additional properties are not allowed ('{key}' was unexpected)"),
        )),
        None => Ok(()),
    }
}

pub(crate) fn required_string(field: &str, value: Option<String>) -> ToolResult<String> {
    match value {
        None => Err(invalid_field(field, format!("'{field}' is a required property"))),
        Some(value) if value.is_empty() => {
            Err(invalid_field(field, "'' should be non-empty"))
        }
        Some(value) => Ok(value),
    }
}

pub(crate) fn bounded_int(
    field: &str,
    value: Option<i64>,
    default: i64,
    min: i64,
    max: i64,
) -> ToolResult<i64> {
    let value = value.unwrap_or(default);
    if value < min {
        return Err(invalid_field(
            field,
            format!("{value} is less than the minimum of {min}"),
        ));
    }
    if value > max {
        return Err(invalid_field(
            field,
            format!("{value} is greater than the maximum of {max}"),
        ));
    }
    Ok(value)
}
