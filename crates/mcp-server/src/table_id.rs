//! Opaque `file:<absolute-path>` table identifiers.
//!
//! A decoded path is *not* trusted: callers always pass it back through the sandbox.

use crate::error::{ToolError, ToolResult};
use std::path::{Path, PathBuf};

pub const TABLE_ID_PREFIX: &str = "file:";

pub fn encode(path: &Path) -> String {
    format!("{TABLE_ID_PREFIX}{}", path.display())
}

pub fn decode(table_id: &str) -> ToolResult<PathBuf> {
    let Some(rest) = table_id.strip_prefix(TABLE_ID_PREFIX) else {
        return Err(ToolError::invalid_argument("tableId must start with file:")
            .with_detail("tableId", table_id));
    };
    if rest.is_empty() {
        return Err(ToolError::invalid_argument("tableId path is empty")
            .with_detail("tableId", table_id));
    }
    Ok(PathBuf::from(rest))
}
