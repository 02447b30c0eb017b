use super::{bounded_int, reject_unknown, required_string};
use crate::error::ToolResult;
use rmcp::schemars;
use serde::Deserialize;
use serde_json::{Map, Value};

pub const DEFAULT_MAX_COLUMNS: i64 = 2000;
pub const MAX_MAX_COLUMNS: i64 = 2000;

#[derive(Debug, Default, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TableSchemaRequest {
    #[schemars(required)]
    #[schemars(description = "Table identifier as returned by tables_list (file:<absolute-path>)")]
    pub table_id: Option<String>,

    /// Maximum number of column descriptors to return (default: 2000)
    #[schemars(description = "Maximum number of columns to describe (1..=2000, default 2000)")]
    pub max_columns: Option<i64>,

    #[serde(flatten)]
    #[schemars(skip)]
    pub unknown: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableSchemaOptions {
    pub table_id: String,
    pub max_columns: usize,
}

impl TableSchemaRequest {
    pub fn validate(self) -> ToolResult<TableSchemaOptions> {
        reject_unknown(&self.unknown)?;
        let table_id = required_string("tableId", self.table_id)?;
        let max_columns = bounded_int(
            "maxColumns",
            self.max_columns,
            DEFAULT_MAX_COLUMNS,
            1,
            MAX_MAX_COLUMNS,
        )?;
        Ok(TableSchemaOptions {
            table_id,
            max_columns: max_columns as usize,
        })
    }
}
