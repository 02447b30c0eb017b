use super::{bounded_int, invalid_field, reject_unknown, required_string};
use crate::error::ToolResult;
use crate::reader::{PreviewMethod, PreviewOptions};
use rmcp::schemars;
use serde::Deserialize;
use serde_json::{Map, Value};

pub const DEFAULT_PREVIEW_ROWS: i64 = 200;
pub const MAX_REQUEST_ROWS: i64 = 1000;
pub const DEFAULT_SEED: i64 = 42;
pub const MAX_SEED: i64 = 2_147_483_647;

#[derive(Debug, Default, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TablePreviewRequest {
    #[schemars(required)]
    #[schemars(description = "Table identifier as returned by tables_list (file:<absolute-path>)")]
    pub table_id: Option<String>,

    /// Number of rows to return (default: 200)
    #[schemars(description = "Rows to return (1..=1000, default 200; capped by MAX_PREVIEW_ROWS)")]
    pub rows: Option<i64>,

    /// Sampling method (default: "random")
    #[schemars(description = "\"head\" for the first rows, \"random\" for a seeded sample (default)")]
    pub method: Option<String>,

    /// Seed for random sampling (default: 42)
    #[schemars(description = "Seed for random sampling (0..=2147483647, default 42)")]
    pub seed: Option<i64>,

    #[serde(flatten)]
    #[schemars(skip)]
    pub unknown: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TablePreviewOptions {
    pub table_id: String,
    pub preview: PreviewOptions,
}

impl TablePreviewRequest {
    pub fn validate(self) -> ToolResult<TablePreviewOptions> {
        reject_unknown(&self.unknown)?;
        let table_id = required_string("tableId", self.table_id)?;
        let rows = bounded_int("rows", self.rows, DEFAULT_PREVIEW_ROWS, 1, MAX_REQUEST_ROWS)?;
        let method = match self.method.as_deref() {
            None => PreviewMethod::Random,
            Some(raw) => PreviewMethod::parse(raw).ok_or_else(|| {
                invalid_field("method", format!("'{raw}' is not one of ['head', 'random']"))
            })?,
        };
        let seed = bounded_int("seed", self.seed, DEFAULT_SEED, 0, MAX_SEED)?;

        Ok(TablePreviewOptions {
            table_id,
            preview: PreviewOptions {
                rows: rows as usize,
                method,
                seed: seed as u64,
            },
        })
    }
}
