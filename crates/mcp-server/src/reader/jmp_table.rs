//! `.jmp` tables, read by delegating to the external JMP program.

use super::{
    deserialize_flag, FormatHandler, PreviewOptions, PreviewOutput, RowRecord, SchemaOutput,
};
use crate::config::JmpConfig;
use crate::error::ToolResult;
use crate::runner::{JmpRunner, JobParams};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::path::Path;
use std::sync::Arc;

pub const ACTION_SCHEMA: &str = "schema";
pub const ACTION_PREVIEW: &str = "preview";

#[derive(Debug, Clone)]
pub struct JmpHandler {
    config: Arc<JmpConfig>,
}

impl JmpHandler {
    pub fn new(config: Arc<JmpConfig>) -> Self {
        Self { config }
    }

    async fn run<T: DeserializeOwned>(
        &self,
        action: &str,
        path: &Path,
        params: JobParams,
    ) -> ToolResult<T> {
        JmpRunner::new(&self.config)
            .execute(action, path, &params)
            .await
    }
}

/// Preview as emitted by the job script; counts may be omitted and are filled in locally.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPreview {
    #[serde(default, deserialize_with = "super::deserialize_optional_count")]
    rows_requested: Option<u64>,
    #[serde(default, deserialize_with = "super::deserialize_optional_count")]
    rows_returned: Option<u64>,
    data: Vec<RowRecord>,
    #[serde(default, deserialize_with = "deserialize_optional_flag")]
    truncated: Option<bool>,
}

fn deserialize_optional_flag<'de, D: serde::Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<bool>, D::Error> {
    #[derive(Deserialize)]
    struct Flag(#[serde(deserialize_with = "deserialize_flag")] bool);
    Ok(Option::<Flag>::deserialize(deserializer)?.map(|Flag(flag)| flag))
}

#[async_trait]
impl FormatHandler for JmpHandler {
    async fn schema(&self, path: &Path, max_columns: usize) -> ToolResult<SchemaOutput> {
        let params = params_of(json!({ "maxColumns": max_columns }));
        let mut schema: SchemaOutput = self.run(ACTION_SCHEMA, path, params).await?;
        schema.columns.truncate(max_columns);
        Ok(schema)
    }

    async fn preview(&self, path: &Path, options: &PreviewOptions) -> ToolResult<PreviewOutput> {
        let params = params_of(json!({
            "rows": options.rows,
            "method": options.method.as_str(),
            "seed": options.seed,
        }));
        let raw: RawPreview = self.run(ACTION_PREVIEW, path, params).await?;

        let rows_requested = raw
            .rows_requested
            .map(|n| n as usize)
            .unwrap_or(options.rows);
        let rows_returned = raw
            .rows_returned
            .map(|n| n as usize)
            .unwrap_or(raw.data.len());
        Ok(PreviewOutput {
            rows_requested,
            rows_returned,
            truncated: raw
                .truncated
                .unwrap_or(rows_requested > rows_returned),
            data: raw.data,
        })
    }
}

fn params_of(value: Value) -> JobParams {
    match value {
        Value::Object(map) => map,
        _ => JobParams::new(),
    }
}
