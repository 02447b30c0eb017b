//! Per-format table readers behind a single [`FormatHandler`] seam.

pub mod csv_table;
pub mod jmp_table;

use crate::error::ToolResult;
use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::path::Path;

/// Distinct counts are skipped above these sizes to bound cost.
pub const NUNIQUE_ROW_THRESHOLD: usize = 200_000;
pub const NUNIQUE_COL_THRESHOLD: usize = 2_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TableFormat {
    Csv,
    Jmp,
}

impl TableFormat {
    pub const ALL: [TableFormat; 2] = [TableFormat::Csv, TableFormat::Jmp];

    /// Extension including the leading dot, as used in tool arguments.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Csv => ".csv",
            Self::Jmp => ".jmp",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Jmp => "jmp",
        }
    }

    /// Case-insensitive lookup on a path's extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        Self::ALL.into_iter().find(|format| format.name() == ext)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Numeric,
    Character,
    Boolean,
    Date,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnSchema {
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: ColumnType,
    pub missing_rate: f64,
    #[serde(default, deserialize_with = "deserialize_optional_count")]
    pub n_unique: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaLimits {
    #[serde(deserialize_with = "deserialize_flag")]
    pub n_unique_may_be_null: bool,
}

impl SchemaLimits {
    /// Used when a reader cannot say whether distinct counts were computed.
    pub fn unknown() -> Self {
        Self {
            n_unique_may_be_null: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaOutput {
    #[serde(deserialize_with = "deserialize_count")]
    pub rows: u64,
    #[serde(deserialize_with = "deserialize_count")]
    pub cols: u64,
    pub columns: Vec<ColumnSchema>,
    #[serde(default = "SchemaLimits::unknown")]
    pub limits: SchemaLimits,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PreviewMethod {
    Head,
    Random,
}

impl PreviewMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Head => "head",
            Self::Random => "random",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "head" => Some(Self::Head),
            "random" => Some(Self::Random),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreviewOptions {
    pub rows: usize,
    pub method: PreviewMethod,
    pub seed: u64,
}

pub type RowRecord = Map<String, Value>;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewOutput {
    pub rows_requested: usize,
    pub rows_returned: usize,
    pub data: Vec<RowRecord>,
    pub truncated: bool,
}

/// One implementation per supported format, selected once by [`TableFormat`].
#[async_trait]
pub trait FormatHandler: Send + Sync {
    async fn schema(&self, path: &Path, max_columns: usize) -> ToolResult<SchemaOutput>;

    async fn preview(&self, path: &Path, options: &PreviewOptions) -> ToolResult<PreviewOutput>;
}

// JSL has no boolean type; flags arrive as 0/1.
pub(crate) fn deserialize_flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::Bool(flag) => Ok(flag),
        Value::Number(n) => Ok(n.as_f64().is_some_and(|v| v != 0.0)),
        other => Err(serde::de::Error::custom(format!(
            "expected a boolean or 0/1 flag, got {other}"
        ))),
    }
}

// Counts may come back as integral floats (`3.0`); anything fractional or negative is rejected.
pub(crate) fn deserialize_count<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    count_from_value(Value::deserialize(deserializer)?).map_err(serde::de::Error::custom)
}

pub(crate) fn deserialize_optional_count<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<u64>, D::Error> {
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(value) => count_from_value(value)
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}

fn count_from_value(value: Value) -> Result<u64, String> {
    if let Some(n) = value.as_u64() {
        return Ok(n);
    }
    match value.as_f64() {
        Some(f) if f >= 0.0 && f.fract() == 0.0 && f <= u64::MAX as f64 => Ok(f as u64),
        _ => Err(format!("expected a non-negative integer count, got {value}")),
    }
}
