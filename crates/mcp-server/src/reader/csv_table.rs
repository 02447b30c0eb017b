//! Native CSV reader.
//!
//! The whole file is loaded into memory, then profiled per column. Reads run on the blocking
//! pool so a large file never stalls the async runtime.

use super::{
    ColumnSchema, ColumnType, FormatHandler, PreviewMethod, PreviewOptions, PreviewOutput,
    RowRecord, SchemaLimits, SchemaOutput, NUNIQUE_COL_THRESHOLD, NUNIQUE_ROW_THRESHOLD,
};
use crate::error::{ToolError, ToolResult};
use anyhow::{Context as AnyhowContext, Result};
use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde_json::{Number, Value};
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

/// Cell values treated as missing, in addition to the empty cell.
const NA_TOKENS: &[&str] = &[
    "", "NA", "N/A", "n/a", "NaN", "nan", "-NaN", "-nan", "null", "NULL", "None", "<NA>", "#N/A",
    "#NA",
];
const TRUE_TOKENS: &[&str] = &["True", "TRUE", "true"];
const FALSE_TOKENS: &[&str] = &["False", "FALSE", "false"];

#[derive(Debug, Clone, PartialEq)]
pub struct CsvTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl CsvTable {
    pub fn read(path: &Path) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("open {}", path.display()))?;
        Self::from_reader(BufReader::new(file))
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut reader = ::csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);
        let headers = reader.headers().context("read CSV header")?.clone();
        if headers.is_empty() {
            anyhow::bail!("No columns to parse from file");
        }
        let columns = dedupe_headers(headers.iter());
        let width = columns.len();

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record.context("read CSV record")?;
            if record.len() > width {
                let line = record.position().map(|p| p.line()).unwrap_or_default();
                anyhow::bail!(
                    "Expected {width} fields in line {line}, saw {}",
                    record.len()
                );
            }
            let mut row: Vec<String> = record.iter().map(str::to_string).collect();
            // Short rows are padded with missing cells.
            row.resize(width, String::new());
            rows.push(row);
        }
        Ok(Self { columns, rows })
    }

    fn column_values(&self, idx: usize) -> impl Iterator<Item = &str> {
        self.rows.iter().map(move |row| row[idx].as_str())
    }
}

fn dedupe_headers<'a>(raw: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut out = Vec::new();
    for (idx, name) in raw.enumerate() {
        let base = if name.is_empty() {
            format!("Unnamed: {idx}")
        } else {
            name.to_string()
        };
        let mut candidate = base.clone();
        let mut suffix = 1usize;
        while seen.contains(&candidate) {
            candidate = format!("{base}.{suffix}");
            suffix += 1;
        }
        seen.insert(candidate.clone());
        out.push(candidate);
    }
    out
}

fn is_missing(value: &str) -> bool {
    NA_TOKENS.contains(&value)
}

fn parse_bool(value: &str) -> Option<bool> {
    if TRUE_TOKENS.contains(&value) {
        Some(true)
    } else if FALSE_TOKENS.contains(&value) {
        Some(false)
    } else {
        None
    }
}

fn parse_number(value: &str) -> Option<f64> {
    value.trim().parse::<f64>().ok()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnKind {
    Boolean,
    Numeric { integral: bool },
    Character,
}

impl ColumnKind {
    fn column_type(self) -> ColumnType {
        match self {
            Self::Boolean => ColumnType::Boolean,
            Self::Numeric { .. } => ColumnType::Numeric,
            Self::Character => ColumnType::Character,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct ColumnProfile {
    kind: ColumnKind,
    missing: usize,
}

fn profile_column<'a>(values: impl Iterator<Item = &'a str>) -> ColumnProfile {
    let mut missing = 0usize;
    let mut present = 0usize;
    let mut all_bool = true;
    let mut all_numeric = true;
    let mut all_integral = true;

    for value in values {
        if is_missing(value) {
            missing += 1;
            continue;
        }
        present += 1;
        if all_bool && parse_bool(value).is_none() {
            all_bool = false;
        }
        if all_numeric {
            if parse_number(value).is_none() {
                all_numeric = false;
            } else if all_integral && value.trim().parse::<i64>().is_err() {
                all_integral = false;
            }
        }
    }

    // A missing cell forces booleans to text and integers to floats.
    let kind = if present > 0 && all_bool && missing == 0 {
        ColumnKind::Boolean
    } else if all_numeric {
        ColumnKind::Numeric {
            integral: present > 0 && all_integral && missing == 0,
        }
    } else {
        ColumnKind::Character
    };
    ColumnProfile { kind, missing }
}

fn cell_value(kind: ColumnKind, raw: &str) -> Value {
    if is_missing(raw) {
        return Value::Null;
    }
    match kind {
        ColumnKind::Boolean => parse_bool(raw).map(Value::Bool).unwrap_or(Value::Null),
        ColumnKind::Numeric { integral: true } => raw
            .trim()
            .parse::<i64>()
            .map(Value::from)
            .unwrap_or(Value::Null),
        ColumnKind::Numeric { integral: false } => parse_number(raw)
            .and_then(Number::from_f64)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        ColumnKind::Character => Value::String(raw.to_string()),
    }
}

fn unique_key(kind: ColumnKind, raw: &str) -> String {
    match kind {
        // `+ 0.0` folds -0.0 into 0.0.
        ColumnKind::Numeric { .. } => parse_number(raw)
            .map(|n| (n + 0.0).to_bits().to_string())
            .unwrap_or_else(|| raw.to_string()),
        ColumnKind::Boolean => parse_bool(raw)
            .map(|b| b.to_string())
            .unwrap_or_else(|| raw.to_string()),
        ColumnKind::Character => raw.to_string(),
    }
}

pub fn schema_of(table: &CsvTable, max_columns: usize) -> SchemaOutput {
    let rows = table.rows.len();
    let cols = table.columns.len();
    let compute_unique = !(rows > NUNIQUE_ROW_THRESHOLD || cols > NUNIQUE_COL_THRESHOLD);

    let columns = table
        .columns
        .iter()
        .enumerate()
        .take(max_columns)
        .map(|(idx, name)| {
            let profile = profile_column(table.column_values(idx));
            let missing_rate = if rows == 0 {
                0.0
            } else {
                profile.missing as f64 / rows as f64
            };
            let n_unique = compute_unique.then(|| {
                table
                    .column_values(idx)
                    .filter(|v| !is_missing(v))
                    .map(|v| unique_key(profile.kind, v))
                    .collect::<HashSet<_>>()
                    .len() as u64
            });
            ColumnSchema {
                name: name.clone(),
                column_type: profile.kind.column_type(),
                missing_rate,
                n_unique,
            }
        })
        .collect();

    SchemaOutput {
        rows: rows as u64,
        cols: cols as u64,
        columns,
        limits: SchemaLimits {
            n_unique_may_be_null: !compute_unique,
        },
    }
}

pub fn preview_of(table: &CsvTable, options: &PreviewOptions) -> PreviewOutput {
    let total = table.rows.len();
    let take = options.rows.min(total);

    let picks: Vec<usize> = match options.method {
        PreviewMethod::Head => (0..take).collect(),
        PreviewMethod::Random if take == 0 => Vec::new(),
        PreviewMethod::Random => {
            let mut rng = StdRng::seed_from_u64(options.seed);
            rand::seq::index::sample(&mut rng, total, take).into_vec()
        }
    };

    let kinds: Vec<ColumnKind> = (0..table.columns.len())
        .map(|idx| profile_column(table.column_values(idx)).kind)
        .collect();

    let data: Vec<RowRecord> = picks
        .into_iter()
        .map(|row_idx| {
            let row = &table.rows[row_idx];
            table
                .columns
                .iter()
                .zip(kinds.iter())
                .zip(row.iter())
                .map(|((name, kind), raw)| (name.clone(), cell_value(*kind, raw)))
                .collect()
        })
        .collect();

    PreviewOutput {
        rows_requested: options.rows,
        rows_returned: data.len(),
        data,
        truncated: options.rows > total,
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct CsvHandler;

impl CsvHandler {
    async fn with_table<T, F>(path: &Path, purpose: &'static str, compute: F) -> ToolResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&CsvTable) -> T + Send + 'static,
    {
        let owned: PathBuf = path.to_path_buf();
        let joined =
            tokio::task::spawn_blocking(move || CsvTable::read(&owned).map(|t| compute(&t)))
                .await
                .map_err(|err| {
                    ToolError::internal("CSV reader task failed")
                        .with_detail("hint", err.to_string())
                })?;
        joined.map_err(|err| {
            ToolError::read_failed(format!("Failed to read CSV for {purpose}"))
                .with_detail("path", path.display().to_string())
                .with_detail("hint", format!("{err:#}"))
        })
    }
}

#[async_trait]
impl FormatHandler for CsvHandler {
    async fn schema(&self, path: &Path, max_columns: usize) -> ToolResult<SchemaOutput> {
        Self::with_table(path, "schema", move |table| schema_of(table, max_columns)).await
    }

    async fn preview(&self, path: &Path, options: &PreviewOptions) -> ToolResult<PreviewOutput> {
        let options = *options;
        Self::with_table(path, "preview", move |table| preview_of(table, &options)).await
    }
}
