//! Table operations behind the three tools.
//!
//! Every path that reaches the filesystem is resolved through the sandbox first; table ids are
//! decoded, then resolved like any other caller-supplied path.

use crate::config::ServerConfig;
use crate::error::{ToolError, ToolResult};
use crate::reader::csv_table::CsvHandler;
use crate::reader::jmp_table::JmpHandler;
use crate::reader::{
    FormatHandler, PreviewMethod, PreviewOptions, PreviewOutput, SchemaOutput, TableFormat,
};
use crate::table_id;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableEntry {
    pub table_id: String,
    pub name: String,
    pub format: String,
    pub path: String,
    pub size_bytes: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TablesListResult {
    pub tables: Vec<TableEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableSchemaResult {
    pub table_id: String,
    pub name: String,
    #[serde(flatten)]
    pub schema: SchemaOutput,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TablePreviewResult {
    pub table_id: String,
    pub name: String,
    pub method: PreviewMethod,
    pub seed: u64,
    #[serde(flatten)]
    pub preview: PreviewOutput,
}

pub struct TableOperations {
    config: Arc<ServerConfig>,
    csv: CsvHandler,
    jmp: JmpHandler,
}

impl TableOperations {
    pub fn new(config: Arc<ServerConfig>) -> Self {
        let jmp = JmpHandler::new(Arc::new(config.jmp.clone()));
        Self {
            config,
            csv: CsvHandler,
            jmp,
        }
    }

    fn handler(&self, format: TableFormat) -> &dyn FormatHandler {
        match format {
            TableFormat::Csv => &self.csv,
            TableFormat::Jmp => &self.jmp,
        }
    }

    /// Direct-child table files of `path` whose format is in `formats`, sorted by file name.
    pub async fn list(&self, path: &str, formats: &[TableFormat]) -> ToolResult<TablesListResult> {
        let dir = self.config.roots.resolve(path)?;
        let is_dir = tokio::fs::metadata(&dir)
            .await
            .map(|meta| meta.is_dir())
            .unwrap_or(false);
        if !is_dir {
            return Err(ToolError::not_found("Path is not a directory")
                .with_detail("path", dir.display().to_string()));
        }

        let list_failed = |err: std::io::Error| {
            ToolError::read_failed("Failed to list directory")
                .with_detail("path", dir.display().to_string())
                .with_detail("hint", err.to_string())
        };

        let mut entries = tokio::fs::read_dir(&dir).await.map_err(list_failed)?;
        let mut found: Vec<(String, TableEntry)> = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(list_failed)? {
            // Symlinks are skipped so listing never follows a link out of the root.
            let is_file = match entry.file_type().await {
                Ok(kind) => kind.is_file(),
                Err(_) => false,
            };
            if !is_file {
                continue;
            }
            let file_path = entry.path();
            let Some(format) = TableFormat::from_path(&file_path) else {
                continue;
            };
            if !formats.contains(&format) {
                continue;
            }
            let size_bytes = match entry.metadata().await {
                Ok(meta) => meta.len(),
                Err(err) => {
                    log::debug!("skipping {}: {err}", file_path.display());
                    continue;
                }
            };
            let file_name = entry.file_name().to_string_lossy().into_owned();
            found.push((
                file_name,
                TableEntry {
                    table_id: table_id::encode(&file_path),
                    name: stem_of(&file_path),
                    format: format.name().to_string(),
                    path: file_path.display().to_string(),
                    size_bytes,
                },
            ));
        }
        found.sort_by(|a, b| a.0.cmp(&b.0));

        Ok(TablesListResult {
            tables: found.into_iter().map(|(_, entry)| entry).collect(),
        })
    }

    pub async fn schema(&self, id: &str, max_columns: usize) -> ToolResult<TableSchemaResult> {
        let path = self.resolve_table(id).await?;
        let format = format_of(&path)?;
        let mut schema = self.handler(format).schema(&path, max_columns).await?;
        schema.columns.truncate(max_columns);
        Ok(TableSchemaResult {
            table_id: table_id::encode(&path),
            name: stem_of(&path),
            schema,
        })
    }

    pub async fn preview(&self, id: &str, options: PreviewOptions) -> ToolResult<TablePreviewResult> {
        let path = self.resolve_table(id).await?;
        let options = PreviewOptions {
            rows: options.rows.min(self.config.max_preview_rows),
            ..options
        };
        let format = format_of(&path)?;
        let preview = self.handler(format).preview(&path, &options).await?;
        Ok(TablePreviewResult {
            table_id: table_id::encode(&path),
            name: stem_of(&path),
            method: options.method,
            seed: options.seed,
            preview,
        })
    }

    async fn resolve_table(&self, id: &str) -> ToolResult<PathBuf> {
        let decoded = table_id::decode(id)?;
        let path = self.config.roots.resolve(&decoded.to_string_lossy())?;
        let is_file = tokio::fs::metadata(&path)
            .await
            .map(|meta| meta.is_file())
            .unwrap_or(false);
        if !is_file {
            return Err(ToolError::not_found("File not found")
                .with_detail("path", path.display().to_string()));
        }
        Ok(path)
    }
}

fn format_of(path: &Path) -> ToolResult<TableFormat> {
    TableFormat::from_path(path).ok_or_else(|| {
        ToolError::invalid_argument("Unsupported file extension")
            .with_detail("path", path.display().to_string())
    })
}

fn stem_of(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}
