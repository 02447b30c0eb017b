use super::{invalid_field, reject_unknown, required_string};
use crate::error::ToolResult;
use crate::reader::TableFormat;
use rmcp::schemars;
use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Default, Deserialize, schemars::JsonSchema)]
pub struct TablesListRequest {
    /// Directory to list (absolute, or relative to the server's working directory)
    #[schemars(required)]
    #[schemars(description = "Directory to list; must be inside one of the configured DATA_ROOTS")]
    pub path: Option<String>,

    /// Extensions to include (default: both)
    #[schemars(description = "Table file extensions to include: \".csv\" and/or \".jmp\" (default: both)")]
    pub extensions: Option<Vec<String>>,

    #[serde(flatten)]
    #[schemars(skip)]
    pub unknown: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TablesListOptions {
    pub path: String,
    pub formats: Vec<TableFormat>,
}

impl TablesListRequest {
    pub fn validate(self) -> ToolResult<TablesListOptions> {
        reject_unknown(&self.unknown)?;
        let path = required_string("path", self.path)?;

        let formats = match self.extensions {
            None => TableFormat::ALL.to_vec(),
            Some(extensions) => {
                let mut formats = Vec::new();
                for (idx, extension) in extensions.iter().enumerate() {
                    let format = TableFormat::ALL
                        .into_iter()
                        .find(|format| format.extension() == extension)
                        .ok_or_else(|| {
                            invalid_field(
                                &format!("extensions/{idx}"),
                                format!("'{extension}' is not one of ['.csv', '.jmp']"),
                            )
                        })?;
                    if !formats.contains(&format) {
                        formats.push(format);
                    }
                }
                formats
            }
        };

        Ok(TablesListOptions { path, formats })
    }
}
