//! MCP tool surface: request schemas, table operations and the rmcp dispatch layer.

mod dispatch;
pub mod schemas;
pub mod tables;

pub use dispatch::JmpReadonlyService;
pub use tables::{
    TableEntry, TableOperations, TablePreviewResult, TableSchemaResult, TablesListResult,
};
