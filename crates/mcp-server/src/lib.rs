//! Read-only MCP server for `.csv` and `.jmp` tables.
//!
//! Every path a client sends is confined to the configured data roots. CSV files are read
//! natively; `.jmp` files are handed to an external JMP executable through a generated job
//! script whose JSON output is parsed strictly.

pub mod config;
pub mod error;
pub mod reader;
pub mod runner;
pub mod sandbox;
pub mod table_id;
pub mod tools;

pub use config::ServerConfig;
pub use error::{ToolError, ToolResult};
pub use tools::{JmpReadonlyService, TableOperations};
