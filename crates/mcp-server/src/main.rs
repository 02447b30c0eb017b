//! JMP Readonly MCP Server
//!
//! Lets AI agents inspect tabular data without write access, via MCP over stdio.
//!
//! ## Tools
//!
//! - `tables_list` - List `.csv`/`.jmp` files in a directory under `DATA_ROOTS`
//! - `table_schema` - Row/column counts and per-column type, missing rate and distinct count
//! - `table_preview` - First rows or a seeded random sample
//!
//! ## Usage
//!
//! Add to your MCP client configuration:
//! ```json
//! {
//!   "mcpServers": {
//!     "jmp-readonly": {
//!       "command": "jmp-readonly-mcp",
//!       "env": {
//!         "DATA_ROOTS": "/data/projects;/data/shared",
//!         "JMP_EXE_PATH": "/opt/jmp/jmp"
//!       }
//!     }
//!   }
//! }
//! ```

use anyhow::Result;
use jmp_readonly_mcp::{JmpReadonlyService, ServerConfig};
use rmcp::transport::stdio;
use rmcp::ServiceExt;

#[tokio::main]
async fn main() -> Result<()> {
    // Configure logging to stderr only (stdout is for MCP protocol)
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .target(env_logger::Target::Stderr)
        .init();

    let config = ServerConfig::from_env();
    if config.roots.is_empty() {
        log::warn!("DATA_ROOTS is empty; every table request will be rejected");
    }
    for root in config.roots.iter() {
        log::info!("Data root: {}", root.display());
    }
    match config.jmp.exe_path.as_deref() {
        Some(exe) => log::info!("JMP executable: {}", exe.display()),
        None => log::info!("JMP_EXE_PATH not set; .jmp tables are unavailable"),
    }

    log::info!("Starting JMP readonly MCP server");

    let service = JmpReadonlyService::new(config);
    let server = service.serve(stdio()).await?;

    // Wait for shutdown
    server.waiting().await?;

    log::info!("JMP readonly MCP server stopped");
    Ok(())
}
