#![allow(dead_code)]

use anyhow::{Context, Result};
use rmcp::model::{CallToolRequestParam, CallToolResult};
use rmcp::service::{RunningService, ServiceExt};
use rmcp::transport::TokioChildProcess;
use rmcp::RoleClient;
use serde_json::Value;
use std::path::PathBuf;
use std::time::Duration;
use tokio::process::Command;

pub fn locate_jmp_readonly_mcp_bin() -> Result<PathBuf> {
    if let Some(path) = option_env!("CARGO_BIN_EXE_jmp-readonly-mcp") {
        return Ok(PathBuf::from(path));
    }

    // `.../target/{debug|release}/deps/<test>` → `.../target/{debug|release}/jmp-readonly-mcp`
    if let Ok(exe) = std::env::current_exe() {
        if let Some(target_profile_dir) = exe.parent().and_then(|p| p.parent()) {
            let candidate = target_profile_dir.join("jmp-readonly-mcp");
            if candidate.exists() {
                return Ok(candidate);
            }
        }
    }

    let manifest_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    let repo_root = manifest_dir
        .ancestors()
        .nth(2)
        .context("failed to resolve repo root from CARGO_MANIFEST_DIR")?;
    for rel in ["target/debug/jmp-readonly-mcp", "target/release/jmp-readonly-mcp"] {
        let candidate = repo_root.join(rel);
        if candidate.exists() {
            return Ok(candidate);
        }
    }

    anyhow::bail!(
        "failed to locate jmp-readonly-mcp binary; build with: cargo build -p jmp-readonly-mcp"
    )
}

pub type Client = RunningService<RoleClient, ()>;

/// Spawn the server with a clean environment plus `env`.
pub async fn start_server(env: &[(&str, String)]) -> Result<Client> {
    let bin = locate_jmp_readonly_mcp_bin()?;
    let mut cmd = Command::new(bin);
    for key in [
        "DATA_ROOTS",
        "JMP_EXE_PATH",
        "JMP_TIMEOUT_SEC",
        "TEMP_ROOT",
        "MAX_PREVIEW_ROWS",
        "JMP_TEMPLATE_PATH",
        "JMP_RUN_RETENTION",
    ] {
        cmd.env_remove(key);
    }
    cmd.env("RUST_LOG", "warn");
    for (key, value) in env {
        cmd.env(key, value);
    }

    let transport = TokioChildProcess::new(cmd).context("spawn mcp server")?;
    tokio::time::timeout(Duration::from_secs(10), ().serve(transport))
        .await
        .context("timeout starting MCP server")?
        .context("initialize MCP session")
}

pub async fn call_tool(client: &Client, name: &str, args: Value) -> Result<CallToolResult> {
    tokio::time::timeout(
        Duration::from_secs(20),
        client.call_tool(CallToolRequestParam {
            name: name.to_string().into(),
            arguments: args.as_object().cloned(),
        }),
    )
    .await
    .context("timeout calling tool")?
    .context("call tool")
}

/// Parse the single JSON text block every response carries.
pub fn payload(result: &CallToolResult) -> Result<Value> {
    let text = result
        .content
        .first()
        .and_then(|c| c.as_text())
        .map(|t| t.text.as_str())
        .context("tool result missing text output")?;
    serde_json::from_str(text).context("tool text output is not JSON")
}

pub async fn call_ok(client: &Client, name: &str, args: Value) -> Result<Value> {
    let result = call_tool(client, name, args).await?;
    let value = payload(&result)?;
    assert_ne!(result.is_error, Some(true), "{name} returned error: {value}");
    Ok(value)
}

/// Call a tool that must fail and return its `error` envelope.
pub async fn call_err(client: &Client, name: &str, args: Value) -> Result<Value> {
    let result = call_tool(client, name, args).await?;
    let value = payload(&result)?;
    assert_eq!(result.is_error, Some(true), "{name} unexpectedly succeeded: {value}");
    value
        .get("error")
        .cloned()
        .context("error response missing `error` object")
}
