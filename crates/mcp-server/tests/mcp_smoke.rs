use anyhow::{Context, Result};
use serde_json::json;
use std::collections::HashSet;
use std::time::Duration;

mod support;

#[tokio::test]
async fn mcp_exposes_table_tools() -> Result<()> {
    let tmp = tempfile::tempdir().context("tempdir")?;
    let client = support::start_server(&[("DATA_ROOTS", tmp.path().display().to_string())]).await?;

    let tools = tokio::time::timeout(Duration::from_secs(10), client.list_tools(Default::default()))
        .await
        .context("timeout listing tools")??;
    let names: HashSet<&str> = tools.tools.iter().map(|t| t.name.as_ref()).collect();
    assert_eq!(
        names,
        HashSet::from(["tables_list", "table_schema", "table_preview"])
    );

    client.cancel().await.context("shutdown mcp service")?;
    Ok(())
}

#[tokio::test]
async fn tables_list_filters_by_extension() -> Result<()> {
    let tmp = tempfile::tempdir().context("tempdir")?;
    let root = tmp.path().canonicalize().context("canonical root")?;
    std::fs::write(root.join("a.csv"), "x,y\n1,2\n").context("write a.csv")?;
    std::fs::write(root.join("b.jmp"), b"jmp").context("write b.jmp")?;

    let client = support::start_server(&[("DATA_ROOTS", root.display().to_string())]).await?;

    let only_csv = support::call_ok(
        &client,
        "tables_list",
        json!({ "path": root.to_string_lossy(), "extensions": [".csv"] }),
    )
    .await?;
    let tables = only_csv["tables"].as_array().context("tables array")?;
    assert_eq!(tables.len(), 1);
    assert_eq!(tables[0]["name"], json!("a"));
    assert_eq!(tables[0]["format"], json!("csv"));
    assert_eq!(
        tables[0]["tableId"],
        json!(format!("file:{}", root.join("a.csv").display()))
    );
    assert_eq!(tables[0]["sizeBytes"], json!(8));

    let everything =
        support::call_ok(&client, "tables_list", json!({ "path": root.to_string_lossy() })).await?;
    let names: Vec<&str> = everything["tables"]
        .as_array()
        .context("tables array")?
        .iter()
        .filter_map(|t| t["name"].as_str())
        .collect();
    assert_eq!(names, vec!["a", "b"]);

    client.cancel().await.context("shutdown mcp service")?;
    Ok(())
}

#[tokio::test]
async fn invalid_requests_return_error_envelopes() -> Result<()> {
    let tmp = tempfile::tempdir().context("tempdir")?;
    let root = tmp.path().canonicalize().context("canonical root")?;
    let client = support::start_server(&[("DATA_ROOTS", root.display().to_string())]).await?;

    let err = support::call_err(&client, "tables_list", json!({ "extensions": [".csv"] })).await?;
    assert_eq!(err["code"], json!("INVALID_ARGUMENT"));
    assert_eq!(err["details"]["path"], json!("path"));

    let err = support::call_err(
        &client,
        "table_preview",
        json!({ "tableId": "file:/x.csv", "color": "blue" }),
    )
    .await?;
    assert_eq!(err["code"], json!("INVALID_ARGUMENT"));
    assert_eq!(err["details"]["path"], json!("color"));

    let err = support::call_err(&client, "table_schema", json!({ "tableId": "a.csv" })).await?;
    assert_eq!(err["message"], json!("tableId must start with file:"));

    let missing = root.join("missing.csv");
    let err = support::call_err(
        &client,
        "table_schema",
        json!({ "tableId": format!("file:{}", missing.display()) }),
    )
    .await?;
    assert_eq!(err["code"], json!("NOT_FOUND"));
    assert_eq!(err["details"]["path"], json!(missing.display().to_string()));

    let outside = tempfile::tempdir().context("tempdir")?;
    let err = support::call_err(
        &client,
        "tables_list",
        json!({ "path": outside.path().to_string_lossy() }),
    )
    .await?;
    assert_eq!(err["code"], json!("SECURITY_VIOLATION"));
    assert_eq!(err["message"], json!("Path is outside allowed DATA_ROOTS"));

    client.cancel().await.context("shutdown mcp service")?;
    Ok(())
}

#[tokio::test]
async fn missing_data_roots_rejects_everything() -> Result<()> {
    let tmp = tempfile::tempdir().context("tempdir")?;
    let client = support::start_server(&[]).await?;

    let err = support::call_err(
        &client,
        "tables_list",
        json!({ "path": tmp.path().to_string_lossy() }),
    )
    .await?;
    assert_eq!(err["code"], json!("SECURITY_VIOLATION"));
    assert_eq!(err["message"], json!("DATA_ROOTS is not configured"));

    client.cancel().await.context("shutdown mcp service")?;
    Ok(())
}
