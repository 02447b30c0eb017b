use anyhow::{Context, Result};
use serde_json::{json, Value};

mod support;

const SAMPLE: &str = "col1,col2\n1,a\n2,\n, c\n";

#[tokio::test]
async fn schema_reports_missing_rates_and_types() -> Result<()> {
    let tmp = tempfile::tempdir().context("tempdir")?;
    let root = tmp.path().canonicalize().context("canonical root")?;
    let csv_path = root.join("sample.csv");
    std::fs::write(&csv_path, SAMPLE).context("write sample.csv")?;
    let table_id = format!("file:{}", csv_path.display());

    let client = support::start_server(&[("DATA_ROOTS", root.display().to_string())]).await?;
    let schema =
        support::call_ok(&client, "table_schema", json!({ "tableId": table_id })).await?;

    assert_eq!(schema["tableId"], json!(table_id));
    assert_eq!(schema["name"], json!("sample"));
    assert_eq!(schema["rows"], json!(3));
    assert_eq!(schema["cols"], json!(2));
    let columns = schema["columns"].as_array().context("columns array")?;
    assert_eq!(columns.len(), 2);
    for column in columns {
        let rate = column["missingRate"].as_f64().context("missingRate")?;
        assert!((rate - 1.0 / 3.0).abs() < 1e-9, "unexpected rate {rate}");
    }
    assert_eq!(columns[0]["type"], json!("numeric"));
    assert_eq!(columns[1]["type"], json!("character"));
    assert_eq!(schema["limits"]["nUniqueMayBeNull"], json!(false));

    let narrow = support::call_ok(
        &client,
        "table_schema",
        json!({ "tableId": table_id, "maxColumns": 1 }),
    )
    .await?;
    assert_eq!(narrow["columns"].as_array().map(Vec::len), Some(1));
    assert_eq!(narrow["cols"], json!(2));

    client.cancel().await.context("shutdown mcp service")?;
    Ok(())
}

#[tokio::test]
async fn preview_head_random_and_clamping() -> Result<()> {
    let tmp = tempfile::tempdir().context("tempdir")?;
    let root = tmp.path().canonicalize().context("canonical root")?;
    let rows: String = (0..20).map(|i| format!("{i},name{i}\n")).collect();
    let csv_path = root.join("people.csv");
    std::fs::write(&csv_path, format!("id,name\n{rows}")).context("write people.csv")?;
    let table_id = format!("file:{}", csv_path.display());

    let client = support::start_server(&[
        ("DATA_ROOTS", root.display().to_string()),
        ("MAX_PREVIEW_ROWS", "5".to_string()),
    ])
    .await?;

    let head = support::call_ok(
        &client,
        "table_preview",
        json!({ "tableId": table_id, "rows": 3, "method": "head" }),
    )
    .await?;
    assert_eq!(head["method"], json!("head"));
    assert_eq!(head["seed"], json!(42));
    assert_eq!(head["rowsReturned"], json!(3));
    assert_eq!(head["truncated"], json!(false));
    assert_eq!(
        head["data"],
        json!([
            { "id": 0, "name": "name0" },
            { "id": 1, "name": "name1" },
            { "id": 2, "name": "name2" }
        ])
    );

    let clamped = support::call_ok(
        &client,
        "table_preview",
        json!({ "tableId": table_id, "rows": 500, "method": "head" }),
    )
    .await?;
    assert_eq!(clamped["rowsRequested"], json!(5));
    assert_eq!(clamped["rowsReturned"], json!(5));

    let sample = |seed: u64| {
        json!({ "tableId": table_id, "rows": 4, "method": "random", "seed": seed })
    };
    let first = support::call_ok(&client, "table_preview", sample(7)).await?;
    let again = support::call_ok(&client, "table_preview", sample(7)).await?;
    assert_eq!(first["data"], again["data"]);
    let ids: Vec<&Value> = first["data"]
        .as_array()
        .context("data array")?
        .iter()
        .map(|record| &record["id"])
        .collect();
    assert_eq!(ids.len(), 4);

    client.cancel().await.context("shutdown mcp service")?;
    Ok(())
}

#[tokio::test]
async fn malformed_csv_is_a_read_failure() -> Result<()> {
    let tmp = tempfile::tempdir().context("tempdir")?;
    let root = tmp.path().canonicalize().context("canonical root")?;
    let csv_path = root.join("broken.csv");
    std::fs::write(&csv_path, "a,b\n1,2,3\n").context("write broken.csv")?;

    let client = support::start_server(&[("DATA_ROOTS", root.display().to_string())]).await?;
    let err = support::call_err(
        &client,
        "table_preview",
        json!({ "tableId": format!("file:{}", csv_path.display()) }),
    )
    .await?;
    assert_eq!(err["code"], json!("READ_FAILED"));
    assert_eq!(err["message"], json!("Failed to read CSV for preview"));
    assert_eq!(err["details"]["path"], json!(csv_path.display().to_string()));

    client.cancel().await.context("shutdown mcp service")?;
    Ok(())
}
