use std::path::{Path, PathBuf};

use promptdex::{
    CatalogDb,
    DocumentKind,
    IndexedDocument,
    catalog_db::CATALOG_FILE,
};
use rmcp::{
    ServiceExt,
    model::CallToolRequestParams,
    transport::{ConfigureCommandExt, TokioChildProcess},
};
use serde_json::json;

fn template(id: &str, kind: DocumentKind, name: &str) -> IndexedDocument {
    IndexedDocument {
        id: id.to_string(),
        kind,
        name: name.to_string(),
        tags: Vec::new(),
        summary: String::new(),
        source_group: "team".to_string(),
    }
}

fn setup_fixture(data_dir: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let catalog = CatalogDb::open(&data_dir.join(CATALOG_FILE))?;
    catalog.set_repository("team", "/srv/team")?;

    let mut review = template("fe-review", DocumentKind::Prompt, "前端评审");
    review.tags = vec!["frontend".to_string(), "review".to_string()];
    let mut api = template("api", DocumentKind::Context, "Backend API");
    api.summary = "RESTful interface conventions".to_string();

    catalog.replace_documents("team", &[review, api])?;
    Ok(())
}

async fn call_search(
    client: &rmcp::service::RunningService<rmcp::RoleClient, ()>,
    args: serde_json::Value,
) -> Result<serde_json::Value, Box<dyn std::error::Error>> {
    let result = client
        .peer()
        .call_tool(
            CallToolRequestParams::new("template_search")
                .with_arguments(args.as_object().cloned().unwrap_or_default()),
        )
        .await?;
    Ok(result.structured_content.expect("structured content"))
}

#[tokio::test]
async fn mcp_stdio_search_roundtrip() -> Result<(), Box<dyn std::error::Error>>
{
    let tempdir = tempfile::tempdir()?;
    setup_fixture(tempdir.path())?;

    let bin = promptdex_bin()?;
    let transport = TokioChildProcess::new(
        tokio::process::Command::new(bin).configure(|cmd| {
            cmd.arg("mcp")
                .arg("--quiet")
                .env("PROMPTDEX_DATA_DIR", tempdir.path());
        }),
    )?;

    let client = ().serve(transport).await?;

    let structured =
        call_search(&client, json!({ "query": "qdps", "limit": 5 })).await?;
    let results = structured
        .get("results")
        .and_then(|v| v.as_array())
        .expect("results array");
    assert_eq!(results.len(), 1);
    assert_eq!(
        results[0].get("id").and_then(|v| v.as_str()),
        Some("fe-review")
    );
    assert_eq!(
        results[0].get("sourceGroup").and_then(|v| v.as_str()),
        Some("team")
    );

    let structured = call_search(&client, json!({})).await?;
    assert_eq!(structured["resultCount"], json!(2));
    assert_eq!(structured["results"][0]["id"], json!("api"));
    assert_eq!(structured["results"][1]["id"], json!("fe-review"));

    let structured =
        call_search(&client, json!({ "labels": ["REVIEW"] })).await?;
    assert_eq!(structured["resultCount"], json!(1));

    let structured =
        call_search(&client, json!({ "query": "api", "limit": -1 })).await?;
    assert_eq!(structured["resultCount"], json!(0));

    client.cancel().await?;
    Ok(())
}

fn promptdex_bin() -> Result<PathBuf, Box<dyn std::error::Error>> {
    if let Ok(bin) = std::env::var("CARGO_BIN_EXE_promptdex") {
        return Ok(PathBuf::from(bin));
    }

    let mut path = std::env::current_exe()?;
    path.pop();
    if path.ends_with("deps") {
        path.pop();
    }
    path.push("promptdex");

    if cfg!(windows) {
        path.set_extension("exe");
    }

    Ok(path)
}
