use std::sync::Arc;

use rmcp::{
    ServerHandler,
    ServiceExt,
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{
        CallToolResult,
        Content,
        Implementation,
        ServerCapabilities,
        ServerInfo,
    },
    tool,
    tool_handler,
    tool_router,
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::{
    catalog_db::CatalogDb,
    cli::SearchArgs,
    error,
    search::{self, RankedTemplate},
    settings,
};

#[derive(Clone)]
pub struct PromptdexMcpServer {
    catalog: Arc<CatalogDb>,
    tool_router: ToolRouter<Self>,
}

impl PromptdexMcpServer {
    fn new(catalog: CatalogDb) -> Self {
        Self {
            catalog: Arc::new(catalog),
            tool_router: Self::tool_router(),
        }
    }
}

#[tool_router(router = tool_router)]
impl PromptdexMcpServer {
    /// Fuzzy search over the indexed templates.
    #[tool(
        name = "template_search",
        description = "Search prompt and context templates by keyword. Latin keywords also match Chinese names through pinyin and initials. Supports type, label and repository filters."
    )]
    pub async fn template_search(
        &self,
        params: Parameters<SearchParams>,
    ) -> Result<CallToolResult, rmcp::ErrorData> {
        let params = params.0;
        let query = params.query.clone().unwrap_or_default();

        let args = SearchArgs {
            query: params.query,
            kind: params.kind,
            labels: params.labels.unwrap_or_default(),
            label_all: params.label_match_all.unwrap_or(false),
            repo: params.repo,
            max_results: params
                .limit
                .map(|n| usize::try_from(n).unwrap_or(0)),
            threshold: params.threshold,
            no_pinyin: !params.pinyin.unwrap_or(true),
            weights: Vec::new(),
            json: false,
            ids: false,
        };

        let weights = settings::load_weights(&self.catalog)
            .map_err(|e| mcp_error("failed to load weights", e))?;
        let limit = settings::max_results(&self.catalog)
            .map_err(|e| mcp_error("failed to load settings", e))?;

        let results =
            search::execute_search(&args, self.catalog.as_ref(), weights, limit)
                .map_err(|e| match e {
                    error::Error::Config(message) => {
                        rmcp::ErrorData::invalid_params(message, None)
                    }
                    e => mcp_error("search failed", e),
                })?;

        let summary = format_search_summary(&results, &query);
        let structured = serde_json::to_value(SearchResponse {
            query,
            result_count: results.len(),
            results,
        })
        .map_err(|e| mcp_error("failed to serialize search results", e))?;

        let mut result = CallToolResult::success(vec![Content::text(summary)]);
        result.structured_content = Some(structured);
        Ok(result)
    }
}

#[tool_handler(router = self.tool_router)]
impl ServerHandler for PromptdexMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo::new(ServerCapabilities::builder().enable_tools().build())
            .with_server_info(
                Implementation::new("promptdex", env!("CARGO_PKG_VERSION"))
                    .with_title("promptdex MCP"),
            )
            .with_instructions(
                "Use template_search to find prompt or context templates. An empty query lists templates in catalog order.",
            )
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SearchParams {
    /// Search keyword. Omit to list templates.
    pub query: Option<String>,
    /// Maximum number of results (default: the stored max results, 20).
    /// Zero or negative returns no results.
    pub limit: Option<i64>,
    /// Minimum raw field score.
    pub threshold: Option<f64>,
    /// Restrict to "prompt" or "context" templates.
    pub kind: Option<String>,
    /// Restrict to templates carrying these labels.
    pub labels: Option<Vec<String>>,
    /// Require all labels instead of any.
    pub label_match_all: Option<bool>,
    /// Restrict to one repository.
    pub repo: Option<String>,
    /// Match Chinese text through pinyin (default: true).
    pub pinyin: Option<bool>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SearchResponse {
    query: String,
    result_count: usize,
    results: Vec<RankedTemplate>,
}

fn format_search_summary(results: &[RankedTemplate], query: &str) -> String {
    if results.is_empty() {
        return format!("No templates found for \"{query}\"");
    }

    let mut lines = Vec::with_capacity(results.len() + 1);
    let suffix = if results.len() == 1 { "" } else { "s" };
    lines.push(format!(
        "Found {} template{} for \"{query}\":",
        results.len(),
        suffix
    ));

    for item in results {
        lines.push(format!("{:.1} {} {}", item.score, item.key(), item.name));
    }

    lines.join("\n")
}

fn mcp_error(message: &str, error: impl std::fmt::Display) -> rmcp::ErrorData {
    rmcp::ErrorData::internal_error(
        message.to_string(),
        Some(json!({ "error": error.to_string() })),
    )
}

pub fn run_mcp(catalog: CatalogDb) -> error::Result<()> {
    let server = PromptdexMcpServer::new(catalog);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| {
            error::Error::Config(format!("failed to start tokio runtime: {e}"))
        })?;

    runtime.block_on(async move {
        let transport = rmcp::transport::stdio();
        let running = server.serve(transport).await.map_err(|e| {
            error::Error::Config(format!(
                "MCP server initialization failed: {e}"
            ))
        })?;
        running.waiting().await.map_err(|e| {
            error::Error::Config(format!("MCP server error: {e}"))
        })?;
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{DocumentKind, IndexedDocument};

    fn server_with_templates() -> (tempfile::TempDir, PromptdexMcpServer) {
        let tmp = tempfile::tempdir().unwrap();
        let catalog =
            CatalogDb::open(&tmp.path().join("catalog.redb")).unwrap();
        catalog.set_repository("team", "/srv/team").unwrap();
        catalog
            .replace_documents(
                "team",
                &[
                    IndexedDocument {
                        id: "x".to_string(),
                        kind: DocumentKind::Prompt,
                        name: "前端评审".to_string(),
                        tags: vec!["review".to_string()],
                        summary: String::new(),
                        source_group: "team".to_string(),
                    },
                    IndexedDocument {
                        id: "api".to_string(),
                        kind: DocumentKind::Context,
                        name: "Backend API".to_string(),
                        tags: Vec::new(),
                        summary: "RESTful design".to_string(),
                        source_group: "team".to_string(),
                    },
                ],
            )
            .unwrap();
        (tmp, PromptdexMcpServer::new(catalog))
    }

    #[tokio::test]
    async fn search_tool_returns_structured_results() {
        let (_tmp, server) = server_with_templates();

        let params = SearchParams {
            query: Some("qianduan".to_string()),
            ..Default::default()
        };
        let result = server.template_search(Parameters(params)).await.unwrap();

        let structured = result.structured_content.expect("structured");
        let results = structured
            .get("results")
            .and_then(|v| v.as_array())
            .expect("results array");

        assert_eq!(results.len(), 1);
        let first = &results[0];
        assert_eq!(first.get("id").and_then(|v| v.as_str()), Some("x"));
        assert_eq!(
            first.get("sourceGroup").and_then(|v| v.as_str()),
            Some("team")
        );
        assert_eq!(
            first
                .get("matchedFields")
                .and_then(|v| v.as_array())
                .map(|a| a.len()),
            Some(1)
        );

        let summary = result
            .content
            .first()
            .and_then(|c| c.as_text())
            .map(|t| t.text.clone())
            .unwrap_or_default();
        assert!(summary.contains("Found 1 template"));
    }

    #[tokio::test]
    async fn search_tool_respects_pinyin_flag_and_filters() {
        let (_tmp, server) = server_with_templates();

        let params = SearchParams {
            query: Some("qianduan".to_string()),
            pinyin: Some(false),
            ..Default::default()
        };
        let result = server.template_search(Parameters(params)).await.unwrap();
        assert_eq!(
            result.structured_content.unwrap()["resultCount"],
            json!(0)
        );

        let params = SearchParams {
            kind: Some("context".to_string()),
            ..Default::default()
        };
        let result = server.template_search(Parameters(params)).await.unwrap();
        let structured = result.structured_content.unwrap();
        assert_eq!(structured["resultCount"], json!(1));
        assert_eq!(structured["results"][0]["id"], json!("api"));

        for limit in [0, -1] {
            let params = SearchParams {
                query: Some("api".to_string()),
                limit: Some(limit),
                ..Default::default()
            };
            let result =
                server.template_search(Parameters(params)).await.unwrap();
            assert_eq!(
                result.structured_content.unwrap()["resultCount"],
                json!(0)
            );
        }
    }

    #[test]
    fn negative_limit_deserializes() {
        let params: SearchParams =
            serde_json::from_value(json!({ "query": "api", "limit": -1 }))
                .unwrap();
        assert_eq!(params.limit, Some(-1));
    }

    #[tokio::test]
    async fn unknown_kind_is_invalid_params() {
        let (_tmp, server) = server_with_templates();

        let params = SearchParams {
            kind: Some("snippet".to_string()),
            ..Default::default()
        };
        let err = server
            .template_search(Parameters(params))
            .await
            .unwrap_err();
        assert_eq!(err.code, rmcp::model::ErrorCode::INVALID_PARAMS);
    }

    #[test]
    fn summary_for_no_results() {
        assert_eq!(
            format_search_summary(&[], "zzz"),
            "No templates found for \"zzz\""
        );
    }
}
