use crate::core::{self, Plan, Sequencer};
use crate::error::{Result as SeqResult, SeqError};
use rmcp::{
    ErrorData as McpError, ServerHandler, ServiceExt, handler::server::tool::ToolRouter,
    handler::server::wrapper::Parameters, model::*, schemars, tool, tool_handler, tool_router,
    transport::stdio,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::path::PathBuf;
use tracing::info;

/// Knowledge-graph sequencer MCP server
#[derive(Clone)]
pub struct SequencerMcp {
    db_path: PathBuf,
    tool_router: ToolRouter<Self>,
}

// Input types for tools
#[derive(Debug, Serialize, Deserialize, schemars::JsonSchema)]
pub struct RecordsInput {
    /// Newline-delimited JSON records; `"type": "edge"` marks an edge
    pub records: String,
}

// Response type
#[derive(Debug, Serialize)]
pub struct McpResponse<T: Serialize> {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T: Serialize> McpResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            status: "ok",
            data: Some(data),
            error_code: None,
            message: None,
        }
    }

    pub fn error(error_code: &str, message: &str) -> Self {
        Self {
            status: "error",
            data: None,
            error_code: Some(error_code.to_string()),
            message: Some(message.to_string()),
        }
    }
}

fn to_json<T: Serialize>(response: McpResponse<T>) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string(&response)
        .map_err(|e| McpError::internal_error(e.to_string(), None))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}

fn error_code(e: &SeqError) -> &'static str {
    match e {
        SeqError::NotInitialized => "NotInitialized",
        SeqError::InvalidFormat(_) => "InvalidFormat",
        SeqError::StrictCheckFailed { .. } => "StrictCheckFailed",
        SeqError::CorruptSnapshot { .. } => "CorruptSnapshot",
        SeqError::Db(_) => "Db",
        SeqError::Io(_) => "Io",
        SeqError::Json(_) => "Json",
        SeqError::Mcp(_) => "Mcp",
    }
}

fn error_to_response(e: SeqError) -> McpResponse<serde_json::Value> {
    McpResponse::error(error_code(&e), &e.to_string())
}

fn order_view(plan: &Plan) -> serde_json::Value {
    json!({
        "has_cycle": plan.has_cycle,
        "cycle": plan.cycle,
        "order": plan.order,
        "unresolved": plan.unresolved,
    })
}

fn sequence_view(plan: &Plan) -> serde_json::Value {
    json!({
        "has_cycle": plan.has_cycle,
        "instructions": plan.instructions,
    })
}

fn check_view(plan: &Plan) -> serde_json::Value {
    json!({
        "has_cycle": plan.has_cycle,
        "cycle": plan.cycle,
        "issues": plan.issues,
        "stats": plan.stats,
    })
}

#[tool_router]
impl SequencerMcp {
    pub fn new(db_path: impl Into<PathBuf>) -> Self {
        Self {
            db_path: db_path.into(),
            tool_router: Self::tool_router(),
        }
    }

    fn stored_plan(&self) -> SeqResult<Plan> {
        Sequencer::open_existing(&self.db_path)?.load_plan()
    }

    #[tool(
        description = "Order every node of the given records so that each discovery comes after the ones it depends on. Cyclic input still yields a complete order; has_cycle reports whether a cycle was found."
    )]
    async fn linearize_records(
        &self,
        params: Parameters<RecordsInput>,
    ) -> Result<CallToolResult, McpError> {
        let plan = core::plan_str(&params.0.records);
        to_json(McpResponse::success(order_view(&plan)))
    }

    #[tool(
        description = "Return the rendering walk for the given records: emit_node for each node in order, each followed by emit_edge for its outgoing edge records."
    )]
    async fn sequence_records(
        &self,
        params: Parameters<RecordsInput>,
    ) -> Result<CallToolResult, McpError> {
        let plan = core::plan_str(&params.0.records);
        to_json(McpResponse::success(sequence_view(&plan)))
    }

    #[tool(
        description = "Report malformed records, references to unknown nodes, duplicate ids and the first cycle found in the given records."
    )]
    async fn check_records(
        &self,
        params: Parameters<RecordsInput>,
    ) -> Result<CallToolResult, McpError> {
        let plan = core::plan_str(&params.0.records);
        to_json(McpResponse::success(check_view(&plan)))
    }

    #[tool(description = "Linearize the snapshot stored with `kgseq import`.")]
    async fn linearize_stored(&self) -> Result<CallToolResult, McpError> {
        match self.stored_plan() {
            Ok(plan) => to_json(McpResponse::success(order_view(&plan))),
            Err(e) => to_json(error_to_response(e)),
        }
    }

    #[tool(description = "Return the rendering walk for the snapshot stored with `kgseq import`.")]
    async fn sequence_stored(&self) -> Result<CallToolResult, McpError> {
        match self.stored_plan() {
            Ok(plan) => to_json(McpResponse::success(sequence_view(&plan))),
            Err(e) => to_json(error_to_response(e)),
        }
    }
}

#[tool_handler]
impl ServerHandler for SequencerMcp {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "Knowledge-graph sequencer. Records are JSON objects, one per line: nodes carry `id` and optional `successors`; \
                 edges carry `\"type\": \"edge\"`, `id`, `source` and `target`. Use linearize_records for a reading order, \
                 sequence_records for the node/edge walk, and check_records for data problems.".to_string()
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

pub async fn run_mcp_server(db_path: PathBuf) -> anyhow::Result<()> {
    info!(db = %db_path.display(), "starting MCP server on stdio");
    let mcp = SequencerMcp::new(db_path);

    let service = mcp
        .serve(stdio())
        .await
        .map_err(|e| SeqError::Mcp(e.to_string()))?;

    service.waiting().await?;
    Ok(())
}
