//! access_mcp_resource Tool

use async_trait::async_trait;
use serde::Deserialize;

use agent_gate_core::{AskKind, CoreResult, LegacyParams, ToolName, ToolUse};
use agent_gate_tools::responses::{tool_error, unknown_target};
use agent_gate_tools::ToolResult;

use crate::models::mcp::find_server;
use crate::services::approval::McpServerUse;
use crate::services::tools::approval::ToolCallbacks;
use crate::services::tools::trait_def::{legacy_required, ToolDefinitionTrait, ToolHandler};

use super::{available_servers, mcp_unavailable};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AccessMcpResourceParams {
    pub server_name: String,
    pub uri: String,
}

pub struct AccessMcpResourceTool;

impl ToolDefinitionTrait for AccessMcpResourceTool {
    fn name(&self) -> ToolName {
        ToolName::AccessMcpResource
    }

    fn description(&self) -> &str {
        "Read a resource (file, API response, system information) exposed by a connected MCP server."
    }

    fn required_params(&self) -> &'static [&'static str] {
        &["server_name", "uri"]
    }
}

#[async_trait]
impl ToolHandler for AccessMcpResourceTool {
    type Params = AccessMcpResourceParams;

    fn parse_legacy(&self, params: &LegacyParams) -> CoreResult<AccessMcpResourceParams> {
        Ok(AccessMcpResourceParams {
            server_name: legacy_required(params, self.name(), "server_name")?,
            uri: legacy_required(params, self.name(), "uri")?,
        })
    }

    fn usage_summary(&self, params: &AccessMcpResourceParams) -> String {
        format!("mcp resource {} from {}", params.uri, params.server_name)
    }

    async fn handle_partial(&self, tool_use: &ToolUse, cb: &mut ToolCallbacks<'_>) -> CoreResult<()> {
        let (Some(server_name), Some(uri)) = (tool_use.param("server_name"), tool_use.param("uri"))
        else {
            return Ok(());
        };
        let payload = McpServerUse::AccessMcpResource { server_name, uri };
        cb.update_partial(AskKind::UseMcpServer, &payload.to_json()).await
    }

    async fn execute(&self, params: AccessMcpResourceParams, cb: &mut ToolCallbacks<'_>) -> CoreResult<()> {
        if find_server(&cb.session.mcp_servers, &params.server_name).is_none() {
            let available = available_servers(&cb.session.mcp_servers);
            cb.record_mistake();
            cb.push_tool_result(unknown_target("Server", &params.server_name, &available));
            return Ok(());
        }

        let payload = McpServerUse::AccessMcpResource {
            server_name: params.server_name.clone(),
            uri: params.uri.clone(),
        };
        if !cb.ask_approval(AskKind::UseMcpServer, &payload.to_json()).await? {
            return Ok(());
        }

        let Some(hub) = cb.session.backends.mcp.clone() else {
            cb.push_tool_result(tool_error(mcp_unavailable()));
            return Ok(());
        };
        let output = hub.read_resource(&params.server_name, &params.uri).await?;
        let text = if output.text.trim().is_empty() {
            "(Empty response)".to_string()
        } else {
            output.text
        };
        cb.push_tool_result(ToolResult::ok_with_images(text, output.images));
        Ok(())
    }
}
