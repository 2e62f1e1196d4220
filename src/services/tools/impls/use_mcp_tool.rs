//! use_mcp_tool Tool
//!
//! Calls a tool on a connected MCP server. Unknown servers and tools are
//! reported back with the names that do exist so the agent can correct
//! itself.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use agent_gate_core::{AskKind, CoreError, CoreResult, LegacyParams, ToolName, ToolUse};
use agent_gate_tools::responses::{tool_error, unknown_target};
use agent_gate_tools::ToolResult;

use crate::models::mcp::find_server;
use crate::services::approval::McpServerUse;
use crate::services::tools::approval::ToolCallbacks;
use crate::services::tools::trait_def::{
    legacy_optional, legacy_required, ToolDefinitionTrait, ToolHandler,
};

use super::{available_servers, mcp_unavailable};

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UseMcpToolParams {
    pub server_name: String,
    pub tool_name: String,
    #[serde(default)]
    pub arguments: Option<Value>,
}

pub struct UseMcpToolTool;

impl ToolDefinitionTrait for UseMcpToolTool {
    fn name(&self) -> ToolName {
        ToolName::UseMcpTool
    }

    fn description(&self) -> &str {
        "Call a tool provided by a connected MCP server, passing JSON arguments."
    }

    fn required_params(&self) -> &'static [&'static str] {
        &["server_name", "tool_name"]
    }

    fn optional_params(&self) -> &'static [&'static str] {
        &["arguments"]
    }
}

/// Arguments must be a JSON object; a string is decoded first.
fn parse_arguments(raw: Option<&Value>, server: &str, tool: &str) -> CoreResult<Option<Value>> {
    let value = match raw {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::String(text)) if text.trim().is_empty() => return Ok(None),
        Some(Value::String(text)) => serde_json::from_str::<Value>(text).map_err(|e| {
            CoreError::parse(format!(
                "Invalid JSON arguments for {}/{}: {}. Retry with a properly formatted JSON object.",
                server, tool, e
            ))
        })?,
        Some(other) => other.clone(),
    };
    if !value.is_object() {
        return Err(CoreError::parse(format!(
            "Arguments for {}/{} must be a JSON object",
            server, tool
        )));
    }
    Ok(Some(value))
}

#[async_trait]
impl ToolHandler for UseMcpToolTool {
    type Params = UseMcpToolParams;

    fn parse_legacy(&self, params: &LegacyParams) -> CoreResult<UseMcpToolParams> {
        let server_name = legacy_required(params, self.name(), "server_name")?;
        let tool_name = legacy_required(params, self.name(), "tool_name")?;
        let raw = legacy_optional(params, "arguments").map(Value::String);
        let arguments = parse_arguments(raw.as_ref(), &server_name, &tool_name)?;
        Ok(UseMcpToolParams {
            server_name,
            tool_name,
            arguments,
        })
    }

    fn parse_native(&self, args: &Value) -> CoreResult<UseMcpToolParams> {
        let field = |name: &str| {
            args.get(name)
                .and_then(Value::as_str)
                .map(str::to_string)
                .ok_or_else(|| CoreError::missing_parameter(self.name().as_str(), name))
        };
        let server_name = field("server_name")?;
        let tool_name = field("tool_name")?;
        let arguments = parse_arguments(args.get("arguments"), &server_name, &tool_name)?;
        Ok(UseMcpToolParams {
            server_name,
            tool_name,
            arguments,
        })
    }

    fn usage_summary(&self, params: &UseMcpToolParams) -> String {
        format!("mcp {}/{}", params.server_name, params.tool_name)
    }

    async fn handle_partial(&self, tool_use: &ToolUse, cb: &mut ToolCallbacks<'_>) -> CoreResult<()> {
        let (Some(server_name), Some(tool_name)) =
            (tool_use.param("server_name"), tool_use.param("tool_name"))
        else {
            return Ok(());
        };
        let payload = McpServerUse::UseMcpTool {
            server_name,
            tool_name,
            arguments: tool_use.param("arguments"),
        };
        cb.update_partial(AskKind::UseMcpServer, &payload.to_json()).await
    }

    async fn execute(&self, params: UseMcpToolParams, cb: &mut ToolCallbacks<'_>) -> CoreResult<()> {
        let lookup = match find_server(&cb.session.mcp_servers, &params.server_name) {
            None => Err(unknown_target(
                "Server",
                &params.server_name,
                &available_servers(&cb.session.mcp_servers),
            )),
            Some(server) if !server.tools.is_empty() && server.find_tool(&params.tool_name).is_none() => {
                Err(unknown_target("Tool", &params.tool_name, &server.tool_names()))
            }
            Some(_) => Ok(()),
        };
        if let Err(result) = lookup {
            cb.record_mistake();
            cb.push_tool_result(result);
            return Ok(());
        }

        let payload = McpServerUse::UseMcpTool {
            server_name: params.server_name.clone(),
            tool_name: params.tool_name.clone(),
            arguments: params.arguments.as_ref().map(Value::to_string),
        };
        if !cb.ask_approval(AskKind::UseMcpServer, &payload.to_json()).await? {
            return Ok(());
        }

        let Some(hub) = cb.session.backends.mcp.clone() else {
            cb.push_tool_result(tool_error(mcp_unavailable()));
            return Ok(());
        };
        let output = hub
            .call_tool(&params.server_name, &params.tool_name, params.arguments)
            .await?;
        let text = if output.text.trim().is_empty() {
            "(No response)".to_string()
        } else {
            output.text
        };
        cb.push_tool_result(ToolResult::ok_with_images(text, output.images));
        Ok(())
    }
}
