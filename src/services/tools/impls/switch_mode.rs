//! switch_mode Tool

use async_trait::async_trait;
use serde::Deserialize;

use agent_gate_core::{AskKind, CoreResult, LegacyParams, ToolName, ToolUse};
use agent_gate_tools::responses::{tool_error, unknown_target};
use agent_gate_tools::ToolResult;

use crate::models::mode::find_mode;
use crate::services::approval::{ToolAction, ToolApprovalPayload};
use crate::services::tools::approval::ToolCallbacks;
use crate::services::tools::trait_def::{
    legacy_optional, legacy_required, ToolDefinitionTrait, ToolHandler,
};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SwitchModeParams {
    pub mode_slug: String,
    #[serde(default)]
    pub reason: Option<String>,
}

pub struct SwitchModeTool;

fn payload(mode: &str, reason: Option<&str>) -> ToolApprovalPayload {
    let mut payload = ToolApprovalPayload::new(ToolAction::SwitchMode);
    payload.mode = Some(mode.to_string());
    payload.reason = reason.map(str::to_string);
    payload
}

impl ToolDefinitionTrait for SwitchModeTool {
    fn name(&self) -> ToolName {
        ToolName::SwitchMode
    }

    fn description(&self) -> &str {
        "Request to switch to a different mode, giving the reason for the switch."
    }

    fn required_params(&self) -> &'static [&'static str] {
        &["mode_slug"]
    }

    fn optional_params(&self) -> &'static [&'static str] {
        &["reason"]
    }
}

#[async_trait]
impl ToolHandler for SwitchModeTool {
    type Params = SwitchModeParams;

    fn parse_legacy(&self, params: &LegacyParams) -> CoreResult<SwitchModeParams> {
        Ok(SwitchModeParams {
            mode_slug: legacy_required(params, self.name(), "mode_slug")?,
            reason: legacy_optional(params, "reason"),
        })
    }

    fn usage_summary(&self, params: &SwitchModeParams) -> String {
        format!("switch to {}", params.mode_slug)
    }

    async fn handle_partial(&self, tool_use: &ToolUse, cb: &mut ToolCallbacks<'_>) -> CoreResult<()> {
        let Some(mode) = tool_use.param("mode_slug") else {
            return Ok(());
        };
        let reason = tool_use.param("reason");
        cb.update_partial(AskKind::Tool, &payload(&mode, reason.as_deref()).to_json())
            .await
    }

    async fn execute(&self, params: SwitchModeParams, cb: &mut ToolCallbacks<'_>) -> CoreResult<()> {
        let slug = params.mode_slug.trim().to_string();
        let target = match find_mode(&cb.session.modes, &slug) {
            Some(mode) => mode.clone(),
            None => {
                let available: Vec<String> = cb.session.modes.iter().map(|m| m.slug.clone()).collect();
                cb.record_mistake();
                cb.push_tool_result(unknown_target("Mode", &slug, &available));
                return Ok(());
            }
        };
        if cb.session.mode == target.slug {
            cb.record_mistake();
            cb.push_tool_result(tool_error(format!("Already in {} mode.", target.name)));
            return Ok(());
        }

        let payload = payload(&target.slug, params.reason.as_deref());
        if !cb.ask_approval(AskKind::Tool, &payload.to_json()).await? {
            return Ok(());
        }

        let previous = std::mem::replace(&mut cb.session.mode, target.slug.clone());
        let previous_name = find_mode(&cb.session.modes, &previous)
            .map(|m| m.name.clone())
            .unwrap_or(previous);
        tracing::info!("[switch_mode] {} -> {}", previous_name, target.name);

        let message = match params.reason {
            Some(reason) => format!(
                "Successfully switched from {} mode to {} mode because: {}.",
                previous_name, target.name, reason
            ),
            None => format!(
                "Successfully switched from {} mode to {} mode.",
                previous_name, target.name
            ),
        };
        cb.push_tool_result(ToolResult::ok(message));
        Ok(())
    }
}
