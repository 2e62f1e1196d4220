//! new_task Tool
//!
//! Starts a sub-task in a given mode, optionally seeded with its own todo
//! list. Spawning is the host's job; the core validates, asks, and reports
//! the new task's id.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use agent_gate_core::{AskKind, CoreError, CoreResult, LegacyParams, TodoItem, ToolName, ToolUse};
use agent_gate_tools::responses::{tool_error, unknown_target};
use agent_gate_tools::ToolResult;

use crate::models::mode::find_mode;
use crate::services::approval::{ToolAction, ToolApprovalPayload};
use crate::services::tools::approval::ToolCallbacks;
use crate::services::tools::trait_def::{
    legacy_optional, legacy_required, ToolDefinitionTrait, ToolHandler,
};

use super::update_todo_list::{todos_from_markdown, todos_from_value};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewTaskParams {
    pub mode: String,
    pub message: String,
    #[serde(default)]
    pub todos: Vec<TodoItem>,
}

pub struct NewTaskTool;

fn payload(mode: &str, message: &str) -> ToolApprovalPayload {
    let mut payload = ToolApprovalPayload::new(ToolAction::NewTask).with_content(message);
    payload.mode = Some(mode.to_string());
    payload
}

impl ToolDefinitionTrait for NewTaskTool {
    fn name(&self) -> ToolName {
        ToolName::NewTask
    }

    fn description(&self) -> &str {
        "Create a new sub-task in the chosen mode with the given instructions."
    }

    fn required_params(&self) -> &'static [&'static str] {
        &["mode", "message"]
    }

    fn optional_params(&self) -> &'static [&'static str] {
        &["todos"]
    }
}

#[async_trait]
impl ToolHandler for NewTaskTool {
    type Params = NewTaskParams;

    fn parse_legacy(&self, params: &LegacyParams) -> CoreResult<NewTaskParams> {
        let todos = match legacy_optional(params, "todos") {
            Some(markdown) => todos_from_markdown(&markdown)?,
            None => Vec::new(),
        };
        Ok(NewTaskParams {
            mode: legacy_required(params, self.name(), "mode")?,
            message: legacy_required(params, self.name(), "message")?,
            todos,
        })
    }

    fn parse_native(&self, args: &Value) -> CoreResult<NewTaskParams> {
        let field = |name: &str| {
            args.get(name)
                .and_then(Value::as_str)
                .map(str::to_string)
                .ok_or_else(|| CoreError::missing_parameter(self.name().as_str(), name))
        };
        Ok(NewTaskParams {
            mode: field("mode")?,
            message: field("message")?,
            todos: todos_from_value(args.get("todos"))?,
        })
    }

    fn usage_summary(&self, params: &NewTaskParams) -> String {
        format!("new {} task", params.mode)
    }

    async fn handle_partial(&self, tool_use: &ToolUse, cb: &mut ToolCallbacks<'_>) -> CoreResult<()> {
        let (Some(mode), Some(message)) = (tool_use.param("mode"), tool_use.param("message")) else {
            return Ok(());
        };
        cb.update_partial(AskKind::Tool, &payload(&mode, &message).to_json())
            .await
    }

    async fn execute(&self, params: NewTaskParams, cb: &mut ToolCallbacks<'_>) -> CoreResult<()> {
        let slug = params.mode.trim().to_string();
        let Some(mode_name) = find_mode(&cb.session.modes, &slug).map(|m| m.name.clone()) else {
            let available: Vec<String> = cb.session.modes.iter().map(|m| m.slug.clone()).collect();
            cb.record_mistake();
            cb.push_tool_result(unknown_target("Mode", &slug, &available));
            return Ok(());
        };

        if !cb
            .ask_approval(AskKind::Tool, &payload(&slug, &params.message).to_json())
            .await?
        {
            return Ok(());
        }

        let Some(spawner) = cb.session.backends.tasks.clone() else {
            cb.push_tool_result(tool_error("Sub-tasks are not available in this session."));
            return Ok(());
        };
        let task_id = spawner.spawn(&slug, &params.message, &params.todos).await?;
        tracing::info!("[new_task] spawned {} in {} mode", task_id, slug);
        cb.push_tool_result(ToolResult::ok(format!(
            "Successfully created new task {} in {} mode with message: {}",
            task_id, mode_name, params.message
        )));
        Ok(())
    }
}
