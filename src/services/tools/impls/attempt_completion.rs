//! attempt_completion Tool
//!
//! Presents the final result. The human either accepts it, which ends the
//! task, or replies with feedback, which becomes the tool result so the
//! agent can keep going.

use async_trait::async_trait;
use serde::Deserialize;

use agent_gate_core::{AskKind, CoreResult, ExecutionContext, LegacyParams, ToolName, ToolUse};
use agent_gate_tools::responses::tool_denied;
use agent_gate_tools::ToolResult;

use crate::services::tools::approval::ToolCallbacks;
use crate::services::tools::trait_def::{legacy_required, ToolDefinitionTrait, ToolHandler};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AttemptCompletionParams {
    pub result: String,
}

pub struct AttemptCompletionTool;

impl ToolDefinitionTrait for AttemptCompletionTool {
    fn name(&self) -> ToolName {
        ToolName::AttemptCompletion
    }

    fn description(&self) -> &str {
        "Present the result of the task to the user once it is complete."
    }

    fn required_params(&self) -> &'static [&'static str] {
        &["result"]
    }
}

#[async_trait]
impl ToolHandler for AttemptCompletionTool {
    type Params = AttemptCompletionParams;

    fn parse_legacy(&self, params: &LegacyParams) -> CoreResult<AttemptCompletionParams> {
        Ok(AttemptCompletionParams {
            result: legacy_required(params, self.name(), "result")?,
        })
    }

    fn usage_summary(&self, params: &AttemptCompletionParams) -> String {
        format!("completion ({} chars)", params.result.chars().count())
    }

    async fn handle_partial(&self, tool_use: &ToolUse, cb: &mut ToolCallbacks<'_>) -> CoreResult<()> {
        match tool_use.param("result") {
            Some(result) => cb.update_partial(AskKind::CompletionResult, &result).await,
            None => Ok(()),
        }
    }

    async fn execute(&self, params: AttemptCompletionParams, cb: &mut ToolCallbacks<'_>) -> CoreResult<()> {
        let reply = cb.ask_question(AskKind::CompletionResult, &params.result).await?;

        if reply.is_approval() {
            cb.session.completed = true;
            tracing::info!("[attempt_completion] task {} accepted", cb.session.ctx.session_id());
            cb.push_tool_result(ToolResult::ok("The user accepted the task result."));
            return Ok(());
        }

        match reply.feedback() {
            Some(feedback) => {
                let message = format!(
                    "The user has provided feedback on the results. Consider their input to continue the task, and then attempt completion again.\n<feedback>\n{}\n</feedback>",
                    feedback
                );
                cb.push_tool_result(ToolResult::ok_with_images(message, reply.images.clone()));
            }
            None => {
                cb.push_tool_result(tool_denied());
            }
        }
        Ok(())
    }
}
