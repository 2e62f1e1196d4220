//! execute_command Tool
//!
//! Runs a shell command after it clears the command allow / deny lists or
//! the human approves it. Cancelling the session kills the process.

use async_trait::async_trait;
use serde::Deserialize;

use agent_gate_core::{AskKind, CoreResult, ExecutionContext, LegacyParams, ToolName, ToolUse};
use agent_gate_tools::responses::tool_error;
use agent_gate_tools::ToolResult;

use crate::services::tools::approval::ToolCallbacks;
use crate::services::tools::backends::CommandOutput;
use crate::services::tools::trait_def::{
    legacy_optional, legacy_required, ToolDefinitionTrait, ToolHandler,
};

/// Output beyond this many characters is cut from the middle.
const MAX_OUTPUT_CHARS: usize = 30_000;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ExecuteCommandParams {
    pub command: String,
    #[serde(default)]
    pub cwd: Option<String>,
}

pub struct ExecuteCommandTool;

impl ToolDefinitionTrait for ExecuteCommandTool {
    fn name(&self) -> ToolName {
        ToolName::ExecuteCommand
    }

    fn description(&self) -> &str {
        "Execute a shell command in the workspace (or the given cwd) and return its output."
    }

    fn required_params(&self) -> &'static [&'static str] {
        &["command"]
    }

    fn optional_params(&self) -> &'static [&'static str] {
        &["cwd"]
    }
}

#[async_trait]
impl ToolHandler for ExecuteCommandTool {
    type Params = ExecuteCommandParams;

    fn parse_legacy(&self, params: &LegacyParams) -> CoreResult<ExecuteCommandParams> {
        Ok(ExecuteCommandParams {
            command: legacy_required(params, self.name(), "command")?,
            cwd: legacy_optional(params, "cwd"),
        })
    }

    fn usage_summary(&self, params: &ExecuteCommandParams) -> String {
        format!("$ {}", params.command)
    }

    async fn handle_partial(&self, tool_use: &ToolUse, cb: &mut ToolCallbacks<'_>) -> CoreResult<()> {
        match tool_use.param("command") {
            Some(command) => cb.update_partial(AskKind::Command, &command).await,
            None => Ok(()),
        }
    }

    async fn execute(&self, params: ExecuteCommandParams, cb: &mut ToolCallbacks<'_>) -> CoreResult<()> {
        let command = params.command.trim().to_string();
        let cwd = match &params.cwd {
            Some(dir) => cb.session.resolve(dir),
            None => cb.session.ctx.cwd().to_path_buf(),
        };
        if !cb.session.backends.fs.is_dir(&cwd).await {
            cb.record_mistake();
            cb.push_tool_result(tool_error(format!(
                "Working directory '{}' does not exist.",
                cwd.display()
            )));
            return Ok(());
        }

        if !cb.ask_approval(AskKind::Command, &command).await? {
            return Ok(());
        }

        let runner = cb.session.backends.commands.clone();
        let cancel = cb.session.cancellation_token.clone();
        let output = runner.run(&command, &cwd, &cancel).await?;
        let shown_cwd = cb.session.display_path(&cwd);
        cb.push_tool_result(ToolResult::ok(render_output(&shown_cwd, &output)));
        Ok(())
    }
}

fn render_output(cwd: &str, output: &CommandOutput) -> String {
    let cwd = if cwd.is_empty() { "." } else { cwd };
    let exit = match output.exit_code {
        Some(code) => format!("Exit code: {}", code),
        None => "Process terminated by signal".to_string(),
    };
    let mut combined = output.stdout.clone();
    if !output.stderr.trim().is_empty() {
        if !combined.is_empty() && !combined.ends_with('\n') {
            combined.push('\n');
        }
        combined.push_str(&output.stderr);
    }
    let body = if combined.trim().is_empty() {
        "(no output)".to_string()
    } else {
        truncate_middle(combined.trim_end(), MAX_OUTPUT_CHARS)
    };
    format!(
        "Command executed in terminal within working directory '{}'. {}\nOutput:\n{}",
        cwd, exit, body
    )
}

/// Keep the head and tail; the tail usually carries the error.
fn truncate_middle(text: &str, max_chars: usize) -> String {
    let total = text.chars().count();
    if total <= max_chars {
        return text.to_string();
    }
    let half = max_chars / 2;
    let head: String = text.chars().take(half).collect();
    let tail: String = text.chars().skip(total - half).collect();
    format!(
        "{}\n\n... ({} characters omitted) ...\n\n{}",
        head,
        total - 2 * half,
        tail
    )
}
