//! read_file Tool
//!
//! Reads a text file, optionally a line range, and returns it with line
//! numbers so the agent can cite and edit precise locations.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use agent_gate_core::{AskKind, CoreError, CoreResult, LegacyParams, ToolName, ToolUse};
use agent_gate_tools::ToolResult;

use crate::services::approval::ToolAction;
use crate::services::tools::approval::ToolCallbacks;
use crate::services::tools::trait_def::{
    legacy_required, legacy_u32, ToolDefinitionTrait, ToolHandler,
};

/// Lines returned when no range is requested.
const MAX_LINES_PER_READ: usize = 2000;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ReadFileParams {
    pub path: String,
    #[serde(default)]
    pub start_line: Option<u32>,
    #[serde(default)]
    pub end_line: Option<u32>,
}

impl ReadFileParams {
    fn validated(self) -> CoreResult<Self> {
        if let (Some(start), Some(end)) = (self.start_line, self.end_line) {
            if start > end {
                return Err(CoreError::parse(format!(
                    "start_line ({}) must not be greater than end_line ({})",
                    start, end
                )));
            }
        }
        Ok(self)
    }
}

pub struct ReadFileTool;

impl ToolDefinitionTrait for ReadFileTool {
    fn name(&self) -> ToolName {
        ToolName::ReadFile
    }

    fn description(&self) -> &str {
        "Read the contents of a file, optionally limited to a 1-based inclusive line range."
    }

    fn required_params(&self) -> &'static [&'static str] {
        &["path"]
    }

    fn optional_params(&self) -> &'static [&'static str] {
        &["start_line", "end_line"]
    }
}

#[async_trait]
impl ToolHandler for ReadFileTool {
    type Params = ReadFileParams;

    fn parse_legacy(&self, params: &LegacyParams) -> CoreResult<ReadFileParams> {
        ReadFileParams {
            path: legacy_required(params, self.name(), "path")?,
            start_line: legacy_u32(params, "start_line")?,
            end_line: legacy_u32(params, "end_line")?,
        }
        .validated()
    }

    fn parse_native(&self, args: &Value) -> CoreResult<ReadFileParams> {
        serde_json::from_value::<ReadFileParams>(args.clone())
            .map_err(|e| CoreError::parse(format!("Invalid arguments for read_file: {}", e)))?
            .validated()
    }

    fn usage_summary(&self, params: &ReadFileParams) -> String {
        match (params.start_line, params.end_line) {
            (None, None) => format!("read {}", params.path),
            (start, end) => format!(
                "read {} lines {}-{}",
                params.path,
                start.unwrap_or(1),
                end.map(|e| e.to_string()).unwrap_or_else(|| "end".into())
            ),
        }
    }

    async fn handle_partial(&self, tool_use: &ToolUse, cb: &mut ToolCallbacks<'_>) -> CoreResult<()> {
        let Some(path) = tool_use.param("path") else {
            return Ok(());
        };
        let abs = cb.session.resolve(&path);
        let payload = cb.session.approval_payload(ToolAction::ReadFile, &abs);
        cb.update_partial(AskKind::Tool, &payload.to_json()).await
    }

    async fn execute(&self, params: ReadFileParams, cb: &mut ToolCallbacks<'_>) -> CoreResult<()> {
        let abs = cb.session.resolve(&params.path);
        let rel = cb.session.display_path(&abs);
        let payload = cb.session.approval_payload(ToolAction::ReadFile, &abs);

        if !cb.ask_approval(AskKind::Tool, &payload.to_json()).await? {
            return Ok(());
        }

        let fs = cb.session.backends.fs.clone();
        let content = fs.read_to_string(&abs).await?;
        cb.push_tool_result(ToolResult::ok(render_file(
            &rel,
            &content,
            params.start_line,
            params.end_line,
        )));
        Ok(())
    }
}

/// Numbered excerpt wrapped in `<file>` tags.
fn render_file(rel: &str, content: &str, start_line: Option<u32>, end_line: Option<u32>) -> String {
    let lines: Vec<&str> = content.lines().collect();
    if lines.is_empty() {
        return format!(
            "<file><path>{}</path>\n<content/><notice>File is empty</notice>\n</file>",
            rel
        );
    }

    let start = start_line.map(|s| s.max(1) as usize).unwrap_or(1);
    let ranged = start_line.is_some() || end_line.is_some();
    let mut end = end_line
        .map(|e| e as usize)
        .unwrap_or(lines.len())
        .min(lines.len());
    let mut notice = None;
    if !ranged && lines.len() > MAX_LINES_PER_READ {
        end = MAX_LINES_PER_READ;
        notice = Some(format!(
            "Showing only {} of {} lines. Use start_line and end_line to read more.",
            MAX_LINES_PER_READ,
            lines.len()
        ));
    }

    if start > end {
        return format!(
            "<file><path>{}</path>\n<content/><notice>Line {} is past the end of the file ({} lines)</notice>\n</file>",
            rel,
            start,
            lines.len()
        );
    }

    let width = end.to_string().len();
    let body = lines[start - 1..end]
        .iter()
        .enumerate()
        .map(|(i, line)| format!("{:>width$} | {}", start + i, line, width = width))
        .collect::<Vec<_>>()
        .join("\n");

    let mut out = format!(
        "<file><path>{}</path>\n<content lines=\"{}-{}\">\n{}\n</content>\n",
        rel, start, end, body
    );
    if let Some(notice) = notice {
        out.push_str(&format!("<notice>{}</notice>\n", notice));
    }
    out.push_str("</file>");
    out
}
