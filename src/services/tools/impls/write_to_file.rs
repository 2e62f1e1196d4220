//! write_to_file Tool
//!
//! Creates or overwrites a file. The change is shown in the editor diff view
//! while approval is pending; a rejection reverts the view and leaves the
//! file untouched.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use similar::TextDiff;

use agent_gate_core::{AskKind, CoreResult, LegacyParams, ToolName, ToolUse};
use agent_gate_tools::ToolResult;

use crate::services::approval::ToolAction;
use crate::services::tools::approval::ToolCallbacks;
use crate::services::tools::backends::DiffPreview;
use crate::services::tools::trait_def::{legacy_required, ToolDefinitionTrait, ToolHandler};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WriteToFileParams {
    pub path: String,
    pub content: String,
}

pub struct WriteToFileTool;

impl ToolDefinitionTrait for WriteToFileTool {
    fn name(&self) -> ToolName {
        ToolName::WriteToFile
    }

    fn description(&self) -> &str {
        "Write complete content to a file, creating it and any missing directories if needed."
    }

    fn required_params(&self) -> &'static [&'static str] {
        &["path", "content"]
    }
}

#[async_trait]
impl ToolHandler for WriteToFileTool {
    type Params = WriteToFileParams;

    fn parse_legacy(&self, params: &LegacyParams) -> CoreResult<WriteToFileParams> {
        // Content keeps its whitespace; the XML parser already stripped the
        // newline framing.
        let path = legacy_required(params, self.name(), "path")?;
        legacy_required(params, self.name(), "content")?;
        Ok(WriteToFileParams {
            path,
            content: params.get("content").cloned().unwrap_or_default(),
        })
    }

    fn usage_summary(&self, params: &WriteToFileParams) -> String {
        format!("write {} ({} lines)", params.path, params.content.lines().count())
    }

    async fn handle_partial(&self, tool_use: &ToolUse, cb: &mut ToolCallbacks<'_>) -> CoreResult<()> {
        let Some(path) = tool_use.param("path") else {
            return Ok(());
        };
        let abs = cb.session.resolve(&path);
        let action = if cb.session.backends.fs.exists(&abs).await {
            ToolAction::EditedExistingFile
        } else {
            ToolAction::NewFileCreated
        };
        let mut payload = cb
            .session
            .approval_payload(action, &abs)
            .protected(cb.session.is_protected(&abs));
        payload.content = tool_use.param("content");
        cb.update_partial(AskKind::Tool, &payload.to_json()).await
    }

    async fn execute(&self, params: WriteToFileParams, cb: &mut ToolCallbacks<'_>) -> CoreResult<()> {
        let abs = cb.session.resolve(&params.path);
        let rel = cb.session.display_path(&abs);
        let content = strip_code_fences(&params.content);
        let fs = cb.session.backends.fs.clone();

        let original = if fs.exists(&abs).await {
            Some(fs.read_to_string(&abs).await?)
        } else {
            None
        };
        if original.as_deref() == Some(content.as_str()) {
            cb.push_tool_result(ToolResult::ok(format!("No changes needed for '{}'.", rel)));
            return Ok(());
        }

        let (action, preview_body) = match &original {
            Some(existing) => (
                ToolAction::EditedExistingFile,
                unified_diff(&rel, existing, &content),
            ),
            None => (ToolAction::NewFileCreated, content.clone()),
        };
        let payload = cb
            .session
            .approval_payload(action, &abs)
            .with_content(preview_body)
            .protected(cb.session.is_protected(&abs));

        let diff_view = cb.session.backends.diff.clone();
        if let Some(view) = &diff_view {
            view.open(&abs, original.as_deref(), &content).await?;
        }

        let approved = match cb.ask_approval(AskKind::Tool, &payload.to_json()).await {
            Ok(approved) => approved,
            Err(e) => {
                revert(diff_view.as_ref(), &abs).await;
                return Err(e);
            }
        };
        if !approved {
            revert(diff_view.as_ref(), &abs).await;
            return Ok(());
        }

        fs.write(&abs, &content).await?;
        if let Some(view) = &diff_view {
            view.close(&abs).await?;
        }

        let verb = if original.is_some() { "updated" } else { "created" };
        tracing::info!("[write_to_file] {} {}", verb, rel);
        cb.push_tool_result(ToolResult::ok(format!(
            "The content was successfully saved to {} ({}).",
            rel, verb
        )));
        Ok(())
    }
}

async fn revert(view: Option<&Arc<dyn DiffPreview>>, path: &Path) {
    if let Some(view) = view {
        if let Err(e) = view.revert(path).await {
            tracing::warn!("[write_to_file] failed to revert preview of {}: {}", path.display(), e);
        }
    }
}

/// Drop a markdown code fence the model wrapped around the whole file.
fn strip_code_fences(content: &str) -> String {
    let trimmed = content.trim_end();
    let mut lines: Vec<&str> = trimmed.lines().collect();
    if lines.len() >= 2 && lines[0].trim_start().starts_with("```") && lines[lines.len() - 1].trim() == "```" {
        lines.remove(0);
        lines.pop();
        let mut stripped = lines.join("\n");
        stripped.push('\n');
        return stripped;
    }
    content.to_string()
}

fn unified_diff(rel: &str, original: &str, proposed: &str) -> String {
    TextDiff::from_lines(original, proposed)
        .unified_diff()
        .context_radius(3)
        .header(rel, rel)
        .to_string()
}
