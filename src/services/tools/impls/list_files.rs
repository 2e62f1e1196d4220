//! list_files Tool
//!
//! Lists a directory, top level or recursively, with .gitignore-aware
//! traversal.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Deserialize;

use agent_gate_core::{AskKind, CoreError, CoreResult, LegacyParams, ToolName, ToolUse};
use agent_gate_tools::responses::tool_error;
use agent_gate_tools::ToolResult;

use crate::services::approval::{ToolAction, ToolApprovalPayload};
use crate::services::tools::approval::ToolCallbacks;
use crate::services::tools::trait_def::{
    legacy_bool, legacy_required, ToolDefinitionTrait, ToolHandler,
};

/// Maximum number of entries to return.
const LIST_MAX_ENTRIES: usize = 200;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ListFilesParams {
    pub path: String,
    #[serde(default)]
    pub recursive: bool,
}

pub struct ListFilesTool;

impl ListFilesTool {
    fn payload(cb: &ToolCallbacks<'_>, abs: &Path, recursive: bool) -> ToolApprovalPayload {
        let action = if recursive {
            ToolAction::ListFilesRecursive
        } else {
            ToolAction::ListFilesTopLevel
        };
        cb.session.approval_payload(action, abs)
    }
}

impl ToolDefinitionTrait for ListFilesTool {
    fn name(&self) -> ToolName {
        ToolName::ListFiles
    }

    fn description(&self) -> &str {
        "List files and directories under a path. Directories end with '/'."
    }

    fn required_params(&self) -> &'static [&'static str] {
        &["path"]
    }

    fn optional_params(&self) -> &'static [&'static str] {
        &["recursive"]
    }
}

#[async_trait]
impl ToolHandler for ListFilesTool {
    type Params = ListFilesParams;

    fn parse_legacy(&self, params: &LegacyParams) -> CoreResult<ListFilesParams> {
        Ok(ListFilesParams {
            path: legacy_required(params, self.name(), "path")?,
            recursive: legacy_bool(params, "recursive")?,
        })
    }

    fn usage_summary(&self, params: &ListFilesParams) -> String {
        if params.recursive {
            format!("list {} recursively", params.path)
        } else {
            format!("list {}", params.path)
        }
    }

    async fn handle_partial(&self, tool_use: &ToolUse, cb: &mut ToolCallbacks<'_>) -> CoreResult<()> {
        let Some(path) = tool_use.param("path") else {
            return Ok(());
        };
        let recursive = tool_use.param("recursive").as_deref() == Some("true");
        let abs = cb.session.resolve(&path);
        let payload = Self::payload(cb, &abs, recursive);
        cb.update_partial(AskKind::Tool, &payload.to_json()).await
    }

    async fn execute(&self, params: ListFilesParams, cb: &mut ToolCallbacks<'_>) -> CoreResult<()> {
        let abs = cb.session.resolve(&params.path);
        if !cb.session.backends.fs.is_dir(&abs).await {
            let shown = cb.session.display_path(&abs);
            cb.record_mistake();
            cb.push_tool_result(tool_error(format!("Directory not found: {}", shown)));
            return Ok(());
        }

        let payload = Self::payload(cb, &abs, params.recursive);
        if !cb.ask_approval(AskKind::Tool, &payload.to_json()).await? {
            return Ok(());
        }

        let root = abs.clone();
        let recursive = params.recursive;
        let (entries, truncated) = tokio::task::spawn_blocking(move || list_dir(&root, recursive))
            .await
            .map_err(|e| CoreError::internal(format!("list_files worker failed: {}", e)))?;

        if entries.is_empty() {
            cb.push_tool_result(ToolResult::ok("No files found."));
            return Ok(());
        }
        let mut output = entries.join("\n");
        if truncated {
            output.push_str(&format!(
                "\n\n(File list truncated to {} entries. Use list_files on specific subdirectories to explore further.)",
                LIST_MAX_ENTRIES
            ));
        }
        cb.push_tool_result(ToolResult::ok(output));
        Ok(())
    }
}

/// Sorted relative entries under `root`, and whether the list was cut short.
fn list_dir(root: &Path, recursive: bool) -> (Vec<String>, bool) {
    let mut builder = ignore::WalkBuilder::new(root);
    builder
        .hidden(true)
        .git_ignore(true)
        .git_global(true)
        .git_exclude(true)
        .sort_by_file_path(|a, b| a.cmp(b));
    if !recursive {
        builder.max_depth(Some(1));
    }

    let mut entries = Vec::new();
    let mut truncated = false;
    for entry in builder.build().flatten() {
        let path: PathBuf = entry.path().to_path_buf();
        let Ok(relative) = path.strip_prefix(root) else {
            continue;
        };
        if relative.as_os_str().is_empty() {
            continue;
        }
        if entries.len() >= LIST_MAX_ENTRIES {
            truncated = true;
            break;
        }
        let mut display = relative.to_string_lossy().replace('\\', "/");
        if entry.file_type().map(|ft| ft.is_dir()).unwrap_or(false) {
            display.push('/');
        }
        entries.push(display);
    }
    (entries, truncated)
}
