//! search_files Tool
//!
//! Regex search across a directory tree, optionally restricted to files
//! matching a glob. Respects .gitignore and skips binary and hidden files.

use std::path::Path;

use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;

use agent_gate_core::{AskKind, CoreError, CoreResult, ExecutionContext, LegacyParams, ToolName};
use agent_gate_tools::responses::tool_error;
use agent_gate_tools::ToolResult;

use crate::services::approval::ToolAction;
use crate::services::tools::approval::ToolCallbacks;
use crate::services::tools::trait_def::{
    legacy_optional, legacy_required, ToolDefinitionTrait, ToolHandler,
};

const MAX_SEARCH_RESULTS: usize = 300;
/// Longer lines are cut so minified files do not flood the transcript.
const MAX_LINE_CHARS: usize = 500;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SearchFilesParams {
    pub path: String,
    pub regex: String,
    #[serde(default)]
    pub file_pattern: Option<String>,
}

pub struct SearchFilesTool;

impl ToolDefinitionTrait for SearchFilesTool {
    fn name(&self) -> ToolName {
        ToolName::SearchFiles
    }

    fn description(&self) -> &str {
        "Search file contents under a directory with a regular expression."
    }

    fn required_params(&self) -> &'static [&'static str] {
        &["path", "regex"]
    }

    fn optional_params(&self) -> &'static [&'static str] {
        &["file_pattern"]
    }
}

#[async_trait]
impl ToolHandler for SearchFilesTool {
    type Params = SearchFilesParams;

    fn parse_legacy(&self, params: &LegacyParams) -> CoreResult<SearchFilesParams> {
        Ok(SearchFilesParams {
            path: legacy_required(params, self.name(), "path")?,
            regex: legacy_required(params, self.name(), "regex")?,
            file_pattern: legacy_optional(params, "file_pattern"),
        })
    }

    fn usage_summary(&self, params: &SearchFilesParams) -> String {
        match &params.file_pattern {
            Some(pattern) => format!("search /{}/ in {} ({})", params.regex, params.path, pattern),
            None => format!("search /{}/ in {}", params.regex, params.path),
        }
    }

    async fn execute(&self, params: SearchFilesParams, cb: &mut ToolCallbacks<'_>) -> CoreResult<()> {
        let regex = match Regex::new(&params.regex) {
            Ok(regex) => regex,
            Err(e) => {
                cb.record_mistake();
                cb.push_tool_result(tool_error(format!("Invalid regex '{}': {}", params.regex, e)));
                return Ok(());
            }
        };
        let file_pattern = match params.file_pattern.as_deref().map(glob::Pattern::new) {
            None => None,
            Some(Ok(pattern)) => Some(pattern),
            Some(Err(e)) => {
                cb.record_mistake();
                cb.push_tool_result(tool_error(format!("Invalid file_pattern: {}", e)));
                return Ok(());
            }
        };

        let abs = cb.session.resolve(&params.path);
        if !cb.session.backends.fs.exists(&abs).await {
            let shown = cb.session.display_path(&abs);
            cb.record_mistake();
            cb.push_tool_result(tool_error(format!("Path not found: {}", shown)));
            return Ok(());
        }

        let mut payload = cb.session.approval_payload(ToolAction::SearchFiles, &abs);
        payload.regex = Some(params.regex.clone());
        payload.file_pattern = params.file_pattern.clone();
        if !cb.ask_approval(AskKind::Tool, &payload.to_json()).await? {
            return Ok(());
        }

        let cwd = cb.session.ctx.cwd().to_path_buf();
        let output = tokio::task::spawn_blocking(move || {
            search(&abs, &cwd, &regex, file_pattern.as_ref())
        })
        .await
        .map_err(|e| CoreError::internal(format!("search_files worker failed: {}", e)))?;

        cb.push_tool_result(ToolResult::ok(output));
        Ok(())
    }
}

/// Grouped `# file` / `line | text` listing of every match.
fn search(root: &Path, cwd: &Path, regex: &Regex, file_pattern: Option<&glob::Pattern>) -> String {
    let walker = ignore::WalkBuilder::new(root)
        .hidden(true)
        .git_ignore(true)
        .git_global(true)
        .git_exclude(true)
        .sort_by_file_path(|a, b| a.cmp(b))
        .build();

    let mut sections = Vec::new();
    let mut count = 0usize;
    let mut truncated = false;

    'files: for entry in walker.flatten() {
        if !entry.file_type().map(|ft| ft.is_file()).unwrap_or(false) {
            continue;
        }
        let path = entry.path();
        if let Some(pattern) = file_pattern {
            let name_matches = path
                .file_name()
                .map(|name| pattern.matches(&name.to_string_lossy()))
                .unwrap_or(false);
            let relative = path.strip_prefix(root).unwrap_or(path);
            if !name_matches && !pattern.matches_path(relative) {
                continue;
            }
        }
        // Binary or unreadable files are skipped.
        let Ok(content) = std::fs::read_to_string(path) else {
            continue;
        };

        let mut hits = Vec::new();
        for (index, line) in content.lines().enumerate() {
            if !regex.is_match(line) {
                continue;
            }
            if count >= MAX_SEARCH_RESULTS {
                truncated = true;
                if !hits.is_empty() {
                    sections.push(section(path, cwd, &hits));
                }
                break 'files;
            }
            count += 1;
            hits.push(format!("{:>4} | {}", index + 1, clip(line.trim_end())));
        }
        if !hits.is_empty() {
            sections.push(section(path, cwd, &hits));
        }
    }

    if count == 0 {
        return "Found 0 results.".to_string();
    }
    let mut output = format!(
        "Found {} result{}.\n\n{}",
        count,
        if count == 1 { "" } else { "s" },
        sections.join("\n----\n\n")
    );
    if truncated {
        output.push_str(&format!(
            "\n\n(Showing the first {} results. Use a more specific search to narrow them down.)",
            MAX_SEARCH_RESULTS
        ));
    }
    output
}

fn section(path: &Path, cwd: &Path, hits: &[String]) -> String {
    let display = path
        .strip_prefix(cwd)
        .map(|rel| rel.to_string_lossy().replace('\\', "/"))
        .unwrap_or_else(|_| path.to_string_lossy().into_owned());
    format!("# {}\n{}\n", display, hits.join("\n"))
}

fn clip(line: &str) -> String {
    if line.chars().count() <= MAX_LINE_CHARS {
        line.to_string()
    } else {
        let cut: String = line.chars().take(MAX_LINE_CHARS).collect();
        format!("{}…", cut)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::super::test_helpers::{make_test_session, run_tool};
    use crate::services::orchestrator::ScriptedApprovals;
    use tempfile::TempDir;

    fn fixture() -> TempDir {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("src")).unwrap();
        std::fs::write(dir.path().join("src/lib.rs"), "fn alpha() {}\nfn beta() {}\n").unwrap();
        std::fs::write(dir.path().join("src/notes.txt"), "fn in text\n").unwrap();
        dir
    }

    #[test]
    fn test_search_groups_by_file() {
        let dir = fixture();
        let regex = Regex::new(r"fn \w+\(").unwrap();
        let output = search(dir.path(), dir.path(), &regex, None);
        assert!(output.starts_with("Found 2 results."));
        assert!(output.contains("# src/lib.rs"));
        assert!(output.contains("   1 | fn alpha() {}"));
    }

    #[test]
    fn test_search_file_pattern_filters() {
        let dir = fixture();
        let regex = Regex::new("fn").unwrap();
        let pattern = glob::Pattern::new("*.txt").unwrap();
        let output = search(dir.path(), dir.path(), &regex, Some(&pattern));
        assert!(output.starts_with("Found 1 result."));
        assert!(output.contains("# src/notes.txt"));
        assert!(!output.contains("lib.rs"));
    }

    #[test]
    fn test_no_matches() {
        let dir = fixture();
        let regex = Regex::new("zebra").unwrap();
        assert_eq!(search(dir.path(), dir.path(), &regex, None), "Found 0 results.");
    }

    #[tokio::test]
    async fn test_invalid_regex_is_reported_inline() {
        let dir = fixture();
        let mut session = make_test_session(dir.path());
        let channel = ScriptedApprovals::approve_all();
        let result = run_tool(
            &SearchFilesTool,
            SearchFilesParams {
                path: ".".into(),
                regex: "fn (".into(),
                file_pattern: None,
            },
            &mut session,
            &channel,
        )
        .await
        .unwrap();
        assert!(!result.success);
        assert!(result.to_content().contains("Invalid regex"));
        assert!(channel.asked().is_empty());
    }

    #[tokio::test]
    async fn test_search_payload_carries_regex() {
        let dir = fixture();
        let mut session = make_test_session(dir.path());
        let channel = ScriptedApprovals::approve_all();
        let result = run_tool(
            &SearchFilesTool,
            SearchFilesParams {
                path: "src".into(),
                regex: "beta".into(),
                file_pattern: Some("*.rs".into()),
            },
            &mut session,
            &channel,
        )
        .await
        .unwrap();
        assert!(result.to_content().contains("fn beta"));
        let payload: serde_json::Value = serde_json::from_str(&channel.asked()[0].1).unwrap();
        assert_eq!(payload["tool"], "searchFiles");
        assert_eq!(payload["regex"], "beta");
        assert_eq!(payload["filePattern"], "*.rs");
    }
}
