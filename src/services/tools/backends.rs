//! Tool I/O Backends
//!
//! The collaborators a tool needs to touch the outside world. Tools depend
//! only on these traits; the host plugs in its editor, terminal, MCP hub and
//! browser. `LocalFileSystem` and `LocalCommandRunner` are the plain
//! in-process implementations.

use std::path::Path;
use std::process::Stdio;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;

use agent_gate_core::{CoreError, CoreResult, TodoItem};

// ============================================================================
// Filesystem
// ============================================================================

#[async_trait]
pub trait FileSystem: Send + Sync {
    async fn read_to_string(&self, path: &Path) -> CoreResult<String>;

    /// Write `content`, creating missing parent directories.
    async fn write(&self, path: &Path, content: &str) -> CoreResult<()>;

    async fn exists(&self, path: &Path) -> bool;

    async fn is_dir(&self, path: &Path) -> bool;
}

/// `tokio::fs` on the local disk.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFileSystem;

#[async_trait]
impl FileSystem for LocalFileSystem {
    async fn read_to_string(&self, path: &Path) -> CoreResult<String> {
        Ok(tokio::fs::read_to_string(path).await?)
    }

    async fn write(&self, path: &Path, content: &str) -> CoreResult<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        tokio::fs::write(path, content).await?;
        Ok(())
    }

    async fn exists(&self, path: &Path) -> bool {
        tokio::fs::try_exists(path).await.unwrap_or(false)
    }

    async fn is_dir(&self, path: &Path) -> bool {
        tokio::fs::metadata(path)
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false)
    }
}

// ============================================================================
// Commands
// ============================================================================

/// Captured result of a finished command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// `None` when the process was killed by a signal
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run `command` through the shell in `cwd`.
    ///
    /// Returns `CoreError::Cancelled` if `cancel` fires first; the process is
    /// killed in that case.
    async fn run(
        &self,
        command: &str,
        cwd: &Path,
        cancel: &CancellationToken,
    ) -> CoreResult<CommandOutput>;
}

/// `tokio::process` with the platform shell.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalCommandRunner;

#[async_trait]
impl CommandRunner for LocalCommandRunner {
    async fn run(
        &self,
        command: &str,
        cwd: &Path,
        cancel: &CancellationToken,
    ) -> CoreResult<CommandOutput> {
        let mut cmd = if cfg!(windows) {
            let mut cmd = Command::new("cmd");
            cmd.arg("/C").arg(command);
            cmd
        } else {
            let mut cmd = Command::new("sh");
            cmd.arg("-c").arg(command);
            cmd
        };
        cmd.current_dir(cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let child = cmd.spawn()?;

        // Dropping the wait future drops the child, which kills it.
        let output = tokio::select! {
            output = child.wait_with_output() => output?,
            _ = cancel.cancelled() => {
                tracing::info!("[command] cancelled: {}", command);
                return Err(CoreError::cancelled(format!("Command cancelled: {}", command)));
            }
        };

        Ok(CommandOutput {
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

// ============================================================================
// MCP
// ============================================================================

/// Text and images returned by an MCP server.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct McpOutput {
    pub text: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<String>,
}

/// RPC access to connected MCP servers. Server lifecycle belongs to the host.
#[async_trait]
pub trait McpHub: Send + Sync {
    async fn call_tool(
        &self,
        server_name: &str,
        tool_name: &str,
        arguments: Option<Value>,
    ) -> CoreResult<McpOutput>;

    async fn read_resource(&self, server_name: &str, uri: &str) -> CoreResult<McpOutput>;
}

// ============================================================================
// Browser
// ============================================================================

/// One step in a remote-controlled browser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum BrowserAction {
    Launch { url: String },
    Click { coordinate: String },
    Hover { coordinate: String },
    Type { text: String },
    Resize { size: String },
    ScrollDown,
    ScrollUp,
    Close,
}

impl BrowserAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            BrowserAction::Launch { .. } => "launch",
            BrowserAction::Click { .. } => "click",
            BrowserAction::Hover { .. } => "hover",
            BrowserAction::Type { .. } => "type",
            BrowserAction::Resize { .. } => "resize",
            BrowserAction::ScrollDown => "scroll_down",
            BrowserAction::ScrollUp => "scroll_up",
            BrowserAction::Close => "close",
        }
    }
}

/// What the page looked like after an action.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrowserActionResult {
    /// Screenshot as a data URL
    pub screenshot: Option<String>,
    /// Console output captured during the action
    pub logs: String,
    pub current_url: Option<String>,
}

#[async_trait]
pub trait BrowserSession: Send + Sync {
    async fn perform(&self, action: &BrowserAction) -> CoreResult<BrowserActionResult>;
}

// ============================================================================
// Editor Diff View
// ============================================================================

/// Editor view showing a proposed file change before it is approved.
#[async_trait]
pub trait DiffPreview: Send + Sync {
    async fn open(&self, path: &Path, original: Option<&str>, proposed: &str) -> CoreResult<()>;

    /// Discard the proposed change and close the view.
    async fn revert(&self, path: &Path) -> CoreResult<()>;

    /// Close the view after the change was saved.
    async fn close(&self, path: &Path) -> CoreResult<()>;
}

// ============================================================================
// Sub-tasks
// ============================================================================

#[async_trait]
pub trait TaskSpawner: Send + Sync {
    /// Start a child task and return its id.
    async fn spawn(&self, mode: &str, message: &str, todos: &[TodoItem]) -> CoreResult<String>;
}

// ============================================================================
// ToolBackends
// ============================================================================

/// Everything a session's tools can reach.
///
/// The optional backends are host features; a tool whose backend is absent
/// reports that as a tool error.
#[derive(Clone)]
pub struct ToolBackends {
    pub fs: Arc<dyn FileSystem>,
    pub commands: Arc<dyn CommandRunner>,
    pub mcp: Option<Arc<dyn McpHub>>,
    pub browser: Option<Arc<dyn BrowserSession>>,
    pub diff: Option<Arc<dyn DiffPreview>>,
    pub tasks: Option<Arc<dyn TaskSpawner>>,
}

impl ToolBackends {
    /// Local disk and shell; no MCP, browser, diff view or sub-tasks.
    pub fn local() -> Self {
        Self {
            fs: Arc::new(LocalFileSystem),
            commands: Arc::new(LocalCommandRunner),
            mcp: None,
            browser: None,
            diff: None,
            tasks: None,
        }
    }

    pub fn with_commands(mut self, commands: Arc<dyn CommandRunner>) -> Self {
        self.commands = commands;
        self
    }

    pub fn with_mcp(mut self, mcp: Arc<dyn McpHub>) -> Self {
        self.mcp = Some(mcp);
        self
    }

    pub fn with_browser(mut self, browser: Arc<dyn BrowserSession>) -> Self {
        self.browser = Some(browser);
        self
    }

    pub fn with_diff_preview(mut self, diff: Arc<dyn DiffPreview>) -> Self {
        self.diff = Some(diff);
        self
    }

    pub fn with_task_spawner(mut self, tasks: Arc<dyn TaskSpawner>) -> Self {
        self.tasks = Some(tasks);
        self
    }
}

impl Default for ToolBackends {
    fn default() -> Self {
        Self::local()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_local_fs_write_creates_parents() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a/b/c.txt");
        let fs = LocalFileSystem;

        fs.write(&path, "hello").await.unwrap();
        assert!(fs.exists(&path).await);
        assert!(fs.is_dir(&dir.path().join("a/b")).await);
        assert_eq!(fs.read_to_string(&path).await.unwrap(), "hello");
    }

    #[tokio::test]
    async fn test_local_fs_missing_file_is_io_error() {
        let dir = TempDir::new().unwrap();
        let err = LocalFileSystem
            .read_to_string(&dir.path().join("nope.txt"))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Io(_)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_local_command_captures_output() {
        let dir = TempDir::new().unwrap();
        let output = LocalCommandRunner
            .run("echo out; echo err 1>&2; exit 3", dir.path(), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(output.exit_code, Some(3));
        assert_eq!(output.stdout.trim(), "out");
        assert_eq!(output.stderr.trim(), "err");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_local_command_cancelled() {
        let dir = TempDir::new().unwrap();
        let token = CancellationToken::new();
        token.cancel();
        let err = LocalCommandRunner
            .run("sleep 5", dir.path(), &token)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Cancelled(_)));
    }

    #[test]
    fn test_browser_action_wire_format() {
        let action: BrowserAction =
            serde_json::from_str(r#"{"action":"launch","url":"http://localhost:3000"}"#).unwrap();
        assert_eq!(
            action,
            BrowserAction::Launch {
                url: "http://localhost:3000".into()
            }
        );
        assert_eq!(BrowserAction::ScrollDown.as_str(), "scroll_down");
    }
}
