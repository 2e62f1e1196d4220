//! Tool Session
//!
//! Mutable state of one agent run as seen by tool dispatch. The session owns
//! the repetition counters, mistake counter and auto-approval ceiling so that
//! two runs never share them; `reset_run` clears them at a task boundary.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use agent_gate_core::{ExecutionContext, TodoItem, ToolContext};

use crate::models::mcp::McpServerInfo;
use crate::models::mode::{default_modes, ModeInfo};
use crate::models::settings::AutoApprovalSettings;
use crate::services::approval::{
    normalize_path, ApprovalContext, ProtectedPaths, ToolAction, ToolApprovalPayload, WorkspaceScope,
};
use crate::services::orchestrator::{AutoApprovalLimiter, RepetitionState};
use crate::storage::config::SettingsProvider;

use super::backends::ToolBackends;

/// Default mode slug for a fresh session.
pub const DEFAULT_MODE: &str = "code";

pub struct ToolSession {
    pub ctx: ToolContext,
    pub scope: WorkspaceScope,
    pub protected: ProtectedPaths,
    settings: Arc<dyn SettingsProvider>,
    pub backends: ToolBackends,

    pub todo_list: Vec<TodoItem>,
    pub mode: String,
    pub modes: Vec<ModeInfo>,
    pub mcp_servers: Vec<McpServerInfo>,

    pub repetition: RepetitionState,
    pub consecutive_mistakes: u32,
    pub limiter: AutoApprovalLimiter,
    /// Set when the human rejects a tool; later tools in the same message are skipped
    pub did_reject_tool: bool,
    /// Set once the human accepts an `attempt_completion`
    pub completed: bool,
    pub cancellation_token: CancellationToken,
}

impl ToolSession {
    /// Session over the context's workspace roots with default modes and
    /// protected-file patterns.
    pub fn new(
        ctx: ToolContext,
        settings: Arc<dyn SettingsProvider>,
        backends: ToolBackends,
    ) -> Self {
        let scope = WorkspaceScope::new(ctx.workspace_roots().iter().cloned());
        Self {
            ctx,
            scope,
            protected: ProtectedPaths::default(),
            settings,
            backends,
            todo_list: Vec::new(),
            mode: DEFAULT_MODE.to_string(),
            modes: default_modes(),
            mcp_servers: Vec::new(),
            repetition: RepetitionState::new(),
            consecutive_mistakes: 0,
            limiter: AutoApprovalLimiter::new(),
            did_reject_tool: false,
            completed: false,
            cancellation_token: CancellationToken::new(),
        }
    }

    pub fn with_todo_list(mut self, todos: Vec<TodoItem>) -> Self {
        self.todo_list = todos;
        self
    }

    pub fn with_mcp_servers(mut self, servers: Vec<McpServerInfo>) -> Self {
        self.mcp_servers = servers;
        self
    }

    pub fn with_mode(mut self, mode: impl Into<String>) -> Self {
        self.mode = mode.into();
        self
    }

    pub fn with_protected_paths(mut self, protected: ProtectedPaths) -> Self {
        self.protected = protected;
        self
    }

    /// Fresh settings snapshot for one decision.
    pub fn settings(&self) -> Option<AutoApprovalSettings> {
        self.settings.settings()
    }

    /// Context handed to the decision engine. Location flags travel in the
    /// payload itself.
    pub fn approval_context(&self) -> ApprovalContext<'_> {
        ApprovalContext {
            todo_list: &self.todo_list,
            mcp_servers: &self.mcp_servers,
            scope: Some(&self.scope),
            is_protected: false,
            is_outside_workspace: false,
        }
    }

    /// Absolute, `..`-folded target of a model-supplied path.
    pub fn resolve(&self, path: &str) -> PathBuf {
        normalize_path(&self.ctx.resolve(path))
    }

    pub fn display_path(&self, path: &Path) -> String {
        self.ctx.display_path(path)
    }

    pub fn is_outside_workspace(&self, path: &Path) -> bool {
        self.scope.is_outside_workspace(path)
    }

    /// Approval payload for an action on `abs`.
    ///
    /// Targets outside the workspace carry their absolute path: the engine
    /// matches it against allowed directories, and a cwd-relative form would
    /// resolve against the wrong base there.
    pub fn approval_payload(&self, action: ToolAction, abs: &Path) -> ToolApprovalPayload {
        let outside = self.is_outside_workspace(abs);
        let path = if outside {
            abs.to_string_lossy().into_owned()
        } else {
            self.display_path(abs)
        };
        ToolApprovalPayload::new(action)
            .with_path(path)
            .outside_workspace(outside)
    }

    pub fn is_protected(&self, path: &Path) -> bool {
        self.protected.is_protected(&self.scope, path)
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancellation_token.is_cancelled()
    }

    /// Abort the run: in-flight commands are killed and later tools are skipped.
    pub fn cancel(&self) {
        self.cancellation_token.cancel();
    }

    /// A new assistant message begins.
    pub fn begin_message(&mut self) {
        self.did_reject_tool = false;
    }

    /// A new task begins in this session.
    pub fn reset_run(&mut self) {
        self.repetition.reset();
        self.consecutive_mistakes = 0;
        self.limiter.reset();
        self.did_reject_tool = false;
        self.completed = false;
        if self.cancellation_token.is_cancelled() {
            self.cancellation_token = CancellationToken::new();
        }
    }
}
