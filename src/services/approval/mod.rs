//! Auto-Approval Decision Engine
//!
//! `decide` maps (settings snapshot, ask kind, payload, context flags) to one
//! of approve / deny / ask / timeout. It is a pure function: it never runs
//! the action, never mutates its inputs, and never fails. Anything it cannot
//! understand becomes `Ask`.
//!
//! ## Submodules
//! - `commands` - shell command allow / deny matching
//! - `path_scope` - workspace membership, allowed directories, protected files
//! - `payload` - the JSON documents attached to approval requests

pub mod commands;
pub mod path_scope;
pub mod payload;

use serde::{Deserialize, Serialize};

use agent_gate_core::{has_open_items, AskKind, AskReply, TodoItem};

use crate::models::mcp::{find_server, McpServerInfo};
use crate::models::settings::AutoApprovalSettings;

pub use commands::{classify_command, split_compound_command, CommandDecision};
pub use path_scope::{is_in_allowed_directories, normalize_path, ProtectedPaths, WorkspaceScope};
pub use payload::{
    FollowupPayload, FollowupSuggestion, McpServerUse, ToolAction, ToolApprovalPayload,
};

/// Outcome of one auto-approval decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum ApprovalDecision {
    Approve,
    Deny,
    Ask,
    /// Ask, but answer with `fallback` if the human is silent for `timeout_ms`
    Timeout { timeout_ms: u64, fallback: AskReply },
}

impl ApprovalDecision {
    pub fn is_approve(&self) -> bool {
        matches!(self, ApprovalDecision::Approve)
    }

    /// The reply to use when a timeout elapses.
    pub fn fallback(&self) -> Option<&AskReply> {
        match self {
            ApprovalDecision::Timeout { fallback, .. } => Some(fallback),
            _ => None,
        }
    }
}

/// Session facts the decision depends on besides the settings.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApprovalContext<'a> {
    /// Current todo list; open items enable the todo-execution override
    pub todo_list: &'a [TodoItem],
    /// Known MCP servers, for per-tool always-allow overrides
    pub mcp_servers: &'a [McpServerInfo],
    /// Workspace roots used to resolve payload paths and relative patterns
    pub scope: Option<&'a WorkspaceScope>,
    /// Target is protected, as determined by the caller
    pub is_protected: bool,
    /// Target is outside the workspace, as determined by the caller
    pub is_outside_workspace: bool,
}

/// Decide whether an ask can be answered without the human.
pub fn decide(
    settings: Option<&AutoApprovalSettings>,
    kind: AskKind,
    payload: Option<&str>,
    ctx: &ApprovalContext<'_>,
) -> ApprovalDecision {
    if kind.is_non_blocking() {
        return ApprovalDecision::Approve;
    }

    let Some(settings) = settings.filter(|s| s.auto_approval_enabled) else {
        return ApprovalDecision::Ask;
    };

    let decision = match kind {
        AskKind::Followup => decide_followup(settings, payload),
        AskKind::BrowserActionLaunch => gate(settings.always_allow_browser),
        AskKind::UseMcpServer => decide_mcp(settings, payload, ctx),
        AskKind::Command => decide_command(settings, payload),
        AskKind::ApiReqFailed => gate(settings.always_approve_resubmit),
        AskKind::Tool => decide_tool(settings, payload, ctx),
        _ => ApprovalDecision::Ask,
    };

    tracing::debug!("[auto-approval] {} => {:?}", kind.as_str(), decision);
    decision
}

fn gate(flag: bool) -> ApprovalDecision {
    if flag {
        ApprovalDecision::Approve
    } else {
        ApprovalDecision::Ask
    }
}

fn decide_followup(settings: &AutoApprovalSettings, payload: Option<&str>) -> ApprovalDecision {
    if !settings.always_allow_followup_questions {
        return ApprovalDecision::Ask;
    }
    let Some(followup) = payload.and_then(|p| serde_json::from_str::<FollowupPayload>(p).ok())
    else {
        return ApprovalDecision::Ask;
    };
    match followup.suggest.first() {
        Some(first) if settings.followup_auto_approve_timeout_ms > 0 => ApprovalDecision::Timeout {
            timeout_ms: settings.followup_auto_approve_timeout_ms,
            fallback: AskReply::message(first.answer.clone()),
        },
        _ => ApprovalDecision::Ask,
    }
}

fn decide_mcp(
    settings: &AutoApprovalSettings,
    payload: Option<&str>,
    ctx: &ApprovalContext<'_>,
) -> ApprovalDecision {
    let Some(server_use) = payload.and_then(|p| serde_json::from_str::<McpServerUse>(p).ok())
    else {
        return ApprovalDecision::Ask;
    };
    if !settings.always_allow_mcp {
        return ApprovalDecision::Ask;
    }
    match server_use {
        McpServerUse::UseMcpTool {
            server_name,
            tool_name,
            ..
        } => {
            let explicitly_blocked = find_server(ctx.mcp_servers, &server_name)
                .and_then(|server| server.find_tool(&tool_name))
                .map(|tool| tool.always_allow == Some(false))
                .unwrap_or(false);
            gate(!explicitly_blocked)
        }
        McpServerUse::AccessMcpResource { .. } => ApprovalDecision::Approve,
    }
}

fn decide_command(settings: &AutoApprovalSettings, payload: Option<&str>) -> ApprovalDecision {
    if !settings.always_allow_execute {
        return ApprovalDecision::Ask;
    }
    let Some(command) = payload.filter(|p| !p.trim().is_empty()) else {
        return ApprovalDecision::Ask;
    };
    match classify_command(command, &settings.allowed_commands, &settings.denied_commands) {
        CommandDecision::AutoApprove => ApprovalDecision::Approve,
        CommandDecision::AutoDeny => ApprovalDecision::Deny,
        CommandDecision::Ask => ApprovalDecision::Ask,
    }
}

fn decide_tool(
    settings: &AutoApprovalSettings,
    payload: Option<&str>,
    ctx: &ApprovalContext<'_>,
) -> ApprovalDecision {
    let Some(tool) = payload.and_then(|p| serde_json::from_str::<ToolApprovalPayload>(p).ok())
    else {
        return ApprovalDecision::Ask;
    };

    match tool.tool {
        ToolAction::UpdateTodoList => return gate(settings.always_allow_update_todo_list),
        ToolAction::SwitchMode => return gate(settings.always_allow_mode_switch),
        ToolAction::NewTask | ToolAction::FinishTask => return gate(settings.always_allow_subtasks),
        ToolAction::FetchInstructions => {
            return match tool.content.as_deref() {
                Some("create_mode") => gate(settings.always_allow_mode_switch),
                Some("create_mcp_server") => gate(settings.always_allow_mcp),
                _ => ApprovalDecision::Ask,
            };
        }
        _ => {}
    }

    if !tool.tool.is_read_only() && !tool.tool.is_write() {
        return ApprovalDecision::Ask;
    }

    let is_protected = tool.is_protected || ctx.is_protected;
    let is_outside = tool.is_outside_workspace || ctx.is_outside_workspace;

    // Active checklist: progress without per-step confirmation, except for
    // protected files and paths outside the workspace.
    if settings.always_allow_during_todo_execution
        && has_open_items(ctx.todo_list)
        && !is_protected
        && !is_outside
    {
        return ApprovalDecision::Approve;
    }

    if tool.tool.is_read_only() {
        if !settings.always_allow_read_only {
            return ApprovalDecision::Ask;
        }
        return decide_location(
            is_outside,
            settings.always_allow_read_only_outside_workspace,
            &settings.allowed_read_directories,
            tool.path.as_deref(),
            ctx,
        );
    }

    if !settings.always_allow_write {
        return ApprovalDecision::Ask;
    }
    if is_protected && !settings.always_allow_write_protected {
        return ApprovalDecision::Ask;
    }
    decide_location(
        is_outside,
        settings.always_allow_write_outside_workspace,
        &settings.allowed_write_directories,
        tool.path.as_deref(),
        ctx,
    )
}

fn decide_location(
    is_outside: bool,
    outside_override: bool,
    allowed_directories: &[String],
    path: Option<&str>,
    ctx: &ApprovalContext<'_>,
) -> ApprovalDecision {
    if !is_outside || outside_override {
        return ApprovalDecision::Approve;
    }
    let in_allowed = path
        .map(|path| {
            let fallback = WorkspaceScope::default();
            ctx.scope
                .unwrap_or(&fallback)
                .is_in_allowed_directories(path, allowed_directories)
        })
        .unwrap_or(false);
    gate(in_allowed)
}
