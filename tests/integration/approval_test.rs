//! Decision Engine Integration Tests
//!
//! Properties of `decide` across ask kinds and settings, the todo override's
//! interaction with protected and outside-workspace targets, command and
//! location rules applied through dispatch, and settings that a host changes
//! while a session is running.

use std::path::PathBuf;
use std::sync::{Arc, RwLock};

use agent_gate::models::mcp::McpServerInfo;
use agent_gate::models::settings::{AutoApprovalSettings, SettingsUpdate};
use agent_gate::services::approval::{
    classify_command, decide, ApprovalContext, ApprovalDecision, CommandDecision, McpServerUse,
    ToolAction, ToolApprovalPayload, WorkspaceScope,
};
use agent_gate::services::orchestrator::ScriptedApprovals;
use agent_gate::services::tools::{builtin_registry, CollectingSink, ToolBackends, ToolDispatcher, ToolSession};
use agent_gate::storage::config::{ConfigService, StaticSettings};
use agent_gate_core::{AskKind, TodoItem, TodoStatus, ToolContext, ToolName, ToolUse};

// ============================================================================
// Helpers
// ============================================================================

fn everything_allowed() -> AutoApprovalSettings {
    AutoApprovalSettings {
        auto_approval_enabled: true,
        always_allow_read_only: true,
        always_allow_read_only_outside_workspace: true,
        always_allow_write: true,
        always_allow_write_outside_workspace: true,
        always_allow_write_protected: true,
        always_allow_browser: true,
        always_approve_resubmit: true,
        always_allow_mcp: true,
        always_allow_mode_switch: true,
        always_allow_subtasks: true,
        always_allow_execute: true,
        always_allow_followup_questions: true,
        always_allow_update_todo_list: true,
        always_allow_during_todo_execution: true,
        allowed_commands: vec!["*".into()],
        ..Default::default()
    }
}

fn write_payload(path: &str) -> String {
    ToolApprovalPayload::new(ToolAction::EditedExistingFile)
        .with_path(path)
        .to_json()
}

fn root() -> PathBuf {
    PathBuf::from("/work/project")
}

fn todo_ctx<'a>(todos: &'a [TodoItem], scope: &'a WorkspaceScope) -> ApprovalContext<'a> {
    ApprovalContext {
        todo_list: todos,
        scope: Some(scope),
        ..Default::default()
    }
}

// ============================================================================
// Kill switch
// ============================================================================

#[test]
fn test_disabled_settings_ask_for_every_blocking_kind() {
    let mut settings = everything_allowed();
    settings.auto_approval_enabled = false;
    let scope = WorkspaceScope::new([root()]);
    let ctx = ApprovalContext {
        scope: Some(&scope),
        ..Default::default()
    };

    let cases: Vec<(AskKind, String)> = vec![
        (AskKind::Command, "echo hi".into()),
        (AskKind::Tool, write_payload("src/lib.rs")),
        (AskKind::BrowserActionLaunch, "http://localhost".into()),
        (
            AskKind::UseMcpServer,
            McpServerUse::AccessMcpResource {
                server_name: "docs".into(),
                uri: "docs://a".into(),
            }
            .to_json(),
        ),
        (AskKind::Followup, r#"{"question":"?","suggest":[{"answer":"a"}]}"#.into()),
        (AskKind::ApiReqFailed, String::new()),
        (AskKind::CompletionResult, "done".into()),
    ];
    for (kind, payload) in cases {
        assert_eq!(
            decide(Some(&settings), kind, Some(&payload), &ctx),
            ApprovalDecision::Ask,
            "{:?} must ask when auto-approval is off",
            kind
        );
    }
    assert_eq!(
        decide(Some(&settings), AskKind::CommandOutput, None, &ctx),
        ApprovalDecision::Approve
    );
    assert_eq!(
        decide(None, AskKind::Command, Some("echo hi"), &ctx),
        ApprovalDecision::Ask
    );
}

// ============================================================================
// Command rules
// ============================================================================

#[tokio::test]
async fn test_command_rules_through_dispatch() {
    let dir = tempfile::TempDir::new().unwrap();
    std::fs::write(dir.path().join("victim.txt"), "keep me\n").unwrap();
    let settings = AutoApprovalSettings {
        auto_approval_enabled: true,
        always_allow_execute: true,
        allowed_commands: vec!["echo".into()],
        denied_commands: vec!["rm".into()],
        ..Default::default()
    };
    let mut session = ToolSession::new(
        ToolContext::new("commands", vec![dir.path().to_path_buf()]),
        Arc::new(StaticSettings::new(settings)),
        ToolBackends::local(),
    );
    let dispatcher = ToolDispatcher::new(builtin_registry());
    let channel = ScriptedApprovals::reject_all();
    let mut sink = CollectingSink::new();

    let echo = ToolUse::legacy(ToolName::ExecuteCommand, [("command", "echo hello")]);
    dispatcher.dispatch(&echo, &mut session, &channel, &mut sink).await;
    assert!(sink.last().unwrap().to_content().contains("hello"));

    for command in ["rm victim.txt", "echo ok && rm victim.txt"] {
        session.begin_message();
        let call = ToolUse::legacy(ToolName::ExecuteCommand, [("command", command)]);
        dispatcher.dispatch(&call, &mut session, &channel, &mut sink).await;
        assert!(sink
            .last()
            .unwrap()
            .to_content()
            .contains("matches a denied command pattern"));
    }
    assert!(channel.asked().is_empty());
    assert!(dir.path().join("victim.txt").exists());
}

#[test]
fn test_deny_precedence_over_allow() {
    let allowed = vec!["git".to_string(), "*".to_string()];
    let denied = vec!["git push".to_string()];
    assert_eq!(
        classify_command("git push origin main", &allowed, &denied),
        CommandDecision::AutoDeny
    );
    assert_eq!(
        classify_command("git status && git push", &allowed, &denied),
        CommandDecision::AutoDeny
    );
    assert_eq!(classify_command("git status", &[], &[]), CommandDecision::Ask);
}

// ============================================================================
// Tool and MCP rules
// ============================================================================

#[test]
fn test_protected_write_asks() {
    let scope = WorkspaceScope::new([root()]);
    let ctx = ApprovalContext {
        scope: Some(&scope),
        ..Default::default()
    };
    let settings = AutoApprovalSettings {
        auto_approval_enabled: true,
        always_allow_write: true,
        always_allow_write_protected: false,
        ..Default::default()
    };
    let payload = ToolApprovalPayload::new(ToolAction::EditedExistingFile)
        .with_path(".roorules")
        .protected(true)
        .to_json();
    assert_eq!(
        decide(Some(&settings), AskKind::Tool, Some(&payload), &ctx),
        ApprovalDecision::Ask
    );
}

#[test]
fn test_mcp_default_allow_and_explicit_block() {
    let servers = vec![McpServerInfo::new("github")
        .with_tool("list_issues", None)
        .with_tool("delete_repo", Some(false))];
    let ctx = ApprovalContext {
        mcp_servers: &servers,
        ..Default::default()
    };
    let settings = AutoApprovalSettings {
        auto_approval_enabled: true,
        always_allow_mcp: true,
        ..Default::default()
    };
    let call = |tool: &str| {
        McpServerUse::UseMcpTool {
            server_name: "github".into(),
            tool_name: tool.into(),
            arguments: None,
        }
        .to_json()
    };
    assert_eq!(
        decide(Some(&settings), AskKind::UseMcpServer, Some(&call("list_issues")), &ctx),
        ApprovalDecision::Approve
    );
    assert_eq!(
        decide(Some(&settings), AskKind::UseMcpServer, Some(&call("delete_repo")), &ctx),
        ApprovalDecision::Ask
    );
}

// ============================================================================
// Todo-execution override
// ============================================================================

#[test]
fn test_todo_override_and_its_limits() {
    let scope = WorkspaceScope::new([root()]);
    let settings = AutoApprovalSettings {
        auto_approval_enabled: true,
        always_allow_write: false,
        always_allow_during_todo_execution: true,
        ..Default::default()
    };
    let active = vec![
        TodoItem::new("1", "design", TodoStatus::Completed),
        TodoItem::new("2", "implement", TodoStatus::InProgress),
    ];
    let finished = vec![TodoItem::new("1", "design", TodoStatus::Completed)];

    let inside = write_payload("src/lib.rs");
    assert_eq!(
        decide(Some(&settings), AskKind::Tool, Some(&inside), &todo_ctx(&active, &scope)),
        ApprovalDecision::Approve
    );
    assert_eq!(
        decide(Some(&settings), AskKind::Tool, Some(&inside), &todo_ctx(&finished, &scope)),
        ApprovalDecision::Ask
    );

    let protected = ToolApprovalPayload::new(ToolAction::EditedExistingFile)
        .with_path("AGENTS.md")
        .protected(true)
        .to_json();
    assert_eq!(
        decide(Some(&settings), AskKind::Tool, Some(&protected), &todo_ctx(&active, &scope)),
        ApprovalDecision::Ask
    );

    let outside = ToolApprovalPayload::new(ToolAction::EditedExistingFile)
        .with_path("/etc/hosts")
        .outside_workspace(true)
        .to_json();
    assert_eq!(
        decide(Some(&settings), AskKind::Tool, Some(&outside), &todo_ctx(&active, &scope)),
        ApprovalDecision::Ask
    );

    // Context flags count even when the payload omits them
    let flagged = ApprovalContext {
        is_protected: true,
        ..todo_ctx(&active, &scope)
    };
    assert_eq!(
        decide(Some(&settings), AskKind::Tool, Some(&inside), &flagged),
        ApprovalDecision::Ask
    );
}

// ============================================================================
// Path scope
// ============================================================================

#[test]
fn test_workspace_scope_multi_root() {
    let scope = WorkspaceScope::new([PathBuf::from("/work/a"), PathBuf::from("/work/b")]);
    assert!(!scope.is_outside_workspace("/work/a"));
    assert!(!scope.is_outside_workspace("/work/b/src/main.rs"));
    assert!(scope.is_outside_workspace("/work/c"));
    assert!(scope.is_outside_workspace("/work/a/../c/file"));
    assert!(WorkspaceScope::new(Vec::<PathBuf>::new()).is_outside_workspace("/work/a"));
}

#[tokio::test]
async fn test_outside_read_judged_by_real_target() {
    let dir = tempfile::TempDir::new().unwrap();
    let base = dir.path();
    std::fs::create_dir_all(base.join("outside")).unwrap();
    std::fs::write(base.join("outside/notes.txt"), "shared\n").unwrap();

    let session_allowing = |allowed: PathBuf| {
        let settings = AutoApprovalSettings {
            auto_approval_enabled: true,
            always_allow_read_only: true,
            allowed_read_directories: vec![allowed.to_string_lossy().into_owned()],
            ..Default::default()
        };
        // cwd lives in the second root
        let ctx = ToolContext::new("roots", vec![base.join("p/q/r"), base.join("a")])
            .with_cwd(base.join("a/b"));
        ToolSession::new(ctx, Arc::new(StaticSettings::new(settings)), ToolBackends::local())
    };
    let dispatcher = ToolDispatcher::new(builtin_registry());
    let read = ToolUse::legacy(ToolName::ReadFile, [("path", "../../outside/notes.txt")]);

    let mut session = session_allowing(base.join("outside"));
    let channel = ScriptedApprovals::reject_all();
    let mut sink = CollectingSink::new();
    dispatcher.dispatch(&read, &mut session, &channel, &mut sink).await;
    assert!(channel.asked().is_empty());
    assert!(sink.last().unwrap().to_content().contains("1 | shared"));

    let mut session = session_allowing(base.join("p/outside"));
    let channel = ScriptedApprovals::reject_all();
    let mut sink = CollectingSink::new();
    dispatcher.dispatch(&read, &mut session, &channel, &mut sink).await;
    assert_eq!(channel.asked().len(), 1);
    assert!(channel.asked()[0].1.contains("outside/notes.txt"));
    assert!(!sink.last().unwrap().success);
}

// ============================================================================
// Live settings
// ============================================================================

#[tokio::test]
async fn test_settings_changes_apply_to_the_next_ask() {
    let dir = tempfile::TempDir::new().unwrap();
    std::fs::write(dir.path().join("notes.txt"), "hello\n").unwrap();

    let config = ConfigService::open(dir.path().join("config/auto-approval.json")).unwrap();
    assert!(config.path().exists());
    let provider = Arc::new(RwLock::new(config));

    let mut session = ToolSession::new(
        ToolContext::new("live", vec![dir.path().to_path_buf()]),
        provider.clone(),
        ToolBackends::local(),
    );
    let dispatcher = ToolDispatcher::new(builtin_registry());
    let channel = ScriptedApprovals::approve_all();
    let mut sink = CollectingSink::new();
    let read = ToolUse::legacy(ToolName::ReadFile, [("path", "notes.txt")]);

    dispatcher.dispatch(&read, &mut session, &channel, &mut sink).await;
    assert_eq!(channel.asked().len(), 1);

    provider
        .write()
        .unwrap()
        .update_settings(SettingsUpdate {
            auto_approval_enabled: Some(true),
            always_allow_read_only: Some(true),
            ..Default::default()
        })
        .unwrap();

    let other = ToolUse::legacy(ToolName::ReadFile, [("path", "notes.txt"), ("start_line", "1")]);
    dispatcher.dispatch(&other, &mut session, &channel, &mut sink).await;
    assert_eq!(channel.asked().len(), 1, "second read should be auto-approved");
    assert_eq!(sink.len(), 2);
    assert!(sink.last().unwrap().success);
}
