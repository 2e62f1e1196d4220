//! Dispatch Pipeline Integration Tests
//!
//! Assistant output goes in, tool results come out:
//! - Legacy XML messages parsed and dispatched block by block
//! - Native tool-call fragments assembled and dispatched
//! - The event-driven approval gate, answered by a host task or timing out
//! - Repetition blocking and the one-result-per-call guarantee

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tempfile::TempDir;
use tokio::sync::mpsc;

use agent_gate::models::settings::AutoApprovalSettings;
use agent_gate::services::orchestrator::{ApprovalGate, ScriptedApprovals, ToolRepetitionDetector};
use agent_gate::services::tools::impls::ReadFileTool;
use agent_gate::services::tools::{
    builtin_registry, CollectingSink, DispatchOutcome, ToolBackends, ToolDispatcher, ToolRegistry,
    ToolSession,
};
use agent_gate::storage::config::StaticSettings;
use agent_gate_core::{AskKind, AskReply, GateEvent, StreamEvent, ToolContext, ToolName, ToolUse};
use agent_gate_tools::{parse_assistant_message, NativeCallUpdate, NativeToolCallAssembler};

// ============================================================================
// Helpers
// ============================================================================

fn session(dir: &Path, settings: Option<AutoApprovalSettings>) -> ToolSession {
    ToolSession::new(
        ToolContext::new("integration", vec![dir.to_path_buf()]),
        Arc::new(StaticSettings(settings)),
        ToolBackends::local(),
    )
}

fn read_and_write_allowed() -> AutoApprovalSettings {
    AutoApprovalSettings {
        auto_approval_enabled: true,
        always_allow_read_only: true,
        always_allow_write: true,
        ..Default::default()
    }
}

// ============================================================================
// Legacy XML protocol
// ============================================================================

#[tokio::test]
async fn test_xml_message_end_to_end() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("input.txt"), "alpha\nbeta\n").unwrap();
    let mut session = session(dir.path(), Some(read_and_write_allowed()));
    let dispatcher = ToolDispatcher::new(builtin_registry());
    let channel = ScriptedApprovals::reject_all();
    let mut sink = CollectingSink::new();

    let message = "Let me look first.\n\
        <read_file>\n<path>input.txt</path>\n</read_file>\n\
        Now the page.\n\
        <write_to_file>\n<path>out/page.html</path>\n<content>\n<div><content>nested</content></div>\n</content>\n</write_to_file>";

    let mut outcomes = Vec::new();
    for block in parse_assistant_message(message) {
        if let Some(tool_use) = block.as_tool_use() {
            outcomes.push(dispatcher.dispatch(tool_use, &mut session, &channel, &mut sink).await);
        }
    }

    assert_eq!(outcomes, vec![DispatchOutcome::Executed, DispatchOutcome::Executed]);
    assert!(channel.asked().is_empty());
    assert!(sink.results[0].1.to_content().contains("1 | alpha"));
    assert_eq!(
        std::fs::read_to_string(dir.path().join("out/page.html")).unwrap(),
        "<div><content>nested</content></div>"
    );
}

#[tokio::test]
async fn test_streaming_xml_previews_before_executing() {
    let dir = TempDir::new().unwrap();
    let mut session = session(dir.path(), None);
    let dispatcher = ToolDispatcher::new(builtin_registry());
    let channel = ScriptedApprovals::approve_all();
    let mut sink = CollectingSink::new();

    let streamed = "<execute_command>\n<command>touch marker";
    let blocks = parse_assistant_message(streamed);
    let tool_use = blocks.iter().find_map(|b| b.as_tool_use()).unwrap();
    assert!(tool_use.partial);

    let outcome = dispatcher.dispatch(tool_use, &mut session, &channel, &mut sink).await;
    assert_eq!(outcome, DispatchOutcome::Previewed);
    assert!(sink.is_empty());
    assert!(channel.asked().is_empty());
    assert_eq!(channel.partials()[0].0, AskKind::Command);
    assert!(!dir.path().join("marker").exists());
}

#[tokio::test]
async fn test_rejection_skips_rest_of_message() {
    let dir = TempDir::new().unwrap();
    let mut session = session(dir.path(), None);
    let dispatcher = ToolDispatcher::new(builtin_registry());
    let channel = ScriptedApprovals::new([AskReply::no().with_text("not that file")], AskReply::yes());
    let mut sink = CollectingSink::new();

    let message = "<write_to_file><path>a.txt</path><content>a</content></write_to_file>\
        <write_to_file><path>b.txt</path><content>b</content></write_to_file>";
    session.begin_message();
    for block in parse_assistant_message(message) {
        if let Some(tool_use) = block.as_tool_use() {
            dispatcher.dispatch(tool_use, &mut session, &channel, &mut sink).await;
        }
    }

    assert_eq!(sink.len(), 2);
    assert!(sink.results[0].1.to_content().contains("not that file"));
    assert!(sink.results[1].1.to_content().contains("Skipping tool [write_to_file]"));
    assert_eq!(channel.asked().len(), 1);
    assert!(!dir.path().join("a.txt").exists());
    assert!(!dir.path().join("b.txt").exists());
}

// ============================================================================
// Native protocol
// ============================================================================

#[tokio::test]
async fn test_native_stream_end_to_end() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("notes.md"), "# Notes\nremember\n").unwrap();
    let mut session = session(dir.path(), Some(read_and_write_allowed()));
    let dispatcher = ToolDispatcher::new(builtin_registry());
    let channel = ScriptedApprovals::reject_all();
    let mut sink = CollectingSink::new();
    let mut assembler = NativeToolCallAssembler::new();

    let events = vec![
        StreamEvent::ToolStart {
            tool_id: "call_7".into(),
            tool_name: "read_file".into(),
        },
        StreamEvent::ToolDelta {
            tool_id: "call_7".into(),
            arguments_delta: "{\"path\": \"no".into(),
        },
        StreamEvent::ToolDelta {
            tool_id: "call_7".into(),
            arguments_delta: "tes.md\"}".into(),
        },
        StreamEvent::ToolComplete {
            tool_id: "call_7".into(),
            tool_name: "read_file".into(),
            arguments: String::new(),
        },
    ];

    let mut outcomes = Vec::new();
    for event in &events {
        match assembler.on_event(event) {
            Some(NativeCallUpdate::Partial(tool_use)) | Some(NativeCallUpdate::Ready(tool_use)) => {
                outcomes.push(dispatcher.dispatch(&tool_use, &mut session, &channel, &mut sink).await);
            }
            Some(NativeCallUpdate::Invalid {
                tool_id,
                tool_name,
                reason,
            }) => {
                outcomes.push(dispatcher.dispatch_invalid(&tool_id, &tool_name, &reason, &mut session, &mut sink));
            }
            None => {}
        }
    }

    assert_eq!(outcomes.last(), Some(&DispatchOutcome::Executed));
    assert!(outcomes[..outcomes.len() - 1]
        .iter()
        .all(|o| *o == DispatchOutcome::Previewed));
    assert_eq!(sink.len(), 1);
    let result = sink.last().unwrap();
    assert_eq!(result.tool_use_id.as_deref(), Some("call_7"));
    assert!(result.to_content().contains("2 | remember"));
}

#[tokio::test]
async fn test_native_malformed_arguments_reported() {
    let dir = TempDir::new().unwrap();
    let mut session = session(dir.path(), None);
    let dispatcher = ToolDispatcher::new(builtin_registry());
    let mut sink = CollectingSink::new();
    let mut assembler = NativeToolCallAssembler::new();

    let update = assembler.on_event(&StreamEvent::ToolComplete {
        tool_id: "call_9".into(),
        tool_name: "list_files".into(),
        arguments: "{\"path\": ".into(),
    });
    let Some(NativeCallUpdate::Invalid {
        tool_id,
        tool_name,
        reason,
    }) = update
    else {
        panic!("expected an invalid call, got {:?}", update);
    };

    let outcome = dispatcher.dispatch_invalid(&tool_id, &tool_name, &reason, &mut session, &mut sink);
    assert_eq!(outcome, DispatchOutcome::Invalid);
    assert_eq!(session.consecutive_mistakes, 1);
    assert!(!sink.last().unwrap().success);
}

// ============================================================================
// Approval gate
// ============================================================================

#[tokio::test]
async fn test_gate_answered_by_host() {
    let dir = TempDir::new().unwrap();
    let mut session = session(dir.path(), None);
    let dispatcher = ToolDispatcher::new(builtin_registry());
    let mut sink = CollectingSink::new();

    let gate = Arc::new(ApprovalGate::new());
    let (tx, mut rx) = mpsc::channel::<GateEvent>(16);
    gate.set_event_tx(tx).await;

    let host_gate = Arc::clone(&gate);
    let host = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            if let GateEvent::ApprovalRequest {
                request_id,
                kind,
                partial: false,
                ..
            } = event
            {
                let resolved = host_gate.resolve(&request_id, AskReply::yes()).await;
                return (kind, resolved);
            }
        }
        panic!("event channel closed before a request arrived");
    });

    let write = ToolUse::native(
        ToolName::WriteToFile,
        json!({"path": "hello.txt", "content": "hi\n"}),
    )
    .with_id("call_1");
    let outcome = dispatcher.dispatch(&write, &mut session, gate.as_ref(), &mut sink).await;

    let (kind, resolved) = host.await.unwrap();
    assert_eq!(kind, AskKind::Tool);
    assert!(resolved);
    assert_eq!(outcome, DispatchOutcome::Executed);
    assert_eq!(std::fs::read_to_string(dir.path().join("hello.txt")).unwrap(), "hi\n");
    assert_eq!(gate.pending_count().await, 0);
}

#[tokio::test]
async fn test_followup_times_out_to_first_suggestion() {
    let dir = TempDir::new().unwrap();
    let mut session = session(
        dir.path(),
        Some(AutoApprovalSettings {
            auto_approval_enabled: true,
            always_allow_followup_questions: true,
            followup_auto_approve_timeout_ms: 50,
            ..Default::default()
        }),
    );
    let dispatcher = ToolDispatcher::new(builtin_registry());
    let mut sink = CollectingSink::new();

    let gate = ApprovalGate::new();
    let (tx, mut rx) = mpsc::channel::<GateEvent>(16);
    gate.set_event_tx(tx).await;

    let question = ToolUse::legacy(
        ToolName::AskFollowupQuestion,
        [
            ("question", "Which package manager?"),
            ("follow_up", "<suggest>pnpm</suggest><suggest>npm</suggest>"),
        ],
    );
    let outcome = tokio::time::timeout(
        Duration::from_secs(5),
        dispatcher.dispatch(&question, &mut session, &gate, &mut sink),
    )
    .await
    .unwrap();

    assert_eq!(outcome, DispatchOutcome::Executed);
    assert_eq!(sink.last().unwrap().to_content(), "<answer>\npnpm\n</answer>");
    assert_eq!(gate.pending_count().await, 0);

    let mut saw_timeout = false;
    while let Ok(event) = rx.try_recv() {
        if matches!(event, GateEvent::ApprovalTimedOut { kind: AskKind::Followup, .. }) {
            saw_timeout = true;
        }
    }
    assert!(saw_timeout);
}

// ============================================================================
// Repetition and result guarantees
// ============================================================================

#[tokio::test]
async fn test_identical_calls_blocked_after_ceiling() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("a.txt"), "a\n").unwrap();
    let mut session = session(dir.path(), Some(read_and_write_allowed()));
    let dispatcher = ToolDispatcher::new(builtin_registry()).with_detector(ToolRepetitionDetector::new(3));
    let channel = ScriptedApprovals::approve_all();
    let mut sink = CollectingSink::new();

    let read = ToolUse::legacy(ToolName::ReadFile, [("path", "a.txt")]);
    for _ in 0..3 {
        let outcome = dispatcher.dispatch(&read, &mut session, &channel, &mut sink).await;
        assert_eq!(outcome, DispatchOutcome::Executed);
    }
    let outcome = dispatcher.dispatch(&read, &mut session, &channel, &mut sink).await;
    assert_eq!(outcome, DispatchOutcome::Blocked);
    assert_eq!(channel.asked()[0].0, AskKind::MistakeLimitReached);

    // The detector reset itself; a changed call goes through
    let other = ToolUse::legacy(ToolName::ReadFile, [("path", "a.txt"), ("end_line", "1")]);
    let outcome = dispatcher.dispatch(&other, &mut session, &channel, &mut sink).await;
    assert_eq!(outcome, DispatchOutcome::Executed);
    assert_eq!(sink.len(), 5);
}

#[tokio::test]
async fn test_every_complete_call_yields_one_result() {
    let dir = TempDir::new().unwrap();
    let mut session = session(dir.path(), None);
    let mut registry = ToolRegistry::new();
    registry.register(Arc::new(ReadFileTool));
    let dispatcher = ToolDispatcher::new(registry);
    let channel = ScriptedApprovals::reject_all();

    let calls = vec![
        ToolUse::legacy(ToolName::ListFiles, [("path", ".")]),
        ToolUse::legacy(ToolName::ReadFile, Vec::<(String, String)>::new()),
        ToolUse::legacy(ToolName::ReadFile, [("path", "missing.txt"), ("start_line", "x")]),
        ToolUse::native(ToolName::ReadFile, json!({"path": 3})),
        ToolUse::legacy(ToolName::ReadFile, [("path", "missing.txt")]),
    ];
    for call in &calls {
        let mut sink = CollectingSink::new();
        session.begin_message();
        dispatcher.dispatch(call, &mut session, &channel, &mut sink).await;
        assert_eq!(sink.len(), 1, "{:?} must yield exactly one result", call);
        assert!(!sink.last().unwrap().success);
    }
}
