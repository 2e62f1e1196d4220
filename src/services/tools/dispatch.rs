//! Tool Dispatch
//!
//! Routes one `ToolUse` to its tool and guarantees the agent hears back:
//! every complete invocation pushes exactly one result, whichever path it
//! takes. Partial invocations only render a preview and push nothing.
//!
//! Path order for a complete invocation:
//! 1. session aborted -> aborted result
//! 2. an earlier tool in the message was rejected -> skipped result
//! 3. unknown tool -> error listing the registered tools
//! 4. repetition limit -> blocked result + `mistake_limit_reached` ask
//! 5. missing required parameter -> structured missing-param result
//! 6. parameters do not parse -> inline error result
//! 7. execute; I/O failures go to the `ErrorHandler`

use std::sync::Arc;

use tokio::sync::mpsc;

use agent_gate_core::{AskKind, CoreError, GateEvent, ToolName, ToolUse};
use agent_gate_tools::responses::{
    aborted, missing_tool_parameter, no_output, repetition_blocked, skipped_after_rejection,
    tool_error, unknown_tool,
};
use agent_gate_tools::ToolResult;

use crate::services::orchestrator::{ApprovalChannel, ToolRepetitionDetector};

use super::approval::ToolCallbacks;
use super::session::ToolSession;
use super::trait_def::{ToolFailure, ToolRegistry};

// ============================================================================
// Result Sink
// ============================================================================

/// Where tool results re-enter the conversation.
pub trait ResultSink: Send {
    fn push_tool_result(&mut self, tool_name: &str, result: ToolResult);
}

/// Keeps every result in push order.
#[derive(Debug, Default)]
pub struct CollectingSink {
    pub results: Vec<(String, ToolResult)>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last(&self) -> Option<&ToolResult> {
        self.results.last().map(|(_, result)| result)
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

impl ResultSink for CollectingSink {
    fn push_tool_result(&mut self, tool_name: &str, result: ToolResult) {
        self.results.push((tool_name.to_string(), result));
    }
}

/// Forwards to an inner sink and announces each result to the host.
pub struct EventSink<S> {
    inner: S,
    event_tx: mpsc::Sender<GateEvent>,
}

impl<S: ResultSink> EventSink<S> {
    pub fn new(inner: S, event_tx: mpsc::Sender<GateEvent>) -> Self {
        Self { inner, event_tx }
    }

    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S: ResultSink> ResultSink for EventSink<S> {
    fn push_tool_result(&mut self, tool_name: &str, result: ToolResult) {
        let event = GateEvent::ToolResult {
            tool_id: result.tool_use_id.clone(),
            tool_name: tool_name.to_string(),
            success: result.success,
        };
        if let Err(e) = self.event_tx.try_send(event) {
            tracing::warn!("[dispatch] failed to emit tool result event: {}", e);
        }
        self.inner.push_tool_result(tool_name, result);
    }
}

// ============================================================================
// Error Handler
// ============================================================================

/// Surfaces genuine I/O failures from tool execution.
pub trait ErrorHandler: Send + Sync {
    /// Report the failure and return the result the agent should see.
    fn handle_error(&self, action: &str, error: &CoreError) -> ToolResult;
}

/// Logs the failure and reports it to the agent verbatim.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingErrorHandler;

impl ErrorHandler for LoggingErrorHandler {
    fn handle_error(&self, action: &str, error: &CoreError) -> ToolResult {
        tracing::error!("[dispatch] error {}: {}", action, error);
        tool_error(format!("Error {}: {}", action, error))
    }
}

// ============================================================================
// ToolDispatcher
// ============================================================================

/// Which path a dispatch took.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Partial invocation rendered; no result pushed
    Previewed,
    /// Not run because the session was aborted or a prior tool was rejected
    Skipped,
    /// Stopped by the repetition detector
    Blocked,
    /// Unknown tool, missing parameter or unparseable parameters
    Invalid,
    /// The tool ran to completion
    Executed,
    /// The tool's I/O failed
    Failed,
}

pub struct ToolDispatcher {
    registry: ToolRegistry,
    detector: ToolRepetitionDetector,
    error_handler: Arc<dyn ErrorHandler>,
}

impl ToolDispatcher {
    pub fn new(registry: ToolRegistry) -> Self {
        Self {
            registry,
            detector: ToolRepetitionDetector::default(),
            error_handler: Arc::new(LoggingErrorHandler),
        }
    }

    pub fn with_detector(mut self, detector: ToolRepetitionDetector) -> Self {
        self.detector = detector;
        self
    }

    pub fn with_error_handler(mut self, handler: Arc<dyn ErrorHandler>) -> Self {
        self.error_handler = handler;
        self
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Dispatch one invocation.
    pub async fn dispatch(
        &self,
        tool_use: &ToolUse,
        session: &mut ToolSession,
        channel: &dyn ApprovalChannel,
        sink: &mut dyn ResultSink,
    ) -> DispatchOutcome {
        let name = tool_use.name;

        if tool_use.partial {
            if let Some(tool) = self.registry.get(name) {
                let mut cb = ToolCallbacks::new(session, channel);
                if let Err(e) = tool.preview(tool_use, &mut cb).await {
                    tracing::debug!("[dispatch] preview of {} failed: {}", name, e);
                }
            }
            return DispatchOutcome::Previewed;
        }

        if session.is_cancelled() {
            self.push(sink, tool_use, aborted(name));
            return DispatchOutcome::Skipped;
        }

        if session.did_reject_tool {
            self.push(sink, tool_use, skipped_after_rejection(name));
            return DispatchOutcome::Skipped;
        }

        let Some(tool) = self.registry.get(name) else {
            session.consecutive_mistakes += 1;
            self.push(sink, tool_use, unknown_tool(name.as_str(), &self.registry.names()));
            return DispatchOutcome::Invalid;
        };

        let repetition = self.detector.check(&mut session.repetition, tool_use);
        if !repetition.allow {
            let guidance = repetition.guidance.unwrap_or_default();
            let mut result = repetition_blocked(&guidance);
            match channel.ask(AskKind::MistakeLimitReached, &guidance).await {
                Ok(reply) => {
                    if let Some(feedback) = reply.feedback() {
                        result = result.merge(ToolResult::err(format!(
                            "<feedback>\n{}\n</feedback>",
                            feedback
                        )));
                    }
                }
                Err(e) => tracing::warn!("[dispatch] mistake_limit_reached ask failed: {}", e),
            }
            self.push(sink, tool_use, result);
            return DispatchOutcome::Blocked;
        }

        if let Some(param) = tool.first_missing_param(&tool_use.invocation) {
            session.consecutive_mistakes += 1;
            tracing::debug!("[dispatch] {} missing parameter '{}'", name, param);
            self.push(sink, tool_use, missing_tool_parameter(name, param));
            return DispatchOutcome::Invalid;
        }

        let mut cb = ToolCallbacks::new(session, channel);
        let (outcome, fallback) = match tool.run(&tool_use.invocation, &mut cb).await {
            Ok(()) => {
                if !cb.mistake_recorded() {
                    cb.session.consecutive_mistakes = 0;
                }
                (DispatchOutcome::Executed, None)
            }
            Err(ToolFailure::InvalidParams(CoreError::MissingParameter { param, .. })) => {
                cb.record_mistake();
                (DispatchOutcome::Invalid, Some(missing_tool_parameter(name, &param)))
            }
            Err(ToolFailure::InvalidParams(e)) => {
                cb.record_mistake();
                (DispatchOutcome::Invalid, Some(tool_error(e.to_string())))
            }
            Err(ToolFailure::Execution(CoreError::Cancelled(reason))) => {
                tracing::info!("[dispatch] {} cancelled: {}", name, reason);
                (DispatchOutcome::Skipped, Some(aborted(name)))
            }
            Err(ToolFailure::Execution(e)) => {
                let action = format!("executing {}", name);
                (
                    DispatchOutcome::Failed,
                    Some(self.error_handler.handle_error(&action, &e)),
                )
            }
        };
        if let Some(result) = fallback {
            cb.push_tool_result(result);
        }
        let result = cb.take_result().unwrap_or_else(no_output);

        if name.is_mcp() {
            self.detector
                .record_response(&mut session.repetition, tool_use, &result.to_content());
        }
        self.push(sink, tool_use, result);
        outcome
    }

    /// Report a native call that could not be assembled (unknown name,
    /// malformed arguments).
    pub fn dispatch_invalid(
        &self,
        tool_id: &str,
        tool_name: &str,
        reason: &str,
        session: &mut ToolSession,
        sink: &mut dyn ResultSink,
    ) -> DispatchOutcome {
        session.consecutive_mistakes += 1;
        let result = if tool_name.parse::<ToolName>().is_ok() {
            tool_error(reason)
        } else {
            unknown_tool(tool_name, &self.registry.names())
        };
        tracing::debug!("[dispatch] invalid native call {} ({}): {}", tool_id, tool_name, reason);
        sink.push_tool_result(tool_name, result.with_tool_use_id(Some(tool_id.to_string())));
        DispatchOutcome::Invalid
    }

    fn push(&self, sink: &mut dyn ResultSink, tool_use: &ToolUse, result: ToolResult) {
        tracing::debug!(
            "[dispatch] {} -> {}",
            tool_use.name,
            if result.success { "ok" } else { "error" }
        );
        sink.push_tool_result(
            tool_use.name.as_str(),
            result.with_tool_use_id(tool_use.id.clone()),
        );
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use serde_json::json;
    use tempfile::TempDir;

    use agent_gate_core::AskReply;

    use super::*;
    use crate::services::orchestrator::ScriptedApprovals;
    use crate::services::tools::impls::{builtin_registry, test_helpers::make_test_session};

    fn dispatcher() -> ToolDispatcher {
        ToolDispatcher::new(builtin_registry())
    }

    fn write_file(root: &Path, name: &str, body: &str) {
        std::fs::write(root.join(name), body).unwrap();
    }

    #[tokio::test]
    async fn test_partial_never_executes() {
        let dir = TempDir::new().unwrap();
        let mut session = make_test_session(dir.path());
        let channel = ScriptedApprovals::approve_all();
        let mut sink = CollectingSink::new();

        let call = ToolUse::legacy(
            ToolName::WriteToFile,
            [("path", "new.txt"), ("content", "hello")],
        )
        .as_partial();
        let outcome = dispatcher()
            .dispatch(&call, &mut session, &channel, &mut sink)
            .await;

        assert_eq!(outcome, DispatchOutcome::Previewed);
        assert!(sink.is_empty());
        assert!(!dir.path().join("new.txt").exists());
        assert!(channel.asked().is_empty());
        assert_eq!(channel.partials().len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_tool_lists_available() {
        let dir = TempDir::new().unwrap();
        let mut session = make_test_session(dir.path());
        let channel = ScriptedApprovals::approve_all();
        let mut sink = CollectingSink::new();

        let dispatcher = ToolDispatcher::new(ToolRegistry::new());
        let call = ToolUse::legacy(ToolName::ReadFile, [("path", "a.txt")]);
        let outcome = dispatcher.dispatch(&call, &mut session, &channel, &mut sink).await;

        assert_eq!(outcome, DispatchOutcome::Invalid);
        assert_eq!(sink.len(), 1);
        assert!(sink.last().unwrap().to_content().contains("Unknown tool 'read_file'"));
        assert_eq!(session.consecutive_mistakes, 1);
    }

    #[tokio::test]
    async fn test_missing_param_counts_mistake() {
        let dir = TempDir::new().unwrap();
        let mut session = make_test_session(dir.path());
        let channel = ScriptedApprovals::approve_all();
        let mut sink = CollectingSink::new();

        let call = ToolUse::legacy(ToolName::ReadFile, Vec::<(String, String)>::new());
        let outcome = dispatcher()
            .dispatch(&call, &mut session, &channel, &mut sink)
            .await;

        assert_eq!(outcome, DispatchOutcome::Invalid);
        assert!(sink
            .last()
            .unwrap()
            .to_content()
            .contains("Missing value for required parameter 'path'"));
        assert_eq!(session.consecutive_mistakes, 1);
    }

    #[tokio::test]
    async fn test_parse_error_is_inline_result() {
        let dir = TempDir::new().unwrap();
        let mut session = make_test_session(dir.path());
        let channel = ScriptedApprovals::approve_all();
        let mut sink = CollectingSink::new();

        let call = ToolUse::legacy(
            ToolName::ReadFile,
            [("path", "a.txt"), ("start_line", "first")],
        );
        let outcome = dispatcher()
            .dispatch(&call, &mut session, &channel, &mut sink)
            .await;

        assert_eq!(outcome, DispatchOutcome::Invalid);
        assert_eq!(sink.len(), 1);
        assert!(sink.last().unwrap().to_content().contains("start_line"));
        assert!(channel.asked().is_empty());
    }

    #[tokio::test]
    async fn test_execute_success_resets_mistakes() {
        let dir = TempDir::new().unwrap();
        write_file(dir.path(), "a.txt", "alpha\nbeta\n");
        let mut session = make_test_session(dir.path());
        session.consecutive_mistakes = 2;
        let channel = ScriptedApprovals::approve_all();
        let mut sink = CollectingSink::new();

        let call = ToolUse::native(ToolName::ReadFile, json!({"path": "a.txt"})).with_id("call_1");
        let outcome = dispatcher()
            .dispatch(&call, &mut session, &channel, &mut sink)
            .await;

        assert_eq!(outcome, DispatchOutcome::Executed);
        let result = sink.last().unwrap();
        assert!(result.success);
        assert!(result.to_content().contains("1 | alpha"));
        assert_eq!(result.tool_use_id.as_deref(), Some("call_1"));
        assert_eq!(session.consecutive_mistakes, 0);
    }

    #[tokio::test]
    async fn test_io_failure_goes_to_error_handler() {
        let dir = TempDir::new().unwrap();
        let mut session = make_test_session(dir.path());
        let channel = ScriptedApprovals::approve_all();
        let mut sink = CollectingSink::new();

        let call = ToolUse::legacy(ToolName::ReadFile, [("path", "missing.txt")]);
        let outcome = dispatcher()
            .dispatch(&call, &mut session, &channel, &mut sink)
            .await;

        assert_eq!(outcome, DispatchOutcome::Failed);
        assert_eq!(sink.len(), 1);
        assert!(sink
            .last()
            .unwrap()
            .to_content()
            .contains("Error executing read_file"));
    }

    #[tokio::test]
    async fn test_rejection_skips_rest_of_message() {
        let dir = TempDir::new().unwrap();
        write_file(dir.path(), "a.txt", "alpha");
        let mut session = make_test_session(dir.path());
        let channel = ScriptedApprovals::reject_all();
        let mut sink = CollectingSink::new();
        let dispatcher = dispatcher();

        let first = ToolUse::legacy(ToolName::ReadFile, [("path", "a.txt")]);
        let second = ToolUse::legacy(ToolName::ListFiles, [("path", ".")]);
        dispatcher.dispatch(&first, &mut session, &channel, &mut sink).await;
        let outcome = dispatcher.dispatch(&second, &mut session, &channel, &mut sink).await;

        assert_eq!(outcome, DispatchOutcome::Skipped);
        assert_eq!(sink.len(), 2);
        assert!(sink.results[0].1.to_content().contains("denied"));
        assert!(sink.results[1].1.to_content().contains("Skipping tool [list_files]"));

        session.begin_message();
        dispatcher.dispatch(&second, &mut session, &channel, &mut sink).await;
        assert_eq!(sink.len(), 3);
    }

    #[tokio::test]
    async fn test_cancelled_session_aborts() {
        let dir = TempDir::new().unwrap();
        let mut session = make_test_session(dir.path());
        session.cancel();
        let channel = ScriptedApprovals::approve_all();
        let mut sink = CollectingSink::new();

        let call = ToolUse::legacy(ToolName::ListFiles, [("path", ".")]);
        let outcome = dispatcher()
            .dispatch(&call, &mut session, &channel, &mut sink)
            .await;
        assert_eq!(outcome, DispatchOutcome::Skipped);
        assert!(sink.last().unwrap().to_content().contains("aborted"));
    }

    #[tokio::test]
    async fn test_repetition_blocks_and_asks() {
        let dir = TempDir::new().unwrap();
        write_file(dir.path(), "a.txt", "alpha");
        let mut session = make_test_session(dir.path());
        let channel = ScriptedApprovals::new([], AskReply::yes());
        let mut sink = CollectingSink::new();
        let dispatcher = dispatcher().with_detector(ToolRepetitionDetector::new(2));

        let call = ToolUse::legacy(ToolName::ReadFile, [("path", "a.txt")]);
        for _ in 0..2 {
            assert_eq!(
                dispatcher.dispatch(&call, &mut session, &channel, &mut sink).await,
                DispatchOutcome::Executed
            );
        }
        let outcome = dispatcher.dispatch(&call, &mut session, &channel, &mut sink).await;

        assert_eq!(outcome, DispatchOutcome::Blocked);
        assert_eq!(sink.len(), 3);
        assert!(sink.last().unwrap().to_content().contains("stuck in a loop"));
        let asked = channel.asked();
        assert_eq!(asked.last().unwrap().0, AskKind::MistakeLimitReached);
    }

    #[test]
    fn test_invalid_native_call() {
        let dir = TempDir::new().unwrap();
        let mut session = make_test_session(dir.path());
        let mut sink = CollectingSink::new();

        let outcome = dispatcher().dispatch_invalid(
            "call_9",
            "delete_everything",
            "unknown tool",
            &mut session,
            &mut sink,
        );
        assert_eq!(outcome, DispatchOutcome::Invalid);
        let result = sink.last().unwrap();
        assert!(result.to_content().contains("Unknown tool 'delete_everything'"));
        assert_eq!(result.tool_use_id.as_deref(), Some("call_9"));
        assert_eq!(session.consecutive_mistakes, 1);
    }

    #[tokio::test]
    async fn test_event_sink_announces_results() {
        let (tx, mut rx) = mpsc::channel(4);
        let mut sink = EventSink::new(CollectingSink::new(), tx);
        sink.push_tool_result("read_file", ToolResult::ok("x").with_tool_use_id(Some("t1".into())));

        match rx.recv().await.unwrap() {
            GateEvent::ToolResult {
                tool_id,
                tool_name,
                success,
            } => {
                assert_eq!(tool_id.as_deref(), Some("t1"));
                assert_eq!(tool_name, "read_file");
                assert!(success);
            }
            other => panic!("unexpected event {:?}", other),
        }
        assert_eq!(sink.into_inner().len(), 1);
    }
}
