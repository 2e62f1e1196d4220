//! Tool Callbacks
//!
//! What a running tool can do besides I/O: ask for approval, ask the human a
//! question, render a partial preview, push its result and record a mistake.
//! Every ask first goes through the decision engine with a fresh settings
//! snapshot; only `Ask` and `Timeout` decisions reach the human.

use std::time::Duration;

use agent_gate_core::{AskKind, AskReply, CoreResult};
use agent_gate_tools::responses::{
    command_denied_by_rule, tool_approved_with_feedback, tool_denied, tool_denied_with_feedback,
};
use agent_gate_tools::ToolResult;

use crate::services::approval::{decide, ApprovalDecision};
use crate::services::orchestrator::{ApprovalChannel, LimitCheck, LimitReachedPayload};

use super::session::ToolSession;

/// How an ask was settled.
#[derive(Debug)]
enum Verdict {
    AutoApproved,
    /// A deny rule matched
    Denied,
    /// The human (or a timeout fallback) answered
    Answered(AskReply),
}

/// Per-invocation handle passed to `ToolHandler::execute`.
///
/// Results pushed during one invocation are folded into a single
/// `ToolResult`, which the dispatcher hands to the result sink.
pub struct ToolCallbacks<'a> {
    pub session: &'a mut ToolSession,
    channel: &'a dyn ApprovalChannel,
    result: Option<ToolResult>,
    mistake_recorded: bool,
}

impl<'a> ToolCallbacks<'a> {
    pub fn new(session: &'a mut ToolSession, channel: &'a dyn ApprovalChannel) -> Self {
        Self {
            session,
            channel,
            result: None,
            mistake_recorded: false,
        }
    }

    /// Ask for permission to proceed.
    ///
    /// Returns `false` after pushing the denial result (with the human's
    /// feedback, if any) and marking the message as rejected. Approval
    /// feedback is pushed ahead of the tool's own result.
    pub async fn ask_approval(&mut self, kind: AskKind, payload: &str) -> CoreResult<bool> {
        match self.request(kind, payload).await? {
            Verdict::AutoApproved => Ok(true),
            Verdict::Denied => {
                tracing::info!("[approval] {} denied by rule", kind.as_str());
                let denied = if kind == AskKind::Command {
                    command_denied_by_rule(payload)
                } else {
                    tool_denied()
                };
                self.reject(denied);
                Ok(false)
            }
            Verdict::Answered(reply) if reply.is_approval() => {
                if let Some(feedback) = reply.feedback() {
                    self.push_tool_result(ToolResult::ok_with_images(
                        tool_approved_with_feedback(feedback),
                        reply.images.clone(),
                    ));
                }
                Ok(true)
            }
            Verdict::Answered(reply) => {
                let mut denied = match reply.feedback() {
                    Some(feedback) => tool_denied_with_feedback(feedback),
                    None => tool_denied(),
                };
                denied.images = reply.images;
                self.reject(denied);
                Ok(false)
            }
        }
    }

    /// Put a question to the human and return the answer as-is.
    ///
    /// Auto-approval answers "yes"; a deny rule answers "no".
    pub async fn ask_question(&mut self, kind: AskKind, payload: &str) -> CoreResult<AskReply> {
        Ok(match self.request(kind, payload).await? {
            Verdict::AutoApproved => AskReply::yes(),
            Verdict::Denied => AskReply::no(),
            Verdict::Answered(reply) => reply,
        })
    }

    /// Render a still-streaming request.
    pub async fn update_partial(&self, kind: AskKind, payload: &str) -> CoreResult<()> {
        self.channel.update_partial(kind, payload).await
    }

    /// Contribute to this invocation's result.
    pub fn push_tool_result(&mut self, result: ToolResult) {
        self.result = Some(match self.result.take() {
            Some(existing) => existing.merge(result),
            None => result,
        });
    }

    /// The agent got something wrong that it can fix on retry.
    pub fn record_mistake(&mut self) {
        self.session.consecutive_mistakes += 1;
        self.mistake_recorded = true;
    }

    pub fn has_result(&self) -> bool {
        self.result.is_some()
    }

    pub(crate) fn mistake_recorded(&self) -> bool {
        self.mistake_recorded
    }

    pub(crate) fn take_result(&mut self) -> Option<ToolResult> {
        self.result.take()
    }

    fn reject(&mut self, result: ToolResult) {
        self.push_tool_result(result);
        self.session.did_reject_tool = true;
    }

    async fn request(&mut self, kind: AskKind, payload: &str) -> CoreResult<Verdict> {
        let settings = self.session.settings();
        let decision = decide(
            settings.as_ref(),
            kind,
            Some(payload),
            &self.session.approval_context(),
        );

        match decision {
            ApprovalDecision::Approve => {
                if kind.is_non_blocking() {
                    return Ok(Verdict::AutoApproved);
                }
                if let Some(settings) = settings.as_ref() {
                    if let LimitCheck::Reached { limit } =
                        self.session.limiter.record_auto_approval(settings)
                    {
                        let reply = self
                            .channel
                            .ask(
                                AskKind::AutoApprovalMaxReqReached,
                                &LimitReachedPayload::requests(limit).to_json(),
                            )
                            .await?;
                        if !reply.is_approval() {
                            return Ok(Verdict::Answered(reply));
                        }
                        self.session.limiter.reset();
                    }
                }
                Ok(Verdict::AutoApproved)
            }
            ApprovalDecision::Deny => Ok(Verdict::Denied),
            ApprovalDecision::Ask => {
                let reply = self.channel.ask(kind, payload).await?;
                self.session.limiter.reset();
                Ok(Verdict::Answered(reply))
            }
            ApprovalDecision::Timeout {
                timeout_ms,
                fallback,
            } => {
                let reply = self
                    .channel
                    .ask_with_timeout(kind, payload, Duration::from_millis(timeout_ms), fallback)
                    .await?;
                Ok(Verdict::Answered(reply))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::sync::Arc;

    use agent_gate_core::ToolContext;

    use super::*;
    use crate::models::settings::AutoApprovalSettings;
    use crate::services::approval::{ToolAction, ToolApprovalPayload};
    use crate::services::orchestrator::ScriptedApprovals;
    use crate::services::tools::backends::ToolBackends;
    use crate::storage::config::StaticSettings;

    fn session_with(settings: Option<AutoApprovalSettings>) -> ToolSession {
        ToolSession::new(
            ToolContext::new("test", vec![PathBuf::from("/work")]),
            Arc::new(StaticSettings(settings)),
            ToolBackends::local(),
        )
    }

    fn read_payload() -> String {
        ToolApprovalPayload::new(ToolAction::ReadFile)
            .with_path("src/lib.rs")
            .to_json()
    }

    #[tokio::test]
    async fn test_auto_approved_without_asking() {
        let mut session = session_with(Some(AutoApprovalSettings {
            auto_approval_enabled: true,
            always_allow_read_only: true,
            ..Default::default()
        }));
        let channel = ScriptedApprovals::reject_all();
        let mut cb = ToolCallbacks::new(&mut session, &channel);

        assert!(cb.ask_approval(AskKind::Tool, &read_payload()).await.unwrap());
        assert!(!cb.has_result());
        assert!(channel.asked().is_empty());
        assert_eq!(session.limiter.count(), 1);
    }

    #[tokio::test]
    async fn test_rejection_pushes_denial_and_marks_session() {
        let mut session = session_with(None);
        let channel = ScriptedApprovals::new([AskReply::no().with_text("use the other file")], AskReply::yes());
        let mut cb = ToolCallbacks::new(&mut session, &channel);

        assert!(!cb.ask_approval(AskKind::Tool, &read_payload()).await.unwrap());
        let result = cb.take_result().unwrap();
        assert!(!result.success);
        assert!(result.to_content().contains("use the other file"));
        assert!(session.did_reject_tool);
    }

    #[tokio::test]
    async fn test_approval_feedback_is_pushed() {
        let mut session = session_with(None);
        let channel = ScriptedApprovals::new([AskReply::yes().with_text("go ahead")], AskReply::yes());
        let mut cb = ToolCallbacks::new(&mut session, &channel);

        assert!(cb.ask_approval(AskKind::Tool, &read_payload()).await.unwrap());
        cb.push_tool_result(ToolResult::ok("file body"));
        let content = cb.take_result().unwrap().to_content();
        assert!(content.starts_with("The user approved this operation"));
        assert!(content.ends_with("file body"));
    }

    #[tokio::test]
    async fn test_denied_command_uses_rule_wording() {
        let mut session = session_with(Some(AutoApprovalSettings {
            auto_approval_enabled: true,
            always_allow_execute: true,
            denied_commands: vec!["rm".into()],
            ..Default::default()
        }));
        let channel = ScriptedApprovals::approve_all();
        let mut cb = ToolCallbacks::new(&mut session, &channel);

        assert!(!cb.ask_approval(AskKind::Command, "rm -rf /").await.unwrap());
        let result = cb.take_result().unwrap();
        assert!(result.to_content().contains("denied command pattern"));
        assert!(channel.asked().is_empty());
    }

    #[tokio::test]
    async fn test_request_ceiling_asks_then_resets() {
        let mut session = session_with(Some(AutoApprovalSettings {
            auto_approval_enabled: true,
            always_allow_read_only: true,
            allowed_max_requests: Some(1),
            ..Default::default()
        }));
        let channel = ScriptedApprovals::approve_all();
        let mut cb = ToolCallbacks::new(&mut session, &channel);

        assert!(cb.ask_approval(AskKind::Tool, &read_payload()).await.unwrap());
        assert!(channel.asked().is_empty());

        assert!(cb.ask_approval(AskKind::Tool, &read_payload()).await.unwrap());
        let asked = channel.asked();
        assert_eq!(asked.len(), 1);
        assert_eq!(asked[0].0, AskKind::AutoApprovalMaxReqReached);
        assert_eq!(asked[0].1, r#"{"count":1,"type":"requests"}"#);
        assert_eq!(session.limiter.count(), 0);
    }

    #[tokio::test]
    async fn test_request_ceiling_rejected_stops_tool() {
        let mut session = session_with(Some(AutoApprovalSettings {
            auto_approval_enabled: true,
            always_allow_read_only: true,
            allowed_max_requests: Some(0),
            ..Default::default()
        }));
        let channel = ScriptedApprovals::reject_all();
        let mut cb = ToolCallbacks::new(&mut session, &channel);

        assert!(!cb.ask_approval(AskKind::Tool, &read_payload()).await.unwrap());
        assert!(session.did_reject_tool);
    }

    #[tokio::test]
    async fn test_question_answer_passes_through() {
        let mut session = session_with(None);
        let channel = ScriptedApprovals::new([AskReply::message("blue")], AskReply::yes());
        let mut cb = ToolCallbacks::new(&mut session, &channel);

        let reply = cb
            .ask_question(AskKind::Followup, r#"{"question":"Color?","suggest":[]}"#)
            .await
            .unwrap();
        assert_eq!(reply.feedback(), Some("blue"));
        assert!(!session.did_reject_tool);
    }

    #[test]
    fn test_results_merge_in_push_order() {
        let mut session = session_with(None);
        let channel = ScriptedApprovals::approve_all();
        let mut cb = ToolCallbacks::new(&mut session, &channel);
        cb.push_tool_result(ToolResult::ok("one"));
        cb.push_tool_result(ToolResult::ok("two"));
        cb.record_mistake();
        assert_eq!(cb.take_result().unwrap().to_content(), "one\n\ntwo");
        assert!(cb.mistake_recorded());
        assert_eq!(session.consecutive_mistakes, 1);
    }
}
