//! Human Approval Vocabulary
//!
//! The kinds of questions the core can put to the human, and the shape of the
//! reply that comes back over the approval channel.

use serde::{Deserialize, Serialize};

/// What the agent is asking the human about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AskKind {
    Followup,
    Command,
    CommandOutput,
    CompletionResult,
    Tool,
    ApiReqFailed,
    ResumeTask,
    ResumeCompletedTask,
    MistakeLimitReached,
    BrowserActionLaunch,
    UseMcpServer,
    AutoApprovalMaxReqReached,
}

impl AskKind {
    /// Observational asks that never block on the human.
    pub fn is_non_blocking(&self) -> bool {
        matches!(self, AskKind::CommandOutput)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AskKind::Followup => "followup",
            AskKind::Command => "command",
            AskKind::CommandOutput => "command_output",
            AskKind::CompletionResult => "completion_result",
            AskKind::Tool => "tool",
            AskKind::ApiReqFailed => "api_req_failed",
            AskKind::ResumeTask => "resume_task",
            AskKind::ResumeCompletedTask => "resume_completed_task",
            AskKind::MistakeLimitReached => "mistake_limit_reached",
            AskKind::BrowserActionLaunch => "browser_action_launch",
            AskKind::UseMcpServer => "use_mcp_server",
            AskKind::AutoApprovalMaxReqReached => "auto_approval_max_req_reached",
        }
    }
}

/// Which control the human used to answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AskResponse {
    YesButtonClicked,
    NoButtonClicked,
    MessageResponse,
}

/// The human's answer to an ask.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AskReply {
    pub response: AskResponse,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<String>,
}

impl AskReply {
    pub fn yes() -> Self {
        Self {
            response: AskResponse::YesButtonClicked,
            text: None,
            images: Vec::new(),
        }
    }

    pub fn no() -> Self {
        Self {
            response: AskResponse::NoButtonClicked,
            text: None,
            images: Vec::new(),
        }
    }

    pub fn message(text: impl Into<String>) -> Self {
        Self {
            response: AskResponse::MessageResponse,
            text: Some(text.into()),
            images: Vec::new(),
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_images(mut self, images: Vec<String>) -> Self {
        self.images = images;
        self
    }

    pub fn is_approval(&self) -> bool {
        self.response == AskResponse::YesButtonClicked
    }

    /// Non-empty feedback text attached to the reply, if any.
    pub fn feedback(&self) -> Option<&str> {
        self.text.as_deref().map(str::trim).filter(|t| !t.is_empty())
    }
}
