//! Stream Event Types
//!
//! Provider-agnostic fragments the LLM stream yields (`StreamEvent`), and the
//! events the core emits towards the host UI (`GateEvent`). Provider adapters
//! live outside this workspace; they only need to produce `StreamEvent`s.

use serde::{Deserialize, Serialize};

use crate::ask::AskKind;

/// Inbound fragment from a streaming LLM response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    /// Text content delta from the model (may contain legacy XML tool calls)
    TextDelta { content: String },

    /// Start of a native tool call
    ToolStart { tool_id: String, tool_name: String },

    /// Argument JSON fragment for a native tool call
    ToolDelta {
        tool_id: String,
        arguments_delta: String,
    },

    /// Native tool call complete with accumulated arguments
    ToolComplete {
        tool_id: String,
        tool_name: String,
        /// Complete JSON string of tool arguments
        arguments: String,
    },

    /// Error during streaming
    Error {
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        code: Option<String>,
    },

    /// Stream complete
    Complete {
        #[serde(skip_serializing_if = "Option::is_none")]
        stop_reason: Option<String>,
    },
}

/// Outbound event from the core to the host.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GateEvent {
    /// The human must answer (or a partial preview is being rendered)
    ApprovalRequest {
        request_id: String,
        kind: AskKind,
        /// JSON (or raw command text) describing the request
        payload: String,
        partial: bool,
    },

    /// A bounded approval wait elapsed and the fallback reply was used
    ApprovalTimedOut { request_id: String, kind: AskKind },

    /// A tool finished and its result entered the transcript
    ToolResult {
        #[serde(skip_serializing_if = "Option::is_none")]
        tool_id: Option<String>,
        tool_name: String,
        success: bool,
    },
}
