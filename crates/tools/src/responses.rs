//! Tool Result Messages
//!
//! Canonical wording for the results the core pushes back to the agent when
//! a tool is denied, malformed, unknown, or blocked. Keeping the wording in
//! one place keeps the agent's recovery prompts consistent across tools.

use agent_gate_core::ToolName;

use crate::executor::ToolResult;

/// The human (or a deny rule) rejected the operation.
pub fn tool_denied() -> ToolResult {
    ToolResult::err("The user denied this operation.")
}

/// The human rejected the operation and said why.
pub fn tool_denied_with_feedback(feedback: &str) -> ToolResult {
    ToolResult::err(format!(
        "The user denied this operation and provided the following feedback:\n<feedback>\n{}\n</feedback>",
        feedback
    ))
}

/// The human approved and attached a note for the agent.
pub fn tool_approved_with_feedback(feedback: &str) -> String {
    format!(
        "The user approved this operation and provided the following context:\n<feedback>\n{}\n</feedback>",
        feedback
    )
}

/// A deny pattern matched the command.
pub fn command_denied_by_rule(command: &str) -> ToolResult {
    ToolResult::err(format!(
        "The command '{}' matches a denied command pattern and was not executed.",
        command
    ))
}

/// Generic tool error wrapper.
pub fn tool_error(message: impl AsRef<str>) -> ToolResult {
    ToolResult::err(format!(
        "The tool execution failed with the following error:\n<error>\n{}\n</error>",
        message.as_ref()
    ))
}

/// A required parameter was not supplied.
pub fn missing_tool_parameter(tool: ToolName, param: &str) -> ToolResult {
    ToolResult::err(format!(
        "Missing value for required parameter '{}'. Please retry {} with a complete response.",
        param, tool
    ))
}

/// No registered tool answers to this name.
pub fn unknown_tool(name: &str, available: &[String]) -> ToolResult {
    ToolResult::err(format!(
        "Unknown tool '{}'. Available tools: {}",
        name,
        if available.is_empty() {
            "(none)".to_string()
        } else {
            available.join(", ")
        }
    ))
}

/// A named server/resource/tool does not exist; lists what does.
pub fn unknown_target(kind: &str, name: &str, available: &[String]) -> ToolResult {
    ToolResult::err(format!(
        "{} '{}' not found. Available {}s: {}",
        kind,
        name,
        kind.to_lowercase(),
        if available.is_empty() {
            "(none)".to_string()
        } else {
            available.join(", ")
        }
    ))
}

/// An earlier tool in the same message was rejected.
pub fn skipped_after_rejection(tool: ToolName) -> ToolResult {
    ToolResult::err(format!(
        "Skipping tool [{}] due to user rejecting a previous tool.",
        tool
    ))
}

/// The repetition detector stopped the call.
pub fn repetition_blocked(guidance: &str) -> ToolResult {
    tool_error(guidance)
}

/// The session was aborted before the call ran.
pub fn aborted(tool: ToolName) -> ToolResult {
    ToolResult::err(format!("Tool [{}] was not executed because the task was aborted.", tool))
}

/// The tool ran but produced nothing.
pub fn no_output() -> ToolResult {
    ToolResult::ok("(tool did not return anything)")
}
