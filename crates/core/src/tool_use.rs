//! Tool Invocation Model
//!
//! The closed set of tool names the agent may request, and the `ToolUse`
//! value produced by both protocol front-ends:
//!
//! - the legacy XML-tag protocol, where parameters arrive as flat strings
//! - the native function-calling protocol, where arguments arrive as JSON
//!
//! `ToolInvocation` keeps the two shapes apart as a tagged variant so tools
//! never have to sniff for "native args present".

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::CoreError;

/// Every tool the agent can call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolName {
    ReadFile,
    ListFiles,
    SearchFiles,
    WriteToFile,
    ExecuteCommand,
    UseMcpTool,
    AccessMcpResource,
    AskFollowupQuestion,
    AttemptCompletion,
    SwitchMode,
    NewTask,
    UpdateTodoList,
    BrowserAction,
}

impl ToolName {
    /// All tool names in declaration order.
    pub const ALL: [ToolName; 13] = [
        ToolName::ReadFile,
        ToolName::ListFiles,
        ToolName::SearchFiles,
        ToolName::WriteToFile,
        ToolName::ExecuteCommand,
        ToolName::UseMcpTool,
        ToolName::AccessMcpResource,
        ToolName::AskFollowupQuestion,
        ToolName::AttemptCompletion,
        ToolName::SwitchMode,
        ToolName::NewTask,
        ToolName::UpdateTodoList,
        ToolName::BrowserAction,
    ];

    /// Wire name used as the XML tag and the native function name.
    pub fn as_str(&self) -> &'static str {
        match self {
            ToolName::ReadFile => "read_file",
            ToolName::ListFiles => "list_files",
            ToolName::SearchFiles => "search_files",
            ToolName::WriteToFile => "write_to_file",
            ToolName::ExecuteCommand => "execute_command",
            ToolName::UseMcpTool => "use_mcp_tool",
            ToolName::AccessMcpResource => "access_mcp_resource",
            ToolName::AskFollowupQuestion => "ask_followup_question",
            ToolName::AttemptCompletion => "attempt_completion",
            ToolName::SwitchMode => "switch_mode",
            ToolName::NewTask => "new_task",
            ToolName::UpdateTodoList => "update_todo_list",
            ToolName::BrowserAction => "browser_action",
        }
    }

    /// Tools that talk to an MCP server.
    pub fn is_mcp(&self) -> bool {
        matches!(self, ToolName::UseMcpTool | ToolName::AccessMcpResource)
    }
}

impl fmt::Display for ToolName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ToolName {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ToolName::ALL
            .iter()
            .copied()
            .find(|name| name.as_str() == s)
            .ok_or_else(|| CoreError::not_found(format!("Unknown tool: {}", s)))
    }
}

/// Parameter names recognised inside a legacy XML tool block.
pub const PARAM_NAMES: &[&str] = &[
    "path",
    "start_line",
    "end_line",
    "recursive",
    "regex",
    "file_pattern",
    "content",
    "line_count",
    "command",
    "cwd",
    "server_name",
    "tool_name",
    "arguments",
    "uri",
    "question",
    "follow_up",
    "result",
    "mode_slug",
    "reason",
    "mode",
    "message",
    "todos",
    "action",
    "url",
    "coordinate",
    "size",
    "text",
];

/// Flat string-keyed parameters from the legacy protocol.
///
/// A `BTreeMap` keeps iteration sorted, which the repetition detector relies
/// on for a canonical signature.
pub type LegacyParams = BTreeMap<String, String>;

/// How the parameters of a tool call were delivered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "protocol", content = "params", rename_all = "snake_case")]
pub enum ToolInvocation {
    /// XML-tag protocol: `<tool><param>value</param></tool>`
    Legacy(LegacyParams),
    /// Native function calling: already-structured JSON arguments
    Native(Value),
}

impl ToolInvocation {
    /// Look up a parameter as a string, whichever protocol delivered it.
    ///
    /// Native non-string values are rendered as compact JSON.
    pub fn param(&self, name: &str) -> Option<String> {
        match self {
            ToolInvocation::Legacy(params) => params.get(name).cloned(),
            ToolInvocation::Native(args) => match args.get(name) {
                None | Some(Value::Null) => None,
                Some(Value::String(s)) => Some(s.clone()),
                Some(other) => Some(other.to_string()),
            },
        }
    }

    /// Whether a parameter is present with a non-empty value.
    pub fn has_param(&self, name: &str) -> bool {
        self.param(name).map(|v| !v.trim().is_empty()).unwrap_or(false)
    }

    pub fn is_native(&self) -> bool {
        matches!(self, ToolInvocation::Native(_))
    }
}

/// One agent-requested action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolUse {
    pub name: ToolName,
    /// True while the block is still streaming
    pub partial: bool,
    pub invocation: ToolInvocation,
    /// Correlates async status events (native tool-call id)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl ToolUse {
    /// Create a complete legacy-protocol tool use.
    pub fn legacy<I, K, V>(name: ToolName, params: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            name,
            partial: false,
            invocation: ToolInvocation::Legacy(
                params
                    .into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            ),
            id: None,
        }
    }

    /// Create a complete native-protocol tool use.
    pub fn native(name: ToolName, args: Value) -> Self {
        Self {
            name,
            partial: false,
            invocation: ToolInvocation::Native(args),
            id: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn as_partial(mut self) -> Self {
        self.partial = true;
        self
    }

    pub fn param(&self, name: &str) -> Option<String> {
        self.invocation.param(name)
    }
}
