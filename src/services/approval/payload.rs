//! Approval Payloads
//!
//! The JSON documents tools send with an approval request. They are decoded
//! once, at the decision boundary, into closed types; anything that does not
//! decode is treated as "ask the human".

use serde::{Deserialize, Serialize};

/// What a generic `tool` ask is about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ToolAction {
    // Read-only actions
    ReadFile,
    ListFilesTopLevel,
    ListFilesRecursive,
    ListCodeDefinitionNames,
    SearchFiles,
    CodebaseSearch,

    // Write actions
    EditedExistingFile,
    AppliedDiff,
    NewFileCreated,
    SearchAndReplace,
    InsertContent,

    // Single-flag actions
    UpdateTodoList,
    SwitchMode,
    NewTask,
    FinishTask,
    FetchInstructions,

    #[serde(other)]
    Unknown,
}

impl ToolAction {
    pub fn is_read_only(&self) -> bool {
        matches!(
            self,
            ToolAction::ReadFile
                | ToolAction::ListFilesTopLevel
                | ToolAction::ListFilesRecursive
                | ToolAction::ListCodeDefinitionNames
                | ToolAction::SearchFiles
                | ToolAction::CodebaseSearch
        )
    }

    pub fn is_write(&self) -> bool {
        matches!(
            self,
            ToolAction::EditedExistingFile
                | ToolAction::AppliedDiff
                | ToolAction::NewFileCreated
                | ToolAction::SearchAndReplace
                | ToolAction::InsertContent
        )
    }
}

/// Payload of a `tool` ask.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolApprovalPayload {
    pub tool: ToolAction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_outside_workspace: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_protected: bool,
    /// Preview body: file content, diff, todo markdown, instructions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Search regex / file pattern for search actions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regex: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_pattern: Option<String>,
    /// Target mode for switchMode / newTask
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl ToolApprovalPayload {
    pub fn new(tool: ToolAction) -> Self {
        Self {
            tool,
            path: None,
            is_outside_workspace: false,
            is_protected: false,
            content: None,
            regex: None,
            file_pattern: None,
            mode: None,
            reason: None,
        }
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    pub fn outside_workspace(mut self, outside: bool) -> Self {
        self.is_outside_workspace = outside;
        self
    }

    pub fn protected(mut self, protected: bool) -> Self {
        self.is_protected = protected;
        self
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// One suggested answer for a follow-up question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FollowupSuggestion {
    pub answer: String,
    /// Mode to switch to when this answer is picked
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
}

/// Payload of a `followup` ask.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FollowupPayload {
    pub question: String,
    #[serde(default)]
    pub suggest: Vec<FollowupSuggestion>,
}

impl FollowupPayload {
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// Payload of a `use_mcp_server` ask.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum McpServerUse {
    #[serde(rename_all = "camelCase")]
    UseMcpTool {
        server_name: String,
        tool_name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        arguments: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    AccessMcpResource { server_name: String, uri: String },
}

impl McpServerUse {
    pub fn server_name(&self) -> &str {
        match self {
            McpServerUse::UseMcpTool { server_name, .. } => server_name,
            McpServerUse::AccessMcpResource { server_name, .. } => server_name,
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}
