//! MCP Server Models
//!
//! What the core knows about connected MCP servers: their tools (with the
//! per-tool always-allow override) and their resources. Connection
//! management belongs to the host.

use serde::{Deserialize, Serialize};

/// Status of an MCP server connection
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum McpServerStatus {
    /// Server is connected and responding
    Connected,
    /// Server is not connected
    Disconnected,
    /// Server status is unknown (never checked)
    #[default]
    Unknown,
}

/// A tool exposed by an MCP server
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct McpToolInfo {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Explicit per-tool override; `Some(false)` blocks auto-approval
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub always_allow: Option<bool>,
}

/// A resource exposed by an MCP server
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct McpResourceInfo {
    pub uri: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
}

/// Snapshot of one MCP server
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct McpServerInfo {
    pub name: String,
    #[serde(default)]
    pub status: McpServerStatus,
    #[serde(default)]
    pub disabled: bool,
    #[serde(default)]
    pub tools: Vec<McpToolInfo>,
    #[serde(default)]
    pub resources: Vec<McpResourceInfo>,
}

impl McpServerInfo {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: McpServerStatus::Connected,
            disabled: false,
            tools: Vec::new(),
            resources: Vec::new(),
        }
    }

    pub fn with_tool(mut self, name: impl Into<String>, always_allow: Option<bool>) -> Self {
        self.tools.push(McpToolInfo {
            name: name.into(),
            description: None,
            always_allow,
        });
        self
    }

    pub fn with_resource(mut self, uri: impl Into<String>, name: impl Into<String>) -> Self {
        self.resources.push(McpResourceInfo {
            uri: uri.into(),
            name: name.into(),
            mime_type: None,
        });
        self
    }

    pub fn find_tool(&self, name: &str) -> Option<&McpToolInfo> {
        self.tools.iter().find(|tool| tool.name == name)
    }

    pub fn tool_names(&self) -> Vec<String> {
        self.tools.iter().map(|tool| tool.name.clone()).collect()
    }

    pub fn resource_uris(&self) -> Vec<String> {
        self.resources.iter().map(|r| r.uri.clone()).collect()
    }
}

/// Find a server by name among enabled servers.
pub fn find_server<'a>(servers: &'a [McpServerInfo], name: &str) -> Option<&'a McpServerInfo> {
    servers.iter().find(|server| server.name == name && !server.disabled)
}
