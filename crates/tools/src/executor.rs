//! Tool Result Type
//!
//! The single value a tool invocation contributes back to the conversation.
//! Every dispatch path (executed, denied, malformed, blocked) produces one.

use serde::{Deserialize, Serialize};

/// Result of a tool invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    /// Whether the execution was successful
    pub success: bool,
    /// Output from the tool (if successful)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    /// Error message (if failed)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Image attachments as data URLs (screenshots, user-supplied images)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<String>,
    /// Native tool-call id this result answers, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_use_id: Option<String>,
}

impl ToolResult {
    /// Create a successful result
    pub fn ok(output: impl Into<String>) -> Self {
        Self {
            success: true,
            output: Some(output.into()),
            error: None,
            images: Vec::new(),
            tool_use_id: None,
        }
    }

    /// Create an error result
    pub fn err(error: impl Into<String>) -> Self {
        Self {
            success: false,
            output: None,
            error: Some(error.into()),
            images: Vec::new(),
            tool_use_id: None,
        }
    }

    /// Create a successful result with image attachments
    pub fn ok_with_images(output: impl Into<String>, images: Vec<String>) -> Self {
        Self {
            images,
            ..Self::ok(output)
        }
    }

    pub fn with_tool_use_id(mut self, id: Option<String>) -> Self {
        self.tool_use_id = id;
        self
    }

    /// Fold a second pushed result into this one.
    ///
    /// The combined result fails if either part failed; texts are joined in
    /// push order and images accumulate.
    pub fn merge(mut self, other: ToolResult) -> Self {
        let combined = format!("{}\n\n{}", self.to_content(), other.to_content());
        self.success = self.success && other.success;
        if self.success {
            self.output = Some(combined);
            self.error = None;
        } else {
            self.output = None;
            self.error = Some(
                combined
                    .strip_prefix("Error: ")
                    .map(str::to_string)
                    .unwrap_or(combined),
            );
        }
        self.images.extend(other.images);
        if self.tool_use_id.is_none() {
            self.tool_use_id = other.tool_use_id;
        }
        self
    }

    /// Convert to string for LLM consumption
    pub fn to_content(&self) -> String {
        if self.success {
            self.output.clone().unwrap_or_default()
        } else {
            format!(
                "Error: {}",
                self.error.as_deref().unwrap_or("Unknown error")
            )
        }
    }
}
