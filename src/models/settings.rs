//! Settings Models
//!
//! Auto-approval settings as stored in auto-approval.json and handed to the
//! decision engine. The host owns these; the core only reads snapshots.

use serde::{Deserialize, Serialize};

/// Upper bound for the follow-up auto-answer timeout (5 minutes).
pub const MAX_FOLLOWUP_TIMEOUT_MS: u64 = 300_000;

/// Auto-approval policy flags and lists.
///
/// Every field defaults to the conservative value, so a partially written
/// settings file never widens what runs unattended.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AutoApprovalSettings {
    /// Master switch; when off every decision is `Ask`
    pub auto_approval_enabled: bool,

    pub always_allow_read_only: bool,
    pub always_allow_read_only_outside_workspace: bool,
    pub always_allow_write: bool,
    pub always_allow_write_outside_workspace: bool,
    pub always_allow_write_protected: bool,
    pub always_allow_browser: bool,
    pub always_approve_resubmit: bool,
    pub always_allow_mcp: bool,
    pub always_allow_mode_switch: bool,
    pub always_allow_subtasks: bool,
    pub always_allow_execute: bool,
    pub always_allow_followup_questions: bool,
    pub always_allow_update_todo_list: bool,
    /// Approve reads and writes while the todo list has open items
    pub always_allow_during_todo_execution: bool,

    /// Directories outside the workspace that reads may touch
    pub allowed_read_directories: Vec<String>,
    /// Directories outside the workspace that writes may touch
    pub allowed_write_directories: Vec<String>,
    /// Command prefixes / globs that run without asking
    pub allowed_commands: Vec<String>,
    /// Command prefixes / globs that are refused outright
    pub denied_commands: Vec<String>,

    /// Milliseconds before a follow-up question auto-answers with its first
    /// suggestion; 0 disables
    pub followup_auto_approve_timeout_ms: u64,
    /// Consecutive auto-approved requests before the human is consulted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed_max_requests: Option<u32>,
}

/// Settings update request (partial update)
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct SettingsUpdate {
    pub auto_approval_enabled: Option<bool>,
    pub always_allow_read_only: Option<bool>,
    pub always_allow_read_only_outside_workspace: Option<bool>,
    pub always_allow_write: Option<bool>,
    pub always_allow_write_outside_workspace: Option<bool>,
    pub always_allow_write_protected: Option<bool>,
    pub always_allow_browser: Option<bool>,
    pub always_approve_resubmit: Option<bool>,
    pub always_allow_mcp: Option<bool>,
    pub always_allow_mode_switch: Option<bool>,
    pub always_allow_subtasks: Option<bool>,
    pub always_allow_execute: Option<bool>,
    pub always_allow_followup_questions: Option<bool>,
    pub always_allow_update_todo_list: Option<bool>,
    pub always_allow_during_todo_execution: Option<bool>,
    pub allowed_read_directories: Option<Vec<String>>,
    pub allowed_write_directories: Option<Vec<String>>,
    pub allowed_commands: Option<Vec<String>>,
    pub denied_commands: Option<Vec<String>>,
    pub followup_auto_approve_timeout_ms: Option<u64>,
    /// `Some(None)` clears the ceiling
    #[serde(default, with = "double_option")]
    pub allowed_max_requests: Option<Option<u32>>,
}

impl AutoApprovalSettings {
    /// Apply a partial update to the settings
    pub fn apply_update(&mut self, update: SettingsUpdate) {
        macro_rules! apply {
            ($($field:ident),* $(,)?) => {
                $(
                    if let Some(value) = update.$field {
                        self.$field = value;
                    }
                )*
            };
        }

        apply!(
            auto_approval_enabled,
            always_allow_read_only,
            always_allow_read_only_outside_workspace,
            always_allow_write,
            always_allow_write_outside_workspace,
            always_allow_write_protected,
            always_allow_browser,
            always_approve_resubmit,
            always_allow_mcp,
            always_allow_mode_switch,
            always_allow_subtasks,
            always_allow_execute,
            always_allow_followup_questions,
            always_allow_update_todo_list,
            always_allow_during_todo_execution,
            allowed_read_directories,
            allowed_write_directories,
            allowed_commands,
            denied_commands,
            followup_auto_approve_timeout_ms,
            allowed_max_requests,
        );
    }

    /// Validate the settings
    pub fn validate(&self) -> Result<(), String> {
        if self.followup_auto_approve_timeout_ms > MAX_FOLLOWUP_TIMEOUT_MS {
            return Err(format!(
                "followupAutoApproveTimeoutMs cannot exceed {} ms",
                MAX_FOLLOWUP_TIMEOUT_MS
            ));
        }

        let lists = [
            ("allowedReadDirectories", &self.allowed_read_directories),
            ("allowedWriteDirectories", &self.allowed_write_directories),
            ("allowedCommands", &self.allowed_commands),
            ("deniedCommands", &self.denied_commands),
        ];
        for (name, entries) in lists {
            if entries.iter().any(|entry| entry.trim().is_empty()) {
                return Err(format!("{} must not contain empty entries", name));
            }
        }

        if self.allowed_max_requests == Some(0) {
            return Err("allowedMaxRequests must be at least 1 when set".to_string());
        }

        Ok(())
    }
}

/// Distinguishes an absent field from an explicit `null`.
mod double_option {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S, T>(value: &Option<Option<T>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
        T: Serialize,
    {
        match value {
            Some(inner) => inner.serialize(serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
    where
        D: Deserializer<'de>,
        T: Deserialize<'de>,
    {
        Option::<T>::deserialize(deserializer).map(Some)
    }
}
