//! Individual Tool Implementations
//!
//! One struct per tool, each implementing `ToolHandler`. The blanket `Tool`
//! impl makes them registrable in a `ToolRegistry`; `builtin_registry`
//! registers all of them in `ToolName::ALL` order.

pub mod access_mcp_resource;
pub mod ask_followup_question;
pub mod attempt_completion;
pub mod browser_action;
pub mod execute_command;
pub mod list_files;
pub mod new_task;
pub mod read_file;
pub mod search_files;
pub mod switch_mode;
pub mod update_todo_list;
pub mod use_mcp_tool;
pub mod write_to_file;

#[cfg(test)]
pub(crate) mod test_helpers;

use std::sync::Arc;

pub use access_mcp_resource::AccessMcpResourceTool;
pub use ask_followup_question::AskFollowupQuestionTool;
pub use attempt_completion::AttemptCompletionTool;
pub use browser_action::BrowserActionTool;
pub use execute_command::ExecuteCommandTool;
pub use list_files::ListFilesTool;
pub use new_task::NewTaskTool;
pub use read_file::ReadFileTool;
pub use search_files::SearchFilesTool;
pub use switch_mode::SwitchModeTool;
pub use update_todo_list::UpdateTodoListTool;
pub use use_mcp_tool::UseMcpToolTool;
pub use write_to_file::WriteToFileTool;

use crate::models::mcp::McpServerInfo;

use super::trait_def::ToolRegistry;

/// Registry with every built-in tool.
pub fn builtin_registry() -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(Arc::new(ReadFileTool));
    registry.register(Arc::new(ListFilesTool));
    registry.register(Arc::new(SearchFilesTool));
    registry.register(Arc::new(WriteToFileTool));
    registry.register(Arc::new(ExecuteCommandTool));
    registry.register(Arc::new(UseMcpToolTool));
    registry.register(Arc::new(AccessMcpResourceTool));
    registry.register(Arc::new(AskFollowupQuestionTool));
    registry.register(Arc::new(AttemptCompletionTool));
    registry.register(Arc::new(SwitchModeTool));
    registry.register(Arc::new(NewTaskTool));
    registry.register(Arc::new(UpdateTodoListTool));
    registry.register(Arc::new(BrowserActionTool));
    registry
}

/// Names of the enabled MCP servers.
fn available_servers(servers: &[McpServerInfo]) -> Vec<String> {
    servers
        .iter()
        .filter(|server| !server.disabled)
        .map(|server| server.name.clone())
        .collect()
}

fn mcp_unavailable() -> &'static str {
    "MCP servers are not available in this session."
}

#[cfg(test)]
mod tests {
    use agent_gate_core::ToolName;

    use super::*;

    #[test]
    fn test_builtin_registry_covers_every_tool() {
        let registry = builtin_registry();
        let expected: Vec<String> = ToolName::ALL.iter().map(|n| n.as_str().to_string()).collect();
        assert_eq!(registry.names(), expected);
    }
}
