//! update_todo_list Tool
//!
//! Replaces the session's checklist. While the checklist has open items the
//! decision engine may approve reads and writes without asking (when the
//! todo-execution flag is on), so every update goes through approval.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use agent_gate_core::todo::render_markdown_checklist;
use agent_gate_core::{
    parse_markdown_checklist, AskKind, CoreError, CoreResult, LegacyParams, TodoItem, TodoStatus,
    ToolName, ToolUse,
};
use agent_gate_tools::ToolResult;

use crate::services::approval::{ToolAction, ToolApprovalPayload};
use crate::services::tools::approval::ToolCallbacks;
use crate::services::tools::trait_def::{legacy_required, ToolDefinitionTrait, ToolHandler};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UpdateTodoListParams {
    pub todos: Vec<TodoItem>,
}

pub struct UpdateTodoListTool;

/// Markdown checklist text; text without a single checkbox line is rejected.
pub(super) fn todos_from_markdown(markdown: &str) -> CoreResult<Vec<TodoItem>> {
    let items = parse_markdown_checklist(markdown);
    if items.is_empty() && !markdown.trim().is_empty() {
        return Err(CoreError::parse(
            "todos must be a markdown checklist, e.g. \"[ ] Write tests\"",
        ));
    }
    Ok(items)
}

/// Native todos: a markdown string, or an array of strings / item objects.
pub(super) fn todos_from_value(value: Option<&Value>) -> CoreResult<Vec<TodoItem>> {
    let items = match value {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::String(markdown)) => return todos_from_markdown(markdown),
        Some(Value::Array(items)) => items,
        Some(_) => return Err(CoreError::parse("todos must be a checklist string or an array")),
    };
    let mut todos = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        let id = (index + 1).to_string();
        let todo = match item {
            Value::String(line) => match parse_markdown_checklist(line).into_iter().next() {
                Some(parsed) => TodoItem::new(id, parsed.content, parsed.status),
                None => TodoItem::new(id, line.trim(), TodoStatus::Pending),
            },
            Value::Object(_) => {
                let mut todo: TodoItem = serde_json::from_value(item.clone())
                    .map_err(|e| CoreError::parse(format!("Invalid todo item: {}", e)))?;
                if todo.id.trim().is_empty() {
                    todo.id = id;
                }
                todo
            }
            _ => return Err(CoreError::parse("todo items must be strings or objects")),
        };
        todos.push(todo);
    }
    Ok(todos)
}

impl ToolDefinitionTrait for UpdateTodoListTool {
    fn name(&self) -> ToolName {
        ToolName::UpdateTodoList
    }

    fn description(&self) -> &str {
        "Replace the task's todo list with a markdown checklist ([ ] pending, [-] in progress, [x] completed)."
    }

    fn required_params(&self) -> &'static [&'static str] {
        &["todos"]
    }
}

#[async_trait]
impl ToolHandler for UpdateTodoListTool {
    type Params = UpdateTodoListParams;

    fn parse_legacy(&self, params: &LegacyParams) -> CoreResult<UpdateTodoListParams> {
        let markdown = legacy_required(params, self.name(), "todos")?;
        Ok(UpdateTodoListParams {
            todos: todos_from_markdown(&markdown)?,
        })
    }

    fn parse_native(&self, args: &Value) -> CoreResult<UpdateTodoListParams> {
        if args.get("todos").is_none() {
            return Err(CoreError::missing_parameter(self.name().as_str(), "todos"));
        }
        Ok(UpdateTodoListParams {
            todos: todos_from_value(args.get("todos"))?,
        })
    }

    fn usage_summary(&self, params: &UpdateTodoListParams) -> String {
        format!("todo list ({} items)", params.todos.len())
    }

    async fn handle_partial(&self, tool_use: &ToolUse, cb: &mut ToolCallbacks<'_>) -> CoreResult<()> {
        let Some(markdown) = tool_use.param("todos") else {
            return Ok(());
        };
        let payload = ToolApprovalPayload::new(ToolAction::UpdateTodoList).with_content(markdown);
        cb.update_partial(AskKind::Tool, &payload.to_json()).await
    }

    async fn execute(&self, params: UpdateTodoListParams, cb: &mut ToolCallbacks<'_>) -> CoreResult<()> {
        let payload = ToolApprovalPayload::new(ToolAction::UpdateTodoList)
            .with_content(render_markdown_checklist(&params.todos));
        if !cb.ask_approval(AskKind::Tool, &payload.to_json()).await? {
            return Ok(());
        }

        tracing::debug!("[update_todo_list] {} items", params.todos.len());
        cb.session.todo_list = params.todos;
        cb.push_tool_result(ToolResult::ok("Todo list updated successfully."));
        Ok(())
    }
}
