//! Todo List Model
//!
//! The agent's checklist for the current task. The approval engine only reads
//! it to decide whether the todo-execution override applies.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TodoStatus {
    Pending,
    InProgress,
    Completed,
}

impl TodoStatus {
    /// Markdown checkbox marker for this status.
    pub fn marker(&self) -> &'static str {
        match self {
            TodoStatus::Pending => "[ ]",
            TodoStatus::InProgress => "[-]",
            TodoStatus::Completed => "[x]",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoItem {
    pub id: String,
    pub content: String,
    pub status: TodoStatus,
}

impl TodoItem {
    pub fn new(id: impl Into<String>, content: impl Into<String>, status: TodoStatus) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            status,
        }
    }
}

/// True when at least one item is not completed.
pub fn has_open_items(todos: &[TodoItem]) -> bool {
    todos.iter().any(|item| item.status != TodoStatus::Completed)
}

/// Parse a markdown checklist into todo items.
///
/// Accepted markers: `[ ]` pending, `[-]` or `[~]` in progress, `[x]`/`[X]`
/// completed. A leading `-` or `*` bullet is optional. Lines without a marker
/// are ignored. Ids are assigned by position (`1`, `2`, ...).
pub fn parse_markdown_checklist(markdown: &str) -> Vec<TodoItem> {
    let mut items = Vec::new();
    for line in markdown.lines() {
        let mut rest = line.trim();
        if let Some(stripped) = rest.strip_prefix("- ").or_else(|| rest.strip_prefix("* ")) {
            rest = stripped.trim_start();
        }
        let status = if rest.starts_with("[ ]") {
            TodoStatus::Pending
        } else if rest.starts_with("[-]") || rest.starts_with("[~]") {
            TodoStatus::InProgress
        } else if rest.starts_with("[x]") || rest.starts_with("[X]") {
            TodoStatus::Completed
        } else {
            continue;
        };
        let content = rest[3..].trim();
        if content.is_empty() {
            continue;
        }
        items.push(TodoItem::new(
            (items.len() + 1).to_string(),
            content,
            status,
        ));
    }
    items
}

/// Render todo items back to a markdown checklist.
pub fn render_markdown_checklist(todos: &[TodoItem]) -> String {
    todos
        .iter()
        .map(|item| format!("{} {}", item.status.marker(), item.content))
        .collect::<Vec<_>>()
        .join("\n")
}
