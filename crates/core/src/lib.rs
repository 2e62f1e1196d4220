//! Agent Gate Core
//!
//! Foundational types for the Agent Gate workspace. This crate has zero
//! dependencies on the approval engine, the dispatcher, or any I/O backend.
//!
//! ## Module Organization
//!
//! - `error` - Core error types (`CoreError`, `CoreResult`)
//! - `context` - Execution context (`ExecutionContext`, `ToolContext`)
//! - `tool_use` - Closed tool name set and the dual-protocol `ToolUse` model
//! - `todo` - Todo list items and markdown checklist parsing
//! - `ask` - Human approval vocabulary (`AskKind`, `AskReply`)
//! - `streaming` - Inbound stream fragments and outbound gate events

pub mod ask;
pub mod context;
pub mod error;
pub mod streaming;
pub mod todo;
pub mod tool_use;

// ── Error Types ────────────────────────────────────────────────────────
pub use error::{CoreError, CoreResult};

// ── Context ────────────────────────────────────────────────────────────
pub use context::{ExecutionContext, ToolContext};

// ── Tool Invocation Model ──────────────────────────────────────────────
pub use tool_use::{LegacyParams, ToolInvocation, ToolName, ToolUse, PARAM_NAMES};

// ── Todo List ──────────────────────────────────────────────────────────
pub use todo::{has_open_items, parse_markdown_checklist, TodoItem, TodoStatus};

// ── Approval Vocabulary ────────────────────────────────────────────────
pub use ask::{AskKind, AskReply, AskResponse};

// ── Streaming Types ────────────────────────────────────────────────────
pub use streaming::{GateEvent, StreamEvent};
