//! Tool Dispatch
//!
//! Everything between a parsed `ToolUse` and the result handed back to the
//! agent:
//! - `trait_def` - the `Tool` / `ToolHandler` traits and the `ToolRegistry`
//! - `dispatch` - `ToolDispatcher`, result sinks and error handling
//! - `approval` - `ToolCallbacks`, the approval path every tool asks through
//! - `session` - per-run mutable state
//! - `backends` - file system, shell, MCP, browser, diff view, sub-tasks
//! - `impls` - the built-in tools

pub mod approval;
pub mod backends;
pub mod dispatch;
pub mod impls;
pub mod session;
pub mod trait_def;

pub use approval::ToolCallbacks;
pub use backends::{
    BrowserAction, BrowserActionResult, BrowserSession, CommandOutput, CommandRunner, DiffPreview,
    FileSystem, LocalCommandRunner, LocalFileSystem, McpHub, McpOutput, TaskSpawner, ToolBackends,
};
pub use dispatch::{
    CollectingSink, DispatchOutcome, ErrorHandler, EventSink, LoggingErrorHandler, ResultSink,
    ToolDispatcher,
};
pub use impls::builtin_registry;
pub use session::{ToolSession, DEFAULT_MODE};
pub use trait_def::{Tool, ToolDefinitionTrait, ToolFailure, ToolHandler, ToolRegistry};
