//! Agent Gate - Tool-Call Orchestration and Auto-Approval Core
//!
//! Decides, for every action an LLM coding agent requests, whether it runs
//! unattended, waits for the human, or is refused, and dispatches approved
//! calls to the tool implementations over both the legacy XML protocol and
//! native function calling.
//!
//! - `models` - auto-approval settings, MCP servers, modes
//! - `services` - decision engine, orchestrator, tool dispatch
//! - `storage` - settings persistence
//! - `utils` - errors and paths

pub mod models;
pub mod services;
pub mod storage;
pub mod utils;

pub use models::settings::{AutoApprovalSettings, SettingsUpdate};
pub use services::approval::{decide, ApprovalContext, ApprovalDecision};
pub use services::orchestrator::{ApprovalChannel, ApprovalGate, ScriptedApprovals};
pub use services::tools::{builtin_registry, ToolDispatcher, ToolSession};
pub use storage::config::{ConfigService, SettingsProvider, StaticSettings};
pub use utils::error::{AppError, AppResult};
