//! Services
//!
//! - `approval` - the auto-approval decision engine
//! - `orchestrator` - repetition detection, the human-approval gate, the
//!   auto-approval ceiling
//! - `tools` - tool registry, dispatcher and built-in tools

pub mod approval;
pub mod orchestrator;
pub mod tools;

pub use approval::{decide, ApprovalContext, ApprovalDecision};
pub use orchestrator::{ApprovalChannel, ApprovalGate, ScriptedApprovals, ToolRepetitionDetector};
pub use tools::{builtin_registry, ToolDispatcher, ToolRegistry, ToolSession};
