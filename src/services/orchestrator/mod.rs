//! Orchestration Support
//!
//! Session-scoped machinery around tool dispatch:
//! - `repetition` - identical-call loop detection
//! - `approval_gate` - the human-approval channel
//! - `auto_approval_limit` - ceiling on consecutive unattended approvals

pub mod approval_gate;
pub mod auto_approval_limit;
pub mod repetition;

pub use approval_gate::{ApprovalChannel, ApprovalGate, ScriptedApprovals};
pub use auto_approval_limit::{AutoApprovalLimiter, LimitCheck, LimitReachedPayload};
pub use repetition::{RepetitionCheck, RepetitionState, ToolRepetitionDetector};
