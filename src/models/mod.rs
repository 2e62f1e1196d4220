//! Data Models
//!
//! Settings, MCP server and mode descriptions consumed by the approval
//! engine and the tools.

pub mod mcp;
pub mod mode;
pub mod settings;

pub use mcp::*;
pub use mode::*;
pub use settings::*;
