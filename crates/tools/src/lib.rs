//! Agent Gate Tools
//!
//! Protocol adapter primitives shared by the dispatcher and host adapters:
//! - `ToolResult` - the one value every tool invocation yields
//! - `responses` - canonical denial / error wording for results
//! - `xml` - legacy XML-tag assistant message parser
//! - `native` - streaming native tool-call assembler
//!
//! The `Tool` trait, registry, dispatcher and tool implementations live in
//! the main crate's `services::tools` module, next to the approval engine
//! they depend on.

pub mod executor;
pub mod native;
pub mod responses;
pub mod xml;

pub use executor::ToolResult;
pub use native::{NativeCallUpdate, NativeToolCallAssembler};
pub use xml::{complete_blocks, parse_assistant_message, AssistantBlock};
