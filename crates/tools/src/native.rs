//! Native Tool-Call Assembly
//!
//! Providers with function calling stream a tool call as a start fragment,
//! any number of argument deltas, and a completion fragment. The assembler
//! turns those into `ToolUse` values carrying `ToolInvocation::Native`:
//! partial previews while arguments stream, a ready invocation on
//! completion, or an invalid report when the name or JSON is unusable.

use std::collections::HashMap;

use serde_json::Value;

use agent_gate_core::{StreamEvent, ToolName, ToolUse};

/// What a stream fragment produced.
#[derive(Debug, Clone, PartialEq)]
pub enum NativeCallUpdate {
    /// Arguments are still streaming; safe to preview, never to execute
    Partial(ToolUse),
    /// Arguments are complete and well-formed
    Ready(ToolUse),
    /// The call can never execute; the dispatcher reports it to the agent
    Invalid {
        tool_id: String,
        tool_name: String,
        reason: String,
    },
}

#[derive(Debug, Default)]
struct PendingCall {
    tool_name: String,
    arguments: String,
}

/// Accumulates native tool-call fragments keyed by tool-call id.
#[derive(Debug, Default)]
pub struct NativeToolCallAssembler {
    pending: HashMap<String, PendingCall>,
}

impl NativeToolCallAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one stream fragment. Non tool-call fragments yield `None`.
    pub fn on_event(&mut self, event: &StreamEvent) -> Option<NativeCallUpdate> {
        match event {
            StreamEvent::ToolStart { tool_id, tool_name } => {
                self.pending.insert(
                    tool_id.clone(),
                    PendingCall {
                        tool_name: tool_name.clone(),
                        arguments: String::new(),
                    },
                );
                let name = tool_name.parse::<ToolName>().ok()?;
                Some(NativeCallUpdate::Partial(
                    ToolUse::native(name, Value::Object(Default::default()))
                        .with_id(tool_id.clone())
                        .as_partial(),
                ))
            }
            StreamEvent::ToolDelta {
                tool_id,
                arguments_delta,
            } => {
                let call = self.pending.entry(tool_id.clone()).or_default();
                call.arguments.push_str(arguments_delta);
                let name = call.tool_name.parse::<ToolName>().ok()?;
                Some(NativeCallUpdate::Partial(
                    ToolUse::native(name, lenient_arguments(&call.arguments))
                        .with_id(tool_id.clone())
                        .as_partial(),
                ))
            }
            StreamEvent::ToolComplete {
                tool_id,
                tool_name,
                arguments,
            } => {
                let streamed = self.pending.remove(tool_id).unwrap_or_default();
                let arguments = if arguments.trim().is_empty() {
                    streamed.arguments
                } else {
                    arguments.clone()
                };
                let tool_name = if tool_name.is_empty() {
                    streamed.tool_name
                } else {
                    tool_name.clone()
                };
                Some(complete(tool_id, &tool_name, &arguments))
            }
            _ => None,
        }
    }

    /// Number of calls started but not yet completed.
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Close out calls the stream never completed.
    pub fn drain_incomplete(&mut self) -> Vec<NativeCallUpdate> {
        let mut ids: Vec<String> = self.pending.keys().cloned().collect();
        ids.sort();
        ids.into_iter()
            .filter_map(|id| {
                self.pending.remove(&id).map(|call| NativeCallUpdate::Invalid {
                    tool_id: id,
                    tool_name: call.tool_name,
                    reason: "Tool call was interrupted before its arguments completed".to_string(),
                })
            })
            .collect()
    }
}

fn complete(tool_id: &str, tool_name: &str, arguments: &str) -> NativeCallUpdate {
    let invalid = |reason: String| {
        tracing::warn!("[native] invalid tool call {} ({}): {}", tool_id, tool_name, reason);
        NativeCallUpdate::Invalid {
            tool_id: tool_id.to_string(),
            tool_name: tool_name.to_string(),
            reason,
        }
    };

    let name = match tool_name.parse::<ToolName>() {
        Ok(name) => name,
        Err(e) => return invalid(e.to_string()),
    };

    let args = if arguments.trim().is_empty() {
        Value::Object(Default::default())
    } else {
        match serde_json::from_str::<Value>(arguments) {
            Ok(value) => value,
            Err(e) => return invalid(format!("Invalid JSON arguments: {}", e)),
        }
    };

    if !args.is_object() {
        return invalid("Tool arguments must be a JSON object".to_string());
    }

    NativeCallUpdate::Ready(ToolUse::native(name, args).with_id(tool_id))
}

/// Best-effort view of half-streamed arguments for previews.
///
/// Tries the text as-is, then with an unterminated string and object
/// closed. Anything else previews as an empty object.
fn lenient_arguments(partial: &str) -> Value {
    ["", "}", "\"}"]
        .iter()
        .find_map(|suffix| {
            serde_json::from_str::<Value>(&format!("{}{}", partial, suffix))
                .ok()
                .filter(Value::is_object)
        })
        .unwrap_or_else(|| Value::Object(Default::default()))
}
