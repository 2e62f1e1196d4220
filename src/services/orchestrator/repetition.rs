//! Tool Repetition Detector
//!
//! Stops an agent that keeps issuing the identical tool call. The detector
//! itself is configuration only; the per-run counters live in a
//! `RepetitionState` the session owns and passes in, so two agent runs can
//! never share counters.

use std::collections::hash_map::DefaultHasher;
use std::collections::{HashMap, HashSet, VecDeque};
use std::hash::{Hash, Hasher};

use serde_json::Value;

use agent_gate_core::{ToolInvocation, ToolName, ToolUse};

/// Consecutive identical calls allowed for ordinary tools.
pub const DEFAULT_REPETITION_LIMIT: u32 = 3;
/// MCP tools page and stream legitimately, so they get far more slack.
pub const DEFAULT_MCP_REPETITION_LIMIT: u32 = 30;
/// Responses remembered for MCP progress detection.
pub const RESPONSE_HISTORY_CAPACITY: usize = 5;

/// Per-run counters.
#[derive(Debug, Clone, Default)]
pub struct RepetitionState {
    last_signature: Option<u64>,
    consecutive_count: u32,
    /// Hashes of the most recent responses to the current signature
    response_history: VecDeque<u64>,
}

impl RepetitionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn consecutive_count(&self) -> u32 {
        self.consecutive_count
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Verdict for one call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepetitionCheck {
    pub allow: bool,
    /// Message for the human explaining why the agent was stopped
    pub guidance: Option<String>,
}

impl RepetitionCheck {
    fn allowed() -> Self {
        Self {
            allow: true,
            guidance: None,
        }
    }
}

/// Ceiling configuration and exclusions.
#[derive(Debug, Clone)]
pub struct ToolRepetitionDetector {
    default_limit: u32,
    mcp_limit: u32,
    overrides: HashMap<ToolName, u32>,
    excluded: HashSet<ToolName>,
}

impl Default for ToolRepetitionDetector {
    fn default() -> Self {
        Self::new(DEFAULT_REPETITION_LIMIT)
    }
}

impl ToolRepetitionDetector {
    /// Detector with the given ordinary ceiling and the default exclusions.
    pub fn new(default_limit: u32) -> Self {
        Self {
            default_limit,
            mcp_limit: DEFAULT_MCP_REPETITION_LIMIT,
            overrides: HashMap::new(),
            excluded: [
                ToolName::AttemptCompletion,
                ToolName::AskFollowupQuestion,
                ToolName::UpdateTodoList,
            ]
            .into_iter()
            .collect(),
        }
    }

    pub fn with_mcp_limit(mut self, limit: u32) -> Self {
        self.mcp_limit = limit;
        self
    }

    /// Per-tool ceiling; 0 means unlimited.
    pub fn with_override(mut self, tool: ToolName, limit: u32) -> Self {
        self.overrides.insert(tool, limit);
        self
    }

    pub fn with_excluded(mut self, tool: ToolName) -> Self {
        self.excluded.insert(tool);
        self
    }

    pub fn effective_limit(&self, tool: ToolName) -> u32 {
        match self.overrides.get(&tool) {
            Some(limit) => *limit,
            None if tool.is_mcp() => self.mcp_limit,
            None => self.default_limit,
        }
    }

    /// Judge one call, updating `state`.
    pub fn check(&self, state: &mut RepetitionState, tool_use: &ToolUse) -> RepetitionCheck {
        if self.bypasses_counting(tool_use) {
            return RepetitionCheck::allowed();
        }

        let signature = signature_of(tool_use);
        if state.last_signature == Some(signature) {
            if tool_use.name.is_mcp() && made_progress(&state.response_history) {
                state.consecutive_count = 0;
            } else {
                state.consecutive_count += 1;
            }
        } else {
            state.last_signature = Some(signature);
            state.consecutive_count = 0;
            state.response_history.clear();
        }

        let limit = self.effective_limit(tool_use.name);
        if limit > 0 && state.consecutive_count >= limit {
            tracing::warn!(
                "[repetition] {} repeated {} times, blocking",
                tool_use.name,
                state.consecutive_count + 1
            );
            state.reset();
            return RepetitionCheck {
                allow: false,
                guidance: Some(format!(
                    "The agent appears to be stuck in a loop, attempting the same action ({}) repeatedly. \
                     Consider rephrasing the task, giving more specific instructions, or steering it \
                     towards a different approach.",
                    tool_use.name
                )),
            };
        }

        RepetitionCheck::allowed()
    }

    /// Remember the response to the current call (MCP tools only).
    pub fn record_response(&self, state: &mut RepetitionState, tool_use: &ToolUse, response: &str) {
        if !tool_use.name.is_mcp() || state.last_signature != Some(signature_of(tool_use)) {
            return;
        }
        if state.response_history.len() >= RESPONSE_HISTORY_CAPACITY {
            state.response_history.pop_front();
        }
        state.response_history.push_back(hash_str(response));
    }

    fn bypasses_counting(&self, tool_use: &ToolUse) -> bool {
        if self.excluded.contains(&tool_use.name) {
            return true;
        }
        tool_use.name == ToolName::BrowserAction
            && tool_use
                .param("action")
                .map(|action| action.starts_with("scroll_"))
                .unwrap_or(false)
    }
}

/// The latest response is new, or the remembered responses vary at all.
fn made_progress(history: &VecDeque<u64>) -> bool {
    let Some(latest) = history.back() else {
        return false;
    };
    let novel = history.iter().rev().skip(1).all(|earlier| earlier != latest);
    novel || history.iter().collect::<HashSet<_>>().len() > 1
}

/// Canonical hash of name + parameters, independent of key order.
fn signature_of(tool_use: &ToolUse) -> u64 {
    let params = match &tool_use.invocation {
        ToolInvocation::Legacy(params) => params
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join("\u{1f}"),
        ToolInvocation::Native(args) => canonical_json(args),
    };
    hash_str(&format!("{}\u{1e}{}", tool_use.name, params))
}

fn canonical_json(value: &Value) -> String {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            let body = entries
                .into_iter()
                .map(|(k, v)| format!("{:?}:{}", k, canonical_json(v)))
                .collect::<Vec<_>>()
                .join(",");
            format!("{{{}}}", body)
        }
        Value::Array(items) => format!(
            "[{}]",
            items.iter().map(canonical_json).collect::<Vec<_>>().join(",")
        ),
        other => other.to_string(),
    }
}

fn hash_str(text: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    text.hash(&mut hasher);
    hasher.finish()
}
