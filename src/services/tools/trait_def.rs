//! Tool Trait and Registry
//!
//! Tools are written against `ToolHandler`, which works with a typed
//! parameter struct. Each protocol has its own adapter into that struct:
//! legacy string maps go through `parse_legacy`, native JSON arguments
//! through `parse_native`. The blanket `Tool` impl turns every handler into
//! an object-safe tool the registry can hold, so the dispatcher never
//! branches on the protocol itself.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

use agent_gate_core::{CoreError, CoreResult, LegacyParams, ToolInvocation, ToolName, ToolUse};

use super::approval::ToolCallbacks;

// ============================================================================
// Trait Definitions
// ============================================================================

/// Identity and parameter contract of a tool.
pub trait ToolDefinitionTrait: Send + Sync {
    fn name(&self) -> ToolName;

    /// One line for prompts and logs.
    fn description(&self) -> &str;

    /// Parameters that must be present and non-empty.
    fn required_params(&self) -> &'static [&'static str];

    fn optional_params(&self) -> &'static [&'static str] {
        &[]
    }

    /// First required parameter the invocation does not supply.
    fn first_missing_param(&self, invocation: &ToolInvocation) -> Option<&'static str> {
        self.required_params()
            .iter()
            .copied()
            .find(|param| !invocation.has_param(param))
    }
}

/// Protocol-agnostic tool implementation.
#[async_trait]
pub trait ToolHandler: ToolDefinitionTrait {
    type Params: DeserializeOwned + Send + Sync;

    /// Build typed parameters from the flat XML-tag strings.
    fn parse_legacy(&self, params: &LegacyParams) -> CoreResult<Self::Params>;

    /// Build typed parameters from native function-call arguments.
    fn parse_native(&self, args: &Value) -> CoreResult<Self::Params> {
        serde_json::from_value(args.clone()).map_err(|e| {
            CoreError::parse(format!("Invalid arguments for {}: {}", self.name(), e))
        })
    }

    /// Short human-readable description of one call, for logs.
    fn usage_summary(&self, params: &Self::Params) -> String;

    /// Render a still-streaming call. Must not touch the outside world.
    async fn handle_partial(&self, _tool_use: &ToolUse, _cb: &mut ToolCallbacks<'_>) -> CoreResult<()> {
        Ok(())
    }

    /// Run the tool. Results go through `cb`; errors returned here are
    /// genuine I/O failures.
    async fn execute(&self, params: Self::Params, cb: &mut ToolCallbacks<'_>) -> CoreResult<()>;
}

/// Why a complete invocation did not run to the end.
#[derive(Debug, Error)]
pub enum ToolFailure {
    /// The parameters could not be turned into the tool's typed form
    #[error("{0}")]
    InvalidParams(CoreError),
    /// The tool started and its I/O failed
    #[error("{0}")]
    Execution(CoreError),
}

/// Object-safe tool, implemented for every `ToolHandler`.
#[async_trait]
pub trait Tool: ToolDefinitionTrait {
    async fn preview(&self, tool_use: &ToolUse, cb: &mut ToolCallbacks<'_>) -> CoreResult<()>;

    async fn run(&self, invocation: &ToolInvocation, cb: &mut ToolCallbacks<'_>) -> Result<(), ToolFailure>;
}

#[async_trait]
impl<T: ToolHandler> Tool for T {
    async fn preview(&self, tool_use: &ToolUse, cb: &mut ToolCallbacks<'_>) -> CoreResult<()> {
        self.handle_partial(tool_use, cb).await
    }

    async fn run(&self, invocation: &ToolInvocation, cb: &mut ToolCallbacks<'_>) -> Result<(), ToolFailure> {
        let params = match invocation {
            ToolInvocation::Legacy(params) => self.parse_legacy(params),
            ToolInvocation::Native(args) => self.parse_native(args),
        }
        .map_err(ToolFailure::InvalidParams)?;

        tracing::debug!("[dispatch] {}: {}", self.name(), self.usage_summary(&params));
        self.execute(params, cb).await.map_err(ToolFailure::Execution)
    }
}

// ============================================================================
// Legacy Parameter Helpers
// ============================================================================

/// A required legacy parameter, trimmed.
pub(crate) fn legacy_required(
    params: &LegacyParams,
    tool: ToolName,
    name: &str,
) -> CoreResult<String> {
    legacy_optional(params, name).ok_or_else(|| CoreError::missing_parameter(tool.as_str(), name))
}

/// An optional legacy parameter; blank counts as absent.
pub(crate) fn legacy_optional(params: &LegacyParams, name: &str) -> Option<String> {
    params
        .get(name)
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// `true` / `false` (any case); absent means `false`.
pub(crate) fn legacy_bool(params: &LegacyParams, name: &str) -> CoreResult<bool> {
    match legacy_optional(params, name) {
        None => Ok(false),
        Some(v) => match v.to_ascii_lowercase().as_str() {
            "true" => Ok(true),
            "false" => Ok(false),
            _ => Err(CoreError::parse(format!(
                "Parameter '{}' must be 'true' or 'false', got '{}'",
                name, v
            ))),
        },
    }
}

/// A positive line number or count.
pub(crate) fn legacy_u32(params: &LegacyParams, name: &str) -> CoreResult<Option<u32>> {
    legacy_optional(params, name)
        .map(|v| {
            v.parse::<u32>().map_err(|_| {
                CoreError::parse(format!("Parameter '{}' must be a non-negative integer, got '{}'", name, v))
            })
        })
        .transpose()
}

// ============================================================================
// ToolRegistry
// ============================================================================

/// Tools available to one agent run.
///
/// An explicit value built at session start and passed by reference; there
/// is no global registry.
pub struct ToolRegistry {
    tools: HashMap<ToolName, Arc<dyn Tool>>,
    /// Insertion order for deterministic listing.
    order: Vec<ToolName>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
            order: Vec::new(),
        }
    }

    /// Register a tool. Replaces any existing tool with the same name.
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        let name = tool.name();
        if !self.tools.contains_key(&name) {
            self.order.push(name);
        }
        self.tools.insert(name, tool);
    }

    /// Unregister a tool by name. Returns true if it was registered.
    pub fn unregister(&mut self, name: ToolName) -> bool {
        if self.tools.remove(&name).is_some() {
            self.order.retain(|n| *n != name);
            true
        } else {
            false
        }
    }

    pub fn get(&self, name: ToolName) -> Option<Arc<dyn Tool>> {
        self.tools.get(&name).cloned()
    }

    /// Wire names in registration order.
    pub fn names(&self) -> Vec<String> {
        self.order.iter().map(|n| n.as_str().to_string()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}
