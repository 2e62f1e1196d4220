//! browser_action Tool
//!
//! Drives the host's browser session one step at a time. Only `launch` goes
//! through approval; later steps act on the page the human already allowed.

use async_trait::async_trait;
use serde_json::Value;

use agent_gate_core::{AskKind, CoreError, CoreResult, LegacyParams, ToolName, ToolUse};
use agent_gate_tools::responses::tool_error;
use agent_gate_tools::ToolResult;

use crate::services::tools::approval::ToolCallbacks;
use crate::services::tools::backends::{BrowserAction, BrowserActionResult};
use crate::services::tools::trait_def::{ToolDefinitionTrait, ToolHandler};

pub struct BrowserActionTool;

/// `x,y` with integer components.
fn validate_pair(tool: ToolName, name: &str, value: &str) -> CoreResult<String> {
    let parts: Vec<&str> = value.split(',').map(str::trim).collect();
    if parts.len() != 2 || parts.iter().any(|p| p.parse::<i64>().is_err()) {
        return Err(CoreError::validation(format!(
            "{} '{}' for {} must be formatted as x,y",
            name, value, tool
        )));
    }
    Ok(format!("{},{}", parts[0], parts[1]))
}

/// Build an action from flat string parameters, shared by both protocols.
fn build_action(tool: ToolName, get: impl Fn(&str) -> Option<String>) -> CoreResult<BrowserAction> {
    let required = |name: &str| {
        get(name)
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| CoreError::missing_parameter(tool.as_str(), name))
    };
    let action = required("action")?;
    Ok(match action.trim() {
        "launch" => BrowserAction::Launch {
            url: required("url")?.trim().to_string(),
        },
        "click" => BrowserAction::Click {
            coordinate: validate_pair(tool, "coordinate", &required("coordinate")?)?,
        },
        "hover" => BrowserAction::Hover {
            coordinate: validate_pair(tool, "coordinate", &required("coordinate")?)?,
        },
        "type" => BrowserAction::Type {
            text: required("text")?,
        },
        "resize" => BrowserAction::Resize {
            size: validate_pair(tool, "size", &required("size")?)?,
        },
        "scroll_down" => BrowserAction::ScrollDown,
        "scroll_up" => BrowserAction::ScrollUp,
        "close" => BrowserAction::Close,
        other => {
            return Err(CoreError::validation(format!(
                "Unknown browser action '{}'. Use one of: launch, click, hover, type, resize, scroll_down, scroll_up, close",
                other
            )))
        }
    })
}

fn render_result(action: &BrowserAction, result: &BrowserActionResult) -> String {
    if matches!(action, BrowserAction::Close) {
        return "The browser has been closed. You may now proceed to using other tools.".to_string();
    }
    let logs = if result.logs.trim().is_empty() {
        "(No new logs)"
    } else {
        result.logs.trim()
    };
    let mut text = format!("The browser action '{}' has been executed.", action.as_str());
    if let Some(url) = &result.current_url {
        text.push_str(&format!("\nCurrent URL: {}", url));
    }
    text.push_str(&format!("\n\nConsole logs:\n{}", logs));
    text
}

impl ToolDefinitionTrait for BrowserActionTool {
    fn name(&self) -> ToolName {
        ToolName::BrowserAction
    }

    fn description(&self) -> &str {
        "Interact with a browser: launch a URL, click, hover, type, resize, scroll or close."
    }

    fn required_params(&self) -> &'static [&'static str] {
        &["action"]
    }

    fn optional_params(&self) -> &'static [&'static str] {
        &["url", "coordinate", "size", "text"]
    }
}

#[async_trait]
impl ToolHandler for BrowserActionTool {
    type Params = BrowserAction;

    fn parse_legacy(&self, params: &LegacyParams) -> CoreResult<BrowserAction> {
        build_action(self.name(), |name| params.get(name).cloned())
    }

    fn parse_native(&self, args: &Value) -> CoreResult<BrowserAction> {
        build_action(self.name(), |name| match args.get(name) {
            Some(Value::String(s)) => Some(s.clone()),
            Some(Value::Null) | None => None,
            Some(other) => Some(other.to_string()),
        })
    }

    fn usage_summary(&self, action: &BrowserAction) -> String {
        match action {
            BrowserAction::Launch { url } => format!("browser launch {}", url),
            other => format!("browser {}", other.as_str()),
        }
    }

    async fn handle_partial(&self, tool_use: &ToolUse, cb: &mut ToolCallbacks<'_>) -> CoreResult<()> {
        if tool_use.param("action").as_deref() != Some("launch") {
            return Ok(());
        }
        match tool_use.param("url") {
            Some(url) => cb.update_partial(AskKind::BrowserActionLaunch, &url).await,
            None => Ok(()),
        }
    }

    async fn execute(&self, action: BrowserAction, cb: &mut ToolCallbacks<'_>) -> CoreResult<()> {
        if let BrowserAction::Launch { url } = &action {
            if !cb.ask_approval(AskKind::BrowserActionLaunch, url).await? {
                return Ok(());
            }
        }

        let Some(browser) = cb.session.backends.browser.clone() else {
            cb.push_tool_result(tool_error("Browser actions are not available in this session."));
            return Ok(());
        };
        let result = browser.perform(&action).await?;
        tracing::debug!("[browser_action] {} done", action.as_str());

        let images = result.screenshot.clone().into_iter().collect();
        cb.push_tool_result(ToolResult::ok_with_images(render_result(&action, &result), images));
        Ok(())
    }
}
