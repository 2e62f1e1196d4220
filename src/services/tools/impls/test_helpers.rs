//! Shared test utilities for tool unit tests.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;

use agent_gate_core::{CoreResult, TodoItem, ToolContext};
use agent_gate_tools::ToolResult;

use crate::models::settings::AutoApprovalSettings;
use crate::services::orchestrator::ApprovalChannel;
use crate::services::tools::approval::ToolCallbacks;
use crate::services::tools::backends::{
    BrowserAction, BrowserActionResult, BrowserSession, DiffPreview, McpHub, McpOutput,
    TaskSpawner, ToolBackends,
};
use crate::services::tools::session::ToolSession;
use crate::services::tools::trait_def::ToolHandler;
use crate::storage::config::StaticSettings;

/// Session rooted at `dir` with no auto-approval settings and local backends.
pub(crate) fn make_test_session(dir: &Path) -> ToolSession {
    ToolSession::new(
        ToolContext::new("test", vec![dir.to_path_buf()]),
        Arc::new(StaticSettings::none()),
        ToolBackends::local(),
    )
}

pub(crate) fn make_session_with_settings(dir: &Path, settings: AutoApprovalSettings) -> ToolSession {
    ToolSession::new(
        ToolContext::new("test", vec![dir.to_path_buf()]),
        Arc::new(StaticSettings::new(settings)),
        ToolBackends::local(),
    )
}

/// Execute a handler directly and return what it pushed.
pub(crate) async fn run_tool<T: ToolHandler>(
    tool: &T,
    params: T::Params,
    session: &mut ToolSession,
    channel: &dyn ApprovalChannel,
) -> CoreResult<ToolResult> {
    let mut cb = ToolCallbacks::new(session, channel);
    tool.execute(params, &mut cb).await?;
    Ok(cb
        .take_result()
        .unwrap_or_else(agent_gate_tools::responses::no_output))
}

/// Records calls and answers with canned output.
#[derive(Default)]
pub(crate) struct RecordingMcpHub {
    pub calls: Mutex<Vec<String>>,
}

#[async_trait]
impl McpHub for RecordingMcpHub {
    async fn call_tool(
        &self,
        server_name: &str,
        tool_name: &str,
        arguments: Option<Value>,
    ) -> CoreResult<McpOutput> {
        let args = arguments.map(|a| a.to_string()).unwrap_or_default();
        self.calls
            .lock()
            .unwrap()
            .push(format!("{}/{} {}", server_name, tool_name, args));
        Ok(McpOutput {
            text: format!("called {}", tool_name),
            images: Vec::new(),
        })
    }

    async fn read_resource(&self, server_name: &str, uri: &str) -> CoreResult<McpOutput> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("{} {}", server_name, uri));
        Ok(McpOutput {
            text: format!("contents of {}", uri),
            images: Vec::new(),
        })
    }
}

#[derive(Default)]
pub(crate) struct RecordingBrowser {
    pub actions: Mutex<Vec<BrowserAction>>,
}

#[async_trait]
impl BrowserSession for RecordingBrowser {
    async fn perform(&self, action: &BrowserAction) -> CoreResult<BrowserActionResult> {
        self.actions.lock().unwrap().push(action.clone());
        Ok(BrowserActionResult {
            screenshot: Some("data:image/png;base64,AAAA".into()),
            logs: "console ready".into(),
            current_url: Some("http://localhost:3000".into()),
        })
    }
}

#[derive(Default)]
pub(crate) struct RecordingDiffPreview {
    pub events: Mutex<Vec<String>>,
}

#[async_trait]
impl DiffPreview for RecordingDiffPreview {
    async fn open(&self, path: &Path, _original: Option<&str>, _proposed: &str) -> CoreResult<()> {
        self.events.lock().unwrap().push(format!("open {}", path.display()));
        Ok(())
    }

    async fn revert(&self, path: &Path) -> CoreResult<()> {
        self.events.lock().unwrap().push(format!("revert {}", path.display()));
        Ok(())
    }

    async fn close(&self, path: &Path) -> CoreResult<()> {
        self.events.lock().unwrap().push(format!("close {}", path.display()));
        Ok(())
    }
}

#[derive(Default)]
pub(crate) struct RecordingSpawner {
    pub spawned: Mutex<Vec<(String, String, usize)>>,
}

#[async_trait]
impl TaskSpawner for RecordingSpawner {
    async fn spawn(&self, mode: &str, message: &str, todos: &[TodoItem]) -> CoreResult<String> {
        let mut spawned = self.spawned.lock().unwrap();
        spawned.push((mode.to_string(), message.to_string(), todos.len()));
        Ok(format!("task-{}", spawned.len()))
    }
}
