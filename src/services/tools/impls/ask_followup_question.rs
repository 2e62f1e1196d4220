//! ask_followup_question Tool
//!
//! Puts a question to the human, optionally with suggested answers. A
//! suggestion may carry a mode; picking it switches the session to that
//! mode. With follow-up auto-approval on, the first suggestion is taken
//! if nobody answers before the configured timeout.

use std::sync::OnceLock;

use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;

use agent_gate_core::{AskKind, CoreError, CoreResult, LegacyParams, ToolName, ToolUse};
use agent_gate_tools::ToolResult;

use crate::models::mode::find_mode;
use crate::services::approval::{FollowupPayload, FollowupSuggestion};
use crate::services::tools::approval::ToolCallbacks;
use crate::services::tools::trait_def::{
    legacy_optional, legacy_required, ToolDefinitionTrait, ToolHandler,
};

fn suggest_re() -> Option<&'static Regex> {
    static SUGGEST: OnceLock<Option<Regex>> = OnceLock::new();
    SUGGEST
        .get_or_init(|| Regex::new(r#"(?s)<suggest(?:\s+mode="([^"]*)")?\s*>(.*?)</suggest>"#).ok())
        .as_ref()
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AskFollowupQuestionParams {
    pub question: String,
    #[serde(default)]
    pub follow_up: Vec<FollowupSuggestion>,
}

pub struct AskFollowupQuestionTool;

impl ToolDefinitionTrait for AskFollowupQuestionTool {
    fn name(&self) -> ToolName {
        ToolName::AskFollowupQuestion
    }

    fn description(&self) -> &str {
        "Ask the user a clarifying question, offering 2-4 suggested answers."
    }

    fn required_params(&self) -> &'static [&'static str] {
        &["question"]
    }

    fn optional_params(&self) -> &'static [&'static str] {
        &["follow_up"]
    }
}

/// `<suggest mode="x">answer</suggest>` blocks inside a legacy `follow_up`.
fn parse_suggestions(xml: &str) -> Vec<FollowupSuggestion> {
    let Some(re) = suggest_re() else {
        return Vec::new();
    };
    re.captures_iter(xml)
        .filter_map(|caps| {
            let answer = caps.get(2)?.as_str().trim();
            if answer.is_empty() {
                return None;
            }
            Some(FollowupSuggestion {
                answer: answer.to_string(),
                mode: caps
                    .get(1)
                    .map(|m| m.as_str().trim().to_string())
                    .filter(|m| !m.is_empty()),
            })
        })
        .collect()
}

/// Native suggestions: plain strings, or objects with `text`/`answer` and
/// an optional `mode`.
fn native_suggestions(value: Option<&Value>) -> CoreResult<Vec<FollowupSuggestion>> {
    let items = match value {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::String(xml)) => return Ok(parse_suggestions(xml)),
        Some(Value::Array(items)) => items,
        Some(_) => return Err(CoreError::parse("follow_up must be an array of suggestions")),
    };
    let mut suggestions = Vec::with_capacity(items.len());
    for item in items {
        let suggestion = match item {
            Value::String(answer) => FollowupSuggestion {
                answer: answer.clone(),
                mode: None,
            },
            Value::Object(map) => {
                let answer = map
                    .get("text")
                    .or_else(|| map.get("answer"))
                    .and_then(Value::as_str)
                    .ok_or_else(|| CoreError::parse("follow_up suggestion is missing its text"))?;
                FollowupSuggestion {
                    answer: answer.to_string(),
                    mode: map.get("mode").and_then(Value::as_str).map(str::to_string),
                }
            }
            _ => return Err(CoreError::parse("follow_up suggestion must be a string or object")),
        };
        suggestions.push(suggestion);
    }
    Ok(suggestions)
}

#[async_trait]
impl ToolHandler for AskFollowupQuestionTool {
    type Params = AskFollowupQuestionParams;

    fn parse_legacy(&self, params: &LegacyParams) -> CoreResult<AskFollowupQuestionParams> {
        Ok(AskFollowupQuestionParams {
            question: legacy_required(params, self.name(), "question")?,
            follow_up: legacy_optional(params, "follow_up")
                .map(|xml| parse_suggestions(&xml))
                .unwrap_or_default(),
        })
    }

    fn parse_native(&self, args: &Value) -> CoreResult<AskFollowupQuestionParams> {
        let question = args
            .get("question")
            .and_then(Value::as_str)
            .ok_or_else(|| CoreError::missing_parameter(self.name().as_str(), "question"))?;
        Ok(AskFollowupQuestionParams {
            question: question.to_string(),
            follow_up: native_suggestions(args.get("follow_up"))?,
        })
    }

    fn usage_summary(&self, params: &AskFollowupQuestionParams) -> String {
        format!("ask: {}", params.question)
    }

    async fn handle_partial(&self, tool_use: &ToolUse, cb: &mut ToolCallbacks<'_>) -> CoreResult<()> {
        let Some(question) = tool_use.param("question") else {
            return Ok(());
        };
        let payload = FollowupPayload {
            question,
            suggest: tool_use
                .param("follow_up")
                .map(|xml| parse_suggestions(&xml))
                .unwrap_or_default(),
        };
        cb.update_partial(AskKind::Followup, &payload.to_json()).await
    }

    async fn execute(&self, params: AskFollowupQuestionParams, cb: &mut ToolCallbacks<'_>) -> CoreResult<()> {
        let payload = FollowupPayload {
            question: params.question,
            suggest: params.follow_up,
        };
        let reply = cb.ask_question(AskKind::Followup, &payload.to_json()).await?;
        let answer = reply.text.clone().unwrap_or_default();

        let picked_mode = payload
            .suggest
            .iter()
            .find(|s| s.answer.trim() == answer.trim())
            .and_then(|s| s.mode.as_deref());
        if let Some(mode) = picked_mode {
            if find_mode(&cb.session.modes, mode).is_some() && cb.session.mode != mode {
                tracing::info!("[ask_followup_question] switching to mode {}", mode);
                cb.session.mode = mode.to_string();
            }
        }

        cb.push_tool_result(ToolResult::ok_with_images(
            format!("<answer>\n{}\n</answer>", answer),
            reply.images,
        ));
        Ok(())
    }
}
