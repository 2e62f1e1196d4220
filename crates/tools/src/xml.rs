//! Legacy XML Tool-Call Parsing
//!
//! Models on the legacy protocol write tool calls inline in their text:
//!
//! ```text
//! I'll look at the entry point.
//! <read_file>
//! <path>src/main.rs</path>
//! </read_file>
//! ```
//!
//! `parse_assistant_message` splits such a message into ordered text and
//! tool-use blocks. It is called repeatedly on the growing message while the
//! stream is live, so anything still open at the end of the input is returned
//! with `partial = true` rather than dropped.

use agent_gate_core::{LegacyParams, ToolName, ToolUse, PARAM_NAMES};

/// One piece of an assistant message.
#[derive(Debug, Clone, PartialEq)]
pub enum AssistantBlock {
    Text { content: String, partial: bool },
    ToolUse(ToolUse),
}

impl AssistantBlock {
    pub fn is_partial(&self) -> bool {
        match self {
            AssistantBlock::Text { partial, .. } => *partial,
            AssistantBlock::ToolUse(tool_use) => tool_use.partial,
        }
    }

    pub fn as_tool_use(&self) -> Option<&ToolUse> {
        match self {
            AssistantBlock::ToolUse(tool_use) => Some(tool_use),
            AssistantBlock::Text { .. } => None,
        }
    }
}

struct OpenTool {
    name: ToolName,
    /// Byte offset just past the opening tag
    body_start: usize,
    params: LegacyParams,
}

struct OpenParam {
    name: &'static str,
    value_start: usize,
}

/// Split an assistant message into text and tool-use blocks.
pub fn parse_assistant_message(message: &str) -> Vec<AssistantBlock> {
    let mut blocks = Vec::new();
    let mut text_start: Option<usize> = None;
    let mut tool: Option<OpenTool> = None;
    let mut param: Option<OpenParam> = None;

    for (i, ch) in message.char_indices() {
        let end = i + ch.len_utf8();
        let seen = &message[..end];

        if let Some(open_tool) = tool.as_mut() {
            if let Some(open_param) = param.as_ref() {
                let closing = format!("</{}>", open_param.name);
                let value = &message[open_param.value_start..end];
                if let Some(raw) = value.strip_suffix(closing.as_str()) {
                    open_tool
                        .params
                        .insert(open_param.name.to_string(), clean_value(open_param.name, raw));
                    param = None;
                }
                continue;
            }

            let closing = format!("</{}>", open_tool.name);
            if message[open_tool.body_start..end].ends_with(closing.as_str()) {
                if let Some(done) = tool.take() {
                    blocks.push(AssistantBlock::ToolUse(finish(done, false)));
                }
                continue;
            }

            if let Some(name) = PARAM_NAMES
                .iter()
                .copied()
                .find(|name| seen.ends_with(&format!("<{}>", name)))
            {
                param = Some(OpenParam {
                    name,
                    value_start: end,
                });
            }

            // Written content may itself contain `</content>`; keep the span
            // up to the last closing tag seen so far.
            if open_tool.name == ToolName::WriteToFile && seen.ends_with("</content>") {
                let body = &message[open_tool.body_start..end];
                if let (Some(open), Some(close)) = (body.find("<content>"), body.rfind("</content>")) {
                    let start = open + "<content>".len();
                    if close > start {
                        open_tool
                            .params
                            .insert("content".to_string(), clean_value("content", &body[start..close]));
                    }
                }
            }
            continue;
        }

        let opened = ToolName::ALL.iter().copied().find_map(|name| {
            let tag = format!("<{}>", name);
            seen.ends_with(&tag).then_some((name, tag.len()))
        });

        match opened {
            Some((name, tag_len)) => {
                if let Some(start) = text_start.take() {
                    let content = message[start..end - tag_len].trim();
                    if !content.is_empty() {
                        blocks.push(AssistantBlock::Text {
                            content: content.to_string(),
                            partial: false,
                        });
                    }
                }
                tool = Some(OpenTool {
                    name,
                    body_start: end,
                    params: LegacyParams::new(),
                });
            }
            None => {
                if text_start.is_none() {
                    text_start = Some(i);
                }
            }
        }
    }

    if let Some(mut open_tool) = tool {
        if let Some(open_param) = param {
            let raw = &message[open_param.value_start..];
            open_tool
                .params
                .insert(open_param.name.to_string(), clean_value(open_param.name, raw));
        }
        blocks.push(AssistantBlock::ToolUse(finish(open_tool, true)));
    }

    if let Some(start) = text_start {
        let content = message[start..].trim();
        if !content.is_empty() {
            blocks.push(AssistantBlock::Text {
                content: content.to_string(),
                partial: true,
            });
        }
    }

    blocks
}

/// Mark every block complete once the stream has ended.
pub fn complete_blocks(blocks: Vec<AssistantBlock>) -> Vec<AssistantBlock> {
    blocks
        .into_iter()
        .map(|block| match block {
            AssistantBlock::Text { content, .. } => AssistantBlock::Text {
                content,
                partial: false,
            },
            AssistantBlock::ToolUse(mut tool_use) => {
                tool_use.partial = false;
                AssistantBlock::ToolUse(tool_use)
            }
        })
        .collect()
}

fn finish(open_tool: OpenTool, partial: bool) -> ToolUse {
    let mut tool_use = ToolUse::legacy(open_tool.name, open_tool.params);
    tool_use.partial = partial;
    tool_use
}

/// File content keeps its inner whitespace; only one surrounding newline is
/// dropped on each side. Every other value is trimmed.
fn clean_value(name: &str, raw: &str) -> String {
    if name == "content" {
        let raw = raw.strip_prefix('\n').unwrap_or(raw);
        raw.strip_suffix('\n').unwrap_or(raw).to_string()
    } else {
        raw.trim().to_string()
    }
}
