//! Command Matcher
//!
//! Classifies a shell command against the allowed / denied pattern lists.
//!
//! Compound commands (`a && b`, `a | b`, `a; b`, ...) are split into
//! sub-commands and every sub-command is judged on its own:
//! - any sub-command matching a deny pattern denies the whole command
//! - the whole command auto-approves only if every sub-command is allowed
//! - commands using command or process substitution never auto-approve

use serde::{Deserialize, Serialize};

/// Outcome of matching one command string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandDecision {
    AutoApprove,
    AutoDeny,
    Ask,
}

/// Classify a command against allowed and denied pattern lists.
///
/// Deny patterns are checked first and win outright. Empty commands and
/// empty pattern lists yield `Ask`.
pub fn classify_command(command: &str, allowed: &[String], denied: &[String]) -> CommandDecision {
    let command = command.trim();
    if command.is_empty() {
        return CommandDecision::Ask;
    }

    let parts = split_compound_command(command);
    if parts.is_empty() {
        return CommandDecision::Ask;
    }

    if parts
        .iter()
        .any(|part| denied.iter().any(|pattern| pattern_matches(pattern, part, MatchMode::Prefix)))
    {
        return CommandDecision::AutoDeny;
    }

    if allowed.is_empty() || has_substitution(command) {
        return CommandDecision::Ask;
    }

    if parts
        .iter()
        .all(|part| allowed.iter().any(|pattern| pattern_matches(pattern, part, MatchMode::Token)))
    {
        CommandDecision::AutoApprove
    } else {
        CommandDecision::Ask
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MatchMode {
    /// Plain case-insensitive prefix (`rm` also catches `rmdir`)
    Prefix,
    /// Prefix that must end on a word boundary (`git` does not admit `gitk`)
    Token,
}

fn pattern_matches(pattern: &str, command: &str, mode: MatchMode) -> bool {
    let pattern = pattern.trim();
    if pattern.is_empty() {
        return false;
    }
    if pattern == "*" {
        return true;
    }

    if pattern.contains(['*', '?', '[']) {
        if let Ok(glob) = glob::Pattern::new(&pattern.to_lowercase()) {
            let lowered = command.to_lowercase();
            let leading = lowered.split_whitespace().next().unwrap_or("");
            return glob.matches(&lowered) || glob.matches(leading);
        }
    }

    let command = command.to_lowercase();
    let pattern = pattern.to_lowercase();
    if !command.starts_with(&pattern) {
        return false;
    }
    match mode {
        MatchMode::Prefix => true,
        MatchMode::Token => {
            let rest = &command[pattern.len()..];
            rest.is_empty()
                || rest.starts_with(char::is_whitespace)
                || !pattern.ends_with(|c: char| c.is_alphanumeric() || c == '_' || c == '-')
        }
    }
}

/// Whether the command runs nested commands whose text the matcher cannot see.
pub fn has_substitution(command: &str) -> bool {
    command.contains("$(") || command.contains('`') || command.contains("<(") || command.contains(">(")
}

/// Split a command line on `&&`, `||`, `;`, `|`, `&` and newlines.
///
/// Separators inside single or double quotes, escaped characters, and the
/// `&` of redirections such as `2>&1` or `&>` do not split.
pub fn split_compound_command(command: &str) -> Vec<String> {
    let chars: Vec<char> = command.chars().collect();
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut in_single = false;
    let mut in_double = false;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            '\\' if !in_single => {
                current.push(c);
                if let Some(&next) = chars.get(i + 1) {
                    current.push(next);
                    i += 1;
                }
            }
            '\'' if !in_double => {
                in_single = !in_single;
                current.push(c);
            }
            '"' if !in_single => {
                in_double = !in_double;
                current.push(c);
            }
            _ if in_single || in_double => current.push(c),
            ';' | '\n' | '\r' => flush(&mut current, &mut parts),
            '|' => {
                if chars.get(i + 1) == Some(&'|') {
                    i += 1;
                }
                flush(&mut current, &mut parts);
            }
            '&' => {
                let prev = if i > 0 { chars.get(i - 1) } else { None };
                let next = chars.get(i + 1);
                if prev == Some(&'>') || next == Some(&'>') {
                    current.push(c);
                } else {
                    if next == Some(&'&') {
                        i += 1;
                    }
                    flush(&mut current, &mut parts);
                }
            }
            _ => current.push(c),
        }
        i += 1;
    }
    flush(&mut current, &mut parts);

    parts
}

fn flush(current: &mut String, parts: &mut Vec<String>) {
    let part = current.trim();
    if !part.is_empty() {
        parts.push(part.to_string());
    }
    current.clear();
}
