//! Path Utilities
//!
//! Resolving the user's home directory, the Agent Gate config directory
//! (~/.agent-gate/), and `~`-prefixed paths supplied in settings.

use std::path::{Path, PathBuf};

use crate::utils::error::{AppError, AppResult};

/// Get the user's home directory
pub fn home_dir() -> AppResult<PathBuf> {
    dirs::home_dir().ok_or_else(|| AppError::config("Could not determine home directory"))
}

/// Get the Agent Gate directory (~/.agent-gate/)
pub fn agent_gate_dir() -> AppResult<PathBuf> {
    Ok(home_dir()?.join(".agent-gate"))
}

/// Get the auto-approval settings path (~/.agent-gate/auto-approval.json)
pub fn settings_path() -> AppResult<PathBuf> {
    Ok(agent_gate_dir()?.join("auto-approval.json"))
}

/// Ensure a directory exists, creating it if necessary
pub fn ensure_dir(path: &Path) -> AppResult<()> {
    if !path.exists() {
        std::fs::create_dir_all(path)?;
    }
    Ok(())
}

/// Expand a leading `~` to the home directory.
///
/// Paths without the prefix, and `~user` forms, are returned unchanged.
/// When the home directory is unknown the input is returned as-is.
pub fn expand_tilde(path: &str) -> PathBuf {
    let rest = if path == "~" {
        Some("")
    } else {
        path.strip_prefix("~/").or_else(|| path.strip_prefix("~\\"))
    };
    match (rest, dirs::home_dir()) {
        (Some(rest), Some(home)) if rest.is_empty() => home,
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(path),
    }
}
