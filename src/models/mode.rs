//! Mode Models
//!
//! Agent modes the session can switch between or start sub-tasks in.

use serde::{Deserialize, Serialize};

/// One selectable agent mode
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ModeInfo {
    pub slug: String,
    pub name: String,
}

impl ModeInfo {
    pub fn new(slug: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            slug: slug.into(),
            name: name.into(),
        }
    }
}

/// Built-in modes offered when the host supplies none.
pub fn default_modes() -> Vec<ModeInfo> {
    vec![
        ModeInfo::new("code", "Code"),
        ModeInfo::new("architect", "Architect"),
        ModeInfo::new("ask", "Ask"),
        ModeInfo::new("debug", "Debug"),
        ModeInfo::new("orchestrator", "Orchestrator"),
    ]
}

/// Look a mode up by slug.
pub fn find_mode<'a>(modes: &'a [ModeInfo], slug: &str) -> Option<&'a ModeInfo> {
    modes.iter().find(|mode| mode.slug == slug)
}
