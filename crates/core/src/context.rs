//! Execution Context
//!
//! Read-only session information shared by the dispatcher and tool
//! implementations:
//!
//! 1. `ExecutionContext` trait - immutable base shared across scopes
//! 2. `ToolContext` - concrete context carried by an agent run
//!
//! Tools receive the context by reference and cannot change the workspace
//! layout or the session identity.

use std::path::{Path, PathBuf};

// ============================================================================
// ExecutionContext Trait
// ============================================================================

/// Base execution context providing immutable session information.
pub trait ExecutionContext: Send + Sync {
    /// Unique session identifier for this agent run.
    fn session_id(&self) -> &str;

    /// All workspace roots, in the order the host reported them.
    fn workspace_roots(&self) -> &[PathBuf];

    /// Directory relative paths are resolved against.
    fn cwd(&self) -> &Path;

    /// The primary workspace root, if any.
    fn primary_root(&self) -> Option<&Path> {
        self.workspace_roots().first().map(PathBuf::as_path)
    }
}

// ============================================================================
// ToolContext
// ============================================================================

/// Context for one agent run.
#[derive(Debug, Clone)]
pub struct ToolContext {
    session_id: String,
    workspace_roots: Vec<PathBuf>,
    cwd: PathBuf,
}

impl ToolContext {
    /// Create a context whose cwd is the first workspace root.
    ///
    /// With no roots the cwd falls back to the process working directory,
    /// or `/` if that is unavailable.
    pub fn new(session_id: impl Into<String>, workspace_roots: Vec<PathBuf>) -> Self {
        let cwd = workspace_roots
            .first()
            .cloned()
            .or_else(|| std::env::current_dir().ok())
            .unwrap_or_else(|| PathBuf::from("/"));
        Self {
            session_id: session_id.into(),
            workspace_roots,
            cwd,
        }
    }

    /// Override the working directory.
    pub fn with_cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = cwd.into();
        self
    }

    /// Resolve a model-supplied path against the cwd.
    pub fn resolve(&self, path: &str) -> PathBuf {
        let candidate = Path::new(path);
        if candidate.is_absolute() {
            candidate.to_path_buf()
        } else {
            self.cwd.join(candidate)
        }
    }

    /// Render an absolute path relative to the cwd when it lies beneath it.
    pub fn display_path(&self, path: &Path) -> String {
        path.strip_prefix(&self.cwd)
            .map(|rel| rel.to_string_lossy().replace('\\', "/"))
            .unwrap_or_else(|_| path.to_string_lossy().into_owned())
    }
}

impl ExecutionContext for ToolContext {
    fn session_id(&self) -> &str {
        &self.session_id
    }

    fn workspace_roots(&self) -> &[PathBuf] {
        &self.workspace_roots
    }

    fn cwd(&self) -> &Path {
        &self.cwd
    }
}
