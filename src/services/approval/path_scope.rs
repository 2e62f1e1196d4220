//! Path Scope Checker
//!
//! Workspace membership, allowed-directory patterns, and protected files.
//!
//! All checks are lexical: paths are made absolute and `.`/`..` segments are
//! folded without touching the filesystem, so a file that does not exist yet
//! (a write target) is judged the same way as one that does.

use std::path::{Component, Path, PathBuf};

use ignore::gitignore::{Gitignore, GitignoreBuilder};

use crate::utils::paths::expand_tilde;

/// Files the agent may not write without the protected-write override.
pub const DEFAULT_PROTECTED_PATTERNS: &[&str] = &[
    ".gateignore",
    ".gatemodes",
    ".gaterules*",
    ".agent-gate/**",
    ".vscode/**",
    "*.code-workspace",
    "AGENTS.md",
    "AGENT.md",
];

/// Fold `.` and `..` segments without consulting the filesystem.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match normalized.components().next_back() {
                Some(Component::Normal(_)) => {
                    normalized.pop();
                }
                // `..` at the root stays at the root
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                // Leading `..` of a relative path accumulate
                _ => normalized.push(".."),
            },
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}

/// The set of workspace roots for one session.
#[derive(Debug, Clone, Default)]
pub struct WorkspaceScope {
    roots: Vec<PathBuf>,
}

impl WorkspaceScope {
    /// Relative roots are taken from the process working directory.
    pub fn new(roots: impl IntoIterator<Item = PathBuf>) -> Self {
        let cwd = std::env::current_dir().ok();
        Self {
            roots: roots
                .into_iter()
                .map(|root| match &cwd {
                    Some(cwd) if root.is_relative() => normalize_path(&cwd.join(root)),
                    _ => normalize_path(&root),
                })
                .collect(),
        }
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    /// Absolute, normalized form of a model- or settings-supplied path.
    ///
    /// `~` expands to the home directory; relative paths resolve against the
    /// first root, or the process working directory with no roots.
    pub fn resolve(&self, path: impl AsRef<Path>) -> PathBuf {
        let path = path.as_ref();
        let expanded = match path.to_str() {
            Some(text) => expand_tilde(text),
            None => path.to_path_buf(),
        };
        if expanded.is_absolute() {
            return normalize_path(&expanded);
        }
        let base = self
            .roots
            .first()
            .cloned()
            .or_else(|| std::env::current_dir().ok())
            .unwrap_or_else(|| PathBuf::from("/"));
        normalize_path(&base.join(expanded))
    }

    /// True unless the path lies under one of the roots.
    ///
    /// With no roots every path is outside.
    pub fn is_outside_workspace(&self, path: impl AsRef<Path>) -> bool {
        if self.roots.is_empty() {
            return true;
        }
        let resolved = self.resolve(path);
        !self.roots.iter().any(|root| resolved.starts_with(root))
    }

    /// Allowed-directory check with relative patterns anchored at the first root.
    pub fn is_in_allowed_directories(&self, path: impl AsRef<Path>, patterns: &[String]) -> bool {
        if patterns.is_empty() {
            return false;
        }
        let resolved = self.resolve(path);
        patterns
            .iter()
            .any(|pattern| pattern_covers(&self.resolve(pattern.trim()), &resolved))
    }

    /// The path relative to whichever root contains it.
    pub fn relative_to_root(&self, path: impl AsRef<Path>) -> Option<PathBuf> {
        let resolved = self.resolve(path);
        self.roots
            .iter()
            .find_map(|root| resolved.strip_prefix(root).ok().map(Path::to_path_buf))
    }
}

/// Whether `path` falls under any of `patterns`.
///
/// Free-standing form of [`WorkspaceScope::is_in_allowed_directories`];
/// relative patterns resolve against `base`.
pub fn is_in_allowed_directories(path: &Path, patterns: &[String], base: &Path) -> bool {
    WorkspaceScope::new([base.to_path_buf()]).is_in_allowed_directories(path, patterns)
}

/// A pattern covers a path when the path is under the pattern's directory,
/// or when it matches the wildcard part evaluated from the fixed prefix.
fn pattern_covers(pattern: &Path, path: &Path) -> bool {
    let mut prefix = PathBuf::new();
    let mut remainder: Vec<String> = Vec::new();
    for component in pattern.components() {
        let text = component.as_os_str().to_string_lossy();
        if remainder.is_empty() && !text.contains(['*', '?', '[']) {
            prefix.push(component.as_os_str());
        } else {
            remainder.push(text.into_owned());
        }
    }

    let Ok(relative) = path.strip_prefix(&prefix) else {
        return false;
    };
    if remainder.is_empty() {
        return true;
    }
    if relative.as_os_str().is_empty() {
        return false;
    }

    let mut builder = GitignoreBuilder::new(&prefix);
    if let Err(e) = builder.add_line(None, &format!("/{}", remainder.join("/"))) {
        tracing::warn!("[path-scope] invalid directory pattern {}: {}", pattern.display(), e);
        return false;
    }
    let matcher = match builder.build() {
        Ok(matcher) => matcher,
        Err(e) => {
            tracing::warn!("[path-scope] failed to build directory pattern {}: {}", pattern.display(), e);
            return false;
        }
    };
    matcher
        .matched_path_or_any_parents(relative, false)
        .is_ignore()
}

/// Gitignore-style matcher for files that need the protected-write override.
#[derive(Debug, Clone)]
pub struct ProtectedPaths {
    matcher: Gitignore,
}

impl ProtectedPaths {
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Self {
        let mut builder = GitignoreBuilder::new("");
        for pattern in patterns {
            if let Err(e) = builder.add_line(None, pattern.as_ref()) {
                tracing::warn!("[path-scope] invalid protected pattern {}: {}", pattern.as_ref(), e);
            }
        }
        let matcher = builder.build().unwrap_or_else(|e| {
            tracing::warn!("[path-scope] failed to build protected patterns, nothing is protected: {}", e);
            Gitignore::empty()
        });
        Self { matcher }
    }

    /// Whether a path inside the workspace is protected.
    ///
    /// Paths outside every root are never protected; the outside-workspace
    /// rules govern them instead.
    pub fn is_protected(&self, scope: &WorkspaceScope, path: impl AsRef<Path>) -> bool {
        match scope.relative_to_root(path) {
            Some(relative) if !relative.as_os_str().is_empty() => self
                .matcher
                .matched_path_or_any_parents(&relative, false)
                .is_ignore(),
            _ => false,
        }
    }
}

impl Default for ProtectedPaths {
    fn default() -> Self {
        Self::new(DEFAULT_PROTECTED_PATTERNS)
    }
}
