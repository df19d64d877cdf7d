//! Ignore rules applied while walking a directory input.
//!
//! Rules are tested against the POSIX-style path relative to the directory being walked.
//! The built-in list always applies; a `.gitignore` at the root of a directory input is
//! layered on top as a second, independent rule. Any matching rule excludes the path.

use ignore::gitignore::{Gitignore, GitignoreBuilder};
use std::path::Path;
use tracing::debug;

use crate::error::PublishError;

/// Patterns (gitignore syntax) excluded from every directory walk.
pub const BUILTIN_PATTERNS: &[&str] = &[
    // version control metadata
    ".git/",
    ".svn/",
    ".hg/",
    // dependency caches
    "node_modules/",
    "bower_components/",
    ".venv/",
    // OS artifacts
    ".DS_Store",
    "Thumbs.db",
    "desktop.ini",
    // environment secrets
    ".env",
    ".env.*",
    // logs
    "*.log",
    // build and cache output
    "dist/",
    "build/",
    "target/",
    ".next/",
    ".nuxt/",
    ".cache/",
    "__pycache__/",
];

/// A predicate deciding whether a relative path is excluded from discovery.
pub trait IgnoreRule: Send + Sync {
    /// `rel_path` is relative to the walk root; `is_dir` is true for directories.
    fn is_ignored(&self, rel_path: &Path, is_dir: bool) -> bool;
}

/// Gitignore-syntax matcher, used for both the built-in list and `.gitignore` files.
#[derive(Debug)]
pub struct GitignoreRule {
    matcher: Gitignore,
    pattern_count: usize,
}

impl GitignoreRule {
    pub fn builtin() -> Result<Self, PublishError> {
        Self::from_lines(Path::new(""), BUILTIN_PATTERNS.iter().copied(), Path::new("<builtin>"))
    }

    /// Loads `<root>/.gitignore`. Returns `Ok(None)` when the file does not exist.
    pub fn load(root: &Path) -> Result<Option<Self>, PublishError> {
        let path = root.join(".gitignore");
        if !path.is_file() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&path).map_err(|source| PublishError::Io {
            path: path.clone(),
            source,
        })?;
        let rule = Self::from_lines(root, content.lines(), &path)?;
        debug!(path = %path.display(), patterns = rule.pattern_count, "Loaded .gitignore");
        Ok(Some(rule))
    }

    pub fn from_lines<'a>(
        root: &Path,
        lines: impl IntoIterator<Item = &'a str>,
        source: &Path,
    ) -> Result<Self, PublishError> {
        let mut builder = GitignoreBuilder::new(root);
        let mut pattern_count = 0;
        for line in lines {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            builder
                .add_line(Some(source.to_path_buf()), line)
                .map_err(|e| PublishError::InvalidIgnoreRules {
                    path: source.to_path_buf(),
                    message: e.to_string(),
                })?;
            pattern_count += 1;
        }
        let matcher = builder.build().map_err(|e| PublishError::InvalidIgnoreRules {
            path: source.to_path_buf(),
            message: e.to_string(),
        })?;
        Ok(Self {
            matcher,
            pattern_count,
        })
    }

    pub fn pattern_count(&self) -> usize {
        self.pattern_count
    }
}

impl IgnoreRule for GitignoreRule {
    fn is_ignored(&self, rel_path: &Path, is_dir: bool) -> bool {
        self.matcher
            .matched_path_or_any_parents(rel_path, is_dir)
            .is_ignore()
    }
}

/// Composition of rules; a path is ignored if any member ignores it.
#[derive(Default)]
pub struct IgnoreSet {
    rules: Vec<Box<dyn IgnoreRule>>,
}

impl IgnoreSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in list alone.
    pub fn builtin() -> Result<Self, PublishError> {
        Ok(Self::new().with(GitignoreRule::builtin()?))
    }

    /// The built-in list plus the directory's own `.gitignore`, if present.
    pub fn for_directory(root: &Path) -> Result<Self, PublishError> {
        let mut set = Self::builtin()?;
        if let Some(gitignore) = GitignoreRule::load(root)? {
            set.push(gitignore);
        }
        Ok(set)
    }

    pub fn with(mut self, rule: impl IgnoreRule + 'static) -> Self {
        self.push(rule);
        self
    }

    pub fn push(&mut self, rule: impl IgnoreRule + 'static) {
        self.rules.push(Box::new(rule));
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl IgnoreRule for IgnoreSet {
    fn is_ignored(&self, rel_path: &Path, is_dir: bool) -> bool {
        self.rules.iter().any(|r| r.is_ignored(rel_path, is_dir))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn builtin() -> IgnoreSet {
        IgnoreSet::builtin().unwrap()
    }

    #[test]
    fn vcs_metadata_is_ignored_at_any_depth() {
        let set = builtin();
        assert!(set.is_ignored(Path::new(".git"), true));
        assert!(set.is_ignored(Path::new(".git/HEAD"), false));
        assert!(set.is_ignored(Path::new("docs/.git/notes.md"), false));
    }

    #[test]
    fn secrets_logs_and_artifacts_are_ignored() {
        let set = builtin();
        assert!(set.is_ignored(Path::new(".env"), false));
        assert!(set.is_ignored(Path::new(".env.local"), false));
        assert!(set.is_ignored(Path::new("logs/server.log"), false));
        assert!(set.is_ignored(Path::new("img/.DS_Store"), false));
        assert!(set.is_ignored(Path::new("node_modules/pkg/readme.md"), false));
        assert!(set.is_ignored(Path::new("dist/index.md"), false));
    }

    #[test]
    fn ordinary_content_is_kept() {
        let set = builtin();
        assert!(!set.is_ignored(Path::new("README.md"), false));
        assert!(!set.is_ignored(Path::new("docs/guide.md"), false));
        assert!(!set.is_ignored(Path::new("img/logo.png"), false));
        assert!(!set.is_ignored(Path::new(".gitignore"), false));
    }

    #[test]
    fn gitignore_rules_compose_with_builtins() {
        let gitignore = GitignoreRule::from_lines(
            Path::new(""),
            ["# drafts", "drafts/", "*.tmp", ""],
            Path::new(".gitignore"),
        )
        .unwrap();
        assert_eq!(gitignore.pattern_count(), 2);

        let set = builtin().with(gitignore);
        assert_eq!(set.len(), 2);
        assert!(set.is_ignored(Path::new("drafts/wip.md"), false));
        assert!(set.is_ignored(Path::new("scratch.tmp"), false));
        assert!(set.is_ignored(Path::new(".git/config"), false));
        assert!(!set.is_ignored(Path::new("posts/final.md"), false));
    }

    #[test]
    fn empty_set_ignores_nothing() {
        let set = IgnoreSet::new();
        assert!(set.is_empty());
        assert!(!set.is_ignored(Path::new(".git/HEAD"), false));
    }
}
