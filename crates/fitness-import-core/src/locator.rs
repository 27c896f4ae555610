//! Source file discovery.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::types::FileError;

/// Files found under a root, plus anything the walker could not read.
#[derive(Debug, Default)]
pub struct Located {
    /// Root-relative paths, sorted.
    pub files: Vec<PathBuf>,
    /// Walk errors (unreadable directories). Symlink loops are skipped.
    pub errors: Vec<FileError>,
}

/// Enumerates candidate source files under a root directory.
#[derive(Debug, Clone)]
pub struct SourceLocator {
    root: PathBuf,
    extensions: Vec<String>,
    exclude: Vec<String>,
    respect_gitignore: bool,
    follow_links: bool,
}

impl SourceLocator {
    /// Creates a locator for files with the given extensions (no dot).
    #[must_use]
    pub fn new<I, S>(root: impl Into<PathBuf>, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            root: root.into(),
            extensions: extensions.into_iter().map(Into::into).collect(),
            exclude: Vec::new(),
            respect_gitignore: false,
            follow_links: false,
        }
    }

    /// Adds exclude filters (substrings or glob patterns).
    #[must_use]
    pub fn excludes<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude.extend(patterns.into_iter().map(Into::into));
        self
    }

    /// Sets whether `.gitignore` files are honored.
    #[must_use]
    pub fn respect_gitignore(mut self, yes: bool) -> Self {
        self.respect_gitignore = yes;
        self
    }

    /// Sets whether symbolic links are followed.
    #[must_use]
    pub fn follow_links(mut self, yes: bool) -> Self {
        self.follow_links = yes;
        self
    }

    /// Walks the root and returns matching files in lexicographic order.
    #[must_use]
    pub fn locate(&self) -> Located {
        let mut builder = ignore::WalkBuilder::new(&self.root);
        builder
            .standard_filters(false)
            .hidden(false)
            .git_ignore(self.respect_gitignore)
            .require_git(false)
            .follow_links(self.follow_links)
            .sort_by_file_name(|a, b| a.cmp(b));

        let mut located = Located::default();
        let mut seen: HashSet<PathBuf> = HashSet::new();
        let canonical_root = std::fs::canonicalize(&self.root).ok();

        for entry in builder.build() {
            let entry = match entry {
                Ok(e) => e,
                Err(e) if is_loop(&e) => {
                    debug!("Skipping symlink loop: {e}");
                    continue;
                }
                Err(e) => {
                    warn!("Skipping unreadable entry: {e}");
                    let path = error_path(&e)
                        .map_or_else(|| self.root.clone(), |p| self.relative(&p));
                    located.errors.push(FileError::Io {
                        path,
                        message: e.to_string(),
                    });
                    continue;
                }
            };

            let path = entry.path();
            if !entry.file_type().is_some_and(|t| t.is_file()) {
                continue;
            }
            if !self.has_extension(path) {
                continue;
            }

            // The same real file may be reachable through several links;
            // it is recorded under its real location when that lies in the root.
            let real = std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
            let rel = canonical_root
                .as_deref()
                .and_then(|root| real.strip_prefix(root).ok())
                .map_or_else(|| self.relative(path), Path::to_path_buf);

            if self.should_exclude(&rel) {
                debug!("Excluding: {}", rel.display());
                continue;
            }
            if !seen.insert(real) {
                debug!("Already visited: {}", rel.display());
                continue;
            }

            located.files.push(rel);
        }

        located.files.sort();
        located.errors.sort();
        located
    }

    fn relative(&self, path: &Path) -> PathBuf {
        path.strip_prefix(&self.root).unwrap_or(path).to_path_buf()
    }

    fn has_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| self.extensions.iter().any(|x| x == ext))
    }

    /// Checks a root-relative path against the exclude filters.
    fn should_exclude(&self, rel: &Path) -> bool {
        let path_str = rel.to_string_lossy();

        for pattern in &self.exclude {
            if is_glob(pattern) {
                if let Ok(glob_pattern) = glob::Pattern::new(pattern) {
                    if glob_pattern.matches(&path_str) {
                        return true;
                    }
                }
                // Also check as substring for patterns like "**/generated/**"
                let normalized = pattern.replace("**/", "").replace("/**", "");
                if !normalized.is_empty()
                    && !is_glob(&normalized)
                    && path_str.contains(&normalized)
                {
                    return true;
                }
            } else if !pattern.is_empty() && path_str.contains(pattern.as_str()) {
                return true;
            }
        }

        false
    }
}

fn is_glob(pattern: &str) -> bool {
    pattern.contains(['*', '?', '['])
}

/// Whether a (possibly nested) walker error is a symlink loop.
fn is_loop(err: &ignore::Error) -> bool {
    match err {
        ignore::Error::Loop { .. } => true,
        ignore::Error::WithPath { err, .. }
        | ignore::Error::WithDepth { err, .. }
        | ignore::Error::WithLineNumber { err, .. } => is_loop(err),
        _ => false,
    }
}

/// Digs the offending path out of a (possibly nested) walker error.
fn error_path(err: &ignore::Error) -> Option<PathBuf> {
    match err {
        ignore::Error::WithPath { path, .. } => Some(path.clone()),
        ignore::Error::WithDepth { err, .. } | ignore::Error::WithLineNumber { err, .. } => {
            error_path(err)
        }
        ignore::Error::Partial(errs) => errs.iter().find_map(error_path),
        _ => None,
    }
}
