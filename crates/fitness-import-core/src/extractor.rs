//! Language-agnostic extraction trait.
//!
//! `LanguageExtractor` is the extension point for adding new languages.
//! Implement it to teach fitness-import how to pull import declarations
//! out of a source file via Tree-sitter.

use std::path::{Path, PathBuf};

use crate::types::{FileError, ImportDeclaration};

/// Trait for language-specific import extraction.
///
/// Extractors hold no per-file state and may be shared across threads.
pub trait LanguageExtractor: Send + Sync {
    /// Language identifier (e.g., `"python"`).
    fn language_id(&self) -> &'static str;

    /// File extensions this extractor handles, without the dot
    /// (e.g., `&["py", "pyi"]`).
    fn extensions(&self) -> &'static [&'static str];

    /// Extracts import declarations in source order.
    ///
    /// `path` is recorded on every declaration and on the error.
    ///
    /// # Errors
    ///
    /// Returns [`FileError::Parse`] if the source is not syntactically valid.
    fn extract(&self, path: &Path, source: &str) -> Result<Vec<ImportDeclaration>, FileError>;

    /// Whether this extractor handles `path`, judged by extension.
    fn handles(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| self.extensions().contains(&ext))
    }
}

/// The extractors available to a scan, looked up by file extension.
pub struct ExtractorSet {
    extractors: Vec<Box<dyn LanguageExtractor>>,
}

impl ExtractorSet {
    /// Creates a set from boxed extractors.
    #[must_use]
    pub fn new(extractors: Vec<Box<dyn LanguageExtractor>>) -> Self {
        Self { extractors }
    }

    /// Extractor responsible for `path`, if any.
    #[must_use]
    pub fn for_path(&self, path: &Path) -> Option<&dyn LanguageExtractor> {
        self.extractors
            .iter()
            .find(|e| e.handles(path))
            .map(|e| &**e)
    }

    /// Every extension handled by some extractor.
    #[must_use]
    pub fn extensions(&self) -> Vec<&'static str> {
        self.extractors
            .iter()
            .flat_map(|e| e.extensions().iter().copied())
            .collect()
    }

    /// Reads `path` (resolved against `root`) and extracts its imports.
    /// Declarations and errors carry the root-relative path.
    ///
    /// Returns `Ok(None)` if no extractor handles the file.
    ///
    /// # Errors
    ///
    /// Returns [`FileError::Io`] if the file cannot be read, or
    /// [`FileError::Parse`] if it is not valid source.
    pub fn extract_file(
        &self,
        root: &Path,
        relative: &Path,
    ) -> Result<Option<Vec<ImportDeclaration>>, FileError> {
        let Some(extractor) = self.for_path(relative) else {
            return Ok(None);
        };
        let full: PathBuf = root.join(relative);
        let source = std::fs::read_to_string(&full).map_err(|e| FileError::Io {
            path: relative.to_path_buf(),
            message: e.to_string(),
        })?;
        extractor.extract(relative, &source).map(Some)
    }
}
