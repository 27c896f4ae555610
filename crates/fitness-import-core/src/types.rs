//! Core types for import declarations, matches and reports.

use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::config::RestrictionRule;

/// Syntactic form of an import statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportForm {
    /// `import pkg.sub`
    Import,
    /// `from pkg.sub import name`
    From,
}

impl std::fmt::Display for ImportForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Import => f.pad("import"),
            Self::From => f.pad("from"),
        }
    }
}

/// A single import extracted from source.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct ImportDeclaration {
    /// File path relative to the scan root.
    pub file: PathBuf,
    /// Line number (1-indexed).
    pub line: usize,
    /// Imported module path (e.g. `pkg.sub`, or `..pkg` for relative imports).
    pub name: String,
    /// Statement form.
    pub form: ImportForm,
    /// Number of leading dots on a relative import; `0` when absolute.
    pub level: usize,
}

impl ImportDeclaration {
    /// Creates an absolute import declaration.
    #[must_use]
    pub fn new(
        file: impl Into<PathBuf>,
        line: usize,
        name: impl Into<String>,
        form: ImportForm,
    ) -> Self {
        Self {
            file: file.into(),
            line,
            name: name.into(),
            form,
            level: 0,
        }
    }

    /// Sets the relative-import level.
    #[must_use]
    pub fn with_level(mut self, level: usize) -> Self {
        self.level = level;
        self
    }
}

/// A declaration that triggered a rule.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct MatchRecord {
    /// Target package of the rule that matched.
    pub rule: String,
    /// The offending declaration.
    pub declaration: ImportDeclaration,
    /// Human-readable location detail.
    pub detail: String,
}

impl MatchRecord {
    /// Creates a record, deriving the detail string from the declaration.
    #[must_use]
    pub fn new(rule: impl Into<String>, declaration: ImportDeclaration) -> Self {
        let detail = match declaration.form {
            ImportForm::Import => format!(
                "import {} in {} line {}",
                declaration.name,
                declaration.file.display(),
                declaration.line
            ),
            ImportForm::From => format!(
                "from {} import in {} line {}",
                declaration.name,
                declaration.file.display(),
                declaration.line
            ),
        };
        Self {
            rule: rule.into(),
            declaration,
            detail,
        }
    }
}

/// Final classification of one rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    /// More occurrences than allowed.
    Fail,
    /// Advisory rule; never fails.
    Report,
    /// Within the allowed number.
    Success,
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Fail => f.pad("fail"),
            Self::Report => f.pad("report"),
            Self::Success => f.pad("success"),
        }
    }
}

/// Aggregated result for one rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleOutcome {
    /// The rule this outcome belongs to.
    pub rule: RestrictionRule,
    /// Number of matching declarations.
    pub count: usize,
    /// Matching declarations, sorted by file, line and name.
    pub matches: Vec<MatchRecord>,
    /// Classification against the rule's threshold.
    pub outcome: Outcome,
}

/// A file that could not be analyzed.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, thiserror::Error)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum FileError {
    /// The file could not be read.
    #[error("failed to read {}: {message}", .path.display())]
    Io {
        /// File (or directory) path.
        path: PathBuf,
        /// Underlying error message.
        message: String,
    },
    /// The file is not valid source.
    #[error("syntax error in {} at line {line}: {message}", .path.display())]
    Parse {
        /// File path.
        path: PathBuf,
        /// Line of the first syntax error (1-indexed).
        line: usize,
        /// Error detail.
        message: String,
    },
}

impl FileError {
    /// Path of the file that failed.
    #[must_use]
    pub fn path(&self) -> &std::path::Path {
        match self {
            Self::Io { path, .. } | Self::Parse { path, .. } => path,
        }
    }
}

/// Result of one fitness scan.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FitnessReport {
    /// Per-rule outcomes keyed by target package.
    pub outcomes: BTreeMap<String, RuleOutcome>,
    /// `true` if any rule failed.
    pub failed: bool,
    /// Files that could not be analyzed.
    pub errors: Vec<FileError>,
    /// Number of files analyzed successfully.
    pub files_analyzed: usize,
}

impl FitnessReport {
    /// Outcome for a rule by target package.
    #[must_use]
    pub fn outcome(&self, target_package: &str) -> Option<&RuleOutcome> {
        self.outcomes.get(target_package)
    }

    /// Iterates outcomes classified as [`Outcome::Fail`].
    pub fn failures(&self) -> impl Iterator<Item = &RuleOutcome> {
        self.outcomes
            .values()
            .filter(|o| o.outcome == Outcome::Fail)
    }

    /// Total matches across all rules.
    #[must_use]
    pub fn total_count(&self) -> usize {
        self.outcomes.values().map(|o| o.count).sum()
    }
}
