//! Configuration types for fitness-import.
//!
//! Raw TOML entries are deserialized into [`RuleEntry`] DTOs and then
//! validated into immutable [`RestrictionRule`]s. Nothing downstream ever
//! sees an unvalidated entry.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};

/// Default exclude filter: generated migration folders.
pub const DEFAULT_EXCLUDE: &str = "migrations";

/// Which import forms a rule counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RestrictionType {
    /// Both `import x` and `from x import y` count.
    All,
    /// Only plain `import x` statements count.
    Import,
    /// Only `from x import y` statements count.
    From,
    /// Advisory: every form counts, but the rule never fails.
    Report,
}

impl RestrictionType {
    /// Parses a restriction type name.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] for unknown names.
    pub fn parse(name: &str) -> Result<Self, ConfigError> {
        match name {
            "all" => Ok(Self::All),
            "import" => Ok(Self::Import),
            "from" => Ok(Self::From),
            "report" => Ok(Self::Report),
            other => Err(ConfigError::Validation(format!(
                "unknown restriction_type `{other}` (expected all, import, from or report)"
            ))),
        }
    }

    /// Returns `true` for advisory rules.
    #[must_use]
    pub fn is_advisory(self) -> bool {
        self == Self::Report
    }
}

impl std::fmt::Display for RestrictionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::All => f.pad("all"),
            Self::Import => f.pad("import"),
            Self::From => f.pad("from"),
            Self::Report => f.pad("report"),
        }
    }
}

/// One `[[fitness_warnings]]` entry as written in the config file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RuleEntry {
    /// Dotted package prefix to restrict. Required.
    #[serde(default)]
    pub target_package: Option<String>,

    /// Restriction type name (`all`, `import`, `from`, `report`).
    #[serde(default, alias = "type")]
    pub restriction_type: Option<String>,

    /// Dotted prefixes exempt from the rule.
    #[serde(default)]
    pub exceptions: Vec<String>,

    /// Maximum permitted occurrences.
    #[serde(default)]
    pub allowed_number: Option<i64>,

    /// Subtree the rule applies to, relative to the scan root.
    #[serde(default)]
    pub search_path: Option<PathBuf>,
}

impl RuleEntry {
    /// Creates an entry targeting `package` with every other field defaulted.
    #[must_use]
    pub fn new(package: impl Into<String>) -> Self {
        Self {
            target_package: Some(package.into()),
            ..Self::default()
        }
    }

    /// Sets the restriction type name.
    #[must_use]
    pub fn restriction_type(mut self, name: impl Into<String>) -> Self {
        self.restriction_type = Some(name.into());
        self
    }

    /// Adds an exception prefix.
    #[must_use]
    pub fn exception(mut self, prefix: impl Into<String>) -> Self {
        self.exceptions.push(prefix.into());
        self
    }

    /// Sets the allowed number of occurrences.
    #[must_use]
    pub fn allowed_number(mut self, n: i64) -> Self {
        self.allowed_number = Some(n);
        self
    }

    /// Sets the search path.
    #[must_use]
    pub fn search_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.search_path = Some(path.into());
        self
    }
}

/// A validated import restriction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RestrictionRule {
    /// Dotted package prefix this rule restricts.
    pub target_package: String,
    /// Which import forms count.
    pub restriction_type: RestrictionType,
    /// Dotted prefixes exempt from the rule.
    pub exceptions: Vec<String>,
    /// Maximum permitted occurrences before the rule fails.
    pub allowed_number: usize,
    /// Subtree (relative to the scan root) this rule applies to.
    /// Empty means the whole root.
    pub search_path: PathBuf,
}

impl RestrictionRule {
    /// Validates a raw entry.
    ///
    /// `root` is used to relativize absolute search paths.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] when `target_package` is missing
    /// or blank, the target or an exception is not a well-formed dotted
    /// name, `allowed_number` is negative, or the restriction type is
    /// unknown.
    pub fn from_entry(entry: RuleEntry, root: &Path) -> Result<Self, ConfigError> {
        let target_package = entry
            .target_package
            .map(|t| t.trim().to_owned())
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ConfigError::Validation("rule is missing `target_package`".into()))?;
        check_dotted_name(&target_package, "target_package")?;
        for exception in &entry.exceptions {
            check_dotted_name(exception, "exception")
                .map_err(|e| ConfigError::Validation(format!("{target_package}: {e}")))?;
        }

        let restriction_type = match entry.restriction_type.as_deref() {
            Some(name) => RestrictionType::parse(name).map_err(|e| match e {
                ConfigError::Validation(msg) => {
                    ConfigError::Validation(format!("{target_package}: {msg}"))
                }
                other => other,
            })?,
            None => RestrictionType::All,
        };

        let allowed_number = match entry.allowed_number {
            None => 0,
            Some(n) => usize::try_from(n).map_err(|_| {
                ConfigError::Validation(format!(
                    "{target_package}: allowed_number must be non-negative, got {n}"
                ))
            })?,
        };

        let search_path = entry
            .search_path
            .map(|p| normalize_search_path(&p, root))
            .unwrap_or_default();

        Ok(Self {
            target_package,
            restriction_type,
            exceptions: entry.exceptions,
            allowed_number,
            search_path,
        })
    }

    /// Re-resolves an absolute search path against a new root.
    fn rebase(&mut self, root: &Path) {
        if self.search_path.is_absolute() {
            self.search_path = normalize_search_path(&self.search_path, root);
        }
    }

    /// Whether a root-relative file lies inside this rule's search path.
    #[must_use]
    pub fn covers(&self, file: &Path) -> bool {
        file.starts_with(&self.search_path)
    }
}

/// Rejects empty segments: `legacy.`, `.legacy` and `a..b` can never match.
fn check_dotted_name(name: &str, field: &str) -> Result<(), ConfigError> {
    if name.split('.').any(|segment| segment.trim().is_empty()) {
        return Err(ConfigError::Validation(format!(
            "{field} `{name}` is not a dotted package name"
        )));
    }
    Ok(())
}

/// Drops `.` components and strips `root` from absolute paths. An absolute
/// path that cannot be made relative is kept as is.
fn normalize_search_path(path: &Path, root: &Path) -> PathBuf {
    let relative = if path.is_absolute() {
        relativize(path, root).unwrap_or_else(|| path.to_path_buf())
    } else {
        path.to_path_buf()
    };
    relative
        .components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect()
}

/// Strips `root` from `path`, retrying with both sides canonicalized so
/// that `/tmp` and `/private/tmp` style aliases still line up.
fn relativize(path: &Path, root: &Path) -> Option<PathBuf> {
    if let Ok(rel) = path.strip_prefix(root) {
        return Some(rel.to_path_buf());
    }
    let root = std::fs::canonicalize(root).ok()?;
    let path = std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
    path.strip_prefix(&root).ok().map(Path::to_path_buf)
}

/// Rules keyed by target package, iterated in sorted key order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleSet {
    rules: BTreeMap<String, RestrictionRule>,
}

impl RuleSet {
    /// Validates every entry. A later entry with the same target package
    /// replaces an earlier one.
    ///
    /// # Errors
    ///
    /// Returns the first validation error encountered.
    pub fn from_entries<I>(entries: I, root: &Path) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = RuleEntry>,
    {
        let mut rules = BTreeMap::new();
        for (i, entry) in entries.into_iter().enumerate() {
            let rule = RestrictionRule::from_entry(entry, root).map_err(|e| match e {
                ConfigError::Validation(msg) => {
                    ConfigError::Validation(format!("fitness_warnings[{i}]: {msg}"))
                }
                other => other,
            })?;
            if rules.contains_key(&rule.target_package) {
                tracing::debug!("Rule for `{}` overrides an earlier one", rule.target_package);
            }
            rules.insert(rule.target_package.clone(), rule);
        }
        Ok(Self { rules })
    }

    /// Iterates rules in key order.
    pub fn iter(&self) -> impl Iterator<Item = &RestrictionRule> {
        self.rules.values()
    }

    /// Looks up a rule by target package.
    #[must_use]
    pub fn get(&self, target_package: &str) -> Option<&RestrictionRule> {
        self.rules.get(target_package)
    }

    /// Number of rules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Returns `true` when no rules are configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Returns a copy whose absolute search paths are relative to `root`.
    #[must_use]
    pub fn rebased(&self, root: &Path) -> Self {
        let mut rules = self.rules.clone();
        for rule in rules.values_mut() {
            rule.rebase(root);
        }
        Self { rules }
    }
}

/// Walker and scheduling options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyzerConfig {
    /// Root directory to scan (default: current directory).
    #[serde(default = "default_root")]
    pub root: PathBuf,

    /// Exclude filters: plain substrings or glob patterns.
    #[serde(default = "default_exclude")]
    pub exclude: Vec<String>,

    /// Whether to respect `.gitignore` files.
    #[serde(default)]
    pub respect_gitignore: bool,

    /// Whether to follow symbolic links.
    #[serde(default)]
    pub follow_links: bool,

    /// Parse files on the rayon thread pool.
    #[serde(default)]
    pub parallel: bool,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            exclude: default_exclude(),
            respect_gitignore: false,
            follow_links: false,
            parallel: false,
        }
    }
}

fn default_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_exclude() -> Vec<String> {
    vec![DEFAULT_EXCLUDE.to_string()]
}

/// Validated, immutable configuration for one scan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FitnessConfig {
    /// Walker and scheduling options.
    pub analyzer: AnalyzerConfig,
    /// Restriction rules.
    pub rules: RuleSet,
}

/// On-disk shape shared by `fitness-import.toml` and `[tool.fitness-import]`.
#[derive(Debug, Default, Deserialize)]
struct RawConfig {
    #[serde(default)]
    analyzer: AnalyzerConfig,
    #[serde(default)]
    fitness_warnings: Vec<RuleEntry>,
}

impl FitnessConfig {
    /// Builds a config from analyzer options and raw rule entries.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] if any entry is malformed.
    pub fn new<I>(analyzer: AnalyzerConfig, entries: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = RuleEntry>,
    {
        let rules = RuleSet::from_entries(entries, &analyzer.root)?;
        Ok(Self { analyzer, rules })
    }

    /// Loads from a TOML file. `pyproject.toml` is read from its
    /// `[tool.fitness-import]` table.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        if path.file_name().is_some_and(|n| n == "pyproject.toml") {
            Self::parse_pyproject(&content)
        } else {
            Self::parse(&content)
        }
    }

    /// Parses from a standalone TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid or a rule is malformed.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let raw: RawConfig = toml::from_str(content).map_err(|e| ConfigError::Parse {
            message: e.to_string(),
        })?;
        Self::new(raw.analyzer, raw.fitness_warnings)
    }

    /// Parses the `[tool.fitness-import]` table of a `pyproject.toml`.
    /// A missing table yields the default (rule-less) config.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid or a rule is malformed.
    pub fn parse_pyproject(content: &str) -> Result<Self, ConfigError> {
        #[derive(Deserialize, Default)]
        struct Pyproject {
            #[serde(default)]
            tool: Tool,
        }

        #[derive(Deserialize, Default)]
        struct Tool {
            #[serde(rename = "fitness-import", default)]
            fitness_import: Option<RawConfig>,
        }

        let pyproject: Pyproject = toml::from_str(content).map_err(|e| ConfigError::Parse {
            message: e.to_string(),
        })?;
        let raw = pyproject.tool.fitness_import.unwrap_or_default();
        Self::new(raw.analyzer, raw.fitness_warnings)
    }

    /// Returns `true` if a `pyproject.toml` body carries a
    /// `[tool.fitness-import]` table.
    #[must_use]
    pub fn pyproject_has_section(content: &str) -> bool {
        content
            .parse::<toml::Table>()
            .ok()
            .and_then(|t| t.get("tool").and_then(toml::Value::as_table).cloned())
            .is_some_and(|tool| tool.contains_key("fitness-import"))
    }

    /// Returns a copy rooted at `root`. Absolute search paths are
    /// re-resolved against the new root.
    #[must_use]
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.analyzer.root = root.into();
        self.rules = self.rules.rebased(&self.analyzer.root);
        self
    }
}

/// Configuration errors. Always fatal: no scan is attempted.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read config file.
    #[error("failed to read {path}: {source}")]
    Io {
        /// Path that failed.
        path: PathBuf,
        /// IO error.
        source: std::io::Error,
    },
    /// Failed to parse TOML.
    #[error("invalid config: {message}")]
    Parse {
        /// Parse error detail.
        message: String,
    },
    /// A rule or option is structurally invalid.
    #[error("config validation: {0}")]
    Validation(String),
}
