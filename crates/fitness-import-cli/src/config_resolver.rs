//! Configuration file resolution with global fallback.
//!
//! Resolves the configuration file path using a deterministic priority order:
//!
//! 1. `--config` flag (explicit path)
//! 2. `{project}/fitness-import.toml` or `.fitness-import.toml`
//! 3. `{project}/pyproject.toml` with a `[tool.fitness-import]` table
//! 4. `~/.fitness-import/config.toml` (global fallback)
//! 5. No config found → defaults (no rules)

use anyhow::{Context, Result};
use fitness_import_core::FitnessConfig;
use std::path::{Path, PathBuf};

/// Where the configuration was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// Explicitly specified via `--config` flag.
    Explicit(PathBuf),
    /// Found in the project directory.
    Project(PathBuf),
    /// Loaded from the global config directory (`~/.fitness-import/`).
    Global(PathBuf),
    /// No config found; defaults will be used.
    Default,
}

impl ConfigSource {
    /// Returns the resolved path, if any.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Explicit(p) | Self::Project(p) | Self::Global(p) => Some(p),
            Self::Default => None,
        }
    }

    /// Returns `true` if the config was loaded from the global directory.
    #[must_use]
    pub fn is_global(&self) -> bool {
        matches!(self, Self::Global(_))
    }

    /// Loads and validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn load(&self) -> Result<FitnessConfig> {
        let Some(p) = self.path() else {
            return Ok(FitnessConfig::default());
        };
        if self.is_global() {
            tracing::info!("Using global config: {}", p.display());
        }
        FitnessConfig::from_file(p).with_context(|| format!("Failed to load {}", p.display()))
    }
}

/// Project-level config file names, checked in order.
const PROJECT_CONFIG_NAMES: &[&str] = &["fitness-import.toml", ".fitness-import.toml"];

/// Python project manifest that may carry a `[tool.fitness-import]` table.
const PYPROJECT_NAME: &str = "pyproject.toml";

/// Config file name within the global config directory.
const GLOBAL_CONFIG_NAME: &str = "config.toml";

/// Resolves the configuration file path.
///
/// See module-level docs for resolution order.
#[must_use]
pub fn resolve(project_dir: &Path, explicit: Option<&Path>) -> ConfigSource {
    resolve_inner(project_dir, explicit, global_config_dir())
}

/// Testable core: accepts `global_dir` as parameter to avoid env var races.
fn resolve_inner(
    project_dir: &Path,
    explicit: Option<&Path>,
    global_dir: Option<PathBuf>,
) -> ConfigSource {
    // 1. Explicit path from --config flag
    if let Some(p) = explicit {
        return ConfigSource::Explicit(p.to_path_buf());
    }

    // 2. Project-level config
    for name in PROJECT_CONFIG_NAMES {
        let candidate = project_dir.join(name);
        if candidate.exists() {
            tracing::debug!("Found project config: {}", candidate.display());
            return ConfigSource::Project(candidate);
        }
    }

    // 3. pyproject.toml, only when it has our table
    let pyproject = project_dir.join(PYPROJECT_NAME);
    if let Ok(content) = std::fs::read_to_string(&pyproject) {
        if FitnessConfig::pyproject_has_section(&content) {
            tracing::debug!("Found [tool.fitness-import] in {}", pyproject.display());
            return ConfigSource::Project(pyproject);
        }
    }

    // 4. Global fallback
    if let Some(dir) = global_dir {
        let candidate = dir.join(GLOBAL_CONFIG_NAME);
        if candidate.exists() {
            tracing::debug!("Found global config: {}", candidate.display());
            return ConfigSource::Global(candidate);
        }
    }

    ConfigSource::Default
}

/// Returns the global config directory path.
///
/// Resolution: `$FITNESS_IMPORT_CONFIG_DIR` > `~/.fitness-import/`
#[must_use]
pub fn global_config_dir() -> Option<PathBuf> {
    if let Ok(dir) = std::env::var("FITNESS_IMPORT_CONFIG_DIR") {
        return Some(PathBuf::from(dir));
    }
    home::home_dir().map(|h| h.join(".fitness-import"))
}
