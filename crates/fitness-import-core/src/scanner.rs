//! Scan orchestration: locate, extract, evaluate, aggregate.

use std::path::Path;

use rayon::prelude::*;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::{ConfigError, FitnessConfig};
use crate::engine::RuleEngine;
use crate::extractor::ExtractorSet;
use crate::locator::SourceLocator;
use crate::python::PythonExtractor;
use crate::report::build_report;
use crate::types::{FileError, FitnessReport, ImportDeclaration};

/// Errors that abort a scan before any file is analyzed.
#[derive(Debug, Error)]
pub enum ScanError {
    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The Tree-sitter grammar could not be loaded.
    #[error("Grammar error: {0}")]
    Grammar(String),
}

/// The extractors used by [`scan`].
///
/// # Errors
///
/// Returns [`ScanError::Grammar`] if the Python grammar is incompatible
/// with the linked Tree-sitter runtime.
pub fn default_extractors() -> Result<ExtractorSet, ScanError> {
    let python = PythonExtractor::new();
    python.verify().map_err(ScanError::Grammar)?;
    Ok(ExtractorSet::new(vec![Box::new(python)]))
}

/// Scans the configured root with the default extractors.
///
/// A fresh report is built on every call; nothing is cached between runs.
///
/// # Errors
///
/// Returns an error if the root is not a directory or the grammar cannot
/// be loaded. Unreadable or unparsable files never abort the scan; they are
/// listed in [`FitnessReport::errors`].
pub fn scan(config: &FitnessConfig) -> Result<FitnessReport, ScanError> {
    let extractors = default_extractors()?;
    scan_with(config, &extractors)
}

/// Scans the configured root with a caller-provided extractor set.
///
/// # Errors
///
/// Returns an error if the root is not a directory.
pub fn scan_with(
    config: &FitnessConfig,
    extractors: &ExtractorSet,
) -> Result<FitnessReport, ScanError> {
    let root = &config.analyzer.root;
    if !root.is_dir() {
        return Err(ConfigError::Validation(format!(
            "root {} is not a directory",
            root.display()
        ))
        .into());
    }

    info!("Starting fitness scan at {}", root.display());

    let located = SourceLocator::new(root, extractors.extensions())
        .excludes(config.analyzer.exclude.iter().cloned())
        .respect_gitignore(config.analyzer.respect_gitignore)
        .follow_links(config.analyzer.follow_links)
        .locate();

    info!("Found {} files to analyze", located.files.len());

    let results: Vec<Result<Vec<ImportDeclaration>, FileError>> = if config.analyzer.parallel {
        located
            .files
            .par_iter()
            .map(|rel| extract_one(extractors, root, rel))
            .collect()
    } else {
        located
            .files
            .iter()
            .map(|rel| extract_one(extractors, root, rel))
            .collect()
    };

    let mut errors = located.errors;
    let mut declarations = Vec::new();
    let mut files_analyzed = 0;
    for result in results {
        match result {
            Ok(decls) => {
                declarations.extend(decls);
                files_analyzed += 1;
            }
            Err(e) => {
                warn!("{e}");
                errors.push(e);
            }
        }
    }

    let rules = config.rules.rebased(root);
    let matches = RuleEngine::new(&rules).evaluate(&declarations);
    let report = build_report(&rules, matches, errors, files_analyzed);

    info!(
        "Scan complete: {} imports, {} matches across {} rules, {} files skipped",
        declarations.len(),
        report.total_count(),
        report.outcomes.len(),
        report.errors.len()
    );

    Ok(report)
}

fn extract_one(
    extractors: &ExtractorSet,
    root: &Path,
    rel: &Path,
) -> Result<Vec<ImportDeclaration>, FileError> {
    debug!("Analyzing: {}", rel.display());
    extractors
        .extract_file(root, rel)
        .map(Option::unwrap_or_default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AnalyzerConfig, RuleEntry};

    #[test]
    fn missing_root_is_a_config_error() {
        let config = FitnessConfig::new(
            AnalyzerConfig {
                root: "/definitely/not/a/dir".into(),
                ..AnalyzerConfig::default()
            },
            [RuleEntry::new("legacy")],
        )
        .unwrap();
        let err = scan(&config).unwrap_err();
        assert!(matches!(err, ScanError::Config(ConfigError::Validation(_))));
    }

    #[test]
    fn default_extractors_cover_python() {
        let set = default_extractors().unwrap();
        assert!(set.for_path(Path::new("x.py")).is_some());
    }
}
