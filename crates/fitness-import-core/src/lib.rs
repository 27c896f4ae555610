//! # fitness-import-core
//!
//! Import-restriction analysis engine for architecture fitness checks on
//! Python source trees.
//!
//! Data flows one way:
//!
//! - [`SourceLocator`] enumerates candidate files under a root
//! - [`PythonExtractor`] parses each file with Tree-sitter and yields
//!   [`ImportDeclaration`]s
//! - [`RuleEngine`] matches declarations against a [`RuleSet`]
//! - [`build_report`] aggregates [`MatchRecord`]s into a [`FitnessReport`]
//!
//! [`scan`] wires all of it together.
//!
//! ## Example
//!
//! ```ignore
//! use fitness_import_core::{scan, AnalyzerConfig, FitnessConfig, RuleEntry};
//!
//! let config = FitnessConfig::new(
//!     AnalyzerConfig::default(),
//!     [RuleEntry::new("legacy").exception("legacy.compat")],
//! )?;
//!
//! let report = scan(&config)?;
//! assert!(!report.failed);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod engine;
pub mod extractor;
pub mod locator;
pub mod prefix;
pub mod python;
pub mod report;
pub mod scanner;
mod types;

pub use config::{
    AnalyzerConfig, ConfigError, FitnessConfig, RestrictionRule, RestrictionType, RuleEntry,
    RuleSet,
};
pub use engine::RuleEngine;
pub use extractor::{ExtractorSet, LanguageExtractor};
pub use locator::{Located, SourceLocator};
pub use python::PythonExtractor;
pub use report::build_report;
pub use scanner::{default_extractors, scan, scan_with, ScanError};
pub use types::{
    FileError, FitnessReport, ImportDeclaration, ImportForm, MatchRecord, Outcome, RuleOutcome,
};
