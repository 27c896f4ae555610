//! Check command implementation.

use anyhow::{Context, Result};
use fitness_import_core::{scan, FitnessConfig};
use std::io::IsTerminal;
use std::path::Path;

use crate::config_resolver::ConfigSource;
use crate::OutputFormat;

/// Command-line overrides for a check run.
#[derive(Debug, Clone, Default)]
pub struct CheckOptions {
    /// Output format.
    pub format: OutputFormat,
    /// Exclude filters appended to the configured ones.
    pub exclude: Vec<String>,
    /// Force parallel parsing.
    pub parallel: bool,
}

/// Runs the check command. Returns `false` if any rule failed.
pub fn run(path: &Path, source: &ConfigSource, options: &CheckOptions) -> Result<bool> {
    let config = prepare(path, source.load()?, options);

    tracing::info!(
        "Scanning {} with {} rules",
        config.analyzer.root.display(),
        config.rules.len()
    );

    let report = scan(&config).context("Scan failed")?;

    let color = options.format == OutputFormat::Text && std::io::stdout().is_terminal();
    super::output::print(&report, options.format, color)?;

    Ok(!report.failed)
}

/// Applies the scanned path and command-line overrides to a loaded config.
fn prepare(path: &Path, mut config: FitnessConfig, options: &CheckOptions) -> FitnessConfig {
    if !config.analyzer.root.is_absolute() {
        let root = path.join(&config.analyzer.root);
        config = config.with_root(root);
    }
    config
        .analyzer
        .exclude
        .extend(options.exclude.iter().cloned());
    config.analyzer.parallel |= options.parallel;
    config
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn relative_root_is_joined_to_path() {
        let config = FitnessConfig::parse("[analyzer]\nroot = \"src\"\n").unwrap();
        let prepared = prepare(Path::new("/work"), config, &CheckOptions::default());
        assert_eq!(prepared.analyzer.root, Path::new("/work/src"));
    }

    #[test]
    fn overrides_extend_config() {
        let config =
            FitnessConfig::parse("[analyzer]\nexclude = [\"build\"]\n").unwrap();
        let options = CheckOptions {
            exclude: vec!["*_pb2.py".into()],
            parallel: true,
            ..CheckOptions::default()
        };
        let prepared = prepare(Path::new("."), config, &options);
        assert_eq!(prepared.analyzer.exclude, vec!["build", "*_pb2.py"]);
        assert!(prepared.analyzer.parallel);
    }

    #[test]
    fn run_reports_pass_and_fail() {
        let tmp = TempDir::new().unwrap();
        let config = tmp.path().join("fitness-import.toml");
        fs::write(
            &config,
            "[[fitness_warnings]]\ntarget_package = \"legacy\"\nallowed_number = 1\n",
        )
        .unwrap();
        fs::write(tmp.path().join("a.py"), "import legacy.x\n").unwrap();

        let options = CheckOptions {
            format: OutputFormat::Compact,
            ..CheckOptions::default()
        };
        let source = ConfigSource::Project(config);
        assert!(run(tmp.path(), &source, &options).unwrap());

        fs::write(tmp.path().join("b.py"), "from legacy import y\n").unwrap();
        assert!(!run(tmp.path(), &source, &options).unwrap());
    }

    #[test]
    fn absolute_search_path_in_config_file() {
        let tmp = TempDir::new().unwrap();
        let config = tmp.path().join("fitness-import.toml");
        fs::write(
            &config,
            format!(
                "[[fitness_warnings]]\ntarget_package = \"legacy\"\nsearch_path = {:?}\n",
                tmp.path().join("app").display().to_string()
            ),
        )
        .unwrap();
        fs::create_dir(tmp.path().join("app")).unwrap();
        fs::write(tmp.path().join("app/a.py"), "import legacy\n").unwrap();
        fs::write(tmp.path().join("other.py"), "import legacy\n").unwrap();

        let options = CheckOptions {
            format: OutputFormat::Compact,
            ..CheckOptions::default()
        };
        assert!(!run(tmp.path(), &ConfigSource::Project(config), &options).unwrap());
    }
}
