//! Init command implementation.

use anyhow::{bail, Result};
use std::path::Path;

const DEFAULT_CONFIG: &str = r#"# fitness-import configuration

[analyzer]
# Root directory to scan (default: current directory)
# root = "./src"

# Exclude filters: plain substrings of the relative path, or glob patterns
exclude = ["migrations"]

# Respect .gitignore files
respect_gitignore = false

# Follow symbolic links while walking
follow_links = false

# Parse files in parallel
parallel = false

# One table per restricted package.
#
# restriction_type:
#   all    - count `import x` and `from x import y` (default)
#   import - count only `import x`
#   from   - count only `from x import y`
#   report - count both forms, never fail

# [[fitness_warnings]]
# target_package = "legacy"
# restriction_type = "all"
# exceptions = ["legacy.compat"]
# allowed_number = 0
# search_path = "app"
"#;

/// Config file written by `init`.
const CONFIG_NAME: &str = "fitness-import.toml";

/// Runs the init command.
pub fn run(force: bool) -> Result<()> {
    let config_path = Path::new(CONFIG_NAME);
    write_config(config_path, force)?;

    println!("Created {CONFIG_NAME}");
    println!("\nNext steps:");
    println!("  1. Add [[fitness_warnings]] tables to {CONFIG_NAME}");
    println!("  2. Run: fitness-import check");

    Ok(())
}

fn write_config(config_path: &Path, force: bool) -> Result<()> {
    if config_path.exists() && !force {
        bail!(
            "Configuration file already exists at {}. Use --force to overwrite.",
            config_path.display()
        );
    }
    std::fs::write(config_path, DEFAULT_CONFIG)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use fitness_import_core::FitnessConfig;
    use tempfile::TempDir;

    #[test]
    fn template_is_a_valid_config() {
        let config = FitnessConfig::parse(DEFAULT_CONFIG).unwrap();
        assert!(config.rules.is_empty());
        assert_eq!(config.analyzer.exclude, vec!["migrations"]);
    }

    #[test]
    fn refuses_to_overwrite_without_force() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(CONFIG_NAME);
        std::fs::write(&path, "# mine\n").unwrap();

        assert!(write_config(&path, false).is_err());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "# mine\n");

        write_config(&path, true).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), DEFAULT_CONFIG);
    }
}
