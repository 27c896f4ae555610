//! List rules command implementation.

use anyhow::Result;
use fitness_import_core::RuleSet;
use std::fmt::Write;

use crate::config_resolver::ConfigSource;

/// Runs the list-rules command.
pub fn run(source: &ConfigSource) -> Result<()> {
    let config = source.load()?;
    match source.path() {
        Some(p) => println!("Configuration: {}\n", p.display()),
        None => println!("Configuration: defaults (no config file found)\n"),
    }
    print!("{}", render(&config.rules));
    Ok(())
}

/// Formats the rule table.
fn render(rules: &RuleSet) -> String {
    let mut out = String::new();
    if rules.is_empty() {
        let _ = writeln!(
            out,
            "No rules configured. Use [[fitness_warnings]] in fitness-import.toml to add some."
        );
        return out;
    }

    let _ = writeln!(
        out,
        "{:<25} {:<8} {:>7}  {:<15} Exceptions",
        "Target", "Type", "Allowed", "Search path"
    );
    let _ = writeln!(out, "{}", "-".repeat(80));

    for rule in rules.iter() {
        let search_path = if rule.search_path.as_os_str().is_empty() {
            ".".to_string()
        } else {
            rule.search_path.display().to_string()
        };
        let allowed = if rule.restriction_type.is_advisory() {
            "-".to_string()
        } else {
            rule.allowed_number.to_string()
        };
        let _ = writeln!(
            out,
            "{:<25} {:<8} {:>7}  {:<15} {}",
            rule.target_package,
            rule.restriction_type,
            allowed,
            search_path,
            rule.exceptions.join(", ")
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use fitness_import_core::RuleEntry;
    use std::path::Path;

    #[test]
    fn empty_rule_set() {
        assert!(render(&RuleSet::default()).starts_with("No rules configured"));
    }

    #[test]
    fn rules_are_listed_in_key_order() {
        let rules = RuleSet::from_entries(
            [
                RuleEntry::new("requests").restriction_type("report"),
                RuleEntry::new("legacy")
                    .exception("legacy.compat")
                    .exception("legacy.shim")
                    .allowed_number(4)
                    .search_path("app"),
            ],
            Path::new("."),
        )
        .unwrap();

        let table = render(&rules);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[2].starts_with("legacy "));
        assert!(lines[2].contains(" 4 "));
        assert!(lines[2].contains("app"));
        assert!(lines[2].ends_with("legacy.compat, legacy.shim"));
        assert!(lines[3].starts_with("requests "));
        assert!(lines[3].contains("report"));
    }
}
