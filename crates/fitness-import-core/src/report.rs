//! Aggregation of match records into a [`FitnessReport`].

use std::collections::BTreeMap;

use crate::config::{RestrictionRule, RuleSet};
use crate::types::{FileError, FitnessReport, MatchRecord, Outcome, RuleOutcome};

/// Classifies a rule given its occurrence count.
#[must_use]
pub fn classify(rule: &RestrictionRule, count: usize) -> Outcome {
    if rule.restriction_type.is_advisory() {
        Outcome::Report
    } else if count > rule.allowed_number {
        Outcome::Fail
    } else {
        Outcome::Success
    }
}

/// Builds the report for one scan.
///
/// Every rule appears in the output, including rules with no matches.
/// Matches for unknown rule keys are dropped. The result does not depend on
/// the order of `matches` or `errors`.
#[must_use]
pub fn build_report<I>(
    rules: &RuleSet,
    matches: I,
    mut errors: Vec<FileError>,
    files_analyzed: usize,
) -> FitnessReport
where
    I: IntoIterator<Item = MatchRecord>,
{
    let mut grouped: BTreeMap<String, Vec<MatchRecord>> = rules
        .iter()
        .map(|r| (r.target_package.clone(), Vec::new()))
        .collect();

    for record in matches {
        if let Some(bucket) = grouped.get_mut(&record.rule) {
            bucket.push(record);
        }
    }

    let mut outcomes = BTreeMap::new();
    for rule in rules.iter() {
        let mut records = grouped.remove(&rule.target_package).unwrap_or_default();
        records.sort();
        let count = records.len();
        outcomes.insert(
            rule.target_package.clone(),
            RuleOutcome {
                rule: rule.clone(),
                count,
                matches: records,
                outcome: classify(rule, count),
            },
        );
    }

    errors.sort_by(|a, b| a.path().cmp(b.path()).then_with(|| a.cmp(b)));
    errors.dedup();

    let failed = outcomes.values().any(|o| o.outcome == Outcome::Fail);

    FitnessReport {
        outcomes,
        failed,
        errors,
        files_analyzed,
    }
}
