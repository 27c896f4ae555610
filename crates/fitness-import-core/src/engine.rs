//! Import restriction rule engine.
//!
//! Evaluates every [`ImportDeclaration`] against every [`RestrictionRule`],
//! producing one [`MatchRecord`] per (rule, declaration) pair that trips.
//! Evaluation is a pure function of its inputs.

use crate::config::{RestrictionRule, RestrictionType, RuleSet};
use crate::prefix::{first_match, matches_prefix};
use crate::types::{ImportDeclaration, ImportForm, MatchRecord};

/// Evaluates restriction rules against extracted imports.
pub struct RuleEngine<'a> {
    rules: &'a RuleSet,
}

impl<'a> RuleEngine<'a> {
    /// Creates an engine over a rule set.
    #[must_use]
    pub fn new(rules: &'a RuleSet) -> Self {
        Self { rules }
    }

    /// Evaluates all declarations. Output follows input order, rules in
    /// key order within each declaration.
    #[must_use]
    pub fn evaluate(&self, declarations: &[ImportDeclaration]) -> Vec<MatchRecord> {
        declarations
            .iter()
            .flat_map(|decl| self.check(decl))
            .collect()
    }

    /// Evaluates a single declaration against every rule.
    #[must_use]
    pub fn check(&self, decl: &ImportDeclaration) -> Vec<MatchRecord> {
        self.rules
            .iter()
            .filter(|rule| triggers(rule, decl))
            .map(|rule| MatchRecord::new(rule.target_package.clone(), decl.clone()))
            .collect()
    }
}

/// Whether `decl` counts against `rule`.
#[must_use]
pub fn triggers(rule: &RestrictionRule, decl: &ImportDeclaration) -> bool {
    if !rule.covers(&decl.file) {
        return false;
    }
    if !counts_form(rule.restriction_type, decl.form) {
        return false;
    }
    if !matches_prefix(&decl.name, &rule.target_package) {
        return false;
    }
    first_match(&decl.name, &rule.exceptions).is_none()
}

/// Which import forms each restriction type counts.
#[must_use]
pub fn counts_form(restriction: RestrictionType, form: ImportForm) -> bool {
    match restriction {
        RestrictionType::All | RestrictionType::Report => true,
        RestrictionType::Import => form == ImportForm::Import,
        RestrictionType::From => form == ImportForm::From,
    }
}
