//! Permission evaluator.

use serde::Serialize;

use crate::permissions::{Action, PermissionRule, Query, Record};

/// Evaluates permission questions against an ordered rule list.
///
/// Built fresh per request from [`crate::rules::RuleSource`]; never mutated
/// after construction.
///
/// The last applicable rule decides: a denial only overrides grants that
/// precede it. No applicable rule at all means deny.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct Ability {
    rules: Vec<PermissionRule>,
}

impl Ability {
    pub fn new(rules: Vec<PermissionRule>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &[PermissionRule] {
        &self.rules
    }

    /// May the caller perform `action` on `subject` at all?
    pub fn can(&self, action: Action, subject: &str) -> bool {
        self.check(&Query::new(action, subject))
    }

    /// May the caller perform `action` on `field` of `subject`?
    ///
    /// A denial naming the field wins over any unscoped grant.
    pub fn can_field(&self, action: Action, subject: &str, field: &str) -> bool {
        self.check(&Query::new(action, subject).field(field))
    }

    /// May the caller perform `action` on this particular `record`?
    ///
    /// Conditional rules only contribute when their condition holds for the
    /// record's attributes.
    pub fn can_record(&self, action: Action, subject: &str, record: &Record) -> bool {
        self.check(&Query::new(action, subject).record(record))
    }

    pub fn check(&self, query: &Query<'_>) -> bool {
        self.rules
            .iter()
            .rev()
            .find(|r| r.applies_to(query))
            .is_some_and(|rule| !rule.is_deny())
    }

    pub fn cannot(&self, action: Action, subject: &str) -> bool {
        !self.can(action, subject)
    }
}
