//! Request-time enforcement of access requirements.

use thiserror::Error;

use crate::ability::Ability;
use crate::requirement::{AccessRequirement, RequestTarget, RequiredRule};
use crate::rules::{RoleRules, RuleSource};
use crate::Identity;

pub const PERMISSION_DENIED_MESSAGE: &str = "You do not have permission to perform this action";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("You do not have permission to perform this action")]
    PermissionDenied,
}

/// Single-shot access check for one request.
///
/// - `Ok(true)`: proceed (no requirement, or requirement satisfied)
/// - `Ok(false)`: a requirement exists but nobody is authenticated
/// - `Err(PermissionDenied)`: authenticated but not allowed
///
/// No IO, no mutation of the identity, the rules or the request.
#[derive(Debug, Default, Clone)]
pub struct AccessGuard<R = RoleRules> {
    rules: R,
}

impl AccessGuard<RoleRules> {
    pub fn new() -> Self {
        Self { rules: RoleRules }
    }
}

impl<R: RuleSource> AccessGuard<R> {
    pub fn with_rules(rules: R) -> Self {
        Self { rules }
    }

    pub fn check(
        &self,
        requirement: Option<&AccessRequirement>,
        identity: Option<&Identity>,
        target: &RequestTarget,
    ) -> Result<bool, AuthzError> {
        let Some(requirement) = requirement else {
            return Ok(true);
        };
        let Some(identity) = identity else {
            return Ok(false);
        };

        let ability = Ability::new(self.rules.rules_for(identity));
        if evaluate(&ability, requirement, target) {
            Ok(true)
        } else {
            tracing::debug!(user_id = %identity.id, role = %identity.role, ?requirement, "access denied");
            Err(AuthzError::PermissionDenied)
        }
    }
}

/// Decide a requirement against an already-built ability.
pub fn evaluate(ability: &Ability, requirement: &AccessRequirement, target: &RequestTarget) -> bool {
    match requirement {
        AccessRequirement::Predicate(handler) => handler(ability),
        AccessRequirement::All(rules) => all_satisfied(rules, |rule| resolve_rule(ability, rule, target)),
        AccessRequirement::Rule(rule) => resolve_rule(ability, rule, target),
    }
}

/// Resolves tuples in declaration order, stopping at the first that fails.
fn all_satisfied<F>(rules: &[RequiredRule], mut resolve: F) -> bool
where
    F: FnMut(&RequiredRule) -> bool,
{
    for rule in rules {
        if !resolve(rule) {
            return false;
        }
    }
    true
}

/// Conditions take precedence over fields; fields are checked one by one.
fn resolve_rule(ability: &Ability, rule: &RequiredRule, target: &RequestTarget) -> bool {
    let subject = rule.subject.as_str();
    if let Some(conditions) = &rule.conditions {
        return ability.can_record(rule.action, subject, &conditions.resolve(target));
    }
    if let Some(fields) = &rule.fields {
        return fields
            .resolve(target)
            .iter()
            .all(|field| ability.can_field(rule.action, subject, field));
    }
    ability.can(rule.action, subject)
}
