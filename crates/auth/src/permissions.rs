//! Permission vocabulary: actions, subjects, conditions and rules.
//!
//! Action and subject strings are a wire-level contract between whoever
//! declares requirements on operations and the evaluator. They are matched
//! exactly (case-sensitive).

use std::borrow::Cow;
use std::collections::{BTreeMap, BTreeSet};

use core::str::FromStr;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

// ─────────────────────────────────────────────────────────────────────────────
// Action
// ─────────────────────────────────────────────────────────────────────────────

/// What a caller wants to do with a subject.
///
/// `Manage` subsumes every other action for its subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Manage,
    Create,
    Read,
    Update,
    Delete,
}

impl Action {
    pub const ALL: [Action; 5] = [
        Action::Manage,
        Action::Create,
        Action::Read,
        Action::Update,
        Action::Delete,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Manage => "manage",
            Action::Create => "create",
            Action::Read => "read",
            Action::Update => "update",
            Action::Delete => "delete",
        }
    }

    /// Whether a rule declared for `self` covers a query for `requested`.
    pub fn covers(self, requested: Action) -> bool {
        self == Action::Manage || self == requested
    }
}

impl core::fmt::Display for Action {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown action '{0}'")]
pub struct UnknownAction(pub String);

impl FromStr for Action {
    type Err = UnknownAction;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Action::ALL
            .into_iter()
            .find(|a| a.as_str() == s)
            .ok_or_else(|| UnknownAction(s.to_string()))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Subject
// ─────────────────────────────────────────────────────────────────────────────

/// Resource type a rule applies to (e.g. `"User"`).
///
/// The special subject `"all"` matches every subject.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Subject(Cow<'static, str>);

impl Subject {
    pub const WILDCARD: &'static str = "all";

    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub const fn from_static(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_wildcard(&self) -> bool {
        self.as_str() == Self::WILDCARD
    }

    /// Whether a rule declared for `self` covers a query for `requested`.
    pub fn covers(&self, requested: &str) -> bool {
        self.is_wildcard() || self.as_str() == requested
    }
}

impl core::fmt::Display for Subject {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Well-known subjects.
pub mod subjects {
    use super::Subject;

    pub const ALL: Subject = Subject::from_static(Subject::WILDCARD);
    pub const USER: Subject = Subject::from_static("User");
}

// ─────────────────────────────────────────────────────────────────────────────
// Records and conditions
// ─────────────────────────────────────────────────────────────────────────────

/// Attributes of a concrete target instance, used to evaluate conditions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(Map<String, Value>);

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a record from any serializable value.
    ///
    /// Non-object values produce an empty record.
    pub fn from_serialize<T: Serialize>(value: &T) -> Result<Self, serde_json::Error> {
        match serde_json::to_value(value)? {
            Value::Object(map) => Ok(Self(map)),
            _ => Ok(Self::default()),
        }
    }

    pub fn with(mut self, attr: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(attr, value);
        self
    }

    pub fn insert(&mut self, attr: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(attr.into(), value.into());
    }

    pub fn get(&self, attr: &str) -> Option<&Value> {
        self.0.get(attr)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Conjunction of attribute equalities that a record must satisfy.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    equals: BTreeMap<String, Value>,
}

impl Condition {
    /// `record[attr] == value`.
    pub fn equals(attr: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::default().and_equals(attr, value)
    }

    pub fn and_equals(mut self, attr: impl Into<String>, value: impl Into<Value>) -> Self {
        self.equals.insert(attr.into(), value.into());
        self
    }

    pub fn matches(&self, record: &Record) -> bool {
        self.equals
            .iter()
            .all(|(attr, expected)| record.get(attr) == Some(expected))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Rules
// ─────────────────────────────────────────────────────────────────────────────

/// Polarity of a permission rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Effect {
    Grant,
    Deny,
}

/// A single grant or denial.
///
/// `fields` narrows the rule to the named fields of the subject;
/// `condition` narrows it to instances whose attributes satisfy it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PermissionRule {
    pub effect: Effect,
    pub action: Action,
    pub subject: Subject,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields: Option<BTreeSet<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<Condition>,
}

impl PermissionRule {
    pub fn grant(action: Action, subject: Subject) -> Self {
        Self::with_effect(Effect::Grant, action, subject)
    }

    pub fn deny(action: Action, subject: Subject) -> Self {
        Self::with_effect(Effect::Deny, action, subject)
    }

    fn with_effect(effect: Effect, action: Action, subject: Subject) -> Self {
        Self {
            effect,
            action,
            subject,
            fields: None,
            condition: None,
        }
    }

    pub fn on_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    pub fn when(mut self, condition: Condition) -> Self {
        self.condition = Some(condition);
        self
    }

    pub fn is_deny(&self) -> bool {
        self.effect == Effect::Deny
    }

    /// Whether this rule takes part in deciding `query`.
    ///
    /// Field- and condition-scoped rules are only partially relevant to a
    /// query that names no field (or no record): a scoped grant still grants
    /// the subject for *some* field or instance, while a scoped denial does
    /// not deny the subject as a whole.
    pub fn applies_to(&self, query: &Query<'_>) -> bool {
        if !self.action.covers(query.action) || !self.subject.covers(query.subject) {
            return false;
        }

        let field_ok = match (&self.fields, query.field) {
            (None, _) => true,
            (Some(fields), Some(field)) => fields.contains(field),
            (Some(_), None) => !self.is_deny(),
        };

        let condition_ok = match (&self.condition, query.record) {
            (None, _) => true,
            (Some(condition), Some(record)) => condition.matches(record),
            (Some(_), None) => !self.is_deny(),
        };

        field_ok && condition_ok
    }
}

/// A permission question: may the caller perform `action` on `subject`,
/// optionally restricted to one `field` and/or one concrete `record`?
#[derive(Debug, Clone, Copy)]
pub struct Query<'a> {
    pub action: Action,
    pub subject: &'a str,
    pub field: Option<&'a str>,
    pub record: Option<&'a Record>,
}

impl<'a> Query<'a> {
    pub fn new(action: Action, subject: &'a str) -> Self {
        Self {
            action,
            subject,
            field: None,
            record: None,
        }
    }

    pub fn field(mut self, field: &'a str) -> Self {
        self.field = Some(field);
        self
    }

    pub fn record(mut self, record: &'a Record) -> Self {
        self.record = Some(record);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_strings_are_exact() {
        for action in Action::ALL {
            assert_eq!(action.as_str().parse::<Action>().unwrap(), action);
        }
        assert!("Read".parse::<Action>().is_err());
        assert!("READ".parse::<Action>().is_err());
    }

    #[test]
    fn manage_covers_everything() {
        for action in Action::ALL {
            assert!(Action::Manage.covers(action));
        }
        assert!(!Action::Read.covers(Action::Update));
        assert!(!Action::Read.covers(Action::Manage));
    }

    #[test]
    fn wildcard_subject_covers_any_subject() {
        assert!(subjects::ALL.covers("User"));
        assert!(subjects::ALL.covers("all"));
        assert!(subjects::USER.covers("User"));
        assert!(!subjects::USER.covers("user"));
        assert!(!subjects::USER.covers("all"));
    }

    #[test]
    fn condition_requires_every_attribute() {
        let cond = Condition::equals("id", "u1").and_equals("role", "user");
        assert!(cond.matches(&Record::new().with("id", "u1").with("role", "user")));
        assert!(!cond.matches(&Record::new().with("id", "u1")));
        assert!(!cond.matches(&Record::new().with("id", "u2").with("role", "user")));
    }

    #[test]
    fn record_from_struct_uses_serialized_attributes() {
        #[derive(Serialize)]
        struct Doc {
            id: &'static str,
            owner: &'static str,
        }

        let record = Record::from_serialize(&Doc { id: "d1", owner: "u1" }).unwrap();
        assert_eq!(record.get("owner"), Some(&Value::from("u1")));
        assert!(Record::from_serialize(&42).unwrap().is_empty());
    }

    #[test]
    fn scoped_denial_does_not_apply_to_unscoped_query() {
        let rule = PermissionRule::deny(Action::Update, subjects::USER).on_fields(["role"]);
        assert!(!rule.applies_to(&Query::new(Action::Update, "User")));
        assert!(rule.applies_to(&Query::new(Action::Update, "User").field("role")));
        assert!(!rule.applies_to(&Query::new(Action::Update, "User").field("name")));
    }

    #[test]
    fn scoped_grant_applies_to_unscoped_query() {
        let rule = PermissionRule::grant(Action::Read, subjects::USER).when(Condition::equals("id", "u1"));
        assert!(rule.applies_to(&Query::new(Action::Read, "User")));

        let mine = Record::new().with("id", "u1");
        let theirs = Record::new().with("id", "u2");
        assert!(rule.applies_to(&Query::new(Action::Read, "User").record(&mine)));
        assert!(!rule.applies_to(&Query::new(Action::Read, "User").record(&theirs)));
    }

    #[test]
    fn rules_serialize_without_empty_scopes() {
        let rule = PermissionRule::grant(Action::Manage, subjects::ALL);
        let json = serde_json::to_value(&rule).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "effect": "grant", "action": "manage", "subject": "all" })
        );
    }
}
