//! Declarative access requirements attached to operations.
//!
//! A requirement is registered per operation and read by the access guard at
//! dispatch time. Most operations should use the structured forms
//! ([`AccessRequirement::Rule`] / [`AccessRequirement::All`]); the predicate
//! form is an escape hatch for checks that cannot be expressed as tuples.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;

use crate::ability::Ability;
use crate::permissions::{Action, Record, Subject};

// ─────────────────────────────────────────────────────────────────────────────
// Request target
// ─────────────────────────────────────────────────────────────────────────────

/// What the current request points at: matched path parameters and the
/// top-level field names of its JSON body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestTarget {
    params: BTreeMap<String, String>,
    body_fields: Vec<String>,
}

impl RequestTarget {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    pub fn with_params<I, K, V>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.params
            .extend(params.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    pub fn with_body_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.body_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    pub fn body_fields(&self) -> &[String] {
        &self.body_fields
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Conditions and fields
// ─────────────────────────────────────────────────────────────────────────────

/// Where a condition attribute gets its value from.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrSource {
    Literal(Value),
    /// Value of a path parameter of the matched route.
    PathParam(Cow<'static, str>),
    /// Path parameter passed through a parser; unparseable values are absent.
    ParsedPathParam(Cow<'static, str>, ParamParser),
}

/// Maps a raw path parameter to its canonical attribute value.
#[derive(Clone, Copy)]
pub struct ParamParser(pub fn(&str) -> Option<Value>);

impl fmt::Debug for ParamParser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ParamParser(..)")
    }
}

impl PartialEq for ParamParser {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::fn_addr_eq(self.0, other.0)
    }
}

/// Attributes of the target record, resolved per request.
///
/// An empty set of conditions describes a record with no known attributes:
/// only unconditional rules can match it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Conditions {
    attrs: Vec<(String, AttrSource)>,
}

impl Conditions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn literal(mut self, attr: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attrs
            .push((attr.into(), AttrSource::Literal(value.into())));
        self
    }

    pub fn path_param(mut self, attr: impl Into<String>, param: &'static str) -> Self {
        self.attrs
            .push((attr.into(), AttrSource::PathParam(Cow::Borrowed(param))));
        self
    }

    /// Like [`Conditions::path_param`], with the raw value canonicalized by
    /// `parse` before comparison.
    pub fn parsed_path_param(
        mut self,
        attr: impl Into<String>,
        param: &'static str,
        parse: fn(&str) -> Option<Value>,
    ) -> Self {
        self.attrs.push((
            attr.into(),
            AttrSource::ParsedPathParam(Cow::Borrowed(param), ParamParser(parse)),
        ));
        self
    }

    /// Materialize the target record. Missing path parameters leave the
    /// attribute absent, so conditions on it cannot match.
    pub fn resolve(&self, target: &RequestTarget) -> Record {
        let mut record = Record::new();
        for (attr, source) in &self.attrs {
            match source {
                AttrSource::Literal(value) => record.insert(attr.clone(), value.clone()),
                AttrSource::PathParam(param) => {
                    if let Some(value) = target.param(param) {
                        record.insert(attr.clone(), value);
                    }
                }
                AttrSource::ParsedPathParam(param, ParamParser(parse)) => {
                    if let Some(value) = target.param(param).and_then(*parse) {
                        record.insert(attr.clone(), value);
                    }
                }
            }
        }
        record
    }
}

/// Which fields a requirement restricts the check to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldScope {
    Named(Vec<String>),
    /// Every top-level field present in the request body.
    RequestBody,
}

impl FieldScope {
    pub fn resolve<'a>(&'a self, target: &'a RequestTarget) -> &'a [String] {
        match self {
            FieldScope::Named(fields) => fields,
            FieldScope::RequestBody => target.body_fields(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Requirements
// ─────────────────────────────────────────────────────────────────────────────

/// One `{action, subject, fields?, conditions?}` tuple.
#[derive(Debug, Clone, PartialEq)]
pub struct RequiredRule {
    pub action: Action,
    pub subject: Subject,
    pub fields: Option<FieldScope>,
    pub conditions: Option<Conditions>,
}

impl RequiredRule {
    pub fn new(action: Action, subject: Subject) -> Self {
        Self {
            action,
            subject,
            fields: None,
            conditions: None,
        }
    }

    pub fn with_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = Some(FieldScope::Named(fields.into_iter().map(Into::into).collect()));
        self
    }

    pub fn with_body_fields(mut self) -> Self {
        self.fields = Some(FieldScope::RequestBody);
        self
    }

    pub fn with_conditions(mut self, conditions: Conditions) -> Self {
        self.conditions = Some(conditions);
        self
    }
}

/// Custom check run against the caller's ability.
pub type PolicyHandler = Arc<dyn Fn(&Ability) -> bool + Send + Sync>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RequirementError {
    #[error("a list requirement needs at least one rule")]
    EmptyList,
}

/// The permission check attached to an operation.
#[derive(Clone)]
pub enum AccessRequirement {
    Rule(RequiredRule),
    /// Every rule must pass (checked in order, stopping at the first failure).
    All(Vec<RequiredRule>),
    Predicate(PolicyHandler),
}

impl AccessRequirement {
    pub fn rule(rule: RequiredRule) -> Self {
        Self::Rule(rule)
    }

    pub fn all(rules: impl IntoIterator<Item = RequiredRule>) -> Result<Self, RequirementError> {
        let rules: Vec<_> = rules.into_iter().collect();
        if rules.is_empty() {
            return Err(RequirementError::EmptyList);
        }
        Ok(Self::All(rules))
    }

    pub fn predicate<F>(f: F) -> Self
    where
        F: Fn(&Ability) -> bool + Send + Sync + 'static,
    {
        Self::Predicate(Arc::new(f))
    }

    /// Whether resolving this requirement needs the request body's field names.
    pub fn reads_body_fields(&self) -> bool {
        let uses_body = |r: &RequiredRule| matches!(r.fields, Some(FieldScope::RequestBody));
        match self {
            Self::Rule(rule) => uses_body(rule),
            Self::All(rules) => rules.iter().any(uses_body),
            Self::Predicate(_) => false,
        }
    }
}

impl fmt::Debug for AccessRequirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rule(rule) => f.debug_tuple("Rule").field(rule).finish(),
            Self::All(rules) => f.debug_tuple("All").field(rules).finish(),
            Self::Predicate(_) => f.write_str("Predicate(..)"),
        }
    }
}

impl From<RequiredRule> for AccessRequirement {
    fn from(rule: RequiredRule) -> Self {
        Self::Rule(rule)
    }
}
