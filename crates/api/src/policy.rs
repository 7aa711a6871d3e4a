//! Requirement registry keyed by operation.
//!
//! An operation id is `"<METHOD> <route template>"`, e.g. `"GET /users/:id"`.
//! Operations without an entry have no requirement: once authenticated, the
//! caller may proceed.

use std::collections::HashMap;

use axum::http::Method;
use serde_json::Value;

use userguard_auth::{subjects, AccessRequirement, Action, Conditions, RequiredRule};
use userguard_core::UserId;

pub fn operation_id(method: &Method, route: &str) -> String {
    format!("{method} {route}")
}

#[derive(Debug, Clone, Default)]
pub struct OperationPolicies {
    requirements: HashMap<String, AccessRequirement>,
}

impl OperationPolicies {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach `requirement` to an operation, replacing any previous one.
    pub fn register(mut self, method: Method, route: &str, requirement: impl Into<AccessRequirement>) -> Self {
        self.requirements
            .insert(operation_id(&method, route), requirement.into());
        self
    }

    pub fn get(&self, method: &Method, route: &str) -> Option<&AccessRequirement> {
        self.requirements.get(&operation_id(method, route))
    }

    pub fn len(&self) -> usize {
        self.requirements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requirements.is_empty()
    }
}

fn own_record() -> Conditions {
    Conditions::new().parsed_path_param("id", "id", canonical_user_id)
}

/// Any spelling the id parser accepts compares equal to `UserId`'s display form.
fn canonical_user_id(raw: &str) -> Option<Value> {
    raw.parse::<UserId>()
        .ok()
        .map(|id| Value::String(id.to_string()))
}

/// Requirements of the user-management operations.
pub fn user_policies() -> OperationPolicies {
    OperationPolicies::new()
        .register(
            Method::POST,
            "/users",
            AccessRequirement::predicate(|ability| ability.can(Action::Create, subjects::USER.as_str())),
        )
        // A record with no known attributes: only unconditional read grants match.
        .register(
            Method::GET,
            "/users",
            RequiredRule::new(Action::Read, subjects::USER).with_conditions(Conditions::new()),
        )
        .register(
            Method::GET,
            "/users/:id",
            RequiredRule::new(Action::Read, subjects::USER).with_conditions(own_record()),
        )
        .register(
            Method::PATCH,
            "/users/:id",
            AccessRequirement::All(vec![
                RequiredRule::new(Action::Update, subjects::USER).with_conditions(own_record()),
                RequiredRule::new(Action::Update, subjects::USER).with_body_fields(),
            ]),
        )
        .register(
            Method::DELETE,
            "/users/:id",
            RequiredRule::new(Action::Delete, subjects::USER),
        )
}

#[cfg(test)]
mod tests {
    use userguard_auth::guard::evaluate;
    use userguard_auth::{ability_for, Identity, RequestTarget, Role};
    use userguard_core::UserId;

    use super::*;

    fn decide(role: Role, method: Method, route: &str, target: &RequestTarget, me: UserId) -> bool {
        let policies = user_policies();
        let requirement = policies.get(&method, route).unwrap();
        evaluate(&ability_for(&Identity::new(me, role)), requirement, target)
    }

    #[test]
    fn operation_ids_use_method_and_template() {
        assert_eq!(operation_id(&Method::PATCH, "/users/:id"), "PATCH /users/:id");
        let policies = user_policies();
        assert_eq!(policies.len(), 5);
        assert!(policies.get(&Method::GET, "/auth/me").is_none());
        assert!(policies.get(&Method::PUT, "/users/:id").is_none());
    }

    #[test]
    fn only_admin_creates_and_deletes() {
        let me = UserId::new();
        let t = RequestTarget::new().with_param("id", UserId::new().to_string());
        for (role, allowed) in [(Role::Admin, true), (Role::Manager, false), (Role::User, false)] {
            assert_eq!(decide(role, Method::POST, "/users", &t, me), allowed);
            assert_eq!(decide(role, Method::DELETE, "/users/:id", &t, me), allowed);
        }
    }

    #[test]
    fn listing_needs_unconditional_read() {
        let me = UserId::new();
        let t = RequestTarget::new();
        assert!(decide(Role::Admin, Method::GET, "/users", &t, me));
        assert!(decide(Role::Manager, Method::GET, "/users", &t, me));
        assert!(!decide(Role::User, Method::GET, "/users", &t, me));
    }

    #[test]
    fn regular_user_reads_only_own_record() {
        let me = UserId::new();
        let own = RequestTarget::new().with_param("id", me.to_string());
        let other = RequestTarget::new().with_param("id", UserId::new().to_string());

        assert!(decide(Role::User, Method::GET, "/users/:id", &own, me));
        assert!(!decide(Role::User, Method::GET, "/users/:id", &other, me));
        assert!(decide(Role::Manager, Method::GET, "/users/:id", &other, me));
    }

    #[test]
    fn own_record_matches_any_spelling_of_the_id() {
        let me = UserId::new();
        let upper = RequestTarget::new().with_param("id", me.to_string().to_uppercase());
        let simple = RequestTarget::new().with_param("id", me.as_uuid().simple().to_string());
        let garbage = RequestTarget::new().with_param("id", "not-a-uuid");

        assert!(decide(Role::User, Method::GET, "/users/:id", &upper, me));
        assert!(decide(Role::User, Method::GET, "/users/:id", &simple, me));
        assert!(!decide(Role::User, Method::GET, "/users/:id", &garbage, me));

        let rename = upper.with_body_fields(["name"]);
        assert!(decide(Role::User, Method::PATCH, "/users/:id", &rename, me));
    }

    #[test]
    fn patch_matrix() {
        let me = UserId::new();
        let own = |fields: &[&str]| {
            RequestTarget::new()
                .with_param("id", me.to_string())
                .with_body_fields(fields.iter().copied())
        };
        let other = |fields: &[&str]| {
            RequestTarget::new()
                .with_param("id", UserId::new().to_string())
                .with_body_fields(fields.iter().copied())
        };
        let patch = |role, t: &RequestTarget| decide(role, Method::PATCH, "/users/:id", t, me);

        assert!(patch(Role::User, &own(&["name"])));
        assert!(!patch(Role::User, &own(&["name", "role"])));
        assert!(!patch(Role::User, &other(&["name"])));

        assert!(patch(Role::Manager, &other(&["name", "email"])));
        assert!(!patch(Role::Manager, &other(&["role"])));

        assert!(patch(Role::Admin, &other(&["role"])));
    }
}
