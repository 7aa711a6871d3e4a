//! `userguard-auth`: authentication and authorization boundary.
//!
//! Decoupled from HTTP and storage: the API crate supplies request targets
//! and identities, the infra crate supplies stored users.

pub mod ability;
pub mod blacklist;
pub mod claims;
pub mod guard;
pub mod password;
pub mod permissions;
pub mod principal;
pub mod requirement;
pub mod roles;
pub mod rules;
pub mod token;
pub mod user;

pub use ability::Ability;
pub use blacklist::TokenBlacklist;
pub use claims::{validate_claims, TokenClaims, TokenValidationError};
pub use guard::{AccessGuard, AuthzError, PERMISSION_DENIED_MESSAGE};
pub use password::{hash_password, verify_password, PasswordError};
pub use permissions::{subjects, Action, Condition, Effect, PermissionRule, Query, Record, Subject};
pub use principal::Identity;
pub use requirement::{AccessRequirement, Conditions, FieldScope, RequestTarget, RequiredRule, RequirementError};
pub use roles::Role;
pub use rules::{ability_for, rules_for, RoleRules, RuleSource};
pub use token::{Hs256TokenCodec, TokenError, TokenIssuer, TokenVerifier};
pub use user::{User, UserSummary};
