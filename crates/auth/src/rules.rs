//! Role → rule mapping.

use serde_json::Value;

use crate::ability::Ability;
use crate::permissions::{subjects, Action, Condition, PermissionRule};
use crate::{Identity, Role};

/// Source of the rule list for an identity.
///
/// The access guard asks this once per guarded request.
pub trait RuleSource: Send + Sync {
    fn rules_for(&self, identity: &Identity) -> Vec<PermissionRule>;
}

/// The fixed role-based rule set.
#[derive(Debug, Default, Clone, Copy)]
pub struct RoleRules;

impl RuleSource for RoleRules {
    fn rules_for(&self, identity: &Identity) -> Vec<PermissionRule> {
        rules_for(identity)
    }
}

/// Build the ordered rule list for an identity.
///
/// Pure function of `(role, id)`. Grants are emitted before the denials that
/// narrow them.
pub fn rules_for(identity: &Identity) -> Vec<PermissionRule> {
    match identity.role {
        Role::Admin => vec![PermissionRule::grant(Action::Manage, subjects::ALL)],
        Role::Manager => vec![
            PermissionRule::grant(Action::Read, subjects::USER),
            PermissionRule::grant(Action::Update, subjects::USER),
            PermissionRule::deny(Action::Update, subjects::USER).on_fields(["role"]),
            PermissionRule::deny(Action::Create, subjects::USER),
            PermissionRule::deny(Action::Delete, subjects::USER),
        ],
        Role::User => {
            let own_record = Condition::equals("id", Value::String(identity.id.to_string()));
            vec![
                PermissionRule::grant(Action::Read, subjects::USER).when(own_record.clone()),
                PermissionRule::grant(Action::Update, subjects::USER).when(own_record),
                PermissionRule::deny(Action::Update, subjects::USER).on_fields(["role"]),
            ]
        }
    }
}

/// Shorthand for `Ability::new(rules_for(identity))`.
pub fn ability_for(identity: &Identity) -> Ability {
    Ability::new(rules_for(identity))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::permissions::Record;
    use proptest::prelude::*;
    use userguard_core::UserId;

    fn arb_user_id() -> impl Strategy<Value = UserId> {
        any::<u128>().prop_map(|n| UserId::from_uuid(uuid::Uuid::from_u128(n)))
    }

    fn arb_action() -> impl Strategy<Value = Action> {
        prop::sample::select(Action::ALL.to_vec())
    }

    fn arb_subject() -> impl Strategy<Value = String> {
        prop_oneof![Just("User".to_string()), Just("all".to_string()), "[A-Za-z]{1,12}"]
    }

    fn record_of(id: UserId) -> Record {
        Record::new().with("id", id.to_string())
    }

    #[test]
    fn admin_gets_a_single_manage_all_rule() {
        let rules = rules_for(&Identity::new(UserId::new(), Role::Admin));
        assert_eq!(rules, vec![PermissionRule::grant(Action::Manage, subjects::ALL)]);
    }

    #[test]
    fn manager_rules_are_ordered_grants_then_denials() {
        let rules = rules_for(&Identity::new(UserId::new(), Role::Manager));
        assert_eq!(rules.len(), 5);
        assert!(!rules[0].is_deny() && !rules[1].is_deny());
        assert!(rules[2..].iter().all(|r| r.is_deny()));
    }

    proptest! {
        #[test]
        fn rules_depend_only_on_role_and_id(id in arb_user_id(), role in prop::sample::select(Role::ALL.to_vec())) {
            let identity = Identity::new(id, role);
            prop_assert_eq!(rules_for(&identity), rules_for(&identity));
        }

        #[test]
        fn admin_can_do_anything(id in arb_user_id(), action in arb_action(), subject in arb_subject()) {
            let ability = ability_for(&Identity::new(id, Role::Admin));
            prop_assert!(ability.can(action, &subject));
            prop_assert!(ability.can_field(action, &subject, "role"));
            prop_assert!(ability.can_record(action, &subject, &record_of(UserId::new())));
        }

        #[test]
        fn manager_matrix(id in arb_user_id()) {
            let ability = ability_for(&Identity::new(id, Role::Manager));
            prop_assert!(ability.can(Action::Read, "User"));
            prop_assert!(ability.can(Action::Update, "User"));
            prop_assert!(ability.can_field(Action::Update, "User", "name"));
            prop_assert!(!ability.can_field(Action::Update, "User", "role"));
            prop_assert!(!ability.can(Action::Create, "User"));
            prop_assert!(!ability.can(Action::Delete, "User"));
            prop_assert!(!ability.can(Action::Manage, "all"));
        }

        #[test]
        fn manager_reads_any_record(id in arb_user_id(), other in arb_user_id()) {
            let ability = ability_for(&Identity::new(id, Role::Manager));
            prop_assert!(ability.can_record(Action::Read, "User", &record_of(other)));
            prop_assert!(ability.can_record(Action::Read, "User", &Record::new()));
        }

        #[test]
        fn user_reads_only_own_record(id in arb_user_id(), other in arb_user_id()) {
            prop_assume!(id != other);
            let ability = ability_for(&Identity::new(id, Role::User));
            prop_assert!(ability.can_record(Action::Read, "User", &record_of(id)));
            prop_assert!(!ability.can_record(Action::Read, "User", &record_of(other)));
            prop_assert!(ability.can_record(Action::Update, "User", &record_of(id)));
            prop_assert!(!ability.can_record(Action::Update, "User", &record_of(other)));
        }

        #[test]
        fn user_never_updates_role_and_never_creates_or_deletes(id in arb_user_id()) {
            let ability = ability_for(&Identity::new(id, Role::User));
            prop_assert!(!ability.can_field(Action::Update, "User", "role"));
            prop_assert!(ability.can_field(Action::Update, "User", "name"));
            prop_assert!(!ability.can(Action::Create, "User"));
            prop_assert!(!ability.can(Action::Delete, "User"));
            prop_assert!(!ability.can(Action::Manage, "all"));
            // Listing is only granted by an unconditional read rule.
            prop_assert!(!ability.can_record(Action::Read, "User", &Record::new()));
        }
    }
}
