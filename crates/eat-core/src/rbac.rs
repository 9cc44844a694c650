//! Permission evaluation over the role table and per-record grants.
//!
//! [`evaluate`] is a pure decision function: it never touches storage
//! and never errors. Grant state for the target record is resolved by
//! the caller (already expiry-filtered) and passed in as a
//! [`TargetAccess`] snapshot.

use serde::{Deserialize, Serialize};

use crate::models::role::Role;

/// A named permission checked against a role (and, for record-scoped
/// capabilities, a target).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    ManageUsers,
    ViewSystemNotes,
    ViewSensitiveData,
    CreateRecords,
    EditRecords,
    DeleteRecords,
    ViewRecords,
    /// Issuing and revoking record-level grants.
    ManageGrants,
}

impl Capability {
    /// Minimum role level at which the capability is granted. Because
    /// capabilities are pure thresholds, hierarchy inheritance is
    /// monotonic: anything granted at level N is granted at every
    /// level above N.
    pub fn min_level(self) -> u8 {
        match self {
            Capability::ManageUsers => 5,
            Capability::ViewSystemNotes
            | Capability::ViewSensitiveData
            | Capability::CreateRecords
            | Capability::DeleteRecords
            | Capability::ManageGrants => 4,
            Capability::EditRecords => 3,
            Capability::ViewRecords => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny,
}

impl Decision {
    pub fn is_allowed(self) -> bool {
        self == Decision::Allow
    }

    pub fn is_denied(self) -> bool {
        self == Decision::Deny
    }
}

/// Caller-assembled snapshot of the actor's relationship to a target
/// record. Grant flags must already reflect lazy expiry — an expired
/// grant is passed as `false`, identical to an absent one.
#[derive(Debug, Clone, Copy, Default)]
pub struct TargetAccess {
    /// The actor created the target record.
    pub is_creator: bool,
    /// The record is marked readable by business roles.
    pub public_visible: bool,
    pub view_granted: bool,
    pub edit_granted: bool,
}

/// Decide whether `role` may exercise `capability`, optionally against
/// a specific target record.
///
/// A missing or unknown role (`None`) always denies — fail closed,
/// never an error. The highest applicable rule wins; there is no
/// deny-overrides-allow interaction across levels.
pub fn evaluate(
    role: Option<Role>,
    capability: Capability,
    target: Option<&TargetAccess>,
) -> Decision {
    let Some(role) = role else {
        return Decision::Deny;
    };

    match (capability, target) {
        (Capability::EditRecords, Some(access)) => {
            if role.level() >= Role::SystemsManager.level() {
                Decision::Allow
            } else if role == Role::Technician && (access.is_creator || access.edit_granted) {
                Decision::Allow
            } else {
                Decision::Deny
            }
        }
        (Capability::ViewRecords, Some(access)) => {
            if role.level() >= Role::SystemsManager.level() {
                Decision::Allow
            } else if role == Role::Technician {
                // An edit grant implies read access.
                if access.is_creator || access.view_granted || access.edit_granted {
                    Decision::Allow
                } else {
                    Decision::Deny
                }
            } else if access.public_visible || access.view_granted {
                Decision::Allow
            } else {
                Decision::Deny
            }
        }
        // Role-gated capabilities, and record-scoped ones checked
        // without a target: a plain threshold on the ordinal level.
        (capability, _) => {
            if role.level() >= capability.min_level() {
                Decision::Allow
            } else {
                Decision::Deny
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::role::ALL_ROLES;

    #[test]
    fn unknown_role_always_denies() {
        for capability in [
            Capability::ManageUsers,
            Capability::ViewSystemNotes,
            Capability::CreateRecords,
            Capability::EditRecords,
            Capability::DeleteRecords,
            Capability::ViewRecords,
        ] {
            assert!(evaluate(None, capability, None).is_denied());
            assert!(evaluate(None, capability, Some(&TargetAccess::default())).is_denied());
        }
    }

    #[test]
    fn capability_grants_are_monotonic_across_levels() {
        let capabilities = [
            Capability::ManageUsers,
            Capability::ViewSystemNotes,
            Capability::ViewSensitiveData,
            Capability::CreateRecords,
            Capability::EditRecords,
            Capability::DeleteRecords,
            Capability::ViewRecords,
            Capability::ManageGrants,
        ];
        for pair in ALL_ROLES.windows(2) {
            let (lower, higher) = (pair[0], pair[1]);
            for capability in capabilities {
                if evaluate(Some(lower), capability, None).is_allowed() {
                    assert!(
                        evaluate(Some(higher), capability, None).is_allowed(),
                        "{higher} must inherit {capability:?} from {lower}"
                    );
                }
            }
        }
    }

    #[test]
    fn evaluate_is_deterministic() {
        let access = TargetAccess {
            is_creator: true,
            ..Default::default()
        };
        let first = evaluate(Some(Role::Technician), Capability::EditRecords, Some(&access));
        let second = evaluate(Some(Role::Technician), Capability::EditRecords, Some(&access));
        assert_eq!(first, second);
    }

    #[test]
    fn technician_edit_requires_ownership_or_grant() {
        // Not the creator, no grant.
        let access = TargetAccess::default();
        assert!(
            evaluate(Some(Role::Technician), Capability::EditRecords, Some(&access)).is_denied()
        );

        // Edit grant issued.
        let access = TargetAccess {
            edit_granted: true,
            ..Default::default()
        };
        assert!(
            evaluate(Some(Role::Technician), Capability::EditRecords, Some(&access)).is_allowed()
        );

        // Creator without any grant.
        let access = TargetAccess {
            is_creator: true,
            ..Default::default()
        };
        assert!(
            evaluate(Some(Role::Technician), Capability::EditRecords, Some(&access)).is_allowed()
        );
    }

    #[test]
    fn managers_edit_unconditionally() {
        let access = TargetAccess::default();
        for role in [Role::SystemsManager, Role::ApplicationAdmin] {
            assert!(evaluate(Some(role), Capability::EditRecords, Some(&access)).is_allowed());
        }
        for role in [Role::BusinessUser, Role::BusinessManager] {
            assert!(evaluate(Some(role), Capability::EditRecords, Some(&access)).is_denied());
        }
    }

    #[test]
    fn business_roles_view_public_or_granted_records_only() {
        let hidden = TargetAccess::default();
        let public = TargetAccess {
            public_visible: true,
            ..Default::default()
        };
        let granted = TargetAccess {
            view_granted: true,
            ..Default::default()
        };
        for role in [Role::BusinessUser, Role::BusinessManager] {
            assert!(evaluate(Some(role), Capability::ViewRecords, Some(&hidden)).is_denied());
            assert!(evaluate(Some(role), Capability::ViewRecords, Some(&public)).is_allowed());
            assert!(evaluate(Some(role), Capability::ViewRecords, Some(&granted)).is_allowed());
        }
    }

    #[test]
    fn edit_grant_implies_view_for_technician() {
        let access = TargetAccess {
            edit_granted: true,
            ..Default::default()
        };
        assert!(
            evaluate(Some(Role::Technician), Capability::ViewRecords, Some(&access)).is_allowed()
        );
    }

    #[test]
    fn only_admin_manages_users() {
        assert!(evaluate(Some(Role::ApplicationAdmin), Capability::ManageUsers, None).is_allowed());
        for role in [
            Role::BusinessUser,
            Role::BusinessManager,
            Role::Technician,
            Role::SystemsManager,
        ] {
            assert!(evaluate(Some(role), Capability::ManageUsers, None).is_denied());
        }
    }
}
