//! Role table — the five ordinal privilege tiers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A user's privilege tier. Ordered: each role carries an ordinal
/// level, and every capability granted at a lower level is granted at
/// all higher levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    BusinessUser,
    BusinessManager,
    Technician,
    SystemsManager,
    ApplicationAdmin,
}

impl Role {
    /// Ordinal privilege level, 1 (lowest) through 5 (highest).
    pub fn level(self) -> u8 {
        match self {
            Role::BusinessUser => 1,
            Role::BusinessManager => 2,
            Role::Technician => 3,
            Role::SystemsManager => 4,
            Role::ApplicationAdmin => 5,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::BusinessUser => "business_user",
            Role::BusinessManager => "business_manager",
            Role::Technician => "technician",
            Role::SystemsManager => "systems_manager",
            Role::ApplicationAdmin => "application_admin",
        }
    }

    /// Parse a stored role string. Unknown strings yield `None`, which
    /// every permission check treats as deny.
    pub fn parse(s: &str) -> Option<Role> {
        match s {
            "business_user" => Some(Role::BusinessUser),
            "business_manager" => Some(Role::BusinessManager),
            "technician" => Some(Role::Technician),
            "systems_manager" => Some(Role::SystemsManager),
            "application_admin" => Some(Role::ApplicationAdmin),
            _ => None,
        }
    }

    pub fn can_manage_users(self) -> bool {
        self == Role::ApplicationAdmin
    }

    pub fn can_view_system_notes(self) -> bool {
        self.level() >= Role::SystemsManager.level()
    }

    pub fn can_create_records(self) -> bool {
        self.level() >= Role::SystemsManager.level()
    }

    pub fn can_delete_records(self) -> bool {
        self.level() >= Role::SystemsManager.level()
    }

    pub fn has_write_access(self) -> bool {
        self.level() >= Role::Technician.level()
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// All roles in ascending level order.
pub const ALL_ROLES: [Role; 5] = [
    Role::BusinessUser,
    Role::BusinessManager,
    Role::Technician,
    Role::SystemsManager,
    Role::ApplicationAdmin,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_round_trips() {
        for role in ALL_ROLES {
            assert_eq!(Role::parse(role.as_str()), Some(role));
        }
        assert_eq!(Role::parse("superuser"), None);
        assert_eq!(Role::parse(""), None);
    }

    #[test]
    fn levels_are_strictly_ordered() {
        for pair in ALL_ROLES.windows(2) {
            assert!(pair[0].level() < pair[1].level());
        }
    }
}
