//! Stakeholder roles that take turns acting on the city.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the five stakeholder roles.
///
/// Roles carry no behaviour of their own: the operators a role owns are
/// looked up in the [`OperatorRegistry`](crate::OperatorRegistry), its money
/// lives in [`CityState::budgets`](crate::CityState::budgets) and its
/// scheduling weight in [`RoleRotation`](crate::RoleRotation).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Neighborhoods Coalition
    Neighborhoods,
    /// Business District
    Business,
    /// Medical Quarter
    Medical,
    /// Shelters & Services
    Shelters,
    /// University Consortium
    University,
}

impl Role {
    /// All playable roles in their canonical order.
    pub const ALL: [Role; 5] = [
        Role::Neighborhoods,
        Role::Business,
        Role::Medical,
        Role::Shelters,
        Role::University,
    ];

    /// Human-readable role name.
    pub fn display_name(self) -> &'static str {
        match self {
            Role::Neighborhoods => "Neighborhoods Coalition",
            Role::Business => "Business District",
            Role::Medical => "Medical Quarter",
            Role::Shelters => "Shelters & Services",
            Role::University => "University Consortium",
        }
    }

    /// Parse the snake_case identifier used in config files and on the CLI.
    pub fn from_key(key: &str) -> Option<Role> {
        Role::ALL.into_iter().find(|r| r.key() == key)
    }

    /// snake_case identifier, matching the serde representation.
    pub fn key(self) -> &'static str {
        match self {
            Role::Neighborhoods => "neighborhoods",
            Role::Business => "business",
            Role::Medical => "medical",
            Role::Shelters => "shelters",
            Role::University => "university",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}
