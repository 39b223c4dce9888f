//! Sensitivity classes for fields.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Who a field is meant for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sensitivity {
    /// Visible to everyone, including anonymous viewers.
    #[default]
    Public,
    /// Visible to the record owner only.
    OwnerOnly,
    /// Visible to moderators (and the owner, unless overridden).
    ModeratorOnly,
    /// Visible to admins (and the owner, unless overridden).
    AdminOnly,
}

impl Sensitivity {
    /// Whether the class is gated on a role set.
    pub fn is_role_gated(&self) -> bool {
        matches!(self, Sensitivity::ModeratorOnly | Sensitivity::AdminOnly)
    }

    /// Roles satisfying the class when a rule declares none.
    pub fn default_roles(&self) -> BTreeSet<String> {
        let roles: &[&str] = match self {
            Sensitivity::Public | Sensitivity::OwnerOnly => &[],
            Sensitivity::ModeratorOnly => &["moderator", "admin"],
            Sensitivity::AdminOnly => &["admin"],
        };
        roles.iter().map(|r| r.to_string()).collect()
    }

    /// Name as written in the YAML file.
    pub fn as_str(&self) -> &'static str {
        match self {
            Sensitivity::Public => "public",
            Sensitivity::OwnerOnly => "owner_only",
            Sensitivity::ModeratorOnly => "moderator_only",
            Sensitivity::AdminOnly => "admin_only",
        }
    }
}

impl fmt::Display for Sensitivity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
