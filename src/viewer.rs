//! The acting identity a disclosure decision is made for.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// An authenticated viewer.
///
/// Anonymous callers are modelled as `Option<&Viewer>::None` at the call
/// site, never as a placeholder viewer. There is no implicit or ambient
/// current-user lookup: every decision takes the viewer explicitly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewer {
    /// Viewer identifier, compared against resource owner ids.
    pub id: String,
    /// Assigned role names.
    #[serde(default)]
    pub roles: BTreeSet<String>,
    /// Resource ids this viewer owns through an external relation.
    #[serde(default)]
    pub owns: BTreeSet<String>,
}

impl Viewer {
    /// Create a viewer with no roles.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            roles: BTreeSet::new(),
            owns: BTreeSet::new(),
        }
    }

    /// Create a viewer holding the given roles.
    pub fn with_roles<I, S>(id: impl Into<String>, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            id: id.into(),
            roles: roles.into_iter().map(Into::into).collect(),
            owns: BTreeSet::new(),
        }
    }

    /// Add a role.
    pub fn role(mut self, role: impl Into<String>) -> Self {
        self.roles.insert(role.into());
        self
    }

    /// Record ownership of a specific resource id.
    pub fn owning(mut self, resource_id: impl Into<String>) -> Self {
        self.owns.insert(resource_id.into());
        self
    }

    /// Check whether the viewer holds `role`.
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.contains(role)
    }

    /// Check whether the viewer holds at least one of `roles`.
    pub fn has_any_role(&self, roles: &BTreeSet<String>) -> bool {
        // Iterate the smaller set.
        if self.roles.len() <= roles.len() {
            self.roles.iter().any(|r| roles.contains(r))
        } else {
            roles.iter().any(|r| self.roles.contains(r))
        }
    }

    /// Check whether the viewer holds the `admin` role.
    pub fn is_admin(&self) -> bool {
        self.has_role("admin")
    }

    /// Check whether `resource_id` is among the viewer's owned resources.
    pub fn owns_resource(&self, resource_id: &str) -> bool {
        self.owns.contains(resource_id)
    }
}
