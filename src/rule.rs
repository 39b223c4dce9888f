//! Per-field visibility rules.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::error::PolicyError;
use crate::grant::Grant;
use crate::resource::PolicySubject;
use crate::sensitivity::Sensitivity;
use crate::viewer::Viewer;

/// Visibility rule for a single field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldRule {
    /// Sensitivity class.
    #[serde(default)]
    pub sensitivity: Sensitivity,
    /// Roles satisfying a role-gated class. `None` uses the table defaults.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_roles: Option<BTreeSet<String>>,
    /// Required record status.
    #[serde(default, rename = "status", skip_serializing_if = "Option::is_none")]
    pub status_condition: Option<StatusCondition>,
    /// Whether the record owner may see a role-gated field.
    #[serde(default = "default_owner_override")]
    pub owner_override: bool,
    /// Additional independent routes, OR-combined with the class.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub also: Vec<AccessRoute>,
}

fn default_owner_override() -> bool {
    true
}

/// An independent way of being granted a field.
///
/// Written in config as `owner`, `{ roles: [...] }` or `{ relation: name }`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "RouteSpec", into = "RouteSpec")]
pub enum AccessRoute {
    /// The record owner.
    Owner,
    /// Any viewer holding one of the roles.
    Roles { roles: BTreeSet<String> },
    /// The viewer bound to the record through a named relation.
    Relation { relation: String },
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum RouteSpec {
    Keyword(RouteKeyword),
    Roles { roles: BTreeSet<String> },
    Relation { relation: String },
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
enum RouteKeyword {
    Owner,
}

impl From<RouteSpec> for AccessRoute {
    fn from(spec: RouteSpec) -> Self {
        match spec {
            RouteSpec::Keyword(RouteKeyword::Owner) => AccessRoute::Owner,
            RouteSpec::Roles { roles } => AccessRoute::Roles { roles },
            RouteSpec::Relation { relation } => AccessRoute::Relation { relation },
        }
    }
}

impl From<AccessRoute> for RouteSpec {
    fn from(route: AccessRoute) -> Self {
        match route {
            AccessRoute::Owner => RouteSpec::Keyword(RouteKeyword::Owner),
            AccessRoute::Roles { roles } => RouteSpec::Roles { roles },
            AccessRoute::Relation { relation } => RouteSpec::Relation { relation },
        }
    }
}

/// Record statuses under which a field may be disclosed (any-of).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "StatusSpec", into = "StatusSpec")]
pub struct StatusCondition {
    any_of: BTreeSet<String>,
}

/// Accepts `status: rejected` as well as `status: [rejected, withdrawn]`.
#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum StatusSpec {
    One(String),
    AnyOf(Vec<String>),
}

impl From<StatusSpec> for StatusCondition {
    fn from(spec: StatusSpec) -> Self {
        match spec {
            StatusSpec::One(status) => Self::one(status),
            StatusSpec::AnyOf(statuses) => Self::any_of(statuses),
        }
    }
}

impl From<StatusCondition> for StatusSpec {
    fn from(cond: StatusCondition) -> Self {
        let mut statuses: Vec<String> = cond.any_of.into_iter().collect();
        if statuses.len() == 1 {
            StatusSpec::One(statuses.remove(0))
        } else {
            StatusSpec::AnyOf(statuses)
        }
    }
}

impl StatusCondition {
    pub fn one(status: impl Into<String>) -> Self {
        Self {
            any_of: BTreeSet::from([status.into()]),
        }
    }

    pub fn any_of<I, S>(statuses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            any_of: statuses.into_iter().map(Into::into).collect(),
        }
    }

    pub fn statuses(&self) -> &BTreeSet<String> {
        &self.any_of
    }

    /// A record with no status never satisfies a condition.
    pub fn is_satisfied_by(&self, status: Option<&str>) -> bool {
        status.is_some_and(|s| self.any_of.contains(s))
    }
}

impl Default for FieldRule {
    fn default() -> Self {
        Self::new(Sensitivity::Public)
    }
}

impl FieldRule {
    pub fn new(sensitivity: Sensitivity) -> Self {
        Self {
            sensitivity,
            allowed_roles: None,
            status_condition: None,
            owner_override: true,
            also: Vec::new(),
        }
    }

    pub fn public() -> Self {
        Self::new(Sensitivity::Public)
    }

    pub fn owner_only() -> Self {
        Self::new(Sensitivity::OwnerOnly)
    }

    pub fn moderator_only() -> Self {
        Self::new(Sensitivity::ModeratorOnly)
    }

    pub fn admin_only() -> Self {
        Self::new(Sensitivity::AdminOnly)
    }

    /// Replace the role set of a role-gated class.
    pub fn roles<I, S>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_roles = Some(roles.into_iter().map(Into::into).collect());
        self
    }

    /// Require the record to be in `status`.
    pub fn when_status(mut self, status: impl Into<String>) -> Self {
        self.status_condition = Some(StatusCondition::one(status));
        self
    }

    pub fn when_status_in<I, S>(mut self, statuses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.status_condition = Some(StatusCondition::any_of(statuses));
        self
    }

    /// Deny the owner unless another route grants access.
    pub fn without_owner_override(mut self) -> Self {
        self.owner_override = false;
        self
    }

    pub fn or_owner(mut self) -> Self {
        self.also.push(AccessRoute::Owner);
        self
    }

    pub fn or_roles<I, S>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.also.push(AccessRoute::Roles {
            roles: roles.into_iter().map(Into::into).collect(),
        });
        self
    }

    pub fn or_relation(mut self, relation: impl Into<String>) -> Self {
        self.also.push(AccessRoute::Relation {
            relation: relation.into(),
        });
        self
    }

    /// Check the status condition, if any.
    pub fn status_satisfied<S: PolicySubject + ?Sized>(&self, subject: &S) -> bool {
        match &self.status_condition {
            Some(cond) => cond.is_satisfied_by(subject.status()),
            None => true,
        }
    }

    /// Collect every route granting `viewer` this field on `subject`.
    ///
    /// `class_roles` is the role set used for a role-gated class when the
    /// rule declares none. The status condition is not consulted here.
    pub fn grants<S: PolicySubject + ?Sized>(
        &self,
        viewer: Option<&Viewer>,
        subject: &S,
        class_roles: &BTreeSet<String>,
    ) -> Grant {
        if self.sensitivity == Sensitivity::Public {
            return Grant::PUBLIC;
        }

        let Some(viewer) = viewer else {
            return Grant::NONE;
        };

        let is_owner = is_owner(viewer, subject);
        let mut grant = Grant::NONE;

        match self.sensitivity {
            Sensitivity::Public => {}
            Sensitivity::OwnerOnly => {
                if is_owner {
                    grant |= Grant::OWNER;
                }
            }
            Sensitivity::ModeratorOnly | Sensitivity::AdminOnly => {
                let roles = self.allowed_roles.as_ref().unwrap_or(class_roles);
                if viewer.has_any_role(roles) {
                    grant |= Grant::ROLE;
                }
                if self.owner_override && is_owner {
                    grant |= Grant::OWNER;
                }
            }
        }

        for route in &self.also {
            match route {
                AccessRoute::Owner => {
                    if is_owner {
                        grant |= Grant::OWNER;
                    }
                }
                AccessRoute::Roles { roles } => {
                    if viewer.has_any_role(roles) {
                        grant |= Grant::ROLE;
                    }
                }
                AccessRoute::Relation { relation } => {
                    if subject.related_id(relation) == Some(viewer.id.as_str()) {
                        grant |= Grant::RELATION;
                    }
                }
            }
        }

        grant
    }

    /// Reject rules that can never be satisfied or are malformed.
    pub fn validate(&self, field: &str, class_roles: &BTreeSet<String>) -> Result<(), PolicyError> {
        if self.sensitivity.is_role_gated() {
            let roles = self.allowed_roles.as_ref().unwrap_or(class_roles);
            if roles.is_empty() {
                return Err(PolicyError::invalid_rule(
                    field,
                    format!("{} requires at least one role", self.sensitivity),
                ));
            }
        } else if self.allowed_roles.is_some() {
            return Err(PolicyError::invalid_rule(
                field,
                format!("allowed_roles has no effect on {} fields", self.sensitivity),
            ));
        }

        if let Some(cond) = &self.status_condition {
            if cond.any_of.is_empty() || cond.any_of.iter().any(|s| s.trim().is_empty()) {
                return Err(PolicyError::invalid_rule(field, "empty status condition"));
            }
        }

        for route in &self.also {
            match route {
                AccessRoute::Owner => {}
                AccessRoute::Roles { roles } => {
                    if roles.is_empty() || roles.iter().any(|r| r.trim().is_empty()) {
                        return Err(PolicyError::invalid_rule(field, "empty role route"));
                    }
                }
                AccessRoute::Relation { relation } => {
                    if relation.trim().is_empty() {
                        return Err(PolicyError::invalid_rule(field, "empty relation route"));
                    }
                }
            }
        }

        Ok(())
    }
}

/// Owner id match, or an explicit ownership relation on the record id.
pub(crate) fn is_owner<S: PolicySubject + ?Sized>(viewer: &Viewer, subject: &S) -> bool {
    if subject.owner_id() == Some(viewer.id.as_str()) {
        return true;
    }
    subject
        .resource_id()
        .is_some_and(|id| viewer.owns_resource(id))
}
