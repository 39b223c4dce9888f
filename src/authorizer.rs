//! Enforcement layer consulted by serializers, once per conditional field.

use serde::Serialize;
use std::fmt;
use std::sync::Arc;

use crate::config::UnknownFieldPolicy;
use crate::error::PolicyError;
use crate::grant::Grant;
use crate::resource::PolicySubject;
use crate::table::PolicyTable;
use crate::viewer::Viewer;

/// Why a field was withheld.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DenyReason {
    /// No viewer, and the field is not public.
    Anonymous,
    /// The viewer matched no route.
    NotPermitted,
    /// The record is not in a status that discloses the field.
    StatusMismatch,
    /// No rule exists for the field.
    UnknownField,
}

impl fmt::Display for DenyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DenyReason::Anonymous => "anonymous viewer",
            DenyReason::NotPermitted => "not permitted",
            DenyReason::StatusMismatch => "status mismatch",
            DenyReason::UnknownField => "unknown field",
        };
        f.write_str(s)
    }
}

/// Outcome of a disclosure check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Decision {
    pub allowed: bool,
    /// Routes that granted access. Empty on denial.
    pub grant: Grant,
    pub reason: Option<DenyReason>,
}

impl Decision {
    /// Disclose, recording the granting routes.
    pub fn allow(grant: Grant) -> Self {
        Self {
            allowed: true,
            grant,
            reason: None,
        }
    }

    /// Withhold for `reason`.
    pub fn deny(reason: DenyReason) -> Self {
        Self {
            allowed: false,
            grant: Grant::NONE,
            reason: Some(reason),
        }
    }
}

/// Field visibility authorizer.
///
/// Cheap to clone; every clone shares the same immutable table. All checks
/// are pure: no I/O, no shared mutable state.
#[derive(Debug, Clone)]
pub struct FieldAuthorizer {
    table: Arc<PolicyTable>,
}

impl FieldAuthorizer {
    /// Wrap a table in a fresh `Arc`.
    pub fn new(table: PolicyTable) -> Self {
        Self {
            table: Arc::new(table),
        }
    }

    /// Share an already loaded table.
    pub fn from_shared(table: Arc<PolicyTable>) -> Self {
        Self { table }
    }

    /// The rule table backing this authorizer.
    pub fn table(&self) -> &PolicyTable {
        &self.table
    }

    /// Whether `viewer` may see `field` on `resource`.
    pub fn can_view<S: PolicySubject + ?Sized>(
        &self,
        viewer: Option<&Viewer>,
        resource: &S,
        field: &str,
    ) -> bool {
        self.decide(viewer, resource, field).allowed
    }

    /// Decide with the routes that granted access, or the denial reason.
    pub fn decide<S: PolicySubject + ?Sized>(
        &self,
        viewer: Option<&Viewer>,
        resource: &S,
        field: &str,
    ) -> Decision {
        let Some(rule) = self.table.rule_for(resource.kind(), field) else {
            return self.unknown(resource, field);
        };

        if !rule.status_satisfied(resource) {
            tracing::debug!(field, status = ?resource.status(), "Field withheld: status");
            return Decision::deny(DenyReason::StatusMismatch);
        }

        let grant = rule.grants(viewer, resource, self.table.class_roles(rule));
        if grant.is_granted() {
            tracing::debug!(
                field,
                viewer = viewer.map(|v| v.id.as_str()),
                grant = grant.description(),
                "Field disclosed"
            );
            return Decision::allow(grant);
        }

        let reason = if viewer.is_none() {
            DenyReason::Anonymous
        } else {
            DenyReason::NotPermitted
        };
        tracing::debug!(
            field,
            viewer = viewer.map(|v| v.id.as_str()),
            sensitivity = %rule.sensitivity,
            %reason,
            "Field withheld"
        );
        Decision::deny(reason)
    }

    /// Strict variant of [`decide`](Self::decide).
    ///
    /// Under [`UnknownFieldPolicy::Reject`] an unknown field is an error
    /// rather than a denial.
    pub fn check<S: PolicySubject + ?Sized>(
        &self,
        viewer: Option<&Viewer>,
        resource: &S,
        field: &str,
    ) -> Result<Decision, PolicyError> {
        let decision = self.decide(viewer, resource, field);
        if decision.reason == Some(DenyReason::UnknownField)
            && self.table.unknown_field() == UnknownFieldPolicy::Reject
        {
            return Err(PolicyError::UnknownField(field.to_string()));
        }
        Ok(decision)
    }

    /// Whether a rule exists for `field` on `resource`.
    pub fn is_known<S: PolicySubject + ?Sized>(&self, resource: &S, field: &str) -> bool {
        self.table.rule_for(resource.kind(), field).is_some()
    }

    /// Filter `fields` down to the visible ones, preserving order.
    pub fn visible_fields<'f, S, I>(
        &self,
        viewer: Option<&Viewer>,
        resource: &S,
        fields: I,
    ) -> Vec<&'f str>
    where
        S: PolicySubject + ?Sized,
        I: IntoIterator<Item = &'f str>,
    {
        fields
            .into_iter()
            .filter(|field| self.can_view(viewer, resource, field))
            .collect()
    }

    fn unknown<S: PolicySubject + ?Sized>(&self, resource: &S, field: &str) -> Decision {
        match self.table.unknown_field() {
            UnknownFieldPolicy::Allow => Decision::allow(Grant::DEFAULT),
            UnknownFieldPolicy::Deny | UnknownFieldPolicy::Reject => {
                tracing::warn!(
                    field,
                    kind = resource.kind(),
                    "No visibility rule for field; withholding"
                );
                Decision::deny(DenyReason::UnknownField)
            }
        }
    }
}

impl From<PolicyTable> for FieldAuthorizer {
    fn from(table: PolicyTable) -> Self {
        Self::new(table)
    }
}
