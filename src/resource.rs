//! Records being serialized, as seen by the policy.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Policy-relevant metadata of a record.
///
/// Implemented by whatever the data layer hands to the serializer. Every
/// accessor may return `None`; missing data always resolves to a denial for
/// non-public fields.
pub trait PolicySubject {
    /// Identifier of the owning viewer.
    fn owner_id(&self) -> Option<&str>;

    /// Current lifecycle status (e.g. "pending", "rejected").
    fn status(&self) -> Option<&str>;

    /// Identifier of the record itself, matched against `Viewer::owns`.
    fn resource_id(&self) -> Option<&str> {
        None
    }

    /// Resource kind used to select kind-specific rules.
    fn kind(&self) -> Option<&str> {
        None
    }

    /// Viewer id bound to a named relation (e.g. "reviewer").
    fn related_id(&self, _relation: &str) -> Option<&str> {
        None
    }
}

impl<T: PolicySubject + ?Sized> PolicySubject for &T {
    fn owner_id(&self) -> Option<&str> {
        (**self).owner_id()
    }

    fn status(&self) -> Option<&str> {
        (**self).status()
    }

    fn resource_id(&self) -> Option<&str> {
        (**self).resource_id()
    }

    fn kind(&self) -> Option<&str> {
        (**self).kind()
    }

    fn related_id(&self, relation: &str) -> Option<&str> {
        (**self).related_id(relation)
    }
}

/// Plain resource metadata, for callers without a richer model type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub owner_id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    /// Relation name → related viewer id.
    #[serde(default)]
    pub relations: BTreeMap<String, String>,
}

impl Resource {
    /// An anonymous record with no owner or status.
    pub fn new() -> Self {
        Self::default()
    }

    /// A record owned by `owner_id`.
    pub fn owned_by(owner_id: impl Into<String>) -> Self {
        Self {
            owner_id: Some(owner_id.into()),
            ..Default::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    /// Set the workflow status.
    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    /// Link a user id under a named relation, such as `reviewer`.
    pub fn with_relation(mut self, relation: impl Into<String>, id: impl Into<String>) -> Self {
        self.relations.insert(relation.into(), id.into());
        self
    }
}

impl PolicySubject for Resource {
    fn owner_id(&self) -> Option<&str> {
        self.owner_id.as_deref()
    }

    fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    fn resource_id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn kind(&self) -> Option<&str> {
        self.kind.as_deref()
    }

    fn related_id(&self, relation: &str) -> Option<&str> {
        self.relations.get(relation).map(String::as_str)
    }
}
