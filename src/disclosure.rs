//! Serializer side of the policy: denied keys are omitted, never nulled.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::authorizer::FieldAuthorizer;
use crate::error::PolicyError;
use crate::resource::PolicySubject;
use crate::viewer::Viewer;

/// Remove every key of `record` the viewer may not see.
///
/// Disclosed keys keep their value, including an explicit `null`.
pub fn redact<S: PolicySubject + ?Sized>(
    authorizer: &FieldAuthorizer,
    viewer: Option<&Viewer>,
    resource: &S,
    mut record: Map<String, Value>,
) -> Map<String, Value> {
    record.retain(|field, _| authorizer.can_view(viewer, resource, field));
    record
}

/// Builds one serialized object, field by field.
///
/// ```ignore
/// let json = Disclosure::new(&authorizer, viewer, &proposal)
///     .field("id", proposal.id)?
///     .when_visible("email", || &proposal.email)?
///     .when_loaded("documents", proposal.documents.as_ref())?
///     .finish();
/// ```
pub struct Disclosure<'a, S: PolicySubject + ?Sized> {
    authorizer: &'a FieldAuthorizer,
    viewer: Option<&'a Viewer>,
    resource: &'a S,
    out: Map<String, Value>,
}

impl<'a, S: PolicySubject + ?Sized> Disclosure<'a, S> {
    /// Start an empty payload for `viewer` looking at `resource`.
    pub fn new(
        authorizer: &'a FieldAuthorizer,
        viewer: Option<&'a Viewer>,
        resource: &'a S,
    ) -> Self {
        Self {
            authorizer,
            viewer,
            resource,
            out: Map::new(),
        }
    }

    /// Always include `name`.
    pub fn field<T: Serialize>(mut self, name: &str, value: T) -> Result<Self, PolicyError> {
        self.out.insert(name.to_string(), serde_json::to_value(value)?);
        Ok(self)
    }

    /// Include `name` when the viewer may see it. `value` runs only then.
    pub fn when_visible<T, F>(mut self, name: &str, value: F) -> Result<Self, PolicyError>
    where
        T: Serialize,
        F: FnOnce() -> T,
    {
        if self.authorizer.can_view(self.viewer, self.resource, name) {
            self.out.insert(name.to_string(), serde_json::to_value(value())?);
        }
        Ok(self)
    }

    /// Include `name` when the viewer may see it and the value is loaded.
    pub fn when_loaded<T: Serialize>(
        mut self,
        name: &str,
        value: Option<T>,
    ) -> Result<Self, PolicyError> {
        let Some(value) = value else {
            return Ok(self);
        };
        if self.authorizer.can_view(self.viewer, self.resource, name) {
            self.out.insert(name.to_string(), serde_json::to_value(value)?);
        }
        Ok(self)
    }

    /// Copy the visible keys of an already-serialized map.
    pub fn merge(mut self, record: Map<String, Value>) -> Self {
        let visible = redact(self.authorizer, self.viewer, self.resource, record);
        self.out.extend(visible);
        self
    }

    /// The payload built so far, as a JSON map.
    pub fn into_map(self) -> Map<String, Value> {
        self.out
    }

    /// The payload as a JSON object.
    pub fn finish(self) -> Value {
        Value::Object(self.out)
    }
}
