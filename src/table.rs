//! The process-wide rule table.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use crate::config::{PolicyConfig, RoleDefaults, UnknownFieldPolicy};
use crate::error::PolicyError;
use crate::rule::FieldRule;

/// Validated, read-only field rules.
///
/// Built once at startup. Lookup order for a field on a record of kind `k`:
/// the rule under `resources.k`, then the global rule, then the
/// unknown-field policy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PolicyTable {
    config: PolicyConfig,
}

impl PolicyTable {
    /// Start an empty table in code.
    pub fn builder() -> PolicyTableBuilder {
        PolicyTableBuilder::default()
    }

    /// Validate a parsed configuration.
    pub fn from_config(config: PolicyConfig) -> Result<Self, PolicyError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Parse and validate a YAML document.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, PolicyError> {
        Ok(Self {
            config: PolicyConfig::from_yaml_str(yaml)?,
        })
    }

    /// Load and validate a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, PolicyError> {
        Ok(Self {
            config: PolicyConfig::from_file(path)?,
        })
    }

    /// Load from `$FIELD_POLICY_CONFIG`, falling back to the default path.
    pub fn from_env() -> Result<Self, PolicyError> {
        Ok(Self {
            config: PolicyConfig::from_env()?,
        })
    }

    /// Find the rule governing `field` on a record of `kind`.
    pub fn rule_for(&self, kind: Option<&str>, field: &str) -> Option<&FieldRule> {
        if let Some(rule) = kind
            .and_then(|k| self.config.resources.get(k))
            .and_then(|fields| fields.get(field))
        {
            return Some(rule);
        }
        self.config.fields.get(field)
    }

    /// Role set a rule is evaluated against when it declares none.
    pub fn class_roles(&self, rule: &FieldRule) -> &BTreeSet<String> {
        self.config.roles.for_class(rule.sensitivity)
    }

    /// Treatment of fields without a rule.
    pub fn unknown_field(&self) -> UnknownFieldPolicy {
        self.config.unknown_field
    }

    /// Class default role sets.
    pub fn roles(&self) -> &RoleDefaults {
        &self.config.roles
    }

    /// Global field rules.
    pub fn fields(&self) -> &BTreeMap<String, FieldRule> {
        &self.config.fields
    }

    /// Kind-specific field rules.
    pub fn resources(&self) -> &BTreeMap<String, BTreeMap<String, FieldRule>> {
        &self.config.resources
    }

    /// Total number of rules, global and kind-specific.
    pub fn len(&self) -> usize {
        self.config.fields.len() + self.config.resources.values().map(BTreeMap::len).sum::<usize>()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn config(&self) -> &PolicyConfig {
        &self.config
    }
}

/// Builds a [`PolicyTable`] in code.
#[derive(Debug, Clone, Default)]
pub struct PolicyTableBuilder {
    config: PolicyConfig,
}

impl PolicyTableBuilder {
    pub fn unknown_field(mut self, policy: UnknownFieldPolicy) -> Self {
        self.config.unknown_field = policy;
        self
    }

    pub fn roles(mut self, roles: RoleDefaults) -> Self {
        self.config.roles = roles;
        self
    }

    /// Add a rule for `field` on every resource kind.
    pub fn field(mut self, field: impl Into<String>, rule: FieldRule) -> Self {
        self.config.fields.insert(field.into(), rule);
        self
    }

    /// Add a rule for `field` on records of `kind` only.
    pub fn resource_field(
        mut self,
        kind: impl Into<String>,
        field: impl Into<String>,
        rule: FieldRule,
    ) -> Self {
        self.config
            .resources
            .entry(kind.into())
            .or_default()
            .insert(field.into(), rule);
        self
    }

    /// Validate and freeze the table.
    pub fn build(self) -> Result<PolicyTable, PolicyError> {
        PolicyTable::from_config(self.config)
    }
}
