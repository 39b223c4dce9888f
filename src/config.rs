//! Policy configuration parsing
//!
//! Loads the field rule table from YAML. The table is read once at startup
//! and handed to [`PolicyTable`](crate::PolicyTable), which is immutable
//! afterwards.
//!
//! ```yaml
//! unknown_field: deny
//! roles:
//!   moderator_only: [moderator, admin]
//!   admin_only: [admin]
//! fields:
//!   verification_documents: { sensitivity: owner_only }
//!   rejection_reason: { sensitivity: owner_only, status: rejected }
//! resources:
//!   project_proposal:
//!     notes: { sensitivity: moderator_only }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use crate::error::PolicyError;
use crate::rule::FieldRule;
use crate::sensitivity::Sensitivity;

/// Environment variable naming the policy file.
pub const CONFIG_PATH_ENV: &str = "FIELD_POLICY_CONFIG";

/// Default configuration path
pub const DEFAULT_CONFIG_PATH: &str = "config/field_policy.yaml";

/// What to do with a field that has no rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnknownFieldPolicy {
    /// Disclose the field (fail-open).
    Allow,
    /// Withhold the field and log a warning (fail-closed).
    #[default]
    Deny,
    /// Withhold the field; strict checks return an error.
    Reject,
}

impl UnknownFieldPolicy {
    /// Name as written in the YAML file.
    pub fn as_str(&self) -> &'static str {
        match self {
            UnknownFieldPolicy::Allow => "allow",
            UnknownFieldPolicy::Deny => "deny",
            UnknownFieldPolicy::Reject => "reject",
        }
    }
}

/// Role sets used by role-gated classes when a rule declares none.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RoleDefaults {
    #[serde(default = "default_moderator_roles")]
    pub moderator_only: BTreeSet<String>,
    #[serde(default = "default_admin_roles")]
    pub admin_only: BTreeSet<String>,
}

fn default_moderator_roles() -> BTreeSet<String> {
    Sensitivity::ModeratorOnly.default_roles()
}

fn default_admin_roles() -> BTreeSet<String> {
    Sensitivity::AdminOnly.default_roles()
}

impl Default for RoleDefaults {
    fn default() -> Self {
        Self {
            moderator_only: default_moderator_roles(),
            admin_only: default_admin_roles(),
        }
    }
}

impl RoleDefaults {
    /// Role set for a class. Empty for classes that are not role-gated.
    pub fn for_class(&self, sensitivity: Sensitivity) -> &BTreeSet<String> {
        static EMPTY: BTreeSet<String> = BTreeSet::new();
        match sensitivity {
            Sensitivity::ModeratorOnly => &self.moderator_only,
            Sensitivity::AdminOnly => &self.admin_only,
            Sensitivity::Public | Sensitivity::OwnerOnly => &EMPTY,
        }
    }
}

/// Root configuration structure for the field policy
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PolicyConfig {
    #[serde(default)]
    pub unknown_field: UnknownFieldPolicy,
    #[serde(default)]
    pub roles: RoleDefaults,
    /// Field name → rule, for every resource kind.
    #[serde(default)]
    pub fields: BTreeMap<String, FieldRule>,
    /// Resource kind → field name → rule. Takes precedence over `fields`.
    #[serde(default)]
    pub resources: BTreeMap<String, BTreeMap<String, FieldRule>>,
}

impl PolicyConfig {
    /// Parse and validate a YAML document.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, PolicyError> {
        let config: PolicyConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a YAML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, PolicyError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| PolicyError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_yaml_str(&content)?;

        tracing::info!(
            path = %path.display(),
            fields = config.fields.len(),
            resources = config.resources.len(),
            unknown_field = config.unknown_field.as_str(),
            "Field policy loaded"
        );

        Ok(config)
    }

    /// Load from `$FIELD_POLICY_CONFIG`, falling back to the default path.
    pub fn from_env() -> Result<Self, PolicyError> {
        Self::from_file(config_path(std::env::var(CONFIG_PATH_ENV).ok()))
    }

    /// Check every rule and the role defaults.
    pub fn validate(&self) -> Result<(), PolicyError> {
        for (class, roles) in [
            (Sensitivity::ModeratorOnly, &self.roles.moderator_only),
            (Sensitivity::AdminOnly, &self.roles.admin_only),
        ] {
            if roles.iter().any(|r| r.trim().is_empty()) {
                return Err(PolicyError::invalid_rule(
                    format!("roles.{class}"),
                    "empty role name",
                ));
            }
        }

        for (field, rule) in &self.fields {
            validate_entry(field, field, rule, &self.roles)?;
        }

        for (kind, fields) in &self.resources {
            if kind.trim().is_empty() {
                return Err(PolicyError::invalid_rule(kind, "empty resource kind"));
            }
            for (field, rule) in fields {
                validate_entry(&format!("{kind}.{field}"), field, rule, &self.roles)?;
            }
        }

        Ok(())
    }
}

/// Policy file path from the environment value, or the default when unset or blank.
fn config_path(var: Option<String>) -> PathBuf {
    match var {
        Some(path) if !path.trim().is_empty() => PathBuf::from(path),
        _ => PathBuf::from(DEFAULT_CONFIG_PATH),
    }
}

fn validate_entry(
    label: &str,
    field: &str,
    rule: &FieldRule,
    roles: &RoleDefaults,
) -> Result<(), PolicyError> {
    if field.trim().is_empty() {
        return Err(PolicyError::invalid_rule(label, "empty field name"));
    }
    rule.validate(label, roles.for_class(rule.sensitivity))
}
