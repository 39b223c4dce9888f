use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PolicyError {
    #[error("unknown field: {0}")]
    UnknownField(String),

    #[error("invalid rule for field '{field}': {reason}")]
    InvalidRule { field: String, reason: String },

    #[error("failed to read policy config {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid policy yaml: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl PolicyError {
    pub(crate) fn invalid_rule(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidRule {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// True when the error comes from configuration rather than evaluation.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidRule { .. } | Self::Io { .. } | Self::Yaml(_)
        )
    }
}
