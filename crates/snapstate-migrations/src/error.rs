use std::fmt;

use serde_json::Value;
use snapstate_common::{SchemaVersion, VersionParseError};
use thiserror::Error;

use crate::registry::MigrationStep;

/// A node in the snapshot does not have the shape a transform needs.
///
/// `path` is a dotted path from the snapshot root, e.g.
/// `windows.main.state.tabs.data[2].layout`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("expected {expected} at `{path}`, found {found}")]
pub struct ShapeError {
    pub path: String,
    pub expected: &'static str,
    pub found: &'static str,
}

impl ShapeError {
    pub fn new(path: impl Into<String>, expected: &'static str, found: &Value) -> Self {
        Self {
            path: path.into(),
            expected,
            found: json_kind(found),
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MigrationError {
    #[error(transparent)]
    Shape(#[from] ShapeError),

    #[error("schema version {version} is registered more than once")]
    VersionConflict { version: SchemaVersion },

    #[error("schema version {next} is registered after {previous}")]
    OutOfOrder {
        previous: SchemaVersion,
        next: SchemaVersion,
    },

    #[error("stored meta.version is unreadable: {0}")]
    InvalidVersion(#[from] VersionParseError),
}

/// A fold that stopped before reaching the latest version.
///
/// `version` and `step` name the transform that failed. Both are `None` when
/// the snapshot was rejected before any step ran (unreadable version, root
/// that is not an object).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationFailure {
    pub version: Option<SchemaVersion>,
    pub step: Option<&'static str>,
    pub error: MigrationError,
}

impl MigrationFailure {
    pub(crate) fn at(step: &MigrationStep, error: impl Into<MigrationError>) -> Self {
        Self {
            version: Some(step.version),
            step: Some(step.name),
            error: error.into(),
        }
    }

    pub(crate) fn before_fold(error: impl Into<MigrationError>) -> Self {
        Self {
            version: None,
            step: None,
            error: error.into(),
        }
    }
}

impl fmt::Display for MigrationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.version, self.step) {
            (Some(version), Some(step)) => {
                write!(f, "migration {version} ({step}) failed: {}", self.error)
            }
            (Some(version), None) => write!(f, "migration {version} failed: {}", self.error),
            _ => write!(f, "snapshot cannot be migrated: {}", self.error),
        }
    }
}

impl std::error::Error for MigrationFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn shape_error_names_path_and_found_kind() {
        let err = ShapeError::new("tabs.data[0].layout", "an object", &json!("wide"));
        assert_eq!(
            err.to_string(),
            "expected an object at `tabs.data[0].layout`, found a string"
        );
    }

    #[test]
    fn failure_display_includes_step_version() {
        let failure = MigrationFailure {
            version: Some(SchemaVersion::new(202006231303)),
            step: Some("addLayoutSidebarSectionState"),
            error: ShapeError::new("layout", "an object", &json!(3)).into(),
        };
        let text = failure.to_string();
        assert!(text.starts_with("migration 202006231303 (addLayoutSidebarSectionState) failed"));
        assert!(text.contains("found a number"));
    }
}
