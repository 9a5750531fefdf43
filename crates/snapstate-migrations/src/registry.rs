use serde_json::{Value, json};
use snapstate_common::SchemaVersion;

use crate::error::{MigrationError, ShapeError};
use crate::steps::BUILTIN_STEPS;

/// A single schema transform. Consumes the snapshot and returns the next one.
pub type Transform = fn(Value) -> Result<Value, ShapeError>;

/// One entry of the migration registry.
///
/// The version names both the transform and the snapshot shape it produces.
#[derive(Debug, Clone, Copy)]
pub struct MigrationStep {
    pub version: SchemaVersion,
    pub name: &'static str,
    pub transform: Transform,
}

impl MigrationStep {
    pub const fn new(version: u64, name: &'static str, transform: Transform) -> Self {
        Self {
            version: SchemaVersion::new(version),
            name,
            transform,
        }
    }

    pub fn apply(&self, state: Value) -> Result<Value, ShapeError> {
        (self.transform)(state)
    }
}

pub(crate) const fn strictly_ascending(steps: &[MigrationStep]) -> bool {
    let mut i = 1;
    while i < steps.len() {
        if steps[i - 1].version.as_u64() >= steps[i].version.as_u64() {
            return false;
        }
        i += 1;
    }
    true
}

const _: () = assert!(
    strictly_ascending(BUILTIN_STEPS),
    "built-in migration steps must be registered in strictly ascending version order"
);

/// Ordered, immutable list of migration steps.
///
/// Built once at startup. Entries are strictly ascending by version, so the
/// steps still pending for a stored version are always a suffix of the list.
#[derive(Debug, Clone)]
pub struct MigrationRegistry {
    steps: Vec<MigrationStep>,
}

impl MigrationRegistry {
    /// Build a registry from an arbitrary step list, rejecting duplicate or
    /// descending versions.
    pub fn new(steps: impl Into<Vec<MigrationStep>>) -> Result<Self, MigrationError> {
        let steps = steps.into();
        for pair in steps.windows(2) {
            let (previous, next) = (pair[0].version, pair[1].version);
            if previous == next {
                return Err(MigrationError::VersionConflict { version: next });
            }
            if previous > next {
                return Err(MigrationError::OutOfOrder { previous, next });
            }
        }
        Ok(Self { steps })
    }

    /// The steps shipped with this release. Ordering is checked at compile time.
    pub fn builtin() -> Self {
        Self {
            steps: BUILTIN_STEPS.to_vec(),
        }
    }

    /// Steps with a version strictly greater than `applied`, in order.
    /// A snapshot without a version gets every step.
    pub fn pending(&self, applied: Option<SchemaVersion>) -> &[MigrationStep] {
        match applied {
            None => &self.steps,
            Some(applied) => {
                let start = self.steps.partition_point(|step| step.version <= applied);
                &self.steps[start..]
            }
        }
    }

    /// A registry holding only the steps up to and including `version`.
    pub fn through(&self, version: SchemaVersion) -> Self {
        let end = self.steps.partition_point(|step| step.version <= version);
        Self {
            steps: self.steps[..end].to_vec(),
        }
    }

    pub fn latest(&self) -> Option<SchemaVersion> {
        self.steps.last().map(|step| step.version)
    }

    pub fn get(&self, version: SchemaVersion) -> Option<&MigrationStep> {
        self.steps
            .binary_search_by_key(&version, |step| step.version)
            .ok()
            .map(|idx| &self.steps[idx])
    }

    pub fn steps(&self) -> &[MigrationStep] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// An empty snapshot already at the latest version.
    pub fn fresh_state(&self) -> Value {
        match self.latest() {
            Some(version) => json!({ "meta": { "version": version.to_json() } }),
            None => json!({}),
        }
    }
}

impl Default for MigrationRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
