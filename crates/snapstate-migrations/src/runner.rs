use serde_json::Value;
use snapstate_common::SchemaVersion;
use tracing::{debug, info, warn};

use crate::error::MigrationFailure;
use crate::registry::MigrationRegistry;
use crate::stamp::{read_version, stamp};

/// Result of a successful run.
#[derive(Debug, Clone, PartialEq)]
pub struct MigrationOutcome {
    pub state: Value,
    /// Version stored in the snapshot before the run. `None` for snapshots
    /// written before versioning.
    pub from: Option<SchemaVersion>,
    /// Version stamped after the run.
    pub to: Option<SchemaVersion>,
    pub applied: Vec<SchemaVersion>,
}

impl MigrationOutcome {
    pub fn is_noop(&self) -> bool {
        self.applied.is_empty()
    }
}

/// Bring `snapshot` up to the latest version known to `registry`.
///
/// Pending steps are folded over the snapshot in ascending order. The first
/// failing step aborts the run and the partially migrated tree is dropped;
/// `meta.version` is only written once every step has succeeded.
pub fn run(
    snapshot: Value,
    registry: &MigrationRegistry,
) -> Result<MigrationOutcome, MigrationFailure> {
    let from = read_version(&snapshot).map_err(MigrationFailure::before_fold)?;
    let pending = registry.pending(from);

    let Some(last) = pending.last() else {
        if let (Some(stored), Some(latest)) = (from, registry.latest())
            && stored > latest
        {
            warn!("snapshot version {stored} is ahead of migration {latest}, leaving it as is");
        }
        return Ok(MigrationOutcome {
            state: snapshot,
            from,
            to: from,
            applied: Vec::new(),
        });
    };

    info!(
        "migrating snapshot from {} through {} step(s)",
        from.map_or_else(|| "pre-versioning".to_string(), |v| v.to_string()),
        pending.len()
    );

    let migrated = pending.iter().try_fold(snapshot, |state, step| {
        debug!(version = %step.version, step = step.name, "applying migration");
        step.apply(state).map_err(|error| MigrationFailure::at(step, error))
    })?;

    let state = stamp(migrated, last.version).map_err(|error| MigrationFailure::at(last, error))?;
    info!("snapshot migrated to {}", last.version);

    Ok(MigrationOutcome {
        state,
        from,
        to: Some(last.version),
        applied: pending.iter().map(|step| step.version).collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{MigrationError, ShapeError};
    use crate::registry::MigrationStep;
    use serde_json::json;

    fn push_marker(state: Value, marker: &str) -> Value {
        let mut state = state;
        let trail = state
            .as_object_mut()
            .and_then(|root| {
                root.entry("trail")
                    .or_insert_with(|| json!([]))
                    .as_array_mut()
            });
        if let Some(trail) = trail {
            trail.push(json!(marker));
        }
        state
    }

    fn first(state: Value) -> Result<Value, ShapeError> {
        Ok(push_marker(state, "first"))
    }

    fn second(state: Value) -> Result<Value, ShapeError> {
        Ok(push_marker(state, "second"))
    }

    fn third(state: Value) -> Result<Value, ShapeError> {
        Ok(push_marker(state, "third"))
    }

    fn broken(state: Value) -> Result<Value, ShapeError> {
        Err(ShapeError::new("layout", "an object", &state["layout"]))
    }

    fn registry() -> MigrationRegistry {
        MigrationRegistry::new(vec![
            MigrationStep::new(100, "first", first),
            MigrationStep::new(200, "second", second),
            MigrationStep::new(300, "third", third),
        ])
        .unwrap()
    }

    #[test]
    fn unversioned_snapshot_runs_every_step_in_order() {
        let outcome = run(json!({}), &registry()).unwrap();
        assert_eq!(outcome.state["trail"], json!(["first", "second", "third"]));
        assert_eq!(outcome.state["meta"]["version"], json!("300"));
        assert_eq!(outcome.from, None);
        assert_eq!(outcome.to, Some(SchemaVersion::new(300)));
        assert_eq!(outcome.applied.len(), 3);
    }

    #[test]
    fn only_steps_newer_than_stored_version_run() {
        let snapshot = json!({"meta": {"version": "100"}, "trail": ["first"]});
        let outcome = run(snapshot, &registry()).unwrap();
        assert_eq!(outcome.state["trail"], json!(["first", "second", "third"]));
        assert_eq!(
            outcome.applied,
            vec![SchemaVersion::new(200), SchemaVersion::new(300)]
        );
    }

    #[test]
    fn current_snapshot_is_returned_untouched() {
        let snapshot = json!({"meta": {"version": "300"}, "trail": ["x"]});
        let outcome = run(snapshot.clone(), &registry()).unwrap();
        assert!(outcome.is_noop());
        assert_eq!(outcome.state, snapshot);
        assert_eq!(outcome.to, Some(SchemaVersion::new(300)));
    }

    #[test]
    fn newer_than_known_version_is_left_alone() {
        let snapshot = json!({"meta": {"version": "999"}});
        let outcome = run(snapshot.clone(), &registry()).unwrap();
        assert!(outcome.is_noop());
        assert_eq!(outcome.state, snapshot);
    }

    #[test]
    fn failing_step_aborts_and_names_its_version() {
        let registry = MigrationRegistry::new(vec![
            MigrationStep::new(100, "first", first),
            MigrationStep::new(200, "broken", broken),
            MigrationStep::new(300, "third", third),
        ])
        .unwrap();

        let failure = run(json!({"meta": {"version": "50"}}), &registry).unwrap_err();
        assert_eq!(failure.version, Some(SchemaVersion::new(200)));
        assert_eq!(failure.step, Some("broken"));
        assert!(matches!(failure.error, MigrationError::Shape(_)));
    }

    #[test]
    fn unreadable_version_fails_before_any_step() {
        let failure = run(json!({"meta": {"version": "soon"}}), &registry()).unwrap_err();
        assert_eq!(failure.version, None);
        assert!(matches!(failure.error, MigrationError::InvalidVersion(_)));

        let failure = run(json!(["not", "a", "snapshot"]), &registry()).unwrap_err();
        assert!(matches!(failure.error, MigrationError::Shape(_)));
    }

    #[test]
    fn one_jump_equals_one_release_at_a_time() {
        let registry = registry();
        let jump = run(json!({}), &registry).unwrap().state;

        let mut stepwise = json!({});
        for step in registry.steps() {
            stepwise = run(stepwise, &registry.through(step.version)).unwrap().state;
        }
        assert_eq!(jump, stepwise);
    }
}
