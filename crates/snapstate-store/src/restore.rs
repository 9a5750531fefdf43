//! Startup restore: load, migrate, write back.
//!
//! This is the boundary the application boots through. It never fails: when
//! the stored snapshot cannot be read or migrated, the caller gets a fresh
//! state at the latest version and a warning to show the user.

use serde_json::Value;
use snapstate_common::SchemaVersion;
use snapstate_migrations::{MigrationRegistry, run};
use tracing::{info, warn};

use crate::store::StateStore;

#[derive(Debug, Clone)]
pub struct RestoreOptions {
    /// Migrate in memory only; never write to or rename anything in the store.
    pub dry_run: bool,
    /// Move an unrestorable snapshot aside before falling back to defaults.
    pub quarantine_unrestorable: bool,
}

impl Default for RestoreOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            quarantine_unrestorable: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecoveryReason {
    /// The store could not read or parse the snapshot.
    Unreadable(String),
    /// A migration step (or the stored version itself) was rejected.
    MigrationFailed {
        version: Option<SchemaVersion>,
        message: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RestoreStatus {
    /// Nothing was persisted yet; the state starts at the latest version.
    Fresh { version: Option<SchemaVersion> },
    /// The snapshot was already at the latest known version.
    Current { version: Option<SchemaVersion> },
    Migrated {
        from: Option<SchemaVersion>,
        to: SchemaVersion,
        applied: Vec<SchemaVersion>,
        /// `false` on dry runs and when writing back failed.
        saved: bool,
    },
    /// The previous session was dropped in favour of a fresh state.
    Recovered {
        reason: RecoveryReason,
        quarantined: Option<String>,
    },
}

#[derive(Debug, Clone)]
pub struct Restored {
    pub state: Value,
    pub status: RestoreStatus,
}

impl Restored {
    pub fn is_recovered(&self) -> bool {
        matches!(self.status, RestoreStatus::Recovered { .. })
    }

    /// Message for the user when the previous session could not be restored.
    pub fn warning(&self) -> Option<String> {
        let RestoreStatus::Recovered {
            reason,
            quarantined,
        } = &self.status
        else {
            return None;
        };
        let cause = match reason {
            RecoveryReason::Unreadable(message) => {
                format!("the saved session is unreadable ({message})")
            }
            RecoveryReason::MigrationFailed { message, .. } => {
                format!("the saved session could not be upgraded ({message})")
            }
        };
        let kept = match quarantined {
            Some(location) => format!(" A copy was kept at {location}."),
            None => String::new(),
        };
        Some(format!(
            "Your previous session could not be restored: {cause}. \
             Starting with a fresh session.{kept}"
        ))
    }
}

/// Load the snapshot from `store`, bring it up to date and write it back.
///
/// An empty store is a first boot, not a pre-versioning session: it yields a
/// fresh state and nothing is written.
pub fn restore(
    store: &dyn StateStore,
    registry: &MigrationRegistry,
    options: &RestoreOptions,
) -> Restored {
    let snapshot = match store.load() {
        Ok(snapshot) => snapshot,
        Err(e) => {
            warn!("failed to load snapshot from {}: {e}", store.describe());
            return recover(store, registry, options, RecoveryReason::Unreadable(e.to_string()));
        }
    };

    if snapshot.as_object().is_some_and(|root| root.is_empty()) {
        info!("nothing stored in {}, starting fresh", store.describe());
        return Restored {
            state: registry.fresh_state(),
            status: RestoreStatus::Fresh {
                version: registry.latest(),
            },
        };
    }

    let outcome = match run(snapshot, registry) {
        Ok(outcome) => outcome,
        Err(failure) => {
            warn!("failed to migrate snapshot from {}: {failure}", store.describe());
            let reason = RecoveryReason::MigrationFailed {
                version: failure.version,
                message: failure.to_string(),
            };
            return recover(store, registry, options, reason);
        }
    };

    let to = match outcome.to {
        Some(to) if !outcome.is_noop() => to,
        _ => {
            info!("snapshot in {} is current", store.describe());
            return Restored {
                state: outcome.state,
                status: RestoreStatus::Current {
                    version: outcome.to,
                },
            };
        }
    };

    let saved = if options.dry_run {
        info!("dry run, not writing migrated snapshot");
        false
    } else {
        match store.save(&outcome.state) {
            Ok(()) => true,
            Err(e) => {
                warn!("failed to write migrated snapshot to {}: {e}", store.describe());
                false
            }
        }
    };

    Restored {
        state: outcome.state,
        status: RestoreStatus::Migrated {
            from: outcome.from,
            to,
            applied: outcome.applied,
            saved,
        },
    }
}

fn recover(
    store: &dyn StateStore,
    registry: &MigrationRegistry,
    options: &RestoreOptions,
    reason: RecoveryReason,
) -> Restored {
    let quarantined = if options.quarantine_unrestorable && !options.dry_run {
        match store.quarantine() {
            Ok(location) => location,
            Err(e) => {
                warn!("failed to move unrestorable snapshot aside: {e}");
                None
            }
        }
    } else {
        None
    };

    Restored {
        state: registry.fresh_state(),
        status: RestoreStatus::Recovered {
            reason,
            quarantined,
        },
    }
}
