use serde_json::Value;

use crate::error::ShapeError;
use crate::walker::{for_each_tab, optional_object};

/// Viewer results are re-fetched on start; the cached records only bloat the
/// snapshot.
pub fn migrate(mut state: Value) -> Result<Value, ShapeError> {
    for_each_tab(&mut state, |tab, path| {
        if let Some(viewer) = optional_object(tab, "viewer", path)? {
            viewer.remove("records");
            viewer.remove("tuplesByUid");
        }
        Ok(())
    })?;
    Ok(state)
}
