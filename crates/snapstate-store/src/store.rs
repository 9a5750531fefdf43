use serde_json::{Map, Value};
use snapstate_common::{Error, Result};
use tracing::debug;

/// Raw persistence of the session snapshot.
///
/// Stores know nothing about schema versions; they hand back whatever tree was
/// last saved and leave migration to the caller.
pub trait StateStore {
    /// The persisted snapshot, or an empty object when nothing was saved yet.
    /// Fails when the stored bytes cannot be read or parsed.
    fn load(&self) -> Result<Value>;

    fn save(&self, state: &Value) -> Result<()>;

    /// Move the persisted snapshot aside so it survives the application
    /// starting over from defaults. Returns where it was moved, or `None`
    /// when there was nothing to move.
    fn quarantine(&self) -> Result<Option<String>>;

    /// Human-readable location, for logs.
    fn describe(&self) -> String;
}

pub(crate) fn empty_snapshot() -> Value {
    Value::Object(Map::new())
}

pub(crate) fn parse_snapshot(raw: &str, origin: &str) -> Result<Value> {
    if raw.trim().is_empty() {
        debug!("snapshot at {origin} is empty");
        return Ok(empty_snapshot());
    }
    let value: Value = serde_json::from_str(raw)
        .map_err(|e| Error::Store(format!("failed to parse snapshot at {origin}: {e}")))?;
    if !value.is_object() {
        return Err(Error::Store(format!(
            "snapshot at {origin} is not a JSON object"
        )));
    }
    Ok(value)
}

pub(crate) fn quarantine_suffix() -> String {
    format!("corrupt-{}", chrono::Utc::now().format("%Y%m%dT%H%M%S%.3fZ"))
}
