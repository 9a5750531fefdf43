use serde_json::{Map, Value};
use snapstate_common::SchemaVersion;

use crate::error::{MigrationError, ShapeError};

/// Read `meta.version`. `None` means the snapshot predates versioning.
pub fn read_version(state: &Value) -> Result<Option<SchemaVersion>, MigrationError> {
    let root = match state {
        Value::Object(root) => root,
        other => return Err(ShapeError::new("$", "an object", other).into()),
    };
    match root.get("meta") {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Object(meta)) => match meta.get("version") {
            None | Some(Value::Null) => Ok(None),
            Some(version) => Ok(Some(SchemaVersion::from_json(version)?)),
        },
        Some(other) => Err(ShapeError::new("meta", "an object", other).into()),
    }
}

/// Write `meta.version`, creating `meta` when it is missing.
///
/// Only call this once every pending step has succeeded.
pub fn stamp(mut state: Value, version: SchemaVersion) -> Result<Value, ShapeError> {
    let root = match &mut state {
        Value::Object(root) => root,
        other => return Err(ShapeError::new("$", "an object", other)),
    };
    let meta = root
        .entry("meta")
        .or_insert_with(|| Value::Object(Map::new()));
    if meta.is_null() {
        *meta = Value::Object(Map::new());
    }
    match meta {
        Value::Object(meta) => {
            meta.insert("version".to_string(), version.to_json());
        }
        other => return Err(ShapeError::new("meta", "an object", other)),
    }
    Ok(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn missing_meta_or_version_is_pre_versioning() {
        assert_eq!(read_version(&json!({})).unwrap(), None);
        assert_eq!(read_version(&json!({"meta": null})).unwrap(), None);
        assert_eq!(read_version(&json!({"meta": {"theme": "dark"}})).unwrap(), None);
    }

    #[test]
    fn reads_string_and_numeric_versions() {
        let v = SchemaVersion::new(202006011205);
        assert_eq!(read_version(&json!({"meta": {"version": "202006011205"}})).unwrap(), Some(v));
        assert_eq!(read_version(&json!({"meta": {"version": 202006011205u64}})).unwrap(), Some(v));
    }

    #[test]
    fn rejects_unreadable_versions() {
        assert!(matches!(
            read_version(&json!({"meta": {"version": "next"}})),
            Err(MigrationError::InvalidVersion(_))
        ));
        assert!(matches!(
            read_version(&json!({"meta": "v3"})),
            Err(MigrationError::Shape(_))
        ));
        assert!(matches!(read_version(&json!("state")), Err(MigrationError::Shape(_))));
    }

    #[test]
    fn stamp_creates_meta_and_keeps_siblings() {
        let v = SchemaVersion::new(202007221420);
        let stamped = stamp(json!({"windows": {}}), v).unwrap();
        assert_eq!(stamped, json!({"windows": {}, "meta": {"version": "202007221420"}}));

        let stamped = stamp(json!({"meta": {"version": "1", "theme": "dark"}}), v).unwrap();
        assert_eq!(stamped["meta"], json!({"version": "202007221420", "theme": "dark"}));
        assert_eq!(read_version(&stamped).unwrap(), Some(v));
    }

    #[test]
    fn stamp_rejects_mistyped_meta() {
        let err = stamp(json!({"meta": [1]}), SchemaVersion::new(1)).unwrap_err();
        assert_eq!(err.path, "meta");
    }
}
