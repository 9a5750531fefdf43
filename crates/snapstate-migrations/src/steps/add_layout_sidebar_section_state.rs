use serde_json::{Value, json};

use crate::error::ShapeError;
use crate::walker::{for_each_tab, object_entry};

/// The left sidebar was split into resizable, collapsible history and spaces
/// sections.
pub fn migrate(mut state: Value) -> Result<Value, ShapeError> {
    for_each_tab(&mut state, |tab, path| {
        let layout = object_entry(tab, "layout", path)?;
        for (key, value) in [
            ("historyHeight", json!(1)),
            ("spacesHeight", json!(1)),
            ("historyIsOpen", json!(true)),
            ("spacesIsOpen", json!(true)),
        ] {
            layout.entry(key).or_insert(value);
        }
        Ok(())
    })?;
    Ok(state)
}
