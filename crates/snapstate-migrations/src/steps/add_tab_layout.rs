use serde_json::{Value, json};

use crate::error::ShapeError;
use crate::walker::{for_each_tab, object_entry};

/// Tabs gained a `layout` record holding the sidebar state.
pub fn migrate(mut state: Value) -> Result<Value, ShapeError> {
    for_each_tab(&mut state, |tab, path| {
        let layout = object_entry(tab, "layout", path)?;
        for (key, value) in [
            ("leftSidebarIsOpen", json!(true)),
            ("leftSidebarWidth", json!(350)),
            ("rightSidebarIsOpen", json!(false)),
            ("rightSidebarWidth", json!(250)),
        ] {
            layout.entry(key).or_insert(value);
        }
        Ok(())
    })?;
    Ok(state)
}
