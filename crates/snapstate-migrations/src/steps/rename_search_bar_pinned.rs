use serde_json::Value;

use crate::error::ShapeError;
use crate::walker::{for_each_tab, optional_object};

/// `searchBar.pinned` became `searchBar.pins`.
pub fn migrate(mut state: Value) -> Result<Value, ShapeError> {
    for_each_tab(&mut state, |tab, path| {
        let Some(search_bar) = optional_object(tab, "searchBar", path)? else {
            return Ok(());
        };
        if search_bar.contains_key("pins") {
            return Ok(());
        }
        if let Some(pinned) = search_bar.remove("pinned") {
            search_bar.insert("pins".to_string(), pinned);
        }
        Ok(())
    })?;
    Ok(state)
}

#[cfg(test)]
mod tests {
    use super::migrate;
    use serde_json::json;

    #[test]
    fn moves_pinned_to_pins() {
        let migrated = migrate(json!({
            "tabs": {"data": [{"searchBar": {"current": "", "pinned": ["_path=dns"]}}]}
        }))
        .unwrap();
        assert_eq!(
            migrated["tabs"]["data"][0]["searchBar"],
            json!({"current": "", "pins": ["_path=dns"]})
        );
    }

    #[test]
    fn existing_pins_win() {
        let state = json!({"tabs": {"data": [{"searchBar": {"pins": ["a"], "pinned": ["b"]}}]}});
        assert_eq!(migrate(state.clone()).unwrap(), state);
    }

    #[test]
    fn tabs_without_search_bar_are_skipped() {
        let state = json!({"tabs": {"data": [{"id": "t"}]}});
        assert_eq!(migrate(state.clone()).unwrap(), state);
    }
}
