use serde_json::{Value, json};

use crate::error::ShapeError;
use crate::walker::{for_each_workspace, join_path, optional_array};

/// Search history entries used to be bare query strings.
pub fn migrate(mut state: Value) -> Result<Value, ShapeError> {
    for_each_workspace(&mut state, |workspace, path| {
        let Some(entries) = optional_array(workspace, "searchHistory", path)? else {
            return Ok(());
        };
        for (idx, entry) in entries.iter_mut().enumerate() {
            let wrapped = match &mut *entry {
                Value::String(program) => json!({ "program": std::mem::take(program) }),
                Value::Object(_) => continue,
                other => {
                    let entry_path = format!("{}[{idx}]", join_path(path, "searchHistory"));
                    return Err(ShapeError::new(entry_path, "a string or an object", other));
                }
            };
            *entry = wrapped;
        }
        Ok(())
    })?;
    Ok(state)
}
