//! Traversal of the workspaces and tabs held in a snapshot.
//!
//! A snapshot either keeps one window state per entry of `windows`
//! (`windows.<id>.state`) or, in single-window snapshots written before
//! windows existed, keeps the workspace fields at the root. Every workspace
//! may hold `tabs.data`, an array of tab objects.

use serde_json::{Map, Value};

use crate::error::ShapeError;

pub type Node = Map<String, Value>;

/// Call `f` once per workspace. Returns the number of workspaces visited.
///
/// Windows that are `null` or carry no `state` are skipped.
pub fn for_each_workspace<F>(state: &mut Value, mut f: F) -> Result<usize, ShapeError>
where
    F: FnMut(&mut Node, &str) -> Result<(), ShapeError>,
{
    let root = match state {
        Value::Object(root) => root,
        other => return Err(ShapeError::new("$", "an object", other)),
    };

    let windowed = match root.get("windows") {
        None | Some(Value::Null) => false,
        Some(Value::Object(_)) => true,
        Some(other) => return Err(ShapeError::new("windows", "an object", other)),
    };
    if !windowed {
        f(root, "$")?;
        return Ok(1);
    }

    let Some(Value::Object(windows)) = root.get_mut("windows") else {
        return Ok(0);
    };

    let mut visited = 0;
    for (id, window) in windows.iter_mut() {
        let window_path = format!("windows.{id}");
        let Some(window) = as_optional_object(window, &window_path)? else {
            continue;
        };
        let state_path = join_path(&window_path, "state");
        let Some(workspace) = optional_object(window, "state", &window_path)? else {
            continue;
        };
        f(workspace, &state_path)?;
        visited += 1;
    }
    Ok(visited)
}

/// Call `f` once per tab of every workspace. Returns the number of tabs visited.
///
/// A workspace with no `tabs`, no `tabs.data` or an empty array contributes
/// no visits.
pub fn for_each_tab<F>(state: &mut Value, mut f: F) -> Result<usize, ShapeError>
where
    F: FnMut(&mut Node, &str) -> Result<(), ShapeError>,
{
    let mut visited = 0;
    for_each_workspace(state, |workspace, path| {
        visited += visit_tabs(workspace, path, &mut f)?;
        Ok(())
    })?;
    Ok(visited)
}

fn visit_tabs<F>(workspace: &mut Node, path: &str, f: &mut F) -> Result<usize, ShapeError>
where
    F: FnMut(&mut Node, &str) -> Result<(), ShapeError>,
{
    let Some(tabs) = optional_object(workspace, "tabs", path)? else {
        return Ok(0);
    };
    let tabs_path = join_path(path, "tabs");
    let Some(data) = optional_array(tabs, "data", &tabs_path)? else {
        return Ok(0);
    };
    let data_path = join_path(&tabs_path, "data");

    for (idx, tab) in data.iter_mut().enumerate() {
        let tab_path = format!("{data_path}[{idx}]");
        match tab {
            Value::Object(tab) => f(tab, &tab_path)?,
            other => return Err(ShapeError::new(tab_path, "an object", other)),
        }
    }
    Ok(data.len())
}

/// Append `key` to a dotted snapshot path. `$` denotes the root.
pub fn join_path(path: &str, key: &str) -> String {
    if path == "$" {
        key.to_string()
    } else {
        format!("{path}.{key}")
    }
}

fn as_optional_object<'a>(
    value: &'a mut Value,
    path: &str,
) -> Result<Option<&'a mut Node>, ShapeError> {
    match value {
        Value::Null => Ok(None),
        Value::Object(node) => Ok(Some(node)),
        other => Err(ShapeError::new(path, "an object", other)),
    }
}

/// `node[key]` as an object. Absent and `null` read as `None`.
pub fn optional_object<'a>(
    node: &'a mut Node,
    key: &str,
    path: &str,
) -> Result<Option<&'a mut Node>, ShapeError> {
    match node.get_mut(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Object(child)) => Ok(Some(child)),
        Some(other) => Err(ShapeError::new(join_path(path, key), "an object", other)),
    }
}

/// `node[key]` as an array. Absent and `null` read as `None`.
pub fn optional_array<'a>(
    node: &'a mut Node,
    key: &str,
    path: &str,
) -> Result<Option<&'a mut Vec<Value>>, ShapeError> {
    match node.get_mut(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Array(items)) => Ok(Some(items)),
        Some(other) => Err(ShapeError::new(join_path(path, key), "an array", other)),
    }
}

/// `node[key]` as an object, inserting an empty one when absent or `null`.
pub fn object_entry<'a>(
    node: &'a mut Node,
    key: &str,
    path: &str,
) -> Result<&'a mut Node, ShapeError> {
    let slot = node.entry(key).or_insert_with(|| Value::Object(Map::new()));
    if slot.is_null() {
        *slot = Value::Object(Map::new());
    }
    match slot {
        Value::Object(child) => Ok(child),
        other => Err(ShapeError::new(join_path(path, key), "an object", other)),
    }
}
