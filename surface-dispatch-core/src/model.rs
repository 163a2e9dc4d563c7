//! Path-addressable data model scoped to one surface
//!
//! Paths use JSON-Pointer addressing (`/user/name`, `/items/0`). Updates are
//! applied to a working copy and committed only when they succeed, so a
//! failed operation never leaves a half-written model behind.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::DataModelError;

/// Operation carried by an `updateDataModel` message.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataOp {
    /// Set the value at a path, appending when the index equals an array's length
    Add,
    /// Set the value at a path, creating missing intermediate objects
    #[default]
    Replace,
    /// Remove the value at a path
    Remove,
}

impl DataOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataOp::Add => "add",
            DataOp::Replace => "replace",
            DataOp::Remove => "remove",
        }
    }
}

/// Tree-shaped key/value store of one surface.
#[derive(Debug, Clone, PartialEq)]
pub struct DataModel {
    root: Value,
}

impl Default for DataModel {
    fn default() -> Self {
        Self {
            root: Value::Object(Map::new()),
        }
    }
}

impl DataModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a model from an existing document.
    pub fn from_value(root: Value) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Value {
        &self.root
    }

    pub fn into_value(self) -> Value {
        self.root
    }

    pub fn is_empty(&self) -> bool {
        match &self.root {
            Value::Object(map) => map.is_empty(),
            Value::Null => true,
            _ => false,
        }
    }

    /// Reset to an empty object.
    pub fn clear(&mut self) {
        self.root = Value::Object(Map::new());
    }

    /// Look up the value at `path`.
    ///
    /// Lenient: a missing leading slash and empty segments are tolerated, and
    /// any absent or malformed segment yields `None`.
    pub fn get(&self, path: &str) -> Option<&Value> {
        let mut current = &self.root;
        for raw in path.split('/').filter(|segment| !segment.is_empty()) {
            let token = unescape_token(raw).ok()?;
            current = match current {
                Value::Object(map) => map.get(&token)?,
                Value::Array(items) => items.get(token.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }
        Some(current)
    }

    /// Apply one operation atomically.
    ///
    /// `value` is ignored for [`DataOp::Remove`]; for the other operations a
    /// missing value is treated as `null`.
    pub fn apply(
        &mut self,
        op: DataOp,
        path: Option<&str>,
        value: Option<Value>,
    ) -> Result<(), DataModelError> {
        let path = path.unwrap_or("");
        let mut working = self.root.clone();
        match op {
            DataOp::Add => set_path(&mut working, path, value.unwrap_or(Value::Null), true)?,
            DataOp::Replace => {
                set_path(&mut working, path, value.unwrap_or(Value::Null), false)?
            }
            DataOp::Remove => remove_path(&mut working, path)?,
        }
        self.root = working;
        Ok(())
    }

    /// Replace the value at `path`, creating intermediate objects.
    pub fn set(&mut self, path: &str, value: Value) -> Result<(), DataModelError> {
        self.apply(DataOp::Replace, Some(path), Some(value))
    }

    /// Compact serialized size of the model in bytes.
    pub fn serialized_len(&self) -> usize {
        serialized_len(&self.root)
    }
}

/// Compact serialized size of a JSON value in bytes.
pub(crate) fn serialized_len(value: &Value) -> usize {
    serde_json::to_vec(value).map(|bytes| bytes.len()).unwrap_or(usize::MAX)
}

fn set_path(
    root: &mut Value,
    path: &str,
    value: Value,
    allow_append: bool,
) -> Result<(), DataModelError> {
    let tokens = parse_pointer(path)?;

    let Some((last, parents)) = tokens.split_last() else {
        *root = value;
        return Ok(());
    };

    let mut current = root;
    for token in parents {
        current = descend_or_create(current, token, path)?;
    }
    if current.is_null() {
        *current = Value::Object(Map::new());
    }

    match current {
        Value::Object(map) => {
            map.insert(last.clone(), value);
            Ok(())
        }
        Value::Array(items) => {
            let max = if allow_append {
                items.len()
            } else {
                items.len().saturating_sub(1)
            };
            let index = parse_index(last, path)?;
            if index > max || (!allow_append && items.is_empty()) {
                return Err(DataModelError::IndexOutOfBounds {
                    token: last.clone(),
                    path: path.to_string(),
                });
            }
            if index == items.len() {
                items.push(value);
            } else {
                items[index] = value;
            }
            Ok(())
        }
        _ => Err(DataModelError::NotAContainer(path.to_string())),
    }
}

fn remove_path(root: &mut Value, path: &str) -> Result<(), DataModelError> {
    let tokens = parse_pointer(path)?;

    let Some((last, parents)) = tokens.split_last() else {
        *root = Value::Object(Map::new());
        return Ok(());
    };

    let mut current = root;
    for token in parents {
        match descend_existing(current, token) {
            Some(next) => current = next,
            // Removing something that is already absent leaves the model as-is.
            None => return Ok(()),
        }
    }

    match current {
        Value::Object(map) => {
            map.remove(last);
        }
        Value::Array(items) => {
            let index = parse_index(last, path)?;
            if index < items.len() {
                items.remove(index);
            }
        }
        _ => {}
    }
    Ok(())
}

fn parse_pointer(path: &str) -> Result<Vec<String>, DataModelError> {
    if path.is_empty() || path == "/" {
        return Ok(vec![]);
    }

    if !path.starts_with('/') {
        return Err(DataModelError::InvalidPointer(path.to_string()));
    }

    path.split('/').skip(1).map(unescape_token).collect()
}

fn unescape_token(token: &str) -> Result<String, DataModelError> {
    let mut out = String::with_capacity(token.len());
    let mut chars = token.chars();

    while let Some(ch) = chars.next() {
        if ch == '~' {
            match chars.next() {
                Some('0') => out.push('~'),
                Some('1') => out.push('/'),
                _ => return Err(DataModelError::InvalidPointer(token.to_string())),
            }
        } else {
            out.push(ch);
        }
    }

    Ok(out)
}

fn descend_or_create<'a>(
    value: &'a mut Value,
    token: &str,
    path: &str,
) -> Result<&'a mut Value, DataModelError> {
    if value.is_null() {
        *value = Value::Object(Map::new());
    }
    match value {
        Value::Object(map) => Ok(map
            .entry(token.to_string())
            .or_insert_with(|| Value::Object(Map::new()))),
        Value::Array(items) => {
            let index = parse_index(token, path)?;
            items
                .get_mut(index)
                .ok_or_else(|| DataModelError::IndexOutOfBounds {
                    token: token.to_string(),
                    path: path.to_string(),
                })
        }
        _ => Err(DataModelError::NotAContainer(path.to_string())),
    }
}

fn descend_existing<'a>(value: &'a mut Value, token: &str) -> Option<&'a mut Value> {
    match value {
        Value::Object(map) => map.get_mut(token),
        Value::Array(items) => token
            .parse::<usize>()
            .ok()
            .and_then(|index| items.get_mut(index)),
        _ => None,
    }
}

fn parse_index(token: &str, path: &str) -> Result<usize, DataModelError> {
    token
        .parse::<usize>()
        .map_err(|_| DataModelError::InvalidIndex {
            token: token.to_string(),
            path: path.to_string(),
        })
}
