//! Data-binding resolution
//!
//! A property value is either a literal or a `{"path": "/a/b"}` reference
//! into the surface data model. Resolution never fails: a missing path
//! renders as an empty string or zero.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::model::DataModel;

/// A property value that is either a literal or a reference into the data model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BoundValue {
    /// `{"path": "/a/b"}`
    Path(PathRef),
    /// Older producers wrap literals: `{"literalString": "Hi"}`
    Wrapped(LiteralWrapper),
    /// Any other JSON value is taken literally
    Literal(Value),
}

/// A reference into the data model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PathRef {
    pub path: String,
}

/// Typed literal wrapper accepted for backward compatibility.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LiteralWrapper {
    #[serde(rename = "literalString")]
    String(String),
    #[serde(rename = "literalNumber")]
    Number(serde_json::Number),
    #[serde(rename = "literalBoolean")]
    Boolean(bool),
    #[serde(rename = "literalArray")]
    Array(Vec<Value>),
}

impl BoundValue {
    pub fn literal(value: impl Into<Value>) -> Self {
        BoundValue::Literal(value.into())
    }

    pub fn path(path: impl Into<String>) -> Self {
        BoundValue::Path(PathRef { path: path.into() })
    }

    /// The bound path, if this is a reference.
    pub fn as_path(&self) -> Option<&str> {
        match self {
            BoundValue::Path(reference) => Some(&reference.path),
            _ => None,
        }
    }

    /// The literal value with any legacy wrapper removed; `None` for paths.
    pub fn literal_value(&self) -> Option<Value> {
        match self {
            BoundValue::Path(_) => None,
            BoundValue::Wrapped(wrapper) => Some(wrapper.to_value()),
            BoundValue::Literal(value) => Some(value.clone()),
        }
    }

    /// Literal string content, used for enum checks; `None` for paths and non-strings.
    pub fn literal_str(&self) -> Option<&str> {
        match self {
            BoundValue::Literal(Value::String(s)) => Some(s),
            BoundValue::Wrapped(LiteralWrapper::String(s)) => Some(s),
            _ => None,
        }
    }
}

impl LiteralWrapper {
    pub fn to_value(&self) -> Value {
        match self {
            LiteralWrapper::String(s) => Value::String(s.clone()),
            LiteralWrapper::Number(n) => Value::Number(n.clone()),
            LiteralWrapper::Boolean(b) => Value::Bool(*b),
            LiteralWrapper::Array(items) => Value::Array(items.clone()),
        }
    }
}

impl From<&str> for BoundValue {
    fn from(s: &str) -> Self {
        BoundValue::Literal(Value::String(s.to_string()))
    }
}

impl From<String> for BoundValue {
    fn from(s: String) -> Self {
        BoundValue::Literal(Value::String(s))
    }
}

/// Resolve a bound value to the JSON value it currently stands for.
///
/// Missing paths resolve to `Value::Null`.
pub fn resolve_value(binding: &BoundValue, model: &DataModel) -> Value {
    match binding {
        BoundValue::Path(reference) => model.get(&reference.path).cloned().unwrap_or(Value::Null),
        BoundValue::Wrapped(wrapper) => wrapper.to_value(),
        BoundValue::Literal(value) => value.clone(),
    }
}

/// Resolve a bound value to display text.
///
/// # Example
/// ```
/// use serde_json::json;
/// use surface_dispatch_core::binding::{resolve, BoundValue};
/// use surface_dispatch_core::DataModel;
///
/// let model = DataModel::from_value(json!({"amount": 42}));
/// assert_eq!(resolve(&BoundValue::path("/amount"), &model), "42");
/// assert_eq!(resolve(&BoundValue::path("/missing"), &model), "");
/// assert_eq!(resolve(&BoundValue::from("Hi"), &model), "Hi");
/// ```
pub fn resolve(binding: &BoundValue, model: &DataModel) -> String {
    match binding {
        BoundValue::Path(reference) => model
            .get(&reference.path)
            .map(stringify)
            .unwrap_or_default(),
        BoundValue::Wrapped(wrapper) => stringify(&wrapper.to_value()),
        BoundValue::Literal(value) => stringify(value),
    }
}

/// Resolve a bound value to a number, defaulting to zero.
pub fn resolve_number(binding: &BoundValue, model: &DataModel) -> f64 {
    numeric(&resolve_value(binding, model))
}

/// Resolve a bound value to a boolean, defaulting to `false`.
pub fn resolve_bool(binding: &BoundValue, model: &DataModel) -> bool {
    match resolve_value(binding, model) {
        Value::Bool(b) => b,
        Value::String(s) => s.trim().eq_ignore_ascii_case("true"),
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        _ => false,
    }
}

/// Display form of a JSON value: strings unquoted, null empty.
pub fn stringify(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => number_text(n),
        other => other.to_string(),
    }
}

/// Numeric coercion shared by the resolvers: numeric strings are parsed,
/// booleans count as 1/0, everything else is zero.
pub fn numeric(value: &Value) -> f64 {
    let n = match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => s.trim().parse::<f64>().unwrap_or(0.0),
        Value::Bool(true) => 1.0,
        _ => 0.0,
    };
    if n.is_finite() {
        n
    } else {
        0.0
    }
}

fn number_text(n: &serde_json::Number) -> String {
    // Integral floats print without a trailing ".0".
    match n.as_f64() {
        Some(f) if n.is_f64() && f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", f as i64),
        _ => n.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn model() -> DataModel {
        DataModel::from_value(json!({
            "amount": 42,
            "price": 9.5,
            "ratio": 3.0,
            "user": {"name": "Ada", "active": true},
            "tags": ["a", "b"],
            "numeric_text": " 12.5 "
        }))
    }

    #[test]
    fn test_deserialize_shapes() {
        let path: BoundValue = serde_json::from_value(json!({"path": "/a"})).unwrap();
        assert_eq!(path, BoundValue::path("/a"));

        let wrapped: BoundValue =
            serde_json::from_value(json!({"literalString": "Hi"})).unwrap();
        assert_eq!(wrapped, BoundValue::Wrapped(LiteralWrapper::String("Hi".into())));

        let literal: BoundValue = serde_json::from_value(json!("Hi")).unwrap();
        assert_eq!(literal, BoundValue::from("Hi"));

        // An object with extra keys is a literal, not a binding.
        let object: BoundValue =
            serde_json::from_value(json!({"path": "/a", "x": 1})).unwrap();
        assert!(matches!(object, BoundValue::Literal(Value::Object(_))));
    }

    #[test]
    fn test_resolve_paths() {
        let model = model();
        assert_eq!(resolve(&BoundValue::path("/amount"), &model), "42");
        assert_eq!(resolve(&BoundValue::path("/price"), &model), "9.5");
        assert_eq!(resolve(&BoundValue::path("/ratio"), &model), "3");
        assert_eq!(resolve(&BoundValue::path("/user/name"), &model), "Ada");
        assert_eq!(resolve(&BoundValue::path("/user/active"), &model), "true");
        assert_eq!(resolve(&BoundValue::path("/tags/1"), &model), "b");
        assert_eq!(resolve(&BoundValue::path("/tags"), &model), r#"["a","b"]"#);
    }

    #[test]
    fn test_missing_path_is_blank_and_zero() {
        let model = model();
        for path in ["/nope", "/user/nope", "/tags/7", "/amount/deeper", "/user/name/x"] {
            let binding = BoundValue::path(path);
            assert_eq!(resolve(&binding, &model), "", "path {path}");
            assert_eq!(resolve_number(&binding, &model), 0.0, "path {path}");
            assert!(!resolve_bool(&binding, &model));
        }
    }

    #[test]
    fn test_literals() {
        let model = model();
        assert_eq!(resolve(&BoundValue::literal(7), &model), "7");
        assert_eq!(resolve(&BoundValue::literal(Value::Null), &model), "");
        assert_eq!(
            resolve(&BoundValue::Wrapped(LiteralWrapper::Number(2.into())), &model),
            "2"
        );
        assert_eq!(
            resolve(&BoundValue::Wrapped(LiteralWrapper::Boolean(false)), &model),
            "false"
        );
    }

    #[test]
    fn test_resolve_number() {
        let model = model();
        assert_eq!(resolve_number(&BoundValue::path("/amount"), &model), 42.0);
        assert_eq!(resolve_number(&BoundValue::path("/numeric_text"), &model), 12.5);
        assert_eq!(resolve_number(&BoundValue::path("/user/name"), &model), 0.0);
        assert_eq!(resolve_number(&BoundValue::path("/user/active"), &model), 1.0);
        assert_eq!(resolve_number(&BoundValue::from("abc"), &model), 0.0);
    }

    #[test]
    fn test_resolve_bool() {
        let model = model();
        assert!(resolve_bool(&BoundValue::path("/user/active"), &model));
        assert!(resolve_bool(&BoundValue::from("TRUE"), &model));
        assert!(!resolve_bool(&BoundValue::literal(0), &model));
    }
}
