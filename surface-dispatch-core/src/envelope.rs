//! Message envelope validation
//!
//! Turns one candidate line into a typed [`SurfaceMessage`]. Structural and
//! capability problems reject the message; catalog drift (missing or unknown
//! properties, unexpected enum values) is returned as warnings alongside the
//! accepted message.

use std::collections::HashSet;
use std::sync::Arc;

use serde_json::{Map, Value};
use surface_dispatch_macros::Message;

use crate::catalog::Catalog;
use crate::component::{Component, ComponentNode};
use crate::config::Limits;
use crate::error::{MessageError, SchemaWarning};
use crate::model::{serialized_len, DataOp};

pub const CREATE_SURFACE: &str = "createSurface";
pub const UPDATE_COMPONENTS: &str = "updateComponents";
pub const UPDATE_DATA_MODEL: &str = "updateDataModel";
pub const DELETE_SURFACE: &str = "deleteSurface";
pub const SURFACE_UPDATE: &str = "surfaceUpdate";
pub const DATA_MODEL_UPDATE: &str = "dataModelUpdate";
pub const BEGIN_RENDERING: &str = "beginRendering";

/// Every recognized top-level discriminator
pub const DISCRIMINATORS: &[&str] = &[
    CREATE_SURFACE,
    UPDATE_COMPONENTS,
    UPDATE_DATA_MODEL,
    DELETE_SURFACE,
    SURFACE_UPDATE,
    DATA_MODEL_UPDATE,
    BEGIN_RENDERING,
];

/// Protocol generation a message was written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    Current,
    /// `surfaceUpdate`, `dataModelUpdate`, `beginRendering`
    Legacy,
}

/// A validated surface transition.
#[derive(Message, Debug, Clone, PartialEq)]
#[message(krate = "crate")]
pub enum SurfaceMessage {
    CreateSurface {
        surface_id: String,
        catalog_id: String,
    },
    UpdateComponents {
        surface_id: String,
        components: Vec<ComponentNode>,
    },
    UpdateDataModel {
        surface_id: String,
        path: Option<String>,
        op: DataOp,
        value: Option<Value>,
    },
    DeleteSurface {
        surface_id: String,
    },
    /// Legacy: marks the surface ready and may name its root
    BeginRendering {
        surface_id: String,
        root: Option<String>,
        catalog_id: Option<String>,
    },
}

impl SurfaceMessage {
    pub fn surface_id(&self) -> &str {
        match self {
            SurfaceMessage::CreateSurface { surface_id, .. }
            | SurfaceMessage::UpdateComponents { surface_id, .. }
            | SurfaceMessage::UpdateDataModel { surface_id, .. }
            | SurfaceMessage::DeleteSurface { surface_id }
            | SurfaceMessage::BeginRendering { surface_id, .. } => surface_id,
        }
    }
}

impl crate::message::MessageSummary for SurfaceMessage {
    fn summary(&self) -> String {
        match self {
            SurfaceMessage::CreateSurface {
                surface_id,
                catalog_id,
            } => format!("CreateSurface {surface_id} catalog={catalog_id}"),
            SurfaceMessage::UpdateComponents {
                surface_id,
                components,
            } => format!(
                "UpdateComponents {surface_id} [{}]",
                components
                    .iter()
                    .map(|c| c.id.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
            SurfaceMessage::UpdateDataModel {
                surface_id, path, op, ..
            } => format!(
                "UpdateDataModel {surface_id} {} {}",
                op.as_str(),
                path.as_deref().unwrap_or("/")
            ),
            SurfaceMessage::DeleteSurface { surface_id } => format!("DeleteSurface {surface_id}"),
            SurfaceMessage::BeginRendering { surface_id, root, .. } => format!(
                "BeginRendering {surface_id} root={}",
                root.as_deref().unwrap_or("root")
            ),
        }
    }
}

/// A message tagged with the protocol generation it arrived in.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    pub protocol: Protocol,
    pub message: SurfaceMessage,
}

impl Envelope {
    pub fn current(message: SurfaceMessage) -> Self {
        Self {
            protocol: Protocol::Current,
            message,
        }
    }

    pub fn surface_id(&self) -> &str {
        self.message.surface_id()
    }
}

/// An accepted message plus the advisory issues found in it.
#[derive(Debug, Clone, PartialEq)]
pub struct Validated {
    pub envelope: Envelope,
    pub warnings: Vec<SchemaWarning>,
}

/// Validates candidate lines against a catalog and resource limits.
///
/// # Example
/// ```
/// use surface_dispatch_core::envelope::{SurfaceMessage, Validator};
///
/// let validator = Validator::default();
/// let validated = validator
///     .validate(r#"{"createSurface":{"surfaceId":"main","catalogId":"cat:v1"}}"#)
///     .unwrap();
/// assert_eq!(validated.envelope.surface_id(), "main");
/// assert!(matches!(validated.envelope.message, SurfaceMessage::CreateSurface { .. }));
///
/// let err = validator.validate("not json").unwrap_err();
/// assert_eq!(err.kind(), "MalformedDocument");
/// ```
#[derive(Debug, Clone)]
pub struct Validator {
    catalog: Arc<Catalog>,
    limits: Limits,
}

impl Default for Validator {
    fn default() -> Self {
        Self::new(Arc::new(Catalog::standard()), Limits::default())
    }
}

impl Validator {
    pub fn new(catalog: Arc<Catalog>, limits: Limits) -> Self {
        Self { catalog, limits }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    /// Parse and validate one candidate line.
    pub fn validate(&self, line: &str) -> Result<Validated, MessageError> {
        let document: Value = serde_json::from_str(line)
            .map_err(|err| MessageError::MalformedDocument(err.to_string()))?;
        let Value::Object(mut document) = document else {
            return Err(MessageError::MalformedDocument(format!(
                "expected a JSON object, found {}",
                json_type(&document)
            )));
        };

        let matched: Vec<&'static str> = DISCRIMINATORS
            .iter()
            .copied()
            .filter(|key| document.contains_key(*key))
            .collect();
        let key = match matched.as_slice() {
            [] => {
                return Err(MessageError::UnknownMessageType {
                    keys: document.keys().cloned().collect(),
                })
            }
            [key] => *key,
            _ => {
                return Err(MessageError::AmbiguousMessageType {
                    matched: matched.iter().map(|k| k.to_string()).collect(),
                })
            }
        };

        let Some(Value::Object(body)) = document.remove(key) else {
            return Err(MessageError::structural(key, "message body must be an object"));
        };

        let mut warnings = Vec::new();
        let (protocol, message) = match key {
            CREATE_SURFACE => (Protocol::Current, self.create_surface(&body)?),
            UPDATE_COMPONENTS => (
                Protocol::Current,
                self.update_components(key, body, false, &mut warnings)?,
            ),
            SURFACE_UPDATE => (
                Protocol::Legacy,
                self.update_components(key, body, true, &mut warnings)?,
            ),
            UPDATE_DATA_MODEL => (Protocol::Current, self.update_data_model(body)?),
            DATA_MODEL_UPDATE => (Protocol::Legacy, self.data_model_update(&body)?),
            DELETE_SURFACE => (
                Protocol::Current,
                SurfaceMessage::DeleteSurface {
                    surface_id: required_string(&body, "surfaceId", key)?,
                },
            ),
            _ => (Protocol::Legacy, begin_rendering(&body)?),
        };

        Ok(Validated {
            envelope: Envelope { protocol, message },
            warnings,
        })
    }

    fn create_surface(&self, body: &Map<String, Value>) -> Result<SurfaceMessage, MessageError> {
        Ok(SurfaceMessage::CreateSurface {
            surface_id: required_string(body, "surfaceId", CREATE_SURFACE)?,
            catalog_id: required_string(body, "catalogId", CREATE_SURFACE)?,
        })
    }

    fn update_components(
        &self,
        key: &'static str,
        mut body: Map<String, Value>,
        legacy: bool,
        warnings: &mut Vec<SchemaWarning>,
    ) -> Result<SurfaceMessage, MessageError> {
        let surface_id = required_string(&body, "surfaceId", key)?;
        let Some(Value::Array(entries)) = body.remove("components") else {
            return Err(MessageError::structural(key, "'components' must be an array"));
        };
        if entries.len() > self.limits.max_components_per_message {
            return Err(MessageError::structural(
                key,
                format!(
                    "{} components exceed the limit of {}",
                    entries.len(),
                    self.limits.max_components_per_message
                ),
            ));
        }

        let mut components = Vec::with_capacity(entries.len());
        for entry in entries {
            let Value::Object(entry) = entry else {
                return Err(MessageError::structural(key, "component entries must be objects"));
            };
            let (id, kind, mut properties) = split_entry(key, entry, legacy)?;

            let children = match properties.remove("children") {
                Some(raw) => self.children(key, &id, raw, legacy)?,
                None => Vec::new(),
            };

            if !self.catalog.is_known_kind(&kind) {
                return Err(MessageError::CapabilityViolation { id, kind });
            }
            warnings.extend(self.catalog.check(&id, &kind, &properties));

            let component = Component::from_parts(&kind, properties, &self.catalog)
                .map_err(|err| MessageError::structural(key, format!("component '{id}': {err}")))?;
            components.push(ComponentNode {
                id,
                component,
                children,
            });
        }

        Ok(SurfaceMessage::UpdateComponents {
            surface_id,
            components,
        })
    }

    fn children(
        &self,
        key: &'static str,
        id: &str,
        raw: Value,
        legacy: bool,
    ) -> Result<Vec<String>, MessageError> {
        let items = match raw {
            Value::Array(items) => items,
            Value::Object(mut list) if legacy => match list.remove("explicitList") {
                Some(Value::Array(items)) => items,
                _ => {
                    return Err(MessageError::structural(
                        key,
                        format!("component '{id}': children must list identifiers explicitly"),
                    ))
                }
            },
            _ => {
                return Err(MessageError::structural(
                    key,
                    format!("component '{id}': children must be an array of identifiers"),
                ))
            }
        };

        if items.len() > self.limits.max_children_per_node {
            return Err(MessageError::structural(
                key,
                format!(
                    "component '{id}' has {} children, limit is {}",
                    items.len(),
                    self.limits.max_children_per_node
                ),
            ));
        }

        let mut seen = HashSet::with_capacity(items.len());
        let mut children = Vec::with_capacity(items.len());
        for item in items {
            let Value::String(child) = item else {
                return Err(MessageError::structural(
                    key,
                    format!("component '{id}': children must be strings"),
                ));
            };
            if child.is_empty() {
                return Err(MessageError::structural(
                    key,
                    format!("component '{id}': empty child identifier"),
                ));
            }
            if !seen.insert(child.clone()) {
                return Err(MessageError::structural(
                    key,
                    format!("component '{id}': duplicate child '{child}'"),
                ));
            }
            children.push(child);
        }
        Ok(children)
    }

    fn update_data_model(&self, mut body: Map<String, Value>) -> Result<SurfaceMessage, MessageError> {
        let surface_id = required_string(&body, "surfaceId", UPDATE_DATA_MODEL)?;
        let path = optional_string(&body, "path", UPDATE_DATA_MODEL)?;
        let op = match body.get("op") {
            None | Some(Value::Null) => DataOp::default(),
            Some(raw) => serde_json::from_value(raw.clone()).map_err(|_| {
                MessageError::structural(
                    UPDATE_DATA_MODEL,
                    format!("'op' must be one of add, replace, remove (got {raw})"),
                )
            })?,
        };
        let value = body.remove("value");
        if op != DataOp::Remove && value.is_none() {
            return Err(MessageError::structural(
                UPDATE_DATA_MODEL,
                format!("'{}' requires a value", op.as_str()),
            ));
        }
        if let Some(value) = &value {
            self.check_payload(UPDATE_DATA_MODEL, value)?;
        }
        Ok(SurfaceMessage::UpdateDataModel {
            surface_id,
            path,
            op,
            value,
        })
    }

    fn data_model_update(&self, body: &Map<String, Value>) -> Result<SurfaceMessage, MessageError> {
        let surface_id = required_string(body, "surfaceId", DATA_MODEL_UPDATE)?;
        let path = optional_string(body, "path", DATA_MODEL_UPDATE)?;
        let Some(Value::Array(contents)) = body.get("contents") else {
            return Err(MessageError::structural(DATA_MODEL_UPDATE, "'contents' must be an array"));
        };
        let value = contents_to_value(contents)?;
        self.check_payload(DATA_MODEL_UPDATE, &value)?;
        Ok(SurfaceMessage::UpdateDataModel {
            surface_id,
            path,
            op: DataOp::Replace,
            value: Some(value),
        })
    }

    fn check_payload(&self, key: &'static str, value: &Value) -> Result<(), MessageError> {
        let size = serialized_len(value);
        if size > self.limits.max_data_model_bytes {
            return Err(MessageError::structural(
                key,
                format!(
                    "value is {size} bytes, limit is {}",
                    self.limits.max_data_model_bytes
                ),
            ));
        }
        Ok(())
    }
}

/// Split a component entry into id, kind and its remaining properties.
///
/// The legacy nested form `{"id": .., "component": {"Text": {..}}}` is
/// flattened.
fn split_entry(
    key: &'static str,
    mut entry: Map<String, Value>,
    legacy: bool,
) -> Result<(String, String, Map<String, Value>), MessageError> {
    let id = required_string(&entry, "id", key)?;
    entry.remove("id");

    match entry.remove("component") {
        Some(Value::String(kind)) if !kind.is_empty() => Ok((id, kind, entry)),
        Some(Value::Object(nested)) if legacy && nested.len() == 1 => {
            let Some((kind, inner)) = nested.into_iter().next() else {
                return Err(MessageError::structural(key, format!("component '{id}' has no kind")));
            };
            let Value::Object(mut properties) = inner else {
                return Err(MessageError::structural(
                    key,
                    format!("component '{id}': properties of '{kind}' must be an object"),
                ));
            };
            if let Some(children) = entry.remove("children") {
                properties.entry("children").or_insert(children);
            }
            Ok((id, kind, properties))
        }
        Some(_) => Err(MessageError::structural(
            key,
            format!("component '{id}': 'component' must name a kind"),
        )),
        None => Err(MessageError::structural(
            key,
            format!("component '{id}' is missing 'component'"),
        )),
    }
}

fn begin_rendering(body: &Map<String, Value>) -> Result<SurfaceMessage, MessageError> {
    Ok(SurfaceMessage::BeginRendering {
        surface_id: required_string(body, "surfaceId", BEGIN_RENDERING)?,
        root: optional_string(body, "root", BEGIN_RENDERING)?.filter(|root| !root.is_empty()),
        catalog_id: optional_string(body, "catalogId", BEGIN_RENDERING)?,
    })
}

/// Convert legacy typed `contents` entries into a JSON object.
fn contents_to_value(entries: &[Value]) -> Result<Value, MessageError> {
    let mut map = Map::new();
    for entry in entries {
        let Value::Object(entry) = entry else {
            return Err(MessageError::structural(DATA_MODEL_UPDATE, "contents entries must be objects"));
        };
        let Some(key) = entry.get("key").and_then(Value::as_str) else {
            return Err(MessageError::structural(DATA_MODEL_UPDATE, "contents entry is missing 'key'"));
        };
        let mistyped = |field: &str| {
            MessageError::structural(
                DATA_MODEL_UPDATE,
                format!("contents entry '{key}' has a mistyped '{field}'"),
            )
        };

        let value = if let Some(v) = entry.get("valueString") {
            v.is_string().then(|| v.clone()).ok_or_else(|| mistyped("valueString"))?
        } else if let Some(v) = entry.get("valueNumber") {
            v.is_number().then(|| v.clone()).ok_or_else(|| mistyped("valueNumber"))?
        } else if let Some(v) = entry.get("valueBoolean") {
            v.is_boolean().then(|| v.clone()).ok_or_else(|| mistyped("valueBoolean"))?
        } else if let Some(v) = entry.get("valueMap") {
            match v {
                Value::Array(nested) => contents_to_value(nested)?,
                _ => return Err(mistyped("valueMap")),
            }
        } else {
            return Err(MessageError::structural(
                DATA_MODEL_UPDATE,
                format!("contents entry '{key}' has no typed value"),
            ));
        };
        map.insert(key.to_string(), value);
    }
    Ok(Value::Object(map))
}

fn required_string(
    body: &Map<String, Value>,
    field: &str,
    message: &'static str,
) -> Result<String, MessageError> {
    match body.get(field) {
        Some(Value::String(s)) if !s.is_empty() => Ok(s.clone()),
        Some(Value::String(_)) => Err(MessageError::structural(message, format!("'{field}' is empty"))),
        Some(other) => Err(MessageError::structural(
            message,
            format!("'{field}' must be a string, found {}", json_type(other)),
        )),
        None => Err(MessageError::structural(message, format!("missing '{field}'"))),
    }
}

fn optional_string(
    body: &Map<String, Value>,
    field: &str,
    message: &'static str,
) -> Result<Option<String>, MessageError> {
    match body.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(other) => Err(MessageError::structural(
            message,
            format!("'{field}' must be a string, found {}", json_type(other)),
        )),
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::BoundValue;
    use crate::Message;
    use serde_json::json;

    fn validate(line: Value) -> Result<Validated, MessageError> {
        Validator::default().validate(&line.to_string())
    }

    fn structural_reason(result: Result<Validated, MessageError>) -> String {
        match result {
            Err(MessageError::StructuralViolation { reason, .. }) => reason,
            other => panic!("expected structural violation, got {other:?}"),
        }
    }

    #[test]
    fn test_line_level_failures() {
        let validator = Validator::default();
        assert_eq!(validator.validate("{oops").unwrap_err().kind(), "MalformedDocument");
        assert_eq!(validator.validate("[1, 2]").unwrap_err().kind(), "MalformedDocument");
        assert_eq!(
            validator.validate(r#"{"hello": {}}"#).unwrap_err(),
            MessageError::UnknownMessageType {
                keys: vec!["hello".into()]
            }
        );
        assert_eq!(
            validator
                .validate(r#"{"createSurface": {}, "deleteSurface": {}}"#)
                .unwrap_err(),
            MessageError::AmbiguousMessageType {
                matched: vec!["createSurface".into(), "deleteSurface".into()]
            }
        );
    }

    #[test]
    fn test_create_surface_requires_ids() {
        let reason = structural_reason(validate(json!({"createSurface": {"surfaceId": "main"}})));
        assert!(reason.contains("catalogId"));
        let reason = structural_reason(validate(
            json!({"createSurface": {"surfaceId": "", "catalogId": "c"}}),
        ));
        assert!(reason.contains("surfaceId"));
        assert!(validate(json!({"createSurface": "main"})).is_err());
    }

    #[test]
    fn test_update_components() {
        let validated = validate(json!({"updateComponents": {
            "surfaceId": "main",
            "components": [
                {"id": "root", "component": "Column", "children": ["title"]},
                {"id": "title", "component": "Text", "text": {"path": "/title"}, "variant": "h1"}
            ]
        }}))
        .unwrap();
        assert!(validated.warnings.is_empty(), "{:?}", validated.warnings);
        assert_eq!(validated.envelope.protocol, Protocol::Current);
        assert_eq!(validated.envelope.message.name(), "UpdateComponents");

        let SurfaceMessage::UpdateComponents { components, .. } = validated.envelope.message else {
            panic!("wrong message");
        };
        assert_eq!(components[0].children, vec!["title"]);
        match &components[1].component {
            Component::Text(props) => assert_eq!(props.text, Some(BoundValue::path("/title"))),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_unknown_kind_rejects_message() {
        let err = validate(json!({"updateComponents": {
            "surfaceId": "main",
            "components": [
                {"id": "root", "component": "Text", "text": "ok"},
                {"id": "x", "component": "GhostWidget"}
            ]
        }}))
        .unwrap_err();
        assert_eq!(
            err,
            MessageError::CapabilityViolation {
                id: "x".into(),
                kind: "GhostWidget".into()
            }
        );
    }

    #[test]
    fn test_component_limits() {
        let limits = Limits::default().with_max_components(1).with_max_children(2);
        let validator = Validator::new(Arc::new(Catalog::standard()), limits);

        let too_many = json!({"updateComponents": {"surfaceId": "s", "components": [
            {"id": "a", "component": "Divider"},
            {"id": "b", "component": "Divider"}
        ]}});
        assert!(structural_reason(validator.validate(&too_many.to_string())).contains("limit"));

        let wide = json!({"updateComponents": {"surfaceId": "s", "components": [
            {"id": "a", "component": "Row", "children": ["x", "y", "z"]}
        ]}});
        assert!(structural_reason(validator.validate(&wide.to_string())).contains("3 children"));
    }

    #[test]
    fn test_children_contract() {
        for children in [json!(["a", "a"]), json!(["a", 7]), json!("a"), json!([""])] {
            let result = validate(json!({"updateComponents": {"surfaceId": "s", "components": [
                {"id": "root", "component": "Row", "children": children}
            ]}}));
            structural_reason(result);
        }
    }

    #[test]
    fn test_schema_drift_is_a_warning() {
        let validated = validate(json!({"updateComponents": {"surfaceId": "s", "components": [
            {"id": "b", "component": "Button", "variant": "shiny", "glow": 1}
        ]}}))
        .unwrap();
        // action and child missing, glow unknown, variant mismatched
        assert_eq!(validated.warnings.len(), 4);
        assert!(validated.warnings.iter().all(|w| w.component_id() == "b"));
    }

    #[test]
    fn test_mistyped_property_is_structural() {
        let reason = structural_reason(validate(json!({"updateComponents": {"surfaceId": "s", "components": [
            {"id": "b", "component": "Button", "child": "label", "action": "submit"}
        ]}})));
        assert!(reason.contains("component 'b'"));
    }

    #[test]
    fn test_update_data_model() {
        let validated = validate(json!({"updateDataModel": {
            "surfaceId": "s", "path": "/user", "op": "add", "value": {"name": "Ada"}
        }}))
        .unwrap();
        assert_eq!(
            validated.envelope.message,
            SurfaceMessage::UpdateDataModel {
                surface_id: "s".into(),
                path: Some("/user".into()),
                op: DataOp::Add,
                value: Some(json!({"name": "Ada"})),
            }
        );

        let defaults = validate(json!({"updateDataModel": {"surfaceId": "s", "value": {}}})).unwrap();
        assert!(matches!(
            defaults.envelope.message,
            SurfaceMessage::UpdateDataModel { path: None, op: DataOp::Replace, .. }
        ));

        structural_reason(validate(json!({"updateDataModel": {"surfaceId": "s", "op": "merge", "value": 1}})));
        structural_reason(validate(json!({"updateDataModel": {"surfaceId": "s", "op": "add"}})));
        assert!(validate(json!({"updateDataModel": {"surfaceId": "s", "op": "remove", "path": "/x"}})).is_ok());
    }

    #[test]
    fn test_data_model_size_cap() {
        let limits = Limits::default().with_max_data_model_bytes(16);
        let validator = Validator::new(Arc::new(Catalog::standard()), limits);
        let small = json!({"updateDataModel": {"surfaceId": "s", "value": {"a": 1}}});
        assert!(validator.validate(&small.to_string()).is_ok());

        let big = json!({"updateDataModel": {"surfaceId": "s", "value": {"text": "x".repeat(64)}}});
        let reason = structural_reason(validator.validate(&big.to_string()));
        assert!(reason.contains("limit is 16"));
    }

    #[test]
    fn test_legacy_surface_update() {
        let validated = validate(json!({"surfaceUpdate": {"surfaceId": "s", "components": [
            {"id": "root", "component": {"Column": {"children": {"explicitList": ["t"]}}}},
            {"id": "t", "component": {"Text": {"text": {"literalString": "Hi"}, "usageHint": "h2"}}}
        ]}}))
        .unwrap();
        assert_eq!(validated.envelope.protocol, Protocol::Legacy);
        assert!(validated.warnings.is_empty(), "{:?}", validated.warnings);
        let SurfaceMessage::UpdateComponents { components, .. } = validated.envelope.message else {
            panic!("wrong message");
        };
        assert_eq!(components[0].kind(), "Column");
        assert_eq!(components[0].children, vec!["t"]);
        assert_eq!(components[1].kind(), "Text");
    }

    #[test]
    fn test_nested_form_is_legacy_only() {
        let reason = structural_reason(validate(json!({"updateComponents": {"surfaceId": "s", "components": [
            {"id": "t", "component": {"Text": {"text": "Hi"}}}
        ]}})));
        assert!(reason.contains("must name a kind"));
    }

    #[test]
    fn test_legacy_data_model_update() {
        let validated = validate(json!({"dataModelUpdate": {"surfaceId": "s", "contents": [
            {"key": "name", "valueString": "Ada"},
            {"key": "age", "valueNumber": 36},
            {"key": "admin", "valueBoolean": false},
            {"key": "address", "valueMap": [{"key": "city", "valueString": "London"}]}
        ]}}))
        .unwrap();
        let SurfaceMessage::UpdateDataModel { op, value, .. } = validated.envelope.message else {
            panic!("wrong message");
        };
        assert_eq!(op, DataOp::Replace);
        assert_eq!(
            value,
            Some(json!({"name": "Ada", "age": 36, "admin": false, "address": {"city": "London"}}))
        );

        structural_reason(validate(json!({"dataModelUpdate": {"surfaceId": "s", "contents": [
            {"key": "age", "valueNumber": "old"}
        ]}})));
    }

    #[test]
    fn test_begin_rendering() {
        let validated = validate(json!({"beginRendering": {"surfaceId": "s", "root": "main-col"}})).unwrap();
        assert_eq!(
            validated.envelope.message,
            SurfaceMessage::BeginRendering {
                surface_id: "s".into(),
                root: Some("main-col".into()),
                catalog_id: None,
            }
        );
    }
}
