//! Action contracts and their resolution into outbound events
//!
//! An interactive component declares an [`ActionContract`]: a name that only
//! the producer understands plus a context template. When the user triggers
//! the component, the contract is resolved against the data model as it is
//! at that moment.

use std::collections::BTreeMap;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Map, Value};

use crate::binding::{self, BoundValue};
use crate::model::DataModel;

/// Declared action of an interactive component.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActionContract {
    pub name: String,
    /// Accepts either `[{"key": .., "value": ..}]` or a `{key: value}` map
    #[serde(
        default,
        deserialize_with = "context_entries",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub context: Vec<ContextEntry>,
}

/// One key of an action context template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextEntry {
    pub key: String,
    pub value: BoundValue,
}

impl ActionContract {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            context: Vec::new(),
        }
    }

    pub fn with_context(mut self, key: impl Into<String>, value: BoundValue) -> Self {
        self.context.push(ContextEntry {
            key: key.into(),
            value,
        });
        self
    }
}

fn context_entries<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<ContextEntry>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        List(Vec<ContextEntry>),
        Map(BTreeMap<String, BoundValue>),
    }

    Ok(match Repr::deserialize(deserializer)? {
        Repr::List(entries) => entries,
        Repr::Map(map) => map
            .into_iter()
            .map(|(key, value)| ContextEntry { key, value })
            .collect(),
    })
}

/// Fully materialized outbound event of one user interaction.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedAction {
    pub name: String,
    pub surface_id: String,
    pub source_component_id: String,
    /// Milliseconds since the Unix epoch
    pub timestamp: u64,
    pub context: Map<String, Value>,
}

impl ResolvedAction {
    /// Numeric reading of a context value, defaulting to zero.
    pub fn number(&self, key: &str) -> f64 {
        self.context.get(key).map(binding::numeric).unwrap_or(0.0)
    }

    /// Outbound document handed to the producer on the next turn.
    pub fn to_message(&self) -> Value {
        json!({
            "userAction": {
                "name": self.name,
                "surfaceId": self.surface_id,
                "sourceComponentId": self.source_component_id,
                "timestamp": self.timestamp,
                "context": self.context,
            }
        })
    }
}

/// Resolve `contract` against the current data model.
///
/// Bindings become their display strings; literals pass through unchanged.
///
/// # Example
/// ```
/// use serde_json::json;
/// use surface_dispatch_core::action::{resolve_action, ActionContract};
/// use surface_dispatch_core::binding::BoundValue;
/// use surface_dispatch_core::DataModel;
///
/// let contract = ActionContract::new("go").with_context("amt", BoundValue::path("/amount"));
/// let model = DataModel::from_value(json!({"amount": 42}));
/// let event = resolve_action(&contract, "submit", "main", &model);
/// assert_eq!(event.context["amt"], json!("42"));
/// assert_eq!(event.number("amt"), 42.0);
/// ```
pub fn resolve_action(
    contract: &ActionContract,
    source_component_id: &str,
    surface_id: &str,
    model: &DataModel,
) -> ResolvedAction {
    let context = contract
        .context
        .iter()
        .map(|entry| {
            let value = match &entry.value {
                BoundValue::Path(_) => Value::String(binding::resolve(&entry.value, model)),
                other => other.literal_value().unwrap_or(Value::Null),
            };
            (entry.key.clone(), value)
        })
        .collect();

    ResolvedAction {
        name: contract.name.clone(),
        surface_id: surface_id.to_string(),
        source_component_id: source_component_id.to_string(),
        timestamp: now_millis(),
        context,
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or(0)
}
