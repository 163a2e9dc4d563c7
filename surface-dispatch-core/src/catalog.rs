//! Schema/capability registry of permitted component kinds
//!
//! A [`Catalog`] is a static lookup from component kind to its required
//! properties, known properties, and enumerated values. It is immutable once
//! built and shared between validators.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write as _;

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::binding::BoundValue;
use crate::component::props::{
    AudioPlayerProps, ButtonProps, CardProps, CheckBoxProps, ChoicePickerProps, ColumnProps,
    DateTimeInputProps, DividerProps, IconProps, ImageProps, ListProps, ModalProps, RowProps,
    SliderProps, TabsProps, TextFieldProps, TextProps, VideoProps,
};
use crate::error::SchemaWarning;

/// Keys that belong to the component envelope rather than to its kind.
pub const ENVELOPE_KEYS: &[&str] = &["id", "component", "children"];

/// Schema of one property of a component kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PropertySchema {
    /// Wire name
    pub name: &'static str,
    /// Other accepted wire names
    pub aliases: &'static [&'static str],
    /// Whether every instance should carry the property
    pub required: bool,
    /// Enumerated literal values, if constrained
    pub allowed: Option<&'static [&'static str]>,
}

impl PropertySchema {
    /// Whether `key` names this property (directly or through an alias).
    pub fn matches(&self, key: &str) -> bool {
        self.name == key || self.aliases.contains(&key)
    }
}

/// Typed property set of a component kind.
///
/// Use `#[derive(ComponentProps)]` from `surface-dispatch-macros` to derive
/// the schema from the struct's fields.
pub trait ComponentProps: DeserializeOwned {
    /// Kind discriminator as it appears on the wire
    const KIND: &'static str;
    /// Known properties of the kind
    const PROPERTIES: &'static [PropertySchema];

    fn schema() -> KindSchema {
        KindSchema {
            kind: Self::KIND,
            properties: Self::PROPERTIES,
        }
    }
}

/// Schema of one component kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KindSchema {
    pub kind: &'static str,
    pub properties: &'static [PropertySchema],
}

impl KindSchema {
    pub fn property(&self, key: &str) -> Option<&PropertySchema> {
        self.properties.iter().find(|p| p.matches(key))
    }
}

/// Registry of permitted component kinds.
///
/// # Example
/// ```
/// use surface_dispatch_core::Catalog;
///
/// let catalog = Catalog::standard();
/// assert!(catalog.is_known_kind("Text"));
/// assert!(!catalog.is_known_kind("GhostWidget"));
/// assert!(catalog.required_properties("Text").contains("text"));
/// assert!(catalog.allowed_values("Text", "variant").unwrap().contains(&"h1"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    id: String,
    kinds: BTreeMap<&'static str, KindSchema>,
}

impl Catalog {
    /// Identifier of the built-in catalog
    pub const STANDARD_ID: &'static str = "standard";

    /// Create an empty catalog.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kinds: BTreeMap::new(),
        }
    }

    /// The built-in catalog of basic component kinds.
    pub fn standard() -> Self {
        Self::new(Self::STANDARD_ID)
            .with::<TextProps>()
            .with::<ImageProps>()
            .with::<IconProps>()
            .with::<VideoProps>()
            .with::<AudioPlayerProps>()
            .with::<RowProps>()
            .with::<ColumnProps>()
            .with::<ListProps>()
            .with::<CardProps>()
            .with::<TabsProps>()
            .with::<DividerProps>()
            .with::<ModalProps>()
            .with::<ButtonProps>()
            .with::<CheckBoxProps>()
            .with::<TextFieldProps>()
            .with::<DateTimeInputProps>()
            .with::<ChoicePickerProps>()
            .with::<SliderProps>()
    }

    /// Add a kind described by a typed property struct.
    pub fn with<P: ComponentProps>(mut self) -> Self {
        self.register(P::schema());
        self
    }

    /// Add or replace a kind.
    pub fn register(&mut self, schema: KindSchema) {
        self.kinds.insert(schema.kind, schema);
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn is_known_kind(&self, name: &str) -> bool {
        self.kinds.contains_key(name)
    }

    pub fn schema(&self, kind: &str) -> Option<&KindSchema> {
        self.kinds.get(kind)
    }

    /// Kind names in sorted order.
    pub fn kinds(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.kinds.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }

    /// Required property names of `kind`; empty for unknown kinds.
    pub fn required_properties(&self, kind: &str) -> BTreeSet<&'static str> {
        self.schema(kind)
            .map(|schema| {
                schema
                    .properties
                    .iter()
                    .filter(|p| p.required)
                    .map(|p| p.name)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Known property names of `kind`, aliases included; empty for unknown kinds.
    pub fn known_properties(&self, kind: &str) -> BTreeSet<&'static str> {
        self.schema(kind)
            .map(|schema| {
                schema
                    .properties
                    .iter()
                    .flat_map(|p| std::iter::once(p.name).chain(p.aliases.iter().copied()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Enumerated values allowed for `property` of `kind`, if constrained.
    pub fn allowed_values(&self, kind: &str, property: &str) -> Option<&'static [&'static str]> {
        self.schema(kind)?.property(property)?.allowed
    }

    /// Advisory check of one component's properties against its kind.
    ///
    /// Unknown kinds produce no warnings; they are rejected earlier as a
    /// capability violation.
    pub fn check(&self, id: &str, kind: &str, properties: &Map<String, Value>) -> Vec<SchemaWarning> {
        let Some(schema) = self.schema(kind) else {
            return Vec::new();
        };
        let mut warnings = Vec::new();

        for property in schema.properties.iter().filter(|p| p.required) {
            if !properties.keys().any(|key| property.matches(key)) {
                warnings.push(SchemaWarning::MissingRequired {
                    id: id.to_string(),
                    kind: kind.to_string(),
                    property: property.name,
                });
            }
        }

        for (key, value) in properties {
            if ENVELOPE_KEYS.contains(&key.as_str()) {
                continue;
            }
            let Some(property) = schema.property(key) else {
                warnings.push(SchemaWarning::UnknownProperty {
                    id: id.to_string(),
                    kind: kind.to_string(),
                    property: key.clone(),
                });
                continue;
            };
            let Some(allowed) = property.allowed else {
                continue;
            };
            if let Some(literal) = literal_string(value) {
                if !allowed.contains(&literal.as_str()) {
                    warnings.push(SchemaWarning::EnumMismatch {
                        id: id.to_string(),
                        kind: kind.to_string(),
                        property: property.name,
                        value: literal,
                        allowed,
                    });
                }
            }
        }

        warnings
    }

    /// Plain-text listing of the permitted kinds, one per line.
    ///
    /// Required properties are marked with `*`; enumerated values follow in
    /// brackets.
    pub fn prompt_listing(&self) -> String {
        let mut out = String::new();
        for schema in self.kinds.values() {
            let properties: Vec<String> = schema
                .properties
                .iter()
                .map(|p| {
                    let mut text = p.name.to_string();
                    if p.required {
                        text.push('*');
                    }
                    if let Some(allowed) = p.allowed {
                        let _ = write!(text, " [{}]", allowed.join("|"));
                    }
                    text
                })
                .collect();
            let _ = writeln!(out, "{}: {}", schema.kind, properties.join(", "));
        }
        out
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::standard()
    }
}

/// Literal string content of a raw property value (bindings excluded).
fn literal_string(value: &Value) -> Option<String> {
    serde_json::from_value::<BoundValue>(value.clone())
        .ok()?
        .literal_str()
        .map(str::to_string)
}
