//! Component nodes of a surface tree
//!
//! A [`ComponentNode`] carries its identifier, its ordered children and a
//! typed [`Component`]. Standard kinds get strongly typed property structs;
//! kinds registered in a custom catalog keep a raw property bag.

pub mod props;

use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

use crate::action::ActionContract;
use crate::catalog::{Catalog, ComponentProps};

use self::props::*;

macro_rules! standard_components {
    ($($kind:ident => $props:ident),* $(,)?) => {
        /// A component kind together with its properties.
        #[derive(Debug, Clone, PartialEq)]
        pub enum Component {
            $($kind($props),)*
            /// A kind permitted by a custom catalog but not built in
            Extension {
                kind: String,
                properties: Map<String, Value>,
            },
            /// A kind outside the catalog; only ever used for capability reports
            Unknown {
                kind: String,
                properties: Map<String, Value>,
            },
        }

        impl Component {
            /// Kind discriminator as it appears on the wire.
            pub fn kind(&self) -> &str {
                match self {
                    $(Component::$kind(_) => <$props as ComponentProps>::KIND,)*
                    Component::Extension { kind, .. } | Component::Unknown { kind, .. } => kind,
                }
            }

            fn typed(
                kind: &str,
                properties: Map<String, Value>,
            ) -> Option<Result<Self, serde_json::Error>> {
                match kind {
                    $(
                        k if k == <$props as ComponentProps>::KIND => Some(
                            serde_json::from_value(Value::Object(properties)).map(Component::$kind),
                        ),
                    )*
                    _ => None,
                }
            }

            /// Kind-specific properties in wire form.
            pub fn properties(&self) -> Map<String, Value> {
                let value = match self {
                    $(Component::$kind(props) => serde_json::to_value(props),)*
                    Component::Extension { properties, .. }
                    | Component::Unknown { properties, .. } => return properties.clone(),
                };
                match value {
                    Ok(Value::Object(map)) => map,
                    _ => Map::new(),
                }
            }
        }
    };
}

standard_components! {
    Text => TextProps,
    Image => ImageProps,
    Icon => IconProps,
    Video => VideoProps,
    AudioPlayer => AudioPlayerProps,
    Row => RowProps,
    Column => ColumnProps,
    List => ListProps,
    Card => CardProps,
    Tabs => TabsProps,
    Divider => DividerProps,
    Modal => ModalProps,
    Button => ButtonProps,
    CheckBox => CheckBoxProps,
    TextField => TextFieldProps,
    DateTimeInput => DateTimeInputProps,
    ChoicePicker => ChoicePickerProps,
    Slider => SliderProps,
}

impl Component {
    /// Build a component from its kind and raw properties.
    ///
    /// Kinds the catalog does not know become [`Component::Unknown`]. Fails
    /// only when a property of a standard kind has the wrong shape.
    pub fn from_parts(
        kind: &str,
        properties: Map<String, Value>,
        catalog: &Catalog,
    ) -> Result<Self, serde_json::Error> {
        if !catalog.is_known_kind(kind) {
            return Ok(Component::Unknown {
                kind: kind.to_string(),
                properties,
            });
        }
        match Self::typed(kind, properties.clone()) {
            Some(result) => result,
            None => Ok(Component::Extension {
                kind: kind.to_string(),
                properties,
            }),
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Component::Unknown { .. })
    }

    /// The action contract of an interactive component.
    pub fn action(&self) -> Option<&ActionContract> {
        match self {
            Component::Button(props) => props.action.as_ref(),
            _ => None,
        }
    }

    /// Identifiers referenced through single-child properties.
    pub fn child_refs(&self) -> Vec<&str> {
        match self {
            Component::Card(CardProps { child })
            | Component::Button(ButtonProps { child, .. }) => child.as_deref().into_iter().collect(),
            Component::Modal(ModalProps { trigger, content }) => trigger
                .as_deref()
                .into_iter()
                .chain(content.as_deref())
                .collect(),
            Component::Tabs(TabsProps { tabs }) => tabs
                .iter()
                .flatten()
                .map(|tab| tab.child.as_str())
                .collect(),
            _ => Vec::new(),
        }
    }
}

/// One UI element of a surface.
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentNode {
    pub id: String,
    pub component: Component,
    pub children: Vec<String>,
}

impl ComponentNode {
    pub fn new(id: impl Into<String>, component: Component) -> Self {
        Self {
            id: id.into(),
            component,
            children: Vec::new(),
        }
    }

    pub fn with_children<I, S>(mut self, children: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.children = children.into_iter().map(Into::into).collect();
        self
    }

    pub fn kind(&self) -> &str {
        self.component.kind()
    }

    /// Every identifier this node refers to, `children` first, without repeats.
    pub fn child_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.children.iter().map(String::as_str).collect();
        for reference in self.component.child_refs() {
            if !ids.contains(&reference) {
                ids.push(reference);
            }
        }
        ids
    }

    /// Flat wire form: `{"id", "component", "children"?, ...properties}`.
    pub fn to_json(&self) -> Value {
        let mut map = Map::new();
        map.insert("id".into(), Value::String(self.id.clone()));
        map.insert("component".into(), Value::String(self.kind().to_string()));
        if !self.children.is_empty() {
            map.insert(
                "children".into(),
                Value::Array(self.children.iter().cloned().map(Value::String).collect()),
            );
        }
        map.extend(self.component.properties());
        Value::Object(map)
    }
}

impl Serialize for ComponentNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}
