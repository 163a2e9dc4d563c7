//! Typed property sets of the standard component kinds
//!
//! Every field is optional: missing required properties are reported as
//! schema warnings, not deserialization failures. Child references are plain
//! component identifiers; all other values may be literals or bindings.

use serde::{Deserialize, Serialize};
use surface_dispatch_macros::ComponentProps;

use crate::action::ActionContract;
use crate::binding::BoundValue;

#[derive(ComponentProps, Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[props(krate = "crate")]
#[serde(rename_all = "camelCase")]
pub struct TextProps {
    #[props(required)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<BoundValue>,
    #[props(one_of = "h1,h2,h3,h4,h5,caption,body", alias = "usageHint")]
    #[serde(alias = "usageHint", skip_serializing_if = "Option::is_none")]
    pub variant: Option<BoundValue>,
}

#[derive(ComponentProps, Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[props(krate = "crate")]
#[serde(rename_all = "camelCase")]
pub struct ImageProps {
    #[props(required)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<BoundValue>,
    #[props(one_of = "contain,cover,fill,none,scale-down")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fit: Option<BoundValue>,
    #[props(
        one_of = "icon,avatar,smallFeature,mediumFeature,largeFeature,header",
        alias = "usageHint"
    )]
    #[serde(alias = "usageHint", skip_serializing_if = "Option::is_none")]
    pub variant: Option<BoundValue>,
}

#[derive(ComponentProps, Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[props(krate = "crate")]
#[serde(rename_all = "camelCase")]
pub struct IconProps {
    #[props(required)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<BoundValue>,
}

#[derive(ComponentProps, Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[props(krate = "crate")]
#[serde(rename_all = "camelCase")]
pub struct VideoProps {
    #[props(required)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<BoundValue>,
}

#[derive(ComponentProps, Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[props(krate = "crate")]
#[serde(rename_all = "camelCase")]
pub struct AudioPlayerProps {
    #[props(required)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<BoundValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<BoundValue>,
}

#[derive(ComponentProps, Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[props(krate = "crate")]
#[serde(rename_all = "camelCase")]
pub struct RowProps {
    #[props(
        one_of = "start,center,end,spaceBetween,spaceAround,spaceEvenly,stretch",
        alias = "distribution"
    )]
    #[serde(alias = "distribution", skip_serializing_if = "Option::is_none")]
    pub justify: Option<BoundValue>,
    #[props(one_of = "start,center,end,stretch", alias = "alignment")]
    #[serde(alias = "alignment", skip_serializing_if = "Option::is_none")]
    pub align: Option<BoundValue>,
}

#[derive(ComponentProps, Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[props(krate = "crate")]
#[serde(rename_all = "camelCase")]
pub struct ColumnProps {
    #[props(
        one_of = "start,center,end,spaceBetween,spaceAround,spaceEvenly,stretch",
        alias = "distribution"
    )]
    #[serde(alias = "distribution", skip_serializing_if = "Option::is_none")]
    pub justify: Option<BoundValue>,
    #[props(one_of = "start,center,end,stretch", alias = "alignment")]
    #[serde(alias = "alignment", skip_serializing_if = "Option::is_none")]
    pub align: Option<BoundValue>,
}

#[derive(ComponentProps, Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[props(krate = "crate")]
#[serde(rename_all = "camelCase")]
pub struct ListProps {
    #[props(one_of = "vertical,horizontal")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub direction: Option<BoundValue>,
    #[props(one_of = "start,center,end,stretch", alias = "alignment")]
    #[serde(alias = "alignment", skip_serializing_if = "Option::is_none")]
    pub align: Option<BoundValue>,
}

#[derive(ComponentProps, Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[props(krate = "crate")]
#[serde(rename_all = "camelCase")]
pub struct CardProps {
    #[props(required)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub child: Option<String>,
}

/// One tab of a [`TabsProps`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TabItem {
    pub title: BoundValue,
    pub child: String,
}

#[derive(ComponentProps, Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[props(krate = "crate")]
#[serde(rename_all = "camelCase")]
pub struct TabsProps {
    #[props(required, alias = "tabItems")]
    #[serde(alias = "tabItems", skip_serializing_if = "Option::is_none")]
    pub tabs: Option<Vec<TabItem>>,
}

#[derive(ComponentProps, Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[props(krate = "crate")]
#[serde(rename_all = "camelCase")]
pub struct DividerProps {
    #[props(one_of = "horizontal,vertical")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub axis: Option<BoundValue>,
}

#[derive(ComponentProps, Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[props(krate = "crate")]
#[serde(rename_all = "camelCase")]
pub struct ModalProps {
    #[props(required, alias = "entryPointChild")]
    #[serde(alias = "entryPointChild", skip_serializing_if = "Option::is_none")]
    pub trigger: Option<String>,
    #[props(required, alias = "contentChild")]
    #[serde(alias = "contentChild", skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

#[derive(ComponentProps, Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[props(krate = "crate")]
#[serde(rename_all = "camelCase")]
pub struct ButtonProps {
    #[props(required)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub child: Option<String>,
    #[props(required)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<ActionContract>,
    #[props(one_of = "primary,borderless")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variant: Option<BoundValue>,
}

#[derive(ComponentProps, Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[props(krate = "crate")]
#[serde(rename_all = "camelCase")]
pub struct CheckBoxProps {
    #[props(required)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<BoundValue>,
    #[props(required)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<BoundValue>,
}

#[derive(ComponentProps, Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[props(krate = "crate")]
#[serde(rename_all = "camelCase")]
pub struct TextFieldProps {
    #[props(required)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<BoundValue>,
    #[props(alias = "text")]
    #[serde(alias = "text", skip_serializing_if = "Option::is_none")]
    pub value: Option<BoundValue>,
    #[props(one_of = "shortText,longText,number,obscured", alias = "textFieldType")]
    #[serde(alias = "textFieldType", skip_serializing_if = "Option::is_none")]
    pub variant: Option<BoundValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation_regexp: Option<String>,
}

#[derive(ComponentProps, Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[props(krate = "crate")]
#[serde(rename_all = "camelCase")]
pub struct DateTimeInputProps {
    #[props(required)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<BoundValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enable_date: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enable_time: Option<bool>,
}

/// One selectable entry of a [`ChoicePickerProps`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChoiceOption {
    pub label: BoundValue,
    pub value: String,
}

#[derive(ComponentProps, Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[props(krate = "crate")]
#[serde(rename_all = "camelCase")]
pub struct ChoicePickerProps {
    #[props(required)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<ChoiceOption>>,
    #[props(required, alias = "selections")]
    #[serde(alias = "selections", skip_serializing_if = "Option::is_none")]
    pub value: Option<BoundValue>,
    #[props(one_of = "multipleSelection,mutuallyExclusive")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variant: Option<BoundValue>,
}

#[derive(ComponentProps, Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[props(krate = "crate")]
#[serde(rename_all = "camelCase")]
pub struct SliderProps {
    #[props(required)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<BoundValue>,
    #[props(alias = "minValue")]
    #[serde(alias = "minValue", skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[props(alias = "maxValue")]
    #[serde(alias = "maxValue", skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
}
