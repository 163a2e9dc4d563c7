//! Tests for #[derive(Message)] and #[derive(ComponentProps)]

#![allow(dead_code)]

use std::sync::Arc;

use serde::Deserialize;
use serde_json::json;
use surface_dispatch::prelude::*;
use surface_dispatch::testing::SurfaceHarness;
use surface_dispatch::{assert_applied, SchemaWarning};

#[test]
fn test_message_names() {
    #[derive(Message, Clone, Debug)]
    enum Outbound {
        Ping,
        Submit(String),
        #[message(rename = "userAction")]
        UserAction { name: String },
    }

    assert_eq!(Outbound::Ping.name(), "Ping");
    assert_eq!(Outbound::Submit("x".into()).name(), "Submit");
    assert_eq!(
        Outbound::UserAction { name: "go".into() }.name(),
        "userAction"
    );
}

#[test]
fn test_message_summary_default() {
    #[derive(Message, Clone, Debug)]
    enum Probe {
        Tick(u8),
    }

    impl MessageSummary for Probe {}

    assert_eq!(Probe::Tick(3).summary(), "Tick(3)");
}

#[derive(ComponentProps, Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RatingProps {
    #[props(required)]
    value: Option<BoundValue>,
    #[props(alias = "maxValue")]
    #[serde(alias = "maxValue")]
    max_stars: Option<u8>,
    #[props(one_of = "star,heart")]
    glyph: Option<BoundValue>,
}

#[test]
fn test_props_schema() {
    assert_eq!(RatingProps::KIND, "Rating");
    let names: Vec<_> = RatingProps::PROPERTIES.iter().map(|p| p.name).collect();
    assert_eq!(names, vec!["value", "maxStars", "glyph"]);
    assert!(RatingProps::PROPERTIES[0].required);
    assert_eq!(RatingProps::PROPERTIES[1].aliases, &["maxValue"]);
    assert_eq!(RatingProps::PROPERTIES[2].allowed, Some(&["star", "heart"][..]));
}

#[test]
fn test_custom_kind_in_catalog() {
    let catalog = Catalog::standard().with::<RatingProps>();
    assert!(catalog.is_known_kind("Rating"));
    assert!(catalog.prompt_listing().contains("Rating"));

    let validator = Validator::new(Arc::new(catalog), Limits::default());
    let mut harness = SurfaceHarness::with_validator("main", validator);
    assert_applied!(harness.create("cat:custom"));
    assert_applied!(harness.send(json!({"updateComponents": {"surfaceId": "main", "components": [
        {"id": "root", "component": "Rating", "maxValue": 5, "glyph": "moon"}
    ]}})));

    let snapshot = harness.snapshot();
    let node = snapshot.component("root").unwrap();
    assert_eq!(node.kind(), "Rating");
    assert!(matches!(node.component, Component::Extension { .. }));

    let warnings = harness.take_warnings();
    assert_eq!(warnings.len(), 2);
    assert!(warnings
        .iter()
        .any(|w| matches!(w, SchemaWarning::MissingRequired { property: "value", .. })));
    assert!(warnings
        .iter()
        .any(|w| matches!(w, SchemaWarning::EnumMismatch { property: "glyph", .. })));
}
