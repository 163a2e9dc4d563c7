//! End-to-end behaviour of the stream pipeline

use std::convert::Infallible;
use std::time::Duration;

use serde_json::{json, Value};
use surface_dispatch::prelude::*;
use surface_dispatch::testing::{fragment, fragment_stream, ndjson};
use surface_dispatch::{assert_event, LineDecoder};
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tokio_util::sync::CancellationToken;

fn create(id: &str) -> Value {
    json!({"createSurface": {"surfaceId": id, "catalogId": "cat:v1"}})
}

fn components(id: &str, entries: Value) -> Value {
    json!({"updateComponents": {"surfaceId": id, "components": entries}})
}

async fn run_text(text: &str, chunk: usize) -> (StreamReport, SurfaceSnapshot) {
    let store = SurfaceStore::new("main");
    let handle = store.handle().clone();
    let mut pipeline = Pipeline::new(Validator::default()).with_store(store);
    let report = pipeline
        .run(fragment_stream(text, chunk), CancellationToken::new())
        .await
        .unwrap();
    (report, handle.snapshot())
}

#[tokio::test]
async fn test_single_text_surface() {
    let text = ndjson(&[
        create("main"),
        components("main", json!([{"id": "root", "component": "Text", "text": "Hi"}])),
    ]);
    let (report, snapshot) = run_text(&text, 7).await;

    assert_eq!(report.messages_applied, 2);
    assert_eq!(snapshot.components.len(), 1);
    let root = snapshot.component("root").unwrap();
    assert_eq!(root.kind(), "Text");
    match &root.component {
        Component::Text(props) => assert_eq!(props.text, Some(BoundValue::from("Hi"))),
        other => panic!("unexpected component {other:?}"),
    }
}

#[tokio::test]
async fn test_unknown_kind_rejects_whole_message() {
    let text = ndjson(&[
        create("main"),
        components(
            "main",
            json!([
                {"id": "root", "component": "Column", "children": ["x"]},
                {"id": "x", "component": "GhostWidget"}
            ]),
        ),
    ]);
    let (report, snapshot) = run_text(&text, 64).await;

    assert_eq!(report.rejected_by_kind.get("CapabilityViolation"), Some(&1));
    assert!(snapshot.components.is_empty());
}

#[tokio::test]
async fn test_oversized_data_model_update_is_rejected() {
    let store = SurfaceStore::new("main");
    let handle = store.handle().clone();
    let validator = Validator::new(
        Catalog::standard().into(),
        Limits::default().with_max_data_model_bytes(32),
    );
    let mut pipeline = Pipeline::new(validator).with_store(store);
    let mut events = pipeline.subscribe();

    let text = ndjson(&[
        create("main"),
        json!({"updateDataModel": {"surfaceId": "main", "value": {"a": 1}}}),
        json!({"updateDataModel": {"surfaceId": "main", "value": {"blob": "x".repeat(64)}}}),
    ]);
    pipeline
        .run(fragment_stream(&text, 16), CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(handle.snapshot().data_model.root(), &json!({"a": 1}));

    let mut seen = Vec::new();
    while let Ok(event) = events.try_recv() {
        seen.push(event);
    }
    assert_event!(
        seen,
        PipelineEvent::Rejected {
            line: 3,
            error: MessageError::StructuralViolation { .. }
        }
    );
    assert!(seen.last().is_some_and(PipelineEvent::is_terminal));
}

#[test]
fn test_action_resolves_against_current_model() {
    let mut harness = surface_dispatch::SurfaceHarness::new("main");
    harness.create("cat:v1").unwrap();
    harness
        .send(json!({"updateDataModel": {"surfaceId": "main", "value": {"amount": 1}}}))
        .unwrap();
    harness
        .send(components(
            "main",
            json!([{
                "id": "root", "component": "Button", "child": "label",
                "action": {"name": "go", "context": [{"key": "amt", "value": {"path": "/amount"}}]}
            }]),
        ))
        .unwrap();

    // The model changes after the contract was declared.
    harness.handle().write_binding("/amount", json!(42)).unwrap();

    let event = harness.handle().dispatch_action("root").unwrap();
    assert_eq!(event.name, "go");
    assert_eq!(event.source_component_id, "root");
    assert_eq!(event.context["amt"], json!("42"));
    assert_eq!(event.number("amt"), 42.0);
    assert_eq!(event.to_message()["userAction"]["surfaceId"], "main");
}

#[tokio::test(start_paused = true)]
async fn test_idle_timeout_ends_stream() {
    let (tx, rx) = mpsc::unbounded_channel::<Result<String, Infallible>>();
    let store = SurfaceStore::new("main");
    let validator = Validator::new(
        Catalog::standard().into(),
        Limits::default().with_idle_timeout(Duration::from_millis(500)),
    );
    let mut pipeline = Pipeline::new(validator).with_store(store);
    let mut events = pipeline.subscribe();

    tx.send(Ok(format!("{}\n", create("main")))).unwrap();
    let err = pipeline
        .run(UnboundedReceiverStream::new(rx), CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        StreamError::IdleTimeout {
            lines_decoded: 1,
            messages_applied: 1,
            ..
        }
    ));

    // Fragments arriving after the timeout produce nothing.
    let late = components("main", json!([{"id": "root", "component": "Divider"}]));
    let _ = tx.send(Ok(format!("{late}\n")));

    let mut seen = Vec::new();
    while let Ok(event) = events.try_recv() {
        seen.push(event);
    }
    assert_eq!(seen.len(), 2);
    assert!(matches!(seen[1], PipelineEvent::Failed { .. }));
}

#[test]
fn test_fragmentation_does_not_change_lines() {
    let text = format!(
        "```json\n{}\r\n\n{}\n```\n{}",
        create("main"),
        components("main", json!([{"id": "root", "component": "Text", "text": "héllo wörld ✓"}])),
        json!({"deleteSurface": {"surfaceId": "main"}})
    );

    let decode = |chunks: Vec<String>| {
        let mut decoder = LineDecoder::new();
        let mut lines = Vec::new();
        for chunk in chunks {
            lines.extend(decoder.push_bytes(chunk.as_bytes()));
        }
        lines.extend(decoder.finish());
        lines
    };

    let whole = decode(vec![text.clone()]);
    assert_eq!(whole.len(), 3);
    for size in [1, 2, 3, 5, 8, 13, 64] {
        assert_eq!(decode(fragment(&text, size)), whole, "chunk size {size}");
    }

    // Byte-level splits inside multi-byte characters decode the same way.
    let mut decoder = LineDecoder::new();
    let mut lines = Vec::new();
    for byte in text.as_bytes() {
        lines.extend(decoder.push_bytes(std::slice::from_ref(byte)));
    }
    lines.extend(decoder.finish());
    assert_eq!(lines, whole);
}

#[tokio::test]
async fn test_messages_for_unrouted_surfaces_are_ignored() {
    let text = ndjson(&[
        create("main"),
        create("side"),
        components("side", json!([{"id": "root", "component": "Divider"}])),
        components("main", json!([{"id": "root", "component": "Text", "text": "main"}])),
    ]);
    let (report, snapshot) = run_text(&text, 32).await;
    assert_eq!(report.messages_applied, 2);
    assert_eq!(report.messages_dropped, 2);
    assert_eq!(snapshot.component("root").unwrap().kind(), "Text");
}

#[tokio::test]
async fn test_independent_surfaces_in_one_pipeline() {
    let main = SurfaceStore::new("main");
    let side = SurfaceStore::new("side");
    let (main_handle, side_handle) = (main.handle().clone(), side.handle().clone());
    let mut pipeline = Pipeline::new(Validator::default())
        .with_store(main)
        .with_store(side);

    let text = ndjson(&[
        create("main"),
        create("side"),
        components("side", json!([{"id": "root", "component": "Divider"}])),
        json!({"deleteSurface": {"surfaceId": "main"}}),
    ]);
    let report = pipeline
        .run(tokio_stream::iter([Ok::<_, Infallible>(text)]), CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.messages_applied, 4);
    assert_eq!(main_handle.snapshot().lifecycle, surface_dispatch::Lifecycle::Deleted);
    assert!(side_handle.snapshot().ready);
}

#[tokio::test]
async fn test_oversized_line_fails_stream_with_counters() {
    let store = SurfaceStore::new("main");
    let handle = store.handle().clone();
    let validator = Validator::new(
        Catalog::standard().into(),
        Limits::default().with_max_line_bytes(256),
    );
    let mut pipeline = Pipeline::new(validator).with_store(store);

    let text = ndjson(&[
        create("main"),
        json!({"updateDataModel": {"surfaceId": "main", "value": {"blob": "x".repeat(1024)}}}),
        components("main", json!([{"id": "root", "component": "Divider"}])),
    ]);
    let err = pipeline
        .run(fragment_stream(&text, 4), CancellationToken::new())
        .await
        .unwrap_err();

    assert_eq!(
        err,
        StreamError::LineTooLong {
            max_line_bytes: 256,
            lines_decoded: 1,
            messages_applied: 1,
        }
    );
    assert!(handle.snapshot().data_model.is_empty());
    assert!(handle.snapshot().components.is_empty());
}
