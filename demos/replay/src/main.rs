//! surface-replay: feed a recorded NDJSON stream through surface-dispatch
//!
//! The file is split into fragments (optionally throttled) to imitate a
//! streaming producer, then every surface it mentions is printed.
//!
//! # Usage
//!
//! ```sh
//! # Replay the whole file at once
//! cargo run -p surface-replay -- demos/replay/sessions/booking.ndjson
//!
//! # Eight characters every 20ms, only surface "main", as JSON
//! cargo run -p surface-replay -- session.ndjson --chunk 8 --delay-ms 20 --surface main --json
//!
//! # Show why lines were rejected
//! RUST_LOG=surface_dispatch_core=debug cargo run -p surface-replay -- demos/replay/sessions/booking.ndjson
//! ```

use std::collections::BTreeSet;
use std::convert::Infallible;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use serde_json::{json, Map, Value};
use surface_dispatch::debug::{DebugState, DebugTable, MessageLoggerMiddleware};
use surface_dispatch::prelude::*;
use surface_dispatch::testing::fragment;
use surface_dispatch::LineDecoder;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Replay a newline-delimited surface stream
#[derive(Parser, Debug)]
#[command(name = "surface-replay")]
#[command(about = "Replay an NDJSON surface stream and print the resulting surfaces")]
struct Args {
    /// NDJSON file (code fences and blank lines are ignored)
    file: PathBuf,

    /// Characters per fragment; 0 sends the file as one fragment
    #[arg(long, default_value = "0")]
    chunk: usize,

    /// Pause between fragments in milliseconds
    #[arg(long, default_value = "0")]
    delay_ms: u64,

    /// Idle timeout in milliseconds
    #[arg(long)]
    idle_timeout_ms: Option<u64>,

    /// Surface ids to track (repeatable); defaults to every id in the file
    #[arg(long = "surface")]
    surfaces: Vec<String>,

    /// Print the surfaces as JSON instead of tables
    #[arg(long)]
    json: bool,

    /// Number of logged messages to show per surface
    #[arg(long, default_value = "20")]
    messages: usize,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let text = match std::fs::read_to_string(&args.file) {
        Ok(text) => text,
        Err(err) => {
            eprintln!("Error: could not read {}: {err}", args.file.display());
            return ExitCode::FAILURE;
        }
    };

    let mut limits = Limits::default();
    if let Some(ms) = args.idle_timeout_ms {
        limits = limits.with_idle_timeout(Duration::from_millis(ms));
    }
    let validator = Validator::new(Catalog::standard().into(), limits);

    let surfaces = if args.surfaces.is_empty() {
        discover_surfaces(&text, &validator)
    } else {
        args.surfaces.clone()
    };
    info!(surfaces = ?surfaces, "Replaying {}", args.file.display());

    let mut pipeline = Pipeline::new(validator);
    for id in &surfaces {
        pipeline.add_store(
            SurfaceStore::new(id.clone()).with_middleware(MessageLoggerMiddleware::with_default_log()),
        );
    }

    let source = spawn_source(&text, args.chunk, Duration::from_millis(args.delay_ms));
    let cancel = CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ctrl_c.cancel();
        }
    });

    let result = pipeline.run(source, cancel).await;

    if args.json {
        print_json(&pipeline, result.as_ref().ok());
    } else {
        print_tables(&pipeline, result.as_ref().ok(), args.messages);
    }

    match result {
        Ok(report) if report.empty_output => {
            warn!("No usable lines in {}", args.file.display());
            ExitCode::FAILURE
        }
        Ok(_) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err}");
            ExitCode::FAILURE
        }
    }
}

/// Surface ids in order of first appearance among the valid lines.
fn discover_surfaces(text: &str, validator: &Validator) -> Vec<String> {
    let mut decoder = LineDecoder::new();
    let mut lines = decoder.push_str(text);
    lines.extend(decoder.finish());

    let mut seen = BTreeSet::new();
    lines
        .iter()
        .filter_map(|line| validator.validate(line).ok())
        .map(|validated| validated.envelope.surface_id().to_string())
        .filter(|id| seen.insert(id.clone()))
        .collect()
}

/// Feed fragments from a task, the way a network transport would.
fn spawn_source(
    text: &str,
    chunk: usize,
    delay: Duration,
) -> UnboundedReceiverStream<Result<String, Infallible>> {
    let fragments = if chunk == 0 {
        vec![text.to_string()]
    } else {
        fragment(text, chunk)
    };
    let (tx, rx) = mpsc::unbounded_channel();
    tokio::spawn(async move {
        for fragment in fragments {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            if tx.send(Ok(fragment)).is_err() {
                break;
            }
        }
    });
    UnboundedReceiverStream::new(rx)
}

fn print_tables(
    pipeline: &Pipeline<MessageLoggerMiddleware>,
    report: Option<&StreamReport>,
    messages: usize,
) {
    for store in pipeline.stores() {
        let handle = store.handle();
        println!("{}", handle.read().build_debug_table(format!("Surface {}", store.id())));

        let snapshot = handle.snapshot();
        match snapshot.render_tree(pipeline.validator().limits()) {
            Ok(tree) => {
                println!("== Render tree ==");
                print_tree(&tree, &snapshot, 0);
                println!();
            }
            Err(err) => println!("(not renderable: {err})\n"),
        }

        if let Some(log) = store.middleware().log() {
            println!("{}", DebugTable::from_message_log(log, "Messages", messages));
        }
    }

    if let Some(report) = report {
        println!("{}", report.build_debug_table("Report"));
    }
}

fn print_tree(node: &RenderNode<'_>, snapshot: &SurfaceSnapshot, depth: usize) {
    let indent = "  ".repeat(depth);
    match node {
        RenderNode::Placeholder { id } => println!("{indent}{id} (pending)"),
        RenderNode::Shared { node: component } => {
            println!("{indent}{} ({}) (shown above)", component.id, component.kind())
        }
        RenderNode::Component { node: component, children } => {
            match label(&component.component, snapshot) {
                Some(label) => println!("{indent}{} ({}) {label:?}", component.id, component.kind()),
                None => println!("{indent}{} ({})", component.id, component.kind()),
            }
            for child in children {
                print_tree(child, snapshot, depth + 1);
            }
        }
    }
}

/// Display text of components that show one.
fn label(component: &Component, snapshot: &SurfaceSnapshot) -> Option<String> {
    let value = match component {
        Component::Text(props) => props.text.as_ref(),
        Component::TextField(props) => props.label.as_ref(),
        Component::CheckBox(props) => props.label.as_ref(),
        Component::Image(props) => props.url.as_ref(),
        _ => None,
    }?;
    Some(snapshot.resolve(value))
}

fn print_json(pipeline: &Pipeline<MessageLoggerMiddleware>, report: Option<&StreamReport>) {
    let mut surfaces = Map::new();
    for store in pipeline.stores() {
        let snapshot = store.handle().snapshot();
        let components: Vec<Value> = snapshot.components.values().map(|node| node.to_json()).collect();
        surfaces.insert(
            snapshot.id.clone(),
            json!({
                "lifecycle": format!("{:?}", snapshot.lifecycle),
                "catalogId": snapshot.catalog_id,
                "root": snapshot.root_id,
                "ready": snapshot.ready,
                "revision": snapshot.revision,
                "components": components,
                "dataModel": snapshot.data_model.root(),
            }),
        );
    }

    let report = report.map(|report| {
        json!({
            "linesDecoded": report.lines_decoded,
            "fenceLines": report.fence_lines,
            "messagesApplied": report.messages_applied,
            "messagesDropped": report.messages_dropped,
            "rejected": report.rejected_by_kind,
            "warnings": report.warnings,
            "timeToFirstLineMs": report.time_to_first_line.map(|d| d.as_millis() as u64),
        })
    });

    let output = json!({"surfaces": surfaces, "report": report});
    match serde_json::to_string_pretty(&output) {
        Ok(text) => println!("{text}"),
        Err(err) => eprintln!("Error: {err}"),
    }
}
