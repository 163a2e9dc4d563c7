//! Stream pipeline: decoder, validator and surface stores in sequence
//!
//! One candidate line is validated and applied to every store before the
//! next line is read, so later messages can rely on identifiers and data
//! introduced by earlier ones. Line-level failures are reported and skipped;
//! only an idle timeout, an oversized line, a transport failure or cancellation
//! ends the run.
//!
//! # Example
//! ```
//! use std::convert::Infallible;
//! use surface_dispatch_core::envelope::Validator;
//! use surface_dispatch_core::{Pipeline, SurfaceStore};
//! use tokio_util::sync::CancellationToken;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let store = SurfaceStore::new("main");
//! let handle = store.handle().clone();
//! let mut pipeline = Pipeline::new(Validator::default()).with_store(store);
//!
//! let fragments = [
//!     "{\"createSurface\":{\"surfaceId\":\"main\",\"catalogId\":\"c\"}}\n{\"updateCompo",
//!     "nents\":{\"surfaceId\":\"main\",\"components\":[{\"id\":\"root\",\"component\":\"Text\",\"text\":\"Hi\"}]}}\n",
//! ];
//! let source = tokio_stream::iter(fragments.map(Ok::<_, Infallible>));
//! let report = pipeline.run(source, CancellationToken::new()).await.unwrap();
//!
//! assert_eq!(report.messages_applied, 2);
//! assert!(handle.snapshot().ready);
//! # }
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio_stream::Stream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::debug::{DebugSection, DebugState};
use crate::decoder::LineStream;
use crate::envelope::{SurfaceMessage, Validated, Validator};
use crate::error::{MessageError, SchemaWarning, StreamError};
use crate::message::Message;
use crate::store::{Middleware, NoopMiddleware, SurfaceStore};
use crate::surface::Transition;

/// Progress notifications sent while a stream is processed.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineEvent {
    Applied {
        line: usize,
        surface_id: String,
        message: &'static str,
    },
    Rejected {
        line: usize,
        error: MessageError,
    },
    Warning {
        line: usize,
        warning: SchemaWarning,
    },
    /// The stream ended normally
    Finished(StreamReport),
    /// The stream ended with a fatal error
    Failed {
        error: StreamError,
        report: StreamReport,
    },
}

impl PipelineEvent {
    /// Whether this is the last event of a run.
    pub fn is_terminal(&self) -> bool {
        matches!(self, PipelineEvent::Finished(_) | PipelineEvent::Failed { .. })
    }
}

/// Counters for one processed stream.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StreamReport {
    pub lines_decoded: usize,
    pub fence_lines: usize,
    /// Messages applied by at least one store
    pub messages_applied: usize,
    /// Valid messages that no store applied
    pub messages_dropped: usize,
    pub rejected: usize,
    pub rejected_by_kind: BTreeMap<&'static str, usize>,
    pub warnings: usize,
    pub time_to_first_line: Option<Duration>,
    /// The producer sent nothing usable
    pub empty_output: bool,
}

impl DebugState for StreamReport {
    fn debug_sections(&self) -> Vec<DebugSection> {
        let mut stream = DebugSection::new("Stream")
            .entry("lines", self.lines_decoded.to_string())
            .entry("fence lines", self.fence_lines.to_string())
            .entry("applied", self.messages_applied.to_string())
            .entry("dropped", self.messages_dropped.to_string())
            .entry("rejected", self.rejected.to_string())
            .entry("warnings", self.warnings.to_string());
        if let Some(elapsed) = self.time_to_first_line {
            stream.push_entry("first line", format!("{elapsed:?}"));
        }

        let mut rejected = DebugSection::new("Rejected");
        for (kind, count) in &self.rejected_by_kind {
            rejected.push_entry(*kind, count.to_string());
        }
        vec![stream, rejected]
    }
}

/// Result of applying one line to every store.
#[derive(Debug, Clone, PartialEq)]
pub struct LineOutcome {
    pub surface_id: String,
    pub message: &'static str,
    /// Number of stores that applied the message
    pub applied: usize,
    pub warnings: Vec<SchemaWarning>,
}

/// Drives a fragment stream into injected surface stores.
pub struct Pipeline<M = NoopMiddleware> {
    validator: Validator,
    stores: Vec<SurfaceStore<M>>,
    events: Option<mpsc::UnboundedSender<PipelineEvent>>,
}

impl<M> fmt::Debug for Pipeline<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("validator", &self.validator)
            .field("stores", &self.stores.len())
            .field("events", &self.events.is_some())
            .finish()
    }
}

enum Step {
    Cancelled,
    Line(Option<Result<String, StreamError>>),
}

impl<M: Middleware<SurfaceMessage>> Pipeline<M> {
    pub fn new(validator: Validator) -> Self {
        Self {
            validator,
            stores: Vec::new(),
            events: None,
        }
    }

    pub fn with_store(mut self, store: SurfaceStore<M>) -> Self {
        self.stores.push(store);
        self
    }

    pub fn add_store(&mut self, store: SurfaceStore<M>) {
        self.stores.push(store);
    }

    /// Send progress events to `tx`.
    pub fn with_events(mut self, tx: mpsc::UnboundedSender<PipelineEvent>) -> Self {
        self.events = Some(tx);
        self
    }

    /// Create an event channel, replacing any previous subscriber.
    pub fn subscribe(&mut self) -> mpsc::UnboundedReceiver<PipelineEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.events = Some(tx);
        rx
    }

    pub fn validator(&self) -> &Validator {
        &self.validator
    }

    pub fn stores(&self) -> &[SurfaceStore<M>] {
        &self.stores
    }

    pub fn store(&self, id: &str) -> Option<&SurfaceStore<M>> {
        self.stores.iter().find(|store| store.id() == id)
    }

    pub fn store_mut(&mut self, id: &str) -> Option<&mut SurfaceStore<M>> {
        self.stores.iter_mut().find(|store| store.id() == id)
    }

    /// Validate one candidate line and route it to every store.
    pub fn apply_line(&mut self, line: &str) -> Result<LineOutcome, MessageError> {
        let Validated { envelope, warnings } = self.validator.validate(line)?;
        let mut outcome = LineOutcome {
            surface_id: envelope.surface_id().to_string(),
            message: envelope.message.name(),
            applied: 0,
            warnings,
        };
        for store in &mut self.stores {
            if store.dispatch(envelope.clone())? == Transition::Applied {
                outcome.applied += 1;
            }
        }
        Ok(outcome)
    }

    /// Process `source` until it ends, fails, stalls or `cancel` fires.
    ///
    /// A terminal [`PipelineEvent`] is always sent before returning.
    pub async fn run<S, B, E>(
        &mut self,
        source: S,
        cancel: CancellationToken,
    ) -> Result<StreamReport, StreamError>
    where
        S: Stream<Item = Result<B, E>>,
        B: AsRef<[u8]>,
        E: fmt::Display,
    {
        let limits = self.validator.limits();
        let mut lines =
            LineStream::new(source, limits.idle_timeout).with_max_line_bytes(limits.max_line_bytes);
        let mut report = StreamReport::default();
        let mut number = 0;

        loop {
            let step = tokio::select! {
                biased;
                _ = cancel.cancelled() => Step::Cancelled,
                next = lines.next_line() => Step::Line(next),
            };

            let error = match step {
                Step::Line(Some(Ok(line))) => {
                    number += 1;
                    self.process(number, &line, &mut report);
                    continue;
                }
                Step::Line(None) => break,
                Step::Line(Some(Err(error))) => error.with_messages_applied(report.messages_applied),
                Step::Cancelled => StreamError::Cancelled {
                    lines_decoded: lines.stats().lines,
                    messages_applied: report.messages_applied,
                },
            };

            fill_stats(&mut report, &lines);
            warn!(%error, "Stream failed");
            self.emit(PipelineEvent::Failed {
                error: error.clone(),
                report,
            });
            return Err(error);
        }

        fill_stats(&mut report, &lines);
        if report.empty_output {
            warn!("Producer sent no usable lines");
        }
        info!(
            lines = report.lines_decoded,
            applied = report.messages_applied,
            rejected = report.rejected,
            warnings = report.warnings,
            "Stream finished"
        );
        self.emit(PipelineEvent::Finished(report.clone()));
        Ok(report)
    }

    fn process(&mut self, number: usize, line: &str, report: &mut StreamReport) {
        match self.apply_line(line) {
            Ok(outcome) => {
                for warning in outcome.warnings {
                    warn!(line = number, %warning, "Schema warning");
                    report.warnings += 1;
                    self.emit(PipelineEvent::Warning {
                        line: number,
                        warning,
                    });
                }
                if outcome.applied > 0 {
                    debug!(line = number, surface = %outcome.surface_id, message = outcome.message, "Applied");
                    report.messages_applied += 1;
                    self.emit(PipelineEvent::Applied {
                        line: number,
                        surface_id: outcome.surface_id,
                        message: outcome.message,
                    });
                } else {
                    debug!(line = number, surface = %outcome.surface_id, message = outcome.message, "Dropped");
                    report.messages_dropped += 1;
                }
            }
            Err(error) => {
                warn!(line = number, kind = error.kind(), %error, "Rejected line");
                report.rejected += 1;
                *report.rejected_by_kind.entry(error.kind()).or_default() += 1;
                self.emit(PipelineEvent::Rejected {
                    line: number,
                    error,
                });
            }
        }
    }

    fn emit(&self, event: PipelineEvent) {
        if let Some(tx) = &self.events {
            let _ = tx.send(event);
        }
    }
}

fn fill_stats<S, B, E>(report: &mut StreamReport, lines: &LineStream<S>)
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
    E: fmt::Display,
{
    let stats = lines.stats();
    report.lines_decoded = stats.lines;
    report.fence_lines = stats.fence_lines;
    report.time_to_first_line = stats.time_to_first_line;
    report.empty_output = stats.lines == 0;
}
