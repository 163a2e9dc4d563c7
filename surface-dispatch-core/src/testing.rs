//! Test utilities for producers and renderers built on surface-dispatch
//!
//! - [`fragment`] / [`fragment_stream`]: split a document into small chunks,
//!   the way a token stream arrives
//! - [`ndjson`]: join JSON values into a newline-delimited stream
//! - [`SurfaceHarness`]: validator plus logged store for one surface
//! - Assertion macros for message outcomes and pipeline events
//!
//! # Example
//!
//! ```
//! use serde_json::json;
//! use surface_dispatch_core::testing::SurfaceHarness;
//! use surface_dispatch_core::{assert_applied, assert_dropped};
//!
//! let mut harness = SurfaceHarness::new("main");
//! assert_dropped!(harness.send(json!({"deleteSurface": {"surfaceId": "main"}})));
//! assert_applied!(harness.create("cat:v1"));
//! assert!(harness.snapshot().components.is_empty());
//! ```

use std::convert::Infallible;

use serde_json::Value;
use tokio_stream::Stream;

use crate::debug::{MessageLog, MessageLogConfig, MessageLoggerMiddleware};
use crate::envelope::{Validated, Validator};
use crate::error::{MessageError, SchemaWarning};
use crate::render::SurfaceSnapshot;
use crate::store::{SurfaceHandle, SurfaceStore};
use crate::surface::Transition;

/// Split `text` into chunks of at most `size` characters.
///
/// Chunk boundaries fall on character boundaries; `size` 0 is treated as 1.
///
/// ```
/// use surface_dispatch_core::testing::fragment;
///
/// assert_eq!(fragment("héllo", 2), vec!["hé", "ll", "o"]);
/// ```
pub fn fragment(text: &str, size: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    chars
        .chunks(size.max(1))
        .map(|chunk| chunk.iter().collect())
        .collect()
}

/// Same as [`fragment`], as an infallible fragment stream.
pub fn fragment_stream(
    text: &str,
    size: usize,
) -> impl Stream<Item = Result<String, Infallible>> + Unpin {
    tokio_stream::iter(fragment(text, size).into_iter().map(Ok))
}

/// One compact JSON document per line, each terminated by a newline.
pub fn ndjson(values: &[Value]) -> String {
    values.iter().map(|value| format!("{value}\n")).collect()
}

/// A single surface with a validator in front and a message log behind.
#[derive(Debug)]
pub struct SurfaceHarness {
    validator: Validator,
    store: SurfaceStore<MessageLoggerMiddleware>,
    warnings: Vec<SchemaWarning>,
}

impl SurfaceHarness {
    pub fn new(id: impl Into<String>) -> Self {
        Self::with_validator(id, Validator::default())
    }

    pub fn with_validator(id: impl Into<String>, validator: Validator) -> Self {
        Self {
            validator,
            store: SurfaceStore::new(id)
                .with_middleware(MessageLoggerMiddleware::with_log(MessageLogConfig::default())),
            warnings: Vec::new(),
        }
    }

    pub fn id(&self) -> &str {
        self.store.id()
    }

    /// Validate and apply one JSON document.
    pub fn send(&mut self, document: Value) -> Result<Transition, MessageError> {
        self.send_line(&document.to_string())
    }

    pub fn send_line(&mut self, line: &str) -> Result<Transition, MessageError> {
        let Validated { envelope, warnings } = self.validator.validate(line)?;
        self.warnings.extend(warnings);
        self.store.dispatch(envelope)
    }

    /// Send `createSurface` for this surface.
    pub fn create(&mut self, catalog_id: &str) -> Result<Transition, MessageError> {
        let document = serde_json::json!({
            "createSurface": {"surfaceId": self.id(), "catalogId": catalog_id}
        });
        self.send(document)
    }

    pub fn snapshot(&self) -> SurfaceSnapshot {
        self.store.handle().snapshot()
    }

    pub fn handle(&self) -> &SurfaceHandle {
        self.store.handle()
    }

    /// Schema warnings collected so far.
    pub fn warnings(&self) -> &[SchemaWarning] {
        &self.warnings
    }

    pub fn take_warnings(&mut self) -> Vec<SchemaWarning> {
        std::mem::take(&mut self.warnings)
    }

    pub fn log(&self) -> Option<&MessageLog> {
        self.store.middleware().log()
    }
}

/// Advance the paused tokio clock, e.g. past an idle timeout.
#[cfg(feature = "testing-time")]
pub async fn advance_time(duration: std::time::Duration) {
    tokio::time::advance(duration).await;
}

/// Freeze the tokio clock for the current runtime.
#[cfg(feature = "testing-time")]
pub fn pause_time() {
    tokio::time::pause();
}

#[cfg(feature = "testing-time")]
pub fn resume_time() {
    tokio::time::resume();
}

/// Assert that a send result is `Ok(Transition::Applied)`.
#[macro_export]
macro_rules! assert_applied {
    ($result:expr) => {
        match $result {
            Ok($crate::surface::Transition::Applied) => {}
            other => panic!("Expected message to be applied, but got: {:?}", other),
        }
    };
}

/// Assert that a send result is `Ok(Transition::Dropped(_))`.
#[macro_export]
macro_rules! assert_dropped {
    ($result:expr) => {
        match $result {
            Ok($crate::surface::Transition::Dropped(_)) => {}
            other => panic!("Expected message to be dropped, but got: {:?}", other),
        }
    };
}

/// Assert that a send result is an error matching a pattern.
///
/// ```
/// use serde_json::json;
/// use surface_dispatch_core::assert_rejected;
/// use surface_dispatch_core::testing::SurfaceHarness;
/// use surface_dispatch_core::MessageError;
///
/// let mut harness = SurfaceHarness::new("main");
/// assert_rejected!(harness.send_line("{"), MessageError::MalformedDocument(_));
/// ```
#[macro_export]
macro_rules! assert_rejected {
    ($result:expr, $pattern:pat $(if $guard:expr)?) => {
        match $result {
            Err(ref error) => assert!(
                matches!(error, $pattern $(if $guard)?),
                "Expected error matching `{}`, but got: {:?}",
                stringify!($pattern),
                error
            ),
            Ok(transition) => panic!(
                "Expected error matching `{}`, but message was accepted: {:?}",
                stringify!($pattern),
                transition
            ),
        }
    };
}

/// Assert that a list of pipeline events contains one matching a pattern.
#[macro_export]
macro_rules! assert_event {
    ($events:expr, $pattern:pat $(if $guard:expr)?) => {
        assert!(
            $events.iter().any(|e| matches!(e, $pattern $(if $guard)?)),
            "Expected event matching `{}`, but got: {:?}",
            stringify!($pattern),
            $events
        );
    };
}
