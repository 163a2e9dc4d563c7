//! surface-dispatch: validate and reconcile streamed UI surfaces
//!
//! A generator (typically a language model) writes one JSON message per
//! line. This crate decodes the fragmented stream, rejects what does not fit
//! the envelope contract or the component catalog, and applies the rest to
//! per-surface state that a renderer can snapshot at any time.
//!
//! # Example
//! ```
//! use std::convert::Infallible;
//! use surface_dispatch::prelude::*;
//! use tokio_util::sync::CancellationToken;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let store = SurfaceStore::new("main");
//! let handle = store.handle().clone();
//! let mut pipeline = Pipeline::new(Validator::default()).with_store(store);
//!
//! let text = concat!(
//!     r#"{"createSurface":{"surfaceId":"main","catalogId":"cat:v1"}}"#, "\n",
//!     r#"{"updateComponents":{"surfaceId":"main","components":[{"id":"root","component":"Text","text":"Hi"}]}}"#, "\n",
//! );
//! let source = tokio_stream::iter([Ok::<_, Infallible>(text)]);
//! pipeline.run(source, CancellationToken::new()).await.unwrap();
//!
//! let snapshot = handle.snapshot();
//! assert_eq!(snapshot.component("root").unwrap().kind(), "Text");
//! # }
//! ```

// Re-export everything from core
pub use surface_dispatch_core::*;

// Re-export derive macros
pub use surface_dispatch_macros::{ComponentProps, Message};

/// Prelude for convenient imports
pub mod prelude {
    // Traits and their derive macros
    pub use surface_dispatch_core::{ComponentProps, Message, MessageSummary};

    // Protocol
    pub use surface_dispatch_core::{
        ActionContract, BoundValue, Catalog, Component, ComponentNode, DataModel, DataOp,
        Envelope, Limits, ResolvedAction, SurfaceMessage, Validator,
    };

    // State and stores
    pub use surface_dispatch_core::{
        ComposedMiddleware, LoggingMiddleware, Middleware, NoopMiddleware, RenderNode, Surface,
        SurfaceHandle, SurfaceSnapshot, SurfaceStore, Transition,
    };

    // Pipeline
    pub use surface_dispatch_core::{Pipeline, PipelineEvent, StreamReport};

    // Errors
    pub use surface_dispatch_core::{
        ActionError, DataModelError, MessageError, RenderError, SchemaWarning, StreamError,
    };

    // Debug
    pub use surface_dispatch_core::debug::{
        DebugState, DebugTable, DebugTableBuilder, MessageLogConfig, MessageLoggerMiddleware,
    };
}
