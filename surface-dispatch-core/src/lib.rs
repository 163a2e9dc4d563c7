//! Core protocol engine for surface-dispatch
//!
//! This crate turns a stream of newline-delimited JSON messages, produced by
//! an untrusted generator such as a language model, into validated UI
//! surfaces: a component tree plus a data model per surface id.
//!
//! # Core Concepts
//!
//! - **Decoder**: splits fragmented transport output into candidate lines
//! - **Validator**: checks each line against the envelope contract and the catalog
//! - **Catalog**: the permitted component kinds and their property schemas
//! - **Surface**: state machine owning one component tree and data model
//! - **Bindings**: property values that read from the data model at use time
//! - **Actions**: contracts on interactive components, resolved on dispatch
//! - **Pipeline**: drives decoder, validator and surface stores in sequence
//!
//! # Basic Example
//!
//! ```
//! use serde_json::json;
//! use surface_dispatch_core::prelude::*;
//!
//! let validator = Validator::default();
//! let mut store = SurfaceStore::new("main");
//!
//! for line in [
//!     json!({"createSurface": {"surfaceId": "main", "catalogId": "cat:v1"}}),
//!     json!({"updateDataModel": {"surfaceId": "main", "value": {"amount": 42}}}),
//!     json!({"updateComponents": {"surfaceId": "main", "components": [
//!         {"id": "root", "component": "Button", "child": "label", "action": {
//!             "name": "go", "context": [{"key": "amt", "value": {"path": "/amount"}}]
//!         }},
//!         {"id": "label", "component": "Text", "text": "Pay"}
//!     ]}}),
//! ] {
//!     let validated = validator.validate(&line.to_string()).unwrap();
//!     store.dispatch(validated.envelope).unwrap();
//! }
//!
//! let snapshot = store.handle().snapshot();
//! let tree = snapshot.render_tree(validator.limits()).unwrap();
//! assert_eq!(tree.children()[0].id(), "label");
//!
//! let event = store.handle().dispatch_action("root").unwrap();
//! assert_eq!(event.context["amt"], "42");
//! ```

pub mod action;
pub mod binding;
pub mod catalog;
pub mod component;
pub mod config;
pub mod debug;
pub mod decoder;
pub mod envelope;
pub mod error;
pub mod message;
pub mod model;
pub mod pipeline;
pub mod render;
pub mod store;
pub mod surface;
pub mod testing;

// Core trait exports
pub use catalog::{Catalog, ComponentProps, KindSchema, PropertySchema};
pub use message::{Message, MessageSummary};

// Protocol exports
pub use action::{resolve_action, ActionContract, ContextEntry, ResolvedAction};
pub use binding::{resolve, resolve_number, BoundValue};
pub use component::{Component, ComponentNode};
pub use config::Limits;
pub use decoder::{DecodeStats, LineDecoder, LineStream};
pub use envelope::{Envelope, Protocol, SurfaceMessage, Validated, Validator};
pub use model::{DataModel, DataOp};

// State exports
pub use render::{RenderNode, SurfaceSnapshot};
pub use surface::{DropReason, Lifecycle, Surface, Transition, ROOT_ID};

// Store exports
pub use store::{
    ComposedMiddleware, LoggingMiddleware, Middleware, NoopMiddleware, SurfaceHandle,
    SurfaceStore,
};

// Pipeline exports
pub use pipeline::{LineOutcome, Pipeline, PipelineEvent, StreamReport};

// Error exports
pub use error::{
    ActionError, DataModelError, MessageError, RenderError, SchemaWarning, StreamError,
};

// Testing exports
pub use testing::{fragment, fragment_stream, ndjson, SurfaceHarness};

#[cfg(feature = "testing-time")]
pub use testing::{advance_time, pause_time, resume_time};

// Derive macros share names with the traits they implement
pub use surface_dispatch_macros::{ComponentProps, Message};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::action::{ActionContract, ResolvedAction};
    pub use crate::binding::BoundValue;
    pub use crate::catalog::{Catalog, ComponentProps};
    pub use crate::component::{Component, ComponentNode};
    pub use crate::config::Limits;
    pub use crate::debug::{DebugState, MessageLoggerMiddleware};
    pub use crate::envelope::{Envelope, SurfaceMessage, Validator};
    pub use crate::error::{
        ActionError, DataModelError, MessageError, RenderError, SchemaWarning, StreamError,
    };
    pub use crate::message::{Message, MessageSummary};
    pub use crate::model::{DataModel, DataOp};
    pub use crate::pipeline::{Pipeline, PipelineEvent, StreamReport};
    pub use crate::render::{RenderNode, SurfaceSnapshot};
    pub use crate::store::{LoggingMiddleware, Middleware, NoopMiddleware, SurfaceHandle, SurfaceStore};
    pub use crate::surface::{Lifecycle, Surface, Transition};
}
