//! Shared surface handles and the middleware-aware store
//!
//! A [`SurfaceHandle`] is the one place a surface is mutated. Renderers clone
//! the handle and read [`snapshot`](SurfaceHandle::snapshot)s; the pipeline
//! writes through a [`SurfaceStore`], which wraps the handle with
//! [`Middleware`] hooks.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde_json::Value;

use crate::action::ResolvedAction;
use crate::envelope::{Envelope, SurfaceMessage};
use crate::error::{ActionError, DataModelError, MessageError};
use crate::message::Message;
use crate::render::SurfaceSnapshot;
use crate::surface::{DropReason, Surface, Transition};

/// Cloneable handle to one surface.
///
/// Every mutation happens under a single write lock, so a reader never sees
/// a tree from one message paired with a data model from another.
///
/// # Example
/// ```
/// use surface_dispatch_core::envelope::Validator;
/// use surface_dispatch_core::SurfaceHandle;
///
/// let handle = SurfaceHandle::new("main");
/// let renderer = handle.clone();
///
/// let validator = Validator::default();
/// let line = r#"{"createSurface":{"surfaceId":"main","catalogId":"cat:v1"}}"#;
/// handle.apply(validator.validate(line).unwrap().envelope).unwrap();
///
/// assert!(renderer.snapshot().components.is_empty());
/// assert_eq!(renderer.snapshot().catalog_id.as_deref(), Some("cat:v1"));
/// ```
#[derive(Debug, Clone)]
pub struct SurfaceHandle {
    id: Arc<str>,
    inner: Arc<RwLock<Surface>>,
}

impl SurfaceHandle {
    pub fn new(id: impl Into<String>) -> Self {
        let id: String = id.into();
        Self {
            inner: Arc::new(RwLock::new(Surface::new(id.clone()))),
            id: Arc::from(id),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Borrow the live surface. Hold the guard briefly; writers wait on it.
    pub fn read(&self) -> RwLockReadGuard<'_, Surface> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Surface> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Consistent copy of tree, data model and ready flag.
    pub fn snapshot(&self) -> SurfaceSnapshot {
        SurfaceSnapshot::from(&*self.read())
    }

    pub fn apply(&self, envelope: Envelope) -> Result<Transition, MessageError> {
        self.write().apply(envelope)
    }

    /// Store user input at `path`.
    pub fn write_binding(&self, path: &str, value: Value) -> Result<(), DataModelError> {
        self.write().write_binding(path, value)
    }

    /// Resolve the action of `component_id` against the model as it is now.
    pub fn dispatch_action(&self, component_id: &str) -> Result<ResolvedAction, ActionError> {
        self.read().dispatch_action(component_id)
    }
}

/// Hooks around every message a [`SurfaceStore`] applies.
///
/// Implement this trait to add logging, recording, or other cross-cutting
/// concerns without touching the state machine.
pub trait Middleware<M: Message> {
    /// Called before the message reaches the surface
    fn before(&mut self, message: &M);

    /// Called after the message was handled; `changed` is false when it was dropped
    fn after(&mut self, message: &M, changed: bool);
}

/// A middleware that does nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopMiddleware;

impl<M: Message> Middleware<M> for NoopMiddleware {
    fn before(&mut self, _message: &M) {}
    fn after(&mut self, _message: &M, _changed: bool) {}
}

/// Middleware that traces messages at debug level
#[derive(Debug, Clone, Default)]
pub struct LoggingMiddleware {
    pub log_before: bool,
    pub log_after: bool,
}

impl LoggingMiddleware {
    /// Log after each message only
    pub fn new() -> Self {
        Self {
            log_before: false,
            log_after: true,
        }
    }

    pub fn verbose() -> Self {
        Self {
            log_before: true,
            log_after: true,
        }
    }
}

impl<M: Message> Middleware<M> for LoggingMiddleware {
    fn before(&mut self, message: &M) {
        if self.log_before {
            tracing::debug!(message = %message.name(), "Applying message");
        }
    }

    fn after(&mut self, message: &M, changed: bool) {
        if self.log_after {
            tracing::debug!(message = %message.name(), changed, "Message handled");
        }
    }
}

/// Several middlewares run as one; `after` hooks run in reverse order.
pub struct ComposedMiddleware<M: Message> {
    middlewares: Vec<Box<dyn Middleware<M> + Send>>,
}

impl<M: Message> std::fmt::Debug for ComposedMiddleware<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComposedMiddleware")
            .field("middlewares_count", &self.middlewares.len())
            .finish()
    }
}

impl<M: Message> Default for ComposedMiddleware<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: Message> ComposedMiddleware<M> {
    pub fn new() -> Self {
        Self {
            middlewares: Vec::new(),
        }
    }

    pub fn add<T: Middleware<M> + Send + 'static>(&mut self, middleware: T) {
        self.middlewares.push(Box::new(middleware));
    }

    pub fn with<T: Middleware<M> + Send + 'static>(mut self, middleware: T) -> Self {
        self.add(middleware);
        self
    }

    pub fn len(&self) -> usize {
        self.middlewares.len()
    }

    pub fn is_empty(&self) -> bool {
        self.middlewares.is_empty()
    }
}

impl<M: Message> Middleware<M> for ComposedMiddleware<M> {
    fn before(&mut self, message: &M) {
        for middleware in &mut self.middlewares {
            middleware.before(message);
        }
    }

    fn after(&mut self, message: &M, changed: bool) {
        for middleware in self.middlewares.iter_mut().rev() {
            middleware.after(message, changed);
        }
    }
}

/// Write side of one surface: a handle plus middleware.
#[derive(Debug)]
pub struct SurfaceStore<M = NoopMiddleware> {
    handle: SurfaceHandle,
    middleware: M,
}

impl SurfaceStore<NoopMiddleware> {
    pub fn new(id: impl Into<String>) -> Self {
        Self::from_handle(SurfaceHandle::new(id))
    }

    pub fn from_handle(handle: SurfaceHandle) -> Self {
        Self {
            handle,
            middleware: NoopMiddleware,
        }
    }
}

impl<M: Middleware<SurfaceMessage>> SurfaceStore<M> {
    pub fn with_middleware<N: Middleware<SurfaceMessage>>(self, middleware: N) -> SurfaceStore<N> {
        SurfaceStore {
            handle: self.handle,
            middleware,
        }
    }

    pub fn id(&self) -> &str {
        self.handle.id()
    }

    /// Handle for readers; clones share the same surface.
    pub fn handle(&self) -> &SurfaceHandle {
        &self.handle
    }

    pub fn middleware(&self) -> &M {
        &self.middleware
    }

    pub fn middleware_mut(&mut self) -> &mut M {
        &mut self.middleware
    }

    /// Route one message through the middleware to the surface.
    ///
    /// Messages addressed to another surface return
    /// `Dropped(SurfaceMismatch)` without reaching the middleware.
    pub fn dispatch(&mut self, envelope: Envelope) -> Result<Transition, MessageError> {
        if envelope.surface_id() != self.handle.id() {
            return Ok(Transition::Dropped(DropReason::SurfaceMismatch));
        }

        self.middleware.before(&envelope.message);
        let message = envelope.message.clone();
        let result = self.handle.apply(envelope);
        self.middleware
            .after(&message, matches!(result, Ok(Transition::Applied)));
        result
    }
}
