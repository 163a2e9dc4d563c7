//! Error taxonomy for the stream, message, data-model and render layers.

use std::fmt;
use std::time::Duration;

use thiserror::Error;

/// Failures that terminate a whole stream.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StreamError {
    /// No fragment arrived within the idle timeout.
    #[error(
        "no fragment received for {idle:?} ({lines_decoded} lines decoded, {messages_applied} messages applied)"
    )]
    IdleTimeout {
        idle: Duration,
        lines_decoded: usize,
        messages_applied: usize,
    },

    /// A single line grew past the configured cap.
    #[error(
        "line exceeds {max_line_bytes} bytes ({lines_decoded} lines decoded, {messages_applied} messages applied)"
    )]
    LineTooLong {
        max_line_bytes: usize,
        lines_decoded: usize,
        messages_applied: usize,
    },

    /// The underlying transport yielded an error.
    #[error("transport failed: {0}")]
    Transport(String),

    /// The caller cancelled the stream.
    #[error("stream cancelled ({lines_decoded} lines decoded, {messages_applied} messages applied)")]
    Cancelled {
        lines_decoded: usize,
        messages_applied: usize,
    },
}

impl StreamError {
    /// Record how many messages were applied before the stream ended.
    pub fn with_messages_applied(mut self, applied: usize) -> Self {
        match &mut self {
            StreamError::IdleTimeout {
                messages_applied, ..
            }
            | StreamError::LineTooLong {
                messages_applied, ..
            }
            | StreamError::Cancelled {
                messages_applied, ..
            } => *messages_applied = applied,
            StreamError::Transport(_) => {}
        }
        self
    }
}

/// Failures confined to a single candidate line or message.
///
/// The stream continues after any of these.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MessageError {
    /// The line is not a JSON object.
    #[error("malformed document: {0}")]
    MalformedDocument(String),

    /// No recognized message discriminator at the top level.
    #[error("unknown message type (top-level keys: {})", .keys.join(", "))]
    UnknownMessageType { keys: Vec<String> },

    /// More than one recognized message discriminator at the top level.
    #[error("ambiguous message type ({})", .matched.join(", "))]
    AmbiguousMessageType { matched: Vec<String> },

    /// An envelope contract was violated (missing field, oversize, wrong type).
    #[error("{message}: {reason}")]
    StructuralViolation {
        message: &'static str,
        reason: String,
    },

    /// A component entry names a kind the catalog does not permit.
    #[error("component '{id}' uses unknown kind '{kind}'")]
    CapabilityViolation { id: String, kind: String },
}

impl MessageError {
    pub(crate) fn structural(message: &'static str, reason: impl Into<String>) -> Self {
        MessageError::StructuralViolation {
            message,
            reason: reason.into(),
        }
    }

    /// Stable name of the error class, used for counters and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            MessageError::MalformedDocument(_) => "MalformedDocument",
            MessageError::UnknownMessageType { .. } => "UnknownMessageType",
            MessageError::AmbiguousMessageType { .. } => "AmbiguousMessageType",
            MessageError::StructuralViolation { .. } => "StructuralViolation",
            MessageError::CapabilityViolation { .. } => "CapabilityViolation",
        }
    }
}

/// Advisory issue found while checking a component against the catalog.
///
/// Warnings never block a message from being applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaWarning {
    MissingRequired {
        id: String,
        kind: String,
        property: &'static str,
    },
    UnknownProperty {
        id: String,
        kind: String,
        property: String,
    },
    EnumMismatch {
        id: String,
        kind: String,
        property: &'static str,
        value: String,
        allowed: &'static [&'static str],
    },
}

impl SchemaWarning {
    /// Identifier of the component the warning is about.
    pub fn component_id(&self) -> &str {
        match self {
            SchemaWarning::MissingRequired { id, .. }
            | SchemaWarning::UnknownProperty { id, .. }
            | SchemaWarning::EnumMismatch { id, .. } => id,
        }
    }
}

impl fmt::Display for SchemaWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaWarning::MissingRequired { id, kind, property } => {
                write!(f, "{kind} '{id}' is missing required property '{property}'")
            }
            SchemaWarning::UnknownProperty { id, kind, property } => {
                write!(f, "{kind} '{id}' has unknown property '{property}'")
            }
            SchemaWarning::EnumMismatch {
                id,
                kind,
                property,
                value,
                allowed,
            } => write!(
                f,
                "{kind} '{id}' property '{property}' has value '{value}', expected one of [{}]",
                allowed.join(", ")
            ),
        }
    }
}

/// Failures applying a path-scoped data model operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DataModelError {
    #[error("invalid json pointer path: {0}")]
    InvalidPointer(String),

    #[error("cannot descend into non-container value at {0}")]
    NotAContainer(String),

    #[error("invalid array index '{token}' at path {path}")]
    InvalidIndex { token: String, path: String },

    #[error("array index out of bounds '{token}' at path {path}")]
    IndexOutOfBounds { token: String, path: String },
}

/// Failures building the render tree of a surface.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    #[error("surface '{0}' is not active")]
    Uninitialized(String),

    #[error("surface '{surface_id}' has no root component '{root_id}'")]
    MissingRoot { surface_id: String, root_id: String },

    /// The tree is deeper than allowed; cyclic children graphs end up here too.
    #[error("component '{id}' exceeds the maximum tree depth of {max_depth}")]
    DepthExceeded { id: String, max_depth: usize },
}

/// Failures resolving a user-triggered action.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActionError {
    #[error("surface '{0}' is not active")]
    SurfaceInactive(String),

    #[error("unknown component '{0}'")]
    UnknownComponent(String),

    #[error("component '{0}' does not declare an action")]
    NoAction(String),
}
