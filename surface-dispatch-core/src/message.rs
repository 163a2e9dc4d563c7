//! Message trait for named protocol messages

use std::fmt::Debug;

/// Marker trait for messages that can be applied to a surface store
///
/// Messages describe transitions of surface state. They should be:
/// - Clone: Messages may be logged, replayed, or routed to several surfaces
/// - Debug: For debugging and logging
/// - Send + 'static: For moving across the decoding task boundary
///
/// Use `#[derive(Message)]` from `surface-dispatch-macros` to auto-implement this trait.
pub trait Message: Clone + Debug + Send + 'static {
    /// Get the message name for logging and filtering
    fn name(&self) -> &'static str;
}

/// Short human-readable description of a message for logs and overlays
///
/// The default implementation uses the `Debug` output.
pub trait MessageSummary: Message {
    /// Summarize the message in one line
    fn summary(&self) -> String {
        format!("{:?}", self)
    }
}
