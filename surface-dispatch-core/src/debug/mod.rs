//! Debug and inspection utilities
//!
//! - [`DebugState`]: expose a type's contents as titled key-value sections
//! - [`DebugTable`]: flattened sections, printable as aligned text
//! - [`MessageLog`]: ring buffer of recently applied messages, fed by
//!   [`MessageLoggerMiddleware`] and filtered by glob patterns
//!
//! # Example
//!
//! ```
//! use surface_dispatch_core::debug::DebugState;
//! use surface_dispatch_core::Surface;
//!
//! let surface = Surface::new("main");
//! let table = surface.build_debug_table("main");
//! assert!(table.to_string().contains("Uninitialized"));
//! ```

pub mod message_log;
pub mod state;
pub mod table;

pub use message_log::{
    glob_match, MessageFilter, MessageLog, MessageLogConfig, MessageLogEntry,
    MessageLoggerMiddleware,
};
pub use state::{DebugEntry, DebugSection, DebugState};
pub use table::{DebugTable, DebugTableBuilder, DebugTableRow};
