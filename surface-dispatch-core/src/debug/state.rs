//! State introspection for debugging front ends

use super::table::{DebugTable, DebugTableBuilder};

/// A key-value pair shown in a debug table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DebugEntry {
    pub key: String,
    pub value: String,
}

impl DebugEntry {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// A titled group of entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DebugSection {
    pub title: String,
    pub entries: Vec<DebugEntry>,
}

impl DebugSection {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            entries: Vec::new(),
        }
    }

    pub fn entry(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.entries.push(DebugEntry::new(key, value));
        self
    }

    pub fn push_entry(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.push(DebugEntry::new(key, value));
    }

    /// Value of the first entry named `key`.
    pub fn value(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|entry| entry.key == key)
            .map(|entry| entry.value.as_str())
    }
}

/// Types that can describe themselves as debug sections.
///
/// # Example
///
/// ```
/// use surface_dispatch_core::debug::{DebugSection, DebugState};
///
/// struct Counters {
///     applied: usize,
///     rejected: usize,
/// }
///
/// impl DebugState for Counters {
///     fn debug_sections(&self) -> Vec<DebugSection> {
///         vec![DebugSection::new("Stream")
///             .entry("applied", self.applied.to_string())
///             .entry("rejected", self.rejected.to_string())]
///     }
/// }
///
/// let table = Counters { applied: 3, rejected: 1 }.build_debug_table("Counters");
/// assert_eq!(table.rows.len(), 3);
/// ```
pub trait DebugState {
    fn debug_sections(&self) -> Vec<DebugSection>;

    /// Flatten the sections into a table.
    fn build_debug_table(&self, title: impl Into<String>) -> DebugTable {
        let mut builder = DebugTableBuilder::new();
        for section in self.debug_sections() {
            builder.push_section(section.title);
            for entry in section.entries {
                builder.push_entry(entry.key, entry.value);
            }
        }
        builder.finish(title)
    }
}
