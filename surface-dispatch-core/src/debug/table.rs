//! Debug table types and builder
//!
//! Tables are plain data; [`Display`](std::fmt::Display) renders them as
//! aligned text for terminals and logs.

use std::fmt;

use super::message_log::MessageLog;

/// A section header or a key-value entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DebugTableRow {
    Section(String),
    Entry { key: String, value: String },
}

/// A titled list of rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DebugTable {
    pub title: String,
    pub rows: Vec<DebugTableRow>,
}

impl DebugTable {
    pub fn new(title: impl Into<String>, rows: Vec<DebugTableRow>) -> Self {
        Self {
            title: title.into(),
            rows,
        }
    }

    /// Recent entries of a message log, newest first.
    pub fn from_message_log(log: &MessageLog, title: impl Into<String>, count: usize) -> Self {
        let rows = log
            .recent(count)
            .map(|entry| {
                let status = match entry.applied {
                    Some(true) => "applied",
                    Some(false) => "dropped",
                    None => "pending",
                };
                DebugTableRow::Entry {
                    key: format!("#{} {}", entry.sequence, entry.name),
                    value: format!("{} ({status}, {} ago)", entry.summary, entry.elapsed_display()),
                }
            })
            .collect();
        Self::new(title, rows)
    }

    fn key_width(&self) -> usize {
        self.rows
            .iter()
            .filter_map(|row| match row {
                DebugTableRow::Entry { key, .. } => Some(key.chars().count()),
                DebugTableRow::Section(_) => None,
            })
            .max()
            .unwrap_or(0)
    }
}

impl fmt::Display for DebugTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "== {} ==", self.title)?;
        let width = self.key_width();
        for row in &self.rows {
            match row {
                DebugTableRow::Section(title) => writeln!(f, "[{title}]")?,
                DebugTableRow::Entry { key, value } => writeln!(f, "  {key:<width$}  {value}")?,
            }
        }
        Ok(())
    }
}

/// Builder for [`DebugTable`].
///
/// # Example
///
/// ```
/// use surface_dispatch_core::debug::DebugTableBuilder;
///
/// let table = DebugTableBuilder::new()
///     .section("Surface")
///     .entry("id", "main")
///     .entry("ready", "true")
///     .finish("main");
///
/// assert_eq!(table.rows.len(), 3);
/// assert!(table.to_string().contains("  ready  true"));
/// ```
#[derive(Debug, Default)]
pub struct DebugTableBuilder {
    rows: Vec<DebugTableRow>,
}

impl DebugTableBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn section(mut self, title: impl Into<String>) -> Self {
        self.push_section(title);
        self
    }

    pub fn entry(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.push_entry(key, value);
        self
    }

    pub fn push_section(&mut self, title: impl Into<String>) {
        self.rows.push(DebugTableRow::Section(title.into()));
    }

    pub fn push_entry(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.rows.push(DebugTableRow::Entry {
            key: key.into(),
            value: value.into(),
        });
    }

    pub fn finish(self, title: impl Into<String>) -> DebugTable {
        DebugTable::new(title, self.rows)
    }
}
