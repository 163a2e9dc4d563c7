//! Applied-message log with glob filtering
//!
//! [`MessageLog`] keeps the most recent surface messages in a ring buffer so
//! a debugging front end (or the replay tool) can show what the producer
//! actually changed. [`MessageLoggerMiddleware`] feeds it from a store.
//!
//! # Example
//!
//! ```
//! use surface_dispatch_core::debug::{MessageFilter, MessageLogConfig, MessageLoggerMiddleware};
//!
//! // Keep the last 50 component and data updates, skip everything else
//! let filter = MessageFilter::new(Some("Update*"), None);
//! let middleware = MessageLoggerMiddleware::with_log(MessageLogConfig::new(50, filter));
//! assert!(middleware.log().unwrap().is_empty());
//! ```

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::message::MessageSummary;
use crate::store::Middleware;

/// Include/exclude glob patterns over message names.
///
/// `*` matches any run of characters and `?` a single character, so
/// `Update*` selects `UpdateComponents` and `UpdateDataModel`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MessageFilter {
    /// If non-empty, only names matching one of these are logged
    pub include: Vec<String>,
    /// Names matching any of these are skipped (applied after include)
    pub exclude: Vec<String>,
}

impl MessageFilter {
    /// Build a filter from comma-separated pattern lists.
    ///
    /// ```
    /// use surface_dispatch_core::debug::MessageFilter;
    ///
    /// let filter = MessageFilter::new(Some("Update*"), Some("UpdateDataModel"));
    /// assert!(filter.matches("UpdateComponents"));
    /// assert!(!filter.matches("UpdateDataModel"));
    /// assert!(!filter.matches("CreateSurface"));
    /// ```
    pub fn new(include: Option<&str>, exclude: Option<&str>) -> Self {
        Self {
            include: include.map(split_patterns).unwrap_or_default(),
            exclude: exclude.map(split_patterns).unwrap_or_default(),
        }
    }

    pub fn matches(&self, name: &str) -> bool {
        if !self.include.is_empty() && !self.include.iter().any(|p| glob_match(p, name)) {
            return false;
        }
        !self.exclude.iter().any(|p| glob_match(p, name))
    }
}

fn split_patterns(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}

/// One logged message.
#[derive(Debug, Clone)]
pub struct MessageLogEntry {
    pub name: &'static str,
    pub summary: String,
    pub logged_at: Instant,
    pub sequence: u64,
    /// Whether the surface changed; set once the message has been applied
    pub applied: Option<bool>,
}

impl MessageLogEntry {
    pub fn new(name: &'static str, summary: String, sequence: u64) -> Self {
        Self {
            name,
            summary,
            logged_at: Instant::now(),
            sequence,
            applied: None,
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.logged_at.elapsed()
    }

    /// Elapsed time for display, e.g. "2.3s" or "150ms".
    pub fn elapsed_display(&self) -> String {
        let elapsed = self.elapsed();
        if elapsed.as_secs() >= 1 {
            format!("{:.1}s", elapsed.as_secs_f64())
        } else {
            format!("{}ms", elapsed.as_millis())
        }
    }
}

/// Ring buffer configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MessageLogConfig {
    pub capacity: usize,
    pub filter: MessageFilter,
}

impl Default for MessageLogConfig {
    fn default() -> Self {
        Self {
            capacity: 100,
            filter: MessageFilter::default(),
        }
    }
}

impl MessageLogConfig {
    pub fn new(capacity: usize, filter: MessageFilter) -> Self {
        Self { capacity, filter }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            ..Default::default()
        }
    }
}

/// Ring buffer of recent messages; the oldest entry is dropped when full.
#[derive(Debug, Clone, Default)]
pub struct MessageLog {
    entries: VecDeque<MessageLogEntry>,
    config: MessageLogConfig,
    next_sequence: u64,
}

impl MessageLog {
    pub fn new(config: MessageLogConfig) -> Self {
        Self {
            entries: VecDeque::with_capacity(config.capacity),
            config,
            next_sequence: 0,
        }
    }

    /// Record `message` if it passes the filter.
    pub fn log<M: MessageSummary>(&mut self, message: &M) -> Option<&MessageLogEntry> {
        let name = message.name();
        if self.config.capacity == 0 || !self.config.filter.matches(name) {
            return None;
        }

        let entry = MessageLogEntry::new(name, message.summary(), self.next_sequence);
        self.next_sequence += 1;
        if self.entries.len() >= self.config.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
        self.entries.back()
    }

    pub fn mark_last_applied(&mut self, applied: bool) {
        if let Some(entry) = self.entries.back_mut() {
            entry.applied = Some(applied);
        }
    }

    /// Oldest first.
    pub fn entries(&self) -> impl Iterator<Item = &MessageLogEntry> {
        self.entries.iter()
    }

    /// Newest first, at most `count`.
    pub fn recent(&self, count: usize) -> impl Iterator<Item = &MessageLogEntry> {
        self.entries.iter().rev().take(count)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn config(&self) -> &MessageLogConfig {
        &self.config
    }
}

/// Store middleware that traces messages and optionally keeps a [`MessageLog`].
#[derive(Debug, Clone)]
pub struct MessageLoggerMiddleware {
    filter: MessageFilter,
    log: Option<MessageLog>,
    last_logged: bool,
    active: bool,
}

impl MessageLoggerMiddleware {
    /// Tracing only.
    pub fn new(filter: MessageFilter) -> Self {
        Self {
            filter,
            log: None,
            last_logged: false,
            active: true,
        }
    }

    /// Tracing plus in-memory storage.
    pub fn with_log(config: MessageLogConfig) -> Self {
        Self {
            filter: config.filter.clone(),
            log: Some(MessageLog::new(config)),
            last_logged: false,
            active: true,
        }
    }

    pub fn with_default_log() -> Self {
        Self::with_log(MessageLogConfig::default())
    }

    /// When inactive every hook is a no-op.
    pub fn active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn log(&self) -> Option<&MessageLog> {
        self.log.as_ref()
    }

    pub fn log_mut(&mut self) -> Option<&mut MessageLog> {
        self.log.as_mut()
    }

    pub fn filter(&self) -> &MessageFilter {
        &self.filter
    }
}

impl<M: MessageSummary> Middleware<M> for MessageLoggerMiddleware {
    fn before(&mut self, message: &M) {
        if !self.active {
            return;
        }
        let name = message.name();
        if self.filter.matches(name) {
            tracing::debug!(message = %name, "message");
        }
        self.last_logged = false;
        if let Some(log) = self.log.as_mut() {
            self.last_logged = log.log(message).is_some();
        }
    }

    fn after(&mut self, _message: &M, changed: bool) {
        if !self.active || !self.last_logged {
            return;
        }
        if let Some(log) = self.log.as_mut() {
            log.mark_last_applied(changed);
        }
    }
}

/// Glob matching with `*` (any run) and `?` (one character).
pub fn glob_match(pattern: &str, text: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let text: Vec<char> = text.chars().collect();

    let (mut p, mut t) = (0, 0);
    let mut backtrack: Option<(usize, usize)> = None;

    while t < text.len() {
        match pattern.get(p) {
            Some('*') => {
                backtrack = Some((p, t));
                p += 1;
            }
            Some(&c) if c == '?' || c == text[t] => {
                p += 1;
                t += 1;
            }
            _ => match backtrack {
                Some((star, matched)) => {
                    p = star + 1;
                    t = matched + 1;
                    backtrack = Some((star, matched + 1));
                }
                None => return false,
            },
        }
    }

    pattern[p..].iter().all(|&c| c == '*')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Message;

    #[derive(Clone, Debug)]
    enum Probe {
        Create,
        Update,
    }

    impl Message for Probe {
        fn name(&self) -> &'static str {
            match self {
                Probe::Create => "CreateSurface",
                Probe::Update => "UpdateComponents",
            }
        }
    }

    impl MessageSummary for Probe {}

    #[test]
    fn test_glob_match() {
        assert!(glob_match("Update*", "UpdateDataModel"));
        assert!(glob_match("*Surface", "DeleteSurface"));
        assert!(glob_match("*Data*", "UpdateDataModel"));
        assert!(glob_match("Update?omponents", "UpdateComponents"));
        assert!(!glob_match("Update*", "CreateSurface"));
        assert!(!glob_match("Create", "CreateSurface"));
        assert!(glob_match("*", ""));
    }

    #[test]
    fn test_filter_from_lists() {
        let filter = MessageFilter::new(Some("Update*, Create*"), Some("UpdateDataModel"));
        assert_eq!(filter.include, vec!["Update*", "Create*"]);
        assert!(filter.matches("CreateSurface"));
        assert!(!filter.matches("UpdateDataModel"));
        assert!(MessageFilter::default().matches("Anything"));
    }

    #[test]
    fn test_ring_buffer_capacity() {
        let mut log = MessageLog::new(MessageLogConfig::with_capacity(2));
        log.log(&Probe::Create);
        log.log(&Probe::Update);
        log.log(&Probe::Update);
        assert_eq!(log.len(), 2);
        assert_eq!(log.entries().next().unwrap().sequence, 1);
        assert_eq!(log.recent(1).next().unwrap().sequence, 2);
    }

    #[test]
    fn test_middleware_marks_applied() {
        let filter = MessageFilter::new(None, Some("Create*"));
        let mut middleware = MessageLoggerMiddleware::with_log(MessageLogConfig::new(10, filter));

        middleware.before(&Probe::Update);
        middleware.after(&Probe::Update, true);
        middleware.before(&Probe::Create);
        middleware.after(&Probe::Create, false);

        let log = middleware.log().unwrap();
        assert_eq!(log.len(), 1);
        let entry = log.entries().next().unwrap();
        assert_eq!(entry.name, "UpdateComponents");
        assert_eq!(entry.applied, Some(true));
    }

    #[test]
    fn test_inactive_middleware_records_nothing() {
        let mut middleware = MessageLoggerMiddleware::with_default_log().active(false);
        middleware.before(&Probe::Update);
        middleware.after(&Probe::Update, true);
        assert!(middleware.log().unwrap().is_empty());
    }
}
