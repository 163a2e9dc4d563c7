//! Resource limits for the protocol engine

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Resource limits applied while decoding, validating and rendering.
///
/// Every limit is enforced as a named failure, never by silently truncating
/// input. Deserializes from a partial document; missing fields take their
/// defaults.
///
/// # Example
/// ```
/// use std::time::Duration;
/// use surface_dispatch_core::Limits;
///
/// let limits = Limits::default()
///     .with_max_components(50)
///     .with_idle_timeout(Duration::from_secs(5));
/// assert_eq!(limits.max_components_per_message, 50);
///
/// let parsed: Limits = serde_json::from_str(r#"{"idleTimeout": 250}"#).unwrap();
/// assert_eq!(parsed.idle_timeout, Duration::from_millis(250));
/// assert_eq!(parsed.max_tree_depth, Limits::DEFAULT_MAX_TREE_DEPTH);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Limits {
    /// Maximum entries in one `updateComponents` message
    pub max_components_per_message: usize,
    /// Maximum child identifiers on one component
    pub max_children_per_node: usize,
    /// Maximum serialized size of an `updateDataModel` value
    pub max_data_model_bytes: usize,
    /// Maximum length of one decoded line
    pub max_line_bytes: usize,
    /// Maximum depth walked when building the render tree
    pub max_tree_depth: usize,
    /// Maximum silence between two stream fragments
    #[serde(with = "duration_ms")]
    pub idle_timeout: Duration,
}

impl Limits {
    pub const DEFAULT_MAX_COMPONENTS: usize = 1_000;
    pub const DEFAULT_MAX_CHILDREN: usize = 256;
    pub const DEFAULT_MAX_DATA_MODEL_BYTES: usize = 1_048_576;
    pub const DEFAULT_MAX_LINE_BYTES: usize = 4 * 1_048_576;
    pub const DEFAULT_MAX_TREE_DEPTH: usize = 32;
    pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(30);

    pub fn with_max_components(mut self, max: usize) -> Self {
        self.max_components_per_message = max;
        self
    }

    pub fn with_max_children(mut self, max: usize) -> Self {
        self.max_children_per_node = max;
        self
    }

    pub fn with_max_data_model_bytes(mut self, max: usize) -> Self {
        self.max_data_model_bytes = max;
        self
    }

    pub fn with_max_line_bytes(mut self, max: usize) -> Self {
        self.max_line_bytes = max;
        self
    }

    pub fn with_max_tree_depth(mut self, max: usize) -> Self {
        self.max_tree_depth = max;
        self
    }

    pub fn with_idle_timeout(mut self, idle: Duration) -> Self {
        self.idle_timeout = idle;
        self
    }
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_components_per_message: Self::DEFAULT_MAX_COMPONENTS,
            max_children_per_node: Self::DEFAULT_MAX_CHILDREN,
            max_data_model_bytes: Self::DEFAULT_MAX_DATA_MODEL_BYTES,
            max_line_bytes: Self::DEFAULT_MAX_LINE_BYTES,
            max_tree_depth: Self::DEFAULT_MAX_TREE_DEPTH,
            idle_timeout: Self::DEFAULT_IDLE_TIMEOUT,
        }
    }
}

mod duration_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        let millis = u64::try_from(value.as_millis()).unwrap_or(u64::MAX);
        serializer.serialize_u64(millis)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
