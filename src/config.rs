//! Bridge configuration.

use scenebridge_core::HeapConfig;

/// How container conversions treat a wrapper that no longer resolves to a
/// native object.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DanglingPolicy {
    /// Fail the conversion with `DanglingReference`.
    #[default]
    Error,
    /// Leave the entry out of the result and keep going.
    Skip,
}

/// Configuration for a [`Bridge`](crate::Bridge).
///
/// ```
/// use scenebridge::{BridgeConfig, DanglingPolicy};
///
/// let config = BridgeConfig::new()
///     .with_dangling(DanglingPolicy::Skip)
///     .with_heap_limit(1024);
/// assert_eq!(config.heap_limit, Some(1024));
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BridgeConfig {
    /// Treatment of dangling wrappers inside sequences and maps
    pub dangling: DanglingPolicy,
    /// Maximum live objects for a bridge-owned [`HeapRuntime`](scenebridge_core::HeapRuntime)
    pub heap_limit: Option<usize>,
}

impl BridgeConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_dangling(mut self, policy: DanglingPolicy) -> Self {
        self.dangling = policy;
        self
    }

    pub fn with_heap_limit(mut self, limit: usize) -> Self {
        self.heap_limit = Some(limit);
        self
    }

    /// Runtime-side configuration derived from this one.
    pub fn heap_config(&self) -> HeapConfig {
        match self.heap_limit {
            Some(limit) => HeapConfig::new().with_max_objects(limit),
            None => HeapConfig::new(),
        }
    }
}
