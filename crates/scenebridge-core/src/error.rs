//! Error types reported by a script runtime.

use thiserror::Error;

use crate::runtime::ObjectHandle;
use crate::value::ScriptValue;

/// Result alias for runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;

/// Errors a [`ScriptRuntime`](crate::ScriptRuntime) can report to the bridge.
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// The runtime cannot allocate another object
    #[error("out of script heap: limit of {limit} objects reached")]
    Allocation { limit: usize },

    /// Handle refers to an object that has been collected
    #[error("stale object handle {handle}")]
    StaleHandle { handle: ObjectHandle },

    /// Operation requires an array
    #[error("object {handle} is not an array")]
    NotAnArray { handle: ObjectHandle },

    /// Attempted to call a value that is not a function
    #[error("{type_name} is not callable")]
    NotCallable { type_name: &'static str },

    /// Typed array storage does not hold a whole number of elements
    #[error("{len} bytes is not a whole number of {element_size}-byte elements")]
    MisalignedBuffer { len: usize, element_size: usize },

    /// Script code raised an exception
    #[error("uncaught exception: {value:?}")]
    Thrown { value: ScriptValue },
}

impl RuntimeError {
    /// Whether the error means the host is out of memory.
    pub fn is_allocation(&self) -> bool {
        matches!(self, RuntimeError::Allocation { .. })
    }

    /// Create a thrown-exception error carrying a message string.
    pub fn thrown(message: impl AsRef<str>) -> Self {
        RuntimeError::Thrown {
            value: ScriptValue::string(message),
        }
    }
}
