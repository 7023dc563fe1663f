//! Error types for the bridge.

use scenebridge_core::{ObjectHandle, RuntimeError};
use thiserror::Error;

/// Result alias for operations that may allocate in the script runtime.
pub type BridgeResult<T> = Result<T, BridgeError>;

/// Errors that can occur when converting a script value to a native value.
///
/// These are local and recoverable: the binding glue reports them as a
/// script-visible error and aborts only the current call. A failed
/// conversion never modifies the proxy registry.
#[derive(Debug, Error)]
pub enum ConversionError {
    /// Value has the wrong script-side shape
    #[error("type mismatch: expected {expected}, got {actual}")]
    TypeMismatch {
        expected: &'static str,
        actual: &'static str,
    },

    /// A structured value lacks one of its fields
    #[error("missing field '{field}' in {shape}")]
    MissingField {
        shape: &'static str,
        field: &'static str,
    },

    /// Container input is not an object
    #[error("expected {expected} object, got {actual}")]
    NotAnObject {
        expected: &'static str,
        actual: &'static str,
    },

    /// Sequence input is an object but not an array
    #[error("expected an array for {expected}")]
    NotAnArray { expected: &'static str },

    /// A wrapper has no proxy: it was never bridged or its native object is gone
    #[error("wrapper {wrapper} does not reference a live native object")]
    DanglingReference { wrapper: ObjectHandle },

    /// Numeric field outside its permitted range
    #[error("{shape}.{field} = {value} is out of range")]
    OutOfRange {
        shape: &'static str,
        field: &'static str,
        value: f64,
    },

    /// Nested value exceeds the conversion depth limit
    #[error("value nesting exceeds {limit} levels")]
    NestingTooDeep { limit: usize },

    /// The runtime failed while the value was being read
    #[error("runtime error: {0}")]
    Runtime(#[from] RuntimeError),
}

/// Errors surfaced to the binding glue.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// Error converting a value
    #[error("conversion error: {0}")]
    Conversion(#[from] ConversionError),

    /// Error converting a positional call argument
    #[error("argument {index}: {source}")]
    Argument {
        index: usize,
        #[source]
        source: ConversionError,
    },

    /// Argument index out of bounds
    #[error("argument index {index} out of bounds (call has {count} arguments)")]
    ArgumentIndexOutOfBounds { index: usize, count: usize },

    /// Invalid `this` reference for a method call
    #[error("invalid 'this' reference: {message}")]
    InvalidThis { message: String },

    /// The runtime could not allocate a wrapper or container; not recoverable
    #[error("allocation failure: {0}")]
    Allocation(RuntimeError),

    /// Any other runtime failure
    #[error("runtime error: {0}")]
    Runtime(RuntimeError),
}

impl BridgeError {
    /// Create an "invalid this" error with a message.
    pub fn invalid_this(message: impl Into<String>) -> Self {
        BridgeError::InvalidThis {
            message: message.into(),
        }
    }

    /// Whether the host must treat this error as unrecoverable.
    pub fn is_fatal(&self) -> bool {
        matches!(self, BridgeError::Allocation(_))
    }

    /// Attach an argument position to a conversion error.
    pub fn argument(index: usize, source: ConversionError) -> Self {
        BridgeError::Argument { index, source }
    }
}

impl From<RuntimeError> for BridgeError {
    fn from(err: RuntimeError) -> Self {
        if err.is_allocation() {
            BridgeError::Allocation(err)
        } else {
            BridgeError::Runtime(err)
        }
    }
}
