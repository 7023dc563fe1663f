//! Script-side value model for the scenebridge marshalling layer.
//!
//! This crate defines what the bridge sees of a scripting runtime:
//!
//! - [`ScriptValue`] and [`PropertyKey`]: tagged values and property keys
//! - [`ScriptRuntime`]: the operations a runtime must provide
//! - [`HeapRuntime`]: a complete in-memory runtime with a collector
//! - [`ClassDescriptor`] / [`NativeClass`]: how native types shape wrappers
//! - [`EncodedString`]: transient NUL-terminated text buffers
//! - [`TypedArrayKind`]: element types of typed array views

pub mod class;
pub mod encoded;
pub mod error;
pub mod runtime;
pub mod type_hash;
pub mod typed_array;
pub mod value;

pub use class::{ClassDescriptor, NativeClass};
pub use encoded::{BufferLease, BufferTracker, EncodedString};
pub use error::{RuntimeError, RuntimeResult};
pub use runtime::{
    HeapConfig, HeapRuntime, NativeFunction, ObjectHandle, ObjectHeap, ObjectKind, ScriptObject,
    ScriptRuntime, SlotFlags,
};
pub use type_hash::TypeHash;
pub use typed_array::TypedArrayKind;
pub use value::{PropertyKey, ScriptValue};
