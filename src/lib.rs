//! Value marshalling and object identity between a scripting runtime and a
//! native object graph.
//!
//! ## Modules
//!
//! - [`convert`]: scalar, text, compound and dynamic value conversions
//! - [`registry`]: one wrapper per live native object, and back
//! - [`containers`]: sequences and maps of native objects
//! - [`scoped_buffer`]: owned text extracted from a script string
//! - [`callback`]: script functions called from native code
//! - [`call_args`]: typed access to native call arguments
//! - [`bridge`]: a runtime bundled with its registry
//!
//! The runtime-facing model (values, the runtime trait, the in-memory heap
//! runtime) lives in `scenebridge-core` and is re-exported as [`runtime`].

pub mod bridge;
pub mod call_args;
pub mod callback;
pub mod config;
pub mod containers;
pub mod convert;
pub mod error;
pub mod native;
pub mod registry;
pub mod scoped_buffer;

pub use scenebridge_core as runtime;

pub use bridge::Bridge;
pub use call_args::CallArgs;
pub use callback::Callback;
pub use config::{BridgeConfig, DanglingPolicy};
pub use containers::{
    map_from_script, map_to_script, sequence_from_args, sequence_from_script, sequence_to_script,
};
pub use convert::{FromScript, HostValue, ToScript};
pub use error::{BridgeError, BridgeResult, ConversionError};
pub use native::{NativeHandle, NativeObject, NativePtr};
pub use registry::{Proxy, ProxyId, ProxyRegistry};
pub use scoped_buffer::ScopedBuffer;

pub mod prelude {
    pub use crate::bridge::Bridge;
    pub use crate::call_args::CallArgs;
    pub use crate::callback::Callback;
    pub use crate::config::{BridgeConfig, DanglingPolicy};
    pub use crate::convert::*;
    pub use crate::error::{BridgeError, BridgeResult, ConversionError};
    pub use crate::native::{NativeHandle, NativeObject, NativePtr};
    pub use crate::registry::ProxyRegistry;
    pub use scenebridge_core::{
        ClassDescriptor, HeapRuntime, NativeClass, ObjectHandle, ScriptRuntime, ScriptValue,
        TypedArrayKind,
    };
}
