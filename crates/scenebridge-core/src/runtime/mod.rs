//! The script runtime interface and its in-memory implementation.
//!
//! ## Key Types
//!
//! - [`ScriptRuntime`]: operations the bridge needs from a scripting runtime
//! - [`ObjectHeap`]: generational arena of script objects
//! - [`HeapRuntime`]: reference runtime over an [`ObjectHeap`] with a
//!   mark-and-sweep collector and a finalization queue

mod heap_runtime;
mod object_heap;

pub use heap_runtime::{HeapConfig, HeapRuntime};
pub use object_heap::{NativeFunction, ObjectHandle, ObjectHeap, ObjectKind, ScriptObject, SlotFlags};

use crate::class::ClassDescriptor;
use crate::encoded::EncodedString;
use crate::error::RuntimeResult;
use crate::typed_array::TypedArrayKind;
use crate::value::{PropertyKey, ScriptValue};

/// Operations the bridge requires from a scripting runtime.
///
/// The runtime owns every object; the bridge only holds [`ObjectHandle`]s.
/// All calls happen synchronously on the thread that owns the runtime.
pub trait ScriptRuntime {
    // ========================================================================
    // Allocation
    // ========================================================================

    /// Allocate an empty plain object.
    fn new_object(&mut self) -> RuntimeResult<ObjectHandle>;

    /// Allocate an empty array.
    fn new_array(&mut self) -> RuntimeResult<ObjectHandle>;

    /// Allocate a wrapper shaped by `class`. The runtime must report the
    /// wrapper through [`drain_finalized`](Self::drain_finalized) when it
    /// is collected.
    fn new_wrapper(&mut self, class: &'static ClassDescriptor) -> RuntimeResult<ObjectHandle>;

    // ========================================================================
    // Inspection
    // ========================================================================

    /// Whether `object` still refers to a live object.
    fn is_alive(&self, object: ObjectHandle) -> bool;

    /// Whether `object` is an array.
    fn is_array(&self, object: ObjectHandle) -> bool;

    /// Whether `object` can be called.
    fn is_callable(&self, object: ObjectHandle) -> bool;

    /// The class a wrapper was shaped with, or `None` for other objects.
    fn wrapper_class(&self, object: ObjectHandle) -> Option<&'static ClassDescriptor>;

    /// Element kind and backing bytes of a typed array, or `None` for any
    /// other object.
    fn typed_array(&self, object: ObjectHandle) -> Option<(TypedArrayKind, &[u8])>;

    // ========================================================================
    // Properties
    // ========================================================================

    /// Read a property. Missing properties read as `undefined`.
    fn get_property(&self, object: ObjectHandle, key: &PropertyKey) -> RuntimeResult<ScriptValue>;

    /// Whether `object` has an own property `key`.
    fn has_property(&self, object: ObjectHandle, key: &PropertyKey) -> RuntimeResult<bool>;

    /// Write a property, creating it if needed.
    fn set_property(
        &mut self,
        object: ObjectHandle,
        key: PropertyKey,
        value: ScriptValue,
    ) -> RuntimeResult<()>;

    /// Snapshot of the own enumerable keys in the runtime's enumeration order.
    fn own_keys(&self, object: ObjectHandle) -> RuntimeResult<Vec<PropertyKey>>;

    /// Length of an array.
    fn array_length(&self, object: ObjectHandle) -> RuntimeResult<u32>;

    // ========================================================================
    // Calls and strings
    // ========================================================================

    /// Call `callable` with `this` and positional `args`, synchronously.
    fn call(
        &mut self,
        callable: &ScriptValue,
        this: &ScriptValue,
        args: &[ScriptValue],
    ) -> RuntimeResult<ScriptValue>;

    /// Encode a string value into a NUL-terminated buffer. Returns `None` if
    /// the value is not a string or cannot be encoded.
    fn encode_string(&self, value: &ScriptValue) -> Option<EncodedString>;

    // ========================================================================
    // Collection
    // ========================================================================

    /// Take the wrappers finalized since the last call.
    fn drain_finalized(&mut self) -> Vec<ObjectHandle>;

    // ========================================================================
    // Provided helpers
    // ========================================================================

    /// Read a named property.
    fn get_named(&self, object: ObjectHandle, name: &str) -> RuntimeResult<ScriptValue> {
        self.get_property(object, &PropertyKey::from(name))
    }

    /// Write a named property.
    fn set_named(&mut self, object: ObjectHandle, name: &str, value: ScriptValue) -> RuntimeResult<()> {
        self.set_property(object, PropertyKey::from(name), value)
    }

    /// Read an array element.
    fn get_element(&self, object: ObjectHandle, index: u32) -> RuntimeResult<ScriptValue> {
        self.get_property(object, &PropertyKey::index(index))
    }

    /// Write an array element. Index `u32::MAX` is stored as a named property.
    fn set_element(&mut self, object: ObjectHandle, index: u32, value: ScriptValue) -> RuntimeResult<()> {
        self.set_property(object, PropertyKey::index(index), value)
    }
}
