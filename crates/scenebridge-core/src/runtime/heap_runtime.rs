//! In-memory script runtime backed by an [`ObjectHeap`].

use std::fmt;
use std::rc::Rc;

use rustc_hash::FxHashMap;

use crate::class::ClassDescriptor;
use crate::encoded::{BufferTracker, EncodedString};
use crate::error::{RuntimeError, RuntimeResult};
use crate::typed_array::TypedArrayKind;
use crate::value::{PropertyKey, ScriptValue};

use super::object_heap::{ObjectHeap, ObjectKind, ScriptObject, SlotFlags};
use super::{ObjectHandle, ScriptRuntime};

/// Limits applied by a [`HeapRuntime`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeapConfig {
    /// Maximum number of live objects; `None` means unbounded.
    pub max_objects: Option<usize>,
}

impl HeapConfig {
    /// Create a configuration with no limits.
    pub fn new() -> Self {
        Self::default()
    }

    /// Cap the number of live objects.
    pub fn with_max_objects(mut self, limit: usize) -> Self {
        self.max_objects = Some(limit);
        self
    }
}

/// A self-contained scripting runtime used to host the bridge in tests and
/// tools.
///
/// Objects live in a generational [`ObjectHeap`]. Objects stay alive while
/// reachable from an explicit root; [`collect_garbage`](Self::collect_garbage)
/// frees everything else and queues collected wrappers for
/// [`drain_finalized`](ScriptRuntime::drain_finalized).
pub struct HeapRuntime {
    heap: ObjectHeap,
    roots: FxHashMap<ObjectHandle, u32>,
    finalized: Vec<ObjectHandle>,
    buffers: Rc<BufferTracker>,
    config: HeapConfig,
}

impl HeapRuntime {
    /// Create a runtime with no limits.
    pub fn new() -> Self {
        Self::with_config(HeapConfig::default())
    }

    /// Create a runtime with the given limits.
    pub fn with_config(config: HeapConfig) -> Self {
        Self {
            heap: ObjectHeap::new(),
            roots: FxHashMap::default(),
            finalized: Vec::new(),
            buffers: BufferTracker::new(),
            config,
        }
    }

    /// The active configuration.
    pub fn config(&self) -> &HeapConfig {
        &self.config
    }

    /// Read-only access to the object heap.
    pub fn heap(&self) -> &ObjectHeap {
        &self.heap
    }

    /// Number of live objects.
    pub fn object_count(&self) -> usize {
        self.heap.len()
    }

    /// Counters for string buffers handed out by [`encode_string`](ScriptRuntime::encode_string).
    pub fn buffers(&self) -> &BufferTracker {
        &self.buffers
    }

    fn allocate(&mut self, kind: ObjectKind, flags: SlotFlags) -> RuntimeResult<ObjectHandle> {
        if let Some(limit) = self.config.max_objects
            && self.heap.len() >= limit
        {
            return Err(RuntimeError::Allocation { limit });
        }
        Ok(self.heap.allocate(ScriptObject::new(kind), flags))
    }

    fn object(&self, handle: ObjectHandle) -> RuntimeResult<&ScriptObject> {
        self.heap
            .get(handle)
            .ok_or(RuntimeError::StaleHandle { handle })
    }

    /// Allocate a function object.
    pub fn new_function<F>(&mut self, f: F) -> RuntimeResult<ObjectHandle>
    where
        F: Fn(&mut HeapRuntime, &ScriptValue, &[ScriptValue]) -> RuntimeResult<ScriptValue> + 'static,
    {
        self.allocate(ObjectKind::Function(Rc::new(f)), SlotFlags::empty())
    }

    /// Allocate a typed array over `bytes`, which must hold whole elements.
    pub fn new_typed_array(&mut self, kind: TypedArrayKind, bytes: Vec<u8>) -> RuntimeResult<ObjectHandle> {
        let element_size = kind.element_size();
        if bytes.len() % element_size != 0 {
            return Err(RuntimeError::MisalignedBuffer {
                len: bytes.len(),
                element_size,
            });
        }
        self.allocate(ObjectKind::TypedArray { kind, bytes }, SlotFlags::empty())
    }

    /// Allocate an array holding `values` in order.
    pub fn array_from<I>(&mut self, values: I) -> RuntimeResult<ObjectHandle>
    where
        I: IntoIterator<Item = ScriptValue>,
    {
        let array = self.new_array()?;
        for (index, value) in values.into_iter().enumerate() {
            self.set_element(array, index as u32, value)?;
        }
        Ok(array)
    }

    /// Allocate a plain object holding `entries` in order.
    pub fn object_from<'a, I>(&mut self, entries: I) -> RuntimeResult<ObjectHandle>
    where
        I: IntoIterator<Item = (&'a str, ScriptValue)>,
    {
        let object = self.new_object()?;
        for (name, value) in entries {
            self.set_named(object, name, value)?;
        }
        Ok(object)
    }

    // ========================================================================
    // Roots and collection
    // ========================================================================

    /// Keep `handle` (and everything reachable from it) alive across
    /// collections. Roots nest; each call needs a matching [`unroot`](Self::unroot).
    pub fn root(&mut self, handle: ObjectHandle) -> bool {
        if !self.heap.contains(handle) {
            return false;
        }
        *self.roots.entry(handle).or_insert(0) += 1;
        true
    }

    /// Drop one root reference to `handle`.
    pub fn unroot(&mut self, handle: ObjectHandle) -> bool {
        match self.roots.get_mut(&handle) {
            Some(count) if *count > 1 => {
                *count -= 1;
                true
            }
            Some(_) => {
                self.roots.remove(&handle);
                true
            }
            None => false,
        }
    }

    /// Whether `handle` is currently rooted.
    pub fn is_rooted(&self, handle: ObjectHandle) -> bool {
        self.roots.contains_key(&handle)
    }

    /// Collect one object immediately, regardless of reachability.
    pub fn collect(&mut self, handle: ObjectHandle) -> bool {
        let Some((_, flags)) = self.heap.free(handle) else {
            return false;
        };
        self.roots.remove(&handle);
        if flags.contains(SlotFlags::FINALIZE) {
            self.finalized.push(handle);
        }
        true
    }

    /// Mark everything reachable from the roots and free the rest.
    ///
    /// Returns the number of objects freed.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn collect_garbage(&mut self) -> usize {
        self.heap.clear_flags(SlotFlags::MARKED);

        let mut worklist: Vec<ObjectHandle> = self.roots.keys().copied().collect();
        while let Some(handle) = worklist.pop() {
            match self.heap.flags(handle) {
                Some(flags) if !flags.contains(SlotFlags::MARKED) => {}
                _ => continue,
            }
            self.heap.set_flags(handle, SlotFlags::MARKED, true);
            if let Some(object) = self.heap.get(handle) {
                worklist.extend(object.properties.values().filter_map(ScriptValue::as_object));
            }
        }

        let mut freed = 0;
        for handle in self.heap.handles() {
            let unmarked = self
                .heap
                .flags(handle)
                .is_some_and(|flags| !flags.contains(SlotFlags::MARKED));
            if unmarked && self.collect(handle) {
                freed += 1;
            }
        }
        self.heap.clear_flags(SlotFlags::MARKED);

        log::debug!(
            "collected {} objects, {} live, {} awaiting finalization",
            freed,
            self.heap.len(),
            self.finalized.len()
        );
        freed
    }
}

impl Default for HeapRuntime {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for HeapRuntime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HeapRuntime")
            .field("heap", &self.heap)
            .field("roots", &self.roots.len())
            .field("finalized", &self.finalized.len())
            .field("config", &self.config)
            .finish()
    }
}

impl ScriptRuntime for HeapRuntime {
    fn new_object(&mut self) -> RuntimeResult<ObjectHandle> {
        self.allocate(ObjectKind::Plain, SlotFlags::empty())
    }

    fn new_array(&mut self) -> RuntimeResult<ObjectHandle> {
        self.allocate(ObjectKind::Array { length: 0 }, SlotFlags::empty())
    }

    fn new_wrapper(&mut self, class: &'static ClassDescriptor) -> RuntimeResult<ObjectHandle> {
        self.allocate(ObjectKind::Wrapper(class), SlotFlags::FINALIZE)
    }

    fn is_alive(&self, object: ObjectHandle) -> bool {
        self.heap.contains(object)
    }

    fn is_array(&self, object: ObjectHandle) -> bool {
        matches!(
            self.heap.get(object).map(|o| &o.kind),
            Some(ObjectKind::Array { .. })
        )
    }

    fn is_callable(&self, object: ObjectHandle) -> bool {
        matches!(
            self.heap.get(object).map(|o| &o.kind),
            Some(ObjectKind::Function(_))
        )
    }

    fn wrapper_class(&self, object: ObjectHandle) -> Option<&'static ClassDescriptor> {
        match self.heap.get(object)?.kind {
            ObjectKind::Wrapper(class) => Some(class),
            _ => None,
        }
    }

    fn typed_array(&self, object: ObjectHandle) -> Option<(TypedArrayKind, &[u8])> {
        match &self.heap.get(object)?.kind {
            ObjectKind::TypedArray { kind, bytes } => Some((*kind, bytes.as_slice())),
            _ => None,
        }
    }

    fn get_property(&self, object: ObjectHandle, key: &PropertyKey) -> RuntimeResult<ScriptValue> {
        Ok(self
            .object(object)?
            .properties
            .get(key)
            .cloned()
            .unwrap_or_default())
    }

    fn has_property(&self, object: ObjectHandle, key: &PropertyKey) -> RuntimeResult<bool> {
        Ok(self.object(object)?.properties.contains_key(key))
    }

    fn set_property(
        &mut self,
        object: ObjectHandle,
        key: PropertyKey,
        value: ScriptValue,
    ) -> RuntimeResult<()> {
        let target = self
            .heap
            .get_mut(object)
            .ok_or(RuntimeError::StaleHandle { handle: object })?;
        if let (ObjectKind::Array { length }, PropertyKey::Index(index)) = (&mut target.kind, &key)
            && let Some(next) = index.checked_add(1)
        {
            *length = (*length).max(next);
        }
        target.properties.insert(key, value);
        Ok(())
    }

    fn own_keys(&self, object: ObjectHandle) -> RuntimeResult<Vec<PropertyKey>> {
        Ok(self.object(object)?.own_keys())
    }

    fn array_length(&self, object: ObjectHandle) -> RuntimeResult<u32> {
        match self.object(object)?.kind {
            ObjectKind::Array { length } => Ok(length),
            _ => Err(RuntimeError::NotAnArray { handle: object }),
        }
    }

    fn call(
        &mut self,
        callable: &ScriptValue,
        this: &ScriptValue,
        args: &[ScriptValue],
    ) -> RuntimeResult<ScriptValue> {
        let ScriptValue::Object(handle) = callable else {
            return Err(RuntimeError::NotCallable {
                type_name: callable.type_name(),
            });
        };
        let function = match &self.object(*handle)?.kind {
            ObjectKind::Function(function) => Rc::clone(function),
            _ => {
                return Err(RuntimeError::NotCallable {
                    type_name: "object",
                });
            }
        };
        function(self, this, args)
    }

    fn encode_string(&self, value: &ScriptValue) -> Option<EncodedString> {
        let text = value.as_str()?;
        EncodedString::new(text, Some(self.buffers.lease()))
    }

    fn drain_finalized(&mut self) -> Vec<ObjectHandle> {
        std::mem::take(&mut self.finalized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    static NODE: ClassDescriptor = ClassDescriptor::root("Node");

    #[test]
    fn plain_object_properties() {
        let mut rt = HeapRuntime::new();
        let obj = rt.new_object().unwrap();
        rt.set_named(obj, "x", ScriptValue::Number(1.0)).unwrap();

        assert_eq!(rt.get_named(obj, "x").unwrap(), ScriptValue::Number(1.0));
        assert_eq!(rt.get_named(obj, "y").unwrap(), ScriptValue::Undefined);
        assert!(rt.has_property(obj, &PropertyKey::from("x")).unwrap());
        assert!(!rt.has_property(obj, &PropertyKey::from("y")).unwrap());
    }

    #[test]
    fn array_length_tracks_highest_index() {
        let mut rt = HeapRuntime::new();
        let arr = rt.new_array().unwrap();
        assert_eq!(rt.array_length(arr).unwrap(), 0);

        rt.set_element(arr, 4, ScriptValue::Bool(true)).unwrap();
        assert_eq!(rt.array_length(arr).unwrap(), 5);
        assert_eq!(rt.get_element(arr, 2).unwrap(), ScriptValue::Undefined);

        // Numeric names land on the same slot
        rt.set_named(arr, "1", ScriptValue::Number(9.0)).unwrap();
        assert_eq!(rt.get_element(arr, 1).unwrap(), ScriptValue::Number(9.0));
    }

    #[test]
    fn max_index_is_a_named_property() {
        let mut rt = HeapRuntime::new();
        let arr = rt.new_array().unwrap();
        rt.set_element(arr, u32::MAX, ScriptValue::Bool(true)).unwrap();
        assert_eq!(rt.array_length(arr).unwrap(), 0);
        assert_eq!(rt.get_element(arr, u32::MAX).unwrap(), ScriptValue::Bool(true));
        assert_eq!(rt.own_keys(arr).unwrap(), vec![PropertyKey::from("4294967295")]);

        // A raw out-of-range index key leaves the length alone
        rt.set_property(arr, PropertyKey::Index(u32::MAX), ScriptValue::Null)
            .unwrap();
        assert_eq!(rt.array_length(arr).unwrap(), 0);

        rt.set_element(arr, u32::MAX - 1, ScriptValue::Null).unwrap();
        assert_eq!(rt.array_length(arr).unwrap(), u32::MAX);
    }

    #[test]
    fn array_length_on_plain_object_fails() {
        let mut rt = HeapRuntime::new();
        let obj = rt.new_object().unwrap();
        assert!(matches!(
            rt.array_length(obj),
            Err(RuntimeError::NotAnArray { .. })
        ));
    }

    #[test]
    fn own_keys_enumeration_order() {
        let mut rt = HeapRuntime::new();
        let obj = rt
            .object_from([
                ("name", ScriptValue::Null),
                ("3", ScriptValue::Null),
                ("id", ScriptValue::Null),
            ])
            .unwrap();
        let keys = rt.own_keys(obj).unwrap();
        assert_eq!(
            keys,
            vec![
                PropertyKey::Index(3),
                PropertyKey::from("name"),
                PropertyKey::from("id"),
            ]
        );
    }

    #[test]
    fn stale_handle_errors() {
        let mut rt = HeapRuntime::new();
        let obj = rt.new_object().unwrap();
        assert!(rt.collect(obj));
        assert!(!rt.is_alive(obj));
        assert!(matches!(
            rt.get_named(obj, "x"),
            Err(RuntimeError::StaleHandle { .. })
        ));
        assert!(rt.set_named(obj, "x", ScriptValue::Null).is_err());
    }

    #[test]
    fn allocation_limit() {
        let mut rt = HeapRuntime::with_config(HeapConfig::new().with_max_objects(2));
        rt.new_object().unwrap();
        rt.new_array().unwrap();
        let err = rt.new_object().unwrap_err();
        assert!(err.is_allocation());
    }

    #[test]
    fn wrapper_class_reported() {
        let mut rt = HeapRuntime::new();
        let wrapper = rt.new_wrapper(&NODE).unwrap();
        let plain = rt.new_object().unwrap();
        assert_eq!(rt.wrapper_class(wrapper).map(|c| c.name()), Some("Node"));
        assert!(rt.wrapper_class(plain).is_none());
    }

    #[test]
    fn typed_array_storage() {
        let mut rt = HeapRuntime::new();
        let bytes: Vec<u8> = [1.5f32, -2.0].iter().flat_map(|v| v.to_ne_bytes()).collect();
        let view = rt.new_typed_array(TypedArrayKind::Float32, bytes.clone()).unwrap();
        assert_eq!(
            rt.typed_array(view),
            Some((TypedArrayKind::Float32, bytes.as_slice()))
        );
        assert!(!rt.is_array(view));

        let plain = rt.new_array().unwrap();
        assert!(rt.typed_array(plain).is_none());

        let err = rt
            .new_typed_array(TypedArrayKind::Int32, vec![0; 6])
            .unwrap_err();
        assert!(matches!(
            err,
            RuntimeError::MisalignedBuffer {
                len: 6,
                element_size: 4
            }
        ));
    }

    #[test]
    fn garbage_collection_keeps_reachable() {
        let mut rt = HeapRuntime::new();
        let root = rt.new_object().unwrap();
        let child = rt.new_object().unwrap();
        let orphan = rt.new_object().unwrap();
        rt.set_named(root, "child", ScriptValue::Object(child)).unwrap();
        rt.root(root);

        assert_eq!(rt.collect_garbage(), 1);
        assert!(rt.is_alive(root));
        assert!(rt.is_alive(child));
        assert!(!rt.is_alive(orphan));
    }

    #[test]
    fn garbage_collection_handles_cycles() {
        let mut rt = HeapRuntime::new();
        let a = rt.new_object().unwrap();
        let b = rt.new_object().unwrap();
        rt.set_named(a, "b", ScriptValue::Object(b)).unwrap();
        rt.set_named(b, "a", ScriptValue::Object(a)).unwrap();

        assert_eq!(rt.collect_garbage(), 2);
        assert_eq!(rt.object_count(), 0);
    }

    #[test]
    fn finalization_queue_reports_wrappers_only() {
        let mut rt = HeapRuntime::new();
        let wrapper = rt.new_wrapper(&NODE).unwrap();
        rt.new_object().unwrap();

        assert_eq!(rt.collect_garbage(), 2);
        assert_eq!(rt.drain_finalized(), vec![wrapper]);
        assert!(rt.drain_finalized().is_empty());
    }

    #[test]
    fn nested_roots() {
        let mut rt = HeapRuntime::new();
        let obj = rt.new_object().unwrap();
        rt.root(obj);
        rt.root(obj);
        rt.unroot(obj);
        rt.collect_garbage();
        assert!(rt.is_alive(obj));

        rt.unroot(obj);
        assert!(!rt.is_rooted(obj));
        rt.collect_garbage();
        assert!(!rt.is_alive(obj));
    }

    #[test]
    fn call_function_with_this() {
        let mut rt = HeapRuntime::new();
        let receiver = rt.object_from([("base", ScriptValue::Number(10.0))]).unwrap();
        let add = rt
            .new_function(|rt, this, args| {
                let this = this.as_object().ok_or_else(|| RuntimeError::thrown("no this"))?;
                let base = rt.get_named(this, "base")?.to_number().unwrap_or(0.0);
                let arg = args.first().and_then(ScriptValue::to_number).unwrap_or(0.0);
                Ok(ScriptValue::Number(base + arg))
            })
            .unwrap();

        let result = rt
            .call(
                &ScriptValue::Object(add),
                &ScriptValue::Object(receiver),
                &[ScriptValue::Number(5.0)],
            )
            .unwrap();
        assert_eq!(result, ScriptValue::Number(15.0));
    }

    #[test]
    fn call_non_callable() {
        let mut rt = HeapRuntime::new();
        let obj = rt.new_object().unwrap();
        let err = rt
            .call(&ScriptValue::Object(obj), &ScriptValue::Undefined, &[])
            .unwrap_err();
        assert!(matches!(err, RuntimeError::NotCallable { type_name: "object" }));

        let err = rt
            .call(&ScriptValue::Number(1.0), &ScriptValue::Undefined, &[])
            .unwrap_err();
        assert!(matches!(err, RuntimeError::NotCallable { type_name: "number" }));
    }

    #[test]
    fn encode_string_tracks_buffers() {
        let rt = HeapRuntime::new();
        let encoded = rt.encode_string(&ScriptValue::string("abc")).unwrap();
        assert_eq!(rt.buffers().outstanding(), 1);
        drop(encoded);
        assert_eq!(rt.buffers().outstanding(), 0);

        assert!(rt.encode_string(&ScriptValue::Number(1.0)).is_none());
        assert_eq!(rt.buffers().issued(), 1);
    }
}
