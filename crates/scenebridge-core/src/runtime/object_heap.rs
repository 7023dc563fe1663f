//! Generational arena for script objects.

use std::fmt;
use std::rc::Rc;

use bitflags::bitflags;
use indexmap::IndexMap;
use rustc_hash::FxBuildHasher;

use crate::class::ClassDescriptor;
use crate::error::RuntimeResult;
use crate::typed_array::TypedArrayKind;
use crate::value::{PropertyKey, ScriptValue};

use super::heap_runtime::HeapRuntime;

/// Handle to a heap-allocated script object.
///
/// This is a safe, copyable reference to an object in the [`ObjectHeap`].
/// The generation detects handles that outlive their object, and together
/// with the index it forms the object's identity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectHandle {
    /// Index into ObjectHeap.slots
    pub index: u32,
    /// Generation for use-after-free detection
    pub generation: u32,
}

impl ObjectHandle {
    /// Create a new object handle.
    pub fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }
}

impl fmt::Display for ObjectHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}.{}", self.index, self.generation)
    }
}

/// Body of a function object: `(runtime, this, args) -> result`.
pub type NativeFunction =
    Rc<dyn Fn(&mut HeapRuntime, &ScriptValue, &[ScriptValue]) -> RuntimeResult<ScriptValue>>;

/// What kind of object a slot holds.
#[derive(Clone)]
pub enum ObjectKind {
    /// Plain property bag
    Plain,
    /// Ordered, index-addressed object with a tracked length
    Array { length: u32 },
    /// Script-side representative of a native object
    Wrapper(&'static ClassDescriptor),
    /// Callable object
    Function(NativeFunction),
    /// Typed array view over its own byte storage
    TypedArray { kind: TypedArrayKind, bytes: Vec<u8> },
}

impl fmt::Debug for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObjectKind::Plain => write!(f, "Plain"),
            ObjectKind::Array { length } => write!(f, "Array({})", length),
            ObjectKind::Wrapper(class) => write!(f, "Wrapper({})", class.name()),
            ObjectKind::Function(_) => write!(f, "Function(...)"),
            ObjectKind::TypedArray { kind, bytes } => write!(f, "{}({} bytes)", kind, bytes.len()),
        }
    }
}

/// A script object: its kind plus own properties in insertion order.
#[derive(Debug, Clone)]
pub struct ScriptObject {
    pub kind: ObjectKind,
    pub properties: IndexMap<PropertyKey, ScriptValue, FxBuildHasher>,
}

impl ScriptObject {
    /// Create an object of the given kind with no properties.
    pub fn new(kind: ObjectKind) -> Self {
        Self {
            kind,
            properties: IndexMap::default(),
        }
    }

    /// Own keys in runtime enumeration order: index keys ascending, then
    /// string keys in insertion order.
    pub fn own_keys(&self) -> Vec<PropertyKey> {
        let mut indices: Vec<u32> = self
            .properties
            .keys()
            .filter_map(PropertyKey::as_index)
            .collect();
        indices.sort_unstable();
        indices
            .into_iter()
            .map(PropertyKey::Index)
            .chain(
                self.properties
                    .keys()
                    .filter(|key| key.as_name().is_some())
                    .cloned(),
            )
            .collect()
    }
}

bitflags! {
    /// Per-slot bookkeeping for the collector.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct SlotFlags: u8 {
        /// Reached during the current mark phase
        const MARKED = 1 << 0;
        /// Collection must be reported through the finalization queue
        const FINALIZE = 1 << 1;
    }
}

/// Heap storage for script objects with generational indices.
///
/// Objects are stored in a Vec with generation tracking. When an object
/// is freed, its slot is reused but the generation is incremented. This
/// allows detecting stale handles at runtime.
pub struct ObjectHeap {
    slots: Vec<HeapSlot>,
    free_list: Vec<u32>,
    live: usize,
}

struct HeapSlot {
    generation: u32,
    value: Option<ScriptObject>,
    flags: SlotFlags,
}

impl ObjectHeap {
    /// Create a new empty object heap.
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free_list: Vec::new(),
            live: 0,
        }
    }

    /// Allocate a new object on the heap.
    pub fn allocate(&mut self, object: ScriptObject, flags: SlotFlags) -> ObjectHandle {
        self.live += 1;
        if let Some(index) = self.free_list.pop() {
            let slot = &mut self.slots[index as usize];
            slot.value = Some(object);
            slot.flags = flags;
            ObjectHandle::new(index, slot.generation)
        } else {
            let index = self.slots.len() as u32;
            self.slots.push(HeapSlot {
                generation: 0,
                value: Some(object),
                flags,
            });
            ObjectHandle::new(index, 0)
        }
    }

    /// Get immutable reference to an object.
    ///
    /// Returns None if the handle is stale.
    pub fn get(&self, handle: ObjectHandle) -> Option<&ScriptObject> {
        let slot = self.slots.get(handle.index as usize)?;
        if slot.generation != handle.generation {
            return None;
        }
        slot.value.as_ref()
    }

    /// Get mutable reference to an object.
    ///
    /// Returns None if the handle is stale.
    pub fn get_mut(&mut self, handle: ObjectHandle) -> Option<&mut ScriptObject> {
        let slot = self.slots.get_mut(handle.index as usize)?;
        if slot.generation != handle.generation {
            return None;
        }
        slot.value.as_mut()
    }

    /// Check whether the handle refers to a live object.
    pub fn contains(&self, handle: ObjectHandle) -> bool {
        self.get(handle).is_some()
    }

    /// Free an object immediately, returning it and its slot flags.
    pub fn free(&mut self, handle: ObjectHandle) -> Option<(ScriptObject, SlotFlags)> {
        let slot = self.slots.get_mut(handle.index as usize)?;
        if slot.generation != handle.generation {
            return None;
        }
        let object = slot.value.take()?;
        let flags = std::mem::take(&mut slot.flags);
        slot.generation = slot.generation.wrapping_add(1);
        self.free_list.push(handle.index);
        self.live -= 1;
        Some((object, flags))
    }

    /// Get the collector flags of a live object.
    pub fn flags(&self, handle: ObjectHandle) -> Option<SlotFlags> {
        let slot = self.slots.get(handle.index as usize)?;
        (slot.generation == handle.generation && slot.value.is_some()).then_some(slot.flags)
    }

    /// Set or clear collector flags on a live object.
    pub fn set_flags(&mut self, handle: ObjectHandle, flags: SlotFlags, on: bool) -> bool {
        if let Some(slot) = self.slots.get_mut(handle.index as usize)
            && slot.generation == handle.generation
            && slot.value.is_some()
        {
            slot.flags.set(flags, on);
            return true;
        }
        false
    }

    /// Clear `flags` on every live object.
    pub fn clear_flags(&mut self, flags: SlotFlags) {
        for slot in &mut self.slots {
            slot.flags.remove(flags);
        }
    }

    /// Handles of all live objects.
    pub fn handles(&self) -> Vec<ObjectHandle> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.value.is_some())
            .map(|(index, slot)| ObjectHandle::new(index as u32, slot.generation))
            .collect()
    }

    /// Number of live objects.
    pub fn len(&self) -> usize {
        self.live
    }

    /// Whether the heap holds no live objects.
    pub fn is_empty(&self) -> bool {
        self.live == 0
    }
}

impl Default for ObjectHeap {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ObjectHeap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectHeap")
            .field("slot_count", &self.slots.len())
            .field("free_count", &self.free_list.len())
            .field("live", &self.live)
            .finish()
    }
}
