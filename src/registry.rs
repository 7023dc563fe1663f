//! Identity proxy registry.
//!
//! The registry is the sole authority correlating native addresses with
//! script wrappers. Each live native pointer maps to at most one wrapper and
//! each wrapper to at most one native pointer.
//!
//! # Architecture
//!
//! ```text
//!   by_native: FxHashMap<NativePtr, ProxyId> ──┐
//!                                              ├──► slots: [ProxySlot] (generational arena)
//!   by_wrapper: FxHashMap<ObjectHandle, ProxyId>┘
//!
//!   pending_finalized: Vec<ObjectHandle>   (drained between enumerations)
//! ```
//!
//! Proxies are removed when the native object is destroyed
//! ([`on_native_destroyed`](ProxyRegistry::on_native_destroyed)) or when the
//! runtime finalizes the wrapper
//! ([`on_wrapper_finalized`](ProxyRegistry::on_wrapper_finalized)).
//! Finalization notices are only queued; the indices change when the queue
//! is flushed, so a notice arriving during an enumeration cannot invalidate
//! it. Removing a proxy never destroys either side.

use std::fmt;

use rustc_hash::FxHashMap;
use scenebridge_core::{ObjectHandle, ScriptRuntime};

use crate::config::DanglingPolicy;
use crate::error::{BridgeResult, ConversionError};
use crate::native::{NativeHandle, NativeObject, NativePtr};

/// Stable handle to a proxy record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ProxyId {
    index: u32,
    generation: u32,
}

/// The correlation between a native object and its script wrapper.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Proxy {
    pub native: NativeHandle,
    pub wrapper: ObjectHandle,
}

struct ProxySlot {
    generation: u32,
    proxy: Option<Proxy>,
}

/// Maps native pointers to script wrappers and back.
pub struct ProxyRegistry {
    slots: Vec<ProxySlot>,
    free_list: Vec<u32>,
    by_native: FxHashMap<NativePtr, ProxyId>,
    by_wrapper: FxHashMap<ObjectHandle, ProxyId>,
    pending_finalized: Vec<ObjectHandle>,
    dangling: DanglingPolicy,
}

impl ProxyRegistry {
    /// Create an empty registry that reports dangling references as errors.
    pub fn new() -> Self {
        Self::with_policy(DanglingPolicy::default())
    }

    /// Create an empty registry with the given dangling-reference policy.
    pub fn with_policy(dangling: DanglingPolicy) -> Self {
        Self {
            slots: Vec::new(),
            free_list: Vec::new(),
            by_native: FxHashMap::default(),
            by_wrapper: FxHashMap::default(),
            pending_finalized: Vec::new(),
            dangling,
        }
    }

    /// How container conversions treat wrappers without a proxy.
    pub fn dangling_policy(&self) -> DanglingPolicy {
        self.dangling
    }

    /// Number of live proxies.
    pub fn len(&self) -> usize {
        self.by_native.len()
    }

    /// Whether no proxies are registered.
    pub fn is_empty(&self) -> bool {
        self.by_native.is_empty()
    }

    /// Number of finalization notices waiting to be flushed.
    pub fn pending_finalized(&self) -> usize {
        self.pending_finalized.len()
    }

    // =========================================================================
    // Native -> Script
    // =========================================================================

    /// Return the wrapper for `native`, creating one on first use.
    ///
    /// Repeated calls for the same pointer return the same wrapper until the
    /// proxy is removed. A proxy whose wrapper the runtime has already
    /// collected (notice not yet delivered) is replaced.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn get_or_create_proxy<R>(&mut self, rt: &mut R, native: NativeHandle) -> BridgeResult<ObjectHandle>
    where
        R: ScriptRuntime + ?Sized,
    {
        if let Some(&id) = self.by_native.get(&native.ptr)
            && let Some(proxy) = self.proxy(id)
        {
            let wrapper = proxy.wrapper;
            if rt.is_alive(wrapper) && !self.pending_finalized.contains(&wrapper) {
                return Ok(wrapper);
            }
            log::trace!("replacing collected wrapper {} for {:?}", wrapper, native);
            self.remove(id);
        }

        let wrapper = rt.new_wrapper(native.class)?;
        self.insert(Proxy { native, wrapper });
        log::trace!("created wrapper {} for {:?}", wrapper, native);
        Ok(wrapper)
    }

    /// Typed form of [`get_or_create_proxy`](Self::get_or_create_proxy).
    pub fn get_or_create<T, R>(&mut self, rt: &mut R, object: &T) -> BridgeResult<ObjectHandle>
    where
        T: NativeObject,
        R: ScriptRuntime + ?Sized,
    {
        self.get_or_create_proxy(rt, object.native_handle())
    }

    /// The wrapper currently bound to `ptr`, without creating one.
    pub fn wrapper_for(&self, ptr: NativePtr) -> Option<ObjectHandle> {
        let id = self.by_native.get(&ptr)?;
        self.proxy(*id).map(|proxy| proxy.wrapper)
    }

    // =========================================================================
    // Script -> Native
    // =========================================================================

    /// Reverse lookup: the native object behind `wrapper`.
    pub fn native_for(&self, wrapper: ObjectHandle) -> Option<NativeHandle> {
        let id = self.by_wrapper.get(&wrapper)?;
        self.proxy(*id).map(|proxy| proxy.native)
    }

    /// Typed reverse lookup.
    ///
    /// Fails with `DanglingReference` when the wrapper has no proxy and with
    /// `TypeMismatch` when it wraps an object of an unrelated class.
    pub fn resolve<T: NativeObject>(&self, wrapper: ObjectHandle) -> Result<T, ConversionError> {
        let native = self
            .native_for(wrapper)
            .ok_or(ConversionError::DanglingReference { wrapper })?;
        let expected = T::class();
        if !native.class.is_a(expected) {
            return Err(ConversionError::TypeMismatch {
                expected: expected.name(),
                actual: native.class.name(),
            });
        }
        Ok(T::from_native_ptr(native.ptr))
    }

    /// Look up a proxy record.
    pub fn proxy(&self, id: ProxyId) -> Option<&Proxy> {
        let slot = self.slots.get(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.proxy.as_ref()
    }

    /// The proxy id bound to `ptr`.
    pub fn proxy_id(&self, ptr: NativePtr) -> Option<ProxyId> {
        self.by_native.get(&ptr).copied()
    }

    /// Iterate live proxies in slot order.
    pub fn iter(&self) -> impl Iterator<Item = &Proxy> {
        self.slots.iter().filter_map(|slot| slot.proxy.as_ref())
    }

    // =========================================================================
    // Lifecycle notifications
    // =========================================================================

    /// The native object at `ptr` was destroyed. Its wrapper, if any, is
    /// orphaned and will no longer resolve.
    pub fn on_native_destroyed(&mut self, ptr: NativePtr) -> Option<Proxy> {
        let id = self.by_native.get(&ptr).copied()?;
        let removed = self.remove(id);
        if let Some(proxy) = &removed {
            log::trace!("native {} destroyed, orphaned wrapper {}", ptr, proxy.wrapper);
        }
        removed
    }

    /// The runtime finalized `wrapper`. The removal is queued until the next
    /// [`flush_finalized`](Self::flush_finalized); the wrapper is never
    /// touched.
    pub fn on_wrapper_finalized(&mut self, wrapper: ObjectHandle) {
        self.pending_finalized.push(wrapper);
    }

    /// Apply queued finalization notices. Returns the number of proxies removed.
    pub fn flush_finalized(&mut self) -> usize {
        let pending = std::mem::take(&mut self.pending_finalized);
        let mut removed = 0;
        for wrapper in pending {
            if let Some(id) = self.by_wrapper.get(&wrapper).copied()
                && self.remove(id).is_some()
            {
                removed += 1;
            }
        }
        if removed > 0 {
            log::debug!("finalization removed {} proxies", removed);
        }
        removed
    }

    /// Pull the runtime's finalization queue and flush it.
    pub fn sync<R>(&mut self, rt: &mut R) -> usize
    where
        R: ScriptRuntime + ?Sized,
    {
        self.pending_finalized.extend(rt.drain_finalized());
        self.flush_finalized()
    }

    /// Drop every proxy. Neither side is destroyed.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.free_list.clear();
        self.by_native.clear();
        self.by_wrapper.clear();
        self.pending_finalized.clear();
    }

    // =========================================================================
    // Arena
    // =========================================================================

    fn insert(&mut self, proxy: Proxy) -> ProxyId {
        let id = if let Some(index) = self.free_list.pop() {
            let slot = &mut self.slots[index as usize];
            slot.proxy = Some(proxy);
            ProxyId {
                index,
                generation: slot.generation,
            }
        } else {
            let index = self.slots.len() as u32;
            self.slots.push(ProxySlot {
                generation: 0,
                proxy: Some(proxy),
            });
            ProxyId {
                index,
                generation: 0,
            }
        };
        self.by_native.insert(proxy.native.ptr, id);
        self.by_wrapper.insert(proxy.wrapper, id);
        id
    }

    fn remove(&mut self, id: ProxyId) -> Option<Proxy> {
        let slot = self.slots.get_mut(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        let proxy = slot.proxy.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free_list.push(id.index);
        self.by_native.remove(&proxy.native.ptr);
        self.by_wrapper.remove(&proxy.wrapper);
        Some(proxy)
    }
}

impl Default for ProxyRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ProxyRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProxyRegistry")
            .field("proxies", &self.by_native.len())
            .field("slot_count", &self.slots.len())
            .field("pending_finalized", &self.pending_finalized.len())
            .field("dangling", &self.dangling)
            .finish()
    }
}
