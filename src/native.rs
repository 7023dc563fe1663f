//! Native object identity.
//!
//! The bridge never owns native objects. It only observes their addresses,
//! which serve as identity keys in the [`ProxyRegistry`](crate::ProxyRegistry).

use std::fmt;
use std::ptr::NonNull;

use scenebridge_core::{ClassDescriptor, NativeClass};

/// Address of a native heap object.
///
/// A `NativePtr` is never dereferenced by the bridge.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NativePtr(NonNull<()>);

impl NativePtr {
    /// Take the address of a native object.
    pub fn from_ref<T>(object: &T) -> Self {
        NativePtr(NonNull::from(object).cast())
    }

    /// Wrap a non-null pointer.
    pub fn from_non_null<T>(ptr: NonNull<T>) -> Self {
        NativePtr(ptr.cast())
    }

    /// Wrap a raw pointer, returning `None` for null.
    pub fn from_raw<T>(ptr: *mut T) -> Option<Self> {
        NonNull::new(ptr).map(Self::from_non_null)
    }

    /// Reinterpret the address as a pointer to `T`.
    pub fn cast<T>(self) -> NonNull<T> {
        self.0.cast()
    }

    /// The numeric address.
    pub fn addr(self) -> usize {
        self.0.as_ptr() as usize
    }
}

impl fmt::Debug for NativePtr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NativePtr({:#x})", self.addr())
    }
}

impl fmt::Display for NativePtr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.addr())
    }
}

/// A native object reference paired with the class used to shape its wrapper.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct NativeHandle {
    pub ptr: NativePtr,
    pub class: &'static ClassDescriptor,
}

impl NativeHandle {
    /// Create a handle.
    pub fn new(ptr: NativePtr, class: &'static ClassDescriptor) -> Self {
        Self { ptr, class }
    }
}

impl fmt::Debug for NativeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NativeHandle({} @ {})", self.class.name(), self.ptr)
    }
}

/// A native pointer kind with stable identity, usable as a container element.
///
/// Implemented for `NonNull<T>` of every [`NativeClass`]; binding glue for a
/// concrete engine type gets the generic container converters for free.
pub trait NativeObject: Sized {
    /// Descriptor of the static type.
    fn class() -> &'static ClassDescriptor;

    /// The object's address.
    fn native_ptr(&self) -> NativePtr;

    /// Rebuild the pointer kind from an address recorded in the registry.
    fn from_native_ptr(ptr: NativePtr) -> Self;

    /// The handle used to create a wrapper for this object.
    fn native_handle(&self) -> NativeHandle {
        NativeHandle::new(self.native_ptr(), Self::class())
    }
}

impl<T: NativeClass> NativeObject for NonNull<T> {
    fn class() -> &'static ClassDescriptor {
        T::descriptor()
    }

    fn native_ptr(&self) -> NativePtr {
        NativePtr::from_non_null(*self)
    }

    fn from_native_ptr(ptr: NativePtr) -> Self {
        ptr.cast()
    }
}
