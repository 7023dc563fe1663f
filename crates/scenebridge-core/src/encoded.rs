//! Transient character buffers decoded from script strings.
//!
//! Encoding a script string hands the caller an [`EncodedString`]: an owned,
//! NUL-terminated copy of the text. Runtimes that track native buffers attach
//! a [`BufferLease`] so every release is observable.

use std::cell::Cell;
use std::ffi::{CStr, CString};
use std::fmt;
use std::rc::Rc;

/// Counters for buffers handed out by a runtime.
#[derive(Debug, Default)]
pub struct BufferTracker {
    issued: Cell<usize>,
    released: Cell<usize>,
}

impl BufferTracker {
    /// Create a new tracker.
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    /// Record a newly issued buffer and return its lease.
    pub fn lease(self: &Rc<Self>) -> BufferLease {
        self.issued.set(self.issued.get() + 1);
        BufferLease {
            tracker: Rc::clone(self),
        }
    }

    /// Total buffers issued.
    pub fn issued(&self) -> usize {
        self.issued.get()
    }

    /// Total buffers released.
    pub fn released(&self) -> usize {
        self.released.get()
    }

    /// Buffers issued but not yet released.
    pub fn outstanding(&self) -> usize {
        self.issued.get().saturating_sub(self.released.get())
    }
}

/// Proof that a buffer is live; releasing happens exactly once, on drop.
pub struct BufferLease {
    tracker: Rc<BufferTracker>,
}

impl Drop for BufferLease {
    fn drop(&mut self) {
        let released = &self.tracker.released;
        released.set(released.get() + 1);
    }
}

impl fmt::Debug for BufferLease {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BufferLease").finish_non_exhaustive()
    }
}

/// An owned NUL-terminated buffer decoded from a script string.
#[derive(Debug)]
pub struct EncodedString {
    bytes: CString,
    _lease: Option<BufferLease>,
}

impl EncodedString {
    /// Encode `text`. Returns `None` when it contains an interior NUL.
    pub fn new(text: &str, lease: Option<BufferLease>) -> Option<Self> {
        let bytes = CString::new(text).ok()?;
        Some(Self {
            bytes,
            _lease: lease,
        })
    }

    /// Borrow the NUL-terminated bytes.
    pub fn as_c_str(&self) -> &CStr {
        &self.bytes
    }

    /// Borrow the text without the terminator.
    pub fn as_str(&self) -> &str {
        // Built from a &str, so always valid UTF-8.
        self.bytes.to_str().unwrap_or_default()
    }
}
