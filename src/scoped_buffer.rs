//! Scoped ownership of text extracted from a script string.

use std::ffi::CStr;

use scenebridge_core::{EncodedString, ScriptRuntime, ScriptValue};

/// Owns a NUL-terminated buffer decoded from a script string value.
///
/// The buffer is released exactly once: on drop, on [`set`](Self::set), or on
/// an explicit [`release`](Self::release). When the value was not a string,
/// or could not be encoded, [`get`](Self::get) returns an empty sentinel.
///
/// A `ScopedBuffer` cannot be duplicated:
///
/// ```compile_fail
/// use scenebridge::ScopedBuffer;
///
/// let a = ScopedBuffer::empty();
/// let b = a.clone();
/// ```
#[derive(Debug, Default)]
pub struct ScopedBuffer {
    buffer: Option<EncodedString>,
}

impl ScopedBuffer {
    /// A buffer holding nothing.
    pub fn empty() -> Self {
        Self { buffer: None }
    }

    /// Encode `value`.
    pub fn new<R>(rt: &R, value: &ScriptValue) -> Self
    where
        R: ScriptRuntime + ?Sized,
    {
        Self {
            buffer: rt.encode_string(value),
        }
    }

    /// Release the current buffer, then encode `value`.
    pub fn set<R>(&mut self, rt: &R, value: &ScriptValue)
    where
        R: ScriptRuntime + ?Sized,
    {
        self.release();
        self.buffer = rt.encode_string(value);
    }

    /// The NUL-terminated text, or `""` when nothing is held.
    pub fn get(&self) -> &CStr {
        match &self.buffer {
            Some(buffer) => buffer.as_c_str(),
            None => c"",
        }
    }

    /// The text without the terminator, if a buffer is held.
    pub fn to_str(&self) -> Option<&str> {
        self.buffer.as_ref().map(EncodedString::as_str)
    }

    /// Whether a buffer is held.
    pub fn is_valid(&self) -> bool {
        self.buffer.is_some()
    }

    /// Release the buffer now. Later calls are no-ops.
    pub fn release(&mut self) {
        self.buffer = None;
    }
}
