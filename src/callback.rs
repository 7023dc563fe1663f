//! Script callbacks invoked from native code.

use scenebridge_core::{ScriptRuntime, ScriptValue};

/// A script function paired with the receiver it is called on.
///
/// Neither value is rooted. Whoever builds the callback must keep both alive
/// for as long as it may be invoked, for example with
/// [`HeapRuntime::root`](scenebridge_core::HeapRuntime::root).
#[derive(Debug)]
pub struct Callback {
    receiver: ScriptValue,
    callable: ScriptValue,
}

impl Callback {
    pub fn new(receiver: ScriptValue, callable: ScriptValue) -> Self {
        Self { receiver, callable }
    }

    pub fn receiver(&self) -> &ScriptValue {
        &self.receiver
    }

    pub fn callable(&self) -> &ScriptValue {
        &self.callable
    }

    /// Call synchronously with the receiver as `this`.
    ///
    /// Returns `None` when the call raised, or when the callable is gone or
    /// was never a function. The failure is logged, not returned.
    pub fn invoke<R>(&self, rt: &mut R, args: &[ScriptValue]) -> Option<ScriptValue>
    where
        R: ScriptRuntime + ?Sized,
    {
        match rt.call(&self.callable, &self.receiver, args) {
            Ok(result) => Some(result),
            Err(err) => {
                log::warn!("script callback failed: {}", err);
                None
            }
        }
    }
}
