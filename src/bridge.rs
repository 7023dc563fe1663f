//! The bridge facade: a runtime, its proxy registry and configuration.

use std::fmt;

use indexmap::IndexMap;
use scenebridge_core::{HeapRuntime, ObjectHandle, ScriptRuntime, ScriptValue};

use crate::call_args::CallArgs;
use crate::callback::Callback;
use crate::config::BridgeConfig;
use crate::containers;
use crate::convert::{FromScript, ToScript};
use crate::error::{BridgeResult, ConversionError};
use crate::native::{NativeObject, NativePtr};
use crate::registry::ProxyRegistry;
use crate::scoped_buffer::ScopedBuffer;

/// Owns a script runtime together with the registry that tracks its
/// wrappers.
///
/// ```
/// use std::ptr::NonNull;
///
/// use scenebridge::{Bridge, BridgeConfig};
/// use scenebridge_core::{ClassDescriptor, NativeClass};
///
/// struct Sprite;
/// static SPRITE: ClassDescriptor = ClassDescriptor::root("Sprite");
/// impl NativeClass for Sprite {
///     fn descriptor() -> &'static ClassDescriptor {
///         &SPRITE
///     }
/// }
///
/// let mut bridge = Bridge::with_heap(BridgeConfig::default());
/// let sprite = Sprite;
/// let ptr = NonNull::from(&sprite);
/// let first = bridge.wrap(&ptr).unwrap();
/// let second = bridge.wrap(&ptr).unwrap();
/// assert_eq!(first, second);
/// ```
pub struct Bridge<R: ScriptRuntime> {
    runtime: R,
    registry: ProxyRegistry,
    config: BridgeConfig,
}

impl Bridge<HeapRuntime> {
    /// A bridge over a fresh in-memory runtime, limited by `config.heap_limit`.
    pub fn with_heap(config: BridgeConfig) -> Self {
        let runtime = HeapRuntime::with_config(config.heap_config());
        Self::new(runtime, config)
    }
}

impl<R: ScriptRuntime> Bridge<R> {
    pub fn new(runtime: R, config: BridgeConfig) -> Self {
        log::debug!("bridge created with {:?}", config);
        Self {
            runtime,
            registry: ProxyRegistry::with_policy(config.dangling),
            config,
        }
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    pub fn runtime(&self) -> &R {
        &self.runtime
    }

    pub fn runtime_mut(&mut self) -> &mut R {
        &mut self.runtime
    }

    pub fn registry(&self) -> &ProxyRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut ProxyRegistry {
        &mut self.registry
    }

    /// Borrow the runtime and the registry at the same time.
    pub fn parts_mut(&mut self) -> (&mut R, &mut ProxyRegistry) {
        (&mut self.runtime, &mut self.registry)
    }

    // =========================================================================
    // Values
    // =========================================================================

    pub fn to_script<T: ToScript + ?Sized>(&mut self, value: &T) -> BridgeResult<ScriptValue> {
        value.to_script(&mut self.runtime)
    }

    pub fn from_script<T: FromScript>(&self, value: &ScriptValue) -> Result<T, ConversionError> {
        T::from_script(&self.runtime, value)
    }

    /// Take ownership of the text of a string value.
    pub fn scoped_buffer(&self, value: &ScriptValue) -> ScopedBuffer {
        ScopedBuffer::new(&self.runtime, value)
    }

    // =========================================================================
    // Native objects
    // =========================================================================

    /// The wrapper for `object`, created on first use.
    pub fn wrap<T: NativeObject>(&mut self, object: &T) -> BridgeResult<ObjectHandle> {
        self.registry.get_or_create(&mut self.runtime, object)
    }

    /// The native object behind a wrapper value.
    pub fn unwrap<T: NativeObject>(&self, value: &ScriptValue) -> Result<T, ConversionError> {
        let wrapper = value.as_object().ok_or(ConversionError::TypeMismatch {
            expected: T::class().name(),
            actual: value.type_name(),
        })?;
        self.registry.resolve(wrapper)
    }

    pub fn sequence_to_script<T: NativeObject>(&mut self, items: &[T]) -> BridgeResult<ScriptValue> {
        containers::sequence_to_script(&mut self.runtime, &mut self.registry, items)
    }

    pub fn sequence_from_script<T: NativeObject>(&self, value: &ScriptValue) -> Result<Vec<T>, ConversionError> {
        containers::sequence_from_script(&self.runtime, &self.registry, value)
    }

    pub fn map_to_script<'a, K, T, I>(&mut self, entries: I) -> BridgeResult<ScriptValue>
    where
        K: AsRef<str>,
        T: NativeObject + 'a,
        I: IntoIterator<Item = (K, &'a T)>,
    {
        containers::map_to_script(&mut self.runtime, &mut self.registry, entries)
    }

    pub fn map_from_script<T: NativeObject>(
        &self,
        value: &ScriptValue,
    ) -> Result<IndexMap<String, T>, ConversionError> {
        containers::map_from_script(&self.runtime, &self.registry, value)
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// The native object at `ptr` is being destroyed.
    pub fn native_destroyed(&mut self, ptr: NativePtr) {
        self.registry.on_native_destroyed(ptr);
    }

    /// Apply the runtime's pending finalizations to the registry.
    pub fn sync(&mut self) -> usize {
        self.registry.sync(&mut self.runtime)
    }

    // =========================================================================
    // Calls
    // =========================================================================

    /// Build the argument context for a native call made from script.
    pub fn call_args<'a>(&'a mut self, this: ScriptValue, args: &'a [ScriptValue]) -> CallArgs<'a, R> {
        CallArgs::new(&mut self.runtime, &mut self.registry, this, args)
    }

    /// Invoke a script callback.
    pub fn invoke(&mut self, callback: &Callback, args: &[ScriptValue]) -> Option<ScriptValue> {
        callback.invoke(&mut self.runtime, args)
    }
}

impl<R: ScriptRuntime + fmt::Debug> fmt::Debug for Bridge<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bridge")
            .field("runtime", &self.runtime)
            .field("registry", &self.registry)
            .field("config", &self.config)
            .finish()
    }
}
