//! Typed access to the arguments of a native call made from script.

use indexmap::IndexMap;
use scenebridge_core::{ScriptRuntime, ScriptValue, TypedArrayKind};

use crate::containers::{map_from_script, sequence_from_args, sequence_from_script};
use crate::convert::{
    FromScript, HostValue, ToScript, TypedArrayData, host_values_from_args, typed_array_data,
};
use crate::error::{BridgeError, BridgeResult, ConversionError};
use crate::native::NativeObject;
use crate::registry::ProxyRegistry;

/// Context for a native function call.
///
/// Holds the receiver, the positional arguments and the return slot, and
/// reports conversion failures with the position of the offending argument.
pub struct CallArgs<'a, R: ScriptRuntime + ?Sized> {
    rt: &'a mut R,
    registry: &'a mut ProxyRegistry,
    this: ScriptValue,
    args: &'a [ScriptValue],
    ret: ScriptValue,
}

impl<'a, R: ScriptRuntime + ?Sized> CallArgs<'a, R> {
    /// Create a call context. The return slot starts as `undefined`.
    pub fn new(
        rt: &'a mut R,
        registry: &'a mut ProxyRegistry,
        this: ScriptValue,
        args: &'a [ScriptValue],
    ) -> Self {
        Self {
            rt,
            registry,
            this,
            args,
            ret: ScriptValue::Undefined,
        }
    }

    /// Number of positional arguments.
    pub fn arg_count(&self) -> usize {
        self.args.len()
    }

    /// Raw argument value.
    pub fn arg_value(&self, index: usize) -> BridgeResult<&ScriptValue> {
        self.args.get(index).ok_or(BridgeError::ArgumentIndexOutOfBounds {
            index,
            count: self.args.len(),
        })
    }

    /// Typed argument.
    pub fn arg<T: FromScript>(&self, index: usize) -> BridgeResult<T> {
        let value = self.arg_value(index)?;
        T::from_script(&*self.rt, value).map_err(|err| BridgeError::argument(index, err))
    }

    /// Typed argument that may be omitted or `undefined`.
    pub fn optional_arg<T: FromScript>(&self, index: usize) -> BridgeResult<Option<T>> {
        match self.args.get(index) {
            None | Some(ScriptValue::Undefined) => Ok(None),
            Some(_) => self.arg(index).map(Some),
        }
    }

    /// Native object behind a wrapper argument.
    pub fn native_arg<T: NativeObject>(&self, index: usize) -> BridgeResult<T> {
        let value = self.arg_value(index)?;
        let wrapper = value.as_object().ok_or_else(|| {
            BridgeError::argument(
                index,
                ConversionError::TypeMismatch {
                    expected: T::class().name(),
                    actual: value.type_name(),
                },
            )
        })?;
        self.registry
            .resolve(wrapper)
            .map_err(|err| BridgeError::argument(index, err))
    }

    /// Array argument of native objects.
    pub fn sequence_arg<T: NativeObject>(&self, index: usize) -> BridgeResult<Vec<T>> {
        let value = self.arg_value(index)?;
        sequence_from_script(&*self.rt, &*self.registry, value).map_err(|err| BridgeError::argument(index, err))
    }

    /// Object argument of native objects keyed by name.
    pub fn map_arg<T: NativeObject>(&self, index: usize) -> BridgeResult<IndexMap<String, T>> {
        let value = self.arg_value(index)?;
        map_from_script(&*self.rt, &*self.registry, value).map_err(|err| BridgeError::argument(index, err))
    }

    /// Every argument from `first` on, as native objects.
    pub fn variadic<T: NativeObject>(&self, first: usize) -> BridgeResult<Vec<T>> {
        let rest = self.args.get(first..).unwrap_or_default();
        let mut out = Vec::with_capacity(rest.len());
        for (offset, arg) in rest.iter().enumerate() {
            let resolved = sequence_from_args(&*self.registry, std::slice::from_ref(arg))
                .map_err(|err| BridgeError::argument(first + offset, err))?;
            out.extend(resolved);
        }
        Ok(out)
    }

    /// Every argument from `first` on, as dynamic values.
    pub fn variadic_values(&self, first: usize) -> BridgeResult<Vec<HostValue>> {
        let rest = self.args.get(first..).unwrap_or_default();
        let mut out = Vec::with_capacity(rest.len());
        for (offset, arg) in rest.iter().enumerate() {
            let values = host_values_from_args(&*self.rt, std::slice::from_ref(arg))
                .map_err(|err| BridgeError::argument(first + offset, err))?;
            out.extend(values);
        }
        Ok(out)
    }

    /// Element data of a typed array argument, or of a plain array packed as `kind`.
    pub fn typed_array_arg(&self, index: usize, kind: TypedArrayKind) -> BridgeResult<TypedArrayData<'_>> {
        let value = self.arg_value(index)?;
        typed_array_data(&*self.rt, value, kind).map_err(|err| BridgeError::argument(index, err))
    }

    /// The receiver as a native object.
    pub fn this<T: NativeObject>(&self) -> BridgeResult<T> {
        let wrapper = self.this.as_object().ok_or_else(|| {
            BridgeError::invalid_this(format!("expected an object, got {}", self.this.type_name()))
        })?;
        self.registry
            .resolve(wrapper)
            .map_err(|err| BridgeError::invalid_this(err.to_string()))
    }

    /// The raw receiver.
    pub fn this_value(&self) -> &ScriptValue {
        &self.this
    }

    /// Set the return value.
    pub fn set_return<T: ToScript + ?Sized>(&mut self, value: &T) -> BridgeResult<()> {
        self.ret = value.to_script(&mut *self.rt)?;
        Ok(())
    }

    /// Return a native object through its wrapper, or `null`.
    pub fn set_return_native<T: NativeObject>(&mut self, object: Option<&T>) -> BridgeResult<()> {
        self.ret = match object {
            Some(object) => ScriptValue::Object(self.registry.get_or_create(&mut *self.rt, object)?),
            None => ScriptValue::Null,
        };
        Ok(())
    }

    /// Current return value.
    pub fn return_value(&self) -> &ScriptValue {
        &self.ret
    }

    /// Finish the call and take the return value.
    pub fn into_return(self) -> ScriptValue {
        self.ret
    }

    /// Access the runtime.
    pub fn runtime(&mut self) -> &mut R {
        &mut *self.rt
    }

    /// Access the registry.
    pub fn registry(&mut self) -> &mut ProxyRegistry {
        &mut *self.registry
    }
}
