//! Conversion traits between native values and script values.
//!
//! - [`FromScript`]: read a native value out of a [`ScriptValue`]
//! - [`ToScript`]: build a [`ScriptValue`] from a native value
//!
//! ## Supported shapes
//!
//! - Scalars: `i32`, `i64`, `isize`, `u8`, `u16`, `u32`, `u64`, `f32`, `f64`, `bool`
//! - Text: `String`, `str`, `CStr`
//! - Compounds: [`Vec2`] (alias [`Point`]), [`Vec3`], [`Size`], [`Rect`],
//!   [`Color3B`], [`Color4B`], [`Color4F`], [`AffineTransform`], [`Mat4`],
//!   [`BlendFunc`], [`Acceleration`], [`FontDefinition`]
//! - Value sequences: `Vec<T>` and `[T]`
//! - Typed array data: [`typed_array_data`], [`array_buffer_view_data`]
//! - Dynamic values: [`HostValue`], [`host_values_from_args`]
//!
//! Sequences and maps of native objects need the proxy registry and live in
//! [`containers`](crate::containers).
//!
//! ## Example
//!
//! ```
//! use scenebridge::convert::{FromScript, ToScript, Vec2};
//! use scenebridge_core::HeapRuntime;
//!
//! let mut rt = HeapRuntime::new();
//! let value = Vec2::new(1.5, -2.0).to_script(&mut rt).unwrap();
//! let back = Vec2::from_script(&rt, &value).unwrap();
//! assert_eq!(back, Vec2::new(1.5, -2.0));
//! ```

mod compound;
mod font;
mod host_value;
mod scalar;
mod string;
mod typed_array;

pub use compound::{
    Acceleration, AffineTransform, BlendFunc, Color3B, Color4B, Color4F, Mat4, Point, Rect, Size,
    Vec2, Vec3, color_opacity,
};
pub use font::{DEFAULT_FONT_NAME, DEFAULT_FONT_SIZE, FontDefinition, FontShadow, FontStroke};
pub use host_value::{HostValue, MAX_DEPTH, host_values_from_args, int_key_map_from_script};
pub use string::c_string_to_script;
pub use typed_array::{TypedArrayData, array_buffer_view_data, typed_array_data};

use scenebridge_core::{ScriptRuntime, ScriptValue};

use crate::error::{BridgeResult, ConversionError};

/// Read a native value from a script value.
///
/// Conversions only read the runtime; a failure leaves no trace.
pub trait FromScript: Sized {
    fn from_script<R>(rt: &R, value: &ScriptValue) -> Result<Self, ConversionError>
    where
        R: ScriptRuntime + ?Sized;
}

/// Build a script value from a native value.
///
/// Fails only when the runtime cannot allocate.
pub trait ToScript {
    fn to_script<R>(&self, rt: &mut R) -> BridgeResult<ScriptValue>
    where
        R: ScriptRuntime + ?Sized;
}

impl<T: ToScript + ?Sized> ToScript for &T {
    fn to_script<R>(&self, rt: &mut R) -> BridgeResult<ScriptValue>
    where
        R: ScriptRuntime + ?Sized,
    {
        (**self).to_script(rt)
    }
}

impl FromScript for ScriptValue {
    fn from_script<R>(_rt: &R, value: &ScriptValue) -> Result<Self, ConversionError>
    where
        R: ScriptRuntime + ?Sized,
    {
        Ok(value.clone())
    }
}

impl ToScript for ScriptValue {
    fn to_script<R>(&self, _rt: &mut R) -> BridgeResult<ScriptValue>
    where
        R: ScriptRuntime + ?Sized,
    {
        Ok(self.clone())
    }
}

impl<T: ToScript> ToScript for Option<T> {
    fn to_script<R>(&self, rt: &mut R) -> BridgeResult<ScriptValue>
    where
        R: ScriptRuntime + ?Sized,
    {
        match self {
            Some(value) => value.to_script(rt),
            None => Ok(ScriptValue::Null),
        }
    }
}

impl<T: FromScript> FromScript for Option<T> {
    fn from_script<R>(rt: &R, value: &ScriptValue) -> Result<Self, ConversionError>
    where
        R: ScriptRuntime + ?Sized,
    {
        if value.is_nullish() {
            return Ok(None);
        }
        T::from_script(rt, value).map(Some)
    }
}

impl ToScript for () {
    fn to_script<R>(&self, _rt: &mut R) -> BridgeResult<ScriptValue>
    where
        R: ScriptRuntime + ?Sized,
    {
        Ok(ScriptValue::Undefined)
    }
}

/// Value sequences: null and undefined read as empty; anything else must be
/// an array.
impl<T: FromScript> FromScript for Vec<T> {
    fn from_script<R>(rt: &R, value: &ScriptValue) -> Result<Self, ConversionError>
    where
        R: ScriptRuntime + ?Sized,
    {
        if value.is_nullish() {
            return Ok(Vec::new());
        }
        let array = array_handle(rt, value, "sequence")?;
        let length = rt.array_length(array)?;
        let mut out = Vec::with_capacity(capacity_hint(length));
        for index in 0..length {
            let element = rt.get_element(array, index)?;
            out.push(T::from_script(rt, &element)?);
        }
        Ok(out)
    }
}

impl<T: ToScript> ToScript for [T] {
    fn to_script<R>(&self, rt: &mut R) -> BridgeResult<ScriptValue>
    where
        R: ScriptRuntime + ?Sized,
    {
        let array = rt.new_array()?;
        for (index, item) in self.iter().enumerate() {
            let value = item.to_script(rt)?;
            rt.set_element(array, index as u32, value)?;
        }
        Ok(ScriptValue::Object(array))
    }
}

impl<T: ToScript> ToScript for Vec<T> {
    fn to_script<R>(&self, rt: &mut R) -> BridgeResult<ScriptValue>
    where
        R: ScriptRuntime + ?Sized,
    {
        self.as_slice().to_script(rt)
    }
}

/// Most elements reserved up front for a script array.
const PREALLOCATE_LIMIT: u32 = 1024;

/// Capacity to reserve for an array of `length` elements. Sparse arrays can
/// report a length far beyond what they hold.
pub(crate) fn capacity_hint(length: u32) -> usize {
    length.min(PREALLOCATE_LIMIT) as usize
}

/// Require `value` to be an array object.
pub(crate) fn array_handle<R>(
    rt: &R,
    value: &ScriptValue,
    expected: &'static str,
) -> Result<scenebridge_core::ObjectHandle, ConversionError>
where
    R: ScriptRuntime + ?Sized,
{
    let object = object_handle(value, expected)?;
    if !rt.is_array(object) {
        return Err(ConversionError::NotAnArray { expected });
    }
    Ok(object)
}

/// Require `value` to be an object.
pub(crate) fn object_handle(
    value: &ScriptValue,
    expected: &'static str,
) -> Result<scenebridge_core::ObjectHandle, ConversionError> {
    value.as_object().ok_or(ConversionError::NotAnObject {
        expected,
        actual: value.type_name(),
    })
}
