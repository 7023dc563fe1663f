//! Fixed-shape compound values.
//!
//! Each shape is a plain object with named numeric fields. Reading requires an
//! object whose fields are all present and numerically coercible; writing
//! always builds a fresh object with every field set.

use scenebridge_core::{ObjectHandle, ScriptRuntime, ScriptValue};

use super::scalar::{coerce_number, to_uint32};
use super::{FromScript, ToScript, array_handle, object_handle};
use crate::error::{BridgeResult, ConversionError};

/// A numeric field of a compound shape.
trait BagField: Sized {
    fn from_number(number: f64, shape: &'static str, field: &'static str) -> Result<Self, ConversionError>;

    fn to_value(&self) -> ScriptValue;
}

impl BagField for f32 {
    fn from_number(number: f64, _shape: &'static str, _field: &'static str) -> Result<Self, ConversionError> {
        Ok(number as f32)
    }

    fn to_value(&self) -> ScriptValue {
        ScriptValue::Number(f64::from(*self))
    }
}

impl BagField for f64 {
    fn from_number(number: f64, _shape: &'static str, _field: &'static str) -> Result<Self, ConversionError> {
        Ok(number)
    }

    fn to_value(&self) -> ScriptValue {
        ScriptValue::Number(*self)
    }
}

impl BagField for u32 {
    fn from_number(number: f64, _shape: &'static str, _field: &'static str) -> Result<Self, ConversionError> {
        Ok(to_uint32(number))
    }

    fn to_value(&self) -> ScriptValue {
        ScriptValue::Number(f64::from(*self))
    }
}

/// Colour bytes must lie in `0..=255`.
impl BagField for u8 {
    fn from_number(number: f64, shape: &'static str, field: &'static str) -> Result<Self, ConversionError> {
        if !(0.0..=255.0).contains(&number) {
            return Err(ConversionError::OutOfRange {
                shape,
                field,
                value: number,
            });
        }
        Ok(number as u8)
    }

    fn to_value(&self) -> ScriptValue {
        ScriptValue::Number(f64::from(*self))
    }
}

/// Read one field. `undefined` counts as missing; a value that coerces to NaN
/// is only accepted when it already is a number.
fn read_field<T, R>(
    rt: &R,
    object: ObjectHandle,
    shape: &'static str,
    field: &'static str,
) -> Result<T, ConversionError>
where
    T: BagField,
    R: ScriptRuntime + ?Sized,
{
    let value = rt.get_named(object, field)?;
    if value.is_undefined() {
        return Err(ConversionError::MissingField { shape, field });
    }
    let number = coerce_number(&value)?;
    if number.is_nan() && !matches!(value, ScriptValue::Number(_)) {
        return Err(ConversionError::TypeMismatch {
            expected: "number",
            actual: value.type_name(),
        });
    }
    T::from_number(number, shape, field)
}

macro_rules! property_bag {
    (
        $(#[$meta:meta])*
        $name:ident { $($field:ident : $ty:ty),* $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, Default, PartialEq)]
        pub struct $name {
            $(pub $field: $ty,)*
        }

        impl $name {
            pub const fn new($($field: $ty),*) -> Self {
                Self { $($field),* }
            }
        }

        impl FromScript for $name {
            #[cfg_attr(feature = "profiling", profiling::function)]
            fn from_script<R>(rt: &R, value: &ScriptValue) -> Result<Self, ConversionError>
            where
                R: ScriptRuntime + ?Sized,
            {
                let object = object_handle(value, stringify!($name))?;
                Ok(Self {
                    $($field: read_field(rt, object, stringify!($name), stringify!($field))?,)*
                })
            }
        }

        impl ToScript for $name {
            fn to_script<R>(&self, rt: &mut R) -> BridgeResult<ScriptValue>
            where
                R: ScriptRuntime + ?Sized,
            {
                let object = rt.new_object()?;
                $(rt.set_named(object, stringify!($field), self.$field.to_value())?;)*
                Ok(ScriptValue::Object(object))
            }
        }
    };
}

property_bag! {
    /// 2D vector or point: `{x, y}`.
    Vec2 { x: f32, y: f32 }
}

/// Points share the vector wire shape.
pub type Point = Vec2;

property_bag! {
    /// `{x, y, z}`
    Vec3 { x: f32, y: f32, z: f32 }
}

property_bag! {
    /// `{width, height}`
    Size { width: f32, height: f32 }
}

property_bag! {
    /// Axis-aligned rectangle: `{x, y, width, height}`.
    Rect { x: f32, y: f32, width: f32, height: f32 }
}

property_bag! {
    /// Byte colour `{r, g, b}`; each channel must be in `0..=255`.
    Color3B { r: u8, g: u8, b: u8 }
}

property_bag! {
    /// Byte colour with alpha `{r, g, b, a}`; each channel must be in `0..=255`.
    Color4B { r: u8, g: u8, b: u8, a: u8 }
}

property_bag! {
    /// Float colour `{r, g, b, a}`. Channels are not range checked.
    Color4F { r: f32, g: f32, b: f32, a: f32 }
}

property_bag! {
    /// 2D affine transform `{a, b, c, d, tx, ty}`.
    AffineTransform { a: f32, b: f32, c: f32, d: f32, tx: f32, ty: f32 }
}

property_bag! {
    /// Blend factors `{src, dst}`.
    BlendFunc { src: u32, dst: u32 }
}

property_bag! {
    /// Accelerometer sample `{x, y, z, timestamp}`.
    Acceleration { x: f64, y: f64, z: f64, timestamp: f64 }
}

impl Color3B {
    pub const WHITE: Color3B = Color3B::new(255, 255, 255);
}

impl Color4B {
    pub const WHITE: Color4B = Color4B::new(255, 255, 255, 255);
}

// ============================================================================
// Matrix
// ============================================================================

const MAT4_INDICES: [&str; 16] = [
    "0", "1", "2", "3", "4", "5", "6", "7", "8", "9", "10", "11", "12", "13", "14", "15",
];

/// Column-major 4x4 matrix, carried as an array of 16 numbers.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Mat4 {
    pub m: [f32; 16],
}

impl Mat4 {
    pub const IDENTITY: Mat4 = Mat4 {
        m: [
            1.0, 0.0, 0.0, 0.0, //
            0.0, 1.0, 0.0, 0.0, //
            0.0, 0.0, 1.0, 0.0, //
            0.0, 0.0, 0.0, 1.0,
        ],
    };

    pub const fn new(m: [f32; 16]) -> Self {
        Self { m }
    }
}

impl Default for Mat4 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl FromScript for Mat4 {
    fn from_script<R>(rt: &R, value: &ScriptValue) -> Result<Self, ConversionError>
    where
        R: ScriptRuntime + ?Sized,
    {
        let array = array_handle(rt, value, "Mat4")?;
        let mut m = [0.0f32; 16];
        for (slot, field) in m.iter_mut().zip(MAT4_INDICES) {
            *slot = read_field(rt, array, "Mat4", field)?;
        }
        Ok(Self { m })
    }
}

impl ToScript for Mat4 {
    fn to_script<R>(&self, rt: &mut R) -> BridgeResult<ScriptValue>
    where
        R: ScriptRuntime + ?Sized,
    {
        self.m.as_slice().to_script(rt)
    }
}

// ============================================================================
// Colour opacity
// ============================================================================

/// The alpha channel of a colour object, if it has one.
///
/// Works on any colour shape: `Color3B` values have no `a` and yield `None`.
pub fn color_opacity<R>(rt: &R, value: &ScriptValue) -> Result<Option<i32>, ConversionError>
where
    R: ScriptRuntime + ?Sized,
{
    let object = object_handle(value, "color")?;
    let alpha = rt.get_named(object, "a")?;
    if alpha.is_undefined() {
        return Ok(None);
    }
    i32::from_script(rt, &alpha).map(Some)
}
