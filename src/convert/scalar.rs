//! Scalar conversions.
//!
//! Reading applies the runtime's `ToNumber` coercion and then narrows the way
//! the runtime itself does: modular wrap for 8, 16 and 32-bit integers,
//! truncation toward zero with saturation for 64-bit and size integers.
//! Only objects are rejected.
//!
//! 64-bit integers beyond the exactly representable range travel as decimal
//! strings so they survive a round trip.

use scenebridge_core::{ScriptRuntime, ScriptValue};

use super::{FromScript, ToScript};
use crate::error::{BridgeResult, ConversionError};

/// Largest integer magnitude an `f64` represents exactly (2^53).
const MAX_SAFE_INTEGER: i64 = 9_007_199_254_740_992;

const TWO_POW_32: f64 = 4_294_967_296.0;

/// `ToNumber`, rejecting objects.
pub(crate) fn coerce_number(value: &ScriptValue) -> Result<f64, ConversionError> {
    value.to_number().ok_or(ConversionError::TypeMismatch {
        expected: "number",
        actual: value.type_name(),
    })
}

/// `ToUint32`: truncate, then wrap modulo 2^32. NaN and infinities give 0.
pub(crate) fn to_uint32(n: f64) -> u32 {
    if !n.is_finite() {
        return 0;
    }
    n.trunc().rem_euclid(TWO_POW_32) as u32
}

// ============================================================================
// Modular integers
// ============================================================================

macro_rules! impl_script_modular_int {
    ($($ty:ty),*) => {
        $(
            impl FromScript for $ty {
                fn from_script<R>(_rt: &R, value: &ScriptValue) -> Result<Self, ConversionError>
                where
                    R: ScriptRuntime + ?Sized,
                {
                    // Low bits of ToUint32 give ToInt32, ToUint16 and ToUint8.
                    Ok(to_uint32(coerce_number(value)?) as $ty)
                }
            }

            impl ToScript for $ty {
                fn to_script<R>(&self, _rt: &mut R) -> BridgeResult<ScriptValue>
                where
                    R: ScriptRuntime + ?Sized,
                {
                    Ok(ScriptValue::Number(f64::from(*self)))
                }
            }
        )*
    };
}

impl_script_modular_int!(i32, u32, u16, u8);

// ============================================================================
// 64-bit integers
// ============================================================================

impl FromScript for i64 {
    fn from_script<R>(_rt: &R, value: &ScriptValue) -> Result<Self, ConversionError>
    where
        R: ScriptRuntime + ?Sized,
    {
        if let Some(text) = value.as_str()
            && let Ok(exact) = text.trim().parse::<i64>()
        {
            return Ok(exact);
        }
        // `as` truncates toward zero, saturates, and maps NaN to 0.
        Ok(coerce_number(value)? as i64)
    }
}

impl ToScript for i64 {
    fn to_script<R>(&self, _rt: &mut R) -> BridgeResult<ScriptValue>
    where
        R: ScriptRuntime + ?Sized,
    {
        if (-MAX_SAFE_INTEGER..=MAX_SAFE_INTEGER).contains(self) {
            Ok(ScriptValue::Number(*self as f64))
        } else {
            Ok(ScriptValue::string(self.to_string()))
        }
    }
}

impl FromScript for u64 {
    fn from_script<R>(_rt: &R, value: &ScriptValue) -> Result<Self, ConversionError>
    where
        R: ScriptRuntime + ?Sized,
    {
        if let Some(text) = value.as_str()
            && let Ok(exact) = text.trim().parse::<u64>()
        {
            return Ok(exact);
        }
        Ok(coerce_number(value)? as u64)
    }
}

impl ToScript for u64 {
    fn to_script<R>(&self, _rt: &mut R) -> BridgeResult<ScriptValue>
    where
        R: ScriptRuntime + ?Sized,
    {
        if *self <= MAX_SAFE_INTEGER as u64 {
            Ok(ScriptValue::Number(*self as f64))
        } else {
            Ok(ScriptValue::string(self.to_string()))
        }
    }
}

/// Size and index values. Negative values such as `-1` ("not found") are kept.
impl FromScript for isize {
    fn from_script<R>(rt: &R, value: &ScriptValue) -> Result<Self, ConversionError>
    where
        R: ScriptRuntime + ?Sized,
    {
        let wide = i64::from_script(rt, value)?;
        Ok(wide.clamp(isize::MIN as i64, isize::MAX as i64) as isize)
    }
}

impl ToScript for isize {
    fn to_script<R>(&self, rt: &mut R) -> BridgeResult<ScriptValue>
    where
        R: ScriptRuntime + ?Sized,
    {
        (*self as i64).to_script(rt)
    }
}

// ============================================================================
// Floating point and boolean
// ============================================================================

impl FromScript for f64 {
    fn from_script<R>(_rt: &R, value: &ScriptValue) -> Result<Self, ConversionError>
    where
        R: ScriptRuntime + ?Sized,
    {
        coerce_number(value)
    }
}

impl ToScript for f64 {
    fn to_script<R>(&self, _rt: &mut R) -> BridgeResult<ScriptValue>
    where
        R: ScriptRuntime + ?Sized,
    {
        Ok(ScriptValue::Number(*self))
    }
}

impl FromScript for f32 {
    fn from_script<R>(_rt: &R, value: &ScriptValue) -> Result<Self, ConversionError>
    where
        R: ScriptRuntime + ?Sized,
    {
        Ok(coerce_number(value)? as f32)
    }
}

impl ToScript for f32 {
    fn to_script<R>(&self, _rt: &mut R) -> BridgeResult<ScriptValue>
    where
        R: ScriptRuntime + ?Sized,
    {
        Ok(ScriptValue::Number(f64::from(*self)))
    }
}

/// `ToBoolean`; never fails.
impl FromScript for bool {
    fn from_script<R>(_rt: &R, value: &ScriptValue) -> Result<Self, ConversionError>
    where
        R: ScriptRuntime + ?Sized,
    {
        Ok(value.to_boolean())
    }
}

impl ToScript for bool {
    fn to_script<R>(&self, _rt: &mut R) -> BridgeResult<ScriptValue>
    where
        R: ScriptRuntime + ?Sized,
    {
        Ok(ScriptValue::Bool(*self))
    }
}
