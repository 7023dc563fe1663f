//! Raw element data of typed arrays.
//!
//! Native APIs that upload vertex or pixel data want a contiguous buffer and
//! an element count. A typed array hands over its own storage; a plain array
//! of numbers is packed into a fresh buffer of the requested kind.

use std::borrow::Cow;

use scenebridge_core::{ScriptRuntime, ScriptValue, TypedArrayKind};

use super::scalar::{coerce_number, to_uint32};
use super::{capacity_hint, object_handle};
use crate::error::ConversionError;

/// Element data of a typed array, borrowed from the runtime when possible.
#[derive(Clone, Debug, PartialEq)]
pub struct TypedArrayData<'a> {
    pub kind: TypedArrayKind,
    pub bytes: Cow<'a, [u8]>,
}

impl TypedArrayData<'_> {
    /// Number of elements.
    pub fn count(&self) -> usize {
        self.bytes.len() / self.kind.element_size()
    }

    /// Whether the bytes are the runtime's own storage.
    pub fn is_borrowed(&self) -> bool {
        matches!(self.bytes, Cow::Borrowed(_))
    }

    /// Elements widened to `f64`, in order.
    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.bytes
            .chunks_exact(self.kind.element_size())
            .map(|chunk| decode(self.kind, chunk))
    }
}

/// The data behind any typed array view, whatever its element kind.
pub fn array_buffer_view_data<'a, R>(
    rt: &'a R,
    value: &ScriptValue,
) -> Result<TypedArrayData<'a>, ConversionError>
where
    R: ScriptRuntime + ?Sized,
{
    let object = object_handle(value, "typed array")?;
    let (kind, bytes) = rt.typed_array(object).ok_or(ConversionError::TypeMismatch {
        expected: "typed array",
        actual: "object",
    })?;
    Ok(TypedArrayData {
        kind,
        bytes: Cow::Borrowed(bytes),
    })
}

/// The data of a typed array of `kind`.
///
/// A typed array of another kind is a mismatch. A plain array is packed
/// element by element with the typed array store conversions.
#[cfg_attr(feature = "profiling", profiling::function)]
pub fn typed_array_data<'a, R>(
    rt: &'a R,
    value: &ScriptValue,
    kind: TypedArrayKind,
) -> Result<TypedArrayData<'a>, ConversionError>
where
    R: ScriptRuntime + ?Sized,
{
    let object = object_handle(value, kind.name())?;
    if let Some((actual, bytes)) = rt.typed_array(object) {
        if actual != kind {
            return Err(ConversionError::TypeMismatch {
                expected: kind.name(),
                actual: actual.name(),
            });
        }
        return Ok(TypedArrayData {
            kind,
            bytes: Cow::Borrowed(bytes),
        });
    }
    if !rt.is_array(object) {
        return Err(ConversionError::TypeMismatch {
            expected: kind.name(),
            actual: "object",
        });
    }

    let length = rt.array_length(object)?;
    let mut bytes = Vec::with_capacity(capacity_hint(length) * kind.element_size());
    for index in 0..length {
        let element = rt.get_element(object, index)?;
        encode(kind, coerce_number(&element)?, &mut bytes);
    }
    Ok(TypedArrayData {
        kind,
        bytes: Cow::Owned(bytes),
    })
}

fn encode(kind: TypedArrayKind, n: f64, out: &mut Vec<u8>) {
    match kind {
        TypedArrayKind::Int8 => out.extend_from_slice(&(to_uint32(n) as i8).to_ne_bytes()),
        TypedArrayKind::Uint8 => out.push(to_uint32(n) as u8),
        TypedArrayKind::Uint8Clamped => {
            let clamped = if n.is_nan() {
                0.0
            } else {
                n.clamp(0.0, 255.0).round_ties_even()
            };
            out.push(clamped as u8);
        }
        TypedArrayKind::Int16 => out.extend_from_slice(&(to_uint32(n) as i16).to_ne_bytes()),
        TypedArrayKind::Uint16 => out.extend_from_slice(&(to_uint32(n) as u16).to_ne_bytes()),
        TypedArrayKind::Int32 => out.extend_from_slice(&(to_uint32(n) as i32).to_ne_bytes()),
        TypedArrayKind::Uint32 => out.extend_from_slice(&to_uint32(n).to_ne_bytes()),
        TypedArrayKind::Float32 => out.extend_from_slice(&(n as f32).to_ne_bytes()),
        TypedArrayKind::Float64 => out.extend_from_slice(&n.to_ne_bytes()),
    }
}

/// `chunk` holds exactly one element.
fn decode(kind: TypedArrayKind, chunk: &[u8]) -> f64 {
    match kind {
        TypedArrayKind::Int8 => f64::from(i8::from_ne_bytes(take(chunk))),
        TypedArrayKind::Uint8 | TypedArrayKind::Uint8Clamped => f64::from(chunk[0]),
        TypedArrayKind::Int16 => f64::from(i16::from_ne_bytes(take(chunk))),
        TypedArrayKind::Uint16 => f64::from(u16::from_ne_bytes(take(chunk))),
        TypedArrayKind::Int32 => f64::from(i32::from_ne_bytes(take(chunk))),
        TypedArrayKind::Uint32 => f64::from(u32::from_ne_bytes(take(chunk))),
        TypedArrayKind::Float32 => f64::from(f32::from_ne_bytes(take(chunk))),
        TypedArrayKind::Float64 => f64::from_ne_bytes(take(chunk)),
    }
}

fn take<const N: usize>(chunk: &[u8]) -> [u8; N] {
    let mut out = [0u8; N];
    out.copy_from_slice(&chunk[..N]);
    out
}

#[cfg(test)]
mod tests {
    use scenebridge_core::HeapRuntime;

    use super::*;

    fn float32_bytes(values: &[f32]) -> Vec<u8> {
        values.iter().flat_map(|v| v.to_ne_bytes()).collect()
    }

    #[test]
    fn typed_array_is_borrowed() {
        let mut rt = HeapRuntime::new();
        let view = rt
            .new_typed_array(TypedArrayKind::Float32, float32_bytes(&[0.5, 1.0, -3.0]))
            .unwrap();

        let data = typed_array_data(&rt, &ScriptValue::Object(view), TypedArrayKind::Float32).unwrap();
        assert!(data.is_borrowed());
        assert_eq!(data.count(), 3);
        assert_eq!(data.values().collect::<Vec<_>>(), vec![0.5, 1.0, -3.0]);
    }

    #[test]
    fn kind_mismatch() {
        let mut rt = HeapRuntime::new();
        let view = rt.new_typed_array(TypedArrayKind::Uint8, vec![1, 2]).unwrap();
        let err = typed_array_data(&rt, &ScriptValue::Object(view), TypedArrayKind::Float32).unwrap_err();
        assert!(matches!(
            err,
            ConversionError::TypeMismatch {
                expected: "Float32Array",
                actual: "Uint8Array"
            }
        ));
    }

    #[test]
    fn plain_array_is_packed() {
        let mut rt = HeapRuntime::new();
        let array = rt
            .array_from([
                ScriptValue::Number(300.0),
                ScriptValue::Number(-1.0),
                ScriptValue::string("7"),
            ])
            .unwrap();
        let value = ScriptValue::Object(array);

        let data = typed_array_data(&rt, &value, TypedArrayKind::Uint8).unwrap();
        assert!(!data.is_borrowed());
        assert_eq!(data.bytes.as_ref(), &[44, 255, 7]);

        let data = typed_array_data(&rt, &value, TypedArrayKind::Uint8Clamped).unwrap();
        assert_eq!(data.bytes.as_ref(), &[255, 0, 7]);

        let data = typed_array_data(&rt, &value, TypedArrayKind::Int16).unwrap();
        assert_eq!(data.count(), 3);
        assert_eq!(data.values().collect::<Vec<_>>(), vec![300.0, -1.0, 7.0]);
    }

    #[test]
    fn clamped_rounds_half_to_even() {
        let mut rt = HeapRuntime::new();
        let array = rt
            .array_from([ScriptValue::Number(2.5), ScriptValue::Number(3.5), ScriptValue::Number(f64::NAN)])
            .unwrap();
        let data = typed_array_data(&rt, &ScriptValue::Object(array), TypedArrayKind::Uint8Clamped).unwrap();
        assert_eq!(data.bytes.as_ref(), &[2, 4, 0]);
    }

    #[test]
    fn non_arrays_rejected() {
        let mut rt = HeapRuntime::new();
        let object = rt.new_object().unwrap();
        assert!(matches!(
            typed_array_data(&rt, &ScriptValue::Object(object), TypedArrayKind::Int32),
            Err(ConversionError::TypeMismatch { actual: "object", .. })
        ));
        assert!(matches!(
            typed_array_data(&rt, &ScriptValue::Number(1.0), TypedArrayKind::Int32),
            Err(ConversionError::NotAnObject { .. })
        ));

        let inner = rt.new_object().unwrap();
        let array = rt.array_from([ScriptValue::Object(inner)]).unwrap();
        assert!(matches!(
            typed_array_data(&rt, &ScriptValue::Object(array), TypedArrayKind::Int32),
            Err(ConversionError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn any_view() {
        let mut rt = HeapRuntime::new();
        let view = rt
            .new_typed_array(TypedArrayKind::Int32, (-5i32).to_ne_bytes().to_vec())
            .unwrap();
        let data = array_buffer_view_data(&rt, &ScriptValue::Object(view)).unwrap();
        assert_eq!(data.kind, TypedArrayKind::Int32);
        assert_eq!(data.values().collect::<Vec<_>>(), vec![-5.0]);

        let array = rt.new_array().unwrap();
        assert!(matches!(
            array_buffer_view_data(&rt, &ScriptValue::Object(array)),
            Err(ConversionError::TypeMismatch {
                expected: "typed array",
                ..
            })
        ));
    }
}
