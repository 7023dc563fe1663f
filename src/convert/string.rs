//! Text conversions.

use std::ffi::{CStr, CString};

use scenebridge_core::{ScriptRuntime, ScriptValue};

use super::{FromScript, ToScript};
use crate::error::{BridgeResult, ConversionError};

/// `ToString` of a primitive. Objects are rejected.
impl FromScript for String {
    fn from_script<R>(_rt: &R, value: &ScriptValue) -> Result<Self, ConversionError>
    where
        R: ScriptRuntime + ?Sized,
    {
        value.to_display_string().ok_or(ConversionError::TypeMismatch {
            expected: "string",
            actual: value.type_name(),
        })
    }
}

impl ToScript for String {
    fn to_script<R>(&self, _rt: &mut R) -> BridgeResult<ScriptValue>
    where
        R: ScriptRuntime + ?Sized,
    {
        Ok(ScriptValue::string(self))
    }
}

impl ToScript for str {
    fn to_script<R>(&self, _rt: &mut R) -> BridgeResult<ScriptValue>
    where
        R: ScriptRuntime + ?Sized,
    {
        Ok(ScriptValue::string(self))
    }
}

/// Invalid UTF-8 is replaced, not rejected.
impl ToScript for CStr {
    fn to_script<R>(&self, _rt: &mut R) -> BridgeResult<ScriptValue>
    where
        R: ScriptRuntime + ?Sized,
    {
        Ok(ScriptValue::string(self.to_string_lossy()))
    }
}

impl ToScript for CString {
    fn to_script<R>(&self, rt: &mut R) -> BridgeResult<ScriptValue>
    where
        R: ScriptRuntime + ?Sized,
    {
        self.as_c_str().to_script(rt)
    }
}

/// Convert a native byte string.
///
/// `None` becomes `null`. Without a `length` the text ends at the first NUL;
/// with one, at most `length` bytes are taken.
pub fn c_string_to_script(bytes: Option<&[u8]>, length: Option<usize>) -> ScriptValue {
    let Some(bytes) = bytes else {
        return ScriptValue::Null;
    };
    let end = match length {
        Some(length) => length.min(bytes.len()),
        None => bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len()),
    };
    ScriptValue::string(String::from_utf8_lossy(&bytes[..end]))
}

#[cfg(test)]
mod tests {
    use scenebridge_core::HeapRuntime;

    use super::*;

    #[test]
    fn string_round_trip() {
        let mut rt = HeapRuntime::new();
        let value = "héllo".to_script(&mut rt).unwrap();
        assert_eq!(String::from_script(&rt, &value).unwrap(), "héllo");
    }

    #[test]
    fn primitives_stringify() {
        let rt = HeapRuntime::new();
        assert_eq!(String::from_script(&rt, &ScriptValue::Number(3.0)).unwrap(), "3");
        assert_eq!(String::from_script(&rt, &ScriptValue::Number(0.5)).unwrap(), "0.5");
        assert_eq!(String::from_script(&rt, &ScriptValue::Bool(false)).unwrap(), "false");
        assert_eq!(String::from_script(&rt, &ScriptValue::Null).unwrap(), "null");
        assert_eq!(
            String::from_script(&rt, &ScriptValue::Undefined).unwrap(),
            "undefined"
        );
    }

    #[test]
    fn objects_rejected() {
        let mut rt = HeapRuntime::new();
        let object = ScriptValue::Object(rt.new_object().unwrap());
        assert!(matches!(
            String::from_script(&rt, &object),
            Err(ConversionError::TypeMismatch {
                expected: "string",
                ..
            })
        ));
    }

    #[test]
    fn c_str_to_script() {
        let mut rt = HeapRuntime::new();
        let value = c"native".to_script(&mut rt).unwrap();
        assert_eq!(value.as_str(), Some("native"));
    }

    #[test]
    fn byte_strings() {
        assert_eq!(c_string_to_script(None, None), ScriptValue::Null);
        assert_eq!(
            c_string_to_script(Some(&b"abc\0def"[..]), None).as_str(),
            Some("abc")
        );
        assert_eq!(c_string_to_script(Some(&b"abcdef"[..]), Some(4)).as_str(), Some("abcd"));
        assert_eq!(c_string_to_script(Some(&b"ab"[..]), Some(10)).as_str(), Some("ab"));
        assert_eq!(c_string_to_script(Some(&b""[..]), None).as_str(), Some(""));
    }
}
