//! Tagged script values and property keys.
//!
//! [`ScriptValue`] mirrors the value representation of a dynamic scripting
//! runtime: `null`, `undefined`, booleans, numbers, strings and object
//! references. Values are immutable from the bridge's point of view; objects
//! are referenced through [`ObjectHandle`]s and owned by the runtime.
//!
//! The coercion helpers follow the runtime's own abstract operations
//! (`ToNumber`, `ToBoolean`, `ToString` for primitives) so that native
//! conversions behave the way scripts expect.

use std::fmt;
use std::rc::Rc;

use crate::runtime::ObjectHandle;

/// A value owned by the scripting runtime.
#[derive(Clone, Default, PartialEq)]
pub enum ScriptValue {
    /// The `null` value
    Null,
    /// The `undefined` value
    #[default]
    Undefined,
    /// Boolean value
    Bool(bool),
    /// Numeric value (the runtime has a single double-precision number type)
    Number(f64),
    /// Immutable string value
    String(Rc<str>),
    /// Reference to a runtime-owned object
    Object(ObjectHandle),
}

impl ScriptValue {
    /// Get a human-readable name for this value's tag.
    pub fn type_name(&self) -> &'static str {
        match self {
            ScriptValue::Null => "null",
            ScriptValue::Undefined => "undefined",
            ScriptValue::Bool(_) => "boolean",
            ScriptValue::Number(_) => "number",
            ScriptValue::String(_) => "string",
            ScriptValue::Object(_) => "object",
        }
    }

    /// Create a string value.
    pub fn string(s: impl AsRef<str>) -> Self {
        ScriptValue::String(Rc::from(s.as_ref()))
    }

    /// Check for `null` or `undefined`.
    pub fn is_nullish(&self) -> bool {
        matches!(self, ScriptValue::Null | ScriptValue::Undefined)
    }

    /// Check for `undefined`.
    pub fn is_undefined(&self) -> bool {
        matches!(self, ScriptValue::Undefined)
    }

    /// Check for an object reference.
    pub fn is_object(&self) -> bool {
        matches!(self, ScriptValue::Object(_))
    }

    /// Get the object handle, if this is an object.
    pub fn as_object(&self) -> Option<ObjectHandle> {
        match self {
            ScriptValue::Object(handle) => Some(*handle),
            _ => None,
        }
    }

    /// Borrow the string contents, if this is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ScriptValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Apply `ToNumber` to a primitive.
    ///
    /// Returns `None` for objects: the bridge does not run script-side
    /// `valueOf` hooks, so objects are not numerically coercible.
    pub fn to_number(&self) -> Option<f64> {
        match self {
            ScriptValue::Null => Some(0.0),
            ScriptValue::Undefined => Some(f64::NAN),
            ScriptValue::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            ScriptValue::Number(n) => Some(*n),
            ScriptValue::String(s) => Some(string_to_number(s)),
            ScriptValue::Object(_) => None,
        }
    }

    /// Apply `ToBoolean`.
    pub fn to_boolean(&self) -> bool {
        match self {
            ScriptValue::Null | ScriptValue::Undefined => false,
            ScriptValue::Bool(b) => *b,
            ScriptValue::Number(n) => !(*n == 0.0 || n.is_nan()),
            ScriptValue::String(s) => !s.is_empty(),
            ScriptValue::Object(_) => true,
        }
    }

    /// Apply `ToString` to a primitive. Returns `None` for objects.
    pub fn to_display_string(&self) -> Option<String> {
        match self {
            ScriptValue::Null => Some("null".to_string()),
            ScriptValue::Undefined => Some("undefined".to_string()),
            ScriptValue::Bool(b) => Some(b.to_string()),
            ScriptValue::Number(n) => Some(number_to_string(*n)),
            ScriptValue::String(s) => Some(s.to_string()),
            ScriptValue::Object(_) => None,
        }
    }
}

impl fmt::Debug for ScriptValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScriptValue::Null => write!(f, "Null"),
            ScriptValue::Undefined => write!(f, "Undefined"),
            ScriptValue::Bool(v) => write!(f, "Bool({})", v),
            ScriptValue::Number(v) => write!(f, "Number({})", v),
            ScriptValue::String(s) => write!(f, "String({:?})", s),
            ScriptValue::Object(h) => write!(f, "Object({})", h),
        }
    }
}

impl From<bool> for ScriptValue {
    fn from(value: bool) -> Self {
        ScriptValue::Bool(value)
    }
}

impl From<f64> for ScriptValue {
    fn from(value: f64) -> Self {
        ScriptValue::Number(value)
    }
}

impl From<i32> for ScriptValue {
    fn from(value: i32) -> Self {
        ScriptValue::Number(f64::from(value))
    }
}

impl From<&str> for ScriptValue {
    fn from(value: &str) -> Self {
        ScriptValue::string(value)
    }
}

impl From<String> for ScriptValue {
    fn from(value: String) -> Self {
        ScriptValue::String(Rc::from(value))
    }
}

impl From<ObjectHandle> for ScriptValue {
    fn from(value: ObjectHandle) -> Self {
        ScriptValue::Object(value)
    }
}

/// `ToNumber` applied to a string.
fn string_to_number(s: &str) -> f64 {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return 0.0;
    }
    match trimmed {
        "Infinity" | "+Infinity" => return f64::INFINITY,
        "-Infinity" => return f64::NEG_INFINITY,
        _ => {}
    }
    let radix_digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .map(|digits| (16, digits))
        .or_else(|| {
            trimmed
                .strip_prefix("0o")
                .or_else(|| trimmed.strip_prefix("0O"))
                .map(|digits| (8, digits))
        })
        .or_else(|| {
            trimmed
                .strip_prefix("0b")
                .or_else(|| trimmed.strip_prefix("0B"))
                .map(|digits| (2, digits))
        });
    if let Some((radix, digits)) = radix_digits {
        return u64::from_str_radix(digits, radix)
            .map(|v| v as f64)
            .unwrap_or(f64::NAN);
    }
    // Rust accepts spellings like "inf" and "nan" that the runtime rejects.
    if trimmed
        .bytes()
        .any(|b| b.is_ascii_alphabetic() && b != b'e' && b != b'E')
    {
        return f64::NAN;
    }
    trimmed.parse::<f64>().unwrap_or(f64::NAN)
}

/// `ToString` applied to a number.
fn number_to_string(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        let s = if n > 0.0 { "Infinity" } else { "-Infinity" };
        s.to_string()
    } else if n == 0.0 {
        "0".to_string()
    } else {
        n.to_string()
    }
}

/// Key of an object property.
///
/// Array-index-like names are canonicalised to [`PropertyKey::Index`], the way
/// the runtime stores integer ids separately from string ids. Enumerating a
/// property written as `"3"` therefore yields an index key, not a name.
#[derive(Clone, PartialEq, Eq, Hash)]
pub enum PropertyKey {
    /// Integer-like key (`0 ..= u32::MAX - 1`)
    Index(u32),
    /// String key
    Name(Rc<str>),
}

impl PropertyKey {
    /// Create a key from a property name, canonicalising integer-like names.
    pub fn name(name: &str) -> Self {
        match parse_index(name) {
            Some(index) => PropertyKey::Index(index),
            None => PropertyKey::Name(Rc::from(name)),
        }
    }

    /// Create a key from an integer. `u32::MAX` is not an array index and
    /// becomes a string key.
    pub fn index(index: u32) -> Self {
        if index == u32::MAX {
            return PropertyKey::Name(Rc::from(index.to_string()));
        }
        PropertyKey::Index(index)
    }

    /// Borrow the string name, if this is a string key.
    pub fn as_name(&self) -> Option<&str> {
        match self {
            PropertyKey::Name(name) => Some(name),
            PropertyKey::Index(_) => None,
        }
    }

    /// Get the index, if this is an integer key.
    pub fn as_index(&self) -> Option<u32> {
        match self {
            PropertyKey::Index(index) => Some(*index),
            PropertyKey::Name(_) => None,
        }
    }

    /// Convert the key to the value the runtime reports during enumeration.
    pub fn to_value(&self) -> ScriptValue {
        match self {
            PropertyKey::Index(index) => ScriptValue::Number(f64::from(*index)),
            PropertyKey::Name(name) => ScriptValue::String(Rc::clone(name)),
        }
    }
}

impl fmt::Debug for PropertyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyKey::Index(index) => write!(f, "[{}]", index),
            PropertyKey::Name(name) => write!(f, "{:?}", name),
        }
    }
}

impl fmt::Display for PropertyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyKey::Index(index) => write!(f, "{}", index),
            PropertyKey::Name(name) => f.write_str(name),
        }
    }
}

impl From<&str> for PropertyKey {
    fn from(value: &str) -> Self {
        PropertyKey::name(value)
    }
}

impl From<String> for PropertyKey {
    fn from(value: String) -> Self {
        PropertyKey::name(&value)
    }
}

impl From<u32> for PropertyKey {
    fn from(value: u32) -> Self {
        PropertyKey::index(value)
    }
}

/// Parse a canonical array index: no sign, no leading zeros, below `u32::MAX`.
fn parse_index(name: &str) -> Option<u32> {
    if name.is_empty() || (name.len() > 1 && name.starts_with('0')) {
        return None;
    }
    if !name.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    name.parse::<u32>().ok().filter(|&index| index != u32::MAX)
}
