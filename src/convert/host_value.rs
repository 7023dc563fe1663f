//! Dynamically typed host values.

use indexmap::IndexMap;
use scenebridge_core::{ObjectHandle, PropertyKey, ScriptRuntime, ScriptValue};

use super::typed_array::array_buffer_view_data;
use super::{FromScript, ToScript, capacity_hint, object_handle};
use crate::error::{BridgeResult, ConversionError};

/// Deepest nesting accepted when reading a script value. Cyclic script
/// objects hit this limit instead of recursing forever.
pub const MAX_DEPTH: usize = 64;

/// A JSON-like value owned by the host.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum HostValue {
    #[default]
    Null,
    Bool(bool),
    Int(i32),
    Float(f32),
    Double(f64),
    String(String),
    Vector(Vec<HostValue>),
    Map(IndexMap<String, HostValue>),
    IntKeyMap(IndexMap<i32, HostValue>),
}

impl HostValue {
    pub fn type_name(&self) -> &'static str {
        match self {
            HostValue::Null => "null",
            HostValue::Bool(_) => "bool",
            HostValue::Int(_) => "int",
            HostValue::Float(_) => "float",
            HostValue::Double(_) => "double",
            HostValue::String(_) => "string",
            HostValue::Vector(_) => "vector",
            HostValue::Map(_) => "map",
            HostValue::IntKeyMap(_) => "int_key_map",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, HostValue::Null)
    }

    /// Numeric view of any numeric variant.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            HostValue::Int(v) => Some(f64::from(*v)),
            HostValue::Float(v) => Some(f64::from(*v)),
            HostValue::Double(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            HostValue::String(s) => Some(s),
            _ => None,
        }
    }

    fn read<R>(rt: &R, value: &ScriptValue, depth: usize) -> Result<Self, ConversionError>
    where
        R: ScriptRuntime + ?Sized,
    {
        match value {
            ScriptValue::Null | ScriptValue::Undefined => Ok(HostValue::Null),
            ScriptValue::Bool(b) => Ok(HostValue::Bool(*b)),
            ScriptValue::Number(n) => Ok(HostValue::Double(*n)),
            ScriptValue::String(s) => Ok(HostValue::String(s.to_string())),
            ScriptValue::Object(object) => {
                if depth >= MAX_DEPTH {
                    return Err(ConversionError::NestingTooDeep { limit: MAX_DEPTH });
                }
                if let Some(class) = rt.wrapper_class(*object) {
                    return Err(ConversionError::TypeMismatch {
                        expected: "plain value",
                        actual: class.name(),
                    });
                }
                if rt.is_callable(*object) {
                    return Err(ConversionError::TypeMismatch {
                        expected: "plain value",
                        actual: "function",
                    });
                }
                if rt.typed_array(*object).is_some() {
                    let data = array_buffer_view_data(rt, value)?;
                    return Ok(HostValue::Vector(data.values().map(HostValue::Double).collect()));
                }
                if rt.is_array(*object) {
                    read_vector(rt, *object, depth + 1).map(HostValue::Vector)
                } else {
                    read_map(rt, *object, depth + 1).map(HostValue::Map)
                }
            }
        }
    }
}

fn read_vector<R>(rt: &R, array: ObjectHandle, depth: usize) -> Result<Vec<HostValue>, ConversionError>
where
    R: ScriptRuntime + ?Sized,
{
    let length = rt.array_length(array)?;
    let mut out = Vec::with_capacity(capacity_hint(length));
    for index in 0..length {
        let element = rt.get_element(array, index)?;
        out.push(HostValue::read(rt, &element, depth)?);
    }
    Ok(out)
}

/// Index keys are kept under their decimal spelling.
fn read_map<R>(
    rt: &R,
    object: ObjectHandle,
    depth: usize,
) -> Result<IndexMap<String, HostValue>, ConversionError>
where
    R: ScriptRuntime + ?Sized,
{
    let keys = rt.own_keys(object)?;
    let mut out = IndexMap::with_capacity(keys.len());
    for key in keys {
        let value = rt.get_property(object, &key)?;
        out.insert(key.to_string(), HostValue::read(rt, &value, depth)?);
    }
    Ok(out)
}

impl FromScript for HostValue {
    #[cfg_attr(feature = "profiling", profiling::function)]
    fn from_script<R>(rt: &R, value: &ScriptValue) -> Result<Self, ConversionError>
    where
        R: ScriptRuntime + ?Sized,
    {
        HostValue::read(rt, value, 0)
    }
}

impl ToScript for HostValue {
    fn to_script<R>(&self, rt: &mut R) -> BridgeResult<ScriptValue>
    where
        R: ScriptRuntime + ?Sized,
    {
        match self {
            HostValue::Null => Ok(ScriptValue::Null),
            HostValue::Bool(b) => Ok(ScriptValue::Bool(*b)),
            HostValue::Int(v) => Ok(ScriptValue::Number(f64::from(*v))),
            HostValue::Float(v) => Ok(ScriptValue::Number(f64::from(*v))),
            HostValue::Double(v) => Ok(ScriptValue::Number(*v)),
            HostValue::String(s) => Ok(ScriptValue::string(s)),
            HostValue::Vector(items) => items.to_script(rt),
            HostValue::Map(entries) => {
                let object = rt.new_object()?;
                for (key, value) in entries {
                    let value = value.to_script(rt)?;
                    rt.set_property(object, PropertyKey::name(key), value)?;
                }
                Ok(ScriptValue::Object(object))
            }
            HostValue::IntKeyMap(entries) => {
                let object = rt.new_object()?;
                for (key, value) in entries {
                    let value = value.to_script(rt)?;
                    rt.set_property(object, PropertyKey::name(&key.to_string()), value)?;
                }
                Ok(ScriptValue::Object(object))
            }
        }
    }
}

/// Read each variadic call argument as a [`HostValue`].
pub fn host_values_from_args<R>(rt: &R, args: &[ScriptValue]) -> Result<Vec<HostValue>, ConversionError>
where
    R: ScriptRuntime + ?Sized,
{
    args.iter().map(|arg| HostValue::from_script(rt, arg)).collect()
}

/// Read an object whose keys are integers.
///
/// `null` and `undefined` read as an empty map. Keys that are not integers in
/// `i32` range are skipped.
pub fn int_key_map_from_script<R>(
    rt: &R,
    value: &ScriptValue,
) -> Result<IndexMap<i32, HostValue>, ConversionError>
where
    R: ScriptRuntime + ?Sized,
{
    if value.is_nullish() {
        return Ok(IndexMap::new());
    }
    let object = object_handle(value, "int key map")?;
    let keys = rt.own_keys(object)?;
    let mut out = IndexMap::with_capacity(keys.len());
    for key in keys {
        let int_key = match &key {
            PropertyKey::Index(index) => i32::try_from(*index).ok(),
            PropertyKey::Name(name) => name.parse::<i32>().ok(),
        };
        let Some(int_key) = int_key else {
            log::debug!("skipping non-integer key {:?} in int key map", key);
            continue;
        };
        let value = rt.get_property(object, &key)?;
        out.insert(int_key, HostValue::read(rt, &value, 1)?);
    }
    Ok(out)
}
