//! Sequences and string-keyed maps of native objects.
//!
//! Elements cross the boundary through the [`ProxyRegistry`]: writing uses
//! get-or-create so every element keeps its wrapper identity, reading uses
//! the reverse lookup. Reading never changes the registry.
//!
//! `null` and `undefined` read as empty containers. A wrapper whose native
//! object is gone fails the conversion, unless the registry was built with
//! [`DanglingPolicy::Skip`], in which case the entry is left out.

use indexmap::IndexMap;
use scenebridge_core::{ObjectHandle, PropertyKey, ScriptRuntime, ScriptValue};

use crate::config::DanglingPolicy;
use crate::convert::{array_handle, capacity_hint, object_handle};
use crate::error::{BridgeResult, ConversionError};
use crate::native::NativeObject;
use crate::registry::ProxyRegistry;

/// Resolve one element value. `Ok(None)` means it was skipped.
fn resolve_element<T>(registry: &ProxyRegistry, value: &ScriptValue) -> Result<Option<T>, ConversionError>
where
    T: NativeObject,
{
    let wrapper = value.as_object().ok_or(ConversionError::TypeMismatch {
        expected: T::class().name(),
        actual: value.type_name(),
    })?;
    match registry.resolve::<T>(wrapper) {
        Ok(native) => Ok(Some(native)),
        Err(ConversionError::DanglingReference { wrapper })
            if registry.dangling_policy() == DanglingPolicy::Skip =>
        {
            log::debug!("skipping dangling wrapper {}", wrapper);
            Ok(None)
        }
        Err(err) => Err(err),
    }
}

// ============================================================================
// Sequences
// ============================================================================

/// Read an array of wrappers, preserving index order.
#[cfg_attr(feature = "profiling", profiling::function)]
pub fn sequence_from_script<T, R>(
    rt: &R,
    registry: &ProxyRegistry,
    value: &ScriptValue,
) -> Result<Vec<T>, ConversionError>
where
    T: NativeObject,
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
        if let Some(native) = resolve_element(registry, &element)? {
            out.push(native);
        }
    }
    Ok(out)
}

/// Build a fresh array holding the wrapper of each item, in order.
#[cfg_attr(feature = "profiling", profiling::function)]
pub fn sequence_to_script<T, R>(
    rt: &mut R,
    registry: &mut ProxyRegistry,
    items: &[T],
) -> BridgeResult<ScriptValue>
where
    T: NativeObject,
    R: ScriptRuntime + ?Sized,
{
    let array = rt.new_array()?;
    for (index, item) in items.iter().enumerate() {
        let wrapper = registry.get_or_create(rt, item)?;
        rt.set_element(array, index as u32, ScriptValue::Object(wrapper))?;
    }
    Ok(ScriptValue::Object(array))
}

/// Resolve variadic call arguments the way sequence elements are resolved.
pub fn sequence_from_args<T>(registry: &ProxyRegistry, args: &[ScriptValue]) -> Result<Vec<T>, ConversionError>
where
    T: NativeObject,
{
    let mut out = Vec::with_capacity(args.len());
    for arg in args {
        if let Some(native) = resolve_element(registry, arg)? {
            out.push(native);
        }
    }
    Ok(out)
}

// ============================================================================
// String-keyed maps
// ============================================================================

/// Read an object of wrappers keyed by name.
///
/// Own keys are snapshotted before any value is read. Integer-like keys are
/// skipped. The result keeps the runtime's enumeration order.
#[cfg_attr(feature = "profiling", profiling::function)]
pub fn map_from_script<T, R>(
    rt: &R,
    registry: &ProxyRegistry,
    value: &ScriptValue,
) -> Result<IndexMap<String, T>, ConversionError>
where
    T: NativeObject,
    R: ScriptRuntime + ?Sized,
{
    if value.is_nullish() {
        return Ok(IndexMap::new());
    }
    let object = object_handle(value, "map")?;
    let keys = rt.own_keys(object)?;
    let mut out = IndexMap::with_capacity(keys.len());
    for key in keys {
        let PropertyKey::Name(name) = &key else {
            log::debug!("skipping non-string key {} in map", key);
            continue;
        };
        let entry = rt.get_property(object, &key)?;
        if let Some(native) = resolve_element(registry, &entry)? {
            out.insert(name.to_string(), native);
        }
    }
    Ok(out)
}

/// Build a fresh object mapping each key to its item's wrapper.
///
/// Entries with an empty key are dropped.
#[cfg_attr(feature = "profiling", profiling::function)]
pub fn map_to_script<'a, K, T, R, I>(
    rt: &mut R,
    registry: &mut ProxyRegistry,
    entries: I,
) -> BridgeResult<ScriptValue>
where
    K: AsRef<str>,
    T: NativeObject + 'a,
    R: ScriptRuntime + ?Sized,
    I: IntoIterator<Item = (K, &'a T)>,
{
    let object: ObjectHandle = rt.new_object()?;
    for (key, item) in entries {
        let key = key.as_ref();
        if key.is_empty() {
            log::debug!("dropping map entry with empty key");
            continue;
        }
        let wrapper = registry.get_or_create(rt, item)?;
        rt.set_named(object, key, ScriptValue::Object(wrapper))?;
    }
    Ok(ScriptValue::Object(object))
}

#[cfg(test)]
mod tests {
    use std::ptr::NonNull;

    use scenebridge_core::{ClassDescriptor, HeapRuntime, NativeClass};

    use super::*;

    struct Node {
        _id: u32,
    }
    struct Sound {
        _id: u32,
    }

    static NODE: ClassDescriptor = ClassDescriptor::root("Node");
    static SOUND: ClassDescriptor = ClassDescriptor::root("Sound");

    impl NativeClass for Node {
        fn descriptor() -> &'static ClassDescriptor {
            &NODE
        }
    }
    impl NativeClass for Sound {
        fn descriptor() -> &'static ClassDescriptor {
            &SOUND
        }
    }

    fn nodes(count: u32) -> Vec<Node> {
        (0..count).map(|_id| Node { _id }).collect()
    }

    fn ptrs(nodes: &[Node]) -> Vec<NonNull<Node>> {
        nodes.iter().map(NonNull::from).collect()
    }

    #[test]
    fn sequence_preserves_order_and_identity() {
        let mut rt = HeapRuntime::new();
        let mut registry = ProxyRegistry::new();
        let owned = nodes(3);
        let items = ptrs(&owned);

        let value = sequence_to_script(&mut rt, &mut registry, &items).unwrap();
        let array = value.as_object().unwrap();
        assert_eq!(rt.array_length(array).unwrap(), 3);
        for (index, item) in items.iter().enumerate() {
            let element = rt.get_element(array, index as u32).unwrap();
            assert_eq!(element.as_object(), registry.wrapper_for(item.native_ptr()));
        }

        let back: Vec<NonNull<Node>> = sequence_from_script(&rt, &registry, &value).unwrap();
        assert_eq!(back, items);
    }

    #[test]
    fn sequence_null_affordance() {
        let rt = HeapRuntime::new();
        let registry = ProxyRegistry::new();
        let empty: Vec<NonNull<Node>> = sequence_from_script(&rt, &registry, &ScriptValue::Null).unwrap();
        assert!(empty.is_empty());
        let empty: Vec<NonNull<Node>> =
            sequence_from_script(&rt, &registry, &ScriptValue::Undefined).unwrap();
        assert!(empty.is_empty());
    }

    #[test]
    fn sequence_shape_errors() {
        let mut rt = HeapRuntime::new();
        let registry = ProxyRegistry::new();

        let err = sequence_from_script::<NonNull<Node>, _>(&rt, &registry, &ScriptValue::Number(1.0))
            .unwrap_err();
        assert!(matches!(err, ConversionError::NotAnObject { .. }));

        let object = ScriptValue::Object(rt.new_object().unwrap());
        let err = sequence_from_script::<NonNull<Node>, _>(&rt, &registry, &object).unwrap_err();
        assert!(matches!(err, ConversionError::NotAnArray { .. }));

        let array = rt.array_from([ScriptValue::Number(1.0)]).unwrap();
        let err = sequence_from_script::<NonNull<Node>, _>(&rt, &registry, &ScriptValue::Object(array))
            .unwrap_err();
        assert!(matches!(
            err,
            ConversionError::TypeMismatch {
                expected: "Node",
                actual: "number"
            }
        ));
    }

    #[test]
    fn sequence_dangling_reference() {
        let mut rt = HeapRuntime::new();
        let mut registry = ProxyRegistry::new();
        let owned = nodes(2);
        let items = ptrs(&owned);
        let value = sequence_to_script(&mut rt, &mut registry, &items).unwrap();

        registry.on_native_destroyed(items[1].native_ptr());
        let err = sequence_from_script::<NonNull<Node>, _>(&rt, &registry, &value).unwrap_err();
        assert!(matches!(err, ConversionError::DanglingReference { .. }));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn sequence_dangling_skipped_by_policy() {
        let mut rt = HeapRuntime::new();
        let mut registry = ProxyRegistry::with_policy(DanglingPolicy::Skip);
        let owned = nodes(3);
        let items = ptrs(&owned);
        let value = sequence_to_script(&mut rt, &mut registry, &items).unwrap();

        registry.on_native_destroyed(items[1].native_ptr());
        let back: Vec<NonNull<Node>> = sequence_from_script(&rt, &registry, &value).unwrap();
        assert_eq!(back, vec![items[0], items[2]]);
    }

    #[test]
    fn sequence_wrong_class_not_skipped() {
        let mut rt = HeapRuntime::new();
        let mut registry = ProxyRegistry::with_policy(DanglingPolicy::Skip);
        let sound = Sound { _id: 0 };
        let sounds = [NonNull::from(&sound)];
        let value = sequence_to_script(&mut rt, &mut registry, &sounds).unwrap();

        let err = sequence_from_script::<NonNull<Node>, _>(&rt, &registry, &value).unwrap_err();
        assert!(matches!(err, ConversionError::TypeMismatch { .. }));
    }

    #[test]
    fn sequence_hole_is_a_type_mismatch() {
        let mut rt = HeapRuntime::new();
        let mut registry = ProxyRegistry::with_policy(DanglingPolicy::Skip);
        let owned = nodes(2);
        let items = ptrs(&owned);
        let first = registry.get_or_create(&mut rt, &items[0]).unwrap();
        let last = registry.get_or_create(&mut rt, &items[1]).unwrap();

        let array = rt.new_array().unwrap();
        rt.set_element(array, 0, ScriptValue::Object(first)).unwrap();
        rt.set_element(array, 2, ScriptValue::Object(last)).unwrap();

        let err = sequence_from_script::<NonNull<Node>, _>(&rt, &registry, &ScriptValue::Object(array))
            .unwrap_err();
        assert!(matches!(
            err,
            ConversionError::TypeMismatch {
                expected: "Node",
                actual: "undefined"
            }
        ));
    }

    #[test]
    fn sequence_huge_sparse_length() {
        let mut rt = HeapRuntime::new();
        let mut registry = ProxyRegistry::new();
        let owned = nodes(1);
        let items = ptrs(&owned);
        let wrapper = registry.get_or_create(&mut rt, &items[0]).unwrap();

        let array = rt.new_array().unwrap();
        rt.set_element(array, 4_000_000_000, ScriptValue::Object(wrapper)).unwrap();
        let err = sequence_from_script::<NonNull<Node>, _>(&rt, &registry, &ScriptValue::Object(array))
            .unwrap_err();
        assert!(matches!(err, ConversionError::TypeMismatch { actual: "undefined", .. }));

        let array = rt.new_array().unwrap();
        rt.set_element(array, u32::MAX - 1, ScriptValue::Null).unwrap();
        assert_eq!(rt.array_length(array).unwrap(), u32::MAX);
        let err = sequence_from_script::<NonNull<Node>, _>(&rt, &registry, &ScriptValue::Object(array))
            .unwrap_err();
        assert!(matches!(err, ConversionError::TypeMismatch { .. }));
    }

    #[test]
    fn map_round_trip_keeps_order() {
        let mut rt = HeapRuntime::new();
        let mut registry = ProxyRegistry::new();
        let owned = nodes(2);
        let items = ptrs(&owned);

        let value = map_to_script(
            &mut rt,
            &mut registry,
            [("beta", &items[0]), ("alpha", &items[1])],
        )
        .unwrap();
        let back: IndexMap<String, NonNull<Node>> = map_from_script(&rt, &registry, &value).unwrap();
        let keys: Vec<_> = back.keys().map(String::as_str).collect();
        assert_eq!(keys, ["beta", "alpha"]);
        assert_eq!(back["beta"], items[0]);
        assert_eq!(back["alpha"], items[1]);
    }

    #[test]
    fn map_skips_index_keys() {
        let mut rt = HeapRuntime::new();
        let mut registry = ProxyRegistry::new();
        let owned = nodes(2);
        let items = ptrs(&owned);
        let w1 = registry.get_or_create(&mut rt, &items[0]).unwrap();
        let w2 = registry.get_or_create(&mut rt, &items[1]).unwrap();

        let object = rt.new_object().unwrap();
        rt.set_named(object, "x", ScriptValue::Object(w1)).unwrap();
        rt.set_element(object, 3, ScriptValue::Object(w2)).unwrap();

        let back: IndexMap<String, NonNull<Node>> =
            map_from_script(&rt, &registry, &ScriptValue::Object(object)).unwrap();
        assert_eq!(back.len(), 1);
        assert_eq!(back["x"], items[0]);
    }

    #[test]
    fn map_non_object_value_rejected() {
        let mut rt = HeapRuntime::new();
        let registry = ProxyRegistry::new();
        let object = rt.object_from([("x", ScriptValue::string("nope"))]).unwrap();
        let err = map_from_script::<NonNull<Node>, _>(&rt, &registry, &ScriptValue::Object(object))
            .unwrap_err();
        assert!(matches!(err, ConversionError::TypeMismatch { .. }));
    }

    #[test]
    fn map_null_affordance_and_shape() {
        let rt = HeapRuntime::new();
        let registry = ProxyRegistry::new();
        let empty: IndexMap<String, NonNull<Node>> =
            map_from_script(&rt, &registry, &ScriptValue::Undefined).unwrap();
        assert!(empty.is_empty());
        let err = map_from_script::<NonNull<Node>, _>(&rt, &registry, &ScriptValue::string("x"))
            .unwrap_err();
        assert!(matches!(err, ConversionError::NotAnObject { .. }));
    }

    #[test]
    fn map_to_script_drops_empty_keys() {
        let mut rt = HeapRuntime::new();
        let mut registry = ProxyRegistry::new();
        let owned = nodes(2);
        let items = ptrs(&owned);

        let value = map_to_script(
            &mut rt,
            &mut registry,
            [(String::new(), &items[0]), ("kept".to_string(), &items[1])],
        )
        .unwrap();
        let object = value.as_object().unwrap();
        assert_eq!(rt.own_keys(object).unwrap(), vec![PropertyKey::from("kept")]);
    }

    #[test]
    fn variadic_args() {
        let mut rt = HeapRuntime::new();
        let mut registry = ProxyRegistry::new();
        let owned = nodes(2);
        let items = ptrs(&owned);
        let args: Vec<ScriptValue> = items
            .iter()
            .map(|item| ScriptValue::Object(registry.get_or_create(&mut rt, item).unwrap()))
            .collect();

        let back: Vec<NonNull<Node>> = sequence_from_args(&registry, &args).unwrap();
        assert_eq!(back, items);

        let err = sequence_from_args::<NonNull<Node>>(&registry, &[ScriptValue::Null]).unwrap_err();
        assert!(matches!(err, ConversionError::TypeMismatch { .. }));
    }

    #[test]
    fn failed_read_leaves_registry_untouched() {
        let mut rt = HeapRuntime::new();
        let mut registry = ProxyRegistry::new();
        let owned = nodes(1);
        let items = ptrs(&owned);
        let wrapper = registry.get_or_create(&mut rt, &items[0]).unwrap();
        let array = rt
            .array_from([ScriptValue::Object(wrapper), ScriptValue::Bool(true)])
            .unwrap();

        assert!(sequence_from_script::<NonNull<Node>, _>(&rt, &registry, &ScriptValue::Object(array)).is_err());
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.wrapper_for(items[0].native_ptr()), Some(wrapper));
    }
}
