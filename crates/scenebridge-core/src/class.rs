//! Class descriptors shared by native types and their script wrappers.

use std::fmt;

use crate::TypeHash;

/// Metadata describing how to shape a script wrapper for a native type.
///
/// Descriptors are declared as statics and linked to their parent class, so a
/// wrapper created for a subclass is accepted wherever the parent is expected.
///
/// ```
/// use scenebridge_core::ClassDescriptor;
///
/// static NODE: ClassDescriptor = ClassDescriptor::root("Node");
/// static SPRITE: ClassDescriptor = ClassDescriptor::new("Sprite", Some(&NODE));
///
/// assert!(SPRITE.is_a(&NODE));
/// assert!(!NODE.is_a(&SPRITE));
/// ```
pub struct ClassDescriptor {
    name: &'static str,
    parent: Option<&'static ClassDescriptor>,
}

impl ClassDescriptor {
    /// Create a descriptor with an optional parent class.
    pub const fn new(name: &'static str, parent: Option<&'static ClassDescriptor>) -> Self {
        Self { name, parent }
    }

    /// Create a descriptor without a parent class.
    pub const fn root(name: &'static str) -> Self {
        Self::new(name, None)
    }

    /// The script-visible class name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The parent class, if any.
    pub fn parent(&self) -> Option<&'static ClassDescriptor> {
        self.parent
    }

    /// Identity hash of this class.
    pub fn type_hash(&self) -> TypeHash {
        TypeHash::from_name(self.name)
    }

    /// Iterate this class followed by its ancestors, nearest first.
    pub fn lineage(&self) -> impl Iterator<Item = &ClassDescriptor> {
        std::iter::successors(Some(self), |class| class.parent.map(|p| p as &ClassDescriptor))
    }

    /// Whether this class is `other` or derives from it. Classes match by
    /// name, as with `==`.
    pub fn is_a(&self, other: &ClassDescriptor) -> bool {
        self.lineage()
            .any(|class| std::ptr::eq(class, other) || class == other)
    }
}

impl PartialEq for ClassDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for ClassDescriptor {}

impl fmt::Debug for ClassDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassDescriptor")
            .field("name", &self.name)
            .field("parent", &self.parent.map(|p| p.name))
            .finish()
    }
}

impl fmt::Display for ClassDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// A native type that can be bridged into script space.
///
/// # Example
///
/// ```
/// use scenebridge_core::{ClassDescriptor, NativeClass};
///
/// struct Layer;
///
/// static LAYER: ClassDescriptor = ClassDescriptor::root("Layer");
///
/// impl NativeClass for Layer {
///     fn descriptor() -> &'static ClassDescriptor {
///         &LAYER
///     }
/// }
/// ```
pub trait NativeClass: 'static {
    /// The descriptor used to shape wrappers for this type.
    fn descriptor() -> &'static ClassDescriptor;
}
