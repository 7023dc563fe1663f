//! Deterministic hash-based class identity.
//!
//! [`TypeHash`] is a 64-bit hash computed from a class name. Native classes and
//! the script wrappers created for them agree on identity through this hash, so
//! two descriptors with the same name always compare equal regardless of where
//! they were declared.
//!
//! # Examples
//!
//! ```
//! use scenebridge_core::TypeHash;
//!
//! let node = TypeHash::from_name("Node");
//! assert_eq!(node, TypeHash::from_name("Node"));
//! assert_ne!(node, TypeHash::from_name("Sprite"));
//! ```

use std::fmt;
use xxhash_rust::xxh64::xxh64;

/// Domain marker mixed into class hashes.
const CLASS_DOMAIN: u64 = 0x2fac10b63a6cc57c;

/// A deterministic 64-bit hash identifying a native class.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct TypeHash(pub u64);

impl TypeHash {
    /// Empty/invalid hash constant.
    pub const EMPTY: TypeHash = TypeHash(0);

    /// Create a hash from a (possibly namespaced) class name.
    #[inline]
    pub fn from_name(name: &str) -> Self {
        TypeHash(CLASS_DOMAIN ^ xxh64(name.as_bytes(), 0))
    }

    /// Check if this is the empty hash.
    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Get the underlying u64 value.
    #[inline]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for TypeHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeHash({:#018x})", self.0)
    }
}

impl fmt::Display for TypeHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#018x}", self.0)
    }
}
