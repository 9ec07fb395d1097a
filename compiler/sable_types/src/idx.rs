//! Type handle.
//!
//! `TypeId` is a 32-bit index into the [`TypeRegistry`](crate::TypeRegistry).
//! The interpreter-native value kinds have fixed indices so the evaluator
//! can answer `type_of` without touching the registry.

use std::fmt;

/// A 32-bit index into the type registry.
///
/// Types are compared by index equality, never structurally: the registry
/// interns one descriptor per type identity.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
#[repr(transparent)]
pub struct TypeId(u32);

impl TypeId {
    // === Builtin types (indices 0-14) ===
    // Registered by `TypeRegistry::new` in this order.

    /// The empty list `nil`.
    pub const NIL: Self = Self(0);
    pub const BOOL: Self = Self(1);
    /// 64-bit signed integer.
    pub const INT: Self = Self(2);
    /// 64-bit float.
    pub const FLOAT: Self = Self(3);
    /// Abstract numeric supertype of `INT` and `FLOAT`.
    pub const NUMBER: Self = Self(4);
    pub const STR: Self = Self(5);
    pub const SYMBOL: Self = Self(6);
    pub const CONS: Self = Self(7);
    /// Abstract supertype of `NIL` and `CONS`.
    pub const LIST: Self = Self(8);
    pub const CLOSURE: Self = Self(9);
    pub const NATIVE: Self = Self(10);
    pub const MULTIMETHOD: Self = Self(11);
    pub const CONTINUATION: Self = Self(12);
    /// Abstract supertype of every applicable value kind.
    pub const CALLABLE: Self = Self(13);
    /// The partial-application hole.
    pub const BLANK: Self = Self(14);

    /// Number of builtin types.
    pub const BUILTIN_COUNT: u32 = 15;

    #[inline]
    pub(crate) const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// Get the raw u32 value.
    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Registry slot of this type.
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Check if this is one of the fixed builtin types.
    #[inline]
    pub const fn is_builtin(self) -> bool {
        self.0 < Self::BUILTIN_COUNT
    }
}

impl fmt::Debug for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeId({})", self.0)
    }
}

/// Handle to a relation edge stored in the registry.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct EdgeId(u32);

impl EdgeId {
    #[inline]
    pub(crate) const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}
