//! Type descriptors and relation edges.

use sable_ir::Name;

use crate::{EdgeId, TypeFlags, TypeId};

/// Shape category of a descriptor.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum TypeKind {
    Plain,
    Function,
    Pointer,
    Reference,
    PointerToMember,
    Array,
}

/// Type identity: the interning key of a descriptor.
///
/// Named types are nominal. Derived shapes are structural over the
/// `TypeId`s they are built from.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum TypeKey {
    Named(Name),
    Pointer(TypeId),
    Reference(TypeId),
    Array { element: TypeId, len: u32 },
    PointerToMember { class: TypeId, member: TypeId },
}

/// Kind of a base→derived relation.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum RelationKind {
    /// Ordinary inheritance; the base is embedded in the derived layout.
    Subtype,
    /// Shared base, placed once at the end of the most-derived object.
    VirtualSubtype,
    /// Virtual base whose offset inside the derived object is declared.
    VirtualFixedOffset,
    /// The derived type converts to the base; not part of the linearization.
    Conversion,
    /// The derived type forwards to a base embedded at the edge offset.
    Delegate,
}

impl RelationKind {
    /// Whether edges of this kind contribute to C3 linearization.
    #[inline]
    pub const fn is_subtype(self) -> bool {
        matches!(
            self,
            RelationKind::Subtype | RelationKind::VirtualSubtype | RelationKind::VirtualFixedOffset
        )
    }
}

/// Directed edge from a base type to a derived type.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct RelationEdge {
    pub base: TypeId,
    pub derived: TypeId,
    pub kind: RelationKind,
    /// Byte offset of the base inside the derived layout.
    ///
    /// Declared for `VirtualFixedOffset` and `Delegate`, assigned by
    /// `allocate()` for the other subtype kinds.
    pub offset: usize,
}

/// A declared structural member.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Member {
    pub name: Name,
    pub ty: TypeId,
    /// Offset inside the declaring type; valid after `allocate()`.
    pub offset: usize,
}

/// One linearization entry: the type itself or one of its ancestors.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Ancestor {
    pub ty: TypeId,
    /// Kind of the edge through which the ancestor was first reached;
    /// `None` for the type itself.
    pub via: Option<RelationKind>,
    /// Absolute offset of the ancestor inside the descendant's layout;
    /// valid after `allocate()`.
    pub offset: usize,
}

/// Runtime description of a value's shape, size and relations.
#[derive(Clone, Debug)]
pub struct TypeDescriptor {
    pub(crate) key: TypeKey,
    pub(crate) kind: TypeKind,
    pub(crate) name: Name,
    /// Declared size, later raised to the computed layout size.
    pub(crate) size: usize,
    /// Size of the non-virtual part: what an embedding derived type reserves.
    pub(crate) nv_size: usize,
    pub(crate) element: Option<TypeId>,
    pub(crate) members: Vec<Member>,
    /// Outgoing edges to bases, in declaration order.
    pub(crate) bases: Vec<EdgeId>,
    /// Incoming edges from derived types.
    pub(crate) derived: Vec<EdgeId>,
    pub(crate) flags: TypeFlags,
    pub(crate) linearization: Vec<Ancestor>,
    /// Offsets of every virtual base inside a complete object of this type.
    pub(crate) virtual_bases: Vec<(TypeId, usize)>,
}

impl TypeDescriptor {
    pub(crate) fn new(key: TypeKey, kind: TypeKind, name: Name, size: usize) -> Self {
        Self {
            key,
            kind,
            name,
            size,
            nv_size: size,
            element: None,
            members: Vec::new(),
            bases: Vec::new(),
            derived: Vec::new(),
            flags: TypeFlags::empty(),
            linearization: Vec::new(),
            virtual_bases: Vec::new(),
        }
    }

    #[inline]
    pub fn key(&self) -> TypeKey {
        self.key
    }

    #[inline]
    pub fn kind(&self) -> TypeKind {
        self.kind
    }

    #[inline]
    pub fn name(&self) -> Name {
        self.name
    }

    /// Size in bytes of a complete object of this type.
    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Pointee of a pointer/reference, element of an array, member type of
    /// a pointer-to-member.
    #[inline]
    pub fn element(&self) -> Option<TypeId> {
        self.element
    }

    #[inline]
    pub fn members(&self) -> &[Member] {
        &self.members
    }

    #[inline]
    pub fn bases(&self) -> &[EdgeId] {
        &self.bases
    }

    #[inline]
    pub fn derived(&self) -> &[EdgeId] {
        &self.derived
    }

    #[inline]
    pub fn flags(&self) -> TypeFlags {
        self.flags
    }

    /// Self followed by ancestors in C3 order; empty before `linearize()`.
    #[inline]
    pub fn linearization(&self) -> &[Ancestor] {
        &self.linearization
    }

    #[inline]
    pub fn is_indirect(&self) -> bool {
        self.flags.contains(TypeFlags::IS_INDIRECT)
    }
}
