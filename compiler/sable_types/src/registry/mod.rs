//! Registry of runtime type descriptors.
//!
//! The `TypeRegistry` interns one [`TypeDescriptor`] per [`TypeKey`] and
//! stores the relation edges between them.
//!
//! # Startup phases
//!
//! Population is strictly ordered and one-way:
//!
//! 1. `Registering`: types, members and relation edges may be added.
//! 2. `Linearized`: `linearize()` has computed every C3 ordering.
//! 3. `Allocated`: `allocate()` has laid out every type; instances may
//!    now be constructed and members resolved.
//!
//! Registration after step 2 is rejected with [`TypeError::Phase`].
//!
//! # Design
//!
//! - Descriptors live in a `Vec` indexed by `TypeId`
//! - Identity lookup through `FxHashMap<TypeKey, TypeId>`
//! - Named lookup through a `BTreeMap` for deterministic iteration

use std::collections::BTreeMap;
use std::fmt;

use rustc_hash::FxHashMap;
use sable_ir::{intern, Name};

use crate::{
    Ancestor, EdgeId, Member, RelationEdge, RelationKind, TypeDescriptor, TypeError, TypeFlags,
    TypeId, TypeKey, TypeKind,
};

/// Size of pointers, references and pointers-to-member.
pub const POINTER_SIZE: usize = 8;

/// Startup phase of a [`TypeRegistry`].
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd)]
pub enum Phase {
    Registering,
    Linearized,
    Allocated,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Registering => f.write_str("registering"),
            Phase::Linearized => f.write_str("linearized"),
            Phase::Allocated => f.write_str("allocated"),
        }
    }
}

/// Registry of runtime type descriptors and their relations.
#[derive(Clone, Debug)]
pub struct TypeRegistry {
    pub(crate) types: Vec<TypeDescriptor>,
    pub(crate) edges: Vec<RelationEdge>,
    by_key: FxHashMap<TypeKey, TypeId>,
    /// Named types (`BTreeMap` for deterministic iteration).
    by_name: BTreeMap<Name, TypeId>,
    pub(crate) phase: Phase,
}

impl TypeRegistry {
    /// Create a registry holding the builtin value kinds and their relations.
    pub fn new() -> Self {
        let mut registry = Self {
            types: Vec::with_capacity(64),
            edges: Vec::new(),
            by_key: FxHashMap::default(),
            by_name: BTreeMap::new(),
            phase: Phase::Registering,
        };
        registry.register_builtins();
        registry
    }

    fn register_builtins(&mut self) {
        // Order must match the `TypeId` constants.
        const BUILTINS: [(&str, usize); TypeId::BUILTIN_COUNT as usize] = [
            ("nil", 0),
            ("bool", 1),
            ("int", 8),
            ("float", 8),
            ("number", 0),
            ("str", 16),
            ("symbol", 4),
            ("cons", 16),
            ("list", 0),
            ("closure", POINTER_SIZE),
            ("native", POINTER_SIZE),
            ("multimethod", POINTER_SIZE),
            ("continuation", POINTER_SIZE),
            ("callable", 0),
            ("blank", 0),
        ];
        for (name, size) in BUILTINS {
            let ty = self.push(TypeKey::Named(intern(name)), TypeKind::Plain, size);
            self.types[ty.index()].flags |= TypeFlags::IS_BUILTIN;
        }

        let relations = [
            (TypeId::NUMBER, TypeId::INT),
            (TypeId::NUMBER, TypeId::FLOAT),
            (TypeId::LIST, TypeId::NIL),
            (TypeId::LIST, TypeId::CONS),
            (TypeId::CALLABLE, TypeId::CLOSURE),
            (TypeId::CALLABLE, TypeId::NATIVE),
            (TypeId::CALLABLE, TypeId::MULTIMETHOD),
            (TypeId::CALLABLE, TypeId::CONTINUATION),
        ];
        for (base, derived) in relations {
            self.push_edge(base, derived, RelationKind::Subtype, 0);
        }
    }

    /// Allocate a descriptor slot. The key must be new.
    fn push(&mut self, key: TypeKey, kind: TypeKind, size: usize) -> TypeId {
        let ty = TypeId::from_raw(
            u32::try_from(self.types.len()).unwrap_or_else(|_| panic!("type registry overflow")),
        );
        let name = self.display_name(key);
        let mut descriptor = TypeDescriptor::new(key, kind, name, size);
        match key {
            TypeKey::Named(name) => {
                self.by_name.insert(name, ty);
            }
            TypeKey::Pointer(pointee) | TypeKey::Reference(pointee) => {
                descriptor.element = Some(pointee);
                descriptor.flags |= TypeFlags::IS_INDIRECT;
            }
            TypeKey::Array { element, .. } => descriptor.element = Some(element),
            TypeKey::PointerToMember { member, .. } => descriptor.element = Some(member),
        }
        self.types.push(descriptor);
        self.by_key.insert(key, ty);
        ty
    }

    fn push_edge(
        &mut self,
        base: TypeId,
        derived: TypeId,
        kind: RelationKind,
        offset: usize,
    ) -> EdgeId {
        let edge = EdgeId::from_raw(
            u32::try_from(self.edges.len()).unwrap_or_else(|_| panic!("relation edge overflow")),
        );
        self.edges.push(RelationEdge {
            base,
            derived,
            kind,
            offset,
        });
        self.types[derived.index()].bases.push(edge);
        self.types[base.index()].derived.push(edge);
        if kind == RelationKind::VirtualSubtype {
            self.types[derived.index()].flags |= TypeFlags::HAS_VIRTUAL_BASE;
        }
        edge
    }

    fn display_name(&self, key: TypeKey) -> Name {
        match key {
            TypeKey::Named(name) => name,
            TypeKey::Pointer(t) => intern(&format!("*{}", self.name(t))),
            TypeKey::Reference(t) => intern(&format!("&{}", self.name(t))),
            TypeKey::Array { element, len } => intern(&format!("[{}; {len}]", self.name(element))),
            TypeKey::PointerToMember { class, member } => {
                intern(&format!("{}::*{}", self.name(class), self.name(member)))
            }
        }
    }

    pub(crate) fn require_phase(
        &self,
        phase: Phase,
        operation: &'static str,
    ) -> Result<(), TypeError> {
        if self.phase == phase {
            Ok(())
        } else {
            Err(TypeError::Phase {
                operation,
                phase: self.phase,
            })
        }
    }

    pub(crate) fn require_at_least(
        &self,
        phase: Phase,
        operation: &'static str,
    ) -> Result<(), TypeError> {
        if self.phase >= phase {
            Ok(())
        } else {
            Err(TypeError::Phase {
                operation,
                phase: self.phase,
            })
        }
    }

    // Registration

    /// Intern-or-create the descriptor for `key`.
    ///
    /// An existing descriptor is returned unchanged; `kind` and `size`
    /// only apply on creation.
    pub fn intern(&mut self, key: TypeKey, kind: TypeKind, size: usize) -> Result<TypeId, TypeError> {
        if let Some(&ty) = self.by_key.get(&key) {
            return Ok(ty);
        }
        self.require_phase(Phase::Registering, "register a type")?;
        Ok(self.push(key, kind, size))
    }

    /// A nominal data type with a declared base size (0 for pure composites).
    pub fn plain(&mut self, name: Name, size: usize) -> Result<TypeId, TypeError> {
        self.intern(TypeKey::Named(name), TypeKind::Plain, size)
    }

    /// A nominal function type.
    pub fn function(&mut self, name: Name) -> Result<TypeId, TypeError> {
        self.intern(TypeKey::Named(name), TypeKind::Function, 0)
    }

    pub fn pointer_to(&mut self, pointee: TypeId) -> Result<TypeId, TypeError> {
        self.intern(TypeKey::Pointer(pointee), TypeKind::Pointer, POINTER_SIZE)
    }

    pub fn reference_to(&mut self, referent: TypeId) -> Result<TypeId, TypeError> {
        self.intern(TypeKey::Reference(referent), TypeKind::Reference, POINTER_SIZE)
    }

    /// Array of `len` elements; its size is computed by `allocate()`.
    pub fn array_of(&mut self, element: TypeId, len: u32) -> Result<TypeId, TypeError> {
        self.intern(TypeKey::Array { element, len }, TypeKind::Array, 0)
    }

    pub fn pointer_to_member(&mut self, class: TypeId, member: TypeId) -> Result<TypeId, TypeError> {
        self.intern(
            TypeKey::PointerToMember { class, member },
            TypeKind::PointerToMember,
            POINTER_SIZE,
        )
    }

    /// Append a member to `ty`'s declared member list.
    pub fn add_member(&mut self, ty: TypeId, name: Name, member_ty: TypeId) -> Result<(), TypeError> {
        self.require_phase(Phase::Registering, "add a member")?;
        let descriptor = &mut self.types[ty.index()];
        if descriptor.members.iter().any(|m| m.name == name) {
            return Err(TypeError::DuplicateMember {
                ty: descriptor.name.to_string(),
                member: name.to_string(),
            });
        }
        descriptor.members.push(Member {
            name,
            ty: member_ty,
            offset: 0,
        });
        descriptor.flags |= TypeFlags::IS_COMPOSITE;
        Ok(())
    }

    /// Add a `base → derived` relation edge.
    ///
    /// `offset` is only meaningful for `VirtualFixedOffset` and `Delegate`
    /// edges; layout assigns the others.
    pub fn add_relation(
        &mut self,
        base: TypeId,
        derived: TypeId,
        kind: RelationKind,
        offset: usize,
    ) -> Result<EdgeId, TypeError> {
        self.require_phase(Phase::Registering, "add a relation")?;
        Ok(self.push_edge(base, derived, kind, offset))
    }

    /// Run the startup passes: `linearize()` then `allocate()`.
    pub fn seal(&mut self) -> Result<(), TypeError> {
        self.linearize()?;
        self.allocate()
    }

    // Queries

    #[inline]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Descriptor for `ty`.
    ///
    /// # Panics
    /// Panics if `ty` was not produced by this registry.
    #[inline]
    pub fn descriptor(&self, ty: TypeId) -> &TypeDescriptor {
        &self.types[ty.index()]
    }

    /// Descriptor for `ty`, or `UnknownType` for ids issued elsewhere.
    pub fn try_descriptor(&self, ty: TypeId) -> Result<&TypeDescriptor, TypeError> {
        self.types
            .get(ty.index())
            .ok_or(TypeError::UnknownType { id: ty.raw() })
    }

    /// Whether `ty` was issued by this registry.
    #[inline]
    pub fn contains(&self, ty: TypeId) -> bool {
        ty.index() < self.types.len()
    }

    #[inline]
    pub fn edge(&self, edge: EdgeId) -> &RelationEdge {
        &self.edges[edge.index()]
    }

    /// Display name of `ty`.
    #[inline]
    pub fn name(&self, ty: TypeId) -> Name {
        self.types[ty.index()].name
    }

    #[inline]
    pub fn size_of(&self, ty: TypeId) -> usize {
        self.types[ty.index()].size
    }

    /// Look up an already interned descriptor by identity.
    pub fn get(&self, key: TypeKey) -> Option<TypeId> {
        self.by_key.get(&key).copied()
    }

    /// Look up a named type.
    pub fn lookup(&self, name: Name) -> Option<TypeId> {
        self.by_name.get(&name).copied()
    }

    /// Iterate over named types in name order.
    pub fn named(&self) -> impl Iterator<Item = (Name, TypeId)> + '_ {
        self.by_name.iter().map(|(&name, &ty)| (name, ty))
    }

    /// Every registered type, in registration order.
    pub fn ids(&self) -> impl Iterator<Item = TypeId> {
        #[expect(
            clippy::cast_possible_truncation,
            reason = "push() keeps the registry within u32"
        )]
        let count = self.types.len() as u32;
        (0..count).map(TypeId::from_raw)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Self followed by ancestors in C3 order; empty for unknown ids.
    #[inline]
    pub fn linearization(&self, ty: TypeId) -> &[Ancestor] {
        self.types
            .get(ty.index())
            .map_or(&[][..], TypeDescriptor::linearization)
    }

    /// Position of `ancestor` in `ty`'s linearization (0 for `ty` itself).
    pub fn ancestor_index(&self, ty: TypeId, ancestor: TypeId) -> Option<usize> {
        if ty == ancestor {
            return Some(0);
        }
        self.linearization(ty).iter().position(|a| a.ty == ancestor)
    }

    /// The linearization entry for `ancestor` in `ty`.
    pub fn ancestor(&self, ty: TypeId, ancestor: TypeId) -> Option<&Ancestor> {
        self.linearization(ty).iter().find(|a| a.ty == ancestor)
    }

    /// Whether `ancestor` is `ty` or one of its subtype ancestors.
    #[inline]
    pub fn is_subtype_of(&self, ty: TypeId, ancestor: TypeId) -> bool {
        self.ancestor_index(ty, ancestor).is_some()
    }

    /// Strip one level of pointer/reference indirection.
    #[inline]
    pub fn strip_indirection(&self, ty: TypeId) -> TypeId {
        match self.types.get(ty.index()) {
            Some(descriptor) if descriptor.is_indirect() => descriptor.element.unwrap_or(ty),
            _ => ty,
        }
    }

    /// Name of `ty` for messages; ids from other registries render as `#id`.
    pub fn type_label(&self, ty: TypeId) -> String {
        self.types
            .get(ty.index())
            .map_or_else(|| format!("#{}", ty.raw()), |d| d.name.to_string())
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}
