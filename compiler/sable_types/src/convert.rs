//! Conversion planning between related types.
//!
//! A conversion is classified on two axes: how indirection changes
//! (reference binding, address-of, dereference) and how the underlying
//! types relate (identity, upcast, downcast, user conversion, delegate).
//! Both sides are normalized by stripping one level of pointer/reference
//! indirection first. The evaluator carries out the plan on values.

use crate::registry::Phase;
use crate::{EdgeId, RelationKind, TypeError, TypeId, TypeKind, TypeRegistry};

/// Indirection level of a type.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Indirection {
    Value,
    Pointer,
    Reference,
}

/// How a conversion changes indirection.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum IndirectionChange {
    None,
    /// Value to reference.
    BindReference,
    /// Value to pointer.
    AddressOf,
    /// Pointer or reference to value.
    Dereference,
    /// Pointer to reference or back.
    Retag,
}

/// How the underlying (indirection-stripped) types relate.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Relation {
    Identity,
    /// Target is an ancestor of the source at `offset`.
    Upcast { offset: usize },
    /// Source is an ancestor of the target at `offset`. Only through
    /// pointers or references.
    Downcast { offset: usize },
    /// User-defined conversion edge.
    Convert { edge: EdgeId },
    /// Delegate edge; the target is embedded at `offset`.
    Delegate { edge: EdgeId, offset: usize },
}

/// A checked conversion plan.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Conversion {
    pub from: TypeId,
    pub to: TypeId,
    /// `from` without indirection.
    pub source: TypeId,
    /// `to` without indirection.
    pub target: TypeId,
    pub change: IndirectionChange,
    pub relation: Relation,
}

impl TypeRegistry {
    /// Split `ty` into its indirection level and underlying type.
    pub fn indirection(&self, ty: TypeId) -> (Indirection, TypeId) {
        let Ok(descriptor) = self.try_descriptor(ty) else {
            return (Indirection::Value, ty);
        };
        match (descriptor.kind(), descriptor.element()) {
            (TypeKind::Pointer, Some(pointee)) => (Indirection::Pointer, pointee),
            (TypeKind::Reference, Some(referent)) => (Indirection::Reference, referent),
            _ => (Indirection::Value, ty),
        }
    }

    /// Plan the conversion of a `from` value to `to`.
    ///
    /// Fails with `TypeMismatch` when no relation edge connects the
    /// underlying types, or when a downcast is attempted by value.
    pub fn conversion(&self, from: TypeId, to: TypeId) -> Result<Conversion, TypeError> {
        self.require_at_least(Phase::Linearized, "plan a conversion")?;
        self.try_descriptor(from)?;
        self.try_descriptor(to)?;

        let (from_level, source) = self.indirection(from);
        let (to_level, target) = self.indirection(to);
        let mismatch = || TypeError::TypeMismatch {
            from: self.type_label(from),
            to: self.type_label(to),
        };

        let relation = if source == target {
            Relation::Identity
        } else if let Some(ancestor) = self.ancestor(source, target) {
            Relation::Upcast {
                offset: ancestor.offset,
            }
        } else if let Some(ancestor) = self.ancestor(target, source) {
            if from_level == Indirection::Value || to_level == Indirection::Value {
                return Err(mismatch());
            }
            Relation::Downcast {
                offset: ancestor.offset,
            }
        } else if let Some((edge, kind, offset)) = self.user_edge(source, target) {
            match kind {
                RelationKind::Delegate => Relation::Delegate { edge, offset },
                _ => Relation::Convert { edge },
            }
        } else {
            return Err(mismatch());
        };

        let change = match (from_level, to_level) {
            (Indirection::Value, Indirection::Reference) => IndirectionChange::BindReference,
            (Indirection::Value, Indirection::Pointer) => IndirectionChange::AddressOf,
            (Indirection::Pointer | Indirection::Reference, Indirection::Value) => {
                IndirectionChange::Dereference
            }
            (Indirection::Pointer, Indirection::Reference)
            | (Indirection::Reference, Indirection::Pointer) => IndirectionChange::Retag,
            _ => IndirectionChange::None,
        };

        Ok(Conversion {
            from,
            to,
            source,
            target,
            change,
            relation,
        })
    }

    /// A conversion or delegate edge from `source` to `target`.
    fn user_edge(&self, source: TypeId, target: TypeId) -> Option<(EdgeId, RelationKind, usize)> {
        self.descriptor(source).bases().iter().find_map(|&id| {
            let edge = self.edge(id);
            let user = matches!(edge.kind, RelationKind::Conversion | RelationKind::Delegate);
            (user && edge.base == target).then_some((id, edge.kind, edge.offset))
        })
    }

    /// Whether `ptr` is a pointer to `target` or to one of its descendants.
    pub fn is_pointer_to(&self, ptr: TypeId, target: TypeId) -> bool {
        matches!(self.indirection(ptr), (Indirection::Pointer, pointee) if self.is_subtype_of(pointee, target))
    }

    /// Whether `reference` refers to `target` or to one of its descendants.
    pub fn is_reference_to(&self, reference: TypeId, target: TypeId) -> bool {
        matches!(self.indirection(reference), (Indirection::Reference, referent) if self.is_subtype_of(referent, target))
    }

    pub fn is_pointer_or_reference_to(&self, ty: TypeId, target: TypeId) -> bool {
        self.is_pointer_to(ty, target) || self.is_reference_to(ty, target)
    }
}
