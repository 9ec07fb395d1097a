//! One-time layout pass and member resolution.
//!
//! Every type reserves its non-virtual bases first, then its declared
//! members, then one copy of each virtual base in its hierarchy. Layout is
//! packed; no padding is inserted.

use rustc_hash::{FxHashMap, FxHashSet};
use sable_ir::Name;
use sable_stack::ensure_sufficient_stack;

use crate::registry::Phase;
use crate::{EdgeId, RelationKind, TypeError, TypeFlags, TypeId, TypeKey, TypeKind, TypeRegistry};

/// A member resolved against a concrete type.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct ResolvedMember {
    pub name: Name,
    pub ty: TypeId,
    /// Type that declares the member (the type itself, an ancestor or a delegate).
    pub owner: TypeId,
    /// Absolute offset inside an object of the queried type.
    pub offset: usize,
}

impl TypeRegistry {
    /// Lay out every registered type.
    ///
    /// Runs exactly once, after `linearize()`; afterwards linearization
    /// entries carry the absolute offset of each ancestor.
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn allocate(&mut self) -> Result<(), TypeError> {
        self.require_phase(Phase::Linearized, "allocate")?;

        let mut in_progress = FxHashSet::default();
        for ty in self.ids() {
            self.lay_out(ty, &mut in_progress)?;
        }

        for ty in self.ids() {
            let order = self.linearization(ty).iter().map(|a| a.ty).collect();
            let linearization = self.ancestors_from_order(ty, order);
            self.types[ty.index()].linearization = linearization;
        }

        self.phase = Phase::Allocated;
        tracing::debug!(types = self.types.len(), "layout complete");
        Ok(())
    }

    fn lay_out(&mut self, ty: TypeId, in_progress: &mut FxHashSet<TypeId>) -> Result<(), TypeError> {
        if self.types[ty.index()].flags.contains(TypeFlags::IS_LAID_OUT) {
            return Ok(());
        }
        if !in_progress.insert(ty) {
            return Err(TypeError::RecursiveLayout {
                ty: self.type_label(ty),
            });
        }

        for dependency in self.layout_dependencies(ty) {
            ensure_sufficient_stack(|| self.lay_out(dependency, in_progress))?;
        }

        let descriptor = &self.types[ty.index()];
        match (descriptor.kind, descriptor.key) {
            (TypeKind::Array, TypeKey::Array { element, len }) => {
                let size = self.size_of(element) * len as usize;
                let descriptor = &mut self.types[ty.index()];
                descriptor.size = size;
                descriptor.nv_size = size;
            }
            (TypeKind::Plain, _) => self.lay_out_composite(ty),
            _ => {}
        }

        self.types[ty.index()].flags |= TypeFlags::IS_LAID_OUT;
        in_progress.remove(&ty);
        Ok(())
    }

    /// Types whose sizes must be known before `ty` can be laid out.
    ///
    /// Pointee types are not dependencies: a pointer's size is fixed.
    /// Conversion and delegate edges do not embed their base.
    fn layout_dependencies(&self, ty: TypeId) -> Vec<TypeId> {
        let descriptor = &self.types[ty.index()];
        match descriptor.kind {
            TypeKind::Array => descriptor.element.into_iter().collect(),
            TypeKind::Plain => descriptor
                .bases
                .iter()
                .map(|&edge| &self.edges[edge.index()])
                .filter(|edge| edge.kind.is_subtype())
                .map(|edge| edge.base)
                .chain(descriptor.members.iter().map(|m| m.ty))
                .collect(),
            _ => Vec::new(),
        }
    }

    fn lay_out_composite(&mut self, ty: TypeId) {
        let base_edges: Vec<EdgeId> = self.types[ty.index()].bases.clone();

        let mut offset = 0;
        for &id in &base_edges {
            let edge = self.edges[id.index()];
            let base_size = self.types[edge.base.index()].nv_size;
            match edge.kind {
                RelationKind::Subtype => {
                    self.edges[id.index()].offset = offset;
                    offset += base_size;
                }
                RelationKind::VirtualFixedOffset => offset = offset.max(edge.offset + base_size),
                _ => {}
            }
        }

        let mut members = std::mem::take(&mut self.types[ty.index()].members);
        for member in &mut members {
            member.offset = offset;
            offset += self.size_of(member.ty);
        }
        self.types[ty.index()].members = members;

        let nv_size = offset.max(self.types[ty.index()].size);

        // Virtual bases of the whole hierarchy, deduplicated, bases' own first.
        let mut virtual_bases: Vec<TypeId> = Vec::new();
        for &id in &base_edges {
            let edge = self.edges[id.index()];
            if !edge.kind.is_subtype() {
                continue;
            }
            for &(inherited, _) in &self.types[edge.base.index()].virtual_bases {
                if !virtual_bases.contains(&inherited) {
                    virtual_bases.push(inherited);
                }
            }
            if edge.kind == RelationKind::VirtualSubtype && !virtual_bases.contains(&edge.base) {
                virtual_bases.push(edge.base);
            }
        }

        let mut size = nv_size;
        let mut placed = Vec::with_capacity(virtual_bases.len());
        for base in virtual_bases {
            placed.push((base, size));
            size += self.types[base.index()].nv_size;
        }
        for &id in &base_edges {
            let edge = self.edges[id.index()];
            if edge.kind == RelationKind::VirtualSubtype {
                if let Some(&(_, at)) = placed.iter().find(|(base, _)| *base == edge.base) {
                    self.edges[id.index()].offset = at;
                }
            }
        }

        let descriptor = &mut self.types[ty.index()];
        descriptor.nv_size = nv_size;
        descriptor.size = size;
        descriptor.virtual_bases = placed;
    }

    /// First-reached edge kind and absolute offset of every subtype
    /// ancestor of `root`, walking bases depth-first in declaration order.
    pub(crate) fn ancestor_paths(&self, root: TypeId) -> FxHashMap<TypeId, (RelationKind, usize)> {
        let virtual_offset = |base: TypeId| {
            self.types[root.index()]
                .virtual_bases
                .iter()
                .find(|(vb, _)| *vb == base)
                .map_or(0, |&(_, at)| at)
        };

        let mut paths = FxHashMap::default();
        let mut stack = Vec::new();
        self.push_bases(root, 0, &virtual_offset, &mut stack);
        while let Some((ty, kind, offset)) = stack.pop() {
            if ty == root || paths.contains_key(&ty) {
                continue;
            }
            paths.insert(ty, (kind, offset));
            self.push_bases(ty, offset, &virtual_offset, &mut stack);
        }
        paths
    }

    fn push_bases(
        &self,
        ty: TypeId,
        at: usize,
        virtual_offset: &impl Fn(TypeId) -> usize,
        stack: &mut Vec<(TypeId, RelationKind, usize)>,
    ) {
        for &id in self.types[ty.index()].bases.iter().rev() {
            let edge = &self.edges[id.index()];
            let offset = match edge.kind {
                RelationKind::VirtualSubtype => virtual_offset(edge.base),
                RelationKind::Subtype | RelationKind::VirtualFixedOffset => at + edge.offset,
                RelationKind::Conversion | RelationKind::Delegate => continue,
            };
            stack.push((edge.base, edge.kind, offset));
        }
    }

    /// Resolve `name` on `ty`: own members, then ancestors in linearization
    /// order, then delegates.
    pub fn member(&self, ty: TypeId, name: Name) -> Result<ResolvedMember, TypeError> {
        self.require_at_least(Phase::Allocated, "resolve a member")?;

        let mut visited = FxHashSet::default();
        let mut pending = vec![(ty, 0usize)];
        while let Some((current, base)) = pending.pop() {
            if !visited.insert(current) {
                continue;
            }
            for ancestor in self.linearization(current) {
                let declared = &self.types[ancestor.ty.index()].members;
                if let Some(member) = declared.iter().find(|m| m.name == name) {
                    return Ok(ResolvedMember {
                        name,
                        ty: member.ty,
                        owner: ancestor.ty,
                        offset: base + ancestor.offset + member.offset,
                    });
                }
            }
            for &id in self.types[current.index()].bases.iter().rev() {
                let edge = &self.edges[id.index()];
                if edge.kind == RelationKind::Delegate {
                    pending.push((edge.base, base + edge.offset));
                }
            }
        }

        Err(TypeError::MemberNotFound {
            ty: self.type_label(ty),
            member: name.to_string(),
        })
    }
}
