//! C3 linearization.
//!
//! [`c3_linearize`] is a pure graph algorithm over caller-supplied base
//! lists; it knows nothing about the registry. `TypeRegistry::linearize`
//! applies it to every descriptor using the subtype-kind edges.
//!
//! ```text
//! L(T) = [T] ++ merge(L(B1), ..., L(Bn), [B1, ..., Bn])
//! ```
//!
//! The merge repeatedly takes the first head that appears in no other
//! sequence's tail. When no such head exists the bases disagree on the
//! relative order of some shared ancestor and linearization fails.

use std::hash::Hash;

use rustc_hash::{FxHashMap, FxHashSet};
use sable_stack::ensure_sufficient_stack;

use crate::registry::Phase;
use crate::{Ancestor, LinearizationFailureReason, TypeError, TypeId, TypeRegistry};

/// Failure to linearize `ty`.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct LinearizationError<K> {
    pub ty: K,
    pub reason: LinearizationFailureReason,
}

/// Memoizing C3 linearizer.
///
/// Bases are linearized before the types that derive from them, and each
/// result is computed once per `Linearizer`.
#[derive(Clone, Debug)]
pub struct Linearizer<K> {
    memo: FxHashMap<K, Vec<K>>,
    in_progress: FxHashSet<K>,
}

impl<K: Copy + Eq + Hash> Linearizer<K> {
    pub fn new() -> Self {
        Self {
            memo: FxHashMap::default(),
            in_progress: FxHashSet::default(),
        }
    }

    /// Linearization of `ty`: `ty` first, then its ancestors in C3 order.
    pub fn linearize<F, I>(&mut self, ty: K, bases: &F) -> Result<&[K], LinearizationError<K>>
    where
        F: Fn(K) -> I,
        I: IntoIterator<Item = K>,
    {
        if let Err(e) = self.resolve(ty, bases) {
            self.in_progress.clear();
            return Err(e);
        }
        Ok(self.memo.get(&ty).map_or(&[], Vec::as_slice))
    }

    fn resolve<F, I>(&mut self, ty: K, bases: &F) -> Result<(), LinearizationError<K>>
    where
        F: Fn(K) -> I,
        I: IntoIterator<Item = K>,
    {
        if self.memo.contains_key(&ty) {
            return Ok(());
        }
        if !self.in_progress.insert(ty) {
            return Err(LinearizationError {
                ty,
                reason: LinearizationFailureReason::Cycle,
            });
        }

        let direct: Vec<K> = bases(ty).into_iter().collect();
        for &base in &direct {
            ensure_sufficient_stack(|| self.resolve(base, bases))?;
        }

        let mut sequences: Vec<&[K]> = direct
            .iter()
            .map(|base| self.memo.get(base).map_or(&[][..], Vec::as_slice))
            .collect();
        sequences.push(&direct);

        let mut linearization = Vec::with_capacity(direct.len() + 1);
        linearization.push(ty);
        if !merge(&sequences, &mut linearization) {
            return Err(LinearizationError {
                ty,
                reason: LinearizationFailureReason::InconsistentPrecedence,
            });
        }

        self.in_progress.remove(&ty);
        self.memo.insert(ty, linearization);
        Ok(())
    }
}

impl<K: Copy + Eq + Hash> Default for Linearizer<K> {
    fn default() -> Self {
        Self::new()
    }
}

/// C3 merge of `sequences` onto `out`. Returns `false` on inconsistent precedence.
fn merge<K: Copy + Eq>(sequences: &[&[K]], out: &mut Vec<K>) -> bool {
    let mut cursors = vec![0usize; sequences.len()];
    loop {
        let in_any_tail = |candidate: &K| {
            sequences
                .iter()
                .zip(&cursors)
                .any(|(seq, &at)| seq.get(at + 1..).is_some_and(|tail| tail.contains(candidate)))
        };
        let next = sequences
            .iter()
            .zip(&cursors)
            .filter_map(|(seq, &at)| seq.get(at))
            .find(|head| !in_any_tail(head))
            .copied();

        let Some(head) = next else {
            return sequences
                .iter()
                .zip(&cursors)
                .all(|(seq, &at)| at >= seq.len());
        };
        out.push(head);
        for (seq, at) in sequences.iter().zip(cursors.iter_mut()) {
            if seq.get(*at) == Some(&head) {
                *at += 1;
            }
        }
    }
}

/// Linearize `root` over the base lists produced by `bases`.
///
/// Convenience wrapper around a fresh [`Linearizer`]; use the linearizer
/// directly to share memoized results across many roots.
pub fn c3_linearize<K, F, I>(root: K, bases: F) -> Result<Vec<K>, LinearizationError<K>>
where
    K: Copy + Eq + Hash,
    F: Fn(K) -> I,
    I: IntoIterator<Item = K>,
{
    Linearizer::new()
        .linearize(root, &bases)
        .map(<[K]>::to_vec)
}

impl TypeRegistry {
    /// Compute the linearization of every registered type.
    ///
    /// Runs once, after registration and before `allocate()`. Only
    /// subtype-kind edges take part; conversion and delegate edges do not
    /// make a type an ancestor.
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn linearize(&mut self) -> Result<(), TypeError> {
        self.require_phase(Phase::Registering, "linearize")?;

        let mut linearizer = Linearizer::new();
        let mut orders = Vec::with_capacity(self.types.len());
        {
            let bases = |ty: TypeId| self.subtype_bases(ty);
            for ty in self.ids() {
                let order = linearizer.linearize(ty, &bases).map_err(|e| {
                    TypeError::LinearizationFailure {
                        ty: self.type_label(e.ty),
                        reason: e.reason,
                    }
                })?;
                orders.push(order.to_vec());
            }
        }

        for (ty, order) in self.ids().zip(orders) {
            let linearization = self.ancestors_from_order(ty, order);
            tracing::trace!(ty = %self.name(ty), len = linearization.len(), "linearized");
            self.types[ty.index()].linearization = linearization;
        }

        self.phase = Phase::Linearized;
        tracing::debug!(types = self.types.len(), "linearization complete");
        Ok(())
    }

    /// Pair a C3 order with the edge kind and offset through which each
    /// ancestor is first reached.
    pub(crate) fn ancestors_from_order(&self, ty: TypeId, order: Vec<TypeId>) -> Vec<Ancestor> {
        let paths = self.ancestor_paths(ty);
        order
            .into_iter()
            .map(|ancestor| {
                let (via, offset) = if ancestor == ty {
                    (None, 0)
                } else {
                    paths
                        .get(&ancestor)
                        .map_or((None, 0), |&(kind, offset)| (Some(kind), offset))
                };
                Ancestor {
                    ty: ancestor,
                    via,
                    offset,
                }
            })
            .collect()
    }

    /// Direct bases of `ty` through subtype-kind edges, in declaration order.
    pub(crate) fn subtype_bases(&self, ty: TypeId) -> Vec<TypeId> {
        self.types[ty.index()]
            .bases
            .iter()
            .map(|&edge| &self.edges[edge.index()])
            .filter(|edge| edge.kind.is_subtype())
            .map(|edge| edge.base)
            .collect()
    }
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]
mod tests;
