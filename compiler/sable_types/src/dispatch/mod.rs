//! Multimethod candidate selection.
//!
//! A [`DispatchTable`] holds the signatures of a multimethod's candidates
//! and picks the unique most specific one for a tuple of argument types:
//!
//! 1. Keep candidates whose arity admits the call and whose every
//!    parameter accepts its argument (`Any`, or an ancestor of the
//!    argument type after stripping pointer/reference indirection).
//! 2. Narrow position by position to the candidates whose parameter is
//!    closest to the argument (lowest linearization index; `Any` ranks
//!    last).
//! 3. Exactly one survivor wins; several are an ambiguity error.
//!
//! Selections are memoized per argument-type tuple.

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::{TypeId, TypeRegistry};

/// Argument-type tuple; most calls have few arguments.
pub type ArgTypes = SmallVec<[TypeId; 4]>;

/// Declared type of one parameter.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum ParamType {
    /// Matches every argument.
    Any,
    /// Matches arguments whose type has this type in its linearization.
    Exact(TypeId),
}

/// Accepted argument counts. `max == None` is unbounded.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct Arity {
    pub min: usize,
    pub max: Option<usize>,
}

impl Arity {
    pub const fn exact(n: usize) -> Self {
        Self {
            min: n,
            max: Some(n),
        }
    }

    pub const fn at_least(n: usize) -> Self {
        Self { min: n, max: None }
    }

    pub const fn range(min: usize, max: usize) -> Self {
        Self {
            min,
            max: Some(max),
        }
    }

    #[inline]
    pub fn accepts(self, count: usize) -> bool {
        count >= self.min && self.max.map_or(true, |max| count <= max)
    }

    /// The smallest arity accepting every count either side accepts.
    pub fn union(self, other: Arity) -> Arity {
        Arity {
            min: self.min.min(other.min),
            max: match (self.max, other.max) {
                (Some(a), Some(b)) => Some(a.max(b)),
                _ => None,
            },
        }
    }
}

/// Parameter types of one candidate.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct Signature {
    params: SmallVec<[ParamType; 4]>,
    /// Type of every argument past `params`, if variadic.
    rest: Option<ParamType>,
}

impl Signature {
    pub fn new(params: impl IntoIterator<Item = ParamType>) -> Self {
        Self {
            params: params.into_iter().collect(),
            rest: None,
        }
    }

    /// Shorthand for a signature of concrete types.
    pub fn of(types: &[TypeId]) -> Self {
        Self::new(types.iter().copied().map(ParamType::Exact))
    }

    #[must_use]
    pub fn with_rest(mut self, rest: ParamType) -> Self {
        self.rest = Some(rest);
        self
    }

    pub fn params(&self) -> &[ParamType] {
        &self.params
    }

    pub fn arity(&self) -> Arity {
        match self.rest {
            Some(_) => Arity::at_least(self.params.len()),
            None => Arity::exact(self.params.len()),
        }
    }

    /// Declared type at `position`.
    pub fn param(&self, position: usize) -> Option<ParamType> {
        self.params.get(position).copied().or(self.rest)
    }
}

/// Why selection failed.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum DispatchError {
    NotApplicable,
    /// Indices of the equally specific candidates.
    Ambiguous { candidates: Vec<usize> },
}

/// Candidate signatures plus a memo of past selections.
#[derive(Clone, Debug, Default)]
pub struct DispatchTable {
    signatures: Vec<Signature>,
    cache: FxHashMap<ArgTypes, Result<usize, DispatchError>>,
}

impl DispatchTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a candidate, returning its index. Invalidates the memo.
    pub fn push(&mut self, signature: Signature) -> usize {
        self.cache.clear();
        self.signatures.push(signature);
        self.signatures.len() - 1
    }

    pub fn signatures(&self) -> &[Signature] {
        &self.signatures
    }

    pub fn len(&self) -> usize {
        self.signatures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signatures.is_empty()
    }

    /// Union of the candidates' arities; `None` without candidates.
    pub fn arity(&self) -> Option<Arity> {
        self.signatures
            .iter()
            .map(Signature::arity)
            .reduce(Arity::union)
    }

    /// Number of memoized argument-type tuples.
    pub fn cached(&self) -> usize {
        self.cache.len()
    }

    /// Select the candidate for `args`, memoizing the outcome.
    pub fn select(&mut self, registry: &TypeRegistry, args: &[TypeId]) -> Result<usize, DispatchError> {
        if let Some(hit) = self.cache.get(args) {
            return hit.clone();
        }
        let outcome = self.resolve(registry, args);
        tracing::trace!(?args, ?outcome, "dispatch table miss");
        self.cache.insert(args.iter().copied().collect(), outcome.clone());
        outcome
    }

    /// Select without consulting or filling the memo.
    pub fn resolve(&self, registry: &TypeRegistry, args: &[TypeId]) -> Result<usize, DispatchError> {
        let mut survivors: Vec<usize> = (0..self.signatures.len())
            .filter(|&i| self.applicable(registry, &self.signatures[i], args))
            .collect();
        if survivors.is_empty() {
            return Err(DispatchError::NotApplicable);
        }

        for (position, &arg) in args.iter().enumerate() {
            if survivors.len() == 1 {
                break;
            }
            let rank = |candidate: usize| {
                self.signatures[candidate]
                    .param(position)
                    .and_then(|param| distance(registry, param, arg))
                    .unwrap_or(usize::MAX)
            };
            let best = survivors.iter().map(|&c| rank(c)).min().unwrap_or(usize::MAX);
            survivors.retain(|&c| rank(c) == best);
        }

        match survivors.as_slice() {
            [winner] => Ok(*winner),
            [] => Err(DispatchError::NotApplicable),
            _ => Err(DispatchError::Ambiguous {
                candidates: survivors,
            }),
        }
    }

    fn applicable(&self, registry: &TypeRegistry, signature: &Signature, args: &[TypeId]) -> bool {
        signature.arity().accepts(args.len())
            && args.iter().enumerate().all(|(position, &arg)| {
                signature
                    .param(position)
                    .is_some_and(|param| distance(registry, param, arg).is_some())
            })
    }
}

/// Linearization distance from `arg` to `param`; `Any` is farther than
/// every concrete ancestor.
fn distance(registry: &TypeRegistry, param: ParamType, arg: TypeId) -> Option<usize> {
    match param {
        ParamType::Any => Some(usize::MAX - 1),
        ParamType::Exact(ty) => registry.ancestor_index(
            registry.strip_indirection(arg),
            registry.strip_indirection(ty),
        ),
    }
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]
mod tests;
