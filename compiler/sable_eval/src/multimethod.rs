//! Multimethods: callables that pick an implementation by the runtime
//! types of all their arguments.

use std::cell::RefCell;

use sable_ir::Name;
use sable_types::{Arity, DispatchError, DispatchTable, Signature, TypeId, TypeRegistry};
use smallvec::SmallVec;

use crate::errors::{ambiguous_dispatch, not_applicable, wrong_type, EvalResult};
use crate::Value;

/// A named set of candidate callables with their signatures.
///
/// Candidates may be added after creation; each addition invalidates the
/// selection memo.
pub struct Multimethod {
    name: Name,
    table: RefCell<DispatchTable>,
    callables: RefCell<Vec<Value>>,
}

impl Multimethod {
    pub fn new(name: Name) -> Self {
        Self {
            name,
            table: RefCell::new(DispatchTable::new()),
            callables: RefCell::new(Vec::new()),
        }
    }

    pub fn name(&self) -> Name {
        self.name
    }

    /// Register `callable` under `signature`.
    pub fn add(&self, signature: Signature, callable: Value) -> EvalResult<()> {
        if !callable.is_callable() {
            return Err(wrong_type("callable", callable.type_name()));
        }
        self.table.borrow_mut().push(signature);
        self.callables.borrow_mut().push(callable);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.callables.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.callables.borrow().is_empty()
    }

    pub(crate) fn into_callables(self) -> Vec<Value> {
        self.callables.into_inner()
    }

    /// Union of the candidates' arities.
    pub fn arity(&self) -> Option<Arity> {
        self.table.borrow().arity()
    }

    /// The unique most specific candidate for `args`.
    pub fn select(&self, registry: &TypeRegistry, args: &[Value]) -> EvalResult {
        let types: SmallVec<[TypeId; 4]> = args.iter().map(Value::type_of).collect();
        let outcome = self.table.borrow_mut().select(registry, &types);
        match outcome {
            Ok(index) => {
                tracing::trace!(name = %self.name, index, "multimethod selected");
                self.callables
                    .borrow()
                    .get(index)
                    .cloned()
                    .ok_or_else(|| not_applicable(self.name.as_str(), &describe(registry, &types)))
            }
            Err(DispatchError::NotApplicable) => {
                Err(not_applicable(self.name.as_str(), &describe(registry, &types)))
            }
            Err(DispatchError::Ambiguous { candidates }) => {
                tracing::debug!(name = %self.name, ?candidates, "ambiguous dispatch");
                Err(ambiguous_dispatch(
                    self.name.as_str(),
                    &describe(registry, &types),
                    candidates.len(),
                ))
            }
        }
    }
}

fn describe(registry: &TypeRegistry, types: &[TypeId]) -> String {
    types
        .iter()
        .map(|&ty| registry.type_label(ty))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Add a candidate to the multimethod bound to `name` in `frame`,
/// creating and binding the multimethod on first use.
pub fn define_method(
    frame: &crate::Frame,
    name: Name,
    signature: Signature,
    callable: Value,
) -> EvalResult<()> {
    if frame.binds(name) {
        return match frame.lookup(name)? {
            Value::Multimethod(multimethod) => multimethod.add(signature, callable),
            other => Err(wrong_type("multimethod", other.type_name())),
        };
    }
    let multimethod = Multimethod::new(name);
    multimethod.add(signature, callable)?;
    frame.define(name, Value::Multimethod(std::rc::Rc::new(multimethod)));
    Ok(())
}
