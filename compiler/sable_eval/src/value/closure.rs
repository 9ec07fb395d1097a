use std::rc::Rc;

use sable_ir::Name;
use sable_types::Arity;

use crate::environment::Frame;

use super::Value;

/// How a closure came to be.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ClosureKind {
    /// Written with `lambda`, `define` sugar or named `let`.
    Lambda,
    /// Built by applying a callable to blank arguments.
    Partial,
}

/// A procedure closed over the frame it was created in.
pub struct Closure {
    pub(crate) name: Option<Name>,
    pub(crate) params: Rc<[Name]>,
    /// Collects the arguments past `params` as a list.
    pub(crate) rest: Option<Name>,
    /// Body expressions, as a list.
    pub(crate) body: Value,
    pub(crate) env: Frame,
    pub(crate) kind: ClosureKind,
}

impl Closure {
    pub fn name(&self) -> Option<Name> {
        self.name
    }

    pub fn params(&self) -> &[Name] {
        &self.params
    }

    pub fn rest(&self) -> Option<Name> {
        self.rest
    }

    pub fn body(&self) -> &Value {
        &self.body
    }

    pub fn env(&self) -> &Frame {
        &self.env
    }

    pub fn kind(&self) -> ClosureKind {
        self.kind
    }

    pub fn arity(&self) -> Arity {
        match self.rest {
            Some(_) => Arity::at_least(self.params.len()),
            None => Arity::exact(self.params.len()),
        }
    }

    /// Binding names of an invocation frame, in slot order.
    pub(crate) fn frame_names(&self) -> impl Iterator<Item = Name> + '_ {
        self.params.iter().copied().chain(self.rest)
    }
}
