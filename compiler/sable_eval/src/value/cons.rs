//! Cons cells and list traversal.

use std::mem;

use super::release::release_values;
use super::Value;

/// An ordered pair. Chains of pairs ending in `nil` are lists.
pub struct Cons {
    pub(crate) car: Value,
    pub(crate) cdr: Value,
}

impl Cons {
    #[inline]
    pub fn car(&self) -> &Value {
        &self.car
    }

    #[inline]
    pub fn cdr(&self) -> &Value {
        &self.cdr
    }
}

impl Drop for Cons {
    // Long spines and deeply nested cars go through the shared worklist.
    fn drop(&mut self) {
        release_values([mem::take(&mut self.car), mem::take(&mut self.cdr)]);
    }
}

/// Iterator over the `car`s of a list.
///
/// Stops at the first non-pair; [`ListIter::tail`] then reports what the
/// chain ended in (`nil` for proper lists).
pub struct ListIter<'a> {
    rest: &'a Value,
}

impl<'a> ListIter<'a> {
    pub(crate) fn new(list: &'a Value) -> Self {
        Self { rest: list }
    }

    /// The unconsumed remainder of the chain.
    pub fn tail(&self) -> &'a Value {
        self.rest
    }
}

impl<'a> Iterator for ListIter<'a> {
    type Item = &'a Value;

    fn next(&mut self) -> Option<&'a Value> {
        match self.rest {
            Value::Cons(cell) => {
                self.rest = &cell.cdr;
                Some(&cell.car)
            }
            _ => None,
        }
    }
}
