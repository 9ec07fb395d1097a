//! Iterative release of value graphs.
//!
//! Values own each other through `Rc` links that can chain arbitrarily
//! far: list spines, closures capturing frames that bind other closures,
//! cells holding cells, continuations holding frames. Every `Drop` that can
//! start such a chain hands its children to [`release`], which unlinks
//! uniquely owned nodes one at a time so the native stack stays flat.

use std::mem;
use std::rc::Rc;

use crate::environment::Frame;

use super::Value;

/// A value or frame whose last strong reference may be going away.
pub(crate) enum Garbage {
    Value(Value),
    Frame(Frame),
}

/// Drop everything in `pending`. Children of uniquely owned nodes are
/// moved onto the worklist instead of being dropped in place.
pub(crate) fn release(mut pending: Vec<Garbage>) {
    while let Some(item) = pending.pop() {
        match item {
            Garbage::Frame(frame) => {
                if let Some((bindings, context)) = frame.into_parts() {
                    pending.extend(bindings.into_iter().map(|(_, value)| Garbage::Value(value)));
                    pending.extend(context.map(Garbage::Frame));
                }
            }
            Garbage::Value(value) => unlink(value, &mut pending),
        }
    }
}

/// [`release`] for a handful of values, skipping the worklist when none
/// of them can own a chain.
pub(crate) fn release_values<const N: usize>(values: [Value; N]) {
    if values.iter().any(holds_links) {
        release(values.into_iter().map(Garbage::Value).collect());
    }
}

fn holds_links(value: &Value) -> bool {
    matches!(
        value,
        Value::Cons(_)
            | Value::Closure(_)
            | Value::Ref(_)
            | Value::Multimethod(_)
            | Value::Continuation(_)
    )
}

fn unlink(value: Value, pending: &mut Vec<Garbage>) {
    match value {
        Value::Cons(cell) => {
            if let Ok(mut cell) = Rc::try_unwrap(cell) {
                pending.push(Garbage::Value(mem::take(&mut cell.car)));
                pending.push(Garbage::Value(mem::take(&mut cell.cdr)));
            }
        }
        Value::Closure(closure) => {
            if let Ok(closure) = Rc::try_unwrap(closure) {
                pending.push(Garbage::Frame(closure.env));
                pending.push(Garbage::Value(closure.body));
            }
        }
        Value::Ref(reference) => {
            if let Ok(cell) = Rc::try_unwrap(reference.cell) {
                pending.push(Garbage::Value(cell.into_inner()));
            }
        }
        Value::Multimethod(multimethod) => {
            if let Ok(multimethod) = Rc::try_unwrap(multimethod) {
                pending.extend(multimethod.into_callables().into_iter().map(Garbage::Value));
            }
        }
        Value::Continuation(continuation) => {
            if let Ok(continuation) = Rc::try_unwrap(continuation) {
                continuation.into_garbage(pending);
            }
        }
        _ => {}
    }
}
