//! Optional pre-resolution of variable references.
//!
//! [`Evaluator::compile`] rewrites symbol references that resolve
//! lexically into [`LocalRef`]s addressing a binding by
//! `(depth, slot)`. A reference is only trusted while no `define` has
//! appended a binding since it was compiled (the epoch matches) and the
//! addressed binding still has the expected name; otherwise evaluation
//! falls back to lookup by name. Unresolved symbols are left alone.

use std::rc::Rc;

use sable_ir::{interner, Keyword, Name};
use sable_stack::ensure_sufficient_stack;

use crate::environment::Frame;
use crate::errors::EvalResult;
use crate::{Evaluator, Value};

/// Compiled variable reference.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LocalRef {
    pub name: Name,
    /// Context hops from the current frame.
    pub depth: usize,
    /// Binding index within that frame.
    pub slot: usize,
    /// Evaluator epoch at compile time.
    pub epoch: u64,
}

/// Compile-time picture of the frame chain, innermost last.
struct Scope {
    frames: Vec<Vec<Name>>,
    epoch: u64,
}

impl Scope {
    fn from_env(env: &Frame, epoch: u64) -> Self {
        let mut frames = Vec::new();
        let mut frame = Some(env.clone());
        while let Some(current) = frame {
            frames.push(current.names());
            frame = current.context();
        }
        frames.reverse();
        Self { frames, epoch }
    }

    fn resolve(&self, name: Name) -> Option<LocalRef> {
        self.frames
            .iter()
            .rev()
            .enumerate()
            .find_map(|(depth, names)| {
                names.iter().position(|&n| n == name).map(|slot| LocalRef {
                    name,
                    depth,
                    slot,
                    epoch: self.epoch,
                })
            })
    }

    fn with_frame<T>(&mut self, names: Vec<Name>, f: impl FnOnce(&mut Self) -> T) -> T {
        self.frames.push(names);
        let out = f(self);
        self.frames.pop();
        out
    }

    /// Record a binding `define` will append to the innermost frame.
    fn declare(&mut self, name: Name) {
        if let Some(innermost) = self.frames.last_mut() {
            if !innermost.contains(&name) {
                innermost.push(name);
            }
        }
    }
}

impl Evaluator {
    /// Rewrite `expr` for evaluation under `env`. Evaluating the result
    /// gives the same outcome as evaluating `expr`.
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn compile(&self, expr: &Value, env: &Frame) -> Value {
        let mut scope = Scope::from_env(env, self.epoch);
        compile_expr(&mut scope, expr)
    }

    /// Value of a compiled reference, falling back to name lookup when
    /// the reference is stale.
    pub(crate) fn resolve_local(&self, local: &LocalRef, env: &Frame) -> EvalResult {
        if local.epoch == self.epoch {
            if let Some((name, value)) = env.slot(local.depth, local.slot) {
                if name == local.name {
                    return Ok(value);
                }
            }
        }
        env.lookup(local.name)
    }
}

fn compile_expr(scope: &mut Scope, expr: &Value) -> Value {
    ensure_sufficient_stack(|| match expr {
        Value::Symbol(name) => {
            if interner().keyword(*name).is_some() {
                return expr.clone();
            }
            scope
                .resolve(*name)
                .map_or_else(|| expr.clone(), |local| Value::Local(Rc::new(local)))
        }
        Value::Cons(form) => {
            let keyword = form
                .car()
                .as_symbol()
                .and_then(|name| interner().keyword(name));
            match keyword {
                Some(keyword) => compile_form(scope, keyword, expr, form.cdr()),
                None => compile_each(scope, expr),
            }
        }
        _ => expr.clone(),
    })
}

/// Compile every element of a proper list; other shapes stay as written
/// and fail at evaluation time.
fn compile_each(scope: &mut Scope, list: &Value) -> Value {
    match list.to_vec() {
        Some(items) => Value::list(items.iter().map(|item| compile_expr(scope, item))),
        None => list.clone(),
    }
}

fn compile_form(scope: &mut Scope, keyword: Keyword, form: &Value, args: &Value) -> Value {
    let head = Value::Symbol(interner().keyword_name(keyword));
    match keyword {
        Keyword::List => form.clone(),
        Keyword::Blank => compile_each(scope, form),
        Keyword::If | Keyword::Begin | Keyword::Apply1 | Keyword::ApplyTo | Keyword::CallCc => {
            if !args.is_list() {
                return form.clone();
            }
            Value::cons(head, compile_each(scope, args))
        }
        Keyword::Lambda => match args.uncons() {
            Some((params, body)) => match compile_lambda(scope, params, body) {
                Some(body) => Value::cons(head, Value::cons(params.clone(), body)),
                None => form.clone(),
            },
            None => form.clone(),
        },
        Keyword::Define => compile_define(scope, head, form, args),
        Keyword::Let => compile_let(scope, head, form, args),
    }
}

/// Compile a lambda body under a frame of its parameters.
fn compile_lambda(scope: &mut Scope, params: &Value, body: &Value) -> Option<Value> {
    let mut names = Vec::new();
    let mut iter = params.iter();
    for param in iter.by_ref() {
        names.push(param.as_symbol()?);
    }
    match iter.tail() {
        Value::Nil => {}
        Value::Symbol(rest) => names.push(*rest),
        _ => return None,
    }
    if !body.is_list() {
        return None;
    }
    Some(scope.with_frame(names, |scope| compile_each(scope, body)))
}

fn compile_define(scope: &mut Scope, head: Value, form: &Value, args: &Value) -> Value {
    match args.uncons() {
        Some((Value::Symbol(name), rest)) => {
            let rest = compile_each(scope, rest);
            scope.declare(*name);
            Value::cons(head, Value::cons(Value::Symbol(*name), rest))
        }
        Some((signature @ Value::Cons(cell), body)) => {
            let Some(name) = cell.car().as_symbol() else {
                return form.clone();
            };
            // Declared first: the body may refer to itself.
            scope.declare(name);
            match compile_lambda(scope, cell.cdr(), body) {
                Some(body) => Value::cons(head, Value::cons(signature.clone(), body)),
                None => form.clone(),
            }
        }
        _ => form.clone(),
    }
}

fn compile_let(scope: &mut Scope, head: Value, form: &Value, args: &Value) -> Value {
    let (label, rest) = match args.uncons() {
        Some((Value::Symbol(label), rest)) => (Some(*label), rest),
        _ => (None, args),
    };
    let Some((bindings, body)) = rest.uncons() else {
        return form.clone();
    };
    let Some(bindings) = bindings.to_vec() else {
        return form.clone();
    };
    if !body.is_list() {
        return form.clone();
    }

    let mut names = Vec::with_capacity(bindings.len());
    let mut compiled = Vec::with_capacity(bindings.len());
    for binding in &bindings {
        match binding.to_vec().as_deref() {
            Some([Value::Symbol(name), expr]) => {
                names.push(*name);
                compiled.push(Value::list([Value::Symbol(*name), compile_expr(scope, expr)]));
            }
            Some([Value::Symbol(name)]) => {
                names.push(*name);
                compiled.push(binding.clone());
            }
            _ => return form.clone(),
        }
    }

    let body = match label {
        Some(label) => scope.with_frame(vec![label], |scope| {
            scope.with_frame(names, |scope| compile_each(scope, body))
        }),
        None => scope.with_frame(names, |scope| compile_each(scope, body)),
    };
    let tail = Value::cons(Value::list(compiled), body);
    match label {
        Some(label) => Value::cons(head, Value::cons(Value::Symbol(label), tail)),
        None => Value::cons(head, tail),
    }
}
