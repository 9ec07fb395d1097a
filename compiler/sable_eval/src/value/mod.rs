//! Runtime values.
//!
//! Heap variants are reference counted and built through the factory
//! methods on [`Value`] (`Value::int`, `Value::list`, ...). Programs are
//! values too: an expression is a `Value` whose lists are forms.
//!
//! Values are single-threaded (`Rc`), matching the evaluator.

mod closure;
mod cons;
mod native;
mod release;

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use sable_ir::{intern, Name};
use sable_stack::ensure_sufficient_stack;
use sable_types::{Instance, TypeId};

use crate::compile::LocalRef;
use crate::machine::Continuation;
use crate::multimethod::Multimethod;

pub use closure::{Closure, ClosureKind};
pub use cons::{Cons, ListIter};
pub use native::{NativeFn, NativeFnPtr};
pub(crate) use release::{release, Garbage};

/// A runtime value.
#[derive(Clone, Default)]
pub enum Value {
    #[default]
    Nil,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(Rc<str>),
    Symbol(Name),
    Cons(Rc<Cons>),
    Closure(Rc<Closure>),
    Native(Rc<NativeFn>),
    Multimethod(Rc<Multimethod>),
    Continuation(Rc<Continuation>),
    /// Placeholder argument (`_`) requesting partial application.
    Blank,
    /// Registry-typed data buffer.
    Object(Instance),
    /// Shared cell typed by a pointer or reference descriptor.
    Ref(RefValue),
    /// Compiled variable reference.
    Local(Rc<LocalRef>),
}

/// Pointer/reference to a shared cell.
#[derive(Clone)]
pub struct RefValue {
    /// Pointer or reference type.
    pub ty: TypeId,
    pub cell: Rc<RefCell<Value>>,
}

// Factory methods

impl Value {
    #[inline]
    pub fn int(n: i64) -> Value {
        Value::Int(n)
    }

    #[inline]
    pub fn float(f: f64) -> Value {
        Value::Float(f)
    }

    #[inline]
    pub fn bool(b: bool) -> Value {
        Value::Bool(b)
    }

    pub fn string(s: &str) -> Value {
        Value::Str(Rc::from(s))
    }

    /// Symbol interned through the global interner.
    pub fn symbol(text: &str) -> Value {
        Value::Symbol(intern(text))
    }

    pub fn cons(car: Value, cdr: Value) -> Value {
        Value::Cons(Rc::new(Cons { car, cdr }))
    }

    /// Proper list of `items`.
    pub fn list(items: impl IntoIterator<Item = Value>) -> Value {
        Value::improper_list(items, Value::Nil)
    }

    /// List of `items` whose final `cdr` is `tail`.
    pub fn improper_list(items: impl IntoIterator<Item = Value>, tail: Value) -> Value {
        let items: Vec<Value> = items.into_iter().collect();
        items
            .into_iter()
            .rev()
            .fold(tail, |rest, item| Value::cons(item, rest))
    }

    pub fn native(name: &str, arity: sable_types::Arity, func: NativeFnPtr) -> Value {
        Value::Native(Rc::new(NativeFn {
            name: intern(name),
            arity,
            func,
        }))
    }

    pub fn object(instance: Instance) -> Value {
        Value::Object(instance)
    }

    pub fn reference(ty: TypeId, value: Value) -> Value {
        Value::Ref(RefValue {
            ty,
            cell: Rc::new(RefCell::new(value)),
        })
    }
}

// Queries

impl Value {
    /// `#f` and `nil` are false; everything else is true.
    #[inline]
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Nil | Value::Bool(false))
    }

    #[inline]
    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    #[inline]
    pub fn is_blank(&self) -> bool {
        matches!(self, Value::Blank)
    }

    pub fn is_callable(&self) -> bool {
        matches!(
            self,
            Value::Closure(_) | Value::Native(_) | Value::Multimethod(_) | Value::Continuation(_)
        )
    }

    pub fn as_symbol(&self) -> Option<Name> {
        match self {
            Value::Symbol(name) => Some(*name),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Iterate the `car`s of a (possibly improper) list.
    pub fn iter(&self) -> ListIter<'_> {
        ListIter::new(self)
    }

    /// `car` and `cdr` of a pair.
    pub fn uncons(&self) -> Option<(&Value, &Value)> {
        match self {
            Value::Cons(cell) => Some((&cell.car, &cell.cdr)),
            _ => None,
        }
    }

    /// Whether this is a `nil`-terminated chain of pairs.
    pub fn is_list(&self) -> bool {
        let mut iter = self.iter();
        for _ in iter.by_ref() {}
        iter.tail().is_nil()
    }

    /// Elements of a proper list; `None` for anything else.
    pub fn to_vec(&self) -> Option<Vec<Value>> {
        let mut iter = self.iter();
        let items: Vec<Value> = iter.by_ref().cloned().collect();
        iter.tail().is_nil().then_some(items)
    }

    /// Registry type of this value.
    pub fn type_of(&self) -> TypeId {
        match self {
            Value::Nil => TypeId::NIL,
            Value::Bool(_) => TypeId::BOOL,
            Value::Int(_) => TypeId::INT,
            Value::Float(_) => TypeId::FLOAT,
            Value::Str(_) => TypeId::STR,
            Value::Symbol(_) | Value::Local(_) => TypeId::SYMBOL,
            Value::Cons(_) => TypeId::CONS,
            Value::Closure(_) => TypeId::CLOSURE,
            Value::Native(_) => TypeId::NATIVE,
            Value::Multimethod(_) => TypeId::MULTIMETHOD,
            Value::Continuation(_) => TypeId::CONTINUATION,
            Value::Blank => TypeId::BLANK,
            Value::Object(instance) => instance.ty(),
            Value::Ref(r) => r.ty,
        }
    }

    /// Short kind name for error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Nil => "nil",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "str",
            Value::Symbol(_) => "symbol",
            Value::Cons(_) => "cons",
            Value::Closure(_) => "closure",
            Value::Native(_) => "native",
            Value::Multimethod(_) => "multimethod",
            Value::Continuation(_) => "continuation",
            Value::Blank => "blank",
            Value::Object(_) => "object",
            Value::Ref(_) => "ref",
            Value::Local(_) => "local",
        }
    }

    /// Identity comparison: pointer equality for heap values, value
    /// equality for immediates.
    pub fn ptr_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Cons(a), Value::Cons(b)) => Rc::ptr_eq(a, b),
            (Value::Str(a), Value::Str(b)) => Rc::ptr_eq(a, b),
            (Value::Closure(a), Value::Closure(b)) => Rc::ptr_eq(a, b),
            (Value::Native(a), Value::Native(b)) => Rc::ptr_eq(a, b),
            (Value::Multimethod(a), Value::Multimethod(b)) => Rc::ptr_eq(a, b),
            (Value::Continuation(a), Value::Continuation(b)) => Rc::ptr_eq(a, b),
            (Value::Ref(a), Value::Ref(b)) => Rc::ptr_eq(&a.cell, &b.cell),
            (Value::Local(a), Value::Local(b)) => Rc::ptr_eq(a, b),
            (Value::Object(_), Value::Object(_)) => false,
            _ => self == other,
        }
    }
}

/// Structural equality for data; callables and cells compare by identity.
impl PartialEq for Value {
    fn eq(&self, other: &Value) -> bool {
        let (mut left, mut right) = (self, other);
        // Walk cdr chains in a loop; recurse only into cars.
        while let (Value::Cons(a), Value::Cons(b)) = (left, right) {
            if Rc::ptr_eq(a, b) {
                return true;
            }
            if !ensure_sufficient_stack(|| a.car == b.car) {
                return false;
            }
            left = &a.cdr;
            right = &b.cdr;
        }
        atom_eq(left, right)
    }
}

#[allow(clippy::float_cmp, reason = "value equality is exact")]
fn atom_eq(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Nil, Value::Nil) | (Value::Blank, Value::Blank) => true,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::Int(a), Value::Int(b)) => a == b,
        (Value::Float(a), Value::Float(b)) => a == b,
        (Value::Str(a), Value::Str(b)) => a == b,
        (Value::Symbol(a), Value::Symbol(b)) => a == b,
        (Value::Object(a), Value::Object(b)) => a == b,
        (Value::Closure(a), Value::Closure(b)) => Rc::ptr_eq(a, b),
        (Value::Native(a), Value::Native(b)) => Rc::ptr_eq(a, b),
        (Value::Multimethod(a), Value::Multimethod(b)) => Rc::ptr_eq(a, b),
        (Value::Continuation(a), Value::Continuation(b)) => Rc::ptr_eq(a, b),
        (Value::Ref(a), Value::Ref(b)) => Rc::ptr_eq(&a.cell, &b.cell),
        (Value::Local(a), Value::Local(b)) => a.name == b.name,
        _ => false,
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::string(s)
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => f.write_str("()"),
            Value::Bool(true) => f.write_str("#t"),
            Value::Bool(false) => f.write_str("#f"),
            Value::Int(n) => write!(f, "{n}"),
            Value::Float(x) => write!(f, "{x:?}"),
            Value::Str(s) => write!(f, "{s:?}"),
            Value::Symbol(name) => write!(f, "{name}"),
            Value::Cons(_) => {
                f.write_str("(")?;
                let mut iter = self.iter();
                let mut first = true;
                for item in iter.by_ref() {
                    if !first {
                        f.write_str(" ")?;
                    }
                    first = false;
                    ensure_sufficient_stack(|| write!(f, "{item:?}"))?;
                }
                match iter.tail() {
                    Value::Nil => f.write_str(")"),
                    tail => write!(f, " . {tail:?})"),
                }
            }
            Value::Closure(closure) => match closure.name {
                Some(name) => write!(f, "#<closure {name}>"),
                None => f.write_str("#<closure>"),
            },
            Value::Native(native) => write!(f, "#<native {}>", native.name),
            Value::Multimethod(mm) => write!(f, "#<multimethod {}>", mm.name()),
            Value::Continuation(_) => f.write_str("#<continuation>"),
            Value::Blank => f.write_str("_"),
            Value::Object(instance) => write!(f, "{instance:?}"),
            Value::Ref(r) => write!(f, "#<ref {:?}>", r.cell.borrow()),
            Value::Local(local) => write!(f, "{}@{}:{}", local.name, local.depth, local.slot),
        }
    }
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]
mod tests;
