use sable_ir::Name;
use sable_types::Arity;

use crate::errors::EvalResult;

use super::Value;

/// Native function entry point. Arguments arrive in call order with the
/// count already checked against the declared arity.
pub type NativeFnPtr = fn(&[Value]) -> EvalResult;

/// A host-implemented procedure.
pub struct NativeFn {
    pub name: Name,
    pub arity: Arity,
    pub func: NativeFnPtr,
}

impl NativeFn {
    #[inline]
    pub fn call(&self, args: &[Value]) -> EvalResult {
        (self.func)(args)
    }
}
