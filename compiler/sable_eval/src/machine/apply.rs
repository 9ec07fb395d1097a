//! Application: arity adaptation, blank partials and overflow currying.
//!
//! For `apply(callee, args)`:
//!
//! 1. Arguments missing below the callee's minimum arity are blanks.
//! 2. Blanks among the first `max` arguments produce a partial closure over
//!    those arguments; any surplus is then applied to the partial.
//! 3. Otherwise the callee runs on the first `max` arguments and the surplus
//!    is queued as an application of its result.

use std::rc::Rc;

use sable_ir::{intern, Name};
use sable_types::Arity;

use crate::environment::Frame;
use crate::errors::{arity_mismatch, not_applicable, wrong_type, EvalResult};
use crate::value::{Closure, ClosureKind};
use crate::{Evaluator, Value};

use super::{Machine, Task, Trailing};

impl Evaluator {
    pub(crate) fn apply_in(
        &mut self,
        machine: &mut Machine,
        mut callee: Value,
        mut args: Vec<Value>,
    ) -> EvalResult<()> {
        loop {
            let arity = arity_of(&callee)?;
            if args.len() < arity.min {
                args.resize(arity.min, Value::Blank);
            }
            let max = arity.max.map_or(args.len(), |max| max.min(args.len()));
            let surplus = args.split_off(max);

            if args.iter().any(Value::is_blank) {
                let partial = self.partial(callee, args);
                if surplus.is_empty() {
                    machine.push_result(partial);
                    return Ok(());
                }
                callee = partial;
                args = surplus;
                continue;
            }

            if !surplus.is_empty() {
                machine.push(Task::ApplyTo {
                    argc: 0,
                    trailing: Trailing::Literal(surplus.into()),
                });
            }
            return self.invoke(machine, callee, args);
        }
    }

    /// Run `callee` on arguments its arity accepts.
    fn invoke(&mut self, machine: &mut Machine, callee: Value, args: Vec<Value>) -> EvalResult<()> {
        match callee {
            Value::Closure(closure) => {
                let arity = closure.arity();
                if !arity.accepts(args.len()) {
                    return Err(arity_mismatch(
                        &callable_name(closure.name),
                        &describe_arity(arity),
                        args.len(),
                    ));
                }
                let values = spread_rest(&closure, args);
                let frame = Frame::bind_new_frame(&closure.env, closure.frame_names(), values);
                self.frames.track(&frame);
                machine.push_sequence(&closure.body, &frame)
            }
            Value::Native(native) => {
                if !native.arity.accepts(args.len()) {
                    return Err(arity_mismatch(
                        native.name.as_str(),
                        &describe_arity(native.arity),
                        args.len(),
                    ));
                }
                machine.push_result(native.call(&args)?);
                Ok(())
            }
            Value::Multimethod(multimethod) => {
                let chosen = multimethod.select(&self.types, &args)?;
                self.invoke(machine, chosen, args)
            }
            Value::Continuation(continuation) => {
                let value = args.into_iter().next().unwrap_or_default();
                *machine = continuation.snapshot.clone();
                machine.push_result(value);
                tracing::debug!(depth = machine.depth(), "continuation resumed");
                Ok(())
            }
            other => Err(wrong_type("callable", other.type_name())),
        }
    }

    /// Closure standing for `callee` applied to `args`, with one parameter
    /// per blank. Supplied arguments are bound in the closure's context.
    fn partial(&mut self, callee: Value, args: Vec<Value>) -> Value {
        let callee_name = intern("%callee");
        let mut params = Vec::new();
        let mut bindings = vec![(callee_name, callee)];
        let mut call = Vec::with_capacity(args.len() + 1);
        call.push(Value::Symbol(callee_name));
        for (index, arg) in args.into_iter().enumerate() {
            let name = if arg.is_blank() {
                let name = intern(&format!("%hole{index}"));
                params.push(name);
                name
            } else {
                let name = intern(&format!("%arg{index}"));
                bindings.push((name, arg));
                name
            };
            call.push(Value::Symbol(name));
        }
        tracing::trace!(holes = params.len(), "partial application");

        let env = Frame::with_bindings(None, bindings);
        self.frames.track(&env);
        Value::Closure(Rc::new(Closure {
            name: None,
            params: params.into(),
            rest: None,
            body: Value::list([Value::list(call)]),
            env,
            kind: ClosureKind::Partial,
        }))
    }
}

/// Argument counts `callee` accepts.
pub(crate) fn arity_of(callee: &Value) -> EvalResult<Arity> {
    match callee {
        Value::Closure(closure) => Ok(closure.arity()),
        Value::Native(native) => Ok(native.arity),
        Value::Multimethod(multimethod) => multimethod
            .arity()
            .ok_or_else(|| not_applicable(multimethod.name().as_str(), "")),
        Value::Continuation(_) => Ok(Arity::range(0, 1)),
        other => Err(wrong_type("callable", other.type_name())),
    }
}

/// Positional values for an invocation frame, collecting extra arguments
/// into the rest parameter's list.
fn spread_rest(closure: &Closure, mut args: Vec<Value>) -> Vec<Value> {
    if closure.rest.is_some() {
        let extra = args.split_off(closure.params.len().min(args.len()));
        args.push(Value::list(extra));
    }
    args
}

fn callable_name(name: Option<Name>) -> String {
    name.map_or_else(|| "lambda".to_string(), |name| name.as_str().to_string())
}

fn describe_arity(arity: Arity) -> String {
    match arity.max {
        Some(max) if max == arity.min => max.to_string(),
        Some(max) => format!("{}..={max}", arity.min),
        None => format!("at least {}", arity.min),
    }
}
