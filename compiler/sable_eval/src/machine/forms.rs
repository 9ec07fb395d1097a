//! Special forms. Each one only pushes tasks; none evaluates natively.

use std::rc::Rc;

use sable_ir::{Keyword, Name};

use crate::environment::Frame;
use crate::errors::{malformed_form, EvalResult};
use crate::value::{Closure, ClosureKind};
use crate::{Evaluator, Value};

use super::{Continuation, Machine, Task, Trailing};

pub(super) fn eval_form(
    machine: &mut Machine,
    keyword: Keyword,
    args: &Value,
    env: &Frame,
) -> EvalResult<()> {
    match keyword {
        Keyword::List => {
            machine.push_result(args.clone());
            Ok(())
        }
        Keyword::If => eval_if(machine, args, env),
        Keyword::Let => eval_let(machine, args, env),
        Keyword::Define => eval_define(machine, args, env),
        Keyword::Lambda => {
            let (params, body) = args
                .uncons()
                .ok_or_else(|| malformed_form("lambda", "missing parameter list"))?;
            let closure = make_closure("lambda", None, params, body, env)?;
            machine.push_result(closure);
            Ok(())
        }
        Keyword::Begin => machine.push_sequence(args, env),
        Keyword::Apply1 => {
            let (operator, operands) = args
                .uncons()
                .ok_or_else(|| malformed_form("apply1", "missing operator"))?;
            push_application(machine, operator, operands, env)
        }
        Keyword::ApplyTo => eval_apply_to(machine, args, env),
        Keyword::CallCc => eval_callcc(machine, args, env),
        // `(_ ...)` applies the blank itself, which is not callable.
        Keyword::Blank => push_application(machine, &Value::Blank, args, env),
    }
}

/// Generic application `(operator operand...)`.
pub(super) fn push_application(
    machine: &mut Machine,
    operator: &Value,
    operands: &Value,
    env: &Frame,
) -> EvalResult<()> {
    let operands = operands
        .to_vec()
        .ok_or_else(|| malformed_form("application", "arguments are not a proper list"))?;
    machine.push(Task::Apply {
        argc: operands.len(),
    });
    push_operands(machine, operator, &operands, env);
    Ok(())
}

/// Queue the operator then the operands so they evaluate left to right.
fn push_operands(machine: &mut Machine, operator: &Value, operands: &[Value], env: &Frame) {
    for operand in operands.iter().rev() {
        machine.push(Task::Eval {
            expr: operand.clone(),
            env: env.clone(),
        });
    }
    machine.push(Task::Eval {
        expr: operator.clone(),
        env: env.clone(),
    });
}

fn eval_if(machine: &mut Machine, args: &Value, env: &Frame) -> EvalResult<()> {
    let parts = args
        .to_vec()
        .ok_or_else(|| malformed_form("if", "not a proper list"))?;
    let (test, then, otherwise) = match parts.as_slice() {
        [test, then] => (test, then, &Value::Nil),
        [test, then, otherwise] => (test, then, otherwise),
        _ => return Err(malformed_form("if", "expected (if test then [else])")),
    };
    machine.push(Task::Branch {
        then: then.clone(),
        otherwise: otherwise.clone(),
        env: env.clone(),
    });
    machine.push(Task::Eval {
        expr: test.clone(),
        env: env.clone(),
    });
    Ok(())
}

/// `(let [label] ((name expr)...) body...)`
fn eval_let(machine: &mut Machine, args: &Value, env: &Frame) -> EvalResult<()> {
    let (label, args) = match args.uncons() {
        Some((Value::Symbol(label), rest)) => (Some(*label), rest),
        _ => (None, args),
    };
    let (bindings, body) = args.uncons().ok_or_else(|| malformed_form("let", "missing bindings"))?;
    if !body.is_list() {
        return Err(malformed_form("let", "body is not a proper list"));
    }

    let bindings = bindings
        .to_vec()
        .ok_or_else(|| malformed_form("let", "bindings are not a list"))?;
    let mut names = Vec::with_capacity(bindings.len());
    let mut exprs = Vec::with_capacity(bindings.len());
    for binding in &bindings {
        match binding.to_vec().as_deref() {
            Some([Value::Symbol(name), expr]) => {
                names.push(*name);
                exprs.push(expr.clone());
            }
            Some([Value::Symbol(name)]) => {
                names.push(*name);
                exprs.push(Value::Nil);
            }
            _ => return Err(malformed_form("let", "each binding must be (name expr)")),
        }
    }

    machine.push(Task::BindLet {
        label,
        names: names.into(),
        body: body.clone(),
        env: env.clone(),
    });
    for expr in exprs.into_iter().rev() {
        machine.push(Task::Eval {
            expr,
            env: env.clone(),
        });
    }
    Ok(())
}

/// `(define name expr)`, `(define name)` or `(define (name . params) body...)`.
fn eval_define(machine: &mut Machine, args: &Value, env: &Frame) -> EvalResult<()> {
    let (target, rest) = args.uncons().ok_or_else(|| malformed_form("define", "missing name"))?;
    match target {
        Value::Symbol(name) => {
            let expr = match rest.to_vec().as_deref() {
                Some([]) => Value::Nil,
                Some([expr]) => expr.clone(),
                _ => return Err(malformed_form("define", "expected (define name expr)")),
            };
            machine.push(Task::Define {
                name: *name,
                env: env.clone(),
            });
            machine.push(Task::Eval {
                expr,
                env: env.clone(),
            });
        }
        Value::Cons(signature) => {
            let Value::Symbol(name) = signature.car() else {
                return Err(malformed_form("define", "procedure name must be a symbol"));
            };
            let closure = make_closure("define", Some(*name), signature.cdr(), rest, env)?;
            machine.push(Task::Define {
                name: *name,
                env: env.clone(),
            });
            machine.push(Task::Push(closure));
        }
        _ => return Err(malformed_form("define", "name must be a symbol")),
    }
    Ok(())
}

/// `(applyTo f a... list)`: the last operand's elements become trailing
/// arguments.
fn eval_apply_to(machine: &mut Machine, args: &Value, env: &Frame) -> EvalResult<()> {
    let (operator, operands) = args
        .uncons()
        .ok_or_else(|| malformed_form("applyTo", "missing operator"))?;
    let operands = operands
        .to_vec()
        .ok_or_else(|| malformed_form("applyTo", "arguments are not a proper list"))?;
    if operands.is_empty() {
        return Err(malformed_form("applyTo", "missing argument list"));
    }
    machine.push(Task::ApplyTo {
        argc: operands.len(),
        trailing: Trailing::SpreadLast,
    });
    push_operands(machine, operator, &operands, env);
    Ok(())
}

/// `(callcc f)`: apply `f` to the continuation of this form.
fn eval_callcc(machine: &mut Machine, args: &Value, env: &Frame) -> EvalResult<()> {
    let receiver = match args.to_vec().as_deref() {
        Some([receiver]) => receiver.clone(),
        _ => return Err(malformed_form("callcc", "expected exactly one argument")),
    };
    let continuation = Continuation::capture(machine);
    tracing::debug!(depth = machine.depth(), "continuation captured");
    machine.push(Task::Apply { argc: 1 });
    machine.push(Task::Push(Value::Continuation(Rc::new(continuation))));
    machine.push(Task::Eval {
        expr: receiver,
        env: env.clone(),
    });
    Ok(())
}

impl Evaluator {
    /// Finish a `let` once its values are on the result stack.
    pub(super) fn bind_let(
        &mut self,
        machine: &mut Machine,
        label: Option<Name>,
        names: &Rc<[Name]>,
        body: Value,
        env: &Frame,
    ) -> EvalResult<()> {
        let values = machine.pop_results(names.len())?;
        let scope = match label {
            Some(label) => {
                // The label lives in its own frame so the loop closure can
                // see itself without leaking into `env`.
                let scope = env.child();
                self.frames.track(&scope);
                let closure = Closure {
                    name: Some(label),
                    params: Rc::clone(names),
                    rest: None,
                    body: body.clone(),
                    env: scope.clone(),
                    kind: ClosureKind::Lambda,
                };
                scope.define(label, Value::Closure(Rc::new(closure)));
                scope
            }
            None => env.clone(),
        };
        let frame = Frame::bind_new_frame(&scope, names.iter().copied(), values);
        self.frames.track(&frame);
        machine.push_sequence(&body, &frame)
    }
}

fn make_closure(
    form: &str,
    name: Option<Name>,
    params: &Value,
    body: &Value,
    env: &Frame,
) -> EvalResult<Value> {
    let mut names = Vec::new();
    let mut iter = params.iter();
    for param in iter.by_ref() {
        let name = param
            .as_symbol()
            .ok_or_else(|| malformed_form(form, "parameters must be symbols"))?;
        names.push(name);
    }
    let rest = match iter.tail() {
        Value::Nil => None,
        Value::Symbol(rest) => Some(*rest),
        _ => return Err(malformed_form(form, "rest parameter must be a symbol")),
    };
    if !body.is_list() {
        return Err(malformed_form(form, "body is not a proper list"));
    }
    Ok(Value::Closure(Rc::new(Closure {
        name,
        params: names.into(),
        rest,
        body: body.clone(),
        env: env.clone(),
        kind: ClosureKind::Lambda,
    })))
}
