//! The trampolined evaluation loop.
//!
//! Evaluation state is two stacks: a control stack of [`Task`]s still to do
//! and a result stack of produced values. Every step pops one task and
//! either produces a value or pushes a bounded number of new tasks; nothing
//! recurses natively, so interpreted nesting depth is limited only by heap.
//!
//! Both stacks are persistent vectors. Capturing a continuation clones
//! them in O(1) and resuming one never disturbs another snapshot, so
//! continuations may be resumed any number of times.

mod apply;
mod forms;

use std::rc::Rc;

use im::Vector;
use sable_ir::{Keyword, Name};

use crate::environment::Frame;
use crate::errors::{EvalError, EvalResult};
use crate::value::Garbage;
use crate::{Evaluator, Value};

/// One unit of pending work.
#[derive(Clone)]
pub(crate) enum Task {
    /// Evaluate `expr` under `env`, pushing one result.
    Eval { expr: Value, env: Frame },
    /// Pop the test result and evaluate one branch.
    Branch {
        then: Value,
        otherwise: Value,
        env: Frame,
    },
    /// Pop one result per name and evaluate `body` in a new frame.
    BindLet {
        label: Option<Name>,
        names: Rc<[Name]>,
        body: Value,
        env: Frame,
    },
    /// Bind the top result in `env`, leaving it in place.
    Define { name: Name, env: Frame },
    /// Drop the top result.
    Discard,
    /// Push a ready value.
    Push(Value),
    /// Pop `argc` arguments and the callee beneath them, then apply.
    Apply { argc: usize },
    /// Like `Apply`, with extra trailing arguments.
    ApplyTo { argc: usize, trailing: Trailing },
}

/// Source of the trailing arguments of [`Task::ApplyTo`].
#[derive(Clone)]
pub(crate) enum Trailing {
    /// Surplus arguments queued by overflow currying.
    Literal(Rc<[Value]>),
    /// The last popped argument is a list spread in place.
    SpreadLast,
}

/// Control and result stacks.
#[derive(Clone, Default)]
pub(crate) struct Machine {
    control: Vector<Task>,
    results: Vector<Value>,
}

impl Machine {
    pub(crate) fn new(expr: Value, env: Frame) -> Self {
        let mut machine = Machine::default();
        machine.push(Task::Eval { expr, env });
        machine
    }

    #[inline]
    pub(crate) fn push(&mut self, task: Task) {
        self.control.push_back(task);
    }

    #[inline]
    pub(crate) fn push_result(&mut self, value: Value) {
        self.results.push_back(value);
    }

    pub(crate) fn pop_result(&mut self) -> EvalResult {
        self.results
            .pop_back()
            .ok_or_else(|| EvalError::new("result stack underflow"))
    }

    /// Pop the top `n` results, oldest first.
    pub(crate) fn pop_results(&mut self, n: usize) -> EvalResult<Vec<Value>> {
        let len = self.results.len();
        if n > len {
            return Err(EvalError::new("result stack underflow"));
        }
        let top = self.results.split_off(len - n);
        Ok(top.into_iter().collect())
    }

    /// Queue `body` (a list of expressions) so that only the last value
    /// survives. An empty body yields `nil`.
    pub(crate) fn push_sequence(&mut self, body: &Value, env: &Frame) -> EvalResult<()> {
        let exprs = body
            .to_vec()
            .ok_or_else(|| crate::errors::malformed_form("begin", "body is not a proper list"))?;
        let Some((last, init)) = exprs.split_last() else {
            self.push(Task::Push(Value::Nil));
            return Ok(());
        };
        self.push(Task::Eval {
            expr: last.clone(),
            env: env.clone(),
        });
        for expr in init.iter().rev() {
            self.push(Task::Discard);
            self.push(Task::Eval {
                expr: expr.clone(),
                env: env.clone(),
            });
        }
        Ok(())
    }

    pub(crate) fn depth(&self) -> usize {
        self.control.len()
    }
}

/// A captured evaluation state.
pub struct Continuation {
    snapshot: Machine,
}

impl Continuation {
    pub(crate) fn capture(machine: &Machine) -> Self {
        Self {
            snapshot: machine.clone(),
        }
    }

    /// Pending tasks at capture time.
    pub fn depth(&self) -> usize {
        self.snapshot.depth()
    }

    /// Hand every value and frame of the snapshot to the release worklist.
    pub(crate) fn into_garbage(self, pending: &mut Vec<Garbage>) {
        let Machine { control, results } = self.snapshot;
        pending.extend(results.into_iter().map(Garbage::Value));
        for task in control {
            task.into_garbage(pending);
        }
    }
}

impl Task {
    fn into_garbage(self, pending: &mut Vec<Garbage>) {
        match self {
            Task::Eval { expr, env } => {
                pending.push(Garbage::Value(expr));
                pending.push(Garbage::Frame(env));
            }
            Task::Branch {
                then,
                otherwise,
                env,
            } => {
                pending.push(Garbage::Value(then));
                pending.push(Garbage::Value(otherwise));
                pending.push(Garbage::Frame(env));
            }
            Task::BindLet { body, env, .. } => {
                pending.push(Garbage::Value(body));
                pending.push(Garbage::Frame(env));
            }
            Task::Define { env, .. } => pending.push(Garbage::Frame(env)),
            Task::Push(value) => pending.push(Garbage::Value(value)),
            Task::ApplyTo {
                trailing: Trailing::Literal(values),
                ..
            } => pending.extend(values.iter().cloned().map(Garbage::Value)),
            Task::ApplyTo { .. } | Task::Apply { .. } | Task::Discard => {}
        }
    }
}

impl Evaluator {
    /// Step `machine` until its control stack is empty and return the
    /// single remaining result.
    pub(crate) fn run(&mut self, machine: &mut Machine) -> EvalResult {
        while let Some(task) = machine.control.pop_back() {
            self.step(machine, task)?;
        }
        let result = machine.pop_result()?;
        if !machine.results.is_empty() {
            return Err(EvalError::new(format!(
                "{} values left on the result stack",
                machine.results.len()
            )));
        }
        Ok(result)
    }

    fn step(&mut self, machine: &mut Machine, task: Task) -> EvalResult<()> {
        match task {
            Task::Eval { expr, env } => self.eval_expr(machine, expr, &env),
            Task::Branch {
                then,
                otherwise,
                env,
            } => {
                let test = machine.pop_result()?;
                let expr = if test.is_truthy() { then } else { otherwise };
                machine.push(Task::Eval { expr, env });
                Ok(())
            }
            Task::BindLet {
                label,
                names,
                body,
                env,
            } => self.bind_let(machine, label, &names, body, &env),
            Task::Define { name, env } => {
                let value = machine.pop_result()?;
                if env.define(name, value.clone()) {
                    self.epoch += 1;
                }
                machine.push_result(value);
                Ok(())
            }
            Task::Discard => machine.pop_result().map(drop),
            Task::Push(value) => {
                machine.push_result(value);
                Ok(())
            }
            Task::Apply { argc } => {
                let args = machine.pop_results(argc)?;
                let callee = machine.pop_result()?;
                self.apply_in(machine, callee, args)
            }
            Task::ApplyTo { argc, trailing } => {
                let mut args = machine.pop_results(argc)?;
                let callee = machine.pop_result()?;
                match trailing {
                    Trailing::Literal(extra) => args.extend(extra.iter().cloned()),
                    Trailing::SpreadLast => {
                        let last = args.pop().unwrap_or_default();
                        let spread = last.to_vec().ok_or_else(|| {
                            crate::errors::wrong_type("list", last.type_name())
                        })?;
                        args.extend(spread);
                    }
                }
                self.apply_in(machine, callee, args)
            }
        }
    }

    /// One `Eval` step.
    fn eval_expr(&mut self, machine: &mut Machine, expr: Value, env: &Frame) -> EvalResult<()> {
        match expr {
            Value::Symbol(name) => {
                let value = if is_blank(name) {
                    Value::Blank
                } else {
                    env.lookup(name)?
                };
                machine.push_result(value);
                Ok(())
            }
            Value::Local(local) => {
                let value = self.resolve_local(&local, env)?;
                machine.push_result(value);
                Ok(())
            }
            Value::Cons(ref form) => {
                let keyword = form
                    .car()
                    .as_symbol()
                    .and_then(|name| sable_ir::interner().keyword(name));
                match keyword {
                    Some(keyword) => forms::eval_form(machine, keyword, form.cdr(), env),
                    None => forms::push_application(machine, form.car(), form.cdr(), env),
                }
            }
            literal => {
                machine.push_result(literal);
                Ok(())
            }
        }
    }
}

fn is_blank(name: Name) -> bool {
    sable_ir::interner().keyword(name) == Some(Keyword::Blank)
}
