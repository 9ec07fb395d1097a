//! The evaluator: owns the type registry, the global frame and the
//! bookkeeping shared by every evaluation.

mod builder;
mod config;
mod convert;

pub use builder::EvaluatorBuilder;
pub use config::{EvalConfig, COMPILE_ENV_VAR};

use sable_ir::intern;
use sable_types::{TypeId, TypeRegistry};

use crate::environment::{Frame, FrameTracker};
use crate::errors::EvalResult;
use crate::machine::Machine;
use crate::Value;

/// Trampolined evaluator.
///
/// Closures stored in the frames they capture keep those frames alive in
/// reference cycles. Dropping the evaluator (or calling
/// [`Evaluator::reset`]) clears every frame it created, including the
/// global frame; frames and closures handed out earlier are left empty.
pub struct Evaluator {
    pub(crate) types: TypeRegistry,
    pub(crate) global: Frame,
    /// Global bindings installed by the builder, restored by `reset`.
    pub(crate) initial: Vec<(sable_ir::Name, Value)>,
    pub(crate) frames: FrameTracker,
    pub(crate) config: EvalConfig,
    /// Bumped whenever `define` appends a binding; guards compiled
    /// references.
    pub(crate) epoch: u64,
}

impl Evaluator {
    pub fn builder() -> EvaluatorBuilder {
        EvaluatorBuilder::new()
    }

    /// Evaluator with the builtin types and the standard natives.
    pub fn new() -> EvalResult<Self> {
        EvaluatorBuilder::new().build()
    }

    /// The global frame.
    pub fn global(&self) -> Frame {
        self.global.clone()
    }

    pub fn types(&self) -> &TypeRegistry {
        &self.types
    }

    pub fn config(&self) -> EvalConfig {
        self.config
    }

    /// Number of `define`s that appended a binding so far.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Evaluate `expr` under `env`.
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn evaluate(&mut self, expr: &Value, env: &Frame) -> EvalResult {
        let expr = if self.config.compile {
            self.compile(expr, env)
        } else {
            expr.clone()
        };
        let mut machine = Machine::new(expr, env.clone());
        self.run(&mut machine)
    }

    /// Evaluate `expr` under the global frame.
    pub fn evaluate_global(&mut self, expr: &Value) -> EvalResult {
        let global = self.global();
        self.evaluate(expr, &global)
    }

    /// Apply `callee` to already evaluated `args`.
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn apply(&mut self, callee: &Value, args: Vec<Value>) -> EvalResult {
        let mut machine = Machine::default();
        self.apply_in(&mut machine, callee.clone(), args)?;
        self.run(&mut machine)
    }

    /// Registry type of `value`.
    pub fn type_of(&self, value: &Value) -> TypeId {
        value.type_of()
    }

    /// Bind `name` in the global frame.
    pub fn define_global(&mut self, name: &str, value: Value) {
        if self.global.define(intern(name), value) {
            self.epoch += 1;
        }
    }

    /// Break the reference cycles of every frame created so far, then
    /// start over with a global frame holding only the builder's bindings.
    pub fn reset(&mut self) {
        self.release();
        self.global = Frame::with_bindings(None, self.initial.clone());
        self.epoch += 1;
    }

    fn release(&mut self) {
        self.frames.release();
        self.global.clear();
    }

    /// Frames currently tracked for cycle breaking.
    pub fn tracked_frames(&self) -> usize {
        self.frames.len()
    }
}

impl Drop for Evaluator {
    fn drop(&mut self) {
        self.release();
    }
}
