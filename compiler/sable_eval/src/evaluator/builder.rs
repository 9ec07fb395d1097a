//! `EvaluatorBuilder` for assembling an evaluator's types and globals.

use std::rc::Rc;

use sable_ir::{intern, Name};
use sable_types::{Arity, Phase, Signature, TypeRegistry};

use super::{EvalConfig, Evaluator};
use crate::environment::{Frame, FrameTracker};
use crate::errors::EvalResult;
use crate::multimethod::define_method;
use crate::value::{NativeFn, NativeFnPtr};
use crate::{natives, Value};

/// Builder for [`Evaluator`].
///
/// Registrations are applied in order: standard natives, then natives,
/// globals and methods as given. A later binding of the same name
/// replaces an earlier one, except that methods accumulate.
pub struct EvaluatorBuilder {
    types: Option<TypeRegistry>,
    config: EvalConfig,
    standard_natives: bool,
    natives: Vec<NativeFn>,
    globals: Vec<(Name, Value)>,
    methods: Vec<(Name, Signature, Value)>,
}

impl EvaluatorBuilder {
    pub fn new() -> Self {
        Self {
            types: None,
            config: EvalConfig::default(),
            standard_natives: true,
            natives: Vec::new(),
            globals: Vec::new(),
            methods: Vec::new(),
        }
    }

    /// Use `registry` instead of the builtin-only registry. Registries not
    /// yet sealed are sealed by `build`.
    #[must_use]
    pub fn types(mut self, registry: TypeRegistry) -> Self {
        self.types = Some(registry);
        self
    }

    #[must_use]
    pub fn config(mut self, config: EvalConfig) -> Self {
        self.config = config;
        self
    }

    /// Enable or disable the compile pass.
    #[must_use]
    pub fn compile(mut self, compile: bool) -> Self {
        self.config.compile = compile;
        self
    }

    /// Leave out the standard natives (`+`, `car`, ...).
    #[must_use]
    pub fn without_standard_natives(mut self) -> Self {
        self.standard_natives = false;
        self
    }

    /// Bind a native function globally.
    #[must_use]
    pub fn native(mut self, name: &str, arity: Arity, func: NativeFnPtr) -> Self {
        self.natives.push(NativeFn {
            name: intern(name),
            arity,
            func,
        });
        self
    }

    /// Bind an arbitrary value globally.
    #[must_use]
    pub fn global(mut self, name: &str, value: Value) -> Self {
        self.globals.push((intern(name), value));
        self
    }

    /// Add a candidate to the global multimethod `name`.
    #[must_use]
    pub fn method(mut self, name: &str, signature: Signature, callable: Value) -> Self {
        self.methods.push((intern(name), signature, callable));
        self
    }

    #[tracing::instrument(level = "debug", skip_all)]
    pub fn build(self) -> EvalResult<Evaluator> {
        let mut types = self.types.unwrap_or_default();
        match types.phase() {
            Phase::Registering => types.seal()?,
            Phase::Linearized => types.allocate()?,
            Phase::Allocated => {}
        }

        let global = Frame::root();
        if self.standard_natives {
            natives::install(&global)?;
        }
        for native in self.natives {
            global.define(native.name, Value::Native(Rc::new(native)));
        }
        for (name, value) in self.globals {
            global.define(name, value);
        }
        for (name, signature, callable) in self.methods {
            define_method(&global, name, signature, callable)?;
        }
        tracing::debug!(
            globals = global.len(),
            types = types.len(),
            compile = self.config.compile,
            "evaluator built"
        );

        Ok(Evaluator {
            types,
            initial: global.bindings(),
            global,
            frames: FrameTracker::default(),
            config: self.config,
            epoch: 0,
        })
    }
}

impl Default for EvaluatorBuilder {
    fn default() -> Self {
        Self::new()
    }
}
