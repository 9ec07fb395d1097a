//! Sable Eval - values, environments and the trampolined evaluator.
//!
//! # Architecture
//!
//! - [`Value`]: closed sum of runtime values; programs are values too
//! - [`Frame`]: insertion-ordered bindings with a context chain
//! - [`Multimethod`]: callables selected by the types of all arguments
//! - [`Evaluator`]: control/result stack machine stepping one task at a
//!   time, so interpreted nesting never grows the native stack
//! - [`Evaluator::compile`]: optional `(depth, slot)` pre-resolution
//! - [`natives`]: arithmetic, comparison and pair primitives
//!
//! Startup order is type registration, `linearize()`, `allocate()`, then
//! [`EvaluatorBuilder::build`], which seals the registry if needed.

mod compile;
mod environment;
pub mod errors;
mod evaluator;
mod machine;
mod multimethod;
pub mod natives;
mod value;

use std::sync::Once;

pub use compile::LocalRef;
pub use environment::Frame;
pub use errors::{EvalError, EvalErrorKind, EvalResult};
pub use evaluator::{EvalConfig, Evaluator, EvaluatorBuilder, COMPILE_ENV_VAR};
pub use machine::Continuation;
pub use multimethod::{define_method, Multimethod};
pub use value::{Closure, ClosureKind, Cons, ListIter, NativeFn, NativeFnPtr, RefValue, Value};

// Re-export error constructors (canonical path is sable_eval::errors::*)
pub use errors::{
    ambiguous_dispatch, arity_mismatch, division_by_zero, integer_overflow,
    linearization_failure, malformed_form, member_not_found, native_failure, not_applicable,
    variable_not_found, wrong_type,
};

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for debug output.
///
/// Call this once at startup. Safe to call multiple times.
/// Enable with `RUST_LOG=sable_eval=debug` or `RUST_LOG=sable_types=trace`.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        // Only initialize if RUST_LOG is set
        if std::env::var("RUST_LOG").is_ok() {
            let filter = EnvFilter::from_default_env();
            tracing_subscriber::registry()
                .with(fmt::layer().with_target(true).with_level(true))
                .with(filter)
                .init();
        }
    });
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]
mod tests;
