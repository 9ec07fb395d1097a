//! Stack guards for recursive passes.
//!
//! The evaluator itself never recurses per step, but a handful of
//! startup and inspection passes walk type graphs and value trees
//! recursively: base-first layout, C3 linearization of deep
//! hierarchies, and `Debug` rendering of nested values. Those wrap
//! each level in [`ensure_sufficient_stack`].
//!
//! On WASM, where `stacker` is unavailable, the closure runs directly.

/// Run `f`, growing the native stack first if less than the red zone remains.
#[inline]
#[cfg(not(target_arch = "wasm32"))]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    /// Minimum stack space to keep available (100KB red zone).
    const RED_ZONE: usize = 100 * 1024;

    /// Stack space to allocate when growing (1MB).
    const STACK_PER_RECURSION: usize = 1024 * 1024;

    stacker::maybe_grow(RED_ZONE, STACK_PER_RECURSION, f)
}

/// WASM manages its own stack.
#[inline]
#[cfg(target_arch = "wasm32")]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    f()
}
