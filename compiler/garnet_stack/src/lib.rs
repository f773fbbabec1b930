//! Stack safety for deeply nested evaluation.
//!
//! Every recursive step of the evaluator (nested expressions, method calls,
//! block invocations) goes through [`ensure_sufficient_stack`], which grows
//! the native stack on demand instead of overflowing.
//!
//! - **Red zone**: 100KB - if less than this remains, the stack grows
//! - **Growth size**: 1MB per growth
//!
//! On WASM the function is a passthrough.

/// Minimum stack space to keep available.
const RED_ZONE: usize = 100 * 1024;

/// Stack space to allocate when growing.
const STACK_PER_RECURSION: usize = 1024 * 1024;

/// Ensure sufficient stack space is available before executing `f`.
#[inline]
#[cfg(not(target_arch = "wasm32"))]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, STACK_PER_RECURSION, f)
}

/// WASM version - just call directly (WASM has its own stack management).
#[inline]
#[cfg(target_arch = "wasm32")]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    f()
}
