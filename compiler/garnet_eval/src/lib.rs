//! Garnet Eval - scoping and control-flow semantics engine.
//!
//! This crate evaluates instruction trees from `garnet_ir`.
//!
//! # Architecture
//!
//! - `resolve`: static pass deciding which scope owns each local and which
//!   reads happen before any declaration
//! - `Environment`: scope chain of opaque and transparent scopes
//! - `coerce`: conversions behind splats, double splats and multi-assignment
//! - `exec::bind`: argument binding for methods, lambdas and blocks
//! - `CallStack`: live frames that `return` and `break` are addressed to
//! - `Interpreter`: the tree walker tying these together
//!
//! Evaluation returns [`EvalResult`]; errors and non-local exits travel
//! together as [`ControlAction`].

mod call_stack;
pub mod coerce;
mod environment;
pub mod errors;
mod eval_mode;
pub mod exec;
pub mod interpreter;
mod operators;
pub mod resolve;
mod value;

use std::sync::Once;

pub use call_stack::{CallFrame, CallStack, FrameKind};
pub use environment::{Environment, LocalScope, Scope, ScopeKind};
pub use errors::{
    Arity, BreakTarget, ControlAction, ErrorCategory, EvalBacktrace, EvalError, EvalErrorKind,
    EvalResult, FrameId, Signal,
};
pub use eval_mode::EvalMode;
pub use exec::bind::{plan_arguments, BindMode, BindPlan, Binding, CallArgs};
pub use interpreter::{Interpreter, InterpreterBuilder, MethodDef};
pub use operators::evaluate_binary;
pub use resolve::{resolve_program, ResolveError, ScopeMap};
pub use value::{HashEntries, HashKey, KeywordArgs, ObjectValue, ProcData, ProcValue, ToAFn, Value};

static TRACING_INIT: Once = Once::new();

/// Install a `tracing` subscriber filtered by `RUST_LOG`.
///
/// Does nothing when `RUST_LOG` is unset. Safe to call more than once.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        if std::env::var("RUST_LOG").is_ok() {
            tracing_subscriber::registry()
                .with(fmt::layer().with_target(true).with_level(true))
                .with(EnvFilter::from_default_env())
                .init();
        }
    });
}
