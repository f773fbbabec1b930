//! Builder for interpreter instances.

use rustc_hash::FxHashMap;

use garnet_ir::{ExprArena, Name, StringInterner};

use super::{BuiltinNames, Interpreter};
use crate::call_stack::CallStack;
use crate::environment::Environment;
use crate::eval_mode::EvalMode;
use crate::resolve::ScopeMap;
use crate::value::Value;

/// Builder for an [`Interpreter`].
///
/// ```text
/// let mut interpreter = InterpreterBuilder::new(&interner, &arena)
///     .mode(EvalMode::TestRun)
///     .local("argv", Value::array(vec![]))
///     .build();
/// ```
pub struct InterpreterBuilder<'a> {
    interner: &'a StringInterner,
    arena: &'a ExprArena,
    mode: EvalMode,
    locals: Vec<(Name, Value)>,
}

impl<'a> InterpreterBuilder<'a> {
    pub fn new(interner: &'a StringInterner, arena: &'a ExprArena) -> Self {
        Self {
            interner,
            arena,
            mode: EvalMode::default(),
            locals: Vec::new(),
        }
    }

    /// Set the evaluation mode, which decides the call depth limit.
    #[must_use]
    pub fn mode(mut self, mode: EvalMode) -> Self {
        self.mode = mode;
        self
    }

    /// Bind a top-level local before the program runs.
    #[must_use]
    pub fn local(mut self, name: &str, value: Value) -> Self {
        self.locals.push((self.interner.intern(name), value));
        self
    }

    pub fn build(self) -> Interpreter<'a> {
        let mut env = Environment::new();
        for (name, value) in self.locals {
            env.define(name, value);
        }
        Interpreter {
            interner: self.interner,
            arena: self.arena,
            env,
            scopes: ScopeMap::default(),
            methods: FxHashMap::default(),
            call_stack: CallStack::new(self.mode.max_call_depth()),
            names: BuiltinNames::new(self.interner),
            mode: self.mode,
        }
    }
}
