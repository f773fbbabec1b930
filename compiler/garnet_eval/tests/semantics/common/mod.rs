//! Shared helpers for the semantics suite.
//!
//! Programs are assembled with [`ExprBuilder`] and run to completion. The
//! interner and arena are leaked so the resulting interpreter can be kept
//! around for inspecting top-level locals after the run.

use garnet_eval::{EvalError, EvalMode, HashEntries, HashKey, Interpreter, InterpreterBuilder, Value};
use garnet_ir::{ExprBuilder, ExprId, Name, Param, ParamList, StringInterner};

pub struct Outcome {
    pub result: Result<Value, EvalError>,
    interner: &'static StringInterner,
    interpreter: Interpreter<'static>,
}

impl Outcome {
    pub fn value(&self) -> Value {
        self.result.clone().unwrap()
    }

    pub fn error(&self) -> &EvalError {
        self.result.as_ref().unwrap_err()
    }

    pub fn local(&self, name: &str) -> Option<Value> {
        self.interpreter.local(name)
    }

    pub fn sym(&self, s: &str) -> Value {
        Value::Symbol(self.interner.intern(s))
    }

    pub fn name(&self, s: &str) -> Name {
        self.interner.intern(s)
    }
}

/// Build a program and evaluate it.
pub fn run(build: impl FnOnce(&mut ExprBuilder<'static>) -> ExprId) -> Outcome {
    run_with(Vec::new(), build)
}

/// Build a program and evaluate it with host-provided top-level locals.
pub fn run_with(
    locals: Vec<(&str, Value)>,
    build: impl FnOnce(&mut ExprBuilder<'static>) -> ExprId,
) -> Outcome {
    garnet_eval::init_tracing();

    let interner: &'static StringInterner = Box::leak(Box::new(StringInterner::new()));
    let mut b = ExprBuilder::new(interner);
    let root = build(&mut b);
    let arena = Box::leak(Box::new(b.finish()));

    let mut builder = InterpreterBuilder::new(interner, arena).mode(EvalMode::TestRun);
    for (name, value) in locals {
        builder = builder.local(name, value);
    }
    let mut interpreter = builder.build();
    let result = interpreter.evaluate(root);
    Outcome {
        result,
        interner,
        interpreter,
    }
}

pub fn ints(ns: &[i64]) -> Value {
    Value::array(ns.iter().copied().map(Value::Int).collect())
}

pub fn array(items: Vec<Value>) -> Value {
    Value::array(items)
}

/// Hash with symbol keys.
pub fn sym_hash(outcome: &Outcome, entries: &[(&str, Value)]) -> Value {
    let mut hash = HashEntries::default();
    for (key, value) in entries {
        hash.insert(HashKey::Symbol(outcome.name(key)), value.clone());
    }
    Value::hash(hash)
}

/// Required positional parameters.
pub fn required(b: &ExprBuilder<'_>, names: &[&str]) -> ParamList {
    ParamList::new(names.iter().map(|n| Param::required(b.name(n))).collect())
}
