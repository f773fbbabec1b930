//! Tree-walking interpreter.
//!
//! All evaluation goes through [`Interpreter::eval`]. Helper modules split
//! the work:
//!
//! - `function_call` - calls, `yield`, argument materialization
//! - `control_flow` - conditionals, loops, `begin`/`rescue`/`ensure`, and
//!   the emission of `return`/`break`/`next`/`redo`
//! - `scope_guard` - RAII guards for scopes and call frames
//!
//! # Non-local exits
//!
//! A `return` or `break` is addressed to a [`FrameId`] when it is
//! evaluated. Frames that are not the target let the action pass through;
//! the target frame converts it back into a value. Block literals record
//! their home frame (for `return`) and the call they were passed to (for
//! `break`) when they are created, and both are checked for liveness
//! before a signal is emitted.

mod builder;
mod control_flow;
mod function_call;
mod scope_guard;

pub use builder::InterpreterBuilder;
pub use scope_guard::{FramedInterpreter, ScopedInterpreter};

use std::rc::Rc;

use rustc_hash::FxHashMap;
use tracing::debug;

use garnet_ir::{Elem, ExprArena, ExprId, ExprKind, HashEntry, Name, ParamList, StringInterner};
use garnet_stack::ensure_sufficient_stack;

use crate::call_stack::{CallFrame, CallStack, FrameKind};
use crate::coerce::{
    build_sequence_literal, normalize_multi_assign_rhs, to_hash_entries, SequenceItem,
};
use crate::environment::Environment;
use crate::errors::{
    invalid_program, undefined_variable, ControlAction, EvalError, EvalResult, FrameId,
};
use crate::eval_mode::EvalMode;
use crate::exec::bind::CallArgs;
use crate::operators::evaluate_binary;
use crate::resolve::{resolve_program, ScopeMap};
use crate::value::{HashEntries, HashKey, ProcData, ProcValue, Value};

/// Builtin method names, interned once at construction so dispatch
/// compares `Name`s instead of strings.
#[derive(Clone, Copy)]
pub(crate) struct BuiltinNames {
    pub(crate) block_given: Name,
    pub(crate) proc_: Name,
    pub(crate) lambda: Name,
    pub(crate) loop_: Name,
}

impl BuiltinNames {
    fn new(interner: &StringInterner) -> Self {
        BuiltinNames {
            block_given: interner.intern("block_given?"),
            proc_: interner.intern("proc"),
            lambda: interner.intern("lambda"),
            loop_: interner.intern("loop"),
        }
    }
}

/// A method registered by `def`.
#[derive(Debug)]
pub struct MethodDef {
    pub name: Name,
    pub params: ParamList,
    pub body: ExprId,
    /// The `def` node, which keys the method's owned locals.
    pub root: ExprId,
}

/// Interpreter state for one program arena.
pub struct Interpreter<'a> {
    pub(crate) interner: &'a StringInterner,
    pub(crate) arena: &'a ExprArena,
    pub(crate) env: Environment,
    pub(crate) scopes: ScopeMap,
    pub(crate) methods: FxHashMap<Name, Rc<MethodDef>>,
    pub(crate) call_stack: CallStack,
    pub(crate) names: BuiltinNames,
    pub(crate) mode: EvalMode,
}

impl<'a> Interpreter<'a> {
    /// Create an interpreter in `Interpret` mode with no host locals.
    pub fn new(interner: &'a StringInterner, arena: &'a ExprArena) -> Self {
        InterpreterBuilder::new(interner, arena).build()
    }

    pub fn mode(&self) -> &EvalMode {
        &self.mode
    }

    /// Evaluate the program rooted at `root`.
    ///
    /// Locals assigned at the top level stay bound afterwards and are
    /// visible to later `evaluate` calls and to [`Interpreter::local`].
    #[tracing::instrument(level = "debug", skip(self))]
    pub fn evaluate(&mut self, root: ExprId) -> Result<Value, EvalError> {
        let visible: Vec<Name> = self.env.top_scope().borrow().names().collect();
        self.scopes = resolve_program(self.arena, root, &visible)
            .map_err(|e| invalid_program(&e.to_string()))?;

        let id = self.call_stack.allocate_id();
        self.call_stack
            .push(CallFrame::new(id, FrameKind::Top, Name::EMPTY))?;
        self.declare_owned(root);
        let result = match self.eval(root) {
            Err(ControlAction::Return { value, target }) if target == id => Ok(value),
            // Signals nothing caught surface as errors raised at the top level.
            Err(action) if !action.is_error() => Err(action.into_eval_error().into()),
            other => other,
        };
        let result = self.attach_backtrace(result);
        self.call_stack.pop();

        match result {
            Ok(value) => Ok(value),
            Err(action) => {
                let err = action.into_eval_error();
                debug!(class = err.class_name(), message = %err.message, "program failed");
                Err(err)
            }
        }
    }

    /// Value of a top-level local.
    pub fn local(&self, name: &str) -> Option<Value> {
        let name = self.interner.intern(name);
        self.env.top_scope().borrow().lookup(name)
    }

    /// Evaluate one node.
    #[inline]
    pub fn eval(&mut self, id: ExprId) -> EvalResult {
        ensure_sufficient_stack(|| self.eval_inner(id))
    }

    fn eval_inner(&mut self, id: ExprId) -> EvalResult {
        let arena = self.arena;
        match arena.kind(id) {
            ExprKind::Nil => Ok(Value::Nil),
            ExprKind::Bool(b) => Ok(Value::Bool(*b)),
            ExprKind::Int(n) => Ok(Value::Int(*n)),
            ExprKind::Str(s) => Ok(Value::string(self.interner.lookup(*s))),
            ExprKind::Symbol(s) => Ok(Value::Symbol(*s)),
            ExprKind::Array(elems) => {
                let items = self.eval_sequence_items(elems)?;
                Ok(Value::array(build_sequence_literal(items)?))
            }
            ExprKind::Hash(entries) => self.eval_hash(entries),
            ExprKind::Ident(name) => self.eval_ident(id, *name),
            ExprKind::Assign { name, value } => {
                let items = self.eval_sequence_items(value)?;
                let value = normalize_multi_assign_rhs(items)?;
                self.env.assign_local(*name, value.clone());
                Ok(value)
            }
            ExprKind::OpAssign { name, op, value } => {
                let current = self.env.lookup(*name).unwrap_or(Value::Nil);
                let rhs = self.eval(*value)?;
                let result = evaluate_binary(*op, &current, &rhs)?;
                self.env.assign_local(*name, result.clone());
                Ok(result)
            }
            ExprKind::Binary { op, left, right } => {
                let left = self.eval(*left)?;
                let right = self.eval(*right)?;
                Ok(evaluate_binary(*op, &left, &right)?)
            }
            ExprKind::Seq(stmts) => {
                let mut last = Value::Nil;
                for &stmt in stmts {
                    last = self.eval(stmt)?;
                }
                Ok(last)
            }
            ExprKind::If {
                cond,
                then_branch,
                else_branch,
            } => self.eval_if(*cond, *then_branch, *else_branch),
            ExprKind::Loop {
                kind,
                cond,
                body,
                post_condition,
            } => self.eval_loop(*kind, *cond, *body, *post_condition),
            ExprKind::Begin {
                body,
                rescues,
                else_branch,
                ensure,
            } => self.eval_begin(*body, rescues, *else_branch, *ensure),
            ExprKind::Def { name, params, body } => {
                self.methods.insert(
                    *name,
                    Rc::new(MethodDef {
                        name: *name,
                        params: params.clone(),
                        body: *body,
                        root: id,
                    }),
                );
                Ok(Value::Symbol(*name))
            }
            ExprKind::Block { params, body } => {
                Ok(Value::Proc(self.make_proc(id, params, *body, false, None)))
            }
            ExprKind::Lambda { params, body } => {
                Ok(Value::Proc(self.make_proc(id, params, *body, true, None)))
            }
            ExprKind::Call { name, args, block } => self.eval_call(*name, args, *block),
            ExprKind::CallProc {
                callee,
                args,
                block,
            } => self.eval_call_proc(*callee, args, *block),
            ExprKind::Yield(args) => self.eval_yield(args),
            ExprKind::Return(value) => self.eval_return(*value),
            ExprKind::Break(value) => self.eval_break(*value),
            ExprKind::Next(value) => self.eval_next(*value),
            ExprKind::Redo => self.eval_redo(),
            ExprKind::Raise(message) => self.eval_raise(*message),
        }
    }

    /// Evaluate an optional operand, defaulting to nil.
    pub(crate) fn eval_opt(&mut self, id: Option<ExprId>) -> EvalResult {
        match id {
            Some(id) => self.eval(id),
            None => Ok(Value::Nil),
        }
    }

    /// Read a local. A name that is not a local in scope may still name a
    /// zero-argument method.
    fn eval_ident(&mut self, id: ExprId, name: Name) -> EvalResult {
        if !self.scopes.is_unbound_read(id) {
            if let Some(value) = self.env.lookup(name) {
                return Ok(value);
            }
        }
        if self.methods.contains_key(&name) || name == self.names.block_given {
            let call_id = self.call_stack.allocate_id();
            return self.dispatch_call(name, call_id, CallArgs::new(), None);
        }
        Err(undefined_variable(self.interner.lookup(name)).into())
    }

    fn eval_sequence_items(&mut self, elems: &[Elem]) -> Result<Vec<SequenceItem>, ControlAction> {
        let mut items = Vec::with_capacity(elems.len());
        for elem in elems {
            items.push(match *elem {
                Elem::Plain(e) => SequenceItem::Plain(self.eval(e)?),
                Elem::Splat(e) => SequenceItem::Spread(self.eval(e)?),
            });
        }
        Ok(items)
    }

    fn eval_hash(&mut self, entries: &[HashEntry]) -> EvalResult {
        let mut hash = HashEntries::default();
        for entry in entries {
            match *entry {
                HashEntry::Pair(key, value) => {
                    let key = self.eval(key)?;
                    let key = HashKey::from_value(&key)?;
                    let value = self.eval(value)?;
                    hash.insert(key, value);
                }
                HashEntry::DoubleSplat(e) => {
                    let value = self.eval(e)?;
                    hash.extend(to_hash_entries(&value)?);
                }
            }
        }
        Ok(Value::hash(hash))
    }

    /// Bind every local the scope rooted at `root` owns to nil.
    pub(crate) fn declare_owned(&mut self, root: ExprId) {
        for &name in self.scopes.owned_names(root) {
            self.env.declare(name);
        }
    }

    /// Close over the current scope.
    pub(crate) fn make_proc(
        &self,
        literal: ExprId,
        params: &ParamList,
        body: ExprId,
        is_lambda: bool,
        break_tag: Option<FrameId>,
    ) -> ProcValue {
        let frame = self.call_stack.current();
        ProcValue::new(ProcData {
            literal,
            params: params.clone(),
            body,
            captured: self.env.current_scope(),
            is_lambda,
            home: frame.and_then(CallFrame::home_for_literals),
            break_tag,
            outer_block: frame.and_then(|f| f.block.clone()),
        })
    }

    /// Block visible to `yield` in the current frame.
    pub(crate) fn current_block(&self) -> Option<ProcValue> {
        self.call_stack.current().and_then(|f| f.block.clone())
    }

    /// Attach a backtrace to an error that does not have one yet.
    pub(crate) fn attach_backtrace(&self, result: EvalResult) -> EvalResult {
        match result {
            Err(ControlAction::Error(mut err)) if err.backtrace.is_none() => {
                err.backtrace = Some(self.call_stack.capture(self.interner));
                Err(ControlAction::Error(err))
            }
            other => other,
        }
    }
}
