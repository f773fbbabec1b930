//! Conditionals, loops, `begin`/`rescue`/`ensure`, and the emission of
//! non-local exits.
//!
//! Emitters resolve their target eagerly. A `return` is addressed to the
//! frame's return target, a `break` to the innermost loop of the current
//! frame or else to the call that received the block. A target that is no
//! longer on the stack is reported as `LocalJumpError` at the emission site
//! instead of unwinding to the top.

use tracing::debug;

use garnet_ir::{ExprId, LoopKind, RescueClause};

use super::Interpreter;
use crate::call_stack::{CallFrame, FrameKind};
use crate::errors::{
    invalid_control_transfer, raised, BreakTarget, ControlAction, EvalError, EvalResult, Signal,
};
use crate::value::Value;

impl Interpreter<'_> {
    pub(crate) fn eval_if(
        &mut self,
        cond: ExprId,
        then_branch: ExprId,
        else_branch: Option<ExprId>,
    ) -> EvalResult {
        self.with_transparent_scope(|interp| {
            if interp.eval(cond)?.is_truthy() {
                interp.eval(then_branch)
            } else {
                interp.eval_opt(else_branch)
            }
        })
    }

    pub(crate) fn eval_loop(
        &mut self,
        kind: LoopKind,
        cond: ExprId,
        body: ExprId,
        post_condition: bool,
    ) -> EvalResult {
        if let Some(frame) = self.call_stack.current_mut() {
            frame.loop_depth += 1;
        }
        let result =
            self.with_transparent_scope(|interp| interp.run_loop(kind, cond, body, post_condition));
        if let Some(frame) = self.call_stack.current_mut() {
            frame.loop_depth = frame.loop_depth.saturating_sub(1);
        }
        result
    }

    fn run_loop(
        &mut self,
        kind: LoopKind,
        cond: ExprId,
        body: ExprId,
        post_condition: bool,
    ) -> EvalResult {
        let mut skip_cond = post_condition;
        loop {
            if !skip_cond {
                let value = match self.eval(cond) {
                    Ok(value) => value,
                    Err(ControlAction::Break {
                        value,
                        target: BreakTarget::Loop,
                    }) => return Ok(value),
                    Err(action) => return Err(action),
                };
                let keep_going = match kind {
                    LoopKind::While => value.is_truthy(),
                    LoopKind::Until => !value.is_truthy(),
                };
                if !keep_going {
                    return Ok(Value::Nil);
                }
            }
            skip_cond = false;

            match self.eval(body) {
                Ok(_) | Err(ControlAction::Next(_)) => {}
                // redo re-runs the body without testing the condition
                Err(ControlAction::Redo) => skip_cond = true,
                Err(ControlAction::Break {
                    value,
                    target: BreakTarget::Loop,
                }) => return Ok(value),
                Err(action) => return Err(action),
            }
        }
    }

    /// `begin`/`rescue`/`else`/`ensure`.
    ///
    /// `rescue` only sees errors. The `ensure` clause runs for every
    /// outcome; a non-local exit it performs replaces the outcome in flight.
    pub(crate) fn eval_begin(
        &mut self,
        body: ExprId,
        rescues: &[RescueClause],
        else_branch: Option<ExprId>,
        ensure: Option<ExprId>,
    ) -> EvalResult {
        let result = self
            .with_transparent_scope(|interp| interp.run_protected(body, rescues, else_branch));
        let Some(ensure) = ensure else {
            return result;
        };

        match self.with_transparent_scope(|interp| interp.eval(ensure)) {
            Ok(_) => result,
            Err(action) => {
                if let Err(replaced) = &result {
                    debug!(
                        replaced = ?replaced.signal(),
                        by = ?action.signal(),
                        "ensure clause replaced pending exit"
                    );
                }
                Err(action)
            }
        }
    }

    fn run_protected(
        &mut self,
        body: ExprId,
        rescues: &[RescueClause],
        else_branch: Option<ExprId>,
    ) -> EvalResult {
        match self.eval(body) {
            Ok(value) => match else_branch {
                Some(else_branch) => self.eval(else_branch),
                None => Ok(value),
            },
            Err(ControlAction::Error(err)) => {
                let Some(clause) = rescues.iter().find(|c| self.clause_matches(c, &err)) else {
                    return Err(ControlAction::Error(err));
                };
                if let Some(binding) = clause.binding {
                    self.env
                        .assign_local(binding, Value::string(err.message.as_str()));
                }
                self.eval(clause.body)
            }
            Err(action) => Err(action),
        }
    }

    fn clause_matches(&self, clause: &RescueClause, err: &EvalError) -> bool {
        if clause.classes.is_empty() {
            return err.kind.is_a("StandardError");
        }
        clause
            .classes
            .iter()
            .any(|&class| err.kind.is_a(self.interner.lookup(class)))
    }

    pub(crate) fn eval_return(&mut self, value: Option<ExprId>) -> EvalResult {
        let value = self.eval_opt(value)?;
        let target = self
            .call_stack
            .current()
            .and_then(CallFrame::return_target);
        match target {
            Some(target) if self.call_stack.is_live(target) => {
                Err(ControlAction::Return { value, target })
            }
            _ => Err(invalid_control_transfer(Signal::Return, "unexpected return").into()),
        }
    }

    pub(crate) fn eval_break(&mut self, value: Option<ExprId>) -> EvalResult {
        let value = self.eval_opt(value)?;
        let Some(frame) = self.call_stack.current() else {
            return Err(invalid_control_transfer(Signal::Break, "Invalid break").into());
        };
        if frame.loop_depth > 0 {
            return Err(ControlAction::Break {
                value,
                target: BreakTarget::Loop,
            });
        }
        match frame.kind {
            FrameKind::Lambda => Err(ControlAction::Break {
                value,
                target: BreakTarget::Frame(frame.id),
            }),
            FrameKind::Block => match frame.break_tag {
                Some(tag) if self.call_stack.is_live(tag) => Err(ControlAction::Break {
                    value,
                    target: BreakTarget::Frame(tag),
                }),
                _ => Err(invalid_control_transfer(Signal::Break, "break from proc-closure").into()),
            },
            _ => Err(invalid_control_transfer(Signal::Break, "Invalid break").into()),
        }
    }

    pub(crate) fn eval_next(&mut self, value: Option<ExprId>) -> EvalResult {
        let value = self.eval_opt(value)?;
        if self.in_iteration() {
            Err(ControlAction::Next(value))
        } else {
            Err(invalid_control_transfer(Signal::Next, "Invalid next").into())
        }
    }

    pub(crate) fn eval_redo(&mut self) -> EvalResult {
        if self.in_iteration() {
            Err(ControlAction::Redo)
        } else {
            Err(invalid_control_transfer(Signal::Redo, "Invalid redo").into())
        }
    }

    /// Whether `next`/`redo` have somewhere to go: a loop in this frame, or
    /// the body of a block or lambda.
    fn in_iteration(&self) -> bool {
        self.call_stack.current().is_some_and(|frame| {
            frame.loop_depth > 0 || matches!(frame.kind, FrameKind::Block | FrameKind::Lambda)
        })
    }

    pub(crate) fn eval_raise(&mut self, message: Option<ExprId>) -> EvalResult {
        let message = match self.eval_opt(message)? {
            Value::Nil => "unhandled exception".to_string(),
            Value::Str(s) => s.to_string(),
            other => other.inspect(self.interner),
        };
        Err(raised(&message).into())
    }
}
