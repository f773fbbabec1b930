//! Method calls, proc invocation and `yield`.

use tracing::trace;

use garnet_ir::{Arg, BlockArg, ExprId, ExprKind, Name};

use super::{Interpreter, MethodDef};
use crate::call_stack::{CallFrame, FrameKind};
use crate::errors::{
    arity_mismatch, implicit_conversion, invalid_program, no_block_given, not_callable,
    undefined_method, Arity, BreakTarget, ControlAction, EvalError, EvalResult, FrameId,
};
use crate::exec::bind::{plan_arguments, BindMode, BindPlan, Binding, CallArgs};
use crate::value::{ProcValue, Value};

impl Interpreter<'_> {
    /// Evaluate call-site arguments left to right, expanding `*` and `**`.
    pub(crate) fn eval_args(&mut self, args: &[Arg]) -> Result<CallArgs, ControlAction> {
        let mut out = CallArgs::new();
        for arg in args {
            match *arg {
                Arg::Positional(e) => {
                    let value = self.eval(e)?;
                    out.push(value);
                }
                Arg::Splat(e) => {
                    let value = self.eval(e)?;
                    out.push_spread(&value)?;
                }
                Arg::Keyword(name, e) => {
                    let value = self.eval(e)?;
                    out.push_keyword(name, value);
                }
                Arg::DoubleSplat(e) => {
                    let value = self.eval(e)?;
                    out.merge_keywords(&value)?;
                }
            }
        }
        Ok(out)
    }

    /// The block passed to a call. Literal blocks record `call_id` as the
    /// target of `break`.
    fn eval_block_arg(
        &mut self,
        block: Option<BlockArg>,
        call_id: FrameId,
    ) -> Result<Option<ProcValue>, ControlAction> {
        let arena = self.arena;
        match block {
            None => Ok(None),
            Some(BlockArg::Literal(literal)) => match arena.kind(literal) {
                ExprKind::Block { params, body } => Ok(Some(self.make_proc(
                    literal,
                    params,
                    *body,
                    false,
                    Some(call_id),
                ))),
                ExprKind::Lambda { params, body } => Ok(Some(self.make_proc(
                    literal,
                    params,
                    *body,
                    true,
                    Some(call_id),
                ))),
                _ => Err(invalid_program("block argument is not a block literal").into()),
            },
            Some(BlockArg::Pass(e)) => match self.eval(e)? {
                Value::Nil => Ok(None),
                Value::Proc(block) => Ok(Some(block)),
                other => Err(implicit_conversion(other.type_name(), "Proc").into()),
            },
        }
    }

    pub(crate) fn eval_call(
        &mut self,
        name: Name,
        args: &[Arg],
        block: Option<BlockArg>,
    ) -> EvalResult {
        let call_id = self.call_stack.allocate_id();
        let block = self.eval_block_arg(block, call_id)?;
        let args = self.eval_args(args)?;
        self.dispatch_call(name, call_id, args, block)
    }

    /// Run a user method or builtin under the frame id `call_id`.
    pub(crate) fn dispatch_call(
        &mut self,
        name: Name,
        call_id: FrameId,
        args: CallArgs,
        block: Option<ProcValue>,
    ) -> EvalResult {
        if let Some(method) = self.methods.get(&name).cloned() {
            return self.invoke_method(&method, call_id, args, block);
        }

        let names = self.names;
        if name == names.block_given {
            expect_no_args(&args)?;
            return Ok(Value::Bool(self.current_block().is_some()));
        }
        if name == names.proc_ || name == names.lambda {
            expect_no_args(&args)?;
            let Some(block) = block else {
                return Err(EvalError::new("tried to create Proc object without a block").into());
            };
            if name == names.lambda {
                return Ok(Value::Proc(block.to_lambda()));
            }
            return Ok(Value::Proc(block));
        }
        if name == names.loop_ {
            expect_no_args(&args)?;
            return self.run_loop_builtin(call_id, block);
        }

        Err(undefined_method(self.interner.lookup(name), "main").into())
    }

    #[tracing::instrument(level = "debug", skip_all)]
    fn invoke_method(
        &mut self,
        method: &MethodDef,
        call_id: FrameId,
        args: CallArgs,
        block: Option<ProcValue>,
    ) -> EvalResult {
        trace!(method = self.interner.lookup(method.name), "invoke");
        let plan = plan_arguments(&method.params, BindMode::Strict, args, self.interner)?;
        let frame =
            CallFrame::new(call_id, FrameKind::Method, method.name).with_block(block.clone());
        let (root, body) = (method.root, method.body);

        let result = self.with_frame(frame, None, |interp| {
            interp.declare_owned(root);
            interp.bind_params(plan, block.as_ref())?;
            interp.eval(body)
        });

        match result {
            Err(ControlAction::Return { value, target }) if target == call_id => Ok(value),
            Err(ControlAction::Break {
                value,
                target: BreakTarget::Frame(target),
            }) if target == call_id => {
                trace!("break left method call");
                Ok(value)
            }
            other => other,
        }
    }

    /// `loop { ... }`: run the block until it breaks.
    fn run_loop_builtin(&mut self, call_id: FrameId, block: Option<ProcValue>) -> EvalResult {
        let Some(block) = block else {
            return Err(no_block_given().into());
        };
        let frame = CallFrame::new(call_id, FrameKind::Builtin, self.names.loop_);
        let result = self.with_frame(frame, None, |interp| loop {
            let id = interp.call_stack.allocate_id();
            interp.invoke_proc(&block, CallArgs::new(), None, id)?;
        });
        match result {
            Err(ControlAction::Break {
                value,
                target: BreakTarget::Frame(target),
            }) if target == call_id => Ok(value),
            other => other,
        }
    }

    /// Invoke a block or lambda as the frame `frame_id`.
    ///
    /// Lambdas bind strictly and catch their own `return` and `break`.
    /// Blocks bind leniently; their own `return` and `break` travel on to
    /// the frames recorded when the block was created.
    pub(crate) fn invoke_proc(
        &mut self,
        proc_value: &ProcValue,
        args: CallArgs,
        block: Option<ProcValue>,
        frame_id: FrameId,
    ) -> EvalResult {
        let data = proc_value.data();
        let plan = plan_arguments(
            &data.params,
            BindMode::for_lambda(data.is_lambda),
            args,
            self.interner,
        )?;

        let mut frame = if data.is_lambda {
            CallFrame::new(frame_id, FrameKind::Lambda, Name::EMPTY)
        } else {
            let mut frame = CallFrame::new(frame_id, FrameKind::Block, Name::EMPTY);
            frame.home = data.home;
            frame.break_tag = data.break_tag;
            frame
        };
        frame.block = data.outer_block.clone();

        let (literal, body) = (data.literal, data.body);
        let result = self.with_frame(frame, Some(data.captured.clone()), |interp| {
            interp.declare_owned(literal);
            interp.bind_params(plan, block.as_ref())?;
            loop {
                match interp.eval(body) {
                    Err(ControlAction::Redo) => {}
                    Err(ControlAction::Next(value)) => return Ok(value),
                    other => return other,
                }
            }
        });

        // A block passed to this invocation breaks to it, whether or not
        // the callee is a lambda. Only lambdas absorb their own `return`.
        match result {
            Err(ControlAction::Return { value, target })
                if data.is_lambda && target == frame_id =>
            {
                Ok(value)
            }
            Err(ControlAction::Break {
                value,
                target: BreakTarget::Frame(target),
            }) if target == frame_id => Ok(value),
            other => other,
        }
    }

    pub(crate) fn eval_call_proc(
        &mut self,
        callee: ExprId,
        args: &[Arg],
        block: Option<BlockArg>,
    ) -> EvalResult {
        let callee = self.eval(callee)?;
        let Value::Proc(proc_value) = callee else {
            return Err(not_callable(callee.type_name()).into());
        };
        let call_id = self.call_stack.allocate_id();
        let block = self.eval_block_arg(block, call_id)?;
        let args = self.eval_args(args)?;
        self.invoke_proc(&proc_value, args, block, call_id)
    }

    pub(crate) fn eval_yield(&mut self, args: &[Arg]) -> EvalResult {
        let Some(block) = self.current_block() else {
            return Err(no_block_given().into());
        };
        let args = self.eval_args(args)?;
        let id = self.call_stack.allocate_id();
        self.invoke_proc(&block, args, None, id)
    }

    /// Materialize a binding plan in the current (callee) scope. Defaults
    /// are evaluated here, left to right, after earlier parameters are bound.
    pub(crate) fn bind_params(
        &mut self,
        plan: BindPlan,
        block: Option<&ProcValue>,
    ) -> Result<(), ControlAction> {
        for param in plan.params {
            let value = match param.binding {
                Binding::Value(value) => value,
                Binding::Default(default) => self.eval(default)?,
                Binding::Block => block.cloned().map_or(Value::Nil, Value::Proc),
            };
            if !param.name.is_empty() {
                self.env.define(param.name, value);
            }
        }
        Ok(())
    }
}

fn expect_no_args(args: &CallArgs) -> Result<(), ControlAction> {
    let given = args.positional.len() + usize::from(!args.keywords.is_empty());
    if given == 0 {
        return Ok(());
    }
    Err(arity_mismatch(
        given,
        Arity {
            required: 0,
            optional: 0,
            rest: false,
        },
    )
    .into())
}
