//! RAII guards for interpreter scopes and call frames.
//!
//! Both guards hold `&mut Interpreter` and implement `Deref`/`DerefMut`, so
//! code inside a guarded region calls interpreter methods directly. Cleanup
//! runs in `Drop`, including during unwinding.
//!
//! ```text
//! let mut scoped = interpreter.scoped();
//! let value = scoped.eval(body)?;
//! // transparent scope popped here
//! ```

use std::ops::{Deref, DerefMut};

use super::Interpreter;
use crate::call_stack::CallFrame;
use crate::environment::{LocalScope, Scope};
use crate::errors::{EvalError, EvalResult};

/// Guard over a transparent scope (`if`, loop, `begin`).
pub struct ScopedInterpreter<'guard, 'interp> {
    interpreter: &'guard mut Interpreter<'interp>,
}

impl Drop for ScopedInterpreter<'_, '_> {
    fn drop(&mut self) {
        self.interpreter.env.pop_scope();
    }
}

impl<'interp> Deref for ScopedInterpreter<'_, 'interp> {
    type Target = Interpreter<'interp>;

    fn deref(&self) -> &Self::Target {
        self.interpreter
    }
}

impl DerefMut for ScopedInterpreter<'_, '_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.interpreter
    }
}

/// Guard over a call frame and its opaque scope.
pub struct FramedInterpreter<'guard, 'interp> {
    interpreter: &'guard mut Interpreter<'interp>,
}

impl Drop for FramedInterpreter<'_, '_> {
    fn drop(&mut self) {
        self.interpreter.env.pop_scope();
        self.interpreter.call_stack.pop();
    }
}

impl<'interp> Deref for FramedInterpreter<'_, 'interp> {
    type Target = Interpreter<'interp>;

    fn deref(&self) -> &Self::Target {
        self.interpreter
    }
}

impl DerefMut for FramedInterpreter<'_, '_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.interpreter
    }
}

impl<'a> Interpreter<'a> {
    /// Push a transparent scope that is popped when the guard drops.
    pub fn scoped(&mut self) -> ScopedInterpreter<'_, 'a> {
        self.env.push_transparent();
        ScopedInterpreter { interpreter: self }
    }

    /// Run `f` inside a transparent scope.
    pub fn with_transparent_scope<T>(&mut self, f: impl FnOnce(&mut Self) -> T) -> T {
        let mut scoped = self.scoped();
        f(&mut *scoped)
    }

    /// Push a call frame and an opaque scope whose lexical parent is
    /// `lexical_parent` (`None` for method bodies).
    ///
    /// Fails without pushing anything when the depth limit is reached.
    pub fn framed(
        &mut self,
        frame: CallFrame,
        lexical_parent: Option<LocalScope<Scope>>,
    ) -> Result<FramedInterpreter<'_, 'a>, EvalError> {
        self.call_stack.push(frame)?;
        self.env.push_opaque(lexical_parent);
        Ok(FramedInterpreter { interpreter: self })
    }

    /// Run `f` inside a new frame. Errors leaving the frame get a
    /// backtrace taken while the frame is still live.
    pub(crate) fn with_frame(
        &mut self,
        frame: CallFrame,
        lexical_parent: Option<LocalScope<Scope>>,
        f: impl FnOnce(&mut Self) -> EvalResult,
    ) -> EvalResult {
        let mut framed = self.framed(frame, lexical_parent)?;
        let result = f(&mut *framed);
        framed.attach_backtrace(result)
    }
}
