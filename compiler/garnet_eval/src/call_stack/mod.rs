//! Live call frames.
//!
//! Every activation (program top level, method call, lambda or block
//! invocation, builtin taking a block) pushes a [`CallFrame`]. Frames carry
//! the identities non-local exits are addressed to, so a captured
//! [`FrameId`] can be checked for liveness before a `return` or `break`
//! is allowed to travel towards it.

use tracing::trace;

use garnet_ir::{Name, StringInterner};

use crate::errors::{recursion_limit_exceeded, BacktraceFrame, EvalBacktrace, EvalError, FrameId};
use crate::value::ProcValue;

/// What kind of activation a frame is.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FrameKind {
    Top,
    Method,
    Lambda,
    Block,
    /// A builtin (`loop`) running a block; only catches `break`.
    Builtin,
}

/// One live activation.
#[derive(Clone, Debug)]
pub struct CallFrame {
    pub id: FrameId,
    pub kind: FrameKind,
    /// Method or builtin name; empty for other kinds.
    pub name: Name,
    /// For blocks: the frame a `return` leaves.
    pub home: Option<FrameId>,
    /// For blocks: the call a `break` leaves.
    pub break_tag: Option<FrameId>,
    /// Block visible to `yield` and `block_given?`.
    pub block: Option<ProcValue>,
    /// Loops currently running in this frame.
    pub loop_depth: usize,
}

impl CallFrame {
    pub fn new(id: FrameId, kind: FrameKind, name: Name) -> Self {
        CallFrame {
            id,
            kind,
            name,
            home: None,
            break_tag: None,
            block: None,
            loop_depth: 0,
        }
    }

    #[must_use]
    pub fn with_block(mut self, block: Option<ProcValue>) -> Self {
        self.block = block;
        self
    }

    /// Frame a `return` evaluated here is addressed to.
    pub fn return_target(&self) -> Option<FrameId> {
        match self.kind {
            FrameKind::Top | FrameKind::Method | FrameKind::Lambda => Some(self.id),
            FrameKind::Block => self.home,
            FrameKind::Builtin => None,
        }
    }

    /// Home recorded in block literals created while this frame runs.
    ///
    /// Blocks written at the top level have no home: `return` inside
    /// them is an invalid control transfer.
    pub fn home_for_literals(&self) -> Option<FrameId> {
        match self.kind {
            FrameKind::Method | FrameKind::Lambda => Some(self.id),
            FrameKind::Block => self.home,
            FrameKind::Top | FrameKind::Builtin => None,
        }
    }

    fn label(&self, interner: &StringInterner) -> String {
        match self.kind {
            FrameKind::Top => "<main>".to_string(),
            FrameKind::Method | FrameKind::Builtin => interner.lookup(self.name).to_string(),
            FrameKind::Lambda => "lambda".to_string(),
            FrameKind::Block => "block".to_string(),
        }
    }
}

/// Stack of live frames plus the id allocator.
#[derive(Debug)]
pub struct CallStack {
    frames: Vec<CallFrame>,
    max_depth: Option<usize>,
    next_id: u32,
}

impl CallStack {
    /// `max_depth` is `None` for unlimited depth.
    pub fn new(max_depth: Option<usize>) -> Self {
        CallStack {
            frames: Vec::new(),
            max_depth,
            next_id: 0,
        }
    }

    /// A fresh id, never handed out before.
    pub fn allocate_id(&mut self) -> FrameId {
        let id = FrameId::from_raw(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        id
    }

    /// Push a frame, checking the depth limit. The frame is not pushed on
    /// overflow.
    pub fn push(&mut self, frame: CallFrame) -> Result<(), EvalError> {
        if let Some(max) = self.max_depth {
            if self.frames.len() >= max {
                return Err(recursion_limit_exceeded(max));
            }
        }
        trace!(id = ?frame.id, kind = ?frame.kind, depth = self.frames.len() + 1, "push frame");
        self.frames.push(frame);
        Ok(())
    }

    pub fn pop(&mut self) {
        debug_assert!(!self.frames.is_empty(), "CallStack::pop on empty stack");
        if let Some(frame) = self.frames.pop() {
            trace!(id = ?frame.id, kind = ?frame.kind, "pop frame");
        }
    }

    #[inline]
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    #[inline]
    pub fn current(&self) -> Option<&CallFrame> {
        self.frames.last()
    }

    #[inline]
    pub fn current_mut(&mut self) -> Option<&mut CallFrame> {
        self.frames.last_mut()
    }

    /// Whether the frame with this id is still on the stack.
    pub fn is_live(&self, id: FrameId) -> bool {
        self.frames.iter().rev().any(|frame| frame.id == id)
    }

    /// Snapshot of the live frames, innermost first.
    pub fn capture(&self, interner: &StringInterner) -> EvalBacktrace {
        EvalBacktrace::new(
            self.frames
                .iter()
                .rev()
                .map(|frame| BacktraceFrame {
                    name: frame.label(interner),
                })
                .collect(),
        )
    }
}
