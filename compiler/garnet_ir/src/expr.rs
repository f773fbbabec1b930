//! Instruction tree for the evaluator.
//!
//! Nodes live in a flat [`ExprArena`] and refer to each other by [`ExprId`].
//! Closures keep an `ExprId` to their body, so the arena must outlive every
//! value produced while evaluating it.

use std::fmt;

use crate::{Name, ParamList};

/// Index of a node in an [`ExprArena`].
#[derive(Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
#[repr(transparent)]
pub struct ExprId(u32);

impl ExprId {
    /// Get the raw index.
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for ExprId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ExprId({})", self.0)
    }
}

/// Binary operators on integers (and `==`/`!=` on any value).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Lt,
    LtEq,
    Gt,
    GtEq,
    Eq,
    NotEq,
}

impl BinaryOp {
    /// Surface spelling, used in error messages.
    pub fn as_symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Lt => "<",
            BinaryOp::LtEq => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::GtEq => ">=",
            BinaryOp::Eq => "==",
            BinaryOp::NotEq => "!=",
        }
    }
}

/// An element of an array literal or a sugared assignment right-hand side.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Elem {
    /// Appended as-is.
    Plain(ExprId),
    /// `*expr`: expanded through sequence coercion.
    Splat(ExprId),
}

impl Elem {
    /// The wrapped expression.
    pub fn expr(self) -> ExprId {
        match self {
            Elem::Plain(id) | Elem::Splat(id) => id,
        }
    }
}

/// An entry of a hash literal.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum HashEntry {
    Pair(ExprId, ExprId),
    /// `**expr`: merges another hash in place.
    DoubleSplat(ExprId),
}

/// A call-site argument.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Arg {
    Positional(ExprId),
    /// `*expr`
    Splat(ExprId),
    /// `name: expr`
    Keyword(Name, ExprId),
    /// `**expr`
    DoubleSplat(ExprId),
}

/// A block attached to a call.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BlockArg {
    /// `do |params| ... end`, pointing at an [`ExprKind::Block`] node.
    Literal(ExprId),
    /// `&expr`: pass an existing proc (or nil).
    Pass(ExprId),
}

/// Loop condition polarity.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum LoopKind {
    While,
    Until,
}

/// A `rescue` clause of a `begin` block.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RescueClause {
    /// Error class names; empty means `StandardError`.
    pub classes: Vec<Name>,
    /// `=> name`: binds the error message.
    pub binding: Option<Name>,
    pub body: ExprId,
}

/// Node kinds of the instruction tree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExprKind {
    // Literals
    Nil,
    Bool(bool),
    Int(i64),
    Str(Name),
    Symbol(Name),
    Array(Vec<Elem>),
    Hash(Vec<HashEntry>),

    // Variables
    Ident(Name),
    /// `name = rhs`. A single plain element is a scalar assignment; anything
    /// else (comma list, splat) is array sugar.
    Assign { name: Name, value: Vec<Elem> },
    /// `name op= value`
    OpAssign {
        name: Name,
        op: BinaryOp,
        value: ExprId,
    },

    Binary {
        op: BinaryOp,
        left: ExprId,
        right: ExprId,
    },
    /// Statement list; evaluates to the last statement (nil when empty).
    Seq(Vec<ExprId>),

    // Transparent constructs
    If {
        cond: ExprId,
        then_branch: ExprId,
        else_branch: Option<ExprId>,
    },
    /// `while`/`until`. With `post_condition` the body runs before the first
    /// test (`begin ... end while cond`).
    Loop {
        kind: LoopKind,
        cond: ExprId,
        body: ExprId,
        post_condition: bool,
    },
    Begin {
        body: ExprId,
        rescues: Vec<RescueClause>,
        else_branch: Option<ExprId>,
        ensure: Option<ExprId>,
    },

    // Callables
    Def {
        name: Name,
        params: ParamList,
        body: ExprId,
    },
    /// Block literal; normally reached through [`BlockArg::Literal`].
    Block { params: ParamList, body: ExprId },
    /// `->(params) do ... end`
    Lambda { params: ParamList, body: ExprId },
    /// Receiver-less call: user method or builtin.
    Call {
        name: Name,
        args: Vec<Arg>,
        block: Option<BlockArg>,
    },
    /// `callee.call(args)` on a proc value.
    CallProc {
        callee: ExprId,
        args: Vec<Arg>,
        block: Option<BlockArg>,
    },
    Yield(Vec<Arg>),

    // Control signals
    Return(Option<ExprId>),
    Break(Option<ExprId>),
    Next(Option<ExprId>),
    Redo,
    Raise(Option<ExprId>),
}

/// Flat storage for instruction nodes.
#[derive(Clone, Debug, Default)]
pub struct ExprArena {
    exprs: Vec<ExprKind>,
}

impl ExprArena {
    /// Create an empty arena.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a node, returning its id.
    ///
    /// # Panics
    /// Panics if the arena holds more than `u32::MAX` nodes.
    pub fn alloc(&mut self, kind: ExprKind) -> ExprId {
        let index = u32::try_from(self.exprs.len())
            .unwrap_or_else(|_| panic!("expression arena exceeded u32::MAX nodes"));
        self.exprs.push(kind);
        ExprId(index)
    }

    /// Get a node by id.
    #[inline]
    pub fn kind(&self, id: ExprId) -> &ExprKind {
        &self.exprs[id.index()]
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.exprs.len()
    }

    /// Whether the arena is empty.
    pub fn is_empty(&self) -> bool {
        self.exprs.is_empty()
    }
}
