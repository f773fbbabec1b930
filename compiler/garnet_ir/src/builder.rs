//! Convenience builder for instruction trees.
//!
//! Drivers that already have a parser allocate nodes directly through
//! [`ExprArena::alloc`]; the builder exists for hosts and tests that assemble
//! trees by hand.
//!
//! ```text
//! let mut b = ExprBuilder::new(&interner);
//! let one = b.int(1);
//! let assign = b.assign("a", one);
//! let read = b.ident("a");
//! let root = b.seq(vec![assign, read]);
//! let arena = b.finish();
//! ```

use crate::{
    Arg, BinaryOp, BlockArg, Elem, ExprArena, ExprId, ExprKind, HashEntry, LoopKind, Name,
    ParamList, RescueClause, StringInterner,
};

/// Builds an [`ExprArena`] node by node.
pub struct ExprBuilder<'i> {
    arena: ExprArena,
    interner: &'i StringInterner,
}

impl<'i> ExprBuilder<'i> {
    pub fn new(interner: &'i StringInterner) -> Self {
        ExprBuilder {
            arena: ExprArena::new(),
            interner,
        }
    }

    /// Intern a name.
    pub fn name(&self, s: &str) -> Name {
        self.interner.intern(s)
    }

    /// Consume the builder, yielding the arena.
    pub fn finish(self) -> ExprArena {
        self.arena
    }

    fn alloc(&mut self, kind: ExprKind) -> ExprId {
        self.arena.alloc(kind)
    }

    // Literals

    pub fn nil(&mut self) -> ExprId {
        self.alloc(ExprKind::Nil)
    }

    pub fn bool(&mut self, b: bool) -> ExprId {
        self.alloc(ExprKind::Bool(b))
    }

    pub fn int(&mut self, n: i64) -> ExprId {
        self.alloc(ExprKind::Int(n))
    }

    pub fn str(&mut self, s: &str) -> ExprId {
        let name = self.name(s);
        self.alloc(ExprKind::Str(name))
    }

    pub fn sym(&mut self, s: &str) -> ExprId {
        let name = self.name(s);
        self.alloc(ExprKind::Symbol(name))
    }

    pub fn array(&mut self, elems: Vec<Elem>) -> ExprId {
        self.alloc(ExprKind::Array(elems))
    }

    /// Array literal without splats.
    pub fn array_of(&mut self, items: Vec<ExprId>) -> ExprId {
        self.array(items.into_iter().map(Elem::Plain).collect())
    }

    pub fn hash(&mut self, entries: Vec<HashEntry>) -> ExprId {
        self.alloc(ExprKind::Hash(entries))
    }

    /// Hash literal with symbol keys (`{ a: 1, b: 2 }`).
    pub fn sym_hash(&mut self, entries: Vec<(&str, ExprId)>) -> ExprId {
        let entries = entries
            .into_iter()
            .map(|(key, value)| HashEntry::Pair(self.sym(key), value))
            .collect();
        self.hash(entries)
    }

    // Variables

    pub fn ident(&mut self, s: &str) -> ExprId {
        let name = self.name(s);
        self.alloc(ExprKind::Ident(name))
    }

    /// Plain scalar assignment `name = value`.
    pub fn assign(&mut self, s: &str, value: ExprId) -> ExprId {
        self.assign_elems(s, vec![Elem::Plain(value)])
    }

    /// Sugared assignment `name = e1, *e2, ...`.
    pub fn assign_elems(&mut self, s: &str, value: Vec<Elem>) -> ExprId {
        let name = self.name(s);
        self.alloc(ExprKind::Assign { name, value })
    }

    pub fn op_assign(&mut self, s: &str, op: BinaryOp, value: ExprId) -> ExprId {
        let name = self.name(s);
        self.alloc(ExprKind::OpAssign { name, op, value })
    }

    pub fn binary(&mut self, op: BinaryOp, left: ExprId, right: ExprId) -> ExprId {
        self.alloc(ExprKind::Binary { op, left, right })
    }

    pub fn seq(&mut self, stmts: Vec<ExprId>) -> ExprId {
        self.alloc(ExprKind::Seq(stmts))
    }

    // Transparent constructs

    pub fn if_(&mut self, cond: ExprId, then_branch: ExprId, else_branch: Option<ExprId>) -> ExprId {
        self.alloc(ExprKind::If {
            cond,
            then_branch,
            else_branch,
        })
    }

    pub fn while_(&mut self, cond: ExprId, body: ExprId) -> ExprId {
        self.loop_(LoopKind::While, cond, body, false)
    }

    pub fn until(&mut self, cond: ExprId, body: ExprId) -> ExprId {
        self.loop_(LoopKind::Until, cond, body, false)
    }

    /// `begin body end while cond`
    pub fn do_while(&mut self, body: ExprId, cond: ExprId) -> ExprId {
        self.loop_(LoopKind::While, cond, body, true)
    }

    pub fn loop_(
        &mut self,
        kind: LoopKind,
        cond: ExprId,
        body: ExprId,
        post_condition: bool,
    ) -> ExprId {
        self.alloc(ExprKind::Loop {
            kind,
            cond,
            body,
            post_condition,
        })
    }

    pub fn begin(
        &mut self,
        body: ExprId,
        rescues: Vec<RescueClause>,
        else_branch: Option<ExprId>,
        ensure: Option<ExprId>,
    ) -> ExprId {
        self.alloc(ExprKind::Begin {
            body,
            rescues,
            else_branch,
            ensure,
        })
    }

    /// `begin body ensure cleanup end`
    pub fn ensure(&mut self, body: ExprId, cleanup: ExprId) -> ExprId {
        self.begin(body, Vec::new(), None, Some(cleanup))
    }

    /// A rescue clause matching the given class names.
    pub fn rescue(&self, classes: &[&str], binding: Option<&str>, body: ExprId) -> RescueClause {
        RescueClause {
            classes: classes.iter().map(|c| self.name(c)).collect(),
            binding: binding.map(|b| self.name(b)),
            body,
        }
    }

    // Callables

    pub fn def(&mut self, s: &str, params: ParamList, body: ExprId) -> ExprId {
        let name = self.name(s);
        self.alloc(ExprKind::Def { name, params, body })
    }

    pub fn block(&mut self, params: ParamList, body: ExprId) -> ExprId {
        self.alloc(ExprKind::Block { params, body })
    }

    pub fn lambda(&mut self, params: ParamList, body: ExprId) -> ExprId {
        self.alloc(ExprKind::Lambda { params, body })
    }

    pub fn call(&mut self, s: &str, args: Vec<Arg>, block: Option<BlockArg>) -> ExprId {
        let name = self.name(s);
        self.alloc(ExprKind::Call { name, args, block })
    }

    /// Call with positional arguments only and no block.
    pub fn call_simple(&mut self, s: &str, args: Vec<ExprId>) -> ExprId {
        self.call(s, args.into_iter().map(Arg::Positional).collect(), None)
    }

    /// Call with a block literal `do |params| body end`.
    pub fn call_with_block(
        &mut self,
        s: &str,
        args: Vec<ExprId>,
        params: ParamList,
        body: ExprId,
    ) -> ExprId {
        let block = self.block(params, body);
        self.call(
            s,
            args.into_iter().map(Arg::Positional).collect(),
            Some(BlockArg::Literal(block)),
        )
    }

    pub fn call_proc(&mut self, callee: ExprId, args: Vec<Arg>, block: Option<BlockArg>) -> ExprId {
        self.alloc(ExprKind::CallProc {
            callee,
            args,
            block,
        })
    }

    /// Keyword argument `key: value`.
    pub fn kwarg(&self, key: &str, value: ExprId) -> Arg {
        Arg::Keyword(self.name(key), value)
    }

    pub fn yield_(&mut self, args: Vec<Arg>) -> ExprId {
        self.alloc(ExprKind::Yield(args))
    }

    // Control signals

    pub fn return_(&mut self, value: Option<ExprId>) -> ExprId {
        self.alloc(ExprKind::Return(value))
    }

    pub fn break_(&mut self, value: Option<ExprId>) -> ExprId {
        self.alloc(ExprKind::Break(value))
    }

    pub fn next(&mut self, value: Option<ExprId>) -> ExprId {
        self.alloc(ExprKind::Next(value))
    }

    pub fn redo(&mut self) -> ExprId {
        self.alloc(ExprKind::Redo)
    }

    pub fn raise(&mut self, message: Option<ExprId>) -> ExprId {
        self.alloc(ExprKind::Raise(message))
    }
}
