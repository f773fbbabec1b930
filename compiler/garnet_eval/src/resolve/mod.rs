//! Local-variable resolution pass.
//!
//! Walks a tree once, in source order, before evaluation and records:
//!
//! - the names each opaque scope root owns (program root, each `def`,
//!   block and lambda literal). The interpreter binds all of them to nil
//!   when it enters the scope, so a variable assigned anywhere in a frame
//!   reads as nil even on paths that never ran the assignment.
//! - identifier reads that textually precede every declaration of their
//!   name. Those fail with an undefined-variable error at runtime.
//!
//! An assignment declares its target before the right-hand side is
//! walked, so `a = a` reads nil. Block and lambda literals see names
//! declared around them; a name first assigned inside one belongs to it.

use rustc_hash::{FxHashMap, FxHashSet};
use tracing::trace;

use garnet_ir::{
    Arg, BlockArg, Elem, ExprArena, ExprId, ExprKind, HashEntry, Name, ParamError, ParamKind,
    ParamList,
};

/// Static problems found while resolving.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    #[error("invalid parameter list: {0}")]
    InvalidParams(#[from] ParamError),
}

/// Result of resolution: owned names per scope root, and unbound reads.
#[derive(Debug, Default)]
pub struct ScopeMap {
    owned: FxHashMap<ExprId, Vec<Name>>,
    unbound_reads: FxHashSet<ExprId>,
}

impl ScopeMap {
    /// Names owned by the scope rooted at `root`, in declaration order.
    pub fn owned_names(&self, root: ExprId) -> &[Name] {
        self.owned.get(&root).map_or(&[], Vec::as_slice)
    }

    /// Whether the identifier node `id` is read before any declaration.
    pub fn is_unbound_read(&self, id: ExprId) -> bool {
        self.unbound_reads.contains(&id)
    }
}

struct ScopeFrame {
    root: ExprId,
    declared: FxHashSet<Name>,
    order: Vec<Name>,
    /// Block and lambda bodies see their enclosing scope.
    sees_enclosing: bool,
}

impl ScopeFrame {
    fn new(root: ExprId, sees_enclosing: bool) -> Self {
        ScopeFrame {
            root,
            declared: FxHashSet::default(),
            order: Vec::new(),
            sees_enclosing,
        }
    }

    fn insert(&mut self, name: Name) {
        if self.declared.insert(name) {
            self.order.push(name);
        }
    }
}

struct Resolver<'a> {
    arena: &'a ExprArena,
    frames: Vec<ScopeFrame>,
    map: ScopeMap,
}

/// Resolve the tree under `root`. `predeclared` names are locals the host
/// binds in the top-level scope before evaluation.
pub fn resolve_program(
    arena: &ExprArena,
    root: ExprId,
    predeclared: &[Name],
) -> Result<ScopeMap, ResolveError> {
    let mut top = ScopeFrame::new(root, false);
    for &name in predeclared {
        top.insert(name);
    }
    let mut resolver = Resolver {
        arena,
        frames: vec![top],
        map: ScopeMap::default(),
    };
    resolver.walk(root)?;
    if let Some(top) = resolver.frames.pop() {
        resolver.map.owned.insert(top.root, top.order);
    }
    trace!(
        scopes = resolver.map.owned.len(),
        unbound = resolver.map.unbound_reads.len(),
        "resolved locals"
    );
    Ok(resolver.map)
}

impl Resolver<'_> {
    fn is_visible(&self, name: Name) -> bool {
        for frame in self.frames.iter().rev() {
            if frame.declared.contains(&name) {
                return true;
            }
            if !frame.sees_enclosing {
                break;
            }
        }
        false
    }

    fn declare(&mut self, name: Name) {
        if name.is_empty() || self.is_visible(name) {
            return;
        }
        if let Some(frame) = self.frames.last_mut() {
            frame.insert(name);
        }
    }

    /// Parameters always belong to the callable's own scope.
    fn declare_param(&mut self, name: Name) {
        if name.is_empty() {
            return;
        }
        if let Some(frame) = self.frames.last_mut() {
            frame.insert(name);
        }
    }

    fn walk_opt(&mut self, id: Option<ExprId>) -> Result<(), ResolveError> {
        match id {
            Some(id) => self.walk(id),
            None => Ok(()),
        }
    }

    fn walk_elems(&mut self, elems: &[Elem]) -> Result<(), ResolveError> {
        for elem in elems {
            self.walk(elem.expr())?;
        }
        Ok(())
    }

    fn walk_args(&mut self, args: &[Arg]) -> Result<(), ResolveError> {
        for arg in args {
            match *arg {
                Arg::Positional(e) | Arg::Splat(e) | Arg::Keyword(_, e) | Arg::DoubleSplat(e) => {
                    self.walk(e)?;
                }
            }
        }
        Ok(())
    }

    fn walk_block_arg(&mut self, block: Option<BlockArg>) -> Result<(), ResolveError> {
        match block {
            Some(BlockArg::Literal(e) | BlockArg::Pass(e)) => self.walk(e),
            None => Ok(()),
        }
    }

    fn walk_callable(
        &mut self,
        root: ExprId,
        params: &ParamList,
        body: ExprId,
        sees_enclosing: bool,
    ) -> Result<(), ResolveError> {
        params.validate()?;
        self.frames.push(ScopeFrame::new(root, sees_enclosing));
        // Defaults run left to right and may read earlier parameters.
        for param in params.params() {
            match param.kind {
                ParamKind::Optional(default) | ParamKind::KeywordOptional(default) => {
                    self.walk(default)?;
                }
                _ => {}
            }
            self.declare_param(param.name);
        }
        self.walk(body)?;
        if let Some(frame) = self.frames.pop() {
            self.map.owned.insert(frame.root, frame.order);
        }
        Ok(())
    }

    fn walk(&mut self, id: ExprId) -> Result<(), ResolveError> {
        let arena = self.arena;
        match arena.kind(id) {
            ExprKind::Nil
            | ExprKind::Bool(_)
            | ExprKind::Int(_)
            | ExprKind::Str(_)
            | ExprKind::Symbol(_)
            | ExprKind::Redo => Ok(()),
            ExprKind::Array(elems) => self.walk_elems(elems),
            ExprKind::Hash(entries) => {
                for entry in entries {
                    match *entry {
                        HashEntry::Pair(k, v) => {
                            self.walk(k)?;
                            self.walk(v)?;
                        }
                        HashEntry::DoubleSplat(e) => self.walk(e)?,
                    }
                }
                Ok(())
            }
            ExprKind::Ident(name) => {
                if !self.is_visible(*name) {
                    self.map.unbound_reads.insert(id);
                }
                Ok(())
            }
            ExprKind::Assign { name, value } => {
                self.declare(*name);
                self.walk_elems(value)
            }
            ExprKind::OpAssign { name, value, .. } => {
                self.declare(*name);
                self.walk(*value)
            }
            ExprKind::Binary { left, right, .. } => {
                self.walk(*left)?;
                self.walk(*right)
            }
            ExprKind::Seq(stmts) => {
                for &stmt in stmts {
                    self.walk(stmt)?;
                }
                Ok(())
            }
            ExprKind::If {
                cond,
                then_branch,
                else_branch,
            } => {
                self.walk(*cond)?;
                self.walk(*then_branch)?;
                self.walk_opt(*else_branch)
            }
            ExprKind::Loop {
                cond,
                body,
                post_condition,
                ..
            } => {
                if *post_condition {
                    self.walk(*body)?;
                    self.walk(*cond)
                } else {
                    self.walk(*cond)?;
                    self.walk(*body)
                }
            }
            ExprKind::Begin {
                body,
                rescues,
                else_branch,
                ensure,
            } => {
                self.walk(*body)?;
                for clause in rescues {
                    if let Some(binding) = clause.binding {
                        self.declare(binding);
                    }
                    self.walk(clause.body)?;
                }
                self.walk_opt(*else_branch)?;
                self.walk_opt(*ensure)
            }
            ExprKind::Def { params, body, .. } => self.walk_callable(id, params, *body, false),
            ExprKind::Block { params, body } | ExprKind::Lambda { params, body } => {
                self.walk_callable(id, params, *body, true)
            }
            ExprKind::Call { args, block, .. } => {
                self.walk_args(args)?;
                self.walk_block_arg(*block)
            }
            ExprKind::CallProc {
                callee,
                args,
                block,
            } => {
                self.walk(*callee)?;
                self.walk_args(args)?;
                self.walk_block_arg(*block)
            }
            ExprKind::Yield(args) => self.walk_args(args),
            ExprKind::Return(value)
            | ExprKind::Break(value)
            | ExprKind::Next(value)
            | ExprKind::Raise(value) => self.walk_opt(*value),
        }
    }
}
