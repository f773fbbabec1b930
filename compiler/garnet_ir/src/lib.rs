//! Garnet IR - instruction tree and shared identifiers.
//!
//! The evaluator consumes trees built here:
//! - `ExprArena` / `ExprId` / `ExprKind`: flat node storage with typed children
//! - `ParamList` / `Param` / `ParamKind`: callable parameter descriptors
//! - `Name` / `StringInterner`: interned identifiers, symbols and string literals
//! - `ExprBuilder`: hand assembly of trees for hosts and tests

mod builder;
mod expr;
mod interner;
mod name;
mod params;

pub use builder::ExprBuilder;
pub use expr::{
    Arg, BinaryOp, BlockArg, Elem, ExprArena, ExprId, ExprKind, HashEntry, LoopKind, RescueClause,
};
pub use interner::{InternError, SharedInterner, StringInterner, StringLookup};
pub use name::Name;
pub use params::{Param, ParamError, ParamKind, ParamList};
