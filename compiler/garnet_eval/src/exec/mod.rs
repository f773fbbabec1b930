//! Execution helpers the `Interpreter` delegates to.
//!
//! - `bind`: argument-to-parameter binding for methods, lambdas and blocks

pub mod bind;
