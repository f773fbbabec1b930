//! Evaluation modes.
//!
//! The mode decides the recursion policy: hosts running trusted programs
//! rely on `stacker` to grow the native stack, while test runs and
//! embedders that need a hard ceiling get a bounded call depth.

#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum EvalMode {
    /// Unbounded call depth on native targets.
    #[default]
    Interpret,
    /// Bounded depth for test suites.
    TestRun,
    /// Host-chosen depth limit.
    Budgeted { max_depth: usize },
}

impl EvalMode {
    /// Maximum call depth, or `None` for unlimited (native `stacker` fallback).
    ///
    /// - `Interpret`: `None` on native, 200 on WASM
    /// - `TestRun`: 500
    /// - `Budgeted`: the configured limit
    #[inline]
    pub fn max_call_depth(&self) -> Option<usize> {
        match self {
            Self::Interpret => {
                #[cfg(target_arch = "wasm32")]
                {
                    Some(200)
                }
                #[cfg(not(target_arch = "wasm32"))]
                {
                    None
                }
            }
            Self::TestRun => Some(500),
            Self::Budgeted { max_depth } => Some(*max_depth),
        }
    }
}
