//! Parameter descriptors for methods, lambdas and blocks.

use rustc_hash::FxHashSet;

use crate::{ExprId, Name};

/// The role of one parameter.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ParamKind {
    /// `a`
    Required,
    /// `a = default`
    Optional(ExprId),
    /// `*rest` (anonymous when the name is empty)
    Rest,
    /// `key:`
    KeywordRequired,
    /// `key: default`
    KeywordOptional(ExprId),
    /// `**opts` (anonymous when the name is empty)
    KeywordRest,
    /// `**nil`: the callable accepts no keywords.
    NoKeywords,
    /// `&block`
    Block,
}

impl ParamKind {
    /// Whether the parameter is filled from positional arguments.
    pub fn is_positional(self) -> bool {
        matches!(
            self,
            ParamKind::Required | ParamKind::Optional(_) | ParamKind::Rest
        )
    }

    /// Whether the parameter is filled from keyword arguments.
    pub fn is_keyword(self) -> bool {
        matches!(
            self,
            ParamKind::KeywordRequired
                | ParamKind::KeywordOptional(_)
                | ParamKind::KeywordRest
                | ParamKind::NoKeywords
        )
    }
}

/// A named parameter.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Param {
    pub name: Name,
    pub kind: ParamKind,
}

impl Param {
    pub fn required(name: Name) -> Self {
        Param {
            name,
            kind: ParamKind::Required,
        }
    }

    pub fn optional(name: Name, default: ExprId) -> Self {
        Param {
            name,
            kind: ParamKind::Optional(default),
        }
    }

    pub fn rest(name: Name) -> Self {
        Param {
            name,
            kind: ParamKind::Rest,
        }
    }

    pub fn keyword(name: Name) -> Self {
        Param {
            name,
            kind: ParamKind::KeywordRequired,
        }
    }

    pub fn keyword_optional(name: Name, default: ExprId) -> Self {
        Param {
            name,
            kind: ParamKind::KeywordOptional(default),
        }
    }

    pub fn keyword_rest(name: Name) -> Self {
        Param {
            name,
            kind: ParamKind::KeywordRest,
        }
    }

    pub fn no_keywords() -> Self {
        Param {
            name: Name::EMPTY,
            kind: ParamKind::NoKeywords,
        }
    }

    pub fn block(name: Name) -> Self {
        Param {
            name,
            kind: ParamKind::Block,
        }
    }
}

/// Structural problems in a parameter list.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ParamError {
    #[error("more than one rest parameter")]
    DuplicateRest,
    #[error("more than one keyword rest parameter")]
    DuplicateKeywordRest,
    #[error("optional parameter after rest or trailing required parameter")]
    MisplacedOptional,
    #[error("positional parameter after keyword parameter")]
    PositionalAfterKeyword,
    #[error("block parameter must come last")]
    BlockNotLast,
    #[error("duplicated argument name")]
    DuplicateName { name: Name },
}

/// Ordered parameter list of a callable.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ParamList {
    params: Vec<Param>,
}

impl ParamList {
    pub fn new(params: Vec<Param>) -> Self {
        ParamList { params }
    }

    /// The empty list (`||` or no parameters at all).
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn params(&self) -> &[Param] {
        &self.params
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Names bound by this list, in declaration order. Anonymous `*`/`**`
    /// and the `**nil` marker bind nothing.
    pub fn bound_names(&self) -> impl Iterator<Item = Name> + '_ {
        self.params
            .iter()
            .filter(|p| !p.name.is_empty())
            .map(|p| p.name)
    }

    /// Default expressions in declaration order.
    pub fn defaults(&self) -> impl Iterator<Item = ExprId> + '_ {
        self.params.iter().filter_map(|p| match p.kind {
            ParamKind::Optional(id) | ParamKind::KeywordOptional(id) => Some(id),
            _ => None,
        })
    }

    /// Whether any keyword parameter (including `**nil`) is declared.
    pub fn accepts_keywords_syntax(&self) -> bool {
        self.params.iter().any(|p| p.kind.is_keyword())
    }

    /// Check the ordering and uniqueness rules of a parameter list.
    pub fn validate(&self) -> Result<(), ParamError> {
        let mut seen_rest = false;
        let mut seen_trailing = false;
        let mut seen_keyword = false;
        let mut seen_keyword_rest = false;
        let mut names = FxHashSet::default();

        for (i, param) in self.params.iter().enumerate() {
            if !param.name.is_empty() && !names.insert(param.name) {
                return Err(ParamError::DuplicateName { name: param.name });
            }
            if param.kind.is_positional() && seen_keyword {
                return Err(ParamError::PositionalAfterKeyword);
            }
            match param.kind {
                ParamKind::Required => {
                    if seen_rest || self.has_optional_before(i) {
                        seen_trailing = true;
                    }
                }
                ParamKind::Optional(_) => {
                    if seen_rest || seen_trailing {
                        return Err(ParamError::MisplacedOptional);
                    }
                }
                ParamKind::Rest => {
                    if seen_rest {
                        return Err(ParamError::DuplicateRest);
                    }
                    if seen_trailing {
                        return Err(ParamError::MisplacedOptional);
                    }
                    seen_rest = true;
                }
                ParamKind::KeywordRequired | ParamKind::KeywordOptional(_) => {
                    seen_keyword = true;
                }
                ParamKind::KeywordRest | ParamKind::NoKeywords => {
                    if seen_keyword_rest {
                        return Err(ParamError::DuplicateKeywordRest);
                    }
                    seen_keyword_rest = true;
                    seen_keyword = true;
                }
                ParamKind::Block => {
                    if i + 1 != self.params.len() {
                        return Err(ParamError::BlockNotLast);
                    }
                }
            }
        }
        Ok(())
    }

    fn has_optional_before(&self, index: usize) -> bool {
        self.params[..index]
            .iter()
            .any(|p| matches!(p.kind, ParamKind::Optional(_)))
    }
}
