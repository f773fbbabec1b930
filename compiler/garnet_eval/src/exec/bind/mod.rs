//! Argument binding.
//!
//! Binding happens in two steps. [`CallArgs`] collects evaluated
//! arguments, expanding `*` and `**` at the call site. [`plan_arguments`]
//! then decides, without touching any scope, what each parameter receives.
//! Defaults are only named in the plan; the interpreter evaluates them in
//! the callee's scope so they can read earlier parameters.

use smallvec::SmallVec;
use tracing::trace;

use garnet_ir::{ExprId, Name, ParamKind, ParamList, StringInterner};

use crate::coerce::{to_keywords, to_sequence};
use crate::errors::{
    arity_mismatch, missing_keywords, no_keywords_accepted, unknown_keywords, Arity, EvalError,
};
use crate::value::{KeywordArgs, Value};

/// How mismatched argument counts are handled.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BindMode {
    /// Methods and lambdas: mismatches are errors.
    Strict,
    /// Blocks: missing arguments are nil, extras are dropped, and a single
    /// array argument may be spread across several parameters.
    Lenient,
}

impl BindMode {
    #[inline]
    pub fn for_lambda(is_lambda: bool) -> Self {
        if is_lambda {
            BindMode::Strict
        } else {
            BindMode::Lenient
        }
    }
}

/// Evaluated arguments of one call.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CallArgs {
    pub positional: SmallVec<[Value; 4]>,
    pub keywords: KeywordArgs,
}

impl CallArgs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Positional-only arguments.
    pub fn positional(values: impl IntoIterator<Item = Value>) -> Self {
        CallArgs {
            positional: values.into_iter().collect(),
            keywords: KeywordArgs::default(),
        }
    }

    pub fn push(&mut self, value: Value) {
        self.positional.push(value);
    }

    /// `*value`: append the value's sequence form.
    pub fn push_spread(&mut self, value: &Value) -> Result<(), EvalError> {
        self.positional.extend(to_sequence(value)?);
        Ok(())
    }

    /// `key: value`. A later keyword with the same name wins.
    pub fn push_keyword(&mut self, name: Name, value: Value) {
        self.keywords.insert(name, value);
    }

    /// `**value`: merge a keyword hash (`nil` merges nothing).
    pub fn merge_keywords(&mut self, value: &Value) -> Result<(), EvalError> {
        self.keywords.extend(to_keywords(value)?);
        Ok(())
    }
}

/// What one parameter receives.
#[derive(Clone, Debug, PartialEq)]
pub enum Binding {
    Value(Value),
    /// Evaluate this default expression in the callee's scope.
    Default(ExprId),
    /// The block passed to the call, or nil.
    Block,
}

/// A parameter paired with what it receives, in declaration order.
#[derive(Clone, Debug, PartialEq)]
pub struct PlannedParam {
    pub name: Name,
    pub binding: Binding,
}

/// Per-parameter bindings for one call.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BindPlan {
    pub params: Vec<PlannedParam>,
}

/// Parameter indices grouped by role.
#[derive(Default)]
struct Shape {
    leading: SmallVec<[usize; 4]>,
    optional: SmallVec<[usize; 4]>,
    rest: Option<usize>,
    trailing: SmallVec<[usize; 4]>,
    keywords: SmallVec<[usize; 4]>,
    keyword_rest: Option<usize>,
    no_keywords: bool,
    block: Option<usize>,
}

impl Shape {
    fn of(params: &ParamList) -> Self {
        let mut shape = Shape::default();
        for (i, param) in params.params().iter().enumerate() {
            match param.kind {
                ParamKind::Required => {
                    if shape.rest.is_some() || !shape.optional.is_empty() {
                        shape.trailing.push(i);
                    } else {
                        shape.leading.push(i);
                    }
                }
                ParamKind::Optional(_) => shape.optional.push(i),
                ParamKind::Rest => shape.rest = Some(i),
                ParamKind::KeywordRequired | ParamKind::KeywordOptional(_) => {
                    shape.keywords.push(i);
                }
                ParamKind::KeywordRest => shape.keyword_rest = Some(i),
                ParamKind::NoKeywords => shape.no_keywords = true,
                ParamKind::Block => shape.block = Some(i),
            }
        }
        shape
    }

    fn arity(&self) -> Arity {
        Arity {
            required: self.leading.len() + self.trailing.len(),
            optional: self.optional.len(),
            rest: self.rest.is_some(),
        }
    }

    fn positional_slots(&self) -> usize {
        self.leading.len() + self.optional.len() + self.trailing.len()
    }

    fn takes_keywords(&self) -> bool {
        !self.keywords.is_empty() || self.keyword_rest.is_some() || self.no_keywords
    }
}

/// Decide what every parameter of `params` receives from `args`.
pub fn plan_arguments(
    params: &ParamList,
    mode: BindMode,
    args: CallArgs,
    interner: &StringInterner,
) -> Result<BindPlan, EvalError> {
    let shape = Shape::of(params);
    let CallArgs {
        mut positional,
        mut keywords,
    } = args;

    // Keywords passed to a callable without keyword parameters arrive as a
    // trailing positional hash.
    if !shape.takes_keywords() && !keywords.is_empty() {
        positional.push(Value::hash_from_keywords(std::mem::take(&mut keywords)));
    }

    if mode == BindMode::Lenient
        && positional.len() == 1
        && shape.positional_slots() + usize::from(shape.rest.is_some()) >= 2
    {
        if let Some(Value::Array(items)) = positional.first() {
            trace!(len = items.len(), "auto-splat block argument");
            positional = items.iter().cloned().collect();
        }
    }

    let arity = shape.arity();
    match mode {
        BindMode::Strict => {
            if !arity.accepts(positional.len()) {
                return Err(arity_mismatch(positional.len(), arity));
            }
        }
        BindMode::Lenient => {
            if let Some(max) = arity.max() {
                if positional.len() > max {
                    trace!(given = positional.len(), max, "dropping extra block arguments");
                    positional.truncate(max);
                }
            }
            while positional.len() < arity.required {
                positional.push(Value::Nil);
            }
        }
    }

    let mut slots: Vec<Option<Binding>> = vec![None; params.len()];
    let given = positional.len();

    let mut args = positional.into_iter();
    for &i in &shape.leading {
        slots[i] = Some(Binding::Value(args.next().unwrap_or(Value::Nil)));
    }
    let middle_len = given - shape.leading.len() - shape.trailing.len();
    let middle: Vec<Value> = args.by_ref().take(middle_len).collect();
    for &i in &shape.trailing {
        slots[i] = Some(Binding::Value(args.next().unwrap_or(Value::Nil)));
    }

    let mut middle_iter = middle.into_iter();
    for &i in &shape.optional {
        slots[i] = Some(match middle_iter.next() {
            Some(value) => Binding::Value(value),
            None => match params.params()[i].kind {
                ParamKind::Optional(default) => Binding::Default(default),
                _ => Binding::Value(Value::Nil),
            },
        });
    }
    let rest_values: Vec<Value> = middle_iter.collect();
    if let Some(i) = shape.rest {
        slots[i] = Some(Binding::Value(Value::array(rest_values)));
    }

    bind_keywords(params, &shape, mode, keywords, interner, &mut slots)?;

    if let Some(i) = shape.block {
        slots[i] = Some(Binding::Block);
    }

    Ok(BindPlan {
        params: params
            .params()
            .iter()
            .zip(slots)
            .filter(|(param, _)| param.kind != ParamKind::NoKeywords)
            .map(|(param, slot)| PlannedParam {
                name: param.name,
                binding: slot.unwrap_or(Binding::Value(Value::Nil)),
            })
            .collect(),
    })
}

fn bind_keywords(
    params: &ParamList,
    shape: &Shape,
    mode: BindMode,
    mut keywords: KeywordArgs,
    interner: &StringInterner,
    slots: &mut [Option<Binding>],
) -> Result<(), EvalError> {
    if shape.no_keywords {
        if !keywords.is_empty() && mode == BindMode::Strict {
            return Err(no_keywords_accepted());
        }
        return Ok(());
    }

    let mut missing = Vec::new();
    for &i in &shape.keywords {
        let param = params.params()[i];
        slots[i] = Some(match (keywords.shift_remove(&param.name), param.kind) {
            (Some(value), _) => Binding::Value(value),
            (None, ParamKind::KeywordOptional(default)) => Binding::Default(default),
            (None, _) => {
                missing.push(interner.lookup(param.name).to_string());
                Binding::Value(Value::Nil)
            }
        });
    }
    if mode == BindMode::Strict && !missing.is_empty() {
        return Err(missing_keywords(missing));
    }

    match shape.keyword_rest {
        Some(i) => slots[i] = Some(Binding::Value(Value::hash_from_keywords(keywords))),
        None => {
            if mode == BindMode::Strict && !keywords.is_empty() {
                let names = keywords
                    .keys()
                    .map(|name| interner.lookup(*name).to_string())
                    .collect();
                return Err(unknown_keywords(names));
            }
        }
    }
    Ok(())
}
