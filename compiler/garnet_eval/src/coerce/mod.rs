//! Implicit conversions used by splats, array literals and multi-assignment.

use crate::errors::{coercion_failure, implicit_conversion, EvalError};
use crate::value::{HashEntries, HashKey, KeywordArgs, Value};

/// One element of a sequence literal or sugared assignment, already evaluated.
#[derive(Clone, Debug, PartialEq)]
pub enum SequenceItem {
    Plain(Value),
    /// `*value`: contributes every element of its sequence form.
    Spread(Value),
}

/// Sequence form of a splatted value.
///
/// - `nil` is empty
/// - arrays yield their elements
/// - hashes yield `[key, value]` pairs
/// - objects with a `to_a` hook yield its result, which must be an array
/// - anything else is a one-element sequence
pub fn to_sequence(value: &Value) -> Result<Vec<Value>, EvalError> {
    match value {
        Value::Nil => Ok(Vec::new()),
        Value::Array(items) => Ok(items.as_ref().clone()),
        Value::Hash(entries) => Ok(entries
            .iter()
            .map(|(key, value)| Value::array(vec![key.to_value(), value.clone()]))
            .collect()),
        Value::Object(object) => match object.to_a {
            Some(hook) => match hook(object) {
                Value::Array(items) => Ok(items.as_ref().clone()),
                other => Err(coercion_failure(&object.class_name, other.type_name())),
            },
            None => Ok(vec![value.clone()]),
        },
        other => Ok(vec![other.clone()]),
    }
}

/// Build the element list of a sequence literal, expanding spreads in order.
pub fn build_sequence_literal(
    items: impl IntoIterator<Item = SequenceItem>,
) -> Result<Vec<Value>, EvalError> {
    let mut out = Vec::new();
    for item in items {
        match item {
            SequenceItem::Plain(value) => out.push(value),
            SequenceItem::Spread(value) => out.extend(to_sequence(&value)?),
        }
    }
    Ok(out)
}

/// Value stored by `name = rhs...`.
///
/// A lone spread always stores an array (`a = *nil` is `[]`), a lone plain
/// value is stored as is, and anything longer becomes an array.
pub fn normalize_multi_assign_rhs(mut items: Vec<SequenceItem>) -> Result<Value, EvalError> {
    if items.len() == 1 {
        return match items.pop() {
            Some(SequenceItem::Plain(value)) => Ok(value),
            Some(SequenceItem::Spread(value)) => Ok(Value::array(to_sequence(&value)?)),
            None => Ok(Value::Nil),
        };
    }
    Ok(Value::array(build_sequence_literal(items)?))
}

/// Keyword arguments contributed by `**value` at a call site.
///
/// `nil` contributes nothing; a hash must have only symbol keys.
pub fn to_keywords(value: &Value) -> Result<KeywordArgs, EvalError> {
    match value {
        Value::Nil => Ok(KeywordArgs::default()),
        Value::Hash(entries) => {
            let mut keywords = KeywordArgs::default();
            for (key, value) in entries.iter() {
                match key {
                    HashKey::Symbol(name) => {
                        keywords.insert(*name, value.clone());
                    }
                    other => {
                        return Err(implicit_conversion(other.to_value().type_name(), "Symbol"))
                    }
                }
            }
            Ok(keywords)
        }
        other => Err(implicit_conversion(other.type_name(), "Hash")),
    }
}

/// Entries contributed by `**value` inside a hash literal.
pub fn to_hash_entries(value: &Value) -> Result<HashEntries, EvalError> {
    match value {
        Value::Nil => Ok(HashEntries::default()),
        Value::Hash(entries) => Ok(entries.as_ref().clone()),
        other => Err(implicit_conversion(other.type_name(), "Hash")),
    }
}
