//! Runtime values.
//!
//! Heap values are reference counted with `Rc`: closures capture
//! `LocalScope`s, which are single-threaded, so nothing here is `Send`.

use std::fmt;
use std::rc::Rc;

use garnet_ir::{ExprId, Name, ParamList, StringLookup};
use indexmap::IndexMap;
use rustc_hash::FxBuildHasher;

use crate::environment::{LocalScope, Scope};
use crate::errors::{unhashable_key, EvalError, FrameId};

/// Insertion-ordered hash contents.
pub type HashEntries = IndexMap<HashKey, Value, FxBuildHasher>;

/// Keyword arguments of a call, in call-site order.
pub type KeywordArgs = IndexMap<Name, Value, FxBuildHasher>;

/// Conversion hook a host object exposes as `to_a`.
pub type ToAFn = fn(&ObjectValue) -> Value;

/// Runtime value.
#[derive(Clone)]
pub enum Value {
    Nil,
    Bool(bool),
    Int(i64),
    Str(Rc<str>),
    Symbol(Name),
    Array(Rc<Vec<Value>>),
    Hash(Rc<HashEntries>),
    /// Block or lambda closure.
    Proc(ProcValue),
    /// Host-provided object.
    Object(Rc<ObjectValue>),
}

impl Value {
    #[inline]
    pub fn string(s: impl Into<Rc<str>>) -> Self {
        Value::Str(s.into())
    }

    #[inline]
    pub fn array(items: Vec<Value>) -> Self {
        Value::Array(Rc::new(items))
    }

    #[inline]
    pub fn hash(entries: HashEntries) -> Self {
        Value::Hash(Rc::new(entries))
    }

    /// Hash with symbol keys built from keyword arguments.
    pub fn hash_from_keywords(keywords: KeywordArgs) -> Self {
        Value::hash(
            keywords
                .into_iter()
                .map(|(name, value)| (HashKey::Symbol(name), value))
                .collect(),
        )
    }

    pub fn object(object: ObjectValue) -> Self {
        Value::Object(Rc::new(object))
    }

    /// `nil` and `false` are falsy; everything else is truthy.
    #[inline]
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Nil | Value::Bool(false))
    }

    #[inline]
    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    /// Class name as the language reports it.
    pub fn type_name(&self) -> &str {
        match self {
            Value::Nil => "NilClass",
            Value::Bool(true) => "TrueClass",
            Value::Bool(false) => "FalseClass",
            Value::Int(_) => "Integer",
            Value::Str(_) => "String",
            Value::Symbol(_) => "Symbol",
            Value::Array(_) => "Array",
            Value::Hash(_) => "Hash",
            Value::Proc(_) => "Proc",
            Value::Object(o) => &o.class_name,
        }
    }

    /// Name used in "for nil" / "for an instance of X" messages.
    pub fn receiver_description(&self) -> String {
        match self {
            Value::Nil => "nil".to_string(),
            Value::Bool(b) => b.to_string(),
            other => format!("an instance of {}", other.type_name()),
        }
    }

    /// Source-like rendering (`inspect`).
    pub fn inspect<I: StringLookup + ?Sized>(&self, names: &I) -> String {
        match self {
            Value::Nil => "nil".to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Int(n) => n.to_string(),
            Value::Str(s) => format!("{s:?}"),
            Value::Symbol(name) => format!(":{}", names.lookup(*name)),
            Value::Array(items) => {
                let parts: Vec<String> = items.iter().map(|v| v.inspect(names)).collect();
                format!("[{}]", parts.join(", "))
            }
            Value::Hash(entries) => {
                if entries.is_empty() {
                    return "{}".to_string();
                }
                let parts: Vec<String> = entries
                    .iter()
                    .map(|(key, value)| match key {
                        HashKey::Symbol(name) => {
                            format!("{}: {}", names.lookup(*name), value.inspect(names))
                        }
                        other => format!(
                            "{} => {}",
                            other.to_value().inspect(names),
                            value.inspect(names)
                        ),
                    })
                    .collect();
                format!("{{{}}}", parts.join(", "))
            }
            Value::Proc(p) => {
                if p.is_lambda() {
                    "#<Proc (lambda)>".to_string()
                } else {
                    "#<Proc>".to_string()
                }
            }
            Value::Object(o) => format!("#<{}>", o.class_name),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Symbol(a), Value::Symbol(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Hash(a), Value::Hash(b)) => a == b,
            (Value::Proc(a), Value::Proc(b)) => a.ptr_eq(b),
            (Value::Object(a), Value::Object(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "Nil"),
            Value::Bool(b) => write!(f, "Bool({b})"),
            Value::Int(n) => write!(f, "Int({n})"),
            Value::Str(s) => write!(f, "Str({s:?})"),
            Value::Symbol(name) => write!(f, "Symbol({})", name.raw()),
            Value::Array(items) => f.debug_list().entries(items.iter()).finish(),
            Value::Hash(entries) => f.debug_map().entries(entries.iter()).finish(),
            Value::Proc(p) => write!(f, "{p:?}"),
            Value::Object(o) => write!(f, "Object({})", o.class_name),
        }
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::string(s)
    }
}

/// Hashable subset of values usable as hash keys.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum HashKey {
    Nil,
    Bool(bool),
    Int(i64),
    Str(Rc<str>),
    Symbol(Name),
}

impl HashKey {
    /// Convert a value into a key; arrays, hashes, procs and objects are rejected.
    pub fn from_value(value: &Value) -> Result<Self, EvalError> {
        match value {
            Value::Nil => Ok(HashKey::Nil),
            Value::Bool(b) => Ok(HashKey::Bool(*b)),
            Value::Int(n) => Ok(HashKey::Int(*n)),
            Value::Str(s) => Ok(HashKey::Str(Rc::clone(s))),
            Value::Symbol(name) => Ok(HashKey::Symbol(*name)),
            other => Err(unhashable_key(other.type_name())),
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            HashKey::Nil => Value::Nil,
            HashKey::Bool(b) => Value::Bool(*b),
            HashKey::Int(n) => Value::Int(*n),
            HashKey::Str(s) => Value::Str(Rc::clone(s)),
            HashKey::Symbol(name) => Value::Symbol(*name),
        }
    }
}

/// A closure created from a block or lambda literal.
#[derive(Clone)]
pub struct ProcValue(Rc<ProcData>);

/// Everything a closure needs to run its body later.
pub struct ProcData {
    /// The literal node, used to find the scope's owned names.
    pub literal: ExprId,
    pub params: ParamList,
    pub body: ExprId,
    /// Lexical scope active where the literal was written.
    pub captured: LocalScope<Scope>,
    /// Strict (lambda) or lenient (block) semantics.
    pub is_lambda: bool,
    /// Method or lambda frame a `return` inside the body leaves.
    pub home: Option<FrameId>,
    /// Call a `break` inside the body leaves.
    pub break_tag: Option<FrameId>,
    /// Block visible to `yield` inside the body.
    pub outer_block: Option<ProcValue>,
}

impl ProcValue {
    pub fn new(data: ProcData) -> Self {
        ProcValue(Rc::new(data))
    }

    #[inline]
    pub fn data(&self) -> &ProcData {
        &self.0
    }

    #[inline]
    pub fn is_lambda(&self) -> bool {
        self.0.is_lambda
    }

    /// Same closure, flagged as a lambda (`lambda { ... }`).
    pub fn to_lambda(&self) -> ProcValue {
        let data = &self.0;
        ProcValue::new(ProcData {
            literal: data.literal,
            params: data.params.clone(),
            body: data.body,
            captured: data.captured.clone(),
            is_lambda: true,
            home: data.home,
            break_tag: data.break_tag,
            outer_block: data.outer_block.clone(),
        })
    }

    pub fn ptr_eq(&self, other: &ProcValue) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for ProcValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcValue")
            .field("literal", &self.0.literal)
            .field("is_lambda", &self.0.is_lambda)
            .field("home", &self.0.home)
            .field("break_tag", &self.0.break_tag)
            .finish_non_exhaustive()
    }
}

/// An opaque host object.
///
/// Method dispatch is out of scope for the engine; the only capability an
/// object can expose is the `to_a` conversion used by splats.
pub struct ObjectValue {
    pub class_name: String,
    pub payload: Vec<Value>,
    pub to_a: Option<ToAFn>,
}

impl ObjectValue {
    pub fn new(class_name: impl Into<String>) -> Self {
        ObjectValue {
            class_name: class_name.into(),
            payload: Vec::new(),
            to_a: None,
        }
    }

    #[must_use]
    pub fn with_payload(mut self, payload: Vec<Value>) -> Self {
        self.payload = payload;
        self
    }

    #[must_use]
    pub fn with_to_a(mut self, hook: ToAFn) -> Self {
        self.to_a = Some(hook);
        self
    }
}
