//! Evaluation errors and non-local control signals.
//!
//! `EvalErrorKind` carries the structured error data; factory functions
//! populate both `kind` and `message`, so callers match on the kind and
//! display the message. Non-local exits (`return`, `break`, `next`, `redo`)
//! travel through the same `Err` channel as [`ControlAction`] variants and
//! are never rescued.

use std::fmt;

use crate::value::Value;

/// Result of evaluating one node.
pub type EvalResult = Result<Value, ControlAction>;

/// Identity of one activation on the call stack.
///
/// Ids are never reused within an interpreter, so a captured id whose frame
/// has been popped can be detected as dead.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrameId(u32);

impl FrameId {
    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        FrameId(raw)
    }

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

/// Where a `break` is headed.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BreakTarget {
    /// The innermost enclosing loop of the current frame.
    Loop,
    /// The call identified by this frame id.
    Frame(FrameId),
}

/// Non-value outcome of evaluating a node.
#[derive(Clone, Debug)]
pub enum ControlAction {
    Error(Box<EvalError>),
    Return { value: Value, target: FrameId },
    Break { value: Value, target: BreakTarget },
    Next(Value),
    Redo,
}

impl ControlAction {
    #[inline]
    pub fn is_error(&self) -> bool {
        matches!(self, ControlAction::Error(_))
    }

    /// Signal kind, for diagnostics.
    pub fn signal(&self) -> Option<Signal> {
        match self {
            ControlAction::Error(_) => None,
            ControlAction::Return { .. } => Some(Signal::Return),
            ControlAction::Break { .. } => Some(Signal::Break),
            ControlAction::Next(_) => Some(Signal::Next),
            ControlAction::Redo => Some(Signal::Redo),
        }
    }

    /// Convert an action that escaped every handler into an error.
    pub fn into_eval_error(self) -> EvalError {
        match self {
            ControlAction::Error(e) => *e,
            ControlAction::Return { .. } => {
                invalid_control_transfer(Signal::Return, "unexpected return")
            }
            ControlAction::Break { .. } => {
                invalid_control_transfer(Signal::Break, "break from proc-closure")
            }
            ControlAction::Next(_) => invalid_control_transfer(Signal::Next, "unexpected next"),
            ControlAction::Redo => invalid_control_transfer(Signal::Redo, "unexpected redo"),
        }
    }
}

impl From<EvalError> for ControlAction {
    fn from(e: EvalError) -> Self {
        ControlAction::Error(Box::new(e))
    }
}

/// Non-local exit kinds.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Signal {
    Return,
    Break,
    Next,
    Redo,
    Yield,
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Signal::Return => "return",
            Signal::Break => "break",
            Signal::Next => "next",
            Signal::Redo => "redo",
            Signal::Yield => "yield",
        })
    }
}

/// Accepted positional argument counts, rendered the way arity errors
/// report them (`2`, `1..3`, `1+`).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Arity {
    pub required: usize,
    pub optional: usize,
    pub rest: bool,
}

impl Arity {
    pub fn max(self) -> Option<usize> {
        if self.rest {
            None
        } else {
            Some(self.required + self.optional)
        }
    }

    pub fn accepts(self, given: usize) -> bool {
        given >= self.required
            && match self.max() {
                Some(max) => given <= max,
                None => true,
            }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.max() {
            None => write!(f, "{}+", self.required),
            Some(max) if max == self.required => write!(f, "{max}"),
            Some(max) => write!(f, "{}..{max}", self.required),
        }
    }
}

/// Coarse error grouping exposed to hosts.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ErrorCategory {
    UnboundVariable,
    CoercionFailure,
    ArityMismatch,
    InvalidControlTransfer,
    Other,
}

/// Structured error data.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EvalErrorKind {
    // Variables
    UndefinedVariable {
        name: String,
    },

    // Coercion
    /// `to_a` returned something other than an array.
    CoercionFailure {
        type_name: String,
        got: String,
    },
    /// No implicit conversion into the target type exists.
    ImplicitConversion {
        type_name: String,
        target: &'static str,
    },
    UnhashableKey {
        type_name: String,
    },

    // Binding
    ArityMismatch {
        given: usize,
        expected: Arity,
    },
    MissingKeywords {
        names: Vec<String>,
    },
    UnknownKeywords {
        names: Vec<String>,
    },
    NoKeywordsAccepted,

    // Control
    InvalidControlTransfer {
        signal: Signal,
        reason: String,
    },

    // Calls and operators
    UndefinedMethod {
        method: String,
        receiver: String,
    },
    NotCallable {
        type_name: String,
    },
    /// Right operand of an integer operator is not an integer.
    OperandCoercion {
        type_name: String,
        target: String,
    },
    IntegerOverflow {
        operation: String,
    },
    StackOverflow {
        depth: usize,
    },

    /// `raise` with a message.
    Raised {
        message: String,
    },
    /// The tree failed static checks.
    InvalidProgram {
        message: String,
    },
    /// Catch-all for errors without a structured kind.
    Custom {
        message: String,
    },
}

impl EvalErrorKind {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::UndefinedVariable { .. } => ErrorCategory::UnboundVariable,
            Self::CoercionFailure { .. }
            | Self::ImplicitConversion { .. }
            | Self::UnhashableKey { .. } => ErrorCategory::CoercionFailure,
            Self::ArityMismatch { .. }
            | Self::MissingKeywords { .. }
            | Self::UnknownKeywords { .. }
            | Self::NoKeywordsAccepted => ErrorCategory::ArityMismatch,
            Self::InvalidControlTransfer { .. } => ErrorCategory::InvalidControlTransfer,
            _ => ErrorCategory::Other,
        }
    }

    /// Exception class the error presents as to `rescue`.
    pub fn class_name(&self) -> &'static str {
        self.ancestors()[0]
    }

    /// Class chain, most specific first.
    pub fn ancestors(&self) -> &'static [&'static str] {
        match self {
            Self::UndefinedVariable { .. } => &["NameError", "StandardError", "Exception"],
            Self::UndefinedMethod { .. } => {
                &["NoMethodError", "NameError", "StandardError", "Exception"]
            }
            Self::CoercionFailure { .. }
            | Self::ImplicitConversion { .. }
            | Self::UnhashableKey { .. }
            | Self::OperandCoercion { .. } => &["TypeError", "StandardError", "Exception"],
            Self::ArityMismatch { .. }
            | Self::MissingKeywords { .. }
            | Self::UnknownKeywords { .. }
            | Self::NoKeywordsAccepted => &["ArgumentError", "StandardError", "Exception"],
            Self::InvalidControlTransfer { .. } => {
                &["LocalJumpError", "StandardError", "Exception"]
            }
            Self::NotCallable { .. } => {
                &["NoMethodError", "NameError", "StandardError", "Exception"]
            }
            Self::IntegerOverflow { .. } => &["RangeError", "StandardError", "Exception"],
            Self::StackOverflow { .. } => &["SystemStackError", "Exception"],
            Self::InvalidProgram { .. } => &["SyntaxError", "ScriptError", "Exception"],
            Self::Raised { .. } | Self::Custom { .. } => {
                &["RuntimeError", "StandardError", "Exception"]
            }
        }
    }

    /// Whether `rescue class_name` catches this error.
    pub fn is_a(&self, class_name: &str) -> bool {
        self.ancestors().contains(&class_name)
    }
}

fn symbol_list(names: &[String]) -> String {
    names
        .iter()
        .map(|n| format!(":{n}"))
        .collect::<Vec<_>>()
        .join(", ")
}

impl fmt::Display for EvalErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UndefinedVariable { name } => {
                write!(f, "undefined local variable or method '{name}' for main")
            }
            Self::CoercionFailure { type_name, got } => write!(
                f,
                "can't convert {type_name} to Array ({type_name}#to_a gives {got})"
            ),
            Self::ImplicitConversion { type_name, target } => {
                write!(f, "no implicit conversion of {type_name} into {target}")
            }
            Self::UnhashableKey { type_name } => {
                write!(f, "{type_name} cannot be used as a hash key")
            }
            Self::ArityMismatch { given, expected } => {
                write!(
                    f,
                    "wrong number of arguments (given {given}, expected {expected})"
                )
            }
            Self::MissingKeywords { names } => {
                let word = if names.len() == 1 { "keyword" } else { "keywords" };
                write!(f, "missing {word}: {}", symbol_list(names))
            }
            Self::UnknownKeywords { names } => {
                let word = if names.len() == 1 { "keyword" } else { "keywords" };
                write!(f, "unknown {word}: {}", symbol_list(names))
            }
            Self::NoKeywordsAccepted => write!(f, "no keywords accepted"),
            Self::InvalidControlTransfer { reason, .. } => write!(f, "{reason}"),
            Self::UndefinedMethod { method, receiver } => {
                write!(f, "undefined method '{method}' for {receiver}")
            }
            Self::NotCallable { type_name } => {
                write!(f, "undefined method 'call' for an instance of {type_name}")
            }
            Self::OperandCoercion { type_name, target } => {
                write!(f, "{type_name} can't be coerced into {target}")
            }
            Self::IntegerOverflow { operation } => {
                write!(f, "integer overflow in {operation}")
            }
            Self::StackOverflow { depth } => {
                write!(f, "stack level too deep (limit: {depth})")
            }
            Self::Raised { message } | Self::InvalidProgram { message } | Self::Custom { message } => {
                write!(f, "{message}")
            }
        }
    }
}

/// A single frame in an evaluation backtrace.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BacktraceFrame {
    pub name: String,
}

/// Snapshot of the call stack where an error was raised, innermost first.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EvalBacktrace {
    frames: Vec<BacktraceFrame>,
}

impl EvalBacktrace {
    pub fn new(frames: Vec<BacktraceFrame>) -> Self {
        Self { frames }
    }

    pub fn frames(&self) -> &[BacktraceFrame] {
        &self.frames
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }
}

impl fmt::Display for EvalBacktrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.frames.is_empty() {
            return Ok(());
        }
        writeln!(f, "stack backtrace:")?;
        for (i, frame) in self.frames.iter().enumerate() {
            writeln!(f, "  {i}: {}", frame.name)?;
        }
        Ok(())
    }
}

/// Evaluation error.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EvalError {
    pub kind: EvalErrorKind,
    /// Human-readable message; equals `kind.to_string()` for factory errors.
    pub message: String,
    /// Call stack at the error site, attached by the innermost frame it escapes.
    pub backtrace: Option<EvalBacktrace>,
}

impl EvalError {
    /// Create an error with just a message (`Custom` kind).
    pub fn new(message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            kind: EvalErrorKind::Custom {
                message: message.clone(),
            },
            message,
            backtrace: None,
        }
    }

    fn from_kind(kind: EvalErrorKind) -> Self {
        let message = kind.to_string();
        Self {
            kind,
            message,
            backtrace: None,
        }
    }

    #[inline]
    pub fn category(&self) -> ErrorCategory {
        self.kind.category()
    }

    #[inline]
    pub fn class_name(&self) -> &'static str {
        self.kind.class_name()
    }

    #[must_use]
    pub fn with_backtrace(mut self, backtrace: EvalBacktrace) -> Self {
        self.backtrace = Some(backtrace);
        self
    }
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.message, self.class_name())
    }
}

impl std::error::Error for EvalError {}

// Variables

#[cold]
pub fn undefined_variable(name: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::UndefinedVariable {
        name: name.to_string(),
    })
}

// Coercion

/// `to_a` returned a non-array.
#[cold]
pub fn coercion_failure(type_name: &str, got: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::CoercionFailure {
        type_name: type_name.to_string(),
        got: got.to_string(),
    })
}

#[cold]
pub fn implicit_conversion(type_name: &str, target: &'static str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::ImplicitConversion {
        type_name: type_name.to_string(),
        target,
    })
}

#[cold]
pub fn unhashable_key(type_name: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::UnhashableKey {
        type_name: type_name.to_string(),
    })
}

// Binding

#[cold]
pub fn arity_mismatch(given: usize, expected: Arity) -> EvalError {
    EvalError::from_kind(EvalErrorKind::ArityMismatch { given, expected })
}

#[cold]
pub fn missing_keywords(names: Vec<String>) -> EvalError {
    EvalError::from_kind(EvalErrorKind::MissingKeywords { names })
}

#[cold]
pub fn unknown_keywords(names: Vec<String>) -> EvalError {
    EvalError::from_kind(EvalErrorKind::UnknownKeywords { names })
}

#[cold]
pub fn no_keywords_accepted() -> EvalError {
    EvalError::from_kind(EvalErrorKind::NoKeywordsAccepted)
}

// Control

#[cold]
pub fn invalid_control_transfer(signal: Signal, reason: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::InvalidControlTransfer {
        signal,
        reason: reason.to_string(),
    })
}

#[cold]
pub fn no_block_given() -> EvalError {
    invalid_control_transfer(Signal::Yield, "no block given (yield)")
}

// Calls and operators

#[cold]
pub fn undefined_method(method: &str, receiver: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::UndefinedMethod {
        method: method.to_string(),
        receiver: receiver.to_string(),
    })
}

#[cold]
pub fn not_callable(type_name: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::NotCallable {
        type_name: type_name.to_string(),
    })
}

#[cold]
pub fn operand_coercion(type_name: &str, target: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::OperandCoercion {
        type_name: type_name.to_string(),
        target: target.to_string(),
    })
}

#[cold]
pub fn integer_overflow(operation: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::IntegerOverflow {
        operation: operation.to_string(),
    })
}

#[cold]
pub fn recursion_limit_exceeded(limit: usize) -> EvalError {
    EvalError::from_kind(EvalErrorKind::StackOverflow { depth: limit })
}

#[cold]
pub fn raised(message: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::Raised {
        message: message.to_string(),
    })
}

#[cold]
pub fn invalid_program(message: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::InvalidProgram {
        message: message.to_string(),
    })
}
