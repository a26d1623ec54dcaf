//! Evaluation support for compiled expressions: the parameter environment,
//! run-time faults and the semantics of operators and library calls.

pub mod builtins;
pub mod numeric;
pub mod sequences;

use std::cmp::Ordering;

use thiserror::Error;

use crate::value::Value;

/// A failure while evaluating one element. The stage that raised it stays
/// usable; the next element evaluates normally.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvaluationFault {
    #[error("value {value} does not fit in {target}")]
    Overflow { value: String, target: String },

    #[error("division by zero")]
    DivisionByZero,

    #[error("'{member}' was accessed on a null reference")]
    NullReference { member: String },

    #[error("nullable value has no value")]
    NullValue,

    #[error("index {index} is out of range for length {length}")]
    IndexOutOfRange { index: i64, length: usize },

    #[error("{method} found no matching element")]
    EmptySequence { method: String },

    #[error("'{input}' is not a valid {target}")]
    InvalidFormat { input: String, target: String },

    #[error("cannot convert {found} to {target}")]
    InvalidCast { found: String, target: String },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("invalid regular expression: {0}")]
    InvalidPattern(String),

    #[error("input does not conform to {expected}: found {found}")]
    InputType { expected: String, found: String },

    #[error("internal evaluation error: {0}")]
    Internal(String),
}

impl EvaluationFault {
    pub(crate) fn overflow(value: impl ToString, target: impl ToString) -> Self {
        EvaluationFault::Overflow {
            value: value.to_string(),
            target: target.to_string(),
        }
    }

    pub(crate) fn invalid_cast(found: &Value, target: impl ToString) -> Self {
        EvaluationFault::InvalidCast {
            found: found.kind_name().to_string(),
            target: target.to_string(),
        }
    }

    pub(crate) fn unexpected(value: &Value, context: &str) -> Self {
        EvaluationFault::Internal(format!("unexpected {} in {}", value.kind_name(), context))
    }
}

pub type EvalResult = Result<Value, EvaluationFault>;

/// The chain of parameter bindings visible to an expression: the stage
/// input at the root and one link per enclosing query lambda.
///
/// Links live on the stack of the evaluating thread, so evaluation shares
/// nothing between calls.
#[derive(Debug, Clone, Copy)]
pub struct Env<'a> {
    value: &'a Value,
    parent: Option<&'a Env<'a>>,
}

impl<'a> Env<'a> {
    pub fn root(value: &'a Value) -> Self {
        Env {
            value,
            parent: None,
        }
    }

    pub fn push(&'a self, value: &'a Value) -> Env<'a> {
        Env {
            value,
            parent: Some(self),
        }
    }

    /// The binding `depth` links out; 0 is the innermost.
    pub fn lookup(&self, depth: usize) -> Option<&'a Value> {
        let mut env = self;
        for _ in 0..depth {
            env = env.parent?;
        }
        Some(env.value)
    }
}

/// Orders two values of the same ordered type. `null` sorts before every
/// other value; NaN is unordered.
pub fn compare(left: &Value, right: &Value) -> Option<Ordering> {
    use Value::*;

    match (left, right) {
        (Null, Null) => Some(Ordering::Equal),
        (Null, _) => Some(Ordering::Less),
        (_, Null) => Some(Ordering::Greater),
        (Boolean(a), Boolean(b)) => a.partial_cmp(b),
        (Char(a), Char(b)) => a.partial_cmp(b),
        (SByte(a), SByte(b)) => a.partial_cmp(b),
        (Byte(a), Byte(b)) => a.partial_cmp(b),
        (Int16(a), Int16(b)) => a.partial_cmp(b),
        (UInt16(a), UInt16(b)) => a.partial_cmp(b),
        (Int32(a), Int32(b)) => a.partial_cmp(b),
        (UInt32(a), UInt32(b)) => a.partial_cmp(b),
        (Int64(a), Int64(b)) => a.partial_cmp(b),
        (UInt64(a), UInt64(b)) => a.partial_cmp(b),
        (Single(a), Single(b)) => a.partial_cmp(b),
        (Double(a), Double(b)) => a.partial_cmp(b),
        (Decimal(a), Decimal(b)) => a.partial_cmp(b),
        (String(a), String(b)) => a.partial_cmp(b),
        (DateTime(a), DateTime(b)) => a.partial_cmp(b),
        (DateTimeOffset(a), DateTimeOffset(b)) => a.partial_cmp(b),
        (TimeSpan(a), TimeSpan(b)) => a.partial_cmp(b),
        (Guid(a), Guid(b)) => a.partial_cmp(b),
        (Enum(a), Enum(b)) => a.value.partial_cmp(&b.value),
        _ => None,
    }
}

fn nan_first(left_nan: bool, right_nan: bool) -> Option<Ordering> {
    match (left_nan, right_nan) {
        (true, true) => Some(Ordering::Equal),
        (true, false) => Some(Ordering::Less),
        (false, true) => Some(Ordering::Greater),
        (false, false) => None,
    }
}

/// Total order for sorting and `Min`/`Max`: `null` first, then NaN before
/// every number. Values of different kinds order by kind name.
pub fn sort_order(left: &Value, right: &Value) -> Ordering {
    let nan = match (left, right) {
        (Value::Single(a), Value::Single(b)) => nan_first(a.is_nan(), b.is_nan()),
        (Value::Double(a), Value::Double(b)) => nan_first(a.is_nan(), b.is_nan()),
        _ => None,
    };
    if let Some(ordering) = nan {
        return ordering;
    }
    match compare(left, right) {
        Some(ordering) => ordering,
        None if left.kind_name() == right.kind_name() => Ordering::Equal,
        None => left.kind_name().cmp(right.kind_name()),
    }
}
