use std::sync::Arc;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::types::{EnumType, RecordType, Type};

/// A run-time value flowing through an expression stage.
///
/// Values are dynamically represented but always conform to the static
/// [`Type`] the binder assigned to the expression that produced them. A
/// `Nullable<T>` value is either [`Value::Null`] or a plain `T` value; there is
/// no separate wrapper at run time.
///
/// # Examples
///
/// ```
/// use quill_expr::Value;
///
/// let answer = Value::Int32(42);
/// let text = Value::from("forty-two");
/// let list = Value::Array(vec![Value::Int32(1), Value::Int32(2)]);
///
/// assert_eq!(answer.to_string(), "42");
/// assert_eq!(text.to_string(), "forty-two");
/// assert_eq!(list.to_string(), "[1, 2]");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Boolean(bool),
    Char(char),
    SByte(i8),
    Byte(u8),
    Int16(i16),
    UInt16(u16),
    Int32(i32),
    UInt32(u32),
    Int64(i64),
    UInt64(u64),
    Single(f32),
    Double(f64),
    Decimal(Decimal),
    String(String),
    DateTime(NaiveDateTime),
    DateTimeOffset(DateTime<FixedOffset>),
    TimeSpan(TimeDelta),
    Guid(Uuid),
    Enum(EnumValue),
    Array(Vec<Value>),
    Record(Record),
}

/// A member of a closed enumeration, stored by its underlying value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnumValue {
    pub ty: &'static EnumType,
    pub value: i32,
}

impl EnumValue {
    pub fn new(ty: &'static EnumType, value: i32) -> Self {
        EnumValue { ty, value }
    }

    pub fn name(&self) -> Option<&'static str> {
        self.ty.member_name(self.value)
    }
}

/// An instance of an anonymous record type; `values` follow the field order
/// of `ty`.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub ty: Arc<RecordType>,
    pub values: Vec<Value>,
}

impl Record {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.ty.field_index(name).and_then(|i| self.values.get(i))
    }
}

/// Ticks are 100-nanosecond intervals.
pub const TICKS_PER_SECOND: i64 = 10_000_000;
const NANOS_PER_TICK: i64 = 100;

/// Ticks in `span`, or `None` outside the Int64 tick range of a TimeSpan.
pub fn checked_ticks(span: TimeDelta) -> Option<i64> {
    let ticks = i128::from(span.num_seconds()) * i128::from(TICKS_PER_SECOND)
        + i128::from(span.subsec_nanos()) / i128::from(NANOS_PER_TICK);
    i64::try_from(ticks).ok()
}

/// Ticks in `span`, saturating at the Int64 bounds.
pub fn ticks_of(span: TimeDelta) -> i64 {
    checked_ticks(span).unwrap_or(if span < TimeDelta::zero() { i64::MIN } else { i64::MAX })
}

pub fn span_from_ticks(ticks: i64) -> TimeDelta {
    TimeDelta::seconds(ticks / TICKS_PER_SECOND)
        + TimeDelta::nanoseconds((ticks % TICKS_PER_SECOND) * NANOS_PER_TICK)
}

const DAYS_BEFORE_UNIX_EPOCH: i64 = 719_162;

/// Midnight, January 1 of year 1; tick zero of the calendar.
pub fn calendar_epoch() -> NaiveDateTime {
    NaiveDate::default().and_time(NaiveTime::MIN) - TimeDelta::days(DAYS_BEFORE_UNIX_EPOCH)
}

pub fn date_time_ticks(value: NaiveDateTime) -> i64 {
    ticks_of(value - calendar_epoch())
}

impl Value {
    /// Name of the run-time representation, used in fault messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Boolean(_) => "Boolean",
            Value::Char(_) => "Char",
            Value::SByte(_) => "SByte",
            Value::Byte(_) => "Byte",
            Value::Int16(_) => "Int16",
            Value::UInt16(_) => "UInt16",
            Value::Int32(_) => "Int32",
            Value::UInt32(_) => "UInt32",
            Value::Int64(_) => "Int64",
            Value::UInt64(_) => "UInt64",
            Value::Single(_) => "Single",
            Value::Double(_) => "Double",
            Value::Decimal(_) => "Decimal",
            Value::String(_) => "String",
            Value::DateTime(_) => "DateTime",
            Value::DateTimeOffset(_) => "DateTimeOffset",
            Value::TimeSpan(_) => "TimeSpan",
            Value::Guid(_) => "Guid",
            Value::Enum(e) => e.ty.name,
            Value::Array(_) => "Array",
            Value::Record(_) => "Record",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Whether this value may flow where `ty` is expected.
    pub fn conforms_to(&self, ty: &Type) -> bool {
        match (ty, self) {
            (Type::Object, _) => true,
            (_, Value::Null) => ty.accepts_null(),
            (Type::Nullable(inner), value) => value.conforms_to(inner),
            (Type::Boolean, Value::Boolean(_))
            | (Type::Char, Value::Char(_))
            | (Type::SByte, Value::SByte(_))
            | (Type::Byte, Value::Byte(_))
            | (Type::Int16, Value::Int16(_))
            | (Type::UInt16, Value::UInt16(_))
            | (Type::Int32, Value::Int32(_))
            | (Type::UInt32, Value::UInt32(_))
            | (Type::Int64, Value::Int64(_))
            | (Type::UInt64, Value::UInt64(_))
            | (Type::Single, Value::Single(_))
            | (Type::Double, Value::Double(_))
            | (Type::Decimal, Value::Decimal(_))
            | (Type::String, Value::String(_))
            | (Type::DateTime, Value::DateTime(_))
            | (Type::DateTimeOffset, Value::DateTimeOffset(_))
            | (Type::TimeSpan, Value::TimeSpan(_))
            | (Type::Guid, Value::Guid(_)) => true,
            (Type::Enum(expected), Value::Enum(e)) => *expected == e.ty,
            (Type::Array(element) | Type::Sequence(element), Value::Array(items)) => {
                items.iter().all(|item| item.conforms_to(element))
            }
            (Type::Record(expected), Value::Record(record)) => **expected == *record.ty,
            _ => false,
        }
    }
}

impl Type {
    /// The value of an uninitialized slot of this type: zero for numbers,
    /// `null` for reference and nullable types.
    pub fn default_value(&self) -> Value {
        match self {
            Type::Boolean => Value::Boolean(false),
            Type::Char => Value::Char('\0'),
            Type::SByte => Value::SByte(0),
            Type::Byte => Value::Byte(0),
            Type::Int16 => Value::Int16(0),
            Type::UInt16 => Value::UInt16(0),
            Type::Int32 => Value::Int32(0),
            Type::UInt32 => Value::UInt32(0),
            Type::Int64 => Value::Int64(0),
            Type::UInt64 => Value::UInt64(0),
            Type::Single => Value::Single(0.0),
            Type::Double => Value::Double(0.0),
            Type::Decimal => Value::Decimal(Decimal::ZERO),
            Type::DateTime => Value::DateTime(calendar_epoch()),
            Type::TimeSpan => Value::TimeSpan(TimeDelta::zero()),
            Type::DateTimeOffset => Value::DateTimeOffset(
                calendar_epoch().and_utc().fixed_offset(),
            ),
            Type::Guid => Value::Guid(Uuid::nil()),
            Type::Enum(e) => Value::Enum(EnumValue::new(e, 0)),
            Type::Null
            | Type::Object
            | Type::String
            | Type::Nullable(_)
            | Type::Array(_)
            | Type::Sequence(_)
            | Type::Record(_) => Value::Null,
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int32(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int64(value)
    }
}

impl From<f32> for Value {
    fn from(value: f32) -> Self {
        Value::Single(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Double(value)
    }
}

impl From<Decimal> for Value {
    fn from(value: Decimal) -> Self {
        Value::Decimal(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(values: Vec<T>) -> Self {
        Value::Array(values.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DAY_OF_WEEK;

    #[test]
    fn test_ticks_round_trip() {
        for ticks in [0, 1, 9_999_999, 10_000_000, -1, -10_000_001, i64::MAX / 2] {
            assert_eq!(ticks_of(span_from_ticks(ticks)), ticks);
        }
    }

    #[test]
    fn test_ticks_outside_time_span_range() {
        let max = span_from_ticks(i64::MAX);
        let min = span_from_ticks(i64::MIN);
        assert_eq!(checked_ticks(max), Some(i64::MAX));
        assert_eq!(checked_ticks(min), Some(i64::MIN));
        assert_eq!(checked_ticks(max + max), None);
        assert_eq!(checked_ticks(TimeDelta::zero() - min), None);
        assert_eq!(ticks_of(max + max), i64::MAX);
        assert_eq!(ticks_of(min + min), i64::MIN);
    }

    #[test]
    fn test_nullable_conformance() {
        let ty = Type::nullable_of(Type::Int32);
        assert!(Value::Null.conforms_to(&ty));
        assert!(Value::Int32(1).conforms_to(&ty));
        assert!(!Value::Int64(1).conforms_to(&ty));
        assert!(!Value::Null.conforms_to(&Type::Int32));
    }

    #[test]
    fn test_enum_conformance() {
        let monday = Value::Enum(EnumValue::new(&DAY_OF_WEEK, 1));
        assert!(monday.conforms_to(&Type::Enum(&DAY_OF_WEEK)));
        assert!(monday.conforms_to(&Type::Object));
        assert!(!monday.conforms_to(&Type::Int32));
    }
}
