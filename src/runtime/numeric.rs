//! Numeric conversions and arithmetic.
//!
//! Cast-style conversions (`int(x)`) are unchecked: integers wrap and
//! floating point truncates toward zero. `Convert.ToXxx` is checked: values
//! round half to even and anything out of range is a fault. Decimal
//! conversions are always checked. Integer arithmetic wraps; integer
//! division by zero faults.

use std::str::FromStr;

use chrono::{NaiveDateTime, TimeDelta};
use rust_decimal::{
    Decimal, RoundingStrategy,
    prelude::{FromPrimitive, ToPrimitive},
};

use super::{EvalResult, EvaluationFault};
use crate::{
    bound::{BinaryOperator, UnaryOperator},
    catalog::library::MAX_DATE_TICKS,
    types::NumericKind,
    value::{Value, checked_ticks, date_time_ticks},
};

/// A numeric value widened to a carrier wide enough for every kind.
#[derive(Debug, Clone, Copy)]
enum Num {
    Int(i128),
    Single(f32),
    Double(f64),
    Decimal(Decimal),
}

fn classify(value: &Value) -> Option<Num> {
    let num = match *value {
        Value::Char(c) => Num::Int(i128::from(u32::from(c))),
        Value::SByte(v) => Num::Int(v.into()),
        Value::Byte(v) => Num::Int(v.into()),
        Value::Int16(v) => Num::Int(v.into()),
        Value::UInt16(v) => Num::Int(v.into()),
        Value::Int32(v) => Num::Int(v.into()),
        Value::UInt32(v) => Num::Int(v.into()),
        Value::Int64(v) => Num::Int(v.into()),
        Value::UInt64(v) => Num::Int(v.into()),
        Value::Single(v) => Num::Single(v),
        Value::Double(v) => Num::Double(v),
        Value::Decimal(v) => Num::Decimal(v),
        _ => return None,
    };
    Some(num)
}

fn char_from(code: u32, shown: impl ToString) -> EvalResult {
    char::from_u32(code)
        .map(Value::Char)
        .ok_or_else(|| EvaluationFault::overflow(shown, "Char"))
}

/// Truncates an integer to `target`'s width, two's complement.
fn wrap_int(value: i128, target: NumericKind) -> EvalResult {
    let wrapped = match target {
        NumericKind::Char => return char_from(u32::from(value as u16), value),
        NumericKind::SByte => Value::SByte(value as i8),
        NumericKind::Byte => Value::Byte(value as u8),
        NumericKind::Int16 => Value::Int16(value as i16),
        NumericKind::UInt16 => Value::UInt16(value as u16),
        NumericKind::Int32 => Value::Int32(value as i32),
        NumericKind::UInt32 => Value::UInt32(value as u32),
        NumericKind::Int64 => Value::Int64(value as i64),
        NumericKind::UInt64 => Value::UInt64(value as u64),
        NumericKind::Single => Value::Single(value as f32),
        NumericKind::Double => Value::Double(value as f64),
        NumericKind::Decimal => Value::Decimal(
            Decimal::from_i128(value).ok_or_else(|| EvaluationFault::overflow(value, target))?,
        ),
    };
    Ok(wrapped)
}

/// Stores an integer in `target`, faulting when it does not fit.
fn checked_int(value: i128, target: NumericKind) -> EvalResult {
    let overflow = || EvaluationFault::overflow(value, target);
    let converted = match target {
        NumericKind::Char => {
            let code = u16::try_from(value).map_err(|_| overflow())?;
            return char_from(u32::from(code), value);
        }
        NumericKind::SByte => Value::SByte(i8::try_from(value).map_err(|_| overflow())?),
        NumericKind::Byte => Value::Byte(u8::try_from(value).map_err(|_| overflow())?),
        NumericKind::Int16 => Value::Int16(i16::try_from(value).map_err(|_| overflow())?),
        NumericKind::UInt16 => Value::UInt16(u16::try_from(value).map_err(|_| overflow())?),
        NumericKind::Int32 => Value::Int32(i32::try_from(value).map_err(|_| overflow())?),
        NumericKind::UInt32 => Value::UInt32(u32::try_from(value).map_err(|_| overflow())?),
        NumericKind::Int64 => Value::Int64(i64::try_from(value).map_err(|_| overflow())?),
        NumericKind::UInt64 => Value::UInt64(u64::try_from(value).map_err(|_| overflow())?),
        other => return wrap_int(value, other),
    };
    Ok(converted)
}

fn float_to_decimal(value: f64, single: bool) -> Result<Decimal, EvaluationFault> {
    let converted = if single {
        Decimal::from_f32(value as f32)
    } else {
        Decimal::from_f64(value)
    };
    converted.ok_or_else(|| EvaluationFault::overflow(value, NumericKind::Decimal))
}

fn from_float(value: f64, single: bool, target: NumericKind, checked: bool) -> EvalResult {
    match target {
        NumericKind::Single => Ok(Value::Single(value as f32)),
        NumericKind::Double => Ok(Value::Double(value)),
        NumericKind::Decimal => float_to_decimal(value, single).map(Value::Decimal),
        NumericKind::Char if checked => Err(EvaluationFault::InvalidCast {
            found: if single { "Single" } else { "Double" }.to_string(),
            target: "Char".to_string(),
        }),
        integral if checked => {
            let rounded = value.round_ties_even();
            if !rounded.is_finite() || rounded.abs() >= 1e38 {
                return Err(EvaluationFault::overflow(value, integral));
            }
            checked_int(rounded as i128, integral)
        }
        // `as` saturates and maps NaN to zero before the wrap
        integral => wrap_int(value.trunc() as i128, integral),
    }
}

fn from_decimal(value: Decimal, target: NumericKind, checked: bool) -> EvalResult {
    match target {
        NumericKind::Decimal => Ok(Value::Decimal(value)),
        NumericKind::Single => Ok(Value::Single(value.to_f32().unwrap_or(f32::NAN))),
        NumericKind::Double => Ok(Value::Double(value.to_f64().unwrap_or(f64::NAN))),
        NumericKind::Char if checked => Err(EvaluationFault::InvalidCast {
            found: "Decimal".to_string(),
            target: "Char".to_string(),
        }),
        integral => {
            let whole = if checked {
                value.round_dp_with_strategy(0, RoundingStrategy::MidpointNearestEven)
            } else {
                value.trunc()
            };
            let whole = whole
                .to_i128()
                .ok_or_else(|| EvaluationFault::overflow(value, integral))?;
            checked_int(whole, integral)
        }
    }
}

/// Unchecked conversion between numeric kinds, as in `int(x)`.
pub fn cast(value: &Value, target: NumericKind) -> EvalResult {
    match classify(value) {
        Some(Num::Int(v)) => wrap_int(v, target),
        Some(Num::Single(v)) => from_float(f64::from(v), true, target, false),
        Some(Num::Double(v)) => from_float(v, false, target, false),
        Some(Num::Decimal(v)) => from_decimal(v, target, false),
        None => Err(EvaluationFault::invalid_cast(value, target)),
    }
}

/// Checked conversion as performed by `Convert.ToXxx`. Also accepts
/// booleans, strings (parsed) and `null` (the target's zero).
pub fn convert(value: &Value, target: NumericKind) -> EvalResult {
    match value {
        Value::Null => Ok(target.ty().default_value()),
        Value::Boolean(b) if target != NumericKind::Char => wrap_int(i128::from(*b), target),
        Value::String(text) => parse(text, target),
        Value::Char(c) if target.is_integral() || target == NumericKind::Char => {
            checked_int(i128::from(u32::from(*c)), target)
        }
        Value::Char(_) => Err(EvaluationFault::invalid_cast(value, target)),
        other => match classify(other) {
            Some(Num::Int(v)) => checked_int(v, target),
            Some(Num::Single(v)) => from_float(f64::from(v), true, target, true),
            Some(Num::Double(v)) => from_float(v, false, target, true),
            Some(Num::Decimal(v)) => from_decimal(v, target, true),
            None => Err(EvaluationFault::invalid_cast(other, target)),
        },
    }
}

/// Parses invariant-culture text into `target`, as `Int32.Parse` does.
pub fn parse(text: &str, target: NumericKind) -> EvalResult {
    let trimmed = text.trim();
    let invalid = || EvaluationFault::InvalidFormat {
        input: text.to_string(),
        target: target.to_string(),
    };

    match target {
        NumericKind::Char => {
            let mut chars = trimmed.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Ok(Value::Char(c)),
                _ => Err(invalid()),
            }
        }
        NumericKind::Single => trimmed
            .parse::<f32>()
            .map(Value::Single)
            .map_err(|_| invalid()),
        NumericKind::Double => trimmed
            .parse::<f64>()
            .map(Value::Double)
            .map_err(|_| invalid()),
        NumericKind::Decimal => Decimal::from_str(trimmed)
            .or_else(|_| Decimal::from_scientific(trimmed))
            .map(Value::Decimal)
            .map_err(|_| invalid()),
        integral => {
            let parsed = trimmed.parse::<i128>().map_err(|_| invalid())?;
            checked_int(parsed, integral)
        }
    }
}

/// `Convert.ToBoolean`: non-zero numbers are true; text must read
/// `True` or `False`.
pub fn to_boolean(value: &Value) -> EvalResult {
    let truth = match value {
        Value::Null => false,
        Value::Boolean(b) => *b,
        Value::String(text) => {
            let trimmed = text.trim();
            if trimmed.eq_ignore_ascii_case("true") {
                true
            } else if trimmed.eq_ignore_ascii_case("false") {
                false
            } else {
                return Err(EvaluationFault::InvalidFormat {
                    input: text.clone(),
                    target: "Boolean".to_string(),
                });
            }
        }
        Value::Char(_) => return Err(EvaluationFault::invalid_cast(value, "Boolean")),
        other => match classify(other) {
            Some(Num::Int(v)) => v != 0,
            Some(Num::Single(v)) => v != 0.0,
            Some(Num::Double(v)) => v != 0.0,
            Some(Num::Decimal(v)) => !v.is_zero(),
            None => return Err(EvaluationFault::invalid_cast(other, "Boolean")),
        },
    };
    Ok(Value::Boolean(truth))
}

pub fn unary(op: UnaryOperator, operand: &Value) -> EvalResult {
    let result = match (op, operand) {
        (UnaryOperator::Not, Value::Boolean(b)) => Value::Boolean(!b),
        (UnaryOperator::Plus, value) => value.clone(),
        (UnaryOperator::Negate, Value::Int32(v)) => Value::Int32(v.wrapping_neg()),
        (UnaryOperator::Negate, Value::Int64(v)) => Value::Int64(v.wrapping_neg()),
        (UnaryOperator::Negate, Value::Single(v)) => Value::Single(-v),
        (UnaryOperator::Negate, Value::Double(v)) => Value::Double(-v),
        (UnaryOperator::Negate, Value::Decimal(v)) => Value::Decimal(-v),
        (UnaryOperator::Negate, Value::TimeSpan(v)) => Value::TimeSpan(
            TimeDelta::zero()
                .checked_sub(v)
                .and_then(within_span_range)
                .ok_or_else(|| EvaluationFault::overflow(operand, "TimeSpan"))?,
        ),
        (_, other) => return Err(EvaluationFault::unexpected(other, "unary operator")),
    };
    Ok(result)
}

macro_rules! integer_arithmetic {
    ($op:expr, $a:expr, $b:expr, $variant:ident, $target:literal) => {{
        let (a, b) = ($a, $b);
        let value = match $op {
            BinaryOperator::Add => a.wrapping_add(b),
            BinaryOperator::Subtract => a.wrapping_sub(b),
            BinaryOperator::Multiply => a.wrapping_mul(b),
            BinaryOperator::Divide | BinaryOperator::Modulo if b == 0 => {
                return Err(EvaluationFault::DivisionByZero);
            }
            BinaryOperator::Divide => a
                .checked_div(b)
                .ok_or_else(|| EvaluationFault::overflow(a, $target))?,
            BinaryOperator::Modulo => a
                .checked_rem(b)
                .ok_or_else(|| EvaluationFault::overflow(a, $target))?,
            _ => return Err(EvaluationFault::Internal(format!("{:?} is not arithmetic", $op))),
        };
        Ok(Value::$variant(value))
    }};
}

macro_rules! float_arithmetic {
    ($op:expr, $a:expr, $b:expr, $variant:ident) => {{
        let (a, b) = ($a, $b);
        let value = match $op {
            BinaryOperator::Add => a + b,
            BinaryOperator::Subtract => a - b,
            BinaryOperator::Multiply => a * b,
            BinaryOperator::Divide => a / b,
            BinaryOperator::Modulo => a % b,
            _ => return Err(EvaluationFault::Internal(format!("{:?} is not arithmetic", $op))),
        };
        Ok(Value::$variant(value))
    }};
}

fn decimal_arithmetic(op: BinaryOperator, a: Decimal, b: Decimal) -> EvalResult {
    let overflow = || EvaluationFault::overflow(format!("{a} {op:?} {b}"), "Decimal");
    let value = match op {
        BinaryOperator::Add => a.checked_add(b).ok_or_else(overflow)?,
        BinaryOperator::Subtract => a.checked_sub(b).ok_or_else(overflow)?,
        BinaryOperator::Multiply => a.checked_mul(b).ok_or_else(overflow)?,
        BinaryOperator::Divide | BinaryOperator::Modulo if b.is_zero() => {
            return Err(EvaluationFault::DivisionByZero);
        }
        BinaryOperator::Divide => a.checked_div(b).ok_or_else(overflow)?,
        BinaryOperator::Modulo => a.checked_rem(b).ok_or_else(overflow)?,
        _ => return Err(EvaluationFault::Internal(format!("{op:?} is not arithmetic"))),
    };
    Ok(Value::Decimal(value))
}

fn checked_date(value: NaiveDateTime) -> Result<NaiveDateTime, EvaluationFault> {
    if (0..=MAX_DATE_TICKS).contains(&date_time_ticks(value)) {
        Ok(value)
    } else {
        Err(EvaluationFault::overflow(value, "DateTime"))
    }
}

/// Moves a date by `span`, staying within years 1 through 9999.
pub fn shift_date(value: NaiveDateTime, span: TimeDelta) -> Result<NaiveDateTime, EvaluationFault> {
    value
        .checked_add_signed(span)
        .ok_or_else(|| EvaluationFault::overflow(value, "DateTime"))
        .and_then(checked_date)
}

/// A TimeSpan holds Int64 ticks; wider `TimeDelta`s are rejected.
fn within_span_range(span: TimeDelta) -> Option<TimeDelta> {
    checked_ticks(span).map(|_| span)
}

fn temporal_arithmetic(op: BinaryOperator, left: &Value, right: &Value) -> Option<EvalResult> {
    let negate = |span: TimeDelta| match op {
        BinaryOperator::Subtract => TimeDelta::zero().checked_sub(&span),
        _ => Some(span),
    };
    let span_overflow = || EvaluationFault::overflow(format!("{left} {op:?} {right}"), "TimeSpan");

    let result = match (left, right) {
        (Value::DateTime(date), Value::TimeSpan(span)) => negate(*span)
            .ok_or_else(span_overflow)
            .and_then(|span| shift_date(*date, span))
            .map(Value::DateTime),
        (Value::DateTimeOffset(date), Value::TimeSpan(span)) => negate(*span)
            .ok_or_else(span_overflow)
            .and_then(|span| {
                shift_date(date.naive_local(), span)?;
                date.checked_add_signed(span)
                    .ok_or_else(|| EvaluationFault::overflow(date, "DateTimeOffset"))
            })
            .map(Value::DateTimeOffset),
        (Value::DateTime(a), Value::DateTime(b)) => Ok(Value::TimeSpan(*a - *b)),
        (Value::DateTimeOffset(a), Value::DateTimeOffset(b)) => {
            Ok(Value::TimeSpan(a.naive_utc() - b.naive_utc()))
        }
        (Value::TimeSpan(a), Value::TimeSpan(b)) => negate(*b)
            .and_then(|b| a.checked_add(&b))
            .and_then(within_span_range)
            .map(Value::TimeSpan)
            .ok_or_else(span_overflow),
        _ => return None,
    };
    Some(result)
}

/// Arithmetic on two operands of the same promoted type.
pub fn arithmetic(op: BinaryOperator, left: &Value, right: &Value) -> EvalResult {
    match (left, right) {
        (Value::Int32(a), Value::Int32(b)) => integer_arithmetic!(op, *a, *b, Int32, "Int32"),
        (Value::UInt32(a), Value::UInt32(b)) => integer_arithmetic!(op, *a, *b, UInt32, "UInt32"),
        (Value::Int64(a), Value::Int64(b)) => integer_arithmetic!(op, *a, *b, Int64, "Int64"),
        (Value::UInt64(a), Value::UInt64(b)) => integer_arithmetic!(op, *a, *b, UInt64, "UInt64"),
        (Value::Single(a), Value::Single(b)) => float_arithmetic!(op, *a, *b, Single),
        (Value::Double(a), Value::Double(b)) => float_arithmetic!(op, *a, *b, Double),
        (Value::Decimal(a), Value::Decimal(b)) => decimal_arithmetic(op, *a, *b),
        _ => temporal_arithmetic(op, left, right).unwrap_or_else(|| {
            Err(EvaluationFault::Internal(format!(
                "{op:?} on {} and {}",
                left.kind_name(),
                right.kind_name()
            )))
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::span_from_ticks;

    #[test]
    fn test_cast_wraps_and_truncates() {
        assert_eq!(cast(&Value::Int32(300), NumericKind::Byte), Ok(Value::Byte(44)));
        assert_eq!(cast(&Value::Double(-2.7), NumericKind::Int32), Ok(Value::Int32(-2)));
        assert_eq!(cast(&Value::Int32(42), NumericKind::Single), Ok(Value::Single(42.0)));
    }

    #[test]
    fn test_convert_is_checked_and_rounds_to_even() {
        assert!(matches!(
            convert(&Value::Int32(300), NumericKind::Byte),
            Err(EvaluationFault::Overflow { .. })
        ));
        assert_eq!(convert(&Value::Double(2.5), NumericKind::Int32), Ok(Value::Int32(2)));
        assert_eq!(convert(&Value::Double(3.5), NumericKind::Int32), Ok(Value::Int32(4)));
        assert_eq!(convert(&Value::from(" 17 "), NumericKind::Int16), Ok(Value::Int16(17)));
        assert_eq!(convert(&Value::Null, NumericKind::Int64), Ok(Value::Int64(0)));
    }

    #[test]
    fn test_decimal_cast_checks_range() {
        let huge = Value::Decimal(Decimal::MAX);
        assert!(cast(&huge, NumericKind::Int32).is_err());
    }

    #[test]
    fn test_integer_division() {
        let div = |a, b| arithmetic(BinaryOperator::Divide, &Value::Int32(a), &Value::Int32(b));
        assert_eq!(div(7, 2), Ok(Value::Int32(3)));
        assert_eq!(div(1, 0), Err(EvaluationFault::DivisionByZero));
        assert!(matches!(div(i32::MIN, -1), Err(EvaluationFault::Overflow { .. })));
    }

    #[test]
    fn test_integer_addition_wraps() {
        let sum = arithmetic(BinaryOperator::Add, &Value::Int32(i32::MAX), &Value::Int32(1));
        assert_eq!(sum, Ok(Value::Int32(i32::MIN)));
    }

    #[test]
    fn test_time_span_stays_in_tick_range() {
        let max = Value::TimeSpan(span_from_ticks(i64::MAX));
        let min = Value::TimeSpan(span_from_ticks(i64::MIN));
        let one = Value::TimeSpan(span_from_ticks(1));

        assert!(matches!(
            arithmetic(BinaryOperator::Add, &max, &max),
            Err(EvaluationFault::Overflow { .. })
        ));
        assert!(matches!(
            arithmetic(BinaryOperator::Subtract, &min, &one),
            Err(EvaluationFault::Overflow { .. })
        ));
        assert!(matches!(
            unary(UnaryOperator::Negate, &min),
            Err(EvaluationFault::Overflow { .. })
        ));
        assert_eq!(
            arithmetic(BinaryOperator::Subtract, &max, &one),
            Ok(Value::TimeSpan(span_from_ticks(i64::MAX - 1)))
        );
        assert_eq!(
            unary(UnaryOperator::Negate, &max),
            Ok(Value::TimeSpan(span_from_ticks(-i64::MAX)))
        );
    }

    #[test]
    fn test_surrogate_char_is_rejected() {
        assert!(cast(&Value::Int32(0xD800), NumericKind::Char).is_err());
    }
}
