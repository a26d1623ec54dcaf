//! Run-time implementations of library members.
//!
//! Arguments arrive already coerced to the parameter types of the overload
//! the binder picked; instance members receive the receiver first.

use chrono::{Datelike, NaiveDateTime, NaiveTime, TimeDelta, Timelike};
use regex::Regex;
use rust_decimal::{Decimal, RoundingStrategy};
use uuid::Uuid;

use super::{EvalResult, EvaluationFault, compare, numeric};
use crate::{
    catalog::{
        Builtin, CharClass, ConvertTarget, DatePart, MathFn, SpanPart, TimeUnit,
        library::{TICKS_PER_DAY, TICKS_PER_HOUR, TICKS_PER_MILLISECOND, TICKS_PER_MINUTE},
    },
    types::DAY_OF_WEEK,
    value::{
        EnumValue, TICKS_PER_SECOND, Value, date_time_ticks, span_from_ticks, ticks_of,
    },
};

/// Name reported when an instance member is reached through `null`.
fn member_name(builtin: Builtin) -> String {
    match builtin {
        Builtin::StringLength | Builtin::ArrayLength => "Length".to_string(),
        Builtin::DatePart(part) => format!("{part:?}"),
        Builtin::SpanPart(part) => format!("{part:?}"),
        Builtin::SpanTotal(unit) => format!("Total{unit:?}"),
        Builtin::AddTime(unit) => format!("Add{unit:?}"),
        other => format!("{other:?}"),
    }
}

/// Whether the first argument is a receiver that must not be `null`.
fn has_receiver(builtin: Builtin) -> bool {
    matches!(
        builtin,
        Builtin::StringLength
            | Builtin::ToUpper
            | Builtin::ToLower
            | Builtin::Trim
            | Builtin::Contains
            | Builtin::StartsWith
            | Builtin::EndsWith
            | Builtin::Substring
            | Builtin::IndexOf
            | Builtin::Replace
            | Builtin::ArrayLength
            | Builtin::DatePart(_)
            | Builtin::DayOfWeek
            | Builtin::Date
            | Builtin::TimeOfDay
            | Builtin::AddTime(_)
            | Builtin::AddTicks
            | Builtin::Offset
            | Builtin::LocalDateTime
            | Builtin::UtcDateTime
            | Builtin::UtcTicks
            | Builtin::SpanPart(_)
            | Builtin::SpanTotal(_)
            | Builtin::ToByteArray
    )
}

fn arg(args: &[Value], index: usize) -> Result<&Value, EvaluationFault> {
    args.get(index)
        .ok_or_else(|| EvaluationFault::Internal(format!("missing argument {index}")))
}

fn text(args: &[Value], index: usize) -> Result<&str, EvaluationFault> {
    match arg(args, index)? {
        Value::String(s) => Ok(s),
        Value::Null => Err(EvaluationFault::InvalidArgument(format!(
            "argument {} must not be null",
            index + 1
        ))),
        other => Err(EvaluationFault::unexpected(other, "string argument")),
    }
}

fn int(args: &[Value], index: usize) -> Result<i32, EvaluationFault> {
    match arg(args, index)? {
        Value::Int32(v) => Ok(*v),
        other => Err(EvaluationFault::unexpected(other, "Int32 argument")),
    }
}

fn long(args: &[Value], index: usize) -> Result<i64, EvaluationFault> {
    match arg(args, index)? {
        Value::Int64(v) => Ok(*v),
        other => Err(EvaluationFault::unexpected(other, "Int64 argument")),
    }
}

fn double(args: &[Value], index: usize) -> Result<f64, EvaluationFault> {
    match arg(args, index)? {
        Value::Double(v) => Ok(*v),
        other => Err(EvaluationFault::unexpected(other, "Double argument")),
    }
}

fn span(args: &[Value], index: usize) -> Result<TimeDelta, EvaluationFault> {
    match arg(args, index)? {
        Value::TimeSpan(v) => Ok(*v),
        other => Err(EvaluationFault::unexpected(other, "TimeSpan argument")),
    }
}

/// The clock reading of a DateTime or DateTimeOffset.
fn clock(value: &Value) -> Result<NaiveDateTime, EvaluationFault> {
    match value {
        Value::DateTime(v) => Ok(*v),
        Value::DateTimeOffset(v) => Ok(v.naive_local()),
        other => Err(EvaluationFault::unexpected(other, "date argument")),
    }
}

/// Ticks for `amount` units, faulting outside the Int64 tick range.
fn unit_ticks(amount: f64, unit: TimeUnit) -> Result<i64, EvaluationFault> {
    if amount.is_nan() {
        return Err(EvaluationFault::InvalidArgument(
            "a time interval cannot be NaN".to_string(),
        ));
    }
    let ticks = amount * unit.ticks();
    if ticks >= i64::MAX as f64 || ticks < i64::MIN as f64 {
        return Err(EvaluationFault::overflow(amount, "TimeSpan"));
    }
    Ok(ticks as i64)
}

fn add_to_date(receiver: &Value, delta: TimeDelta) -> EvalResult {
    match receiver {
        Value::DateTime(date) => numeric::shift_date(*date, delta).map(Value::DateTime),
        Value::DateTimeOffset(date) => {
            numeric::shift_date(date.naive_local(), delta)?;
            date.checked_add_signed(delta)
                .map(Value::DateTimeOffset)
                .ok_or_else(|| EvaluationFault::overflow(date, "DateTimeOffset"))
        }
        other => Err(EvaluationFault::unexpected(other, "date arithmetic")),
    }
}

fn valid_year(year: i32) -> Result<i32, EvaluationFault> {
    if (1..=9999).contains(&year) {
        Ok(year)
    } else {
        Err(EvaluationFault::InvalidArgument(format!(
            "year {year} is outside 1 through 9999"
        )))
    }
}

fn is_leap(year: i32) -> bool {
    year % 4 == 0 && (year % 100 != 0 || year % 400 == 0)
}

fn days_in_month(year: i32, month: i32) -> EvalResult {
    let year = valid_year(year)?;
    let days = match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 if is_leap(year) => 29,
        2 => 28,
        _ => {
            return Err(EvaluationFault::InvalidArgument(format!(
                "month {month} is outside 1 through 12"
            )));
        }
    };
    Ok(Value::Int32(days))
}

fn date_part(part: DatePart, receiver: &Value) -> EvalResult {
    let clock = clock(receiver)?;
    let value = match part {
        DatePart::Year => clock.year(),
        DatePart::Month => clock.month() as i32,
        DatePart::Day => clock.day() as i32,
        DatePart::Hour => clock.hour() as i32,
        DatePart::Minute => clock.minute() as i32,
        DatePart::Second => clock.second() as i32,
        DatePart::Millisecond => (clock.nanosecond() / 1_000_000) as i32,
        DatePart::DayOfYear => clock.ordinal() as i32,
        DatePart::Ticks => return Ok(Value::Int64(date_time_ticks(clock))),
    };
    Ok(Value::Int32(value))
}

fn span_part(part: SpanPart, span: TimeDelta) -> Value {
    let ticks = ticks_of(span);
    let component = match part {
        SpanPart::Days => ticks / TICKS_PER_DAY,
        SpanPart::Hours => ticks / TICKS_PER_HOUR % 24,
        SpanPart::Minutes => ticks / TICKS_PER_MINUTE % 60,
        SpanPart::Seconds => ticks / TICKS_PER_SECOND % 60,
        SpanPart::Milliseconds => ticks / TICKS_PER_MILLISECOND % 1000,
        SpanPart::Ticks => return Value::Int64(ticks),
    };
    Value::Int32(component as i32)
}

fn substring(receiver: &str, start: i32, length: Option<i32>) -> EvalResult {
    let chars: Vec<char> = receiver.chars().collect();
    let out_of_range = |index: i32| EvaluationFault::IndexOutOfRange {
        index: i64::from(index),
        length: chars.len(),
    };
    let start_index = usize::try_from(start)
        .ok()
        .filter(|start| *start <= chars.len())
        .ok_or_else(|| out_of_range(start))?;
    let end = match length {
        None => chars.len(),
        Some(length) => usize::try_from(length)
            .ok()
            .map(|length| start_index + length)
            .filter(|end| *end <= chars.len())
            .ok_or_else(|| out_of_range(start.saturating_add(length)))?,
    };
    Ok(Value::String(chars[start_index..end].iter().collect()))
}

fn index_of(receiver: &str, needle: &Value) -> EvalResult {
    let found = match needle {
        Value::String(s) => receiver.find(s.as_str()),
        Value::Char(c) => receiver.find(*c),
        Value::Null => {
            return Err(EvaluationFault::InvalidArgument(
                "argument 1 must not be null".to_string(),
            ));
        }
        other => return Err(EvaluationFault::unexpected(other, "IndexOf")),
    };
    let index = found.map_or(-1, |byte| receiver[..byte].chars().count() as i32);
    Ok(Value::Int32(index))
}

fn replace(receiver: &str, from: &Value, to: &Value) -> EvalResult {
    let replaced = match (from, to) {
        (Value::Char(from), Value::Char(to)) => receiver.replace(*from, &to.to_string()),
        (Value::String(from), _) if from.is_empty() => {
            return Err(EvaluationFault::InvalidArgument(
                "the string to replace cannot be empty".to_string(),
            ));
        }
        (Value::String(from), Value::String(to)) => receiver.replace(from.as_str(), to),
        (Value::String(from), Value::Null) => receiver.replace(from.as_str(), ""),
        (Value::Null, _) => {
            return Err(EvaluationFault::InvalidArgument(
                "argument 1 must not be null".to_string(),
            ));
        }
        (other, _) => return Err(EvaluationFault::unexpected(other, "Replace")),
    };
    Ok(Value::String(replaced))
}

fn abs(value: &Value) -> EvalResult {
    let overflow = || EvaluationFault::overflow(value, value.kind_name());
    let result = match value {
        Value::SByte(v) => Value::SByte(v.checked_abs().ok_or_else(overflow)?),
        Value::Int16(v) => Value::Int16(v.checked_abs().ok_or_else(overflow)?),
        Value::Int32(v) => Value::Int32(v.checked_abs().ok_or_else(overflow)?),
        Value::Int64(v) => Value::Int64(v.checked_abs().ok_or_else(overflow)?),
        Value::Single(v) => Value::Single(v.abs()),
        Value::Double(v) => Value::Double(v.abs()),
        Value::Decimal(v) => Value::Decimal(v.abs()),
        other => return Err(EvaluationFault::unexpected(other, "Math.Abs")),
    };
    Ok(result)
}

fn sign(value: &Value) -> EvalResult {
    let float_sign = |v: f64| {
        if v.is_nan() {
            Err(EvaluationFault::InvalidArgument(
                "the sign of NaN is undefined".to_string(),
            ))
        } else if v > 0.0 {
            Ok(1)
        } else if v < 0.0 {
            Ok(-1)
        } else {
            Ok(0)
        }
    };
    let sign = match value {
        Value::SByte(v) => i32::from(v.signum()),
        Value::Int16(v) => i32::from(v.signum()),
        Value::Int32(v) => v.signum(),
        Value::Int64(v) => v.signum() as i32,
        Value::Single(v) => float_sign(f64::from(*v))?,
        Value::Double(v) => float_sign(*v)?,
        Value::Decimal(v) if v.is_zero() => 0,
        Value::Decimal(v) if v.is_sign_negative() => -1,
        Value::Decimal(_) => 1,
        other => return Err(EvaluationFault::unexpected(other, "Math.Sign")),
    };
    Ok(Value::Int32(sign))
}

fn round(value: &Value, digits: Option<i32>) -> EvalResult {
    let limit = match value {
        Value::Decimal(_) => 28,
        _ => 15,
    };
    let digits = digits.unwrap_or(0);
    if !(0..=limit).contains(&digits) {
        return Err(EvaluationFault::InvalidArgument(format!(
            "rounding digits must be between 0 and {limit}"
        )));
    }

    match value {
        Value::Double(v) => {
            let scale = 10f64.powi(digits);
            let scaled = v * scale;
            if digits == 0 {
                Ok(Value::Double(v.round_ties_even()))
            } else if scaled.is_finite() {
                Ok(Value::Double(scaled.round_ties_even() / scale))
            } else {
                Ok(Value::Double(*v))
            }
        }
        Value::Decimal(v) => Ok(Value::Decimal(v.round_dp_with_strategy(
            digits as u32,
            RoundingStrategy::MidpointNearestEven,
        ))),
        other => Err(EvaluationFault::unexpected(other, "Math.Round")),
    }
}

fn real(value: &Value, on_double: fn(f64) -> f64, on_decimal: fn(&Decimal) -> Decimal) -> EvalResult {
    match value {
        Value::Double(v) => Ok(Value::Double(on_double(*v))),
        Value::Decimal(v) => Ok(Value::Decimal(on_decimal(v))),
        other => Err(EvaluationFault::unexpected(other, "Math")),
    }
}

fn is_nan(value: &Value) -> bool {
    match value {
        Value::Single(v) => v.is_nan(),
        Value::Double(v) => v.is_nan(),
        _ => false,
    }
}

/// `Math.Max` / `Math.Min`; NaN wins, as in IEEE `maximum`.
fn extremum(left: &Value, right: &Value, max: bool) -> EvalResult {
    if is_nan(left) {
        return Ok(left.clone());
    }
    if is_nan(right) {
        return Ok(right.clone());
    }
    let ordering = compare(left, right)
        .ok_or_else(|| EvaluationFault::Internal("unordered Math.Max operands".to_string()))?;
    let pick_left = if max { ordering.is_ge() } else { ordering.is_le() };
    Ok(if pick_left { left } else { right }.clone())
}

fn math(function: MathFn, value: f64) -> f64 {
    match function {
        MathFn::Sqrt => value.sqrt(),
        MathFn::Exp => value.exp(),
        MathFn::Log => value.ln(),
        MathFn::Log10 => value.log10(),
        MathFn::Sin => value.sin(),
        MathFn::Cos => value.cos(),
        MathFn::Tan => value.tan(),
    }
}

fn char_test(class: CharClass, c: char) -> bool {
    match class {
        CharClass::Digit => c.is_numeric() && !c.is_alphabetic(),
        CharClass::Letter => c.is_alphabetic(),
        CharClass::WhiteSpace => c.is_whitespace(),
        CharClass::Upper => c.is_uppercase(),
        CharClass::Lower => c.is_lowercase(),
    }
}

fn regex_for<'r>(
    precompiled: Option<&'r Regex>,
    pattern: &str,
    owned: &'r mut Option<Regex>,
) -> Result<&'r Regex, EvaluationFault> {
    if let Some(regex) = precompiled {
        return Ok(regex);
    }
    let compiled =
        Regex::new(pattern).map_err(|err| EvaluationFault::InvalidPattern(err.to_string()))?;
    Ok(owned.insert(compiled))
}

/// Evaluates `builtin` over already-evaluated arguments. `pattern` is the
/// precompiled regular expression when the pattern argument was a literal.
pub fn invoke(builtin: Builtin, args: &[Value], pattern: Option<&Regex>) -> EvalResult {
    if has_receiver(builtin) && arg(args, 0)?.is_null() {
        return Err(EvaluationFault::NullReference {
            member: member_name(builtin),
        });
    }

    let result = match builtin {
        Builtin::ToString => Value::String(arg(args, 0)?.to_string()),

        Builtin::HasValue => Value::Boolean(!arg(args, 0)?.is_null()),
        Builtin::NullableValue => match arg(args, 0)? {
            Value::Null => return Err(EvaluationFault::NullValue),
            value => value.clone(),
        },
        Builtin::GetValueOrDefault => match arg(args, 0)? {
            Value::Null => arg(args, 1)?.clone(),
            value => value.clone(),
        },

        Builtin::ParseBoolean => {
            let input = text(args, 0)?;
            numeric::to_boolean(&Value::from(input))?
        }
        Builtin::ParseNumber(kind) => numeric::parse(text(args, 0)?, kind)?,
        Builtin::ParseGuid => {
            let input = text(args, 0)?;
            Uuid::parse_str(input.trim())
                .map(Value::Guid)
                .map_err(|_| EvaluationFault::InvalidFormat {
                    input: input.to_string(),
                    target: "Guid".to_string(),
                })?
        }

        Builtin::CharTest(class) => match arg(args, 0)? {
            Value::Char(c) => Value::Boolean(char_test(class, *c)),
            other => return Err(EvaluationFault::unexpected(other, "Char test")),
        },

        Builtin::IsNullOrEmpty => Value::Boolean(match arg(args, 0)? {
            Value::String(s) => s.is_empty(),
            _ => true,
        }),
        Builtin::IsNullOrWhiteSpace => Value::Boolean(match arg(args, 0)? {
            Value::String(s) => s.trim().is_empty(),
            _ => true,
        }),
        Builtin::Concat => Value::String(args.iter().map(Value::to_string).collect()),
        Builtin::StringLength => Value::Int32(text(args, 0)?.chars().count() as i32),
        Builtin::ToUpper => Value::String(text(args, 0)?.to_uppercase()),
        Builtin::ToLower => Value::String(text(args, 0)?.to_lowercase()),
        Builtin::Trim => Value::String(text(args, 0)?.trim().to_string()),
        Builtin::Contains => {
            let receiver = text(args, 0)?;
            Value::Boolean(match arg(args, 1)? {
                Value::Char(c) => receiver.contains(*c),
                _ => receiver.contains(text(args, 1)?),
            })
        }
        Builtin::StartsWith => Value::Boolean(text(args, 0)?.starts_with(text(args, 1)?)),
        Builtin::EndsWith => Value::Boolean(text(args, 0)?.ends_with(text(args, 1)?)),
        Builtin::Substring => {
            let length = if args.len() > 2 { Some(int(args, 2)?) } else { None };
            substring(text(args, 0)?, int(args, 1)?, length)?
        }
        Builtin::IndexOf => index_of(text(args, 0)?, arg(args, 1)?)?,
        Builtin::Replace => replace(text(args, 0)?, arg(args, 1)?, arg(args, 2)?)?,

        Builtin::ArrayLength => match arg(args, 0)? {
            Value::Array(items) => Value::Int32(items.len() as i32),
            other => return Err(EvaluationFault::unexpected(other, "Length")),
        },

        Builtin::DaysInMonth => days_in_month(int(args, 0)?, int(args, 1)?)?,
        Builtin::IsLeapYear => Value::Boolean(is_leap(valid_year(int(args, 0)?)?)),
        Builtin::DatePart(part) => date_part(part, arg(args, 0)?)?,
        Builtin::DayOfWeek => {
            let day = clock(arg(args, 0)?)?.weekday().num_days_from_sunday();
            Value::Enum(EnumValue::new(&DAY_OF_WEEK, day as i32))
        }
        Builtin::Date => Value::DateTime(clock(arg(args, 0)?)?.date().and_time(NaiveTime::MIN)),
        Builtin::TimeOfDay => {
            Value::TimeSpan(clock(arg(args, 0)?)?.time() - NaiveTime::MIN)
        }
        Builtin::AddTime(unit) => {
            let ticks = unit_ticks(double(args, 1)?, unit)?;
            add_to_date(arg(args, 0)?, span_from_ticks(ticks))?
        }
        Builtin::AddTicks => add_to_date(arg(args, 0)?, span_from_ticks(long(args, 1)?))?,
        Builtin::Offset | Builtin::LocalDateTime | Builtin::UtcDateTime | Builtin::UtcTicks => {
            let Value::DateTimeOffset(date) = arg(args, 0)? else {
                return Err(EvaluationFault::unexpected(arg(args, 0)?, "DateTimeOffset member"));
            };
            match builtin {
                Builtin::Offset => Value::TimeSpan(TimeDelta::seconds(i64::from(
                    date.offset().local_minus_utc(),
                ))),
                Builtin::LocalDateTime => Value::DateTime(date.naive_local()),
                Builtin::UtcDateTime => Value::DateTime(date.naive_utc()),
                _ => Value::Int64(date_time_ticks(date.naive_utc())),
            }
        }

        Builtin::SpanPart(part) => span_part(part, span(args, 0)?),
        Builtin::SpanTotal(unit) => {
            Value::Double(ticks_of(span(args, 0)?) as f64 / unit.ticks())
        }
        Builtin::SpanFrom(unit) => {
            Value::TimeSpan(span_from_ticks(unit_ticks(double(args, 0)?, unit)?))
        }
        Builtin::SpanFromTicks => Value::TimeSpan(span_from_ticks(long(args, 0)?)),

        Builtin::ToByteArray => match arg(args, 0)? {
            Value::Guid(guid) => Value::Array(guid.to_bytes_le().into_iter().map(Value::Byte).collect()),
            other => return Err(EvaluationFault::unexpected(other, "ToByteArray")),
        },

        Builtin::Math(function) => Value::Double(math(function, double(args, 0)?)),
        Builtin::Abs => abs(arg(args, 0)?)?,
        Builtin::Sign => sign(arg(args, 0)?)?,
        Builtin::Floor => real(arg(args, 0)?, f64::floor, Decimal::floor)?,
        Builtin::Ceiling => real(arg(args, 0)?, f64::ceil, Decimal::ceil)?,
        Builtin::Truncate => real(arg(args, 0)?, f64::trunc, Decimal::trunc)?,
        Builtin::Round => {
            let digits = if args.len() > 1 { Some(int(args, 1)?) } else { None };
            round(arg(args, 0)?, digits)?
        }
        Builtin::Pow => Value::Double(double(args, 0)?.powf(double(args, 1)?)),
        Builtin::Atan2 => Value::Double(double(args, 0)?.atan2(double(args, 1)?)),
        Builtin::Max => extremum(arg(args, 0)?, arg(args, 1)?, true)?,
        Builtin::Min => extremum(arg(args, 0)?, arg(args, 1)?, false)?,

        Builtin::Convert(ConvertTarget::Boolean) => numeric::to_boolean(arg(args, 0)?)?,
        Builtin::Convert(ConvertTarget::Numeric(kind)) => numeric::convert(arg(args, 0)?, kind)?,
        Builtin::Convert(ConvertTarget::String) => Value::String(arg(args, 0)?.to_string()),

        Builtin::RegexIsMatch => {
            let mut owned = None;
            let regex = regex_for(pattern, text(args, 1)?, &mut owned)?;
            Value::Boolean(regex.is_match(text(args, 0)?))
        }
        Builtin::RegexReplace => {
            let mut owned = None;
            let regex = regex_for(pattern, text(args, 1)?, &mut owned)?;
            let replaced = regex.replace_all(text(args, 0)?, text(args, 2)?);
            Value::String(replaced.into_owned())
        }
    };
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(builtin: Builtin, args: &[Value]) -> EvalResult {
        invoke(builtin, args, None)
    }

    #[test]
    fn test_string_members() {
        let s = Value::from("quill");
        assert_eq!(call(Builtin::StringLength, &[s.clone()]), Ok(Value::Int32(5)));
        assert_eq!(
            call(Builtin::Substring, &[s.clone(), Value::Int32(1), Value::Int32(3)]),
            Ok(Value::from("uil"))
        );
        assert_eq!(
            call(Builtin::IndexOf, &[s.clone(), Value::Char('l')]),
            Ok(Value::Int32(3))
        );
        assert!(matches!(
            call(Builtin::Substring, &[s, Value::Int32(9)]),
            Err(EvaluationFault::IndexOutOfRange { index: 9, length: 5 })
        ));
    }

    #[test]
    fn test_null_receiver_is_a_fault() {
        assert_eq!(
            call(Builtin::StringLength, &[Value::Null]),
            Err(EvaluationFault::NullReference {
                member: "Length".to_string()
            })
        );
    }

    #[test]
    fn test_nullable_members() {
        assert_eq!(call(Builtin::HasValue, &[Value::Null]), Ok(Value::Boolean(false)));
        assert_eq!(call(Builtin::NullableValue, &[Value::Null]), Err(EvaluationFault::NullValue));
        assert_eq!(
            call(Builtin::GetValueOrDefault, &[Value::Null, Value::Int32(7)]),
            Ok(Value::Int32(7))
        );
    }

    #[test]
    fn test_round_is_bankers() {
        assert_eq!(call(Builtin::Round, &[Value::Double(2.5)]), Ok(Value::Double(2.0)));
        assert_eq!(
            call(Builtin::Round, &[Value::Double(1.25), Value::Int32(1)]),
            Ok(Value::Double(1.2))
        );
    }

    #[test]
    fn test_guid_bytes_are_little_endian() {
        let guid = Uuid::parse_str("00010203-0405-0607-0809-0a0b0c0d0e0f").unwrap();
        let Ok(Value::Array(bytes)) = call(Builtin::ToByteArray, &[Value::Guid(guid)]) else {
            panic!("expected bytes");
        };
        assert_eq!(bytes[0], Value::Byte(3));
        assert_eq!(bytes[4], Value::Byte(5));
        assert_eq!(bytes[8], Value::Byte(8));
    }

    #[test]
    fn test_time_span_components() {
        let span = Value::TimeSpan(span_from_ticks(TICKS_PER_DAY + 2 * TICKS_PER_HOUR + 5));
        assert_eq!(call(Builtin::SpanPart(SpanPart::Days), &[span.clone()]), Ok(Value::Int32(1)));
        assert_eq!(call(Builtin::SpanPart(SpanPart::Hours), &[span.clone()]), Ok(Value::Int32(2)));
        assert_eq!(call(Builtin::SpanPart(SpanPart::Ticks), &[span]), Ok(Value::Int64(TICKS_PER_DAY + 2 * TICKS_PER_HOUR + 5)));
    }

    #[test]
    fn test_days_in_month() {
        assert_eq!(call(Builtin::DaysInMonth, &[Value::Int32(2024), Value::Int32(2)]), Ok(Value::Int32(29)));
        assert!(call(Builtin::DaysInMonth, &[Value::Int32(2024), Value::Int32(13)]).is_err());
    }

    #[test]
    fn test_regex_pattern_compiled_on_demand() {
        let args = [Value::from("abc123"), Value::from(r"\d+")];
        assert_eq!(call(Builtin::RegexIsMatch, &args), Ok(Value::Boolean(true)));
        let bad = [Value::from("abc"), Value::from("(")];
        assert!(matches!(
            call(Builtin::RegexIsMatch, &bad),
            Err(EvaluationFault::InvalidPattern(_))
        ));
    }
}
