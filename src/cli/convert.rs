//! JSON <-> Value conversion, typed by the declared input type

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use serde_json::Value as Json;
use uuid::Uuid;

use super::CliError;
use crate::{
    Catalog, Type, Value,
    output::to_json,
    runtime::numeric,
    types::{NumericKind, RecordField, RecordType},
    value::{EnumValue, Record, span_from_ticks},
};

/// Resolves a type name given on the command line, e.g. `int`, `long?`,
/// `DateTime[]`.
pub fn parse_type(name: &str) -> Result<Type, CliError> {
    Catalog::standard()
        .resolve_type(name)
        .ok_or_else(|| CliError::UnknownType(name.to_string()))
}

fn json_kind(json: &Json) -> &'static str {
    match json {
        Json::Null => "null",
        Json::Bool(_) => "boolean",
        Json::Number(_) => "number",
        Json::String(_) => "string",
        Json::Array(_) => "array",
        Json::Object(_) => "object",
    }
}

fn mismatch(json: &Json, ty: &Type) -> CliError {
    CliError::Decode {
        expected: ty.to_string(),
        found: json_kind(json).to_string(),
    }
}

/// Infers a value for an `Object` input: integers become Int32 when they
/// fit, then Int64 or UInt64; other numbers are Double; objects become
/// records.
fn infer(json: Json) -> Value {
    match json {
        Json::Null => Value::Null,
        Json::Bool(b) => Value::Boolean(b),
        Json::Number(n) => {
            if let Some(i) = n.as_i64() {
                i32::try_from(i).map_or(Value::Int64(i), Value::Int32)
            } else if let Some(u) = n.as_u64() {
                Value::UInt64(u)
            } else {
                Value::Double(n.as_f64().unwrap_or(f64::NAN))
            }
        }
        Json::String(s) => Value::String(s),
        Json::Array(items) => Value::Array(items.into_iter().map(infer).collect()),
        Json::Object(fields) => {
            let (names, values): (Vec<_>, Vec<_>) = fields
                .into_iter()
                .map(|(name, value)| (name, infer(value)))
                .unzip();
            let ty = RecordType::new(
                names
                    .into_iter()
                    .map(|name| RecordField {
                        name,
                        ty: Type::Object,
                    })
                    .collect(),
            );
            Value::Record(Record {
                ty: ty.into(),
                values,
            })
        }
    }
}

fn number(json: &Json, kind: NumericKind, ty: &Type) -> Result<Value, CliError> {
    let source = match json {
        Json::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Int64(i)
            } else if let Some(u) = n.as_u64() {
                Value::UInt64(u)
            } else if kind == NumericKind::Decimal {
                let text = n.to_string();
                let parsed = Decimal::from_str(&text)
                    .or_else(|_| Decimal::from_scientific(&text))
                    .map_err(|_| mismatch(json, ty))?;
                Value::Decimal(parsed)
            } else if kind.is_integral() {
                return Err(mismatch(json, ty));
            } else {
                Value::Double(n.as_f64().ok_or_else(|| mismatch(json, ty))?)
            }
        }
        // Non-finite floats and long decimals travel as text
        Json::String(s) if !kind.is_integral() => match s.as_str() {
            "NaN" => Value::Double(f64::NAN),
            "Infinity" => Value::Double(f64::INFINITY),
            "-Infinity" => Value::Double(f64::NEG_INFINITY),
            _ => return numeric::parse(s, kind).map_err(|_| mismatch(json, ty)),
        },
        _ => return Err(mismatch(json, ty)),
    };
    numeric::convert(&source, kind).map_err(|fault| CliError::Decode {
        expected: ty.to_string(),
        found: fault.to_string(),
    })
}

fn date_time(text: &str) -> Option<NaiveDateTime> {
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .ok()
                .map(|date| date.and_time(NaiveTime::MIN))
        })
}

/// Reads `[-][d.]hh:mm:ss[.fffffff]`.
fn time_span_ticks(text: &str) -> Option<i64> {
    let (negative, body) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    };
    let (clock, fraction) = match body.split_once('.') {
        // a leading `d.` is the day count, not the fraction
        Some((days, rest)) if !days.contains(':') => {
            let (clock, fraction) = rest.split_once('.').unwrap_or((rest, ""));
            let days: i64 = days.parse().ok()?;
            let ticks = clock_ticks(clock, fraction)?;
            return sign(negative, days.checked_mul(864_000_000_000)?.checked_add(ticks)?);
        }
        Some((clock, fraction)) => (clock, fraction),
        None => (body, ""),
    };
    sign(negative, clock_ticks(clock, fraction)?)
}

fn sign(negative: bool, ticks: i64) -> Option<i64> {
    Some(if negative { -ticks } else { ticks })
}

fn clock_ticks(clock: &str, fraction: &str) -> Option<i64> {
    let mut parts = clock.split(':').map(str::parse::<i64>);
    let (hours, minutes, seconds) = match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(Ok(h)), Some(Ok(m)), Some(Ok(s)), None) if h < 24 && m < 60 && s < 60 => (h, m, s),
        _ => return None,
    };
    if fraction.len() > 7 || !fraction.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let fraction_ticks = if fraction.is_empty() {
        0
    } else {
        format!("{fraction:0<7}").parse::<i64>().ok()?
    };
    Some(((hours * 60 + minutes) * 60 + seconds) * 10_000_000 + fraction_ticks)
}

/// Decodes JSON as a value of type `ty`.
pub fn json_to_value(json: Json, ty: &Type) -> Result<Value, CliError> {
    if json.is_null() {
        return if ty.accepts_null() {
            Ok(Value::Null)
        } else {
            Err(mismatch(&json, ty))
        };
    }

    match ty {
        Type::Object => return Ok(infer(json)),
        Type::Nullable(inner) => return json_to_value(json, inner),
        _ => {}
    }

    let value = match (ty, &json) {
        (Type::Boolean, Json::Bool(b)) => Value::Boolean(*b),
        (Type::String, Json::String(s)) => Value::String(s.clone()),
        (Type::Char, Json::String(s)) => {
            let mut chars = s.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Value::Char(c),
                _ => return Err(mismatch(&json, ty)),
            }
        }
        (Type::DateTime, Json::String(s)) => {
            Value::DateTime(date_time(s).ok_or_else(|| mismatch(&json, ty))?)
        }
        (Type::DateTimeOffset, Json::String(s)) => Value::DateTimeOffset(
            DateTime::parse_from_rfc3339(s).map_err(|_| mismatch(&json, ty))?,
        ),
        (Type::TimeSpan, Json::String(s)) => Value::TimeSpan(span_from_ticks(
            time_span_ticks(s).ok_or_else(|| mismatch(&json, ty))?,
        )),
        (Type::TimeSpan, Json::Number(n)) => Value::TimeSpan(span_from_ticks(
            n.as_i64().ok_or_else(|| mismatch(&json, ty))?,
        )),
        (Type::Guid, Json::String(s)) => {
            Value::Guid(Uuid::parse_str(s).map_err(|_| mismatch(&json, ty))?)
        }
        (&Type::Enum(enum_type), Json::String(s)) => {
            let member = enum_type
                .member_value(s)
                .ok_or_else(|| mismatch(&json, ty))?;
            Value::Enum(EnumValue::new(enum_type, member))
        }
        (&Type::Enum(enum_type), Json::Number(n)) => {
            let member = n
                .as_i64()
                .and_then(|n| i32::try_from(n).ok())
                .ok_or_else(|| mismatch(&json, ty))?;
            Value::Enum(EnumValue::new(enum_type, member))
        }
        (Type::Array(element) | Type::Sequence(element), Json::Array(items)) => Value::Array(
            items
                .iter()
                .cloned()
                .map(|item| json_to_value(item, element))
                .collect::<Result<_, _>>()?,
        ),
        (other, _) => match other.numeric_kind() {
            Some(kind) if kind != NumericKind::Char => number(&json, kind, ty)?,
            _ => return Err(mismatch(&json, ty)),
        },
    };
    Ok(value)
}

/// Encodes an output value as JSON.
pub fn value_to_json(value: &Value) -> Json {
    to_json(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_typed_integers_are_checked() {
        assert_eq!(json_to_value(json!(42), &Type::Int16).unwrap(), Value::Int16(42));
        assert!(json_to_value(json!(70000), &Type::Int16).is_err());
        assert!(json_to_value(json!(1.5), &Type::Int32).is_err());
    }

    #[test]
    fn test_nullable_and_null() {
        let ty = parse_type("int?").unwrap();
        assert_eq!(json_to_value(Json::Null, &ty).unwrap(), Value::Null);
        assert!(json_to_value(Json::Null, &Type::Int32).is_err());
    }

    #[test]
    fn test_enum_by_name() {
        let ty = parse_type("DayOfWeek").unwrap();
        let value = json_to_value(json!("monday"), &ty).unwrap();
        assert_eq!(value.to_string(), "Monday");
    }

    #[test]
    fn test_time_span_text() {
        assert_eq!(time_span_ticks("00:00:01"), Some(10_000_000));
        assert_eq!(time_span_ticks("1.00:00:00.5"), Some(864_005_000_000));
        assert_eq!(time_span_ticks("-01:00:00"), Some(-36_000_000_000));
        assert_eq!(time_span_ticks("25:00:00"), None);
    }

    #[test]
    fn test_object_input_infers_types() {
        assert_eq!(json_to_value(json!(7), &Type::Object).unwrap(), Value::Int32(7));
        assert_eq!(
            json_to_value(json!(5_000_000_000i64), &Type::Object).unwrap(),
            Value::Int64(5_000_000_000)
        );
        assert_eq!(json_to_value(json!(0.5), &Type::Object).unwrap(), Value::Double(0.5));
    }

    #[test]
    fn test_unknown_type_name() {
        assert!(matches!(parse_type("Widget"), Err(CliError::UnknownType(_))));
    }
}
