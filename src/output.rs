//! Text and JSON rendering of run-time values.
//!
//! Text rendering is culture-invariant and is what `ToString()`, string
//! concatenation and `Convert.ToString` produce. JSON rendering is used by
//! the command-line front end.
//!
//! # Text formats
//!
//! - **Booleans** - `True` / `False`
//! - **Floating point** - shortest round-trip digits, switching to `E+XX`
//!   notation for very large or very small magnitudes (`1E+15`, `1E-05`)
//! - **DateTime** - `MM/dd/yyyy HH:mm:ss`, DateTimeOffset appends the offset
//! - **TimeSpan** - `[-][d.]hh:mm:ss[.fffffff]`
//! - **Records** - `{ X = 42, Y = 42 }`
//!
//! # Examples
//!
//! ```
//! use quill_expr::Value;
//!
//! assert_eq!(Value::Boolean(true).to_string(), "True");
//! assert_eq!(Value::Double(1e15).to_string(), "1E+15");
//! assert_eq!(Value::Single(42.0).to_string(), "42");
//! ```

use std::fmt;

use rust_decimal::prelude::ToPrimitive;
use serde_json::{Map, Number};

use crate::value::{Value, ticks_of};

const TICKS_PER_DAY: u64 = 864_000_000_000;
const TICKS_PER_HOUR: u64 = 36_000_000_000;
const TICKS_PER_MINUTE: u64 = 600_000_000;
const TICKS_PER_SECOND: u64 = 10_000_000;

/// Significant digits before scientific notation kicks in.
const DOUBLE_DIGITS: i32 = 15;
const SINGLE_DIGITS: i32 = 7;

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Boolean(true) => f.write_str("True"),
            Value::Boolean(false) => f.write_str("False"),
            Value::Char(c) => write!(f, "{}", c),
            Value::SByte(n) => write!(f, "{}", n),
            Value::Byte(n) => write!(f, "{}", n),
            Value::Int16(n) => write!(f, "{}", n),
            Value::UInt16(n) => write!(f, "{}", n),
            Value::Int32(n) => write!(f, "{}", n),
            Value::UInt32(n) => write!(f, "{}", n),
            Value::Int64(n) => write!(f, "{}", n),
            Value::UInt64(n) => write!(f, "{}", n),
            Value::Single(n) => f.write_str(&format_float(
                n.is_nan(),
                n.is_infinite(),
                format!("{:e}", n),
                SINGLE_DIGITS,
            )),
            Value::Double(n) => f.write_str(&format_float(
                n.is_nan(),
                n.is_infinite(),
                format!("{:e}", n),
                DOUBLE_DIGITS,
            )),
            Value::Decimal(d) => write!(f, "{}", d),
            Value::String(s) => f.write_str(s),
            Value::DateTime(dt) => write!(f, "{}", dt.format("%m/%d/%Y %H:%M:%S")),
            Value::DateTimeOffset(dt) => write!(f, "{}", dt.format("%m/%d/%Y %H:%M:%S %:z")),
            Value::TimeSpan(span) => f.write_str(&format_time_span(ticks_of(*span))),
            Value::Guid(g) => write!(f, "{}", g.hyphenated()),
            Value::Enum(e) => match e.name() {
                Some(name) => f.write_str(name),
                None => write!(f, "{}", e.value),
            },
            Value::Array(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str("]")
            }
            Value::Record(record) => {
                if record.values.is_empty() {
                    return f.write_str("{ }");
                }
                f.write_str("{ ")?;
                for (i, (field, value)) in record.ty.fields.iter().zip(&record.values).enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{} = {}", field.name, value)?;
                }
                f.write_str(" }")
            }
        }
    }
}

/// Rewrites Rust's shortest `{:e}` rendering (`4.2e1`) into positional or
/// `E+XX` notation.
fn format_float(nan: bool, infinite: bool, scientific: String, max_digits: i32) -> String {
    if nan {
        return "NaN".to_string();
    }
    if infinite {
        return if scientific.starts_with('-') {
            "-Infinity".to_string()
        } else {
            "Infinity".to_string()
        };
    }

    let (mantissa, exponent) = scientific
        .split_once('e')
        .unwrap_or((scientific.as_str(), "0"));
    let exponent: i32 = exponent.parse().unwrap_or(0);
    let negative = mantissa.starts_with('-');
    let digits: String = mantissa.chars().filter(char::is_ascii_digit).collect();
    let digits = digits.trim_end_matches('0');

    let sign = if negative { "-" } else { "" };
    if digits.is_empty() {
        return format!("{}0", sign);
    }

    // Number of digits before the decimal point
    let point = exponent + 1;
    if point > max_digits || point < -3 {
        let (first, rest) = digits.split_at(1);
        let fraction = if rest.is_empty() {
            String::new()
        } else {
            format!(".{}", rest)
        };
        let exponent_sign = if exponent < 0 { '-' } else { '+' };
        return format!(
            "{}{}{}E{}{:02}",
            sign,
            first,
            fraction,
            exponent_sign,
            exponent.abs()
        );
    }

    if point <= 0 {
        let zeros = "0".repeat(point.unsigned_abs() as usize);
        return format!("{}0.{}{}", sign, zeros, digits);
    }

    let point = point as usize;
    if digits.len() <= point {
        format!("{}{}{}", sign, digits, "0".repeat(point - digits.len()))
    } else {
        format!("{}{}.{}", sign, &digits[..point], &digits[point..])
    }
}

fn format_time_span(ticks: i64) -> String {
    let sign = if ticks < 0 { "-" } else { "" };
    let ticks = ticks.unsigned_abs();

    let days = ticks / TICKS_PER_DAY;
    let hours = ticks % TICKS_PER_DAY / TICKS_PER_HOUR;
    let minutes = ticks % TICKS_PER_HOUR / TICKS_PER_MINUTE;
    let seconds = ticks % TICKS_PER_MINUTE / TICKS_PER_SECOND;
    let fraction = ticks % TICKS_PER_SECOND;

    let mut result = String::from(sign);
    if days > 0 {
        result.push_str(&format!("{}.", days));
    }
    result.push_str(&format!("{:02}:{:02}:{:02}", hours, minutes, seconds));
    if fraction > 0 {
        result.push_str(&format!(".{:07}", fraction));
    }
    result
}

/// Converts a value to JSON.
///
/// Numbers stay numbers (non-finite floats become strings), characters,
/// dates, spans, GUIDs and enum members become their text form, records
/// become objects.
pub fn to_json(value: &Value) -> serde_json::Value {
    use serde_json::Value as Json;

    match value {
        Value::Null => Json::Null,
        Value::Boolean(b) => Json::Bool(*b),
        Value::SByte(n) => Json::from(*n),
        Value::Byte(n) => Json::from(*n),
        Value::Int16(n) => Json::from(*n),
        Value::UInt16(n) => Json::from(*n),
        Value::Int32(n) => Json::from(*n),
        Value::UInt32(n) => Json::from(*n),
        Value::Int64(n) => Json::from(*n),
        Value::UInt64(n) => Json::from(*n),
        Value::Single(n) => float_to_json(f64::from(*n), value),
        Value::Double(n) => float_to_json(*n, value),
        Value::Decimal(d) => match d.to_f64() {
            Some(n) => float_to_json(n, value),
            None => Json::String(d.to_string()),
        },
        Value::DateTime(dt) => Json::String(dt.format("%Y-%m-%dT%H:%M:%S%.f").to_string()),
        Value::DateTimeOffset(dt) => Json::String(dt.to_rfc3339()),
        Value::Char(_)
        | Value::String(_)
        | Value::TimeSpan(_)
        | Value::Guid(_)
        | Value::Enum(_) => Json::String(value.to_string()),
        Value::Array(items) => Json::Array(items.iter().map(to_json).collect()),
        Value::Record(record) => {
            let mut object = Map::new();
            for (field, value) in record.ty.fields.iter().zip(&record.values) {
                object.insert(field.name.clone(), to_json(value));
            }
            Json::Object(object)
        }
    }
}

fn float_to_json(n: f64, original: &Value) -> serde_json::Value {
    if n.fract() == 0.0 && n.abs() < 9.007_199_254_740_992e15 {
        return serde_json::Value::from(n as i64);
    }
    match Number::from_f64(n) {
        Some(number) => serde_json::Value::Number(number),
        None => serde_json::Value::String(original.to_string()),
    }
}

/// Renders a value as a JSON document.
pub fn to_json_string(value: &Value, pretty: bool) -> Result<String, serde_json::Error> {
    let json = to_json(value);
    if pretty {
        serde_json::to_string_pretty(&json)
    } else {
        serde_json::to_string(&json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn double(n: f64) -> String {
        Value::Double(n).to_string()
    }

    #[test]
    fn test_double_formatting() {
        assert_eq!(double(42.0), "42");
        assert_eq!(double(0.5), "0.5");
        assert_eq!(double(-1.25), "-1.25");
        assert_eq!(double(std::f64::consts::PI), "3.141592653589793");
        assert_eq!(double(1e15), "1E+15");
        assert_eq!(double(123456789012345.0), "123456789012345");
        assert_eq!(double(0.0001), "0.0001");
        assert_eq!(double(0.00001), "1E-05");
        assert_eq!(double(f64::NAN), "NaN");
        assert_eq!(double(f64::NEG_INFINITY), "-Infinity");
        assert_eq!(double(0.0), "0");
    }

    #[test]
    fn test_time_span_formatting() {
        assert_eq!(format_time_span(0), "00:00:00");
        assert_eq!(format_time_span(TICKS_PER_DAY as i64 + 1), "1.00:00:00.0000001");
        assert_eq!(format_time_span(-(TICKS_PER_HOUR as i64) * 2), "-02:00:00");
    }
}
