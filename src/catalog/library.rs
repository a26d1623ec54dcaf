//! The standard allow-list of library types and their static members.

use std::sync::{Arc, LazyLock};

use chrono::TimeDelta;
use rust_decimal::Decimal;
use uuid::Uuid;

use super::{
    Builtin, CharClass, ConvertTarget, MathFn, Member, Signature, Symbol, SymbolKind, TimeUnit,
};
use crate::{
    types::{DAY_OF_WEEK, NumericKind, Type},
    value::{EnumValue, TICKS_PER_SECOND, Value, calendar_epoch, span_from_ticks},
};

/// Ticks of the last representable instant, 9999-12-31 23:59:59.9999999.
pub const MAX_DATE_TICKS: i64 = 3_155_378_975_999_999_999;
const DAYS_BEFORE_UNIX_EPOCH: i64 = 719_162;

pub const TICKS_PER_MILLISECOND: i64 = 10_000;
pub const TICKS_PER_MINUTE: i64 = 600_000_000;
pub const TICKS_PER_HOUR: i64 = 36_000_000_000;
pub const TICKS_PER_DAY: i64 = 864_000_000_000;

pub(crate) static STANDARD_SYMBOLS: LazyLock<Vec<Arc<Symbol>>> = LazyLock::new(|| {
    let mut symbols = vec![boolean(), char_type()];
    symbols.extend(
        NumericKind::ALL
            .into_iter()
            .filter(|kind| *kind != NumericKind::Char)
            .map(numeric),
    );
    symbols.extend([
        string(),
        object(),
        date_time(),
        date_time_offset(),
        time_span(),
        guid(),
        day_of_week(),
        math(),
        convert(),
        regex(),
    ]);
    symbols.into_iter().map(Arc::new).collect()
});

fn sig(params: Vec<Type>, ret: Type, builtin: Builtin) -> Signature {
    Signature::new(params, ret, builtin)
}

/// One single-parameter overload per type, each returning `ret(param)`.
fn per_type(types: &[Type], ret: impl Fn(&Type) -> Type, builtin: Builtin) -> Vec<Signature> {
    types
        .iter()
        .map(|ty| sig(vec![ty.clone()], ret(ty), builtin))
        .collect()
}

fn type_symbol(
    name: &'static str,
    aliases: &[&'static str],
    ty: Type,
    members: Vec<Member>,
    summary: &'static str,
) -> Symbol {
    Symbol {
        name,
        aliases: aliases.to_vec(),
        kind: SymbolKind::Type(ty),
        members,
        summary,
    }
}

fn class_symbol(name: &'static str, members: Vec<Member>, summary: &'static str) -> Symbol {
    Symbol {
        name,
        aliases: vec![],
        kind: SymbolKind::Class,
        members,
        summary,
    }
}

fn boolean() -> Symbol {
    type_symbol(
        "Boolean",
        &["bool"],
        Type::Boolean,
        vec![
            Member::constant("TrueString", "True", Type::String),
            Member::constant("FalseString", "False", Type::String),
            Member::method(
                "Parse",
                vec![sig(vec![Type::String], Type::Boolean, Builtin::ParseBoolean)],
            ),
        ],
        "True or false",
    )
}

fn char_type() -> Symbol {
    let test = |name, class| {
        Member::method(
            name,
            vec![sig(vec![Type::Char], Type::Boolean, Builtin::CharTest(class))],
        )
    };
    type_symbol(
        "Char",
        &["char"],
        Type::Char,
        vec![
            Member::constant("MinValue", Value::Char('\0'), Type::Char),
            Member::constant("MaxValue", Value::Char('\u{FFFF}'), Type::Char),
            test("IsDigit", CharClass::Digit),
            test("IsLetter", CharClass::Letter),
            test("IsWhiteSpace", CharClass::WhiteSpace),
            test("IsUpper", CharClass::Upper),
            test("IsLower", CharClass::Lower),
        ],
        "A single character",
    )
}

fn numeric(kind: NumericKind) -> Symbol {
    let ty = kind.ty();
    let (name, alias, min, max, summary): (_, _, Value, Value, _) = match kind {
        NumericKind::SByte => ("SByte", "sbyte", Value::SByte(i8::MIN), Value::SByte(i8::MAX), "Signed 8-bit integer"),
        NumericKind::Byte => ("Byte", "byte", Value::Byte(u8::MIN), Value::Byte(u8::MAX), "Unsigned 8-bit integer"),
        NumericKind::Int16 => ("Int16", "short", Value::Int16(i16::MIN), Value::Int16(i16::MAX), "Signed 16-bit integer"),
        NumericKind::UInt16 => ("UInt16", "ushort", Value::UInt16(u16::MIN), Value::UInt16(u16::MAX), "Unsigned 16-bit integer"),
        NumericKind::Int32 => ("Int32", "int", Value::Int32(i32::MIN), Value::Int32(i32::MAX), "Signed 32-bit integer"),
        NumericKind::UInt32 => ("UInt32", "uint", Value::UInt32(u32::MIN), Value::UInt32(u32::MAX), "Unsigned 32-bit integer"),
        NumericKind::Int64 => ("Int64", "long", Value::Int64(i64::MIN), Value::Int64(i64::MAX), "Signed 64-bit integer"),
        NumericKind::UInt64 => ("UInt64", "ulong", Value::UInt64(u64::MIN), Value::UInt64(u64::MAX), "Unsigned 64-bit integer"),
        NumericKind::Single => ("Single", "float", Value::Single(f32::MIN), Value::Single(f32::MAX), "Single-precision floating point"),
        NumericKind::Double => ("Double", "double", Value::Double(f64::MIN), Value::Double(f64::MAX), "Double-precision floating point"),
        NumericKind::Decimal | NumericKind::Char => ("Decimal", "decimal", Value::Decimal(Decimal::MIN), Value::Decimal(Decimal::MAX), "128-bit decimal"),
    };

    let mut members = vec![
        Member::constant("MinValue", min, ty.clone()),
        Member::constant("MaxValue", max, ty.clone()),
        Member::method(
            "Parse",
            vec![sig(vec![Type::String], ty.clone(), Builtin::ParseNumber(kind))],
        ),
    ];
    match kind {
        NumericKind::Single => members.extend([
            Member::constant("Epsilon", f32::from_bits(1), Type::Single),
            Member::constant("NaN", f32::NAN, Type::Single),
            Member::constant("PositiveInfinity", f32::INFINITY, Type::Single),
            Member::constant("NegativeInfinity", f32::NEG_INFINITY, Type::Single),
        ]),
        NumericKind::Double => members.extend([
            Member::constant("Epsilon", f64::from_bits(1), Type::Double),
            Member::constant("NaN", f64::NAN, Type::Double),
            Member::constant("PositiveInfinity", f64::INFINITY, Type::Double),
            Member::constant("NegativeInfinity", f64::NEG_INFINITY, Type::Double),
        ]),
        NumericKind::Decimal => members.extend([
            Member::constant("Zero", Decimal::ZERO, Type::Decimal),
            Member::constant("One", Decimal::ONE, Type::Decimal),
            Member::constant("MinusOne", Decimal::NEGATIVE_ONE, Type::Decimal),
        ]),
        _ => {}
    }

    type_symbol(name, &[alias], ty, members, summary)
}

fn string() -> Symbol {
    let strings = |n: usize| vec![Type::String; n];
    let objects = |n: usize| vec![Type::Object; n];
    type_symbol(
        "String",
        &["string"],
        Type::String,
        vec![
            Member::constant("Empty", "", Type::String),
            Member::method(
                "IsNullOrEmpty",
                vec![sig(strings(1), Type::Boolean, Builtin::IsNullOrEmpty)],
            ),
            Member::method(
                "IsNullOrWhiteSpace",
                vec![sig(strings(1), Type::Boolean, Builtin::IsNullOrWhiteSpace)],
            ),
            Member::method(
                "Concat",
                vec![
                    sig(strings(2), Type::String, Builtin::Concat),
                    sig(strings(3), Type::String, Builtin::Concat),
                    sig(objects(2), Type::String, Builtin::Concat),
                    sig(objects(3), Type::String, Builtin::Concat),
                ],
            ),
        ],
        "Text; null when absent",
    )
}

fn object() -> Symbol {
    type_symbol(
        "Object",
        &["object"],
        Type::Object,
        vec![],
        "Any value, boxed",
    )
}

fn date_time() -> Symbol {
    let epoch = calendar_epoch();
    type_symbol(
        "DateTime",
        &[],
        Type::DateTime,
        vec![
            Member::constant("MinValue", Value::DateTime(epoch), Type::DateTime),
            Member::constant(
                "MaxValue",
                Value::DateTime(epoch + span_from_ticks(MAX_DATE_TICKS)),
                Type::DateTime,
            ),
            Member::constant(
                "UnixEpoch",
                Value::DateTime(epoch + TimeDelta::days(DAYS_BEFORE_UNIX_EPOCH)),
                Type::DateTime,
            ),
            Member::method(
                "DaysInMonth",
                vec![sig(
                    vec![Type::Int32, Type::Int32],
                    Type::Int32,
                    Builtin::DaysInMonth,
                )],
            ),
            Member::method(
                "IsLeapYear",
                vec![sig(vec![Type::Int32], Type::Boolean, Builtin::IsLeapYear)],
            ),
        ],
        "A calendar date and time of day",
    )
}

fn date_time_offset() -> Symbol {
    let epoch = calendar_epoch();
    let utc = |ticks: i64| {
        Value::DateTimeOffset((epoch + span_from_ticks(ticks)).and_utc().fixed_offset())
    };
    type_symbol(
        "DateTimeOffset",
        &[],
        Type::DateTimeOffset,
        vec![
            Member::constant("MinValue", utc(0), Type::DateTimeOffset),
            Member::constant("MaxValue", utc(MAX_DATE_TICKS), Type::DateTimeOffset),
            Member::constant(
                "UnixEpoch",
                utc(DAYS_BEFORE_UNIX_EPOCH * TICKS_PER_DAY),
                Type::DateTimeOffset,
            ),
        ],
        "A date and time with an offset from UTC",
    )
}

fn time_span() -> Symbol {
    let span = |ticks: i64| Value::TimeSpan(span_from_ticks(ticks));
    let from = |name, unit| {
        Member::method(
            name,
            vec![sig(vec![Type::Double], Type::TimeSpan, Builtin::SpanFrom(unit))],
        )
    };
    type_symbol(
        "TimeSpan",
        &[],
        Type::TimeSpan,
        vec![
            Member::constant("Zero", span(0), Type::TimeSpan),
            Member::constant("MinValue", span(i64::MIN), Type::TimeSpan),
            Member::constant("MaxValue", span(i64::MAX), Type::TimeSpan),
            Member::constant("TicksPerMillisecond", TICKS_PER_MILLISECOND, Type::Int64),
            Member::constant("TicksPerSecond", TICKS_PER_SECOND, Type::Int64),
            Member::constant("TicksPerMinute", TICKS_PER_MINUTE, Type::Int64),
            Member::constant("TicksPerHour", TICKS_PER_HOUR, Type::Int64),
            Member::constant("TicksPerDay", TICKS_PER_DAY, Type::Int64),
            from("FromDays", TimeUnit::Days),
            from("FromHours", TimeUnit::Hours),
            from("FromMinutes", TimeUnit::Minutes),
            from("FromSeconds", TimeUnit::Seconds),
            from("FromMilliseconds", TimeUnit::Milliseconds),
            Member::method(
                "FromTicks",
                vec![sig(vec![Type::Int64], Type::TimeSpan, Builtin::SpanFromTicks)],
            ),
        ],
        "A signed time interval measured in 100-nanosecond ticks",
    )
}

fn guid() -> Symbol {
    type_symbol(
        "Guid",
        &[],
        Type::Guid,
        vec![
            Member::constant("Empty", Value::Guid(Uuid::nil()), Type::Guid),
            Member::method(
                "Parse",
                vec![sig(vec![Type::String], Type::Guid, Builtin::ParseGuid)],
            ),
        ],
        "A 128-bit globally unique identifier",
    )
}

fn day_of_week() -> Symbol {
    let ty = Type::Enum(&DAY_OF_WEEK);
    let members = DAY_OF_WEEK
        .members
        .iter()
        .map(|(name, value)| {
            Member::constant(
                *name,
                Value::Enum(EnumValue::new(&DAY_OF_WEEK, *value)),
                ty.clone(),
            )
        })
        .collect();
    type_symbol(
        "DayOfWeek",
        &[],
        ty,
        members,
        "Day of the week, Sunday (0) through Saturday (6)",
    )
}

fn math() -> Symbol {
    let signed = [
        Type::SByte,
        Type::Int16,
        Type::Int32,
        Type::Int64,
        Type::Single,
        Type::Double,
        Type::Decimal,
    ];
    let all: Vec<Type> = NumericKind::ALL
        .into_iter()
        .filter(|kind| *kind != NumericKind::Char)
        .map(NumericKind::ty)
        .collect();
    let real = [Type::Double, Type::Decimal];
    let double = |name, f| {
        Member::method(
            name,
            vec![sig(vec![Type::Double], Type::Double, Builtin::Math(f))],
        )
    };
    let binary = |types: &[Type], builtin| -> Vec<Signature> {
        types
            .iter()
            .map(|ty| sig(vec![ty.clone(), ty.clone()], ty.clone(), builtin))
            .collect()
    };

    let mut round = per_type(&real, Type::clone, Builtin::Round);
    round.extend(
        real.iter()
            .map(|ty| sig(vec![ty.clone(), Type::Int32], ty.clone(), Builtin::Round)),
    );

    class_symbol(
        "Math",
        vec![
            Member::constant("PI", std::f64::consts::PI, Type::Double),
            Member::constant("E", std::f64::consts::E, Type::Double),
            Member::constant("Tau", std::f64::consts::TAU, Type::Double),
            Member::method("Abs", per_type(&signed, Type::clone, Builtin::Abs)),
            Member::method("Sign", per_type(&signed, |_| Type::Int32, Builtin::Sign)),
            double("Sqrt", MathFn::Sqrt),
            double("Exp", MathFn::Exp),
            double("Log", MathFn::Log),
            double("Log10", MathFn::Log10),
            double("Sin", MathFn::Sin),
            double("Cos", MathFn::Cos),
            double("Tan", MathFn::Tan),
            Member::method(
                "Pow",
                vec![sig(
                    vec![Type::Double, Type::Double],
                    Type::Double,
                    Builtin::Pow,
                )],
            ),
            Member::method(
                "Atan2",
                vec![sig(
                    vec![Type::Double, Type::Double],
                    Type::Double,
                    Builtin::Atan2,
                )],
            ),
            Member::method("Floor", per_type(&real, Type::clone, Builtin::Floor)),
            Member::method("Ceiling", per_type(&real, Type::clone, Builtin::Ceiling)),
            Member::method("Truncate", per_type(&real, Type::clone, Builtin::Truncate)),
            Member::method("Round", round),
            Member::method("Max", binary(&all, Builtin::Max)),
            Member::method("Min", binary(&all, Builtin::Min)),
        ],
        "Constants and common mathematical functions",
    )
}

fn convert() -> Symbol {
    let mut sources = vec![Type::Boolean];
    sources.extend(NumericKind::ALL.into_iter().map(NumericKind::ty));
    sources.extend([Type::String, Type::Object]);

    let to = |name, ret: Type, target| {
        Member::method(
            name,
            per_type(&sources, |_| ret.clone(), Builtin::Convert(target)),
        )
    };
    let numeric = |name, kind: NumericKind| to(name, kind.ty(), ConvertTarget::Numeric(kind));

    class_symbol(
        "Convert",
        vec![
            to("ToBoolean", Type::Boolean, ConvertTarget::Boolean),
            numeric("ToChar", NumericKind::Char),
            numeric("ToSByte", NumericKind::SByte),
            numeric("ToByte", NumericKind::Byte),
            numeric("ToInt16", NumericKind::Int16),
            numeric("ToUInt16", NumericKind::UInt16),
            numeric("ToInt32", NumericKind::Int32),
            numeric("ToUInt32", NumericKind::UInt32),
            numeric("ToInt64", NumericKind::Int64),
            numeric("ToUInt64", NumericKind::UInt64),
            numeric("ToSingle", NumericKind::Single),
            numeric("ToDouble", NumericKind::Double),
            numeric("ToDecimal", NumericKind::Decimal),
            to("ToString", Type::String, ConvertTarget::String),
        ],
        "Checked conversions between base types; overflow is a fault",
    )
}

fn regex() -> Symbol {
    class_symbol(
        "Regex",
        vec![
            Member::method(
                "IsMatch",
                vec![sig(
                    vec![Type::String, Type::String],
                    Type::Boolean,
                    Builtin::RegexIsMatch,
                )],
            ),
            Member::method(
                "Replace",
                vec![sig(
                    vec![Type::String, Type::String, Type::String],
                    Type::String,
                    Builtin::RegexReplace,
                )],
            ),
        ],
        "Regular expression matching and replacement",
    )
}
