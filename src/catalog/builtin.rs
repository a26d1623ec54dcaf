use crate::types::NumericKind;

/// A library function the binder can resolve a call or property to.
///
/// Instance members receive their receiver as the first argument. The
/// run-time implementation of every variant lives in `runtime::builtins`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Builtin {
    // Every value
    ToString,

    // Nullable<T>
    HasValue,
    NullableValue,
    GetValueOrDefault,

    // Parsing
    ParseBoolean,
    ParseNumber(NumericKind),
    ParseGuid,

    // Char
    CharTest(CharClass),

    // String
    IsNullOrEmpty,
    IsNullOrWhiteSpace,
    Concat,
    StringLength,
    ToUpper,
    ToLower,
    Trim,
    Contains,
    StartsWith,
    EndsWith,
    Substring,
    IndexOf,
    Replace,

    // Arrays
    ArrayLength,

    // DateTime and DateTimeOffset
    DaysInMonth,
    IsLeapYear,
    DatePart(DatePart),
    DayOfWeek,
    Date,
    TimeOfDay,
    AddTime(TimeUnit),
    AddTicks,
    Offset,
    LocalDateTime,
    UtcDateTime,
    UtcTicks,

    // TimeSpan
    SpanPart(SpanPart),
    SpanTotal(TimeUnit),
    SpanFrom(TimeUnit),
    SpanFromTicks,

    // Guid
    ToByteArray,

    // Math
    Math(MathFn),
    Abs,
    Sign,
    Floor,
    Ceiling,
    Truncate,
    Round,
    Pow,
    Atan2,
    Max,
    Min,

    // Convert
    Convert(ConvertTarget),

    // Regex
    RegexIsMatch,
    RegexReplace,
}

impl Builtin {
    /// Whether the pattern argument (second position) is a regular expression.
    pub fn takes_pattern(self) -> bool {
        matches!(self, Builtin::RegexIsMatch | Builtin::RegexReplace)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CharClass {
    Digit,
    Letter,
    WhiteSpace,
    Upper,
    Lower,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DatePart {
    Year,
    Month,
    Day,
    Hour,
    Minute,
    Second,
    Millisecond,
    DayOfYear,
    Ticks,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpanPart {
    Days,
    Hours,
    Minutes,
    Seconds,
    Milliseconds,
    Ticks,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeUnit {
    Days,
    Hours,
    Minutes,
    Seconds,
    Milliseconds,
}

impl TimeUnit {
    pub fn ticks(self) -> f64 {
        match self {
            TimeUnit::Days => 864_000_000_000.0,
            TimeUnit::Hours => 36_000_000_000.0,
            TimeUnit::Minutes => 600_000_000.0,
            TimeUnit::Seconds => 10_000_000.0,
            TimeUnit::Milliseconds => 10_000.0,
        }
    }
}

/// Single-argument `Double -> Double` functions of `Math`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MathFn {
    Sqrt,
    Exp,
    Log,
    Log10,
    Sin,
    Cos,
    Tan,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConvertTarget {
    Boolean,
    Numeric(NumericKind),
    String,
}
