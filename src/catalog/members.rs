//! Instance members available on values of each type, and the query
//! operators available on arrays and sequences.

use super::{Builtin, DatePart, Member, Signature, SpanPart, TimeUnit};
use crate::types::{DAY_OF_WEEK, Type};

/// Query operators accepted on arrays and sequences, with a one-line usage.
pub const QUERY_OPERATORS: &[(&str, &str)] = &[
    ("Select", "Select(x => f(x)) projects every element"),
    ("Where", "Where(x => p(x)) keeps the elements matching a predicate"),
    ("OrderBy", "OrderBy(x => key) sorts ascending by a key"),
    ("OrderByDescending", "OrderByDescending(x => key) sorts descending by a key"),
    ("ToArray", "ToArray() materializes a sequence into an array"),
    ("Count", "Count() or Count(x => p(x)) counts elements"),
    ("Any", "Any() or Any(x => p(x)) tests for at least one element"),
    ("All", "All(x => p(x)) tests every element"),
    ("First", "First() or First(x => p(x)); faults when there is none"),
    ("FirstOrDefault", "FirstOrDefault() or FirstOrDefault(x => p(x)); default when there is none"),
    ("Last", "Last() or Last(x => p(x)); faults when there is none"),
    ("LastOrDefault", "LastOrDefault() or LastOrDefault(x => p(x)); default when there is none"),
    ("Sum", "Sum() or Sum(x => n(x)) adds numeric elements"),
    ("Min", "Min() or Min(x => key) smallest element or key"),
    ("Max", "Max() or Max(x => key) largest element or key"),
    ("Average", "Average() or Average(x => n(x)) arithmetic mean"),
    ("Contains", "Contains(value) tests membership"),
    ("Take", "Take(n) keeps the first n elements"),
    ("Skip", "Skip(n) drops the first n elements"),
    ("Distinct", "Distinct() removes duplicates, keeping first occurrences"),
    ("Reverse", "Reverse() reverses the order"),
];

fn sig(params: Vec<Type>, ret: Type, builtin: Builtin) -> Signature {
    Signature::new(params, ret, builtin)
}

fn method(name: &'static str, params: Vec<Type>, ret: Type, builtin: Builtin) -> Member {
    Member::method(name, vec![sig(params, ret, builtin)])
}

/// Members of a value whose static type is `receiver`, `ToString()` first.
///
/// `Nullable<T>` exposes only its own members; reaching the members of `T`
/// requires `.Value` or `np(...)`.
pub fn instance_members(receiver: &Type) -> Vec<Member> {
    let mut members = vec![method("ToString", vec![], Type::String, Builtin::ToString)];

    match receiver {
        Type::Nullable(inner) => {
            let inner = (**inner).clone();
            members.extend([
                Member::property("HasValue", Type::Boolean, Builtin::HasValue),
                Member::property("Value", inner.clone(), Builtin::NullableValue),
                Member::method(
                    "GetValueOrDefault",
                    vec![
                        sig(vec![], inner.clone(), Builtin::GetValueOrDefault),
                        sig(vec![inner.clone()], inner, Builtin::GetValueOrDefault),
                    ],
                ),
            ]);
        }
        Type::String => members.extend(string_members()),
        Type::DateTime => members.extend(date_members(Type::DateTime)),
        Type::DateTimeOffset => {
            members.extend(date_members(Type::DateTimeOffset));
            members.extend([
                Member::property("Offset", Type::TimeSpan, Builtin::Offset),
                Member::property("DateTime", Type::DateTime, Builtin::LocalDateTime),
                Member::property("UtcDateTime", Type::DateTime, Builtin::UtcDateTime),
                Member::property("UtcTicks", Type::Int64, Builtin::UtcTicks),
            ]);
        }
        Type::TimeSpan => members.extend(span_members()),
        Type::Guid => members.push(method(
            "ToByteArray",
            vec![],
            Type::array_of(Type::Byte),
            Builtin::ToByteArray,
        )),
        Type::Array(_) => members.push(Member::property(
            "Length",
            Type::Int32,
            Builtin::ArrayLength,
        )),
        _ => {}
    }
    members
}

fn string_members() -> Vec<Member> {
    let string = || Type::String;
    vec![
        Member::property("Length", Type::Int32, Builtin::StringLength),
        method("ToUpper", vec![], string(), Builtin::ToUpper),
        method("ToLower", vec![], string(), Builtin::ToLower),
        method("Trim", vec![], string(), Builtin::Trim),
        Member::method(
            "Contains",
            vec![
                sig(vec![string()], Type::Boolean, Builtin::Contains),
                sig(vec![Type::Char], Type::Boolean, Builtin::Contains),
            ],
        ),
        method("StartsWith", vec![string()], Type::Boolean, Builtin::StartsWith),
        method("EndsWith", vec![string()], Type::Boolean, Builtin::EndsWith),
        Member::method(
            "Substring",
            vec![
                sig(vec![Type::Int32], string(), Builtin::Substring),
                sig(vec![Type::Int32, Type::Int32], string(), Builtin::Substring),
            ],
        ),
        Member::method(
            "IndexOf",
            vec![
                sig(vec![string()], Type::Int32, Builtin::IndexOf),
                sig(vec![Type::Char], Type::Int32, Builtin::IndexOf),
            ],
        ),
        Member::method(
            "Replace",
            vec![
                sig(vec![string(), string()], string(), Builtin::Replace),
                sig(vec![Type::Char, Type::Char], string(), Builtin::Replace),
            ],
        ),
    ]
}

/// Calendar members shared by DateTime and DateTimeOffset; arithmetic
/// returns the receiver's own type.
fn date_members(own: Type) -> Vec<Member> {
    let part = |name, part| Member::property(name, Type::Int32, Builtin::DatePart(part));
    let add = |name, unit| {
        method(
            name,
            vec![Type::Double],
            own.clone(),
            Builtin::AddTime(unit),
        )
    };
    vec![
        part("Year", DatePart::Year),
        part("Month", DatePart::Month),
        part("Day", DatePart::Day),
        part("Hour", DatePart::Hour),
        part("Minute", DatePart::Minute),
        part("Second", DatePart::Second),
        part("Millisecond", DatePart::Millisecond),
        part("DayOfYear", DatePart::DayOfYear),
        Member::property("Ticks", Type::Int64, Builtin::DatePart(DatePart::Ticks)),
        Member::property("DayOfWeek", Type::Enum(&DAY_OF_WEEK), Builtin::DayOfWeek),
        Member::property("Date", Type::DateTime, Builtin::Date),
        Member::property("TimeOfDay", Type::TimeSpan, Builtin::TimeOfDay),
        add("AddDays", TimeUnit::Days),
        add("AddHours", TimeUnit::Hours),
        add("AddMinutes", TimeUnit::Minutes),
        add("AddSeconds", TimeUnit::Seconds),
        add("AddMilliseconds", TimeUnit::Milliseconds),
        method("AddTicks", vec![Type::Int64], own.clone(), Builtin::AddTicks),
    ]
}

fn span_members() -> Vec<Member> {
    let part = |name, part| Member::property(name, Type::Int32, Builtin::SpanPart(part));
    let total = |name, unit| Member::property(name, Type::Double, Builtin::SpanTotal(unit));
    vec![
        Member::property("Ticks", Type::Int64, Builtin::SpanPart(SpanPart::Ticks)),
        part("Days", SpanPart::Days),
        part("Hours", SpanPart::Hours),
        part("Minutes", SpanPart::Minutes),
        part("Seconds", SpanPart::Seconds),
        part("Milliseconds", SpanPart::Milliseconds),
        total("TotalDays", TimeUnit::Days),
        total("TotalHours", TimeUnit::Hours),
        total("TotalMinutes", TimeUnit::Minutes),
        total("TotalSeconds", TimeUnit::Seconds),
        total("TotalMilliseconds", TimeUnit::Milliseconds),
    ]
}
