//! Static types of the expression language.
//!
//! Every bound node carries a [`Type`]. The set mirrors the primitive and
//! date/time types of the host type system the language was designed against,
//! plus nullable wrappers, arrays, lazily produced sequences and the
//! anonymous record types created by `new(... as Name)`.

use std::{fmt, sync::Arc};

/// The numeric types, including `Char`, which takes part in numeric
/// promotion and conversions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NumericKind {
    Char,
    SByte,
    Byte,
    Int16,
    UInt16,
    Int32,
    UInt32,
    Int64,
    UInt64,
    Single,
    Double,
    Decimal,
}

impl NumericKind {
    pub const ALL: [NumericKind; 12] = [
        NumericKind::Char,
        NumericKind::SByte,
        NumericKind::Byte,
        NumericKind::Int16,
        NumericKind::UInt16,
        NumericKind::Int32,
        NumericKind::UInt32,
        NumericKind::Int64,
        NumericKind::UInt64,
        NumericKind::Single,
        NumericKind::Double,
        NumericKind::Decimal,
    ];

    pub fn ty(self) -> Type {
        match self {
            NumericKind::Char => Type::Char,
            NumericKind::SByte => Type::SByte,
            NumericKind::Byte => Type::Byte,
            NumericKind::Int16 => Type::Int16,
            NumericKind::UInt16 => Type::UInt16,
            NumericKind::Int32 => Type::Int32,
            NumericKind::UInt32 => Type::UInt32,
            NumericKind::Int64 => Type::Int64,
            NumericKind::UInt64 => Type::UInt64,
            NumericKind::Single => Type::Single,
            NumericKind::Double => Type::Double,
            NumericKind::Decimal => Type::Decimal,
        }
    }

    pub fn is_integral(self) -> bool {
        !matches!(
            self,
            NumericKind::Single | NumericKind::Double | NumericKind::Decimal
        )
    }

    pub fn is_signed(self) -> bool {
        matches!(
            self,
            NumericKind::SByte
                | NumericKind::Int16
                | NumericKind::Int32
                | NumericKind::Int64
                | NumericKind::Single
                | NumericKind::Double
                | NumericKind::Decimal
        )
    }

    /// Implicit (lossless or precision-only) numeric conversion.
    pub fn widens_to(self, target: NumericKind) -> bool {
        use NumericKind::*;

        if self == target {
            return true;
        }
        match self {
            SByte => matches!(target, Int16 | Int32 | Int64 | Single | Double | Decimal),
            Byte => matches!(
                target,
                Int16 | UInt16 | Int32 | UInt32 | Int64 | UInt64 | Single | Double | Decimal
            ),
            Int16 => matches!(target, Int32 | Int64 | Single | Double | Decimal),
            UInt16 | Char => matches!(
                target,
                UInt16 | Int32 | UInt32 | Int64 | UInt64 | Single | Double | Decimal
            ),
            Int32 => matches!(target, Int64 | Single | Double | Decimal),
            UInt32 => matches!(target, Int64 | UInt64 | Single | Double | Decimal),
            Int64 | UInt64 => matches!(target, Single | Double | Decimal),
            Single => target == Double,
            Double | Decimal => false,
        }
    }
}

impl fmt::Display for NumericKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.ty().fmt(f)
    }
}

/// A closed enumeration type with an `Int32` underlying representation.
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct EnumType {
    pub name: &'static str,
    pub members: &'static [(&'static str, i32)],
}

impl EnumType {
    pub fn member_name(&self, value: i32) -> Option<&'static str> {
        self.members
            .iter()
            .find(|(_, v)| *v == value)
            .map(|(name, _)| *name)
    }

    pub fn member_value(&self, name: &str) -> Option<i32> {
        self.members
            .iter()
            .find(|(member, _)| member.eq_ignore_ascii_case(name))
            .map(|(_, v)| *v)
    }
}

pub static DAY_OF_WEEK: EnumType = EnumType {
    name: "DayOfWeek",
    members: &[
        ("Sunday", 0),
        ("Monday", 1),
        ("Tuesday", 2),
        ("Wednesday", 3),
        ("Thursday", 4),
        ("Friday", 5),
        ("Saturday", 6),
    ],
};

/// A field of an anonymous record, in declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RecordField {
    pub name: String,
    pub ty: Type,
}

/// The synthetic type of a `new(expr as Name, ...)` literal. Two records
/// with the same field names, types and order are the same type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RecordType {
    pub fields: Vec<RecordField>,
}

impl RecordType {
    pub fn new(fields: Vec<RecordField>) -> Self {
        RecordType { fields }
    }

    /// Case-insensitive field lookup.
    pub fn field_index(&self, name: &str) -> Option<usize> {
        let folded = name.to_lowercase();
        self.fields
            .iter()
            .position(|field| field.name.to_lowercase() == folded)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    /// The type of the `null` literal before it is given a target type
    Null,
    Object,
    Boolean,
    Char,
    SByte,
    Byte,
    Int16,
    UInt16,
    Int32,
    UInt32,
    Int64,
    UInt64,
    Single,
    Double,
    Decimal,
    String,
    DateTime,
    DateTimeOffset,
    TimeSpan,
    Guid,
    Enum(&'static EnumType),
    Nullable(Box<Type>),
    Array(Box<Type>),
    /// Lazily produced elements, the result of query operators such as `Select`
    Sequence(Box<Type>),
    Record(Arc<RecordType>),
}

impl Type {
    pub fn nullable_of(inner: Type) -> Type {
        inner.nullable()
    }

    pub fn array_of(element: Type) -> Type {
        Type::Array(Box::new(element))
    }

    pub fn sequence_of(element: Type) -> Type {
        Type::Sequence(Box::new(element))
    }

    pub fn numeric_kind(&self) -> Option<NumericKind> {
        let kind = match self {
            Type::Char => NumericKind::Char,
            Type::SByte => NumericKind::SByte,
            Type::Byte => NumericKind::Byte,
            Type::Int16 => NumericKind::Int16,
            Type::UInt16 => NumericKind::UInt16,
            Type::Int32 => NumericKind::Int32,
            Type::UInt32 => NumericKind::UInt32,
            Type::Int64 => NumericKind::Int64,
            Type::UInt64 => NumericKind::UInt64,
            Type::Single => NumericKind::Single,
            Type::Double => NumericKind::Double,
            Type::Decimal => NumericKind::Decimal,
            _ => return None,
        };
        Some(kind)
    }

    /// Numeric types proper; `Char` converts like a number but is not one.
    pub fn is_numeric(&self) -> bool {
        self.numeric_kind()
            .is_some_and(|kind| kind != NumericKind::Char)
    }

    /// Types whose values may be `null` without a nullable wrapper.
    pub fn is_reference(&self) -> bool {
        matches!(
            self,
            Type::Null
                | Type::Object
                | Type::String
                | Type::Array(_)
                | Type::Sequence(_)
                | Type::Record(_)
        )
    }

    pub fn is_nullable(&self) -> bool {
        matches!(self, Type::Nullable(_))
    }

    pub fn is_value_type(&self) -> bool {
        !self.is_reference() && !self.is_nullable()
    }

    pub fn accepts_null(&self) -> bool {
        self.is_reference() || self.is_nullable()
    }

    /// `T` for `Nullable<T>`, the type itself otherwise.
    pub fn underlying(&self) -> &Type {
        match self {
            Type::Nullable(inner) => inner,
            other => other,
        }
    }

    /// `Nullable<T>` for value types; reference and nullable types are
    /// returned unchanged.
    pub fn nullable(self) -> Type {
        if self.is_value_type() {
            Type::Nullable(Box::new(self))
        } else {
            self
        }
    }

    pub fn element_type(&self) -> Option<&Type> {
        match self {
            Type::Array(element) | Type::Sequence(element) => Some(element),
            _ => None,
        }
    }

    pub fn is_enumerable(&self) -> bool {
        self.element_type().is_some()
    }

    /// Types with a total order usable by `<`, `OrderBy`, `Min` and `Max`.
    pub fn is_ordered(&self) -> bool {
        self.numeric_kind().is_some()
            || matches!(
                self,
                Type::String
                    | Type::DateTime
                    | Type::DateTimeOffset
                    | Type::TimeSpan
                    | Type::Enum(_)
                    | Type::Boolean
                    | Type::Guid
            )
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Null => f.write_str("null"),
            Type::Object => f.write_str("Object"),
            Type::Boolean => f.write_str("Boolean"),
            Type::Char => f.write_str("Char"),
            Type::SByte => f.write_str("SByte"),
            Type::Byte => f.write_str("Byte"),
            Type::Int16 => f.write_str("Int16"),
            Type::UInt16 => f.write_str("UInt16"),
            Type::Int32 => f.write_str("Int32"),
            Type::UInt32 => f.write_str("UInt32"),
            Type::Int64 => f.write_str("Int64"),
            Type::UInt64 => f.write_str("UInt64"),
            Type::Single => f.write_str("Single"),
            Type::Double => f.write_str("Double"),
            Type::Decimal => f.write_str("Decimal"),
            Type::String => f.write_str("String"),
            Type::DateTime => f.write_str("DateTime"),
            Type::DateTimeOffset => f.write_str("DateTimeOffset"),
            Type::TimeSpan => f.write_str("TimeSpan"),
            Type::Guid => f.write_str("Guid"),
            Type::Enum(e) => f.write_str(e.name),
            Type::Nullable(inner) => write!(f, "Nullable<{}>", inner),
            Type::Array(element) => write!(f, "{}[]", element),
            Type::Sequence(element) => write!(f, "IEnumerable<{}>", element),
            Type::Record(record) => {
                if record.fields.is_empty() {
                    return f.write_str("{ }");
                }
                f.write_str("{ ")?;
                for (i, field) in record.fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}: {}", field.name, field.ty)?;
                }
                f.write_str(" }")
            }
        }
    }
}

#[test]
fn test_widening_table() {
    assert!(NumericKind::Int32.widens_to(NumericKind::Int64));
    assert!(NumericKind::Int32.widens_to(NumericKind::Single));
    assert!(NumericKind::Char.widens_to(NumericKind::Int32));
    assert!(!NumericKind::Int32.widens_to(NumericKind::Char));
    assert!(!NumericKind::Int64.widens_to(NumericKind::Int32));
    assert!(!NumericKind::Single.widens_to(NumericKind::Decimal));
    assert!(!NumericKind::SByte.widens_to(NumericKind::UInt32));
}

#[test]
fn test_type_names() {
    assert_eq!(Type::nullable_of(Type::Int64).to_string(), "Nullable<Int64>");
    assert_eq!(Type::array_of(Type::Int32).to_string(), "Int32[]");
    assert_eq!(Type::sequence_of(Type::Double).to_string(), "IEnumerable<Double>");
    assert_eq!(Type::Enum(&DAY_OF_WEEK).to_string(), "DayOfWeek");
    assert_eq!(Type::String.nullable(), Type::String);
}
