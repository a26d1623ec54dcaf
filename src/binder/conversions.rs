//! Implicit coercions and explicit conversions between types.

use super::{BindError, with_coercion};
use crate::{
    bound::{BoundExpr, BoundKind, Coercion, Conversion},
    types::{NumericKind, Type},
};

/// The coercion steps from `from` to `to`, innermost first, each with the
/// type it produces. `None` when no implicit conversion exists.
fn implicit_steps(from: &Type, to: &Type) -> Option<Vec<(Coercion, Type)>> {
    if from == to {
        return Some(vec![]);
    }
    if *from == Type::Null {
        return to
            .accepts_null()
            .then(|| vec![(Coercion::NullLiteral, to.clone())]);
    }
    if *to == Type::Object {
        return Some(vec![(Coercion::Box, Type::Object)]);
    }

    match (from, to) {
        (Type::Nullable(inner_from), Type::Nullable(inner_to)) => {
            let (source, target) = (inner_from.numeric_kind()?, inner_to.numeric_kind()?);
            source
                .widens_to(target)
                .then(|| vec![(Coercion::LiftedNumeric(target), to.clone())])
        }
        (value, Type::Nullable(inner)) if value.is_value_type() => {
            let mut steps = implicit_steps(value, inner)?;
            steps.push((Coercion::Wrap, to.clone()));
            Some(steps)
        }
        (Type::Array(source) | Type::Sequence(source), Type::Sequence(target))
        | (Type::Array(source), Type::Array(target)) => {
            let covariant = source.is_reference()
                && target.is_reference()
                && implicit_steps(source, target).is_some();
            (source == target || covariant).then(|| vec![(Coercion::Upcast, to.clone())])
        }
        _ => {
            let (source, target) = (from.numeric_kind()?, to.numeric_kind()?);
            source
                .widens_to(target)
                .then(|| vec![(Coercion::Numeric(target), to.clone())])
        }
    }
}

/// Whether a value of type `from` may be used where `to` is expected.
pub fn is_implicit(from: &Type, to: &Type) -> bool {
    implicit_steps(from, to).is_some()
}

/// Wraps `expr` in the coercions that turn it into a `to`. Hands the
/// expression back untouched when no implicit conversion exists.
pub fn coerce(expr: BoundExpr, to: &Type) -> Result<BoundExpr, BoundExpr> {
    match implicit_steps(&expr.ty, to) {
        Some(steps) => Ok(steps
            .into_iter()
            .fold(expr, |operand, (coercion, ty)| with_coercion(operand, coercion, ty))),
        None => Err(expr),
    }
}

fn convert(operand: BoundExpr, conversion: Conversion, ty: Type) -> BoundExpr {
    let kind = BoundKind::Convert {
        conversion,
        operand: Box::new(operand),
    };
    BoundExpr::new(kind, ty)
}

/// Plans a conversion call such as `int(x)`, `DayOfWeek(n)` or `long?(x)`.
///
/// Implicit coercions are preferred. Otherwise numeric and character types
/// convert to each other, enumerations convert to and from integral
/// values, nullable values unwrap, and `Object` unboxes. Anything else is
/// [`BindError::InvalidConversion`].
pub(super) fn explicit(
    operand: BoundExpr,
    target: &Type,
    offset: usize,
) -> Result<BoundExpr, BindError> {
    let operand = match coerce(operand, target) {
        Ok(coerced) => return Ok(coerced),
        Err(operand) => operand,
    };

    let from = operand.ty.clone();
    if from == Type::Object {
        return Ok(convert(operand, Conversion::Unbox(target.clone()), target.clone()));
    }

    let source = from.underlying().clone();
    let dest = target.underlying().clone();
    let lifted = from.is_nullable() && target.is_nullable();
    let lift = |ty: Type| if lifted { Type::nullable_of(ty) } else { ty };

    let mut operand = operand;
    if from.is_nullable() && !target.is_nullable() {
        operand = convert(operand, Conversion::Unwrap, source.clone());
    }
    if source == dest {
        return Ok(operand);
    }

    let converted = match (&source, &dest) {
        (Type::Enum(_), Type::Enum(ty)) => {
            let underlying = convert(operand, Conversion::FromEnum { lifted }, lift(Type::Int32));
            convert(
                underlying,
                Conversion::ToEnum { ty: *ty, lifted },
                lift(dest.clone()),
            )
        }
        (Type::Enum(_), numeric) if numeric.numeric_kind().is_some() => {
            let underlying = convert(operand, Conversion::FromEnum { lifted }, lift(Type::Int32));
            match numeric.numeric_kind() {
                Some(kind) if kind != NumericKind::Int32 => convert(
                    underlying,
                    Conversion::Numeric {
                        target: kind,
                        lifted,
                    },
                    lift(dest.clone()),
                ),
                _ => underlying,
            }
        }
        (numeric, Type::Enum(ty)) if numeric.numeric_kind().is_some() => convert(
            operand,
            Conversion::ToEnum { ty: *ty, lifted },
            lift(dest.clone()),
        ),
        (source_type, dest_type) => match (source_type.numeric_kind(), dest_type.numeric_kind()) {
            (Some(_), Some(kind)) => convert(
                operand,
                Conversion::Numeric {
                    target: kind,
                    lifted,
                },
                lift(dest.clone()),
            ),
            _ => {
                return Err(BindError::InvalidConversion {
                    from,
                    to: target.clone(),
                    offset,
                });
            }
        },
    };

    // `T` converted to `U`, then wrapped for a `U?` target
    if target.is_nullable() && !lifted {
        Ok(with_coercion(converted, Coercion::Wrap, target.clone()))
    } else {
        Ok(converted)
    }
}
