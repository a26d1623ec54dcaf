//! Operator typing: numeric promotion, lifting over nullable operands,
//! string concatenation and date/time arithmetic.

use super::{BindError, coerce};
use crate::{
    ast::{BinOp, UnaryOp},
    bound::{BinaryOperator, BoundExpr, BoundKind, Conversion, UnaryOperator},
    types::{NumericKind, Type},
};

/// The operand type both sides of a numeric operator are converted to.
///
/// Decimal does not mix with binary floating point, and UInt64 does not mix
/// with signed types.
pub(super) fn promote(left: NumericKind, right: NumericKind) -> Option<NumericKind> {
    use NumericKind::*;

    let either = |kind| left == kind || right == kind;
    let signed_integral = |kind: NumericKind| kind.is_signed() && kind.is_integral();

    if either(Decimal) {
        return (!either(Single) && !either(Double)).then_some(Decimal);
    }
    if either(Double) {
        return Some(Double);
    }
    if either(Single) {
        return Some(Single);
    }
    if either(UInt64) {
        return (!signed_integral(left) && !signed_integral(right)).then_some(UInt64);
    }
    if either(Int64) {
        return Some(Int64);
    }
    if either(UInt32) {
        if signed_integral(left) || signed_integral(right) {
            return Some(Int64);
        }
        return Some(UInt32);
    }
    Some(Int32)
}

/// Promotion for a single operand of `-` and `+`.
fn promote_unary(op: UnaryOp, kind: NumericKind) -> Option<NumericKind> {
    use NumericKind::*;

    match kind {
        Char | SByte | Byte | Int16 | UInt16 => Some(Int32),
        UInt32 if op == UnaryOp::Negate => Some(Int64),
        UInt64 if op == UnaryOp::Negate => None,
        other => Some(other),
    }
}

/// Enumeration operands take part in arithmetic as their underlying Int32.
fn enum_to_underlying(operand: BoundExpr) -> BoundExpr {
    let (lifted, ty) = match operand.ty.underlying() {
        Type::Enum(_) if operand.ty.is_nullable() => (true, Type::nullable_of(Type::Int32)),
        Type::Enum(_) => (false, Type::Int32),
        _ => return operand,
    };
    let kind = BoundKind::Convert {
        conversion: Conversion::FromEnum { lifted },
        operand: Box::new(operand),
    };
    BoundExpr::new(kind, ty)
}

fn lift_to(ty: &Type, lifted: bool) -> Type {
    if lifted {
        Type::nullable_of(ty.clone())
    } else {
        ty.clone()
    }
}

pub(super) fn unary(op: UnaryOp, operand: BoundExpr, offset: usize) -> Result<BoundExpr, BindError> {
    let invalid = |ty: &Type| BindError::InvalidOperand {
        op: op.to_string(),
        ty: ty.clone(),
        offset,
    };
    let lifted = operand.ty.is_nullable();
    let underlying = operand.ty.underlying().clone();

    let (bound_op, operand_ty) = match op {
        UnaryOp::Not if underlying == Type::Boolean => (UnaryOperator::Not, Type::Boolean),
        UnaryOp::Not => return Err(invalid(&operand.ty)),
        UnaryOp::Negate if underlying == Type::TimeSpan => (UnaryOperator::Negate, Type::TimeSpan),
        UnaryOp::Negate | UnaryOp::Plus => {
            let kind = underlying
                .numeric_kind()
                .and_then(|kind| promote_unary(op, kind))
                .ok_or_else(|| invalid(&operand.ty))?;
            let bound_op = if op == UnaryOp::Negate {
                UnaryOperator::Negate
            } else {
                UnaryOperator::Plus
            };
            (bound_op, kind.ty())
        }
    };

    let target = lift_to(&operand_ty, lifted);
    let operand = coerce(operand, &target).map_err(|operand| invalid(&operand.ty))?;
    let kind = BoundKind::Unary {
        op: bound_op,
        operand: Box::new(operand),
        lifted,
    };
    Ok(BoundExpr::new(kind, target))
}

fn bound_operator(op: BinOp) -> BinaryOperator {
    match op {
        BinOp::Equal => BinaryOperator::Equal,
        BinOp::NotEqual => BinaryOperator::NotEqual,
        BinOp::LessThan => BinaryOperator::LessThan,
        BinOp::GreaterThan => BinaryOperator::GreaterThan,
        BinOp::LessEqual => BinaryOperator::LessEqual,
        BinOp::GreaterEqual => BinaryOperator::GreaterEqual,
        BinOp::Add => BinaryOperator::Add,
        BinOp::Subtract => BinaryOperator::Subtract,
        BinOp::Multiply => BinaryOperator::Multiply,
        BinOp::Divide => BinaryOperator::Divide,
        BinOp::Modulo => BinaryOperator::Modulo,
        BinOp::And => BinaryOperator::And,
        // `??` is bound by `coalesce`
        BinOp::Or | BinOp::NullCoalesce => BinaryOperator::Or,
    }
}

fn binary_node(
    op: BinaryOperator,
    left: BoundExpr,
    right: BoundExpr,
    lifted: bool,
    ty: Type,
) -> BoundExpr {
    let kind = BoundKind::Binary {
        op,
        left: Box::new(left),
        right: Box::new(right),
        lifted,
    };
    BoundExpr::new(kind, ty)
}

/// Converts both operands to `operand_ty` (nullable when `lifted`).
fn coerce_both(
    left: BoundExpr,
    right: BoundExpr,
    operand_ty: &Type,
    lifted: bool,
) -> Result<(BoundExpr, BoundExpr), (BoundExpr, BoundExpr)> {
    let target = lift_to(operand_ty, lifted);
    match (coerce(left, &target), coerce(right, &target)) {
        (Ok(left), Ok(right)) => Ok((left, right)),
        (left, right) => Err((left.unwrap_or_else(|e| e), right.unwrap_or_else(|e| e))),
    }
}

pub(super) fn binary(
    op: BinOp,
    left: BoundExpr,
    right: BoundExpr,
    offset: usize,
) -> Result<BoundExpr, BindError> {
    let incompatible = |left: &BoundExpr, right: &BoundExpr| BindError::IncompatibleOperands {
        op: op.symbol().to_string(),
        left: left.ty.clone(),
        right: right.ty.clone(),
        offset,
    };
    let bound_op = bound_operator(op);

    match op {
        BinOp::And | BinOp::Or => {
            if left.ty != Type::Boolean || right.ty != Type::Boolean {
                return Err(incompatible(&left, &right));
            }
            return Ok(binary_node(bound_op, left, right, false, Type::Boolean));
        }
        BinOp::Add if left.ty == Type::String || right.ty == Type::String => {
            return Ok(binary_node(
                BinaryOperator::Concat,
                left,
                right,
                false,
                Type::String,
            ));
        }
        BinOp::Equal | BinOp::NotEqual => return equality(op, left, right, offset),
        _ => {}
    }

    let lifted = left.ty.is_nullable() || right.ty.is_nullable();
    let (lu, ru) = (left.ty.underlying().clone(), right.ty.underlying().clone());

    // Date and time arithmetic
    let temporal = match (op, &lu, &ru) {
        (BinOp::Add | BinOp::Subtract, Type::DateTime, Type::TimeSpan) => {
            Some((Type::DateTime, Type::TimeSpan, Type::DateTime))
        }
        (BinOp::Add | BinOp::Subtract, Type::DateTimeOffset, Type::TimeSpan) => Some((
            Type::DateTimeOffset,
            Type::TimeSpan,
            Type::DateTimeOffset,
        )),
        (BinOp::Subtract, Type::DateTime, Type::DateTime) => {
            Some((Type::DateTime, Type::DateTime, Type::TimeSpan))
        }
        (BinOp::Subtract, Type::DateTimeOffset, Type::DateTimeOffset) => Some((
            Type::DateTimeOffset,
            Type::DateTimeOffset,
            Type::TimeSpan,
        )),
        (BinOp::Add | BinOp::Subtract, Type::TimeSpan, Type::TimeSpan) => {
            Some((Type::TimeSpan, Type::TimeSpan, Type::TimeSpan))
        }
        _ => None,
    };
    if let Some((left_ty, right_ty, result)) = temporal {
        let left = coerce(left, &lift_to(&left_ty, lifted)).map_err(|l| incompatible(&l, &right))?;
        let right =
            coerce(right, &lift_to(&right_ty, lifted)).map_err(|r| incompatible(&left, &r))?;
        return Ok(binary_node(bound_op, left, right, lifted, lift_to(&result, lifted)));
    }

    if op.is_comparison() {
        return relational(op, left, right, lifted, offset);
    }

    // Arithmetic
    let left = enum_to_underlying(left);
    let right = enum_to_underlying(right);
    let kind = match (left.ty.underlying().numeric_kind(), right.ty.underlying().numeric_kind()) {
        (Some(l), Some(r)) => promote(l, r),
        _ => None,
    }
    .ok_or_else(|| incompatible(&left, &right))?;

    let operand_ty = kind.ty();
    let (left, right) = coerce_both(left, right, &operand_ty, lifted)
        .map_err(|(left, right)| incompatible(&left, &right))?;
    Ok(binary_node(bound_op, left, right, lifted, lift_to(&operand_ty, lifted)))
}

fn relational(
    op: BinOp,
    left: BoundExpr,
    right: BoundExpr,
    lifted: bool,
    offset: usize,
) -> Result<BoundExpr, BindError> {
    let incompatible = |left: &BoundExpr, right: &BoundExpr| BindError::IncompatibleOperands {
        op: op.symbol().to_string(),
        left: left.ty.clone(),
        right: right.ty.clone(),
        offset,
    };
    let (lu, ru) = (left.ty.underlying().clone(), right.ty.underlying().clone());

    let operand_ty = match (lu.numeric_kind(), ru.numeric_kind()) {
        (Some(l), Some(r)) => promote(l, r).map(NumericKind::ty),
        _ if lu == ru
            && matches!(
                lu,
                Type::String
                    | Type::DateTime
                    | Type::DateTimeOffset
                    | Type::TimeSpan
                    | Type::Enum(_)
            ) =>
        {
            Some(lu)
        }
        _ => None,
    }
    .ok_or_else(|| incompatible(&left, &right))?;

    let (left, right) = coerce_both(left, right, &operand_ty, lifted)
        .map_err(|(left, right)| incompatible(&left, &right))?;
    Ok(binary_node(bound_operator(op), left, right, lifted, Type::Boolean))
}

fn equality(
    op: BinOp,
    left: BoundExpr,
    right: BoundExpr,
    offset: usize,
) -> Result<BoundExpr, BindError> {
    let incompatible = |left: &BoundExpr, right: &BoundExpr| BindError::IncompatibleOperands {
        op: op.symbol().to_string(),
        left: left.ty.clone(),
        right: right.ty.clone(),
        offset,
    };
    let op = bound_operator(op);

    // Comparing against the null literal
    if left.is_null_literal() || right.is_null_literal() {
        let (null, other) = if left.is_null_literal() {
            (left, right)
        } else {
            (right, left)
        };
        if !other.ty.accepts_null() {
            return Err(incompatible(&other, &null));
        }
        let target = other.ty.clone();
        let null = coerce(null, &target).map_err(|null| incompatible(&other, &null))?;
        return Ok(binary_node(op, other, null, false, Type::Boolean));
    }

    let lifted = left.ty.is_nullable() || right.ty.is_nullable();
    let (lu, ru) = (left.ty.underlying().clone(), right.ty.underlying().clone());

    let operand_ty = match (lu.numeric_kind(), ru.numeric_kind()) {
        (Some(l), Some(r)) => promote(l, r).map(NumericKind::ty),
        _ if lu == ru => Some(lu),
        _ if lu == Type::Object || ru == Type::Object => Some(Type::Object),
        _ => None,
    }
    .ok_or_else(|| incompatible(&left, &right))?;

    let lifted = lifted && operand_ty.is_value_type();
    let (left, right) = coerce_both(left, right, &operand_ty, lifted)
        .map_err(|(left, right)| incompatible(&left, &right))?;
    Ok(binary_node(op, left, right, lifted, Type::Boolean))
}

/// `left ?? right`
pub(super) fn coalesce(
    left: BoundExpr,
    right: BoundExpr,
    offset: usize,
) -> Result<BoundExpr, BindError> {
    let node = |left: BoundExpr, right: BoundExpr, ty: Type| {
        let kind = BoundKind::Coalesce {
            left: Box::new(left),
            right: Box::new(right),
        };
        BoundExpr::new(kind, ty)
    };

    if left.is_null_literal() {
        let ty = right.ty.clone();
        return Ok(node(left, right, ty));
    }
    if !left.ty.accepts_null() {
        return Err(BindError::NotNullable {
            ty: left.ty,
            offset,
        });
    }

    // `int? ?? int` is an int; `int? ?? int?` stays nullable
    let underlying = left.ty.underlying().clone();
    let right = match coerce(right, &underlying) {
        Ok(right) => return Ok(node(left, right, underlying)),
        Err(right) => right,
    };
    let right = match coerce(right, &left.ty) {
        Ok(right) => {
            let ty = left.ty.clone();
            return Ok(node(left, right, ty));
        }
        Err(right) => right,
    };

    // A reference left operand widens to the right's type
    let target = right.ty.clone();
    match coerce(left, &target) {
        Ok(left) if target.accepts_null() => Ok(node(left, right, target)),
        Ok(left) | Err(left) => Err(BindError::TypeMismatch {
            expected: left.ty.underlying().clone(),
            found: right.ty,
            offset,
        }),
    }
}
