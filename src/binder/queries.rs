//! Query operators over arrays and sequences.

use super::{BindError, Binder, coerce};
use crate::{
    ast::{Expr, Ident},
    bound::{BoundExpr, BoundKind, QueryMethod},
    catalog::members::QUERY_OPERATORS,
    types::{NumericKind, Type},
};

/// Element types `Sum` and `Average` accept, in the order they are tried.
const AGGREGATE_KINDS: [NumericKind; 5] = [
    NumericKind::Int32,
    NumericKind::Int64,
    NumericKind::Single,
    NumericKind::Double,
    NumericKind::Decimal,
];

pub(super) fn is_query_operator(name: &str) -> bool {
    canonical_name(name).is_some()
}

fn canonical_name(name: &str) -> Option<&'static str> {
    QUERY_OPERATORS
        .iter()
        .map(|(operator, _)| *operator)
        .find(|operator| operator.eq_ignore_ascii_case(name))
}

fn check_arity(name: &Ident, allowed: &[usize], found: usize) -> Result<(), BindError> {
    if allowed.contains(&found) {
        return Ok(());
    }
    Err(BindError::WrongArity {
        name: name.name.clone(),
        expected: allowed
            .iter()
            .map(usize::to_string)
            .collect::<Vec<_>>()
            .join(" or "),
        found,
        offset: name.offset,
    })
}

fn aggregate_kind(ty: &Type) -> Option<NumericKind> {
    AGGREGATE_KINDS
        .into_iter()
        .find(|kind| super::is_implicit(ty, &kind.ty()))
}

impl Binder<'_> {
    fn bind_predicate(&mut self, arg: &Expr, element: &Type) -> Result<BoundExpr, BindError> {
        let predicate = self.bind_lambda(arg, element)?;
        if predicate.ty != Type::Boolean {
            return Err(BindError::TypeMismatch {
                expected: Type::Boolean,
                found: predicate.ty,
                offset: arg.offset(),
            });
        }
        Ok(predicate)
    }

    /// The optional selector of `Sum`, `Min` and friends; without one the
    /// element itself is the value.
    fn bind_selector(
        &mut self,
        args: &[Expr],
        element: &Type,
    ) -> Result<BoundExpr, BindError> {
        match args.first() {
            Some(arg) => self.bind_lambda(arg, element),
            None => Ok(BoundExpr::new(
                BoundKind::Parameter { depth: 0 },
                element.clone(),
            )),
        }
    }

    pub(super) fn bind_query(
        &mut self,
        source: BoundExpr,
        lookup: &Type,
        name: &Ident,
        args: &[Expr],
        null_conditional: bool,
    ) -> Result<BoundExpr, BindError> {
        let element = lookup.element_type().cloned().unwrap_or(Type::Object);
        let operator = canonical_name(&name.name).unwrap_or_default();
        let sequence = || Type::sequence_of(element.clone());

        let mut lambda = None;
        let mut extra = Vec::new();

        let (method, ty) = match operator {
            "Select" => {
                check_arity(name, &[1], args.len())?;
                let selector = self.bind_lambda(&args[0], &element)?;
                let ty = Type::sequence_of(selector.ty.clone());
                lambda = Some(selector);
                (QueryMethod::Select, ty)
            }
            "Where" => {
                check_arity(name, &[1], args.len())?;
                lambda = Some(self.bind_predicate(&args[0], &element)?);
                (QueryMethod::Where, sequence())
            }
            "OrderBy" | "OrderByDescending" => {
                check_arity(name, &[1], args.len())?;
                let key = self.bind_lambda(&args[0], &element)?;
                if !key.ty.underlying().is_ordered() {
                    return Err(BindError::InvalidOperand {
                        op: operator.to_string(),
                        ty: key.ty,
                        offset: name.offset,
                    });
                }
                lambda = Some(key);
                let descending = operator == "OrderByDescending";
                (QueryMethod::OrderBy { descending }, sequence())
            }
            "ToArray" => {
                check_arity(name, &[0], args.len())?;
                (QueryMethod::ToArray, Type::array_of(element.clone()))
            }
            "Count" | "Any" => {
                check_arity(name, &[0, 1], args.len())?;
                if let Some(arg) = args.first() {
                    lambda = Some(self.bind_predicate(arg, &element)?);
                }
                if operator == "Count" {
                    (QueryMethod::Count, Type::Int32)
                } else {
                    (QueryMethod::Any, Type::Boolean)
                }
            }
            "All" => {
                check_arity(name, &[1], args.len())?;
                lambda = Some(self.bind_predicate(&args[0], &element)?);
                (QueryMethod::All, Type::Boolean)
            }
            "First" | "FirstOrDefault" | "Last" | "LastOrDefault" => {
                check_arity(name, &[0, 1], args.len())?;
                if let Some(arg) = args.first() {
                    lambda = Some(self.bind_predicate(arg, &element)?);
                }
                let default = element.default_value();
                let method = match operator {
                    "First" => QueryMethod::First,
                    "Last" => QueryMethod::Last,
                    "FirstOrDefault" => QueryMethod::FirstOrDefault { default },
                    _ => QueryMethod::LastOrDefault { default },
                };
                (method, element.clone())
            }
            "Sum" | "Average" => {
                check_arity(name, &[0, 1], args.len())?;
                let selector = self.bind_selector(args, &element)?;
                let kind = aggregate_kind(&selector.ty).ok_or_else(|| {
                    BindError::InvalidOperand {
                        op: operator.to_string(),
                        ty: selector.ty.clone(),
                        offset: name.offset,
                    }
                })?;
                let selector = coerce(selector, &kind.ty()).map_err(|selector| {
                    BindError::TypeMismatch {
                        expected: kind.ty(),
                        found: selector.ty,
                        offset: name.offset,
                    }
                })?;
                lambda = Some(selector);
                if operator == "Sum" {
                    (QueryMethod::Sum(kind), kind.ty())
                } else {
                    let result = match kind {
                        NumericKind::Int32 | NumericKind::Int64 => Type::Double,
                        other => other.ty(),
                    };
                    (QueryMethod::Average(kind), result)
                }
            }
            "Min" | "Max" => {
                check_arity(name, &[0, 1], args.len())?;
                let selector = self.bind_selector(args, &element)?;
                if !selector.ty.underlying().is_ordered() {
                    return Err(BindError::InvalidOperand {
                        op: operator.to_string(),
                        ty: selector.ty,
                        offset: name.offset,
                    });
                }
                let ty = selector.ty.clone();
                lambda = Some(selector);
                let method = if operator == "Min" {
                    QueryMethod::Min
                } else {
                    QueryMethod::Max
                };
                (method, ty)
            }
            "Contains" => {
                check_arity(name, &[1], args.len())?;
                let value = self.bind_expr(&args[0], false)?;
                let value = coerce(value, &element).map_err(|value| BindError::TypeMismatch {
                    expected: element.clone(),
                    found: value.ty,
                    offset: args[0].offset(),
                })?;
                extra.push(value);
                (QueryMethod::Contains, Type::Boolean)
            }
            "Take" | "Skip" => {
                check_arity(name, &[1], args.len())?;
                let count = self.bind_expr(&args[0], false)?;
                let count = coerce(count, &Type::Int32).map_err(|count| BindError::TypeMismatch {
                    expected: Type::Int32,
                    found: count.ty,
                    offset: args[0].offset(),
                })?;
                extra.push(count);
                let method = if operator == "Take" {
                    QueryMethod::Take
                } else {
                    QueryMethod::Skip
                };
                (method, sequence())
            }
            "Distinct" | "Reverse" => {
                check_arity(name, &[0], args.len())?;
                let method = if operator == "Distinct" {
                    QueryMethod::Distinct
                } else {
                    QueryMethod::Reverse
                };
                (method, sequence())
            }
            _ => {
                return Err(BindError::UnknownMember {
                    member: name.name.clone(),
                    ty: lookup.to_string(),
                    offset: name.offset,
                });
            }
        };

        let ty = if null_conditional { ty.nullable() } else { ty };
        let kind = BoundKind::Query {
            method,
            source: Box::new(source),
            lambda: lambda.map(Box::new),
            args: extra,
            null_conditional,
        };
        Ok(BoundExpr::new(kind, ty))
    }
}
