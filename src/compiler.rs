//! Lowers a bound expression tree into a tree of closures.
//!
//! Every node becomes a [`Step`]: a shared closure from the parameter
//! environment to a value. Steps capture their children and any constant
//! data (literal values, precompiled patterns) when the tree is compiled,
//! so a call walks no syntax and inspects no types.

use std::{fmt, sync::Arc};

use regex::Regex;

use crate::{
    bound::{BinaryOperator, BoundExpr, BoundKind, Coercion, Conversion, QueryMethod},
    catalog::Builtin,
    runtime::{
        Env, EvalResult, EvaluationFault, builtins, compare, numeric,
        sequences::{self, Lambda},
    },
    types::{NumericKind, Type},
    value::{EnumValue, Record, Value},
};

pub type Step = Arc<dyn Fn(&Env<'_>) -> EvalResult + Send + Sync>;

fn step<F>(f: F) -> Step
where
    F: Fn(&Env<'_>) -> EvalResult + Send + Sync + 'static,
{
    Arc::new(f)
}

/// A compiled expression: call it with a stage input to get the output.
///
/// Cloning is cheap and the function holds no mutable state, so one
/// instance can be shared across threads.
#[derive(Clone)]
pub struct CompiledFunction {
    step: Step,
    input: Type,
    output: Type,
}

impl fmt::Debug for CompiledFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledFunction")
            .field("input", &self.input)
            .field("output", &self.output)
            .finish_non_exhaustive()
    }
}

impl CompiledFunction {
    pub fn call(&self, input: &Value) -> EvalResult {
        (self.step)(&Env::root(input))
    }

    pub fn input_type(&self) -> &Type {
        &self.input
    }

    pub fn output_type(&self) -> &Type {
        &self.output
    }
}

pub fn compile(expr: BoundExpr, input: Type) -> CompiledFunction {
    let output = expr.ty.clone();
    CompiledFunction {
        step: lower(expr),
        input,
        output,
    }
}

fn lower(expr: BoundExpr) -> Step {
    match expr.kind {
        BoundKind::Constant(value) => step(move |_| Ok(value.clone())),
        BoundKind::Parameter { depth } => step(move |env| {
            env.lookup(depth)
                .cloned()
                .ok_or_else(|| EvaluationFault::Internal(format!("no parameter at depth {depth}")))
        }),
        BoundKind::Coerce { coercion, operand } => lower_coercion(coercion, *operand),
        BoundKind::Convert {
            conversion,
            operand,
        } => lower_conversion(conversion, *operand),
        BoundKind::Unary {
            op,
            operand,
            lifted,
        } => {
            let operand = lower(*operand);
            step(move |env| {
                let value = operand(env)?;
                if lifted && value.is_null() {
                    return Ok(Value::Null);
                }
                numeric::unary(op, &value)
            })
        }
        BoundKind::Binary {
            op,
            left,
            right,
            lifted,
        } => lower_binary(op, lower(*left), lower(*right), lifted),
        BoundKind::Coalesce { left, right } => {
            let (left, right) = (lower(*left), lower(*right));
            step(move |env| match left(env)? {
                Value::Null => right(env),
                value => Ok(value),
            })
        }
        BoundKind::Conditional {
            condition,
            when_true,
            when_false,
        } => {
            let condition = lower(*condition);
            let (when_true, when_false) = (lower(*when_true), lower(*when_false));
            step(move |env| match condition(env)? {
                Value::Boolean(true) => when_true(env),
                Value::Boolean(false) => when_false(env),
                other => Err(EvaluationFault::unexpected(&other, "condition")),
            })
        }
        BoundKind::Call {
            builtin,
            args,
            null_conditional,
        } => lower_call(builtin, args, null_conditional),
        BoundKind::Field {
            receiver,
            index,
            null_conditional,
        } => {
            let receiver = lower(*receiver);
            step(move |env| match receiver(env)? {
                Value::Record(record) => record
                    .values
                    .get(index)
                    .cloned()
                    .ok_or_else(|| EvaluationFault::Internal(format!("no field {index}"))),
                Value::Null if null_conditional => Ok(Value::Null),
                Value::Null => Err(EvaluationFault::NullReference {
                    member: format!("field {index}"),
                }),
                other => Err(EvaluationFault::unexpected(&other, "field access")),
            })
        }
        BoundKind::Index {
            receiver,
            index,
            null_conditional,
        } => {
            let (receiver, index) = (lower(*receiver), lower(*index));
            step(move |env| {
                let target = receiver(env)?;
                if target.is_null() {
                    return if null_conditional {
                        Ok(Value::Null)
                    } else {
                        Err(EvaluationFault::NullReference {
                            member: "indexer".to_string(),
                        })
                    };
                }
                let position = index(env)?;
                element_at(target, &position)
            })
        }
        BoundKind::Query {
            method,
            source,
            lambda,
            args,
            null_conditional,
        } => lower_query(
            method,
            lower(*source),
            lambda.map(|lambda| lower(*lambda)),
            args.into_iter().map(lower).collect(),
            null_conditional,
        ),
        BoundKind::NewArray { elements } => {
            let elements: Vec<Step> = elements.into_iter().map(lower).collect();
            step(move |env| {
                elements
                    .iter()
                    .map(|element| element(env))
                    .collect::<Result<_, _>>()
                    .map(Value::Array)
            })
        }
        BoundKind::NewRecord { ty, fields } => {
            let fields: Vec<Step> = fields.into_iter().map(lower).collect();
            step(move |env| {
                let values = fields
                    .iter()
                    .map(|field| field(env))
                    .collect::<Result<_, _>>()?;
                Ok(Value::Record(Record {
                    ty: Arc::clone(&ty),
                    values,
                }))
            })
        }
    }
}

fn lower_coercion(coercion: Coercion, operand: BoundExpr) -> Step {
    let inner = lower(operand);
    match coercion {
        Coercion::Numeric(kind) => step(move |env| numeric::cast(&inner(env)?, kind)),
        Coercion::LiftedNumeric(kind) => step(move |env| match inner(env)? {
            Value::Null => Ok(Value::Null),
            value => numeric::cast(&value, kind),
        }),
        _ => inner,
    }
}

/// Null handling shared by the conversions: lifted conversions pass `null`
/// through, the others fault on it.
fn non_null(value: Value, lifted: bool) -> Result<Option<Value>, EvaluationFault> {
    match value {
        Value::Null if lifted => Ok(None),
        Value::Null => Err(EvaluationFault::NullValue),
        value => Ok(Some(value)),
    }
}

fn lower_conversion(conversion: Conversion, operand: BoundExpr) -> Step {
    let inner = lower(operand);
    match conversion {
        Conversion::Numeric { target, lifted } => step(move |env| {
            match non_null(inner(env)?, lifted)? {
                Some(value) => numeric::cast(&value, target),
                None => Ok(Value::Null),
            }
        }),
        Conversion::ToEnum { ty, lifted } => step(move |env| {
            let Some(value) = non_null(inner(env)?, lifted)? else {
                return Ok(Value::Null);
            };
            match numeric::cast(&value, NumericKind::Int32)? {
                Value::Int32(n) => Ok(Value::Enum(EnumValue::new(ty, n))),
                other => Err(EvaluationFault::unexpected(&other, "enum conversion")),
            }
        }),
        Conversion::FromEnum { lifted } => step(move |env| {
            match non_null(inner(env)?, lifted)? {
                Some(Value::Enum(e)) => Ok(Value::Int32(e.value)),
                Some(other) => Err(EvaluationFault::unexpected(&other, "enum conversion")),
                None => Ok(Value::Null),
            }
        }),
        Conversion::Unwrap => step(move |env| match inner(env)? {
            Value::Null => Err(EvaluationFault::NullValue),
            value => Ok(value),
        }),
        Conversion::Unbox(target) => step(move |env| {
            let value = inner(env)?;
            if value.conforms_to(&target) {
                Ok(value)
            } else if value.is_null() {
                Err(EvaluationFault::NullValue)
            } else {
                Err(EvaluationFault::invalid_cast(&value, &target))
            }
        }),
    }
}

fn lower_binary(op: BinaryOperator, left: Step, right: Step, lifted: bool) -> Step {
    match op {
        BinaryOperator::And => step(move |env| match left(env)? {
            Value::Boolean(false) => Ok(Value::Boolean(false)),
            _ => right(env),
        }),
        BinaryOperator::Or => step(move |env| match left(env)? {
            Value::Boolean(true) => Ok(Value::Boolean(true)),
            _ => right(env),
        }),
        BinaryOperator::Concat => step(move |env| {
            let (l, r) = (left(env)?, right(env)?);
            Ok(Value::String(format!("{l}{r}")))
        }),
        BinaryOperator::Equal | BinaryOperator::NotEqual => step(move |env| {
            let equal = left(env)? == right(env)?;
            Ok(Value::Boolean(equal == (op == BinaryOperator::Equal)))
        }),
        BinaryOperator::LessThan
        | BinaryOperator::GreaterThan
        | BinaryOperator::LessEqual
        | BinaryOperator::GreaterEqual => step(move |env| {
            let (l, r) = (left(env)?, right(env)?);
            if lifted && (l.is_null() || r.is_null()) {
                return Ok(Value::Boolean(false));
            }
            let holds = compare(&l, &r).is_some_and(|ordering| match op {
                BinaryOperator::LessThan => ordering.is_lt(),
                BinaryOperator::GreaterThan => ordering.is_gt(),
                BinaryOperator::LessEqual => ordering.is_le(),
                _ => ordering.is_ge(),
            });
            Ok(Value::Boolean(holds))
        }),
        _ => step(move |env| {
            let (l, r) = (left(env)?, right(env)?);
            if lifted && (l.is_null() || r.is_null()) {
                return Ok(Value::Null);
            }
            numeric::arithmetic(op, &l, &r)
        }),
    }
}

fn lower_call(builtin: Builtin, args: Vec<BoundExpr>, null_conditional: bool) -> Step {
    let pattern = match args.get(1) {
        Some(BoundExpr {
            kind: BoundKind::Constant(Value::String(pattern)),
            ..
        }) if builtin.takes_pattern() => Regex::new(pattern).ok(),
        _ => None,
    };
    let args: Vec<Step> = args.into_iter().map(lower).collect();

    step(move |env| {
        let mut values = Vec::with_capacity(args.len());
        for (position, arg) in args.iter().enumerate() {
            let value = arg(env)?;
            if position == 0 && null_conditional && value.is_null() {
                return Ok(Value::Null);
            }
            values.push(value);
        }
        builtins::invoke(builtin, &values, pattern.as_ref())
    })
}

fn element_at(target: Value, position: &Value) -> EvalResult {
    let Value::Int32(index) = *position else {
        return Err(EvaluationFault::unexpected(position, "index"));
    };
    match target {
        Value::Array(mut items) => {
            let length = items.len();
            usize::try_from(index)
                .ok()
                .filter(|i| *i < length)
                .map(|i| items.swap_remove(i))
                .ok_or(EvaluationFault::IndexOutOfRange {
                    index: i64::from(index),
                    length,
                })
        }
        Value::String(text) => {
            let length = text.chars().count();
            usize::try_from(index)
                .ok()
                .and_then(|i| text.chars().nth(i))
                .map(Value::Char)
                .ok_or(EvaluationFault::IndexOutOfRange {
                    index: i64::from(index),
                    length,
                })
        }
        other => Err(EvaluationFault::unexpected(&other, "indexer")),
    }
}

fn lower_query(
    method: QueryMethod,
    source: Step,
    lambda: Option<Step>,
    args: Vec<Step>,
    null_conditional: bool,
) -> Step {
    step(move |env| {
        let items = match source(env)? {
            Value::Array(items) => items,
            Value::Null if null_conditional => return Ok(Value::Null),
            Value::Null => {
                return Err(EvaluationFault::NullReference {
                    member: method.name().to_string(),
                });
            }
            other => return Err(EvaluationFault::unexpected(&other, method.name())),
        };
        let args = args
            .iter()
            .map(|arg| arg(env))
            .collect::<Result<Vec<_>, _>>()?;

        match &lambda {
            Some(body) => {
                let element = |item: &Value| body(&env.push(item));
                sequences::evaluate(&method, items, Some(&element as Lambda<'_>), &args)
            }
            None => sequences::evaluate(&method, items, None, &args),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{binder, parser::parse};

    fn run(source: &str, input: Value, ty: Type) -> EvalResult {
        let expr = parse(source).unwrap();
        let bound = binder::bind(&expr, &ty).unwrap();
        compile(bound, ty).call(&input)
    }

    #[test]
    fn test_constant_and_parameter() {
        assert_eq!(run("it", Value::Int32(42), Type::Int32), Ok(Value::Int32(42)));
        assert_eq!(run("1 + 2", Value::Null, Type::Object), Ok(Value::Int32(3)));
    }

    #[test]
    fn test_short_circuit_skips_faulting_operand() {
        let result = run("it == 0 || 10 / it > 1", Value::Int32(0), Type::Int32);
        assert_eq!(result, Ok(Value::Boolean(true)));
    }

    #[test]
    fn test_lifted_arithmetic_propagates_null() {
        let ty = Type::nullable_of(Type::Int32);
        assert_eq!(run("it + 1", Value::Null, ty.clone()), Ok(Value::Null));
        assert_eq!(run("it + 1", Value::Int32(1), ty), Ok(Value::Int32(2)));
    }

    #[test]
    fn test_index_out_of_range() {
        let result = run("new[] { 1, 2 }[it]", Value::Int32(5), Type::Int32);
        assert_eq!(
            result,
            Err(EvaluationFault::IndexOutOfRange {
                index: 5,
                length: 2
            })
        );
    }

    #[test]
    fn test_nested_lambdas_see_outer_parameters() {
        let result = run(
            "new[] { 1, 2 }.Select(x => new[] { 10 }.Select(y => x + y + it).ToArray()[0]).ToArray()",
            Value::Int32(100),
            Type::Int32,
        );
        assert_eq!(
            result,
            Ok(Value::Array(vec![Value::Int32(111), Value::Int32(112)]))
        );
    }
}
