//! Query operators over materialized sequences.
//!
//! Sequences are held as vectors at run time; a `Select` or `Where` result
//! is already an array and `ToArray` only changes its static type.

use std::cmp::Ordering;

use rust_decimal::Decimal;

use super::{EvalResult, EvaluationFault, sort_order};
use crate::{bound::QueryMethod, types::NumericKind, value::Value};

/// The element function of a query: the lambda body evaluated with the
/// element bound as the innermost parameter.
pub type Lambda<'a> = &'a dyn Fn(&Value) -> EvalResult;

fn require<'a>(lambda: Option<Lambda<'a>>, method: &QueryMethod) -> Result<Lambda<'a>, EvaluationFault> {
    lambda.ok_or_else(|| EvaluationFault::Internal(format!("{} without a lambda", method.name())))
}

fn truth(value: Value) -> Result<bool, EvaluationFault> {
    match value {
        Value::Boolean(b) => Ok(b),
        other => Err(EvaluationFault::unexpected(&other, "predicate")),
    }
}

/// Elements matching the optional predicate.
fn matching(items: Vec<Value>, predicate: Option<Lambda<'_>>) -> Result<Vec<Value>, EvaluationFault> {
    let Some(predicate) = predicate else {
        return Ok(items);
    };
    let mut kept = Vec::with_capacity(items.len());
    for item in items {
        if truth(predicate(&item)?)? {
            kept.push(item);
        }
    }
    Ok(kept)
}

fn count(args: &[Value]) -> Result<usize, EvaluationFault> {
    match args.first() {
        Some(Value::Int32(n)) => Ok(usize::try_from(*n).unwrap_or(0)),
        Some(other) => Err(EvaluationFault::unexpected(other, "Take/Skip")),
        None => Err(EvaluationFault::Internal("Take/Skip without a count".to_string())),
    }
}

fn empty(method: &QueryMethod) -> EvaluationFault {
    EvaluationFault::EmptySequence {
        method: method.name().to_string(),
    }
}

fn sum(kind: NumericKind, values: &[Value]) -> EvalResult {
    let overflow = |target: &str| EvaluationFault::overflow("sum", target);
    match kind {
        NumericKind::Int32 | NumericKind::Int64 => {
            let mut total: i64 = 0;
            for value in values {
                let v = match value {
                    Value::Int32(v) => i64::from(*v),
                    Value::Int64(v) => *v,
                    other => return Err(EvaluationFault::unexpected(other, "Sum")),
                };
                total = total.checked_add(v).ok_or_else(|| overflow("Int64"))?;
            }
            if kind == NumericKind::Int32 {
                i32::try_from(total)
                    .map(Value::Int32)
                    .map_err(|_| overflow("Int32"))
            } else {
                Ok(Value::Int64(total))
            }
        }
        NumericKind::Single => {
            let mut total = 0f64;
            for value in values {
                match value {
                    Value::Single(v) => total += f64::from(*v),
                    other => return Err(EvaluationFault::unexpected(other, "Sum")),
                }
            }
            Ok(Value::Single(total as f32))
        }
        NumericKind::Double => {
            let mut total = 0f64;
            for value in values {
                match value {
                    Value::Double(v) => total += v,
                    other => return Err(EvaluationFault::unexpected(other, "Sum")),
                }
            }
            Ok(Value::Double(total))
        }
        NumericKind::Decimal => {
            let mut total = Decimal::ZERO;
            for value in values {
                match value {
                    Value::Decimal(v) => {
                        total = total.checked_add(*v).ok_or_else(|| overflow("Decimal"))?;
                    }
                    other => return Err(EvaluationFault::unexpected(other, "Sum")),
                }
            }
            Ok(Value::Decimal(total))
        }
        other => Err(EvaluationFault::Internal(format!("Sum over {other}"))),
    }
}

fn average(kind: NumericKind, values: &[Value], method: &QueryMethod) -> EvalResult {
    if values.is_empty() {
        return Err(empty(method));
    }
    let n = values.len();
    let summed = match kind {
        NumericKind::Int32 | NumericKind::Int64 => sum(NumericKind::Int64, values)?,
        other => sum(other, values)?,
    };
    match summed {
        Value::Int64(total) => Ok(Value::Double(total as f64 / n as f64)),
        Value::Single(total) => Ok(Value::Single(total / n as f32)),
        Value::Double(total) => Ok(Value::Double(total / n as f64)),
        Value::Decimal(total) => total
            .checked_div(Decimal::from(n))
            .map(Value::Decimal)
            .ok_or_else(|| EvaluationFault::overflow("average", "Decimal")),
        other => Err(EvaluationFault::unexpected(&other, "Average")),
    }
}

/// `Min`/`Max` over the non-null values; `null` when every value is null.
/// NaN orders below every number, so `Min` returns it when present and
/// `Max` returns it only when every value is NaN.
fn extremum(values: Vec<Value>, method: &QueryMethod, wanted: Ordering) -> EvalResult {
    if values.is_empty() {
        return Err(empty(method));
    }
    let mut best: Option<Value> = None;
    for value in values.into_iter().filter(|value| !value.is_null()) {
        best = match best {
            Some(current) if sort_order(&value, &current) != wanted => Some(current),
            _ => Some(value),
        };
    }
    Ok(best.unwrap_or(Value::Null))
}

fn sort_by_key(
    items: Vec<Value>,
    key: Lambda<'_>,
    descending: bool,
) -> Result<Vec<Value>, EvaluationFault> {
    let mut keyed = Vec::with_capacity(items.len());
    for item in items {
        keyed.push((key(&item)?, item));
    }
    // stable, so equal keys keep their input order
    keyed.sort_by(|(a, _), (b, _)| {
        let ordering = sort_order(a, b);
        if descending { ordering.reverse() } else { ordering }
    });
    Ok(keyed.into_iter().map(|(_, item)| item).collect())
}

fn project(items: Vec<Value>, selector: Option<Lambda<'_>>) -> Result<Vec<Value>, EvaluationFault> {
    match selector {
        Some(selector) => items.iter().map(selector).collect(),
        None => Ok(items),
    }
}

/// Runs `method` over `items`. `args` are the non-lambda arguments, already
/// evaluated in the enclosing scope.
pub fn evaluate(
    method: &QueryMethod,
    items: Vec<Value>,
    lambda: Option<Lambda<'_>>,
    args: &[Value],
) -> EvalResult {
    let result = match method {
        QueryMethod::Select => {
            let selector = require(lambda, method)?;
            Value::Array(items.iter().map(selector).collect::<Result<_, _>>()?)
        }
        QueryMethod::Where => Value::Array(matching(items, Some(require(lambda, method)?))?),
        QueryMethod::OrderBy { descending } => {
            Value::Array(sort_by_key(items, require(lambda, method)?, *descending)?)
        }
        QueryMethod::ToArray => Value::Array(items),
        QueryMethod::Count => Value::Int32(matching(items, lambda)?.len() as i32),
        QueryMethod::Any => match lambda {
            None => Value::Boolean(!items.is_empty()),
            Some(predicate) => {
                let mut found = false;
                for item in &items {
                    if truth(predicate(item)?)? {
                        found = true;
                        break;
                    }
                }
                Value::Boolean(found)
            }
        },
        QueryMethod::All => {
            let predicate = require(lambda, method)?;
            let mut all = true;
            for item in &items {
                if !truth(predicate(item)?)? {
                    all = false;
                    break;
                }
            }
            Value::Boolean(all)
        }
        QueryMethod::First => matching(items, lambda)?
            .into_iter()
            .next()
            .ok_or_else(|| empty(method))?,
        QueryMethod::FirstOrDefault { default } => matching(items, lambda)?
            .into_iter()
            .next()
            .unwrap_or_else(|| default.clone()),
        QueryMethod::Last => matching(items, lambda)?.pop().ok_or_else(|| empty(method))?,
        QueryMethod::LastOrDefault { default } => matching(items, lambda)?
            .pop()
            .unwrap_or_else(|| default.clone()),
        QueryMethod::Sum(kind) => sum(*kind, &project(items, lambda)?)?,
        QueryMethod::Average(kind) => average(*kind, &project(items, lambda)?, method)?,
        QueryMethod::Min => extremum(project(items, lambda)?, method, Ordering::Less)?,
        QueryMethod::Max => extremum(project(items, lambda)?, method, Ordering::Greater)?,
        QueryMethod::Contains => {
            let needle = args
                .first()
                .ok_or_else(|| EvaluationFault::Internal("Contains without a value".to_string()))?;
            Value::Boolean(items.contains(needle))
        }
        QueryMethod::Take => Value::Array(items.into_iter().take(count(args)?).collect()),
        QueryMethod::Skip => Value::Array(items.into_iter().skip(count(args)?).collect()),
        QueryMethod::Distinct => {
            let mut seen: Vec<Value> = Vec::with_capacity(items.len());
            for item in items {
                if !seen.contains(&item) {
                    seen.push(item);
                }
            }
            Value::Array(seen)
        }
        QueryMethod::Reverse => Value::Array(items.into_iter().rev().collect()),
    };
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ints(values: &[i32]) -> Vec<Value> {
        values.iter().copied().map(Value::Int32).collect()
    }

    #[test]
    fn test_select_and_where() {
        let double = |v: &Value| -> EvalResult {
            match v {
                Value::Int32(n) => Ok(Value::Int32(n * 2)),
                other => Err(EvaluationFault::unexpected(other, "test")),
            }
        };
        let even = |v: &Value| -> EvalResult { Ok(Value::Boolean(matches!(v, Value::Int32(n) if n % 2 == 0))) };

        assert_eq!(
            evaluate(&QueryMethod::Select, ints(&[1, 2]), Some(&double), &[]),
            Ok(Value::Array(ints(&[2, 4])))
        );
        assert_eq!(
            evaluate(&QueryMethod::Where, ints(&[1, 2, 3, 4]), Some(&even), &[]),
            Ok(Value::Array(ints(&[2, 4])))
        );
    }

    #[test]
    fn test_order_by_is_stable() {
        let parity = |v: &Value| -> EvalResult {
            match v {
                Value::Int32(n) => Ok(Value::Int32(n % 2)),
                other => Err(EvaluationFault::unexpected(other, "test")),
            }
        };
        let sorted = evaluate(
            &QueryMethod::OrderBy { descending: false },
            ints(&[3, 2, 1, 4]),
            Some(&parity),
            &[],
        );
        assert_eq!(sorted, Ok(Value::Array(ints(&[2, 4, 3, 1]))));
    }

    #[test]
    fn test_first_faults_on_empty() {
        assert!(matches!(
            evaluate(&QueryMethod::First, vec![], None, &[]),
            Err(EvaluationFault::EmptySequence { .. })
        ));
        assert_eq!(
            evaluate(
                &QueryMethod::FirstOrDefault {
                    default: Value::Int32(0)
                },
                vec![],
                None,
                &[]
            ),
            Ok(Value::Int32(0))
        );
    }

    fn doubles(values: &[f64]) -> Vec<Value> {
        values.iter().copied().map(Value::Double).collect()
    }

    fn is_nan(result: EvalResult) -> bool {
        matches!(result, Ok(Value::Double(d)) if d.is_nan())
    }

    #[test]
    fn test_min_and_max_with_nan() {
        let nan = f64::NAN;
        assert_eq!(
            evaluate(&QueryMethod::Max, doubles(&[nan, 1.0]), None, &[]),
            Ok(Value::Double(1.0))
        );
        assert_eq!(
            evaluate(&QueryMethod::Max, doubles(&[1.0, nan]), None, &[]),
            Ok(Value::Double(1.0))
        );
        assert!(is_nan(evaluate(&QueryMethod::Max, doubles(&[nan, nan]), None, &[])));
        assert!(is_nan(evaluate(&QueryMethod::Min, doubles(&[1.0, nan]), None, &[])));
        assert!(is_nan(evaluate(&QueryMethod::Min, doubles(&[nan, 1.0]), None, &[])));
    }

    #[test]
    fn test_order_by_sorts_nan_first() {
        let identity = |v: &Value| -> EvalResult { Ok(v.clone()) };
        let mut keys = Vec::new();
        for i in 0..64 {
            keys.push(if i % 3 == 0 { f64::NAN } else { f64::from(64 - i) });
        }
        for descending in [false, true] {
            let Ok(Value::Array(sorted)) = evaluate(
                &QueryMethod::OrderBy { descending },
                doubles(&keys),
                Some(&identity),
                &[],
            ) else {
                panic!("OrderBy did not return an array");
            };
            let nan_count = sorted
                .iter()
                .filter(|v| matches!(v, Value::Double(d) if d.is_nan()))
                .count();
            assert_eq!(nan_count, 22);
            let (nans, numbers) = if descending {
                let (numbers, nans) = sorted.split_at(sorted.len() - nan_count);
                (nans, numbers)
            } else {
                sorted.split_at(nan_count)
            };
            assert!(nans.iter().all(|v| matches!(v, Value::Double(d) if d.is_nan())));
            let numbers: Vec<f64> = numbers
                .iter()
                .map(|v| match v {
                    Value::Double(d) => *d,
                    other => panic!("unexpected {other:?}"),
                })
                .collect();
            let ordered = numbers.windows(2).all(|w| {
                if descending { w[0] >= w[1] } else { w[0] <= w[1] }
            });
            assert!(ordered, "{numbers:?}");
        }
    }

    #[test]
    fn test_sum_and_average() {
        let identity = |v: &Value| -> EvalResult { Ok(v.clone()) };
        assert_eq!(
            evaluate(&QueryMethod::Sum(NumericKind::Int32), ints(&[1, 2, 3]), Some(&identity), &[]),
            Ok(Value::Int32(6))
        );
        assert_eq!(
            evaluate(&QueryMethod::Average(NumericKind::Int32), ints(&[1, 2]), Some(&identity), &[]),
            Ok(Value::Double(1.5))
        );
        assert!(matches!(
            evaluate(
                &QueryMethod::Sum(NumericKind::Int32),
                ints(&[i32::MAX, 1]),
                Some(&identity),
                &[]
            ),
            Err(EvaluationFault::Overflow { .. })
        ));
    }

    #[test]
    fn test_take_skip_distinct() {
        assert_eq!(
            evaluate(&QueryMethod::Take, ints(&[1, 2, 3]), None, &[Value::Int32(2)]),
            Ok(Value::Array(ints(&[1, 2])))
        );
        assert_eq!(
            evaluate(&QueryMethod::Skip, ints(&[1, 2, 3]), None, &[Value::Int32(-1)]),
            Ok(Value::Array(ints(&[1, 2, 3])))
        );
        assert_eq!(
            evaluate(&QueryMethod::Distinct, ints(&[1, 1, 2, 1]), None, &[]),
            Ok(Value::Array(ints(&[1, 2])))
        );
    }
}
