use std::sync::Arc;
use std::thread;

use chrono::NaiveDate;
use quill_expr::types::DAY_OF_WEEK;
use quill_expr::value::EnumValue;
use quill_expr::{BuildError, CompileError, EvaluationFault, ExpressionStage, SyntaxError, Type, Value};

fn eval_expr(expr_str: &str, ty: Type, element: Value) -> Result<Value, String> {
    let stage = ExpressionStage::build(expr_str, ty).map_err(|e| format!("{:?}", e))?;
    stage.process(&element).map_err(|e| format!("{:?}", e))
}

fn eval_int(expr_str: &str, n: i32) -> Value {
    eval_expr(expr_str, Type::Int32, Value::Int32(n)).unwrap()
}

fn fault(expr_str: &str, ty: Type, element: Value) -> EvaluationFault {
    let stage = ExpressionStage::build(expr_str, ty).unwrap();
    stage.process(&element).unwrap_err()
}

fn day(value: i32) -> Value {
    Value::Enum(EnumValue::new(&DAY_OF_WEEK, value))
}

fn date(y: i32, m: u32, d: u32) -> Value {
    Value::DateTime(
        NaiveDate::from_ymd_opt(y, m, d)
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .unwrap(),
    )
}

// ============================================================================
// Reference Scenarios
// ============================================================================

#[test]
fn test_reference_scenarios_on_int() {
    let test_cases = vec![
        ("it", 42, Value::Int32(42)),
        ("it * 2", 21, Value::Int32(42)),
        ("Single(it)", 42, Value::Single(42.0)),
        ("Math.PI", 42, Value::Double(std::f64::consts::PI)),
        ("Convert.ToInt16(it)", 42, Value::Int16(42)),
        ("new(it as Data).Data", 42, Value::Int32(42)),
        ("float(it)", 42, Value::Single(42.0)),
        ("long?(it).HasValue", 42, Value::Boolean(true)),
        ("bool.TrueString", 42, Value::String("True".into())),
        ("new[] { it }", 42, Value::Array(vec![Value::Int32(42)])),
        (
            "new[] { it }.Select(x => x * 2).ToArray()",
            21,
            Value::Array(vec![Value::Int32(42)]),
        ),
        ("np(string(null).Length) ?? it", 42, Value::Int32(42)),
        ("object(it)", 42, Value::Int32(42)),
    ];

    for (input, element, expected) in test_cases {
        assert_eq!(eval_int(input, element), expected, "Failed for input: {}", input);
    }
}

#[test]
fn test_output_types_of_reference_scenarios() {
    let test_cases = vec![
        ("it", Type::Int32),
        ("Single(it)", Type::Single),
        ("Convert.ToInt16(it)", Type::Int16),
        ("new[] { it }", Type::array_of(Type::Int32)),
        ("long?(it).HasValue", Type::Boolean),
        ("object(it)", Type::Object),
        ("null", Type::Object),
        ("string(null)", Type::String),
    ];

    for (input, expected) in test_cases {
        let stage = ExpressionStage::build(input, Type::Int32).unwrap();
        assert_eq!(stage.output_type(), &expected, "Failed for input: {}", input);
        assert_eq!(stage.input_type(), &Type::Int32);
        assert_eq!(stage.expression(), input);
    }
}

#[test]
fn test_null_results() {
    assert_eq!(eval_int("null", 42), Value::Null);
    assert_eq!(eval_int("string(null)", 42), Value::Null);
}

#[test]
fn test_enum_scenario() {
    let result = eval_expr("DayOfWeek(it + 1)", Type::Enum(&DAY_OF_WEEK), day(1)).unwrap();
    assert_eq!(result, day(2));
    assert_eq!(result.to_string(), "Tuesday");
}

// ============================================================================
// Case Insensitivity
// ============================================================================

#[test]
fn test_casing_variants() {
    let test_cases = vec![
        ("single(it)", Value::Single(42.0)),
        ("int64?(it).hasvalue", Value::Boolean(true)),
        ("math.pi", Value::Double(std::f64::consts::PI)),
        ("boolean.truestring", Value::String("True".into())),
        ("convert.toint16(it)", Value::Int16(42)),
        ("datetime.minvalue.second", Value::Int32(0)),
        ("datetimeoffset.minvalue.second", Value::Int32(0)),
        ("guid.empty.tobytearray()[0]", Value::Byte(0)),
        ("timespan.tickspermillisecond", Value::Int64(10_000)),
        ("it > 0 ? convert.toint16(it) : int16.minvalue", Value::Int16(42)),
        ("new(single(it) as X, single(it) as Y).X", Value::Single(42.0)),
        ("NEW(IT AS data).DATA", Value::Int32(42)),
    ];

    for (input, expected) in test_cases {
        assert_eq!(eval_int(input, 42), expected, "Failed for input: {}", input);
    }
}

#[test]
fn test_negative_branch_of_conditional() {
    assert_eq!(
        eval_int("it > 0 ? convert.toint16(it) : int16.minvalue", -1),
        Value::Int16(i16::MIN)
    );
}

// ============================================================================
// Build Failures
// ============================================================================

#[test]
fn test_empty_expression_fails_to_build() {
    let err = ExpressionStage::build("", Type::Int32).unwrap_err();
    assert_eq!(err.cause, CompileError::Syntax(SyntaxError::EmptyExpression));
}

#[test]
fn test_string_conversion_of_int_fails_to_build() {
    let err: BuildError = ExpressionStage::build("string(it)", Type::Int32).unwrap_err();
    assert!(matches!(err.cause, CompileError::Bind(_)));
    assert!(err.to_string().contains("string(it)"));
    assert!(std::error::Error::source(&err).is_some());
}

#[test]
fn test_build_failures_by_phase() {
    let test_cases = vec![
        ("it # 1", "Lex"),
        ("it +", "Syntax"),
        ("it.Nope", "Bind"),
    ];

    for (input, phase) in test_cases {
        let err = ExpressionStage::build(input, Type::Int32).unwrap_err();
        let actual = match err.cause {
            CompileError::Lex(_) => "Lex",
            CompileError::Syntax(_) => "Syntax",
            CompileError::Bind(_) => "Bind",
        };
        assert_eq!(actual, phase, "Failed for input: {}", input);
    }
}

// ============================================================================
// Run-time Faults
// ============================================================================

#[test]
fn test_faults_affect_only_their_element() {
    let stage = ExpressionStage::build("Convert.ToByte(it)", Type::Int32).unwrap();
    let results: Vec<_> = stage
        .process_all(vec![Value::Int32(300), Value::Int32(7)])
        .collect();
    assert!(matches!(results[0], Err(EvaluationFault::Overflow { .. })));
    assert_eq!(results[1], Ok(Value::Byte(7)));
}

#[test]
fn test_division_by_zero_then_recovery() {
    let stage = ExpressionStage::build("it / 0", Type::Int32).unwrap();
    assert_eq!(stage.process(&Value::Int32(1)), Err(EvaluationFault::DivisionByZero));
    let stage = ExpressionStage::build("10 / it", Type::Int32).unwrap();
    assert_eq!(stage.process(&Value::Int32(0)), Err(EvaluationFault::DivisionByZero));
    assert_eq!(stage.process(&Value::Int32(5)), Ok(Value::Int32(2)));
}

#[test]
fn test_other_faults() {
    assert!(matches!(
        fault("new[] { 1 }.First(x => x > it)", Type::Int32, Value::Int32(5)),
        EvaluationFault::EmptySequence { .. }
    ));
    assert!(matches!(
        fault("new[] { 1 }[it]", Type::Int32, Value::Int32(3)),
        EvaluationFault::IndexOutOfRange { index: 3, length: 1 }
    ));
    assert!(matches!(
        fault("it.Length", Type::String, Value::Null),
        EvaluationFault::NullReference { .. }
    ));
    assert!(matches!(
        fault("int.Parse(it)", Type::String, Value::from("forty")),
        EvaluationFault::InvalidFormat { .. }
    ));
    assert!(matches!(
        fault("int(it)", Type::Object, Value::from("x")),
        EvaluationFault::InvalidCast { .. }
    ));
    assert!(matches!(
        fault("it", Type::Int32, Value::from("x")),
        EvaluationFault::InputType { .. }
    ));
}

// ============================================================================
// Arithmetic and Conversions
// ============================================================================

#[test]
fn test_integer_arithmetic_wraps() {
    assert_eq!(eval_int("it + 1", i32::MAX), Value::Int32(i32::MIN));
    assert_eq!(eval_int("it * 2L", i32::MAX), Value::Int64(i32::MAX as i64 * 2));
}

#[test]
fn test_casts_and_convert() {
    let test_cases = vec![
        ("int(2.7)", Value::Int32(2)),
        ("int(-2.7)", Value::Int32(-2)),
        ("byte(it)", Value::Byte(44)),
        ("Convert.ToInt32(2.5)", Value::Int32(2)),
        ("Convert.ToInt32(3.5)", Value::Int32(4)),
        ("Convert.ToString(it)", Value::String("300".into())),
        ("Convert.ToBoolean(it)", Value::Boolean(true)),
        ("int(float(it))", Value::Int32(300)),
        ("it % 7", Value::Int32(6)),
        ("-it", Value::Int32(-300)),
        ("it / 7", Value::Int32(42)),
        ("it / 8.0", Value::Double(37.5)),
    ];

    for (input, expected) in test_cases {
        assert_eq!(eval_int(input, 300), expected, "Failed for input: {}", input);
    }
}

#[test]
fn test_lifted_operators() {
    let ty = Type::nullable_of(Type::Int32);
    assert_eq!(eval_expr("it + 1", ty.clone(), Value::Null).unwrap(), Value::Null);
    assert_eq!(eval_expr("it + 1", ty.clone(), Value::Int32(1)).unwrap(), Value::Int32(2));
    assert_eq!(eval_expr("it > 1", ty.clone(), Value::Null).unwrap(), Value::Boolean(false));
    assert_eq!(eval_expr("it == null", ty.clone(), Value::Null).unwrap(), Value::Boolean(true));
    assert_eq!(eval_expr("it ?? -1", ty.clone(), Value::Null).unwrap(), Value::Int32(-1));
    assert_eq!(
        eval_expr("it.GetValueOrDefault()", ty.clone(), Value::Null).unwrap(),
        Value::Int32(0)
    );
    assert!(matches!(
        fault("it.Value", ty, Value::Null),
        EvaluationFault::NullValue
    ));
}

#[test]
fn test_string_operations() {
    let test_cases = vec![
        ("it.ToUpper()", Value::from("HELLO")),
        ("it.Length", Value::Int32(5)),
        ("it.Substring(1, 3)", Value::from("ell")),
        ("it.IndexOf('l')", Value::Int32(2)),
        ("it.Contains(\"ell\")", Value::Boolean(true)),
        ("it.Replace(\"l\", \"L\")", Value::from("heLLo")),
        ("it + \" \" + 42", Value::from("hello 42")),
        ("it[0]", Value::Char('h')),
        ("it < \"world\"", Value::Boolean(true)),
        ("Regex.IsMatch(it, \"^h.*o$\")", Value::Boolean(true)),
        ("np(it.Length) ?? 0", Value::Int32(5)),
    ];

    for (input, expected) in test_cases {
        let result = eval_expr(input, Type::String, Value::from("hello")).unwrap();
        assert_eq!(result, expected, "Failed for input: {}", input);
    }
}

#[test]
fn test_null_propagation_on_null_input() {
    assert_eq!(
        eval_expr("np(it.Length)", Type::String, Value::Null).unwrap(),
        Value::Null
    );
    assert_eq!(
        eval_expr("np(it.Length) ?? -1", Type::String, Value::Null).unwrap(),
        Value::Int32(-1)
    );
    assert_eq!(
        eval_expr("it ?? \"none\"", Type::String, Value::Null).unwrap(),
        Value::from("none")
    );
}

#[test]
fn test_date_members() {
    let test_cases = vec![
        ("it.Year", Value::Int32(2024)),
        ("it.Month", Value::Int32(2)),
        ("it.Day", Value::Int32(28)),
        ("it.AddDays(1).Day", Value::Int32(29)),
        ("it.AddDays(2).Month", Value::Int32(3)),
        ("it.DayOfWeek", day(3)),
        ("(it - it.AddDays(-1)).Hours", Value::Int32(0)),
        ("(it - it.AddDays(-1)).Days", Value::Int32(1)),
    ];

    for (input, expected) in test_cases {
        let result = eval_expr(input, Type::DateTime, date(2024, 2, 28)).unwrap();
        assert_eq!(result, expected, "Failed for input: {}", input);
    }
}

// ============================================================================
// Query Operators
// ============================================================================

fn ints(values: &[i32]) -> Value {
    Value::Array(values.iter().copied().map(Value::Int32).collect())
}

#[test]
fn test_queries_over_array_input() {
    let test_cases = vec![
        ("it.Where(x => x % 2 == 0).ToArray()", ints(&[4, 2])),
        ("it.OrderBy(x => x).ToArray()", ints(&[1, 2, 3, 4])),
        ("it.OrderByDescending(x => x).First()", Value::Int32(4)),
        ("it.Select(x => x * 10).Last()", Value::Int32(20)),
        ("it.Sum()", Value::Int32(10)),
        ("it.Average()", Value::Double(2.5)),
        ("it.Min()", Value::Int32(1)),
        ("it.Max(x => -x)", Value::Int32(-1)),
        ("it.Count(x => x > 2)", Value::Int32(2)),
        ("it.Any(x => x > 3)", Value::Boolean(true)),
        ("it.All(x => x > 3)", Value::Boolean(false)),
        ("it.Contains(4)", Value::Boolean(true)),
        ("it.Take(2).ToArray()", ints(&[3, 4])),
        ("it.Skip(3).ToArray()", ints(&[2])),
        ("it.Reverse().ToArray()", ints(&[2, 1, 4, 3])),
        ("it.FirstOrDefault(x => x > 10)", Value::Int32(0)),
        ("it.Length", Value::Int32(4)),
        ("it.Select(it * 2).ToArray()", ints(&[6, 8, 2, 4])),
    ];

    for (input, expected) in test_cases {
        let result = eval_expr(input, Type::array_of(Type::Int32), ints(&[3, 4, 1, 2])).unwrap();
        assert_eq!(result, expected, "Failed for input: {}", input);
    }
}

#[test]
fn test_distinct_keeps_first_occurrence() {
    let result = eval_expr(
        "it.Distinct().ToArray()",
        Type::array_of(Type::Int32),
        ints(&[2, 1, 2, 3, 1]),
    )
    .unwrap();
    assert_eq!(result, ints(&[2, 1, 3]));
}

#[test]
fn test_lambda_sees_outer_it() {
    assert_eq!(
        eval_int("new[] { 1, 2 }.Select(x => x + it).ToArray()", 10),
        ints(&[11, 12])
    );
}

#[test]
fn test_nan_ordering_in_queries() {
    let test_cases = vec![
        ("new[] { 1.0, double.NaN, 0.5 }.OrderBy(x => x).ToArray()", "[NaN, 0.5, 1]"),
        ("new[] { 1.0, double.NaN, 0.5 }.OrderByDescending(x => x).ToArray()", "[1, 0.5, NaN]"),
        ("new[] { double.NaN, 1.0 }.Max()", "1"),
        ("new[] { 1.0, double.NaN }.Max()", "1"),
        ("new[] { double.NaN, double.NaN }.Max()", "NaN"),
        ("new[] { 1.0, double.NaN }.Min()", "NaN"),
        ("new[] { double.NaN, 1.0 }.Min()", "NaN"),
        ("new[] { 2f, float.NaN }.Max()", "2"),
        ("new[] { 2f, float.NaN }.Min()", "NaN"),
        ("new[] { 2f, float.NaN, -1f }.OrderBy(x => x).First()", "NaN"),
    ];

    for (input, expected) in test_cases {
        assert_eq!(eval_int(input, 0).to_string(), expected, "Failed for input: {}", input);
    }
}

#[test]
fn test_order_by_with_many_nan_keys() {
    let values: Vec<Value> = (0..64)
        .map(|i| Value::Double(if i % 3 == 0 { f64::NAN } else { f64::from(i) }))
        .collect();
    for expression in ["it.OrderBy(x => x).ToArray()", "it.OrderByDescending(x => x).ToArray()"] {
        let result = eval_expr(expression, Type::array_of(Type::Double), Value::Array(values.clone()));
        let Ok(Value::Array(sorted)) = result else {
            panic!("Failed for expression: {}: {:?}", expression, result);
        };
        assert_eq!(sorted.len(), 64);
    }
}

// ============================================================================
// TimeSpan Range
// ============================================================================

#[test]
fn test_time_span_overflow_faults() {
    let test_cases = vec![
        "(TimeSpan.MaxValue + TimeSpan.MaxValue).Ticks",
        "(-TimeSpan.MinValue).Ticks",
        "(TimeSpan.MinValue - TimeSpan.FromTicks(1)).ToString()",
        "(TimeSpan.MaxValue + TimeSpan.MaxValue) > TimeSpan.MaxValue",
    ];

    for input in test_cases {
        assert!(
            matches!(fault(input, Type::Int32, Value::Int32(0)), EvaluationFault::Overflow { .. }),
            "Failed for input: {}",
            input
        );
    }
}

#[test]
fn test_time_span_at_range_limits() {
    let test_cases = vec![
        ("(TimeSpan.MaxValue - TimeSpan.FromTicks(1)).Ticks", Value::Int64(i64::MAX - 1)),
        ("(-TimeSpan.MaxValue).Ticks", Value::Int64(-i64::MAX)),
        ("TimeSpan.MinValue.Ticks", Value::Int64(i64::MIN)),
        ("-TimeSpan.MaxValue == TimeSpan.MinValue + TimeSpan.FromTicks(1)", Value::Boolean(true)),
    ];

    for (input, expected) in test_cases {
        assert_eq!(eval_int(input, 0), expected, "Failed for input: {}", input);
    }
}

// ============================================================================
// Reuse and Concurrency
// ============================================================================

#[test]
fn test_repeated_evaluation_is_deterministic() {
    let stage = ExpressionStage::build("new[] { it, it * 2 }.Sum() + Math.Abs(-it)", Type::Int32).unwrap();
    let first = stage.process(&Value::Int32(7)).unwrap();
    for _ in 0..100 {
        assert_eq!(stage.process(&Value::Int32(7)).unwrap(), first);
    }
    assert_eq!(first, Value::Int32(28));
}

#[test]
fn test_concurrent_evaluation() {
    let stage = Arc::new(ExpressionStage::build("it * 2 + 1", Type::Int32).unwrap());
    let handles: Vec<_> = (0..8)
        .map(|t| {
            let stage = Arc::clone(&stage);
            thread::spawn(move || {
                (0..1000)
                    .map(|i| {
                        let n = t * 1000 + i;
                        stage.process(&Value::Int32(n)) == Ok(Value::Int32(n * 2 + 1))
                    })
                    .all(|ok| ok)
            })
        })
        .collect();

    for handle in handles {
        assert!(handle.join().unwrap());
    }
}

#[test]
fn test_process_all_is_ordered() {
    let stage = ExpressionStage::build("it - 1", Type::Int32).unwrap();
    let outputs: Vec<Value> = stage
        .process_all((1..=5).map(Value::Int32))
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(outputs, (0..5).map(Value::Int32).collect::<Vec<_>>());
}
