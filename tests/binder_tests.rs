// tests/binder_tests.rs

use quill_expr::bound::{BoundExpr, BoundKind, QueryMethod};
use quill_expr::types::{DAY_OF_WEEK, NumericKind};
use quill_expr::{BindError, Type, Value, bind, parse};

fn bind_str(input: &str, ty: Type) -> Result<BoundExpr, BindError> {
    let expr = parse(input).unwrap();
    bind(&expr, &ty)
}

fn type_of(input: &str, ty: Type) -> Type {
    match bind_str(input, ty) {
        Ok(bound) => bound.ty,
        Err(e) => panic!("failed to bind {}: {}", input, e),
    }
}

fn bind_err(input: &str, ty: Type) -> BindError {
    match bind_str(input, ty) {
        Ok(bound) => panic!("{} bound to {} but should have failed", input, bound.ty),
        Err(e) => e,
    }
}

fn nullable(ty: Type) -> Type {
    Type::nullable_of(ty)
}

// ============================================================================
// Result Types
// ============================================================================

#[test]
fn test_result_types() {
    let test_cases = vec![
        ("it", Type::Int32),
        ("it * 2", Type::Int32),
        ("it + 1L", Type::Int64),
        ("it / 2.0", Type::Double),
        ("it + 1.5f", Type::Single),
        ("it + 1m", Type::Decimal),
        ("-it", Type::Int32),
        ("it > 0", Type::Boolean),
        ("it == 1L", Type::Boolean),
        ("\"n=\" + it", Type::String),
        ("float(it)", Type::Single),
        ("Single(it)", Type::Single),
        ("object(it)", Type::Object),
        ("long?(it)", nullable(Type::Int64)),
        ("long?(it).HasValue", Type::Boolean),
        ("long?(it) + 1", nullable(Type::Int64)),
        ("long?(it) > 1", Type::Boolean),
        ("long?(it) ?? 0", Type::Int64),
        ("string(null)", Type::String),
        ("string(null).Length", Type::Int32),
        ("np(string(null).Length)", nullable(Type::Int32)),
        ("np(string(null).Length) ?? it", Type::Int32),
        ("Math.PI", Type::Double),
        ("Convert.ToInt16(it)", Type::Int16),
        ("bool.TrueString", Type::String),
        ("it.ToString()", Type::String),
        ("new[] { it }", Type::array_of(Type::Int32)),
        ("new[] { 1L, it }", Type::array_of(Type::Int64)),
        ("new(it as Data).Data", Type::Int32),
        ("new(it as X).x", Type::Int32),
        ("it > 0 ? 1 : null", nullable(Type::Int32)),
        ("iif(it > 0, 1L, 2)", Type::Int64),
        ("it > 0 ? Convert.ToInt16(it) : Int16.MinValue", Type::Int16),
        ("DateTime.MinValue - DateTime.MinValue", Type::TimeSpan),
        ("DateTime.MinValue + TimeSpan.Zero", Type::DateTime),
        ("\"a\" < \"b\"", Type::Boolean),
        ("guid.empty.tobytearray()[0]", Type::Byte),
        ("\"abc\"[1]", Type::Char),
    ];

    for (input, expected) in test_cases {
        assert_eq!(type_of(input, Type::Int32), expected, "Failed for input: {}", input);
    }
}

#[test]
fn test_null_expression_has_null_type() {
    let bound = bind_str("null", Type::Int32).unwrap();
    assert!(bound.is_null_literal());
}

#[test]
fn test_enum_arithmetic_then_conversion() {
    let ty = Type::Enum(&DAY_OF_WEEK);
    assert_eq!(type_of("it + 1", ty.clone()), Type::Int32);
    assert_eq!(type_of("DayOfWeek(it + 1)", ty.clone()), ty);
    assert_eq!(type_of("it == it", ty.clone()), Type::Boolean);
    assert_eq!(type_of("int(it)", ty), Type::Int32);
}

#[test]
fn test_reference_equality_with_null() {
    assert_eq!(type_of("it == null", Type::String), Type::Boolean);
    assert_eq!(type_of("null != it", nullable(Type::Int32)), Type::Boolean);
    assert!(matches!(
        bind_err("it == null", Type::Int32),
        BindError::IncompatibleOperands { .. }
    ));
}

// ============================================================================
// Case Insensitivity
// ============================================================================

#[test]
fn test_spelling_does_not_change_the_tree() {
    let test_cases = vec![
        ("Math.PI", "math.pi"),
        ("Single(it)", "single(it)"),
        ("Int64?(it).HasValue", "int64?(it).hasvalue"),
        ("Boolean.TrueString", "BOOLEAN.TRUESTRING"),
        ("Convert.ToInt16(it)", "convert.toint16(it)"),
        ("DateTime.MinValue.Second", "datetime.minvalue.second"),
        ("TimeSpan.TicksPerMillisecond", "timespan.tickspermillisecond"),
        ("it.ToString()", "IT.tostring()"),
    ];

    for (canonical, variant) in test_cases {
        assert_eq!(
            bind_str(canonical, Type::Int32).unwrap(),
            bind_str(variant, Type::Int32).unwrap(),
            "{} vs {}",
            canonical,
            variant
        );
    }
}

#[test]
fn test_aliases_name_the_same_type() {
    assert_eq!(type_of("int(it)", Type::Int64), Type::Int32);
    assert_eq!(type_of("Int32(it)", Type::Int64), Type::Int32);
    assert_eq!(type_of("long(it)", Type::Int32), Type::Int64);
}

#[test]
fn test_constants_fold() {
    let bound = bind_str("Math.PI", Type::Int32).unwrap();
    assert_eq!(bound.kind, BoundKind::Constant(Value::Double(std::f64::consts::PI)));
}

// ============================================================================
// Query Operators and Scopes
// ============================================================================

fn query_parts(bound: BoundExpr) -> (QueryMethod, Option<BoundExpr>) {
    match bound.kind {
        BoundKind::Query { method, lambda, .. } => (method, lambda.map(|l| *l)),
        other => panic!("expected a query, got {:?}", other),
    }
}

#[test]
fn test_query_result_types() {
    let test_cases = vec![
        ("new[] { it }.Select(x => x * 2)", Type::sequence_of(Type::Int32)),
        ("new[] { it }.Select(x => x * 2).ToArray()", Type::array_of(Type::Int32)),
        ("new[] { it }.Select(x => x.ToString())", Type::sequence_of(Type::String)),
        ("new[] { it }.Where(x => x > 0)", Type::sequence_of(Type::Int32)),
        ("new[] { it }.OrderByDescending(x => x)", Type::sequence_of(Type::Int32)),
        ("new[] { it }.Count()", Type::Int32),
        ("new[] { it }.Count(x => x > 1)", Type::Int32),
        ("new[] { it }.Any()", Type::Boolean),
        ("new[] { it }.All(x => x > 1)", Type::Boolean),
        ("new[] { it }.First()", Type::Int32),
        ("new[] { \"a\" }.FirstOrDefault()", Type::String),
        ("new[] { it }.Sum()", Type::Int32),
        ("new[] { 1L }.Sum()", Type::Int64),
        ("new[] { it }.Average()", Type::Double),
        ("new[] { 1.5f }.Average()", Type::Single),
        ("new[] { 1m }.Average()", Type::Decimal),
        ("new[] { \"b\", \"a\" }.Min()", Type::String),
        ("new[] { it }.Max(x => x * 2L)", Type::Int64),
        ("new[] { it }.Contains(3)", Type::Boolean),
        ("new[] { it }.Take(1)", Type::sequence_of(Type::Int32)),
        ("new[] { it }.Skip(1).Reverse().Distinct()", Type::sequence_of(Type::Int32)),
        ("new[] { it }.select(x => x).toarray().length", Type::Int32),
    ];

    for (input, expected) in test_cases {
        assert_eq!(type_of(input, Type::Int32), expected, "Failed for input: {}", input);
    }
}

#[test]
fn test_aggregate_kind_is_widened() {
    let (method, _) = query_parts(bind_str("it.Sum()", Type::array_of(Type::Int16)).unwrap());
    assert_eq!(method, QueryMethod::Sum(NumericKind::Int32));
}

#[test]
fn test_lambda_parameter_is_innermost_scope() {
    let (_, lambda) = query_parts(bind_str("new[] { it }.Select(x => x)", Type::Int32).unwrap());
    assert_eq!(lambda.unwrap().kind, BoundKind::Parameter { depth: 0 });
}

#[test]
fn test_explicit_lambda_keeps_outer_it() {
    let (_, lambda) = query_parts(bind_str("new[] { it }.Select(x => it)", Type::Int32).unwrap());
    assert_eq!(lambda.unwrap().kind, BoundKind::Parameter { depth: 1 });
}

#[test]
fn test_implicit_argument_rebinds_it() {
    let (_, lambda) = query_parts(bind_str("new[] { \"a\" }.Select(it.Length)", Type::Int32).unwrap());
    let lambda = lambda.unwrap();
    assert_eq!(lambda.ty, Type::Int32);
    match lambda.kind {
        BoundKind::Call { args, .. } => {
            assert_eq!(args[0].kind, BoundKind::Parameter { depth: 0 });
            assert_eq!(args[0].ty, Type::String);
        }
        other => panic!("expected a property call, got {:?}", other),
    }
}

#[test]
fn test_lambda_names_ignore_case() {
    let (_, lambda) = query_parts(bind_str("new[] { it }.Select(X => x)", Type::Int32).unwrap());
    assert_eq!(lambda.unwrap().kind, BoundKind::Parameter { depth: 0 });
}

#[test]
fn test_query_errors() {
    assert!(matches!(
        bind_err("new[] { it }.Where(x => x)", Type::Int32),
        BindError::TypeMismatch { expected: Type::Boolean, .. }
    ));
    assert!(matches!(
        bind_err("new[] { \"a\" }.Sum()", Type::Int32),
        BindError::InvalidOperand { .. }
    ));
    assert!(matches!(
        bind_err("new[] { it }.Select(x => x, 1)", Type::Int32),
        BindError::WrongArity { .. }
    ));
    assert!(matches!(
        bind_err("new[] { it }.Frobnicate()", Type::Int32),
        BindError::UnknownMember { .. }
    ));
    assert!(matches!(
        bind_err("new[] { it }.Select(x => y)", Type::Int32),
        BindError::UnknownIdentifier { .. }
    ));
}

// ============================================================================
// Errors
// ============================================================================

#[test]
fn test_bind_errors() {
    let test_cases: Vec<(&str, fn(&BindError) -> bool)> = vec![
        ("string(it)", |e| matches!(e, BindError::InvalidConversion { .. })),
        ("foo", |e| matches!(e, BindError::UnknownIdentifier { .. })),
        ("Math", |e| matches!(e, BindError::TypeUsedAsValue { .. })),
        ("Math.Golden", |e| matches!(e, BindError::UnknownMember { .. })),
        ("it.Bogus", |e| matches!(e, BindError::UnknownMember { .. })),
        ("Math.Abs", |e| matches!(e, BindError::MethodWithoutCall { .. })),
        ("Math.Abs()", |e| matches!(e, BindError::WrongArity { .. })),
        ("x => x", |e| matches!(e, BindError::MisplacedLambda { .. })),
        ("new[] { null }", |e| matches!(e, BindError::CannotInferElementType { .. })),
        ("new[] { 1, 2L }", |e| matches!(e, BindError::TypeMismatch { .. })),
        ("new(it as A, it as a)", |e| matches!(e, BindError::DuplicateMember { .. })),
        ("it[0]", |e| matches!(e, BindError::NotIndexable { .. })),
        ("it ? 1 : 2", |e| matches!(e, BindError::TypeMismatch { .. })),
        ("it ?? 0", |e| matches!(e, BindError::NotNullable { .. })),
        ("string?(it)", |e| matches!(e, BindError::NotNullable { .. })),
        ("1.5m + 1.5", |e| matches!(e, BindError::IncompatibleOperands { .. })),
        ("true && 1", |e| matches!(e, BindError::IncompatibleOperands { .. })),
        ("it > \"a\"", |e| matches!(e, BindError::IncompatibleOperands { .. })),
        ("Regex.IsMatch(it.ToString(), \"(\")", |e| matches!(e, BindError::InvalidPattern { .. })),
    ];

    for (input, check) in test_cases {
        let err = bind_err(input, Type::Int32);
        assert!(check(&err), "unexpected error for {}: {:?}", input, err);
    }
}

#[test]
fn test_error_messages_use_written_spelling() {
    let err = bind_err("it.BoGuS", Type::Int32);
    assert!(err.to_string().contains("BoGuS"), "{}", err);
    let err = bind_err("Frob(it)", Type::Int32);
    assert!(err.to_string().contains("Frob"), "{}", err);
}
