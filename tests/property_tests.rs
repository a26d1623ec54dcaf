use proptest::prelude::*;
use quill_expr::{ExpressionStage, Type, Value, bind, parse};

/// Record field names keep their written spelling, so records are left out.
const EXPRESSIONS: &[&str] = &[
    "it * 2 + 1",
    "Math.Abs(it) % 7",
    "it > 0 ? Convert.ToInt64(it) : Int64.MinValue",
    "new[] { it, -it }.Max()",
    "new[] { it, 1, 2 }.Where(x => x > 1).Count()",
    "long?(it).HasValue",
    "single(it)",
];

/// Flips the case of every ASCII letter outside string literals.
fn flip_case(source: &str) -> String {
    let mut in_string = false;
    source
        .chars()
        .map(|c| {
            if c == '"' {
                in_string = !in_string;
            }
            if in_string {
                c
            } else if c.is_ascii_lowercase() {
                c.to_ascii_uppercase()
            } else {
                c.to_ascii_lowercase()
            }
        })
        .collect()
}

proptest! {
    #[test]
    fn evaluation_is_deterministic(n in any::<i32>(), index in 0..EXPRESSIONS.len()) {
        let stage = ExpressionStage::build(EXPRESSIONS[index], Type::Int32).unwrap();
        let first = stage.process(&Value::Int32(n));
        let second = stage.process(&Value::Int32(n));
        prop_assert_eq!(first, second);
    }

    #[test]
    fn spelling_does_not_change_meaning(n in -10_000i32..10_000, index in 0..EXPRESSIONS.len()) {
        let source = EXPRESSIONS[index];
        let flipped = flip_case(source);

        let original = bind(&parse(source).unwrap(), &Type::Int32).unwrap();
        let respelled = bind(&parse(&flipped).unwrap(), &Type::Int32).unwrap();
        prop_assert_eq!(&original, &respelled);

        let a = ExpressionStage::build(source, Type::Int32).unwrap();
        let b = ExpressionStage::build(&flipped, Type::Int32).unwrap();
        prop_assert_eq!(a.output_type(), b.output_type());
        prop_assert_eq!(a.process(&Value::Int32(n)), b.process(&Value::Int32(n)));
    }

    #[test]
    fn small_ints_survive_single_round_trip(n in -16_777_216i32..=16_777_216) {
        let stage = ExpressionStage::build("int(float(it))", Type::Int32).unwrap();
        prop_assert_eq!(stage.process(&Value::Int32(n)), Ok(Value::Int32(n)));
    }

    #[test]
    fn checked_conversion_agrees_with_range(n in any::<i32>()) {
        let stage = ExpressionStage::build("Convert.ToInt16(it)", Type::Int32).unwrap();
        let result = stage.process(&Value::Int32(n));
        match i16::try_from(n) {
            Ok(expected) => prop_assert_eq!(result, Ok(Value::Int16(expected))),
            Err(_) => prop_assert!(result.is_err()),
        }
    }

    #[test]
    fn addition_wraps_like_i32(a in any::<i32>(), b in any::<i32>()) {
        // negative literals parse as unary minus over the magnitude
        prop_assume!(b != i32::MIN);
        let source = format!("it + {}", b);
        let stage = ExpressionStage::build(&source, Type::Int32).unwrap();
        prop_assert_eq!(stage.process(&Value::Int32(a)), Ok(Value::Int32(a.wrapping_add(b))));
    }

    #[test]
    fn order_by_sorts(values in prop::collection::vec(any::<f64>(), 0..64)) {
        let stage = ExpressionStage::build("it.OrderBy(x => x).ToArray()", Type::array_of(Type::Double)).unwrap();
        let input = Value::Array(values.iter().copied().map(Value::Double).collect());
        let Ok(Value::Array(sorted)) = stage.process(&input) else {
            return Err(TestCaseError::fail("OrderBy did not return an array"));
        };
        let keys: Vec<f64> = sorted
            .iter()
            .map(|v| match v {
                Value::Double(d) => *d,
                _ => f64::INFINITY,
            })
            .collect();

        // NaN first, then ascending
        let nan_count = values.iter().filter(|v| v.is_nan()).count();
        prop_assert_eq!(keys.len(), values.len());
        prop_assert!(keys[..nan_count].iter().all(|k| k.is_nan()));
        prop_assert!(keys[nan_count..].windows(2).all(|w| w[0] <= w[1]));
    }
}
