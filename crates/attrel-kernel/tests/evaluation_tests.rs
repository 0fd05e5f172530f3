//! End-to-end evaluation tests: text in, text out.

use std::collections::{BTreeMap, HashMap};

use attrel_kernel::types::Zone;
use attrel_kernel::{Context, Engine, EngineConfig, evaluate_expressions};
use rstest::rstest;

fn attrs(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn eval(text: &str, pairs: &[(&str, &str)]) -> String {
    evaluate_expressions(text, &attrs(pairs), None)
        .unwrap_or_else(|e| panic!("{text:?} should compile: {e}"))
}

// =============================================================================
// Text and attributes
// =============================================================================

#[rstest]
#[case::plain("no expressions here", "no expressions here")]
#[case::empty("", "")]
#[case::escaped_block("$${name}", "${name}")]
#[case::escaped_dollars("$$$$", "$$")]
#[case::lone_dollar("price: $5", "price: $5")]
#[case::substitution("hello ${name}!", "hello world!")]
#[case::quoted_name("${'file size'}", "12")]
#[case::dotted_name("${mime.type}", "text/plain")]
#[case::missing("[${nope}]", "[]")]
#[case::adjacent("${name}${name}", "worldworld")]
fn text_and_attributes(#[case] text: &str, #[case] expected: &str) {
    let pairs = [("name", "world"), ("file size", "12"), ("mime.type", "text/plain")];
    assert_eq!(eval(text, &pairs), expected);
}

#[test]
fn attribute_values_are_not_reparsed() {
    assert_eq!(eval("${a}", &[("a", "${b}"), ("b", "nope")]), "${b}");
}

#[test]
fn embedded_block_as_subject() {
    assert_eq!(eval("${${a}:toBigDecimal():plus(1)}", &[("a", "1.5")]), "2.5");
}

#[test]
fn string_template_arguments() {
    assert_eq!(
        eval("${a:equals('x-${b}')}", &[("a", "x-1"), ("b", "1")]),
        "true"
    );
    assert_eq!(eval("${a:equals('$${b}')}", &[("a", "${b}")]), "true");
}

// =============================================================================
// Failure containment
// =============================================================================

#[test]
fn failing_block_renders_empty_and_others_survive() {
    assert_eq!(
        eval("a=${a:toBigDecimal()} b=${b:toBigDecimal()}", &[("a", "oops"), ("b", "2.50")]),
        "a= b=2.50"
    );
}

#[test]
fn failing_argument_fails_its_block() {
    assert_eq!(eval("[${a:plus(${b:toBigDecimal()})}]", &[("a", "1"), ("b", "x")]), "[]");
}

#[test]
fn malformed_text_is_an_error() {
    let map = attrs(&[]);
    assert!(evaluate_expressions("${a", &map, None).is_err());
    assert!(evaluate_expressions("${a:frob()}", &map, None).is_err());
    assert!(evaluate_expressions("${toBigDecimal()}", &map, None).is_err());
}

// =============================================================================
// Numbers and conversions
// =============================================================================

#[rstest]
#[case::int_sum("${a:plus(2)}", "5", "7")]
#[case::float_sum("${a:plus(2)}", "2.5", "4.5")]
#[case::int_division_truncates("${a:divide(2)}", "7", "3")]
#[case::float_division("${a:divide(2.0)}", "7", "3.5")]
#[case::modulo("${a:mod(4)}", "10", "2")]
#[case::comparison("${a:gt(4)}", "5", "true")]
#[case::chained_comparison("${a:plus(1):le(6)}", "5", "true")]
#[case::division_by_zero("[${a:divide(0)}]", "5", "[]")]
#[case::to_number_truncates("${a:toBigDecimal():toNumber()}", "9.99", "9")]
#[case::to_number_of_int("${a:toNumber()}", "42", "42")]
#[case::to_decimal_is_float("${a:toDecimal()}", "1.5", "1.5")]
#[case::to_string("${a:toBigDecimal():negate():toString()}", "1.50", "-1.50")]
#[case::text_equality("${a:equals('abc')}", "abc", "true")]
#[case::text_inequality("${a:equals('abd')}", "abc", "false")]
fn numbers(#[case] text: &str, #[case] value: &str, #[case] expected: &str) {
    assert_eq!(eval(text, &[("a", value)]), expected, "{text}");
}

#[test]
fn large_floats_use_exponent_notation() {
    assert_eq!(eval("${a:multiply(1.0)}", &[("a", "12345678")]), "1.2345678E7");
}

#[test]
fn literal_function() {
    assert_eq!(eval("${literal('a b')}", &[]), "a b");
    assert_eq!(eval("${literal(2):plus(3)}", &[]), "5");
    assert_eq!(eval("${literal(true)}", &[]), "true");
}

#[test]
fn now_is_an_epoch_instant() {
    let out = eval("${now():toNumber()}", &[]);
    let millis: i64 = out.parse().expect("a number");
    assert!(millis > 1_500_000_000_000);
}

// =============================================================================
// Contexts
// =============================================================================

#[test]
fn fallback_attributes() {
    let primary = attrs(&[("a", "primary")]);
    let fallback = BTreeMap::from([
        ("a".to_string(), "shadowed".to_string()),
        ("b".to_string(), "fallback".to_string()),
    ]);
    let ctx = Context::new(&primary).with_fallback(&fallback);
    let out = Engine::default()
        .evaluate("${a} ${b} [${c}]", &ctx)
        .expect("compiles");
    assert_eq!(out, "primary fallback []");
}

#[test]
fn decorator_sees_found_values_only() {
    let map = attrs(&[("a", "x")]);
    let upper = |value: &str| value.to_uppercase();
    let out = evaluate_expressions("${a}-[${missing}]", &map, Some(&upper)).expect("compiles");
    assert_eq!(out, "X-[]");
}

#[test]
fn decorated_values_feed_functions() {
    let map = attrs(&[("a", "1")]);
    let pad = |value: &str| format!("{value}0");
    let out = evaluate_expressions("${a:plus(1)}", &map, Some(&pad)).expect("compiles");
    assert_eq!(out, "11");
}

#[test]
fn empty_context() {
    let out = Engine::default()
        .evaluate("[${a}]", &Context::empty())
        .expect("compiles");
    assert_eq!(out, "[]");
}

// =============================================================================
// Engine
// =============================================================================

#[test]
fn evaluation_is_deterministic() {
    let engine = Engine::default();
    let map = attrs(&[("a", "3.14159"), ("b", "2")]);
    let ctx = Context::new(&map);
    let text = "${a:toBigDecimal():divide(${b}, 2, 'half_even')} and ${b:plus(1)}";
    let first = engine.evaluate(text, &ctx).expect("compiles");
    let second = engine.evaluate(text, &ctx).expect("compiles");
    assert_eq!(first, "1.57 and 3");
    assert_eq!(first, second);
}

#[test]
fn engine_is_shared_across_threads() {
    let engine = Engine::new(EngineConfig::default().with_default_zone(Zone::utc()));
    std::thread::scope(|scope| {
        for i in 0..4 {
            let engine = &engine;
            scope.spawn(move || {
                let n = i.to_string();
                let map = attrs(&[("n", n.as_str())]);
                let out = engine
                    .evaluate("${n:plus(10)}", &Context::new(&map))
                    .expect("compiles");
                assert_eq!(out, (i + 10).to_string());
            });
        }
    });
    assert_eq!(engine.cache().len(), 1);
}
