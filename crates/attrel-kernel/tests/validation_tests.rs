//! Integration tests for pre-evaluation validation.
//!
//! Error-level issues reject the template before any attribute is read;
//! warning-level issues let it evaluate.

use attrel_kernel::parser::parse;
use attrel_kernel::validator::{IssueCode, Severity, validate};
use attrel_kernel::{EngineConfig, compile};
use rstest::rstest;

fn codes(source: &str) -> Vec<IssueCode> {
    let template = parse(source).expect("should parse");
    validate(&template).into_iter().map(|issue| issue.code).collect()
}

// ============================================================================
// Tests that verify validation REJECTS templates (Error-level issues)
// ============================================================================

#[rstest]
#[case::unknown_function("${a:frobnicate()}", IssueCode::UnknownFunction)]
#[case::unknown_standalone("${frobnicate()}", IssueCode::UnknownFunction)]
#[case::too_many_arguments("${a:toBigDecimal():setScale(1, 'UP', 3)}", IssueCode::WrongArity)]
#[case::arguments_on_nullary("${a:toBigDecimal():negate(1)}", IssueCode::WrongArity)]
#[case::missing_subject("${negate()}", IssueCode::MissingSubject)]
#[case::unexpected_subject("${a:literal('x')}", IssueCode::UnexpectedSubject)]
#[case::boolean_subject("${a:toBigDecimal():gt(1):negate()}", IssueCode::IncompatibleReceiver)]
#[case::text_is_not_a_date("${a:getYear()}", IssueCode::IncompatibleReceiver)]
#[case::boolean_argument("${a:toBigDecimal():plus(false)}", IssueCode::IncompatibleArgument)]
#[case::nested_block("${a:plus(${b:frob()})}", IssueCode::UnknownFunction)]
#[case::string_template("${a:equals('${b:negate(1)}')}", IssueCode::WrongArity)]
fn validation_rejects(#[case] source: &str, #[case] expected: IssueCode) {
    assert_eq!(codes(source), vec![expected], "{source}");
    assert!(compile(source, &EngineConfig::default()).is_err());
}

#[test]
fn validation_reports_every_error() {
    let errors = compile("${a:frob()} and ${negate()}", &EngineConfig::default())
        .expect_err("two errors");
    assert_eq!(errors.errors.len(), 2);
    assert!(errors.errors[0].message.contains("E001"));
    assert!(errors.errors[1].message.contains("E003"));
}

#[test]
fn validation_error_points_at_the_call() {
    let source = "total: ${a:toBigDecimal():frob(1)}";
    let errors = compile(source, &EngineConfig::default()).expect_err("unknown function");
    let span = errors.errors[0].span;
    assert_eq!(&source[span.start..span.end], "frob(1)");
}

#[test]
fn error_inside_string_template_points_into_source() {
    let source = "${a:min('${b:frob()}')}";
    let errors = compile(source, &EngineConfig::default()).expect_err("unknown function");
    let span = errors.errors[0].span;
    assert_eq!(&source[span.start..span.end], "frob()");
}

#[test]
fn wrong_arity_suggests_valid_counts() {
    let template = parse("${a:toBigDecimal():divide()}").expect("should parse");
    let issues = validate(&template);
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].suggestion.as_deref(), Some("divide takes 1, 2 or 3 argument(s)"));
}

// ============================================================================
// Tests that verify validation ALLOWS templates
// ============================================================================

#[rstest]
#[case::attribute_only("${a}")]
#[case::decimal_chain("${a:toBigDecimal():divide(${b}, 2, 'half_even'):toPercent()}")]
#[case::number_chain("${a:plus(1):multiply(2.5):gt(3)}")]
#[case::date_chain("${a:toDate('yyyy-MM-dd'):addDays(1):format('dd/MM/yyyy')}")]
#[case::standalone_roots("${literal(1):plus(1)} ${now():getYear()}")]
#[case::embedded_text_subject("${${a}:negate()}")]
#[case::any_subject("${a:toBigDecimal():toString():equals('1')}")]
fn validation_allows(#[case] source: &str) {
    assert_eq!(codes(source), vec![], "{source}");
    assert!(compile(source, &EngineConfig::default()).is_ok());
}

#[rstest]
#[case::rounding_mode("${a:toBigDecimal():divide(3, 2, 'NEAREST')}", IssueCode::UnknownRoundingMode)]
#[case::zone("${a:toDate('yyyy', 'Atlantis/Capital')}", IssueCode::UnknownZone)]
#[case::getter_zone("${now():getHourOfDay('Nowhere')}", IssueCode::UnknownZone)]
fn validation_warns_but_allows(#[case] source: &str, #[case] expected: IssueCode) {
    let template = parse(source).expect("should parse");
    let issues = validate(&template);
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].code, expected);
    assert_eq!(issues[0].severity, Severity::Warning);
    assert!(compile(source, &EngineConfig::default()).is_ok());
}

#[test]
fn issue_format_shows_location() {
    let source = "line one\n${a:frob()}";
    let template = parse(source).expect("should parse");
    let issues = validate(&template);
    let formatted = issues[0].format(source);
    assert!(formatted.starts_with("2:5: error [E001]"), "{formatted}");
    assert!(formatted.contains("\n  | ${a:frob()}\n"), "{formatted}");
    assert!(formatted.ends_with("  |     ^^^^^^"), "{formatted}");
}
