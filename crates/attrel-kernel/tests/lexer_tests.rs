//! Lexer tests using rstest for parameterization.

use attrel_kernel::lexer::{LexerError, Token, tokenize, tokenize_with_limit};
use rstest::rstest;

/// Format a Token into the test format string.
fn format_token(token: &Token) -> String {
    fn escape_for_display(s: &str) -> String {
        s.replace('\n', "\\n")
            .replace('\t', "\\t")
            .replace('\r', "\\r")
    }

    match token {
        Token::Text(s) => format!("TEXT({})", escape_for_display(s)),
        Token::BlockStart => "OPEN".to_string(),
        Token::BlockEnd => "CLOSE".to_string(),
        Token::Colon => "COLON".to_string(),
        Token::Comma => "COMMA".to_string(),
        Token::LParen => "LPAREN".to_string(),
        Token::RParen => "RPAREN".to_string(),
        Token::True => "BOOL(true)".to_string(),
        Token::False => "BOOL(false)".to_string(),
        Token::Str(s) => format!("STRING({})", escape_for_display(s)),
        Token::Int(n) => format!("INT({n})"),
        Token::Float(x) => format!("FLOAT({x})"),
        Token::Ident(s) => format!("IDENT({s})"),
        Token::UnterminatedString | Token::InvalidNumberIdent => "INVALID".to_string(),
        Token::Comment => "COMMENT".to_string(),
    }
}

/// Run a lexer test that expects success.
fn run_lexer_test(input: &str, expected: &[&str]) {
    let tokens = tokenize(input).expect("lexing should succeed");
    let actual: Vec<String> = tokens.iter().map(|s| format_token(&s.token)).collect();
    let expected: Vec<String> = expected.iter().map(|s| s.to_string()).collect();
    assert_eq!(actual, expected, "input: {:?}", input);
}

/// Run a lexer test that expects an error, returning the errors found.
fn run_lexer_error_test(input: &str) -> Vec<LexerError> {
    tokenize(input)
        .expect_err(&format!("expected error for input: {input:?}"))
        .into_iter()
        .map(|s| s.token)
        .collect()
}

// =============================================================================
// Text outside blocks
// =============================================================================

#[rstest]
#[case::plain("hello", &["TEXT(hello)"])]
#[case::multiline("a\nb", &["TEXT(a\\nb)"])]
#[case::lone_dollar("cost: $5", &["TEXT(cost: $5)"])]
#[case::escaped_block("$${a}", &["TEXT(${a})"])]
#[case::escaped_dollar_pair("$$$$", &["TEXT($$)"])]
#[case::closing_brace("a } b", &["TEXT(a } b)"])]
fn lexer_text(#[case] input: &str, #[case] expected: &[&str]) {
    run_lexer_test(input, expected);
}

#[test]
fn lexer_empty_input() {
    run_lexer_test("", &[]);
}

// =============================================================================
// Blocks
// =============================================================================

#[rstest]
#[case::attribute("${filename}", &["OPEN", "IDENT(filename)", "CLOSE"])]
#[case::dotted_attribute("${mime.type}", &["OPEN", "IDENT(mime.type)", "CLOSE"])]
#[case::dashed_attribute("${content-length}", &["OPEN", "IDENT(content-length)", "CLOSE"])]
#[case::quoted_attribute("${'my attr'}", &["OPEN", "STRING(my attr)", "CLOSE"])]
#[case::whitespace("${ a : plus( 1 ) }", &["OPEN", "IDENT(a)", "COLON", "IDENT(plus)", "LPAREN", "INT(1)", "RPAREN", "CLOSE"])]
#[case::surrounded("x${a}y", &["TEXT(x)", "OPEN", "IDENT(a)", "CLOSE", "TEXT(y)"])]
#[case::adjacent("${a}${b}", &["OPEN", "IDENT(a)", "CLOSE", "OPEN", "IDENT(b)", "CLOSE"])]
fn lexer_blocks(#[case] input: &str, #[case] expected: &[&str]) {
    run_lexer_test(input, expected);
}

#[test]
fn lexer_chain_with_arguments() {
    run_lexer_test(
        "${pi:divide(${n}, 7, 'up')}",
        &[
            "OPEN", "IDENT(pi)", "COLON", "IDENT(divide)", "LPAREN", "OPEN", "IDENT(n)", "CLOSE",
            "COMMA", "INT(7)", "COMMA", "STRING(up)", "RPAREN", "CLOSE",
        ],
    );
}

#[test]
fn lexer_comment_is_dropped() {
    run_lexer_test(
        "${a # the subject\n:negate()}",
        &["OPEN", "IDENT(a)", "COLON", "IDENT(negate)", "LPAREN", "RPAREN", "CLOSE"],
    );
}

// =============================================================================
// Literals
// =============================================================================

#[rstest]
#[case::int_zero("${f(0)}", "INT(0)")]
#[case::int_negative("${f(-456)}", "INT(-456)")]
#[case::float("${f(2.5)}", "FLOAT(2.5)")]
#[case::float_negative("${f(-0.25)}", "FLOAT(-0.25)")]
#[case::float_exponent("${f(1.5e3)}", "FLOAT(1500)")]
#[case::bool_true("${f(true)}", "BOOL(true)")]
#[case::bool_false("${f(false)}", "BOOL(false)")]
#[case::single_quoted("${f('up')}", "STRING(up)")]
#[case::double_quoted("${f(\"up\")}", "STRING(up)")]
#[case::escaped_newline(r"${f('a\nb')}", "STRING(a\\nb)")]
#[case::escaped_quote(r"${f('it\'s')}", "STRING(it's)")]
#[case::nested_template("${f('${b}')}", "STRING(${b})")]
fn lexer_literals(#[case] input: &str, #[case] expected: &str) {
    let tokens = tokenize(input).expect("lexing should succeed");
    // OPEN IDENT(f) LPAREN <literal> RPAREN CLOSE
    assert_eq!(format_token(&tokens[3].token), expected, "input: {input:?}");
}

// =============================================================================
// Spans
// =============================================================================

#[test]
fn lexer_spans_point_into_source() {
    let source = "ab${cd:e()}f";
    let tokens = tokenize(source).expect("lexing should succeed");
    let slices: Vec<&str> = tokens.iter().map(|t| &source[t.span.clone()]).collect();
    assert_eq!(slices, vec!["ab", "${", "cd", ":", "e", "(", ")", "}", "f"]);
}

// =============================================================================
// Errors
// =============================================================================

#[rstest]
#[case::unterminated_block("${a")]
#[case::unterminated_string("${f('open)}")]
#[case::number_ident("${123abc}")]
#[case::unexpected_character("${a;b}")]
fn lexer_errors(#[case] input: &str) {
    run_lexer_error_test(input);
}

#[test]
fn lexer_unterminated_block_kind() {
    assert_eq!(run_lexer_error_test("text ${a:plus(1)"), vec![LexerError::UnterminatedBlock]);
}

#[test]
fn lexer_depth_limit() {
    assert!(tokenize_with_limit("${${a}}", 2).is_ok());
    let errors = tokenize_with_limit("${${${a}}}", 2).expect_err("too deep");
    assert_eq!(errors[0].token, LexerError::NestingTooDeep(2));
}
