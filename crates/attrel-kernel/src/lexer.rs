//! Lexer for attribute expressions.
//!
//! Input is a template: free text with `${...}` blocks embedded in it. Text
//! outside blocks is gathered into synthesized [`Token::Text`] tokens; the
//! inside of each block is lexed with logos.
//!
//! # Token Categories
//!
//! - **Text**: everything outside `${...}`, with `$$` unescaped to `$`
//! - **Literals**: strings (`'...'` or `"..."`), integers, decimals, `true`/`false`
//! - **Punctuation**: `${`, `}`, `:`, `,`, `(`, `)`
//! - **Identifiers**: attribute and function names

use logos::{Logos, Span};
use std::fmt;

/// Default cap on expression depth: open blocks and parentheses plus the
/// calls chained inside them.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// A token with its span in the source text.
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned<T> {
    pub token: T,
    pub span: Span,
}

impl<T> Spanned<T> {
    pub fn new(token: T, span: Span) -> Self {
        Self { token, span }
    }
}

/// Lexer error types.
#[derive(Debug, Clone, PartialEq, Default, thiserror::Error)]
pub enum LexerError {
    #[default]
    #[error("unexpected character")]
    UnexpectedCharacter,
    #[error("unterminated string")]
    UnterminatedString,
    #[error("unterminated expression, missing '}}'")]
    UnterminatedBlock,
    #[error("invalid escape sequence")]
    InvalidEscape,
    #[error("invalid number")]
    InvalidNumber,
    #[error("identifier cannot start with digit: {0}")]
    InvalidNumberIdent(String),
    #[error("nesting depth exceeded (max {0})")]
    NestingTooDeep(usize),
}

/// Tokens produced inside `${...}`.
///
/// The order of variants matters for logos priority. Keywords come before
/// identifiers, and invalid number shapes outrank plain integers.
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(error = LexerError)]
#[logos(skip r"[ \t\r\n]+")]
pub enum Token {
    /// Literal text between blocks: synthesized by [`tokenize`], never lexed.
    Text(String),

    #[token("${")]
    BlockStart,

    #[token("}")]
    BlockEnd,

    #[token(":")]
    Colon,

    #[token(",")]
    Comma,

    #[token("(")]
    LParen,

    #[token(")")]
    RParen,

    #[token("true")]
    True,

    #[token("false")]
    False,

    /// Quoted string, either quote style - value has quotes removed and
    /// escapes processed
    #[regex(r#""([^"\\]|\\.)*""#, lex_string)]
    #[regex(r"'([^'\\]|\\.)*'", lex_string)]
    Str(String),

    /// Opening quote with no closing quote before end of input
    #[regex(r#""([^"\\]|\\.)*"#, lex_unterminated_string)]
    #[regex(r"'([^'\\]|\\.)*", lex_unterminated_string)]
    UnterminatedString,

    /// Integer literal - value is the parsed i64
    #[regex(r"-?[0-9]+", lex_int, priority = 2)]
    Int(i64),

    /// Decimal literal - read as a double, like every bare fractional number
    #[regex(r"-?[0-9]+\.[0-9]+([eE][+-]?[0-9]+)?", lex_float)]
    Float(f64),

    /// Invalid: number followed by identifier characters (like 123abc)
    #[regex(r"[0-9]+[a-zA-Z_][a-zA-Z0-9_]*", lex_invalid_number_ident, priority = 3)]
    InvalidNumberIdent,

    /// Attribute or function name. Dots and dashes are allowed so names
    /// like `mime.type` and `content-length` need no quoting.
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_.\-]*", lex_ident)]
    Ident(String),

    /// Comment: `# ...` to end of line
    #[regex(r"#[^\n\r]*", allow_greedy = true)]
    Comment,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Text(s) => write!(f, "text {s:?}"),
            Token::BlockStart => f.write_str("'${'"),
            Token::BlockEnd => f.write_str("'}'"),
            Token::Colon => f.write_str("':'"),
            Token::Comma => f.write_str("','"),
            Token::LParen => f.write_str("'('"),
            Token::RParen => f.write_str("')'"),
            Token::True => f.write_str("true"),
            Token::False => f.write_str("false"),
            Token::Str(s) => write!(f, "string {s:?}"),
            Token::UnterminatedString => f.write_str("unterminated string"),
            Token::Int(n) => write!(f, "number {n}"),
            Token::Float(x) => write!(f, "number {x}"),
            Token::InvalidNumberIdent => f.write_str("invalid identifier"),
            Token::Ident(s) => write!(f, "identifier {s}"),
            Token::Comment => f.write_str("comment"),
        }
    }
}

/// Lex a quoted string, processing escape sequences.
fn lex_string(lex: &mut logos::Lexer<Token>) -> Result<String, LexerError> {
    parse_string_literal(lex.slice())
}

/// Always an error; the token exists to name the problem precisely.
fn lex_unterminated_string(_lex: &mut logos::Lexer<Token>) -> Result<(), LexerError> {
    Err(LexerError::UnterminatedString)
}

/// Lex an integer literal.
fn lex_int(lex: &mut logos::Lexer<Token>) -> Result<i64, LexerError> {
    lex.slice().parse().map_err(|_| LexerError::InvalidNumber)
}

/// Lex a decimal literal.
fn lex_float(lex: &mut logos::Lexer<Token>) -> Result<f64, LexerError> {
    lex.slice().parse().map_err(|_| LexerError::InvalidNumber)
}

/// Lex an invalid number-identifier pattern (like 123abc).
/// Always returns Err to produce a lexer error instead of a token.
fn lex_invalid_number_ident(lex: &mut logos::Lexer<Token>) -> Result<(), LexerError> {
    Err(LexerError::InvalidNumberIdent(lex.slice().to_string()))
}

fn lex_ident(lex: &mut logos::Lexer<Token>) -> String {
    lex.slice().to_string()
}

/// Tracks how deep the expression under the cursor is.
///
/// Every open `${` or `(` is a frame; every `:` chains one more call onto
/// the current frame. A `,` starts a fresh argument chain.
#[derive(Debug, Default)]
struct DepthTracker {
    frames: Vec<usize>,
    depth: usize,
}

impl DepthTracker {
    fn open(&mut self) {
        self.frames.push(0);
        self.depth += 1;
    }

    fn close(&mut self) {
        if let Some(calls) = self.frames.pop() {
            self.depth -= calls + 1;
        }
    }

    fn chain(&mut self) {
        if let Some(calls) = self.frames.last_mut() {
            *calls += 1;
            self.depth += 1;
        }
    }

    fn next_arg(&mut self) {
        if let Some(calls) = self.frames.last_mut() {
            self.depth -= *calls;
            *calls = 0;
        }
    }
}

/// Tokenize a template with the default depth limit.
pub fn tokenize(source: &str) -> Result<Vec<Spanned<Token>>, Vec<Spanned<LexerError>>> {
    tokenize_with_limit(source, DEFAULT_MAX_DEPTH)
}

/// Tokenize a template into text and block tokens.
///
/// Returns errors with their positions for nice error messages. Comments
/// inside blocks are dropped.
pub fn tokenize_with_limit(
    source: &str,
    max_depth: usize,
) -> Result<Vec<Spanned<Token>>, Vec<Spanned<LexerError>>> {
    let mut tokens = Vec::new();
    let mut errors = Vec::new();
    let mut text = String::new();
    let mut text_start = 0;
    let mut pos = 0;

    while pos < source.len() {
        let rest = &source[pos..];

        if rest.starts_with("$$") {
            if text.is_empty() {
                text_start = pos;
            }
            text.push('$');
            pos += 2;
            continue;
        }

        if !rest.starts_with("${") {
            let Some(ch) = rest.chars().next() else {
                break;
            };
            if text.is_empty() {
                text_start = pos;
            }
            text.push(ch);
            pos += ch.len_utf8();
            continue;
        }

        if !text.is_empty() {
            tokens.push(Spanned::new(Token::Text(std::mem::take(&mut text)), text_start..pos));
        }

        let mut tracker = DepthTracker::default();
        let mut blocks = 0usize;
        let mut block_end = None;
        let errors_before = errors.len();

        for (result, span) in Token::lexer(rest).spanned() {
            let span = span.start + pos..span.end + pos;
            let token = match result {
                Ok(token) => token,
                Err(err) => {
                    errors.push(Spanned::new(err, span));
                    continue;
                }
            };

            match token {
                Token::BlockStart | Token::LParen => {
                    if matches!(token, Token::BlockStart) {
                        blocks += 1;
                    }
                    tracker.open();
                    if tracker.depth > max_depth {
                        errors.push(Spanned::new(LexerError::NestingTooDeep(max_depth), span));
                        return Err(errors);
                    }
                }
                Token::BlockEnd | Token::RParen => {
                    if matches!(token, Token::BlockEnd) {
                        blocks = blocks.saturating_sub(1);
                    }
                    tracker.close();
                }
                Token::Colon => {
                    tracker.chain();
                    if tracker.depth > max_depth {
                        errors.push(Spanned::new(LexerError::NestingTooDeep(max_depth), span));
                        return Err(errors);
                    }
                }
                Token::Comma => tracker.next_arg(),
                Token::Comment => continue,
                _ => {}
            }

            let end = span.end;
            let closes = matches!(token, Token::BlockEnd) && blocks == 0;
            tokens.push(Spanned::new(token, span));
            if closes {
                block_end = Some(end);
                break;
            }
        }

        match block_end {
            Some(end) => pos = end,
            None => {
                if errors.len() == errors_before {
                    errors.push(Spanned::new(LexerError::UnterminatedBlock, pos..source.len()));
                }
                pos = source.len();
            }
        }
    }

    if !text.is_empty() {
        tokens.push(Spanned::new(Token::Text(text), text_start..source.len()));
    }

    if errors.is_empty() {
        Ok(tokens)
    } else {
        Err(errors)
    }
}

/// Extract the content of a quoted string (removes quotes, processes escapes).
///
/// Both quote styles understand `\n`, `\t`, `\r`, `\\`, `\'` and `\"`.
/// Unknown escapes keep their backslash so regex-like text survives.
pub fn parse_string_literal(source: &str) -> Result<String, LexerError> {
    let quote = match source.chars().next() {
        Some(q @ ('"' | '\'')) => q,
        _ => return Err(LexerError::UnterminatedString),
    };
    if source.len() < 2 || !source.ends_with(quote) {
        return Err(LexerError::UnterminatedString);
    }

    let inner = &source[1..source.len() - 1];
    let mut result = String::with_capacity(inner.len());
    let mut chars = inner.chars();

    while let Some(ch) = chars.next() {
        if ch != '\\' {
            result.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') => result.push('\n'),
            Some('t') => result.push('\t'),
            Some('r') => result.push('\r'),
            Some('\\') => result.push('\\'),
            Some('"') => result.push('"'),
            Some('\'') => result.push('\''),
            Some(next) => {
                result.push('\\');
                result.push(next);
            }
            None => return Err(LexerError::InvalidEscape),
        }
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(source: &str) -> Vec<Token> {
        tokenize(source)
            .expect("lexer should succeed")
            .into_iter()
            .map(|s| s.token)
            .collect()
    }

    fn ident(s: &str) -> Token {
        Token::Ident(s.to_string())
    }

    fn lex_errors(source: &str) -> Vec<LexerError> {
        tokenize(source)
            .expect_err("lexer should fail")
            .into_iter()
            .map(|s| s.token)
            .collect()
    }

    // ═══════════════════════════════════════════════════════════════════
    // Text and blocks
    // ═══════════════════════════════════════════════════════════════════

    #[test]
    fn plain_text() {
        assert_eq!(lex("hello world"), vec![Token::Text("hello world".to_string())]);
        assert_eq!(lex(""), vec![]);
    }

    #[test]
    fn single_block() {
        assert_eq!(lex("${a}"), vec![Token::BlockStart, ident("a"), Token::BlockEnd]);
    }

    #[test]
    fn text_around_blocks() {
        assert_eq!(
            lex("x=${a}, y=${b}!"),
            vec![
                Token::Text("x=".to_string()),
                Token::BlockStart,
                ident("a"),
                Token::BlockEnd,
                Token::Text(", y=".to_string()),
                Token::BlockStart,
                ident("b"),
                Token::BlockEnd,
                Token::Text("!".to_string()),
            ]
        );
    }

    #[test]
    fn nested_block_closes_at_matching_brace() {
        assert_eq!(
            lex("${a:plus(${b})}z"),
            vec![
                Token::BlockStart,
                ident("a"),
                Token::Colon,
                ident("plus"),
                Token::LParen,
                Token::BlockStart,
                ident("b"),
                Token::BlockEnd,
                Token::RParen,
                Token::BlockEnd,
                Token::Text("z".to_string()),
            ]
        );
    }

    #[test]
    fn dollar_escapes() {
        assert_eq!(lex("$${a}"), vec![Token::Text("${a}".to_string())]);
        assert_eq!(lex("cost $$5"), vec![Token::Text("cost $5".to_string())]);
        assert_eq!(lex("just $ here"), vec![Token::Text("just $ here".to_string())]);
        assert_eq!(lex("end$"), vec![Token::Text("end$".to_string())]);
    }

    #[test]
    fn brace_inside_string_does_not_close_block() {
        assert_eq!(
            lex("${a:format('}')}"),
            vec![
                Token::BlockStart,
                ident("a"),
                Token::Colon,
                ident("format"),
                Token::LParen,
                Token::Str("}".to_string()),
                Token::RParen,
                Token::BlockEnd,
            ]
        );
    }

    #[test]
    fn text_spans_cover_source() {
        let tokens = tokenize("ab${c}d").expect("ok");
        assert_eq!(tokens[0].span, 0..2);
        assert_eq!(tokens[1].span, 2..4);
        assert_eq!(tokens[2].span, 4..5);
        assert_eq!(tokens[3].span, 5..6);
        assert_eq!(tokens[4].span, 6..7);
    }

    // ═══════════════════════════════════════════════════════════════════
    // Literals
    // ═══════════════════════════════════════════════════════════════════

    #[test]
    fn numbers() {
        assert_eq!(lex("${f(42)}")[3], Token::Int(42));
        assert_eq!(lex("${f(-13)}")[3], Token::Int(-13));
        assert_eq!(lex("${f(3.14)}")[3], Token::Float(3.14));
        assert_eq!(lex("${f(1.5e3)}")[3], Token::Float(1500.0));
    }

    #[test]
    fn strings() {
        assert_eq!(lex("${f('up')}")[3], Token::Str("up".to_string()));
        assert_eq!(lex(r#"${f("up")}"#)[3], Token::Str("up".to_string()));
        assert_eq!(lex(r"${f('it\'s')}")[3], Token::Str("it's".to_string()));
        assert_eq!(lex(r#"${f("tab\there")}"#)[3], Token::Str("tab\there".to_string()));
        assert_eq!(lex("${f('')}")[3], Token::Str(String::new()));
    }

    #[test]
    fn booleans_and_identifiers() {
        assert_eq!(lex("${f(true)}")[3], Token::True);
        assert_eq!(lex("${f(false)}")[3], Token::False);
        assert_eq!(lex("${mime.type}")[1], ident("mime.type"));
        assert_eq!(lex("${content-length}")[1], ident("content-length"));
        assert_eq!(lex("${trueish}")[1], ident("trueish"));
    }

    #[test]
    fn whitespace_and_comments_inside_blocks() {
        assert_eq!(
            lex("${ a\n  :plus( 1 ) # trailing\n}"),
            vec![
                Token::BlockStart,
                ident("a"),
                Token::Colon,
                ident("plus"),
                Token::LParen,
                Token::Int(1),
                Token::RParen,
                Token::BlockEnd,
            ]
        );
    }

    // ═══════════════════════════════════════════════════════════════════
    // Errors
    // ═══════════════════════════════════════════════════════════════════

    #[test]
    fn unterminated_block() {
        assert_eq!(lex_errors("abc ${a:plus(1)"), vec![LexerError::UnterminatedBlock]);
    }

    #[test]
    fn unterminated_string() {
        assert_eq!(lex_errors("${a:f('oops)}"), vec![LexerError::UnterminatedString]);
    }

    #[test]
    fn digit_leading_identifier() {
        assert_eq!(
            lex_errors("${123abc}"),
            vec![LexerError::InvalidNumberIdent("123abc".to_string())]
        );
    }

    #[test]
    fn unexpected_character() {
        assert_eq!(lex_errors("${a;b}"), vec![LexerError::UnexpectedCharacter]);
    }

    #[test]
    fn nesting_limit() {
        let deep = format!("{}a{}", "${".repeat(5), "}".repeat(5));
        assert!(tokenize_with_limit(&deep, 5).is_ok());
        let errors = tokenize_with_limit(&deep, 4).expect_err("too deep");
        assert_eq!(errors[0].token, LexerError::NestingTooDeep(4));
    }

    #[test]
    fn chained_calls_count_toward_depth() {
        assert!(tokenize_with_limit("${a:b():c()}", 4).is_ok());
        assert!(tokenize_with_limit("${a:b():c():d()}", 4).is_err());
        // each argument starts a fresh chain
        assert!(tokenize_with_limit("${f(${a}:b(), ${c}:d())}", 4).is_ok());
    }

    #[test]
    fn string_literal_escapes() {
        assert_eq!(parse_string_literal(r"'a\nb'").expect("ok"), "a\nb");
        assert_eq!(parse_string_literal(r"'a\.b'").expect("ok"), "a\\.b");
        assert_eq!(parse_string_literal(r#""q\"q""#).expect("ok"), "q\"q");
        assert!(parse_string_literal("'open").is_err());
    }
}
