//! Parser for attribute expressions.
//!
//! Transforms a token stream from the lexer into a [`Template`].
//! Uses chumsky for parser combinators.
//!
//! Grammar, over lexer tokens:
//!
//! ```text
//! template := (TEXT | block)*
//! block    := '${' chain '}'
//! chain    := root (':' call)*
//! root     := call | IDENT | STRING | block      (bare or quoted attribute name)
//! call     := IDENT '(' (arg (',' arg)*)? ')'
//! arg      := (STRING | INT | FLOAT | true | false | block) (':' call)*
//! ```

use crate::ast::{Expr, Span as AstSpan, Template, TemplatePart};
use crate::lexer::{self, DEFAULT_MAX_DEPTH, Token};
use attrel_types::Value;
use chumsky::{input::ValueInput, prelude::*};

/// Span type used throughout the parser.
pub type Span = SimpleSpan;

/// Parse error with location and context.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{message} at {span:?}")]
pub struct ParseError {
    pub span: Span,
    pub message: String,
}

impl ParseError {
    pub fn new(span: impl Into<Span>, message: impl Into<String>) -> Self {
        Self {
            span: span.into(),
            message: message.into(),
        }
    }
}

/// Parse a template with the default depth limit.
pub fn parse(source: &str) -> Result<Template, Vec<ParseError>> {
    parse_with_limit(source, DEFAULT_MAX_DEPTH)
}

/// Parse a template, rejecting expressions nested deeper than `max_depth`.
///
/// Parsing never looks at attribute values; the same text always yields the
/// same tree.
pub fn parse_with_limit(source: &str, max_depth: usize) -> Result<Template, Vec<ParseError>> {
    // Tokenize with logos
    let tokens = lexer::tokenize_with_limit(source, max_depth).map_err(|errs| {
        errs.into_iter()
            .map(|e| ParseError {
                span: (e.span.start..e.span.end).into(),
                message: format!("lexer error: {}", e.token),
            })
            .collect::<Vec<_>>()
    })?;

    // Convert tokens to (Token, SimpleSpan) pairs
    let tokens: Vec<(Token, Span)> = tokens
        .into_iter()
        .map(|spanned| (spanned.token, (spanned.span.start..spanned.span.end).into()))
        .collect();

    // End-of-input span
    let end_span: Span = (source.len()..source.len()).into();

    let parser = template_parser(max_depth);
    let result = parser.parse(tokens.as_slice().map(end_span, |(t, s)| (t, s)));

    result.into_result().map_err(|errs| {
        errs.into_iter()
            .map(|e| ParseError {
                span: *e.span(),
                message: e.to_string(),
            })
            .collect()
    })
}

// ═══════════════════════════════════════════════════════════════════════════
// Parser Combinators - generic over input type
// ═══════════════════════════════════════════════════════════════════════════

/// Top-level template parser.
fn template_parser<'tokens, I>(
    max_depth: usize,
) -> impl Parser<'tokens, I, Template, extra::Err<Rich<'tokens, Token, Span>>>
where
    I: ValueInput<'tokens, Token = Token, Span = Span>,
{
    let text = select! {
        Token::Text(s) => TemplatePart::Text(s),
    }
    .labelled("text");

    let block = block_parser(max_depth).map_with(|expr, e| {
        let span: Span = e.span();
        TemplatePart::Block {
            expr,
            span: span.start..span.end,
        }
    });

    choice((text, block))
        .repeated()
        .collect::<Vec<_>>()
        .map(|parts| Template { parts })
}

/// A `${...}` block, returning the chain inside it.
///
/// Uses `recursive` because blocks nest as chain roots and as arguments.
fn block_parser<'tokens, I>(
    max_depth: usize,
) -> impl Parser<'tokens, I, Expr, extra::Err<Rich<'tokens, Token, Span>>> + Clone
where
    I: ValueInput<'tokens, Token = Token, Span = Span>,
{
    recursive(|block| {
        let embedded = block.map(|inner| Expr::Embedded(Box::new(inner)));

        let arg_root = choice((
            string_arg_parser(max_depth),
            literal_parser().map(Expr::Literal),
            embedded.clone(),
        ))
        .labelled("argument");

        // name(args) -> (name, args, span); shared by chained and standalone calls
        let call = recursive(|call| {
            let arg = arg_root.foldl(
                just(Token::Colon).ignore_then(call).repeated(),
                |receiver, (name, args, span)| Expr::call(receiver, name, args, span),
            );

            ident_parser()
                .then(
                    arg.separated_by(just(Token::Comma))
                        .collect::<Vec<_>>()
                        .delimited_by(just(Token::LParen), just(Token::RParen)),
                )
                .map_with(|(name, args), e| {
                    let span: Span = e.span();
                    (name, args, span.start..span.end)
                })
                .labelled("function call")
        });

        let function = call
            .clone()
            .map(|(name, args, span): (String, Vec<Expr>, AstSpan)| Expr::Function {
                name,
                args,
                span,
            });

        let root = choice((function, attribute_parser(), embedded));

        let chain = root.foldl(
            just(Token::Colon).ignore_then(call).repeated(),
            |receiver, (name, args, span)| Expr::call(receiver, name, args, span),
        );

        just(Token::BlockStart)
            .ignore_then(chain)
            .then_ignore(just(Token::BlockEnd))
            .labelled("expression")
    })
    .boxed()
}

/// Attribute name in chain-root position: bare or quoted.
fn attribute_parser<'tokens, I>(
) -> impl Parser<'tokens, I, Expr, extra::Err<Rich<'tokens, Token, Span>>> + Clone
where
    I: ValueInput<'tokens, Token = Token, Span = Span>,
{
    select! {
        Token::Ident(name) => Expr::AttributeRef(name),
        Token::Str(name) => Expr::AttributeRef(name),
        Token::True => Expr::AttributeRef("true".to_string()),
        Token::False => Expr::AttributeRef("false".to_string()),
    }
    .labelled("attribute name")
}

/// Quoted argument. Text containing `${` is itself a template.
fn string_arg_parser<'tokens, I>(
    max_depth: usize,
) -> impl Parser<'tokens, I, Expr, extra::Err<Rich<'tokens, Token, Span>>> + Clone
where
    I: ValueInput<'tokens, Token = Token, Span = Span>,
{
    select! {
        Token::Str(s) => s,
    }
    .try_map(move |text, span| string_argument(text, span, max_depth))
    .labelled("string")
}

fn string_argument<'tokens>(
    text: String,
    span: Span,
    max_depth: usize,
) -> Result<Expr, Rich<'tokens, Token, Span>> {
    if !text.contains("${") {
        return Ok(Expr::Literal(Value::Str(text)));
    }
    let mut template = parse_with_limit(&text, max_depth).map_err(|errors| {
        let detail = errors
            .iter()
            .map(|e| e.message.as_str())
            .collect::<Vec<_>>()
            .join("; ");
        Rich::custom(span, format!("invalid expression in string: {detail}"))
    })?;

    // only escaped dollars: plain text after all
    if template.is_literal() {
        let text = template
            .parts
            .into_iter()
            .filter_map(|part| match part {
                TemplatePart::Text(t) => Some(t),
                TemplatePart::Block { .. } => None,
            })
            .collect::<String>();
        return Ok(Expr::Literal(Value::Str(text)));
    }
    // nested spans start after the opening quote
    shift_template(&mut template, span.start + 1);
    Ok(Expr::Template(template))
}

/// Move every span in `template` `offset` bytes to the right.
fn shift_template(template: &mut Template, offset: usize) {
    for part in &mut template.parts {
        if let TemplatePart::Block { expr, span } = part {
            *span = span.start + offset..span.end + offset;
            shift_expr(expr, offset);
        }
    }
}

fn shift_expr(expr: &mut Expr, offset: usize) {
    match expr {
        Expr::AttributeRef(_) | Expr::Literal(_) => {}
        Expr::Call { receiver, args, span, .. } => {
            *span = span.start + offset..span.end + offset;
            shift_expr(receiver, offset);
            args.iter_mut().for_each(|arg| shift_expr(arg, offset));
        }
        Expr::Function { args, span, .. } => {
            *span = span.start + offset..span.end + offset;
            args.iter_mut().for_each(|arg| shift_expr(arg, offset));
        }
        Expr::Embedded(inner) => shift_expr(inner, offset),
        Expr::Template(template) => shift_template(template, offset),
    }
}

/// Literal value parser (excluding strings, which are handled by string_arg_parser).
fn literal_parser<'tokens, I>(
) -> impl Parser<'tokens, I, Value, extra::Err<Rich<'tokens, Token, Span>>> + Clone
where
    I: ValueInput<'tokens, Token = Token, Span = Span>,
{
    select! {
        Token::True => Value::Bool(true),
        Token::False => Value::Bool(false),
        Token::Int(n) => Value::Int64(n),
        Token::Float(f) => Value::Float64(f),
    }
    .labelled("literal")
}

/// Identifier parser.
fn ident_parser<'tokens, I>(
) -> impl Parser<'tokens, I, String, extra::Err<Rich<'tokens, Token, Span>>> + Clone
where
    I: ValueInput<'tokens, Token = Token, Span = Span>,
{
    select! {
        Token::Ident(s) => s,
    }
    .labelled("identifier")
}
