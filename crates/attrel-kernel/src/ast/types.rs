//! AST type definitions.

use attrel_types::Value;

/// Byte range in the source text.
pub type Span = std::ops::Range<usize>;

/// A parsed template: literal text interleaved with `${...}` blocks.
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    pub parts: Vec<TemplatePart>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TemplatePart {
    /// Literal text, already unescaped (`$$` is a single `$` here).
    Text(String),
    /// A top-level `${...}` block. Runtime failures inside it are contained
    /// to the block, which then renders as the empty string.
    Block { expr: Expr, span: Span },
}

impl Template {
    /// True when the template has no blocks and renders to fixed text.
    pub fn is_literal(&self) -> bool {
        self.parts.iter().all(|part| matches!(part, TemplatePart::Text(_)))
    }

    /// The top-level block expressions, in source order.
    pub fn blocks(&self) -> impl Iterator<Item = &Expr> {
        self.parts.iter().filter_map(|part| match part {
            TemplatePart::Block { expr, .. } => Some(expr),
            TemplatePart::Text(_) => None,
        })
    }
}

/// An expression inside a block.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Named attribute lookup: `${filename}` or `${'my attr'}`.
    AttributeRef(String),
    /// Constant argument: `'up'`, `2`, `3.14`, `true`.
    Literal(Value),
    /// `receiver:name(args)`. The receiver is evaluated once and passed by value.
    Call {
        receiver: Box<Expr>,
        name: String,
        args: Vec<Expr>,
        span: Span,
    },
    /// Receiver-less function in chain-root position: `literal('x')`, `now()`.
    Function {
        name: String,
        args: Vec<Expr>,
        span: Span,
    },
    /// A `${...}` block used as a chain root or an argument.
    Embedded(Box<Expr>),
    /// A quoted argument containing `${...}`, rendered like a top-level template.
    Template(Template),
}

impl Expr {
    pub fn call(receiver: Expr, name: impl Into<String>, args: Vec<Expr>, span: Span) -> Expr {
        Expr::Call {
            receiver: Box::new(receiver),
            name: name.into(),
            args,
            span,
        }
    }
}
