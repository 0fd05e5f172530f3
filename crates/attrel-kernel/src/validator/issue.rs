//! Validation issues and formatting.

use std::fmt;

/// Severity level for validation issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Errors reject the template before evaluation.
    Error,
    /// Warnings are logged; the template still evaluates.
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

/// Categorizes validation issues for filtering and tooling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueCode {
    /// No function has this name.
    UnknownFunction,
    /// The function exists but not with this many arguments.
    WrongArity,
    /// A function that needs a subject used at the start of a chain.
    MissingSubject,
    /// A standalone function chained after a subject.
    UnexpectedSubject,
    /// The subject's kind can never convert to what the function takes.
    IncompatibleReceiver,
    /// An argument's kind can never convert to the parameter's kind.
    IncompatibleArgument,
    /// Rounding mode literal that names no mode.
    UnknownRoundingMode,
    /// Zone literal that names no zone.
    UnknownZone,
}

impl IssueCode {
    /// Returns a short code string for the issue.
    pub fn code(&self) -> &'static str {
        match self {
            IssueCode::UnknownFunction => "E001",
            IssueCode::WrongArity => "E002",
            IssueCode::MissingSubject => "E003",
            IssueCode::UnexpectedSubject => "E004",
            IssueCode::IncompatibleReceiver => "E005",
            IssueCode::IncompatibleArgument => "E006",
            IssueCode::UnknownRoundingMode => "W001",
            IssueCode::UnknownZone => "W002",
        }
    }

    /// Default severity for this issue code.
    pub fn default_severity(&self) -> Severity {
        match self {
            IssueCode::UnknownFunction
            | IssueCode::WrongArity
            | IssueCode::MissingSubject
            | IssueCode::UnexpectedSubject
            | IssueCode::IncompatibleReceiver
            | IssueCode::IncompatibleArgument => Severity::Error,

            // both fall back to a default at runtime
            IssueCode::UnknownRoundingMode | IssueCode::UnknownZone => Severity::Warning,
        }
    }
}

impl fmt::Display for IssueCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Byte range of a block or call in the template text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// This span cut to `source`, with both ends on char boundaries.
    pub fn clamp_to(self, source: &str) -> Span {
        let mut start = self.start.min(source.len());
        while !source.is_char_boundary(start) {
            start -= 1;
        }
        let mut end = self.end.clamp(start, source.len());
        while !source.is_char_boundary(end) {
            end += 1;
        }
        Span { start, end }
    }

    /// 1-indexed (line, column) of the span start. Columns count chars.
    pub fn to_line_col(&self, source: &str) -> (usize, usize) {
        let before = &source[..self.clamp_to(source).start];
        let line_start = before.rfind('\n').map_or(0, |i| i + 1);
        let line = before.matches('\n').count() + 1;
        (line, before[line_start..].chars().count() + 1)
    }

    /// `line:col` of the span start.
    pub fn format_location(&self, source: &str) -> String {
        let (line, col) = self.to_line_col(source);
        format!("{line}:{col}")
    }

    /// The source line holding the span start, with carets under the span.
    pub fn excerpt(&self, source: &str) -> Option<String> {
        if source.is_empty() {
            return None;
        }
        let span = self.clamp_to(source);
        let line_start = source[..span.start].rfind('\n').map_or(0, |i| i + 1);
        let line_end = source[span.start..]
            .find('\n')
            .map_or(source.len(), |i| span.start + i);

        let indent = source[line_start..span.start].chars().count();
        let width = source[span.start..span.end.min(line_end)].chars().count().max(1);
        Some(format!(
            "  | {}\n  | {}{}",
            &source[line_start..line_end],
            " ".repeat(indent),
            "^".repeat(width)
        ))
    }
}

impl From<&std::ops::Range<usize>> for Span {
    fn from(range: &std::ops::Range<usize>) -> Self {
        Self::new(range.start, range.end)
    }
}

/// A problem found in a template before evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationIssue {
    pub severity: Severity,
    pub code: IssueCode,
    pub message: String,
    pub span: Option<Span>,
    pub suggestion: Option<String>,
}

impl ValidationIssue {
    /// An issue at the code's default severity.
    pub fn new(code: IssueCode, message: impl Into<String>) -> Self {
        Self {
            severity: code.default_severity(),
            code,
            message: message.into(),
            span: None,
            suggestion: None,
        }
    }

    pub fn with_span(mut self, span: impl Into<Span>) -> Self {
        self.span = Some(span.into());
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    /// The issue with its location, hint and a caret excerpt of `source`.
    pub fn format(&self, source: &str) -> String {
        let mut result = match &self.span {
            Some(span) => format!("{}: {self}", span.format_location(source)),
            None => self.to_string(),
        };
        if let Some(suggestion) = &self.suggestion {
            result.push_str(&format!("\n  hint: {suggestion}"));
        }
        if let Some(excerpt) = self.span.and_then(|span| span.excerpt(source)) {
            result.push('\n');
            result.push_str(&excerpt);
        }
        result
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]: {}", self.severity, self.code, self.message)
    }
}
