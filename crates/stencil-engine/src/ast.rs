// SPDX-License-Identifier: Apache-2.0 OR MIT
use crate::value::Value;

/// Byte offsets into the original template source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }
}

/// One segment of a template body: a run of literal text, or a placeholder
/// expression to evaluate.
#[derive(Debug, Clone)]
pub enum Segment {
    Text(TextSegment),
    Placeholder(Placeholder),
}

impl Segment {
    pub fn span(&self) -> Span {
        match self {
            Segment::Text(text) => text.span,
            Segment::Placeholder(ph) => ph.span,
        }
    }
}

/// Raw text emitted verbatim.
#[derive(Debug, Clone)]
pub struct TextSegment {
    pub span: Span,
    pub text: String,
}

impl TextSegment {
    pub fn new(span: Span, text: impl Into<String>) -> Self {
        Self {
            span,
            text: text.into(),
        }
    }
}

/// A parsed `{{ … }}` placeholder. `source` is the full original span
/// including the delimiters, kept so an unresolved evaluation can re-emit it
/// verbatim.
#[derive(Debug, Clone)]
pub struct Placeholder {
    pub span: Span,
    pub source: String,
    pub expr: PipedExpr,
}

/// A head term threaded through zero or more filter invocations,
/// left-to-right.
#[derive(Debug, Clone)]
pub struct PipedExpr {
    pub head: Expression,
    pub chain: Vec<FilterCall>,
}

impl PipedExpr {
    pub fn bare(head: Expression) -> Self {
        Self {
            head,
            chain: Vec::new(),
        }
    }
}

/// A named filter invocation with its argument expressions.
#[derive(Debug, Clone)]
pub struct FilterCall {
    pub name: String,
    pub args: Vec<Expression>,
}

impl FilterCall {
    pub fn new(name: impl Into<String>, args: Vec<Expression>) -> Self {
        Self {
            name: name.into(),
            args,
        }
    }
}

/// Expression node.
#[derive(Debug, Clone)]
pub enum Expression {
    /// A scalar literal (`42`, `'text'`, `true`, `null`).
    Literal(Value),
    /// A dotted/indexed path rooted at an identifier.
    Binding(Binding),
    /// `{ key: expr, … }`
    ObjectLit(Vec<(String, Expression)>),
    /// `[ expr, … ]`
    ArrayLit(Vec<Expression>),
    /// A prefix-form filter call used as a term (`f(a, b)`).
    Call(FilterCall),
    /// A parenthes-free piped sub-expression appearing in argument position
    /// (`f(a | upper)`).
    SubExpr(Box<PipedExpr>),
}

/// A binding path: head identifier plus field/index steps.
#[derive(Debug, Clone)]
pub struct Binding {
    pub head: String,
    pub steps: Vec<PathStep>,
}

impl Binding {
    pub fn name(head: impl Into<String>) -> Self {
        Self {
            head: head.into(),
            steps: Vec::new(),
        }
    }
}

/// One step of a binding path.
#[derive(Debug, Clone)]
pub enum PathStep {
    /// `.name`
    Field(String),
    /// `[expr]`: string key on mappings, integer index on lists.
    Index(Box<Expression>),
}
