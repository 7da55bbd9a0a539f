// SPDX-License-Identifier: Apache-2.0 OR MIT
use crate::ast::Span;
use thiserror::Error;

/// Unified error type for the template engine.
///
/// Parse failures carry the byte `Span` of the offending region when one is
/// known. Filter failures record the filter name so the composer can decide
/// between aborting the render and substituting an empty string (lenient
/// mode). Unknown names and unknown filters are *not* errors; they travel
/// through evaluation as `Value::Unresolved`.
#[derive(Debug, Error)]
pub enum Error {
    #[error("parse error: {message}")]
    Parse {
        message: String,
        span: Option<Span>,
    },
    #[error("page not found: {name}")]
    PageNotFound { name: String },
    #[error("method invocation is not allowed in a binding expression: {expression}")]
    BindingExpression { expression: String },
    #[error("filter '{name}' failed: {message}")]
    Filter {
        name: String,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
    #[error("render cancelled")]
    Cancelled,
    #[error("file system error on '{path}'")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    pub fn parse(message: impl Into<String>, span: Option<Span>) -> Self {
        Error::Parse {
            message: message.into(),
            span,
        }
    }

    pub fn parse_with_span(message: impl Into<String>, span: Span) -> Self {
        Self::parse(message, Some(span))
    }

    pub fn page_not_found(name: impl Into<String>) -> Self {
        Error::PageNotFound { name: name.into() }
    }

    pub fn binding(expression: impl Into<String>) -> Self {
        Error::BindingExpression {
            expression: expression.into(),
        }
    }

    pub fn filter(name: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Filter {
            name: name.into(),
            message: message.into(),
            source: None,
        }
    }

    pub fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }

    /// Byte span of the offending source region, when known.
    pub fn span(&self) -> Option<Span> {
        match self {
            Error::Parse { span, .. } => *span,
            _ => None,
        }
    }
}
