use thiserror::Error;

use crate::diagnostic::{Diagnostic, Span};

/// Why an expression was rejected.
///
/// Each pipeline stage owns one variant. A stage either succeeds or returns
/// its own kind; nothing in the library swallows or converts them.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// The text contains something that cannot start a token.
    #[error("Lex error at position {}: {message}", .span.start)]
    Lex { span: Span, message: String },

    /// The tokens do not form an expression of the calculator grammar.
    ///
    /// `opened` is the bracket a missing or mismatched closer belongs to.
    #[error("Parse error at position {}: {message}", .span.start)]
    Parse {
        span: Span,
        message: String,
        opened: Option<Span>,
    },

    /// The expression is well formed but an operation failed.
    #[error("Evaluation error: {0}")]
    Eval(#[from] EvalError),
}

/// Runtime failures of a well-formed expression.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    #[error("division by zero")]
    DivisionByZero,

    #[error("negative shift count")]
    NegativeShift,

    #[error("unsupported operand types: expected {expected}, got {got}")]
    Type { expected: String, got: String },

    #[error("value after {marker} must be {expected}, not {got}")]
    Spread {
        marker: &'static str,
        expected: &'static str,
        got: &'static str,
    },

    #[error("unhashable type: '{0}'")]
    Unhashable(&'static str),

    #[error("integer overflow in {0}")]
    Overflow(&'static str),

    #[error("unsupported operation: {0}")]
    Unsupported(String),
}

impl Error {
    pub(crate) fn lex(span: impl Into<Span>, message: impl Into<String>) -> Self {
        Error::Lex {
            span: span.into(),
            message: message.into(),
        }
    }

    pub(crate) fn parse(span: impl Into<Span>, message: impl Into<String>) -> Self {
        Error::Parse {
            span: span.into(),
            message: message.into(),
            opened: None,
        }
    }

    /// Point a parse error back at the bracket it failed to close.
    pub(crate) fn opened_at(mut self, open: Span) -> Self {
        if let Error::Parse { opened, .. } = &mut self {
            *opened = Some(open);
        }
        self
    }

    /// Byte offset of the offending input, for lex and parse errors.
    pub fn position(&self) -> Option<usize> {
        match self {
            Error::Lex { span, .. } | Error::Parse { span, .. } => Some(span.start),
            Error::Eval(_) => None,
        }
    }

    /// Short name of the failing stage, used in log events.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Lex { .. } => "lex",
            Error::Parse { .. } => "parse",
            Error::Eval(_) => "eval",
        }
    }

    /// Render this error against the expression text it came from.
    pub fn to_diagnostic(&self, source: &str) -> Diagnostic {
        match self {
            Error::Lex { span, message } => Diagnostic::new(message.clone())
                .with_source(source)
                .with_label(*span, ""),
            Error::Parse {
                span,
                message,
                opened,
            } => {
                let mut diagnostic = Diagnostic::new(message.clone())
                    .with_source(source)
                    .with_label(*span, "");
                if let Some(open) = opened {
                    diagnostic = diagnostic.with_related(*open, "opened here");
                }
                if message.starts_with("names are not allowed") {
                    diagnostic.with_help(
                        "only literals, operators and container displays can be evaluated",
                    )
                } else {
                    diagnostic
                }
            }
            Error::Eval(err) => Diagnostic::new(err.to_string())
                .with_source(source)
                .with_note("the expression parsed but failed while evaluating"),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_and_kind() {
        let err = Error::parse(Span::new(3, 4), "unexpected `)`");
        assert_eq!(err.position(), Some(3));
        assert_eq!(err.kind(), "parse");
        assert_eq!(err.to_string(), "Parse error at position 3: unexpected `)`");

        let err = Error::from(EvalError::DivisionByZero);
        assert_eq!(err.position(), None);
        assert_eq!(err.kind(), "eval");
        assert_eq!(err.to_string(), "Evaluation error: division by zero");
    }

    #[test]
    fn test_name_diagnostic_has_help() {
        let err = Error::parse(Span::new(0, 3), "names are not allowed: `abs`");
        let output = err.to_diagnostic("abs(1)").to_string();
        assert!(output.contains("error: names are not allowed: `abs`"));
        assert!(output.contains("1 | abs(1)"));
        assert!(output.contains("^^^"));
        assert!(output.contains("help: only literals"));
    }

    #[test]
    fn test_unclosed_diagnostic_points_at_opener() {
        let err = Error::parse(Span::point(6), "unclosed `[` at position 0: expected `]`")
            .opened_at(Span::new(0, 1));
        assert_eq!(err.position(), Some(6));
        assert_eq!(
            err.to_diagnostic("[1,\n 2").to_string(),
            "error: unclosed `[` at position 0: expected `]`\n  |\n1 | [1,\n  | - opened here\n\
             2 |  2\n  |   ^\n  |\n"
        );

        // Only parse errors carry an opener.
        let lex = Error::lex(Span::new(0, 1), "unexpected character `@`");
        assert_eq!(lex.clone().opened_at(Span::new(0, 1)), lex);
    }
}
