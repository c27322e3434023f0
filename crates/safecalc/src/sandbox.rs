use tracing::{debug, debug_span, trace};

use crate::ast::Expr;
use crate::diagnostic::Span;
use crate::error::{Error, Result};
use crate::eval;
use crate::parser;
use crate::token;
use crate::value::Value;

/// Resource limits applied before and during parsing.
///
/// Evaluation itself needs no limit: every operation is checked and the
/// tree it walks is bounded by the parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Limits {
    /// Longest accepted input, in bytes.
    pub max_input_len: usize,
    /// Deepest accepted nesting of parentheses, displays and prefix operators.
    pub max_depth: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_input_len: 4096,
            max_depth: 100,
        }
    }
}

impl Limits {
    /// Set the maximum input length in bytes.
    pub fn with_max_input_len(mut self, bytes: usize) -> Self {
        self.max_input_len = bytes;
        self
    }

    /// Set the maximum nesting depth.
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }
}

/// A calculator for untrusted expressions.
///
/// Only literals, arithmetic and bitwise operators, and list, tuple, set and
/// dict displays can be evaluated. Anything that could reach outside the
/// expression (names, calls, attribute access) is rejected while parsing.
///
/// # Example
///
/// ```
/// use safecalc::{Sandbox, Value};
///
/// let sandbox = Sandbox::new();
/// assert_eq!(sandbox.evaluate("2 ** 10 - 24").unwrap(), Value::Int(1000));
/// assert!(sandbox.evaluate("__import__('os')").is_err());
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Sandbox {
    limits: Limits,
}

impl Sandbox {
    /// Create a sandbox with the default limits.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limits(limits: Limits) -> Self {
        Self { limits }
    }

    pub fn limits(&self) -> Limits {
        self.limits
    }

    /// Lex and parse `text` without evaluating it.
    pub fn parse(&self, text: &str) -> Result<Expr> {
        if text.len() > self.limits.max_input_len {
            return Err(Error::lex(
                Span::point(self.limits.max_input_len),
                format!("input exceeds {} bytes", self.limits.max_input_len),
            ));
        }
        let tokens = token::tokenize(text)?;
        trace!(tokens = tokens.len(), "tokenized");
        let expr = parser::parse(&tokens, self.limits.max_depth)?;
        trace!(tree = ?expr, "parsed");
        Ok(expr)
    }

    /// Evaluate `text` and return its value.
    ///
    /// # Example
    ///
    /// ```
    /// use safecalc::{Error, Sandbox, Value};
    ///
    /// let sandbox = Sandbox::new();
    /// assert_eq!(sandbox.evaluate("-7 // 2").unwrap(), Value::Int(-4));
    /// assert!(matches!(sandbox.evaluate("1 / 0"), Err(Error::Eval(_))));
    /// ```
    pub fn evaluate(&self, text: &str) -> Result<Value> {
        let span = debug_span!("evaluate", len = text.len());
        let _enter = span.enter();

        let result = self
            .parse(text)
            .and_then(|expr| eval::evaluate(&expr).map_err(Error::from));
        if let Err(err) = &result {
            debug!(kind = err.kind(), position = ?err.position(), "rejected: {}", err);
        }
        result
    }
}

/// Evaluate `text` with the default limits.
///
/// ```
/// use safecalc::{evaluate_expression, Value};
///
/// assert_eq!(
///     evaluate_expression("[1, 2, *[3, 4]]").unwrap(),
///     Value::from(vec![1, 2, 3, 4]),
/// );
/// ```
pub fn evaluate_expression(text: &str) -> Result<Value> {
    Sandbox::new().evaluate(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EvalError;

    #[test]
    fn test_default_limits() {
        let limits = Sandbox::new().limits();
        assert_eq!(limits.max_input_len, 4096);
        assert_eq!(limits.max_depth, 100);
    }

    #[test]
    fn test_input_length_limit() {
        let sandbox = Sandbox::with_limits(Limits::default().with_max_input_len(8));
        assert_eq!(
            sandbox.evaluate("1 + 2 + 3"),
            Err(Error::lex(Span::point(8), "input exceeds 8 bytes"))
        );
        assert_eq!(sandbox.evaluate("1 + 2 + 3").unwrap_err().position(), Some(8));
        assert_eq!(sandbox.evaluate("1 + 2"), Ok(Value::Int(3)));
    }

    #[test]
    fn test_depth_limit() {
        let sandbox = Sandbox::with_limits(Limits::default().with_max_depth(3));
        assert_eq!(sandbox.evaluate("((1))"), Ok(Value::Int(1)));
        let err = sandbox.evaluate("((((1))))").unwrap_err();
        assert!(matches!(err, Error::Parse { .. }));

        let text = format!("{}1{}", "(".repeat(500), ")".repeat(500));
        assert!(matches!(evaluate_expression(&text), Err(Error::Parse { .. })));
        let text = format!("{}1", "-".repeat(500));
        assert!(matches!(evaluate_expression(&text), Err(Error::Parse { .. })));
    }

    #[test]
    fn test_parse_only() {
        let sandbox = Sandbox::new();
        assert!(sandbox.parse("1 / 0").is_ok());
        assert_eq!(
            sandbox.evaluate("1 / 0"),
            Err(Error::Eval(EvalError::DivisionByZero))
        );
    }

    #[test]
    fn test_sandbox_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Sandbox>();
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_limits_from_json() {
        let limits: Limits = serde_json::from_str(r#"{"max_depth": 10}"#).unwrap();
        assert_eq!(limits, Limits::default().with_max_depth(10));

        let json = serde_json::to_string(&Limits::default()).unwrap();
        assert_eq!(json, r#"{"max_input_len":4096,"max_depth":100}"#);
    }
}
