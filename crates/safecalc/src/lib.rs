//! Safecalc - a sandboxed calculator for untrusted expressions
//!
//! Safecalc evaluates a single expression written in a small, Python-flavoured
//! literal language. The grammar has no production for anything that could
//! reach outside the expression, so there is nothing to escape from.
//!
//! # Quick Start
//!
//! ```
//! use safecalc::{evaluate_expression, Error, Value};
//!
//! assert_eq!(evaluate_expression("-7 // 2").unwrap(), Value::Int(-4));
//! assert_eq!(evaluate_expression("6 / 3").unwrap(), Value::Float(2.0));
//! assert_eq!(
//!     evaluate_expression("{**{'a': 1}, 'a': 2}").unwrap().to_string(),
//!     "{'a': 2}",
//! );
//!
//! // Names never parse.
//! assert!(matches!(
//!     evaluate_expression("__import__('os')"),
//!     Err(Error::Parse { .. })
//! ));
//! ```
//!
//! # Supported Language
//!
//! ## Literals
//! - Integers (decimal, `0x`, `0o`, `0b`, with `_` separators), floats
//! - Strings in single or double quotes, adjacent strings concatenate
//! - `True`, `False`, `None`
//! - List `[..]`, tuple `(..)` / `a, b`, set `{..}` and dict `{k: v}` displays,
//!   with `*` and `**` spreads
//!
//! ## Operators
//! - Arithmetic: `+`, `-`, `*`, `/`, `//`, `%`, `**`
//! - Bitwise: `|`, `^`, `&`, `<<`, `>>`, `~`
//! - Logical: `not`
//!
//! ## Numbers
//! - Integers are `i64`; overflow is an error, never a wrap
//! - `/` always gives a float; `//` and `%` round toward negative infinity
//!
//! # Not Supported
//!
//! - Names, calls, attribute access, subscripts
//! - Comparisons, `and`/`or`, conditional expressions, lambdas
//! - Assignment and statements

mod ast;
mod diagnostic;
mod error;
mod eval;
mod operators;
mod parser;
mod sandbox;
mod token;
mod value;

pub use ast::{BinOp, DictEntry, Element, Expr, UnaryOp};
pub use diagnostic::{Diagnostic, Label, Span};
pub use error::{Error, EvalError, Result};
pub use eval::evaluate;
pub use operators::{apply_binop, apply_unaryop};
pub use parser::parse;
pub use sandbox::{Limits, Sandbox, evaluate_expression};
pub use token::{LexErrorKind, Token, tokenize};
pub use value::{Repr, Value};
