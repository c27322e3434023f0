//! Recursive-descent parser.
//!
//! Each precedence level is one function delegating to the next tighter
//! level. Only the productions below exist; any other token in any position
//! is a parse error.
//!
//! ```text
//! expression_list := element ("," element)* [","]
//! expression      := "not" expression | bitwise_or
//! bitwise_or      := bitwise_xor ("|" bitwise_xor)*
//! bitwise_xor     := bitwise_and ("^" bitwise_and)*
//! bitwise_and     := shift ("&" shift)*
//! shift           := additive (("<<" | ">>") additive)*
//! additive        := multiplicative (("+" | "-") multiplicative)*
//! multiplicative  := unary (("*" | "/" | "//" | "%") unary)*
//! unary           := ("+" | "-" | "~") unary | power
//! power           := atom ["**" unary]
//! atom            := INT | FLOAT | STRING+ | "True" | "False" | "None"
//!                  | "(" [expression_list] ")" | "[" [elements] "]" | "{" [entries] "}"
//! element         := "*" bitwise_or | expression
//! dict_entry      := "**" bitwise_or | expression ":" expression
//! ```

use crate::ast::{BinOp, DictEntry, Element, Expr, UnaryOp};
use crate::diagnostic::Span;
use crate::error::{Error, Result};
use crate::token::Token;
use crate::value::Value;

static EOF: Token = Token::Eof;

/// Words of the host calculator language that are not expressions here.
const KEYWORDS: &[&str] = &[
    "and", "or", "if", "else", "elif", "lambda", "in", "is", "for", "while", "import", "from",
    "as", "yield", "await", "async", "def", "class", "return", "del", "global", "nonlocal",
    "assert", "pass", "raise", "try", "except", "finally", "with", "break", "continue",
];

/// Parse a complete token sequence (as produced by
/// [`tokenize`](crate::token::tokenize)) into a single expression.
///
/// # Errors
///
/// Returns [`Error::Parse`] when the tokens do not form exactly one
/// expression of the grammar, or when nesting exceeds `max_depth`.
pub fn parse(tokens: &[(Token, Span)], max_depth: usize) -> Result<Expr> {
    let mut parser = Parser {
        tokens,
        pos: 0,
        depth: 0,
        max_depth,
    };
    let expr = parser.parse_expression_list(&Token::Eof)?;
    parser.expect_end()?;
    Ok(expr)
}

struct Parser<'t> {
    tokens: &'t [(Token, Span)],
    pos: usize,
    depth: usize,
    max_depth: usize,
}

impl<'t> Parser<'t> {
    fn peek(&self) -> (&'t Token, Span) {
        match self.tokens.get(self.pos) {
            Some((token, span)) => (token, *span),
            None => {
                let end = self.tokens.last().map_or(0, |(_, span)| span.end);
                (&EOF, Span::point(end))
            }
        }
    }

    fn advance(&mut self) -> (&'t Token, Span) {
        let current = self.peek();
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        current
    }

    fn check(&self, token: &Token) -> bool {
        self.peek().0 == token
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.check(token) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Run `f` one nesting level deeper, failing once `max_depth` is reached.
    fn nested<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        if self.depth >= self.max_depth {
            let (_, span) = self.peek();
            return Err(Error::parse(
                span,
                format!("expression nested too deeply (limit {})", self.max_depth),
            ));
        }
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        result
    }

    fn expect_end(&self) -> Result<()> {
        match self.peek().0 {
            Token::Eof => Ok(()),
            _ => Err(self.unexpected_after(None)),
        }
    }

    fn expect_closing(&mut self, close: &Token, open: &Token, open_span: Span) -> Result<()> {
        if self.eat(close) {
            return Ok(());
        }
        let (token, span) = self.peek();
        let err = if *token == Token::Eof {
            Error::parse(
                span,
                format!(
                    "unclosed {} at position {}: expected {}",
                    open, open_span.start, close
                ),
            )
        } else {
            self.unexpected_after(Some(format!(
                "{} to close {} at position {}",
                close, open, open_span.start
            )))
        };
        Err(err.opened_at(open_span))
    }

    /// A token that cannot start an expression.
    fn unexpected(token: &Token, span: Span) -> Error {
        let message = match token {
            Token::Name(name) if KEYWORDS.contains(&name.as_str()) => {
                format!("`{}` is not supported", name)
            }
            Token::Name(name) => format!("names are not allowed: `{}`", name),
            Token::Comparison(op) => format!("comparison operators are not supported: `{}`", op),
            Token::Star => {
                "`*` spread is only allowed inside list, tuple and set displays".to_string()
            }
            Token::DoubleStar => "`**` spread is only allowed inside dict displays".to_string(),
            Token::Eof => "unexpected end of input".to_string(),
            other => format!("unexpected {}", other),
        };
        Error::parse(span, message)
    }

    /// The current token follows a complete expression but does not continue
    /// it. `expected` names what would have; `None` means end of input.
    fn unexpected_after(&self, expected: Option<String>) -> Error {
        let (token, span) = self.peek();
        let message = match (token, expected) {
            (Token::Name(_) | Token::Comparison(_), _) => return Self::unexpected(token, span),
            (Token::LParen, _) => "calls are not supported".to_string(),
            (Token::LBracket, _) => "subscripts are not supported".to_string(),
            (Token::Dot, _) => "attribute access is not supported".to_string(),
            (Token::RParen | Token::RBracket | Token::RBrace, None) => {
                format!("unmatched {}", token)
            }
            (_, Some(expected)) => format!("expected {}, found {}", expected, token),
            (_, None) => format!("unexpected {} after complete expression", token),
        };
        Error::parse(span, message)
    }

    /// `expression_list`: a bare expression, or a tuple when a comma is present.
    fn parse_expression_list(&mut self, terminator: &Token) -> Result<Expr> {
        let (_, start) = self.peek();
        let first = self.parse_element()?;
        if !self.check(&Token::Comma) {
            return match first {
                Element::Item(expr) => Ok(expr),
                Element::Spread(_) => Err(Error::parse(
                    start,
                    "a `*` spread needs a surrounding tuple, list or set",
                )),
            };
        }

        let mut elements = vec![first];
        while self.eat(&Token::Comma) {
            if self.check(terminator) {
                break;
            }
            elements.push(self.parse_element()?);
        }
        Ok(Expr::Tuple(elements))
    }

    /// Comma-separated elements up to (not including) `close`; a trailing
    /// comma is allowed.
    fn parse_elements(&mut self, close: &Token) -> Result<Vec<Element>> {
        let mut elements = Vec::new();
        while !self.check(close) {
            elements.push(self.parse_element()?);
            if !self.eat(&Token::Comma) {
                break;
            }
        }
        Ok(elements)
    }

    fn parse_element(&mut self) -> Result<Element> {
        if self.eat(&Token::Star) {
            Ok(Element::Spread(self.nested(Self::parse_bitwise_or)?))
        } else {
            Ok(Element::Item(self.parse_expression()?))
        }
    }

    /// `expression := "not" expression | bitwise_or`
    fn parse_expression(&mut self) -> Result<Expr> {
        self.nested(|p| {
            if p.eat(&Token::Not) {
                Ok(Expr::unary(UnaryOp::Not, p.parse_expression()?))
            } else {
                p.parse_bitwise_or()
            }
        })
    }

    /// Left-associative chain of `next`-level operands joined by the
    /// operators `op_for` recognizes.
    fn parse_left_assoc(
        &mut self,
        next: fn(&mut Self) -> Result<Expr>,
        op_for: fn(&Token) -> Option<BinOp>,
    ) -> Result<Expr> {
        let mut left = next(self)?;
        while let Some(op) = op_for(self.peek().0) {
            self.advance();
            let right = next(self)?;
            left = Expr::binary(op, left, right);
        }
        Ok(left)
    }

    /// `bitwise_or := bitwise_xor ("|" bitwise_xor)*`
    fn parse_bitwise_or(&mut self) -> Result<Expr> {
        self.parse_left_assoc(Self::parse_bitwise_xor, |token| match token {
            Token::Pipe => Some(BinOp::BitOr),
            _ => None,
        })
    }

    /// `bitwise_xor := bitwise_and ("^" bitwise_and)*`
    fn parse_bitwise_xor(&mut self) -> Result<Expr> {
        self.parse_left_assoc(Self::parse_bitwise_and, |token| match token {
            Token::Caret => Some(BinOp::BitXor),
            _ => None,
        })
    }

    /// `bitwise_and := shift ("&" shift)*`
    fn parse_bitwise_and(&mut self) -> Result<Expr> {
        self.parse_left_assoc(Self::parse_shift, |token| match token {
            Token::Ampersand => Some(BinOp::BitAnd),
            _ => None,
        })
    }

    /// `shift := additive (("<<" | ">>") additive)*`
    fn parse_shift(&mut self) -> Result<Expr> {
        self.parse_left_assoc(Self::parse_additive, |token| match token {
            Token::LeftShift => Some(BinOp::LShift),
            Token::RightShift => Some(BinOp::RShift),
            _ => None,
        })
    }

    /// `additive := multiplicative (("+" | "-") multiplicative)*`
    fn parse_additive(&mut self) -> Result<Expr> {
        self.parse_left_assoc(Self::parse_multiplicative, |token| match token {
            Token::Plus => Some(BinOp::Add),
            Token::Minus => Some(BinOp::Sub),
            _ => None,
        })
    }

    /// `multiplicative := unary (("*" | "/" | "//" | "%") unary)*`
    fn parse_multiplicative(&mut self) -> Result<Expr> {
        self.parse_left_assoc(Self::parse_unary, |token| match token {
            Token::Star => Some(BinOp::Mul),
            Token::Slash => Some(BinOp::TrueDiv),
            Token::DoubleSlash => Some(BinOp::FloorDiv),
            Token::Percent => Some(BinOp::Mod),
            _ => None,
        })
    }

    /// `unary := ("+" | "-" | "~") unary | power`
    fn parse_unary(&mut self) -> Result<Expr> {
        let op = match self.peek().0 {
            Token::Plus => UnaryOp::Pos,
            Token::Minus => UnaryOp::Neg,
            Token::Tilde => UnaryOp::Invert,
            _ => return self.parse_power(),
        };
        self.advance();
        self.nested(|p| Ok(Expr::unary(op, p.parse_unary()?)))
    }

    /// `power := atom ["**" unary]`
    ///
    /// The exponent is a `unary`, which makes `**` right-associative and
    /// lets `2 ** -1` parse, while `-2 ** 2` stays `-(2 ** 2)`.
    fn parse_power(&mut self) -> Result<Expr> {
        let base = self.parse_atom()?;
        if self.eat(&Token::DoubleStar) {
            let exponent = self.nested(Self::parse_unary)?;
            Ok(Expr::binary(BinOp::Pow, base, exponent))
        } else {
            Ok(base)
        }
    }

    fn parse_atom(&mut self) -> Result<Expr> {
        let (token, span) = self.advance();
        match token {
            Token::Int(i) => Ok(Expr::Literal(Value::Int(*i))),
            Token::Float(f) => Ok(Expr::Literal(Value::Float(*f))),
            Token::Bool(b) => Ok(Expr::Literal(Value::Bool(*b))),
            Token::NoneLiteral => Ok(Expr::Literal(Value::None)),
            Token::Str(first) => {
                // Adjacent literals concatenate: 'ab' 'cd' == 'abcd'.
                let mut text = first.clone();
                while let (Token::Str(next), _) = self.peek() {
                    text.push_str(next);
                    self.advance();
                }
                Ok(Expr::Literal(Value::Str(text)))
            }
            Token::LParen => {
                if self.eat(&Token::RParen) {
                    return Ok(Expr::Tuple(Vec::new()));
                }
                let inner = self.parse_expression_list(&Token::RParen)?;
                self.expect_closing(&Token::RParen, &Token::LParen, span)?;
                Ok(inner)
            }
            Token::LBracket => {
                let elements = self.parse_elements(&Token::RBracket)?;
                self.expect_closing(&Token::RBracket, &Token::LBracket, span)?;
                Ok(Expr::List(elements))
            }
            Token::LBrace => self.parse_brace_display(span),
            other => Err(Self::unexpected(other, span)),
        }
    }

    /// After `{`: a dict, a set, or `{}` (the empty dict). The first entry
    /// decides which.
    fn parse_brace_display(&mut self, open_span: Span) -> Result<Expr> {
        if self.eat(&Token::RBrace) {
            return Ok(Expr::Dict(Vec::new()));
        }
        if self.check(&Token::DoubleStar) {
            return self.parse_dict_entries(Vec::new(), open_span);
        }

        match self.parse_element()? {
            Element::Item(key) if self.eat(&Token::Colon) => {
                let value = self.parse_expression()?;
                self.parse_dict_entries(vec![DictEntry::Pair { key, value }], open_span)
            }
            first => {
                let mut elements = vec![first];
                if self.eat(&Token::Comma) {
                    elements.extend(self.parse_elements(&Token::RBrace)?);
                }
                self.expect_closing(&Token::RBrace, &Token::LBrace, open_span)?;
                Ok(Expr::Set(elements))
            }
        }
    }

    /// Remaining dict entries after the already-parsed `entries`.
    fn parse_dict_entries(&mut self, mut entries: Vec<DictEntry>, open_span: Span) -> Result<Expr> {
        let mut more = entries.is_empty() || self.eat(&Token::Comma);
        while more && !self.check(&Token::RBrace) {
            entries.push(self.parse_dict_entry()?);
            more = self.eat(&Token::Comma);
        }
        self.expect_closing(&Token::RBrace, &Token::LBrace, open_span)?;
        Ok(Expr::Dict(entries))
    }

    fn parse_dict_entry(&mut self) -> Result<DictEntry> {
        if self.eat(&Token::DoubleStar) {
            return Ok(DictEntry::Spread(self.nested(Self::parse_bitwise_or)?));
        }
        let key = self.parse_expression()?;
        if !self.eat(&Token::Colon) {
            return Err(self.unexpected_after(Some("`:` after dict key".to_string())));
        }
        let value = self.parse_expression()?;
        Ok(DictEntry::Pair { key, value })
    }
}
