//! Lexer for calculator expressions.
//!
//! Turns the expression text into `(Token, Span)` pairs. The lexer knows
//! nothing about which token sequences are meaningful: names and comparison
//! operators lex fine and are rejected by the parser with a precise message.

use std::fmt;
use std::iter::Peekable;
use std::str::Chars;

use logos::{Lexer, Logos};
use thiserror::Error;

use crate::diagnostic::Span;
use crate::error::{Error, Result};
use crate::value::format_float;

/// Failure reported by a token callback.
#[derive(Debug, Clone, PartialEq, Default, Error)]
pub enum LexErrorKind {
    /// No token pattern matches here.
    #[default]
    #[error("unexpected character")]
    UnexpectedCharacter,
    #[error("invalid numeric literal")]
    InvalidNumber,
    #[error("integer literal does not fit in 64 bits")]
    IntegerTooLarge,
    #[error("invalid escape sequence `{0}`")]
    InvalidEscape(String),
}

#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n\f]+")]
#[logos(error = LexErrorKind)]
pub enum Token {
    #[regex(r"[0-9][0-9_]*", lex_decimal)]
    #[regex(r"0[xX][0-9a-fA-F_]+", |lex| lex_radix(lex, 16))]
    #[regex(r"0[oO][0-7_]+", |lex| lex_radix(lex, 8))]
    #[regex(r"0[bB][01_]+", |lex| lex_radix(lex, 2))]
    Int(i64),

    /// `1.5`, `1.`, `.5`, `1e10`, `1.5E-3`.
    #[regex(r"[0-9][0-9_]*\.([0-9][0-9_]*)?([eE][+-]?[0-9_]+)?", lex_float)]
    #[regex(r"\.[0-9][0-9_]*([eE][+-]?[0-9_]+)?", lex_float)]
    #[regex(r"[0-9][0-9_]*[eE][+-]?[0-9_]+", lex_float)]
    Float(f64),

    #[regex(r#"'([^'\\\n]|\\(.|\n))*'"#, lex_string, allow_greedy = true)]
    #[regex(r#""([^"\\\n]|\\(.|\n))*""#, lex_string, allow_greedy = true)]
    Str(String),

    #[token("True", |_| true)]
    #[token("False", |_| false)]
    Bool(bool),

    #[token("None")]
    NoneLiteral,

    #[token("not")]
    Not,

    /// Identifier-shaped text. Never part of a valid expression.
    #[regex(r"[A-Za-z_][A-Za-z0-9_]*", |lex| lex.slice().to_string())]
    Name(String),

    /// `==`, `!=`, `<`, `<=`, `>`, `>=`. Never part of a valid expression.
    #[regex(r"==|!=|<=|>=|<|>", |lex| lex.slice().to_string())]
    Comparison(String),

    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("**")]
    DoubleStar,
    #[token("/")]
    Slash,
    #[token("//")]
    DoubleSlash,
    #[token("%")]
    Percent,
    #[token("<<")]
    LeftShift,
    #[token(">>")]
    RightShift,
    #[token("&")]
    Ampersand,
    #[token("|")]
    Pipe,
    #[token("^")]
    Caret,
    #[token("~")]
    Tilde,

    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token(",")]
    Comma,
    #[token(":")]
    Colon,
    /// Only valid inside a float literal; lexed so the parser can reject
    /// attribute access.
    #[token(".")]
    Dot,

    /// Appended by [`tokenize`] after the last token.
    Eof,
}

impl Token {
    fn symbol(&self) -> Option<&'static str> {
        let symbol = match self {
            Token::Not => "not",
            Token::Plus => "+",
            Token::Minus => "-",
            Token::Star => "*",
            Token::DoubleStar => "**",
            Token::Slash => "/",
            Token::DoubleSlash => "//",
            Token::Percent => "%",
            Token::LeftShift => "<<",
            Token::RightShift => ">>",
            Token::Ampersand => "&",
            Token::Pipe => "|",
            Token::Caret => "^",
            Token::Tilde => "~",
            Token::LParen => "(",
            Token::RParen => ")",
            Token::LBracket => "[",
            Token::RBracket => "]",
            Token::LBrace => "{",
            Token::RBrace => "}",
            Token::Comma => ",",
            Token::Colon => ":",
            Token::Dot => ".",
            _ => return None,
        };
        Some(symbol)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Int(i) => write!(f, "integer `{}`", i),
            Token::Float(x) => write!(f, "float `{}`", format_float(*x)),
            Token::Str(_) => write!(f, "string literal"),
            Token::Bool(true) => write!(f, "`True`"),
            Token::Bool(false) => write!(f, "`False`"),
            Token::NoneLiteral => write!(f, "`None`"),
            Token::Name(name) => write!(f, "name `{}`", name),
            Token::Comparison(op) => write!(f, "`{}`", op),
            Token::Eof => write!(f, "end of input"),
            other => write!(f, "`{}`", other.symbol().unwrap_or("?")),
        }
    }
}

/// Split `source` into tokens, ending with [`Token::Eof`].
pub fn tokenize(source: &str) -> Result<Vec<(Token, Span)>> {
    let mut tokens = Vec::new();
    let mut lexer = Token::lexer(source);

    while let Some(token) = lexer.next() {
        let span = Span::from(lexer.span());
        match token {
            Ok(token) => tokens.push((token, span)),
            Err(kind) => return Err(lex_error(source, span, kind)),
        }
    }

    tokens.push((Token::Eof, Span::point(source.len())));
    Ok(tokens)
}

fn lex_error(source: &str, span: Span, kind: LexErrorKind) -> Error {
    if kind != LexErrorKind::UnexpectedCharacter {
        return Error::lex(span, kind.to_string());
    }
    match source[span.start..].chars().next() {
        Some('\'' | '"') => Error::lex(
            Span::new(span.start, source.len()),
            "unterminated string literal",
        ),
        Some(ch) => Error::lex(
            Span::new(span.start, span.start + ch.len_utf8()),
            format!("unexpected character `{}`", ch),
        ),
        None => Error::lex(span, "unexpected end of input"),
    }
}

/// Drop `_` digit separators. Each separator must sit between two digits
/// of `radix`; `leading_allowed` also accepts one right after a `0x`-style
/// prefix.
fn strip_separators(text: &str, radix: u32, leading_allowed: bool) -> Option<String> {
    let bytes = text.as_bytes();
    let is_digit = |b: Option<&u8>| b.is_some_and(|b| char::from(*b).is_digit(radix));

    let mut out = String::with_capacity(text.len());
    for (i, &b) in bytes.iter().enumerate() {
        if b == b'_' {
            let before = if i == 0 {
                leading_allowed
            } else {
                is_digit(bytes.get(i - 1))
            };
            if !before || !is_digit(bytes.get(i + 1)) {
                return None;
            }
        } else {
            out.push(char::from(b));
        }
    }
    Some(out)
}

fn lex_decimal(lex: &mut Lexer<Token>) -> std::result::Result<i64, LexErrorKind> {
    let digits = strip_separators(lex.slice(), 10, false).ok_or(LexErrorKind::InvalidNumber)?;
    // `00` is zero, `01` is not a literal.
    if digits.starts_with('0') && digits.bytes().any(|b| b != b'0') {
        return Err(LexErrorKind::InvalidNumber);
    }
    digits
        .parse::<i64>()
        .map_err(|_| LexErrorKind::IntegerTooLarge)
}

fn lex_radix(lex: &mut Lexer<Token>, radix: u32) -> std::result::Result<i64, LexErrorKind> {
    let body =
        strip_separators(&lex.slice()[2..], radix, true).ok_or(LexErrorKind::InvalidNumber)?;
    i64::from_str_radix(&body, radix).map_err(|_| LexErrorKind::IntegerTooLarge)
}

fn lex_float(lex: &mut Lexer<Token>) -> std::result::Result<f64, LexErrorKind> {
    let mut text =
        strip_separators(lex.slice(), 10, false).ok_or(LexErrorKind::InvalidNumber)?;
    if let Some(dot) = text.find('.') {
        if !text[dot + 1..].starts_with(|c: char| c.is_ascii_digit()) {
            text.insert(dot + 1, '0');
        }
    }
    text.parse::<f64>().map_err(|_| LexErrorKind::InvalidNumber)
}

fn lex_string(lex: &mut Lexer<Token>) -> std::result::Result<String, LexErrorKind> {
    let slice = lex.slice();
    unescape(&slice[1..slice.len() - 1])
}

fn unescape(body: &str) -> std::result::Result<String, LexErrorKind> {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        let Some(escaped) = chars.next() else {
            out.push('\\');
            break;
        };
        match escaped {
            '\n' => {}
            '\\' | '\'' | '"' => out.push(escaped),
            'n' => out.push('\n'),
            'r' => out.push('\r'),
            't' => out.push('\t'),
            'a' => out.push('\x07'),
            'b' => out.push('\x08'),
            'f' => out.push('\x0c'),
            'v' => out.push('\x0b'),
            '0'..='7' => {
                let mut code = escaped.to_digit(8).unwrap_or(0);
                for _ in 0..2 {
                    match chars.next_if(|c| c.is_digit(8)) {
                        Some(digit) => code = code * 8 + digit.to_digit(8).unwrap_or(0),
                        None => break,
                    }
                }
                // At most 0o777, always a valid scalar value.
                out.extend(char::from_u32(code));
            }
            'x' => out.push(hex_escape(&mut chars, 2, 'x')?),
            'u' => out.push(hex_escape(&mut chars, 4, 'u')?),
            'U' => out.push(hex_escape(&mut chars, 8, 'U')?),
            other => {
                out.push('\\');
                out.push(other);
            }
        }
    }
    Ok(out)
}

fn hex_escape(
    chars: &mut Peekable<Chars<'_>>,
    width: usize,
    marker: char,
) -> std::result::Result<char, LexErrorKind> {
    let digits: String = (0..width)
        .filter_map(|_| chars.next_if(|c| c.is_ascii_hexdigit()))
        .collect();
    let invalid = || LexErrorKind::InvalidEscape(format!("\\{}{}", marker, digits));
    if digits.len() != width {
        return Err(invalid());
    }
    u32::from_str_radix(&digits, 16)
        .ok()
        .and_then(char::from_u32)
        .ok_or_else(invalid)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<Token> {
        tokenize(source)
            .unwrap()
            .into_iter()
            .map(|(token, _)| token)
            .collect()
    }

    fn lex_message(source: &str) -> (usize, String) {
        match tokenize(source) {
            Err(Error::Lex { span, message }) => (span.start, message),
            other => panic!("expected lex error for {:?}, got {:?}", source, other),
        }
    }

    #[test]
    fn test_operators_and_punctuation() {
        assert_eq!(
            kinds("1 + 2 ** -3 // 4"),
            vec![
                Token::Int(1),
                Token::Plus,
                Token::Int(2),
                Token::DoubleStar,
                Token::Minus,
                Token::Int(3),
                Token::DoubleSlash,
                Token::Int(4),
                Token::Eof,
            ]
        );
        assert_eq!(
            kinds("{**a, *b: [~c]}<<>>&|^%/"),
            vec![
                Token::LBrace,
                Token::DoubleStar,
                Token::Name("a".to_string()),
                Token::Comma,
                Token::Star,
                Token::Name("b".to_string()),
                Token::Colon,
                Token::LBracket,
                Token::Tilde,
                Token::Name("c".to_string()),
                Token::RBracket,
                Token::RBrace,
                Token::LeftShift,
                Token::RightShift,
                Token::Ampersand,
                Token::Pipe,
                Token::Caret,
                Token::Percent,
                Token::Slash,
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_integer_literals() {
        assert_eq!(kinds("0x1F 0o17 0b101 1_000 00"), vec![
            Token::Int(31),
            Token::Int(15),
            Token::Int(5),
            Token::Int(1000),
            Token::Int(0),
            Token::Eof,
        ]);
        assert_eq!(kinds("0x_ff"), vec![Token::Int(255), Token::Eof]);
        assert_eq!(kinds("9223372036854775807")[0], Token::Int(i64::MAX));
    }

    #[test]
    fn test_float_literals() {
        assert_eq!(kinds("1.5 1. .5 1e3 2.5E-1 1_0.0_1"), vec![
            Token::Float(1.5),
            Token::Float(1.0),
            Token::Float(0.5),
            Token::Float(1000.0),
            Token::Float(0.25),
            Token::Float(10.01),
            Token::Eof,
        ]);
        assert_eq!(kinds("1.e2")[0], Token::Float(100.0));
    }

    #[test]
    fn test_malformed_numbers() {
        assert_eq!(lex_message("01").1, "invalid numeric literal");
        assert_eq!(lex_message("1__0").1, "invalid numeric literal");
        assert_eq!(lex_message("10_").1, "invalid numeric literal");
        assert_eq!(lex_message("1_.5").1, "invalid numeric literal");
        assert_eq!(
            lex_message("1 + 9223372036854775808"),
            (4, "integer literal does not fit in 64 bits".to_string())
        );
        assert_eq!(
            lex_message("0xffffffffffffffff").1,
            "integer literal does not fit in 64 bits"
        );
    }

    #[test]
    fn test_string_literals() {
        assert_eq!(
            kinds(r#"'a\'b' "c\"d" 'tab\there' '\x41é\U0001F600' '\101\0' 'keep\q'"#),
            vec![
                Token::Str("a'b".to_string()),
                Token::Str("c\"d".to_string()),
                Token::Str("tab\there".to_string()),
                Token::Str("Aé😀".to_string()),
                Token::Str("A\0".to_string()),
                Token::Str("keep\\q".to_string()),
                Token::Eof,
            ]
        );
        assert_eq!(kinds("'a\\\nb'")[0], Token::Str("ab".to_string()));
    }

    #[test]
    fn test_string_errors() {
        assert_eq!(
            lex_message("1 + 'abc"),
            (4, "unterminated string literal".to_string())
        );
        assert_eq!(lex_message("\"abc").1, "unterminated string literal");
        assert_eq!(lex_message(r"'\x4'").1, r"invalid escape sequence `\x4`");
        assert_eq!(lex_message(r"'\ud800'").1, r"invalid escape sequence `\ud800`");
    }

    #[test]
    fn test_names_keywords_and_comparisons() {
        assert_eq!(
            kinds("not True False None note __import__ == != <= >= < >"),
            vec![
                Token::Not,
                Token::Bool(true),
                Token::Bool(false),
                Token::NoneLiteral,
                Token::Name("note".to_string()),
                Token::Name("__import__".to_string()),
                Token::Comparison("==".to_string()),
                Token::Comparison("!=".to_string()),
                Token::Comparison("<=".to_string()),
                Token::Comparison(">=".to_string()),
                Token::Comparison("<".to_string()),
                Token::Comparison(">".to_string()),
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_dot_outside_float() {
        assert_eq!(
            kinds("(1).real"),
            vec![
                Token::LParen,
                Token::Int(1),
                Token::RParen,
                Token::Dot,
                Token::Name("real".to_string()),
                Token::Eof,
            ]
        );
        assert_eq!(kinds("1..5"), vec![Token::Float(1.0), Token::Float(0.5), Token::Eof]);
        // A float ends at its dot when no digit follows.
        assert_eq!(
            kinds("1.__class__"),
            vec![
                Token::Float(1.0),
                Token::Name("__class__".to_string()),
                Token::Eof,
            ]
        );
        assert_eq!(
            kinds("1.5.real"),
            vec![
                Token::Float(1.5),
                Token::Dot,
                Token::Name("real".to_string()),
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_unexpected_characters() {
        assert_eq!(lex_message("x = 1").1, "unexpected character `=`");
        assert_eq!(lex_message("2 @ 3"), (2, "unexpected character `@`".to_string()));
        assert_eq!(lex_message("1 + é").1, "unexpected character `é`");
    }

    #[test]
    fn test_spans_and_eof() {
        let tokens = tokenize("  12 +'ab'").unwrap();
        assert_eq!(tokens[0].1, Span::new(2, 4));
        assert_eq!(tokens[1].1, Span::new(5, 6));
        assert_eq!(tokens[2].1, Span::new(6, 10));
        assert_eq!(tokens[3], (Token::Eof, Span::point(10)));
        assert_eq!(tokenize("").unwrap(), vec![(Token::Eof, Span::point(0))]);
    }

    #[test]
    fn test_token_display() {
        assert_eq!(Token::Name("os".to_string()).to_string(), "name `os`");
        assert_eq!(Token::DoubleStar.to_string(), "`**`");
        assert_eq!(Token::Float(2.0).to_string(), "float `2.0`");
        assert_eq!(Token::Eof.to_string(), "end of input");
    }
}
