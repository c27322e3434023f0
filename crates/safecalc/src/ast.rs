//! Syntax tree of a calculator expression.
//!
//! The variants below are the complete set of evaluable shapes. There is no
//! node for names, calls, attribute or subscript access, comparisons,
//! boolean connectives, conditionals or assignment, so the parser cannot
//! hand the evaluator any of them.

use crate::value::Value;

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// A number, string, `True`, `False` or `None`.
    Literal(Value),
    UnaryOp {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    BinaryOp {
        op: BinOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    List(Vec<Element>),
    Tuple(Vec<Element>),
    Set(Vec<Element>),
    Dict(Vec<DictEntry>),
}

/// One slot of a list, tuple or set display.
#[derive(Debug, Clone, PartialEq)]
pub enum Element {
    Item(Expr),
    /// `*source`: the source's elements are inlined here.
    Spread(Expr),
}

/// One slot of a dict display.
#[derive(Debug, Clone, PartialEq)]
pub enum DictEntry {
    Pair { key: Expr, value: Expr },
    /// `**source`: the source's entries are inlined here.
    Spread(Expr),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Pos,
    Neg,
    Not,
    Invert,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Pow,
    Mul,
    FloorDiv,
    TrueDiv,
    Mod,
    Add,
    Sub,
    LShift,
    RShift,
    BitAnd,
    BitXor,
    BitOr,
}

impl BinOp {
    /// The operator as written in an expression.
    pub fn symbol(self) -> &'static str {
        match self {
            BinOp::Pow => "**",
            BinOp::Mul => "*",
            BinOp::FloorDiv => "//",
            BinOp::TrueDiv => "/",
            BinOp::Mod => "%",
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::LShift => "<<",
            BinOp::RShift => ">>",
            BinOp::BitAnd => "&",
            BinOp::BitXor => "^",
            BinOp::BitOr => "|",
        }
    }
}

impl UnaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            UnaryOp::Pos => "+",
            UnaryOp::Neg => "-",
            UnaryOp::Not => "not",
            UnaryOp::Invert => "~",
        }
    }
}

impl Expr {
    pub(crate) fn unary(op: UnaryOp, operand: Expr) -> Self {
        Expr::UnaryOp {
            op,
            operand: Box::new(operand),
        }
    }

    pub(crate) fn binary(op: BinOp, left: Expr, right: Expr) -> Self {
        Expr::BinaryOp {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }
}
