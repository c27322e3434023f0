//! Tree-walking evaluator.
//!
//! Evaluation is a pure function of the tree: there is no environment, no
//! name lookup and no side effect. Operands are evaluated left to right.

use crate::ast::{DictEntry, Element, Expr};
use crate::error::EvalError;
use crate::operators::{apply_binop, apply_unaryop};
use crate::value::{Value, dict_insert, set_insert};

/// Evaluate a parsed expression to a value.
pub fn evaluate(expr: &Expr) -> Result<Value, EvalError> {
    match expr {
        Expr::Literal(value) => Ok(value.clone()),
        Expr::UnaryOp { op, operand } => {
            let operand = evaluate(operand)?;
            apply_unaryop(*op, &operand)
        }
        Expr::BinaryOp { op, left, right } => {
            let left = evaluate(left)?;
            let right = evaluate(right)?;
            apply_binop(*op, &left, &right)
        }
        Expr::List(elements) => eval_elements(elements).map(Value::List),
        Expr::Tuple(elements) => eval_elements(elements).map(Value::Tuple),
        Expr::Set(elements) => {
            let mut items = Vec::with_capacity(elements.len());
            for item in eval_elements(elements)? {
                set_insert(&mut items, item)?;
            }
            Ok(Value::Set(items))
        }
        Expr::Dict(entries) => eval_dict(entries),
    }
}

/// Evaluate display elements in order, inlining `*` spreads.
fn eval_elements(elements: &[Element]) -> Result<Vec<Value>, EvalError> {
    let mut items = Vec::with_capacity(elements.len());
    for element in elements {
        match element {
            Element::Item(expr) => items.push(evaluate(expr)?),
            Element::Spread(expr) => {
                let source = evaluate(expr)?;
                let got = source.type_name();
                let spread = source.into_items().ok_or(EvalError::Spread {
                    marker: "*",
                    expected: "an iterable",
                    got,
                })?;
                items.extend(spread);
            }
        }
    }
    Ok(items)
}

/// Evaluate dict entries in order. Later keys overwrite earlier ones.
fn eval_dict(entries: &[DictEntry]) -> Result<Value, EvalError> {
    let mut pairs = Vec::with_capacity(entries.len());
    for entry in entries {
        match entry {
            DictEntry::Pair { key, value } => {
                let key = evaluate(key)?;
                let value = evaluate(value)?;
                dict_insert(&mut pairs, key, value)?;
            }
            DictEntry::Spread(expr) => match evaluate(expr)? {
                Value::Dict(source) => {
                    for (key, value) in source {
                        dict_insert(&mut pairs, key, value)?;
                    }
                }
                other => {
                    return Err(EvalError::Spread {
                        marker: "**",
                        expected: "a mapping",
                        got: other.type_name(),
                    });
                }
            },
        }
    }
    Ok(Value::Dict(pairs))
}
