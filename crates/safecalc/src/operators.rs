//! Unary and binary operators.
//!
//! - Arithmetic: `+`, `-`, `*`, `/`, `//`, `%`, `**`
//! - Bitwise: `|`, `^`, `&`, `<<`, `>>`, `~`
//! - Logical: `not`
//!
//! Operators act on numbers only (`bool` counts as an integer). Integer
//! results are checked against `i64`.

use crate::ast::{BinOp, UnaryOp};
use crate::error::EvalError;
use crate::value::{Number, Value};

/// Apply a binary operator to two evaluated operands.
pub fn apply_binop(op: BinOp, left: &Value, right: &Value) -> Result<Value, EvalError> {
    match op {
        BinOp::Add => numeric_binop(op, left, right, i64::checked_add, |a, b| a + b),
        BinOp::Sub => numeric_binop(op, left, right, i64::checked_sub, |a, b| a - b),
        BinOp::Mul => numeric_binop(op, left, right, i64::checked_mul, |a, b| a * b),
        BinOp::TrueDiv => {
            let (a, b) = numeric_operands(op, left, right)?;
            if b.to_f64() == 0.0 {
                Err(EvalError::DivisionByZero)
            } else {
                Ok(Value::Float(a.to_f64() / b.to_f64()))
            }
        }
        BinOp::FloorDiv => match numeric_operands(op, left, right)? {
            (Number::Int(_), Number::Int(0)) => Err(EvalError::DivisionByZero),
            (Number::Int(a), Number::Int(b)) => floor_div(a, b)
                .map(Value::Int)
                .ok_or(EvalError::Overflow(op.symbol())),
            (a, b) => float_divmod(a.to_f64(), b.to_f64()).map(|(quotient, _)| Value::Float(quotient)),
        },
        BinOp::Mod => match numeric_operands(op, left, right)? {
            (Number::Int(_), Number::Int(0)) => Err(EvalError::DivisionByZero),
            (Number::Int(a), Number::Int(b)) => Ok(Value::Int(floor_mod(a, b))),
            (a, b) => float_divmod(a.to_f64(), b.to_f64()).map(|(_, rem)| Value::Float(rem)),
        },
        BinOp::Pow => match numeric_operands(op, left, right)? {
            (Number::Int(a), Number::Int(b)) => int_pow(a, b),
            (a, b) => float_pow(a.to_f64(), b.to_f64()),
        },
        BinOp::BitAnd => bitwise_binop(op, left, right, |a, b| a & b),
        BinOp::BitXor => bitwise_binop(op, left, right, |a, b| a ^ b),
        BinOp::BitOr => bitwise_binop(op, left, right, |a, b| a | b),
        BinOp::LShift => {
            let (a, b) = shift_operands(op, left, right)?;
            shift_left(a, b).map(Value::Int).ok_or(EvalError::Overflow(op.symbol()))
        }
        BinOp::RShift => {
            let (a, b) = shift_operands(op, left, right)?;
            Ok(Value::Int(shift_right(a, b)))
        }
    }
}

/// Apply a unary operator to an evaluated operand.
pub fn apply_unaryop(op: UnaryOp, operand: &Value) -> Result<Value, EvalError> {
    let type_error = |expected: &str| EvalError::Type {
        expected: format!("{} for unary `{}`", expected, op.symbol()),
        got: operand.type_name().to_string(),
    };
    match op {
        UnaryOp::Not => Ok(Value::Bool(!operand.is_truthy())),
        UnaryOp::Pos => match operand.as_number() {
            Some(Number::Int(i)) => Ok(Value::Int(i)),
            Some(Number::Float(f)) => Ok(Value::Float(f)),
            None => Err(type_error("a number")),
        },
        UnaryOp::Neg => match operand.as_number() {
            Some(Number::Int(i)) => i
                .checked_neg()
                .map(Value::Int)
                .ok_or(EvalError::Overflow(op.symbol())),
            Some(Number::Float(f)) => Ok(Value::Float(-f)),
            None => Err(type_error("a number")),
        },
        UnaryOp::Invert => match operand.as_int() {
            Some(i) => Ok(Value::Int(!i)),
            None => Err(type_error("an integer")),
        },
    }
}

fn type_error(op: BinOp, left: &Value, right: &Value, expected: &str) -> EvalError {
    EvalError::Type {
        expected: format!("{} for `{}`", expected, op.symbol()),
        got: format!("{} and {}", left.type_name(), right.type_name()),
    }
}

fn numeric_operands(op: BinOp, left: &Value, right: &Value) -> Result<(Number, Number), EvalError> {
    match (left.as_number(), right.as_number()) {
        (Some(a), Some(b)) => Ok((a, b)),
        _ => Err(type_error(op, left, right, "numbers")),
    }
}

/// Apply a numeric binary operation: checked in the integer domain, and in
/// floating point as soon as either side is a float.
fn numeric_binop<F, G>(
    op: BinOp,
    left: &Value,
    right: &Value,
    int_op: F,
    float_op: G,
) -> Result<Value, EvalError>
where
    F: Fn(i64, i64) -> Option<i64>,
    G: Fn(f64, f64) -> f64,
{
    match numeric_operands(op, left, right)? {
        (Number::Int(a), Number::Int(b)) => int_op(a, b)
            .map(Value::Int)
            .ok_or(EvalError::Overflow(op.symbol())),
        (a, b) => Ok(Value::Float(float_op(a.to_f64(), b.to_f64()))),
    }
}

/// Apply a bitwise operation. Two booleans give a boolean.
fn bitwise_binop<F>(op: BinOp, left: &Value, right: &Value, int_op: F) -> Result<Value, EvalError>
where
    F: Fn(i64, i64) -> i64,
{
    if let (Value::Bool(a), Value::Bool(b)) = (left, right) {
        return Ok(Value::Bool(int_op(i64::from(*a), i64::from(*b)) != 0));
    }
    match (left.as_int(), right.as_int()) {
        (Some(a), Some(b)) => Ok(Value::Int(int_op(a, b))),
        _ => Err(type_error(op, left, right, "integers")),
    }
}

fn shift_operands(op: BinOp, left: &Value, right: &Value) -> Result<(i64, i64), EvalError> {
    match (left.as_int(), right.as_int()) {
        (Some(_), Some(count)) if count < 0 => Err(EvalError::NegativeShift),
        (Some(value), Some(count)) => Ok((value, count)),
        _ => Err(type_error(op, left, right, "integers")),
    }
}

/// Quotient rounded toward negative infinity. `None` on overflow
/// (`i64::MIN // -1`). `b` must be non-zero.
fn floor_div(a: i64, b: i64) -> Option<i64> {
    let quotient = a.checked_div(b)?;
    if a % b != 0 && ((a < 0) != (b < 0)) {
        Some(quotient - 1)
    } else {
        Some(quotient)
    }
}

/// Remainder with the sign of the divisor. `b` must be non-zero.
fn floor_mod(a: i64, b: i64) -> i64 {
    let rem = a.wrapping_rem(b);
    if rem != 0 && ((rem < 0) != (b < 0)) {
        rem + b
    } else {
        rem
    }
}

/// Floor quotient and divisor-signed remainder of two floats.
fn float_divmod(a: f64, b: f64) -> Result<(f64, f64), EvalError> {
    if b == 0.0 {
        return Err(EvalError::DivisionByZero);
    }
    let mut rem = a % b;
    let mut div = (a - rem) / b;
    if rem != 0.0 {
        if (b < 0.0) != (rem < 0.0) {
            rem += b;
            div -= 1.0;
        }
    } else {
        rem = 0.0_f64.copysign(b);
    }

    let quotient = if div != 0.0 {
        let mut floored = div.floor();
        if div - floored > 0.5 {
            floored += 1.0;
        }
        floored
    } else {
        0.0_f64.copysign(a / b)
    };
    Ok((quotient, rem))
}

fn int_pow(base: i64, exp: i64) -> Result<Value, EvalError> {
    if exp < 0 {
        if base == 0 {
            return Err(EvalError::DivisionByZero);
        }
        return Ok(Value::Float((base as f64).powf(exp as f64)));
    }
    let overflow = EvalError::Overflow(BinOp::Pow.symbol());
    match u32::try_from(exp) {
        Ok(exp) => base.checked_pow(exp).map(Value::Int).ok_or(overflow),
        Err(_) => match base {
            0 | 1 => Ok(Value::Int(base)),
            -1 => Ok(Value::Int(if exp % 2 == 0 { 1 } else { -1 })),
            _ => Err(overflow),
        },
    }
}

fn float_pow(base: f64, exp: f64) -> Result<Value, EvalError> {
    if exp == 0.0 {
        return Ok(Value::Float(1.0));
    }
    if base == 0.0 && exp < 0.0 {
        return Err(EvalError::DivisionByZero);
    }
    let finite = base.is_finite() && exp.is_finite();
    if finite && base < 0.0 && exp.fract() != 0.0 {
        return Err(EvalError::Unsupported(
            "negative number raised to a fractional power".to_string(),
        ));
    }
    let result = base.powf(exp);
    if finite && result.is_infinite() {
        return Err(EvalError::Overflow(BinOp::Pow.symbol()));
    }
    Ok(Value::Float(result))
}

fn shift_left(value: i64, count: i64) -> Option<i64> {
    if value == 0 {
        return Some(0);
    }
    if count >= 64 {
        return None;
    }
    let shifted = value << count;
    (shifted >> count == value).then_some(shifted)
}

/// Arithmetic shift: rounds toward negative infinity.
fn shift_right(value: i64, count: i64) -> i64 {
    if count >= 64 {
        if value < 0 { -1 } else { 0 }
    } else {
        value >> count
    }
}
