use std::fmt;

use crate::error::EvalError;

/// The result of evaluating an expression.
///
/// Containers keep insertion order. `Set` holds no two equal elements and
/// `Dict` no two equal keys, where equality is the numeric-aware
/// [`Value::key_eq`] (so `1`, `1.0` and `True` are the same key).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Value {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Value>),
    Tuple(Vec<Value>),
    Set(Vec<Value>),
    Dict(Vec<(Value, Value)>),
}

/// A numeric operand, with booleans already widened to integers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    pub(crate) fn to_f64(self) -> f64 {
        match self {
            Number::Int(i) => i as f64,
            Number::Float(f) => f,
        }
    }
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::None => "NoneType",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "str",
            Value::List(_) => "list",
            Value::Tuple(_) => "tuple",
            Value::Set(_) => "set",
            Value::Dict(_) => "dict",
        }
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Value::None => false,
            Value::Bool(b) => *b,
            Value::Int(i) => *i != 0,
            Value::Float(f) => *f != 0.0,
            Value::Str(s) => !s.is_empty(),
            Value::List(items) | Value::Tuple(items) | Value::Set(items) => !items.is_empty(),
            Value::Dict(entries) => !entries.is_empty(),
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            Value::Bool(b) => Some(i64::from(*b)),
            _ => None,
        }
    }

    /// The value as an integer if it is a whole number that fits in `i64`:
    /// integers, booleans, and floats without a fractional part.
    pub fn as_integral(&self) -> Option<i64> {
        match self {
            Value::Float(f) => float_to_i64(*f),
            other => other.as_int(),
        }
    }

    pub(crate) fn as_number(&self) -> Option<Number> {
        match self {
            Value::Float(f) => Some(Number::Float(*f)),
            other => other.as_int().map(Number::Int),
        }
    }

    /// Equality as used for set membership and dict keys.
    ///
    /// Numbers compare by value across kinds; tuples compare element-wise.
    pub fn key_eq(&self, other: &Value) -> bool {
        if let (Some(a), Some(b)) = (self.as_number(), other.as_number()) {
            return match (a, b) {
                (Number::Int(a), Number::Int(b)) => a == b,
                (Number::Float(a), Number::Float(b)) => a == b,
                (Number::Int(i), Number::Float(f)) | (Number::Float(f), Number::Int(i)) => {
                    float_to_i64(f) == Some(i)
                }
            };
        }
        match (self, other) {
            (Value::None, Value::None) => true,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Tuple(a), Value::Tuple(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.key_eq(y))
            }
            _ => false,
        }
    }

    /// Check that the value may be used as a set element or dict key.
    pub fn check_hashable(&self) -> Result<(), EvalError> {
        match self {
            Value::List(_) | Value::Set(_) | Value::Dict(_) => {
                Err(EvalError::Unhashable(self.type_name()))
            }
            Value::Tuple(items) => items.iter().try_for_each(Value::check_hashable),
            _ => Ok(()),
        }
    }

    /// The elements produced by iterating the value: container elements,
    /// dict keys, or the characters of a string. `None` if not iterable.
    pub(crate) fn into_items(self) -> Option<Vec<Value>> {
        match self {
            Value::List(items) | Value::Tuple(items) | Value::Set(items) => Some(items),
            Value::Dict(entries) => Some(entries.into_iter().map(|(key, _)| key).collect()),
            Value::Str(s) => Some(s.chars().map(|c| Value::Str(c.to_string())).collect()),
            _ => None,
        }
    }

    /// The textual form of the value as it would be written in an expression.
    pub fn repr(&self) -> Repr<'_> {
        Repr(self)
    }
}

/// Add `item` to an insertion-ordered set unless an equal element is present.
pub(crate) fn set_insert(items: &mut Vec<Value>, item: Value) -> Result<(), EvalError> {
    item.check_hashable()?;
    if !items.iter().any(|existing| existing.key_eq(&item)) {
        items.push(item);
    }
    Ok(())
}

/// Insert or overwrite an entry. An existing key keeps its position and its
/// original spelling (`{1: 'a', 1.0: 'b'}` is `{1: 'b'}`).
pub(crate) fn dict_insert(
    entries: &mut Vec<(Value, Value)>,
    key: Value,
    value: Value,
) -> Result<(), EvalError> {
    key.check_hashable()?;
    match entries.iter_mut().find(|(existing, _)| existing.key_eq(&key)) {
        Some((_, slot)) => *slot = value,
        None => entries.push((key, value)),
    }
    Ok(())
}

fn float_to_i64(f: f64) -> Option<i64> {
    // 2^63 is exactly representable; every float in [-2^63, 2^63) with no
    // fractional part converts without loss.
    const LIMIT: f64 = 9_223_372_036_854_775_808.0;
    if f.is_finite() && f.fract() == 0.0 && (-LIMIT..LIMIT).contains(&f) {
        Some(f as i64)
    } else {
        None
    }
}

/// Shortest round-trip form, switching to exponent notation outside
/// `[1e-4, 1e16)`: `2.0`, `0.1`, `1e+16`, `1.5e-05`, `inf`, `nan`.
pub(crate) fn format_float(f: f64) -> String {
    if f.is_nan() {
        return "nan".to_string();
    }
    if f.is_infinite() {
        return if f > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    if f == 0.0 {
        return if f.is_sign_negative() { "-0.0" } else { "0.0" }.to_string();
    }

    let scientific = format!("{:e}", f);
    let (mantissa, exponent) = match scientific.split_once('e') {
        Some((mantissa, exponent)) => (mantissa, exponent.parse::<i32>().unwrap_or(0)),
        None => (scientific.as_str(), 0),
    };

    if (-4..16).contains(&exponent) {
        let fixed = f.to_string();
        if fixed.contains('.') {
            fixed
        } else {
            format!("{}.0", fixed)
        }
    } else {
        let sign = if exponent < 0 { '-' } else { '+' };
        format!("{}e{}{:02}", mantissa, sign, exponent.abs())
    }
}

fn write_str_repr(f: &mut fmt::Formatter<'_>, s: &str) -> fmt::Result {
    let quote = if s.contains('\'') && !s.contains('"') {
        '"'
    } else {
        '\''
    };
    write!(f, "{}", quote)?;
    for ch in s.chars() {
        match ch {
            '\\' => write!(f, "\\\\")?,
            '\n' => write!(f, "\\n")?,
            '\r' => write!(f, "\\r")?,
            '\t' => write!(f, "\\t")?,
            c if c == quote => write!(f, "\\{}", c)?,
            c if c.is_control() => match c as u32 {
                code @ 0..=0xff => write!(f, "\\x{:02x}", code)?,
                code @ 0x100..=0xffff => write!(f, "\\u{:04x}", code)?,
                code => write!(f, "\\U{:08x}", code)?,
            },
            c => write!(f, "{}", c)?,
        }
    }
    write!(f, "{}", quote)
}

fn write_seq(f: &mut fmt::Formatter<'_>, items: &[Value]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", item.repr())?;
    }
    Ok(())
}

/// Display adapter returned by [`Value::repr`]. Strings are quoted.
pub struct Repr<'a>(&'a Value);

impl fmt::Display for Repr<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Value::None => write!(f, "None"),
            Value::Bool(b) => write!(f, "{}", if *b { "True" } else { "False" }),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(fl) => write!(f, "{}", format_float(*fl)),
            Value::Str(s) => write_str_repr(f, s),
            Value::List(items) => {
                write!(f, "[")?;
                write_seq(f, items)?;
                write!(f, "]")
            }
            Value::Tuple(items) => {
                write!(f, "(")?;
                write_seq(f, items)?;
                if items.len() == 1 {
                    write!(f, ",")?;
                }
                write!(f, ")")
            }
            Value::Set(items) if items.is_empty() => write!(f, "set()"),
            Value::Set(items) => {
                write!(f, "{{")?;
                write_seq(f, items)?;
                write!(f, "}}")
            }
            Value::Dict(entries) => {
                write!(f, "{{")?;
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", key.repr(), value.repr())?;
                }
                write!(f, "}}")
            }
        }
    }
}

/// Strings display as their raw text; every other value as its repr.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Str(s) => write!(f, "{}", s),
            other => write!(f, "{}", other.repr()),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::List(v.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_float_repr() {
        assert_eq!(format_float(2.0), "2.0");
        assert_eq!(format_float(0.1), "0.1");
        assert_eq!(format_float(-3.5), "-3.5");
        assert_eq!(format_float(1e15), "1000000000000000.0");
        assert_eq!(format_float(1e16), "1e+16");
        assert_eq!(format_float(1.5e-5), "1.5e-05");
        assert_eq!(format_float(0.0001), "0.0001");
        assert_eq!(format_float(-0.0), "-0.0");
        assert_eq!(format_float(f64::INFINITY), "inf");
        assert_eq!(format_float(f64::NAN), "nan");
    }

    #[test]
    fn test_display_and_repr() {
        let value = Value::List(vec![
            Value::Str("it's".to_string()),
            Value::Tuple(vec![Value::Int(1)]),
            Value::Set(vec![]),
            Value::Dict(vec![(Value::Str("k".to_string()), Value::None)]),
            Value::Bool(true),
        ]);
        assert_eq!(
            value.to_string(),
            r#"["it's", (1,), set(), {'k': None}, True]"#
        );
        assert_eq!(Value::from("a\nb").to_string(), "a\nb");
        assert_eq!(Value::from("a\nb").repr().to_string(), r"'a\nb'");
        assert_eq!(Value::from("\u{7}").repr().to_string(), r"'\x07'");
        assert_eq!(Value::Tuple(vec![]).to_string(), "()");
    }

    #[test]
    fn test_key_eq_across_numeric_kinds() {
        assert!(Value::Int(1).key_eq(&Value::Float(1.0)));
        assert!(Value::Bool(true).key_eq(&Value::Int(1)));
        assert!(!Value::Int(1).key_eq(&Value::Float(1.5)));
        assert!(!Value::Int(1).key_eq(&Value::from("1")));
        assert!(
            Value::Tuple(vec![Value::Int(0), Value::None])
                .key_eq(&Value::Tuple(vec![Value::Bool(false), Value::None]))
        );
        assert!(!Value::Int(i64::MAX).key_eq(&Value::Float(i64::MAX as f64)));
    }

    #[test]
    fn test_set_and_dict_insert() {
        let mut items = Vec::new();
        set_insert(&mut items, Value::Int(1)).unwrap();
        set_insert(&mut items, Value::Float(1.0)).unwrap();
        set_insert(&mut items, Value::Int(2)).unwrap();
        assert_eq!(items, vec![Value::Int(1), Value::Int(2)]);

        let mut entries = Vec::new();
        dict_insert(&mut entries, Value::Int(1), Value::from("a")).unwrap();
        dict_insert(&mut entries, Value::Float(1.0), Value::from("b")).unwrap();
        assert_eq!(entries, vec![(Value::Int(1), Value::from("b"))]);

        assert_eq!(
            set_insert(&mut items, Value::from(vec![1])),
            Err(EvalError::Unhashable("list"))
        );
        assert_eq!(
            Value::Tuple(vec![Value::Int(1), Value::Dict(vec![])]).check_hashable(),
            Err(EvalError::Unhashable("dict"))
        );
    }

    #[test]
    fn test_as_integral() {
        assert_eq!(Value::Int(-5).as_integral(), Some(-5));
        assert_eq!(Value::Bool(true).as_integral(), Some(1));
        assert_eq!(Value::Float(2.0).as_integral(), Some(2));
        assert_eq!(Value::Float(2.5).as_integral(), None);
        assert_eq!(Value::Float(1e300).as_integral(), None);
        assert_eq!(Value::from("2").as_integral(), None);
    }

    #[test]
    fn test_into_items() {
        assert_eq!(
            Value::from("ab").into_items(),
            Some(vec![Value::from("a"), Value::from("b")])
        );
        assert_eq!(
            Value::Dict(vec![(Value::from("k"), Value::Int(1))]).into_items(),
            Some(vec![Value::from("k")])
        );
        assert_eq!(Value::Int(3).into_items(), None);
    }
}
