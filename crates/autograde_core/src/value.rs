//! Dynamic values passed to and returned from student functions.
//!
//! Equality follows Python rather than Rust: `Bool`, `Int` and `Float` compare numerically (`True == 1 == 1.0`),
//! integers and floats compare exactly (no rounding through `f64`), and a `List` never equals a `Tuple`.
//! `Display` renders Python `repr` text so failure messages read the way students expect.

use std::collections::BTreeMap;
use std::fmt;

/// A dynamically typed value.
#[derive(Debug, Clone, Default)]
pub enum Value {
    #[default]
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Value>),
    Tuple(Vec<Value>),
    Dict(BTreeMap<String, Value>),
}

impl Value {
    /// Build a tuple value from anything convertible into values.
    pub fn tuple<I, T>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Value>,
    {
        Value::Tuple(items.into_iter().map(Into::into).collect())
    }

    /// Build a list value from anything convertible into values.
    pub fn list<I, T>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Value>,
    {
        Value::List(items.into_iter().map(Into::into).collect())
    }

    /// Numeric view of `Bool` (0 or 1), `Int` and `Float`. Every other variant is `None`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Bool(b) => Some(f64::from(u8::from(*b))),
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn is_numeric(&self) -> bool {
        self.as_f64().is_some()
    }

    /// Python type name, used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::None => "NoneType",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "str",
            Value::List(_) => "list",
            Value::Tuple(_) => "tuple",
            Value::Dict(_) => "dict",
        }
    }

    /// Integer view of `Bool` and `Int`.
    fn as_int(&self) -> Option<i64> {
        match self {
            Value::Bool(b) => Some(i64::from(*b)),
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }
}

/// Exact int/float equality: the float must be integral and convert back to the same integer.
fn int_eq_float(i: i64, f: f64) -> bool {
    // 2^63 itself is out of range for i64
    const LIMIT: f64 = 9_223_372_036_854_775_808.0;
    f.fract() == 0.0 && (-LIMIT..LIMIT).contains(&f) && f as i64 == i
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::None, Value::None) => true,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Tuple(a), Value::Tuple(b)) => a == b,
            (Value::Dict(a), Value::Dict(b)) => a == b,
            (a, b) => match (a.as_int(), b.as_int(), a, b) {
                (Some(x), Some(y), _, _) => x == y,
                (Some(x), None, _, Value::Float(f)) | (None, Some(x), Value::Float(f), _) => int_eq_float(x, *f),
                _ => false,
            },
        }
    }
}

fn write_float(f: &mut fmt::Formatter<'_>, x: f64) -> fmt::Result {
    if x.is_nan() {
        f.write_str("nan")
    } else if x.is_infinite() {
        f.write_str(if x > 0.0 { "inf" } else { "-inf" })
    } else if x != 0.0 && !(1e-4..1e16).contains(&x.abs()) {
        write_float_exponent(f, x)
    } else if x.fract() == 0.0 {
        write!(f, "{:.1}", x)
    } else {
        write!(f, "{}", x)
    }
}

/// Scientific notation with a signed exponent of at least two digits (`1e+16`, `1.5e-05`).
fn write_float_exponent(f: &mut fmt::Formatter<'_>, x: f64) -> fmt::Result {
    let text = format!("{:e}", x);
    match text.split_once('e').map(|(m, e)| (m, e.parse::<i32>())) {
        Some((mantissa, Ok(exponent))) => {
            let sign = if exponent < 0 { '-' } else { '+' };
            write!(f, "{}e{}{:02}", mantissa, sign, exponent.unsigned_abs())
        }
        _ => f.write_str(&text),
    }
}

fn write_str_repr(f: &mut fmt::Formatter<'_>, s: &str) -> fmt::Result {
    let quote = if s.contains('\'') && !s.contains('"') { '"' } else { '\'' };
    let mut out = String::with_capacity(s.len() + 2);
    out.push(quote);
    for ch in s.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c => out.push(c),
        }
    }
    out.push(quote);
    f.write_str(&out)
}

fn write_items(f: &mut fmt::Formatter<'_>, items: &[Value]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::None => f.write_str("None"),
            Value::Bool(true) => f.write_str("True"),
            Value::Bool(false) => f.write_str("False"),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write_float(f, *x),
            Value::Str(s) => write_str_repr(f, s),
            Value::List(items) => {
                f.write_str("[")?;
                write_items(f, items)?;
                f.write_str("]")
            }
            Value::Tuple(items) => {
                f.write_str("(")?;
                write_items(f, items)?;
                if items.len() == 1 {
                    f.write_str(",")?;
                }
                f.write_str(")")
            }
            Value::Dict(map) => {
                f.write_str("{")?;
                for (i, (key, value)) in map.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write_str_repr(f, key)?;
                    write!(f, ": {}", value)?;
                }
                f.write_str("}")
            }
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(i64::from(v))
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Value::Int(i64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::list(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::None, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_int_equals_float() {
        assert_eq!(Value::Int(4), Value::Float(4.0));
        assert_ne!(Value::Int(4), Value::Float(4.5));
    }

    #[test]
    fn test_bool_compares_as_int() {
        assert_eq!(Value::Bool(true), Value::Int(1));
        assert_eq!(Value::Int(0), Value::Bool(false));
        assert_eq!(Value::Bool(true), Value::Float(1.0));
        assert_ne!(Value::Bool(true), Value::Int(2));
        assert_eq!(Value::Bool(true).as_f64(), Some(1.0));
    }

    #[test]
    fn test_list_and_tuple_differ() {
        assert_ne!(Value::list([2, 1]), Value::tuple([2, 1]));
        assert_eq!(Value::tuple([2, 1]), Value::tuple([2, 1]));
        assert_eq!(Value::list([1, 2]), Value::list([1.0, 2.0]));
    }

    #[test]
    fn test_large_int_against_float_is_exact() {
        let big = (1i64 << 53) + 1;
        assert_ne!(Value::Int(big), Value::Float((1i64 << 53) as f64));
        assert_eq!(Value::Int(1 << 53), Value::Float((1i64 << 53) as f64));
        assert_ne!(Value::Int(i64::MAX), Value::Float(9.223_372_036_854_775_808e18));
        assert_ne!(Value::Int(1), Value::Float(f64::NAN));
    }

    #[test]
    fn test_nan_is_not_equal_to_itself() {
        assert_ne!(Value::Float(f64::NAN), Value::Float(f64::NAN));
    }

    #[test]
    fn test_repr_scalars() {
        assert_eq!(Value::None.to_string(), "None");
        assert_eq!(Value::Bool(false).to_string(), "False");
        assert_eq!(Value::Int(-3).to_string(), "-3");
        assert_eq!(Value::Float(4.0).to_string(), "4.0");
        assert_eq!(Value::Float(4.05).to_string(), "4.05");
        assert_eq!(Value::Float(f64::INFINITY).to_string(), "inf");
    }

    #[test]
    fn test_repr_float_exponent_range() {
        assert_eq!(Value::Float(1e16).to_string(), "1e+16");
        assert_eq!(Value::Float(1.5e-5).to_string(), "1.5e-05");
        assert_eq!(Value::Float(-2.5e100).to_string(), "-2.5e+100");
        assert_eq!(Value::Float(1e15).to_string(), "1000000000000000.0");
        assert_eq!(Value::Float(0.0001).to_string(), "0.0001");
        assert_eq!(Value::Float(0.0).to_string(), "0.0");
    }

    #[test]
    fn test_repr_strings() {
        assert_eq!(Value::from("hi").to_string(), "'hi'");
        assert_eq!(Value::from("it's").to_string(), "\"it's\"");
        assert_eq!(Value::from("a\nb").to_string(), "'a\\nb'");
    }

    #[test]
    fn test_repr_containers() {
        assert_eq!(Value::tuple([3]).to_string(), "(3,)");
        assert_eq!(Value::tuple([1, 2]).to_string(), "(1, 2)");
        assert_eq!(Value::Tuple(Vec::new()).to_string(), "()");
        assert_eq!(Value::list(["a", "b"]).to_string(), "['a', 'b']");

        let mut map = BTreeMap::new();
        map.insert("x".to_string(), Value::Int(1));
        map.insert("y".to_string(), Value::None);
        assert_eq!(Value::Dict(map).to_string(), "{'x': 1, 'y': None}");
    }

    #[test]
    fn test_option_conversion() {
        assert_eq!(Value::from(None::<i64>), Value::None);
        assert_eq!(Value::from(Some(2)), Value::Int(2));
    }
}
