//! Conversions into [`Value`] and loose conversions out of it.

use super::{Array, Integer, Object, Real, Type, Value};
use crate::error::{Error, Result};

impl Value {
    /// Interprets the value as a boolean.
    ///
    /// Null is `false`, numbers are `true` when non-zero, and strings and
    /// containers are `true` when non-empty.
    pub fn coerce_bool(&self) -> Result<bool> {
        Ok(match self {
            Value::Null => false,
            Value::Boolean(b) => *b,
            Value::Integer(i) => *i != 0,
            Value::Real(r) => r.abs() >= Real::EPSILON,
            Value::String(s) => !s.is_empty(),
            Value::Array(a) => !a.is_empty(),
            Value::Object(o) => !o.is_empty(),
        })
    }

    /// Interprets the value as an integer.
    ///
    /// Reals are truncated toward zero.
    pub fn coerce_int(&self) -> Result<Integer> {
        match self {
            Value::Null => Ok(0),
            Value::Boolean(b) => Ok(*b as Integer),
            Value::Integer(i) => Ok(*i),
            Value::Real(r) => Ok(*r as Integer),
            Value::String(s) => s
                .trim()
                .parse()
                .map_err(|_| self.conversion(Type::Integer)),
            _ => Err(self.conversion(Type::Integer)),
        }
    }

    /// Interprets the value as a real.
    pub fn coerce_real(&self) -> Result<Real> {
        match self {
            Value::Null => Ok(0.0),
            Value::Boolean(b) => Ok(if *b { 1.0 } else { 0.0 }),
            Value::Integer(i) => Ok(*i as Real),
            Value::Real(r) => Ok(*r),
            Value::String(s) => s
                .trim()
                .parse()
                .map_err(|_| self.conversion(Type::Real)),
            _ => Err(self.conversion(Type::Real)),
        }
    }

    /// Renders a scalar as a string.
    ///
    /// Null becomes the empty string and reals use six decimal places.
    pub fn coerce_string(&self) -> Result<String> {
        match self {
            Value::Null => Ok(String::new()),
            Value::Boolean(b) => Ok(b.to_string()),
            Value::Integer(i) => Ok(i.to_string()),
            Value::Real(r) => Ok(format!("{r:.6}")),
            Value::String(s) => Ok(s.clone()),
            _ => Err(self.conversion(Type::String)),
        }
    }

    fn conversion(&self, to: Type) -> Error {
        Error::Conversion {
            from: self.ty(),
            to,
        }
    }
}

impl From<Type> for Value {
    fn from(ty: Type) -> Self {
        Value::new(ty)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}

macro_rules! from_integer {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Value {
                fn from(value: $ty) -> Self {
                    Value::Integer(value as Integer)
                }
            }
        )*
    };
}

from_integer!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

impl From<f32> for Value {
    fn from(value: f32) -> Self {
        Value::Real(value as Real)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Real(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<&String> for Value {
    fn from(value: &String) -> Self {
        Value::String(value.clone())
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(value: Vec<T>) -> Self {
        Value::Array(value.into_iter().map(Into::into).collect())
    }
}

impl<T: Clone + Into<Value>> From<&[T]> for Value {
    fn from(value: &[T]) -> Self {
        Value::Array(value.iter().cloned().map(Into::into).collect())
    }
}

impl From<Object> for Value {
    fn from(value: Object) -> Self {
        Value::Object(value)
    }
}

/// `None` becomes null.
impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

impl<T: Into<Value>> FromIterator<T> for Value {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Value::Array(iter.into_iter().map(Into::into).collect::<Array>())
    }
}

/// Collects key/value pairs into an object. Later duplicates are ignored.
impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Value {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut object = Object::new();
        for (key, value) in iter {
            object.entry(key.into()).or_insert_with(|| value.into());
        }
        Value::Object(object)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coerce_bool() {
        assert_eq!(Value::Null.coerce_bool(), Ok(false));
        assert_eq!(Value::from(0).coerce_bool(), Ok(false));
        assert_eq!(Value::from(-3).coerce_bool(), Ok(true));
        assert_eq!(Value::from(0.0).coerce_bool(), Ok(false));
        assert_eq!(Value::from(0.5).coerce_bool(), Ok(true));
        assert_eq!(Value::from("yes").coerce_bool(), Ok(true));
        assert_eq!(Value::from("false").coerce_bool(), Ok(true));
        assert_eq!(Value::from("").coerce_bool(), Ok(false));
        assert_eq!(Value::from(vec![1]).coerce_bool(), Ok(true));
        assert_eq!(Value::new(Type::Array).coerce_bool(), Ok(false));
        assert_eq!(vec![("k", 1i64)].into_iter().collect::<Value>().coerce_bool(), Ok(true));
        assert_eq!(Value::new(Type::Object).coerce_bool(), Ok(false));
    }

    #[test]
    fn test_coerce_int() {
        assert_eq!(Value::Null.coerce_int(), Ok(0));
        assert_eq!(Value::from(true).coerce_int(), Ok(1));
        assert_eq!(Value::from(3.99).coerce_int(), Ok(3));
        assert_eq!(Value::from(-3.99).coerce_int(), Ok(-3));
        assert_eq!(Value::from("123").coerce_int(), Ok(123));
        assert!(Value::from("12a").coerce_int().is_err());
        assert!(Value::new(Type::Object).coerce_int().is_err());
    }

    #[test]
    fn test_coerce_real() {
        assert_eq!(Value::from(false).coerce_real(), Ok(0.0));
        assert_eq!(Value::from(7).coerce_real(), Ok(7.0));
        assert_eq!(Value::from("2.5").coerce_real(), Ok(2.5));
        assert!(Value::from("two").coerce_real().is_err());
    }

    #[test]
    fn test_coerce_string() {
        assert_eq!(Value::Null.coerce_string(), Ok(String::new()));
        assert_eq!(Value::from(true).coerce_string(), Ok("true".into()));
        assert_eq!(Value::from(-12).coerce_string(), Ok("-12".into()));
        assert_eq!(Value::from(1.5).coerce_string(), Ok("1.500000".into()));
        assert_eq!(Value::from("same").coerce_string(), Ok("same".into()));
        assert!(Value::new(Type::Array).coerce_string().is_err());
    }

    #[test]
    fn test_from_option() {
        assert!(Value::from(None::<i32>).is_null());
        assert_eq!(Value::from(Some("x")).as_str(), Ok("x"));
    }

    #[test]
    fn test_from_unsigned_wraps() {
        assert_eq!(Value::from(u64::MAX).as_int(), Ok(-1));
        assert_eq!(Value::from(1u64 << 63).as_int(), Ok(i64::MIN));
        assert_eq!(Value::from(42u64).as_int(), Ok(42));
    }

    #[test]
    fn test_collect() {
        let array: Value = (1..=3i64).collect();
        assert_eq!(array.len(), Ok(3));
        assert_eq!(array[2].as_int(), Ok(3));

        let object: Value = vec![("a", 1i64), ("b", 2), ("a", 3)].into_iter().collect();
        assert_eq!(object.len(), Ok(2));
        assert_eq!(object["a"].as_int(), Ok(1));
    }
}
