//! Equality, ordering, hashing and display for [`Value`].
//!
//! Integers and reals compare numerically, and reals are equal when they
//! differ by at most [`f64::EPSILON`]. Values of unrelated types are ordered by
//! their [`Type`](super::Type).

use std::{
    cmp::Ordering,
    fmt,
    hash::{Hash, Hasher},
};

use super::{Integer, Real, Value};

fn close(a: Real, b: Real) -> bool {
    (a - b).abs() <= Real::EPSILON
}

impl PartialEq for Value {
    fn eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Real(a), Value::Real(b)) => close(*a, *b),
            (Value::Integer(i), Value::Real(r)) | (Value::Real(r), Value::Integer(i)) => {
                close(*i as Real, *r)
            }
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a == b,
            _ => false,
        }
    }
}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Null, Value::Null) => Some(Ordering::Equal),
            (Value::Boolean(a), Value::Boolean(b)) => a.partial_cmp(b),
            (Value::Integer(a), Value::Integer(b)) => a.partial_cmp(b),
            (Value::Real(a), Value::Real(b)) => a.partial_cmp(b),
            (Value::Integer(a), Value::Real(b)) => (*a as Real).partial_cmp(b),
            (Value::Real(a), Value::Integer(b)) => a.partial_cmp(&(*b as Real)),
            (Value::String(a), Value::String(b)) => a.partial_cmp(b),
            (Value::Array(a), Value::Array(b)) => a.partial_cmp(b),
            // smaller objects first, then member by member
            (Value::Object(a), Value::Object(b)) => match a.len().cmp(&b.len()) {
                Ordering::Equal => a.iter().partial_cmp(b.iter()),
                ordering => Some(ordering),
            },
            _ => self.ty().partial_cmp(&other.ty()),
        }
    }
}

/// Reals within [`f64::EPSILON`] of each other compare equal, so this relation
/// is not transitive, and a `NaN` real never equals itself. Values holding
/// either still work as map keys but may not be found again by lookup.
impl Eq for Value {}

/// Integral reals hash like the equal integer.
///
/// Agreement with `==` is only guaranteed for exact numbers. Two non-integral
/// reals that are equal within [`f64::EPSILON`] (`0.1 + 0.2` and `0.3`) hash
/// their bits and so usually differ.
impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            Value::Null => 0u8.hash(state),
            Value::Boolean(b) => {
                1u8.hash(state);
                b.hash(state);
            }
            Value::Integer(i) => {
                2u8.hash(state);
                i.hash(state);
            }
            Value::Real(r) => {
                if r.fract() == 0.0 && *r >= Integer::MIN as Real && *r < Integer::MAX as Real {
                    2u8.hash(state);
                    (*r as Integer).hash(state);
                } else {
                    3u8.hash(state);
                    r.to_bits().hash(state);
                }
            }
            Value::String(s) => {
                4u8.hash(state);
                s.hash(state);
            }
            Value::Array(a) => {
                5u8.hash(state);
                a.hash(state);
            }
            Value::Object(o) => {
                6u8.hash(state);
                o.hash(state);
            }
        }
    }
}

macro_rules! eq_scalar {
    ($($ty:ty),*) => {
        $(
            impl PartialEq<$ty> for Value {
                fn eq(&self, other: &$ty) -> bool {
                    *self == Value::from(*other)
                }
            }
        )*
    };
}

eq_scalar!(bool, i32, i64, u32, u64, f64);

impl PartialEq<str> for Value {
    fn eq(&self, other: &str) -> bool {
        matches!(self, Value::String(s) if s == other)
    }
}

impl PartialEq<&str> for Value {
    fn eq(&self, other: &&str) -> bool {
        *self == **other
    }
}

/// Human-readable rendering: `Null`, `True`, `[1, 2]`, `{key:value}`.
///
/// Strings are printed without quotes. Use [`json::write`](crate::json::write)
/// for JSON text.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("Null"),
            Value::Boolean(true) => f.write_str("True"),
            Value::Boolean(false) => f.write_str("False"),
            Value::Integer(i) => write!(f, "{i}"),
            Value::Real(r) => write!(f, "{r}"),
            Value::String(s) => f.write_str(s),
            Value::Array(array) => {
                f.write_str("[")?;
                for (i, item) in array.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Value::Object(object) => {
                f.write_str("{")?;
                for (i, (key, item)) in object.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{key}:{item}")?;
                }
                f.write_str("}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::{HashSet, hash_map::DefaultHasher};

    use super::*;
    use crate::value::{Object, Type};

    fn hash_of(value: &Value) -> u64 {
        let mut hasher = DefaultHasher::new();
        value.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn test_numeric_equality() {
        assert_eq!(Value::from(1), Value::from(1.0));
        assert_eq!(Value::from(0.1 + 0.2), Value::from(0.3));
        assert_ne!(Value::from(1), Value::from(1.5));
        assert_ne!(Value::from(1), Value::from("1"));
        assert_ne!(Value::Null, Value::from(false));
    }

    #[test]
    fn test_scalar_comparisons() {
        assert_eq!(Value::from(42), 42);
        assert_eq!(Value::from(2.5), 2.5);
        assert_eq!(Value::from(true), true);
        assert_eq!(Value::from("text"), "text");
        assert!(Value::from("text") != "other");
    }

    #[test]
    fn test_container_equality() {
        let a: Value = [("x", 1i64), ("y", 2)].into_iter().collect();
        let b: Value = [("y", 2i64), ("x", 1)].into_iter().collect();
        assert_eq!(a, b);
        assert_eq!(Value::from(vec![1, 2]), Value::from(vec![1.0, 2.0]));
        assert_ne!(Value::from(vec![1, 2]), Value::from(vec![1, 2, 3]));
    }

    #[test]
    fn test_ordering() {
        assert!(Value::Null < Value::from(false));
        assert!(Value::from(true) < Value::from(0));
        assert!(Value::from(1) < Value::from(1.5));
        assert!(Value::from(2.5) < Value::from(3));
        assert!(Value::from(100) < Value::from("a"));
        assert!(Value::from("a") < Value::from("b"));
        assert!(Value::from(vec![1, 2]) < Value::from(vec![1, 3]));
        assert!(Value::new(Type::Array) < Value::new(Type::Object));

        let small: Value = [("z", 1i64)].into_iter().collect();
        let large: Value = [("a", 1i64), ("b", 2)].into_iter().collect();
        assert!(small < large);
    }

    #[test]
    fn test_hash_consistent_with_eq() {
        assert_eq!(hash_of(&Value::from(3)), hash_of(&Value::from(3.0)));
        assert_ne!(hash_of(&Value::from(3)), hash_of(&Value::from("3")));

        let mut set = HashSet::new();
        set.insert(Value::from("a"));
        set.insert(Value::from(1));
        set.insert(Value::from(1.0));
        set.insert(Value::new(Type::Object));
        assert_eq!(set.len(), 3);
        assert!(set.contains(&Value::from(1.0)));
    }

    #[test]
    fn test_values_as_map_keys() {
        let mut map = std::collections::HashMap::new();
        map.insert(Value::from(vec![1, 2]), "pair");
        map.insert(Value::from(0.5), "half");
        assert_eq!(map.get(&Value::from(vec![1.0, 2.0])), Some(&"pair"));
        assert_eq!(map.get(&Value::from(0.5)), Some(&"half"));
        assert_eq!(map.get(&Value::from("0.5")), None);
    }

    #[test]
    fn test_display() {
        let mut object = Object::new();
        object.insert("a".into(), Value::from(vec![Value::Null, true.into()]));
        object.insert("b".into(), "text".into());
        assert_eq!(Value::from(object).to_string(), "{a:[Null, True], b:text}");
        assert_eq!(Value::from(false).to_string(), "False");
        assert_eq!(Value::from(-5).to_string(), "-5");
    }
}
