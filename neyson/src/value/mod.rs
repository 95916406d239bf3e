//! The dynamic value tree.
//!
//! A [`Value`] is one of seven types: null, boolean, integer, real, string,
//! array or object. Typed accessors (`as_*`) fail with
//! [`Error::TypeMismatch`] when the stored type differs from the requested
//! one, while the loose conversions (`coerce_*`, see [`convert`](self)) try to
//! make sense of whatever is stored.
//!
//! Objects are ordered by key, so serialized output is deterministic.

use std::{
    collections::BTreeMap,
    fmt,
    ops::{Index, IndexMut},
    slice,
};

use crate::error::{Error, Result};

mod cmp;
mod convert;
mod pointer;

pub use pointer::MAX_POINTER_GROWTH;

/// Integer payload type.
pub type Integer = i64;
/// Real (floating-point) payload type.
pub type Real = f64;
/// Array payload type.
pub type Array = Vec<Value>;
/// Object payload type, ordered by key.
pub type Object = BTreeMap<String, Value>;

/// The type tag of a [`Value`].
///
/// The declaration order is also the order used when comparing values of
/// different types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Type {
    /// No value.
    Null,
    /// `true` or `false`.
    Boolean,
    /// 64-bit signed integer.
    Integer,
    /// 64-bit floating-point number.
    Real,
    /// UTF-8 string.
    String,
    /// Ordered sequence of values.
    Array,
    /// Key-ordered map from strings to values.
    Object,
}

impl Type {
    /// Returns the display name of the type.
    pub fn name(self) -> &'static str {
        match self {
            Type::Null => "Null",
            Type::Boolean => "Boolean",
            Type::Integer => "Integer",
            Type::Real => "Real",
            Type::String => "String",
            Type::Array => "Array",
            Type::Object => "Object",
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A dynamically typed value.
#[derive(Debug, Clone, Default)]
pub enum Value {
    /// No value.
    #[default]
    Null,
    /// Boolean value.
    Boolean(bool),
    /// Integer value.
    Integer(Integer),
    /// Real value.
    Real(Real),
    /// String value.
    String(String),
    /// Array of values.
    Array(Array),
    /// Object mapping keys to values.
    Object(Object),
}

impl Value {
    /// Creates the zero value of the given type.
    ///
    /// Booleans start as `false`, numbers as zero, and strings and
    /// containers as empty.
    pub fn new(ty: Type) -> Self {
        match ty {
            Type::Null => Value::Null,
            Type::Boolean => Value::Boolean(false),
            Type::Integer => Value::Integer(0),
            Type::Real => Value::Real(0.0),
            Type::String => Value::String(String::new()),
            Type::Array => Value::Array(Array::new()),
            Type::Object => Value::Object(Object::new()),
        }
    }

    /// Returns the type of the stored value.
    pub fn ty(&self) -> Type {
        match self {
            Value::Null => Type::Null,
            Value::Boolean(_) => Type::Boolean,
            Value::Integer(_) => Type::Integer,
            Value::Real(_) => Type::Real,
            Value::String(_) => Type::String,
            Value::Array(_) => Type::Array,
            Value::Object(_) => Type::Object,
        }
    }

    /// Sets the value to null, releasing any payload.
    pub fn reset(&mut self) {
        *self = Value::Null;
    }

    /// Moves the value out, leaving null behind.
    pub fn take(&mut self) -> Value {
        std::mem::take(self)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_bool(&self) -> bool {
        matches!(self, Value::Boolean(_))
    }

    pub fn is_int(&self) -> bool {
        matches!(self, Value::Integer(_))
    }

    pub fn is_real(&self) -> bool {
        matches!(self, Value::Real(_))
    }

    pub fn is_str(&self) -> bool {
        matches!(self, Value::String(_))
    }

    pub fn is_arr(&self) -> bool {
        matches!(self, Value::Array(_))
    }

    pub fn is_obj(&self) -> bool {
        matches!(self, Value::Object(_))
    }

    /// Returns true for integers and reals.
    pub fn is_num(&self) -> bool {
        matches!(self, Value::Integer(_) | Value::Real(_))
    }

    fn mismatch(&self, requested: Type) -> Error {
        Error::type_mismatch(self.ty(), requested)
    }

    /// Returns the stored boolean.
    pub fn as_bool(&self) -> Result<bool> {
        match self {
            Value::Boolean(b) => Ok(*b),
            _ => Err(self.mismatch(Type::Boolean)),
        }
    }

    pub fn as_bool_mut(&mut self) -> Result<&mut bool> {
        match self {
            Value::Boolean(b) => Ok(b),
            _ => Err(self.mismatch(Type::Boolean)),
        }
    }

    /// Returns the stored integer.
    pub fn as_int(&self) -> Result<Integer> {
        match self {
            Value::Integer(i) => Ok(*i),
            _ => Err(self.mismatch(Type::Integer)),
        }
    }

    pub fn as_int_mut(&mut self) -> Result<&mut Integer> {
        match self {
            Value::Integer(i) => Ok(i),
            _ => Err(self.mismatch(Type::Integer)),
        }
    }

    /// Returns the stored real.
    ///
    /// Integers are not widened; use [`Value::coerce_real`] for that.
    pub fn as_real(&self) -> Result<Real> {
        match self {
            Value::Real(r) => Ok(*r),
            _ => Err(self.mismatch(Type::Real)),
        }
    }

    pub fn as_real_mut(&mut self) -> Result<&mut Real> {
        match self {
            Value::Real(r) => Ok(r),
            _ => Err(self.mismatch(Type::Real)),
        }
    }

    /// Returns the stored string.
    pub fn as_str(&self) -> Result<&str> {
        match self {
            Value::String(s) => Ok(s),
            _ => Err(self.mismatch(Type::String)),
        }
    }

    pub fn as_string_mut(&mut self) -> Result<&mut String> {
        match self {
            Value::String(s) => Ok(s),
            _ => Err(self.mismatch(Type::String)),
        }
    }

    /// Returns the stored array.
    pub fn as_array(&self) -> Result<&Array> {
        match self {
            Value::Array(a) => Ok(a),
            _ => Err(self.mismatch(Type::Array)),
        }
    }

    pub fn as_array_mut(&mut self) -> Result<&mut Array> {
        match self {
            Value::Array(a) => Ok(a),
            _ => Err(self.mismatch(Type::Array)),
        }
    }

    /// Returns the stored object.
    pub fn as_object(&self) -> Result<&Object> {
        match self {
            Value::Object(o) => Ok(o),
            _ => Err(self.mismatch(Type::Object)),
        }
    }

    pub fn as_object_mut(&mut self) -> Result<&mut Object> {
        match self {
            Value::Object(o) => Ok(o),
            _ => Err(self.mismatch(Type::Object)),
        }
    }

    /// Replaces the value with a boolean and returns a reference to it.
    pub fn set_bool(&mut self, value: bool) -> &mut bool {
        *self = Value::Boolean(value);
        match self {
            Value::Boolean(b) => b,
            _ => unreachable!(),
        }
    }

    /// Replaces the value with an integer and returns a reference to it.
    pub fn set_int(&mut self, value: Integer) -> &mut Integer {
        *self = Value::Integer(value);
        match self {
            Value::Integer(i) => i,
            _ => unreachable!(),
        }
    }

    /// Replaces the value with a real and returns a reference to it.
    pub fn set_real(&mut self, value: Real) -> &mut Real {
        *self = Value::Real(value);
        match self {
            Value::Real(r) => r,
            _ => unreachable!(),
        }
    }

    /// Replaces the value with a string and returns a reference to it.
    pub fn set_string(&mut self, value: impl Into<String>) -> &mut String {
        *self = Value::String(value.into());
        match self {
            Value::String(s) => s,
            _ => unreachable!(),
        }
    }

    /// Replaces the value with an array and returns a reference to it.
    pub fn set_array(&mut self, value: Array) -> &mut Array {
        *self = Value::Array(value);
        match self {
            Value::Array(a) => a,
            _ => unreachable!(),
        }
    }

    /// Replaces the value with an object and returns a reference to it.
    pub fn set_object(&mut self, value: Object) -> &mut Object {
        *self = Value::Object(value);
        match self {
            Value::Object(o) => o,
            _ => unreachable!(),
        }
    }

    /// Returns the array element at `index`.
    pub fn get(&self, index: usize) -> Result<&Value> {
        let array = self.as_array()?;
        array
            .get(index)
            .ok_or_else(|| Error::out_of_range(index, array.len()))
    }

    pub fn get_mut(&mut self, index: usize) -> Result<&mut Value> {
        let array = self.as_array_mut()?;
        let len = array.len();
        array
            .get_mut(index)
            .ok_or_else(|| Error::out_of_range(index, len))
    }

    /// Returns the object member named `key`.
    pub fn get_key(&self, key: &str) -> Result<&Value> {
        self.as_object()?
            .get(key)
            .ok_or_else(|| Error::MissingKey(key.to_string()))
    }

    pub fn get_key_mut(&mut self, key: &str) -> Result<&mut Value> {
        self.as_object_mut()?
            .get_mut(key)
            .ok_or_else(|| Error::MissingKey(key.to_string()))
    }

    /// Returns the object member named `key`, inserting null if absent.
    pub fn entry(&mut self, key: impl Into<String>) -> Result<&mut Value> {
        Ok(self.as_object_mut()?.entry(key.into()).or_default())
    }

    /// Appends an element to an array.
    pub fn push(&mut self, value: impl Into<Value>) -> Result<&mut Self> {
        self.as_array_mut()?.push(value.into());
        Ok(self)
    }

    /// Inserts a member into an object.
    ///
    /// An existing member with the same key is kept untouched.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Result<&mut Self> {
        self.as_object_mut()?
            .entry(key.into())
            .or_insert_with(|| value.into());
        Ok(self)
    }

    /// Returns whether an object has a member named `key`.
    pub fn contains(&self, key: &str) -> Result<bool> {
        Ok(self.as_object()?.contains_key(key))
    }

    /// Number of elements of an array or members of an object.
    pub fn len(&self) -> Result<usize> {
        match self {
            Value::Array(a) => Ok(a.len()),
            Value::Object(o) => Ok(o.len()),
            _ => Err(Error::NotContainer(self.ty())),
        }
    }

    pub fn is_empty(&self) -> Result<bool> {
        self.len().map(|len| len == 0)
    }

    /// Removes all elements, keeping the container type.
    pub fn clear(&mut self) -> Result<()> {
        match self {
            Value::Array(a) => a.clear(),
            Value::Object(o) => o.clear(),
            _ => return Err(Error::NotContainer(self.ty())),
        }
        Ok(())
    }

    /// Removes and returns the array element at `index`.
    ///
    /// The array is left unchanged when `index` is out of range.
    pub fn remove(&mut self, index: usize) -> Result<Value> {
        let array = self.as_array_mut()?;
        if index >= array.len() {
            return Err(Error::out_of_range(index, array.len()));
        }
        Ok(array.remove(index))
    }

    /// Removes an object member, returning whether it existed.
    pub fn remove_key(&mut self, key: &str) -> Result<bool> {
        Ok(self.as_object_mut()?.remove(key).is_some())
    }

    /// Iterates over the elements of an array.
    pub fn iter(&self) -> Result<slice::Iter<'_, Value>> {
        Ok(self.as_array()?.iter())
    }

    pub fn iter_mut(&mut self) -> Result<slice::IterMut<'_, Value>> {
        Ok(self.as_array_mut()?.iter_mut())
    }
}

/// Panics if the value is not an array or `index` is out of range.
impl Index<usize> for Value {
    type Output = Value;

    fn index(&self, index: usize) -> &Value {
        match self.get(index) {
            Ok(value) => value,
            Err(e) => panic!("{e}"),
        }
    }
}

impl IndexMut<usize> for Value {
    fn index_mut(&mut self, index: usize) -> &mut Value {
        match self.get_mut(index) {
            Ok(value) => value,
            Err(e) => panic!("{e}"),
        }
    }
}

/// Panics if the value is not an object or has no member named `key`.
impl Index<&str> for Value {
    type Output = Value;

    fn index(&self, key: &str) -> &Value {
        match self.get_key(key) {
            Ok(value) => value,
            Err(e) => panic!("{e}"),
        }
    }
}

/// Inserts null for a missing key. Panics if the value is not an object.
impl IndexMut<&str> for Value {
    fn index_mut(&mut self, key: &str) -> &mut Value {
        match self.entry(key) {
            Ok(value) => value,
            Err(e) => panic!("{e}"),
        }
    }
}
