//! JSON pointer (RFC 6901) resolution.

use super::Value;
use crate::error::{Error, Result};

/// Splits a pointer into unescaped reference tokens.
fn tokens(pointer: &str) -> Result<Vec<String>> {
    if pointer.is_empty() {
        return Ok(Vec::new());
    }
    if !pointer.starts_with('/') {
        return Err(Error::InvalidPointer(pointer.to_string()));
    }
    Ok(pointer[1..]
        .split('/')
        .map(|token| token.replace("~1", "/").replace("~0", "~"))
        .collect())
}

/// How far past its end `pointer_mut` may extend an array.
pub const MAX_POINTER_GROWTH: usize = 1 << 16;

fn index(token: &str, pointer: &str) -> Result<usize> {
    if token.is_empty() || !token.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::InvalidPointer(pointer.to_string()));
    }
    token
        .parse()
        .map_err(|_| Error::InvalidPointer(pointer.to_string()))
}

impl Value {
    /// Resolves a JSON pointer such as `/a/b/0`.
    ///
    /// The empty pointer refers to the value itself. Array tokens must be
    /// decimal indices.
    pub fn pointer(&self, pointer: &str) -> Result<&Value> {
        let mut current = self;
        for token in tokens(pointer)? {
            current = match current {
                Value::Object(object) => object.get(&token),
                Value::Array(array) => array.get(index(&token, pointer)?),
                _ => None,
            }
            .ok_or_else(|| Error::Unresolved(pointer.to_string()))?;
        }
        Ok(current)
    }

    /// Resolves a JSON pointer for writing.
    ///
    /// Missing object members are created as null and arrays are extended
    /// with nulls up to the requested index. The token `-` appends a new
    /// element to an array. An index [`MAX_POINTER_GROWTH`] or more past the
    /// end of an array fails with [`Error::OutOfRange`].
    pub fn pointer_mut(&mut self, pointer: &str) -> Result<&mut Value> {
        let mut current = self;
        for token in tokens(pointer)? {
            current = match current {
                Value::Object(object) => object.entry(token).or_default(),
                Value::Array(array) => {
                    let at = if token == "-" {
                        array.len()
                    } else {
                        index(&token, pointer)?
                    };
                    if at >= array.len() {
                        if at - array.len() >= MAX_POINTER_GROWTH {
                            return Err(Error::OutOfRange {
                                index: at,
                                len: array.len(),
                            });
                        }
                        array.resize(at + 1, Value::Null);
                    }
                    &mut array[at]
                }
                _ => return Err(Error::Unresolved(pointer.to_string())),
            };
        }
        Ok(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Type;

    fn document() -> Value {
        let mut doc = Value::new(Type::Object);
        doc["foo"] = Value::from(vec!["bar", "baz"]);
        doc[""] = 0.into();
        doc["a/b"] = 1.into();
        doc["m~n"] = 8.into();
        doc["nested"] = Value::new(Type::Object);
        doc["nested"]["deep"] = Value::from(vec![10, 20]);
        doc
    }

    #[test]
    fn test_rfc_examples() {
        let doc = document();
        assert_eq!(doc.pointer("").unwrap(), &doc);
        assert_eq!(doc.pointer("/foo").unwrap().len(), Ok(2));
        assert_eq!(doc.pointer("/foo/0").unwrap(), &"bar");
        assert_eq!(doc.pointer("/").unwrap(), &0);
        assert_eq!(doc.pointer("/a~1b").unwrap(), &1);
        assert_eq!(doc.pointer("/m~0n").unwrap(), &8);
        assert_eq!(doc.pointer("/nested/deep/1").unwrap(), &20);
    }

    #[test]
    fn test_escape_order() {
        let mut doc = Value::new(Type::Object);
        doc["~1"] = "tilde-one".into();
        assert_eq!(doc.pointer("/~01").unwrap(), &"tilde-one");
    }

    #[test]
    fn test_invalid_and_unresolved() {
        let doc = document();
        assert_eq!(
            doc.pointer("foo"),
            Err(Error::InvalidPointer("foo".into()))
        );
        assert_eq!(
            doc.pointer("/foo/x"),
            Err(Error::InvalidPointer("/foo/x".into()))
        );
        assert_eq!(
            doc.pointer("/missing"),
            Err(Error::Unresolved("/missing".into()))
        );
        assert_eq!(
            doc.pointer("/foo/5"),
            Err(Error::Unresolved("/foo/5".into()))
        );
        assert_eq!(
            doc.pointer("/foo/0/x"),
            Err(Error::Unresolved("/foo/0/x".into()))
        );
    }

    #[test]
    fn test_pointer_mut_creates() {
        let mut doc = document();
        *doc.pointer_mut("/added").unwrap() = true.into();
        assert_eq!(doc["added"], true);

        *doc.pointer_mut("/foo/4").unwrap() = "far".into();
        assert_eq!(doc["foo"].len(), Ok(5));
        assert!(doc["foo"][2].is_null());
        assert_eq!(doc["foo"][4], "far");

        *doc.pointer_mut("/foo/-").unwrap() = "end".into();
        assert_eq!(doc["foo"][5], "end");

        assert_eq!(
            doc.pointer_mut("/added/x").unwrap_err(),
            Error::Unresolved("/added/x".into())
        );
    }

    #[test]
    fn test_pointer_mut_growth_is_bounded() {
        let mut doc = Value::from(vec![1]);
        assert_eq!(
            doc.pointer_mut("/18446744073709551615").unwrap_err(),
            Error::OutOfRange {
                index: usize::MAX,
                len: 1
            }
        );
        assert!(matches!(
            doc.pointer_mut("/1000000000000"),
            Err(Error::OutOfRange { len: 1, .. })
        ));
        assert_eq!(doc.len(), Ok(1));

        let last = format!("/{MAX_POINTER_GROWTH}");
        assert!(doc.pointer_mut(&last).is_ok());
        assert_eq!(doc.len(), Ok(MAX_POINTER_GROWTH + 1));
        assert_eq!(
            doc.pointer("/99999999999999999999999"),
            Err(Error::InvalidPointer("/99999999999999999999999".into()))
        );
    }
}
