//! Parameter rewriting, binding and row decoding.

use std::collections::HashMap;

use sqlx::{
    Column, Row, Sqlite, TypeInfo, ValueRef,
    query::Query,
    sqlite::{SqliteArguments, SqliteRow},
};

use super::{Error, Result};
use crate::value::{Object, Value};

/// A single SQLite storage-class value.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Param {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl Param {
    /// Converts a [`Value`] for binding at parameter `index`.
    pub fn from_value(value: &Value, index: usize) -> Result<Self> {
        Ok(match value {
            Value::Null => Param::Null,
            Value::Boolean(b) => Param::Integer(*b as i64),
            Value::Integer(i) => Param::Integer(*i),
            Value::Real(r) => Param::Real(*r),
            Value::String(s) => Param::Text(s.clone()),
            Value::Array(_) | Value::Object(_) => {
                return Err(Error::Bind {
                    index,
                    reason: format!("{} values cannot be bound", value.ty()),
                });
            }
        })
    }

    /// Blobs come back as (lossy) UTF-8 strings.
    pub fn into_value(self) -> Value {
        match self {
            Param::Null => Value::Null,
            Param::Integer(i) => Value::Integer(i),
            Param::Real(r) => Value::Real(r),
            Param::Text(s) => Value::String(s),
            Param::Blob(bytes) => Value::String(String::from_utf8_lossy(&bytes).into_owned()),
        }
    }
}

/// Binds `params` in order as `?1`, `?2`, ...
pub(crate) fn bind_all<'q>(
    mut query: Query<'q, Sqlite, SqliteArguments<'q>>,
    params: &'q [Param],
) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    for param in params {
        query = match param {
            Param::Null => query.bind(None::<i64>),
            Param::Integer(i) => query.bind(*i),
            Param::Real(r) => query.bind(*r),
            Param::Text(s) => query.bind(s.as_str()),
            Param::Blob(bytes) => query.bind(bytes.as_slice()),
        };
    }
    query
}

/// Decodes every column of a row by its runtime storage class.
pub(crate) fn decode_row(row: &SqliteRow) -> Result<Vec<Param>> {
    (0..row.len())
        .map(|i| {
            let raw = row.try_get_raw(i)?;
            if raw.is_null() {
                return Ok(Param::Null);
            }
            let param = match raw.type_info().name() {
                "INTEGER" => Param::Integer(row.try_get_unchecked(i)?),
                "REAL" => Param::Real(row.try_get_unchecked(i)?),
                "BLOB" => Param::Blob(row.try_get_unchecked(i)?),
                _ => Param::Text(row.try_get_unchecked(i)?),
            };
            Ok(param)
        })
        .collect()
}

/// Column names of a row.
pub(crate) fn column_names(row: &SqliteRow) -> Vec<String> {
    row.columns().iter().map(|c| c.name().to_string()).collect()
}

/// Builds a row object. A repeated column name keeps its first value.
pub(crate) fn row_object(columns: &[String], values: impl IntoIterator<Item = Value>) -> Object {
    let mut object = Object::new();
    for (name, value) in columns.iter().zip(values) {
        object.entry(name.clone()).or_insert(value);
    }
    object
}

/// SQL with every parameter rewritten to the numbered `?NNN` form.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct Rewritten {
    pub sql: String,
    /// Named parameters, including their prefix character.
    pub names: HashMap<String, usize>,
    /// Largest parameter index.
    pub count: usize,
}

fn is_ident(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Rewrites `?`, `?NNN`, `:name`, `@name` and `$name` parameters to `?NNN`.
///
/// A bare `?` takes the next index after the largest so far and a repeated
/// name reuses its index. String literals, quoted identifiers and comments
/// are copied untouched.
pub(crate) fn rewrite(sql: &str) -> Rewritten {
    let mut out = Rewritten {
        sql: String::with_capacity(sql.len()),
        ..Default::default()
    };
    let mut chars = sql.char_indices().peekable();

    while let Some((at, c)) = chars.next() {
        match c {
            '\'' | '"' | '`' | '[' => {
                let close = if c == '[' { ']' } else { c };
                out.sql.push(c);
                for (_, d) in chars.by_ref() {
                    out.sql.push(d);
                    if d == close {
                        break;
                    }
                }
            }
            '-' if sql[at..].starts_with("--") => {
                out.sql.push(c);
                while let Some((_, d)) = chars.next_if(|&(_, d)| d != '\n') {
                    out.sql.push(d);
                }
            }
            '/' if sql[at..].starts_with("/*") => {
                let end = sql[at + 2..]
                    .find("*/")
                    .map_or(sql.len(), |i| at + 2 + i + 2);
                out.sql.push_str(&sql[at..end]);
                while chars.next_if(|&(i, _)| i < end).is_some() {}
            }
            '?' => {
                let mut digits = String::new();
                while let Some((_, d)) = chars.next_if(|(_, d)| d.is_ascii_digit()) {
                    digits.push(d);
                }
                let index = if digits.is_empty() {
                    out.count + 1
                } else {
                    match digits.parse::<usize>() {
                        Ok(n) => n,
                        // left for SQLite to reject
                        Err(_) => {
                            out.sql.push('?');
                            out.sql.push_str(&digits);
                            continue;
                        }
                    }
                };
                out.count = out.count.max(index);
                out.sql.push_str(&format!("?{index}"));
            }
            ':' | '@' | '$' if chars.peek().is_some_and(|&(_, d)| is_ident(d)) => {
                let mut name = String::from(c);
                while let Some((_, d)) = chars.next_if(|&(_, d)| is_ident(d)) {
                    name.push(d);
                }
                let next = out.count + 1;
                let index = *out.names.entry(name).or_insert(next);
                out.count = out.count.max(index);
                out.sql.push_str(&format!("?{index}"));
            }
            _ => out.sql.push(c),
        }
    }
    out
}
