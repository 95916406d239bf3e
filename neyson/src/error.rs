//! Error types for value and node access.
//!
//! Format-specific failures (JSON syntax, XML syntax, SQLite engine errors)
//! live next to their modules. This module covers misuse of the in-memory
//! trees: asking a value for the wrong type, indexing past the end of an
//! array, resolving a bad pointer and so on.

use thiserror::Error;

use crate::{value::Type, xml::NodeType};

/// Errors raised when accessing or converting [`Value`](crate::Value)s and
/// XML [`Node`](crate::xml::Node)s.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// The value holds a different type than the one requested.
    #[error("value has type {actual} but {requested} was requested")]
    TypeMismatch {
        /// Type currently stored in the value.
        actual: Type,
        /// Type the caller asked for.
        requested: Type,
    },

    /// A container operation was used on a scalar.
    #[error("value must be an object or an array, found {0}")]
    NotContainer(Type),

    /// Array index past the end.
    #[error("index {index} is out of range for length {len}")]
    OutOfRange {
        /// Requested index.
        index: usize,
        /// Length of the container.
        len: usize,
    },

    /// Object or attribute map has no such key.
    #[error("no entry with key \"{0}\"")]
    MissingKey(String),

    /// A loose conversion could not be performed.
    #[error("cannot convert {from} to {to}")]
    Conversion {
        /// Type of the source value.
        from: Type,
        /// Requested target type.
        to: Type,
    },

    /// The JSON pointer is syntactically invalid.
    #[error("invalid pointer syntax: \"{0}\"")]
    InvalidPointer(String),

    /// The JSON pointer does not reference an existing value.
    #[error("pointer \"{0}\" references a nonexistent value")]
    Unresolved(String),

    /// An XML node was asked for a property its kind does not carry.
    #[error("{kind} nodes have no {property} property")]
    NodeAccess {
        /// Kind of the node.
        kind: NodeType,
        /// Name of the requested property.
        property: &'static str,
    },
}

/// Result type for value and node access.
pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Error {
    /// Builds a [`Error::TypeMismatch`].
    pub fn type_mismatch(actual: Type, requested: Type) -> Self {
        Error::TypeMismatch { actual, requested }
    }

    /// Builds a [`Error::OutOfRange`].
    pub fn out_of_range(index: usize, len: usize) -> Self {
        Error::OutOfRange { index, len }
    }
}
