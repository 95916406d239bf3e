//! # neyson
//!
//! A dynamic value type with JSON, XML and SQLite front-ends.
//!
//! Neyson revolves around a single [`Value`] tree that can hold null, booleans,
//! integers, reals, strings, arrays and objects. The same tree is produced by
//! the JSON reader, consumed by the JSON writer, bound into SQLite statements
//! and returned from SQLite rows.
//!
//! ## Features
//!
//! - Typed and loose access to a dynamic value, with JSON pointer lookup
//! - Hand-written JSON reader with positional error reporting
//! - Compact and readable JSON writers
//! - XML node tree with four parse modes and two output modes
//! - Async SQLite wrapper built on sqlx (feature `sqlite`)
//! - serde integration, so any serde format can produce a [`Value`]
//!
//! ## Quick Start
//!
//! ```rust
//! use neyson::{json, Value};
//!
//! let mut value = json::read(r#"{"name": "neyson", "tags": ["json", "xml"]}"#).unwrap();
//! assert_eq!(value["tags"][1].as_str().unwrap(), "xml");
//!
//! value["version"] = Value::from(3);
//! *value.pointer_mut("/tags/2").unwrap() = "sqlite".into();
//!
//! let text = json::write(&value, json::Mode::Compact).unwrap();
//! assert_eq!(
//!     text,
//!     r#"{"name":"neyson","tags":["json","xml","sqlite"],"version":3}"#
//! );
//! ```
//!
//! ## Modules
//!
//! - [`value`] - The dynamic value tree
//! - [`json`] - JSON reading and writing
//! - [`xml`] - XML node tree, reading and writing
//! - [`sqlite`] - SQLite database access (requires `sqlite` feature)
//! - [`format`] - Common interface over document formats
//! - [`error`] - Error types for value and node access

#[macro_use]
extern crate log;

/// Error types for value and node access.
pub mod error;

/// Common interface over the document formats.
pub mod format;

/// JSON reading and writing.
pub mod json;

/// The dynamic value tree.
pub mod value;

/// XML node tree, reading and writing.
pub mod xml;

/// SQLite database access.
///
/// This module is only available when the `sqlite` feature is enabled.
#[cfg(feature = "sqlite")]
pub mod sqlite;

mod serde_impl;

pub use error::{Error, Result};
pub use format::{DocumentFormat, Json, Xml};
pub use value::{Array, Integer, MAX_POINTER_GROWTH, Object, Real, Type, Value};

/// Current version of the neyson implementation
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
