//! JSON reading and writing.
//!
//! The reader is a hand-written recursive descent parser that reports the
//! byte offset of the first problem it finds. The writer produces either a
//! single compact line or a readable layout indented with four spaces.
//!
//! ```rust
//! use neyson::json::{self, Mode};
//!
//! let value = json::read("[1, 2.5, \"three\"]").unwrap();
//! assert_eq!(json::write(&value, Mode::Compact).unwrap(), "[1,2.5,\"three\"]");
//! ```

use std::{
    fs::File,
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
};

use thiserror::Error;

use crate::value::Value;

mod reader;
mod writer;

/// Output layout for the writers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Mode {
    /// Everything on one line, no spaces.
    Compact,
    /// One member per line, indented with four spaces.
    #[default]
    Readable,
}

/// Category of a JSON failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    FileIo,
    InvalidNumber,
    InvalidString,
    ExpectedColon,
    ExpectedComma,
    ExpectedStart,
    ExpectedQuoteOpen,
    ExpectedQuoteClose,
    ExpectedBraceOpen,
    ExpectedBraceClose,
    ExpectedBracketOpen,
    ExpectedBracketClose,
    ExpectedCommaOrBraceClose,
    ExpectedCommaOrBracketClose,
    FailedToReachEnd,
    UnexpectedValueStart,
    TooDeep,
}

impl ErrorKind {
    /// Short human-readable description.
    pub fn message(self) -> &'static str {
        match self {
            ErrorKind::FileIo => "file i/o failed",
            ErrorKind::InvalidNumber => "invalid number",
            ErrorKind::InvalidString => "invalid string",
            ErrorKind::ExpectedColon => "expected ':'",
            ErrorKind::ExpectedComma => "expected ','",
            ErrorKind::ExpectedStart => "expected a value",
            ErrorKind::ExpectedQuoteOpen => "expected opening '\"'",
            ErrorKind::ExpectedQuoteClose => "expected closing '\"'",
            ErrorKind::ExpectedBraceOpen => "expected '{'",
            ErrorKind::ExpectedBraceClose => "expected '}'",
            ErrorKind::ExpectedBracketOpen => "expected '['",
            ErrorKind::ExpectedBracketClose => "expected ']'",
            ErrorKind::ExpectedCommaOrBraceClose => "expected ',' or '}'",
            ErrorKind::ExpectedCommaOrBracketClose => "expected ',' or ']'",
            ErrorKind::FailedToReachEnd => "unexpected trailing characters",
            ErrorKind::UnexpectedValueStart => "unexpected character at start of value",
            ErrorKind::TooDeep => "arrays and objects nested too deeply",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}

/// Errors raised by the JSON reader and writer.
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed input at the given byte offset.
    #[error("{kind} at byte {index}")]
    Syntax { kind: ErrorKind, index: usize },

    /// The file could not be opened, read or created.
    #[error("failed to access {}: {source}", path.display())]
    File {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// NaN and infinities have no JSON representation.
    #[error("cannot write non-finite number {0}")]
    NonFinite(f64),

    /// Writing to the output stream failed.
    #[error("write failed: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    /// Returns the error category.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Syntax { kind, .. } => *kind,
            Error::File { .. } | Error::Io(_) => ErrorKind::FileIo,
            Error::NonFinite(_) => ErrorKind::InvalidNumber,
        }
    }

    /// Byte offset of a syntax error.
    pub fn index(&self) -> Option<usize> {
        match self {
            Error::Syntax { index, .. } => Some(*index),
            _ => None,
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Parses a complete JSON document.
///
/// Whitespace may surround the value; anything else after it is an error.
pub fn read(text: &str) -> Result<Value> {
    let mut reader = reader::Reader::new(text);
    let value = reader.value()?;
    reader.finish()?;
    Ok(value)
}

/// Parses the first JSON value in `text` and returns it together with the
/// byte offset past it and any whitespace that follows.
pub fn read_prefix(text: &str) -> Result<(Value, usize)> {
    let mut reader = reader::Reader::new(text);
    let value = reader.value()?;
    reader.skip_ws();
    Ok((value, reader.position()))
}

/// Reads and parses a JSON file.
pub fn fread(path: impl AsRef<Path>) -> Result<Value> {
    let path = path.as_ref();
    debug!("reading json from {}", path.display());
    let text = std::fs::read_to_string(path).map_err(|source| Error::File {
        path: path.to_path_buf(),
        source,
    })?;
    read(&text)
}

/// Serializes a value to a string.
pub fn write(value: &Value, mode: Mode) -> Result<String> {
    let mut out = String::new();
    writer::Writer::new(&mut out, mode).value(value)?;
    Ok(out)
}

/// Serializes a value into any [`Write`] sink.
pub fn write_to<W: Write>(value: &Value, out: &mut W, mode: Mode) -> Result<()> {
    let text = write(value, mode)?;
    out.write_all(text.as_bytes())?;
    Ok(())
}

/// Serializes a value into a file, replacing its contents.
pub fn fwrite(value: &Value, path: impl AsRef<Path>, mode: Mode) -> Result<()> {
    let path = path.as_ref();
    debug!("writing json to {}", path.display());
    let file_error = |source| Error::File {
        path: path.to_path_buf(),
        source,
    };
    let text = write(value, mode)?;
    let mut out = BufWriter::new(File::create(path).map_err(file_error)?);
    out.write_all(text.as_bytes()).map_err(file_error)?;
    out.flush().map_err(file_error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Type;

    #[test]
    fn test_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.json");

        let mut value = Value::new(Type::Object);
        value["name"] = "neyson".into();
        value["list"] = Value::from(vec![1, 2, 3]);

        fwrite(&value, &path, Mode::Readable).unwrap();
        assert_eq!(fread(&path).unwrap(), value);
    }

    #[test]
    fn test_fread_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = fread(dir.path().join("missing.json")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::FileIo);
        assert!(err.index().is_none());
    }

    #[test]
    fn test_write_to_buffer() {
        let mut buffer = Vec::new();
        write_to(&Value::from(vec![true, false]), &mut buffer, Mode::Compact).unwrap();
        assert_eq!(buffer, b"[true,false]");
    }

    #[test]
    fn test_read_prefix() {
        let (value, end) = read_prefix("  {\"a\": 1} trailing").unwrap();
        assert_eq!(value["a"], 1);
        assert_eq!(end, 11);

        let (value, end) = read_prefix("[1]   x").unwrap();
        assert_eq!(value[0], 1);
        assert_eq!(end, 6);
        assert_eq!(read_prefix("true").unwrap().1, 4);
    }

    #[test]
    fn test_error_display() {
        let err = read("[1, 2").unwrap_err();
        assert_eq!(err.to_string(), "expected ',' or ']' at byte 5");
    }
}
