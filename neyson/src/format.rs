//! Common interface over the document formats.
//!
//! [`Json`] and [`Xml`] expose their readers and writers through the
//! [`DocumentFormat`] trait so callers can pick a format at runtime, for
//! example from a file extension with [`format_for_path`].

use std::path::Path;

use crate::{
    json,
    value::Value,
    xml::{self, Nodes},
};

/// A text document format with a reader and a writer.
pub trait DocumentFormat {
    /// In-memory representation of a document.
    type Document;
    /// Output layout accepted by the writer.
    type Mode: Copy + Default;
    /// Error raised by reading and writing.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Returns the name of the format.
    fn name(&self) -> &'static str;

    /// File extensions associated with the format, lower case, without dot.
    fn extensions(&self) -> &'static [&'static str];

    /// Parses a document from text.
    fn read_str(&self, text: &str) -> Result<Self::Document, Self::Error>;

    /// Serializes a document to text.
    fn write_string(&self, document: &Self::Document, mode: Self::Mode) -> Result<String, Self::Error>;

    /// Reads and parses a file.
    fn read_file(&self, path: &Path) -> Result<Self::Document, Self::Error>;

    /// Serializes a document into a file.
    fn write_file(&self, document: &Self::Document, path: &Path, mode: Self::Mode) -> Result<(), Self::Error>;

    /// Whether `path` carries one of the format's extensions.
    fn matches(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| {
                self.extensions()
                    .iter()
                    .any(|known| ext.eq_ignore_ascii_case(known))
            })
    }
}

/// JSON documents as [`Value`] trees.
#[derive(Debug, Clone, Copy, Default)]
pub struct Json;

impl DocumentFormat for Json {
    type Document = Value;
    type Mode = json::Mode;
    type Error = json::Error;

    fn name(&self) -> &'static str {
        "json"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["json"]
    }

    fn read_str(&self, text: &str) -> Result<Value, json::Error> {
        json::read(text)
    }

    fn write_string(&self, document: &Value, mode: json::Mode) -> Result<String, json::Error> {
        json::write(document, mode)
    }

    fn read_file(&self, path: &Path) -> Result<Value, json::Error> {
        json::fread(path)
    }

    fn write_file(&self, document: &Value, path: &Path, mode: json::Mode) -> Result<(), json::Error> {
        json::fwrite(document, path, mode)
    }
}

/// XML documents as node lists, read with [`xml::Parse::FullTrimmed`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Xml;

impl DocumentFormat for Xml {
    type Document = Nodes;
    type Mode = xml::Mode;
    type Error = xml::Error;

    fn name(&self) -> &'static str {
        "xml"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["xml"]
    }

    fn read_str(&self, text: &str) -> Result<Nodes, xml::Error> {
        xml::read(text, xml::Parse::FullTrimmed)
    }

    fn write_string(&self, document: &Nodes, mode: xml::Mode) -> Result<String, xml::Error> {
        xml::write(document, mode)
    }

    fn read_file(&self, path: &Path) -> Result<Nodes, xml::Error> {
        xml::fread(path, xml::Parse::FullTrimmed)
    }

    fn write_file(&self, document: &Nodes, path: &Path, mode: xml::Mode) -> Result<(), xml::Error> {
        xml::fwrite(document, path, mode)
    }
}

/// Picks a format name (`json`, `xml` or `toml`) from the extension of
/// `path`.
pub fn format_for_path(path: &Path) -> Option<&'static str> {
    if Json.matches(path) {
        return Some(Json.name());
    }
    if Xml.matches(path) {
        return Some(Xml.name());
    }
    let ext = path.extension()?.to_str()?;
    ext.eq_ignore_ascii_case("toml").then_some("toml")
}
