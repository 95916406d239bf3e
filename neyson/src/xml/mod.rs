//! XML node tree, reading and writing.
//!
//! A document is read into a flat list of top-level [`Node`]s. Elements carry
//! a name, a text value, attributes and children; the other kinds carry the
//! subset of those fields listed on [`Node`].
//!
//! ```rust
//! use neyson::xml::{self, Mode, Parse};
//!
//! let nodes = xml::read("<greeting lang=\"en\">hello</greeting>", Parse::default()).unwrap();
//! assert_eq!(nodes[0].attr("lang").unwrap(), "en");
//! assert_eq!(nodes[0].value().unwrap(), "hello");
//!
//! let text = xml::write(&nodes, Mode::Compact).unwrap();
//! assert_eq!(text, "<greeting lang=\"en\">hello</greeting>");
//! ```

use std::{
    fs::File,
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
};

use thiserror::Error;

mod node;
mod reader;
mod writer;

pub use node::{Attribs, Node, NodeType, Nodes};

/// Which nodes the reader keeps and whether text is trimmed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Parse {
    /// Elements and CDATA only, text trimmed.
    #[default]
    ElementsTrimmed,
    /// Every node kind, text trimmed.
    FullTrimmed,
    /// Elements and CDATA only, text kept as written.
    Elements,
    /// Every node kind, text kept as written.
    Full,
}

impl Parse {
    /// Whether comments, declarations, doctypes and processing instructions
    /// are kept.
    pub fn keeps_all(self) -> bool {
        matches!(self, Parse::FullTrimmed | Parse::Full)
    }

    /// Whether element text is trimmed.
    pub fn trims(self) -> bool {
        matches!(self, Parse::ElementsTrimmed | Parse::FullTrimmed)
    }
}

/// Output layout for the writers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Mode {
    /// No whitespace between nodes.
    Compact,
    /// One node per line, indented with tabs.
    #[default]
    Readable,
}

/// Errors raised by the XML reader and writer.
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed input at the given byte offset.
    #[error("{message} at byte {index}")]
    Parse { index: usize, message: &'static str },

    /// The file could not be opened, read or created.
    #[error("failed to access {}: {source}", path.display())]
    File {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Writing to the output stream failed.
    #[error("write failed: {0}")]
    Io(#[from] io::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Parses an XML document into its top-level nodes.
pub fn read(text: &str, parse: Parse) -> Result<Nodes> {
    reader::Reader::new(text, parse).document()
}

/// Reads and parses an XML file.
pub fn fread(path: impl AsRef<Path>, parse: Parse) -> Result<Nodes> {
    let path = path.as_ref();
    debug!("reading xml from {} ({:?})", path.display(), parse);
    let text = std::fs::read_to_string(path).map_err(|source| Error::File {
        path: path.to_path_buf(),
        source,
    })?;
    read(&text, parse)
}

/// Serializes nodes to a string.
pub fn write(nodes: &[Node], mode: Mode) -> Result<String> {
    Ok(writer::render(nodes, mode))
}

/// Serializes nodes into any [`Write`] sink.
pub fn write_to<W: Write>(nodes: &[Node], out: &mut W, mode: Mode) -> Result<()> {
    out.write_all(writer::render(nodes, mode).as_bytes())?;
    Ok(())
}

/// Serializes nodes into a file, replacing its contents.
pub fn fwrite(nodes: &[Node], path: impl AsRef<Path>, mode: Mode) -> Result<()> {
    let path = path.as_ref();
    debug!("writing xml to {}", path.display());
    let file_error = |source| Error::File {
        path: path.to_path_buf(),
        source,
    };
    let mut out = BufWriter::new(File::create(path).map_err(file_error)?);
    out.write_all(writer::render(nodes, mode).as_bytes())
        .map_err(file_error)?;
    out.flush().map_err(file_error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.xml");

        let mut root = Node::element("config");
        root.add(Node::element("entry")).unwrap();
        root.child_mut(0).unwrap().set_attr("key", "value").unwrap();
        let nodes = vec![root];

        fwrite(&nodes, &path, Mode::Readable).unwrap();
        assert_eq!(fread(&path, Parse::FullTrimmed).unwrap(), nodes);
    }

    #[test]
    fn test_fread_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = fread(dir.path().join("missing.xml"), Parse::Full).unwrap_err();
        assert!(matches!(err, Error::File { .. }));
    }

    #[test]
    fn test_write_to_buffer() {
        let mut buffer = Vec::new();
        write_to(&[Node::element("a")], &mut buffer, Mode::Compact).unwrap();
        assert_eq!(buffer, b"<a/>");
    }

    #[test]
    fn test_parse_flags() {
        assert!(Parse::Full.keeps_all());
        assert!(!Parse::Full.trims());
        assert!(Parse::ElementsTrimmed.trims());
        assert!(!Parse::Elements.keeps_all());
    }
}
