use super::{Error, Node, Nodes, Parse, Result};

/// Deepest element nesting accepted before reporting an error.
const MAX_DEPTH: usize = 256;

/// Cursor over an XML document. Positions are byte offsets.
pub(super) struct Reader<'a> {
    text: &'a str,
    pos: usize,
    parse: Parse,
    depth: usize,
}

fn is_space(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\r' | b'\n')
}

fn is_name_end(b: u8) -> bool {
    is_space(b) || matches!(b, b'/' | b'>' | b'?' | b'=' | b'<')
}

impl<'a> Reader<'a> {
    pub fn new(text: &'a str, parse: Parse) -> Self {
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);
        Self {
            text,
            pos: 0,
            parse,
            depth: 0,
        }
    }

    fn bytes(&self) -> &'a [u8] {
        self.text.as_bytes()
    }

    fn rest(&self) -> &'a str {
        &self.text[self.pos..]
    }

    fn peek(&self) -> Option<u8> {
        self.bytes().get(self.pos).copied()
    }

    fn error(&self, message: &'static str) -> Error {
        Error::Parse {
            index: self.pos,
            message,
        }
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(is_space) {
            self.pos += 1;
        }
    }

    fn expect(&mut self, token: &str, message: &'static str) -> Result<()> {
        if self.rest().starts_with(token) {
            self.pos += token.len();
            Ok(())
        } else {
            Err(self.error(message))
        }
    }

    /// Consumes everything up to `end` and returns it, leaving the cursor
    /// after `end`.
    fn until(&mut self, end: &str, message: &'static str) -> Result<&'a str> {
        let rest = self.rest();
        let Some(at) = rest.find(end) else {
            return Err(self.error(message));
        };
        self.pos += at + end.len();
        Ok(&rest[..at])
    }

    pub fn document(&mut self) -> Result<Nodes> {
        let mut nodes = Nodes::new();
        loop {
            self.skip_ws();
            match self.peek() {
                None => return Ok(nodes),
                Some(b'<') => {
                    if let Some(node) = self.node()? {
                        nodes.push(node);
                    }
                }
                Some(_) => return Err(self.error("expected <")),
            }
        }
    }

    /// Reads one markup construct starting at `<`. Kinds that the parse mode
    /// drops are consumed and reported as `None`.
    fn node(&mut self) -> Result<Option<Node>> {
        let rest = self.rest();
        let node = if rest.starts_with("<?") {
            self.instruction()?
        } else if rest.starts_with("<!--") {
            self.pos += 4;
            Node::comment(self.until("-->", "unterminated comment")?)
        } else if rest.starts_with("<![CDATA[") {
            self.pos += 9;
            return Ok(Some(Node::cdata(self.until("]]>", "unterminated CDATA")?)));
        } else if rest.starts_with("<!DOCTYPE") {
            self.doctype()?
        } else if rest.starts_with("<!") {
            return Err(self.error("unrecognized markup"));
        } else {
            return self.element().map(Some);
        };

        Ok(self.parse.keeps_all().then_some(node))
    }

    fn name(&mut self, message: &'static str) -> Result<&'a str> {
        let start = self.pos;
        while self.peek().is_some_and(|b| !is_name_end(b)) {
            self.pos += 1;
        }
        if self.pos == start {
            return Err(self.error(message));
        }
        Ok(&self.text[start..self.pos])
    }

    fn attribute(&mut self) -> Result<(String, String)> {
        let name = self.name("expected attribute name")?;
        self.skip_ws();
        self.expect("=", "expected =")?;
        self.skip_ws();
        let quote = match self.peek() {
            Some(q @ (b'"' | b'\'')) => q as char,
            _ => return Err(self.error("expected ' or \"")),
        };
        self.pos += 1;
        let mut end = [0u8; 4];
        let raw = self.until(quote.encode_utf8(&mut end), "unterminated attribute value")?;
        Ok((name.to_string(), decode(raw)))
    }

    /// Attributes up to `>`, `/>` or `?>`. Returns the terminator found.
    fn attributes(&mut self, node: &mut Node, terminators: &[&'static str]) -> Result<&'static str> {
        loop {
            self.skip_ws();
            if let Some(end) = terminators.iter().copied().find(|t| self.rest().starts_with(*t)) {
                self.pos += end.len();
                return Ok(end);
            }
            if self.peek().is_none() {
                return Err(self.error("unexpected end of data"));
            }
            let (key, value) = self.attribute()?;
            node.attribs.entry(key).or_insert(value);
        }
    }

    fn instruction(&mut self) -> Result<Node> {
        self.pos += 2;
        let target = self.name("expected PI target")?;
        if target.eq_ignore_ascii_case("xml") {
            let mut node = Node::declaration();
            self.attributes(&mut node, &["?>"])?;
            return Ok(node);
        }
        self.skip_ws();
        let value = self.until("?>", "unterminated processing instruction")?;
        Ok(Node::pi(target, value))
    }

    fn doctype(&mut self) -> Result<Node> {
        self.pos += "<!DOCTYPE".len();
        self.skip_ws();
        let start = self.pos;
        let mut depth = 0usize;
        loop {
            match self.peek() {
                None => return Err(self.error("unterminated DOCTYPE")),
                Some(b'[') => depth += 1,
                Some(b']') => depth = depth.saturating_sub(1),
                Some(b'>') if depth == 0 => break,
                Some(_) => {}
            }
            self.pos += 1;
        }
        let value = &self.text[start..self.pos];
        self.pos += 1;
        Ok(Node::doctype(value))
    }

    fn element(&mut self) -> Result<Node> {
        if self.depth == MAX_DEPTH {
            return Err(self.error("elements nested too deeply"));
        }
        self.depth += 1;
        let node = self.element_body();
        self.depth -= 1;
        node
    }

    fn element_body(&mut self) -> Result<Node> {
        self.pos += 1;
        let mut node = Node::element(self.name("expected element name")?);
        if self.attributes(&mut node, &["/>", ">"])? == "/>" {
            return Ok(node);
        }

        let mut has_text = false;
        loop {
            let rest = self.rest();
            let at = rest.find('<').ok_or_else(|| Error::Parse {
                index: self.text.len(),
                message: "unexpected end of data",
            })?;
            let raw = &rest[..at];
            self.pos += at;

            if !has_text && !raw.trim().is_empty() {
                has_text = true;
                node.value = if self.parse.trims() {
                    decode(raw.trim())
                } else {
                    decode(raw)
                };
            }

            if self.rest().starts_with("</") {
                self.pos += 2;
                let close = self.name("expected element name")?;
                if close != node.name {
                    return Err(Error::Parse {
                        index: self.pos - close.len(),
                        message: "expected matching closing tag",
                    });
                }
                self.skip_ws();
                self.expect(">", "expected >")?;
                return Ok(node);
            }

            if let Some(child) = self.node()? {
                node.nodes.push(child);
            }
        }
    }
}

/// Replaces character and predefined entity references. Unknown entities
/// are kept as written.
pub(super) fn decode(raw: &str) -> String {
    if !raw.contains('&') {
        return raw.to_string();
    }

    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(at) = rest.find('&') {
        out.push_str(&rest[..at]);
        rest = &rest[at..];

        let decoded = rest.find(';').and_then(|end| {
            let entity = &rest[1..end];
            let c = match entity {
                "lt" => Some('<'),
                "gt" => Some('>'),
                "amp" => Some('&'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                _ => {
                    if let Some(hex) = entity.strip_prefix("#x") {
                        u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
                    } else if let Some(dec) = entity.strip_prefix('#') {
                        dec.parse().ok().and_then(char::from_u32)
                    } else {
                        None
                    }
                }
            };
            c.map(|c| (c, end))
        });

        match decoded {
            Some((c, end)) => {
                out.push(c);
                rest = &rest[end + 1..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::super::read;
    use super::*;

    #[test]
    fn test_decode() {
        assert_eq!(decode("plain"), "plain");
        assert_eq!(decode("a &lt;b&gt; &amp; &quot;c&quot; &apos;d&apos;"), "a <b> & \"c\" 'd'");
        assert_eq!(decode("&#65;&#x42;&#x4e2d;"), "AB中");
        assert_eq!(decode("&unknown; & &"), "&unknown; & &");
    }

    #[test]
    fn test_elements() {
        let nodes = read(
            r#"<root id="1" name='x &amp; y'><a/><b>text</b>  <c>  spaced  </c></root>"#,
            Parse::ElementsTrimmed,
        )
        .unwrap();
        assert_eq!(nodes.len(), 1);
        let root = &nodes[0];
        assert_eq!(root.name(), Ok("root"));
        assert_eq!(root.attr("id"), Ok("1"));
        assert_eq!(root.attr("name"), Ok("x & y"));
        assert_eq!(root.len(), Ok(3));
        assert_eq!(root.child(0).unwrap().len(), Ok(0));
        assert_eq!(root.child(1).unwrap().value(), Ok("text"));
        assert_eq!(root.child(2).unwrap().value(), Ok("spaced"));
        assert_eq!(root.value(), Ok(""));
    }

    #[test]
    fn test_untrimmed_text() {
        let nodes = read("<a>  spaced  </a>", Parse::Elements).unwrap();
        assert_eq!(nodes[0].value(), Ok("  spaced  "));

        let nodes = read("<a>  hi <b/> rest</a>", Parse::Elements).unwrap();
        assert_eq!(nodes[0].value(), Ok("  hi "));
        assert_eq!(nodes[0].len(), Ok(1));
        let nodes = read("<a>\n  &lt;hi&gt;<b/></a>", Parse::Full).unwrap();
        assert_eq!(nodes[0].value(), Ok("\n  <hi>"));
    }

    #[test]
    fn test_nesting_limit() {
        let nested = |depth: usize| format!("{}{}", "<a>".repeat(depth), "</a>".repeat(depth));
        assert!(read(&nested(MAX_DEPTH), Parse::Full).is_ok());
        assert!(matches!(
            read(&nested(MAX_DEPTH + 1), Parse::Full),
            Err(Error::Parse {
                index,
                message: "elements nested too deeply",
            }) if index == 3 * MAX_DEPTH
        ));
        assert!(read(&"<a>".repeat(100_000), Parse::ElementsTrimmed).is_err());
    }

    #[test]
    fn test_first_text_run_wins() {
        let nodes = read("<a>\n  first\n  <b/>\n  second\n</a>", Parse::ElementsTrimmed).unwrap();
        assert_eq!(nodes[0].value(), Ok("first"));
        assert_eq!(nodes[0].len(), Ok(1));
    }

    #[test]
    fn test_parse_modes() {
        let text = r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE note [<!ELEMENT note (#PCDATA)>]>
<!-- top comment -->
<note><?render fast?><![CDATA[<raw>]]>body</note>"#;

        let elements = read(text, Parse::ElementsTrimmed).unwrap();
        assert_eq!(elements.len(), 1);
        let note = &elements[0];
        assert_eq!(note.len(), Ok(1));
        assert_eq!(note.child(0).unwrap().value(), Ok("<raw>"));
        assert_eq!(note.value(), Ok("body"));

        let full = read(text, Parse::FullTrimmed).unwrap();
        assert_eq!(full.len(), 4);
        assert!(full[0].is_decl());
        assert_eq!(full[0].attr("version"), Ok("1.0"));
        assert_eq!(full[0].attr("encoding"), Ok("UTF-8"));
        assert!(full[1].is_doctype());
        assert_eq!(full[1].value(), Ok("note [<!ELEMENT note (#PCDATA)>]"));
        assert_eq!(full[2].value(), Ok(" top comment "));
        let note = &full[3];
        assert_eq!(note.len(), Ok(2));
        let pi = note.child(0).unwrap();
        assert!(pi.is_pi());
        assert_eq!(pi.name(), Ok("render"));
        assert_eq!(pi.value(), Ok("fast"));
        assert!(note.child(1).unwrap().is_cdata());
    }

    #[test]
    fn test_errors() {
        let index = |text| match read(text, Parse::Full).unwrap_err() {
            Error::Parse { index, message } => (index, message),
            other => panic!("unexpected error {other}"),
        };

        assert_eq!(index("<a></b>"), (5, "expected matching closing tag"));
        assert_eq!(index("<a>"), (3, "unexpected end of data"));
        assert_eq!(index("text"), (0, "expected <"));
        assert_eq!(index("<a x></a>"), (4, "expected ="));
        assert_eq!(index("<a x=1></a>"), (5, "expected ' or \""));
        assert_eq!(index("<!-- open"), (4, "unterminated comment"));
        assert_eq!(index("<>"), (1, "expected element name"));
        assert_eq!(index("<!ENTITY x>"), (0, "unrecognized markup"));
    }

    #[test]
    fn test_duplicate_attributes_keep_first() {
        let nodes = read(r#"<a k="1" k="2"/>"#, Parse::ElementsTrimmed).unwrap();
        assert_eq!(nodes[0].attr("k"), Ok("1"));
    }
}
