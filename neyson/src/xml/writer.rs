use super::{Attribs, Mode, Node, NodeType};

struct Writer {
    out: String,
    mode: Mode,
    depth: usize,
}

/// Renders a node sequence as XML text.
pub(super) fn render(nodes: &[Node], mode: Mode) -> String {
    let mut writer = Writer {
        out: String::new(),
        mode,
        depth: 0,
    };
    for node in nodes {
        writer.node(node);
    }
    writer.out
}

impl Writer {
    fn readable(&self) -> bool {
        self.mode == Mode::Readable
    }

    fn indent(&mut self) {
        if self.readable() {
            for _ in 0..self.depth {
                self.out.push('\t');
            }
        }
    }

    fn end_line(&mut self) {
        if self.readable() {
            self.out.push('\n');
        }
    }

    fn node(&mut self, node: &Node) {
        self.indent();
        match node.kind {
            NodeType::Element => self.element(node),
            NodeType::CData => {
                self.out.push_str("<![CDATA[");
                self.out.push_str(&node.value);
                self.out.push_str("]]>");
            }
            NodeType::Comment => {
                self.out.push_str("<!--");
                self.out.push_str(&node.value);
                self.out.push_str("-->");
            }
            NodeType::Declaration => {
                self.out.push_str("<?xml");
                self.attributes(&node.attribs);
                self.out.push_str("?>");
            }
            NodeType::DocType => {
                self.out.push_str("<!DOCTYPE ");
                self.out.push_str(&node.value);
                self.out.push('>');
            }
            NodeType::ProcInfo => {
                self.out.push_str("<?");
                self.out.push_str(&node.name);
                if !node.value.is_empty() {
                    self.out.push(' ');
                    self.out.push_str(&node.value);
                }
                self.out.push_str("?>");
            }
        }
        self.end_line();
    }

    fn attributes(&mut self, attribs: &Attribs) {
        for (key, value) in attribs {
            self.out.push(' ');
            self.out.push_str(key);
            self.out.push_str("=\"");
            escape_into(&mut self.out, value, true);
            self.out.push('"');
        }
    }

    fn element(&mut self, node: &Node) {
        self.out.push('<');
        self.out.push_str(&node.name);
        self.attributes(&node.attribs);

        if node.value.is_empty() && node.nodes.is_empty() {
            self.out.push_str("/>");
            return;
        }

        self.out.push('>');
        if node.nodes.is_empty() {
            escape_into(&mut self.out, &node.value, false);
        } else {
            self.end_line();
            self.depth += 1;
            if !node.value.is_empty() {
                self.indent();
                escape_into(&mut self.out, &node.value, false);
                self.end_line();
            }
            for child in &node.nodes {
                self.node(child);
            }
            self.depth -= 1;
            self.indent();
        }
        self.out.push_str("</");
        self.out.push_str(&node.name);
        self.out.push('>');
    }
}

fn escape_into(out: &mut String, text: &str, attribute: bool) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if attribute => out.push_str("&quot;"),
            c => out.push(c),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::{Parse, read, write};
    use super::*;

    fn sample() -> Vec<Node> {
        let mut decl = Node::declaration();
        decl.set_attr("version", "1.0").unwrap();

        let mut item = Node::element("item");
        item.set_attr("id", "7").unwrap();
        item.set_value("a < b & c").unwrap();

        let mut root = Node::element("root");
        root.set_value("intro").unwrap();
        root.add(item)
            .unwrap()
            .add(Node::element("empty"))
            .unwrap()
            .add(Node::comment("note"))
            .unwrap();

        vec![decl, root]
    }

    #[test]
    fn test_compact() {
        assert_eq!(
            write(&sample(), Mode::Compact).unwrap(),
            r#"<?xml version="1.0"?><root>intro<item id="7">a &lt; b &amp; c</item><empty/><!--note--></root>"#
        );
    }

    #[test]
    fn test_readable() {
        let expected = "<?xml version=\"1.0\"?>\n<root>\n\tintro\n\t<item id=\"7\">a &lt; b &amp; c</item>\n\t<empty/>\n\t<!--note-->\n</root>\n";
        assert_eq!(write(&sample(), Mode::Readable).unwrap(), expected);
    }

    #[test]
    fn test_other_kinds() {
        let nodes = vec![
            Node::doctype("html"),
            Node::pi("target", "data"),
            Node::pi("bare", ""),
            Node::cdata("<x>"),
        ];
        assert_eq!(
            write(&nodes, Mode::Compact).unwrap(),
            "<!DOCTYPE html><?target data?><?bare?><![CDATA[<x>]]>"
        );
    }

    #[test]
    fn test_attribute_escaping() {
        let mut node = Node::element("a");
        node.set_attr("q", "say \"hi\" & <go>").unwrap();
        let text = write(std::slice::from_ref(&node), Mode::Compact).unwrap();
        assert_eq!(text, r#"<a q="say &quot;hi&quot; &amp; &lt;go&gt;"/>"#);
        assert_eq!(read(&text, Parse::ElementsTrimmed).unwrap(), vec![node]);
    }

    #[test]
    fn test_round_trip_both_modes() {
        let nodes = sample();
        for mode in [Mode::Compact, Mode::Readable] {
            let text = write(&nodes, mode).unwrap();
            assert_eq!(read(&text, Parse::FullTrimmed).unwrap(), nodes);
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(Node::element("x").to_string(), "<x/>\n");
    }
}
