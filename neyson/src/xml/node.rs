use std::{collections::BTreeMap, fmt, slice};

use crate::error::{Error, Result};

/// Attribute map of an element or declaration.
pub type Attribs = BTreeMap<String, String>;
/// A sequence of sibling nodes.
pub type Nodes = Vec<Node>;

/// The kind of an XML [`Node`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeType {
    /// `<name attr="v">value children</name>`
    Element,
    /// `<![CDATA[value]]>`
    CData,
    /// `<!--value-->`
    Comment,
    /// `<?xml attr="v"?>`
    Declaration,
    /// `<!DOCTYPE value>`
    DocType,
    /// `<?name value?>`
    ProcInfo,
}

impl NodeType {
    pub fn name(self) -> &'static str {
        match self {
            NodeType::Element => "Element",
            NodeType::CData => "CData",
            NodeType::Comment => "Comment",
            NodeType::Declaration => "Declaration",
            NodeType::DocType => "DocType",
            NodeType::ProcInfo => "ProcInfo",
        }
    }

    fn has_name(self) -> bool {
        matches!(self, NodeType::Element | NodeType::ProcInfo)
    }

    fn has_value(self) -> bool {
        self != NodeType::Declaration
    }

    fn has_attribs(self) -> bool {
        matches!(self, NodeType::Element | NodeType::Declaration)
    }

    fn has_nodes(self) -> bool {
        self == NodeType::Element
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A node of an XML document.
///
/// Every node stores the same fields, but which of them are meaningful
/// depends on the [`NodeType`]. Accessors return [`Error::NodeAccess`] when
/// asked for a property the kind does not carry:
///
/// | kind        | name | value | attribs | nodes |
/// |-------------|------|-------|---------|-------|
/// | Element     | yes  | yes   | yes     | yes   |
/// | CData       |      | yes   |         |       |
/// | Comment     |      | yes   |         |       |
/// | Declaration |      |       | yes     |       |
/// | DocType     |      | yes   |         |       |
/// | ProcInfo    | yes  | yes   |         |       |
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub(super) kind: NodeType,
    pub(super) name: String,
    pub(super) value: String,
    pub(super) attribs: Attribs,
    pub(super) nodes: Nodes,
}

impl Default for Node {
    fn default() -> Self {
        Node::new(NodeType::Element)
    }
}

impl Node {
    /// Creates an empty node of the given kind.
    pub fn new(kind: NodeType) -> Self {
        Self {
            kind,
            name: String::new(),
            value: String::new(),
            attribs: Attribs::new(),
            nodes: Nodes::new(),
        }
    }

    /// Creates an empty element.
    pub fn element(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Node::new(NodeType::Element)
        }
    }

    pub fn comment(text: impl Into<String>) -> Self {
        Self {
            value: text.into(),
            ..Node::new(NodeType::Comment)
        }
    }

    pub fn cdata(text: impl Into<String>) -> Self {
        Self {
            value: text.into(),
            ..Node::new(NodeType::CData)
        }
    }

    pub fn declaration() -> Self {
        Node::new(NodeType::Declaration)
    }

    pub fn doctype(text: impl Into<String>) -> Self {
        Self {
            value: text.into(),
            ..Node::new(NodeType::DocType)
        }
    }

    /// Creates a processing instruction `<?name value?>`.
    pub fn pi(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            ..Node::new(NodeType::ProcInfo)
        }
    }

    /// Turns the node back into an empty element.
    pub fn reset(&mut self) {
        *self = Node::default();
    }

    pub fn kind(&self) -> NodeType {
        self.kind
    }

    pub fn is_elem(&self) -> bool {
        self.kind == NodeType::Element
    }

    pub fn is_cdata(&self) -> bool {
        self.kind == NodeType::CData
    }

    pub fn is_comment(&self) -> bool {
        self.kind == NodeType::Comment
    }

    pub fn is_decl(&self) -> bool {
        self.kind == NodeType::Declaration
    }

    pub fn is_doctype(&self) -> bool {
        self.kind == NodeType::DocType
    }

    pub fn is_pi(&self) -> bool {
        self.kind == NodeType::ProcInfo
    }

    fn check(&self, allowed: bool, property: &'static str) -> Result<()> {
        if allowed {
            Ok(())
        } else {
            Err(Error::NodeAccess {
                kind: self.kind,
                property,
            })
        }
    }

    pub fn name(&self) -> Result<&str> {
        self.check(self.kind.has_name(), "name")?;
        Ok(&self.name)
    }

    pub fn name_mut(&mut self) -> Result<&mut String> {
        self.check(self.kind.has_name(), "name")?;
        Ok(&mut self.name)
    }

    pub fn set_name(&mut self, name: impl Into<String>) -> Result<()> {
        *self.name_mut()? = name.into();
        Ok(())
    }

    /// Text of an element, or the content of the other non-declaration kinds.
    pub fn value(&self) -> Result<&str> {
        self.check(self.kind.has_value(), "value")?;
        Ok(&self.value)
    }

    pub fn value_mut(&mut self) -> Result<&mut String> {
        self.check(self.kind.has_value(), "value")?;
        Ok(&mut self.value)
    }

    pub fn set_value(&mut self, value: impl Into<String>) -> Result<()> {
        *self.value_mut()? = value.into();
        Ok(())
    }

    pub fn attribs(&self) -> Result<&Attribs> {
        self.check(self.kind.has_attribs(), "attribs")?;
        Ok(&self.attribs)
    }

    pub fn attribs_mut(&mut self) -> Result<&mut Attribs> {
        self.check(self.kind.has_attribs(), "attribs")?;
        Ok(&mut self.attribs)
    }

    pub fn set_attribs(&mut self, attribs: Attribs) -> Result<()> {
        *self.attribs_mut()? = attribs;
        Ok(())
    }

    pub fn nodes(&self) -> Result<&[Node]> {
        self.check(self.kind.has_nodes(), "nodes")?;
        Ok(&self.nodes)
    }

    pub fn nodes_mut(&mut self) -> Result<&mut Nodes> {
        self.check(self.kind.has_nodes(), "nodes")?;
        Ok(&mut self.nodes)
    }

    pub fn set_nodes(&mut self, nodes: Nodes) -> Result<()> {
        *self.nodes_mut()? = nodes;
        Ok(())
    }

    /// Returns the attribute `key`.
    pub fn attr(&self, key: &str) -> Result<&str> {
        self.attribs()?
            .get(key)
            .map(String::as_str)
            .ok_or_else(|| Error::MissingKey(key.to_string()))
    }

    /// Sets attribute `key`, overwriting any previous value.
    pub fn set_attr(&mut self, key: impl Into<String>, value: impl Into<String>) -> Result<()> {
        self.attribs_mut()?.insert(key.into(), value.into());
        Ok(())
    }

    /// Adds attribute `key` unless it is already present.
    pub fn add_attr(
        &mut self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<&mut Self> {
        self.attribs_mut()?
            .entry(key.into())
            .or_insert_with(|| value.into());
        Ok(self)
    }

    pub fn remove_attr(&mut self, key: &str) -> Result<bool> {
        Ok(self.attribs_mut()?.remove(key).is_some())
    }

    /// Appends a child node.
    pub fn add(&mut self, node: Node) -> Result<&mut Self> {
        self.nodes_mut()?.push(node);
        Ok(self)
    }

    pub fn child(&self, index: usize) -> Result<&Node> {
        let nodes = self.nodes()?;
        nodes
            .get(index)
            .ok_or_else(|| Error::out_of_range(index, nodes.len()))
    }

    pub fn child_mut(&mut self, index: usize) -> Result<&mut Node> {
        let nodes = self.nodes_mut()?;
        let len = nodes.len();
        nodes
            .get_mut(index)
            .ok_or_else(|| Error::out_of_range(index, len))
    }

    /// Removes and returns the child at `index`.
    pub fn remove(&mut self, index: usize) -> Result<Node> {
        let nodes = self.nodes_mut()?;
        if index >= nodes.len() {
            return Err(Error::out_of_range(index, nodes.len()));
        }
        Ok(nodes.remove(index))
    }

    /// Number of children.
    pub fn len(&self) -> Result<usize> {
        Ok(self.nodes()?.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.nodes()?.is_empty())
    }

    pub fn clear(&mut self) -> Result<()> {
        self.nodes_mut()?.clear();
        Ok(())
    }

    pub fn iter(&self) -> Result<slice::Iter<'_, Node>> {
        Ok(self.nodes()?.iter())
    }
}

/// Writes the node as readable XML.
impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&super::writer::render(std::slice::from_ref(self), super::Mode::Readable))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constructors() {
        let node = Node::default();
        assert!(node.is_elem());
        assert_eq!(node.name(), Ok(""));

        assert!(Node::comment("c").is_comment());
        assert!(Node::cdata("d").is_cdata());
        assert!(Node::declaration().is_decl());
        assert!(Node::doctype("html").is_doctype());

        let pi = Node::pi("target", "data");
        assert!(pi.is_pi());
        assert_eq!(pi.name(), Ok("target"));
        assert_eq!(pi.value(), Ok("data"));
    }

    #[test]
    fn test_access_rules() {
        let access = |kind, property| {
            Err::<(), _>(Error::NodeAccess { kind, property })
        };

        let comment = Node::comment("text");
        assert_eq!(comment.name().map(|_| ()), access(NodeType::Comment, "name"));
        assert_eq!(comment.attribs().map(|_| ()), access(NodeType::Comment, "attribs"));
        assert_eq!(comment.nodes().map(|_| ()), access(NodeType::Comment, "nodes"));

        let mut decl = Node::declaration();
        assert_eq!(decl.value().map(|_| ()), access(NodeType::Declaration, "value"));
        decl.set_attr("version", "1.0").unwrap();
        assert_eq!(decl.attr("version"), Ok("1.0"));
        assert!(decl.add(Node::element("x")).is_err());

        let mut pi = Node::pi("a", "b");
        assert!(pi.set_name("c").is_ok());
        assert!(pi.set_attr("k", "v").is_err());
        assert!(Node::cdata("x").len().is_err());
    }

    #[test]
    fn test_attributes() {
        let mut node = Node::element("item");
        node.set_attr("id", "1").unwrap();
        node.set_attr("id", "2").unwrap();
        assert_eq!(node.attr("id"), Ok("2"));

        node.add_attr("id", "3").unwrap().add_attr("class", "x").unwrap();
        assert_eq!(node.attr("id"), Ok("2"));
        assert_eq!(node.attr("class"), Ok("x"));
        assert_eq!(node.attr("missing"), Err(Error::MissingKey("missing".into())));

        assert_eq!(node.remove_attr("class"), Ok(true));
        assert_eq!(node.remove_attr("class"), Ok(false));
        assert_eq!(node.attribs().unwrap().len(), 1);
    }

    #[test]
    fn test_children() {
        let mut root = Node::element("root");
        root.add(Node::element("a"))
            .unwrap()
            .add(Node::comment("b"))
            .unwrap()
            .add(Node::element("c"))
            .unwrap();
        assert_eq!(root.len(), Ok(3));
        assert_eq!(root.child(2).unwrap().name(), Ok("c"));

        root.child_mut(0).unwrap().set_value("text").unwrap();
        assert_eq!(root.child(0).unwrap().value(), Ok("text"));

        let removed = root.remove(1).unwrap();
        assert!(removed.is_comment());
        assert_eq!(root.remove(5), Err(Error::out_of_range(5, 2)));
        assert_eq!(root.len(), Ok(2));

        let names: Vec<_> = root.iter().unwrap().map(|n| n.name().unwrap()).collect();
        assert_eq!(names, ["a", "c"]);

        root.clear().unwrap();
        assert_eq!(root.is_empty(), Ok(true));
    }

    #[test]
    fn test_equality_and_reset() {
        let mut a = Node::element("x");
        a.set_attr("k", "v").unwrap();
        let mut b = a.clone();
        assert_eq!(a, b);
        b.set_value("changed").unwrap();
        assert_ne!(a, b);

        a.reset();
        assert_eq!(a, Node::default());
    }
}
