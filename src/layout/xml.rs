// Phase 3: Owned, mutable XML tree: parsed with quick-xml events, written back with indentation.

use quick_xml::events::{BytesDecl, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

use crate::error::{LineCutError, Result};

/// Index of an element inside its [`XmlDocument`].
pub type NodeId = usize;

#[derive(Debug, Clone, PartialEq)]
pub enum Content {
    Element(NodeId),
    Text(String),
    Comment(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    /// Qualified name as written, e.g. `pc:TextLine`.
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<Content>,
    pub parent: Option<NodeId>,
}

impl Element {
    pub fn local_name(&self) -> &str {
        local_name(&self.name)
    }

    pub fn prefix(&self) -> Option<&str> {
        self.name.split_once(':').map(|(prefix, _)| prefix)
    }
}

fn local_name(name: &str) -> &str {
    name.rsplit_once(':').map_or(name, |(_, local)| local)
}

#[derive(Debug, Clone)]
pub struct XmlDocument {
    declaration: Option<BytesDecl<'static>>,
    elements: Vec<Element>,
    root: NodeId,
}

impl XmlDocument {
    /// Parse a document. Whitespace-only text is dropped from elements that
    /// have child elements; any other text is kept verbatim.
    pub fn parse(xml: &str) -> Result<Self> {
        let mut reader = Reader::from_str(xml);
        reader.trim_text(false);

        let mut declaration = None;
        let mut elements: Vec<Element> = Vec::new();
        let mut stack: Vec<NodeId> = Vec::new();
        let mut root: Option<NodeId> = None;

        loop {
            match reader.read_event()? {
                Event::Decl(decl) => declaration = Some(decl.into_owned()),
                Event::Start(start) => {
                    let id = push_element(&mut elements, &start, stack.last().copied(), &mut root)?;
                    stack.push(id);
                }
                Event::Empty(start) => {
                    push_element(&mut elements, &start, stack.last().copied(), &mut root)?;
                }
                Event::End(_) => {
                    stack.pop();
                }
                Event::Text(text) => {
                    let text = text.unescape()?;
                    if let Some(&parent) = stack.last() {
                        elements[parent].children.push(Content::Text(text.into_owned()));
                    }
                }
                Event::CData(data) => {
                    if let Some(&parent) = stack.last() {
                        let text = String::from_utf8_lossy(&data.into_inner()).into_owned();
                        elements[parent].children.push(Content::Text(text));
                    }
                }
                Event::Comment(comment) => {
                    if let Some(&parent) = stack.last() {
                        let text = String::from_utf8_lossy(&comment.into_inner()).into_owned();
                        elements[parent].children.push(Content::Comment(text));
                    }
                }
                Event::PI(_) | Event::DocType(_) => {}
                Event::Eof => break,
            }
        }

        if !stack.is_empty() {
            return Err(LineCutError::xml("Unexpected end of document: unclosed elements"));
        }
        let root = root.ok_or_else(|| LineCutError::xml("Document has no root element"))?;

        // Indentation between child elements is layout, not content.
        for element in &mut elements {
            let has_elements = element
                .children
                .iter()
                .any(|c| matches!(c, Content::Element(_)));
            if has_elements {
                element
                    .children
                    .retain(|c| !matches!(c, Content::Text(t) if t.trim().is_empty()));
            }
        }

        Ok(XmlDocument {
            declaration,
            elements,
            root,
        })
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn element(&self, id: NodeId) -> &Element {
        &self.elements[id]
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.elements[id].parent
    }

    pub fn attribute(&self, id: NodeId, key: &str) -> Option<&str> {
        self.elements[id]
            .attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn set_attribute(&mut self, id: NodeId, key: &str, value: &str) {
        let attrs = &mut self.elements[id].attributes;
        match attrs.iter_mut().find(|(k, _)| k == key) {
            Some((_, v)) => *v = value.to_string(),
            None => attrs.push((key.to_string(), value.to_string())),
        }
    }

    /// Direct element children.
    pub fn child_elements(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.elements[id].children.iter().filter_map(|c| match c {
            Content::Element(child) => Some(*child),
            _ => None,
        })
    }

    /// Direct element children with the given local name (namespace prefix ignored).
    pub fn children_named<'a>(
        &'a self,
        id: NodeId,
        name: &'a str,
    ) -> impl Iterator<Item = NodeId> + 'a {
        self.child_elements(id)
            .filter(move |&child| self.elements[child].local_name() == name)
    }

    pub fn first_child_named(&self, id: NodeId, name: &str) -> Option<NodeId> {
        self.children_named(id, name).next()
    }

    /// All descendants with the given local name, in document order.
    pub fn descendants_named(&self, id: NodeId, name: &str) -> Vec<NodeId> {
        let mut found = Vec::new();
        let mut stack: Vec<NodeId> = self.child_elements(id).collect();
        stack.reverse();
        while let Some(node) = stack.pop() {
            if self.elements[node].local_name() == name {
                found.push(node);
            }
            let before = stack.len();
            stack.extend(self.child_elements(node));
            stack[before..].reverse();
        }
        found
    }

    /// Concatenated text content; an element without text yields `""`.
    pub fn text(&self, id: NodeId) -> String {
        self.elements[id]
            .children
            .iter()
            .filter_map(|c| match c {
                Content::Text(t) => Some(t.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Replace all text children with a single text node.
    pub fn set_text(&mut self, id: NodeId, text: &str) {
        let children = &mut self.elements[id].children;
        children.retain(|c| !matches!(c, Content::Text(_)));
        children.insert(0, Content::Text(text.to_string()));
    }

    pub fn append_element(&mut self, parent: NodeId, name: &str, attributes: &[(&str, &str)]) -> NodeId {
        let id = self.elements.len();
        self.elements.push(Element {
            name: name.to_string(),
            attributes: attributes
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            children: Vec::new(),
            parent: Some(parent),
        });
        let children = &mut self.elements[parent].children;
        children.retain(|c| !matches!(c, Content::Text(t) if t.trim().is_empty()));
        children.push(Content::Element(id));
        id
    }

    /// Serialize with two-space indentation.
    pub fn to_pretty_string(&self) -> Result<String> {
        let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
        if let Some(decl) = &self.declaration {
            writer.write_event(Event::Decl(decl.clone()))?;
        }
        self.write_element(&mut writer, self.root)?;

        let mut out = String::from_utf8(writer.into_inner())
            .map_err(|e| LineCutError::xml(format!("Serialized XML is not UTF-8: {e}")))?;
        out.push('\n');
        Ok(out)
    }

    fn write_element(&self, writer: &mut Writer<Vec<u8>>, id: NodeId) -> Result<()> {
        let element = &self.elements[id];
        let start = BytesStart::new(element.name.as_str()).with_attributes(
            element
                .attributes
                .iter()
                .map(|(k, v)| (k.as_str(), v.as_str())),
        );

        if element.children.is_empty() {
            writer.write_event(Event::Empty(start))?;
            return Ok(());
        }

        let end = start.to_end().into_owned();
        writer.write_event(Event::Start(start))?;
        for child in &element.children {
            match child {
                Content::Element(child) => self.write_element(writer, *child)?,
                Content::Text(text) => writer.write_event(Event::Text(BytesText::new(text)))?,
                Content::Comment(text) => {
                    writer.write_event(Event::Comment(BytesText::from_escaped(text.as_str())))?
                }
            }
        }
        writer.write_event(Event::End(end))?;
        Ok(())
    }
}

fn push_element(
    elements: &mut Vec<Element>,
    start: &BytesStart<'_>,
    parent: Option<NodeId>,
    root: &mut Option<NodeId>,
) -> Result<NodeId> {
    let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
    let mut attributes = Vec::new();
    for attr in start.attributes() {
        let attr = attr?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr.unescape_value()?.into_owned();
        attributes.push((key, value));
    }

    let id = elements.len();
    elements.push(Element {
        name,
        attributes,
        children: Vec::new(),
        parent,
    });
    match parent {
        Some(parent) => elements[parent].children.push(Content::Element(id)),
        None if root.is_none() => *root = Some(id),
        None => return Err(LineCutError::xml("Document has more than one root element")),
    }
    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<pc:Root xmlns:pc="urn:test">
  <pc:A id="a1"><pc:B>hello &amp; bye</pc:B></pc:A>
  <pc:A id="a2"/>
</pc:Root>"#;

    #[test]
    fn test_parse_and_query_by_local_name() {
        let doc = XmlDocument::parse(DOC).unwrap();
        let root = doc.root();
        assert_eq!(doc.element(root).local_name(), "Root");
        assert_eq!(doc.element(root).prefix(), Some("pc"));

        let a: Vec<NodeId> = doc.children_named(root, "A").collect();
        assert_eq!(a.len(), 2);
        assert_eq!(doc.attribute(a[0], "id"), Some("a1"));

        let b = doc.first_child_named(a[0], "B").unwrap();
        assert_eq!(doc.text(b), "hello & bye");
        assert_eq!(doc.parent(b), Some(a[0]));
    }

    #[test]
    fn test_descendants_in_document_order() {
        let doc = XmlDocument::parse("<r><a id='1'><a id='2'/></a><a id='3'/></r>").unwrap();
        let ids: Vec<&str> = doc
            .descendants_named(doc.root(), "a")
            .into_iter()
            .filter_map(|n| doc.attribute(n, "id"))
            .collect();
        assert_eq!(ids, vec!["1", "2", "3"]);
    }

    #[test]
    fn test_text_whitespace_is_preserved_inside_content() {
        let doc = XmlDocument::parse("<r><t>  two  spaces </t></r>").unwrap();
        let t = doc.first_child_named(doc.root(), "t").unwrap();
        assert_eq!(doc.text(t), "  two  spaces ");
    }

    #[test]
    fn test_whitespace_only_text_is_kept_in_leaf_elements() {
        let doc = XmlDocument::parse("<r>\n  <u> </u>\n  <e></e>\n</r>").unwrap();
        let root = doc.root();
        let u = doc.first_child_named(root, "u").unwrap();
        assert_eq!(doc.text(u), " ");
        assert_eq!(doc.text(root), "");

        let out = doc.to_pretty_string().unwrap();
        let reparsed = XmlDocument::parse(&out).unwrap();
        let u = reparsed.first_child_named(reparsed.root(), "u").unwrap();
        assert_eq!(reparsed.text(u), " ");
    }

    #[test]
    fn test_appending_child_drops_indentation_text() {
        let mut doc = XmlDocument::parse("<r><e>\n  </e></r>").unwrap();
        let e = doc.first_child_named(doc.root(), "e").unwrap();
        doc.append_element(e, "c", &[]);
        assert_eq!(doc.text(e), "");
    }

    #[test]
    fn test_mutate_and_serialize() {
        let mut doc = XmlDocument::parse(DOC).unwrap();
        let root = doc.root();
        let a2 = doc.children_named(root, "A").nth(1).unwrap();
        let c = doc.append_element(a2, "pc:C", &[("index", "0")]);
        doc.set_text(c, "x < y");

        let out = doc.to_pretty_string().unwrap();
        assert!(out.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert!(out.contains("<pc:C index=\"0\">x &lt; y</pc:C>"));
        assert!(out.contains("\n    <pc:C"), "child should be indented: {out}");

        let reparsed = XmlDocument::parse(&out).unwrap();
        let a2 = reparsed.children_named(reparsed.root(), "A").nth(1).unwrap();
        let c = reparsed.first_child_named(a2, "C").unwrap();
        assert_eq!(reparsed.text(c), "x < y");
    }

    #[test]
    fn test_rejects_unclosed_document() {
        assert!(XmlDocument::parse("<r><a>").is_err());
        assert!(XmlDocument::parse("").is_err());
    }
}
