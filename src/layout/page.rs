use std::collections::HashMap;
use std::path::Path;

use super::xml::{NodeId, XmlDocument};
use crate::error::{LineCutError, Result};
use crate::paths::split_all_ext;

/// One layout document held in memory, with its text lines indexed by id.
#[derive(Debug, Clone)]
pub struct Page {
    id: String,
    document: XmlDocument,
    page_element: NodeId,
    lines: Vec<NodeId>,
    line_index: HashMap<String, NodeId>,
}

impl Page {
    /// Parse a layout document. `id` groups all samples of this page.
    pub fn parse(id: impl Into<String>, xml: &str) -> Result<Self> {
        let id = id.into();
        let document = XmlDocument::parse(xml)?;
        let root = document.root();
        let page_element = if document.element(root).local_name() == "Page" {
            root
        } else {
            document
                .descendants_named(root, "Page")
                .first()
                .copied()
                .ok_or_else(|| LineCutError::layout(format!("No Page element in '{id}'")))?
        };

        let lines = document.descendants_named(page_element, "TextLine");
        let mut line_index = HashMap::with_capacity(lines.len());
        for &line in &lines {
            if let Some(line_id) = document.attribute(line, "id") {
                if line_index.insert(line_id.to_string(), line).is_some() {
                    tracing::warn!(page = %id, line = line_id, "duplicate TextLine id, keeping the last");
                }
            }
        }

        Ok(Page {
            id,
            document,
            page_element,
            lines,
            line_index,
        })
    }

    /// Read a layout file; the page id is the path with all extensions removed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let (base, _) = split_all_ext(path);
        Self::parse(base.to_string_lossy().into_owned(), &content)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn document(&self) -> &XmlDocument {
        &self.document
    }

    /// `imageFilename` of the Page element.
    pub fn image_filename(&self) -> Option<&str> {
        self.document.attribute(self.page_element, "imageFilename")
    }

    /// Declared `imageWidth`, the reference for coordinate scaling.
    pub fn image_width(&self) -> Result<u32> {
        let raw = self
            .document
            .attribute(self.page_element, "imageWidth")
            .ok_or_else(|| {
                LineCutError::layout(format!("Page '{}' has no imageWidth attribute", self.id))
            })?;
        raw.trim()
            .parse::<u32>()
            .ok()
            .filter(|w| *w > 0)
            .ok_or_else(|| {
                LineCutError::layout(format!("Page '{}' has invalid imageWidth '{raw}'", self.id))
            })
    }

    /// Text line elements in document order.
    pub fn text_lines(&self) -> &[NodeId] {
        &self.lines
    }

    pub fn line(&self, line_id: &str) -> Option<NodeId> {
        self.line_index.get(line_id).copied()
    }

    /// TextEquiv children of `line` selected for `text_index`: entries with a
    /// matching `index` attribute, or, when there are none, entries without
    /// any `index` attribute.
    pub fn transcription_candidates(&self, line: NodeId, text_index: i32) -> Vec<NodeId> {
        let doc = &self.document;
        let indexed: Vec<NodeId> = doc
            .children_named(line, "TextEquiv")
            .filter(|&te| parse_index(doc.attribute(te, "index")) == Some(text_index))
            .collect();
        if !indexed.is_empty() {
            return indexed;
        }
        doc.children_named(line, "TextEquiv")
            .filter(|&te| doc.attribute(te, "index").is_none())
            .collect()
    }

    /// Text of a TextEquiv entry. A missing or empty Unicode child is `""`.
    pub fn transcription_text(&self, text_equiv: NodeId) -> String {
        self.document
            .first_child_named(text_equiv, "Unicode")
            .map(|u| self.document.text(u))
            .unwrap_or_default()
    }

    /// Set the transcription at `text_index` on a line, creating the
    /// TextEquiv/Unicode elements when absent.
    pub fn set_transcription(&mut self, line_id: &str, text_index: i32, text: &str) -> Result<()> {
        let line = self.line(line_id).ok_or_else(|| {
            LineCutError::write_back(format!("Unknown line '{line_id}' on page '{}'", self.id))
        })?;

        let prefix = self
            .document
            .element(line)
            .prefix()
            .map(|p| format!("{p}:"))
            .unwrap_or_default();

        let existing = self
            .document
            .children_named(line, "TextEquiv")
            .find(|&te| parse_index(self.document.attribute(te, "index")) == Some(text_index));
        let text_equiv = match existing {
            Some(te) => te,
            None => {
                let index = text_index.to_string();
                self.document
                    .append_element(line, &format!("{prefix}TextEquiv"), &[("index", index.as_str())])
            }
        };

        let unicode = match self.document.first_child_named(text_equiv, "Unicode") {
            Some(u) => u,
            None => self
                .document
                .append_element(text_equiv, &format!("{prefix}Unicode"), &[]),
        };
        self.document.set_text(unicode, text);
        Ok(())
    }

    pub fn to_xml(&self) -> Result<String> {
        self.document.to_pretty_string()
    }
}

fn parse_index(raw: Option<&str>) -> Option<i32> {
    raw.and_then(|s| s.trim().parse().ok())
}
