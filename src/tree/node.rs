//! Node type definitions.
//!
//! The `NodeKind` enum carries the payload of each node type. Navigation
//! links (parent, children, siblings) live in `NodeData`, not here.

use super::Attribute;

/// The kind of a node and its associated data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// A root node: the loaded document or a parsed fragment container.
    ///
    /// Roots are only ever top-level; they are never inserted as children
    /// and render as their children only.
    Document,

    /// An element node, e.g., `<div class="x">`.
    Element {
        /// The qualified tag name. Lowercase in HTML mode.
        name: String,
        /// Namespace URI resolved at parse time (XML mode only).
        namespace: Option<String>,
        /// Attributes in source order. Names are unique.
        attributes: Vec<Attribute>,
    },

    /// A text node (character references already decoded).
    Text {
        /// The text content.
        content: String,
    },

    /// A CDATA section, e.g., `<![CDATA[...]]>`.
    CData {
        /// The section content.
        content: String,
    },

    /// A comment node, e.g., `<!-- ... -->`.
    Comment {
        /// The comment text without the delimiters.
        content: String,
    },

    /// A declaration or processing instruction such as `<!DOCTYPE html>`
    /// or `<?xml version="1.0"?>`.
    Directive {
        /// Lowercased leading name including its sigil (`!doctype`, `?xml`).
        name: String,
        /// Everything between `<` and `>`, verbatim.
        data: String,
    },
}

impl NodeKind {
    /// Creates an element payload with no namespace.
    pub fn element(name: impl Into<String>, attributes: Vec<Attribute>) -> Self {
        Self::Element {
            name: name.into(),
            namespace: None,
            attributes,
        }
    }

    /// Creates a text payload.
    pub fn text(content: impl Into<String>) -> Self {
        Self::Text {
            content: content.into(),
        }
    }

    /// Returns `true` for element nodes.
    #[must_use]
    pub fn is_element(&self) -> bool {
        matches!(self, Self::Element { .. })
    }

    /// Returns `true` for root nodes.
    #[must_use]
    pub fn is_document(&self) -> bool {
        matches!(self, Self::Document)
    }

    /// Returns `true` for nodes that can hold children.
    #[must_use]
    pub fn has_children(&self) -> bool {
        matches!(self, Self::Document | Self::Element { .. })
    }

    /// Returns the tag name of an element.
    #[must_use]
    pub fn element_name(&self) -> Option<&str> {
        match self {
            Self::Element { name, .. } => Some(name),
            _ => None,
        }
    }
}
