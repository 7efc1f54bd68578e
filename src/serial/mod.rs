//! Rendering node trees back to markup.
//!
//! Two rule sets share one entry point: [`html`] for HTML documents and
//! fragments and [`xml`] for XML mode. A root node renders as its children
//! only, so rendering a loaded document reproduces the whole input.

pub mod html;
pub mod xml;

use crate::tree::{Document, NodeId};

/// Options controlling rendering.
///
/// # Examples
///
/// ```
/// use quarry::serial::RenderOptions;
///
/// let opts = RenderOptions::default().xml(true);
/// assert!(opts.xml);
/// assert!(opts.decode_entities);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOptions {
    /// Use XML rules: self-closing empty elements, XML escaping.
    pub xml: bool,
    /// Escape special characters. Turn off for documents that were parsed
    /// without decoding, whose text still holds the original references.
    pub decode_entities: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            xml: false,
            decode_entities: true,
        }
    }
}

impl RenderOptions {
    /// Enables or disables XML rules.
    #[must_use]
    pub fn xml(mut self, yes: bool) -> Self {
        self.xml = yes;
        self
    }

    /// Enables or disables escaping.
    #[must_use]
    pub fn decode_entities(mut self, yes: bool) -> Self {
        self.decode_entities = yes;
        self
    }
}

/// Renders a list of nodes, concatenated in the given order.
///
/// # Examples
///
/// ```
/// use quarry::parser::{parse_document, ParseOptions};
/// use quarry::serial::{render, RenderOptions};
///
/// let opts = ParseOptions::default().document(false);
/// let doc = parse_document("<p class=\"a\">x &amp; y</p>", &opts).unwrap();
/// let html = render(&doc, &[doc.root()], RenderOptions::default());
/// assert_eq!(html, "<p class=\"a\">x &amp; y</p>");
/// ```
#[must_use]
pub fn render(doc: &Document, nodes: &[NodeId], options: RenderOptions) -> String {
    let mut out = String::new();
    for &id in nodes {
        render_into(doc, id, options, &mut out);
    }
    out
}

/// Renders the children of a node (its inner markup).
#[must_use]
pub fn render_children(doc: &Document, id: NodeId, options: RenderOptions) -> String {
    let mut out = String::new();
    for child in doc.children(id) {
        render_into(doc, child, options, &mut out);
    }
    out
}

/// Appends the markup of one node to `out`.
pub fn render_into(doc: &Document, id: NodeId, options: RenderOptions, out: &mut String) {
    if options.xml {
        xml::write_node(doc, id, out, options.decode_entities);
    } else {
        html::write_node(doc, id, out, options.decode_entities);
    }
}
