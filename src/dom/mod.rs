//! Loaded documents.
//!
//! A [`Dom`] owns the node arena of one loaded document together with the
//! [`LoadOptions`] it was loaded with. It is a cheap, reference-counted
//! handle: every [`Selection`] derived from it holds a clone, so the arena
//! lives as long as any selection does.
//!
//! ```
//! use quarry::Dom;
//!
//! let dom = Dom::load("<ul><li>Apple</li><li>Pear</li></ul>").unwrap();
//! let items = dom.select("li").unwrap();
//! assert_eq!(items.len(), 2);
//! assert_eq!(items.text(), "ApplePear");
//! ```

use std::cell::{Ref, RefCell, RefMut};
use std::fmt;
use std::rc::Rc;

use url::Url;

use crate::encoding;
use crate::error::Result;
use crate::parser::{self, ParseOptions};
use crate::selection::Selection;
use crate::serial::{self, RenderOptions};
use crate::tree::{Document, NodeId};

/// Options for loading markup into a [`Dom`].
///
/// ```
/// use quarry::LoadOptions;
///
/// let opts = LoadOptions::default().xml(true).max_depth(64);
/// assert!(opts.xml);
/// assert!(opts.base_uri.is_none());
/// ```
#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// XML rules for parsing, selector matching, attributes and rendering.
    pub xml: bool,
    /// Base for resolving the `href` and `src` properties.
    pub base_uri: Option<Url>,
    /// Decode character references when parsing and escape when rendering.
    pub decode_entities: bool,
    /// Add the implied `html`/`head`/`body` structure (HTML only).
    pub document: bool,
    /// Maximum element nesting depth.
    pub max_depth: u32,
    /// Encoding label for byte input, overriding in-band declarations.
    pub encoding: Option<String>,
}

impl Default for LoadOptions {
    fn default() -> Self {
        let parse = ParseOptions::default();
        Self {
            xml: false,
            base_uri: None,
            decode_entities: true,
            document: true,
            max_depth: parse.max_depth,
            encoding: None,
        }
    }
}

impl LoadOptions {
    /// Enables or disables XML mode.
    #[must_use]
    pub fn xml(mut self, yes: bool) -> Self {
        self.xml = yes;
        self
    }

    /// Sets the base URI used by the `href`/`src` properties.
    #[must_use]
    pub fn base_uri(mut self, base: Url) -> Self {
        self.base_uri = Some(base);
        self
    }

    /// Enables or disables character reference handling.
    #[must_use]
    pub fn decode_entities(mut self, yes: bool) -> Self {
        self.decode_entities = yes;
        self
    }

    /// Enables or disables implied document structure.
    #[must_use]
    pub fn document(mut self, yes: bool) -> Self {
        self.document = yes;
        self
    }

    /// Sets the maximum nesting depth.
    #[must_use]
    pub fn max_depth(mut self, depth: u32) -> Self {
        self.max_depth = depth;
        self
    }

    /// Sets the encoding label used for byte input.
    #[must_use]
    pub fn encoding(mut self, label: impl Into<String>) -> Self {
        self.encoding = Some(label.into());
        self
    }

    pub(crate) fn parse_options(&self, document: bool) -> ParseOptions {
        ParseOptions::default()
            .xml(self.xml)
            .decode_entities(self.decode_entities)
            .document(document)
            .max_depth(self.max_depth)
    }

    pub(crate) fn render_options(&self) -> RenderOptions {
        RenderOptions::default()
            .xml(self.xml)
            .decode_entities(self.decode_entities)
    }
}

/// A loaded document: the shared node arena plus its options.
#[derive(Clone)]
pub struct Dom {
    inner: Rc<DomInner>,
}

struct DomInner {
    doc: RefCell<Document>,
    options: LoadOptions,
}

impl Dom {
    /// Loads HTML with the default options.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Parse`](crate::Error::Parse) if the nesting limit
    /// is exceeded.
    pub fn load(markup: &str) -> Result<Self> {
        Self::load_with_options(markup, LoadOptions::default())
    }

    /// Loads markup with the given options.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Parse`](crate::Error::Parse) if the nesting limit
    /// is exceeded.
    pub fn load_with_options(markup: &str, options: LoadOptions) -> Result<Self> {
        let doc = parser::parse_document(markup, &options.parse_options(options.document))?;
        if !doc.diagnostics.is_empty() {
            tracing::warn!(
                diagnostics = doc.diagnostics.len(),
                "markup was malformed and has been recovered"
            );
        }
        tracing::debug!(
            xml = options.xml,
            bytes = markup.len(),
            nodes = doc.node_count(),
            "loaded document"
        );
        Ok(Self::from_document(doc, options))
    }

    /// Decodes and loads raw bytes. See [`encoding::decode`] for how the
    /// encoding is chosen.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Encoding`](crate::Error::Encoding) for an unknown
    /// encoding label and [`Error::Parse`](crate::Error::Parse) if the
    /// nesting limit is exceeded.
    pub fn load_bytes(bytes: &[u8], options: LoadOptions) -> Result<Self> {
        let (text, used) = encoding::decode(bytes, options.xml, options.encoding.as_deref())?;
        tracing::debug!(encoding = used.name(), "decoded byte input");
        Self::load_with_options(&text, options)
    }

    /// Wraps an already built arena.
    #[must_use]
    pub fn from_document(doc: Document, options: LoadOptions) -> Self {
        Self {
            inner: Rc::new(DomInner {
                doc: RefCell::new(doc),
                options,
            }),
        }
    }

    /// The options this document was loaded with.
    #[must_use]
    pub fn options(&self) -> &LoadOptions {
        &self.inner.options
    }

    /// Read access to the arena.
    ///
    /// # Panics
    ///
    /// Panics if called while a mutation is in progress, for example from
    /// a [`Document`] borrow held across a mutating selection call.
    #[must_use]
    pub fn document(&self) -> Ref<'_, Document> {
        self.inner.doc.borrow()
    }

    pub(crate) fn document_mut(&self) -> RefMut<'_, Document> {
        self.inner.doc.borrow_mut()
    }

    /// The id of the document root.
    #[must_use]
    pub fn root_id(&self) -> NodeId {
        self.document().root()
    }

    /// A selection holding just the document root.
    #[must_use]
    pub fn root(&self) -> Selection {
        let root = self.root_id();
        self.wrap(vec![root])
    }

    /// Queries the whole document.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidSelector`](crate::Error::InvalidSelector) if
    /// the selector does not compile.
    pub fn select(&self, selector: &str) -> Result<Selection> {
        self.root().find(selector)
    }

    /// Parses an HTML snippet into a fresh fragment of this arena and
    /// returns its top-level nodes.
    ///
    /// The nodes share identity with the document, so they can be
    /// inserted anywhere without copying.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Parse`](crate::Error::Parse) if the nesting limit
    /// is exceeded.
    pub fn parse_html(&self, markup: &str) -> Result<Selection> {
        let nodes = self.parse_fragment(markup)?;
        Ok(self.wrap(nodes))
    }

    pub(crate) fn parse_fragment(&self, markup: &str) -> Result<Vec<NodeId>> {
        let options = self.inner.options.parse_options(false);
        let mut doc = self.document_mut();
        let fragment = parser::parse_into(&mut doc, markup, &options)?;
        Ok(doc.children(fragment).collect())
    }

    /// Wraps nodes of this arena in a selection. Duplicates are dropped.
    #[must_use]
    pub fn wrap(&self, nodes: impl Into<Vec<NodeId>>) -> Selection {
        let mut nodes = nodes.into();
        Document::dedup_in_place(&mut nodes);
        Selection::new(self.clone(), nodes, None)
    }

    /// An empty selection bound to this document.
    #[must_use]
    pub fn empty(&self) -> Selection {
        Selection::new(self.clone(), Vec::new(), None)
    }

    /// Renders the whole document with the load options.
    #[must_use]
    pub fn html(&self) -> String {
        self.render(&[self.root_id()])
    }

    /// Renders the whole document with XML rules.
    #[must_use]
    pub fn xml(&self) -> String {
        let doc = self.document();
        let options = self.inner.options.render_options().xml(true);
        serial::render(&doc, &[doc.root()], options)
    }

    /// The text content of the whole document.
    #[must_use]
    pub fn text(&self) -> String {
        let doc = self.document();
        doc.text_content(doc.root())
    }

    /// Returns `true` if `contained` is a strict descendant of `container`.
    #[must_use]
    pub fn contains(&self, container: NodeId, contained: NodeId) -> bool {
        self.document().contains(container, contained)
    }

    /// Returns `true` if both handles refer to the same arena.
    #[must_use]
    pub fn ptr_eq(&self, other: &Dom) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    pub(crate) fn render(&self, nodes: &[NodeId]) -> String {
        let doc = self.document();
        serial::render(&doc, nodes, self.inner.options.render_options())
    }

    pub(crate) fn render_inner(&self, id: NodeId) -> String {
        let doc = self.document();
        serial::render_children(&doc, id, self.inner.options.render_options())
    }
}

impl fmt::Debug for Dom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dom")
            .field("options", &self.inner.options)
            .field("nodes", &self.document().node_count())
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::Error;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_load_adds_document_structure() {
        let dom = Dom::load("<p>Hi</p>").unwrap();
        assert_eq!(dom.html(), "<html><head></head><body><p>Hi</p></body></html>");
        assert_eq!(dom.text(), "Hi");
    }

    #[test]
    fn test_load_fragment_mode() {
        let dom = Dom::load_with_options("<p>Hi</p>", LoadOptions::default().document(false))
            .unwrap();
        assert_eq!(dom.html(), "<p>Hi</p>");
    }

    #[test]
    fn test_load_xml_mode() {
        let dom = Dom::load_with_options("<Feed><Entry/></Feed>", LoadOptions::default().xml(true))
            .unwrap();
        assert_eq!(dom.html(), "<Feed><Entry/></Feed>");
        assert_eq!(dom.select("Entry").unwrap().len(), 1);
    }

    #[test]
    fn test_load_bytes_uses_declared_encoding() {
        let dom = Dom::load_bytes(
            b"<meta charset=latin1><p>caf\xE9</p>",
            LoadOptions::default().document(false),
        )
        .unwrap();
        assert_eq!(dom.select("p").unwrap().text(), "caf\u{e9}");

        let err = Dom::load_bytes(b"x", LoadOptions::default().encoding("nope")).unwrap_err();
        assert!(matches!(err, Error::Encoding(_)));
    }

    #[test]
    fn test_depth_limit_surfaces_as_parse_error() {
        let err = Dom::load_with_options(&"<div>".repeat(50), LoadOptions::default().max_depth(8))
            .unwrap_err();
        assert!(matches!(err, Error::Parse(_)));
    }

    #[test]
    fn test_parse_html_shares_arena() {
        let dom = Dom::load("<ul></ul>").unwrap();
        let plum = dom.parse_html("<li>Plum</li>").unwrap();
        assert_eq!(plum.len(), 1);
        dom.select("ul").unwrap().append(&plum).unwrap();
        assert_eq!(dom.select("li").unwrap().get(0), plum.get(0));
    }

    #[test]
    fn test_wrap_dedups_and_contains() {
        let dom = Dom::load("<div><p>x</p></div>").unwrap();
        let div = dom.select("div").unwrap().get(0).unwrap();
        let p = dom.select("p").unwrap().get(0).unwrap();
        assert_eq!(dom.wrap(vec![p, div, p]).nodes(), &[p, div]);
        assert!(dom.contains(div, p));
        assert!(!dom.contains(p, div));
        assert!(!dom.contains(div, div));
    }

    #[test]
    fn test_xml_rendering_of_html_document() {
        let dom = Dom::load_with_options("<p>\u{e9}<br></p>", LoadOptions::default().document(false))
            .unwrap();
        assert_eq!(dom.xml(), "<p>&#xe9;<br/></p>");
    }

    #[test]
    fn test_empty_selection() {
        let dom = Dom::load("").unwrap();
        assert!(dom.empty().is_empty());
        assert!(dom.ptr_eq(&dom.clone()));
    }
}
