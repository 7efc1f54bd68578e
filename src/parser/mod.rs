//! Markup parsing.
//!
//! A single hand-rolled, error-tolerant tree builder handles both HTML and
//! XML markup; [`ParseOptions::xml`] switches the rule set. The builder
//! writes straight into a [`Document`] arena, either under the primary root
//! ([`parse_document`]) or under a fresh fragment root of an existing arena
//! ([`parse_into`]), which is how content strings given to mutation methods
//! end up sharing node identity with the document they are inserted into.
//!
//! Malformed markup never fails a parse; irregularities are recorded as
//! diagnostics on the document. Only the nesting-depth limit is fatal.

pub mod entities;
pub(crate) mod input;
mod markup;

use crate::error::ParseError;
use crate::tree::{Document, NodeId};

use input::DEFAULT_MAX_DEPTH;

pub(crate) use markup::{is_raw_text_element, is_void_element};

/// Options controlling the markup parser.
///
/// Use the builder pattern to configure options:
///
/// ```
/// use quarry::parser::ParseOptions;
///
/// let opts = ParseOptions::default()
///     .xml(true)
///     .decode_entities(false)
///     .max_depth(128);
/// assert!(opts.xml);
/// ```
#[derive(Debug, Clone)]
#[allow(clippy::struct_excessive_bools)]
pub struct ParseOptions {
    /// Parse with XML rules: case-preserving names, CDATA sections, no
    /// void elements and no implied structure.
    pub xml: bool,
    /// Decode character references in text and attribute values.
    pub decode_entities: bool,
    /// Treat the input as a full HTML document and add the implied `html`,
    /// `head` and `body` elements. Ignored in XML mode.
    pub document: bool,
    /// Maximum element nesting depth.
    pub max_depth: u32,
    /// Suppress warning diagnostics.
    pub no_warnings: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            xml: false,
            decode_entities: true,
            document: true,
            max_depth: DEFAULT_MAX_DEPTH,
            no_warnings: false,
        }
    }
}

impl ParseOptions {
    /// Enables or disables XML mode.
    #[must_use]
    pub fn xml(mut self, yes: bool) -> Self {
        self.xml = yes;
        self
    }

    /// Enables or disables character reference decoding.
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

    /// Enables or disables warning suppression.
    #[must_use]
    pub fn no_warnings(mut self, yes: bool) -> Self {
        self.no_warnings = yes;
        self
    }
}

/// Parses markup into a new arena, under its primary root.
///
/// # Errors
///
/// Returns `ParseError` if the nesting-depth limit is exceeded.
///
/// # Examples
///
/// ```
/// use quarry::parser::{parse_document, ParseOptions};
///
/// let doc = parse_document("<p>Hello", &ParseOptions::default()).unwrap();
/// let html = doc.root_element().unwrap();
/// assert_eq!(doc.node_name(html), Some("html"));
/// ```
pub fn parse_document(input: &str, options: &ParseOptions) -> Result<Document, ParseError> {
    let mut doc = Document::new();
    let root = doc.root();
    markup::build(&mut doc, root, input, options)?;
    tracing::debug!(
        xml = options.xml,
        bytes = input.len(),
        nodes = doc.node_count(),
        "parsed document"
    );
    Ok(doc)
}

/// Parses markup into a fresh fragment root of an existing arena.
///
/// Returns the fragment root; the parsed nodes are its children.
///
/// # Errors
///
/// Returns `ParseError` if the nesting-depth limit is exceeded.
pub fn parse_into(
    doc: &mut Document,
    input: &str,
    options: &ParseOptions,
) -> Result<NodeId, ParseError> {
    let root = doc.create_root();
    markup::build(doc, root, input, options)?;
    tracing::trace!(bytes = input.len(), "parsed fragment");
    Ok(root)
}
