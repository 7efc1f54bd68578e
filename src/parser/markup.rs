//! The tolerant tree builder behind both parse modes.
//!
//! HTML mode lowercases names, knows void, raw-text and RCDATA elements,
//! closes elements implicitly (`<p>` closes an open `<p>`, `<li>` an open
//! `<li>` and so on) and, for full documents, adds the implied `html`,
//! `head` and `body` elements. XML mode keeps names as written, honors
//! `<x/>` on every element, reads CDATA sections and resolves namespace
//! prefixes.
//!
//! Nothing here ever rejects input: stray end tags are dropped, unclosed
//! elements are closed at end of input, and every oddity is recorded as a
//! warning diagnostic on the document.

use super::entities::{is_legacy_entity, lookup_entity, lookup_xml_entity};
use super::input::{NamespaceResolver, ParserInput};
use super::ParseOptions;
use crate::error::{ErrorSeverity, ParseDiagnostic, ParseError};
use crate::tree::{Attribute, Document, NodeId, NodeKind};
use crate::util::qname::{split_qname, xmlns_binding};

const XHTML_NAMESPACE: &str = "http://www.w3.org/1999/xhtml";
const SVG_NAMESPACE: &str = "http://www.w3.org/2000/svg";
const MATHML_NAMESPACE: &str = "http://www.w3.org/1998/Math/MathML";

/// Returns true if the given tag name (lowercase) is a void element that
/// never has content or an end tag.
pub(crate) fn is_void_element(tag: &str) -> bool {
    matches!(
        tag,
        "area"
            | "base"
            | "basefont"
            | "bgsound"
            | "br"
            | "col"
            | "embed"
            | "frame"
            | "hr"
            | "img"
            | "input"
            | "keygen"
            | "link"
            | "meta"
            | "param"
            | "source"
            | "track"
            | "wbr"
    )
}

/// Returns true if the content of `tag` is text that is neither parsed as
/// markup nor escaped when rendered.
pub(crate) fn is_raw_text_element(tag: &str) -> bool {
    matches!(
        tag,
        "script" | "style" | "xmp" | "iframe" | "noembed" | "noframes" | "noscript" | "plaintext"
    )
}

/// Returns true if `tag` holds text with character references but no markup.
fn is_rcdata_element(tag: &str) -> bool {
    matches!(tag, "textarea" | "title")
}

/// Returns true if opening `tag` implicitly closes an open `open_tag`.
fn auto_closes(open_tag: &str, tag: &str) -> bool {
    match open_tag {
        "p" => matches!(
            tag,
            "p" | "div"
                | "ul"
                | "ol"
                | "dl"
                | "pre"
                | "table"
                | "blockquote"
                | "address"
                | "h1"
                | "h2"
                | "h3"
                | "h4"
                | "h5"
                | "h6"
                | "hr"
                | "form"
                | "fieldset"
                | "section"
                | "article"
                | "aside"
                | "header"
                | "footer"
                | "nav"
                | "figure"
                | "figcaption"
                | "main"
                | "menu"
                | "details"
                | "summary"
        ),
        "li" => tag == "li",
        "dt" | "dd" => matches!(tag, "dt" | "dd"),
        "tr" => tag == "tr",
        "td" | "th" => matches!(tag, "td" | "th" | "tr"),
        "thead" | "tbody" => matches!(tag, "tbody" | "tfoot"),
        "tfoot" => tag == "tbody",
        "option" => matches!(tag, "option" | "optgroup"),
        "optgroup" => tag == "optgroup",
        "rt" | "rp" => matches!(tag, "rt" | "rp"),
        "colgroup" => matches!(tag, "thead" | "tbody" | "tfoot" | "tr" | "colgroup"),
        _ => false,
    }
}

/// Returns true if `tag` belongs in `<head>` when seen before any body content.
fn is_head_content_element(tag: &str) -> bool {
    matches!(
        tag,
        "title" | "meta" | "link" | "base" | "style" | "script" | "noscript" | "template"
    )
}

/// Restores the mixed-case spelling of SVG element names.
fn svg_tag_case(lower: &str) -> Option<&'static str> {
    Some(match lower {
        "animatemotion" => "animateMotion",
        "animatetransform" => "animateTransform",
        "clippath" => "clipPath",
        "feblend" => "feBlend",
        "fecolormatrix" => "feColorMatrix",
        "fecomposite" => "feComposite",
        "fedropshadow" => "feDropShadow",
        "feflood" => "feFlood",
        "fegaussianblur" => "feGaussianBlur",
        "feimage" => "feImage",
        "femerge" => "feMerge",
        "femergenode" => "feMergeNode",
        "feoffset" => "feOffset",
        "feturbulence" => "feTurbulence",
        "foreignobject" => "foreignObject",
        "lineargradient" => "linearGradient",
        "radialgradient" => "radialGradient",
        "textpath" => "textPath",
        _ => return None,
    })
}

/// Restores the mixed-case spelling of SVG attribute names.
fn svg_attribute_case(lower: &str) -> Option<&'static str> {
    Some(match lower {
        "attributename" => "attributeName",
        "basefrequency" => "baseFrequency",
        "calcmode" => "calcMode",
        "clippathunits" => "clipPathUnits",
        "filterunits" => "filterUnits",
        "gradienttransform" => "gradientTransform",
        "gradientunits" => "gradientUnits",
        "keysplines" => "keySplines",
        "keytimes" => "keyTimes",
        "lengthadjust" => "lengthAdjust",
        "markerheight" => "markerHeight",
        "markerunits" => "markerUnits",
        "markerwidth" => "markerWidth",
        "maskcontentunits" => "maskContentUnits",
        "maskunits" => "maskUnits",
        "numoctaves" => "numOctaves",
        "pathlength" => "pathLength",
        "patterncontentunits" => "patternContentUnits",
        "patterntransform" => "patternTransform",
        "patternunits" => "patternUnits",
        "preserveaspectratio" => "preserveAspectRatio",
        "primitiveunits" => "primitiveUnits",
        "refx" => "refX",
        "refy" => "refY",
        "repeatcount" => "repeatCount",
        "repeatdur" => "repeatDur",
        "spreadmethod" => "spreadMethod",
        "startoffset" => "startOffset",
        "stddeviation" => "stdDeviation",
        "textlength" => "textLength",
        "viewbox" => "viewBox",
        _ => return None,
    })
}

/// Where a character reference appears; attribute values are stricter
/// about unterminated legacy names.
#[derive(Clone, Copy, PartialEq, Eq)]
enum RefContext {
    Text,
    Attribute,
}

/// Parses `input` into the children of `root`.
pub(crate) fn build(
    doc: &mut Document,
    root: NodeId,
    input: &str,
    options: &ParseOptions,
) -> Result<(), ParseError> {
    let input = input.strip_prefix('\u{FEFF}').unwrap_or(input);
    let warnings_before = doc.diagnostics.len();
    {
        let mut builder = TreeBuilder::new(doc, root, input, options);
        builder.run()?;
    }
    let warnings = doc.diagnostics.len() - warnings_before;
    if warnings > 0 {
        tracing::debug!(warnings, "recovered from malformed markup");
    }
    Ok(())
}

/// The builder state.
struct TreeBuilder<'a, 'd> {
    input: ParserInput<'a>,
    doc: &'d mut Document,
    root: NodeId,
    options: ParseOptions,
    /// Open elements with the name used for end-tag matching (lowercase in
    /// HTML mode).
    open_elements: Vec<(NodeId, String)>,
    namespaces: NamespaceResolver,
    fatal_error: Option<ParseError>,
}

impl<'a, 'd> TreeBuilder<'a, 'd> {
    fn new(doc: &'d mut Document, root: NodeId, input: &'a str, options: &ParseOptions) -> Self {
        let mut pi = ParserInput::new(input);
        pi.set_max_depth(options.max_depth);
        Self {
            input: pi,
            doc,
            root,
            options: options.clone(),
            open_elements: Vec::new(),
            namespaces: NamespaceResolver::new(),
            fatal_error: None,
        }
    }

    fn implies_structure(&self) -> bool {
        self.options.document && !self.options.xml
    }

    fn run(&mut self) -> Result<(), ParseError> {
        while !self.input.at_end() && self.fatal_error.is_none() {
            self.parse_node();
        }
        if let Some(mut err) = self.fatal_error.take() {
            err.diagnostics = self.doc.diagnostics.clone();
            return Err(err);
        }

        while let Some((_, tag)) = self.open_elements.pop() {
            if !matches!(tag.as_str(), "html" | "head" | "body") {
                self.push_warning(format!("unclosed element <{tag}> at end of input"));
            }
        }

        if self.implies_structure() {
            self.ensure_head();
            self.ensure_body();
            self.open_elements.clear();
        }
        Ok(())
    }

    fn parse_node(&mut self) {
        if self.input.peek() != Some(b'<') {
            self.parse_text();
            return;
        }
        if self.input.looking_at(b"<!--") {
            self.parse_comment();
        } else if self.input.looking_at(b"<![CDATA[") {
            self.parse_cdata();
        } else if self.input.looking_at(b"<!") {
            self.parse_directive();
        } else if self.input.looking_at(b"<?") {
            self.parse_processing_instruction();
        } else if self.input.looking_at(b"</") {
            if self.input.peek_at(2).is_some_and(|b| self.is_name_start(b)) {
                self.parse_end_tag();
            } else {
                self.push_warning("malformed end tag".to_string());
                self.skip_to_gt();
            }
        } else if self.input.peek_at(1).is_some_and(|b| self.is_name_start(b)) {
            self.parse_start_tag();
        } else {
            self.parse_text();
        }
    }

    fn is_name_start(&self, b: u8) -> bool {
        b.is_ascii_alphabetic() || (self.options.xml && (b == b'_' || b == b':' || b >= 0x80))
    }

    /// Returns true if the `<` at the current position opens markup.
    fn at_markup(&self) -> bool {
        match self.input.peek_at(1) {
            Some(b'!' | b'?') => true,
            Some(b'/') => self.input.peek_at(2).is_some_and(|b| self.is_name_start(b)),
            Some(b) => self.is_name_start(b),
            None => false,
        }
    }

    // --- Implied structure ---

    fn find_child(&self, parent: NodeId, tag: &str) -> Option<NodeId> {
        self.doc
            .element_children(parent)
            .find(|&id| self.doc.node_name(id) == Some(tag))
    }

    fn is_open(&self, tag: &str) -> bool {
        self.open_elements.iter().any(|(_, t)| t == tag)
    }

    fn new_html_element(&mut self, tag: &str) -> NodeId {
        self.doc.create_node(NodeKind::Element {
            name: tag.to_string(),
            namespace: Some(XHTML_NAMESPACE.to_string()),
            attributes: Vec::new(),
        })
    }

    /// Ensures an `<html>` element exists under the root and is open.
    fn ensure_html(&mut self) -> NodeId {
        let html = match self.find_child(self.root, "html") {
            Some(id) => id,
            None => {
                let id = self.new_html_element("html");
                self.doc.append_child(self.root, id);
                id
            }
        };
        if !self.is_open("html") {
            self.open_elements.insert(0, (html, "html".to_string()));
        }
        html
    }

    /// Ensures a `<head>` exists under `<html>`, before any `<body>`.
    fn ensure_head(&mut self) -> NodeId {
        let html = self.ensure_html();
        if let Some(head) = self.find_child(html, "head") {
            return head;
        }
        let head = self.new_html_element("head");
        match self.find_child(html, "body") {
            Some(body) => self.doc.insert_before(body, head),
            None => self.doc.append_child(html, head),
        }
        head
    }

    /// Ensures a `<body>` exists under `<html>` and is open.
    fn ensure_body(&mut self) -> NodeId {
        let html = self.ensure_html();
        let body = match self.find_child(html, "body") {
            Some(id) => id,
            None => {
                self.ensure_head();
                let id = self.new_html_element("body");
                self.doc.append_child(html, id);
                id
            }
        };
        if !self.is_open("body") {
            self.open_elements.push((body, "body".to_string()));
        }
        body
    }

    fn open_head(&mut self) {
        let head = self.ensure_head();
        if !self.is_open("head") {
            self.open_elements.push((head, "head".to_string()));
        }
    }

    fn close_head_if_open(&mut self) {
        if self.open_elements.last().is_some_and(|(_, t)| t == "head") {
            self.open_elements.pop();
        }
    }

    /// Merges attributes of a repeated structural tag into the existing node.
    fn merge_attributes(&mut self, id: NodeId, attrs: Vec<Attribute>) {
        if let NodeKind::Element { attributes, .. } = &mut self.doc.node_mut(id).kind {
            for attr in attrs {
                if !attributes.iter().any(|a| a.name == attr.name) {
                    attributes.push(attr);
                }
            }
        }
    }

    fn current_parent(&self) -> NodeId {
        self.open_elements
            .last()
            .map_or(self.root, |&(id, _)| id)
    }

    fn append(&mut self, kind: NodeKind) -> NodeId {
        let parent = self.current_parent();
        let id = self.doc.create_node(kind);
        self.doc.append_child(parent, id);
        id
    }

    fn pop_element(&mut self) {
        if self.open_elements.pop().is_some() {
            self.input.decrement_depth();
            if self.options.xml {
                self.namespaces.pop_scope();
            }
        }
    }

    fn in_foreign_content(&self) -> Option<&'static str> {
        self.open_elements.iter().rev().find_map(|(_, t)| match t.as_str() {
            "svg" => Some(SVG_NAMESPACE),
            "math" => Some(MATHML_NAMESPACE),
            _ => None,
        })
    }

    // --- Start tags ---

    fn parse_start_tag(&mut self) {
        self.input.advance(1); // '<'
        if let Err(e) = self.input.increment_depth() {
            self.fatal_error = Some(e);
            return;
        }
        let raw_name = self.parse_tag_name();
        let mut attributes = self.parse_attributes();
        self.input.skip_whitespace();

        let self_closing = self.input.looking_at(b"/>");
        if self_closing {
            self.input.advance(2);
        } else if self.input.peek() == Some(b'>') {
            self.input.advance(1);
        } else if !self.input.at_end() {
            self.push_warning(format!("expected '>' after tag <{raw_name}>"));
            self.skip_to_gt();
        }

        if self.options.xml {
            self.open_xml_element(raw_name, attributes, self_closing);
            return;
        }

        let tag = raw_name.to_ascii_lowercase();

        if self.implies_structure() && self.open_structural(&tag, &mut attributes) {
            self.input.decrement_depth();
            return;
        }

        self.handle_auto_close(&tag);

        if self.implies_structure() {
            if is_head_content_element(&tag) && !self.is_open("body") {
                self.open_head();
            } else {
                self.close_head_if_open();
                self.ensure_body();
            }
        }

        let foreign = match tag.as_str() {
            "svg" => Some(SVG_NAMESPACE),
            "math" => Some(MATHML_NAMESPACE),
            _ => self.in_foreign_content(),
        };
        let name = match foreign {
            Some(SVG_NAMESPACE) => svg_tag_case(&tag).map_or_else(|| tag.clone(), str::to_string),
            _ => tag.clone(),
        };
        if foreign == Some(SVG_NAMESPACE) {
            for attr in &mut attributes {
                if let Some(fixed) = svg_attribute_case(&attr.name) {
                    attr.name = fixed.to_string();
                }
            }
        }

        let id = self.append(NodeKind::Element {
            name,
            namespace: Some(foreign.unwrap_or(XHTML_NAMESPACE).to_string()),
            attributes,
        });

        if is_void_element(&tag) || (self_closing && foreign.is_some()) {
            self.input.decrement_depth();
            return;
        }

        self.open_elements.push((id, tag.clone()));
        if foreign.is_some() {
            return;
        }
        if tag == "plaintext" {
            let mut content = String::new();
            while !self.input.at_end() {
                content.push(self.input.next_char_lossy());
            }
            if !content.is_empty() {
                self.append(NodeKind::text(content));
            }
        } else if is_raw_text_element(&tag) {
            self.parse_raw_text(&tag, false);
            self.pop_element();
        } else if is_rcdata_element(&tag) {
            self.parse_raw_text(&tag, self.options.decode_entities);
            self.pop_element();
        }
    }

    /// Handles `<html>`, `<head>` and `<body>` in document mode. Returns
    /// true if the tag was absorbed into an implied element.
    fn open_structural(&mut self, tag: &str, attributes: &mut Vec<Attribute>) -> bool {
        let attrs = std::mem::take(attributes);
        match tag {
            "html" => {
                let html = self.ensure_html();
                self.merge_attributes(html, attrs);
            }
            "head" if !self.is_open("body") => {
                self.open_head();
                let head = self.ensure_head();
                self.merge_attributes(head, attrs);
            }
            "body" => {
                self.close_head_if_open();
                let body = self.ensure_body();
                self.merge_attributes(body, attrs);
            }
            "head" => self.push_warning("<head> inside <body> ignored".to_string()),
            _ => {
                *attributes = attrs;
                return false;
            }
        }
        true
    }

    fn open_xml_element(&mut self, name: String, attributes: Vec<Attribute>, self_closing: bool) {
        self.namespaces.push_scope();
        for attr in &attributes {
            if let Some(prefix) = xmlns_binding(&attr.name) {
                self.namespaces
                    .bind(prefix.map(str::to_string), attr.value.clone());
            }
        }
        let (prefix, _) = split_qname(&name);
        let namespace = self.namespaces.resolve(prefix).map(str::to_string);
        if prefix.is_some_and(|p| p != "xmlns") && namespace.is_none() {
            self.push_warning(format!("unbound namespace prefix in <{name}>"));
        }

        let id = self.append(NodeKind::Element {
            name: name.clone(),
            namespace,
            attributes,
        });

        if self_closing {
            self.namespaces.pop_scope();
            self.input.decrement_depth();
        } else {
            self.open_elements.push((id, name));
        }
    }

    fn handle_auto_close(&mut self, new_tag: &str) {
        while self
            .open_elements
            .last()
            .is_some_and(|(_, open)| auto_closes(open, new_tag))
        {
            self.pop_element();
        }
    }

    // --- End tags ---

    fn parse_end_tag(&mut self) {
        self.input.advance(2); // '</'
        let raw_name = self.parse_tag_name();
        self.skip_to_gt();

        let tag = if self.options.xml {
            raw_name
        } else {
            raw_name.to_ascii_lowercase()
        };

        if !self.options.xml && is_void_element(&tag) {
            self.push_warning(format!("end tag for void element </{tag}> ignored"));
            return;
        }
        if self.implies_structure() {
            match tag.as_str() {
                "html" | "body" => return,
                "head" => {
                    self.close_head_if_open();
                    return;
                }
                _ => {}
            }
        }

        let Some(idx) = self.open_elements.iter().rposition(|(_, t)| *t == tag) else {
            self.push_warning(format!("stray end tag </{tag}>"));
            return;
        };
        // Never close the implied structure from a nested end tag.
        if self.implies_structure()
            && self.open_elements[idx + 1..]
                .iter()
                .any(|(_, t)| matches!(t.as_str(), "html" | "head" | "body"))
        {
            self.push_warning(format!("stray end tag </{tag}>"));
            return;
        }
        while self.open_elements.len() > idx {
            if let Some((_, open)) = self.open_elements.last() {
                if *open != tag {
                    let msg = format!("implicitly closing <{open}> before </{tag}>");
                    self.push_warning(msg);
                }
            }
            self.pop_element();
        }
    }

    // --- Attributes ---

    fn parse_attributes(&mut self) -> Vec<Attribute> {
        let mut attributes: Vec<Attribute> = Vec::new();
        loop {
            self.input.skip_whitespace();
            if self.input.at_end()
                || self.input.peek() == Some(b'>')
                || self.input.looking_at(b"/>")
            {
                break;
            }
            let name = self.parse_attr_name();
            if name.is_empty() {
                self.input.advance(1);
                continue;
            }
            let name = if self.options.xml {
                name
            } else {
                name.to_ascii_lowercase()
            };

            self.input.skip_whitespace();
            let value = if self.input.peek() == Some(b'=') {
                self.input.advance(1);
                self.input.skip_whitespace();
                self.parse_attr_value()
            } else {
                String::new()
            };

            if attributes.iter().any(|a| a.name == name) {
                self.push_warning(format!("duplicate attribute {name} ignored"));
            } else {
                attributes.push(Attribute::new(name, value));
            }
        }
        attributes
    }

    fn parse_attr_name(&mut self) -> String {
        // A leading '=' or '/' is part of a malformed name rather than a separator.
        let first = self.input.peek();
        let start = self.input.pos();
        if matches!(first, Some(b'=')) {
            self.input.advance(1);
        }
        while let Some(b) = self.input.peek() {
            if matches!(
                b,
                b' ' | b'\t' | b'\r' | b'\n' | b'\x0C' | b'=' | b'>' | b'/' | b'<' | b'"' | b'\''
            ) {
                break;
            }
            self.input.advance(1);
        }
        self.input.slice_str(start, self.input.pos())
    }

    fn parse_attr_value(&mut self) -> String {
        let mut value = String::new();
        match self.input.peek() {
            Some(quote @ (b'"' | b'\'')) => {
                self.input.advance(1);
                while !self.input.at_end() {
                    match self.input.peek() {
                        Some(b) if b == quote => {
                            self.input.advance(1);
                            break;
                        }
                        Some(b'&') => self.push_reference(&mut value, RefContext::Attribute),
                        _ => value.push(self.input.next_char_lossy()),
                    }
                }
            }
            _ => {
                while let Some(b) = self.input.peek() {
                    match b {
                        b' ' | b'\t' | b'\r' | b'\n' | b'\x0C' | b'>' => break,
                        b'/' if self.input.peek_at(1) == Some(b'>') => break,
                        b'&' => self.push_reference(&mut value, RefContext::Attribute),
                        _ => value.push(self.input.next_char_lossy()),
                    }
                }
            }
        }
        value
    }

    fn parse_tag_name(&mut self) -> String {
        self.input.take_while(|b| {
            b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b':' | b'.') || b >= 0x80
        })
    }

    // --- Character data ---

    fn parse_text(&mut self) {
        let mut text = String::new();
        // The first '<' can only be here when it does not open markup.
        if self.input.peek() == Some(b'<') {
            self.input.advance(1);
            text.push('<');
        }
        while let Some(b) = self.input.peek() {
            match b {
                b'<' if self.at_markup() => break,
                b'&' => self.push_reference(&mut text, RefContext::Text),
                _ => text.push(self.input.next_char_lossy()),
            }
        }
        self.append_text(text);
    }

    fn append_text(&mut self, text: String) {
        if text.is_empty() {
            return;
        }
        if self.implies_structure() {
            let blank = text.chars().all(|c| c.is_ascii_whitespace());
            let top = self.open_elements.last().map(|(_, t)| t.as_str());
            match (blank, top) {
                (true, None | Some("html")) => return,
                (false, None | Some("html" | "head")) => {
                    self.close_head_if_open();
                    self.ensure_body();
                }
                _ => {}
            }
        }
        // Adjacent text (split by a dropped tag) is merged.
        let parent = self.current_parent();
        if let Some(last) = self.doc.last_child(parent) {
            if let NodeKind::Text { content } = &mut self.doc.node_mut(last).kind {
                content.push_str(&text);
                return;
            }
        }
        self.append(NodeKind::text(text));
    }

    /// Reads the content of a raw-text or RCDATA element up to its end tag.
    fn parse_raw_text(&mut self, tag: &str, decode: bool) {
        let end_tag = format!("</{tag}");
        let mut content = String::new();
        while !self.input.at_end() {
            if self.input.looking_at_ci(end_tag.as_bytes()) {
                let after = self.input.peek_at(end_tag.len());
                if matches!(
                    after,
                    None | Some(b'>' | b'/' | b' ' | b'\t' | b'\n' | b'\r' | b'\x0C')
                ) {
                    break;
                }
            }
            if decode && self.input.peek() == Some(b'&') {
                self.push_reference(&mut content, RefContext::Text);
            } else {
                content.push(self.input.next_char_lossy());
            }
        }
        if !content.is_empty() {
            self.append(NodeKind::text(content));
        }
        if !self.input.at_end() {
            self.skip_to_gt();
        }
    }

    fn parse_cdata(&mut self) {
        if !self.options.xml {
            // HTML has no CDATA outside foreign content; it is a bogus comment.
            self.input.advance(2);
            let (content, _) = self.input.take_until(b">");
            self.input.advance(1);
            self.append(NodeKind::Comment { content });
            return;
        }
        self.input.advance(9); // '<![CDATA['
        let (content, terminated) = self.input.take_until(b"]]>");
        if terminated {
            self.input.advance(3);
        } else {
            self.push_warning("unterminated CDATA section".to_string());
        }
        self.append(NodeKind::CData { content });
    }

    fn parse_comment(&mut self) {
        self.input.advance(4); // '<!--'

        // Abrupt closings: <!--> and <!--->
        if self.input.peek() == Some(b'>') || self.input.looking_at(b"->") {
            self.skip_to_gt();
            self.append(NodeKind::Comment {
                content: String::new(),
            });
            return;
        }

        let mut content = String::new();
        loop {
            if self.input.at_end() {
                self.push_warning("unterminated comment".to_string());
                break;
            }
            if self.input.looking_at(b"-->") {
                self.input.advance(3);
                break;
            }
            if self.input.looking_at(b"--!>") {
                self.input.advance(4);
                break;
            }
            content.push(self.input.next_char_lossy());
        }
        self.append(NodeKind::Comment { content });
    }

    /// `<!DOCTYPE ...>` and any other `<!...>` declaration.
    fn parse_directive(&mut self) {
        if self.implies_structure() && !self.open_elements.is_empty() {
            self.push_warning("misplaced declaration ignored".to_string());
            self.skip_to_gt();
            return;
        }
        self.input.advance(1); // '<'
        let (data, terminated) = self.input.take_until(b">");
        if terminated {
            self.input.advance(1);
        }
        let name = directive_name(&data);
        self.append(NodeKind::Directive { name, data });
    }

    fn parse_processing_instruction(&mut self) {
        self.input.advance(1); // '<'
        let data = if self.options.xml {
            let (mut data, terminated) = self.input.take_until(b"?>");
            if terminated {
                self.input.advance(2);
                data.push('?');
            } else {
                self.push_warning("unterminated processing instruction".to_string());
            }
            data
        } else {
            let (data, terminated) = self.input.take_until(b">");
            if terminated {
                self.input.advance(1);
            }
            data
        };
        let name = directive_name(&data);
        self.append(NodeKind::Directive { name, data });
    }

    // --- Character references ---

    /// Decodes the reference at `&` into `out`, or copies a bare `&`.
    fn push_reference(&mut self, out: &mut String, context: RefContext) {
        if !self.options.decode_entities {
            out.push(self.input.next_char_lossy());
            return;
        }
        let saved = self.input.save_position();
        self.input.advance(1); // '&'

        if self.input.peek() == Some(b'#') {
            self.input.advance(1);
            if let Some(ch) = self.parse_numeric_reference() {
                out.push(ch);
                return;
            }
            self.input.restore_position(saved);
            self.input.advance(1);
            out.push('&');
            return;
        }

        let name = self.input.take_while(|b| b.is_ascii_alphanumeric());
        if name.is_empty() {
            out.push('&');
            return;
        }

        if self.input.peek() == Some(b';') {
            let value = if self.options.xml {
                lookup_xml_entity(&name)
            } else {
                lookup_entity(&name)
            };
            if let Some(value) = value {
                self.input.advance(1);
                out.push_str(value);
                return;
            }
            self.push_warning(format!("unknown entity reference &{name};"));
        } else if !self.options.xml {
            if let Some(consumed) = self.legacy_prefix(&name, context) {
                self.input.restore_position(saved);
                self.input.advance(1 + consumed.len());
                self.push_warning(format!("entity reference &{consumed} missing semicolon"));
                out.push_str(lookup_entity(consumed).unwrap_or_default());
                return;
            }
        }

        self.input.restore_position(saved);
        self.input.advance(1);
        out.push('&');
    }

    /// Finds the longest legacy entity name that prefixes `name`.
    fn legacy_prefix<'n>(&self, name: &'n str, context: RefContext) -> Option<&'n str> {
        if context == RefContext::Attribute {
            // In attributes only a complete name not followed by '=' counts.
            let next = self.input.peek();
            return (is_legacy_entity(name) && next != Some(b'=')).then_some(name);
        }
        (1..=name.len())
            .rev()
            .map(|len| &name[..len])
            .find(|prefix| is_legacy_entity(prefix))
    }

    /// Parses the digits of `&#...;` (after the `#`).
    fn parse_numeric_reference(&mut self) -> Option<char> {
        let hex = matches!(self.input.peek(), Some(b'x' | b'X'));
        if hex {
            self.input.advance(1);
        }
        let digits = if hex {
            self.input.take_while(|b| b.is_ascii_hexdigit())
        } else {
            self.input.take_while(|b| b.is_ascii_digit())
        };
        if digits.is_empty() {
            return None;
        }
        if self.input.peek() == Some(b';') {
            self.input.advance(1);
        } else if self.options.xml {
            return None;
        } else {
            self.push_warning("numeric character reference missing semicolon".to_string());
        }
        let value = u32::from_str_radix(&digits, if hex { 16 } else { 10 }).unwrap_or(u32::MAX);
        Some(match value {
            0 => '\u{FFFD}',
            0x80..=0x9F if !self.options.xml => windows_1252_char(value),
            _ => char::from_u32(value).unwrap_or('\u{FFFD}'),
        })
    }

    // --- Helpers ---

    fn skip_to_gt(&mut self) {
        while let Some(b) = self.input.peek() {
            self.input.advance(1);
            if b == b'>' {
                return;
            }
        }
    }

    fn push_warning(&mut self, message: String) {
        if self.options.no_warnings {
            return;
        }
        self.doc.diagnostics.push(ParseDiagnostic {
            severity: ErrorSeverity::Warning,
            message,
            location: self.input.location(),
        });
    }
}

/// Derives the lowercased directive name (`!doctype`, `?xml`) from its data.
fn directive_name(data: &str) -> String {
    let sigil_len = usize::from(data.starts_with(['!', '?']));
    let end = data[sigil_len..]
        .find(|c: char| c.is_ascii_whitespace() || c == '?' || c == '>')
        .map_or(data.len(), |i| i + sigil_len);
    data[..end].to_ascii_lowercase()
}

/// Maps C1 control references to the characters browsers substitute.
fn windows_1252_char(value: u32) -> char {
    const TABLE: [char; 32] = [
        '\u{20AC}', '\u{81}', '\u{201A}', '\u{192}', '\u{201E}', '\u{2026}', '\u{2020}',
        '\u{2021}', '\u{2C6}', '\u{2030}', '\u{160}', '\u{2039}', '\u{152}', '\u{8D}', '\u{17D}',
        '\u{8F}', '\u{90}', '\u{2018}', '\u{2019}', '\u{201C}', '\u{201D}', '\u{2022}',
        '\u{2013}', '\u{2014}', '\u{2DC}', '\u{2122}', '\u{161}', '\u{203A}', '\u{153}',
        '\u{9D}', '\u{17E}', '\u{178}',
    ];
    TABLE[(value - 0x80) as usize]
}
