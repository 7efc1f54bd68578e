//! HTML renderer.
//!
//! - Void elements have no end tag (`<br>`)
//! - Other empty elements are written out in full (`<p></p>`), except inside
//!   `svg`/`math`, where they self-close
//! - Attributes with an empty value are written bare (`<input checked>`)
//! - Raw text elements (script, style, ...) are not escaped
//! - Directives are written back verbatim

use crate::parser::{is_raw_text_element, is_void_element};
use crate::tree::{Document, NodeId, NodeKind};

/// Renders a node to HTML.
///
/// `escape` controls entity escaping of text and attribute values.
pub(crate) fn write_node(doc: &Document, id: NodeId, out: &mut String, escape: bool) {
    let foreign = doc
        .ancestors(id)
        .skip(1)
        .any(|a| matches!(doc.node_name(a), Some("svg" | "math")));
    let raw_parent = doc
        .parent(id)
        .and_then(|p| doc.node_name(p))
        .is_some_and(is_raw_text_element);
    write(doc, id, out, escape, foreign, raw_parent);
}

fn write(doc: &Document, id: NodeId, out: &mut String, escape: bool, foreign: bool, raw: bool) {
    match &doc.node(id).kind {
        NodeKind::Document => {
            for child in doc.children(id) {
                write(doc, child, out, escape, foreign, false);
            }
        }
        NodeKind::Element {
            name, attributes, ..
        } => {
            let foreign = foreign || name == "svg" || name == "math";
            out.push('<');
            out.push_str(name);
            for attr in attributes {
                out.push(' ');
                out.push_str(&attr.name);
                if attr.value.is_empty() && !foreign {
                    continue;
                }
                out.push_str("=\"");
                if escape {
                    write_escaped_attr(out, &attr.value);
                } else {
                    out.push_str(&attr.value);
                }
                out.push('"');
            }

            if foreign && doc.first_child(id).is_none() {
                out.push_str("/>");
                return;
            }
            out.push('>');
            if !foreign && is_void_element(name) {
                return;
            }

            let raw = !foreign && is_raw_text_element(name);
            for child in doc.children(id) {
                write(doc, child, out, escape, foreign, raw);
            }

            out.push_str("</");
            out.push_str(name);
            out.push('>');
        }
        NodeKind::Text { content } => {
            if escape && !raw {
                write_escaped_text(out, content);
            } else {
                out.push_str(content);
            }
        }
        NodeKind::CData { content } => {
            out.push_str("<![CDATA[");
            out.push_str(content);
            out.push_str("]]>");
        }
        NodeKind::Comment { content } => {
            out.push_str("<!--");
            out.push_str(content);
            out.push_str("-->");
        }
        NodeKind::Directive { data, .. } => {
            out.push('<');
            out.push_str(data);
            out.push('>');
        }
    }
}

/// Escapes text content: `&`, `<`, `>` and no-break space.
pub(crate) fn write_escaped_text(out: &mut String, text: &str) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\u{A0}' => out.push_str("&nbsp;"),
            _ => out.push(ch),
        }
    }
}

/// Escapes a double-quoted attribute value: `&`, `"` and no-break space.
pub(crate) fn write_escaped_attr(out: &mut String, value: &str) {
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\u{A0}' => out.push_str("&nbsp;"),
            _ => out.push(ch),
        }
    }
}
