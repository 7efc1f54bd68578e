//! XML renderer.
//!
//! Empty elements self-close, attribute values are always quoted, and
//! escaping produces pure ASCII output: the five predefined entities plus
//! hexadecimal character references for everything outside ASCII.

use crate::tree::{Document, NodeId, NodeKind};
use std::fmt::Write;

/// Renders a node to XML.
pub(crate) fn write_node(doc: &Document, id: NodeId, out: &mut String, escape: bool) {
    match &doc.node(id).kind {
        NodeKind::Document => {
            for child in doc.children(id) {
                write_node(doc, child, out, escape);
            }
        }
        NodeKind::Element {
            name, attributes, ..
        } => {
            out.push('<');
            out.push_str(name);
            for attr in attributes {
                out.push(' ');
                out.push_str(&attr.name);
                out.push_str("=\"");
                write_text(out, &attr.value, escape);
                out.push('"');
            }
            if doc.first_child(id).is_none() {
                out.push_str("/>");
                return;
            }
            out.push('>');
            for child in doc.children(id) {
                write_node(doc, child, out, escape);
            }
            out.push_str("</");
            out.push_str(name);
            out.push('>');
        }
        NodeKind::Text { content } => write_text(out, content, escape),
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

fn write_text(out: &mut String, text: &str, escape: bool) {
    if !escape {
        out.push_str(text);
        return;
    }
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c if c.is_ascii() => out.push(c),
            c => {
                let _ = write!(out, "&#x{:x};", u32::from(c));
            }
        }
    }
}
