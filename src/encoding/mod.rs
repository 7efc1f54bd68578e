//! Byte-input decoding.
//!
//! Turns raw markup bytes into a UTF-8 `String`, bridging to `encoding_rs`
//! for everything that is not already UTF-8.
//!
//! # Detection order
//!
//! 1. A byte order mark always wins.
//! 2. Otherwise an encoding label supplied by the caller.
//! 3. Otherwise the in-band declaration: `encoding="..."` in the XML
//!    declaration, or a `<meta charset>` / `<meta http-equiv>` within the
//!    first 1024 bytes of HTML.
//! 4. Otherwise UTF-8 when the bytes are valid UTF-8, and windows-1252 for
//!    HTML that is not.
//!
//! Malformed sequences are replaced with U+FFFD rather than rejected.

use crate::error::{Error, Result};
use encoding_rs::{Encoding, UTF_8, WINDOWS_1252};

/// How far into an HTML document `<meta>` declarations are looked for.
const PRESCAN_LIMIT: usize = 1024;

/// Looks up an encoding by WHATWG label (case-insensitive).
///
/// # Errors
///
/// Returns [`Error::Encoding`] if the label is unknown.
///
/// # Examples
///
/// ```
/// use quarry::encoding::encoding_for_label;
///
/// assert_eq!(encoding_for_label("latin1").unwrap().name(), "windows-1252");
/// assert!(encoding_for_label("no-such-charset").is_err());
/// ```
pub fn encoding_for_label(label: &str) -> Result<&'static Encoding> {
    Encoding::for_label(label.trim().as_bytes())
        .ok_or_else(|| Error::Encoding(format!("unsupported encoding: {label}")))
}

/// Decodes markup bytes, detecting the encoding as described in the module
/// docs. Returns the text and the encoding that was used.
///
/// # Errors
///
/// Returns [`Error::Encoding`] if `label` names an unknown encoding.
///
/// # Examples
///
/// ```
/// use quarry::encoding::decode;
///
/// let (text, enc) = decode(b"<p>caf\xe9</p>", false, None).unwrap();
/// assert_eq!(text, "<p>caf\u{e9}</p>");
/// assert_eq!(enc.name(), "windows-1252");
/// ```
pub fn decode(
    bytes: &[u8],
    xml: bool,
    label: Option<&str>,
) -> Result<(String, &'static Encoding)> {
    if let Some((encoding, bom_len)) = Encoding::for_bom(bytes) {
        return Ok((decode_with(&bytes[bom_len..], encoding), encoding));
    }
    if let Some(label) = label {
        let encoding = encoding_for_label(label)?;
        return Ok((decode_with(bytes, encoding), encoding));
    }

    let declared = if xml {
        xml_declared_encoding(bytes)
    } else {
        meta_declared_encoding(bytes)
    };
    // A UTF-16 label inside ASCII-compatible bytes cannot be right.
    let declared = declared
        .and_then(|l| Encoding::for_label(l.as_bytes()))
        .map(|e| if e.is_single_byte() || e == UTF_8 { e } else { UTF_8 });

    let encoding = match declared {
        Some(encoding) => encoding,
        None if xml || std::str::from_utf8(bytes).is_ok() => UTF_8,
        None => WINDOWS_1252,
    };
    tracing::debug!(encoding = encoding.name(), "decoding input");
    Ok((decode_with(bytes, encoding), encoding))
}

fn decode_with(bytes: &[u8], encoding: &'static Encoding) -> String {
    let (text, had_errors) = encoding.decode_without_bom_handling(bytes);
    if had_errors {
        tracing::warn!(
            encoding = encoding.name(),
            "malformed byte sequences replaced"
        );
    }
    text.into_owned()
}

/// Reads `encoding="..."` from a leading XML declaration.
fn xml_declared_encoding(bytes: &[u8]) -> Option<String> {
    let head = ascii_prefix(bytes, PRESCAN_LIMIT);
    let decl = head.strip_prefix("<?xml")?;
    let decl = &decl[..decl.find("?>")?];
    let after = &decl[decl.find("encoding")? + "encoding".len()..];
    let after = after.trim_start().strip_prefix('=')?.trim_start();
    quoted_value(after)
}

/// Finds a charset in the `<meta>` tags near the start of an HTML document.
fn meta_declared_encoding(bytes: &[u8]) -> Option<String> {
    let head = ascii_prefix(bytes, PRESCAN_LIMIT).to_ascii_lowercase();
    let mut rest = head.as_str();
    while let Some(start) = rest.find("<meta") {
        let tag = &rest[start..];
        let end = tag.find('>').unwrap_or(tag.len());
        let tag = &tag[..end];
        if let Some(charset) = charset_param(tag) {
            return Some(charset);
        }
        rest = &rest[start + end..];
    }
    None
}

/// Extracts `charset=...` from a meta tag, whether given directly or inside
/// a `content` attribute.
fn charset_param(tag: &str) -> Option<String> {
    let pos = tag.find("charset")?;
    let after = tag[pos + "charset".len()..].trim_start().strip_prefix('=')?;
    let after = after.trim_start();
    if let Some(value) = quoted_value(after) {
        return Some(value);
    }
    let end = after
        .find(|c: char| c.is_ascii_whitespace() || matches!(c, ';' | '"' | '\'' | '/' | '>'))
        .unwrap_or(after.len());
    (end > 0).then(|| after[..end].to_string())
}

fn quoted_value(s: &str) -> Option<String> {
    let quote = s.chars().next().filter(|&c| c == '"' || c == '\'')?;
    let body = &s[1..];
    let end = body.find(quote)?;
    Some(body[..end].trim().to_string())
}

/// Returns the longest ASCII prefix of `bytes`, at most `limit` bytes long.
fn ascii_prefix(bytes: &[u8], limit: usize) -> &str {
    let window = &bytes[..bytes.len().min(limit)];
    let end = window
        .iter()
        .position(|b| !b.is_ascii())
        .unwrap_or(window.len());
    // The slice is pure ASCII, so this cannot fail.
    std::str::from_utf8(&window[..end]).unwrap_or_default()
}
