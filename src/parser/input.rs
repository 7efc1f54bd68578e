//! Low-level input handling for the markup parser.
//!
//! [`ParserInput`] wraps the raw byte stream and tracks position (line,
//! column, byte offset) and nesting depth. The tree
//! builder in [`markup`](super::markup) composes it rather than indexing the
//! input directly.
//!
//! # Limits
//!
//! Nesting depth is capped to keep the recursive algorithms that walk the
//! resulting tree (rendering, cloning, selector matching) well away from
//! stack exhaustion.

use crate::error::{ParseError, SourceLocation};

// -------------------------------------------------------------------------
// Defaults
// -------------------------------------------------------------------------

/// Default maximum element nesting depth.
pub(crate) const DEFAULT_MAX_DEPTH: u32 = 512;

// -------------------------------------------------------------------------
// Position checkpointing (for backtracking)
// -------------------------------------------------------------------------

/// A snapshot of the input position.
///
/// Obtained via [`ParserInput::save_position`] and restored via
/// [`ParserInput::restore_position`] when a speculative parse (a character
/// reference, a CDATA opener) turns out not to match.
#[derive(Debug, Clone, Copy)]
pub(crate) struct SavedPosition {
    pos: usize,
    line: u32,
    column: u32,
}

// -------------------------------------------------------------------------
// ParserInput
// -------------------------------------------------------------------------

/// Shared low-level input state.
pub(crate) struct ParserInput<'a> {
    /// The input bytes (valid UTF-8).
    input: &'a [u8],

    /// Current byte offset in `input`.
    pos: usize,

    /// Current line number (1-based).
    line: u32,

    /// Current column number (1-based).
    column: u32,

    /// Current element nesting depth.
    depth: u32,

    /// Maximum allowed nesting depth.
    max_depth: u32,
}

impl<'a> ParserInput<'a> {
    /// Creates a new `ParserInput` with default limits.
    pub fn new(input: &'a str) -> Self {
        Self {
            input: input.as_bytes(),
            pos: 0,
            line: 1,
            column: 1,
            depth: 0,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Sets the maximum nesting depth.
    pub fn set_max_depth(&mut self, max: u32) {
        self.max_depth = max;
    }

    // -- Depth tracking --

    /// Increments the nesting depth. Returns an error if the limit is exceeded.
    pub fn increment_depth(&mut self) -> Result<(), ParseError> {
        self.depth += 1;
        if self.depth > self.max_depth {
            return Err(self.fatal(format!(
                "maximum nesting depth exceeded ({})",
                self.max_depth
            )));
        }
        Ok(())
    }

    /// Decrements the nesting depth (saturating at 0).
    pub fn decrement_depth(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    // -- Position queries --

    /// Returns the current source location.
    pub fn location(&self) -> SourceLocation {
        SourceLocation {
            line: self.line,
            column: self.column,
            byte_offset: self.pos,
        }
    }

    /// Returns `true` if all input has been consumed.
    pub fn at_end(&self) -> bool {
        self.pos >= self.input.len()
    }

    /// Returns the current byte offset.
    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Returns the input between two byte offsets as text.
    pub fn slice_str(&self, start: usize, end: usize) -> String {
        String::from_utf8_lossy(&self.input[start..end]).into_owned()
    }

    /// Saves the current position so it can be restored later.
    pub fn save_position(&self) -> SavedPosition {
        SavedPosition {
            pos: self.pos,
            line: self.line,
            column: self.column,
        }
    }

    /// Restores a previously saved position.
    pub fn restore_position(&mut self, saved: SavedPosition) {
        self.pos = saved.pos;
        self.line = saved.line;
        self.column = saved.column;
    }

    // -- Peek operations --

    /// Returns the byte at the current position without consuming it.
    pub fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    /// Returns the byte at `current_position + offset` without consuming.
    pub fn peek_at(&self, offset: usize) -> Option<u8> {
        self.input.get(self.pos + offset).copied()
    }

    /// Returns the character at the current position without consuming it.
    pub fn peek_char(&self) -> Option<char> {
        if self.at_end() {
            return None;
        }
        let end = (self.pos + 4).min(self.input.len());
        let window = &self.input[self.pos..end];
        match std::str::from_utf8(window) {
            Ok(s) => s.chars().next(),
            Err(e) => std::str::from_utf8(&window[..e.valid_up_to()])
                .ok()
                .and_then(|s| s.chars().next()),
        }
    }

    // -- Advance operations --

    /// Advances the position by `count` bytes, updating line/column.
    pub fn advance(&mut self, count: usize) {
        for _ in 0..count {
            if self.pos < self.input.len() {
                if self.input[self.pos] == b'\n' {
                    self.line += 1;
                    self.column = 1;
                } else if self.input[self.pos] & 0xC0 != 0x80 {
                    self.column += 1;
                }
                self.pos += 1;
            }
        }
    }

    /// Advances by one UTF-8 character, updating line/column.
    pub fn advance_char(&mut self, ch: char) {
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        self.pos += ch.len_utf8();
    }

    /// Reads the next character with `\r\n` and lone `\r` normalized to `\n`.
    ///
    /// Returns `'\0'` at the end of input and U+FFFD for a byte that does not
    /// start a valid UTF-8 sequence.
    pub fn next_char_lossy(&mut self) -> char {
        if self.at_end() {
            return '\0';
        }
        if let Some(ch) = self.peek_char() {
            self.advance_char(ch);
            if ch == '\r' {
                if self.peek() == Some(b'\n') {
                    self.advance(1);
                }
                return '\n';
            }
            ch
        } else {
            self.advance(1);
            '\u{FFFD}'
        }
    }

    // -- Lookahead --

    /// Returns `true` if the remaining input starts with `s`.
    pub fn looking_at(&self, s: &[u8]) -> bool {
        self.input[self.pos..].starts_with(s)
    }

    /// Case-insensitive (ASCII) lookahead check.
    pub fn looking_at_ci(&self, expected: &[u8]) -> bool {
        if self.pos + expected.len() > self.input.len() {
            return false;
        }
        self.input[self.pos..self.pos + expected.len()].eq_ignore_ascii_case(expected)
    }

    // -- Whitespace --

    /// Skips whitespace characters. Returns `true` if any were consumed.
    pub fn skip_whitespace(&mut self) -> bool {
        let start = self.pos;
        while let Some(b) = self.peek() {
            if matches!(b, b' ' | b'\t' | b'\r' | b'\n' | b'\x0C') {
                self.advance(1);
            } else {
                break;
            }
        }
        self.pos > start
    }

    // -- Take while --

    /// Consumes bytes while `pred` returns `true` and returns them as text.
    pub fn take_while(&mut self, pred: impl Fn(u8) -> bool) -> String {
        let start = self.pos;
        while let Some(b) = self.peek() {
            if pred(b) {
                self.advance(1);
            } else {
                break;
            }
        }
        self.slice_str(start, self.pos)
    }

    /// Consumes input up to (not including) `delimiter`, or to the end.
    ///
    /// Returns the consumed text and whether the delimiter was found. Line
    /// endings are normalized to `\n`.
    pub fn take_until(&mut self, delimiter: &[u8]) -> (String, bool) {
        let mut out = String::new();
        while !self.at_end() {
            if self.looking_at(delimiter) {
                return (out, true);
            }
            out.push(self.next_char_lossy());
        }
        (out, false)
    }

    // -- Error helpers --

    /// Creates a fatal `ParseError` at the current location.
    pub fn fatal(&self, message: impl Into<String>) -> ParseError {
        ParseError {
            message: message.into(),
            location: self.location(),
            diagnostics: Vec::new(),
        }
    }
}

// -------------------------------------------------------------------------
// Namespace resolver
// -------------------------------------------------------------------------

/// Namespace scopes for XML mode.
///
/// Maintains a stack of binding frames that mirrors element nesting. Each
/// frame holds the `xmlns` declarations introduced on that element.
pub(crate) struct NamespaceResolver {
    /// `(prefix, uri)` pairs per open element; `None` is the default namespace.
    stack: Vec<Vec<(Option<String>, String)>>,
}

/// The well-known XML namespace URI, pre-bound to the `xml` prefix.
pub(crate) const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

impl NamespaceResolver {
    /// Creates a new resolver with the `xml` prefix pre-bound.
    pub fn new() -> Self {
        let initial = vec![(Some("xml".to_string()), XML_NAMESPACE.to_string())];
        Self {
            stack: vec![initial],
        }
    }

    /// Pushes a new (empty) scope for an element.
    pub fn push_scope(&mut self) {
        self.stack.push(Vec::new());
    }

    /// Pops the current scope. The outermost scope is never popped.
    pub fn pop_scope(&mut self) {
        if self.stack.len() > 1 {
            self.stack.pop();
        }
    }

    /// Binds a prefix to a URI in the current scope.
    pub fn bind(&mut self, prefix: Option<String>, uri: String) {
        if let Some(frame) = self.stack.last_mut() {
            frame.push((prefix, uri));
        }
    }

    /// Resolves a prefix to its URI, innermost scope first.
    pub fn resolve(&self, prefix: Option<&str>) -> Option<&str> {
        for frame in self.stack.iter().rev() {
            for (p, uri) in frame.iter().rev() {
                if p.as_deref() == prefix {
                    // xmlns="" undeclares the default namespace
                    return (!uri.is_empty()).then_some(uri.as_str());
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_peek_and_advance() {
        let mut input = ParserInput::new("abc");
        assert_eq!(input.peek(), Some(b'a'));
        assert_eq!(input.peek_at(1), Some(b'b'));
        input.advance(1);
        assert_eq!(input.peek(), Some(b'b'));
        input.advance(2);
        assert!(input.at_end());
    }

    #[test]
    fn test_line_column_tracking() {
        let mut input = ParserInput::new("ab\ncd");
        input.advance(2);
        assert_eq!(input.location().column, 3);
        input.advance(1);
        assert_eq!(input.location().line, 2);
        assert_eq!(input.location().column, 1);
    }

    #[test]
    fn test_next_char_lossy_normalizes_cr() {
        let mut input = ParserInput::new("a\r\nb\rc");
        let chars: Vec<char> = (0..5).map(|_| input.next_char_lossy()).collect();
        assert_eq!(chars, vec!['a', '\n', 'b', '\n', 'c']);
        assert_eq!(input.next_char_lossy(), '\0');
    }

    #[test]
    fn test_peek_char_multibyte() {
        let mut input = ParserInput::new("é!");
        assert_eq!(input.peek_char(), Some('é'));
        assert_eq!(input.next_char_lossy(), 'é');
        assert_eq!(input.peek_char(), Some('!'));
    }

    #[test]
    fn test_depth_limit() {
        let mut input = ParserInput::new("");
        input.set_max_depth(2);
        assert!(input.increment_depth().is_ok());
        assert!(input.increment_depth().is_ok());
        let err = input.increment_depth().unwrap_err();
        assert!(err.message.contains("nesting depth"));
    }

    #[test]
    fn test_save_and_restore() {
        let mut input = ParserInput::new("&amp;x");
        let saved = input.save_position();
        input.advance(5);
        assert_eq!(input.peek(), Some(b'x'));
        input.restore_position(saved);
        assert_eq!(input.peek(), Some(b'&'));
    }

    #[test]
    fn test_take_until() {
        let mut input = ParserInput::new("abc-->rest");
        assert_eq!(input.take_until(b"-->"), ("abc".to_string(), true));
        let mut input = ParserInput::new("abc");
        assert_eq!(input.take_until(b"-->"), ("abc".to_string(), false));
    }

    #[test]
    fn test_looking_at_ci() {
        let input = ParserInput::new("<!DocType html>");
        assert!(input.looking_at_ci(b"<!doctype"));
        assert!(!input.looking_at(b"<!doctype"));
    }

    #[test]
    fn test_namespace_resolver() {
        let mut ns = NamespaceResolver::new();
        assert_eq!(ns.resolve(Some("xml")), Some(XML_NAMESPACE));
        assert_eq!(ns.resolve(None), None);

        ns.push_scope();
        ns.bind(None, "urn:a".to_string());
        ns.bind(Some("b".to_string()), "urn:b".to_string());
        assert_eq!(ns.resolve(None), Some("urn:a"));
        assert_eq!(ns.resolve(Some("b")), Some("urn:b"));

        ns.push_scope();
        ns.bind(None, String::new());
        assert_eq!(ns.resolve(None), None);

        ns.pop_scope();
        assert_eq!(ns.resolve(None), Some("urn:a"));
        ns.pop_scope();
        assert_eq!(ns.resolve(Some("b")), None);
    }
}
