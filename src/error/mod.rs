//! Error types and parse diagnostics.
//!
//! Every fallible public operation returns [`Result`], whose error is the
//! crate-wide [`Error`] enum. Selector failures carry the offending selector
//! text so that callers can surface them unchanged.
//!
//! The markup parser is tolerant: malformed input is recovered and recorded
//! as [`ParseDiagnostic`]s on the resulting [`Document`](crate::Document).
//! Only resource limits (nesting depth) abort a parse with a [`ParseError`].

use std::fmt;

/// Convenience alias used throughout the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// The error type for all fallible operations in this crate.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A CSS selector could not be parsed or uses unsupported syntax.
    #[error("invalid selector `{selector}`: {message}")]
    InvalidSelector {
        /// The selector text as given by the caller.
        selector: String,
        /// What went wrong, e.g. `Unknown pseudo-class :hover`.
        message: String,
    },

    /// An operation was called with an argument combination it cannot honor.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Markup could not be parsed.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// Byte input could not be decoded to text.
    #[error("encoding error: {0}")]
    Encoding(String),
}

impl Error {
    pub(crate) fn invalid_selector(selector: &str, message: impl Into<String>) -> Self {
        Self::InvalidSelector {
            selector: selector.to_string(),
            message: message.into(),
        }
    }
}

/// Severity level for a parse diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorSeverity {
    /// A non-fatal irregularity, e.g. a stray end tag.
    Warning,
    /// Malformed markup that was recovered from.
    Error,
}

impl fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Source location within the parsed markup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SourceLocation {
    /// 1-based line number.
    pub line: u32,
    /// 1-based column number (in characters, not bytes).
    pub column: u32,
    /// 0-based byte offset from the start of the input.
    pub byte_offset: usize,
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// A single diagnostic emitted while parsing.
#[derive(Debug, Clone)]
pub struct ParseDiagnostic {
    /// The severity of this diagnostic.
    pub severity: ErrorSeverity,
    /// Human-readable message.
    pub message: String,
    /// Where in the source this was detected.
    pub location: SourceLocation,
}

impl fmt::Display for ParseDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} at {}",
            self.severity, self.message, self.location
        )
    }
}

/// The error returned when parsing has to stop.
#[derive(Debug, Clone, thiserror::Error)]
#[error("parse error at {location}: {message}")]
pub struct ParseError {
    /// The primary error message.
    pub message: String,
    /// Where in the source the parser gave up.
    pub location: SourceLocation,
    /// Diagnostics collected before the failure.
    pub diagnostics: Vec<ParseDiagnostic>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_source_location_display() {
        let loc = SourceLocation {
            line: 10,
            column: 5,
            byte_offset: 42,
        };
        assert_eq!(loc.to_string(), "10:5");
    }

    #[test]
    fn test_parse_error_display() {
        let err = ParseError {
            message: "maximum nesting depth exceeded (256)".to_string(),
            location: SourceLocation {
                line: 1,
                column: 15,
                byte_offset: 14,
            },
            diagnostics: vec![],
        };
        assert_eq!(
            err.to_string(),
            "parse error at 1:15: maximum nesting depth exceeded (256)"
        );
    }

    #[test]
    fn test_parse_diagnostic_display() {
        let diag = ParseDiagnostic {
            severity: ErrorSeverity::Warning,
            message: "stray end tag </p>".to_string(),
            location: SourceLocation {
                line: 3,
                column: 10,
                byte_offset: 50,
            },
        };
        assert_eq!(diag.to_string(), "warning: stray end tag </p> at 3:10");
    }

    #[test]
    fn test_invalid_selector_display() {
        let err = Error::invalid_selector("li:hover", "Unknown pseudo-class :hover");
        assert_eq!(
            err.to_string(),
            "invalid selector `li:hover`: Unknown pseudo-class :hover"
        );
    }

    #[test]
    fn test_parse_error_converts() {
        let err: Error = ParseError {
            message: "test".to_string(),
            location: SourceLocation::default(),
            diagnostics: vec![],
        }
        .into();
        assert!(matches!(err, Error::Parse(_)));
        assert_eq!(err.to_string(), "parse error at 0:0: test");
    }
}
