//! Qualified name handling for XML mode.
//!
//! A qualified name is `prefix:local` or just `local`. Only the first colon
//! separates the prefix.

/// Splits a qualified name into its prefix and local part.
///
/// # Examples
///
/// ```
/// use quarry::util::qname::split_qname;
///
/// assert_eq!(split_qname("svg:rect"), (Some("svg"), "rect"));
/// assert_eq!(split_qname("div"), (None, "div"));
/// ```
#[must_use]
pub fn split_qname(qname: &str) -> (Option<&str>, &str) {
    match qname.split_once(':') {
        Some((prefix, local)) => (Some(prefix), local),
        None => (None, qname),
    }
}

/// Returns the namespace prefix bound by an `xmlns` attribute name.
///
/// `xmlns` binds the default namespace (`Some(None)`), `xmlns:p` binds `p`
/// (`Some(Some("p"))`), anything else is not a declaration (`None`).
#[must_use]
pub fn xmlns_binding(attr_name: &str) -> Option<Option<&str>> {
    if attr_name == "xmlns" {
        return Some(None);
    }
    attr_name.strip_prefix("xmlns:").map(Some)
}
