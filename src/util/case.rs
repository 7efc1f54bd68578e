//! Conversions between `data-*` attribute names and dataset keys.

/// Converts a hyphenated name to camelCase: `foo-bar` becomes `fooBar`.
///
/// `.`, `_` and `-` all act as separators, and the character after a
/// separator is upper-cased.
#[must_use]
pub fn camel_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut chars = name.chars().peekable();
    while let Some(c) = chars.next() {
        if matches!(c, '.' | '_' | '-') {
            match chars.peek() {
                Some(&next) if next.is_ascii_alphanumeric() || next == '_' => {
                    out.push(next.to_ascii_uppercase());
                    chars.next();
                }
                // A trailing separator is dropped.
                None => {}
                Some(_) => out.push(c),
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// Converts a camelCase key to its hyphenated form: `fooBar` becomes
/// `foo-bar`.
#[must_use]
pub fn css_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for c in name.chars() {
        if c.is_ascii_uppercase() {
            out.push('-');
            out.push(c.to_ascii_lowercase());
        } else {
            out.extend(c.to_lowercase());
        }
    }
    out
}
