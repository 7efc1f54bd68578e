//! Inline `style` attribute access.
//!
//! The `style` attribute is parsed into an ordered list of declarations.
//! Fragments without a usable `:` are glued onto the previous value with a
//! `;` instead of being dropped, so `a: b; c` round-trips as `a: b; c;`.

use std::fmt;

use super::Selection;

/// Ordered `property: value` pairs of an inline style.
///
/// ```
/// use quarry::selection::Declarations;
///
/// let mut decls = Declarations::parse("color: red; margin: 0");
/// decls.set("color", "blue");
/// decls.set("padding", "1px");
/// assert_eq!(decls.to_string(), "color: blue; margin: 0; padding: 1px;");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Declarations(Vec<(String, String)>);

impl Declarations {
    /// Parses the text of a `style` attribute.
    #[must_use]
    pub fn parse(style: &str) -> Self {
        let mut decls = Self::default();
        let style = style.trim();
        if style.is_empty() {
            return decls;
        }
        let mut last: Option<usize> = None;
        for part in style.split(';') {
            match part.find(':') {
                Some(colon) if colon > 0 && colon + 1 < part.len() => {
                    let key = part[..colon].trim();
                    let value = part[colon + 1..].trim();
                    last = Some(decls.upsert(key, value.to_string()));
                }
                _ => {
                    let trimmed = part.trim_end();
                    if let (false, Some(index)) = (trimmed.is_empty(), last) {
                        let value = &mut decls.0[index].1;
                        value.push(';');
                        value.push_str(trimmed);
                    }
                }
            }
        }
        decls
    }

    /// Value of `property`.
    #[must_use]
    pub fn get(&self, property: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == property)
            .map(|(_, v)| v.as_str())
    }

    /// Sets `property`. An existing property keeps its position; an empty
    /// value removes it.
    pub fn set(&mut self, property: &str, value: impl Into<String>) {
        let value = value.into();
        if value.is_empty() {
            self.remove(property);
        } else {
            self.upsert(property, value);
        }
    }

    /// Removes `property`. Returns its value if it was present.
    pub fn remove(&mut self, property: &str) -> Option<String> {
        let index = self.0.iter().position(|(k, _)| k == property)?;
        Some(self.0.remove(index).1)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates `(property, value)` pairs in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Property names in order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(k, _)| k.as_str())
    }

    fn upsert(&mut self, property: &str, value: String) -> usize {
        if let Some(index) = self.0.iter().position(|(k, _)| k == property) {
            self.0[index].1 = value;
            index
        } else {
            self.0.push((property.to_string(), value));
            self.0.len() - 1
        }
    }
}

impl fmt::Display for Declarations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (key, value)) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{key}: {value};")?;
        }
        Ok(())
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Declarations {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut decls = Self::default();
        for (k, v) in iter {
            decls.set(&k.into(), v);
        }
        decls
    }
}

impl Selection {
    /// Value of one inline style property of the first element.
    #[must_use]
    pub fn css(&self, property: &str) -> Option<String> {
        self.css_all()?.get(property).map(str::to_string)
    }

    /// The listed properties of the first element that are set.
    #[must_use]
    pub fn css_list(&self, properties: &[&str]) -> Option<Declarations> {
        let all = self.css_all()?;
        Some(
            properties
                .iter()
                .filter_map(|&p| all.get(p).map(|v| (p, v)))
                .collect(),
        )
    }

    /// All inline style properties of the first element; `None` if the
    /// selection is empty or starts with a non-element.
    #[must_use]
    pub fn css_all(&self) -> Option<Declarations> {
        let first = self.first_element()?;
        let doc = self.dom.document();
        Some(Declarations::parse(
            doc.attribute(first, "style").unwrap_or_default(),
        ))
    }

    /// Sets a style property on every element. An empty value removes it.
    #[must_use]
    pub fn set_css(&self, property: &str, value: &str) -> Selection {
        self.set_css_with(property, |_, _| Some(value.to_string()))
    }

    /// Sets a style property from a callback receiving the index and the
    /// current value. Returning `None` leaves the property unchanged.
    pub fn set_css_with(
        &self,
        property: &str,
        mut f: impl FnMut(usize, Option<String>) -> Option<String>,
    ) -> Selection {
        for (i, id) in self.elements().into_iter().enumerate() {
            let mut decls = {
                let doc = self.dom.document();
                Declarations::parse(doc.attribute(id, "style").unwrap_or_default())
            };
            if let Some(value) = f(i, decls.get(property).map(str::to_string)) {
                decls.set(property, value);
            }
            self.dom
                .document_mut()
                .set_attribute(id, "style", decls.to_string());
        }
        self.clone()
    }

    /// Sets several style properties on every element, in order.
    #[must_use]
    pub fn set_css_map(&self, properties: &[(&str, &str)]) -> Selection {
        let mut doc = self.dom.document_mut();
        for id in self.elements() {
            let mut decls = Declarations::parse(doc.attribute(id, "style").unwrap_or_default());
            for &(property, value) in properties {
                decls.set(property, value);
            }
            doc.set_attribute(id, "style", decls.to_string());
        }
        self.clone()
    }
}
