//! Attributes, properties, data and classes.
//!
//! Getters read the first node of the selection and return `None` when it
//! is missing or not an element. Setters apply to every element and skip
//! other nodes. In HTML mode attribute names are matched lower-cased and
//! boolean attributes read back as their own name.

use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::tree::{Attribute, Document, NodeId};
use crate::util::case::{camel_case, css_case};
use crate::util::number::parse_exact_number;

use super::css::Declarations;
use super::Selection;

/// Attributes whose presence alone means `true` in HTML.
const BOOLEAN_ATTRIBUTES: &[&str] = &[
    "async",
    "autofocus",
    "autoplay",
    "checked",
    "controls",
    "defer",
    "disabled",
    "hidden",
    "loop",
    "multiple",
    "open",
    "readonly",
    "required",
    "scoped",
    "selected",
];

const DATA_PREFIX: &str = "data-";

pub(crate) fn is_boolean_attribute(name: &str) -> bool {
    BOOLEAN_ATTRIBUTES.binary_search(&name).is_ok()
}

/// A property value as returned by [`Selection::prop`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropValue {
    String(String),
    Bool(bool),
    /// The parsed inline style.
    Style(Declarations),
}

impl PropValue {
    /// The string form, if this is a string.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    fn is_truthy(&self) -> bool {
        match self {
            Self::String(s) => !s.is_empty(),
            Self::Bool(b) => *b,
            Self::Style(_) => true,
        }
    }

    fn into_attribute_value(self) -> String {
        match self {
            Self::String(s) => s,
            Self::Bool(b) => b.to_string(),
            Self::Style(decls) => decls.to_string(),
        }
    }
}

impl From<&str> for PropValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for PropValue {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<bool> for PropValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<Declarations> for PropValue {
    fn from(decls: Declarations) -> Self {
        Self::Style(decls)
    }
}

/// Reads an attribute with the HTML conveniences applied.
pub(crate) fn read_attr(doc: &Document, id: NodeId, name: &str, xml: bool) -> Option<String> {
    if !doc.is_element(id) {
        return None;
    }
    if let Some(value) = doc.attribute(id, name) {
        if !xml && is_boolean_attribute(name) {
            return Some(name.to_string());
        }
        return Some(value.to_string());
    }
    if name != "value" {
        return None;
    }
    match doc.node_name(id) {
        Some("option") => Some(doc.text_content(id)),
        Some("input")
            if matches!(doc.attribute(id, "type"), Some("radio" | "checkbox")) =>
        {
            Some("on".to_string())
        }
        _ => None,
    }
}

/// Coerces a `data-*` attribute value.
fn coerce_data(raw: &str) -> Value {
    match raw {
        "true" => return Value::Bool(true),
        "false" => return Value::Bool(false),
        "null" => return Value::Null,
        _ => {}
    }
    if let Some(number) = parse_exact_number(raw) {
        return number;
    }
    let braced = (raw.starts_with('{') && raw.ends_with('}'))
        || (raw.starts_with('[') && raw.ends_with(']'));
    if braced {
        if let Ok(value) = serde_json::from_str(raw) {
            return value;
        }
    }
    Value::String(raw.to_string())
}

/// Copies `data-*` attributes into the data table once. `pairs` holds
/// `(attribute name, key)`; keys that are already cached are left alone.
fn load_data(doc: &mut Document, id: NodeId, pairs: &[(String, String)]) {
    for (attr, key) in pairs {
        let Some(raw) = doc.attribute(id, attr).map(str::to_string) else {
            continue;
        };
        let cached = doc.data(id).is_some_and(|m| m.contains_key(key));
        if !cached {
            let value = coerce_data(&raw);
            doc.data_mut(id).insert(key.clone(), value);
        }
    }
}

/// Whether `class_attr` contains `name` bounded by whitespace or the ends.
fn class_attr_contains(class_attr: &str, name: &str) -> bool {
    if name.is_empty() {
        return false;
    }
    class_attr.match_indices(name).any(|(start, _)| {
        let end = start + name.len();
        let before = class_attr[..start].chars().next_back();
        let after = class_attr[end..].chars().next();
        before.map_or(true, char::is_whitespace) && after.map_or(true, char::is_whitespace)
    })
}

fn split_names(value: &str) -> Vec<&str> {
    value.split_whitespace().collect()
}

impl Selection {
    fn attr_name(&self, name: &str) -> String {
        if self.is_xml() {
            name.to_string()
        } else {
            name.to_ascii_lowercase()
        }
    }

    /// Value of an attribute of the first element.
    ///
    /// In HTML mode boolean attributes such as `checked` read as their
    /// name, `option` falls back to its text for `value`, and checkboxes
    /// and radios default `value` to `"on"`.
    #[must_use]
    pub fn attr(&self, name: &str) -> Option<String> {
        let first = self.get(0)?;
        let doc = self.dom.document();
        read_attr(&doc, first, &self.attr_name(name), self.is_xml())
    }

    /// All attributes of the first element, in source order.
    #[must_use]
    pub fn attrs(&self) -> Option<Vec<Attribute>> {
        let first = self.first_element()?;
        Some(self.dom.document().attributes(first).to_vec())
    }

    /// Sets an attribute on every element.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] for an empty name.
    pub fn set_attr(&self, name: &str, value: impl Into<String>) -> Result<Selection> {
        let value = value.into();
        self.set_attr_with(name, |_, _| Some(value.clone()))
    }

    /// Sets or removes several attributes on every element. `None`
    /// removes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if a name is empty.
    pub fn set_attrs(&self, attrs: &[(&str, Option<&str>)]) -> Result<Selection> {
        if attrs.iter().any(|(name, _)| name.is_empty()) {
            return Err(empty_name());
        }
        let mut doc = self.dom.document_mut();
        for id in self.nodes.iter().copied() {
            if !doc.is_element(id) {
                continue;
            }
            for &(name, value) in attrs {
                let name = self.attr_name(name);
                match value {
                    Some(value) => doc.set_attribute(id, &name, value),
                    None => {
                        doc.remove_attribute(id, &name);
                    }
                }
            }
        }
        Ok(self.clone())
    }

    /// Sets an attribute from a callback receiving the index and the
    /// current value. Returning `None` removes the attribute.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] for an empty name.
    pub fn set_attr_with(
        &self,
        name: &str,
        mut f: impl FnMut(usize, Option<String>) -> Option<String>,
    ) -> Result<Selection> {
        if name.is_empty() {
            return Err(empty_name());
        }
        let name = self.attr_name(name);
        tracing::trace!(attr = %name, nodes = self.len(), "setting attribute");
        for (i, id) in self.elements().into_iter().enumerate() {
            let current = self.dom.document().attribute(id, &name).map(str::to_string);
            let value = f(i, current);
            let mut doc = self.dom.document_mut();
            match value {
                Some(value) => doc.set_attribute(id, &name, value),
                None => {
                    doc.remove_attribute(id, &name);
                }
            }
        }
        Ok(self.clone())
    }

    /// Removes each of the space separated attribute names from every
    /// element.
    #[must_use]
    pub fn remove_attr(&self, names: &str) -> Selection {
        let names: Vec<String> = split_names(names)
            .into_iter()
            .map(|n| self.attr_name(n))
            .collect();
        let mut doc = self.dom.document_mut();
        for &id in &self.nodes {
            for name in &names {
                doc.remove_attribute(id, name);
            }
        }
        self.clone()
    }

    /// A computed property of the first element.
    ///
    /// ```
    /// use quarry::selection::PropValue;
    /// use quarry::Dom;
    ///
    /// let dom = Dom::load("<input type=checkbox checked>").unwrap();
    /// let input = dom.select("input").unwrap();
    /// assert_eq!(input.prop("checked"), Some(PropValue::Bool(true)));
    /// assert_eq!(input.prop("tagName"), Some(PropValue::String("INPUT".into())));
    /// ```
    #[must_use]
    pub fn prop(&self, name: &str) -> Option<PropValue> {
        let first = self.first_element()?;
        let xml = self.is_xml();
        let value = match name {
            "tagName" | "nodeName" => {
                let doc = self.dom.document();
                let tag = doc.node_name(first)?;
                PropValue::String(if xml {
                    tag.to_string()
                } else {
                    tag.to_ascii_uppercase()
                })
            }
            "style" => PropValue::Style(self.css_all()?),
            "href" | "src" => PropValue::String(self.resolved_url(first, name)?),
            "innerHTML" => PropValue::String(self.html()?),
            "outerHTML" => PropValue::String(self.dom.render(&[first])),
            "textContent" | "innerText" => {
                PropValue::String(self.dom.document().text_content(first))
            }
            "namespaceURI" => {
                PropValue::String(self.dom.document().node_namespace(first)?.to_string())
            }
            _ if !xml && is_boolean_attribute(name) => {
                PropValue::Bool(self.dom.document().attribute(first, name).is_some())
            }
            _ => PropValue::String(read_attr(
                &self.dom.document(),
                first,
                &self.attr_name(name),
                xml,
            )?),
        };
        Some(value)
    }

    fn resolved_url(&self, id: NodeId, name: &str) -> Option<String> {
        let doc = self.dom.document();
        let raw = doc.attribute(id, name)?;
        let resolvable = match name {
            "href" => matches!(doc.node_name(id), Some("a" | "link")),
            _ => matches!(
                doc.node_name(id),
                Some("img" | "iframe" | "audio" | "video" | "source")
            ),
        };
        let base = self.dom.options().base_uri.as_ref();
        match base {
            Some(base) if resolvable => match base.join(raw) {
                Ok(url) => Some(url.to_string()),
                Err(err) => {
                    tracing::debug!(%err, raw, "could not resolve against base URI");
                    Some(raw.to_string())
                }
            },
            _ => Some(raw.to_string()),
        }
    }

    /// Sets a property on every element.
    ///
    /// Boolean attributes are added or removed by truthiness, `tagName`
    /// renames, `innerHTML` and `textContent` replace the children,
    /// `outerHTML` replaces the element and `style` writes the inline
    /// style. Other names set the attribute.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] for read-only properties and
    /// [`Error::Parse`] if `innerHTML` or `outerHTML` markup is too deep.
    pub fn set_prop(&self, name: &str, value: impl Into<PropValue>) -> Result<Selection> {
        let value = value.into();
        self.set_prop_with(name, |_, _| value.clone())
    }

    /// Like [`set_prop`](Self::set_prop), with the value computed from the
    /// index and the current value.
    ///
    /// # Errors
    ///
    /// See [`set_prop`](Self::set_prop).
    pub fn set_prop_with(
        &self,
        name: &str,
        mut f: impl FnMut(usize, Option<PropValue>) -> PropValue,
    ) -> Result<Selection> {
        if matches!(name, "nodeName" | "namespaceURI") {
            return Err(Error::InvalidArgument(format!(
                "property `{name}` is read-only"
            )));
        }
        if name.is_empty() {
            return Err(empty_name());
        }
        let xml = self.is_xml();
        for (i, id) in self.elements().into_iter().enumerate() {
            let single = self.dom.wrap(vec![id]);
            let value = f(i, single.prop(name));
            match name {
                "tagName" => {
                    let tag = value.into_attribute_value();
                    let tag = if xml { tag } else { tag.to_ascii_lowercase() };
                    self.dom.document_mut().rename_element(id, tag);
                }
                "innerHTML" => {
                    single.set_html(value.into_attribute_value())?;
                }
                "outerHTML" => {
                    single.replace_with(value.into_attribute_value())?;
                }
                "textContent" | "innerText" => {
                    let _ = single.set_text(&value.into_attribute_value());
                }
                _ if !xml && is_boolean_attribute(name) => {
                    let mut doc = self.dom.document_mut();
                    if value.is_truthy() {
                        doc.set_attribute(id, name, "");
                    } else {
                        doc.remove_attribute(id, name);
                    }
                }
                _ => {
                    let name = self.attr_name(name);
                    self.dom
                        .document_mut()
                        .set_attribute(id, &name, value.into_attribute_value());
                }
            }
        }
        Ok(self.clone())
    }

    /// A data value of the first element.
    ///
    /// Stored values win; otherwise the `data-` attribute for the
    /// hyphenated form of `name` is read once, coerced and cached.
    #[must_use]
    pub fn data(&self, name: &str) -> Option<Value> {
        let first = self.first_element()?;
        let mut doc = self.dom.document_mut();
        if let Some(value) = doc.data(first).and_then(|m| m.get(name)) {
            return Some(value.clone());
        }
        let attr = format!("{DATA_PREFIX}{}", css_case(name));
        load_data(&mut doc, first, &[(attr, name.to_string())]);
        doc.data(first).and_then(|m| m.get(name)).cloned()
    }

    /// All data of the first element, after reading every `data-*`
    /// attribute not read before. Keys are camelCased.
    ///
    /// ```
    /// use quarry::Dom;
    /// use serde_json::json;
    ///
    /// let dom = Dom::load(r#"<div data-bool="true" data-number="23" data-sci="1E10"></div>"#).unwrap();
    /// let data = dom.select("div").unwrap().data_all().unwrap();
    /// assert_eq!(serde_json::Value::Object(data), json!({"bool": true, "number": 23, "sci": "1E10"}));
    /// ```
    #[must_use]
    pub fn data_all(&self) -> Option<Map<String, Value>> {
        let first = self.first_element()?;
        let mut doc = self.dom.document_mut();
        let pairs: Vec<(String, String)> = doc
            .attributes(first)
            .iter()
            .filter_map(|a| {
                let key = a.name.strip_prefix(DATA_PREFIX)?;
                Some((a.name.clone(), camel_case(key)))
            })
            .collect();
        load_data(&mut doc, first, &pairs);
        Some(doc.data(first).cloned().unwrap_or_default())
    }

    /// Stores a value on every element. Stored values are not coerced and
    /// never written to attributes.
    #[must_use]
    pub fn set_data(&self, name: &str, value: impl Into<Value>) -> Selection {
        let value = value.into();
        let mut doc = self.dom.document_mut();
        for id in self.elements_in(&doc) {
            doc.data_mut(id).insert(name.to_string(), value.clone());
        }
        self.clone()
    }

    /// Stores every entry of `values` on every element.
    #[must_use]
    pub fn set_data_map(&self, values: &Map<String, Value>) -> Selection {
        let mut doc = self.dom.document_mut();
        for id in self.elements_in(&doc) {
            let data = doc.data_mut(id);
            for (key, value) in values {
                data.insert(key.clone(), value.clone());
            }
        }
        self.clone()
    }

    fn elements_in(&self, doc: &Document) -> Vec<NodeId> {
        self.nodes
            .iter()
            .copied()
            .filter(|&id| doc.is_element(id))
            .collect()
    }

    /// Whether any element has `class` in its class list.
    #[must_use]
    pub fn has_class(&self, class: &str) -> bool {
        let doc = self.dom.document();
        self.nodes.iter().any(|&id| {
            doc.attribute(id, "class")
                .is_some_and(|attr| class_attr_contains(attr, class))
        })
    }

    /// Adds each space separated class to every element.
    #[must_use]
    pub fn add_class(&self, classes: &str) -> Selection {
        let names = split_names(classes);
        let mut doc = self.dom.document_mut();
        for id in self.elements_in(&doc) {
            let mut list: Vec<String> = split_names(doc.attribute(id, "class").unwrap_or_default())
                .into_iter()
                .map(str::to_string)
                .collect();
            for name in &names {
                if !list.iter().any(|c| c == name) {
                    list.push((*name).to_string());
                }
            }
            doc.set_attribute(id, "class", list.join(" "));
        }
        self.clone()
    }

    /// Removes each space separated class from every element.
    #[must_use]
    pub fn remove_class(&self, classes: &str) -> Selection {
        let names = split_names(classes);
        let mut doc = self.dom.document_mut();
        for id in self.elements_in(&doc) {
            let Some(current) = doc.attribute(id, "class") else {
                continue;
            };
            let list = split_names(current);
            let kept: Vec<&str> = list
                .iter()
                .copied()
                .filter(|c| !names.contains(c))
                .collect();
            if kept.len() != list.len() {
                let joined = kept.join(" ");
                doc.set_attribute(id, "class", joined);
            }
        }
        self.clone()
    }

    /// Clears the class list of every element, leaving `class=""`.
    #[must_use]
    pub fn remove_all_classes(&self) -> Selection {
        let mut doc = self.dom.document_mut();
        for id in self.elements_in(&doc) {
            doc.set_attribute(id, "class", "");
        }
        self.clone()
    }

    /// Toggles each space separated class on every element. `Some(true)`
    /// only adds and `Some(false)` only removes.
    #[must_use]
    pub fn toggle_class(&self, classes: &str, state: Option<bool>) -> Selection {
        let names = split_names(classes);
        let mut doc = self.dom.document_mut();
        for id in self.elements_in(&doc) {
            let mut list: Vec<String> = split_names(doc.attribute(id, "class").unwrap_or_default())
                .into_iter()
                .map(str::to_string)
                .collect();
            for name in &names {
                match (list.iter().position(|c| c == name), state) {
                    (None, None | Some(true)) => list.push((*name).to_string()),
                    (Some(index), None | Some(false)) => {
                        list.remove(index);
                    }
                    _ => {}
                }
            }
            doc.set_attribute(id, "class", list.join(" "));
        }
        self.clone()
    }
}

fn empty_name() -> Error {
    Error::InvalidArgument("attribute name must not be empty".to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::{Dom, LoadOptions};
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use url::Url;

    #[test]
    fn test_boolean_list_is_sorted() {
        let mut sorted = BOOLEAN_ATTRIBUTES.to_vec();
        sorted.sort_unstable();
        assert_eq!(sorted, BOOLEAN_ATTRIBUTES);
    }

    #[test]
    fn test_attr_html_conveniences() {
        let dom = Dom::load(
            "<input type=checkbox checked=yes><input type=radio value=x>\
             <select><option>Text</option></select><p ID=a>",
        )
        .unwrap();
        let inputs = dom.select("input").unwrap();
        assert_eq!(inputs.attr("checked").as_deref(), Some("checked"));
        assert_eq!(inputs.attr("value").as_deref(), Some("on"));
        assert_eq!(inputs.last().attr("value").as_deref(), Some("x"));
        assert_eq!(dom.select("option").unwrap().attr("value").as_deref(), Some("Text"));
        assert_eq!(dom.select("p").unwrap().attr("Id").as_deref(), Some("a"));
        assert_eq!(dom.select("p").unwrap().contents().attr("id"), None);
    }

    #[test]
    fn test_attr_xml_mode_is_literal() {
        let dom = Dom::load_with_options(
            "<r checked=\"yes\" Id=\"a\"/>",
            LoadOptions::default().xml(true),
        )
        .unwrap();
        let r = dom.select("r").unwrap();
        assert_eq!(r.attr("checked").as_deref(), Some("yes"));
        assert_eq!(r.attr("Id").as_deref(), Some("a"));
        assert_eq!(r.attr("id"), None);
    }

    #[test]
    fn test_attr_on_empty_selection() {
        let dom = Dom::load("<p></p>").unwrap();
        let empty = dom.empty();
        let result = empty.set_attr("key", "value").unwrap();
        assert_eq!(result.len(), 0);
        assert_eq!(empty.attr("key"), None);
        assert_eq!(empty.attrs(), None);
    }

    #[test]
    fn test_set_attr_variants() {
        let dom = Dom::load("<p a=1>x</p><p>y</p>").unwrap();
        let p = dom.select("p").unwrap();
        p.set_attr("title", "t").unwrap();
        assert_eq!(p.map(|_, s| s.attr("title")), vec![Some("t".into()), Some("t".into())]);

        p.set_attr_with("n", |i, _| Some(i.to_string())).unwrap();
        assert_eq!(p.last().attr("n").as_deref(), Some("1"));

        p.set_attrs(&[("a", None), ("b", Some("2"))]).unwrap();
        assert_eq!(
            p.first().attrs().unwrap(),
            vec![
                Attribute::new("title", "t"),
                Attribute::new("n", "0"),
                Attribute::new("b", "2"),
            ]
        );
        assert!(matches!(p.set_attr("", "x"), Err(Error::InvalidArgument(_))));

        let _ = p.remove_attr("title  b");
        assert_eq!(p.first().to_string(), "<p n=\"0\">x</p>");
    }

    #[test]
    fn test_prop_getters() {
        let opts = LoadOptions::default().base_uri(Url::parse("https://example.com/a/").unwrap());
        let dom = Dom::load_with_options(
            "<a href=\"b.html\">link</a><img src=\"/i.png\"><div style=\"color: red\" hidden>t</div>",
            opts,
        )
        .unwrap();
        let a = dom.select("a").unwrap();
        assert_eq!(
            a.prop("href"),
            Some(PropValue::String("https://example.com/a/b.html".into()))
        );
        assert_eq!(
            dom.select("img").unwrap().prop("src").unwrap().as_str(),
            Some("https://example.com/i.png")
        );
        assert_eq!(a.prop("nodeName").unwrap().as_str(), Some("A"));
        assert_eq!(a.prop("innerHTML").unwrap().as_str(), Some("link"));
        assert_eq!(
            a.prop("outerHTML").unwrap().as_str(),
            Some("<a href=\"b.html\">link</a>")
        );
        let div = dom.select("div").unwrap();
        assert_eq!(div.prop("hidden"), Some(PropValue::Bool(true)));
        assert_eq!(div.prop("checked"), Some(PropValue::Bool(false)));
        assert_eq!(div.prop("textContent").unwrap().as_str(), Some("t"));
        assert_eq!(
            div.prop("style"),
            Some(PropValue::Style(Declarations::parse("color: red")))
        );
        assert_eq!(div.prop("unknown"), None);
    }

    #[test]
    fn test_href_without_base_is_raw() {
        let dom = Dom::load("<a href=\"b.html\"></a>").unwrap();
        assert_eq!(
            dom.select("a").unwrap().prop("href").unwrap().as_str(),
            Some("b.html")
        );
    }

    #[test]
    fn test_set_prop() {
        let dom = Dom::load("<input type=checkbox><p>x</p>").unwrap();
        let input = dom.select("input").unwrap();
        input.set_prop("checked", true).unwrap();
        assert_eq!(input.attr("checked").as_deref(), Some("checked"));
        input.set_prop("checked", false).unwrap();
        assert_eq!(input.attr("checked"), None);

        let p = dom.select("p").unwrap();
        p.set_prop("innerHTML", "<b>y</b>").unwrap();
        assert_eq!(p.html().as_deref(), Some("<b>y</b>"));
        p.set_prop("textContent", "<z>").unwrap();
        assert_eq!(p.html().as_deref(), Some("&lt;z&gt;"));
        p.set_prop("tagName", "SECTION").unwrap();
        assert_eq!(dom.select("section").unwrap().len(), 1);
        assert!(matches!(
            p.set_prop("nodeName", "x"),
            Err(Error::InvalidArgument(_))
        ));
        p.set_prop("outerHTML", "<hr>").unwrap();
        assert_eq!(dom.select("section").unwrap().len(), 0);
        assert_eq!(dom.select("hr").unwrap().len(), 1);
    }

    #[test]
    fn test_data_coercion() {
        let dom = Dom::load(
            "<div data-bool=\"true\" data-number=\"23\" data-sci=\"1E10\" \
             data-obj='{\"a\":1}' data-bad='{oops}' data-camel-case=\"x\" data-nil=\"null\"></div>",
        )
        .unwrap();
        let div = dom.select("div").unwrap();
        assert_eq!(div.data("bool"), Some(json!(true)));
        assert_eq!(div.data("number"), Some(json!(23)));
        assert_eq!(div.data("sci"), Some(json!("1E10")));
        assert_eq!(div.data("obj"), Some(json!({"a": 1})));
        assert_eq!(div.data("bad"), Some(json!("{oops}")));
        assert_eq!(div.data("camelCase"), Some(json!("x")));
        assert_eq!(div.data("nil"), Some(Value::Null));
        assert_eq!(div.data("missing"), None);
        let all = div.data_all().unwrap();
        assert_eq!(all.len(), 7);
        assert_eq!(all["camelCase"], json!("x"));
    }

    #[test]
    fn test_data_is_read_once() {
        let dom = Dom::load("<div data-n=\"1\"></div>").unwrap();
        let div = dom.select("div").unwrap();
        assert_eq!(div.data("n"), Some(json!(1)));
        div.set_attr("data-n", "2").unwrap();
        assert_eq!(div.data("n"), Some(json!(1)));
    }

    #[test]
    fn test_set_data_is_not_coerced_or_written() {
        let dom = Dom::load("<div data-a=\"1\"></div>").unwrap();
        let div = dom.select("div").unwrap();
        let _ = div.set_data("a", "true");
        let _ = div.set_data_map(json!({"b": [1, 2]}).as_object().unwrap());
        assert_eq!(div.data("a"), Some(json!("true")));
        assert_eq!(div.data("b"), Some(json!([1, 2])));
        assert_eq!(div.attr("data-a").as_deref(), Some("1"));
        assert_eq!(div.attr("data-b"), None);
    }

    #[test]
    fn test_classes() {
        let dom = Dom::load("<p class=\"a b\">x</p><p>y</p>").unwrap();
        let p = dom.select("p").unwrap();
        assert!(p.has_class("b"));
        assert!(p.has_class("a b"));
        assert!(!p.has_class("a  b"));
        assert!(!p.has_class(""));

        let _ = p.add_class("b c");
        assert_eq!(p.map(|_, s| s.attr("class").unwrap()), vec!["a b c", "b c"]);

        let _ = p.remove_class("b");
        assert_eq!(p.map(|_, s| s.attr("class").unwrap()), vec!["a c", "c"]);

        let _ = p.toggle_class("a d", None);
        assert_eq!(p.map(|_, s| s.attr("class").unwrap()), vec!["c d", "c a d"]);

        let _ = p.toggle_class("c", Some(true));
        assert_eq!(p.first().attr("class").as_deref(), Some("c d"));
        let _ = p.toggle_class("c", Some(false));
        assert_eq!(p.first().attr("class").as_deref(), Some("d"));

        let _ = p.remove_all_classes();
        assert_eq!(p.map(|_, s| s.attr("class").unwrap()), vec!["", ""]);
    }

    #[test]
    fn test_class_attr_contains() {
        assert!(class_attr_contains("foo bar", "bar"));
        assert!(class_attr_contains("foo\tbar", "foo"));
        assert!(!class_attr_contains("foobar", "bar"));
        assert!(!class_attr_contains("foo-bar", "foo"));
    }
}
