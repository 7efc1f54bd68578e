//! Form control values and form serialization.

use url::form_urlencoded;

use crate::tree::NodeId;

use super::Selection;

const SUBMITTABLE: &str = "input,select,textarea,keygen";

const SUCCESSFUL: &str = "[name!=\"\"]:enabled:not(:submit, :button, :image, :reset, :file)\
    :matches([checked], :not(:checkbox, :radio))";

/// The value of a form control: one string, or several for a
/// `<select multiple>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    One(String),
    Many(Vec<String>),
}

impl FieldValue {
    /// The values as a list.
    #[must_use]
    pub fn into_vec(self) -> Vec<String> {
        match self {
            Self::One(value) => vec![value],
            Self::Many(values) => values,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::One(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::One(value)
    }
}

impl From<Vec<String>> for FieldValue {
    fn from(values: Vec<String>) -> Self {
        Self::Many(values)
    }
}

impl From<&[&str]> for FieldValue {
    fn from(values: &[&str]) -> Self {
        Self::Many(values.iter().map(|v| (*v).to_string()).collect())
    }
}

/// One `name=value` pair of a serialized form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormEntry {
    pub name: String,
    pub value: String,
}

impl Selection {
    /// Value of the first element: the text of a `textarea`, the selected
    /// option value of a `select` (all selected option texts when
    /// `multiple`), the `value` attribute of an `input` or `option`.
    #[must_use]
    pub fn val(&self) -> Option<FieldValue> {
        let first = self.first_element()?;
        let tag = self.dom.document().node_name(first)?.to_string();
        match tag.as_str() {
            "textarea" => Some(FieldValue::One(self.text())),
            "select" => {
                let selected = self.find("option:selected").ok()?;
                if self.is_multiple() {
                    let doc = self.dom.document();
                    Some(FieldValue::Many(
                        selected.nodes.iter().map(|&o| doc.text_content(o)).collect(),
                    ))
                } else {
                    selected.attr("value").map(FieldValue::One)
                }
            }
            "input" | "option" => self.attr("value").map(FieldValue::One),
            _ => None,
        }
    }

    /// Sets the value of the controls, dispatching on the first element
    /// like [`val`](Self::val). For a `select`, the options whose `value`
    /// attribute is listed become the only selected ones; a list given to
    /// a `select` without `multiple` is ignored.
    #[must_use]
    pub fn set_val(&self, value: impl Into<FieldValue>) -> Selection {
        let value = value.into();
        let Some(first) = self.first_element() else {
            return self.clone();
        };
        let tag = self
            .dom
            .document()
            .node_name(first)
            .map(str::to_string)
            .unwrap_or_default();
        match tag.as_str() {
            "textarea" => {
                let _ = self.set_text(&value.into_vec().join(","));
            }
            "select" => {
                if matches!(value, FieldValue::Many(_)) && !self.is_multiple() {
                    return self.clone();
                }
                self.select_options(&value.into_vec());
            }
            "input" | "option" => {
                let joined = value.into_vec().join(",");
                let mut doc = self.dom.document_mut();
                for id in self.nodes.iter().copied() {
                    if doc.is_element(id) {
                        doc.set_attribute(id, "value", joined.as_str());
                    }
                }
            }
            _ => {}
        }
        self.clone()
    }

    /// Successful controls of the forms and controls in this selection,
    /// as `name`/`value` pairs. Line breaks in values become `\r\n`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidSelector`](crate::Error::InvalidSelector)
    /// if the control selectors do not compile, which is a bug.
    pub fn serialize_array(&self) -> crate::Result<Vec<FormEntry>> {
        let mut controls: Vec<NodeId> = Vec::new();
        for item in self.iter() {
            let is_form = item
                .first_element()
                .is_some_and(|id| self.dom.document().node_name(id) == Some("form"));
            let found = if is_form {
                item.find(SUBMITTABLE)?
            } else {
                item.filter(SUBMITTABLE)?
            };
            controls.extend(found.nodes.iter().copied());
        }
        let controls = self.dom.wrap(controls).filter(SUCCESSFUL)?;

        let mut entries = Vec::new();
        for control in controls.iter() {
            let Some(name) = control.attr("name") else {
                continue;
            };
            let values = control
                .val()
                .map_or_else(|| vec![String::new()], FieldValue::into_vec);
            entries.extend(values.into_iter().map(|value| FormEntry {
                name: name.clone(),
                value: normalize_newlines(&value),
            }));
        }
        tracing::trace!(entries = entries.len(), "serialized form");
        Ok(entries)
    }

    /// URL-encoded form data, as submitted with
    /// `application/x-www-form-urlencoded`.
    ///
    /// ```
    /// use quarry::Dom;
    ///
    /// let dom = Dom::load(r#"<form><input name="q" value="a b"><input type="checkbox" name="c"></form>"#).unwrap();
    /// assert_eq!(dom.select("form").unwrap().serialize().unwrap(), "q=a+b");
    /// ```
    ///
    /// # Errors
    ///
    /// See [`serialize_array`](Self::serialize_array).
    pub fn serialize(&self) -> crate::Result<String> {
        let entries = self.serialize_array()?;
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        for entry in &entries {
            serializer.append_pair(&entry.name, &entry.value);
        }
        Ok(serializer.finish())
    }

    fn is_multiple(&self) -> bool {
        self.first_element()
            .is_some_and(|id| self.dom.document().attribute(id, "multiple").is_some())
    }

    fn select_options(&self, values: &[String]) {
        let options: Vec<NodeId> = {
            let doc = self.dom.document();
            let mut options: Vec<NodeId> = self
                .nodes
                .iter()
                .flat_map(|&id| doc.descendants(id))
                .filter(|&id| doc.node_name(id) == Some("option"))
                .collect();
            doc.unique_sort(&mut options);
            options
        };
        let mut doc = self.dom.document_mut();
        for &option in &options {
            doc.remove_attribute(option, "selected");
        }
        for &option in &options {
            let matches = doc
                .attribute(option, "value")
                .is_some_and(|v| values.iter().any(|want| want == v));
            if matches {
                doc.set_attribute(option, "selected", "");
            }
        }
    }
}

fn normalize_newlines(value: &str) -> String {
    value.replace("\r\n", "\n").replace('\n', "\r\n")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::Dom;
    use pretty_assertions::assert_eq;

    fn entry(name: &str, value: &str) -> FormEntry {
        FormEntry {
            name: name.to_string(),
            value: value.to_string(),
        }
    }

    #[test]
    fn test_val_by_control() {
        let dom = Dom::load(
            "<input value=a><textarea>t\nx</textarea>\
             <select id=one><option value=1>One</option><option value=2 selected>Two</option></select>\
             <select id=many multiple><option selected>A</option><option>B</option><option selected>C</option></select>\
             <select id=none><option>First</option></select>",
        )
        .unwrap();
        assert_eq!(dom.select("input").unwrap().val(), Some(FieldValue::One("a".into())));
        assert_eq!(
            dom.select("textarea").unwrap().val(),
            Some(FieldValue::One("t\nx".into()))
        );
        assert_eq!(dom.select("#one").unwrap().val(), Some(FieldValue::One("2".into())));
        assert_eq!(
            dom.select("#many").unwrap().val(),
            Some(FieldValue::Many(vec!["A".into(), "C".into()]))
        );
        assert_eq!(dom.select("#none").unwrap().val(), Some(FieldValue::One("First".into())));
        assert_eq!(dom.select("body").unwrap().val(), None);
        assert_eq!(dom.empty().val(), None);
    }

    #[test]
    fn test_set_val() {
        let dom = Dom::load(
            "<input><textarea></textarea>\
             <select id=one><option value=1 selected>One</option><option value=2>Two</option></select>\
             <select id=many multiple><option value=a>A</option><option value=b>B</option></select>",
        )
        .unwrap();
        let _ = dom.select("input").unwrap().set_val("x");
        assert_eq!(dom.select("input").unwrap().attr("value").as_deref(), Some("x"));

        let _ = dom.select("textarea").unwrap().set_val("<t>");
        assert_eq!(dom.select("textarea").unwrap().text(), "<t>");

        let one = dom.select("#one").unwrap();
        let _ = one.set_val("2");
        assert_eq!(one.val(), Some(FieldValue::One("2".into())));
        let _ = one.set_val(&["1"][..]);
        assert_eq!(one.val(), Some(FieldValue::One("2".into())));

        let many = dom.select("#many").unwrap();
        let _ = many.set_val(vec!["a".to_string(), "b".to_string()]);
        assert_eq!(many.val(), Some(FieldValue::Many(vec!["A".into(), "B".into()])));
    }

    #[test]
    fn test_serialize_array_successful_controls() {
        let dom = Dom::load(
            "<form>\
               <input name=text value=hello>\
               <input name=unnamed_ignored_when_empty value=x disabled>\
               <input value=no-name>\
               <input type=checkbox name=c1 checked>\
               <input type=checkbox name=c2>\
               <input type=radio name=r value=r1>\
               <input type=radio name=r value=r2 checked>\
               <input type=submit name=go value=Go>\
               <input type=file name=f>\
               <textarea name=area>a\nb</textarea>\
               <select name=s multiple><option selected>x</option><option selected>y</option></select>\
               <fieldset disabled><input name=inside value=i></fieldset>\
             </form>",
        )
        .unwrap();
        let entries = dom.select("form").unwrap().serialize_array().unwrap();
        assert_eq!(
            entries,
            vec![
                entry("text", "hello"),
                entry("c1", "on"),
                entry("r", "r2"),
                entry("area", "a\r\nb"),
                entry("s", "x"),
                entry("s", "y"),
            ]
        );
    }

    #[test]
    fn test_serialize_controls_directly() {
        let dom = Dom::load("<input name=a value=1><input name=b value=\"x y&z\"><p name=p>").unwrap();
        let all = dom.select("input, p").unwrap();
        assert_eq!(all.serialize().unwrap(), "a=1&b=x+y%26z");
    }

    #[test]
    fn test_serialize_empty_selection() {
        let dom = Dom::load("<p></p>").unwrap();
        assert_eq!(dom.empty().serialize().unwrap(), "");
    }

    #[test]
    fn test_normalize_newlines() {
        assert_eq!(normalize_newlines("a\nb\r\nc"), "a\r\nb\r\nc");
    }
}
