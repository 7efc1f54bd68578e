//! Attributes, properties, data and classes.

#![allow(clippy::unwrap_used)]

use pretty_assertions::assert_eq;
use quarry::selection::PropValue;
use quarry::{Dom, LoadOptions};
use serde_json::json;
use url::Url;

#[test]
fn test_data_coercion_scenario() {
    let dom = Dom::load(r#"<div data-bool="true" data-number="23" data-sci="1E10"></div>"#).unwrap();
    let data = dom.select("div").unwrap().data_all().unwrap();
    assert_eq!(
        serde_json::Value::Object(data),
        json!({"bool": true, "number": 23, "sci": "1E10"})
    );
}

#[test]
fn test_attr_on_empty_selection_scenario() {
    let dom = Dom::load("<p></p>").unwrap();
    let empty = dom.empty();
    assert_eq!(empty.set_attr("key", "value").unwrap().len(), 0);
    assert_eq!(empty.attr("key"), None);
    assert_eq!(empty.prop("tagName"), None);
    assert_eq!(empty.data("key"), None);
}

#[test]
fn test_setters_skip_text_nodes() {
    let dom = Dom::load("<p>a</p>").unwrap();
    let mixed = dom.select("p").unwrap().contents().add("p").unwrap();
    mixed.set_attr("title", "t").unwrap();
    let _ = mixed.add_class("x").set_data("k", 1);
    let p = dom.select("p").unwrap();
    assert_eq!(p.attr("title").as_deref(), Some("t"));
    assert_eq!(p.attr("class").as_deref(), Some("x"));
    assert_eq!(p.data("k"), Some(json!(1)));
}

#[test]
fn test_xml_mode_keeps_boolean_attributes_literal() {
    let dom = Dom::load_with_options(
        r#"<opt selected="no" Name="x"/>"#,
        LoadOptions::default().xml(true),
    )
    .unwrap();
    let opt = dom.select("opt").unwrap();
    assert_eq!(opt.attr("selected").as_deref(), Some("no"));
    assert_eq!(opt.prop("selected"), Some(PropValue::String("no".into())));
    assert_eq!(opt.prop("tagName"), Some(PropValue::String("opt".into())));
    assert_eq!(opt.attr("name"), None);
}

#[test]
fn test_prop_resolves_links_against_base() {
    let options = LoadOptions::default().base_uri(Url::parse("https://example.org/docs/").unwrap());
    let dom = Dom::load_with_options(
        r#"<a href="../up">u</a><link href="style.css"><div href="x"></div><video src="v.mp4"></video>"#,
        options,
    )
    .unwrap();
    let get = |sel: &str, name: &str| {
        dom.select(sel)
            .unwrap()
            .prop(name)
            .and_then(|p| p.as_str().map(str::to_string))
    };
    assert_eq!(get("a", "href").as_deref(), Some("https://example.org/up"));
    assert_eq!(
        get("link", "href").as_deref(),
        Some("https://example.org/docs/style.css")
    );
    assert_eq!(get("div", "href").as_deref(), Some("x"));
    assert_eq!(
        get("video", "src").as_deref(),
        Some("https://example.org/docs/v.mp4")
    );
}

#[test]
fn test_set_prop_with_callback() {
    let dom = Dom::load("<input type=checkbox><input type=checkbox checked>").unwrap();
    let inputs = dom.select("input").unwrap();
    inputs
        .set_prop_with("checked", |_, current| {
            PropValue::Bool(current != Some(PropValue::Bool(true)))
        })
        .unwrap();
    assert_eq!(
        inputs.map(|_, i| i.prop("checked").unwrap()),
        vec![PropValue::Bool(true), PropValue::Bool(false)]
    );
}

#[test]
fn test_data_names_map_to_hyphenated_attributes() {
    let dom = Dom::load(r#"<div data-user-id="7" data-tags="[1,2]" data-raw="{x"></div>"#).unwrap();
    let div = dom.select("div").unwrap();
    assert_eq!(div.data("userId"), Some(json!(7)));
    assert_eq!(div.data("tags"), Some(json!([1, 2])));
    assert_eq!(div.data("raw"), Some(json!("{x")));
    let all = div.data_all().unwrap();
    let keys: Vec<&str> = all.keys().map(String::as_str).collect();
    assert!(keys.contains(&"userId"));
    assert!(keys.contains(&"tags"));
}

#[test]
fn test_toggle_and_has_class_across_elements() {
    let dom = Dom::load(r#"<p class="on">1</p><p>2</p>"#).unwrap();
    let p = dom.select("p").unwrap();
    let _ = p.toggle_class("on", None);
    assert_eq!(
        p.map(|_, s| s.attr("class").unwrap()),
        vec![String::new(), "on".to_string()]
    );
    assert!(p.has_class("on"));
    assert!(!p.first().has_class("on"));
}

#[test]
fn test_remove_attr_list() {
    let dom = Dom::load(r#"<a id="x" href="h" title="t">a</a>"#).unwrap();
    let a = dom.select("a").unwrap().remove_attr("id title");
    assert_eq!(a.to_string(), r#"<a href="h">a</a>"#);
}
