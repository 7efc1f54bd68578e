//! Selector evaluation through `Dom::select` and `Selection::is`.

#![allow(clippy::unwrap_used)]

use pretty_assertions::assert_eq;
use quarry::{Dom, Error, LoadOptions, Selector};

const TABLE: &str = r#"<table id="t">
<tr class="row"><td>1</td><td lang="en-US">2</td></tr>
<tr class="row odd"><td>3</td><td data-x="a b">4</td></tr>
<tr class="row"><td>5</td><td></td></tr>
</table>"#;

fn texts(dom: &Dom, selector: &str) -> Vec<String> {
    dom.select(selector).unwrap().map(|_, s| s.text())
}

#[test]
fn test_structural_selectors() {
    let dom = Dom::load(TABLE).unwrap();
    assert_eq!(texts(&dom, "tr:first-child td:last-child"), vec!["2"]);
    assert_eq!(texts(&dom, "tr:nth-child(2n+1) > td:first-child"), vec!["1", "5"]);
    assert_eq!(texts(&dom, "tr:nth-last-child(1) td:nth-of-type(1)"), vec!["5"]);
    assert_eq!(dom.select("td:empty").unwrap().len(), 1);
    assert_eq!(texts(&dom, "tr:has(td:empty) td:not(:empty)"), vec!["5"]);
    assert_eq!(texts(&dom, "td:contains(4)"), vec!["4"]);
}

#[test]
fn test_attribute_selectors() {
    let dom = Dom::load(TABLE).unwrap();
    assert_eq!(texts(&dom, "[lang|=en]"), vec!["2"]);
    assert_eq!(texts(&dom, "[data-x~=b]"), vec!["4"]);
    assert_eq!(texts(&dom, "[data-x^=a]"), vec!["4"]);
    assert_eq!(texts(&dom, "[lang=EN-us]"), vec!["2"]);
    assert_eq!(dom.select("[data-x='A B']").unwrap().len(), 0);
    assert_eq!(texts(&dom, "[data-x='A B' i]"), vec!["4"]);
    assert_eq!(dom.select("tr[class~=odd]").unwrap().len(), 1);
}

#[test]
fn test_combinators() {
    let dom = Dom::load(TABLE).unwrap();
    assert_eq!(dom.select(".odd + tr").unwrap().len(), 1);
    assert_eq!(dom.select(".row ~ tr").unwrap().len(), 2);
    assert_eq!(dom.select("#t td").unwrap().len(), 6);
    assert_eq!(dom.select("table > tr").unwrap().len(), 3);
}

#[test]
fn test_selection_is_and_selector_reuse() {
    let dom = Dom::load(TABLE).unwrap();
    let rows = dom.select("tr").unwrap();
    assert!(rows.is(".odd").unwrap());
    assert!(!rows.first().is(".odd").unwrap());

    let selector = Selector::parse("td:first-child", false).unwrap();
    let doc = dom.document();
    let cells = selector.select(&doc, &[dom.root_id()]);
    assert_eq!(cells.len(), 3);
    assert!(cells.iter().all(|&c| selector.matches(&doc, c)));
}

#[test]
fn test_invalid_selectors() {
    let dom = Dom::load(TABLE).unwrap();
    for bad in ["td:hover", "td::before", "[lang", "td >", ""] {
        assert!(
            matches!(dom.select(bad), Err(Error::InvalidSelector { .. })),
            "{bad} should be rejected"
        );
    }
}

#[test]
fn test_xml_selectors_are_case_sensitive() {
    let dom = Dom::load_with_options(
        "<Root><Item Kind=\"a\"/><item kind=\"b\"/></Root>",
        LoadOptions::default().xml(true),
    )
    .unwrap();
    assert_eq!(dom.select("Item").unwrap().len(), 1);
    assert_eq!(dom.select("[Kind=a]").unwrap().len(), 1);
    assert_eq!(dom.select("[kind]").unwrap().attr("kind").as_deref(), Some("b"));
    assert_eq!(dom.select(":root").unwrap().len(), 1);
}

#[test]
fn test_nth_child_with_extreme_offsets() {
    let dom = Dom::load("<ul><li>1</li><li>2</li></ul>").unwrap();
    assert_eq!(dom.select("li:nth-child(n-2147483648)").unwrap().len(), 2);
    assert!(dom.select("li:nth-child(-n-2147483648)").unwrap().is_empty());
    assert!(dom.select("li:nth-child(2147483647n+2147483647)").unwrap().is_empty());
}
