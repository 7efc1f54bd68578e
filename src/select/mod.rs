//! CSS selector engine.
//!
//! [`Selector::parse`] compiles selector text once; the compiled form can
//! then be matched against single nodes or used to query subtrees of a
//! [`Document`]. Query results are always in document order without
//! duplicates.
//!
//! ```
//! use quarry::parser::{parse_document, ParseOptions};
//! use quarry::select::Selector;
//!
//! let doc = parse_document(
//!     "<ul><li class=a>1</li><li>2</li></ul>",
//!     &ParseOptions::default(),
//! )
//! .unwrap();
//! let sel = Selector::parse("li:not(.a)", false).unwrap();
//! let found = sel.select(&doc, &[doc.root()]);
//! assert_eq!(found.len(), 1);
//! assert_eq!(doc.text_content(found[0]), "2");
//! ```

mod matcher;
mod parser;

pub use parser::{
    AttributeOp, AttributeSelector, Combinator, ComplexSelector, Compound, Pseudo, Simple,
    SelectorList,
};

use crate::error::{Error, Result};
use crate::tree::{Document, NodeId};
use matcher::MatchContext;

/// A compiled selector list.
#[derive(Debug, Clone)]
pub struct Selector {
    source: String,
    list: SelectorList,
    xml: bool,
}

impl Selector {
    /// Compiles selector text. `xml` switches to exact name comparison.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidSelector`] for malformed selectors and for
    /// pseudo-classes that are not supported.
    pub fn parse(selector: &str, xml: bool) -> Result<Self> {
        let list = parser::parse(selector).map_err(|msg| Error::invalid_selector(selector, msg))?;
        tracing::trace!(selector, xml, "compiled selector");
        Ok(Self {
            source: selector.to_string(),
            list,
            xml,
        })
    }

    /// The selector text this was compiled from.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// The parsed selector list.
    #[must_use]
    pub fn list(&self) -> &SelectorList {
        &self.list
    }

    /// Returns `true` if the element `id` matches. Non-elements never match.
    #[must_use]
    pub fn matches(&self, doc: &Document, id: NodeId) -> bool {
        self.matches_in_scope(doc, id, &[])
    }

    /// Like [`matches`](Self::matches), with `scope` as the nodes `:scope`
    /// and leading combinators refer to.
    #[must_use]
    pub fn matches_in_scope(&self, doc: &Document, id: NodeId, scope: &[NodeId]) -> bool {
        let ctx = MatchContext {
            doc,
            xml: self.xml,
            scope,
        };
        matcher::matches_list(ctx, id, &self.list)
    }

    /// Finds the matching descendants of `roots` (the roots themselves are
    /// never returned), in document order without duplicates.
    ///
    /// A leading `+` or `~` combinator finds the following siblings of a
    /// root instead.
    #[must_use]
    pub fn select(&self, doc: &Document, roots: &[NodeId]) -> Vec<NodeId> {
        let ctx = MatchContext {
            doc,
            xml: self.xml,
            scope: roots,
        };
        let mut found = Vec::new();
        matcher::for_each_candidate(ctx, &self.list, |id| {
            found.push(id);
            true
        });
        doc.unique_sort(&mut found);
        found
    }
}

/// Compiles `selector` and queries the descendants of `roots`.
///
/// # Errors
///
/// Returns [`Error::InvalidSelector`] if the selector does not compile.
pub fn select(selector: &str, doc: &Document, roots: &[NodeId], xml: bool) -> Result<Vec<NodeId>> {
    Ok(Selector::parse(selector, xml)?.select(doc, roots))
}

/// Compiles `selector` and tests a single node.
///
/// # Errors
///
/// Returns [`Error::InvalidSelector`] if the selector does not compile.
pub fn is(selector: &str, doc: &Document, id: NodeId, xml: bool) -> Result<bool> {
    Ok(Selector::parse(selector, xml)?.matches(doc, id))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::parser::{parse_document, ParseOptions};
    use pretty_assertions::assert_eq;

    const FRUITS: &str = "<ul id=\"fruits\"><li class=\"apple\">Apple</li>\
        <li class=\"orange\">Orange</li><li class=\"pear\">Pear</li></ul>";

    fn fragment(html: &str) -> Document {
        parse_document(html, &ParseOptions::default().document(false)).unwrap()
    }

    fn classes(doc: &Document, ids: &[NodeId]) -> Vec<String> {
        ids.iter()
            .map(|&id| doc.attribute(id, "class").unwrap_or_default().to_string())
            .collect()
    }

    fn query(doc: &Document, sel: &str) -> Vec<NodeId> {
        select(sel, doc, &[doc.root()], false).unwrap()
    }

    #[test]
    fn test_select_class_and_list_in_document_order() {
        let doc = fragment(FRUITS);
        let found = query(&doc, ".pear, .apple");
        assert_eq!(classes(&doc, &found), vec!["apple", "pear"]);
    }

    #[test]
    fn test_select_combinators() {
        let doc = fragment(FRUITS);
        assert_eq!(classes(&doc, &query(&doc, "#fruits > li + li")), vec!["orange", "pear"]);
        assert_eq!(classes(&doc, &query(&doc, ".apple ~ li")), vec!["orange", "pear"]);
        assert_eq!(query(&doc, "ul li").len(), 3);
        assert!(query(&doc, "li ul").is_empty());
    }

    #[test]
    fn test_select_excludes_roots() {
        let doc = fragment(FRUITS);
        let ul = doc.first_child(doc.root()).unwrap();
        let found = select("ul, li", &doc, &[ul], false).unwrap();
        assert_eq!(found.len(), 3);
    }

    #[test]
    fn test_leading_child_combinator_is_scoped() {
        let doc = fragment("<div id=a><p>1</p><section><p>2</p></section></div>");
        let div = doc.first_child(doc.root()).unwrap();
        let found = select("> p", &doc, &[div], false).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(doc.text_content(found[0]), "1");
    }

    #[test]
    fn test_leading_sibling_combinator() {
        let doc = fragment(FRUITS);
        let ul = doc.first_child(doc.root()).unwrap();
        let apple = doc.first_child(ul).unwrap();
        let found = select("~ li", &doc, &[apple], false).unwrap();
        assert_eq!(classes(&doc, &found), vec!["orange", "pear"]);
    }

    #[test]
    fn test_html_names_are_case_insensitive() {
        let doc = fragment("<DIV Title=x></DIV>");
        assert_eq!(query(&doc, "div[TITLE=x]").len(), 1);
        assert_eq!(query(&doc, "DIV").len(), 1);
    }

    #[test]
    fn test_xml_names_are_exact() {
        let doc = parse_document("<Root><item/><Item/></Root>", &ParseOptions::default().xml(true))
            .unwrap();
        assert_eq!(select("Item", &doc, &[doc.root()], true).unwrap().len(), 1);
        assert_eq!(select("item", &doc, &[doc.root()], true).unwrap().len(), 1);
        assert_eq!(select("ITEM", &doc, &[doc.root()], true).unwrap().len(), 0);
    }

    #[test]
    fn test_attribute_operators() {
        let doc = fragment(
            "<a href=\"https://x.org/a.pdf\" lang=\"en-US\" class=\"btn big\" type=\"TEXT\">x</a>",
        );
        for sel in [
            "[href^=https]",
            "[href$='.pdf']",
            "[href*=x\\.org]",
            "[lang|=en]",
            "[class~=big]",
            "[type=text]",
            "[id!=foo]",
            "[class=BTN\\ BIG i]",
        ] {
            assert_eq!(query(&doc, sel).len(), 1, "{sel}");
        }
        for sel in ["[href^='']", "[class~='btn big']", "[type=text s]", "[href!='https://x.org/a.pdf']"] {
            assert!(query(&doc, sel).is_empty(), "{sel}");
        }
    }

    #[test]
    fn test_structural_pseudos() {
        let doc = fragment(
            "<ul><li>1</li><li>2</li><li>3</li><li>4</li><li>5</li></ul><p><b>x</b><i></i><b>y</b></p>",
        );
        let texts = |sel: &str| -> Vec<String> {
            query(&doc, sel)
                .iter()
                .map(|&id| doc.text_content(id))
                .collect()
        };
        assert_eq!(texts("li:first-child"), vec!["1"]);
        assert_eq!(texts("li:last-child"), vec!["5"]);
        assert_eq!(texts("li:nth-child(odd)"), vec!["1", "3", "5"]);
        assert_eq!(texts("li:nth-child(-n+2)"), vec!["1", "2"]);
        assert_eq!(texts("li:nth-last-child(2)"), vec!["4"]);
        assert_eq!(texts("b:first-of-type"), vec!["x"]);
        assert_eq!(texts("b:last-of-type"), vec!["y"]);
        assert_eq!(texts("p > :only-of-type"), vec![""]);
        assert_eq!(texts("b:nth-of-type(2)"), vec!["y"]);
        assert_eq!(texts("i:empty"), vec![""]);
        assert_eq!(query(&doc, "b:parent").len(), 2);
        assert_eq!(query(&doc, ":root").len(), 2);
    }

    #[test]
    fn test_logical_pseudos() {
        let doc = fragment(FRUITS);
        assert_eq!(classes(&doc, &query(&doc, "li:not(.apple, .pear)")), vec!["orange"]);
        assert_eq!(classes(&doc, &query(&doc, "li:is(.pear, .apple)")), vec!["apple", "pear"]);
        assert_eq!(query(&doc, "ul:has(> .pear)").len(), 1);
        assert_eq!(query(&doc, "ul:has(.kiwi)").len(), 0);
        assert_eq!(classes(&doc, &query(&doc, "li:has(+ .pear)")), vec!["orange"]);
        assert_eq!(classes(&doc, &query(&doc, "li:contains(Pea)")), vec!["pear"]);
    }

    #[test]
    fn test_form_pseudos() {
        let doc = fragment(
            "<form><input name=a><input type=checkbox checked><input type=radio>\
             <input type=submit><button>b</button><input type=button disabled>\
             <select><option>1</option><option>2</option></select>\
             <select><option>3</option><option selected>4</option></select>\
             <fieldset disabled><legend><input name=l></legend><input name=f></fieldset></form>",
        );
        assert_eq!(query(&doc, ":text").len(), 3);
        assert_eq!(query(&doc, ":checkbox").len(), 1);
        assert_eq!(query(&doc, ":radio").len(), 1);
        assert_eq!(query(&doc, ":submit").len(), 1);
        assert_eq!(query(&doc, ":button").len(), 2);
        assert_eq!(query(&doc, ":input").len(), 10);
        let selected: Vec<String> = query(&doc, ":selected")
            .iter()
            .map(|&id| doc.text_content(id))
            .collect();
        assert_eq!(selected, vec!["1", "4"]);
        assert_eq!(query(&doc, ":checked").len(), 3);
        let disabled: Vec<Option<&str>> = query(&doc, "input:disabled")
            .iter()
            .map(|&id| doc.attribute(id, "name"))
            .collect();
        assert_eq!(disabled, vec![None, Some("f")]);
        assert!(query(&doc, "input[name=l]:enabled").len() == 1);
    }

    #[test]
    fn test_header_and_link() {
        let doc = fragment("<h1>a</h1><h6>b</h6><a href=#>x</a><a>y</a><link href=s.css>");
        assert_eq!(query(&doc, ":header").len(), 2);
        assert_eq!(query(&doc, ":link").len(), 2);
    }

    #[test]
    fn test_scope_pseudo() {
        let doc = fragment(FRUITS);
        let ul = doc.first_child(doc.root()).unwrap();
        let found = select(":scope > .apple", &doc, &[ul], false).unwrap();
        assert_eq!(found.len(), 1);
        let sel = Selector::parse(":scope", false).unwrap();
        assert!(sel.matches(&doc, ul));
        assert!(sel.matches_in_scope(&doc, ul, &[ul]));
    }

    #[test]
    fn test_unknown_pseudo_class_error() {
        let doc = fragment(FRUITS);
        let err = select("li:bogus", &doc, &[doc.root()], false).unwrap_err();
        match err {
            Error::InvalidSelector { selector, message } => {
                assert_eq!(selector, "li:bogus");
                assert!(message.starts_with("Unknown pseudo-class"));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_non_elements_never_match() {
        let doc = fragment("<!-- c -->text");
        let sel = Selector::parse("*", false).unwrap();
        assert!(doc.children(doc.root()).all(|c| !sel.matches(&doc, c)));
    }
}
