//! Argument types for selection methods.
//!
//! jQuery methods accept a selector, a node, a list of nodes, another
//! selection or a callback in the same position. These enums carry those
//! forms; `From` impls let callers pass the plain value.

use crate::tree::NodeId;

use super::Selection;

/// Predicate over `(index, single-node selection)`.
pub type Predicate<'a> = Box<dyn Fn(usize, &Selection) -> bool + 'a>;

/// Something to match nodes against.
///
/// ```
/// use quarry::{Dom, Filter};
///
/// let dom = Dom::load("<p class=a>1</p><p>2</p>").unwrap();
/// let ps = dom.select("p").unwrap();
/// assert_eq!(ps.filter(".a").unwrap().len(), 1);
/// let odd = ps.filter(Filter::predicate(|i, _| i % 2 == 1)).unwrap();
/// assert_eq!(odd.text(), "2");
/// ```
pub enum Filter<'a> {
    /// A CSS selector.
    Selector(&'a str),
    /// Explicit nodes of the same document.
    Nodes(Vec<NodeId>),
    /// The nodes of another selection. Nodes of a different document never
    /// match.
    Selection(&'a Selection),
    /// A callback receiving the index and the node wrapped in a selection.
    Predicate(Predicate<'a>),
}

impl<'a> Filter<'a> {
    /// Builds a [`Filter::Predicate`].
    pub fn predicate(f: impl Fn(usize, &Selection) -> bool + 'a) -> Self {
        Self::Predicate(Box::new(f))
    }
}

impl<'a> From<&'a str> for Filter<'a> {
    fn from(selector: &'a str) -> Self {
        Self::Selector(selector)
    }
}

impl<'a> From<&'a String> for Filter<'a> {
    fn from(selector: &'a String) -> Self {
        Self::Selector(selector)
    }
}

impl From<NodeId> for Filter<'_> {
    fn from(id: NodeId) -> Self {
        Self::Nodes(vec![id])
    }
}

impl From<Vec<NodeId>> for Filter<'_> {
    fn from(ids: Vec<NodeId>) -> Self {
        Self::Nodes(ids)
    }
}

impl From<&[NodeId]> for Filter<'_> {
    fn from(ids: &[NodeId]) -> Self {
        Self::Nodes(ids.to_vec())
    }
}

impl<'a> From<&'a Selection> for Filter<'a> {
    fn from(sel: &'a Selection) -> Self {
        Self::Selection(sel)
    }
}

/// Content to insert.
///
/// Strings are always parsed as markup, so `"Plum"` inserts a text node
/// and `"<li>Plum</li>"` an element.
#[derive(Debug, Clone)]
pub enum Content {
    /// Markup, parsed into a new fragment of the target document.
    Html(String),
    /// Existing nodes of the target document.
    Nodes(Vec<NodeId>),
    /// The nodes of a selection. Nodes of another document are copied in.
    Selection(Selection),
}

impl From<&str> for Content {
    fn from(markup: &str) -> Self {
        Self::Html(markup.to_string())
    }
}

impl From<String> for Content {
    fn from(markup: String) -> Self {
        Self::Html(markup)
    }
}

impl From<&String> for Content {
    fn from(markup: &String) -> Self {
        Self::Html(markup.clone())
    }
}

impl From<NodeId> for Content {
    fn from(id: NodeId) -> Self {
        Self::Nodes(vec![id])
    }
}

impl From<Vec<NodeId>> for Content {
    fn from(ids: Vec<NodeId>) -> Self {
        Self::Nodes(ids)
    }
}

impl From<Selection> for Content {
    fn from(sel: Selection) -> Self {
        Self::Selection(sel)
    }
}

impl From<&Selection> for Content {
    fn from(sel: &Selection) -> Self {
        Self::Selection(sel.clone())
    }
}
