//! jQuery-style selections.
//!
//! A [`Selection`] is an ordered list of node ids bound to a [`Dom`]. The
//! list itself never changes: traversal and filtering return new
//! selections that remember the one they came from (see
//! [`end`](Selection::end)). Mutations act on the shared tree immediately
//! and are visible through every selection of the same document.
//!
//! The methods are split by concern:
//!
//! - [`traversal`]: `find`, `children`, `parents`, `next_all`, `filter`, ...
//! - [`manipulation`]: `append`, `wrap`, `replace_with`, `remove`, ...
//! - [`attributes`]: `attr`, `prop`, `data`, class helpers
//! - [`css`]: inline `style` access
//! - [`forms`]: `val`, `serialize`, `serialize_array`
//!
//! Operations on an empty selection never fail; getters return `None`.

mod args;
pub mod attributes;
pub mod css;
pub mod forms;
pub mod manipulation;
pub mod traversal;

pub use args::{Content, Filter, Predicate};
pub use attributes::PropValue;
pub use css::Declarations;
pub use forms::{FieldValue, FormEntry};

use std::collections::HashSet;
use std::fmt;
use std::rc::Rc;

use crate::dom::Dom;
use crate::error::Result;
use crate::select::Selector;
use crate::tree::{Document, NodeId};

/// An ordered, duplicate-free set of nodes of one document.
#[derive(Clone)]
pub struct Selection {
    dom: Dom,
    nodes: Vec<NodeId>,
    prev: Option<Rc<Selection>>,
}

impl Selection {
    pub(crate) fn new(dom: Dom, nodes: Vec<NodeId>, prev: Option<Rc<Selection>>) -> Self {
        Self { dom, nodes, prev }
    }

    /// Builds a selection derived from this one.
    pub(crate) fn derive(&self, nodes: Vec<NodeId>) -> Selection {
        Selection::new(self.dom.clone(), nodes, Some(Rc::new(self.clone())))
    }

    /// The document this selection belongs to.
    #[must_use]
    pub fn dom(&self) -> &Dom {
        &self.dom
    }

    /// Number of nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The node at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<NodeId> {
        self.nodes.get(index).copied()
    }

    /// All nodes, in order.
    #[must_use]
    pub fn nodes(&self) -> &[NodeId] {
        &self.nodes
    }

    /// Iterates over single-node selections.
    pub fn iter(&self) -> impl Iterator<Item = Selection> + '_ {
        self.nodes.iter().map(|&id| self.dom.wrap(vec![id]))
    }

    /// Calls `f` with each index and single-node selection. Returning
    /// `false` stops the loop.
    pub fn each(&self, mut f: impl FnMut(usize, &Selection) -> bool) -> &Self {
        for (i, sel) in self.iter().enumerate() {
            if !f(i, &sel) {
                break;
            }
        }
        self
    }

    /// Collects `f` over each index and single-node selection.
    pub fn map<T>(&self, mut f: impl FnMut(usize, &Selection) -> T) -> Vec<T> {
        self.iter().enumerate().map(|(i, sel)| f(i, &sel)).collect()
    }

    /// The node at `index`; negative indices count from the end.
    #[must_use]
    pub fn eq(&self, index: isize) -> Selection {
        let resolved = if index < 0 {
            self.nodes.len().checked_sub(index.unsigned_abs())
        } else {
            Some(index.unsigned_abs())
        };
        let nodes = resolved
            .and_then(|i| self.get(i))
            .into_iter()
            .collect();
        self.derive(nodes)
    }

    #[must_use]
    pub fn first(&self) -> Selection {
        self.eq(0)
    }

    #[must_use]
    pub fn last(&self) -> Selection {
        self.eq(-1)
    }

    /// A sub-range, with negative bounds counting from the end.
    #[must_use]
    pub fn slice(&self, start: isize, end: Option<isize>) -> Selection {
        let len = self.nodes.len();
        let clamp = |i: isize| {
            if i < 0 {
                len.saturating_sub(i.unsigned_abs())
            } else {
                i.unsigned_abs().min(len)
            }
        };
        let start = clamp(start);
        let end = end.map_or(len, clamp);
        let nodes = if start < end {
            self.nodes[start..end].to_vec()
        } else {
            Vec::new()
        };
        self.derive(nodes)
    }

    /// The selection this one was derived from, or an empty one.
    #[must_use]
    pub fn end(&self) -> Selection {
        match &self.prev {
            Some(prev) => (**prev).clone(),
            None => self.dom.empty(),
        }
    }

    /// Renders every node and concatenates the markup.
    #[must_use]
    pub fn outer_html_all(&self) -> String {
        self.dom.render(&self.nodes)
    }

    pub(crate) fn compile(&self, selector: &str) -> Result<Selector> {
        Selector::parse(selector, self.dom.options().xml)
    }

    pub(crate) fn is_xml(&self) -> bool {
        self.dom.options().xml
    }

    /// Element nodes of this selection.
    pub(crate) fn elements(&self) -> Vec<NodeId> {
        let doc = self.dom.document();
        self.nodes
            .iter()
            .copied()
            .filter(|&id| doc.is_element(id))
            .collect()
    }

    /// First node, if it is an element.
    pub(crate) fn first_element(&self) -> Option<NodeId> {
        let first = self.get(0)?;
        self.dom.document().is_element(first).then_some(first)
    }

    /// Tests each of `nodes` against `filter`.
    ///
    /// Selectors only match elements. Predicates are called without any
    /// borrow of the arena held, so they may mutate the document.
    pub(crate) fn test_nodes(&self, nodes: &[NodeId], filter: &Filter<'_>) -> Result<Vec<bool>> {
        if nodes.is_empty() {
            return Ok(Vec::new());
        }
        Ok(match filter {
            Filter::Selector(selector) => {
                let selector = self.compile(selector)?;
                let doc = self.dom.document();
                nodes.iter().map(|&id| selector.matches(&doc, id)).collect()
            }
            Filter::Nodes(ids) => {
                let set: HashSet<NodeId> = ids.iter().copied().collect();
                nodes.iter().map(|id| set.contains(id)).collect()
            }
            Filter::Selection(other) => {
                if other.dom.ptr_eq(&self.dom) {
                    let set: HashSet<NodeId> = other.nodes.iter().copied().collect();
                    nodes.iter().map(|id| set.contains(id)).collect()
                } else {
                    vec![false; nodes.len()]
                }
            }
            Filter::Predicate(f) => nodes
                .iter()
                .enumerate()
                .map(|(i, &id)| f(i, &self.dom.wrap(vec![id])))
                .collect(),
        })
    }

    /// Keeps the nodes whose test result equals `keep`.
    pub(crate) fn retain_by(
        &self,
        nodes: Vec<NodeId>,
        filter: &Filter<'_>,
        keep: bool,
    ) -> Result<Vec<NodeId>> {
        let flags = self.test_nodes(&nodes, filter)?;
        Ok(nodes
            .into_iter()
            .zip(flags)
            .filter_map(|(id, matched)| (matched == keep).then_some(id))
            .collect())
    }

    /// Applies an optional selector filter.
    pub(crate) fn filter_by_selector(
        &self,
        nodes: Vec<NodeId>,
        selector: Option<&str>,
    ) -> Result<Vec<NodeId>> {
        match selector {
            Some(selector) => self.retain_by(nodes, &Filter::Selector(selector), true),
            None => Ok(nodes),
        }
    }

    /// Resolves a filter argument to concrete nodes: selectors query the
    /// whole document.
    pub(crate) fn resolve_filter(&self, filter: Filter<'_>) -> Result<Vec<NodeId>> {
        match filter {
            Filter::Selector(selector) => Ok(self.dom.select(selector)?.nodes),
            Filter::Nodes(ids) => Ok(ids),
            Filter::Selection(other) if other.dom.ptr_eq(&self.dom) => Ok(other.nodes.clone()),
            Filter::Selection(_) => Ok(Vec::new()),
            Filter::Predicate(_) => Err(crate::Error::InvalidArgument(
                "a predicate cannot be used as a target".to_string(),
            )),
        }
    }

    /// Turns content into nodes of this document. Markup is parsed into a
    /// new fragment; nodes of another document are copied in.
    pub(crate) fn resolve_content(&self, content: Content) -> Result<Vec<NodeId>> {
        match content {
            Content::Html(markup) => self.dom.parse_fragment(&markup),
            Content::Nodes(ids) => Ok(ids),
            Content::Selection(sel) if sel.dom.ptr_eq(&self.dom) => Ok(sel.nodes),
            Content::Selection(sel) => {
                let other = sel.dom.document();
                let mut doc = self.dom.document_mut();
                Ok(sel.nodes.iter().map(|&id| doc.import(&other, id)).collect())
            }
        }
    }

    /// Merges node lists, sorting into document order when the result came
    /// from more than one input node.
    pub(crate) fn merge(&self, mut nodes: Vec<NodeId>) -> Vec<NodeId> {
        let doc = self.dom.document();
        if self.nodes.len() > 1 {
            doc.unique_sort(&mut nodes);
        } else {
            Document::dedup_in_place(&mut nodes);
        }
        nodes
    }
}

impl fmt::Display for Selection {
    /// Renders all nodes, like `toString()`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.outer_html_all())
    }
}

impl fmt::Debug for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Selection")
            .field("nodes", &self.nodes)
            .field("has_prev", &self.prev.is_some())
            .finish()
    }
}

impl<'a> IntoIterator for &'a Selection {
    type Item = NodeId;
    type IntoIter = std::iter::Copied<std::slice::Iter<'a, NodeId>>;

    fn into_iter(self) -> Self::IntoIter {
        self.nodes.iter().copied()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const FRUITS: &str = "<ul id=\"fruits\"><li class=\"apple\">Apple</li>\
        <li class=\"orange\">Orange</li><li class=\"pear\">Pear</li></ul>";

    fn fruits() -> Dom {
        Dom::load(FRUITS).unwrap()
    }

    #[test]
    fn test_eq_first_last() {
        let li = fruits().select("li").unwrap();
        assert_eq!(li.first().text(), "Apple");
        assert_eq!(li.last().text(), "Pear");
        assert_eq!(li.eq(1).text(), "Orange");
        assert_eq!(li.eq(-2).text(), "Orange");
        assert!(li.eq(3).is_empty());
        assert!(li.eq(-4).is_empty());
    }

    #[test]
    fn test_slice() {
        let li = fruits().select("li").unwrap();
        assert_eq!(li.slice(1, None).len(), 2);
        assert_eq!(li.slice(0, Some(1)).text(), "Apple");
        assert_eq!(li.slice(-1, None).text(), "Pear");
        assert!(li.slice(2, Some(1)).is_empty());
    }

    #[test]
    fn test_end_restores_previous() {
        let dom = fruits();
        let ul = dom.select("ul").unwrap();
        let li = ul.find("li").unwrap();
        assert_eq!(li.end().nodes(), ul.nodes());
        assert!(ul.end().end().is_empty());
    }

    #[test]
    fn test_each_and_map() {
        let li = fruits().select("li").unwrap();
        let mut seen = Vec::new();
        li.each(|i, item| {
            seen.push((i, item.text()));
            i < 1
        });
        assert_eq!(seen, vec![(0, "Apple".to_string()), (1, "Orange".to_string())]);
        let classes = li.map(|_, item| item.attr("class").unwrap_or_default());
        assert_eq!(classes, vec!["apple", "orange", "pear"]);
    }

    #[test]
    fn test_display_renders_all_nodes() {
        let li = fruits().select(".apple, .pear").unwrap();
        assert_eq!(
            li.to_string(),
            "<li class=\"apple\">Apple</li><li class=\"pear\">Pear</li>"
        );
    }

    #[test]
    fn test_into_iterator_yields_ids() {
        let li = fruits().select("li").unwrap();
        let ids: Vec<NodeId> = (&li).into_iter().collect();
        assert_eq!(ids, li.nodes());
    }
}
