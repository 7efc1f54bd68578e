//! Tree traversal and filtering.
//!
//! Family walks (`parent`, `parents`, `next_all`, `prev_all`, `siblings`,
//! `closest`, ...) collect candidates per input node. With a single input
//! node the walk order is kept, so `parents` runs outwards and `prev_all`
//! runs from the nearest sibling back. With several input nodes the merged
//! result is sorted into document order and de-duplicated.

use crate::error::{Error, Result};
use crate::tree::{Document, NodeId};

use super::{Filter, Selection};

impl Selection {
    /// Descendants matching a selector, or the given nodes that lie inside
    /// this selection. Never includes the selected nodes themselves.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidSelector`] for a bad selector and
    /// [`Error::InvalidArgument`] for a predicate.
    pub fn find<'a>(&self, filter: impl Into<Filter<'a>>) -> Result<Selection> {
        let filter = filter.into();
        if self.is_empty() {
            return Ok(self.derive(Vec::new()));
        }
        let nodes = match filter {
            Filter::Selector(selector) => {
                let selector = self.compile(selector)?;
                let doc = self.dom.document();
                selector.select(&doc, &self.nodes)
            }
            Filter::Predicate(_) => {
                return Err(Error::InvalidArgument(
                    "find does not accept a predicate".to_string(),
                ))
            }
            other => {
                let candidates = self.resolve_filter(other)?;
                let doc = self.dom.document();
                let mut inside: Vec<NodeId> = candidates
                    .into_iter()
                    .filter(|&c| self.nodes.iter().any(|&n| doc.contains(n, c)))
                    .collect();
                doc.unique_sort(&mut inside);
                inside
            }
        };
        Ok(self.derive(nodes))
    }

    /// Element children of every node.
    #[must_use]
    pub fn children(&self) -> Selection {
        let nodes = self.collect_family(|doc, id| doc.element_children(id).collect());
        self.derive(nodes)
    }

    /// Element children matching `selector`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidSelector`] if the selector does not compile.
    pub fn children_filtered(&self, selector: &str) -> Result<Selection> {
        self.family_filtered(selector, |doc, id| doc.element_children(id).collect())
    }

    /// All child nodes, text and comments included.
    #[must_use]
    pub fn contents(&self) -> Selection {
        let nodes = self.collect_family(|doc, id| doc.children(id).collect());
        self.derive(nodes)
    }

    /// Parent of every node. Document roots are never returned.
    #[must_use]
    pub fn parent(&self) -> Selection {
        let nodes = self.collect_family(|doc, id| element_parent(doc, id).into_iter().collect());
        self.derive(nodes)
    }

    /// Parents matching `selector`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidSelector`] if the selector does not compile.
    pub fn parent_filtered(&self, selector: &str) -> Result<Selection> {
        self.family_filtered(selector, |doc, id| {
            element_parent(doc, id).into_iter().collect()
        })
    }

    /// All ancestors up to, but excluding, the document root.
    #[must_use]
    pub fn parents(&self) -> Selection {
        let nodes = self.collect_family(ancestor_chain);
        self.derive(nodes)
    }

    /// Ancestors matching `selector`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidSelector`] if the selector does not compile.
    pub fn parents_filtered(&self, selector: &str) -> Result<Selection> {
        self.family_filtered(selector, ancestor_chain)
    }

    /// Ancestors up to, but excluding, the first one matching `until`,
    /// optionally filtered by `selector`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidSelector`] if a selector does not compile.
    pub fn parents_until<'a>(
        &self,
        until: impl Into<Filter<'a>>,
        selector: Option<&str>,
    ) -> Result<Selection> {
        self.walk_until(ancestor_chain, &until.into(), selector)
    }

    /// For each node, the first of itself and its ancestors that matches.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidSelector`] if the selector does not compile.
    pub fn closest<'a>(&self, filter: impl Into<Filter<'a>>) -> Result<Selection> {
        let filter = filter.into();
        let chains: Vec<Vec<NodeId>> = {
            let doc = self.dom.document();
            self.nodes
                .iter()
                .map(|&id| {
                    let start = if doc.is_element(id) || doc.node(id).kind.is_document() {
                        Some(id)
                    } else {
                        doc.parent(id)
                    };
                    start
                        .map(|s| {
                            doc.ancestors(s)
                                .take_while(|&a| doc.is_element(a))
                                .collect()
                        })
                        .unwrap_or_default()
                })
                .collect()
        };
        let mut found = Vec::new();
        for chain in chains {
            let flags = self.test_nodes(&chain, &filter)?;
            if let Some(pos) = flags.iter().position(|&f| f) {
                found.push(chain[pos]);
            }
        }
        let nodes = self.merge(found);
        Ok(self.derive(nodes))
    }

    /// The next element sibling of every node.
    #[must_use]
    pub fn next(&self) -> Selection {
        let nodes =
            self.collect_family(|doc, id| doc.next_element_sibling(id).into_iter().collect());
        self.derive(nodes)
    }

    /// Next element siblings matching `selector`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidSelector`] if the selector does not compile.
    pub fn next_filtered(&self, selector: &str) -> Result<Selection> {
        self.family_filtered(selector, |doc, id| {
            doc.next_element_sibling(id).into_iter().collect()
        })
    }

    /// All following element siblings.
    #[must_use]
    pub fn next_all(&self) -> Selection {
        let nodes = self.collect_family(following_elements);
        self.derive(nodes)
    }

    /// Following element siblings matching `selector`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidSelector`] if the selector does not compile.
    pub fn next_all_filtered(&self, selector: &str) -> Result<Selection> {
        self.family_filtered(selector, following_elements)
    }

    /// Following element siblings up to, but excluding, the first one
    /// matching `until`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidSelector`] if a selector does not compile.
    pub fn next_until<'a>(
        &self,
        until: impl Into<Filter<'a>>,
        selector: Option<&str>,
    ) -> Result<Selection> {
        self.walk_until(following_elements, &until.into(), selector)
    }

    /// The previous element sibling of every node.
    #[must_use]
    pub fn prev(&self) -> Selection {
        let nodes =
            self.collect_family(|doc, id| doc.prev_element_sibling(id).into_iter().collect());
        self.derive(nodes)
    }

    /// Previous element siblings matching `selector`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidSelector`] if the selector does not compile.
    pub fn prev_filtered(&self, selector: &str) -> Result<Selection> {
        self.family_filtered(selector, |doc, id| {
            doc.prev_element_sibling(id).into_iter().collect()
        })
    }

    /// All preceding element siblings.
    #[must_use]
    pub fn prev_all(&self) -> Selection {
        let nodes = self.collect_family(preceding_elements);
        self.derive(nodes)
    }

    /// Preceding element siblings matching `selector`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidSelector`] if the selector does not compile.
    pub fn prev_all_filtered(&self, selector: &str) -> Result<Selection> {
        self.family_filtered(selector, preceding_elements)
    }

    /// Preceding element siblings up to, but excluding, the first one
    /// matching `until`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidSelector`] if a selector does not compile.
    pub fn prev_until<'a>(
        &self,
        until: impl Into<Filter<'a>>,
        selector: Option<&str>,
    ) -> Result<Selection> {
        self.walk_until(preceding_elements, &until.into(), selector)
    }

    /// Element siblings of every node, excluding the node itself.
    #[must_use]
    pub fn siblings(&self) -> Selection {
        let nodes = self.collect_family(sibling_elements);
        self.derive(nodes)
    }

    /// Element siblings matching `selector`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidSelector`] if the selector does not compile.
    pub fn siblings_filtered(&self, selector: &str) -> Result<Selection> {
        self.family_filtered(selector, sibling_elements)
    }

    /// Keeps the nodes that match.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidSelector`] if the selector does not compile.
    pub fn filter<'a>(&self, filter: impl Into<Filter<'a>>) -> Result<Selection> {
        let nodes = self.retain_by(self.nodes.clone(), &filter.into(), true)?;
        Ok(self.derive(nodes))
    }

    /// Keeps the nodes that do not match.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidSelector`] if the selector does not compile.
    pub fn not<'a>(&self, filter: impl Into<Filter<'a>>) -> Result<Selection> {
        let nodes = self.retain_by(self.nodes.clone(), &filter.into(), false)?;
        Ok(self.derive(nodes))
    }

    /// Returns `true` if any node matches. Always `false` when empty.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidSelector`] if the selector does not compile.
    pub fn is<'a>(&self, filter: impl Into<Filter<'a>>) -> Result<bool> {
        Ok(self
            .test_nodes(&self.nodes, &filter.into())?
            .into_iter()
            .any(|m| m))
    }

    /// Keeps the nodes with a descendant that matches.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidSelector`] for a bad selector and
    /// [`Error::InvalidArgument`] for a predicate.
    pub fn has<'a>(&self, filter: impl Into<Filter<'a>>) -> Result<Selection> {
        let filter = filter.into();
        if self.is_empty() {
            return Ok(self.derive(Vec::new()));
        }
        let nodes = match filter {
            Filter::Selector(selector) => {
                let selector = self.compile(selector)?;
                let doc = self.dom.document();
                self.nodes
                    .iter()
                    .copied()
                    .filter(|&id| doc.is_element(id) && !selector.select(&doc, &[id]).is_empty())
                    .collect()
            }
            Filter::Predicate(_) => {
                return Err(Error::InvalidArgument(
                    "has does not accept a predicate".to_string(),
                ))
            }
            other => {
                let candidates = self.resolve_filter(other)?;
                let doc = self.dom.document();
                self.nodes
                    .iter()
                    .copied()
                    .filter(|&id| candidates.iter().any(|&c| doc.contains(id, c)))
                    .collect()
            }
        };
        Ok(self.derive(nodes))
    }

    /// Union with more nodes, in document order. A selector queries the
    /// whole document.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidSelector`] for a bad selector and
    /// [`Error::InvalidArgument`] for a predicate.
    pub fn add<'a>(&self, other: impl Into<Filter<'a>>) -> Result<Selection> {
        let mut nodes = self.nodes.clone();
        nodes.extend(self.resolve_filter(other.into())?);
        self.dom.document().unique_sort(&mut nodes);
        Ok(self.derive(nodes))
    }

    /// Union with the previous selection, optionally filtered.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidSelector`] if the selector does not compile.
    pub fn add_back(&self, selector: Option<&str>) -> Result<Selection> {
        let Some(prev) = &self.prev else {
            return Ok(self.clone());
        };
        let extra = prev.filter_by_selector(prev.nodes.clone(), selector)?;
        self.add(extra)
    }

    /// Position of the first node among its element siblings. `None` for a
    /// top-level node, which has no [`parent`](Self::parent) to count in.
    #[must_use]
    pub fn index(&self) -> Option<usize> {
        let first = self.get(0)?;
        let doc = self.dom.document();
        if !doc.is_element(first) || element_parent(&doc, first).is_none() {
            return None;
        }
        let mut position = 0;
        let mut cur = doc.prev_element_sibling(first);
        while let Some(s) = cur {
            position += 1;
            cur = doc.prev_element_sibling(s);
        }
        Some(position)
    }

    /// With a selector: position of this selection's first node among the
    /// matches in the document. With nodes: position of the first given
    /// node within this selection.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidSelector`] for a bad selector and
    /// [`Error::InvalidArgument`] for a predicate.
    pub fn index_in<'a>(&self, filter: impl Into<Filter<'a>>) -> Result<Option<usize>> {
        match filter.into() {
            Filter::Selector(selector) => {
                let Some(needle) = self.get(0) else {
                    return Ok(None);
                };
                let haystack = self.dom.select(selector)?;
                Ok(haystack.nodes().iter().position(|&n| n == needle))
            }
            other => {
                let needles = self.resolve_filter(other)?;
                Ok(needles
                    .first()
                    .and_then(|needle| self.nodes.iter().position(|n| n == needle)))
            }
        }
    }

    /// Runs `walk` on every node and merges the results.
    fn collect_family(&self, walk: impl Fn(&Document, NodeId) -> Vec<NodeId>) -> Vec<NodeId> {
        let nodes: Vec<NodeId> = {
            let doc = self.dom.document();
            self.nodes.iter().flat_map(|&id| walk(&doc, id)).collect()
        };
        self.merge(nodes)
    }

    fn family_filtered(
        &self,
        selector: &str,
        walk: impl Fn(&Document, NodeId) -> Vec<NodeId>,
    ) -> Result<Selection> {
        let nodes = self.collect_family(walk);
        let nodes = self.filter_by_selector(nodes, Some(selector))?;
        Ok(self.derive(nodes))
    }

    /// Walks each node's chain until the first node matching `until`.
    fn walk_until(
        &self,
        walk: impl Fn(&Document, NodeId) -> Vec<NodeId>,
        until: &Filter<'_>,
        selector: Option<&str>,
    ) -> Result<Selection> {
        let chains: Vec<Vec<NodeId>> = {
            let doc = self.dom.document();
            self.nodes.iter().map(|&id| walk(&doc, id)).collect()
        };
        let mut collected = Vec::new();
        for chain in chains {
            let stops = self.test_nodes(&chain, until)?;
            let end = stops.iter().position(|&s| s).unwrap_or(chain.len());
            collected.extend_from_slice(&chain[..end]);
        }
        let nodes = self.merge(collected);
        let nodes = self.filter_by_selector(nodes, selector)?;
        Ok(self.derive(nodes))
    }
}

fn element_parent(doc: &Document, id: NodeId) -> Option<NodeId> {
    doc.parent(id).filter(|&p| !doc.node(p).kind.is_document())
}

fn ancestor_chain(doc: &Document, id: NodeId) -> Vec<NodeId> {
    doc.ancestors(id)
        .skip(1)
        .take_while(|&a| !doc.node(a).kind.is_document())
        .collect()
}

fn following_elements(doc: &Document, id: NodeId) -> Vec<NodeId> {
    std::iter::successors(doc.next_element_sibling(id), |&s| doc.next_element_sibling(s)).collect()
}

fn preceding_elements(doc: &Document, id: NodeId) -> Vec<NodeId> {
    std::iter::successors(doc.prev_element_sibling(id), |&s| doc.prev_element_sibling(s)).collect()
}

fn sibling_elements(doc: &Document, id: NodeId) -> Vec<NodeId> {
    match doc.parent(id) {
        Some(parent) => doc.element_children(parent).filter(|&c| c != id).collect(),
        None => Vec::new(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use crate::{Dom, Filter, LoadOptions};
    use pretty_assertions::assert_eq;

    const FRUITS: &str = "<ul id=\"fruits\"><li class=\"apple\">Apple</li>\
        <li class=\"orange\">Orange</li><li class=\"pear\">Pear</li></ul>";

    fn classes(sel: &crate::Selection) -> Vec<String> {
        sel.map(|_, s| s.attr("class").unwrap_or_default())
    }

    #[test]
    fn test_next_all_in_order() {
        let dom = Dom::load(FRUITS).unwrap();
        let next = dom.select(".apple").unwrap().next_all();
        assert_eq!(classes(&next), vec!["orange", "pear"]);
    }

    #[test]
    fn test_prev_all_merges_and_dedups() {
        let dom = Dom::load(FRUITS).unwrap();
        let prev = dom.select(".orange, .pear").unwrap().prev_all();
        assert_eq!(classes(&prev), vec!["apple", "orange"]);
    }

    #[test]
    fn test_prev_all_single_is_nearest_first() {
        let dom = Dom::load(FRUITS).unwrap();
        let prev = dom.select(".pear").unwrap().prev_all();
        assert_eq!(classes(&prev), vec!["orange", "apple"]);
    }

    #[test]
    fn test_parents_order() {
        let dom = Dom::load("<div id=a><div id=b><p id=c>x</p></div><p id=d>y</p></div>").unwrap();
        let ids = |s: &crate::Selection| s.map(|_, n| n.attr("id").unwrap_or_default());
        let single = dom.select("#c").unwrap().parents();
        assert_eq!(ids(&single), vec!["b", "a", "", ""]);
        let multi = dom.select("#c, #d").unwrap().parents_filtered("div").unwrap();
        assert_eq!(ids(&multi), vec!["a", "b"]);
    }

    #[test]
    fn test_parents_until() {
        let dom = Dom::load("<div id=a><div id=b><div id=c><p>x</p></div></div></div>").unwrap();
        let until = dom.select("p").unwrap().parents_until("#a", None).unwrap();
        assert_eq!(until.map(|_, n| n.attr("id").unwrap()), vec!["c", "b"]);
        let filtered = dom
            .select("p")
            .unwrap()
            .parents_until("#a", Some("#b"))
            .unwrap();
        assert_eq!(filtered.len(), 1);
    }

    #[test]
    fn test_next_until_and_prev_until() {
        let dom = Dom::load("<ul><li>1</li><li class=stop>2</li><li>3</li><li>4</li></ul>").unwrap();
        let first = dom.select("li").unwrap().first();
        assert_eq!(first.next_until(".stop", None).unwrap().len(), 0);
        let last = dom.select("li").unwrap().last();
        assert_eq!(last.prev_until(".stop", None).unwrap().text(), "3");
        let none = dom.select("li").unwrap().first();
        assert_eq!(none.next_until(".missing", None).unwrap().len(), 3);
        let stop = dom.select(".stop").unwrap();
        assert_eq!(first.next_until(&stop, None).unwrap().len(), 0);
    }

    #[test]
    fn test_children_contents_parent() {
        let dom = Dom::load(FRUITS).unwrap();
        let ul = dom.select("ul").unwrap();
        assert_eq!(ul.children().len(), 3);
        assert_eq!(ul.children_filtered(".pear").unwrap().len(), 1);
        assert_eq!(dom.select("li").unwrap().contents().len(), 3);
        let parent = dom.select("li").unwrap().parent();
        assert_eq!(parent.len(), 1);
        assert_eq!(parent.attr("id").as_deref(), Some("fruits"));
        assert!(dom.root().parent().is_empty());
    }

    #[test]
    fn test_siblings() {
        let dom = Dom::load(FRUITS).unwrap();
        assert_eq!(classes(&dom.select(".orange").unwrap().siblings()), vec!["apple", "pear"]);
        let both = dom.select(".apple, .pear").unwrap().siblings();
        assert_eq!(classes(&both), vec!["apple", "orange", "pear"]);
    }

    #[test]
    fn test_closest() {
        let dom = Dom::load("<div class=x><p><span>a</span><b>b</b></p></div>").unwrap();
        let spans = dom.select("span, b").unwrap();
        let closest = spans.closest("div").unwrap();
        assert_eq!(closest.len(), 1);
        assert_eq!(spans.closest("span").unwrap().len(), 1);
        let text = dom.select("span").unwrap().contents();
        assert_eq!(text.closest("p").unwrap().len(), 1);
    }

    #[test]
    fn test_find_with_nodes() {
        let dom = Dom::load(FRUITS).unwrap();
        let pear = dom.select(".pear").unwrap();
        let ul = dom.select("ul").unwrap();
        assert_eq!(ul.find(&pear).unwrap().len(), 1);
        assert_eq!(pear.find(&ul).unwrap().len(), 0);
        assert!(ul.find(Filter::predicate(|_, _| true)).is_err());
    }

    #[test]
    fn test_filter_not_is_has() {
        let dom = Dom::load(FRUITS).unwrap();
        let li = dom.select("li").unwrap();
        assert_eq!(classes(&li.filter(".apple, .pear").unwrap()), vec!["apple", "pear"]);
        assert_eq!(classes(&li.not(".apple").unwrap()), vec!["orange", "pear"]);
        let by_index = li.filter(Filter::predicate(|i, _| i == 1)).unwrap();
        assert_eq!(classes(&by_index), vec!["orange"]);
        let by_text = li.not(Filter::predicate(|_, s| s.text().starts_with('P'))).unwrap();
        assert_eq!(by_text.len(), 2);
        assert!(li.is(".pear").unwrap());
        assert!(!li.is(".kiwi").unwrap());
        assert!(!dom.empty().is("li").unwrap());
        assert_eq!(dom.select("ul").unwrap().has(".pear").unwrap().len(), 1);
        assert_eq!(dom.select("ul").unwrap().has(".kiwi").unwrap().len(), 0);
    }

    #[test]
    fn test_add_and_add_back() {
        let dom = Dom::load(FRUITS).unwrap();
        let pear = dom.select(".pear").unwrap();
        let both = pear.add(".apple").unwrap();
        assert_eq!(classes(&both), vec!["apple", "pear"]);
        let again = both.add(&pear).unwrap();
        assert_eq!(again.len(), 2);
        let ul = dom.select("ul").unwrap();
        let with_ul = ul.children().add_back(None).unwrap();
        assert_eq!(with_ul.len(), 4);
        assert_eq!(with_ul.first().attr("id").as_deref(), Some("fruits"));
        assert_eq!(ul.children().add_back(Some("li")).unwrap().len(), 3);
    }

    #[test]
    fn test_index() {
        let dom = Dom::load(FRUITS).unwrap();
        assert_eq!(dom.select(".orange").unwrap().index(), Some(1));
        assert_eq!(dom.empty().index(), None);
        assert_eq!(dom.select("ul").unwrap().index(), Some(0));
        assert_eq!(dom.select("html").unwrap().index(), None);
        assert!(dom.select("html").unwrap().parent().is_empty());
        let li = dom.select("li").unwrap();
        assert_eq!(dom.select(".pear").unwrap().index_in("li").unwrap(), Some(2));
        let orange = dom.select(".orange").unwrap();
        assert_eq!(li.index_in(&orange).unwrap(), Some(1));
    }

    #[test]
    fn test_index_of_top_level_fragment_nodes() {
        let dom = Dom::load_with_options("<p>a</p><p>b</p>", LoadOptions::default().document(false))
            .unwrap();
        let second = dom.select("p").unwrap().last();
        assert!(second.parent().is_empty());
        assert_eq!(second.index(), None);
    }

    #[test]
    fn test_invalid_selector_surfaces() {
        let dom = Dom::load(FRUITS).unwrap();
        let err = dom.select("li").unwrap().filter("li:nope").unwrap_err();
        assert!(err.to_string().contains("Unknown pseudo-class"));
    }

    #[test]
    fn test_empty_selection_never_errors() {
        let dom = Dom::load(FRUITS).unwrap();
        let empty = dom.empty();
        assert!(empty.find("li:nope").unwrap().is_empty());
        assert!(empty.filter("li:nope").unwrap().is_empty());
        assert!(empty.parents().is_empty());
        assert!(empty.next_until("li", None).unwrap().is_empty());
    }
}
