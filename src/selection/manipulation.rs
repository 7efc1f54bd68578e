//! Tree mutation.
//!
//! All methods act on the live tree. When the same content goes to several
//! targets, every target but the last receives a deep clone and the last
//! one receives the original nodes, so an inserted selection keeps
//! pointing at nodes that are in the tree.
//!
//! Targets that cannot take the content are skipped: nodes without
//! children slots for `append`/`prepend`, parentless nodes for
//! `before`/`after`/`wrap`/`replace_with`.

use crate::error::Result;
use crate::tree::{Document, NodeId, NodeKind};

use super::{Content, Filter, Selection};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Position {
    Append,
    Prepend,
    Before,
    After,
}

enum Source<'f> {
    Shared(Content),
    PerTarget(&'f mut dyn FnMut(usize, String) -> Content),
}

impl Selection {
    /// Inserts content as the last children of every node.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Parse`](crate::Error::Parse) if markup content
    /// exceeds the nesting limit.
    ///
    /// # Panics
    ///
    /// Panics if the content contains a document root, or an ancestor of
    /// a target.
    pub fn append(&self, content: impl Into<Content>) -> Result<Selection> {
        self.insert_content(Position::Append, Source::Shared(content.into()))?;
        Ok(self.clone())
    }

    /// Like [`append`](Self::append), with content computed per target
    /// from its index and inner HTML.
    ///
    /// # Errors
    ///
    /// See [`append`](Self::append).
    pub fn append_with(&self, mut f: impl FnMut(usize, String) -> Content) -> Result<Selection> {
        self.insert_content(Position::Append, Source::PerTarget(&mut f))?;
        Ok(self.clone())
    }

    /// Inserts content as the first children of every node.
    ///
    /// # Errors
    ///
    /// See [`append`](Self::append).
    pub fn prepend(&self, content: impl Into<Content>) -> Result<Selection> {
        self.insert_content(Position::Prepend, Source::Shared(content.into()))?;
        Ok(self.clone())
    }

    /// Like [`prepend`](Self::prepend), with per-target content.
    ///
    /// # Errors
    ///
    /// See [`append`](Self::append).
    pub fn prepend_with(&self, mut f: impl FnMut(usize, String) -> Content) -> Result<Selection> {
        self.insert_content(Position::Prepend, Source::PerTarget(&mut f))?;
        Ok(self.clone())
    }

    /// Inserts content right after every node.
    ///
    /// # Errors
    ///
    /// See [`append`](Self::append).
    pub fn after(&self, content: impl Into<Content>) -> Result<Selection> {
        self.insert_content(Position::After, Source::Shared(content.into()))?;
        Ok(self.clone())
    }

    /// Like [`after`](Self::after), with per-target content.
    ///
    /// # Errors
    ///
    /// See [`append`](Self::append).
    pub fn after_with(&self, mut f: impl FnMut(usize, String) -> Content) -> Result<Selection> {
        self.insert_content(Position::After, Source::PerTarget(&mut f))?;
        Ok(self.clone())
    }

    /// Inserts content right before every node.
    ///
    /// # Errors
    ///
    /// See [`append`](Self::append).
    pub fn before(&self, content: impl Into<Content>) -> Result<Selection> {
        self.insert_content(Position::Before, Source::Shared(content.into()))?;
        Ok(self.clone())
    }

    /// Like [`before`](Self::before), with per-target content.
    ///
    /// # Errors
    ///
    /// See [`append`](Self::append).
    pub fn before_with(&self, mut f: impl FnMut(usize, String) -> Content) -> Result<Selection> {
        self.insert_content(Position::Before, Source::PerTarget(&mut f))?;
        Ok(self.clone())
    }

    /// Appends this selection to every target. Returns `self`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidSelector`](crate::Error::InvalidSelector)
    /// for a bad selector and
    /// [`Error::InvalidArgument`](crate::Error::InvalidArgument) for a
    /// predicate.
    pub fn append_to<'a>(&self, target: impl Into<Filter<'a>>) -> Result<Selection> {
        let targets = self.dom.wrap(self.resolve_filter(target.into())?);
        targets.append(self)?;
        Ok(self.clone())
    }

    /// Prepends this selection to every target. Returns `self`.
    ///
    /// # Errors
    ///
    /// See [`append_to`](Self::append_to).
    pub fn prepend_to<'a>(&self, target: impl Into<Filter<'a>>) -> Result<Selection> {
        let targets = self.dom.wrap(self.resolve_filter(target.into())?);
        targets.prepend(self)?;
        Ok(self.clone())
    }

    /// Inserts this selection after every target and returns everything
    /// that was inserted, clones included.
    ///
    /// # Errors
    ///
    /// See [`append_to`](Self::append_to).
    pub fn insert_after<'a>(&self, target: impl Into<Filter<'a>>) -> Result<Selection> {
        let targets = self.dom.wrap(self.resolve_filter(target.into())?);
        let inserted = targets.insert_content(Position::After, Source::Shared(self.into()))?;
        Ok(self.derive(inserted))
    }

    /// Inserts this selection before every target and returns everything
    /// that was inserted, clones included.
    ///
    /// # Errors
    ///
    /// See [`append_to`](Self::append_to).
    pub fn insert_before<'a>(&self, target: impl Into<Filter<'a>>) -> Result<Selection> {
        let targets = self.dom.wrap(self.resolve_filter(target.into())?);
        let inserted = targets.insert_content(Position::Before, Source::Shared(self.into()))?;
        Ok(self.derive(inserted))
    }

    /// Wraps every node in a copy of the first element of `content`. The
    /// node becomes the last child of the wrapper's innermost first
    /// element descendant.
    ///
    /// # Errors
    ///
    /// See [`append`](Self::append).
    pub fn wrap(&self, content: impl Into<Content>) -> Result<Selection> {
        let targets: Vec<NodeId> = {
            let doc = self.dom.document();
            self.nodes
                .iter()
                .copied()
                .filter(|&id| doc.parent(id).is_some())
                .collect()
        };
        let Some(wrapper) = self.wrapper_element(content.into())? else {
            return Ok(self.clone());
        };
        tracing::trace!(targets = targets.len(), "wrap");
        let last = targets.len().saturating_sub(1);
        let mut doc = self.dom.document_mut();
        for (i, &target) in targets.iter().enumerate() {
            let wrapper = if i < last {
                doc.deep_clone(wrapper)
            } else {
                wrapper
            };
            let inner = innermost(&doc, wrapper);
            doc.insert_before(target, wrapper);
            doc.append_child(inner, target);
        }
        Ok(self.clone())
    }

    /// Wraps the children of every node in a copy of the first element of
    /// `content`, which becomes the node's only child.
    ///
    /// # Errors
    ///
    /// See [`append`](Self::append).
    pub fn wrap_inner(&self, content: impl Into<Content>) -> Result<Selection> {
        let targets: Vec<NodeId> = {
            let doc = self.dom.document();
            self.nodes
                .iter()
                .copied()
                .filter(|&id| doc.node(id).kind.has_children())
                .collect()
        };
        let Some(wrapper) = self.wrapper_element(content.into())? else {
            return Ok(self.clone());
        };
        tracing::trace!(targets = targets.len(), "wrap_inner");
        let last = targets.len().saturating_sub(1);
        let mut doc = self.dom.document_mut();
        for (i, &target) in targets.iter().enumerate() {
            let wrapper = if i < last {
                doc.deep_clone(wrapper)
            } else {
                wrapper
            };
            let inner = innermost(&doc, wrapper);
            for child in doc.remove_children(target) {
                doc.append_child(inner, child);
            }
            doc.append_child(target, wrapper);
        }
        Ok(self.clone())
    }

    /// Inserts `content` before the first node and moves every node into
    /// its innermost element.
    ///
    /// The last top-level element of the content is the container; from
    /// there the first element child is followed down.
    ///
    /// # Errors
    ///
    /// See [`append`](Self::append).
    pub fn wrap_all(&self, content: impl Into<Content>) -> Result<Selection> {
        let Some(first) = self.get(0) else {
            return Ok(self.clone());
        };
        if self.dom.document().parent(first).is_none() {
            return Ok(self.clone());
        }
        let wrapper = self.resolve_content(content.into())?;
        tracing::trace!(nodes = self.len(), "wrap_all");
        let mut doc = self.dom.document_mut();
        for &node in &wrapper {
            doc.insert_before(first, node);
        }
        let Some(container) = wrapper.iter().rev().copied().find(|&n| doc.is_element(n)) else {
            return Ok(self.clone());
        };
        let inner = innermost(&doc, container);
        for &node in &self.nodes {
            if !doc.node(node).kind.is_document() {
                doc.append_child(inner, node);
            }
        }
        Ok(self.clone())
    }

    /// Replaces every parent (optionally only those matching `selector`)
    /// with its children. `body` and document roots are never removed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidSelector`](crate::Error::InvalidSelector)
    /// if the selector does not compile.
    pub fn unwrap(&self, selector: Option<&str>) -> Result<Selection> {
        let parents = match selector {
            Some(selector) => self.parent_filtered(selector)?,
            None => self.parent(),
        };
        let parents = parents.not("body")?;
        tracing::trace!(parents = parents.len(), "unwrap");
        let mut doc = self.dom.document_mut();
        for &parent in parents.nodes() {
            if doc.parent(parent).is_none() {
                continue;
            }
            for child in doc.remove_children(parent) {
                doc.insert_before(parent, child);
            }
            doc.detach(parent);
        }
        Ok(self.clone())
    }

    /// Puts content in place of every node and detaches the node. Returns
    /// the detached nodes.
    ///
    /// # Errors
    ///
    /// See [`append`](Self::append).
    pub fn replace_with(&self, content: impl Into<Content>) -> Result<Selection> {
        let targets: Vec<NodeId> = {
            let doc = self.dom.document();
            self.nodes
                .iter()
                .copied()
                .filter(|&id| doc.parent(id).is_some())
                .collect()
        };
        if targets.is_empty() {
            return Ok(self.clone());
        }
        let nodes = self.resolve_content(content.into())?;
        tracing::trace!(targets = targets.len(), nodes = nodes.len(), "replace_with");
        let last = targets.len() - 1;
        let mut doc = self.dom.document_mut();
        for (i, &target) in targets.iter().enumerate() {
            let batch = if i < last {
                clone_all(&mut doc, &nodes)
            } else {
                nodes.clone()
            };
            if let Some(parent) = doc.parent(target) {
                insert_run(&mut doc, parent, Some(target), &batch);
            }
            if !batch.contains(&target) {
                doc.detach(target);
            }
        }
        Ok(self.clone())
    }

    /// Detaches every node from the tree. Calling it again is a no-op.
    #[must_use]
    pub fn remove(&self) -> Selection {
        tracing::trace!(nodes = self.len(), "remove");
        let mut doc = self.dom.document_mut();
        for &node in &self.nodes {
            doc.detach(node);
        }
        self.clone()
    }

    /// Detaches the nodes that match `selector`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidSelector`](crate::Error::InvalidSelector)
    /// if the selector does not compile.
    pub fn remove_filtered(&self, selector: &str) -> Result<Selection> {
        let matching = self.filter(selector)?;
        let _ = matching.remove();
        Ok(self.clone())
    }

    /// Detaches all children of every node.
    #[must_use]
    pub fn empty(&self) -> Selection {
        let mut doc = self.dom.document_mut();
        for &node in &self.nodes {
            doc.remove_children(node);
        }
        self.clone()
    }

    /// Inner HTML of the first node; `None` for an empty selection and for
    /// nodes that cannot have children.
    #[must_use]
    pub fn html(&self) -> Option<String> {
        let first = self.get(0)?;
        if !self.dom.document().node(first).kind.has_children() {
            return None;
        }
        Some(self.dom.render_inner(first))
    }

    /// Replaces the children of every node with `content`.
    ///
    /// # Errors
    ///
    /// See [`append`](Self::append).
    pub fn set_html(&self, content: impl Into<Content>) -> Result<Selection> {
        let _ = self.empty();
        self.append(content)
    }

    /// Outer HTML of the first node.
    #[must_use]
    pub fn outer_html(&self) -> Option<String> {
        let first = self.get(0)?;
        Some(self.dom.render(&[first]))
    }

    /// Combined text of every node and its descendants.
    #[must_use]
    pub fn text(&self) -> String {
        let doc = self.dom.document();
        self.nodes.iter().map(|&id| doc.text_content(id)).collect()
    }

    /// Replaces the children of every node with a single text node.
    #[must_use]
    pub fn set_text(&self, text: &str) -> Selection {
        self.set_text_with(|_, _| text.to_string())
    }

    /// Like [`set_text`](Self::set_text), with the text computed from the
    /// index and current text.
    pub fn set_text_with(&self, mut f: impl FnMut(usize, String) -> String) -> Selection {
        for (i, &node) in self.nodes.iter().enumerate() {
            let current = {
                let doc = self.dom.document();
                if !doc.node(node).kind.has_children() {
                    continue;
                }
                doc.text_content(node)
            };
            let text = f(i, current);
            let mut doc = self.dom.document_mut();
            doc.remove_children(node);
            let text_node = doc.create_node(NodeKind::text(text));
            doc.append_child(node, text_node);
        }
        self.clone()
    }

    /// Deep copies of every node. The copies are detached and keep
    /// attributes and stored data.
    #[must_use]
    pub fn deep_clone(&self) -> Selection {
        let copies = {
            let mut doc = self.dom.document_mut();
            clone_all(&mut doc, &self.nodes)
        };
        self.derive(copies)
    }

    /// Resolves content to the first element, which wraps targets.
    /// A wrapper that is one of the nodes being wrapped, or an ancestor of
    /// one, is copied first.
    fn wrapper_element(&self, content: Content) -> Result<Option<NodeId>> {
        let nodes = self.resolve_content(content)?;
        let (wrapper, encloses) = {
            let doc = self.dom.document();
            let Some(wrapper) = nodes.first().copied().filter(|&n| doc.is_element(n)) else {
                return Ok(None);
            };
            let encloses = self
                .nodes
                .iter()
                .any(|&n| doc.ancestors(n).any(|a| a == wrapper));
            (wrapper, encloses)
        };
        if encloses {
            return Ok(Some(self.dom.document_mut().deep_clone(wrapper)));
        }
        Ok(Some(wrapper))
    }

    /// Shared insertion loop. Returns every inserted node, in target order.
    fn insert_content(&self, position: Position, source: Source<'_>) -> Result<Vec<NodeId>> {
        let targets: Vec<NodeId> = {
            let doc = self.dom.document();
            self.nodes
                .iter()
                .copied()
                .filter(|&id| match position {
                    Position::Append | Position::Prepend => doc.node(id).kind.has_children(),
                    Position::Before | Position::After => doc.parent(id).is_some(),
                })
                .collect()
        };
        let Some(last) = targets.len().checked_sub(1) else {
            return Ok(Vec::new());
        };
        tracing::trace!(?position, targets = targets.len(), "inserting content");

        let mut inserted = Vec::new();
        match source {
            Source::Shared(content) => {
                let nodes = self.resolve_content(content)?;
                let mut doc = self.dom.document_mut();
                for (i, &target) in targets.iter().enumerate() {
                    let batch = if i < last {
                        clone_all(&mut doc, &nodes)
                    } else {
                        nodes.clone()
                    };
                    place(&mut doc, position, target, &batch);
                    inserted.extend(batch);
                }
            }
            Source::PerTarget(f) => {
                for (i, &target) in targets.iter().enumerate() {
                    let content = f(i, self.dom.render_inner(target));
                    let nodes = self.resolve_content(content)?;
                    let mut doc = self.dom.document_mut();
                    let batch = if i < last {
                        clone_all(&mut doc, &nodes)
                    } else {
                        nodes
                    };
                    place(&mut doc, position, target, &batch);
                    inserted.extend(batch);
                }
            }
        }
        Ok(inserted)
    }
}

fn clone_all(doc: &mut Document, nodes: &[NodeId]) -> Vec<NodeId> {
    nodes.iter().map(|&n| doc.deep_clone(n)).collect()
}

fn place(doc: &mut Document, position: Position, target: NodeId, nodes: &[NodeId]) {
    match position {
        Position::Append => {
            for &node in nodes {
                doc.append_child(target, node);
            }
        }
        Position::Prepend => {
            let first = doc.first_child(target);
            insert_run(doc, target, first, nodes);
        }
        Position::Before => {
            if let Some(parent) = doc.parent(target) {
                insert_run(doc, parent, Some(target), nodes);
            }
        }
        Position::After => {
            let mut reference = target;
            for &node in nodes {
                doc.insert_after(reference, node);
                reference = node;
            }
        }
    }
}

/// Inserts `nodes` in order under `parent` at the slot of `from`. The anchor
/// is the first sibling from `from` on that is not itself being inserted.
fn insert_run(doc: &mut Document, parent: NodeId, from: Option<NodeId>, nodes: &[NodeId]) {
    let mut anchor = from;
    while let Some(a) = anchor.filter(|a| nodes.contains(a)) {
        anchor = doc.next_sibling(a);
    }
    for &node in nodes {
        match anchor {
            Some(anchor) => doc.insert_before(anchor, node),
            None => doc.append_child(parent, node),
        }
    }
}

/// Follows first element children down to the deepest one.
fn innermost(doc: &Document, wrapper: NodeId) -> NodeId {
    let mut current = wrapper;
    while let Some(child) = doc.element_children(current).next() {
        current = child;
    }
    current
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use crate::{Content, Dom, LoadOptions};
    use pretty_assertions::assert_eq;

    const FRUITS: &str = "<ul id=\"fruits\"><li class=\"apple\">Apple</li>\
        <li class=\"orange\">Orange</li><li class=\"pear\">Pear</li></ul>";

    fn fragment(html: &str) -> Dom {
        Dom::load_with_options(html, LoadOptions::default().document(false)).unwrap()
    }

    #[test]
    fn test_append_and_prepend_html() {
        let dom = fragment(FRUITS);
        let ul = dom.select("ul").unwrap();
        ul.append("<li class=\"plum\">Plum</li>").unwrap();
        ul.prepend("<li class=\"kiwi\">Kiwi</li>").unwrap();
        let names: Vec<String> = dom.select("li").unwrap().map(|_, s| s.text());
        assert_eq!(names, vec!["Kiwi", "Apple", "Orange", "Pear", "Plum"]);
    }

    #[test]
    fn test_prepend_keeps_content_order() {
        let dom = fragment("<p>c</p>");
        dom.select("p").unwrap().prepend("a<b>b</b>").unwrap();
        assert_eq!(dom.html(), "<p>a<b>b</b>c</p>");
    }

    #[test]
    fn test_append_clones_for_all_but_last_target() {
        let dom = fragment("<div></div><div></div><div></div>");
        let plum = dom.parse_html("<li class=\"plum\">Plum</li>").unwrap();
        let original = plum.get(0).unwrap();
        let divs = dom.select("div").unwrap();
        divs.append(&plum).unwrap();

        let children: Vec<_> = divs.map(|_, d| d.children().get(0).unwrap());
        assert_ne!(children[0], original);
        assert_ne!(children[1], original);
        assert_eq!(children[2], original);
        assert_eq!(dom.select(".plum").unwrap().len(), 3);
    }

    #[test]
    fn test_append_moves_existing_node() {
        let dom = fragment(FRUITS);
        let apple = dom.select(".apple").unwrap();
        dom.select("ul").unwrap().append(&apple).unwrap();
        let names: Vec<String> = dom.select("li").unwrap().map(|_, s| s.text());
        assert_eq!(names, vec!["Orange", "Pear", "Apple"]);
    }

    #[test]
    fn test_append_with_callback() {
        let dom = fragment("<p>a</p><p>b</p>");
        dom.select("p")
            .unwrap()
            .append_with(|i, html| Content::from(format!("<i>{i}{html}</i>")))
            .unwrap();
        assert_eq!(dom.html(), "<p>a<i>0a</i></p><p>b<i>1b</i></p>");
    }

    #[test]
    fn test_before_and_after() {
        let dom = fragment(FRUITS);
        let orange = dom.select(".orange").unwrap();
        orange.before("<li>B</li>").unwrap();
        orange.after("<li>A1</li><li>A2</li>").unwrap();
        let names: Vec<String> = dom.select("li").unwrap().map(|_, s| s.text());
        assert_eq!(names, vec!["Apple", "B", "Orange", "A1", "A2", "Pear"]);
    }

    #[test]
    fn test_after_on_detached_node_is_noop() {
        let dom = fragment(FRUITS);
        let apple = dom.select(".apple").unwrap().remove();
        apple.after("<li>x</li>").unwrap();
        assert_eq!(dom.select("li").unwrap().len(), 2);
    }

    #[test]
    fn test_append_to_and_insert_after() {
        let dom = fragment("<div id=a></div><div id=b></div><p>x</p>");
        let p = dom.select("p").unwrap();
        p.append_to("div").unwrap();
        assert_eq!(dom.select("#b > p").unwrap().get(0), p.get(0));
        assert_eq!(dom.select("#a > p").unwrap().len(), 1);

        let span = dom.parse_html("<span>s</span>").unwrap();
        let inserted = span.insert_after("div").unwrap();
        assert_eq!(inserted.len(), 2);
        assert_eq!(dom.html(), "<div id=\"a\"><p>x</p></div><span>s</span><div id=\"b\"><p>x</p></div><span>s</span>");
    }

    #[test]
    fn test_wrap() {
        let dom = fragment(FRUITS);
        dom.select("li")
            .unwrap()
            .wrap("<div class=\"w\"><b></b></div>")
            .unwrap();
        assert_eq!(dom.select(".w").unwrap().len(), 3);
        assert_eq!(dom.select(".w > b > li").unwrap().len(), 3);
        assert_eq!(dom.select("ul > .w").unwrap().len(), 3);
    }

    #[test]
    fn test_wrap_root_is_noop() {
        let dom = fragment("<p>x</p>");
        dom.root().wrap("<div></div>").unwrap();
        assert_eq!(dom.html(), "<p>x</p>");
    }

    #[test]
    fn test_wrap_inner() {
        let dom = fragment("<p>a<b>b</b></p>");
        dom.select("p").unwrap().wrap_inner("<span></span>").unwrap();
        assert_eq!(dom.html(), "<p><span>a<b>b</b></span></p>");
    }

    #[test]
    fn test_wrap_all() {
        let dom = fragment(
            "<div class=\"container\"><div class=\"inner\">First</div><div class=\"inner\">Second</div></div>\
             <div class=\"container\"><div class=\"inner\">Third</div><div class=\"inner\">Fourth</div></div>",
        );
        dom.select(".inner")
            .unwrap()
            .wrap_all("<div class=\"wrap\"></div>")
            .unwrap();
        let wrap = dom.select(".wrap").unwrap();
        assert_eq!(wrap.len(), 1);
        assert_eq!(wrap.children().len(), 4);
        let containers = dom.select(".container").unwrap();
        assert_eq!(containers.first().children().get(0), wrap.get(0));
        assert_eq!(containers.last().children().len(), 0);
    }

    #[test]
    fn test_unwrap() {
        let dom = Dom::load("<div><p>a</p><p>b</p></div><section><p>c</p></section>").unwrap();
        dom.select("p").unwrap().unwrap(Some("div")).unwrap();
        assert_eq!(
            dom.select("body").unwrap().html().unwrap(),
            "<p>a</p><p>b</p><section><p>c</p></section>"
        );
        dom.select("section > p").unwrap().unwrap(None).unwrap();
        dom.select("p").unwrap().unwrap(None).unwrap();
        assert_eq!(dom.select("body").unwrap().len(), 1);
    }

    #[test]
    fn test_replace_with_returns_detached() {
        let dom = fragment(FRUITS);
        let apple = dom.select(".apple").unwrap();
        let replaced = apple.replace_with("<li class=\"plum\">Plum</li>").unwrap();
        assert_eq!(replaced.get(0), apple.get(0));
        assert_eq!(replaced.parent().len(), 0);
        let names: Vec<String> = dom.select("li").unwrap().map(|_, s| s.text());
        assert_eq!(names, vec!["Plum", "Orange", "Pear"]);
    }

    #[test]
    fn test_remove_is_idempotent() {
        let dom = fragment(FRUITS);
        let pear = dom.select(".pear").unwrap();
        let _ = pear.remove();
        let once = dom.html();
        let _ = pear.remove();
        assert_eq!(dom.html(), once);
        assert_eq!(dom.select("li").unwrap().len(), 2);
    }

    #[test]
    fn test_remove_filtered_and_empty() {
        let dom = fragment(FRUITS);
        dom.select("li").unwrap().remove_filtered(".orange").unwrap();
        assert_eq!(dom.select("li").unwrap().len(), 2);
        let ul = dom.select("ul").unwrap().empty();
        assert_eq!(ul.children().len(), 0);
        assert_eq!(dom.html(), "<ul id=\"fruits\"></ul>");
    }

    #[test]
    fn test_html_and_text() {
        let dom = fragment("<p>a <b>b</b></p><p>c</p>");
        let p = dom.select("p").unwrap();
        assert_eq!(p.html().as_deref(), Some("a <b>b</b>"));
        assert_eq!(p.text(), "a bc");
        assert_eq!(p.outer_html().as_deref(), Some("<p>a <b>b</b></p>"));
        assert_eq!(p.contents().first().html(), None);
        assert_eq!(dom.empty().html(), None);

        let _ = p.set_text("<x>");
        assert_eq!(dom.html(), "<p>&lt;x&gt;</p><p>&lt;x&gt;</p>");
        p.set_html("<i>i</i>").unwrap();
        assert_eq!(dom.html(), "<p><i>i</i></p><p><i>i</i></p>");
    }

    #[test]
    fn test_deep_clone_is_independent() {
        let dom = fragment("<p class=a>x</p>");
        let p = dom.select("p").unwrap();
        let copy = p.deep_clone();
        assert_ne!(copy.get(0), p.get(0));
        copy.set_attr("class", "b").unwrap();
        let _ = copy.set_text("y");
        assert_eq!(p.attr("class").as_deref(), Some("a"));
        assert_eq!(p.text(), "x");
        assert_eq!(copy.to_string(), "<p class=\"b\">y</p>");
    }

    #[test]
    fn test_cross_document_content_is_copied() {
        let dom = fragment("<ul></ul>");
        let other = fragment("<li>x</li>");
        let li = other.select("li").unwrap();
        dom.select("ul").unwrap().append(&li).unwrap();
        assert_eq!(dom.html(), "<ul><li>x</li></ul>");
        assert_eq!(other.html(), "<li>x</li>");
    }

    #[test]
    fn test_before_keeps_batch_order_when_target_is_included() {
        let dom = fragment("<p id=b>b</p><p id=a>a</p><p id=c>c</p>");
        let all = dom.select("#b, #a, #c").unwrap();
        dom.select("#a").unwrap().before(&all).unwrap();
        assert_eq!(dom.root().text(), "bac");
    }

    #[test]
    fn test_replace_with_batch_containing_target() {
        let dom = fragment("<i>x</i><p id=b>b</p><p id=a>a</p><p id=c>c</p><i>y</i>");
        let all = dom.select("p").unwrap();
        let a = dom.select("#a").unwrap();
        a.replace_with(&all).unwrap();
        assert_eq!(dom.root().text(), "xbacy");
        assert_eq!(dom.select("p").unwrap().len(), 3);
    }

    #[test]
    fn test_prepend_when_first_child_is_inserted() {
        let dom = fragment("<ul><li>1</li><li>2</li><li>3</li></ul>");
        let items = dom.select("li").unwrap();
        let moved = dom.wrap(vec![items.get(2).unwrap(), items.get(0).unwrap()]);
        dom.select("ul").unwrap().prepend(&moved).unwrap();
        assert_eq!(dom.select("ul").unwrap().text(), "312");
    }

    #[test]
    fn test_wrap_with_enclosing_element_copies_it() {
        let dom = fragment("<div><span>x</span></div>");
        let div = dom.select("div").unwrap();
        let span = dom.select("span").unwrap();
        span.wrap(&div).unwrap();
        assert_eq!(dom.html(), "<div><div><span>x<span>x</span></span></div></div>");

        let dom = fragment("<b>y</b>");
        let b = dom.select("b").unwrap();
        b.wrap(&b).unwrap();
        assert_eq!(dom.html(), "<b>y<b>y</b></b>");
    }

    #[test]
    #[should_panic(expected = "root node cannot be inserted")]
    fn test_inserting_root_panics() {
        let dom = fragment("<p></p>");
        let root = dom.root();
        dom.select("p").unwrap().append(&root).unwrap();
    }
}
