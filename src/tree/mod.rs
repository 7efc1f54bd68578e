//! Arena-based document tree.
//!
//! All nodes live in a contiguous `Vec<NodeData>` owned by the [`Document`]
//! and are referenced by [`NodeId`], a newtype over `NonZeroU32`. Parent,
//! child and sibling links are `Option<NodeId>` fields rather than pointers,
//! so the cyclic parent/child/sibling graph needs no reference counting.
//!
//! One arena can hold several roots. The loaded document is the primary
//! root; markup parsed later (for example content passed to `append`) gets
//! its own fragment root in the same arena so that node identity is shared
//! between the document and the fragment.
//!
//! # Invariants
//!
//! - A node is a child of at most one parent, exactly once.
//! - `prev_sibling`/`next_sibling` always agree with the child order.
//! - Detached nodes have no parent and no siblings.
//!
//! Every insertion primitive detaches its argument first, so callers never
//! need to do it themselves.

mod node;
mod order;

pub use node::NodeKind;

use crate::error::ParseDiagnostic;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::num::NonZeroU32;

/// A typed index into the document's node arena.
///
/// `Option<NodeId>` has the same size as `NodeId` (niche optimization).
/// Ids are never reused, so equality is node identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct NodeId(NonZeroU32);

impl NodeId {
    /// Creates a `NodeId` from a raw index.
    ///
    /// # Panics
    ///
    /// Panics if `index` is 0.
    #[allow(clippy::expect_used, clippy::cast_possible_truncation)]
    fn from_index(index: usize) -> Self {
        Self(NonZeroU32::new(index as u32).expect("NodeId index must be non-zero"))
    }

    /// Returns the raw index for indexing into the arena.
    fn as_index(self) -> usize {
        self.0.get() as usize
    }
}

/// Storage for a single node in the arena.
#[derive(Debug, Clone)]
pub struct NodeData {
    /// What kind of node this is and its payload.
    pub kind: NodeKind,
    /// Parent node, if any. Roots and detached nodes have none.
    pub parent: Option<NodeId>,
    /// First child node.
    pub first_child: Option<NodeId>,
    /// Last child node (for O(1) append).
    pub last_child: Option<NodeId>,
    /// Next sibling.
    pub next_sibling: Option<NodeId>,
    /// Previous sibling.
    pub prev_sibling: Option<NodeId>,
}

impl NodeData {
    fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            parent: None,
            first_child: None,
            last_child: None,
            next_sibling: None,
            prev_sibling: None,
        }
    }
}

/// An attribute on an element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    /// The attribute name as written (lowercased in HTML mode).
    pub name: String,
    /// The attribute value, references decoded.
    pub value: String,
}

impl Attribute {
    /// Creates an attribute.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// A node arena holding one document and any number of fragments.
///
/// # Examples
///
/// ```
/// use quarry::{Attribute, Document, NodeKind};
///
/// let mut doc = Document::new();
/// let div = doc.create_node(NodeKind::element("div", vec![Attribute::new("id", "a")]));
/// doc.append_child(doc.root(), div);
/// assert_eq!(doc.attribute(div, "id"), Some("a"));
/// ```
#[derive(Debug)]
pub struct Document {
    /// The node arena. Index 0 is unused (placeholder for `NonZeroU32`).
    nodes: Vec<NodeData>,
    /// The primary root node.
    root: NodeId,
    /// Values stored with `data()` setters, keyed by element.
    data: HashMap<NodeId, Map<String, Value>>,
    /// Diagnostics collected while parsing into this arena.
    pub diagnostics: Vec<ParseDiagnostic>,
}

impl Document {
    /// Creates a new arena containing a single empty root.
    #[must_use]
    pub fn new() -> Self {
        let mut nodes = Vec::with_capacity(64);
        // Index 0: placeholder (NodeId uses NonZeroU32)
        nodes.push(NodeData::new(NodeKind::Document));
        nodes.push(NodeData::new(NodeKind::Document));
        Self {
            nodes,
            root: NodeId::from_index(1),
            data: HashMap::new(),
            diagnostics: Vec::new(),
        }
    }

    /// Returns the primary root node id.
    #[must_use]
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Allocates a new, empty fragment root in this arena.
    pub fn create_root(&mut self) -> NodeId {
        self.create_node(NodeKind::Document)
    }

    /// Returns the first element child of the primary root.
    #[must_use]
    pub fn root_element(&self) -> Option<NodeId> {
        self.children(self.root).find(|&id| self.is_element(id))
    }

    /// Returns the `NodeData` for the given node.
    ///
    /// # Panics
    ///
    /// Panics if `id` does not belong to this arena.
    #[must_use]
    pub fn node(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.as_index()]
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut NodeData {
        &mut self.nodes[id.as_index()]
    }

    /// Returns `true` if `id` is an element.
    #[must_use]
    pub fn is_element(&self, id: NodeId) -> bool {
        self.node(id).kind.is_element()
    }

    /// Returns the tag name of an element, `None` for other nodes.
    #[must_use]
    pub fn node_name(&self, id: NodeId) -> Option<&str> {
        self.node(id).kind.element_name()
    }

    /// Returns the namespace URI of an element node, if any.
    #[must_use]
    pub fn node_namespace(&self, id: NodeId) -> Option<&str> {
        match &self.node(id).kind {
            NodeKind::Element { namespace, .. } => namespace.as_deref(),
            _ => None,
        }
    }

    /// Returns the payload of a text, comment or CDATA node.
    #[must_use]
    pub fn node_text(&self, id: NodeId) -> Option<&str> {
        match &self.node(id).kind {
            NodeKind::Text { content }
            | NodeKind::Comment { content }
            | NodeKind::CData { content } => Some(content),
            _ => None,
        }
    }

    /// Returns the concatenated text of a node and its descendants.
    ///
    /// Text and CDATA contribute; comments and directives do not.
    #[must_use]
    pub fn text_content(&self, id: NodeId) -> String {
        let mut result = String::new();
        self.collect_text(id, &mut result);
        result
    }

    fn collect_text(&self, id: NodeId, buf: &mut String) {
        match &self.node(id).kind {
            NodeKind::Text { content } | NodeKind::CData { content } => {
                buf.push_str(content);
            }
            NodeKind::Comment { .. } | NodeKind::Directive { .. } => {}
            NodeKind::Document | NodeKind::Element { .. } => {
                for child in self.children(id) {
                    self.collect_text(child, buf);
                }
            }
        }
    }

    // --- Attributes ---

    /// Returns the attributes of an element node, empty for other nodes.
    #[must_use]
    pub fn attributes(&self, id: NodeId) -> &[Attribute] {
        match &self.node(id).kind {
            NodeKind::Element { attributes, .. } => attributes,
            _ => &[],
        }
    }

    /// Returns the value of an attribute by exact name.
    #[must_use]
    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.attributes(id)
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_str())
    }

    /// Sets an attribute, replacing an existing value in place.
    ///
    /// Does nothing on non-element nodes.
    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: impl Into<String>) {
        if let NodeKind::Element { attributes, .. } = &mut self.node_mut(id).kind {
            let value = value.into();
            match attributes.iter_mut().find(|a| a.name == name) {
                Some(attr) => attr.value = value,
                None => attributes.push(Attribute::new(name, value)),
            }
        }
    }

    /// Removes an attribute. Returns `true` if it was present.
    pub fn remove_attribute(&mut self, id: NodeId, name: &str) -> bool {
        if let NodeKind::Element { attributes, .. } = &mut self.node_mut(id).kind {
            let before = attributes.len();
            attributes.retain(|a| a.name != name);
            return attributes.len() != before;
        }
        false
    }

    /// Renames an element. Does nothing on non-element nodes.
    pub fn rename_element(&mut self, id: NodeId, new_name: impl Into<String>) {
        if let NodeKind::Element { name, .. } = &mut self.node_mut(id).kind {
            *name = new_name.into();
        }
    }

    // --- Data side table ---

    /// Returns the values stored for a node with `set_data`.
    #[must_use]
    pub fn data(&self, id: NodeId) -> Option<&Map<String, Value>> {
        self.data.get(&id)
    }

    /// Returns the mutable data map of a node, creating it if needed.
    pub fn data_mut(&mut self, id: NodeId) -> &mut Map<String, Value> {
        self.data.entry(id).or_default()
    }

    // --- Navigation ---

    /// Returns the parent of a node.
    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    /// Returns the first child of a node.
    #[must_use]
    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).first_child
    }

    /// Returns the last child of a node.
    #[must_use]
    pub fn last_child(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).last_child
    }

    /// Returns the next sibling of a node.
    #[must_use]
    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).next_sibling
    }

    /// Returns the previous sibling of a node.
    #[must_use]
    pub fn prev_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).prev_sibling
    }

    /// Returns the next sibling that is an element.
    #[must_use]
    pub fn next_element_sibling(&self, id: NodeId) -> Option<NodeId> {
        let mut cur = self.next_sibling(id);
        while let Some(n) = cur {
            if self.is_element(n) {
                return Some(n);
            }
            cur = self.next_sibling(n);
        }
        None
    }

    /// Returns the previous sibling that is an element.
    #[must_use]
    pub fn prev_element_sibling(&self, id: NodeId) -> Option<NodeId> {
        let mut cur = self.prev_sibling(id);
        while let Some(n) = cur {
            if self.is_element(n) {
                return Some(n);
            }
            cur = self.prev_sibling(n);
        }
        None
    }

    /// Returns the topmost ancestor of a node (the node itself if detached).
    #[must_use]
    pub fn root_of(&self, id: NodeId) -> NodeId {
        self.ancestors(id).last().unwrap_or(id)
    }

    /// Returns an iterator over the children of a node.
    pub fn children(&self, id: NodeId) -> Children<'_> {
        Children {
            doc: self,
            next: self.node(id).first_child,
        }
    }

    /// Returns an iterator over the element children of a node.
    pub fn element_children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.children(id).filter(|&c| self.is_element(c))
    }

    /// Returns an iterator over a node and its ancestors (walking up to root).
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            doc: self,
            next: Some(id),
        }
    }

    /// Returns an iterator over all descendants of a node in document order.
    pub fn descendants(&self, id: NodeId) -> Descendants<'_> {
        Descendants {
            doc: self,
            root: id,
            next: self.first_child(id),
        }
    }

    /// Returns `true` if `contained` is a strict descendant of `container`.
    #[must_use]
    pub fn contains(&self, container: NodeId, contained: NodeId) -> bool {
        container != contained && self.ancestors(contained).any(|a| a == container)
    }

    // --- Mutation ---

    /// Allocates a new, detached node in the arena.
    pub fn create_node(&mut self, kind: NodeKind) -> NodeId {
        let index = self.nodes.len();
        self.nodes.push(NodeData::new(kind));
        NodeId::from_index(index)
    }

    /// Checks the caller contract shared by all insertion primitives.
    fn assert_insertable(&self, parent: NodeId, child: NodeId) {
        assert!(
            !self.node(child).kind.is_document(),
            "a root node cannot be inserted as a child"
        );
        assert!(
            !self.ancestors(parent).any(|a| a == child),
            "a node cannot be inserted into its own subtree"
        );
    }

    /// Appends `child` as the last child of `parent`, detaching it first.
    ///
    /// # Panics
    ///
    /// Panics if `child` is a root or an ancestor of `parent`.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.assert_insertable(parent, child);
        self.detach(child);

        self.node_mut(child).parent = Some(parent);

        if let Some(last) = self.node(parent).last_child {
            self.node_mut(last).next_sibling = Some(child);
            self.node_mut(child).prev_sibling = Some(last);
            self.node_mut(parent).last_child = Some(child);
        } else {
            self.node_mut(parent).first_child = Some(child);
            self.node_mut(parent).last_child = Some(child);
        }
    }

    /// Inserts `new_child` before `reference`, detaching it first.
    ///
    /// Inserting a node before itself is a no-op.
    ///
    /// # Panics
    ///
    /// Panics if `reference` has no parent, or if `new_child` is a root or an
    /// ancestor of `reference`.
    #[allow(clippy::expect_used)]
    pub fn insert_before(&mut self, reference: NodeId, new_child: NodeId) {
        if reference == new_child {
            return;
        }
        let parent = self
            .node(reference)
            .parent
            .expect("reference has no parent");
        self.assert_insertable(parent, new_child);
        self.detach(new_child);

        self.node_mut(new_child).parent = Some(parent);

        if let Some(prev) = self.node(reference).prev_sibling {
            self.node_mut(prev).next_sibling = Some(new_child);
            self.node_mut(new_child).prev_sibling = Some(prev);
        } else {
            self.node_mut(parent).first_child = Some(new_child);
        }

        self.node_mut(new_child).next_sibling = Some(reference);
        self.node_mut(reference).prev_sibling = Some(new_child);
    }

    /// Inserts `new_child` after `reference`, detaching it first.
    ///
    /// # Panics
    ///
    /// Same conditions as [`insert_before`](Self::insert_before).
    #[allow(clippy::expect_used)]
    pub fn insert_after(&mut self, reference: NodeId, new_child: NodeId) {
        if reference == new_child {
            return;
        }
        match self.next_sibling(reference) {
            Some(next) => self.insert_before(next, new_child),
            None => {
                let parent = self
                    .node(reference)
                    .parent
                    .expect("reference has no parent");
                self.append_child(parent, new_child);
            }
        }
    }

    /// Prepends `child` as the first child of `parent`.
    pub fn prepend_child(&mut self, parent: NodeId, child: NodeId) {
        match self.first_child(parent) {
            Some(first) if first == child => {}
            Some(first) => self.insert_before(first, child),
            None => self.append_child(parent, child),
        }
    }

    /// Detaches a node from the tree.
    ///
    /// The node remains allocated in the arena and can be re-inserted.
    pub fn remove_node(&mut self, id: NodeId) {
        self.detach(id);
    }

    /// Detaches a node from its parent, clearing its parent and sibling links.
    /// Detaching a parentless node is a no-op.
    pub fn detach(&mut self, id: NodeId) {
        let Some(parent) = self.node(id).parent else {
            return;
        };

        let prev = self.node(id).prev_sibling;
        let next = self.node(id).next_sibling;

        match prev {
            Some(p) => self.node_mut(p).next_sibling = next,
            None => self.node_mut(parent).first_child = next,
        }

        match next {
            Some(n) => self.node_mut(n).prev_sibling = prev,
            None => self.node_mut(parent).last_child = prev,
        }

        self.node_mut(id).parent = None;
        self.node_mut(id).prev_sibling = None;
        self.node_mut(id).next_sibling = None;
    }

    /// Detaches every child of `id` and returns them in their former order.
    pub fn remove_children(&mut self, id: NodeId) -> Vec<NodeId> {
        let children: Vec<NodeId> = self.children(id).collect();
        for &child in &children {
            self.detach(child);
        }
        children
    }

    /// Deep-copies a node and its descendants into fresh, parentless nodes.
    ///
    /// Attributes, text and stored data values are copied by value.
    pub fn deep_clone(&mut self, id: NodeId) -> NodeId {
        let copy = self.create_node(self.node(id).kind.clone());
        self.copy_data(id, copy);
        let mut stack = vec![(id, copy)];
        while let Some((src, dst)) = stack.pop() {
            let children: Vec<NodeId> = self.children(src).collect();
            for child in children {
                let c = self.create_node(self.node(child).kind.clone());
                self.copy_data(child, c);
                self.append_child(dst, c);
                stack.push((child, c));
            }
        }
        copy
    }

    fn copy_data(&mut self, from: NodeId, to: NodeId) {
        if let Some(values) = self.data.get(&from).cloned() {
            self.data.insert(to, values);
        }
    }

    /// Deep-copies a subtree of another arena into this one.
    ///
    /// The copy is parentless; stored data values are not carried over.
    pub fn import(&mut self, other: &Document, id: NodeId) -> NodeId {
        let copy = self.create_node(other.node(id).kind.clone());
        let mut stack = vec![(id, copy)];
        while let Some((src, dst)) = stack.pop() {
            for child in other.children(src) {
                let c = self.create_node(other.node(child).kind.clone());
                self.append_child(dst, c);
                stack.push((child, c));
            }
        }
        copy
    }

    /// Returns the total number of nodes in the arena, detached ones included.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len() - 1 // subtract placeholder at index 0
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

// --- Iterators ---

/// Iterator over the children of a node.
pub struct Children<'a> {
    doc: &'a Document,
    next: Option<NodeId>,
}

impl Iterator for Children<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = self.doc.node(current).next_sibling;
        Some(current)
    }
}

/// Iterator over a node and its ancestors.
pub struct Ancestors<'a> {
    doc: &'a Document,
    next: Option<NodeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = self.doc.node(current).parent;
        Some(current)
    }
}

/// Depth-first, pre-order iterator over the descendants of a node.
pub struct Descendants<'a> {
    doc: &'a Document,
    root: NodeId,
    next: Option<NodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;

        if let Some(child) = self.doc.first_child(current) {
            self.next = Some(child);
            return Some(current);
        }

        if let Some(sibling) = self.doc.next_sibling(current) {
            self.next = Some(sibling);
            return Some(current);
        }

        // Walk up to find an ancestor with a next sibling
        let mut ancestor = self.doc.parent(current);
        while let Some(anc) = ancestor {
            if anc == self.root {
                self.next = None;
                return Some(current);
            }
            if let Some(sibling) = self.doc.next_sibling(anc) {
                self.next = Some(sibling);
                return Some(current);
            }
            ancestor = self.doc.parent(anc);
        }

        self.next = None;
        Some(current)
    }
}
