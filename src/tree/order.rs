//! Document-order comparison and de-duplication.
//!
//! Document order is the pre-order, depth-first position of a node. Nodes
//! under different roots (the document and detached fragments) are ordered
//! by the allocation order of their roots, which is stable but otherwise
//! unspecified.

use super::{Document, NodeId};
use std::cmp::Ordering;
use std::collections::HashSet;

impl Document {
    /// Compares two nodes by document order.
    #[must_use]
    pub fn compare_order(&self, a: NodeId, b: NodeId) -> Ordering {
        if a == b {
            return Ordering::Equal;
        }
        let path_a = self.path_from_root(a);
        let path_b = self.path_from_root(b);

        if path_a[0] != path_b[0] {
            return path_a[0].cmp(&path_b[0]);
        }

        let common = path_a
            .iter()
            .zip(&path_b)
            .take_while(|(x, y)| x == y)
            .count();

        // One node is an ancestor of the other.
        if common == path_a.len() {
            return Ordering::Less;
        }
        if common == path_b.len() {
            return Ordering::Greater;
        }

        // Siblings under the deepest common ancestor.
        let target = path_b[common];
        let mut cur = self.next_sibling(path_a[common]);
        while let Some(n) = cur {
            if n == target {
                return Ordering::Less;
            }
            cur = self.next_sibling(n);
        }
        Ordering::Greater
    }

    /// Removes duplicate ids and sorts the rest into document order.
    pub fn unique_sort(&self, nodes: &mut Vec<NodeId>) {
        let mut seen = HashSet::with_capacity(nodes.len());
        nodes.retain(|&n| seen.insert(n));
        if nodes.len() > 1 {
            nodes.sort_by(|&a, &b| self.compare_order(a, b));
        }
    }

    /// Removes duplicate ids, keeping the first occurrence and the order.
    pub fn dedup_in_place(nodes: &mut Vec<NodeId>) {
        let mut seen = HashSet::with_capacity(nodes.len());
        nodes.retain(|&n| seen.insert(n));
    }

    /// Returns the chain from the topmost ancestor down to `id`.
    fn path_from_root(&self, id: NodeId) -> Vec<NodeId> {
        let mut path: Vec<NodeId> = self.ancestors(id).collect();
        path.reverse();
        path
    }
}
