//! Generic radix trie: an ordered map from string keys to values with
//! multi-byte edge labels.
//!
//! Nodes live in an arena (`Vec`) and refer to each other by index, so the
//! parent back-reference needed for the ancestor walk never owns anything;
//! child ownership through edges is the sole source of liveness.
//!
//! Maintained invariants, checked by the test-only auditor:
//! - no edge label is empty;
//! - edge labels at a node are sorted lexicographically;
//! - sibling edges share no common prefix (shared prefixes are factored
//!   into a parent edge at insertion time).

use crate::router::pattern::{common_prefix_len, route_match};

/// Opaque index of a trie node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

const ROOT: NodeId = NodeId(0);

#[derive(Debug)]
struct Edge {
    prefix: String,
    child: NodeId,
}

#[derive(Debug)]
struct Node<T> {
    parent: Option<NodeId>,
    value: Option<T>,
    edges: Vec<Edge>,
}

/// Radix trie mapping string keys to values of type `T`.
///
/// Leaves and interior nodes may both carry values; interior nodes created
/// by edge splits start without one and can be claimed by a later insertion
/// of the exact prefix key.
#[derive(Debug)]
pub struct RadixTrie<T> {
    nodes: Vec<Node<T>>,
    len: usize,
}

impl<T> Default for RadixTrie<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> RadixTrie<T> {
    pub fn new() -> Self {
        RadixTrie {
            nodes: vec![Node {
                parent: None,
                value: None,
                edges: Vec::new(),
            }],
            len: 0,
        }
    }

    /// Number of stored values.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Value stored at `id`, if the node carries one.
    #[inline]
    pub fn value(&self, id: NodeId) -> Option<&T> {
        self.nodes[id.0].value.as_ref()
    }

    /// Parent of `id`; `None` at the root.
    #[inline]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    /// Walks from `id` to the root, yielding `id` first.
    ///
    /// This is the ancestor chain the router reverses into root-to-leaf
    /// handler order.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        let mut cursor = Some(id);
        std::iter::from_fn(move || {
            let current = cursor?;
            cursor = self.nodes[current.0].parent;
            Some(current)
        })
    }

    /// Inserts `key` with `value`. Unique keys only: an exact duplicate is
    /// rejected and `None` is returned, leaving the trie unchanged.
    pub fn insert(&mut self, key: &str, value: T) -> Option<NodeId> {
        if key.is_empty() {
            return None;
        }

        let mut cur = ROOT;
        let mut rest = key;

        loop {
            let Some(edge_idx) = self.find_edge(cur, rest.as_bytes()[0]) else {
                // No edge shares a prefix: attach the remaining key whole.
                let child = self.alloc(cur, Some(value));
                self.attach_edge(cur, rest.to_string(), child);
                self.len += 1;
                return Some(child);
            };

            let (prefix_len, child, matched) = {
                let edge = &self.nodes[cur.0].edges[edge_idx];
                (
                    edge.prefix.len(),
                    edge.child,
                    common_prefix_len(&edge.prefix, rest),
                )
            };

            if matched == prefix_len && matched == rest.len() {
                // The node for this exact key already exists; claim it if it
                // is a valueless intermediate, reject if it holds a value.
                let node = &mut self.nodes[child.0];
                if node.value.is_some() {
                    return None;
                }
                node.value = Some(value);
                self.len += 1;
                return Some(child);
            }

            if matched == prefix_len {
                // Edge label fully consumed, key has residual: descend.
                rest = &rest[matched..];
                cur = child;
                continue;
            }

            // The edge label and the key diverge inside the label: factor
            // the shared prefix into a new intermediate node.
            let mid = self.split_edge(cur, edge_idx, matched);

            if matched == rest.len() {
                // Key exhausted at the split point: the intermediate carries
                // the value.
                self.nodes[mid.0].value = Some(value);
                self.len += 1;
                return Some(mid);
            }

            let leaf = self.alloc(mid, Some(value));
            self.attach_edge(mid, rest[matched..].to_string(), leaf);
            self.len += 1;
            return Some(leaf);
        }
    }

    /// Exact lookup. Returns the node only when the full key is present and
    /// carries a value.
    pub fn find(&self, key: &str) -> Option<NodeId> {
        if key.is_empty() {
            return None;
        }

        let mut cur = ROOT;
        let mut rest = key;

        while !rest.is_empty() {
            let edge_idx = self.find_edge(cur, rest.as_bytes()[0])?;
            let edge = &self.nodes[cur.0].edges[edge_idx];

            let matched = common_prefix_len(&edge.prefix, rest);
            if matched < edge.prefix.len() {
                return None;
            }
            cur = edge.child;
            rest = &rest[matched..];
        }

        self.nodes[cur.0].value.is_some().then_some(cur)
    }

    /// Pattern-aware lookup: per-edge matching honours `<name>` placeholders
    /// and accumulates `(name, value)` bindings along the descent.
    ///
    /// At each node the edge matching the path's first byte is preferred;
    /// the placeholder edge (label starting `<`) is consulted only when the
    /// literal edge yields nothing. Bindings are meaningful only when the
    /// lookup succeeds.
    pub fn find_route(
        &self,
        path: &str,
        bindings: &mut Vec<(String, String)>,
    ) -> Option<NodeId> {
        if path.is_empty() {
            return None;
        }

        let mut cur = ROOT;
        let mut rest = path;

        loop {
            let literal = self.find_edge(cur, rest.as_bytes()[0]);
            let placeholder = self.find_edge(cur, b'<');

            let mut descend = None;
            for edge_idx in [literal, placeholder].into_iter().flatten() {
                let edge = &self.nodes[cur.0].edges[edge_idx];
                let m = route_match(&edge.prefix, rest);

                if m.pattern_len != edge.prefix.len() {
                    continue;
                }
                if m.query_len == rest.len() {
                    if self.nodes[edge.child.0].value.is_some() {
                        bindings.extend(m.bindings);
                        return Some(edge.child);
                    }
                    continue;
                }
                if m.query_len > 0 {
                    descend = Some((edge.child, m.query_len, m.bindings));
                    break;
                }
            }

            let (child, consumed, kvs) = descend?;
            bindings.extend(kvs);
            cur = child;
            rest = &rest[consumed..];
        }
    }

    // Allocation and edge bookkeeping.

    fn alloc(&mut self, parent: NodeId, value: Option<T>) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            parent: Some(parent),
            value,
            edges: Vec::new(),
        });
        id
    }

    // Edges stay sorted; first bytes are pairwise distinct, so the binary
    // search resolves a byte to at most one edge.
    #[inline]
    fn find_edge(&self, node: NodeId, first: u8) -> Option<usize> {
        self.nodes[node.0]
            .edges
            .binary_search_by(|e| e.prefix.as_bytes()[0].cmp(&first))
            .ok()
    }

    fn attach_edge(&mut self, parent: NodeId, prefix: String, child: NodeId) {
        debug_assert!(!prefix.is_empty());
        let edges = &mut self.nodes[parent.0].edges;
        let at = edges
            .binary_search_by(|e| e.prefix.as_str().cmp(prefix.as_str()))
            .unwrap_or_else(|i| i);
        edges.insert(at, Edge { prefix, child });
    }

    /// Splits the edge at `edge_idx` after `at` bytes: a fresh valueless
    /// intermediate node takes over the shared prefix, and the old child is
    /// re-parented under it with the shortened label.
    fn split_edge(&mut self, parent: NodeId, edge_idx: usize, at: usize) -> NodeId {
        let mid = self.alloc(parent, None);

        let (old_child, suffix) = {
            let edge = &mut self.nodes[parent.0].edges[edge_idx];
            let old_child = edge.child;
            let suffix = edge.prefix.split_off(at);
            edge.child = mid;
            (old_child, suffix)
        };

        self.nodes[old_child.0].parent = Some(mid);
        self.nodes[mid.0]
            .edges
            .push(Edge {
                prefix: suffix,
                child: old_child,
            });
        mid
    }
}

#[cfg(test)]
impl<T> RadixTrie<T> {
    pub(crate) fn root(&self) -> NodeId {
        ROOT
    }

    pub(crate) fn edge_labels(&self, id: NodeId) -> Vec<String> {
        self.nodes[id.0].edges.iter().map(|e| e.prefix.clone()).collect()
    }

    pub(crate) fn child(&self, id: NodeId, label: &str) -> Option<NodeId> {
        self.nodes[id.0]
            .edges
            .iter()
            .find(|e| e.prefix == label)
            .map(|e| e.child)
    }

    pub(crate) fn assert_invariants(&self) {
        let mut value_count = 0;
        for (idx, node) in self.nodes.iter().enumerate() {
            if node.value.is_some() {
                value_count += 1;
            }
            for pair in node.edges.windows(2) {
                assert!(
                    pair[0].prefix < pair[1].prefix,
                    "edges unsorted at node {idx}: {:?} >= {:?}",
                    pair[0].prefix,
                    pair[1].prefix
                );
                assert_eq!(
                    common_prefix_len(&pair[0].prefix, &pair[1].prefix),
                    0,
                    "sibling edges share a prefix at node {idx}: {:?} / {:?}",
                    pair[0].prefix,
                    pair[1].prefix
                );
            }
            for edge in &node.edges {
                assert!(!edge.prefix.is_empty(), "empty edge label at node {idx}");
                assert_eq!(
                    self.nodes[edge.child.0].parent,
                    Some(NodeId(idx)),
                    "parent back-reference broken under node {idx}"
                );
            }
        }
        assert_eq!(value_count, self.len, "len out of sync with stored values");
    }
}
