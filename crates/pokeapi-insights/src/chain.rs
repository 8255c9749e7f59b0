//! Evolution-chain traversal.
//!
//! A chain node looks like `{ "species": { "name": .. }, "evolves_to": [..] }`.
//! Nodes are visited breadth-first with children in document order; nothing
//! is sorted. Chains are owned JSON trees, so a walk always terminates. A
//! species name that appears twice is simply visited twice.

use std::collections::VecDeque;

use serde_json::Value;

use crate::doc::DocExt;

/// Breadth-first iterator over the nodes of a chain.
pub struct ChainWalk<'a> {
    queue: VecDeque<&'a Value>,
}

impl<'a> Iterator for ChainWalk<'a> {
    type Item = &'a Value;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.queue.pop_front()?;
        self.queue.extend(successors(node));
        Some(node)
    }
}

/// Walk `root` and every node reachable through `evolves_to`.
pub fn walk(root: &Value) -> ChainWalk<'_> {
    ChainWalk {
        queue: VecDeque::from([root]),
    }
}

/// Species name held by a chain node.
pub fn node_name(node: &Value) -> Option<&str> {
    node.str_at(&["species", "name"])
}

/// Direct successors of a chain node.
pub fn successors(node: &Value) -> &[Value] {
    node.items(&["evolves_to"])
}

/// Species names of a chain in breadth-first order.
///
/// Nodes without a species name are traversed but not emitted.
pub fn flatten(root: &Value) -> Vec<String> {
    walk(root)
        .filter_map(node_name)
        .map(str::to_string)
        .collect()
}

/// True when some node named `name` has at least one successor.
pub fn has_successor(root: &Value, name: &str) -> bool {
    walk(root).any(|node| node_name(node) == Some(name) && !successors(node).is_empty())
}
