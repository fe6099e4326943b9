//! Sorted tree rebuilt from walked projections, ready for display.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::node::GroupType;
use super::projection::NodeProjection;

/// A node in a reassembled group tree.
///
/// `children` is kept sorted by [`super::order::sibling_order`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReassembledNode {
    /// Group identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Folder kind.
    #[serde(rename = "type")]
    pub group_type: GroupType,
    /// Servers directly inside this group.
    pub server_ids: Vec<String>,
    /// Data attached by annotation callbacks.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, serde_json::Value>,
    /// Child groups in display order.
    #[serde(default)]
    pub children: Vec<ReassembledNode>,
}

impl ReassembledNode {
    /// Build a childless node from a projection, dropping its parent link.
    pub fn from_projection(projection: NodeProjection) -> Self {
        Self {
            id: projection.id,
            name: projection.name,
            group_type: projection.group_type,
            server_ids: projection.server_ids,
            annotations: projection.annotations,
            children: Vec::new(),
        }
    }

    /// Number of groups in this subtree, including `self`.
    pub fn group_count(&self) -> usize {
        self.iter().count()
    }

    /// Number of servers in this subtree.
    pub fn total_servers(&self) -> usize {
        self.iter().map(|n| n.server_ids.len()).sum()
    }

    /// Find a group by id anywhere in this subtree.
    pub fn find(&self, id: &str) -> Option<&ReassembledNode> {
        self.iter().find(|n| n.id == id)
    }

    /// Pre-order iterator over this subtree.
    pub fn iter(&self) -> Iter<'_> {
        Iter { stack: vec![self] }
    }

    /// Pre-order iterator yielding each node with its depth below `self`.
    pub fn iter_with_depth(&self) -> impl Iterator<Item = (usize, &ReassembledNode)> {
        let mut stack = vec![(0usize, self)];
        std::iter::from_fn(move || {
            let (depth, node) = stack.pop()?;
            stack.extend(node.children.iter().rev().map(|c| (depth + 1, c)));
            Some((depth, node))
        })
    }
}

/// Pre-order iterator returned by [`ReassembledNode::iter`].
#[derive(Debug)]
pub struct Iter<'a> {
    stack: Vec<&'a ReassembledNode>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a ReassembledNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children.iter().rev());
        Some(node)
    }
}
