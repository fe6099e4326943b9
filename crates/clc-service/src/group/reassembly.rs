//! Rebuilds a sorted tree from the unordered stream of annotated groups.

use std::collections::HashMap;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use clc_entity::group::{NodeProjection, ReassembledNode, sibling_order};

use super::error::{ConsistencyError, WalkError};

/// Identity-keyed table of projections awaiting reassembly.
///
/// Owned by a single consumer; arrival order does not matter.
#[derive(Debug, Default)]
pub struct Reassembler {
    nodes: HashMap<String, NodeProjection>,
    duplicate: Option<String>,
}

impl Reassembler {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct groups received so far.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if nothing has been received.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Add a projection. A repeated id is remembered and reported by
    /// [`Reassembler::finish`].
    pub fn insert(&mut self, projection: NodeProjection) {
        if self.nodes.contains_key(&projection.id) {
            self.duplicate.get_or_insert_with(|| projection.id.clone());
            return;
        }
        self.nodes.insert(projection.id.clone(), projection);
    }

    /// Link every group under its parent and return the root.
    ///
    /// Siblings are placed by binary search so each child list is sorted by
    /// [`sibling_order`] as it is built.
    pub fn finish(mut self) -> Result<ReassembledNode, ConsistencyError> {
        if let Some(id) = self.duplicate {
            return Err(ConsistencyError::DuplicateId { id });
        }

        let mut roots: Vec<String> = self
            .nodes
            .values()
            .filter(|p| p.is_root())
            .map(|p| p.id.clone())
            .collect();
        roots.sort();
        let root_id = match roots.len() {
            0 => return Err(ConsistencyError::NoRoot),
            1 => roots.remove(0),
            _ => return Err(ConsistencyError::MultipleRoots { ids: roots }),
        };

        let mut children: HashMap<String, Vec<String>> = HashMap::new();
        for node in self.nodes.values().filter(|p| !p.is_root()) {
            if !self.nodes.contains_key(&node.parent_id) {
                return Err(ConsistencyError::MissingParent {
                    id: node.id.clone(),
                    parent_id: node.parent_id.clone(),
                });
            }

            let siblings = children.entry(node.parent_id.clone()).or_default();
            let pos = siblings
                .binary_search_by(|probe| {
                    let other = &self.nodes[probe];
                    sibling_order(order_key(other), order_key(node))
                })
                .unwrap_or_else(|pos| pos);
            siblings.insert(pos, node.id.clone());
        }

        let tree = assemble(&root_id, &mut self.nodes, &mut children)
            .ok_or(ConsistencyError::NoRoot)?;

        if !self.nodes.is_empty() {
            return Err(ConsistencyError::Detached {
                root: root_id,
                count: self.nodes.len(),
            });
        }

        Ok(tree)
    }
}

fn order_key(p: &NodeProjection) -> (&clc_entity::group::GroupType, &str, &str) {
    (&p.group_type, p.name.as_str(), p.id.as_str())
}

/// Build the subtree under `root_id`, consuming its entries from `nodes`.
///
/// Uses an explicit stack so arbitrarily deep chains cannot overflow.
fn assemble(
    root_id: &str,
    nodes: &mut HashMap<String, NodeProjection>,
    children: &mut HashMap<String, Vec<String>>,
) -> Option<ReassembledNode> {
    let root = nodes.remove(root_id)?;
    let mut stack = vec![(
        ReassembledNode::from_projection(root),
        children.remove(root_id).unwrap_or_default().into_iter(),
    )];

    loop {
        let (_, pending) = stack.last_mut()?;
        if let Some(child_id) = pending.next() {
            if let Some(projection) = nodes.remove(&child_id) {
                let grandchildren = children.remove(&child_id).unwrap_or_default();
                stack.push((
                    ReassembledNode::from_projection(projection),
                    grandchildren.into_iter(),
                ));
            }
            continue;
        }

        let (done, _) = stack.pop()?;
        match stack.last_mut() {
            Some((parent, _)) => parent.children.push(done),
            None => return Some(done),
        }
    }
}

/// Drain the processed stream into a [`Reassembler`].
///
/// Stops with [`WalkError::Cancelled`] as soon as `cancel` fires; no partial
/// table is returned.
pub async fn drain(
    mut rx: mpsc::Receiver<NodeProjection>,
    cancel: &CancellationToken,
) -> Result<Reassembler, WalkError> {
    let mut table = Reassembler::new();

    loop {
        let next = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::debug!(received = table.len(), "Reassembly stopped by cancellation");
                return Err(WalkError::Cancelled);
            }
            next = rx.recv() => next,
        };

        match next {
            Some(projection) => table.insert(projection),
            None => break,
        }
    }

    tracing::debug!(received = table.len(), "Reassembly input drained");
    Ok(table)
}
