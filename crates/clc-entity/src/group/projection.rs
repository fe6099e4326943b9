//! Flattened per-node record produced while walking a hierarchy.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::node::{GroupNode, GroupType};

/// One group, detached from its children, with an explicit parent link.
///
/// The parent is referenced by id; the root has an empty `parent_id`.
/// Annotation callbacks attach extra data through `annotations`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeProjection {
    /// Group identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Folder kind.
    pub group_type: GroupType,
    /// Identifier of the parent group, empty for the root.
    pub parent_id: String,
    /// Servers directly inside this group.
    pub server_ids: Vec<String>,
    /// Data attached by annotation callbacks.
    #[serde(default)]
    pub annotations: BTreeMap<String, serde_json::Value>,
}

impl NodeProjection {
    /// Project a single group, ignoring its children.
    pub fn from_node(node: &GroupNode, parent_id: &str) -> Self {
        Self {
            id: node.id.clone(),
            name: node.name.clone(),
            group_type: node.group_type.clone(),
            parent_id: parent_id.to_string(),
            server_ids: node.server_ids.clone(),
            annotations: BTreeMap::new(),
        }
    }

    /// Check if this projection is the hierarchy root.
    pub fn is_root(&self) -> bool {
        self.parent_id.is_empty()
    }

    /// Attach or replace an annotation.
    pub fn annotate(&mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) {
        self.annotations.insert(key.into(), value.into());
    }
}
