//! Shared fixtures for walk integration tests.

#![allow(dead_code)]

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use clc_core::error::AppError;
use clc_core::result::AppResult;
use clc_entity::group::{GroupNode, GroupType, NodeProjection, ReassembledNode, sibling_order};
use clc_service::NodeAnnotator;

/// Build a pseudo-random hierarchy of `count` groups from `seed`.
///
/// Names repeat with mixed case and a share of the groups are special
/// types so the ordering rule gets exercised.
pub fn generated_tree(count: usize, seed: u64) -> GroupNode {
    let mut state = seed;
    let mut next = move || {
        state = state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        (state >> 33) as usize
    };

    let names = ["web", "Web", "db", "Alpha", "alpha", "cache", "Batch", "zeta"];
    let mut flat: Vec<(GroupNode, Option<usize>)> = Vec::with_capacity(count);
    flat.push((GroupNode::new("g0", "Root", GroupType::Default), None));

    for i in 1..count {
        let group_type = match next() % 6 {
            0 => GroupType::Archive,
            1 => GroupType::Template,
            _ => GroupType::Default,
        };
        let name = names[next() % names.len()];
        let servers = (0..next() % 4).map(|s| format!("SRV-{i}-{s}"));
        let node = GroupNode::new(format!("g{i}"), name, group_type).with_servers(servers);
        let parent = next() % i;
        flat.push((node, Some(parent)));
    }

    // Children always have a higher index than their parent, so folding
    // from the back attaches complete subtrees.
    let mut slots: Vec<Option<GroupNode>> = Vec::with_capacity(count);
    let mut parents = Vec::with_capacity(count);
    for (node, parent) in flat {
        slots.push(Some(node));
        parents.push(parent);
    }
    for i in (1..count).rev() {
        let child = slots[i].take().expect("unattached child");
        let parent = parents[i].expect("non-root has parent");
        slots[parent]
            .as_mut()
            .expect("parent still present")
            .groups
            .insert(0, child);
    }
    slots[0].take().expect("root")
}

/// Map of id to sorted server ids for every group in an input tree.
pub fn input_membership(root: &GroupNode) -> BTreeMap<String, BTreeSet<String>> {
    let mut out = BTreeMap::new();
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        out.insert(node.id.clone(), node.server_ids.iter().cloned().collect());
        stack.extend(node.groups.iter());
    }
    out
}

/// Map of id to sorted server ids for every group in an output tree.
pub fn output_membership(root: &ReassembledNode) -> BTreeMap<String, BTreeSet<String>> {
    root.iter()
        .map(|n| (n.id.clone(), n.server_ids.iter().cloned().collect()))
        .collect()
}

/// Assert every child list in the tree is sorted for display.
pub fn assert_sorted(root: &ReassembledNode) {
    for node in root.iter() {
        for pair in node.children.windows(2) {
            let (a, b) = (&pair[0], &pair[1]);
            let ord = sibling_order(
                (&a.group_type, a.name.as_str(), a.id.as_str()),
                (&b.group_type, b.name.as_str(), b.id.as_str()),
            );
            assert!(
                ord.is_lt(),
                "children of '{}' out of order: '{}' ({}) before '{}' ({})",
                node.id,
                a.name,
                a.group_type,
                b.name,
                b.group_type
            );
        }
    }
}

/// Counts invocations and tasks still inside the callback.
#[derive(Default)]
pub struct Probe {
    pub calls: AtomicUsize,
    pub live: AtomicUsize,
}

struct LiveGuard<'a>(&'a AtomicUsize);

impl Drop for LiveGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Sleeps for `delay` per group and optionally fails on one id.
pub struct SlowAnnotator {
    pub delay: Duration,
    pub fail_on: Option<String>,
    pub probe: Arc<Probe>,
}

impl SlowAnnotator {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            fail_on: None,
            probe: Arc::new(Probe::default()),
        }
    }

    pub fn failing_on(mut self, id: &str) -> Self {
        self.fail_on = Some(id.to_string());
        self
    }
}

#[async_trait]
impl NodeAnnotator for SlowAnnotator {
    async fn annotate(
        &self,
        _cancel: &CancellationToken,
        node: &mut NodeProjection,
    ) -> AppResult<()> {
        self.probe.calls.fetch_add(1, Ordering::SeqCst);
        self.probe.live.fetch_add(1, Ordering::SeqCst);
        let _guard = LiveGuard(&self.probe.live);

        tokio::time::sleep(self.delay).await;

        if self.fail_on.as_deref() == Some(node.id.as_str()) {
            return Err(AppError::external(format!("lookup for {} failed", node.id)));
        }
        node.annotate("visited", true);
        Ok(())
    }
}
