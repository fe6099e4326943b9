//! Integration tests for the concurrent group walk.

mod helpers;

use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use clc_client::GroupSource;
use clc_core::error::{AppError, ErrorKind};
use clc_core::result::AppResult;
use clc_entity::group::{GroupNode, GroupType, NodeProjection};
use clc_service::group::ConsistencyError;
use clc_service::{
    GroupWalker, NoopAnnotator, ServerCountAnnotator, WalkError, WalkOptions, walk_and_transform,
};

use helpers::SlowAnnotator;

fn child_ids(node: &clc_entity::group::ReassembledNode) -> Vec<&str> {
    node.children.iter().map(|c| c.id.as_str()).collect()
}

#[tokio::test]
async fn test_archive_sorts_before_default() {
    let root = GroupNode::new("R", "root", GroupType::Default)
        .with_child(GroupNode::new("A", "zeta", GroupType::Default))
        .with_child(GroupNode::new("B", "alpha", GroupType::Archive));

    let tree = GroupWalker::new(WalkOptions::default())
        .walk(&CancellationToken::new(), &root)
        .await
        .expect("walk");

    assert_eq!(tree.id, "R");
    assert_eq!(child_ids(&tree), vec!["B", "A"]);
}

#[tokio::test]
async fn test_names_compare_case_insensitively() {
    let root = GroupNode::new("R", "root", GroupType::Default)
        .with_child(GroupNode::new("C1", "Bravo", GroupType::Default))
        .with_child(GroupNode::new("C2", "alpha", GroupType::Default));

    let tree = GroupWalker::new(WalkOptions::default())
        .walk(&CancellationToken::new(), &root)
        .await
        .expect("walk");

    assert_eq!(child_ids(&tree), vec!["C2", "C1"]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_membership_sort_and_single_root() {
    for seed in [1u64, 7, 42, 1234] {
        let root = helpers::generated_tree(200, seed);
        let tree = walk_and_transform(
            &CancellationToken::new(),
            &root,
            Arc::new(NoopAnnotator),
            &WalkOptions::default().with_worker_count(8),
        )
        .await
        .expect("walk");

        assert_eq!(tree.id, root.id);
        assert_eq!(tree.group_count(), root.group_count());
        assert_eq!(
            helpers::output_membership(&tree),
            helpers::input_membership(&root),
            "membership differs for seed {seed}"
        );
        helpers::assert_sorted(&tree);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_noop_walk_is_deterministic() {
    let root = helpers::generated_tree(150, 99);
    let walker = GroupWalker::new(WalkOptions::default());
    let cancel = CancellationToken::new();

    let first = walker.walk(&cancel, &root).await.expect("first walk");
    let second = walker.walk(&cancel, &root).await.expect("second walk");
    let narrow = GroupWalker::new(WalkOptions::default().with_worker_count(1))
        .walk(&cancel, &root)
        .await
        .expect("single worker walk");

    assert_eq!(first, second);
    assert_eq!(first, narrow);
}

#[tokio::test]
async fn test_callback_error_fails_fast() {
    let root = helpers::generated_tree(40, 5);
    let total = root.group_count();
    let annotator = Arc::new(SlowAnnotator::new(Duration::from_millis(2)).failing_on("g17"));
    let probe = Arc::clone(&annotator.probe);
    let cancel = CancellationToken::new();

    let err = walk_and_transform(&cancel, &root, annotator, &WalkOptions::default())
        .await
        .unwrap_err();

    match &err {
        WalkError::Callback { node_id, source } => {
            assert_eq!(node_id, "g17");
            assert_eq!(source.kind, ErrorKind::ExternalService);
        }
        other => panic!("expected callback error, got {other}"),
    }
    assert!(!err.is_cancellation());
    assert!(probe.calls.load(Ordering::SeqCst) <= total);
    assert_eq!(probe.live.load(Ordering::SeqCst), 0, "callback still running");
    assert!(!cancel.is_cancelled(), "caller token must not be cancelled");

    let app: AppError = err.into();
    assert_eq!(app.kind, ErrorKind::ExternalService);
}

#[tokio::test]
async fn test_precancelled_spawns_nothing() {
    let root = helpers::generated_tree(30, 3);
    let annotator = Arc::new(SlowAnnotator::new(Duration::from_millis(1)));
    let probe = Arc::clone(&annotator.probe);
    let cancel = CancellationToken::new();
    cancel.cancel();

    let started = Instant::now();
    let result = walk_and_transform(&cancel, &root, annotator, &WalkOptions::default()).await;

    assert!(matches!(result, Err(WalkError::Cancelled)));
    assert_eq!(probe.calls.load(Ordering::SeqCst), 0);
    assert!(started.elapsed() < Duration::from_millis(50));
}

#[tokio::test]
async fn test_cancel_mid_walk_joins_workers() {
    let root = helpers::generated_tree(100, 11);
    let annotator = Arc::new(SlowAnnotator::new(Duration::from_millis(40)));
    let probe = Arc::clone(&annotator.probe);
    let cancel = CancellationToken::new();

    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(30)).await;
        trigger.cancel();
    });

    let options = WalkOptions::default().with_worker_count(4);
    let result = walk_and_transform(&cancel, &root, annotator, &options).await;

    assert!(matches!(result, Err(WalkError::Cancelled)));
    assert!(probe.calls.load(Ordering::SeqCst) < root.group_count());
    assert_eq!(probe.live.load(Ordering::SeqCst), 0, "worker outlived the walk");
}

#[tokio::test]
async fn test_deadline_exceeded() {
    let root = helpers::generated_tree(20, 8);
    let annotator = Arc::new(SlowAnnotator::new(Duration::from_millis(200)));
    let probe = Arc::clone(&annotator.probe);
    let cancel = CancellationToken::new();

    let options = WalkOptions::default().with_deadline(Duration::from_millis(30));
    let started = Instant::now();
    let result = walk_and_transform(&cancel, &root, annotator, &options).await;

    assert!(matches!(result, Err(WalkError::DeadlineExceeded(d)) if d == Duration::from_millis(30)));
    assert!(started.elapsed() < Duration::from_millis(180));
    assert_eq!(probe.live.load(Ordering::SeqCst), 0);
    assert!(!cancel.is_cancelled());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_callbacks_run_in_parallel() {
    let root = helpers::generated_tree(50, 21);
    assert_eq!(root.group_count(), 50);
    let annotator = Arc::new(SlowAnnotator::new(Duration::from_millis(10)));
    let probe = Arc::clone(&annotator.probe);

    let started = Instant::now();
    let tree = walk_and_transform(
        &CancellationToken::new(),
        &root,
        annotator,
        &WalkOptions::default(),
    )
    .await
    .expect("walk");
    let elapsed = started.elapsed();

    assert_eq!(probe.calls.load(Ordering::SeqCst), 50);
    assert_eq!(tree.group_count(), 50);
    assert!(
        elapsed < Duration::from_millis(250),
        "50 x 10ms callbacks took {elapsed:?}"
    );
}

#[tokio::test]
async fn test_annotations_reach_output() {
    let root = GroupNode::new("R", "root", GroupType::Default)
        .with_child(GroupNode::new("W", "web", GroupType::Default).with_servers(["S1", "S2"]))
        .with_child(GroupNode::new("T", "Templates", GroupType::Template));

    let tree = GroupWalker::new(WalkOptions::default())
        .with_annotator(Arc::new(ServerCountAnnotator))
        .walk(&CancellationToken::new(), &root)
        .await
        .expect("walk");

    let web = tree.find("W").expect("web group");
    assert_eq!(web.annotations["server_count"], serde_json::json!(2));
    let templates = tree.find("T").expect("template group");
    assert_eq!(templates.annotations["server_count"], serde_json::json!(0));
    assert_eq!(tree.total_servers(), 2);
}

#[tokio::test]
async fn test_callback_breaking_links_is_consistency_error() {
    let root = GroupNode::new("R", "root", GroupType::Default)
        .with_child(GroupNode::new("A", "a", GroupType::Default))
        .with_child(GroupNode::new("B", "b", GroupType::Default));

    let relink = |node: &mut NodeProjection| -> AppResult<()> {
        if node.id == "B" {
            node.parent_id = "ghost".to_string();
        }
        Ok(())
    };

    let err = walk_and_transform(
        &CancellationToken::new(),
        &root,
        Arc::new(relink),
        &WalkOptions::default(),
    )
    .await
    .unwrap_err();

    match err {
        WalkError::Consistency(ConsistencyError::MissingParent { id, parent_id }) => {
            assert_eq!(id, "B");
            assert_eq!(parent_id, "ghost");
        }
        other => panic!("expected consistency error, got {other}"),
    }
}

struct FixedSource(GroupNode);

#[async_trait]
impl GroupSource for FixedSource {
    fn source_type(&self) -> &str {
        "fixed"
    }

    async fn fetch_group_hierarchy(&self, location: &str) -> AppResult<GroupNode> {
        if location == "WA1" {
            Ok(self.0.clone())
        } else {
            Err(AppError::not_found(format!("unknown location {location}")))
        }
    }
}

#[tokio::test]
async fn test_fetch_and_walk() {
    let source = FixedSource(helpers::generated_tree(25, 2));
    let walker = GroupWalker::new(WalkOptions::default());
    let cancel = CancellationToken::new();

    let tree = walker
        .fetch_and_walk(&cancel, &source, "WA1")
        .await
        .expect("walk");
    assert_eq!(tree.group_count(), 25);

    let err = walker
        .fetch_and_walk(&cancel, &source, "UC1")
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);
}

struct SlowSource {
    delay: Duration,
    root: GroupNode,
}

#[async_trait]
impl GroupSource for SlowSource {
    fn source_type(&self) -> &str {
        "slow"
    }

    async fn fetch_group_hierarchy(&self, _location: &str) -> AppResult<GroupNode> {
        tokio::time::sleep(self.delay).await;
        Ok(self.root.clone())
    }
}

#[tokio::test]
async fn test_deadline_covers_fetch() {
    let source = SlowSource {
        delay: Duration::from_millis(500),
        root: helpers::generated_tree(10, 4),
    };
    let walker = GroupWalker::new(WalkOptions::default().with_deadline(Duration::from_millis(30)));

    let started = Instant::now();
    let err = walker
        .fetch_and_walk(&CancellationToken::new(), &source, "WA1")
        .await
        .unwrap_err();

    assert_eq!(err.kind, ErrorKind::Timeout);
    assert!(started.elapsed() < Duration::from_millis(300));
}

#[tokio::test]
async fn test_fetch_time_counts_against_walk_deadline() {
    let source = SlowSource {
        delay: Duration::from_millis(40),
        root: helpers::generated_tree(20, 6),
    };
    let annotator = Arc::new(SlowAnnotator::new(Duration::from_millis(30)));
    let walker = GroupWalker::new(
        WalkOptions::default()
            .with_worker_count(1)
            .with_deadline(Duration::from_millis(100)),
    )
    .with_annotator(annotator);

    let started = Instant::now();
    let err = walker
        .fetch_and_walk(&CancellationToken::new(), &source, "WA1")
        .await
        .unwrap_err();

    assert_eq!(err.kind, ErrorKind::Timeout);
    assert!(err.message.contains("100ms"), "unexpected message: {}", err.message);
    assert!(started.elapsed() < Duration::from_millis(250));
}
