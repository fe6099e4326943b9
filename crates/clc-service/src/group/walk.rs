//! Entry point of the group walk: flatten, annotate, reassemble.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::instrument;

use clc_client::GroupSource;
use clc_core::config::WalkConfig;
use clc_core::error::AppError;
use clc_entity::group::{GroupNode, ReassembledNode};

use super::annotator::{NodeAnnotator, NoopAnnotator};
use super::error::WalkError;
use super::{pool, producer, reassembly};

/// Parameters of a single walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkOptions {
    /// Maximum number of annotation callbacks running at once.
    pub worker_count: usize,
    /// Buffer size of the channels between stages.
    pub channel_capacity: usize,
    /// Cancel the walk once this much time has passed.
    pub deadline: Option<Duration>,
}

impl Default for WalkOptions {
    fn default() -> Self {
        Self {
            worker_count: 20,
            channel_capacity: 64,
            deadline: None,
        }
    }
}

impl WalkOptions {
    /// Build options from the `[walk]` configuration section.
    pub fn from_config(config: &WalkConfig) -> Self {
        Self {
            worker_count: config.worker_count,
            channel_capacity: config.channel_capacity,
            deadline: config.deadline_seconds.map(Duration::from_secs),
        }
    }

    /// Override the worker count.
    pub fn with_worker_count(mut self, worker_count: usize) -> Self {
        self.worker_count = worker_count;
        self
    }

    /// Set a deadline for the whole walk.
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    fn check(&self) -> Result<(), WalkError> {
        if self.worker_count == 0 {
            return Err(WalkError::InvalidOptions {
                reason: "worker_count must be at least 1".to_string(),
            });
        }
        if self.channel_capacity == 0 {
            return Err(WalkError::InvalidOptions {
                reason: "channel_capacity must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

/// Walk `root`, run `annotator` on every group, and rebuild a sorted tree.
///
/// Producer, worker pool and reassembler run concurrently on a child of
/// `cancel`, so a failing callback never cancels the caller's token. Every
/// spawned worker has finished by the time this returns. Either a complete
/// tree or an error is returned; never a partial tree.
///
/// When several things go wrong the reported error is, in order: the first
/// callback failure, the deadline, caller cancellation, then structural
/// problems found during reassembly.
#[instrument(skip_all, fields(root = %root.id, workers = options.worker_count))]
pub async fn walk_and_transform(
    cancel: &CancellationToken,
    root: &GroupNode,
    annotator: Arc<dyn NodeAnnotator>,
    options: &WalkOptions,
) -> Result<ReassembledNode, WalkError> {
    if root.id.trim().is_empty() {
        return Err(WalkError::InvalidRoot {
            reason: "root group has an empty id".to_string(),
        });
    }
    options.check()?;

    if cancel.is_cancelled() {
        tracing::debug!("Walk cancelled before start");
        return Err(WalkError::Cancelled);
    }

    let started = Instant::now();
    let internal = cancel.child_token();
    let (projection_tx, projection_rx) = mpsc::channel(options.channel_capacity);
    let (annotated_tx, annotated_rx) = mpsc::channel(options.channel_capacity);

    let stages = async {
        tokio::join!(
            producer::produce(root, projection_tx, &internal),
            pool::run(
                projection_rx,
                annotated_tx,
                annotator,
                options.worker_count,
                internal.clone(),
            ),
            reassembly::drain(annotated_rx, &internal),
        )
    };
    tokio::pin!(stages);

    let mut deadline_hit = None;
    let (produced, dispatched, table) = match options.deadline {
        Some(limit) => {
            tokio::select! {
                out = &mut stages => out,
                _ = tokio::time::sleep(limit) => {
                    tracing::warn!(deadline_ms = limit.as_millis() as u64, "Walk deadline exceeded");
                    deadline_hit = Some(limit);
                    internal.cancel();
                    stages.await
                }
            }
        }
        None => stages.await,
    };

    let dispatched = match dispatched {
        Ok(n) => Some(n),
        Err(WalkError::Cancelled) => None,
        Err(err) => return Err(err),
    };
    if let Some(limit) = deadline_hit {
        return Err(WalkError::DeadlineExceeded(limit));
    }

    let produced = produced?;
    let Some(dispatched) = dispatched else {
        return Err(WalkError::Cancelled);
    };
    let table = table?;

    tracing::debug!(produced, dispatched, received = table.len(), "Walk stages complete");

    let tree = table.finish()?;

    tracing::info!(
        groups = tree.group_count(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Group walk finished"
    );
    Ok(tree)
}

/// Reusable walk configuration bound to an annotator.
#[derive(Clone)]
pub struct GroupWalker {
    options: WalkOptions,
    annotator: Arc<dyn NodeAnnotator>,
}

impl std::fmt::Debug for GroupWalker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GroupWalker")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl GroupWalker {
    /// Create a walker that leaves groups unannotated.
    pub fn new(options: WalkOptions) -> Self {
        Self {
            options,
            annotator: Arc::new(NoopAnnotator),
        }
    }

    /// Use `annotator` for every group.
    pub fn with_annotator(mut self, annotator: Arc<dyn NodeAnnotator>) -> Self {
        self.annotator = annotator;
        self
    }

    /// The options this walker runs with.
    pub fn options(&self) -> &WalkOptions {
        &self.options
    }

    /// Walk an already fetched hierarchy.
    pub async fn walk(
        &self,
        cancel: &CancellationToken,
        root: &GroupNode,
    ) -> Result<ReassembledNode, WalkError> {
        walk_and_transform(cancel, root, Arc::clone(&self.annotator), &self.options).await
    }

    /// Fetch the hierarchy of `location` from `source`, then walk it.
    ///
    /// The deadline, if any, covers the fetch and the walk together.
    pub async fn fetch_and_walk(
        &self,
        cancel: &CancellationToken,
        source: &dyn GroupSource,
        location: &str,
    ) -> Result<ReassembledNode, AppError> {
        tracing::debug!(source = source.source_type(), location, "Fetching group hierarchy");

        let started = Instant::now();
        let fetch = async {
            match self.options.deadline {
                Some(limit) => {
                    match tokio::time::timeout(limit, source.fetch_group_hierarchy(location)).await {
                        Ok(fetched) => fetched,
                        Err(_) => Err(AppError::from(WalkError::DeadlineExceeded(limit))),
                    }
                }
                None => source.fetch_group_hierarchy(location).await,
            }
        };

        let root = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(WalkError::Cancelled.into()),
            root = fetch => root?,
        };

        let mut options = self.options.clone();
        if let Some(limit) = options.deadline {
            let remaining = limit.saturating_sub(started.elapsed());
            if remaining.is_zero() {
                return Err(WalkError::DeadlineExceeded(limit).into());
            }
            options.deadline = Some(remaining);
        }

        walk_and_transform(cancel, &root, Arc::clone(&self.annotator), &options)
            .await
            .map_err(|err| match err {
                WalkError::DeadlineExceeded(_) => {
                    WalkError::DeadlineExceeded(self.options.deadline.unwrap_or_default())
                }
                other => other,
            })
            .map_err(AppError::from)
    }
}
