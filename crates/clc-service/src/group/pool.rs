//! Bounded worker pool applying the annotation callback.

use std::sync::{Arc, OnceLock};

use tokio::sync::{Semaphore, mpsc};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use clc_entity::group::NodeProjection;

use super::annotator::NodeAnnotator;
use super::error::WalkError;

/// Annotate every projection from `rx` and forward it to `tx`.
///
/// At most `worker_count` callbacks run at once. The first callback error
/// is kept, `cancel` is triggered, and every later error is dropped. Queued
/// projections are discarded without invoking the callback once `cancel`
/// fires. All spawned tasks are joined before this returns.
///
/// Returns the number of callbacks dispatched.
pub async fn run(
    mut rx: mpsc::Receiver<NodeProjection>,
    tx: mpsc::Sender<NodeProjection>,
    annotator: Arc<dyn NodeAnnotator>,
    worker_count: usize,
    cancel: CancellationToken,
) -> Result<usize, WalkError> {
    let slots = Arc::new(Semaphore::new(worker_count));
    let first_error: Arc<OnceLock<WalkError>> = Arc::new(OnceLock::new());
    let mut tasks = JoinSet::new();
    let mut dispatched = 0usize;

    loop {
        let next = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            next = rx.recv() => next,
        };
        let Some(node) = next else {
            break;
        };

        let permit = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            permit = slots.clone().acquire_owned() => permit,
        };
        let Ok(permit) = permit else {
            tracing::error!("Worker slot semaphore closed");
            break;
        };

        while let Some(joined) = tasks.try_join_next() {
            reap(joined, &first_error, &cancel);
        }

        dispatched += 1;
        let annotator = Arc::clone(&annotator);
        let tx = tx.clone();
        let cancel = cancel.clone();
        let first_error = Arc::clone(&first_error);

        tasks.spawn(async move {
            let _permit = permit;
            annotate_one(node, annotator.as_ref(), &tx, &cancel, &first_error).await;
        });
    }

    // Closing our sender lets the reassembler finish once workers are done.
    drop(tx);
    drop(rx);

    while let Some(joined) = tasks.join_next().await {
        reap(joined, &first_error, &cancel);
    }

    tracing::debug!(dispatched, "Worker pool drained");

    match Arc::into_inner(first_error).and_then(OnceLock::into_inner) {
        Some(err) => Err(err),
        None if cancel.is_cancelled() => Err(WalkError::Cancelled),
        None => Ok(dispatched),
    }
}

async fn annotate_one(
    mut node: NodeProjection,
    annotator: &dyn NodeAnnotator,
    tx: &mpsc::Sender<NodeProjection>,
    cancel: &CancellationToken,
    first_error: &OnceLock<WalkError>,
) {
    if cancel.is_cancelled() {
        return;
    }

    let outcome = tokio::select! {
        biased;
        _ = cancel.cancelled() => return,
        outcome = annotator.annotate(cancel, &mut node) => outcome,
    };

    if let Err(source) = outcome {
        tracing::warn!(group = %node.id, error = %source, "Annotation failed, cancelling walk");
        let _ = first_error.set(WalkError::Callback {
            node_id: node.id,
            source,
        });
        cancel.cancel();
        return;
    }

    tokio::select! {
        biased;
        _ = cancel.cancelled() => {}
        sent = tx.send(node) => {
            if sent.is_err() {
                tracing::debug!("Reassembler gone, dropping annotated group");
            }
        }
    }
}

fn reap(
    joined: Result<(), tokio::task::JoinError>,
    first_error: &OnceLock<WalkError>,
    cancel: &CancellationToken,
) {
    if let Err(e) = joined {
        tracing::error!(error = %e, "Annotation worker panicked");
        let _ = first_error.set(WalkError::Join(e));
        cancel.cancel();
    }
}
