//! Depth-first flattening of a group hierarchy into a projection stream.

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use clc_entity::group::{GroupNode, NodeProjection};

use super::error::WalkError;

/// Emit one projection per group in pre-order (parent before children).
///
/// The walk is iterative so cancellation is checked before every emission,
/// including while waiting on a full channel. The channel is closed when
/// this returns. If the receiving side has gone away the walk stops early
/// and reports how many projections were delivered.
pub async fn produce(
    root: &GroupNode,
    tx: mpsc::Sender<NodeProjection>,
    cancel: &CancellationToken,
) -> Result<usize, WalkError> {
    let mut stack: Vec<(&GroupNode, &str)> = vec![(root, "")];
    let mut emitted = 0usize;

    while let Some((node, parent_id)) = stack.pop() {
        if cancel.is_cancelled() {
            tracing::debug!(emitted, "Producer stopped by cancellation");
            return Err(WalkError::Cancelled);
        }

        let projection = NodeProjection::from_node(node, parent_id);

        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::debug!(emitted, "Producer stopped by cancellation");
                return Err(WalkError::Cancelled);
            }
            sent = tx.send(projection) => {
                if sent.is_err() {
                    tracing::debug!(emitted, "Projection stream closed by consumer");
                    return Ok(emitted);
                }
            }
        }

        emitted += 1;
        stack.extend(node.groups.iter().rev().map(|c| (c, node.id.as_str())));
    }

    tracing::debug!(emitted, "Producer finished");
    Ok(emitted)
}
