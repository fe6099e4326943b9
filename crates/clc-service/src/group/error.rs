//! Error types for the group walk.
//!
//! Callers can tell a failed annotation ([`WalkError::Callback`]) apart
//! from a malformed hierarchy ([`WalkError::Consistency`]) and from
//! cancellation ([`WalkError::Cancelled`], [`WalkError::DeadlineExceeded`]).

use std::time::Duration;

use clc_core::error::AppError;
use thiserror::Error;

/// Structural problems found while rebuilding a tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConsistencyError {
    /// A group names a parent that never arrived.
    #[error("group '{id}' references missing parent '{parent_id}'")]
    MissingParent {
        /// The orphaned group.
        id: String,
        /// The parent id it referenced.
        parent_id: String,
    },

    /// Two projections carried the same id.
    #[error("group id '{id}' appears more than once")]
    DuplicateId {
        /// The repeated id.
        id: String,
    },

    /// Every group has a parent.
    #[error("no root group found")]
    NoRoot,

    /// More than one group has no parent.
    #[error("multiple root groups: {}", ids.join(", "))]
    MultipleRoots {
        /// Ids of all parentless groups, sorted.
        ids: Vec<String>,
    },

    /// Some groups could not be reached from the root (a parent cycle).
    #[error("{count} group(s) not reachable from root '{root}'")]
    Detached {
        /// The root id.
        root: String,
        /// How many groups were left over.
        count: usize,
    },
}

/// Errors returned by [`super::walk_and_transform`].
#[derive(Debug, Error)]
pub enum WalkError {
    /// The root handed to the walk is unusable.
    #[error("Invalid root group: {reason}")]
    InvalidRoot {
        /// What is wrong with it.
        reason: String,
    },

    /// Walk options are out of range.
    #[error("Invalid walk options: {reason}")]
    InvalidOptions {
        /// What is wrong with them.
        reason: String,
    },

    /// The first annotation callback that failed.
    #[error("Annotating group '{node_id}' failed: {source}")]
    Callback {
        /// The group being annotated.
        node_id: String,
        /// The callback's error.
        source: AppError,
    },

    /// The rebuilt tree violated its invariants.
    #[error("Group tree is inconsistent: {0}")]
    Consistency(#[from] ConsistencyError),

    /// The caller cancelled the walk.
    #[error("Group walk was cancelled")]
    Cancelled,

    /// The walk ran past its deadline.
    #[error("Group walk exceeded its deadline of {0:?}")]
    DeadlineExceeded(Duration),

    /// A worker task panicked.
    #[error("Walk task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl WalkError {
    /// Check if the walk ended because it was cancelled or timed out.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Self::Cancelled | Self::DeadlineExceeded(_))
    }
}

impl From<WalkError> for AppError {
    fn from(err: WalkError) -> Self {
        match err {
            WalkError::Callback { node_id, source } => AppError::new(
                source.kind,
                format!("Annotating group '{node_id}' failed: {}", source.message),
            ),
            WalkError::InvalidRoot { .. } | WalkError::InvalidOptions { .. } => {
                AppError::validation(err.to_string())
            }
            WalkError::Consistency(_) => AppError::consistency(err.to_string()),
            WalkError::Cancelled => AppError::cancelled(err.to_string()),
            WalkError::DeadlineExceeded(_) => AppError::timeout(err.to_string()),
            WalkError::Join(_) => AppError::internal(err.to_string()),
        }
    }
}
