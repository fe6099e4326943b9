//! # clc-service
//!
//! The group walk engine. A hierarchy is flattened by a single producer,
//! annotated by a bounded pool of concurrent workers and rebuilt into a
//! sorted tree by a single reassembler. Every stage shares one
//! cancellation token, and no task outlives the call that spawned it.

pub mod group;

pub use group::{
    BillingAnnotator, GroupWalker, NodeAnnotator, NoopAnnotator, ServerCountAnnotator,
    WalkError, WalkOptions, walk_and_transform,
};
