//! Hardware group traversal.

pub mod annotator;
pub mod error;
pub mod pool;
pub mod producer;
pub mod reassembly;
pub mod walk;

pub use annotator::{BillingAnnotator, NodeAnnotator, NoopAnnotator, ServerCountAnnotator};
pub use error::{ConsistencyError, WalkError};
pub use reassembly::Reassembler;
pub use walk::{GroupWalker, WalkOptions, walk_and_transform};
