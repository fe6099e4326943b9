//! Hardware group entities.

pub mod node;
pub mod order;
pub mod projection;
pub mod tree;

pub use node::{GroupNode, GroupType};
pub use order::sibling_order;
pub use projection::NodeProjection;
pub use tree::ReassembledNode;
