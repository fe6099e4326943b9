//! # clc-client
//!
//! Where group hierarchies come from. [`source::GroupSource`] is the seam
//! the CLI fetches through; [`api::ApiClient`] talks to the provider's v2
//! REST API and [`source::JsonFileSource`] replays a previously exported
//! hierarchy.

pub mod api;
pub mod source;
mod wire;

pub use api::ApiClient;
pub use source::{GroupSource, JsonFileSource};
