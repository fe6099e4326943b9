//! # clc-entity
//!
//! Domain models for the provider's hardware-group hierarchy: the nested
//! input tree as the API delivers it, the flattened per-node projection
//! used while walking it, and the sorted tree rebuilt afterwards.

pub mod group;
