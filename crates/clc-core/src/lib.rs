//! # clc-core
//!
//! Core crate for the clc tooling. Contains the unified error system and
//! the configuration schemas used by the client, the group walk engine and
//! the CLI.
//!
//! This crate has **no** internal dependencies on other clc crates.

pub mod config;
pub mod error;
pub mod result;

pub use error::AppError;
pub use result::AppResult;
