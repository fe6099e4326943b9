//! Convenience result type alias for clc.

use crate::error::AppError;

/// A specialized `Result` type for clc operations.
pub type AppResult<T> = Result<T, AppError>;
