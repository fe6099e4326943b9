//! Group hierarchy sources.

use std::path::PathBuf;

use async_trait::async_trait;

use clc_core::error::AppError;
use clc_core::result::AppResult;
use clc_entity::group::GroupNode;

/// Something that can deliver the complete group tree of a location.
#[async_trait]
pub trait GroupSource: Send + Sync {
    /// Short name used in log output.
    fn source_type(&self) -> &str;

    /// Fetch the fully materialized hierarchy rooted at `location`.
    async fn fetch_group_hierarchy(&self, location: &str) -> AppResult<GroupNode>;
}

/// Reads a hierarchy previously written by `clc group export`.
///
/// The file holds a single tree, so `location` is only checked for being
/// non-empty.
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    /// Create a source backed by `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl GroupSource for JsonFileSource {
    fn source_type(&self) -> &str {
        "file"
    }

    async fn fetch_group_hierarchy(&self, location: &str) -> AppResult<GroupNode> {
        if location.trim().is_empty() {
            return Err(AppError::validation("Location must not be empty"));
        }

        let raw = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            AppError::with_source(
                clc_core::error::ErrorKind::Io,
                format!("Failed to read '{}': {e}", self.path.display()),
                e,
            )
        })?;

        let root: GroupNode = serde_json::from_str(&raw)?;
        tracing::debug!(
            path = %self.path.display(),
            groups = root.group_count(),
            "Loaded group hierarchy from file"
        );
        Ok(root)
    }
}
