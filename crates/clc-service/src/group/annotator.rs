//! Per-group annotation callbacks run by the worker pool.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use clc_client::ApiClient;
use clc_core::error::AppError;
use clc_core::result::AppResult;
use clc_entity::group::NodeProjection;

/// Enriches or validates one group during a walk.
///
/// Implementations may mutate the projection, may await I/O, and should
/// return promptly once `cancel` fires. Returning an error aborts the
/// whole walk.
#[async_trait]
pub trait NodeAnnotator: Send + Sync {
    /// Annotate a single group.
    async fn annotate(&self, cancel: &CancellationToken, node: &mut NodeProjection)
    -> AppResult<()>;
}

// Plain synchronous closures can be used directly.
#[async_trait]
impl<F> NodeAnnotator for F
where
    F: Fn(&mut NodeProjection) -> AppResult<()> + Send + Sync,
{
    async fn annotate(
        &self,
        _cancel: &CancellationToken,
        node: &mut NodeProjection,
    ) -> AppResult<()> {
        self(node)
    }
}

/// Leaves every group untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopAnnotator;

#[async_trait]
impl NodeAnnotator for NoopAnnotator {
    async fn annotate(
        &self,
        _cancel: &CancellationToken,
        _node: &mut NodeProjection,
    ) -> AppResult<()> {
        Ok(())
    }
}

/// Records the number of directly contained servers as `server_count`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ServerCountAnnotator;

#[async_trait]
impl NodeAnnotator for ServerCountAnnotator {
    async fn annotate(
        &self,
        _cancel: &CancellationToken,
        node: &mut NodeProjection,
    ) -> AppResult<()> {
        let count = node.server_ids.len();
        node.annotate("server_count", count);
        Ok(())
    }
}

/// Fetches each group's billing summary from the API into `billing`.
#[derive(Debug, Clone)]
pub struct BillingAnnotator {
    client: Arc<ApiClient>,
}

impl BillingAnnotator {
    /// Create an annotator sharing `client` across workers.
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl NodeAnnotator for BillingAnnotator {
    async fn annotate(&self, cancel: &CancellationToken, node: &mut NodeProjection) -> AppResult<()> {
        let billing = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                return Err(AppError::cancelled("Billing lookup cancelled"));
            }
            billing = self.client.group_billing(&node.id) => billing?,
        };

        node.annotate("billing", billing);
        Ok(())
    }
}
