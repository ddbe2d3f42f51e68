use async_trait::async_trait;
use bundlesync_core::AppResult;
use bundlesync_domain::{AuditTrail, PromotionIntent, PromotionTimestamp, ReleaseBundleRef};

/// Port for reading a server's release bundle audit trail.
#[async_trait]
pub trait AuditTrailRepository: Send + Sync {
    /// Fetches the newest-first audit trail, or `None` when the bundle does
    /// not exist on the server.
    async fn fetch_audit_trail(&self, bundle: &ReleaseBundleRef) -> AppResult<Option<AuditTrail>>;
}

/// Port for mapping a release bundle repository to its project.
#[async_trait]
pub trait ProjectKeyResolver: Send + Sync {
    /// Returns the project key owning the repository, if the server knows it.
    async fn resolve_project_key(&self, repository_key: &str) -> AppResult<Option<String>>;
}

/// Port for performing a promotion on the target server.
#[async_trait]
pub trait PromotionExecutor: Send + Sync {
    /// Promotes the bundle as described by the intent.
    async fn execute_promotion(
        &self,
        bundle: &ReleaseBundleRef,
        intent: &PromotionIntent,
    ) -> AppResult<()>;
}

/// Port for reconciling a replayed promotion's creation time.
#[async_trait]
pub trait PromotionRecordWriter: Send + Sync {
    /// Records the replayed promotion as a copy created at `timestamp`.
    async fn record_copied_promotion(
        &self,
        bundle: &ReleaseBundleRef,
        timestamp: &PromotionTimestamp,
    ) -> AppResult<()>;
}
