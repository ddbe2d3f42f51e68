use std::sync::Arc;

use bundlesync_core::{AppError, AppResult};
use bundlesync_domain::{
    PromotionIntent, ReleaseBundleRef, extract_intent, latest_promotion_environment, should_skip,
};
use tracing::{info, warn};

use crate::replication_ports::{
    AuditTrailRepository, ProjectKeyResolver, PromotionExecutor, PromotionRecordWriter,
};


/// Project key used when neither configuration nor the source server names one.
pub const DEFAULT_PROJECT_KEY: &str = "default";

/// Input for one replication run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplicationRequest {
    /// Release bundle name.
    pub bundle_name: String,
    /// Release bundle version.
    pub bundle_version: String,
    /// Release bundle repository key.
    pub repository_key: String,
    /// Explicit project key; resolved from the source server when absent.
    pub project_key: Option<String>,
    /// Environment the target should end up in.
    pub environment: String,
}

/// Result of a successful replication run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplicationOutcome {
    /// The target's latest promotion already reached the environment.
    AlreadyPromoted {
        /// Environment found on the target.
        environment: String,
    },
    /// The source promotion was replayed on the target.
    Promoted {
        /// Promotion that was executed.
        intent: PromotionIntent,
        /// Whether the copy timestamp was recorded on the target.
        timestamp_recorded: bool,
    },
}

/// Replays the source server's latest promotion on the target server.
#[derive(Clone)]
pub struct ReplicationService {
    source_audit: Arc<dyn AuditTrailRepository>,
    target_audit: Arc<dyn AuditTrailRepository>,
    project_key_resolver: Arc<dyn ProjectKeyResolver>,
    promotion_executor: Arc<dyn PromotionExecutor>,
    promotion_record_writer: Option<Arc<dyn PromotionRecordWriter>>,
}

impl ReplicationService {
    /// Creates a replication service.
    #[must_use]
    pub fn new(
        source_audit: Arc<dyn AuditTrailRepository>,
        target_audit: Arc<dyn AuditTrailRepository>,
        project_key_resolver: Arc<dyn ProjectKeyResolver>,
        promotion_executor: Arc<dyn PromotionExecutor>,
    ) -> Self {
        Self {
            source_audit,
            target_audit,
            project_key_resolver,
            promotion_executor,
            promotion_record_writer: None,
        }
    }

    /// Adds copy timestamp reconciliation after each promotion.
    #[must_use]
    pub fn with_promotion_record_writer(
        mut self,
        promotion_record_writer: Arc<dyn PromotionRecordWriter>,
    ) -> Self {
        self.promotion_record_writer = Some(promotion_record_writer);
        self
    }

    /// Runs one replication: fetch both trails, reconcile, then promote.
    pub async fn replicate(&self, request: ReplicationRequest) -> AppResult<ReplicationOutcome> {
        let project_key = self
            .resolve_project_key(request.project_key.as_deref(), &request.repository_key)
            .await?;
        let bundle = ReleaseBundleRef::new(
            request.bundle_name,
            request.bundle_version,
            project_key,
            request.repository_key,
        )?;

        let source_trail = self.source_audit.fetch_audit_trail(&bundle).await?;

        let target_trail = self.target_audit.fetch_audit_trail(&bundle).await?;
        match target_trail.as_ref() {
            None => info!(
                bundle = bundle.name(),
                version = bundle.version(),
                "release bundle does not exist on target yet"
            ),
            Some(trail) => info!(
                bundle = bundle.name(),
                version = bundle.version(),
                current_environment = latest_promotion_environment(trail).unwrap_or("<none>"),
                "checked latest promotion on target"
            ),
        }

        if should_skip(target_trail.as_ref(), &request.environment) {
            info!(
                bundle = bundle.name(),
                version = bundle.version(),
                environment = %request.environment,
                "release bundle already promoted on target, skipping to prevent a loop"
            );
            return Ok(ReplicationOutcome::AlreadyPromoted {
                environment: request.environment,
            });
        }

        let source_trail = source_trail.ok_or_else(|| {
            AppError::NoCompletedPromotion(format!(
                "release bundle '{}/{}' does not exist on the source server",
                bundle.name(),
                bundle.version()
            ))
        })?;

        let intent = extract_intent(&source_trail, &request.environment, bundle.project_key())?;
        info!(
            bundle = bundle.name(),
            version = bundle.version(),
            environment = %intent.environment,
            project_key = %intent.project_key,
            included_repository_keys = ?intent.included_repository_keys,
            excluded_repository_keys = ?intent.excluded_repository_keys,
            source_promotion_created_millis = %intent.source_timestamp,
            "replaying source promotion on target"
        );

        self.promotion_executor
            .execute_promotion(&bundle, &intent)
            .await?;

        let timestamp_recorded = match self.promotion_record_writer.as_ref() {
            Some(writer) => {
                if intent.replay_timestamp.as_millis().is_none() {
                    warn!(
                        promotion_created_millis = %intent.replay_timestamp,
                        "source promotion timestamp is not numeric, recording it unchanged"
                    );
                }
                writer
                    .record_copied_promotion(&bundle, &intent.replay_timestamp)
                    .await?;
                true
            }
            None => false,
        };

        Ok(ReplicationOutcome::Promoted {
            intent,
            timestamp_recorded,
        })
    }

    async fn resolve_project_key(
        &self,
        configured: Option<&str>,
        repository_key: &str,
    ) -> AppResult<String> {
        if let Some(project_key) = configured
            .map(str::trim)
            .filter(|value| !value.is_empty())
        {
            return Ok(project_key.to_owned());
        }

        let resolved = self
            .project_key_resolver
            .resolve_project_key(repository_key)
            .await?;

        match resolved {
            Some(project_key) => {
                info!(
                    repository_key,
                    project_key = %project_key,
                    "resolved project key from source server"
                );
                Ok(project_key)
            }
            None => {
                warn!(
                    repository_key,
                    project_key = DEFAULT_PROJECT_KEY,
                    "repository has no project mapping, using default project"
                );
                Ok(DEFAULT_PROJECT_KEY.to_owned())
            }
        }
    }
}
