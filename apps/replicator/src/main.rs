//! Release bundle promotion replicator.

#![forbid(unsafe_code)]

mod replicator_config;

use std::process::ExitCode;
use std::sync::Arc;

use bundlesync_application::{PromotionExecutor, ReplicationOutcome, ReplicationService};
use bundlesync_core::{AppError, AppResult};
use bundlesync_domain::PromotionTimestamp;
use bundlesync_infrastructure::{HttpLifecycleClient, JfrogCliPromotionExecutor};
use chrono::{DateTime, Utc};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::replicator_config::{PromotionMode, ReplicatorConfig};

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    init_tracing();

    match run().await {
        Ok(ReplicationOutcome::AlreadyPromoted { environment }) => {
            info!(
                environment = %environment,
                "release bundle is already in the target environment, nothing to do"
            );
            ExitCode::SUCCESS
        }
        Ok(ReplicationOutcome::Promoted {
            intent,
            timestamp_recorded,
        }) => {
            info!(
                environment = %intent.environment,
                project_key = %intent.project_key,
                source_promoted_at = %describe_timestamp(&intent.source_timestamp),
                replay_promotion_created_millis = %intent.replay_timestamp,
                timestamp_recorded,
                "release bundle promotion replicated"
            );
            ExitCode::SUCCESS
        }
        Err(error) => {
            error!(
                error = %error,
                exit_code = error.exit_code(),
                "release bundle replication failed"
            );
            ExitCode::from(error.exit_code())
        }
    }
}

async fn run() -> AppResult<ReplicationOutcome> {
    let config = ReplicatorConfig::load()?;

    info!(
        bundle = %config.release_bundle,
        version = %config.bundle_version,
        source_url = %config.source.url,
        target_url = %config.target.url,
        environment = %config.environment,
        "bundlesync replicator started"
    );

    let service = build_replication_service(&config)?;
    service.replicate(config.replication_request()).await
}

fn build_replication_service(config: &ReplicatorConfig) -> AppResult<ReplicationService> {
    let http_client = reqwest::Client::builder()
        .timeout(config.http_timeout)
        .build()
        .map_err(|error| AppError::Internal(format!("failed to build HTTP client: {error}")))?;

    let source = Arc::new(HttpLifecycleClient::new(
        http_client.clone(),
        config.source.url.as_str(),
        config.source.access_token.as_str(),
        config.promotion_timeout,
    )?);
    let target = Arc::new(HttpLifecycleClient::new(
        http_client,
        config.target.url.as_str(),
        config.target.access_token.as_str(),
        config.promotion_timeout,
    )?);

    let promotion_executor: Arc<dyn PromotionExecutor> = match &config.promotion_mode {
        PromotionMode::Api => target.clone(),
        PromotionMode::Cli { program, server_id } => {
            let executor = JfrogCliPromotionExecutor::new(program.as_str());
            Arc::new(match server_id {
                Some(server_id) => executor.with_server_id(server_id.as_str()),
                None => executor,
            })
        }
    };

    let service = ReplicationService::new(source.clone(), target.clone(), source, promotion_executor);

    Ok(if config.reconcile_promotion_timestamp {
        service.with_promotion_record_writer(target)
    } else {
        service
    })
}

fn describe_timestamp(timestamp: &PromotionTimestamp) -> String {
    timestamp
        .as_millis()
        .and_then(DateTime::<Utc>::from_timestamp_millis)
        .map_or_else(|| timestamp.to_string(), |instant| instant.to_rfc3339())
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}
