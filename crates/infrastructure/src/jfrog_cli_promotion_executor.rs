use async_trait::async_trait;
use bundlesync_application::PromotionExecutor;
use bundlesync_core::{AppError, AppResult};
use bundlesync_domain::{PromotionIntent, ReleaseBundleRef};
use tokio::process::Command;
use tracing::{info, warn};

/// Promotion executor that shells out to `jf rbp`.
///
/// The CLI must already be configured for the target server, either as its
/// default server or through `--server-id`.
#[derive(Debug, Clone)]
pub struct JfrogCliPromotionExecutor {
    program: String,
    server_id: Option<String>,
}

impl JfrogCliPromotionExecutor {
    /// Creates an executor running the given CLI binary.
    #[must_use]
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            server_id: None,
        }
    }

    /// Targets a named server from the CLI configuration.
    #[must_use]
    pub fn with_server_id(mut self, server_id: impl Into<String>) -> Self {
        self.server_id = Some(server_id.into());
        self
    }

    fn promotion_args(&self, bundle: &ReleaseBundleRef, intent: &PromotionIntent) -> Vec<String> {
        let mut args = vec![
            "rbp".to_owned(),
            bundle.name().to_owned(),
            bundle.version().to_owned(),
            intent.environment.clone(),
            format!("--project={}", intent.project_key),
        ];

        if !intent.included_repository_keys.is_empty() {
            args.push(format!(
                "--include-repos={}",
                intent.included_repository_keys.join(";")
            ));
        }

        if !intent.excluded_repository_keys.is_empty() {
            args.push(format!(
                "--exclude-repos={}",
                intent.excluded_repository_keys.join(";")
            ));
        }

        if let Some(server_id) = &self.server_id {
            args.push(format!("--server-id={server_id}"));
        }

        args
    }
}

#[async_trait]
impl PromotionExecutor for JfrogCliPromotionExecutor {
    async fn execute_promotion(
        &self,
        bundle: &ReleaseBundleRef,
        intent: &PromotionIntent,
    ) -> AppResult<()> {
        let args = self.promotion_args(bundle, intent);
        info!(
            program = %self.program,
            command = %args.join(" "),
            "executing release bundle promotion command"
        );

        let output = Command::new(&self.program)
            .args(&args)
            .output()
            .await
            .map_err(|error| AppError::ExternalCommand {
                exit_code: None,
                message: format!("failed to run '{}': {error}", self.program),
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);

        if !output.status.success() {
            warn!(
                exit_code = ?output.status.code(),
                stdout = %stdout.trim(),
                stderr = %stderr.trim(),
                "release bundle promotion command failed"
            );
            return Err(AppError::ExternalCommand {
                exit_code: output.status.code(),
                message: format!(
                    "'{} rbp' exited with {}: {}",
                    self.program,
                    output.status,
                    stderr.trim()
                ),
            });
        }

        info!(
            stdout = %stdout.trim(),
            stderr = %stderr.trim(),
            "release bundle promotion command succeeded"
        );

        Ok(())
    }
}
