use std::env;
use std::time::Duration;

use bundlesync_application::ReplicationRequest;
use bundlesync_core::{AppError, AppResult};

/// How the target promotion is performed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromotionMode {
    /// Direct lifecycle API call carrying the replication marker property.
    Api,
    /// `jf rbp` shell-out.
    Cli {
        /// CLI binary, `jf` unless overridden.
        program: String,
        /// Named server from the CLI configuration.
        server_id: Option<String>,
    },
}

/// Connection settings for one server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Base URL without a trailing slash.
    pub url: String,
    /// Bearer token.
    pub access_token: String,
}

/// Replicator settings, validated once at startup.
#[derive(Debug, Clone)]
pub struct ReplicatorConfig {
    /// Server the promotion happened on.
    pub source: ServerConfig,
    /// Server the promotion is replayed on.
    pub target: ServerConfig,
    /// Release bundle name.
    pub release_bundle: String,
    /// Release bundle version.
    pub bundle_version: String,
    /// Environment the target should end up in.
    pub environment: String,
    /// Release bundle repository key.
    pub repository_key: String,
    /// Explicit project key; resolved from the source server when absent.
    pub project_key: Option<String>,
    /// How the target promotion is performed.
    pub promotion_mode: PromotionMode,
    /// Timeout for ordinary lifecycle API calls.
    pub http_timeout: Duration,
    /// Timeout for the promote call.
    pub promotion_timeout: Duration,
    /// Whether the copy timestamp is recorded after promoting.
    pub reconcile_promotion_timestamp: bool,
}

impl ReplicatorConfig {
    /// Loads settings from the process environment.
    pub fn load() -> AppResult<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Loads settings through `lookup`, which maps a variable name to its value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> AppResult<Self> {
        let vars = EnvLookup(lookup);

        let source = ServerConfig {
            url: vars.required_url("SOURCE_URL")?,
            access_token: vars.required("SOURCE_ACCESS_TOKEN")?,
        };
        let target = ServerConfig {
            url: vars.required_url("TARGET_URL")?,
            access_token: vars.required("TARGET_ACCESS_TOKEN")?,
        };
        let release_bundle = vars.required("RELEASE_BUNDLE")?;
        let bundle_version = vars.required("BUNDLE_VERSION")?;
        let environment = vars.required("ENVIRONMENT")?;
        let repository_key = vars.required("REPOSITORY_KEY")?;
        let project_key = vars.optional("PROJECT_KEY");

        let promotion_mode = match vars
            .optional("PROMOTION_MODE")
            .unwrap_or_else(|| "api".to_owned())
            .to_ascii_lowercase()
            .as_str()
        {
            "api" => PromotionMode::Api,
            "cli" => PromotionMode::Cli {
                program: vars
                    .optional("JF_CLI_PATH")
                    .unwrap_or_else(|| "jf".to_owned()),
                server_id: vars.optional("JF_SERVER_ID"),
            },
            other => {
                return Err(AppError::Validation(format!(
                    "PROMOTION_MODE must be either 'api' or 'cli', got '{other}'"
                )));
            }
        };

        let http_timeout = vars.positive_seconds("HTTP_TIMEOUT_SECONDS", 30)?;
        let promotion_timeout = vars.positive_seconds("PROMOTION_TIMEOUT_SECONDS", 60)?;
        let reconcile_promotion_timestamp =
            vars.boolean("RECONCILE_PROMOTION_TIMESTAMP", true)?;

        Ok(Self {
            source,
            target,
            release_bundle,
            bundle_version,
            environment,
            repository_key,
            project_key,
            promotion_mode,
            http_timeout,
            promotion_timeout,
            reconcile_promotion_timestamp,
        })
    }

    /// Builds the request for one replication run.
    pub fn replication_request(&self) -> ReplicationRequest {
        ReplicationRequest {
            bundle_name: self.release_bundle.clone(),
            bundle_version: self.bundle_version.clone(),
            repository_key: self.repository_key.clone(),
            project_key: self.project_key.clone(),
            environment: self.environment.clone(),
        }
    }
}

struct EnvLookup<F>(F);

impl<F> EnvLookup<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn optional(&self, name: &str) -> Option<String> {
        (self.0)(name)
            .map(|value| value.trim().to_owned())
            .filter(|value| !value.is_empty())
    }

    fn required(&self, name: &str) -> AppResult<String> {
        self.optional(name)
            .ok_or_else(|| AppError::Validation(format!("{name} is required")))
    }

    fn required_url(&self, name: &str) -> AppResult<String> {
        Ok(self.required(name)?.trim_end_matches('/').to_owned())
    }

    fn positive_seconds(&self, name: &str, default: u64) -> AppResult<Duration> {
        let seconds = match self.optional(name) {
            Some(value) => value.parse::<u64>().map_err(|error| {
                AppError::Validation(format!("invalid {name} value '{value}': {error}"))
            })?,
            None => default,
        };

        if seconds == 0 {
            return Err(AppError::Validation(format!(
                "{name} must be greater than zero"
            )));
        }

        Ok(Duration::from_secs(seconds))
    }

    fn boolean(&self, name: &str, default: bool) -> AppResult<bool> {
        match self.optional(name) {
            Some(value) if value.eq_ignore_ascii_case("true") || value == "1" => Ok(true),
            Some(value) if value.eq_ignore_ascii_case("false") || value == "0" => Ok(false),
            Some(value) => Err(AppError::Validation(format!(
                "{name} must be 'true' or 'false', got '{value}'"
            ))),
            None => Ok(default),
        }
    }
}
