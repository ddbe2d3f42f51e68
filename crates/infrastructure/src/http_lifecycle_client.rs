use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use bundlesync_application::{
    AuditTrailRepository, ProjectKeyResolver, PromotionExecutor, PromotionRecordWriter,
};
use bundlesync_core::{AppError, AppResult};
use bundlesync_domain::{
    AuditTrail, PromotionIntent, PromotionTimestamp, REPLICATION_STATUS_AUTOMATED,
    REPLICATION_STATUS_PROPERTY, ReleaseBundleRef,
};
use reqwest::{StatusCode, header};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use url::Url;


const LIFECYCLE_API_PATH: [&str; 3] = ["lifecycle", "api", "v2"];

/// Lifecycle REST API client bound to one Artifactory server.
pub struct HttpLifecycleClient {
    http_client: reqwest::Client,
    base_url: Url,
    access_token: String,
    promotion_timeout: Duration,
}

#[derive(Debug, Serialize)]
struct PromoteReleaseBundleRequest<'a> {
    environment: &'a str,
    project_key: &'a str,
    included_repository_keys: &'a [String],
    excluded_repository_keys: &'a [String],
    promotion_properties: BTreeMap<&'static str, &'static str>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ReleaseBundleNamesResponse {
    List(Vec<ReleaseBundleNameEntry>),
    Wrapped {
        release_bundles: Vec<ReleaseBundleNameEntry>,
    },
}

#[derive(Debug, Deserialize)]
struct ReleaseBundleNameEntry {
    #[serde(default)]
    repository_key: Option<String>,
    #[serde(default)]
    project_key: Option<String>,
}

impl ReleaseBundleNamesResponse {
    fn into_entries(self) -> Vec<ReleaseBundleNameEntry> {
        match self {
            Self::List(entries) | Self::Wrapped {
                release_bundles: entries,
            } => entries,
        }
    }
}

impl HttpLifecycleClient {
    /// Creates a client for the server at `base_url`.
    pub fn new(
        http_client: reqwest::Client,
        base_url: &str,
        access_token: impl Into<String>,
        promotion_timeout: Duration,
    ) -> AppResult<Self> {
        let base_url = Url::parse(base_url.trim_end_matches('/')).map_err(|error| {
            AppError::Validation(format!("invalid server URL '{base_url}': {error}"))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(AppError::Validation(format!(
                "server URL '{base_url}' cannot be used as a base URL"
            )));
        }

        Ok(Self {
            http_client,
            base_url,
            access_token: access_token.into(),
            promotion_timeout,
        })
    }

    fn endpoint(&self, segments: &[&str], query: &[(&str, &str)]) -> AppResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| {
                AppError::Internal(format!("server URL '{}' has no path", self.base_url))
            })?
            .pop_if_empty()
            .extend(LIFECYCLE_API_PATH)
            .extend(segments);

        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }

        Ok(url)
    }

    fn authorized(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder.header(
            header::AUTHORIZATION,
            format!("Bearer {}", self.access_token),
        )
    }
}

async fn ensure_success(
    response: reqwest::Response,
    endpoint_name: &str,
) -> AppResult<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "<body unavailable>".to_owned());
    Err(AppError::Network(format!(
        "{endpoint_name} endpoint returned status {}: {body}",
        status.as_u16()
    )))
}

async fn read_json<T>(response: reqwest::Response, endpoint_name: &str) -> AppResult<T>
where
    T: for<'de> Deserialize<'de>,
{
    let body = response.text().await.map_err(|error| {
        AppError::Network(format!(
            "failed to read {endpoint_name} endpoint response body: {error}"
        ))
    })?;

    serde_json::from_str::<T>(&body).map_err(|error| {
        AppError::MalformedResponse(format!(
            "failed to parse {endpoint_name} endpoint response body: {error}"
        ))
    })
}

fn transport_error(endpoint_name: &str, error: &reqwest::Error) -> AppError {
    if error.is_timeout() {
        AppError::Network(format!("{endpoint_name} endpoint timed out: {error}"))
    } else {
        AppError::Network(format!("failed to call {endpoint_name} endpoint: {error}"))
    }
}

#[async_trait]
impl AuditTrailRepository for HttpLifecycleClient {
    async fn fetch_audit_trail(&self, bundle: &ReleaseBundleRef) -> AppResult<Option<AuditTrail>> {
        let url = self.endpoint(
            &["audit", bundle.name(), bundle.version()],
            &[
                ("project", bundle.project_key()),
                ("repository_key", bundle.repository_key()),
            ],
        )?;
        debug!(url = %url, "checking release bundle audit trail");

        let response = self
            .authorized(self.http_client.get(url))
            .send()
            .await
            .map_err(|error| transport_error("audit", &error))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let response = ensure_success(response, "audit").await?;
        read_json::<AuditTrail>(response, "audit").await.map(Some)
    }
}

#[async_trait]
impl ProjectKeyResolver for HttpLifecycleClient {
    async fn resolve_project_key(&self, repository_key: &str) -> AppResult<Option<String>> {
        let url = self.endpoint(&["release_bundle", "names"], &[])?;
        let response = self
            .authorized(self.http_client.get(url))
            .send()
            .await
            .map_err(|error| transport_error("release bundle names", &error))?;
        let response = ensure_success(response, "release bundle names").await?;
        let names =
            read_json::<ReleaseBundleNamesResponse>(response, "release bundle names").await?;

        Ok(names
            .into_entries()
            .into_iter()
            .filter(|entry| entry.repository_key.as_deref() == Some(repository_key))
            .find_map(|entry| entry.project_key.filter(|value| !value.trim().is_empty())))
    }
}

#[async_trait]
impl PromotionExecutor for HttpLifecycleClient {
    async fn execute_promotion(
        &self,
        bundle: &ReleaseBundleRef,
        intent: &PromotionIntent,
    ) -> AppResult<()> {
        let url = self.endpoint(
            &["promotion", "promote", bundle.name(), bundle.version()],
            &[],
        )?;
        let request = PromoteReleaseBundleRequest {
            environment: intent.environment.as_str(),
            project_key: intent.project_key.as_str(),
            included_repository_keys: intent.included_repository_keys.as_slice(),
            excluded_repository_keys: intent.excluded_repository_keys.as_slice(),
            promotion_properties: BTreeMap::from([(
                REPLICATION_STATUS_PROPERTY,
                REPLICATION_STATUS_AUTOMATED,
            )]),
        };

        let response = self
            .authorized(self.http_client.post(url))
            .timeout(self.promotion_timeout)
            .json(&request)
            .send()
            .await
            .map_err(|error| transport_error("promotion", &error))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<body unavailable>".to_owned());
            return Err(AppError::ExternalCommand {
                exit_code: None,
                message: format!(
                    "promotion endpoint returned status {}: {body}",
                    status.as_u16()
                ),
            });
        }

        info!(
            bundle = bundle.name(),
            version = bundle.version(),
            environment = %intent.environment,
            "release bundle promoted through lifecycle API"
        );

        Ok(())
    }
}

#[async_trait]
impl PromotionRecordWriter for HttpLifecycleClient {
    async fn record_copied_promotion(
        &self,
        bundle: &ReleaseBundleRef,
        timestamp: &PromotionTimestamp,
    ) -> AppResult<()> {
        let promotion_created_millis = timestamp.to_string();
        let url = self.endpoint(
            &["promotion", "records", bundle.name(), bundle.version()],
            &[
                ("project", bundle.project_key()),
                ("operation", "copy"),
                ("promotion_created_millis", promotion_created_millis.as_str()),
            ],
        )?;

        let response = self
            .authorized(self.http_client.get(url))
            .send()
            .await
            .map_err(|error| transport_error("promotion records", &error))?;
        ensure_success(response, "promotion records").await?;

        info!(
            bundle = bundle.name(),
            version = bundle.version(),
            promotion_created_millis = %promotion_created_millis,
            "recorded copied promotion timestamp"
        );

        Ok(())
    }
}
