//! Client side of the alert policy service.

use std::time::Duration;

use dex_firehose::alert::{Alert, Policy};
use reqwest::{StatusCode, Url};
use serde::Deserialize;

#[derive(Debug, thiserror::Error)]
pub enum AlertError {
    #[error("alert service request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("invalid alert service url: {0}")]
    Url(String),
    #[error("{0}")]
    NotFound(String),
    #[error("alert service returned {status}: {body}")]
    Status { status: u16, body: String },
}

#[tonic::async_trait]
pub trait AlertService: Send + Sync + 'static {
    async fn upsert_alert_policy(&self, project_slug: &str, policy: Policy)
    -> Result<Policy, AlertError>;

    async fn get_alert_policy(&self, project_slug: &str, resource: &str)
    -> Result<Policy, AlertError>;

    async fn list_alerts(&self, project_slug: &str, resource: &str)
    -> Result<Vec<Alert>, AlertError>;

    /// Identifier of the project's alerting data source (the `entity` rule
    /// variable).
    async fn get_project_data_source(&self, project_slug: &str) -> Result<String, AlertError>;
}

#[derive(Debug, Deserialize)]
struct ListAlertsResponse {
    #[serde(default)]
    items: Vec<Alert>,
}

#[derive(Debug, Deserialize)]
struct DataSourceResponse {
    urn: String,
}

#[derive(Clone)]
pub struct SirenClient {
    http: reqwest::Client,
    base: Url,
}

impl SirenClient {
    pub fn new(base: &str, timeout: Duration) -> Result<Self, AlertError> {
        let base = Url::parse(base).map_err(|e| AlertError::Url(format!("{base}: {e}")))?;
        let http = reqwest::Client::builder()
            .user_agent("dex-server")
            .timeout(timeout)
            .build()?;
        Ok(Self { http, base })
    }

    fn url(&self, segments: &[&str]) -> Result<Url, AlertError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| AlertError::Url(format!("{} cannot be a base", self.base)))?
            .pop_if_empty()
            .extend(["v1beta1", "projects"])
            .extend(segments);
        Ok(url)
    }

    async fn check(resp: reqwest::Response) -> Result<reqwest::Response, AlertError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().await.unwrap_or_default();
        if status == StatusCode::NOT_FOUND {
            return Err(AlertError::NotFound(body));
        }
        Err(AlertError::Status {
            status: status.as_u16(),
            body,
        })
    }
}

#[tonic::async_trait]
impl AlertService for SirenClient {
    async fn upsert_alert_policy(
        &self,
        project_slug: &str,
        policy: Policy,
    ) -> Result<Policy, AlertError> {
        let url = self.url(&[project_slug, "policies", &policy.resource])?;
        let resp = self.http.put(url).json(&policy).send().await?;
        Ok(Self::check(resp).await?.json().await?)
    }

    async fn get_alert_policy(
        &self,
        project_slug: &str,
        resource: &str,
    ) -> Result<Policy, AlertError> {
        let url = self.url(&[project_slug, "policies", resource])?;
        let resp = self.http.get(url).send().await?;
        Ok(Self::check(resp).await?.json().await?)
    }

    async fn list_alerts(
        &self,
        project_slug: &str,
        resource: &str,
    ) -> Result<Vec<Alert>, AlertError> {
        let url = self.url(&[project_slug, "alerts"])?;
        let resp = self
            .http
            .get(url)
            .query(&[("resource", resource)])
            .send()
            .await?;
        let body: ListAlertsResponse = Self::check(resp).await?.json().await?;
        Ok(body.items)
    }

    async fn get_project_data_source(&self, project_slug: &str) -> Result<String, AlertError> {
        let url = self.url(&[project_slug, "datasource"])?;
        let resp = self.http.get(url).send().await?;
        let body: DataSourceResponse = Self::check(resp).await?.json().await?;
        Ok(body.urn)
    }
}
