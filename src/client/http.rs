//! Async HTTP client for the dashboard API.

use std::path::Path;

use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use url::Url;

use crate::config::SyncConfig;
use crate::connection::http_endpoint;
use crate::error::{Result, SyncError};
use crate::logging::structured::LogContext;
use crate::model::ThreatSummary;

use super::types::{
    EmailRequest, IpScanRequest, LogsRequest, RemediateRequest, RemediationResponse,
    SourceListing, Submission, ToggleResponse,
};

pub const SUMMARY_PATH: &str = "/dashboard/summary";
pub const REMEDIATE_PATH: &str = "/dashboard/remediate";
pub const SOURCES_PATH: &str = "/ingest/sources";

/// Origin-relative client; one per session.
#[derive(Debug, Clone)]
pub struct HttpApi {
    ctx: LogContext,
    origin: String,
    client: Client,
}

impl HttpApi {
    pub fn new(config: &SyncConfig, ctx: &LogContext) -> Result<Self> {
        // Fail early on a bad origin rather than on the first request.
        http_endpoint(&config.origin, SUMMARY_PATH)?;
        let client = Client::builder()
            .timeout(config.request_timeout())
            .user_agent(concat!("threatlens-sync/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            ctx: ctx.with_component("http"),
            origin: config.origin.clone(),
            client,
        })
    }

    fn url(&self, path: &str) -> Result<Url> {
        http_endpoint(&self.origin, path)
    }

    fn toggle_url(&self, source: &str) -> Result<Url> {
        let mut url = self.url(SOURCES_PATH)?;
        url.path_segments_mut()
            .map_err(|_| SyncError::InvalidOrigin {
                origin: self.origin.clone(),
                reason: "origin cannot carry a path".to_string(),
            })?
            .pop_if_empty()
            .push(source)
            .push("toggle");
        Ok(url)
    }

    async fn read_json<T: DeserializeOwned>(&self, url: &Url, response: Response) -> Result<T> {
        let status = response.status();
        if !status.is_success() {
            log::warn!(
                "{} HTTP_STATUS endpoint={} status={}",
                self.ctx,
                url.path(),
                status.as_u16()
            );
            return Err(SyncError::Status {
                endpoint: url.path().to_string(),
                status: status.as_u16(),
            });
        }
        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.url(path)?;
        log::debug!("{} HTTP_GET endpoint={}", self.ctx, url.path());
        let response = self.client.get(url.clone()).send().await?;
        self.read_json(&url, response).await
    }

    async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let url = self.url(path)?;
        log::debug!("{} HTTP_POST endpoint={}", self.ctx, url.path());
        let response = self.client.post(url.clone()).json(body).send().await?;
        self.read_json(&url, response).await
    }

    pub async fn fetch_summary(&self) -> Result<ThreatSummary> {
        self.get_json(SUMMARY_PATH).await
    }

    /// Submit material for analysis. The response body is only
    /// acknowledged, not interpreted.
    pub async fn submit(&self, submission: &Submission) -> Result<Value> {
        match submission {
            Submission::Logs { lines, source } => {
                let body = LogsRequest {
                    logs: lines,
                    source: source.as_deref(),
                };
                self.post_json(submission.path(), &body).await
            }
            Submission::Email(content) => {
                self.post_json(submission.path(), &EmailRequest { content })
                    .await
            }
            Submission::IpScan(scan_data) => {
                self.post_json(submission.path(), &IpScanRequest { scan_data })
                    .await
            }
            Submission::Upload(path) => self.upload(path).await,
        }
    }

    async fn upload(&self, path: &Path) -> Result<Value> {
        let contents = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload.log".to_string());
        log::info!(
            "{} UPLOAD file={} bytes={}",
            self.ctx,
            file_name,
            contents.len()
        );

        let form = Form::new().part("file", Part::bytes(contents).file_name(file_name));
        let url = self.url("/analyze/upload")?;
        let response = self.client.post(url.clone()).multipart(form).send().await?;
        self.read_json(&url, response).await
    }

    pub async fn remediate(&self, threat_id: &str) -> Result<RemediationResponse> {
        self.post_json(REMEDIATE_PATH, &RemediateRequest { threat_id })
            .await
    }

    pub async fn list_sources(&self) -> Result<SourceListing> {
        self.get_json(SOURCES_PATH).await
    }

    /// Toggle a log source. An `{error}` body is returned as a value even
    /// on a non-2xx status, so the caller can revert with its message.
    pub async fn toggle_source(&self, source: &str) -> Result<ToggleResponse> {
        let url = self.toggle_url(source)?;
        log::debug!("{} HTTP_POST endpoint={}", self.ctx, url.path());
        let response = self.client.post(url.clone()).send().await?;
        let status = response.status();
        let body = response.bytes().await?;
        match serde_json::from_slice::<ToggleResponse>(&body) {
            Ok(parsed) => Ok(parsed),
            Err(_) if !status.is_success() => Err(SyncError::Status {
                endpoint: url.path().to_string(),
                status: status.as_u16(),
            }),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api(origin: &str) -> HttpApi {
        let config = SyncConfig {
            origin: origin.to_string(),
            ..SyncConfig::default()
        };
        HttpApi::new(&config, &LogContext::new("test-session")).unwrap()
    }

    #[test]
    fn test_toggle_url_escapes_source_name() {
        let api = api("http://127.0.0.1:8081");
        let url = api.toggle_url("windows events").unwrap();
        assert_eq!(
            url.as_str(),
            "http://127.0.0.1:8081/ingest/sources/windows%20events/toggle"
        );
    }

    #[test]
    fn test_rejects_bad_origin() {
        let config = SyncConfig {
            origin: "not a url".to_string(),
            ..SyncConfig::default()
        };
        assert!(matches!(
            HttpApi::new(&config, &LogContext::new("s")),
            Err(SyncError::InvalidOrigin { .. })
        ));
    }
}
