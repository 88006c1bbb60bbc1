//! Request and response bodies of the dashboard HTTP API.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// `POST /ingest/sources/{name}/toggle` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ToggleResponse {
    Error { error: String },
    Toggled { enabled: bool },
}

/// `POST /dashboard/remediate` response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemediationResponse {
    pub status: String,
    pub message: Option<String>,
}

impl RemediationResponse {
    pub fn is_success(&self) -> bool {
        self.status.eq_ignore_ascii_case("success")
    }
}

/// One entry of `GET /ingest/sources`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceStatus {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub events: u64,
    #[serde(default)]
    pub threats: u64,
    /// Source-specific statistics the panel passes through untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// `GET /ingest/sources`, keyed by source name.
pub type SourceListing = BTreeMap<String, SourceStatus>;

#[derive(Debug, Clone, Serialize)]
pub struct LogsRequest<'a> {
    pub logs: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<&'a str>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EmailRequest<'a> {
    pub content: &'a str,
}

#[derive(Debug, Clone, Serialize)]
pub struct IpScanRequest<'a> {
    pub scan_data: &'a str,
}

#[derive(Debug, Clone, Serialize)]
pub struct RemediateRequest<'a> {
    pub threat_id: &'a str,
}

/// Material submitted for server-side analysis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    Logs {
        lines: Vec<String>,
        source: Option<String>,
    },
    Email(String),
    IpScan(String),
    Upload(PathBuf),
}

impl Submission {
    pub fn path(&self) -> &'static str {
        match self {
            Submission::Logs { .. } => "/analyze/logs",
            Submission::Email(_) => "/analyze/email",
            Submission::IpScan(_) => "/analyze/ip",
            Submission::Upload(_) => "/analyze/upload",
        }
    }

    /// Short label for notifications.
    pub fn label(&self) -> &'static str {
        match self {
            Submission::Logs { .. } => "Log analysis",
            Submission::Email(_) => "Email analysis",
            Submission::IpScan(_) => "IP scan analysis",
            Submission::Upload(_) => "File upload",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle_response_shapes() {
        let ok: ToggleResponse = serde_json::from_str(r#"{"enabled": false}"#).unwrap();
        assert_eq!(ok, ToggleResponse::Toggled { enabled: false });

        let err: ToggleResponse =
            serde_json::from_str(r#"{"error": "source not found"}"#).unwrap();
        assert_eq!(
            err,
            ToggleResponse::Error {
                error: "source not found".to_string()
            }
        );
    }

    #[test]
    fn test_source_listing_keeps_extra_stats() {
        let listing: SourceListing = serde_json::from_str(
            r#"{"syslog": {"enabled": true, "events": 12, "threats": 1, "path": "/var/log/syslog"},
                "windows": {"enabled": false}}"#,
        )
        .unwrap();
        assert!(listing["syslog"].enabled);
        assert_eq!(listing["syslog"].events, 12);
        assert_eq!(listing["syslog"].extra["path"], "/var/log/syslog");
        assert!(!listing["windows"].enabled);
    }

    #[test]
    fn test_remediation_status() {
        let resp: RemediationResponse =
            serde_json::from_str(r#"{"status": "success", "message": "blocked"}"#).unwrap();
        assert!(resp.is_success());
        assert!(!RemediationResponse::default().is_success());
    }

    #[test]
    fn test_logs_request_body() {
        let lines = vec!["Failed password for root".to_string()];
        let body = serde_json::to_value(LogsRequest {
            logs: &lines,
            source: None,
        })
        .unwrap();
        assert_eq!(body, serde_json::json!({"logs": ["Failed password for root"]}));
    }
}
