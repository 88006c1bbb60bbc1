//! Push-channel message variants.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::model::wire::lenient_list;
use crate::model::{Severity, Threat};

/// Tag of an inbound message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    Connection,
    ThreatUpdate,
    Alert,
    Remediation,
    LogSourceUpdate,
    Unknown,
}

impl MessageKind {
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "connection" => MessageKind::Connection,
            "threat_update" => MessageKind::ThreatUpdate,
            "alert" => MessageKind::Alert,
            "remediation" => MessageKind::Remediation,
            "log_source_update" => MessageKind::LogSourceUpdate,
            _ => MessageKind::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MessageKind::Connection => "connection",
            MessageKind::ThreatUpdate => "threat_update",
            MessageKind::Alert => "alert",
            MessageKind::Remediation => "remediation",
            MessageKind::LogSourceUpdate => "log_source_update",
            MessageKind::Unknown => "unknown",
        }
    }
}

/// Server greeting sent right after the channel opens.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionNotice {
    pub status: String,
    pub message: Option<String>,
}

/// `threat_update.data`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ThreatUpdate {
    #[serde(default, deserialize_with = "lenient_list")]
    pub new_threats: Vec<Threat>,
}

/// Free-form alert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    #[serde(default)]
    pub severity: Severity,
    pub message: String,
    #[serde(default)]
    pub alert_type: Option<String>,
}

/// `remediation.data`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemediationNotice {
    pub threat_id: String,
}

/// Per-source ingestion counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceStats {
    pub events: u64,
    pub threats: u64,
}

/// `log_source_update.data`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogSourceUpdate {
    pub source: String,
    #[serde(default)]
    pub stats: SourceStats,
}

/// A parsed push-channel message.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundMessage {
    Connection(ConnectionNotice),
    ThreatUpdate(ThreatUpdate),
    Alert(Alert),
    Remediation(RemediationNotice),
    LogSourceUpdate(LogSourceUpdate),
    Unknown(String),
}

impl InboundMessage {
    pub fn kind(&self) -> MessageKind {
        match self {
            InboundMessage::Connection(_) => MessageKind::Connection,
            InboundMessage::ThreatUpdate(_) => MessageKind::ThreatUpdate,
            InboundMessage::Alert(_) => MessageKind::Alert,
            InboundMessage::Remediation(_) => MessageKind::Remediation,
            InboundMessage::LogSourceUpdate(_) => MessageKind::LogSourceUpdate,
            InboundMessage::Unknown(_) => MessageKind::Unknown,
        }
    }

    /// Parse one text frame.
    pub fn parse(raw: &str) -> Result<Self, DispatchError> {
        let value: Value =
            serde_json::from_str(raw).map_err(|e| DispatchError::InvalidJson(e.to_string()))?;

        let tag = value
            .get("type")
            .and_then(|t| t.as_str())
            .ok_or(DispatchError::MissingType)?
            .to_string();

        let kind = MessageKind::from_tag(&tag);
        let message = match kind {
            MessageKind::Connection => InboundMessage::Connection(payload(kind, value)?),
            MessageKind::ThreatUpdate => InboundMessage::ThreatUpdate(data(kind, value)?),
            MessageKind::Alert => InboundMessage::Alert(payload(kind, value)?),
            MessageKind::Remediation => InboundMessage::Remediation(data(kind, value)?),
            MessageKind::LogSourceUpdate => InboundMessage::LogSourceUpdate(data(kind, value)?),
            MessageKind::Unknown => InboundMessage::Unknown(tag),
        };
        Ok(message)
    }
}

/// Why a frame could not be routed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error("frame is not valid JSON: {0}")]
    InvalidJson(String),

    #[error("frame has no string `type` field")]
    MissingType,

    #[error("malformed `{kind}` payload: {reason}")]
    Malformed { kind: &'static str, reason: String },
}

/// Deserialize the whole frame as the payload.
fn payload<T: DeserializeOwned>(kind: MessageKind, value: Value) -> Result<T, DispatchError> {
    serde_json::from_value(value).map_err(|e| DispatchError::Malformed {
        kind: kind.as_str(),
        reason: e.to_string(),
    })
}

/// Deserialize the frame's `data` member as the payload.
fn data<T: DeserializeOwned>(kind: MessageKind, mut value: Value) -> Result<T, DispatchError> {
    let data = value
        .get_mut("data")
        .map(Value::take)
        .ok_or_else(|| DispatchError::Malformed {
            kind: kind.as_str(),
            reason: "missing `data`".to_string(),
        })?;
    payload(kind, data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_threat_update() {
        let message = InboundMessage::parse(
            r#"{"type": "threat_update", "data": {"new_threats": [
                {"attack": "SQL_INJECTION", "severity": "CRITICAL", "source": "8.8.8.8"}
            ]}, "timestamp": "2026-01-29T00:00:00"}"#,
        )
        .unwrap();

        match message {
            InboundMessage::ThreatUpdate(update) => {
                assert_eq!(update.new_threats.len(), 1);
                assert_eq!(update.new_threats[0].severity, Severity::Critical);
            }
            other => panic!("unexpected message {:?}", other),
        }
    }

    #[test]
    fn test_threat_update_skips_unreadable_entries() {
        let message = InboundMessage::parse(
            r#"{"type": "threat_update", "data": {"new_threats": [
                null,
                {"threat_type": "PORT_SCAN", "severity": null, "source_ip": "10.0.0.9"}
            ]}}"#,
        )
        .unwrap();

        match message {
            InboundMessage::ThreatUpdate(update) => {
                assert_eq!(update.new_threats.len(), 1);
                assert_eq!(update.new_threats[0].attack, "PORT_SCAN");
                assert_eq!(update.new_threats[0].severity, Severity::Medium);
            }
            other => panic!("unexpected message {:?}", other),
        }
    }

    #[test]
    fn test_parse_alert_and_remediation() {
        let alert = InboundMessage::parse(
            r#"{"type": "alert", "alert_type": "ids", "message": "Port scan", "severity": "HIGH"}"#,
        )
        .unwrap();
        assert_eq!(alert.kind(), MessageKind::Alert);

        let remediation =
            InboundMessage::parse(r#"{"type": "remediation", "data": {"threat_id": "t-1"}}"#)
                .unwrap();
        assert_eq!(
            remediation,
            InboundMessage::Remediation(RemediationNotice {
                threat_id: "t-1".to_string()
            })
        );
    }

    #[test]
    fn test_parse_log_source_update() {
        let message = InboundMessage::parse(
            r#"{"type": "log_source_update", "data": {"source": "web_server", "stats": {"events": 40, "threats": 2}}}"#,
        )
        .unwrap();
        match message {
            InboundMessage::LogSourceUpdate(update) => {
                assert_eq!(update.source, "web_server");
                assert_eq!(update.stats, SourceStats { events: 40, threats: 2 });
            }
            other => panic!("unexpected message {:?}", other),
        }
    }

    #[test]
    fn test_unknown_tag_is_not_an_error() {
        let message = InboundMessage::parse(r#"{"type": "heartbeat"}"#).unwrap();
        assert_eq!(message, InboundMessage::Unknown("heartbeat".to_string()));
    }

    #[test]
    fn test_malformed_frames() {
        assert!(matches!(
            InboundMessage::parse("not json{"),
            Err(DispatchError::InvalidJson(_))
        ));
        assert_eq!(
            InboundMessage::parse(r#"{"data": {}}"#),
            Err(DispatchError::MissingType)
        );
        assert!(matches!(
            InboundMessage::parse(r#"{"type": "remediation", "data": {}}"#),
            Err(DispatchError::Malformed { kind: "remediation", .. })
        ));
        assert!(matches!(
            InboundMessage::parse(r#"{"type": "threat_update"}"#),
            Err(DispatchError::Malformed { kind: "threat_update", .. })
        ));
        assert!(matches!(
            InboundMessage::parse(r#"{"type": "threat_update", "data": {"new_threats": 5}}"#),
            Err(DispatchError::Malformed { .. })
        ));
    }
}
