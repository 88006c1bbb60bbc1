//! Full dashboard snapshot as served by `GET /dashboard/summary`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use super::counts::CountTable;
use super::severity::Severity;
use super::wire::{lenient_list, null_as_default, timestamp};

/// The full server-side state snapshot.
///
/// Superseded wholesale on every fetch; never merged field by field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThreatSummary {
    #[serde(deserialize_with = "null_as_default")]
    pub total_threats: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub active: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub remediated: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub critical: u64,
    pub by_severity: CountTable,
    pub by_type: CountTable,
    pub by_tactic: CountTable,
    #[serde(deserialize_with = "lenient_list")]
    pub history: Vec<HistoryBucket>,
    #[serde(deserialize_with = "lenient_list")]
    pub decisions: Vec<Decision>,
    #[serde(deserialize_with = "lenient_list")]
    pub correlated_attacks: Vec<CorrelatedAttack>,
    pub entities: CountTable,
    #[serde(deserialize_with = "deserialize_pulse")]
    pub pulse: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub raw_count: u64,
}

/// One time bucket of the threat history series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryBucket {
    /// Offset-less server timestamps are read as UTC.
    #[serde(deserialize_with = "timestamp")]
    pub timestamp: DateTime<Utc>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub count: u64,
}

/// One AI-produced recommendation. Immutable once received.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Decision {
    pub id: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub decision: String,
    #[serde(deserialize_with = "null_as_default")]
    pub severity: Severity,
    #[serde(deserialize_with = "null_as_default")]
    pub reason: String,
    #[serde(deserialize_with = "null_as_default")]
    pub actions: Vec<String>,
}

impl Decision {
    /// Identifier used for display and remediation requests.
    ///
    /// Decisions without a server id are addressed by feed position.
    pub fn display_id(&self, position: usize) -> String {
        match &self.id {
            Some(id) if !id.is_empty() => id.clone(),
            _ => format!("decision-{}", position),
        }
    }
}

/// A correlated attack pattern linking a source to an attack type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorrelatedAttack {
    #[serde(deserialize_with = "null_as_default")]
    pub attack: String,
    #[serde(deserialize_with = "null_as_default")]
    pub severity: Severity,
    #[serde(deserialize_with = "null_as_default")]
    pub source: String,
    #[serde(deserialize_with = "null_as_default")]
    pub description: String,
}

fn deserialize_pulse<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    let raw = Option::<f64>::deserialize(deserializer)?.unwrap_or(0.0);
    Ok(if raw.is_nan() { 0.0 } else { raw.clamp(0.0, 100.0) })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_shape() {
        let summary: ThreatSummary = serde_json::from_str(
            r#"{
                "total_threats": 3,
                "active": 3,
                "remediated": 0,
                "critical": 2,
                "by_severity": {"CRITICAL": 1, "HIGH": 1, "MEDIUM": 1},
                "by_type": {"SQL_INJECTION": 2, "BRUTE_FORCE": 1},
                "decisions": [
                    {"decision": "IMMEDIATE_LOCKDOWN", "severity": "CRITICAL",
                     "actions": ["Disable affected account"], "reason": "brute force"}
                ],
                "raw_count": 12
            }"#,
        )
        .unwrap();

        assert_eq!(summary.total_threats, 3);
        assert_eq!(summary.by_severity.get("HIGH"), Some(1));
        assert_eq!(summary.decisions.len(), 1);
        assert_eq!(summary.decisions[0].severity, Severity::Critical);
        assert!(summary.history.is_empty());
        assert_eq!(summary.pulse, 0.0);
    }

    #[test]
    fn test_pulse_is_clamped() {
        let summary: ThreatSummary = serde_json::from_str(r#"{"pulse": 250}"#).unwrap();
        assert_eq!(summary.pulse, 100.0);
        let summary: ThreatSummary = serde_json::from_str(r#"{"pulse": -3.5}"#).unwrap();
        assert_eq!(summary.pulse, 0.0);
        let summary: ThreatSummary = serde_json::from_str(r#"{"pulse": null}"#).unwrap();
        assert_eq!(summary.pulse, 0.0);
    }

    #[test]
    fn test_history_buckets() {
        let summary: ThreatSummary = serde_json::from_str(
            r#"{"history": [{"timestamp": "2026-01-29T00:00:00Z", "count": 4}]}"#,
        )
        .unwrap();
        assert_eq!(summary.history.len(), 1);
        assert_eq!(summary.history[0].count, 4);
    }

    #[test]
    fn test_offset_less_history_keeps_snapshot() {
        let summary: ThreatSummary = serde_json::from_str(
            r#"{"total_threats": 4, "history": [
                {"timestamp": "2026-01-29T10:00:00.123456", "count": 3},
                {"timestamp": "not a time", "count": 9},
                {"timestamp": "2026-01-29T11:00:00Z", "count": 1}
            ]}"#,
        )
        .unwrap();
        assert_eq!(summary.total_threats, 4);
        assert_eq!(summary.history.len(), 2);
        assert_eq!(summary.history[0].count, 3);
        assert_eq!(
            summary.history[0].timestamp.to_rfc3339(),
            "2026-01-29T10:00:00.123456+00:00"
        );
    }

    #[test]
    fn test_null_fields_take_defaults() {
        let summary: ThreatSummary = serde_json::from_str(
            r#"{
                "total_threats": 2,
                "critical": null,
                "by_type": null,
                "decisions": [
                    {"decision": "BLOCK_IP", "severity": null, "reason": null, "actions": null},
                    {"decision": null, "reason": "port scan"}
                ],
                "correlated_attacks": [
                    {"attack": "BRUTE_FORCE", "source": null, "description": null}
                ],
                "history": null
            }"#,
        )
        .unwrap();

        assert_eq!(summary.total_threats, 2);
        assert_eq!(summary.critical, 0);
        assert!(summary.by_type.is_empty());
        assert!(summary.history.is_empty());
        assert_eq!(summary.decisions.len(), 2);
        assert_eq!(summary.decisions[0].reason, "");
        assert_eq!(summary.decisions[0].severity, Severity::Medium);
        assert!(summary.decisions[0].actions.is_empty());
        assert_eq!(summary.decisions[1].decision, "");
        assert_eq!(summary.correlated_attacks[0].source, "");
    }

    #[test]
    fn test_malformed_decision_is_dropped() {
        let summary: ThreatSummary = serde_json::from_str(
            r#"{"active": 1, "decisions": [{"decision": 42}, {"decision": "ISOLATE_HOST"}]}"#,
        )
        .unwrap();
        assert_eq!(summary.active, 1);
        assert_eq!(summary.decisions.len(), 1);
        assert_eq!(summary.decisions[0].decision, "ISOLATE_HOST");
    }

    #[test]
    fn test_decision_display_id() {
        let anonymous = Decision::default();
        assert_eq!(anonymous.display_id(3), "decision-3");

        let named = Decision {
            id: Some("d-77".to_string()),
            ..Decision::default()
        };
        assert_eq!(named.display_id(3), "d-77");
    }
}
