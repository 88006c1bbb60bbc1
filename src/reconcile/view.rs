//! Client-side view state derived from server snapshots.

use crate::model::{CorrelatedAttack, CountTable, Decision, HistoryBucket, ThreatSummary};

use super::funnel::FunnelEstimate;

/// Overview totals.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OverviewPanel {
    pub total_threats: u64,
    pub active: u64,
    pub remediated: u64,
    pub critical: u64,
    pub pulse: f64,
    pub entities: CountTable,
}

impl OverviewPanel {
    pub fn from_summary(summary: &ThreatSummary) -> Self {
        Self {
            total_threats: summary.total_threats,
            active: summary.active,
            remediated: summary.remediated,
            critical: summary.critical,
            pulse: summary.pulse,
            entities: summary.entities.clone(),
        }
    }
}

/// One displayed decision, newest first.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedEntry {
    pub id: String,
    pub decision: Decision,
    pub is_new: bool,
}

/// Everything the surfaces draw from. Replaced wholesale per summary.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewState {
    pub overview: OverviewPanel,
    pub by_severity: CountTable,
    pub by_type: CountTable,
    pub history: Vec<HistoryBucket>,
    pub funnel: FunnelEstimate,
    pub tactics: Vec<(String, u64)>,
    pub correlated: Vec<CorrelatedAttack>,
    pub feed: Vec<FeedEntry>,
}
