//! Detection funnel estimate.

use crate::config::FunnelConfig;

/// Four-stage funnel: raw events, findings, correlated threats, incidents.
///
/// `raw` and `incidents` are presentation heuristics, not measurements.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FunnelEstimate {
    pub raw: u64,
    pub findings: u64,
    pub correlated: u64,
    pub incidents: u64,
}

impl FunnelEstimate {
    pub fn derive(raw_count: u64, total_threats: u64, config: &FunnelConfig) -> Self {
        let raw = raw_count
            .saturating_mul(config.raw_multiplier)
            .max(config.raw_floor);

        let incidents = if total_threats == 0 {
            0
        } else {
            ((total_threats as f64 * config.incident_ratio).floor() as u64).max(1)
        };

        Self {
            raw,
            findings: raw_count,
            correlated: total_threats,
            incidents,
        }
    }
}
