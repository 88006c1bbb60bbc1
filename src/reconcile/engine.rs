//! Merges server state into view state and decides what redraws.

use std::time::{Duration, Instant};

use crate::config::{FunnelConfig, SyncConfig};
use crate::dispatch::ThreatUpdate;
use crate::logging::structured::LogContext;
use crate::model::{Category, Decision, ThreatSummary};
use crate::render::{MarkerId, Surface, ThreatMarker};
use crate::{log_debug, log_info};

use super::funnel::FunnelEstimate;
use super::mitre::top_tactics;
use super::view::{FeedEntry, OverviewPanel, ViewState};

/// Surfaces a full summary redraws unconditionally.
const SUMMARY_SURFACES: [Surface; 7] = [
    Surface::Overview,
    Surface::SeverityChart,
    Surface::TypeChart,
    Surface::Timeline,
    Surface::Funnel,
    Surface::Matrix,
    Surface::Graph,
];

/// Outcome of diffing an incoming decision list against the feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedChange {
    Unchanged,
    Redraw { count: usize, flagged_new: bool },
}

impl FeedChange {
    pub fn is_redraw(&self) -> bool {
        matches!(self, FeedChange::Redraw { .. })
    }
}

/// Which surfaces must redraw after a full summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedrawPlan {
    pub surfaces: Vec<Surface>,
    pub feed: FeedChange,
}

impl RedrawPlan {
    pub fn redraws(&self, surface: Surface) -> bool {
        match surface {
            Surface::Feed => self.feed.is_redraw(),
            _ => self.surfaces.contains(&surface),
        }
    }
}

/// Side effects of a `threat_update` push.
#[derive(Debug, Clone, PartialEq)]
pub struct ThreatEffects {
    /// The push is a change notification; the summary must be re-fetched.
    pub refetch: bool,
    pub markers: Vec<ThreatMarker>,
    pub notifications: Vec<(String, Category)>,
}

#[derive(Debug)]
pub struct ReconciliationEngine {
    ctx: LogContext,
    view: ViewState,
    displayed_decisions: Option<usize>,
    max_decisions: usize,
    mitre_top_n: usize,
    funnel: FunnelConfig,
    marker_lifetime: Duration,
    next_marker: u64,
    summaries_applied: u64,
}

impl ReconciliationEngine {
    pub fn new(ctx: &LogContext, config: &SyncConfig) -> Self {
        Self {
            ctx: ctx.with_component("reconcile"),
            view: ViewState::default(),
            displayed_decisions: None,
            max_decisions: config.max_decisions.max(1),
            mitre_top_n: config.mitre_top_n.max(1),
            funnel: config.funnel.clone(),
            marker_lifetime: config.marker_lifetime(),
            next_marker: 0,
            summaries_applied: 0,
        }
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn summaries_applied(&self) -> u64 {
        self.summaries_applied
    }

    /// Replace all summary-derived view state. Every surface but the feed
    /// redraws; the feed goes through the decision-list diff.
    pub fn apply_full_summary(&mut self, summary: ThreatSummary) -> RedrawPlan {
        self.summaries_applied += 1;
        let feed = self.apply_decision_list(&summary.decisions);

        let ThreatSummary {
            by_severity,
            by_type,
            by_tactic,
            history,
            correlated_attacks,
            ..
        } = &summary;

        self.view.overview = OverviewPanel::from_summary(&summary);
        self.view.by_severity = by_severity.clone();
        self.view.by_type = by_type.clone();
        self.view.history = history.clone();
        self.view.funnel =
            FunnelEstimate::derive(summary.raw_count, summary.total_threats, &self.funnel);
        self.view.tactics = top_tactics(by_tactic, self.mitre_top_n);
        self.view.correlated = correlated_attacks.clone();

        log_debug!(
            self.ctx,
            "SUMMARY_APPLIED",
            total = summary.total_threats,
            critical = summary.critical,
            decisions = summary.decisions.len(),
            feed_redraw = feed.is_redraw()
        );

        RedrawPlan {
            surfaces: SUMMARY_SURFACES.to_vec(),
            feed,
        }
    }

    /// Rebuild the feed unless the decision count is unchanged.
    ///
    /// The server appends decisions, so the most recent are at the end;
    /// the feed shows the last `max_decisions` newest first.
    pub fn apply_decision_list(&mut self, decisions: &[Decision]) -> FeedChange {
        let count = decisions.len();
        if self.displayed_decisions == Some(count) {
            log::trace!("{} FEED_UNCHANGED count={}", self.ctx, count);
            return FeedChange::Unchanged;
        }
        let grew = self.displayed_decisions.is_some_and(|shown| count > shown);

        let start = count.saturating_sub(self.max_decisions);
        self.view.feed = decisions
            .iter()
            .enumerate()
            .skip(start)
            .rev()
            .enumerate()
            .map(|(rank, (position, decision))| FeedEntry {
                id: decision.display_id(position),
                decision: decision.clone(),
                is_new: grew && rank == 0,
            })
            .collect();
        self.displayed_decisions = Some(count);

        FeedChange::Redraw {
            count,
            flagged_new: grew,
        }
    }

    /// Register a marker and a notification per new threat and request a
    /// summary re-fetch.
    pub fn apply_threat_update(&mut self, update: &ThreatUpdate, now: Instant) -> ThreatEffects {
        let mut markers = Vec::with_capacity(update.new_threats.len());
        let mut notifications = Vec::with_capacity(update.new_threats.len());

        for threat in &update.new_threats {
            self.next_marker += 1;
            markers.push(ThreatMarker::new(
                MarkerId(self.next_marker),
                threat,
                now,
                self.marker_lifetime,
            ));
            notifications.push((
                format!("New threat: {}", threat.headline()),
                threat.severity.urgency(),
            ));
        }

        log_info!(
            self.ctx,
            "THREAT_UPDATE",
            new_threats = update.new_threats.len()
        );

        ThreatEffects {
            refetch: true,
            markers,
            notifications,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CountTable, Severity, Threat};
    use proptest::prelude::*;

    fn engine() -> ReconciliationEngine {
        ReconciliationEngine::new(&LogContext::new("test-session"), &SyncConfig::default())
    }

    fn decisions(n: usize) -> Vec<Decision> {
        (0..n)
            .map(|i| Decision {
                decision: format!("DECISION_{}", i),
                severity: Severity::High,
                ..Decision::default()
            })
            .collect()
    }

    #[test]
    fn test_feed_skips_unchanged_count() {
        let mut engine = engine();
        assert!(engine.apply_decision_list(&decisions(3)).is_redraw());
        assert_eq!(engine.apply_decision_list(&decisions(3)), FeedChange::Unchanged);
        assert_eq!(
            engine.apply_decision_list(&decisions(4)),
            FeedChange::Redraw {
                count: 4,
                flagged_new: true
            }
        );
        assert_eq!(
            engine.apply_decision_list(&decisions(2)),
            FeedChange::Redraw {
                count: 2,
                flagged_new: false
            }
        );
    }

    #[test]
    fn test_feed_is_bounded_and_newest_first() {
        let mut engine = engine();
        engine.apply_decision_list(&decisions(12));
        engine.apply_decision_list(&decisions(15));

        let feed = &engine.view().feed;
        assert_eq!(feed.len(), 10);
        assert_eq!(feed[0].decision.decision, "DECISION_14");
        assert_eq!(feed[0].id, "decision-14");
        assert!(feed[0].is_new);
        assert!(feed[1..].iter().all(|e| !e.is_new));
        assert_eq!(feed[9].decision.decision, "DECISION_5");
    }

    #[test]
    fn test_full_summary_redraws_all_but_unchanged_feed() {
        let mut engine = engine();
        let summary = ThreatSummary {
            total_threats: 10,
            raw_count: 100,
            decisions: decisions(2),
            ..ThreatSummary::default()
        };

        let first = engine.apply_full_summary(summary.clone());
        assert!(first.redraws(Surface::Feed));
        assert!(first.redraws(Surface::Overview));
        assert!(!first.redraws(Surface::Globe));

        let second = engine.apply_full_summary(summary);
        assert!(!second.redraws(Surface::Feed));
        assert!(second.redraws(Surface::Funnel));
        assert_eq!(engine.view().funnel.incidents, 4);
    }

    #[test]
    fn test_threat_update_effects() {
        let mut engine = engine();
        let update = ThreatUpdate {
            new_threats: vec![
                Threat {
                    attack: "RANSOMWARE".to_string(),
                    severity: Severity::Critical,
                    source: "45.33.22.11".to_string(),
                    ..Threat::default()
                },
                Threat {
                    attack: "PORT_SCAN".to_string(),
                    severity: Severity::Low,
                    ..Threat::default()
                },
            ],
        };
        let now = Instant::now();
        let effects = engine.apply_threat_update(&update, now);

        assert!(effects.refetch);
        assert_eq!(effects.markers.len(), 2);
        assert_ne!(effects.markers[0].id, effects.markers[1].id);
        assert_eq!(effects.markers[0].expires_at, now + Duration::from_secs(10));
        assert_eq!(effects.notifications[0].1, Category::Urgent);
        assert_eq!(effects.notifications[1].1, Category::Info);
    }

    #[test]
    fn test_empty_threat_update_still_refetches() {
        let mut engine = engine();
        let effects = engine.apply_threat_update(&ThreatUpdate::default(), Instant::now());
        assert!(effects.refetch);
        assert!(effects.markers.is_empty());
    }

    fn summary_strategy() -> impl Strategy<Value = ThreatSummary> {
        (
            0u64..1000,
            0u64..1000,
            0u64..100,
            0.0f64..100.0,
            proptest::collection::vec(0u64..50, 0..5),
            0usize..15,
        )
            .prop_map(|(total, active, critical, pulse, severities, n_decisions)| {
                let labels = ["CRITICAL", "HIGH", "MEDIUM", "LOW", "INFO"];
                let by_severity: CountTable = labels
                    .iter()
                    .zip(severities.iter())
                    .map(|(l, c)| (*l, *c))
                    .collect();
                ThreatSummary {
                    total_threats: total,
                    active,
                    critical,
                    pulse,
                    by_severity,
                    decisions: decisions(n_decisions),
                    ..ThreatSummary::default()
                }
            })
    }

    proptest! {
        #[test]
        fn test_no_stale_fields_after_any_sequence(
            summaries in proptest::collection::vec(summary_strategy(), 1..8)
        ) {
            let mut engine = engine();
            for summary in &summaries {
                engine.apply_full_summary(summary.clone());
            }
            let last = summaries.last().unwrap();
            let view = engine.view();
            prop_assert_eq!(&view.overview, &OverviewPanel::from_summary(last));
            prop_assert_eq!(&view.by_severity, &last.by_severity);
            prop_assert_eq!(view.feed.len(), last.decisions.len().min(10));
        }
    }
}
