//! Log-source panel with optimistic toggles.
//!
//! A toggle flips the row immediately and remembers the pre-click state.
//! The server answer either confirms it or reverts the row to exactly that
//! pre-click state.

use std::collections::BTreeMap;

use crate::client::{SourceListing, ToggleResponse};
use crate::dispatch::SourceStats;
use crate::logging::structured::LogContext;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceRow {
    pub enabled: bool,
    pub stats: SourceStats,
    /// Pre-click state while a toggle is in flight.
    pending: Option<bool>,
}

impl SourceRow {
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}

/// Result of settling a toggle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToggleOutcome {
    Confirmed { enabled: bool },
    Reverted { enabled: bool, reason: String },
    /// No toggle was in flight for this source.
    Stale,
}

#[derive(Debug)]
pub struct SourcePanel {
    ctx: LogContext,
    rows: BTreeMap<String, SourceRow>,
}

impl SourcePanel {
    pub fn new(ctx: &LogContext) -> Self {
        Self {
            ctx: ctx.with_component("sources"),
            rows: BTreeMap::new(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&SourceRow> {
        self.rows.get(name)
    }

    pub fn rows(&self) -> impl Iterator<Item = (&str, &SourceRow)> {
        self.rows.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Replace rows from a listing. In-flight toggles keep their optimistic
    /// value until settled, even when the listing no longer names them.
    pub fn replace(&mut self, listing: SourceListing) {
        let mut rows = BTreeMap::new();
        for (name, status) in listing {
            let stats = SourceStats {
                events: status.events,
                threats: status.threats,
            };
            let row = match self.rows.get(&name) {
                Some(existing) if existing.is_pending() => SourceRow {
                    enabled: existing.enabled,
                    stats,
                    pending: existing.pending,
                },
                _ => SourceRow {
                    enabled: status.enabled,
                    stats,
                    pending: None,
                },
            };
            rows.insert(name, row);
        }
        for (name, row) in std::mem::take(&mut self.rows) {
            if row.is_pending() {
                rows.entry(name).or_insert(row);
            }
        }
        self.rows = rows;
        log::debug!("{} SOURCES_LOADED count={}", self.ctx, self.rows.len());
    }

    /// Flip a row optimistically. Returns the new optimistic value, or
    /// `None` for an unknown source or one already in flight.
    pub fn begin_toggle(&mut self, name: &str) -> Option<bool> {
        let row = self.rows.get_mut(name)?;
        if row.is_pending() {
            return None;
        }
        row.pending = Some(row.enabled);
        row.enabled = !row.enabled;
        log::info!(
            "{} SOURCE_TOGGLE source={} enabled={}",
            self.ctx,
            name,
            row.enabled
        );
        Some(row.enabled)
    }

    /// Settle a toggle with the server answer, or with a transport failure.
    pub fn complete_toggle(
        &mut self,
        name: &str,
        result: Result<ToggleResponse, String>,
    ) -> ToggleOutcome {
        let Some(row) = self.rows.get_mut(name) else {
            return ToggleOutcome::Stale;
        };
        let Some(before) = row.pending.take() else {
            return ToggleOutcome::Stale;
        };

        let reason = match result {
            Ok(ToggleResponse::Toggled { enabled }) => {
                row.enabled = enabled;
                return ToggleOutcome::Confirmed { enabled };
            }
            Ok(ToggleResponse::Error { error }) => error,
            Err(e) => e,
        };

        row.enabled = before;
        log::warn!(
            "{} SOURCE_TOGGLE_REVERTED source={} reason={}",
            self.ctx,
            name,
            reason
        );
        ToggleOutcome::Reverted {
            enabled: before,
            reason,
        }
    }

    /// Pushed per-source statistics. Unknown sources are added as running.
    pub fn apply_stats(&mut self, name: &str, stats: SourceStats) {
        self.rows
            .entry(name.to_string())
            .and_modify(|row| row.stats = stats)
            .or_insert(SourceRow {
                enabled: true,
                stats,
                pending: None,
            });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::SourceStatus;

    fn panel() -> SourcePanel {
        let mut panel = SourcePanel::new(&LogContext::new("test-session"));
        let mut listing = SourceListing::new();
        listing.insert(
            "syslog".to_string(),
            SourceStatus {
                enabled: true,
                events: 10,
                ..SourceStatus::default()
            },
        );
        listing.insert("windows".to_string(), SourceStatus::default());
        panel.replace(listing);
        panel
    }

    #[test]
    fn test_error_reverts_to_pre_click_state() {
        let mut panel = panel();
        assert_eq!(panel.begin_toggle("syslog"), Some(false));
        assert!(!panel.get("syslog").unwrap().enabled);

        let outcome = panel.complete_toggle(
            "syslog",
            Ok(ToggleResponse::Error {
                error: "permission denied".to_string(),
            }),
        );
        assert_eq!(
            outcome,
            ToggleOutcome::Reverted {
                enabled: true,
                reason: "permission denied".to_string()
            }
        );
        let row = panel.get("syslog").unwrap();
        assert!(row.enabled);
        assert!(!row.is_pending());
    }

    #[test]
    fn test_confirmed_toggle_takes_server_value() {
        let mut panel = panel();
        assert_eq!(panel.begin_toggle("windows"), Some(true));
        assert_eq!(panel.begin_toggle("windows"), None);
        assert_eq!(
            panel.complete_toggle("windows", Ok(ToggleResponse::Toggled { enabled: true })),
            ToggleOutcome::Confirmed { enabled: true }
        );
        assert_eq!(
            panel.complete_toggle("windows", Ok(ToggleResponse::Toggled { enabled: true })),
            ToggleOutcome::Stale
        );
    }

    #[test]
    fn test_transport_failure_reverts() {
        let mut panel = panel();
        panel.begin_toggle("windows");
        let outcome = panel.complete_toggle("windows", Err("connection refused".to_string()));
        assert!(matches!(outcome, ToggleOutcome::Reverted { enabled: false, .. }));
        assert!(!panel.get("windows").unwrap().enabled);
    }

    #[test]
    fn test_listing_keeps_in_flight_toggle() {
        let mut panel = panel();
        panel.begin_toggle("syslog");
        let mut listing = SourceListing::new();
        listing.insert(
            "syslog".to_string(),
            SourceStatus {
                enabled: true,
                events: 42,
                ..SourceStatus::default()
            },
        );
        panel.replace(listing);

        let row = panel.get("syslog").unwrap();
        assert!(!row.enabled);
        assert!(row.is_pending());
        assert_eq!(row.stats.events, 42);
        assert!(panel.get("windows").is_none());
    }

    #[test]
    fn test_unlisted_source_still_reports_failed_toggle() {
        let mut panel = panel();
        panel.begin_toggle("windows");
        let mut listing = SourceListing::new();
        listing.insert("syslog".to_string(), SourceStatus::default());
        panel.replace(listing);

        assert!(panel.get("windows").unwrap().is_pending());
        let outcome = panel.complete_toggle(
            "windows",
            Ok(ToggleResponse::Error {
                error: "source removed".to_string(),
            }),
        );
        assert_eq!(
            outcome,
            ToggleOutcome::Reverted {
                enabled: false,
                reason: "source removed".to_string()
            }
        );

        // Once settled, the next listing drops it.
        panel.replace(SourceListing::new());
        assert!(panel.is_empty());
    }

    #[test]
    fn test_pushed_stats() {
        let mut panel = panel();
        panel.apply_stats(
            "syslog",
            SourceStats {
                events: 99,
                threats: 3,
            },
        );
        panel.apply_stats("cloudtrail", SourceStats::default());
        assert_eq!(panel.get("syslog").unwrap().stats.threats, 3);
        assert!(panel.get("cloudtrail").unwrap().enabled);
        assert_eq!(panel.len(), 3);
    }
}
