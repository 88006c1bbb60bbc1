//! AI decision feed.

use crate::logging::structured::LogContext;
use crate::model::Severity;
use crate::reconcile::FeedEntry;
use crate::security::markup::sanitize_display_text;

use super::{Frame, RenderCx, RenderError, Renderer, Surface};

/// One drawn feed row, display-safe.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedRow {
    pub id: String,
    pub title: String,
    pub severity: Severity,
    pub reason: String,
    pub actions: Vec<String>,
    pub is_new: bool,
}

#[derive(Debug)]
pub struct FeedRenderer {
    ctx: LogContext,
    rows: Vec<FeedRow>,
    draws: u64,
}

impl FeedRenderer {
    pub fn new(ctx: &LogContext) -> Self {
        Self {
            ctx: ctx.with_component("feed"),
            rows: Vec::new(),
            draws: 0,
        }
    }

    pub fn rows(&self) -> &[FeedRow] {
        &self.rows
    }

    /// Number of frames actually presented.
    pub fn draws(&self) -> u64 {
        self.draws
    }
}

impl Renderer for FeedRenderer {
    type Snapshot = [FeedEntry];

    fn surface(&self) -> Surface {
        Surface::Feed
    }

    fn render(&mut self, entries: &[FeedEntry], cx: &mut RenderCx<'_>) -> Result<(), RenderError> {
        self.rows = entries
            .iter()
            .map(|entry| FeedRow {
                id: entry.id.clone(),
                title: sanitize_display_text(&entry.decision.decision, &self.ctx),
                severity: entry.decision.severity,
                reason: sanitize_display_text(&entry.decision.reason, &self.ctx),
                actions: entry
                    .decision
                    .actions
                    .iter()
                    .map(|a| sanitize_display_text(a, &self.ctx))
                    .collect(),
                is_new: entry.is_new,
            })
            .collect();

        if cx.present(Surface::Feed, Frame::Feed(self.rows.clone()))? {
            self.draws += 1;
        }
        Ok(())
    }

    fn destroy(&mut self, cx: &mut RenderCx<'_>) {
        self.rows.clear();
        cx.backend.release(Surface::Feed);
    }
}
