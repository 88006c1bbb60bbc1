//! Stat panels: overview totals, detection funnel and MITRE tactic matrix.

use crate::reconcile::{FunnelEstimate, OverviewPanel};

use super::{Frame, RenderCx, RenderError, Renderer, Surface};

/// Overview totals as drawn.
#[derive(Debug, Clone, PartialEq)]
pub struct OverviewFrame {
    pub total_threats: u64,
    pub active: u64,
    pub remediated: u64,
    pub critical: u64,
    pub pulse: f64,
    pub entities: Vec<(String, u64)>,
}

/// One stage of the detection funnel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunnelStage {
    pub label: &'static str,
    pub value: u64,
    /// Width relative to the top stage, in percent.
    pub width_pct: u8,
}

#[derive(Debug, Default)]
pub struct OverviewRenderer {
    last: Option<OverviewFrame>,
}

impl OverviewRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last(&self) -> Option<&OverviewFrame> {
        self.last.as_ref()
    }
}

impl Renderer for OverviewRenderer {
    type Snapshot = OverviewPanel;

    fn surface(&self) -> Surface {
        Surface::Overview
    }

    fn render(&mut self, panel: &OverviewPanel, cx: &mut RenderCx<'_>) -> Result<(), RenderError> {
        let frame = OverviewFrame {
            total_threats: panel.total_threats,
            active: panel.active,
            remediated: panel.remediated,
            critical: panel.critical,
            pulse: panel.pulse,
            entities: panel.entities.entries().to_vec(),
        };
        cx.present(Surface::Overview, Frame::Overview(frame.clone()))?;
        self.last = Some(frame);
        Ok(())
    }

    fn destroy(&mut self, cx: &mut RenderCx<'_>) {
        self.last = None;
        cx.backend.release(Surface::Overview);
    }
}

#[derive(Debug, Default)]
pub struct FunnelRenderer {
    stages: Vec<FunnelStage>,
}

impl FunnelRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stages(&self) -> &[FunnelStage] {
        &self.stages
    }
}

impl Renderer for FunnelRenderer {
    type Snapshot = FunnelEstimate;

    fn surface(&self) -> Surface {
        Surface::Funnel
    }

    fn render(
        &mut self,
        funnel: &FunnelEstimate,
        cx: &mut RenderCx<'_>,
    ) -> Result<(), RenderError> {
        let top = funnel.raw.max(1) as f64;
        let stage = |label: &'static str, value: u64| FunnelStage {
            label,
            value,
            width_pct: ((value as f64 / top) * 100.0).round().clamp(0.0, 100.0) as u8,
        };
        self.stages = vec![
            stage("Raw events", funnel.raw),
            stage("Findings", funnel.findings),
            stage("Correlated", funnel.correlated),
            stage("Incidents", funnel.incidents),
        ];
        cx.present(Surface::Funnel, Frame::Funnel(self.stages.clone()))?;
        Ok(())
    }

    fn destroy(&mut self, cx: &mut RenderCx<'_>) {
        self.stages.clear();
        cx.backend.release(Surface::Funnel);
    }
}

#[derive(Debug, Default)]
pub struct MatrixRenderer {
    rows: Vec<(String, u64)>,
}

impl MatrixRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rows(&self) -> &[(String, u64)] {
        &self.rows
    }
}

impl Renderer for MatrixRenderer {
    type Snapshot = [(String, u64)];

    fn surface(&self) -> Surface {
        Surface::Matrix
    }

    fn render(
        &mut self,
        tactics: &[(String, u64)],
        cx: &mut RenderCx<'_>,
    ) -> Result<(), RenderError> {
        self.rows = tactics.to_vec();
        cx.present(Surface::Matrix, Frame::Matrix(self.rows.clone()))?;
        Ok(())
    }

    fn destroy(&mut self, cx: &mut RenderCx<'_>) {
        self.rows.clear();
        cx.backend.release(Surface::Matrix);
    }
}
